mod common;

use common::{bare, eval, interp};
use num_bigint::BigInt;
use proptest::collection::vec;
use proptest::prelude::*;

/// Source text of a string literal with the escapes the printer uses.
fn string_literal(text: &str) -> String {
    let mut out = String::from("\"");
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\x01' => out.push_str("\\x01"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn atom_text() -> impl Strategy<Value = String> {
    prop_oneof![
        any::<i64>().prop_map(|n| n.to_string()),
        (-1.0e6f64..1.0e6).prop_map(|x| format!("{:?}", x)),
        "[a-e]{1,3}",
        ":[a-e]{1,3}",
        "[a-z \"\\\\\n\t\x01]{0,8}".prop_map(|s| string_literal(&s)),
        Just("nil".to_string()),
    ]
}

/// Lists, dotted lists, vectors and quote or delay forms over atoms.
fn form_text() -> impl Strategy<Value = String> {
    atom_text().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            vec(inner.clone(), 0..4).prop_map(|items| format!("({})", items.join(" "))),
            (vec(inner.clone(), 1..3), inner.clone())
                .prop_map(|(items, tail)| format!("({} . {})", items.join(" "), tail)),
            vec(inner.clone(), 0..4).prop_map(|items| format!("[{}]", items.join(" "))),
            inner.clone().prop_map(|x| format!("'{}", x)),
            inner.prop_map(|x| format!("~{}", x)),
        ]
    })
}

/// A form, possibly wrapped in a quasiquote template.
fn template_text() -> impl Strategy<Value = String> {
    prop_oneof![
        form_text(),
        form_text().prop_map(|x| format!("`{}", x)),
        (form_text(), form_text()).prop_map(|(a, b)| format!("`(k ,{} ,@{} z)", a, b)),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn integers_read_back_as_printed(n in any::<i64>()) {
        let mut interp = bare();
        prop_assert_eq!(eval(&mut interp, &n.to_string()), n.to_string());
    }

    #[test]
    fn plain_strings_print_quoted(s in "[a-zA-Z0-9 ]{0,24}") {
        let mut interp = bare();
        prop_assert_eq!(eval(&mut interp, &format!("\"{}\"", s)), format!("\"{}\"", s));
    }

    #[test]
    fn floats_print_as_readable_text(x in -1.0e300f64..1.0e300) {
        let mut interp = bare();
        let printed = eval(&mut interp, &format!("{:?}", x));
        prop_assert_eq!(printed.parse::<f64>().ok(), Some(x));
        prop_assert_eq!(eval(&mut interp, &printed), printed.clone());
    }

    #[test]
    fn escaped_strings_print_as_written(s in "[a-z \"\\\\\n\t\x01]{0,16}") {
        let mut interp = bare();
        let literal = string_literal(&s);
        prop_assert_eq!(eval(&mut interp, &literal), literal.clone());
    }

    #[test]
    fn printed_forms_read_back_equal(source in template_text()) {
        let (mut interp, _) = interp();
        let printed = eval(&mut interp, &format!("'{}", source));
        prop_assert_eq!(
            eval(&mut interp, &format!("(equal '{} '{})", source, printed)),
            "t",
            "{} printed as {}",
            source,
            printed
        );
        prop_assert_eq!(eval(&mut interp, &format!("'{}", printed)), printed.clone());
    }

    #[test]
    fn sums_and_products_never_overflow(a in any::<i64>(), b in any::<i64>()) {
        let mut interp = bare();
        let sum = BigInt::from(a) + BigInt::from(b);
        let product = BigInt::from(a) * BigInt::from(b);
        prop_assert_eq!(eval(&mut interp, &format!("(+ {} {})", a, b)), sum.to_string());
        prop_assert_eq!(eval(&mut interp, &format!("(* {} {})", a, b)), product.to_string());
        prop_assert_eq!(
            eval(&mut interp, &format!("(- (+ {} {}) {})", a, b, b)),
            a.to_string()
        );
    }

    #[test]
    fn remainder_takes_the_sign_of_the_dividend(a in any::<i64>(), b in any::<i64>().prop_filter("nonzero", |b| *b != 0)) {
        let mut interp = bare();
        let expected = (a as i128) % (b as i128);
        prop_assert_eq!(eval(&mut interp, &format!("(% {} {})", a, b)), expected.to_string());
    }

    #[test]
    fn integer_order_matches_rust(a in any::<i64>(), b in any::<i64>()) {
        let mut interp = bare();
        let lt = if a < b { "t" } else { "nil" };
        let eq = if a == b { "t" } else { "nil" };
        prop_assert_eq!(eval(&mut interp, &format!("(< {} {})", a, b)), lt);
        prop_assert_eq!(eval(&mut interp, &format!("(= {} {})", a, b)), eq);
    }
}
