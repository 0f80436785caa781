mod common;

use std::fs;

use common::{eval, interp, interp_reading};
use l2lisp::{Config, ErrorKind, Interp, LinesFromStr, LispError, Receiver, Value};

#[derive(Default)]
struct Collect(Vec<String>);

impl Receiver for Collect {
    fn receive_result(&mut self, interp: &Interp, value: Value) {
        self.0.push(format!("=> {}", interp.repr(value)));
    }

    fn receive_error(&mut self, _interp: &Interp, error: &LispError) {
        self.0.push(error.message());
    }
}

#[test]
fn receiver_sees_every_outcome_and_reading_goes_on() {
    let (mut interp, _) = interp();
    let mut seen = Collect::default();
    let last = interp
        .run(Box::new(LinesFromStr::new("1\n(car 1 2)\n(+ 1 2)")), Some(&mut seen))
        .unwrap();
    assert_eq!(interp.repr(last), "3");
    assert_eq!(
        seen.0,
        vec!["=> 1", "arity not matched: #<car:1>", "=> 3"]
    );
}

#[test]
fn without_receiver_the_first_error_stops_the_run() {
    let (mut interp, _) = interp();
    let err = interp.run_str("(setq a 1) (car) (setq a 2)").unwrap_err();
    assert!(matches!(err.kind, ErrorKind::ArityNotMatched(_)));
    assert_eq!(eval(&mut interp, "a"), "1");
}

#[test]
fn unbalanced_input_is_a_syntax_error() {
    let (mut interp, _) = interp();
    let err = interp.run_str("(list 1 2").unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Syntax { .. }), "{}", err);
}

#[test]
fn printing_natives_write_to_the_output() {
    let (mut interp, out) = interp();
    eval(&mut interp, "(prin1 \"a\") (princ \"b\") (terpri) (prin1 '(1 . 2))");
    assert_eq!(out.text(), "\"a\"b\n(1 . 2)");
}

#[test]
fn read_draws_from_the_input_source() {
    let (mut interp, _) = interp_reading(Config::default(), "(x y)\n42");
    assert_eq!(eval(&mut interp, "(read)"), "(x y)");
    assert_eq!(eval(&mut interp, "(+ (read) 1)"), "43");
    assert_eq!(eval(&mut interp, "(eq (read) *eof*)"), "t");
}

#[test]
fn load_runs_a_file() {
    let path = std::env::temp_dir().join(format!("l2lisp-load-{}.l", std::process::id()));
    fs::write(&path, "(defun triple (x) (* 3 x))\n(triple 5)\n").unwrap();
    let (mut interp, _) = interp();
    let result = eval(&mut interp, &format!("(load \"{}\")", path.display()));
    fs::remove_file(&path).unwrap();
    assert_eq!(result, "15");
    assert_eq!(eval(&mut interp, "(triple 2)"), "6");
}

#[test]
fn loading_a_missing_file_is_an_error() {
    let (mut interp, _) = interp();
    let message = eval(&mut interp, "(load \"/no/such/file.l\")");
    assert!(message.starts_with("cannot open '/no/such/file.l'"), "{}", message);
    assert_eq!(
        eval(&mut interp, "(catch *error* (load \"/no/such/file.l\")) 'survived"),
        "survived"
    );
}

#[test]
fn version_and_dump() {
    let (mut interp, _) = interp();
    assert_eq!(eval(&mut interp, "*version*"), "(9.4 \"Rust\")");
    let dumped = eval(&mut interp, "(dump)");
    assert!(dumped.starts_with('(') && dumped.ends_with(" nil)"), "{}", dumped);
    assert!(dumped.contains(" defun "), "{}", dumped);
}
