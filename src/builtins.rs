use std::cmp::Ordering;

use crate::env::{self, Env};
use crate::error::{ErrorKind, LispError, LispResult};
use crate::eval::Interp;
use crate::function::{Function, Native, Shape};
use crate::input::LinesFromReader;
use crate::lexer::{parse_number, Atom};
use crate::number::Num;
use crate::symbol::sym;
use crate::value::Value;

macro_rules! native {
    ($name:expr, $shape:expr, $lazy:expr, $doc:expr, $body:expr) => {
        Native {
            name: $name,
            shape: $shape,
            lazy: $lazy,
            doc: $doc,
            body: $body,
        }
    };
}

const LAZY: bool = true;
const EAGER: bool = false;

/// Every native, in registration order.
pub static NATIVES: &[Native] = &[
    // Lists
    native!("car", Shape::fixed(1), EAGER, "(car '(a b c)) => a; (car nil) => nil", car),
    native!("cdr", Shape::fixed(1), EAGER, "(cdr '(a b c)) => (b c); (cdr nil) => nil", cdr),
    native!("cons", Shape::fixed(2), LAZY, "(cons 'a '(b c)) => (a b c)", cons),
    native!("list", Shape::rest(1), LAZY, "(list 1 2 3) => (1 2 3)", list),
    native!("append", Shape::rest(1), EAGER, "(append '(a) '(b) '(c)) => (a b c)", append),
    native!("length", Shape::fixed(1), EAGER, "(length x): elements in a list, vector or string", length),
    native!("rplaca", Shape::fixed(2), LAZY, "(rplaca x y): replace the car of x with y", rplaca),
    native!("rplacd", Shape::fixed(2), LAZY, "(rplacd x y): replace the cdr of x with y", rplacd),
    native!("mapcar", Shape::fixed(2), EAGER, "(mapcar f xs) => list of (f x) for each x", mapcar),
    native!("mapc", Shape::fixed(2), EAGER, "(mapc f xs): call f on each x; returns xs", mapc),
    // Predicates
    native!("atom", Shape::fixed(1), EAGER, "(atom x) => t unless x is a cons cell", atom),
    native!("eq", Shape::fixed(2), EAGER, "(eq x y) => t if x and y are the same object", eq),
    native!("eql", Shape::fixed(2), EAGER, "(eql x y) => t if eq, or numbers of one kind and value", eql),
    native!("stringp", Shape::fixed(1), EAGER, "(stringp x) => t if x is a string", stringp),
    native!("integerp", Shape::fixed(1), EAGER, "(integerp x) => t if x is an integer", integerp),
    native!("floatp", Shape::fixed(1), EAGER, "(floatp x) => t if x is a float", floatp),
    native!("symbolp", Shape::fixed(1), EAGER, "(symbolp x) => t if x is a symbol or nil", symbolp),
    native!("keywordp", Shape::fixed(1), EAGER, "(keywordp x) => t if x is a keyword", keywordp),
    native!("vectorp", Shape::fixed(1), EAGER, "(vectorp x) => t if x is a vector", vectorp),
    native!("string=", Shape::fixed(2), EAGER, "(string= s1 s2) => t if the texts are equal", string_eq),
    // Vectors
    native!("vector", Shape::rest(1), LAZY, "(vector 1 2 3) => [1 2 3]", vector),
    native!("make-vector", Shape::fixed(2), LAZY, "(make-vector n e) => vector of n copies of e", make_vector),
    native!("aref", Shape::fixed(2), EAGER, "(aref v i) => element i of a vector or string", aref),
    native!("aset", Shape::fixed(3), LAZY, "(aset v i x): store x at index i of v", aset),
    // Input and output
    native!("prin1", Shape::fixed(1), EAGER, "(prin1 x): print x, strings quoted", prin1),
    native!("princ", Shape::fixed(1), EAGER, "(princ x): print x, strings raw", princ),
    native!("terpri", Shape::fixed(0), EAGER, "(terpri): print a newline", terpri),
    native!("read", Shape::fixed(0), EAGER, "(read) => next form from input, or *eof*", read),
    native!("load", Shape::fixed(1), EAGER, "(load file): run a script file", load),
    // Arithmetic
    native!("+", Shape::rest(1), EAGER, "(+ 2 3) => 5; (+) => 0", add),
    native!("*", Shape::rest(1), EAGER, "(* 2 3) => 6; (*) => 1", mul),
    native!("-", Shape::rest(2), EAGER, "(- 10) => -10; (- 10 2) => 8", sub),
    native!("/", Shape::rest(3), EAGER, "(/ 6 5) => 1; (/ 6 5.0) => 1.2", div),
    native!("%", Shape::fixed(2), EAGER, "(% 7 3) => 1; (% -7 3) => -1", rem),
    native!("=", Shape::fixed(2), EAGER, "(= a b) => t if numerically equal", num_eq),
    native!("<", Shape::fixed(2), EAGER, "(< a b) => t if a is less than b", num_lt),
    native!("float", Shape::fixed(1), EAGER, "(float 3) => 3.0", float),
    native!("truncate", Shape::fixed(1), EAGER, "(truncate -2.7) => -2", truncate),
    // Evaluation
    native!("eval", Shape::fixed(1), EAGER, "(eval x) => x evaluated at top level", eval),
    native!("apply", Shape::fixed(2), EAGER, "(apply f '(a b)) => (f a b)", apply),
    native!("force", Shape::fixed(1), EAGER, "(force x) => x, with a promise delivered", force),
    native!("throw", Shape::fixed(2), LAZY, "(throw tag x): unwind to the catch for tag with x", throw),
    // Strings and sequences
    native!("string-to-char", Shape::fixed(1), EAGER, "(string-to-char \"ABC\") => 65", string_to_char),
    native!("number-to-string", Shape::fixed(1), EAGER, "(number-to-string -23) => \"-23\"", number_to_string),
    native!("string-to-number", Shape::fixed(1), EAGER, "(string-to-number \" 44.5 \") => 44.5", string_to_number),
    native!("_string+", Shape::fixed(2), EAGER, "(_string+ \"ab\" \"c\") => \"abc\"", string_plus),
    native!("_sequence-to-string", Shape::fixed(1), EAGER, "(_sequence-to-string '(65 66)) => \"AB\"", sequence_to_string),
    native!("_vector+", Shape::fixed(2), EAGER, "(_vector+ [1 2] [3]) => [1 2 3]", vector_plus),
    native!("_sequence-to-vector", Shape::fixed(1), EAGER, "(_sequence-to-vector \"ab\") => [97 98]", sequence_to_vector),
    native!("_list+", Shape::fixed(2), EAGER, "(_list+ '(a b) '(c)) => (a b c)", list_plus),
    native!("_sequence-to-list", Shape::fixed(1), EAGER, "(_sequence-to-list [1 2]) => (1 2)", sequence_to_list),
    // Introspection
    native!("dump", Shape::fixed(0), EAGER, "(dump) => ([global symbols...] (frames...))", dump),
    native!("help", Shape::fixed(1), EAGER, "(help f): print the documentation of a native", help),
    // Process
    native!("exit", Shape::rest(1), EAGER, "(exit) or (exit code): leave the interpreter", exit),
];

/// Bind every native in the global table.
pub fn install(interp: &mut Interp) {
    for native in NATIVES {
        interp.define_native(native);
    }
    log::debug!("registered {} natives", NATIVES.len());
}

// ============================================================================
// Argument helpers
// ============================================================================

fn boolean(b: bool) -> Value {
    if b {
        Value::Symbol(sym::T)
    } else {
        Value::Nil
    }
}

fn number(interp: &Interp, val: Value) -> LispResult<Num> {
    Num::from_value(val, &interp.heap)
        .ok_or_else(|| LispError::native(format!("number expected: {}", interp.repr(val))))
}

fn index(interp: &Interp, val: Value) -> LispResult<usize> {
    match val {
        Value::Int(n) if n >= 0 => Ok(n as usize),
        _ => Err(LispError::native(format!("index expected: {}", interp.repr(val)))),
    }
}

fn text(interp: &Interp, val: Value) -> LispResult<String> {
    match val {
        Value::Str(id) => Ok(interp.heap.string(id).to_string()),
        _ => Err(LispError::native(format!("string expected: {}", interp.repr(val)))),
    }
}

/// The elements of a proper list, forcing promised tails.
fn items(interp: &mut Interp, list: Value) -> LispResult<Vec<Value>> {
    let mut out = Vec::new();
    let mut cursor = list;
    loop {
        match cursor {
            Value::Nil => return Ok(out),
            Value::Pair(id) => {
                out.push(interp.heap.car(id));
                cursor = interp.cdr_cell(id)?;
            }
            other => return Err(LispError::proper_list_expected(interp.repr(other))),
        }
    }
}

/// The elements of a list, a vector, or the character codes of a string.
fn sequence(interp: &mut Interp, val: Value) -> LispResult<Vec<Value>> {
    match val {
        Value::Nil | Value::Pair(_) => items(interp, val),
        Value::Vector(id) => Ok(interp.heap.vector(id).to_vec()),
        Value::Str(id) => Ok(interp
            .heap
            .string(id)
            .chars()
            .map(|c| Value::Int(c as i64))
            .collect()),
        other => Err(LispError::native(format!("sequence expected: {}", interp.repr(other)))),
    }
}

fn pair(interp: &Interp, val: Value) -> LispResult<crate::value::PairId> {
    val.as_pair()
        .ok_or_else(|| LispError::native(format!("pair expected: {}", interp.repr(val))))
}

// ============================================================================
// Lists
// ============================================================================

/// (car x): first element; nil for nil.
fn car(interp: &mut Interp, args: &[Value], _env: &Env) -> LispResult<Value> {
    match args[0] {
        Value::Nil => Ok(Value::Nil),
        x => Ok(interp.heap.car(pair(interp, x)?)),
    }
}

/// (cdr x): the rest, which may still be a promise.
fn cdr(interp: &mut Interp, args: &[Value], _env: &Env) -> LispResult<Value> {
    match args[0] {
        Value::Nil => Ok(Value::Nil),
        x => Ok(interp.heap.cdr(pair(interp, x)?)),
    }
}

fn cons(interp: &mut Interp, args: &[Value], _env: &Env) -> LispResult<Value> {
    interp.heap.cons(args[0], args[1])
}

fn list(_interp: &mut Interp, args: &[Value], _env: &Env) -> LispResult<Value> {
    Ok(args[0])
}

/// (append xs...): copies all lists but the last, which is shared.
fn append(interp: &mut Interp, args: &[Value], _env: &Env) -> LispResult<Value> {
    let lists = items(interp, args[0])?;
    let Some((&last, init)) = lists.split_last() else {
        return Ok(Value::Nil);
    };
    let mut front = Vec::new();
    for &list in init {
        front.extend(items(interp, list)?);
    }
    interp.heap.list_with_tail(&front, last)
}

fn length(interp: &mut Interp, args: &[Value], _env: &Env) -> LispResult<Value> {
    let n = match args[0] {
        Value::Str(id) => interp.heap.string(id).chars().count(),
        Value::Vector(id) => interp.heap.vector(id).len(),
        x => items(interp, x)?.len(),
    };
    Ok(Value::Int(n as i64))
}

/// (rplaca x y): y is stored as given, promise or not.
fn rplaca(interp: &mut Interp, args: &[Value], _env: &Env) -> LispResult<Value> {
    let target = interp.force(args[0])?;
    let id = pair(interp, target)?;
    interp.heap.set_car(id, args[1]);
    Ok(args[1])
}

fn rplacd(interp: &mut Interp, args: &[Value], _env: &Env) -> LispResult<Value> {
    let target = interp.force(args[0])?;
    let id = pair(interp, target)?;
    interp.heap.set_cdr(id, args[1]);
    Ok(args[1])
}

fn mapcar(interp: &mut Interp, args: &[Value], env: &Env) -> LispResult<Value> {
    let elements = sequence(interp, args[1])?;
    let mut results = Vec::with_capacity(elements.len());
    for element in elements {
        let arg = interp.heap.list(&[element])?;
        results.push(interp.apply(args[0], arg, env)?);
    }
    interp.heap.list(&results)
}

fn mapc(interp: &mut Interp, args: &[Value], env: &Env) -> LispResult<Value> {
    for element in sequence(interp, args[1])? {
        let arg = interp.heap.list(&[element])?;
        interp.apply(args[0], arg, env)?;
    }
    Ok(args[1])
}

// ============================================================================
// Predicates
// ============================================================================

fn atom(_interp: &mut Interp, args: &[Value], _env: &Env) -> LispResult<Value> {
    Ok(boolean(args[0].is_atom()))
}

/// Identity. Floats are immediates, so two floats are `eq` when their bits match.
fn same(a: Value, b: Value) -> bool {
    match (a, b) {
        (Value::Float(x), Value::Float(y)) => x.to_bits() == y.to_bits(),
        _ => a == b,
    }
}

fn eq(_interp: &mut Interp, args: &[Value], _env: &Env) -> LispResult<Value> {
    Ok(boolean(same(args[0], args[1])))
}

fn eql(interp: &mut Interp, args: &[Value], _env: &Env) -> LispResult<Value> {
    if same(args[0], args[1]) {
        return Ok(Value::Symbol(sym::T));
    }
    let numeric = match (
        Num::from_value(args[0], &interp.heap),
        Num::from_value(args[1], &interp.heap),
    ) {
        (Some(a), Some(b)) => a.eql(&b),
        _ => false,
    };
    Ok(boolean(numeric))
}

fn stringp(_interp: &mut Interp, args: &[Value], _env: &Env) -> LispResult<Value> {
    Ok(boolean(matches!(args[0], Value::Str(_))))
}

fn integerp(_interp: &mut Interp, args: &[Value], _env: &Env) -> LispResult<Value> {
    Ok(boolean(matches!(args[0], Value::Int(_) | Value::BigInt(_))))
}

fn floatp(_interp: &mut Interp, args: &[Value], _env: &Env) -> LispResult<Value> {
    Ok(boolean(matches!(args[0], Value::Float(_))))
}

fn symbolp(_interp: &mut Interp, args: &[Value], _env: &Env) -> LispResult<Value> {
    Ok(boolean(matches!(args[0], Value::Nil | Value::Symbol(_))))
}

fn keywordp(interp: &mut Interp, args: &[Value], _env: &Env) -> LispResult<Value> {
    Ok(boolean(matches!(args[0], Value::Symbol(id) if interp.symbols.is_keyword(id))))
}

fn vectorp(_interp: &mut Interp, args: &[Value], _env: &Env) -> LispResult<Value> {
    Ok(boolean(matches!(args[0], Value::Vector(_))))
}

/// (string= a b): strings, symbols and nil compare by their text.
fn string_eq(interp: &mut Interp, args: &[Value], _env: &Env) -> LispResult<Value> {
    let as_text = |val: Value| -> LispResult<String> {
        match val {
            Value::Nil => Ok("nil".to_string()),
            _ => interp
                .heap
                .text_of(val, &interp.symbols)
                .map(str::to_string)
                .ok_or_else(|| {
                    LispError::native(format!("string or symbol expected: {}", interp.repr(val)))
                }),
        }
    };
    Ok(boolean(as_text(args[0])? == as_text(args[1])?))
}

// ============================================================================
// Vectors
// ============================================================================

fn vector(interp: &mut Interp, args: &[Value], _env: &Env) -> LispResult<Value> {
    let elements = items(interp, args[0])?;
    Ok(interp.heap.alloc_vector(elements))
}

fn make_vector(interp: &mut Interp, args: &[Value], _env: &Env) -> LispResult<Value> {
    let n = interp.force(args[0])?;
    let n = index(interp, n)?;
    Ok(interp.heap.alloc_vector(vec![args[1]; n]))
}

/// (aref v i): for a string, the character code at i.
fn aref(interp: &mut Interp, args: &[Value], _env: &Env) -> LispResult<Value> {
    let i = index(interp, args[1])?;
    let found = match args[0] {
        Value::Vector(id) => interp.heap.vector(id).get(i).copied(),
        Value::Str(id) => interp.heap.string(id).chars().nth(i).map(|c| Value::Int(c as i64)),
        other => {
            return Err(LispError::native(format!(
                "vector or string expected: {}",
                interp.repr(other)
            )))
        }
    };
    found.ok_or_else(|| LispError::native(format!("index out of range: {}", i)))
}

fn aset(interp: &mut Interp, args: &[Value], _env: &Env) -> LispResult<Value> {
    let target = interp.force(args[0])?;
    let i = interp.force(args[1])?;
    let i = index(interp, i)?;
    let Value::Vector(id) = target else {
        return Err(LispError::native(format!("vector expected: {}", interp.repr(target))));
    };
    match interp.heap.vector_mut(id).get_mut(i) {
        Some(slot) => *slot = args[2],
        None => return Err(LispError::native(format!("index out of range: {}", i))),
    }
    Ok(args[2])
}

// ============================================================================
// Input and output
// ============================================================================

fn prin1(interp: &mut Interp, args: &[Value], _env: &Env) -> LispResult<Value> {
    let text = interp.repr(args[0]);
    interp.write_out(&text)?;
    interp.flush()?;
    Ok(args[0])
}

fn princ(interp: &mut Interp, args: &[Value], _env: &Env) -> LispResult<Value> {
    let text = interp.princ_string(args[0]);
    interp.write_out(&text)?;
    interp.flush()?;
    Ok(args[0])
}

fn terpri(interp: &mut Interp, _args: &[Value], _env: &Env) -> LispResult<Value> {
    interp.write_out("\n")?;
    interp.flush()?;
    Ok(Value::Symbol(sym::T))
}

fn read(interp: &mut Interp, _args: &[Value], _env: &Env) -> LispResult<Value> {
    interp.input.read(&mut interp.heap, &mut interp.symbols)
}

fn load(interp: &mut Interp, args: &[Value], _env: &Env) -> LispResult<Value> {
    let path = text(interp, args[0])?;
    log::debug!("loading {}", path);
    let source = LinesFromReader::open(&path).map_err(|e| LispError::native(e.to_string()))?;
    interp.run(Box::new(source), None)
}

// ============================================================================
// Arithmetic
// ============================================================================

fn fold(
    interp: &mut Interp,
    first: Num,
    rest: Value,
    op: fn(Num, Num) -> Result<Num, String>,
) -> LispResult<Value> {
    let mut acc = first;
    for val in items(interp, rest)? {
        let operand = number(interp, val)?;
        acc = op(acc, operand).map_err(LispError::native)?;
    }
    Ok(acc.into_value(&mut interp.heap))
}

fn add(interp: &mut Interp, args: &[Value], _env: &Env) -> LispResult<Value> {
    fold(interp, Num::Int(0), args[0], |a, b| Ok(a.add(b)))
}

fn mul(interp: &mut Interp, args: &[Value], _env: &Env) -> LispResult<Value> {
    fold(interp, Num::Int(1), args[0], |a, b| Ok(a.mul(b)))
}

/// (- x): negation; (- x y...): successive subtraction.
fn sub(interp: &mut Interp, args: &[Value], _env: &Env) -> LispResult<Value> {
    let first = number(interp, args[0])?;
    if args[1].is_nil() {
        return Ok(first.neg().into_value(&mut interp.heap));
    }
    fold(interp, first, args[1], |a, b| Ok(a.sub(b)))
}

fn div(interp: &mut Interp, args: &[Value], _env: &Env) -> LispResult<Value> {
    let first = number(interp, args[0])?;
    let divisor = number(interp, args[1])?;
    let quotient = first.div(divisor).map_err(LispError::native)?;
    fold(interp, quotient, args[2], Num::div)
}

fn rem(interp: &mut Interp, args: &[Value], _env: &Env) -> LispResult<Value> {
    let a = number(interp, args[0])?;
    let b = number(interp, args[1])?;
    let r = a.rem(b).map_err(LispError::native)?;
    Ok(r.into_value(&mut interp.heap))
}

fn compare(interp: &Interp, args: &[Value]) -> LispResult<Option<Ordering>> {
    let a = number(interp, args[0])?;
    let b = number(interp, args[1])?;
    Ok(a.compare(&b))
}

fn num_eq(interp: &mut Interp, args: &[Value], _env: &Env) -> LispResult<Value> {
    Ok(boolean(compare(interp, args)? == Some(Ordering::Equal)))
}

fn num_lt(interp: &mut Interp, args: &[Value], _env: &Env) -> LispResult<Value> {
    Ok(boolean(compare(interp, args)? == Some(Ordering::Less)))
}

fn float(interp: &mut Interp, args: &[Value], _env: &Env) -> LispResult<Value> {
    Ok(Value::Float(number(interp, args[0])?.to_f64()))
}

fn truncate(interp: &mut Interp, args: &[Value], _env: &Env) -> LispResult<Value> {
    let n = number(interp, args[0])?.truncate().map_err(LispError::native)?;
    Ok(n.into_value(&mut interp.heap))
}

// ============================================================================
// Evaluation
// ============================================================================

fn eval(interp: &mut Interp, args: &[Value], _env: &Env) -> LispResult<Value> {
    interp.eval(args[0], &None)
}

fn apply(interp: &mut Interp, args: &[Value], env: &Env) -> LispResult<Value> {
    interp.apply(args[0], args[1], env)
}

/// (force x): the argument arrives already forced.
fn force(_interp: &mut Interp, args: &[Value], _env: &Env) -> LispResult<Value> {
    Ok(args[0])
}

/// (throw tag x): x is thrown as is, even if still a promise.
fn throw(interp: &mut Interp, args: &[Value], _env: &Env) -> LispResult<Value> {
    let tag = interp.force(args[0])?;
    let value = args[1];
    let repr = format!("({} {})", interp.repr(tag), interp.repr(value));
    Err(LispError::new(ErrorKind::Throw { tag, value, repr }))
}

// ============================================================================
// Strings and sequences
// ============================================================================

fn string_to_char(interp: &mut Interp, args: &[Value], _env: &Env) -> LispResult<Value> {
    let s = text(interp, args[0])?;
    Ok(Value::Int(s.chars().next().map_or(0, |c| c as i64)))
}

fn number_to_string(interp: &mut Interp, args: &[Value], _env: &Env) -> LispResult<Value> {
    let n = number(interp, args[0])?;
    Ok(interp.heap.alloc_string(n.to_string()))
}

/// (string-to-number s): text that does not read as a number gives 0.
fn string_to_number(interp: &mut Interp, args: &[Value], _env: &Env) -> LispResult<Value> {
    let s = text(interp, args[0])?;
    Ok(match parse_number(s.trim()) {
        Some(Atom::Int(n)) => Value::Int(n),
        Some(Atom::Float(x)) => Value::Float(x),
        Some(Atom::BigInt(n)) => Num::Big(n).into_value(&mut interp.heap),
        _ => Value::Int(0),
    })
}

fn string_plus(interp: &mut Interp, args: &[Value], _env: &Env) -> LispResult<Value> {
    let joined = text(interp, args[0])? + &text(interp, args[1])?;
    Ok(interp.heap.alloc_string(joined))
}

fn sequence_to_string(interp: &mut Interp, args: &[Value], _env: &Env) -> LispResult<Value> {
    if let Value::Str(_) = args[0] {
        return Ok(args[0]);
    }
    let mut out = String::new();
    for code in sequence(interp, args[0])? {
        let c = match code {
            Value::Int(n) => u32::try_from(n).ok().and_then(char::from_u32),
            _ => None,
        };
        match c {
            Some(c) => out.push(c),
            None => {
                return Err(LispError::native(format!(
                    "character code expected: {}",
                    interp.repr(code)
                )))
            }
        }
    }
    Ok(interp.heap.alloc_string(out))
}

fn vector_plus(interp: &mut Interp, args: &[Value], _env: &Env) -> LispResult<Value> {
    let (Value::Vector(a), Value::Vector(b)) = (args[0], args[1]) else {
        return Err(LispError::native("vectors expected"));
    };
    let mut joined = interp.heap.vector(a).to_vec();
    joined.extend_from_slice(interp.heap.vector(b));
    Ok(interp.heap.alloc_vector(joined))
}

fn sequence_to_vector(interp: &mut Interp, args: &[Value], _env: &Env) -> LispResult<Value> {
    let elements = sequence(interp, args[0])?;
    Ok(interp.heap.alloc_vector(elements))
}

/// (_list+ xs tail): a copy of xs ending in tail.
fn list_plus(interp: &mut Interp, args: &[Value], _env: &Env) -> LispResult<Value> {
    let front = items(interp, args[0])?;
    interp.heap.list_with_tail(&front, args[1])
}

fn sequence_to_list(interp: &mut Interp, args: &[Value], _env: &Env) -> LispResult<Value> {
    if let Value::Nil | Value::Pair(_) = args[0] {
        return Ok(args[0]);
    }
    let elements = sequence(interp, args[0])?;
    interp.heap.list(&elements)
}

// ============================================================================
// Introspection and process
// ============================================================================

/// (dump): the globally bound symbols and the caller's frames.
fn dump(interp: &mut Interp, _args: &[Value], env: &Env) -> LispResult<Value> {
    let names: Vec<Value> = interp
        .global_bindings()
        .into_iter()
        .map(|(name, _)| Value::Symbol(name))
        .collect();
    let names = interp.heap.alloc_vector(names);
    let frames: Vec<Value> = env::frames(env)
        .into_iter()
        .map(|slots| interp.heap.alloc_vector(slots))
        .collect();
    let frames = interp.heap.list(&frames)?;
    interp.heap.list(&[names, frames])
}

fn help(interp: &mut Interp, args: &[Value], _env: &Env) -> LispResult<Value> {
    if let Value::Function(id) = args[0] {
        if let Function::Native(native) = interp.heap.function(id) {
            let doc = format!("{}\n", native.doc);
            interp.write_out(&doc)?;
            interp.flush()?;
        }
    }
    Ok(args[0])
}

fn exit(interp: &mut Interp, args: &[Value], _env: &Env) -> LispResult<Value> {
    let code = match items(interp, args[0])?.first() {
        None => 0,
        Some(&Value::Int(n)) => n as i32,
        Some(&other) => return Err(LispError::native(format!("exit code expected: {}", interp.repr(other)))),
    };
    interp.flush()?;
    log::debug!("exit {}", code);
    std::process::exit(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::input::LinesFromStr;
    use std::cell::RefCell;
    use std::io::{self, Write};
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct Sink(Rc<RefCell<Vec<u8>>>);

    impl Write for Sink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn interp_with(input: &str) -> (Interp, Sink) {
        let sink = Sink::default();
        let interp = Interp::with_io(Config::bare(), Box::new(LinesFromStr::new(input)), Box::new(sink.clone())).unwrap();
        (interp, sink)
    }

    fn show(interp: &mut Interp, text: &str) -> String {
        match interp.run_str(text) {
            Ok(v) => interp.repr(v),
            Err(e) => e.message(),
        }
    }

    #[test]
    fn natives_have_unique_names() {
        let mut names: Vec<_> = NATIVES.iter().map(|n| n.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), NATIVES.len());
    }

    #[test]
    fn list_operations() {
        let (mut interp, _) = interp_with("");
        assert_eq!(show(&mut interp, "(car '(a b))"), "a");
        assert_eq!(show(&mut interp, "(cdr nil)"), "nil");
        assert_eq!(show(&mut interp, "(append '(1 2) nil '(3) '(4 . 5))"), "(1 2 3 4 . 5)");
        assert_eq!(show(&mut interp, "(append)"), "nil");
        assert_eq!(show(&mut interp, "(length '(1 2 3))"), "3");
        assert_eq!(show(&mut interp, "(length \"héllo\")"), "5");
        assert_eq!(show(&mut interp, "(mapcar car '((1) (2)))"), "(1 2)");
        assert_eq!(show(&mut interp, "(setq x (list 1 2)) (rplaca x 9) x"), "(9 2)");
        assert_eq!(show(&mut interp, "(car 5)"), "pair expected: 5 -- #<car:1> [5]");
    }

    #[test]
    fn arithmetic() {
        let (mut interp, _) = interp_with("");
        assert_eq!(show(&mut interp, "(+)"), "0");
        assert_eq!(show(&mut interp, "(+ 1 2.5)"), "3.5");
        assert_eq!(show(&mut interp, "(- 5)"), "-5");
        assert_eq!(show(&mut interp, "(- 10 2 3)"), "5");
        assert_eq!(show(&mut interp, "(/ 7 2)"), "3");
        assert_eq!(show(&mut interp, "(/ 100 2 5)"), "10");
        assert_eq!(show(&mut interp, "(% -7 3)"), "-1");
        assert_eq!(show(&mut interp, "(* 4611686018427387904 4)"), "18446744073709551616");
        assert_eq!(show(&mut interp, "(/ 1 0)"), "division by zero -- #</:-3> [1 0 nil]");
        assert_eq!(show(&mut interp, "(< 1 2)"), "t");
        assert_eq!(show(&mut interp, "(= 2 2.0)"), "t");
        assert_eq!(show(&mut interp, "(eql 2 2.0)"), "nil");
        assert_eq!(show(&mut interp, "(setq nan (/ 0.0 0.0)) (eq nan nan)"), "t");
        assert_eq!(show(&mut interp, "(eql nan nan)"), "t");
        assert_eq!(show(&mut interp, "(eq 0.0 -0.0)"), "nil");
        assert_eq!(show(&mut interp, "(eq 1.5 1.5)"), "t");
        assert_eq!(show(&mut interp, "(truncate -2.5)"), "-2");
        assert_eq!(show(&mut interp, "(float 3)"), "3.0");
        assert_eq!(show(&mut interp, "(+ 'a 1)"), "number expected: a -- #<+:-1> [(a 1)]");
    }

    #[test]
    fn strings_and_sequences() {
        let (mut interp, _) = interp_with("");
        assert_eq!(show(&mut interp, "(string-to-char \"ABC\")"), "65");
        assert_eq!(show(&mut interp, "(string-to-number \" 44.5 \")"), "44.5");
        assert_eq!(show(&mut interp, "(string-to-number \"x\")"), "0");
        assert_eq!(show(&mut interp, "(number-to-string -23)"), "\"-23\"");
        assert_eq!(show(&mut interp, "(_string+ \"ab\" \"c\")"), "\"abc\"");
        assert_eq!(show(&mut interp, "(_sequence-to-string '(72 105))"), "\"Hi\"");
        assert_eq!(show(&mut interp, "(_sequence-to-vector \"ab\")"), "[97 98]");
        assert_eq!(show(&mut interp, "(_vector+ [1] [2 3])"), "[1 2 3]");
        assert_eq!(show(&mut interp, "(_list+ '(a b) 'c)"), "(a b . c)");
        assert_eq!(show(&mut interp, "(_sequence-to-list [1 2])"), "(1 2)");
        assert_eq!(show(&mut interp, "(string= 'abc \"abc\")"), "t");
    }

    #[test]
    fn vectors() {
        let (mut interp, _) = interp_with("");
        assert_eq!(show(&mut interp, "(make-vector 2 'x)"), "[x x]");
        assert_eq!(show(&mut interp, "(setq v (vector 1 2 3)) (aset v 1 'b) v"), "[1 b 3]");
        assert_eq!(show(&mut interp, "(aref \"AB\" 1)"), "66");
        assert_eq!(show(&mut interp, "(aref [1] 3)"), "index out of range: 3 -- #<aref:2> [[1] 3]");
    }

    #[test]
    fn printing_and_reading() {
        let (mut interp, sink) = interp_with("(a b) 7");
        interp.run_str("(prin1 \"x\") (princ \"y\") (terpri) (help car)").unwrap();
        let printed = String::from_utf8(sink.0.borrow().clone()).unwrap();
        assert_eq!(printed, "\"x\"y\n(car '(a b c)) => a; (car nil) => nil\n");
        assert_eq!(show(&mut interp, "(read)"), "(a b)");
        assert_eq!(show(&mut interp, "(read)"), "7");
        assert_eq!(show(&mut interp, "(eq (read) *eof*)"), "t");
    }

    #[test]
    fn dump_lists_globals_and_frames() {
        let (mut interp, _) = interp_with("");
        let text = show(&mut interp, "((lambda (a) (dump)) 5)");
        assert!(text.ends_with(" ([5]))"), "{}", text);
        assert!(text.contains(" car "), "{}", text);
    }
}
