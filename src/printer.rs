use std::collections::HashSet;
use std::fmt::Write;

use crate::function::Function;
use crate::heap::Heap;
use crate::promise::PromiseState;
use crate::symbol::{sym, SymbolTable};
use crate::value::{PairId, Value, VectorId};

/// Nesting beyond this prints as `...`.
const MAX_DEPTH: usize = 1000;

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
enum Node {
    Pair(PairId),
    Vector(VectorId),
}

/// Print a value to a string. With `escape` strings are quoted and
/// escaped (`prin1`); without, they are written raw (`princ`).
/// `repeats` bounds how often an already-printed node may be re-entered,
/// so cyclic structure prints finitely.
pub fn print_val(
    val: Value,
    heap: &Heap,
    symbols: &SymbolTable,
    escape: bool,
    repeats: usize,
) -> String {
    let mut printer = Printer {
        heap,
        symbols,
        escape,
        repeats,
        seen: HashSet::new(),
        out: String::new(),
    };
    printer.value(val, 0);
    printer.out
}

/// Print a run of values as a bracketed sequence, as in argument dumps.
pub fn print_seq(vals: &[Value], heap: &Heap, symbols: &SymbolTable, repeats: usize) -> String {
    let items: Vec<String> = vals
        .iter()
        .map(|&v| print_val(v, heap, symbols, true, repeats))
        .collect();
    format!("[{}]", items.join(" "))
}

struct Printer<'a> {
    heap: &'a Heap,
    symbols: &'a SymbolTable,
    escape: bool,
    repeats: usize,
    seen: HashSet<Node>,
    out: String,
}

impl Printer<'_> {
    fn value(&mut self, val: Value, depth: usize) {
        if depth > MAX_DEPTH {
            self.out.push_str("...");
            return;
        }
        match val {
            Value::Nil => self.out.push_str("nil"),
            Value::Int(n) => {
                let _ = write!(self.out, "{}", n);
            }
            Value::Float(x) => {
                let _ = write!(self.out, "{:?}", x);
            }
            Value::BigInt(id) => {
                let _ = write!(self.out, "{}", self.heap.bigint(id));
            }
            Value::Str(id) => {
                let text = self.heap.string(id);
                if self.escape {
                    escape_string(text, &mut self.out);
                } else {
                    self.out.push_str(text);
                }
            }
            Value::Symbol(id) => self.out.push_str(self.symbols.name(id)),
            Value::Pair(id) => self.pair(id, depth),
            Value::Vector(id) => self.vector(id, depth),
            Value::Promise(id) => match self.heap.promise(id) {
                PromiseState::Delivered(v) => self.value(*v, depth + 1),
                PromiseState::Pending { .. } => {
                    let _ = write!(self.out, "#<promise:{}>", id.0);
                }
            },
            Value::Function(id) => self.function(self.heap.function(id), depth),
            Value::Arg(arg) => {
                let _ = write!(
                    self.out,
                    "#{}:{}:{}",
                    arg.level,
                    arg.offset,
                    self.symbols.name(arg.symbol)
                );
            }
            Value::Dummy(id) => {
                let name = self.symbols.name(self.heap.dummy_symbol(id));
                let _ = write!(self.out, ":{}:{}", name, id.0);
            }
            Value::Error(id) => {
                let _ = write!(self.out, "*** {}", self.heap.error(id).kind);
            }
            Value::Eof => self.out.push_str("#<eof>"),
        }
    }

    /// Enter a node. A node seen before costs one repeat; with none left
    /// the caller prints `...` instead.
    fn enter(&mut self, node: Node) -> Option<bool> {
        if self.seen.insert(node) {
            Some(false)
        } else if self.repeats == 0 {
            None
        } else {
            self.repeats -= 1;
            Some(true)
        }
    }

    fn pair(&mut self, id: PairId, depth: usize) {
        let Some(repeated) = self.enter(Node::Pair(id)) else {
            self.out.push_str("...");
            return;
        };
        let car = self.heap.car(id);
        let cdr = self.heap.cdr(id);
        if car == Value::Symbol(sym::QUOTE) {
            if let Value::Pair(rest) = cdr {
                if self.heap.cdr(rest).is_nil() {
                    self.out.push('\'');
                    self.value(self.heap.car(rest), depth + 1);
                    self.leave(repeated);
                    return;
                }
            }
        }
        self.out.push('(');
        self.value(car, depth + 1);
        self.tail(cdr, depth);
        self.out.push(')');
        self.leave(repeated);
    }

    fn tail(&mut self, mut cursor: Value, depth: usize) {
        loop {
            match cursor {
                Value::Nil => return,
                Value::Pair(next) if !self.seen.contains(&Node::Pair(next)) => {
                    self.seen.insert(Node::Pair(next));
                    self.out.push(' ');
                    self.value(self.heap.car(next), depth + 1);
                    cursor = self.heap.cdr(next);
                }
                other => {
                    self.out.push_str(" . ");
                    self.value(other, depth + 1);
                    return;
                }
            }
        }
    }

    fn leave(&mut self, repeated: bool) {
        if repeated {
            self.repeats += 1;
        }
    }

    fn vector(&mut self, id: VectorId, depth: usize) {
        let Some(repeated) = self.enter(Node::Vector(id)) else {
            self.out.push_str("...");
            return;
        };
        self.out.push('[');
        for (i, &item) in self.heap.vector(id).iter().enumerate() {
            if i > 0 {
                self.out.push(' ');
            }
            self.value(item, depth + 1);
        }
        self.out.push(']');
        self.leave(repeated);
    }

    fn function(&mut self, function: &Function, depth: usize) {
        let (label, shape, body) = match function {
            Function::Native(_) => {
                self.out.push_str(&function.signature());
                return;
            }
            Function::Lambda { shape, body } => ("#<lambda>", shape, *body),
            Function::Closure { shape, body, .. } => ("#<closure>", shape, *body),
            Function::Macro { shape, body } => ("#<macro>", shape, *body),
        };
        let _ = write!(self.out, "({} {}", label, shape.carity());
        self.tail(body, depth);
        self.out.push(')');
    }
}

fn escape_string(text: &str, out: &mut String) {
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\x07' => out.push_str("\\a"),
            '\x08' => out.push_str("\\b"),
            '\x0b' => out.push_str("\\v"),
            '\x0c' => out.push_str("\\f"),
            c if (c as u32) < 0x20 || c as u32 == 0x7f => {
                let _ = write!(out, "\\x{:02x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
}
