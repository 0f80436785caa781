use std::collections::HashMap;

use crate::env::{self, Env};
use crate::error::{LispError, LispResult};
use crate::eval::Interp;
use crate::function::{Function, Shape};
use crate::symbol::sym;
use crate::value::{Arg, DummyId, SymbolId, Value};

/// What `compile` should produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TemplateKind {
    /// A nested lambda; paired with an environment when evaluated.
    Lambda,
    Closure,
    Macro,
}

/// A formal parameter as it can appear in an argument list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Formal {
    Symbol(SymbolId),
    Dummy(DummyId),
}

/// Formals of one lambda or macro, mapped to their slot at level 0.
#[derive(Default)]
struct ArgTable {
    entries: HashMap<Formal, Arg>,
    arity: usize,
    has_rest: bool,
}

impl ArgTable {
    fn get(&self, formal: Formal) -> Option<Arg> {
        self.entries.get(&formal).copied()
    }
}

impl Interp {
    /// Compile `(formals body...)` into a callable of the given kind.
    /// Formals become static addresses, macros in the body are expanded,
    /// and nested lambdas become templates.
    pub(crate) fn compile(&mut self, kind: TemplateKind, form: Value, env: &Env) -> LispResult<Value> {
        let Value::Pair(id) = form else {
            return Err(LispError::bad_form("arglist and body expected"));
        };
        let table = self.make_arg_table(self.heap.car(id))?;
        let body = self.cdr_cell(id)?;
        let body = self.scan_for_args(body, &table)?;
        let body = self.expand_macros(body, self.config.max_macro_expansions)?;
        let body = self.compile_inners(body)?;
        let shape = Shape {
            arity: table.arity,
            has_rest: table.has_rest,
        };
        let function = match kind {
            TemplateKind::Lambda => Function::Lambda { shape, body },
            TemplateKind::Closure => Function::Closure {
                shape,
                body,
                env: env.clone(),
            },
            TemplateKind::Macro => {
                log::debug!("compiled macro of arity {}", shape.carity());
                Function::Macro { shape, body }
            }
        };
        Ok(self.heap.alloc_function(function))
    }

    fn make_arg_table(&mut self, formals: Value) -> LispResult<ArgTable> {
        if !(formals.is_nil() || formals.is_pair()) {
            return Err(LispError::bad_form(format!("arglist expected: {}", self.repr(formals))));
        }
        let mut table = ArgTable::default();
        let mut cursor = formals;
        while let Value::Pair(id) = cursor {
            let mut item = self.heap.car(id);
            cursor = self.cdr_cell(id)?;
            if table.has_rest {
                return Err(LispError::bad_form(format!("2nd rest: {}", self.repr(item))));
            }
            if item == Value::Symbol(sym::REST) {
                let Value::Pair(next) = cursor else {
                    return Err(LispError::variable_expected("nil"));
                };
                item = self.heap.car(next);
                cursor = self.cdr_cell(next)?;
                if item == Value::Symbol(sym::REST) {
                    return Err(LispError::variable_expected("&rest"));
                }
                table.has_rest = true;
            }
            let (formal, symbol) = match item {
                Value::Symbol(name) => (Formal::Symbol(name), name),
                // A name already resolved by an enclosing lambda, now shadowed.
                Value::Arg(arg) => (Formal::Symbol(arg.symbol), arg.symbol),
                Value::Dummy(dummy) => (Formal::Dummy(dummy), self.heap.dummy_symbol(dummy)),
                other => return Err(LispError::variable_expected(self.repr(other))),
            };
            if self.symbols.is_keyword(symbol) && matches!(formal, Formal::Symbol(_)) {
                return Err(LispError::bad_form(format!(
                    "keyword not expected: {}",
                    self.symbols.name(symbol)
                )));
            }
            let offset = table.arity as u32;
            table.entries.insert(
                formal,
                Arg {
                    level: 0,
                    offset,
                    symbol,
                },
            );
            table.arity += 1;
        }
        Ok(table)
    }

    /// Replace formals with their addresses. Addresses left by an enclosing
    /// compile refer one level further out, unless a formal here shadows them.
    fn scan_for_args(&mut self, j: Value, table: &ArgTable) -> LispResult<Value> {
        Ok(match j {
            Value::Symbol(name) => table.get(Formal::Symbol(name)).map_or(j, Value::Arg),
            Value::Dummy(dummy) => table.get(Formal::Dummy(dummy)).map_or(j, Value::Arg),
            Value::Arg(arg) => Value::Arg(table.get(Formal::Symbol(arg.symbol)).unwrap_or(Arg {
                level: arg.level + 1,
                ..arg
            })),
            Value::Pair(id) if self.heap.car(id) == Value::Symbol(sym::QUOTE) => j,
            Value::Pair(_) => self.map_list(j, |interp, x| interp.scan_for_args(x, table))?,
            _ => j,
        })
    }

    /// Expand macro calls throughout `j`. Each expansion of an expansion
    /// uses up one unit of `count`; running out is an error.
    fn expand_macros(&mut self, j: Value, count: usize) -> LispResult<Value> {
        let Value::Pair(id) = j else {
            return Ok(j);
        };
        let head = self.heap.car(id);
        if let Value::Symbol(sym::QUOTE | sym::LAMBDA | sym::MACRO) = head {
            return Ok(j);
        }
        let resolved = match head {
            Value::Symbol(name) => self.globals.get(&name).copied().unwrap_or(head),
            other => other,
        };
        if let Value::Function(fid) = resolved {
            let function = self.heap.function(fid).clone();
            if function.is_macro() {
                if count == 0 {
                    return Err(LispError::bad_form(format!(
                        "macro expansion too deep: {}",
                        self.repr(j)
                    )));
                }
                let args = self.cdr_cell(id)?;
                let expanded = self.expand_macro(&function, args)?;
                return self.expand_macros(expanded, count - 1);
            }
        }
        self.map_list(j, |interp, x| interp.expand_macros(x, count))
    }

    /// Turn nested `(lambda ...)` forms into templates.
    fn compile_inners(&mut self, j: Value) -> LispResult<Value> {
        let Value::Pair(id) = j else {
            return Ok(j);
        };
        match self.heap.car(id) {
            Value::Symbol(sym::QUOTE) => Ok(j),
            Value::Symbol(sym::LAMBDA) => {
                let rest = self.cdr_cell(id)?;
                self.compile(TemplateKind::Lambda, rest, &None)
            }
            Value::Symbol(sym::MACRO) => {
                Err(LispError::bad_form(format!("nested macro: {}", self.repr(j))))
            }
            _ => self.map_list(j, |interp, x| interp.compile_inners(x)),
        }
    }

    /// Swap every `$`-prefixed symbol in a macro definition for a dummy
    /// unique to this definition. Repeats of one name share a dummy.
    pub(crate) fn replace_dummies(&mut self, form: Value) -> LispResult<Value> {
        let mut names = HashMap::new();
        self.scan_for_dummies(form, &mut names)
    }

    fn scan_for_dummies(&mut self, j: Value, names: &mut HashMap<SymbolId, Value>) -> LispResult<Value> {
        match j {
            Value::Symbol(name) if self.symbols.is_dummy_name(name) => {
                let heap = &mut self.heap;
                Ok(*names.entry(name).or_insert_with(|| heap.alloc_dummy(name)))
            }
            Value::Pair(_) => self.map_list(j, |interp, x| interp.scan_for_dummies(x, names)),
            _ => Ok(j),
        }
    }

    /// Expand one macro call: bind the unevaluated arguments in a fresh
    /// frame and run the body.
    pub(crate) fn expand_macro(&mut self, function: &Function, args: Value) -> LispResult<Value> {
        let Function::Macro { body, .. } = function else {
            return Err(LispError::not_applicable(function.signature()));
        };
        let frame = self.make_frame(function, args)?;
        let env = env::extend(frame, &None);
        self.eval_sequence(*body, &env)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::input::LinesFromStr;
    use std::io;

    fn interp() -> Interp {
        Interp::with_io(Config::bare(), Box::new(LinesFromStr::new("")), Box::new(io::sink())).unwrap()
    }

    fn show(interp: &mut Interp, text: &str) -> String {
        match interp.run_str(text) {
            Ok(v) => interp.repr(v),
            Err(e) => e.message(),
        }
    }

    #[test]
    fn formals_become_addresses() {
        let mut interp = interp();
        assert_eq!(
            show(&mut interp, "(lambda (a b) (cons b a))"),
            "(#<closure> 2 (cons #0:1:b #0:0:a))"
        );
        assert_eq!(show(&mut interp, "(lambda (a &rest r) r)"), "(#<closure> -2 #0:1:r)");
    }

    #[test]
    fn nested_lambda_sees_outer_formals_one_level_up() {
        let mut interp = interp();
        assert_eq!(
            show(&mut interp, "(lambda (x y) (lambda (y) (cons x y)))"),
            "(#<closure> 2 (#<lambda> 1 (cons #1:0:x #0:0:y)))"
        );
    }

    #[test]
    fn quoted_forms_are_left_alone() {
        let mut interp = interp();
        assert_eq!(show(&mut interp, "(lambda (x) '(x))"), "(#<closure> 1 '(x))");
    }

    #[test]
    fn bad_argument_lists() {
        let mut interp = interp();
        assert_eq!(show(&mut interp, "(lambda)"), "arglist and body expected");
        assert_eq!(show(&mut interp, "(lambda 3 x)"), "arglist expected: 3");
        assert_eq!(show(&mut interp, "(lambda (&rest) x)"), "variable expected: nil");
        assert_eq!(show(&mut interp, "(lambda (&rest a b) x)"), "2nd rest: b");
        assert_eq!(show(&mut interp, "(lambda (&rest &rest) x)"), "variable expected: &rest");
        assert_eq!(show(&mut interp, "(lambda (1) x)"), "variable expected: 1");
        assert_eq!(show(&mut interp, "(lambda (:k) x)"), "keyword not expected: :k");
    }

    #[test]
    fn macros_expand_inside_lambda_bodies() {
        let mut interp = interp();
        interp
            .run_str("(setq twice (macro (e) (list 'progn e e)))")
            .unwrap();
        assert_eq!(
            show(&mut interp, "(lambda (x) (twice (f x)))"),
            "(#<closure> 1 (progn (f #0:0:x) (f #0:0:x)))"
        );
    }

    #[test]
    fn self_expanding_macro_is_cut_off() {
        let mut interp = interp();
        interp.run_str("(setq forever (macro (x) (list 'forever x)))").unwrap();
        assert_eq!(
            show(&mut interp, "(lambda () (forever 1))"),
            "macro expansion too deep: (forever 1)"
        );
    }

    #[test]
    fn nested_macro_is_rejected() {
        let mut interp = interp();
        assert_eq!(
            show(&mut interp, "(lambda () (macro (x) x))"),
            "nested macro: (macro (x) x)"
        );
    }

    #[test]
    fn dummies_are_shared_within_one_definition() {
        let mut interp = interp();
        let mac = interp.run_str("(macro ($a) (list $a $a $b))").unwrap();
        let text = interp.repr(mac);
        assert!(text.starts_with("(#<macro> 1 (list #0:0:$a #0:0:$a :$b:"), "{}", text);
    }
}
