use crate::error::LispResult;
use crate::eval::Interp;
use crate::function::Native;
use crate::symbol::sym;
use crate::value::{SymbolId, Value};

impl Interp {
    /// Install the bindings every interpreter starts with:
    ///   - `*error*` = `*error*`, the tag that catches any error
    ///   - `t` = `t`
    ///   - `*version*` = `(9.4 "Rust")`
    ///   - `*eof*` = the end-of-file marker returned by `read`
    pub(crate) fn seed_globals(&mut self) -> LispResult<()> {
        macro_rules! def_global {
            ($sym:expr, $val:expr) => {
                let val = $val;
                self.globals.insert($sym, val);
            };
        }

        def_global!(sym::ERROR, Value::Symbol(sym::ERROR));
        def_global!(sym::T, Value::Symbol(sym::T));
        let implementation = self.heap.alloc_string("Rust");
        def_global!(sym::VERSION, self.heap.list(&[Value::Float(9.4), implementation])?);
        def_global!(sym::EOF, Value::Eof);
        Ok(())
    }

    /// Bind a native under its own name.
    pub(crate) fn define_native(&mut self, native: &'static Native) {
        let name = self.symbols.intern(native.name);
        let value = self.heap.alloc_function(crate::function::Function::Native(native));
        self.globals.insert(name, value);
    }

    /// The global value of `name`, if bound.
    pub fn global(&self, name: SymbolId) -> Option<Value> {
        self.globals.get(&name).copied()
    }

    pub fn set_global(&mut self, name: SymbolId, value: Value) {
        self.globals.insert(name, value);
    }

    /// Look a global up by its printed name.
    pub fn global_named(&self, name: &str) -> Option<Value> {
        self.symbols.lookup(name).and_then(|id| self.global(id))
    }

    /// Every global binding, ordered by symbol name.
    pub fn global_bindings(&self) -> Vec<(SymbolId, Value)> {
        let mut bindings: Vec<_> = self.globals.iter().map(|(&k, &v)| (k, v)).collect();
        bindings.sort_by(|a, b| self.symbols.name(a.0).cmp(self.symbols.name(b.0)));
        bindings
    }
}

#[cfg(test)]
mod tests {
    use crate::config::Config;
    use crate::eval::Interp;
    use crate::input::LinesFromStr;
    use crate::value::Value;
    use std::io;

    #[test]
    fn initial_bindings() {
        let interp = Interp::with_io(Config::bare(), Box::new(LinesFromStr::new("")), Box::new(io::sink())).unwrap();
        assert_eq!(interp.repr(interp.global_named("*version*").unwrap()), "(9.4 \"Rust\")");
        assert_eq!(interp.global_named("*eof*"), Some(Value::Eof));
        assert_eq!(interp.repr(interp.global_named("*error*").unwrap()), "*error*");
        assert_eq!(interp.repr(interp.global_named("car").unwrap()), "#<car:1>");
        assert_eq!(interp.global_named("no-such-thing"), None);
    }
}
