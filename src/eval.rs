use std::collections::HashMap;
use std::io::{self, Write};

use crate::builtins;
use crate::config::Config;
use crate::env::{self, Env};
use crate::error::{ErrorKind, LispError, LispResult};
use crate::function::{Function, Native};
use crate::heap::Heap;
use crate::input::{LineSource, LinesFromReader, LinesFromStdin, LinesFromStr};
use crate::printer::{print_seq, print_val};
use crate::promise::PromiseState;
use crate::reader::Reader;
use crate::symbol::{sym, SymbolTable};
use crate::value::{SymbolId, Value};

/// Dialect source evaluated when an interpreter starts.
const PRELUDE: &str = include_str!("prelude.l");

/// Gets the outcome of each top-level form when a script runs with a
/// receiver instead of stopping at the first error.
pub trait Receiver {
    fn receive_result(&mut self, interp: &Interp, value: Value);
    fn receive_error(&mut self, interp: &Interp, error: &LispError);
}

/// The interpreter. Owns every piece of state a program can reach.
pub struct Interp {
    pub heap: Heap,
    pub symbols: SymbolTable,
    pub(crate) globals: HashMap<SymbolId, Value>,
    /// Where the `read` native takes its forms from.
    pub(crate) input: Reader,
    pub(crate) out: Box<dyn Write>,
    pub config: Config,
}

/// The special forms, keyed by their keyword symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SpecialForm {
    Quote,
    Progn,
    Cond,
    Setq,
    Lambda,
    Macro,
    Catch,
    UnwindProtect,
    Delay,
}

impl SpecialForm {
    fn from_symbol(id: SymbolId) -> Option<Self> {
        Some(match id {
            sym::QUOTE => SpecialForm::Quote,
            sym::PROGN => SpecialForm::Progn,
            sym::COND => SpecialForm::Cond,
            sym::SETQ => SpecialForm::Setq,
            sym::LAMBDA => SpecialForm::Lambda,
            sym::MACRO => SpecialForm::Macro,
            sym::CATCH => SpecialForm::Catch,
            sym::UNWIND_PROTECT => SpecialForm::UnwindProtect,
            sym::DELAY => SpecialForm::Delay,
            _ => return None,
        })
    }
}

/// One turn of the trampoline: either a final value, or the next form to
/// evaluate in the same loop.
enum Step {
    Done(Value),
    Next(Value),
}

impl Interp {
    /// An interpreter reading from stdin and printing to stdout.
    pub fn new(config: Config) -> LispResult<Self> {
        Self::with_io(config, Box::new(LinesFromStdin), Box::new(io::stdout()))
    }

    /// An interpreter whose `read` draws from `input` and whose printing
    /// natives write to `out`.
    pub fn with_io(
        config: Config,
        input: Box<dyn LineSource>,
        out: Box<dyn Write>,
    ) -> LispResult<Self> {
        let mut interp = Interp {
            heap: Heap::new(config.heap_capacity),
            symbols: SymbolTable::new(),
            globals: HashMap::new(),
            input: Reader::new(input),
            out,
            config,
        };
        interp.seed_globals()?;
        builtins::install(&mut interp);
        if interp.config.load_prelude {
            log::debug!("loading prelude");
            interp.run_str(PRELUDE)?;
        }
        Ok(interp)
    }

    // ========================================================================
    // Script protocol
    // ========================================================================

    /// Read and evaluate every form of `source`. Without a receiver the
    /// first error stops the run; with one, each result and each error is
    /// handed over and reading goes on. I/O failures always stop the run.
    /// The source is closed in every case. Returns the last value.
    pub fn run(
        &mut self,
        source: Box<dyn LineSource>,
        mut receiver: Option<&mut dyn Receiver>,
    ) -> LispResult<Value> {
        log::debug!("script start");
        let mut reader = Reader::new(source);
        let result = self.read_eval_loop(&mut reader, &mut receiver);
        let closed = reader.close();
        log::debug!("script end");
        let value = result?;
        closed?;
        Ok(value)
    }

    fn read_eval_loop(
        &mut self,
        reader: &mut Reader,
        receiver: &mut Option<&mut dyn Receiver>,
    ) -> LispResult<Value> {
        let mut result = Value::Nil;
        loop {
            let outcome = match reader.read(&mut self.heap, &mut self.symbols) {
                Ok(Value::Eof) => return Ok(result),
                Ok(form) => {
                    log::trace!("eval {}", self.repr(form));
                    self.eval(form, &None)
                }
                Err(err) => Err(err),
            };
            match outcome {
                Ok(value) => {
                    result = value;
                    if let Some(r) = receiver.as_deref_mut() {
                        r.receive_result(self, value);
                    }
                }
                Err(err) => match receiver.as_deref_mut() {
                    Some(r) if !matches!(err.kind, ErrorKind::Io(_)) => r.receive_error(self, &err),
                    _ => return Err(err),
                },
            }
        }
    }

    /// Run the forms written in `text`, stopping at the first error.
    pub fn run_str(&mut self, text: &str) -> LispResult<Value> {
        self.run(Box::new(LinesFromStr::new(text)), None)
    }

    /// Run a source file, stopping at the first error.
    pub fn load(&mut self, path: &str) -> LispResult<Value> {
        log::debug!("loading {}", path);
        let source = LinesFromReader::open(path)?;
        self.run(Box::new(source), None)
    }

    // ========================================================================
    // Core evaluation
    // ========================================================================

    /// Evaluate `x` in `env`. A failure records the form being evaluated
    /// in the error's trace before propagating.
    pub fn eval(&mut self, x: Value, env: &Env) -> LispResult<Value> {
        let mut x = x;
        let mut env = env.clone();
        match self.eval_loop(&mut x, &mut env) {
            Ok(value) => Ok(value),
            Err(mut err) => {
                if err.trace.len() < self.config.max_traces {
                    err.push_trace(self.repr(x), self.config.max_traces);
                }
                Err(err)
            }
        }
    }

    /// The trampoline. Tail positions replace `x` and `env` and go round
    /// again instead of recursing.
    fn eval_loop(&mut self, x: &mut Value, env: &mut Env) -> LispResult<Value> {
        loop {
            match *x {
                Value::Symbol(id) => {
                    if let Some(&value) = self.globals.get(&id) {
                        return Ok(value);
                    }
                    if self.symbols.is_keyword(id) {
                        return Ok(*x);
                    }
                    return Err(LispError::void_variable(self.symbols.name(id)));
                }
                Value::Arg(arg) => {
                    return env::lookup(env, arg)
                        .ok_or_else(|| LispError::void_variable(self.repr(*x)));
                }
                Value::Pair(id) => {
                    let head = self.heap.car(id);
                    let args = self.cdr_cell(id)?;
                    if let Value::Symbol(name) = head {
                        if self.symbols.is_keyword(name) {
                            let Some(form) = SpecialForm::from_symbol(name) else {
                                return Err(LispError::bad_form(format!(
                                    "bad keyword: {}",
                                    self.symbols.name(name)
                                )));
                            };
                            match self.special_form(form, *x, args, env)? {
                                Step::Done(value) => return Ok(value),
                                Step::Next(next) => {
                                    *x = next;
                                    continue;
                                }
                            }
                        }
                    }
                    let callee = self.eval(head, env)?;
                    let callee = self.force(callee)?;
                    let Value::Function(fid) = callee else {
                        return Err(LispError::not_applicable(self.repr(callee)));
                    };
                    let function = self.heap.function(fid).clone();
                    match &function {
                        Function::Closure {
                            shape,
                            body,
                            env: captured,
                        } => {
                            let mut frame = self.make_frame(&function, args)?;
                            self.eval_frame(&mut frame, *shape, env)?;
                            *env = env::extend(frame, captured);
                            *x = self.eval_progn(*body, env)?;
                        }
                        Function::Macro { .. } => {
                            *x = self.expand_macro(&function, args)?;
                        }
                        Function::Native(native) => {
                            let mut frame = self.make_frame(&function, args)?;
                            if native.lazy {
                                self.eval_frame(&mut frame, native.shape, env)?;
                            } else {
                                self.eval_and_force_frame(&mut frame, native.shape, env)?;
                            }
                            return self.call_native(*native, &frame, env);
                        }
                        Function::Lambda { .. } => {
                            return Err(LispError::not_applicable(self.repr(callee)));
                        }
                    }
                }
                Value::Function(fid) => {
                    return match self.heap.function(fid) {
                        Function::Lambda { shape, body } => {
                            let closure = Function::Closure {
                                shape: *shape,
                                body: *body,
                                env: env.clone(),
                            };
                            Ok(self.heap.alloc_function(closure))
                        }
                        _ => Ok(*x),
                    };
                }
                other => return Ok(other),
            }
        }
    }

    fn special_form(
        &mut self,
        form: SpecialForm,
        whole: Value,
        args: Value,
        env: &Env,
    ) -> LispResult<Step> {
        match form {
            SpecialForm::Quote => match self.single_operand(args)? {
                Some(operand) => Ok(Step::Done(operand)),
                None => Err(LispError::bad_form("bad quote")),
            },
            SpecialForm::Progn => Ok(Step::Next(self.eval_progn(args, env)?)),
            SpecialForm::Cond => self.eval_cond(args, env),
            SpecialForm::Setq => Ok(Step::Done(self.eval_setq(args, env)?)),
            SpecialForm::Lambda => {
                let closure = self.compile(crate::compiler::TemplateKind::Closure, args, env)?;
                Ok(Step::Done(closure))
            }
            SpecialForm::Macro => {
                if env.is_some() {
                    return Err(LispError::bad_form(format!("nested macro: {}", self.repr(whole))));
                }
                let args = self.replace_dummies(args)?;
                let mac = self.compile(crate::compiler::TemplateKind::Macro, args, &None)?;
                Ok(Step::Done(mac))
            }
            SpecialForm::Catch => Ok(Step::Done(self.eval_catch(args, env)?)),
            SpecialForm::UnwindProtect => Ok(Step::Done(self.eval_unwind_protect(args, env)?)),
            SpecialForm::Delay => match self.single_operand(args)? {
                Some(expr) => {
                    let promise = PromiseState::Pending {
                        expr,
                        env: env.clone(),
                    };
                    Ok(Step::Done(self.heap.alloc_promise(promise)))
                }
                None => Err(LispError::bad_form("bad delay")),
            },
        }
    }

    /// The operand of a one-operand form, or `None` for any other count.
    fn single_operand(&mut self, args: Value) -> LispResult<Option<Value>> {
        let Value::Pair(id) = args else {
            return Ok(None);
        };
        if self.cdr_cell(id)?.is_nil() {
            Ok(Some(self.heap.car(id)))
        } else {
            Ok(None)
        }
    }

    /// Evaluate every form but the last and hand the last one back
    /// unevaluated, for the caller to continue with.
    pub(crate) fn eval_progn(&mut self, body: Value, env: &Env) -> LispResult<Value> {
        let mut cursor = body;
        while let Value::Pair(id) = cursor {
            let form = self.heap.car(id);
            let next = self.cdr_cell(id)?;
            if next.is_nil() {
                return Ok(form);
            }
            self.eval(form, env)?;
            cursor = next;
        }
        Ok(Value::Nil)
    }

    /// Evaluate forms in order and return the last value.
    pub(crate) fn eval_sequence(&mut self, body: Value, env: &Env) -> LispResult<Value> {
        let mut result = Value::Nil;
        let mut cursor = body;
        while let Value::Pair(id) = cursor {
            result = self.eval(self.heap.car(id), env)?;
            cursor = self.cdr_cell(id)?;
        }
        Ok(result)
    }

    fn eval_cond(&mut self, clauses: Value, env: &Env) -> LispResult<Step> {
        let mut cursor = clauses;
        while let Value::Pair(id) = cursor {
            match self.heap.car(id) {
                Value::Nil => {}
                Value::Pair(clause) => {
                    let test = self.eval(self.heap.car(clause), env)?;
                    let test = self.force(test)?;
                    if test.truthy() {
                        let body = self.cdr_cell(clause)?;
                        if body.is_nil() {
                            // Already evaluated; must not be evaluated again.
                            return Ok(Step::Done(test));
                        }
                        return Ok(Step::Next(self.eval_progn(body, env)?));
                    }
                }
                other => {
                    return Err(LispError::bad_form(format!(
                        "cond test expected: {}",
                        self.repr(other)
                    )));
                }
            }
            cursor = self.cdr_cell(id)?;
        }
        Ok(Step::Done(Value::Nil))
    }

    fn eval_setq(&mut self, args: Value, env: &Env) -> LispResult<Value> {
        let mut result = Value::Nil;
        let mut cursor = args;
        while let Value::Pair(id) = cursor {
            let target = self.heap.car(id);
            let Value::Pair(rhs) = self.cdr_cell(id)? else {
                return Err(LispError::bad_form("right value expected"));
            };
            result = self.eval(self.heap.car(rhs), env)?;
            match target {
                Value::Symbol(name) if self.symbols.is_keyword(name) => {
                    return Err(LispError::bad_form(format!(
                        "keyword not expected: {}",
                        self.symbols.name(name)
                    )));
                }
                Value::Symbol(name) => {
                    self.globals.insert(name, result);
                }
                Value::Arg(arg) if env::assign(env, arg, result) => {}
                other => return Err(LispError::variable_expected(self.repr(other))),
            }
            cursor = self.cdr_cell(rhs)?;
        }
        Ok(result)
    }

    fn eval_catch(&mut self, args: Value, env: &Env) -> LispResult<Value> {
        let Value::Pair(id) = args else {
            return Err(LispError::bad_form("tag and body expected"));
        };
        let tag = self.eval(self.heap.car(id), env)?;
        let tag = self.force(tag)?;
        let body = self.cdr_cell(id)?;
        let err = match self.eval_sequence(body, env) {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        let caught = match &err.kind {
            ErrorKind::Throw {
                tag: thrown, value, ..
            } if *thrown == tag => Some(*value),
            _ => None,
        };
        if let Some(value) = caught {
            return Ok(value);
        }
        if !err.is_throw() && tag == Value::Symbol(sym::ERROR) {
            return Ok(self.heap.alloc_error(err));
        }
        Err(err)
    }

    fn eval_unwind_protect(&mut self, args: Value, env: &Env) -> LispResult<Value> {
        let Value::Pair(id) = args else {
            return Err(LispError::bad_form("body and cleanup expected"));
        };
        let result = self.eval(self.heap.car(id), env);
        let cleanup = self.cdr_cell(id)?;
        self.eval_sequence(cleanup, env)?;
        result
    }

    // ========================================================================
    // Application
    // ========================================================================

    /// Apply `f` to an already evaluated argument list.
    pub fn apply(&mut self, f: Value, list: Value, env: &Env) -> LispResult<Value> {
        let f = self.force(f)?;
        let Value::Function(fid) = f else {
            return Err(LispError::not_applicable(self.repr(f)));
        };
        let function = self.heap.function(fid).clone();
        match &function {
            Function::Native(native) => {
                if !native.lazy {
                    self.force_each(list)?;
                }
                let frame = self.make_frame(&function, list)?;
                self.call_native(*native, &frame, env)
            }
            Function::Closure {
                body, env: captured, ..
            } => {
                let frame = self.make_frame(&function, list)?;
                let inner = env::extend(frame, captured);
                let last = self.eval_progn(*body, &inner)?;
                self.eval(last, &inner)
            }
            Function::Lambda { .. } | Function::Macro { .. } => {
                Err(LispError::not_applicable(self.repr(f)))
            }
        }
    }

    /// Run a native body. An untyped failure is rewritten to name the call.
    fn call_native(&mut self, native: &'static Native, frame: &[Value], env: &Env) -> LispResult<Value> {
        match (native.body)(self, frame, env) {
            Err(LispError {
                kind: ErrorKind::Native(message),
                ..
            }) => {
                let call = format!(
                    "{} {}",
                    Function::Native(native).signature(),
                    print_seq(frame, &self.heap, &self.symbols, self.config.max_print_repeats)
                );
                Err(LispError::new(ErrorKind::Call { message, call }))
            }
            other => other,
        }
    }

    /// Map `f` over a list, forcing promised tails on the way. The result
    /// is a fresh list.
    pub(crate) fn map_list<F>(&mut self, list: Value, mut f: F) -> LispResult<Value>
    where
        F: FnMut(&mut Interp, Value) -> LispResult<Value>,
    {
        let mut items = Vec::new();
        let mut cursor = list;
        loop {
            match cursor {
                Value::Nil => break,
                Value::Pair(id) => {
                    let item = self.heap.car(id);
                    items.push(f(self, item)?);
                    cursor = self.cdr_cell(id)?;
                }
                other => return Err(LispError::proper_list_expected(self.repr(other))),
            }
        }
        self.heap.list(&items)
    }

    // ========================================================================
    // Printing helpers
    // ========================================================================

    /// The `prin1` text of a value.
    pub fn repr(&self, val: Value) -> String {
        print_val(val, &self.heap, &self.symbols, true, self.config.max_print_repeats)
    }

    /// The `princ` text of a value.
    pub fn princ_string(&self, val: Value) -> String {
        print_val(val, &self.heap, &self.symbols, false, self.config.max_print_repeats)
    }

    pub(crate) fn write_out(&mut self, text: &str) -> LispResult<()> {
        self.out.write_all(text.as_bytes())?;
        Ok(())
    }

    pub fn flush(&mut self) -> LispResult<()> {
        self.out.flush()?;
        Ok(())
    }
}
