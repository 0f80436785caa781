use crate::env::Env;
use crate::error::{LispError, LispResult};
use crate::eval::Interp;
use crate::value::{PairId, PromiseId, Value};

/// A `delay`ed computation. Once delivered the expression and environment
/// are dropped and only the value remains.
#[derive(Clone)]
pub enum PromiseState {
    Pending { expr: Value, env: Env },
    Delivered(Value),
}

impl Interp {
    /// Deliver `value` if it is a promise; any other value is returned as is.
    pub fn force(&mut self, value: Value) -> LispResult<Value> {
        match value {
            Value::Promise(id) => self.deliver(id),
            other => Ok(other),
        }
    }

    /// Evaluate a promise at most once. A promise yielding another promise
    /// is forced through. If evaluating the expression already delivered
    /// this same promise, the first delivered value wins.
    pub fn deliver(&mut self, id: PromiseId) -> LispResult<Value> {
        let (expr, env) = match self.heap.promise(id) {
            PromiseState::Delivered(value) => return Ok(*value),
            PromiseState::Pending { expr, env } => (*expr, env.clone()),
        };
        let mut value = self.eval(expr, &env)?;
        if let Value::Promise(inner) = value {
            value = self.deliver(inner)?;
        }
        match self.heap.promise(id) {
            PromiseState::Delivered(first) => Ok(*first),
            PromiseState::Pending { .. } => {
                self.heap.set_promise(id, PromiseState::Delivered(value));
                Ok(value)
            }
        }
    }

    /// The delivered value, or the promise itself while still pending.
    pub fn promise_value(&self, id: PromiseId) -> Value {
        match self.heap.promise(id) {
            PromiseState::Delivered(value) => *value,
            PromiseState::Pending { .. } => Value::Promise(id),
        }
    }

    /// Next cell of a list. A promise in the tail is forced and the cell is
    /// updated with the result; anything but a cell or nil is an error.
    pub fn cdr_cell(&mut self, id: PairId) -> LispResult<Value> {
        let mut tail = self.heap.cdr(id);
        if let Value::Promise(_) = tail {
            tail = self.force(tail)?;
            self.heap.set_cdr(id, tail);
        }
        match tail {
            Value::Nil | Value::Pair(_) => Ok(tail),
            _ => Err(LispError::proper_list_expected(self.repr(Value::Pair(id)))),
        }
    }

    /// Force every element of a list in place, tails included.
    pub fn force_each(&mut self, list: Value) -> LispResult<()> {
        let mut cursor = list;
        while let Value::Pair(id) = cursor {
            let item = self.force(self.heap.car(id))?;
            self.heap.set_car(id, item);
            cursor = self.cdr_cell(id)?;
        }
        Ok(())
    }
}
