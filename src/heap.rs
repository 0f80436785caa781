use num_bigint::BigInt;

use crate::error::{ErrorKind, LispError, LispResult};
use crate::function::Function;
use crate::promise::PromiseState;
use crate::symbol::SymbolTable;
use crate::value::{
    BigId, DummyId, ErrorId, FunctionId, PairId, PromiseId, StrId, SymbolId, Value, VectorId,
};

/// A single cons cell.
pub struct ConsCell {
    pub car: Value,
    pub cdr: Value,
}

/// Owner of every boxed value. Values refer into these tables by index;
/// nothing is ever freed.
pub struct Heap {
    cells: Vec<ConsCell>,
    capacity: usize,
    strings: Vec<String>,
    bigints: Vec<BigInt>,
    vectors: Vec<Vec<Value>>,
    promises: Vec<PromiseState>,
    functions: Vec<Function>,
    dummies: Vec<SymbolId>,
    errors: Vec<LispError>,
}

impl Heap {
    pub fn new(capacity: usize) -> Self {
        Heap {
            cells: Vec::with_capacity(1024),
            capacity,
            strings: Vec::new(),
            bigints: Vec::new(),
            vectors: Vec::new(),
            promises: Vec::new(),
            functions: Vec::new(),
            dummies: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Fails with `HeapOverflow` once `capacity` cells exist.
    pub fn alloc(&mut self, car: Value, cdr: Value) -> LispResult<PairId> {
        if self.cells.len() >= self.capacity {
            return Err(ErrorKind::HeapOverflow(self.capacity).into());
        }
        let id = PairId(self.cells.len() as u32);
        self.cells.push(ConsCell { car, cdr });
        Ok(id)
    }

    pub fn cons(&mut self, car: Value, cdr: Value) -> LispResult<Value> {
        Ok(Value::Pair(self.alloc(car, cdr)?))
    }

    #[inline]
    pub fn car(&self, id: PairId) -> Value {
        self.cells[id.0 as usize].car
    }

    #[inline]
    pub fn cdr(&self, id: PairId) -> Value {
        self.cells[id.0 as usize].cdr
    }

    #[inline]
    pub fn set_car(&mut self, id: PairId, val: Value) {
        self.cells[id.0 as usize].car = val;
    }

    #[inline]
    pub fn set_cdr(&mut self, id: PairId, val: Value) {
        self.cells[id.0 as usize].cdr = val;
    }

    /// `(v0 v1 ...)`
    pub fn list(&mut self, values: &[Value]) -> LispResult<Value> {
        self.list_with_tail(values, Value::Nil)
    }

    /// Build a list ending in `tail` instead of nil.
    pub fn list_with_tail(&mut self, values: &[Value], tail: Value) -> LispResult<Value> {
        let mut result = tail;
        for &val in values.iter().rev() {
            result = self.cons(val, result)?;
        }
        Ok(result)
    }

    /// Collect a proper list into a Vec without forcing anything.
    /// Returns None if not a proper list or if it is cyclic.
    pub fn list_to_vec(&self, val: Value) -> Option<Vec<Value>> {
        let mut result = Vec::new();
        let mut current = val;
        loop {
            match current {
                Value::Nil => return Some(result),
                Value::Pair(id) => {
                    if result.len() > self.cells.len() {
                        return None;
                    }
                    result.push(self.car(id));
                    current = self.cdr(id);
                }
                _ => return None,
            }
        }
    }

    pub fn total_cells(&self) -> usize {
        self.cells.len()
    }

    pub fn alloc_string(&mut self, text: impl Into<String>) -> Value {
        let id = StrId(self.strings.len() as u32);
        self.strings.push(text.into());
        Value::Str(id)
    }

    pub fn string(&self, id: StrId) -> &str {
        &self.strings[id.0 as usize]
    }

    /// Store a bignum as is; callers normalize to `Int` when it fits.
    pub fn alloc_bigint(&mut self, n: BigInt) -> Value {
        let id = BigId(self.bigints.len() as u32);
        self.bigints.push(n);
        Value::BigInt(id)
    }

    pub fn bigint(&self, id: BigId) -> &BigInt {
        &self.bigints[id.0 as usize]
    }

    pub fn alloc_vector(&mut self, items: Vec<Value>) -> Value {
        let id = VectorId(self.vectors.len() as u32);
        self.vectors.push(items);
        Value::Vector(id)
    }

    pub fn vector(&self, id: VectorId) -> &[Value] {
        &self.vectors[id.0 as usize]
    }

    pub fn vector_mut(&mut self, id: VectorId) -> &mut Vec<Value> {
        &mut self.vectors[id.0 as usize]
    }

    pub fn alloc_promise(&mut self, state: PromiseState) -> Value {
        let id = PromiseId(self.promises.len() as u32);
        self.promises.push(state);
        Value::Promise(id)
    }

    pub fn promise(&self, id: PromiseId) -> &PromiseState {
        &self.promises[id.0 as usize]
    }

    pub fn set_promise(&mut self, id: PromiseId, state: PromiseState) {
        self.promises[id.0 as usize] = state;
    }

    pub fn alloc_function(&mut self, function: Function) -> Value {
        let id = FunctionId(self.functions.len() as u32);
        self.functions.push(function);
        Value::Function(id)
    }

    pub fn function(&self, id: FunctionId) -> &Function {
        &self.functions[id.0 as usize]
    }

    /// A fresh placeholder for the `$`-prefixed symbol `name`.
    pub fn alloc_dummy(&mut self, name: SymbolId) -> Value {
        let id = DummyId(self.dummies.len() as u32);
        self.dummies.push(name);
        Value::Dummy(id)
    }

    pub fn dummy_symbol(&self, id: DummyId) -> SymbolId {
        self.dummies[id.0 as usize]
    }

    pub fn alloc_error(&mut self, err: LispError) -> Value {
        let id = ErrorId(self.errors.len() as u32);
        self.errors.push(err);
        Value::Error(id)
    }

    pub fn error(&self, id: ErrorId) -> &LispError {
        &self.errors[id.0 as usize]
    }

    /// Text of a string or symbol, for natives that accept either.
    pub fn text_of<'a>(&'a self, val: Value, symbols: &'a SymbolTable) -> Option<&'a str> {
        match val {
            Value::Str(id) => Some(self.string(id)),
            Value::Symbol(id) => Some(symbols.name(id)),
            _ => None,
        }
    }
}
