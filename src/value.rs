use std::fmt;

macro_rules! define_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(pub u32);

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }
    };
}

define_id!(
    /// Unique identifier for an interned symbol.
    SymbolId
);
define_id!(
    /// Index into the cons-cell arena.
    PairId
);
define_id!(
    /// Index into the string table.
    StrId
);
define_id!(
    /// Index into the bignum table.
    BigId
);
define_id!(
    /// Index into the vector table.
    VectorId
);
define_id!(
    /// Index into the promise table.
    PromiseId
);
define_id!(
    /// Index into the function table (natives, templates, closures, macros).
    FunctionId
);
define_id!(
    /// A macro-local placeholder standing in for a `$`-prefixed symbol.
    DummyId
);
define_id!(
    /// A caught evaluation error kept as a first-class value.
    ErrorId
);

/// A static address produced by the lexical compiler: walk `level` frames
/// up the environment chain, then read slot `offset`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Arg {
    pub level: u32,
    pub offset: u32,
    pub symbol: SymbolId,
}

/// The fundamental value. Copy semantics; anything larger than a word
/// lives in the heap and is referred to by id.
#[derive(Clone, Copy, PartialEq)]
pub enum Value {
    Nil,
    Int(i64),
    Float(f64),
    BigInt(BigId),
    Str(StrId),
    Symbol(SymbolId),
    Pair(PairId),
    Vector(VectorId),
    Promise(PromiseId),
    Function(FunctionId),
    Arg(Arg),
    Dummy(DummyId),
    Error(ErrorId),
    Eof,
}

impl Value {
    pub fn is_nil(self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn is_pair(self) -> bool {
        matches!(self, Value::Pair(_))
    }

    pub fn is_number(self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_) | Value::BigInt(_))
    }

    pub fn as_pair(self) -> Option<PairId> {
        match self {
            Value::Pair(id) => Some(id),
            _ => None,
        }
    }

    pub fn as_symbol(self) -> Option<SymbolId> {
        match self {
            Value::Symbol(id) => Some(id),
            _ => None,
        }
    }

    /// Returns true if this value is an atom (not a pair).
    pub fn is_atom(self) -> bool {
        !self.is_pair()
    }

    /// Everything except nil counts as true.
    pub fn truthy(self) -> bool {
        !self.is_nil()
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "Nil"),
            Value::Int(n) => write!(f, "Int({})", n),
            Value::Float(x) => write!(f, "Float({:?})", x),
            Value::BigInt(id) => write!(f, "Big({})", id.0),
            Value::Str(id) => write!(f, "Str({})", id.0),
            Value::Symbol(id) => write!(f, "Sym({})", id.0),
            Value::Pair(id) => write!(f, "Pair({})", id.0),
            Value::Vector(id) => write!(f, "Vec({})", id.0),
            Value::Promise(id) => write!(f, "Promise({})", id.0),
            Value::Function(id) => write!(f, "Fn({})", id.0),
            Value::Arg(arg) => write!(f, "Arg({}:{})", arg.level, arg.offset),
            Value::Dummy(id) => write!(f, "Dummy({})", id.0),
            Value::Error(id) => write!(f, "Error({})", id.0),
            Value::Eof => write!(f, "Eof"),
        }
    }
}
