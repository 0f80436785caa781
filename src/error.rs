use std::fmt;
use std::io;

use thiserror::Error;

use crate::value::Value;

/// What went wrong. The `Display` text of each variant is the message shown
/// after the `*** ` prefix.
#[derive(Debug, Clone, Error)]
pub enum ErrorKind {
    /// Reader failure, reported with the offending line.
    #[error("SyntaxError: {message} -- {line_number}: {line}")]
    Syntax {
        message: String,
        line_number: usize,
        line: String,
    },

    #[error("void variable: {0}")]
    VoidVariable(String),

    #[error("not applicable: {0}")]
    NotApplicable(String),

    /// Malformed or misplaced special form ("bad quote", "nested macro", ...).
    #[error("{0}")]
    BadForm(String),

    #[error("arity not matched: {0}")]
    ArityNotMatched(String),

    #[error("variable expected: {0}")]
    VariableExpected(String),

    #[error("proper list expected: {0}")]
    ProperListExpected(String),

    /// A `throw` looking for its `catch`.
    #[error("no catcher for {repr}")]
    Throw { tag: Value, value: Value, repr: String },

    /// Untyped failure raised inside a native body; wrapped into `Call`
    /// once it crosses the native boundary.
    #[error("{0}")]
    Native(String),

    #[error("{message} -- {call}")]
    Call { message: String, call: String },

    #[error("heap capacity of {0} cells exceeded")]
    HeapOverflow(usize),

    #[error("I/O error: {0}")]
    Io(String),
}

/// An evaluation error together with the forms that were being evaluated
/// when it was raised, innermost first.
#[derive(Debug, Clone)]
pub struct LispError {
    pub kind: ErrorKind,
    pub trace: Vec<String>,
}

impl LispError {
    pub fn new(kind: ErrorKind) -> Self {
        LispError {
            kind,
            trace: Vec::new(),
        }
    }

    pub fn syntax(message: impl Into<String>, line_number: usize, line: impl Into<String>) -> Self {
        Self::new(ErrorKind::Syntax {
            message: message.into(),
            line_number,
            line: line.into(),
        })
    }

    pub fn void_variable(name: impl Into<String>) -> Self {
        Self::new(ErrorKind::VoidVariable(name.into()))
    }

    pub fn not_applicable(repr: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotApplicable(repr.into()))
    }

    pub fn bad_form(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadForm(message.into()))
    }

    pub fn arity(signature: impl Into<String>) -> Self {
        Self::new(ErrorKind::ArityNotMatched(signature.into()))
    }

    pub fn variable_expected(repr: impl Into<String>) -> Self {
        Self::new(ErrorKind::VariableExpected(repr.into()))
    }

    pub fn proper_list_expected(repr: impl Into<String>) -> Self {
        Self::new(ErrorKind::ProperListExpected(repr.into()))
    }

    pub fn native(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Native(message.into()))
    }

    pub fn is_throw(&self) -> bool {
        matches!(self.kind, ErrorKind::Throw { .. })
    }

    /// The message without the trace.
    pub fn message(&self) -> String {
        self.kind.to_string()
    }

    /// Record one more enclosing form unless the trace is already full.
    pub fn push_trace(&mut self, form: String, cap: usize) {
        if self.trace.len() < cap {
            self.trace.push(form);
        }
    }
}

impl fmt::Display for LispError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "*** {}", self.kind)?;
        for (i, form) in self.trace.iter().enumerate() {
            write!(f, "\n{:3}: {}", i, form)?;
        }
        Ok(())
    }
}

impl std::error::Error for LispError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

impl From<ErrorKind> for LispError {
    fn from(kind: ErrorKind) -> Self {
        LispError::new(kind)
    }
}

impl From<io::Error> for LispError {
    fn from(err: io::Error) -> Self {
        LispError::new(ErrorKind::Io(err.to_string()))
    }
}

pub type LispResult<T> = Result<T, LispError>;
