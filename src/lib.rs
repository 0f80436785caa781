//! L2 Lisp: a small lexically scoped Lisp.
//!
//! Forms are read into an arena heap, lambda bodies are compiled so that
//! formal parameters become `(level, offset)` addresses, macros expand once
//! at definition time, and a trampolined evaluator runs the result with
//! proper tail calls.

pub mod builtins;
pub mod compiler;
pub mod config;
pub mod env;
pub mod error;
pub mod eval;
pub mod function;
pub mod globals;
pub mod heap;
pub mod input;
pub mod lexer;
pub mod number;
pub mod printer;
pub mod promise;
pub mod reader;
pub mod symbol;
pub mod value;

pub use config::Config;
pub use error::{ErrorKind, LispError, LispResult};
pub use eval::{Interp, Receiver};
pub use input::{LineSource, LinesFromConsole, LinesFromReader, LinesFromStdin, LinesFromStr};
pub use value::Value;
