#![allow(dead_code)]

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use l2lisp::{Config, Interp, LinesFromStr};

/// A `Write` sink the test can read back after the interpreter wrote to it.
#[derive(Clone, Default)]
pub struct Output(Rc<RefCell<Vec<u8>>>);

impl Output {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for Output {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// An interpreter with the prelude loaded, and its captured output.
pub fn interp() -> (Interp, Output) {
    interp_reading(Config::default(), "")
}

/// An interpreter without the prelude.
pub fn bare() -> Interp {
    interp_reading(Config::bare(), "").0
}

/// An interpreter whose `read` native draws from `input`.
pub fn interp_reading(config: Config, input: &str) -> (Interp, Output) {
    let out = Output::default();
    let interp = Interp::with_io(config, Box::new(LinesFromStr::new(input)), Box::new(out.clone()))
        .expect("interpreter starts");
    (interp, out)
}

/// The printed value of the last form in `text`, or the error message.
pub fn eval(interp: &mut Interp, text: &str) -> String {
    match interp.run_str(text) {
        Ok(value) => interp.repr(value),
        Err(err) => err.message(),
    }
}
