use crate::env::Env;
use crate::error::{LispError, LispResult};
use crate::eval::Interp;
use crate::value::Value;

/// Signature of a native body. It receives the frame built by
/// `Interp::make_frame` plus the caller's environment.
pub type NativeBody = fn(&mut Interp, &[Value], &Env) -> LispResult<Value>;

/// Arity metadata shared by every callable. With a rest parameter the
/// final slot holds the remaining argument list, so `arity` counts it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Shape {
    pub arity: usize,
    pub has_rest: bool,
}

impl Shape {
    pub const fn fixed(arity: usize) -> Self {
        Shape {
            arity,
            has_rest: false,
        }
    }

    /// `arity` includes the rest slot.
    pub const fn rest(arity: usize) -> Self {
        Shape {
            arity,
            has_rest: true,
        }
    }

    /// Number of positional slots filled one argument each.
    pub fn required(&self) -> usize {
        if self.has_rest {
            self.arity - 1
        } else {
            self.arity
        }
    }

    /// Arity as printed: negated when there is a rest parameter.
    pub fn carity(&self) -> i64 {
        if self.has_rest {
            -(self.arity as i64)
        } else {
            self.arity as i64
        }
    }
}

/// A function implemented in Rust and registered by name.
pub struct Native {
    pub name: &'static str,
    pub shape: Shape,
    /// Lazy natives see evaluated but unforced arguments.
    pub lazy: bool,
    pub doc: &'static str,
    pub body: NativeBody,
}

/// The closed family of callable values.
#[derive(Clone)]
pub enum Function {
    Native(&'static Native),
    /// Compiled nested lambda, not yet paired with an environment.
    Lambda { shape: Shape, body: Value },
    Closure { shape: Shape, body: Value, env: Env },
    /// Expanded at compile time; never applied as an ordinary function.
    Macro { shape: Shape, body: Value },
}

impl Function {
    pub fn shape(&self) -> Shape {
        match self {
            Function::Native(native) => native.shape,
            Function::Lambda { shape, .. }
            | Function::Closure { shape, .. }
            | Function::Macro { shape, .. } => *shape,
        }
    }

    pub fn is_macro(&self) -> bool {
        matches!(self, Function::Macro { .. })
    }

    /// Short form used in arity errors and when printing natives.
    pub fn signature(&self) -> String {
        match self {
            Function::Native(native) => format!(
                "#<{}:{}{}>",
                native.name,
                native.shape.carity(),
                if native.lazy { ":l" } else { "" }
            ),
            Function::Lambda { shape, .. } => format!("#<lambda:{}>", shape.carity()),
            Function::Closure { shape, .. } => format!("#<closure:{}>", shape.carity()),
            Function::Macro { shape, .. } => format!("#<macro:{}>", shape.carity()),
        }
    }
}

impl Interp {
    /// Lay an actual-argument list out as a frame. Fixed slots take one
    /// element each; with a rest parameter the untouched remainder of the
    /// list fills the final slot.
    pub(crate) fn make_frame(&mut self, function: &Function, list: Value) -> LispResult<Vec<Value>> {
        let shape = function.shape();
        let required = shape.required();
        let mut frame = Vec::with_capacity(shape.arity);
        let mut rest = list;
        while frame.len() < required {
            let Value::Pair(id) = rest else { break };
            frame.push(self.heap.car(id));
            rest = self.force(self.heap.cdr(id))?;
        }
        let tail_ok = rest.is_nil() || (shape.has_rest && rest.is_pair());
        if frame.len() != required || !tail_ok {
            return Err(LispError::arity(function.signature()));
        }
        if shape.has_rest {
            frame.push(rest);
        }
        Ok(frame)
    }

    /// Evaluate a frame of argument forms in the caller's environment
    /// without forcing. Used for closures and lazy natives.
    pub(crate) fn eval_frame(&mut self, frame: &mut [Value], shape: Shape, env: &Env) -> LispResult<()> {
        for slot in frame.iter_mut().take(shape.required()) {
            *slot = self.eval(*slot, env)?;
        }
        if shape.has_rest {
            let last = shape.arity - 1;
            frame[last] = self.map_list(frame[last], |interp, x| interp.eval(x, env))?;
        }
        Ok(())
    }

    /// Like `eval_frame`, but every argument is forced as well.
    pub(crate) fn eval_and_force_frame(
        &mut self,
        frame: &mut [Value],
        shape: Shape,
        env: &Env,
    ) -> LispResult<()> {
        for slot in frame.iter_mut().take(shape.required()) {
            let value = self.eval(*slot, env)?;
            *slot = self.force(value)?;
        }
        if shape.has_rest {
            let last = shape.arity - 1;
            frame[last] = self.map_list(frame[last], |interp, x| {
                let value = interp.eval(x, env)?;
                interp.force(value)
            })?;
        }
        Ok(())
    }
}
