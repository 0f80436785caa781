use std::cell::RefCell;
use std::rc::Rc;

use crate::value::{Arg, Value};

/// One activation record: a slot per parameter declared at this level.
pub struct Frame {
    slots: RefCell<Vec<Value>>,
    next: Env,
}

/// A linked chain of frames, innermost first. `None` is the top level,
/// where variables live in the global table instead.
pub type Env = Option<Rc<Frame>>;

/// Push a new frame in front of `next`.
pub fn extend(slots: Vec<Value>, next: &Env) -> Env {
    Some(Rc::new(Frame {
        slots: RefCell::new(slots),
        next: next.clone(),
    }))
}

fn frame_at(env: &Env, level: u32) -> Option<&Rc<Frame>> {
    let mut frame = env.as_ref()?;
    for _ in 0..level {
        frame = frame.next.as_ref()?;
    }
    Some(frame)
}

/// Read the slot a static address points at. `None` when the address does
/// not fit the chain, which only happens for addresses taken out of context.
pub fn lookup(env: &Env, arg: Arg) -> Option<Value> {
    let frame = frame_at(env, arg.level)?;
    let slots = frame.slots.borrow();
    slots.get(arg.offset as usize).copied()
}

/// Overwrite a slot in place; closures sharing the frame see the update.
pub fn assign(env: &Env, arg: Arg, value: Value) -> bool {
    let Some(frame) = frame_at(env, arg.level) else {
        return false;
    };
    let mut slots = frame.slots.borrow_mut();
    match slots.get_mut(arg.offset as usize) {
        Some(slot) => {
            *slot = value;
            true
        }
        None => false,
    }
}

/// Snapshot every frame, innermost first.
pub fn frames(env: &Env) -> Vec<Vec<Value>> {
    let mut out = Vec::new();
    let mut cursor = env.as_ref();
    while let Some(frame) = cursor {
        out.push(frame.slots.borrow().clone());
        cursor = frame.next.as_ref();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::SymbolId;

    fn arg(level: u32, offset: u32) -> Arg {
        Arg {
            level,
            offset,
            symbol: SymbolId(0),
        }
    }

    #[test]
    fn lookup_walks_levels() {
        let outer = extend(vec![Value::Int(1), Value::Int(2)], &None);
        let inner = extend(vec![Value::Int(10)], &outer);
        assert_eq!(lookup(&inner, arg(0, 0)), Some(Value::Int(10)));
        assert_eq!(lookup(&inner, arg(1, 1)), Some(Value::Int(2)));
        assert_eq!(lookup(&inner, arg(2, 0)), None);
        assert_eq!(lookup(&inner, arg(0, 5)), None);
    }

    #[test]
    fn assign_is_visible_through_shared_frames() {
        let outer = extend(vec![Value::Nil], &None);
        let a = extend(vec![], &outer);
        let b = extend(vec![], &outer);
        assert!(assign(&a, arg(1, 0), Value::Int(7)));
        assert_eq!(lookup(&b, arg(1, 0)), Some(Value::Int(7)));
        assert!(!assign(&None, arg(0, 0), Value::Nil));
        assert_eq!(frames(&a).len(), 2);
    }
}
