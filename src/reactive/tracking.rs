use std::cell::RefCell;
use std::rc::Rc;

use super::Source;

thread_local! {
    /// One frame per running memo/effect body (nested reads push frames).
    static FRAMES: RefCell<Vec<Vec<Rc<dyn Source>>>> = const { RefCell::new(Vec::new()) };
}

/// Run `f`, collecting every source read directly by it.
pub(super) fn track<R>(f: impl FnOnce() -> R) -> (R, Vec<Rc<dyn Source>>) {
    FRAMES.with(|frames| frames.borrow_mut().push(Vec::new()));
    let result = f();
    let sources = FRAMES
        .with(|frames| frames.borrow_mut().pop())
        .unwrap_or_default();
    (result, sources)
}

/// Record a read of `source` in the innermost running computation, if any.
pub(super) fn record(source: Rc<dyn Source>) {
    FRAMES.with(|frames| {
        let mut frames = frames.borrow_mut();
        let Some(frame) = frames.last_mut() else {
            return;
        };
        let id = source.node_id();
        if !frame.iter().any(|s| s.node_id() == id) {
            frame.push(source);
        }
    });
}

