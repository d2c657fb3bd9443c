use std::cell::{Cell, RefCell};

use super::Effect;

/// A group of effects torn down together.
///
/// `dispose` is idempotent; effects created through a disposed scope are
/// disposed immediately after their first run.
#[derive(Default)]
pub struct Scope {
    effects: RefCell<Vec<Effect>>,
    disposed: Cell<bool>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an effect owned by this scope.
    pub fn effect(&self, body: impl FnMut() + 'static) -> Effect {
        let effect = Effect::new(body);
        if self.disposed.get() {
            effect.dispose();
        } else {
            self.effects.borrow_mut().push(effect.clone());
        }
        effect
    }

    /// Dispose every effect in the scope.
    ///
    /// Returns `true` on the first call, `false` afterwards.
    pub fn dispose(&self) -> bool {
        if self.disposed.replace(true) {
            return false;
        }
        for effect in self.effects.take() {
            effect.dispose();
        }
        true
    }

    #[cfg(test)]
    pub fn is_disposed(&self) -> bool {
        self.disposed.get()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.effects.borrow().len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.effects.borrow().is_empty()
    }
}
