//! Load state for assets that arrive after the simulation has started.
//!
//! Meshes, clips and sounds load asynchronously while entities already exist
//! and tick. Views keep an [`AssetSlot`] per resource, check its
//! [`LoadState`] before use, and hand a clone of the slot to the loader's
//! completion callback. Every slot carries the [`CancellationToken`] of the
//! scene it was created for; once the scene shuts down, late completions are
//! discarded.

use std::cell::{Cell, Ref, RefCell};
use std::fmt;
use std::rc::Rc;

use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Default)]
pub enum LoadState<T> {
    #[default]
    NotLoaded,
    Loading,
    Ready(T),
    Failed(String),
}

impl<T> LoadState<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            Self::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }
}

/// Shared flag flipped once when a scene is torn down.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Rc<Cell<bool>>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.get()
    }
}

/// A shared, cancellable slot for one asynchronously loaded resource.
pub struct AssetSlot<T> {
    name: Rc<str>,
    state: Rc<RefCell<LoadState<T>>>,
    token: CancellationToken,
}

impl<T> Clone for AssetSlot<T> {
    fn clone(&self) -> Self {
        Self {
            name: Rc::clone(&self.name),
            state: Rc::clone(&self.state),
            token: self.token.clone(),
        }
    }
}

impl<T> fmt::Debug for AssetSlot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetSlot")
            .field("name", &self.name)
            .field("cancelled", &self.token.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl<T> AssetSlot<T> {
    pub fn new(name: impl Into<String>, token: CancellationToken) -> Self {
        let name: String = name.into();
        Self {
            name: name.into(),
            state: Rc::new(RefCell::new(LoadState::NotLoaded)),
            token,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> Ref<'_, LoadState<T>> {
        self.state.borrow()
    }

    pub fn is_ready(&self) -> bool {
        self.state.borrow().is_ready()
    }

    /// Run `f` on the loaded value, if it is ready.
    pub fn with_ready<R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        self.state.borrow().ready().map(f)
    }

    /// Mark the load as started. Ignored after cancellation.
    pub fn begin(&self) -> bool {
        if self.token.is_cancelled() {
            return false;
        }
        *self.state.borrow_mut() = LoadState::Loading;
        true
    }

    /// Store the loaded value. Returns `false`, dropping `value`, if the
    /// scene was cancelled in the meantime.
    pub fn complete(&self, value: T) -> bool {
        if self.token.is_cancelled() {
            debug!(asset = %self.name, "discarding load completed after cancellation");
            return false;
        }
        *self.state.borrow_mut() = LoadState::Ready(value);
        true
    }

    /// Record a failed load. Failures are logged, never retried.
    pub fn fail(&self, reason: impl Into<String>) -> bool {
        if self.token.is_cancelled() {
            return false;
        }
        let reason = reason.into();
        warn!(asset = %self.name, %reason, "asset failed to load");
        *self.state.borrow_mut() = LoadState::Failed(reason);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_moves_through_states() {
        let slot = AssetSlot::new("ghost.glb", CancellationToken::new());
        assert_eq!(*slot.state(), LoadState::NotLoaded);
        assert!(slot.begin());
        assert_eq!(*slot.state(), LoadState::Loading);

        let callback = slot.clone();
        assert!(callback.complete(42u32));
        assert!(slot.is_ready());
        assert_eq!(slot.with_ready(|v| *v + 1), Some(43));
    }

    #[test]
    fn completion_after_cancel_is_a_no_op() {
        let token = CancellationToken::new();
        let slot = AssetSlot::new("stove.ogg", token.clone());
        slot.begin();

        token.cancel();

        assert!(!slot.complete("clip".to_owned()));
        assert!(!slot.fail("network"));
        assert_eq!(*slot.state(), LoadState::Loading);
        assert_eq!(slot.with_ready(|v| v.len()), None);
    }

    #[test]
    fn failure_is_recorded() {
        let slot: AssetSlot<()> = AssetSlot::new("missing.png", CancellationToken::new());
        assert!(slot.fail("404"));
        assert_eq!(*slot.state(), LoadState::Failed("404".to_owned()));
    }
}
