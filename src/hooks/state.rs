//! State cells - named reactive values with committed/pending halves.
//!
//! A dispatch writes the pending half and marks the owning session dirty;
//! the committed half moves only at the next lookup (the commit point at
//! the start of the following render). A render therefore always observes
//! the value as of its own start, never a value written mid-render.

use std::marker::PhantomData;
use std::sync::Arc;

use parking_lot::Mutex;

use super::AnyValue;
use crate::session::RenderScheduler;

/// A named reactive cell. Created on first use, never destroyed.
pub struct StateCell {
    slots: Mutex<Slots>,
}

struct Slots {
    committed: AnyValue,
    pending: AnyValue,
}

impl StateCell {
    pub(crate) fn new(initial: AnyValue) -> Self {
        Self {
            slots: Mutex::new(Slots {
                committed: initial.clone(),
                pending: initial,
            }),
        }
    }

    /// Move the pending value into the committed slot and return it.
    pub(crate) fn commit(&self) -> AnyValue {
        let mut slots = self.slots.lock();
        slots.committed = slots.pending.clone();
        slots.committed.clone()
    }

    /// Overwrite the pending value. Concurrent writers race; the last
    /// write before the next commit wins.
    pub(crate) fn store_pending(&self, value: AnyValue) {
        self.slots.lock().pending = value;
    }
}

/// Typed dispatch handle returned by `use_state`.
///
/// Bound to the session whose render produced it: `set` stores the pending
/// value on the (possibly shared) cell and marks that session dirty.
pub struct SetState<T> {
    cell: Arc<StateCell>,
    scheduler: Arc<RenderScheduler>,
    _marker: PhantomData<fn(T)>,
}

impl<T: Send + Sync + 'static> SetState<T> {
    pub(crate) fn new(cell: Arc<StateCell>, scheduler: Arc<RenderScheduler>) -> Self {
        Self {
            cell,
            scheduler,
            _marker: PhantomData,
        }
    }

    /// Dispatch a new value: pending := `value`, owning session dirty.
    ///
    /// The committed value is unchanged until the next render commits it,
    /// so the current render keeps observing the old value.
    pub fn set(&self, value: T) {
        self.cell.store_pending(Arc::new(value));
        self.scheduler.mark_dirty();
    }
}

impl<T> Clone for SetState<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Arc::clone(&self.cell),
            scheduler: Arc::clone(&self.scheduler),
            _marker: PhantomData,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_marks_owning_session_dirty() {
        let cell = Arc::new(StateCell::new(Arc::new(0_i64)));
        let scheduler = Arc::new(RenderScheduler::new());
        scheduler.clear();

        let set = SetState::<i64>::new(Arc::clone(&cell), Arc::clone(&scheduler));
        set.set(5);

        assert!(scheduler.is_dirty());
        let committed = cell.commit();
        assert_eq!(committed.downcast_ref::<i64>(), Some(&5));
    }

    #[test]
    fn test_commit_is_idempotent_without_dispatch() {
        let cell = StateCell::new(Arc::new(3_i64));
        assert_eq!(cell.commit().downcast_ref::<i64>(), Some(&3));
        assert_eq!(cell.commit().downcast_ref::<i64>(), Some(&3));
    }
}
