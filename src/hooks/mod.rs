//! Hook Store - process-wide reactive cells.
//!
//! Holds named state cells (committed/pending value pairs) and named
//! memoized side-effects. Cells are keyed by bare name with NO session
//! scoping: two sessions that use the same name observe and mutate the
//! same cell. This is the documented contract (and a known hazard under
//! concurrent sessions); the store performs no per-session isolation and
//! no cross-cell transaction.
//!
//! The store is an explicit value created by the `App` and injected into
//! every session, so tests can instantiate isolated stores.

mod memo;
mod state;

pub use state::SetState;
pub(crate) use state::StateCell;

use std::any::Any;
use std::sync::Arc;

use dashmap::DashMap;
use serde_json::Value;

use crate::error::HookError;
use memo::MemoCell;

/// A cleanup action returned by a memo effect, run before the next re-run.
pub type Cleanup = Box<dyn FnOnce() + Send>;

pub(crate) type AnyValue = Arc<dyn Any + Send + Sync>;

/// Process-wide registry of state and memo cells.
#[derive(Default)]
pub struct HookStore {
    states: DashMap<String, Arc<StateCell>>,
    memos: DashMap<String, Arc<MemoCell>>,
}

impl HookStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the state cell named `name`.
    ///
    /// On first use the cell is created from `init` (invoked only then).
    /// On every lookup the pending value is committed first, so a render
    /// observes the latest dispatched value exactly once, at the start of
    /// the render that follows the dispatch.
    pub fn get_or_create_state<T, F>(
        &self,
        name: &str,
        init: F,
    ) -> Result<(T, Arc<StateCell>), HookError>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> T,
    {
        let cell = Arc::clone(
            self.states
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(StateCell::new(Arc::new(init()))))
                .value(),
        );

        let committed = cell.commit();
        let value = committed
            .downcast_ref::<T>()
            .cloned()
            .ok_or_else(|| HookError::TypeMismatch {
                name: name.to_string(),
            })?;
        Ok((value, cell))
    }

    /// Get or create the memo cell keyed by `key` and reconcile it against
    /// `deps`.
    ///
    /// First use runs `effect` and stores its cleanup. Later uses re-run
    /// `effect` only when `deps` differs element-wise (including length)
    /// from the stored sequence, invoking the stored cleanup immediately
    /// before the re-run.
    pub fn get_or_create_memo(
        &self,
        key: &str,
        deps: &[Value],
        effect: impl FnOnce() -> Option<Cleanup>,
    ) {
        let cell = Arc::clone(
            self.memos
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(MemoCell::new()))
                .value(),
        );
        cell.apply(deps, effect);
    }

    /// Number of live state cells (cells are never destroyed).
    pub fn state_count(&self) -> usize {
        self.states.len()
    }
}

/// Convert a dependency value for [`deps!`]. Unserializable values become
/// `null` (and thus compare equal to each other).
pub fn dep(value: impl serde::Serialize) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

/// Build a dependency sequence for `use_memo`.
///
/// ```ignore
/// ui.use_memo("expensive", &deps![count, name], || { ...; None });
/// ```
#[macro_export]
macro_rules! deps {
    ($($dep:expr),* $(,)?) => {
        [$($crate::hooks::dep($dep)),*]
    };
}
