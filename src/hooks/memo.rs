//! Memo cells - named memoized side-effects.
//!
//! A memo cell remembers the dependency sequence of its last run and an
//! optional cleanup action the effect returned. The effect re-runs only
//! when the new sequence differs element-wise (a length change counts);
//! the stored cleanup runs immediately before the re-run. No unmount
//! trigger exists: a cleanup that never gets superseded never runs.

use parking_lot::Mutex;
use serde_json::Value;

use super::Cleanup;

/// A named memoized side-effect. Created on first use, never destroyed.
pub(crate) struct MemoCell {
    inner: Mutex<MemoInner>,
}

struct MemoInner {
    initialized: bool,
    deps: Vec<Value>,
    cleanup: Option<Cleanup>,
}

impl MemoCell {
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(MemoInner {
                initialized: false,
                deps: Vec::new(),
                cleanup: None,
            }),
        }
    }

    /// Run `effect` if this is the first use or `deps` changed.
    pub(crate) fn apply(&self, deps: &[Value], effect: impl FnOnce() -> Option<Cleanup>) {
        let mut inner = self.inner.lock();
        if inner.initialized && inner.deps == deps {
            return;
        }

        if let Some(cleanup) = inner.cleanup.take() {
            cleanup();
        }

        inner.cleanup = effect();
        inner.deps = deps.to_vec();
        inner.initialized = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_first_apply_runs_without_cleanup() {
        let cell = MemoCell::new();
        let runs = AtomicUsize::new(0);

        cell.apply(&[json!(1)], || {
            runs.fetch_add(1, Ordering::SeqCst);
            None
        });
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_equal_deps_skip_rerun_and_keep_cleanup() {
        let cell = MemoCell::new();
        let cleaned = Arc::new(AtomicUsize::new(0));

        let c = Arc::clone(&cleaned);
        cell.apply(&[json!("a")], move || {
            Some(Box::new(move || {
                c.fetch_add(1, Ordering::SeqCst);
            }) as Cleanup)
        });

        // Equal deps: no re-run, so the stored cleanup must not fire.
        cell.apply(&[json!("a")], || None);
        assert_eq!(cleaned.load(Ordering::SeqCst), 0);

        // Changed deps: the stored cleanup fires exactly once.
        cell.apply(&[json!("b")], || None);
        assert_eq!(cleaned.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_empty_deps_never_rerun() {
        let cell = MemoCell::new();
        let runs = AtomicUsize::new(0);

        for _ in 0..3 {
            cell.apply(&[], || {
                runs.fetch_add(1, Ordering::SeqCst);
                None
            });
        }
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }
}
