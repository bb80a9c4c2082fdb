//! Render scheduling - one dirty flag per session.
//!
//! Sessions start dirty (the first render is unconditional). A dispatch
//! sets the flag; the session loop checks it after every handler return
//! and renders only when set. No tree comparison happens anywhere: a
//! dirty render always pushes the full tree.

use std::sync::atomic::{AtomicBool, Ordering};

/// Per-session dirty flag.
pub struct RenderScheduler {
    dirty: AtomicBool,
}

impl RenderScheduler {
    /// Create a scheduler in the dirty state.
    pub fn new() -> Self {
        Self {
            dirty: AtomicBool::new(true),
        }
    }

    /// Mark the session as needing a re-render.
    pub fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::SeqCst);
    }

    /// Check whether a render is due.
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::SeqCst)
    }

    /// Clear the flag after a render's tree has been captured.
    pub(crate) fn clear(&self) {
        self.dirty.store(false, Ordering::SeqCst);
    }
}

impl Default for RenderScheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_dirty() {
        let scheduler = RenderScheduler::new();
        assert!(scheduler.is_dirty());
    }

    #[test]
    fn test_clear_then_mark() {
        let scheduler = RenderScheduler::new();
        scheduler.clear();
        assert!(!scheduler.is_dirty());

        scheduler.mark_dirty();
        assert!(scheduler.is_dirty());
    }
}
