//! Event Registry - render-time handler capture.
//!
//! Each render rebuilds the registry from the handlers found in the tree;
//! entries from earlier renders of the same session are shadowed wholesale.
//! Dispatch looks up `(element id, event name)` and invokes the matching
//! variant explicitly - a sync handler runs inline, an async handler is
//! awaited.

use std::sync::Arc;

use anyhow::Result;
use futures::FutureExt;
use futures::future::BoxFuture;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

/// A handler closure captured during a render, tagged by invocation style.
pub enum EventHandler {
    /// Runs inline on the session task
    Sync(Box<dyn Fn() -> Result<()> + Send + Sync>),
    /// Awaited to completion before the next render
    Async(Box<dyn Fn() -> BoxFuture<'static, Result<()>> + Send + Sync>),
}

impl EventHandler {
    /// Wrap a synchronous handler.
    pub fn sync(f: impl Fn() -> Result<()> + Send + Sync + 'static) -> Self {
        Self::Sync(Box::new(f))
    }

    /// Wrap an asynchronous handler.
    pub fn async_fn<F, Fut>(f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        Self::Async(Box::new(move || f().boxed()))
    }

    /// Invoke the handler, awaiting the async variant.
    pub async fn invoke(&self) -> Result<()> {
        match self {
            Self::Sync(f) => f(),
            Self::Async(f) => f().await,
        }
    }
}

/// Per-session mapping from `(element id, event name)` to the handler
/// captured by the most recent render.
#[derive(Default)]
pub struct EventRegistry {
    bindings: Mutex<FxHashMap<String, FxHashMap<String, Arc<EventHandler>>>>,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all bindings. Called at the start of every lowering pass so the
    /// new render's bindings shadow the previous render's entirely.
    pub(crate) fn begin_render(&self) {
        self.bindings.lock().clear();
    }

    /// Record a handler under `(id, event)`.
    pub(crate) fn bind(&self, id: &str, event: &str, handler: Arc<EventHandler>) {
        self.bindings
            .lock()
            .entry(id.to_string())
            .or_default()
            .insert(event.to_string(), handler);
    }

    /// Look up the handler bound to `(id, event)` by the latest render.
    pub fn lookup(&self, id: &str, event: &str) -> Option<Arc<EventHandler>> {
        self.bindings.lock().get(id)?.get(event).cloned()
    }

    /// Number of elements with at least one bound handler.
    pub fn bound_elements(&self) -> usize {
        self.bindings.lock().len()
    }
}
