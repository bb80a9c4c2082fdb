//! Session Runtime - one loop per connection.
//!
//! ```text
//! Handshaking -> Rendering -> Sending -> AwaitingEvent -> Dispatching
//!                    ^                                         |
//!                    +-----------------------------------------+
//! ```
//!
//! A session reads exactly one handshake message (initial location),
//! resolves the page bound to that path, then alternates between pushing
//! a freshly rendered tree (when dirty) and dispatching inbound events to
//! the handlers captured by the latest render. Any failure - unresolved
//! route, decode error, missing handler, handler or render error - is
//! fatal to this session only; the connection is torn down and every
//! other session, and the shared hook store, is untouched.
//!
//! Concurrency within a session is strictly sequential: the loop suspends
//! only at the handshake, at the next-event await, and inside async render
//! functions or handlers. Across sessions, loops run as independent tokio
//! tasks over the same hook store.

mod handshake;
mod scheduler;
pub(crate) mod transport;


pub use handshake::Location;
pub use scheduler::RenderScheduler;
pub(crate) use transport::{Frame, Outbound, SessionChannels, spawn_io};

use std::sync::Arc;

use futures::future::BoxFuture;
use rustc_hash::FxHashMap;

use crate::dom::{EventRegistry, Node, lower_tree};
use crate::error::{ProtocolError, SessionError};
use crate::hooks::HookStore;
use crate::ui::Ui;
use crate::wire::{self, ServerMessage, WireNode};

/// A route's render function: an operation that may suspend, producing
/// the next tree from the current hook-store state.
pub type PageFn = Arc<dyn Fn(Ui) -> BoxFuture<'static, anyhow::Result<Node>> + Send + Sync>;

/// Page table shared by all sessions.
pub(crate) type PageTable = FxHashMap<String, PageFn>;

/// One client connection and its render/dispatch state.
pub(crate) struct Session {
    channels: SessionChannels,
    hooks: Arc<HookStore>,
    scheduler: Arc<RenderScheduler>,
    registry: Arc<EventRegistry>,
    pages: Arc<PageTable>,
}

impl Session {
    pub(crate) fn new(
        channels: SessionChannels,
        hooks: Arc<HookStore>,
        pages: Arc<PageTable>,
    ) -> Self {
        Self {
            channels,
            hooks,
            scheduler: Arc::new(RenderScheduler::new()),
            registry: Arc::new(EventRegistry::new()),
            pages,
        }
    }

    /// Drive the session until the connection closes or a fatal condition.
    pub(crate) async fn run(mut self) -> Result<(), SessionError> {
        let location = handshake::read_location(self.channels.inbound.recv().await)?;

        let page = self
            .pages
            .get(location.path())
            .cloned()
            .ok_or_else(|| SessionError::RouteNotFound(location.path().to_string()))?;
        let location = Arc::new(location);

        loop {
            // Initially dirty, so the first pass always renders.
            if let Some(tree) = self.render_if_dirty(&page, &location).await? {
                self.channels.outbound.send(&ServerMessage::html(tree))?;
            }

            let Some(frame) = self.channels.inbound.recv().await else {
                // Connection closed at a suspension point: clean exit.
                return Ok(());
            };
            let text = match frame {
                Frame::Text(text) => text,
                _ => return Err(ProtocolError::UnexpectedFrame.into()),
            };
            let event = wire::decode_event(&text)?;

            let handler = match self.registry.lookup(&event.id, &event.event) {
                Some(handler) => handler,
                None => {
                    return Err(SessionError::HandlerNotFound {
                        id: event.id,
                        event: event.event,
                    });
                }
            };
            handler.invoke().await.map_err(SessionError::Handler)?;
        }
    }

    /// Render and lower the tree if the session is dirty; `None` when
    /// clean (no render performed, nothing to send).
    async fn render_if_dirty(
        &self,
        page: &PageFn,
        location: &Arc<Location>,
    ) -> Result<Option<WireNode>, SessionError> {
        if !self.scheduler.is_dirty() {
            return Ok(None);
        }

        let ui = Ui::new(
            Arc::clone(&self.hooks),
            Arc::clone(&self.scheduler),
            self.channels.outbound.clone(),
            Arc::clone(location),
        );
        let tree = page(ui).await.map_err(SessionError::Render)?;
        let wire = lower_tree(tree, &self.registry);
        self.scheduler.clear();
        Ok(Some(wire))
    }
}
