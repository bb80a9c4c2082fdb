//! Render context - what a page function sees.
//!
//! Every render (and every handler captured during it) works through a
//! [`Ui`] handle: hook access against the shared store, the session's
//! location, and command channels to the thin client (console output,
//! local storage, navigation).

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;

use crate::error::{HookError, SessionError};
use crate::hooks::{Cleanup, HookStore, SetState};
use crate::session::{Location, Outbound, RenderScheduler};
use crate::wire::{RouterCmd, ServerMessage};

pub use crate::wire::ConsoleLevel;

/// Cloneable per-render context handed to page functions.
#[derive(Clone)]
pub struct Ui {
    hooks: Arc<HookStore>,
    scheduler: Arc<RenderScheduler>,
    outbound: Outbound,
    location: Arc<Location>,
}

impl Ui {
    pub(crate) fn new(
        hooks: Arc<HookStore>,
        scheduler: Arc<RenderScheduler>,
        outbound: Outbound,
        location: Arc<Location>,
    ) -> Self {
        Self {
            hooks,
            scheduler,
            outbound,
            location,
        }
    }

    /// Read the state cell named `name`, creating it with `initial` on
    /// first use anywhere in the process.
    ///
    /// Returns the committed value and a dispatch handle bound to this
    /// session. Cells are shared across sessions by name.
    pub fn use_state<T>(&self, name: &str, initial: T) -> Result<(T, SetState<T>), HookError>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.use_state_with(name, move || initial)
    }

    /// Like [`use_state`](Self::use_state), but the initial value is
    /// computed only when the cell does not exist yet.
    pub fn use_state_with<T, F>(&self, name: &str, init: F) -> Result<(T, SetState<T>), HookError>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> T,
    {
        let (value, cell) = self.hooks.get_or_create_state(name, init)?;
        Ok((value, SetState::new(cell, Arc::clone(&self.scheduler))))
    }

    /// Run `effect` now if `key` is new or `deps` changed since the last
    /// run; otherwise do nothing. Side effects only.
    pub fn use_memo(&self, key: &str, deps: &[Value], effect: impl FnOnce() -> Option<Cleanup>) {
        self.hooks.get_or_create_memo(key, deps, effect);
    }

    /// The location this session was opened at.
    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Client console commands.
    pub fn console(&self) -> Console<'_> {
        Console {
            outbound: &self.outbound,
        }
    }

    /// Client local-storage commands.
    pub fn local_storage(&self) -> LocalStorage<'_> {
        LocalStorage {
            outbound: &self.outbound,
        }
    }

    /// Client navigation commands.
    pub fn router(&self) -> ClientRouter<'_> {
        ClientRouter {
            outbound: &self.outbound,
        }
    }
}

// =============================================================================
// Client console
// =============================================================================

/// Writes to the browser console of this session's client.
pub struct Console<'a> {
    outbound: &'a Outbound,
}

impl Console<'_> {
    pub fn log(&self, message: impl Into<String>) -> Result<(), SessionError> {
        self.emit(ConsoleLevel::Log, message)
    }

    pub fn error(&self, message: impl Into<String>) -> Result<(), SessionError> {
        self.emit(ConsoleLevel::Error, message)
    }

    pub fn warn(&self, message: impl Into<String>) -> Result<(), SessionError> {
        self.emit(ConsoleLevel::Warn, message)
    }

    pub fn info(&self, message: impl Into<String>) -> Result<(), SessionError> {
        self.emit(ConsoleLevel::Info, message)
    }

    /// Clear the client console.
    pub fn clear(&self) -> Result<(), SessionError> {
        self.outbound.send(&ServerMessage::console_clear())
    }

    fn emit(&self, level: ConsoleLevel, message: impl Into<String>) -> Result<(), SessionError> {
        self.outbound.send(&ServerMessage::console(level, message))
    }
}

// =============================================================================
// Client local storage
// =============================================================================

/// Local-storage requests directed at this session's client.
pub struct LocalStorage<'a> {
    outbound: &'a Outbound,
}

impl LocalStorage<'_> {
    /// Ask the client to report its local storage.
    ///
    /// Fire-and-forget: the post-handshake inbound grammar admits only
    /// event messages, so no response arrives on this connection.
    pub fn request(&self) -> Result<(), SessionError> {
        self.outbound.send(&ServerMessage::ls_get())
    }

    /// Ask the client to store the given entries.
    pub fn set<K, V>(&self, entries: impl IntoIterator<Item = (K, V)>) -> Result<(), SessionError>
    where
        K: Into<String>,
        V: Into<String>,
    {
        let entries: BTreeMap<String, String> = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.outbound.send(&ServerMessage::ls_set(entries))
    }
}

// =============================================================================
// Client navigation
// =============================================================================

/// Navigation commands executed by this session's client.
pub struct ClientRouter<'a> {
    outbound: &'a Outbound,
}

impl ClientRouter<'_> {
    /// Push a new history entry and navigate to `url`.
    pub fn push(&self, url: impl Into<String>) -> Result<(), SessionError> {
        self.outbound
            .send(&ServerMessage::router(RouterCmd::Push { url: url.into() }))
    }

    /// Replace the current history entry with `url`.
    pub fn replace(&self, url: impl Into<String>) -> Result<(), SessionError> {
        self.outbound
            .send(&ServerMessage::router(RouterCmd::Replace { url: url.into() }))
    }

    /// Reload the current page.
    pub fn reload(&self) -> Result<(), SessionError> {
        self.outbound.send(&ServerMessage::router(RouterCmd::Reload))
    }

    /// Go back one history entry.
    pub fn back(&self) -> Result<(), SessionError> {
        self.outbound.send(&ServerMessage::router(RouterCmd::Back))
    }

    /// Go forward one history entry.
    pub fn forward(&self) -> Result<(), SessionError> {
        self.outbound.send(&ServerMessage::router(RouterCmd::Forward))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::transport::channel_pair;
    use crate::wire::HandshakePayload;
    use serde_json::Value;

    fn test_ui() -> (Ui, crossbeam::channel::Receiver<Vec<u8>>) {
        let (channels, _inbound_tx, outbound_rx) = channel_pair();
        let location = Location::from_payload(HandshakePayload {
            url: "/".into(),
            query: vec![("tab".into(), "main".into())],
            hash: String::new(),
        });
        let ui = Ui::new(
            Arc::new(HookStore::new()),
            Arc::new(RenderScheduler::new()),
            channels.outbound,
            Arc::new(location),
        );
        (ui, outbound_rx)
    }

    fn next_frame(rx: &crossbeam::channel::Receiver<Vec<u8>>) -> Value {
        serde_json::from_slice(&rx.try_recv().expect("frame queued")).expect("valid json")
    }

    #[test]
    fn test_console_commands_hit_the_wire() {
        let (ui, rx) = test_ui();

        ui.console().log("hello").unwrap();
        let frame = next_frame(&rx);
        assert_eq!(frame["type"], "console");
        assert_eq!(frame["data"]["type"], "log");
        assert_eq!(frame["data"]["message"], "hello");

        ui.console().clear().unwrap();
        assert_eq!(next_frame(&rx)["type"], "console-clear");
    }

    #[test]
    fn test_router_commands_hit_the_wire() {
        let (ui, rx) = test_ui();

        ui.router().push("/next").unwrap();
        let frame = next_frame(&rx);
        assert_eq!(frame["data"]["type"], "push");
        assert_eq!(frame["data"]["url"], "/next");

        ui.router().back().unwrap();
        assert_eq!(next_frame(&rx)["data"]["type"], "back");
    }

    #[test]
    fn test_local_storage_set() {
        let (ui, rx) = test_ui();

        ui.local_storage().set([("theme", "dark")]).unwrap();
        let frame = next_frame(&rx);
        assert_eq!(frame["data"]["type"], "set");
        assert_eq!(frame["data"]["data"]["theme"], "dark");
    }

    #[test]
    fn test_state_dispatch_marks_this_session_dirty() {
        let (ui, _rx) = test_ui();

        let (count, set_count) = ui.use_state("counter", 0_i64).unwrap();
        assert_eq!(count, 0);

        set_count.set(count + 1);
        let (count, _) = ui.use_state("counter", 0_i64).unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_location_accessors() {
        let (ui, _rx) = test_ui();
        assert_eq!(ui.location().path(), "/");
        assert_eq!(
            ui.location().query().get("tab").map(String::as_str),
            Some("main")
        );
    }
}
