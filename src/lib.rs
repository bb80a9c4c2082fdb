//! Ripple - a server-driven UI runtime.
//!
//! The server renders a UI tree as a function of server-held state and
//! pushes it to a thin browser client over a persistent WebSocket. Client
//! events travel back to server-side handlers, which mutate state and
//! trigger the next render.
//!
//! ```ignore
//! use ripple::{App, Node, EventHandler};
//!
//! let app = App::builder()
//!     .page("/", |ui| async move {
//!         let (count, set_count) = ui.use_state("counter", 0_i64)?;
//!         Ok(Node::new("div")
//!             .child(format!("Counter: {count}"))
//!             .child(Node::new("button")
//!                 .on("onclick", EventHandler::sync(move || {
//!                     set_count.set(count + 1);
//!                     Ok(())
//!                 }))
//!                 .child("Click Me")))
//!     })
//!     .build();
//! app.run()
//! ```

pub mod config;
pub mod dom;
pub mod error;
pub mod hooks;
pub mod logger;
pub mod server;
pub mod session;
pub mod ui;
pub mod wire;

mod embed;
mod utils;

pub use config::{AppConfig, ServeConfig};
pub use dom::{AttrValue, Child, EventHandler, Node};
pub use error::{HookError, ProtocolError, SessionError};
pub use hooks::{Cleanup, HookStore, SetState};
pub use server::{ApiRequest, ApiResponse, App, AppBuilder, Router, StaticRoute};
pub use session::Location;
pub use ui::{Console, ConsoleLevel, Ui};
pub use wire::{ServerMessage, WireNode};

// HTTP method type used by API route registration.
pub use tiny_http::Method;
