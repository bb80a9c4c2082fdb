//! Application server.
//!
//! Wires the pieces together: route tables, the HTTP listener serving the
//! bootstrap shell / client script / API / static routes, the WebSocket
//! listener feeding the session supervisor, and graceful shutdown.
//!
//! # Module Structure
//!
//! - `routes` - page/API/static tables and the mergeable `Router`
//! - `http` - request loop and dispatch
//! - `response` - tiny_http response helpers
//! - `ws` - WebSocket acceptor and session supervisor
//! - `lifecycle` - bind retry, runtime thread, Ctrl+C handling

mod http;
mod lifecycle;
mod response;
mod routes;
mod ws;

pub use lifecycle::{is_shutdown, setup_shutdown_handler};
pub use routes::{ApiHandler, ApiRequest, ApiResponse, ApiRoute, Router, StaticRoute};

use std::sync::Arc;

use anyhow::Result;
use tiny_http::Method;

use crate::config::AppConfig;
use crate::dom::Node;
use crate::hooks::HookStore;
use crate::ui::Ui;
use crate::{debug, log};

/// A configured application, ready to run.
pub struct App {
    config: AppConfig,
    hooks: Arc<HookStore>,
    router: Router,
    on_startup: Option<Box<dyn FnOnce() + Send>>,
    on_shutdown: Option<Box<dyn FnOnce() + Send>>,
}

impl App {
    pub fn builder() -> AppBuilder {
        AppBuilder {
            config: None,
            router: Router::new(),
            on_startup: None,
            on_shutdown: None,
        }
    }

    /// The process-wide hook store shared by every session.
    pub fn hooks(&self) -> Arc<HookStore> {
        Arc::clone(&self.hooks)
    }

    /// Bind listeners and serve until shutdown (blocking).
    pub fn run(mut self) -> Result<()> {
        if let Err(e) = lifecycle::setup_shutdown_handler() {
            // Embedding programs may have installed their own handler
            debug!("serve"; "shutdown handler not installed: {}", e);
        }

        let serve = &self.config.serve;
        let (server, addr) = lifecycle::bind_with_retry(serve.interface, serve.port)?;
        let server = Arc::new(server);

        let (shutdown_tx, shutdown_rx) = crossbeam::channel::unbounded::<()>();
        lifecycle::register_server(Arc::clone(&server), shutdown_tx);

        let (session_tx, session_rx) = tokio::sync::mpsc::channel(32);
        let ws_port = ws::start_ws_listener(serve.interface, serve.ws_port, session_tx)?;

        log!("serve"; "http://{}", addr);
        debug!("serve"; "ws://{}:{}", serve.interface, ws_port);

        if let Some(on_startup) = self.on_startup.take() {
            on_startup();
        }

        let pages = Arc::new(self.router.pages);
        let supervisor = lifecycle::spawn_supervisor(
            session_rx,
            Arc::clone(&self.hooks),
            pages,
            shutdown_rx,
        );

        let context = Arc::new(http::HttpContext {
            apis: self.router.apis,
            statics: self.router.statics,
            ws_port,
        });
        http::run_request_loop(&server, context);

        lifecycle::wait_for_shutdown(supervisor);
        if let Some(on_shutdown) = self.on_shutdown.take() {
            on_shutdown();
        }
        Ok(())
    }
}

/// Builder for [`App`].
pub struct AppBuilder {
    config: Option<AppConfig>,
    router: Router,
    on_startup: Option<Box<dyn FnOnce() + Send>>,
    on_shutdown: Option<Box<dyn FnOnce() + Send>>,
}

impl AppBuilder {
    /// Use the given configuration instead of the defaults.
    pub fn config(mut self, config: AppConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Run a callback once the listeners are bound.
    pub fn on_startup(mut self, callback: impl FnOnce() + Send + 'static) -> Self {
        self.on_startup = Some(Box::new(callback));
        self
    }

    /// Run a callback after the request loop drains on shutdown.
    pub fn on_shutdown(mut self, callback: impl FnOnce() + Send + 'static) -> Self {
        self.on_shutdown = Some(Box::new(callback));
        self
    }

    /// Bind a render function to a page path.
    pub fn page<F, Fut>(mut self, path: impl Into<String>, render: F) -> Self
    where
        F: Fn(Ui) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Node>> + Send + 'static,
    {
        self.router = self.router.page(path, render);
        self
    }

    /// Bind a method-filtered API handler.
    pub fn api(
        mut self,
        path: impl Into<String>,
        methods: &[Method],
        handler: impl Fn(&mut ApiRequest<'_>) -> Result<ApiResponse> + Send + Sync + 'static,
    ) -> Self {
        self.router = self.router.api(path, methods, handler);
        self
    }

    /// Bind static content.
    pub fn static_route(mut self, path: impl Into<String>, route: StaticRoute) -> Self {
        self.router = self.router.static_route(path, route);
        self
    }

    /// Merge a router's routes under a path prefix.
    pub fn mount(mut self, prefix: &str, router: Router) -> Self {
        self.router = self.router.mount(prefix, router);
        self
    }

    pub fn build(self) -> App {
        App {
            config: self.config.unwrap_or_default(),
            hooks: Arc::new(HookStore::new()),
            router: self.router,
            on_startup: self.on_startup,
            on_shutdown: self.on_shutdown,
        }
    }
}
