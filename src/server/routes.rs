//! Route tables - pages, API handlers, static content.
//!
//! Pages are session-rendered (resolved during the WebSocket handshake);
//! API and static routes are plain HTTP, dispatched by exact path. A
//! [`Router`] carries the same three tables and merges into another
//! router (or the app builder) under a path prefix.

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use futures::FutureExt;
use rustc_hash::FxHashMap;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tiny_http::Method;

use crate::dom::Node;
use crate::session::{PageFn, PageTable};
use crate::ui::Ui;
use crate::utils::mime;

// =============================================================================
// API routes
// =============================================================================

/// Handler signature for API routes.
pub type ApiHandler =
    Arc<dyn Fn(&mut ApiRequest<'_>) -> Result<ApiResponse> + Send + Sync>;

/// A method-filtered HTTP handler.
pub struct ApiRoute {
    methods: Vec<Method>,
    handler: ApiHandler,
}

impl ApiRoute {
    pub fn new(
        methods: &[Method],
        handler: impl Fn(&mut ApiRequest<'_>) -> Result<ApiResponse> + Send + Sync + 'static,
    ) -> Self {
        Self {
            methods: methods.to_vec(),
            handler: Arc::new(handler),
        }
    }

    /// Whether the route accepts the given method.
    pub fn allows(&self, method: &Method) -> bool {
        self.methods.contains(method)
    }

    /// Value for the `Allow` header on 405 responses.
    pub(crate) fn allow_header(&self) -> String {
        self.methods
            .iter()
            .map(|method| method.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }

    pub(crate) fn invoke(&self, request: &mut ApiRequest<'_>) -> Result<ApiResponse> {
        (self.handler)(request)
    }
}

/// Request view handed to API handlers.
pub struct ApiRequest<'a> {
    inner: &'a mut tiny_http::Request,
}

impl<'a> ApiRequest<'a> {
    pub(crate) fn new(inner: &'a mut tiny_http::Request) -> Self {
        Self { inner }
    }

    pub fn method(&self) -> &Method {
        self.inner.method()
    }

    /// Raw request URL (path plus query string).
    pub fn url(&self) -> &str {
        self.inner.url()
    }

    /// First header with the given name, if any.
    pub fn header(&self, name: &str) -> Option<String> {
        self.inner
            .headers()
            .iter()
            .find(|h| h.field.as_str().as_str().eq_ignore_ascii_case(name))
            .map(|h| h.value.to_string())
    }

    /// Read the full request body as a string.
    pub fn body_string(&mut self) -> Result<String> {
        let mut body = String::new();
        self.inner
            .as_reader()
            .read_to_string(&mut body)
            .context("failed to read request body")?;
        Ok(body)
    }

    /// Read and deserialize a JSON request body.
    pub fn body_json<T: DeserializeOwned>(&mut self) -> Result<T> {
        let body = self.body_string()?;
        serde_json::from_str(&body).context("request body is not valid JSON")
    }
}

/// Response produced by an API handler.
pub struct ApiResponse {
    pub(crate) status: u16,
    pub(crate) content_type: String,
    pub(crate) body: ResponseBody,
}

pub(crate) enum ResponseBody {
    Bytes(Vec<u8>),
    /// Streamed with chunked transfer encoding
    Reader(Box<dyn Read + Send>),
}

impl ApiResponse {
    /// A JSON response from any serializable value.
    pub fn json(value: &impl Serialize) -> Result<Self> {
        let body = serde_json::to_vec(value).context("failed to serialize response")?;
        Ok(Self {
            status: 200,
            content_type: mime::types::JSON.to_string(),
            body: ResponseBody::Bytes(body),
        })
    }

    /// A plain-text response.
    pub fn text(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            content_type: mime::types::PLAIN.to_string(),
            body: ResponseBody::Bytes(body.into().into_bytes()),
        }
    }

    /// An HTML response.
    pub fn html(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            content_type: mime::types::HTML.to_string(),
            body: ResponseBody::Bytes(body.into().into_bytes()),
        }
    }

    /// A raw byte response with an explicit content type.
    pub fn bytes(body: Vec<u8>, content_type: impl Into<String>) -> Self {
        Self {
            status: 200,
            content_type: content_type.into(),
            body: ResponseBody::Bytes(body),
        }
    }

    /// A streaming response; sent with chunked transfer encoding.
    pub fn stream(reader: impl Read + Send + 'static) -> Self {
        Self {
            status: 200,
            content_type: mime::types::OCTET_STREAM.to_string(),
            body: ResponseBody::Reader(Box::new(reader)),
        }
    }

    /// Override the status code.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }
}

// =============================================================================
// Static routes
// =============================================================================

/// File- or byte-backed static content.
pub struct StaticRoute {
    content_type: String,
    source: StaticSource,
}

enum StaticSource {
    /// Read from disk on every request
    File(PathBuf),
    /// Served from memory
    Bytes(Vec<u8>),
}

impl StaticRoute {
    /// Serve a file from disk; content type guessed from the extension.
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            content_type: mime::from_path(&path).to_string(),
            source: StaticSource::File(path),
        }
    }

    /// Serve bytes from memory with an explicit content type.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>, content_type: impl Into<String>) -> Self {
        Self {
            content_type: content_type.into(),
            source: StaticSource::Bytes(bytes.into()),
        }
    }

    /// Override the content type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    pub(crate) fn content_type(&self) -> &str {
        &self.content_type
    }

    pub(crate) fn read(&self) -> Result<Vec<u8>> {
        match &self.source {
            StaticSource::File(path) => std::fs::read(path)
                .with_context(|| format!("failed to read {}", path.display())),
            StaticSource::Bytes(bytes) => Ok(bytes.clone()),
        }
    }
}

// =============================================================================
// Router
// =============================================================================

/// A mergeable collection of routes.
#[derive(Default)]
pub struct Router {
    pub(crate) pages: PageTable,
    pub(crate) apis: FxHashMap<String, ApiRoute>,
    pub(crate) statics: FxHashMap<String, StaticRoute>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a render function to a page path.
    pub fn page<F, Fut>(mut self, path: impl Into<String>, render: F) -> Self
    where
        F: Fn(Ui) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Node>> + Send + 'static,
    {
        let page: PageFn = Arc::new(move |ui| render(ui).boxed());
        self.pages.insert(path.into(), page);
        self
    }

    /// Bind a method-filtered API handler.
    pub fn api(
        mut self,
        path: impl Into<String>,
        methods: &[Method],
        handler: impl Fn(&mut ApiRequest<'_>) -> Result<ApiResponse> + Send + Sync + 'static,
    ) -> Self {
        self.apis.insert(path.into(), ApiRoute::new(methods, handler));
        self
    }

    /// Bind static content.
    pub fn static_route(mut self, path: impl Into<String>, route: StaticRoute) -> Self {
        self.statics.insert(path.into(), route);
        self
    }

    /// Merge another router's routes under a path prefix.
    pub fn mount(mut self, prefix: &str, router: Router) -> Self {
        for (path, page) in router.pages {
            self.pages.insert(format!("{prefix}{path}"), page);
        }
        for (path, api) in router.apis {
            self.apis.insert(format!("{prefix}{path}"), api);
        }
        for (path, route) in router.statics {
            self.statics.insert(format!("{prefix}{path}"), route);
        }
        self
    }
}
