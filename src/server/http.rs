//! HTTP request loop.
//!
//! Serves the bootstrap shell, the embedded client script, API routes and
//! static routes. Every path that matches none of those gets the shell:
//! page resolution is the session runtime's job, performed against the
//! handshake location, not the HTTP path.

use std::sync::Arc;

use anyhow::Result;
use rustc_hash::FxHashMap;
use tiny_http::{Request, Server};

use super::lifecycle;
use super::response;
use super::routes::{ApiRequest, ApiRoute, StaticRoute};
use crate::embed::CLIENT_JS_PATH;
use crate::log;

/// Immutable state shared by request workers.
pub(crate) struct HttpContext {
    pub apis: FxHashMap<String, ApiRoute>,
    pub statics: FxHashMap<String, StaticRoute>,
    pub ws_port: u16,
}

/// Run the request loop until the server is unblocked.
pub(crate) fn run_request_loop(server: &Server, context: Arc<HttpContext>) {
    // Thread pool keeps one slow handler from blocking other requests
    let pool = match rayon::ThreadPoolBuilder::new().num_threads(4).build() {
        Ok(pool) => pool,
        Err(e) => {
            log!("serve"; "failed to create thread pool: {}", e);
            return;
        }
    };

    for request in server.incoming_requests() {
        let context = Arc::clone(&context);
        pool.spawn(move || {
            if let Err(e) = handle_request(request, &context) {
                log!("serve"; "request error: {e:#}");
            }
        });
    }
}

/// Handle a single HTTP request.
fn handle_request(mut request: Request, context: &HttpContext) -> Result<()> {
    if lifecycle::is_shutdown() {
        return response::respond_unavailable(request);
    }

    let path = request_path(request.url()).to_string();

    if path == CLIENT_JS_PATH {
        return response::respond_client_js(request, context.ws_port);
    }

    if let Some(api) = context.apis.get(&path) {
        if !api.allows(request.method()) {
            return response::respond_method_not_allowed(request, &api.allow_header());
        }
        let outcome = api.invoke(&mut ApiRequest::new(&mut request));
        return match outcome {
            Ok(api_response) => response::respond_api(request, api_response),
            Err(e) => {
                log!("serve"; "api handler failed on {path}: {e:#}");
                response::respond_handler_error(request)
            }
        };
    }

    if let Some(route) = context.statics.get(&path) {
        return response::respond_static(request, route);
    }

    // Anything else bootstraps a session
    response::respond_shell(request, context.ws_port)
}

/// Path component of a request URL (strips the query string).
fn request_path(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_path_strips_query() {
        assert_eq!(request_path("/docs?page=2"), "/docs");
        assert_eq!(request_path("/"), "/");
        assert_eq!(request_path("/a?b=1&c=2"), "/a");
    }
}
