//! HTTP response handlers.

use anyhow::Result;
use tiny_http::{Header, Request, Response, StatusCode};

use super::routes::{ApiResponse, ResponseBody, StaticRoute};
use crate::embed::{APP_HTML, BootVars, CLIENT_JS};
use crate::utils::mime::types::{HTML, JAVASCRIPT, PLAIN};

/// Respond with the bootstrap shell (served for every page path).
pub(crate) fn respond_shell(request: Request, ws_port: u16) -> Result<()> {
    let body = APP_HTML.render(&BootVars { ws_port });
    send_body(request, 200, HTML, body.into_bytes())
}

/// Respond with the thin client script from memory.
pub(crate) fn respond_client_js(request: Request, ws_port: u16) -> Result<()> {
    let body = CLIENT_JS.render(&BootVars { ws_port });
    send_body(request, 200, JAVASCRIPT, body.into_bytes())
}

/// Respond with static route content.
pub(crate) fn respond_static(request: Request, route: &StaticRoute) -> Result<()> {
    match route.read() {
        Ok(body) => {
            let response = Response::from_data(body)
                .with_status_code(StatusCode(200))
                .with_header(make_header("Content-Type", route.content_type()));
            request.respond(response)?;
            Ok(())
        }
        Err(e) => {
            crate::log!("serve"; "static route failed: {e:#}");
            send_body(request, 404, PLAIN, b"404 Not Found".to_vec())
        }
    }
}

/// Respond with an API handler's result.
pub(crate) fn respond_api(request: Request, response: ApiResponse) -> Result<()> {
    let header = make_header("Content-Type", &response.content_type);
    match response.body {
        ResponseBody::Bytes(bytes) => {
            let http = Response::from_data(bytes)
                .with_status_code(StatusCode(response.status))
                .with_header(header);
            request.respond(http)?;
        }
        ResponseBody::Reader(reader) => {
            // No length: tiny_http falls back to chunked transfer
            let http = Response::new(
                StatusCode(response.status),
                vec![header],
                reader,
                None,
                None,
            );
            request.respond(http)?;
        }
    }
    Ok(())
}

/// Respond with 405 Method Not Allowed, listing the allowed methods.
pub(crate) fn respond_method_not_allowed(request: Request, allow: &str) -> Result<()> {
    let response = Response::from_data(b"405 Method Not Allowed".to_vec())
        .with_status_code(StatusCode(405))
        .with_header(make_header("Content-Type", PLAIN))
        .with_header(make_header("Allow", allow));
    request.respond(response)?;
    Ok(())
}

/// Respond with 500 after a handler failure.
pub(crate) fn respond_handler_error(request: Request) -> Result<()> {
    send_body(request, 500, PLAIN, b"500 Internal Server Error".to_vec())
}

/// Respond with 503 Service Unavailable (server shutting down).
pub(crate) fn respond_unavailable(request: Request) -> Result<()> {
    send_body(request, 503, PLAIN, b"503 Service Unavailable".to_vec())
}

fn send_body(request: Request, status: u16, content_type: &str, body: Vec<u8>) -> Result<()> {
    let response = Response::from_data(body)
        .with_status_code(StatusCode(status))
        .with_header(make_header("Content-Type", content_type));
    request.respond(response)?;
    Ok(())
}

fn make_header(key: &str, value: &str) -> Header {
    Header::from_bytes(key.as_bytes(), value.as_bytes())
        .unwrap_or_else(|_| Header::from_bytes(&b"X-Invalid"[..], &b""[..]).expect("static header"))
}
