//! Embedded static resources.
//!
//! The HTTP layer serves two in-memory assets: the bootstrap shell
//! (`app.html`, returned for every page path) and the thin client
//! (`client.js`). Both are templates with the WebSocket port injected at
//! serve time.

mod template;

pub use template::{Template, TemplateVars};

/// Reserved path prefix for runtime-owned routes.
pub const RESERVED_PREFIX: &str = "/__ripple";

/// URL path the bootstrap shell loads the client from.
pub const CLIENT_JS_PATH: &str = "/__ripple/client.js";

/// Variables for the bootstrap shell and client script.
pub struct BootVars {
    pub ws_port: u16,
}

impl TemplateVars for BootVars {
    fn apply(&self, content: &str) -> String {
        content.replace("__RIPPLE_WS_PORT__", &self.ws_port.to_string())
    }
}

/// Bootstrap HTML shell served for every page path.
pub const APP_HTML: Template<BootVars> = Template::new(include_str!("app.html"));

/// Thin client script served from memory.
pub const CLIENT_JS: Template<BootVars> = Template::new(include_str!("client.js"));

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ws_port_substitution() {
        let js = CLIENT_JS.render(&BootVars { ws_port: 9222 });
        assert!(js.contains("9222"));
        assert!(!js.contains("__RIPPLE_WS_PORT__"));
    }

    #[test]
    fn test_shell_references_client_script() {
        let html = APP_HTML.render(&BootVars { ws_port: 9222 });
        assert!(html.contains(CLIENT_JS_PATH));
    }
}
