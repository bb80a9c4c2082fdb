//! Wire Message Protocol
//!
//! Defines the JSON message envelope for WebSocket communication between
//! the session runtime and browser clients.
//!
//! # Outbound (server -> client)
//!
//! - `html`: full re-render push (serialized tree)
//! - `console`: console output command (`log`/`error`/`warn`/`info`)
//! - `console-clear`: clear the client console
//! - `ls`: local-storage read/write request
//! - `router`: client navigation command
//!
//! # Inbound (client -> server)
//!
//! - handshake (first message, binary or text payload): initial location
//! - event (text payload): `(element id, event name)` report
//!
//! All payloads are UTF-8 JSON. Outbound messages travel as binary frames.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProtocolError;

// =============================================================================
// Outbound envelope
// =============================================================================

/// Server-to-client message envelope, distinguished by a `type` field
/// with the payload under `data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum ServerMessage {
    /// Full re-render push
    Html(WireNode),

    /// Console output command
    Console(ConsoleLine),

    /// Clear the client console
    #[serde(rename = "console-clear")]
    ConsoleClear(()),

    /// Local-storage request directed at the client
    Ls(LsRequest),

    /// Client navigation command issued by server code
    Router(RouterCmd),
}

/// A console output line with its severity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsoleLine {
    /// Severity (`log`, `error`, `warn`, `info`)
    #[serde(rename = "type")]
    pub level: ConsoleLevel,
    /// Message text
    pub message: String,
}

/// Console severity levels understood by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleLevel {
    Log,
    Error,
    Warn,
    Info,
}

/// Local-storage request payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum LsRequest {
    /// Ask the client to report its local storage
    Get,
    /// Ask the client to store the given entries
    Set(BTreeMap<String, String>),
}

/// Client navigation command payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RouterCmd {
    /// Push a new history entry and navigate
    Push { url: String },
    /// Replace the current history entry
    Replace { url: String },
    /// Reload the current page
    Reload,
    /// Go back one history entry
    Back,
    /// Go forward one history entry
    Forward,
}

impl ServerMessage {
    /// Create an html push message
    pub fn html(tree: WireNode) -> Self {
        Self::Html(tree)
    }

    /// Create a console output message
    pub fn console(level: ConsoleLevel, message: impl Into<String>) -> Self {
        Self::Console(ConsoleLine {
            level,
            message: message.into(),
        })
    }

    /// Create a console-clear message
    pub fn console_clear() -> Self {
        Self::ConsoleClear(())
    }

    /// Create a local-storage read request
    pub fn ls_get() -> Self {
        Self::Ls(LsRequest::Get)
    }

    /// Create a local-storage write request
    pub fn ls_set(entries: BTreeMap<String, String>) -> Self {
        Self::Ls(LsRequest::Set(entries))
    }

    /// Create a router command message
    pub fn router(cmd: RouterCmd) -> Self {
        Self::Router(cmd)
    }

    /// Serialize to the binary frame payload.
    pub fn to_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(self)
            .unwrap_or_else(|_| br#"{"type":"console-clear","data":null}"#.to_vec())
    }
}

// =============================================================================
// Serialized tree
// =============================================================================

/// One node of the serialized UI tree pushed on every dirty render.
///
/// Produced fresh per render by lowering the builder tree; event-handler
/// attributes never reach the wire (they live in the session's event
/// registry, referenced through the node `id`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireNode {
    /// Element tag name
    pub tag: String,
    /// Attribute map (string values only on the wire)
    pub attrs: serde_json::Map<String, Value>,
    /// Ordered children: text runs or nested nodes
    pub children: Vec<WireChild>,
}

/// A serialized child: bare text or a nested node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireChild {
    Text(String),
    Node(WireNode),
}

// =============================================================================
// Inbound frames
// =============================================================================

/// Initial location reported by the client during the handshake.
///
/// The binary handshake form carries this payload directly; the text form
/// nests it under a `data` key. Both normalize to the same shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandshakePayload {
    /// Location path (`window.location.pathname`)
    pub url: String,
    /// Query parameters as ordered pairs
    pub query: Vec<(String, String)>,
    /// Location fragment, including the leading `#` when present
    pub hash: String,
}

/// An `(element id, event name)` report from the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientEvent {
    /// Element identifier assigned during lowering
    pub id: String,
    /// Event name as advertised in the rendered tree
    pub event: String,
}

#[derive(Deserialize)]
struct Enveloped<T> {
    data: T,
}

/// Decode a binary handshake payload.
pub fn decode_handshake_binary(bytes: &[u8]) -> Result<HandshakePayload, ProtocolError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Decode a text handshake payload (`{"data": {...}}` form).
pub fn decode_handshake_text(text: &str) -> Result<HandshakePayload, ProtocolError> {
    let enveloped: Enveloped<HandshakePayload> = serde_json::from_str(text)?;
    Ok(enveloped.data)
}

/// Decode an event frame (`{"data": {"id": ..., "event": ...}}`).
pub fn decode_event(text: &str) -> Result<ClientEvent, ProtocolError> {
    let enveloped: Enveloped<ClientEvent> = serde_json::from_str(text)?;
    Ok(enveloped.data)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn to_value(msg: &ServerMessage) -> Value {
        serde_json::from_slice(&msg.to_bytes()).unwrap()
    }

    #[test]
    fn test_html_message_shape() {
        let tree = WireNode {
            tag: "div".into(),
            attrs: serde_json::Map::new(),
            children: vec![WireChild::Text("hi".into())],
        };
        assert_eq!(
            to_value(&ServerMessage::html(tree)),
            json!({"type": "html", "data": {"tag": "div", "attrs": {}, "children": ["hi"]}})
        );
    }

    #[test]
    fn test_console_message_shape() {
        assert_eq!(
            to_value(&ServerMessage::console(ConsoleLevel::Warn, "careful")),
            json!({"type": "console", "data": {"type": "warn", "message": "careful"}})
        );
    }

    #[test]
    fn test_console_clear_shape() {
        assert_eq!(
            to_value(&ServerMessage::console_clear()),
            json!({"type": "console-clear", "data": null})
        );
    }

    #[test]
    fn test_ls_shapes() {
        assert_eq!(
            to_value(&ServerMessage::ls_get()),
            json!({"type": "ls", "data": {"type": "get"}})
        );

        let mut entries = BTreeMap::new();
        entries.insert("theme".to_string(), "dark".to_string());
        assert_eq!(
            to_value(&ServerMessage::ls_set(entries)),
            json!({"type": "ls", "data": {"type": "set", "data": {"theme": "dark"}}})
        );
    }

    #[test]
    fn test_router_shapes() {
        assert_eq!(
            to_value(&ServerMessage::router(RouterCmd::Push {
                url: "/about".into()
            })),
            json!({"type": "router", "data": {"type": "push", "url": "/about"}})
        );
        assert_eq!(
            to_value(&ServerMessage::router(RouterCmd::Reload)),
            json!({"type": "router", "data": {"type": "reload"}})
        );
        assert_eq!(
            to_value(&ServerMessage::router(RouterCmd::Back)),
            json!({"type": "router", "data": {"type": "back"}})
        );
    }

    #[test]
    fn test_nested_tree_round_trip() {
        let tree = WireNode {
            tag: "div".into(),
            attrs: serde_json::Map::new(),
            children: vec![
                WireChild::Text("before".into()),
                WireChild::Node(WireNode {
                    tag: "button".into(),
                    attrs: {
                        let mut attrs = serde_json::Map::new();
                        attrs.insert("id".into(), json!("e0"));
                        attrs
                    },
                    children: vec![WireChild::Text("Click Me".into())],
                }),
            ],
        };

        let bytes = ServerMessage::html(tree.clone()).to_bytes();
        let decoded: ServerMessage = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(decoded, ServerMessage::Html(tree));
    }

    #[test]
    fn test_handshake_forms_normalize() {
        let binary =
            decode_handshake_binary(br#"{"url": "/docs", "query": [["a", "1"]], "hash": ""}"#)
                .unwrap();
        let text =
            decode_handshake_text(r#"{"data": {"url": "/docs", "query": [["a", "1"]], "hash": ""}}"#)
                .unwrap();
        assert_eq!(binary, text);
        assert_eq!(binary.url, "/docs");
        assert_eq!(binary.query, vec![("a".to_string(), "1".to_string())]);
    }

    #[test]
    fn test_event_decode() {
        let event = decode_event(r#"{"data": {"id": "btn1", "event": "onclick"}}"#).unwrap();
        assert_eq!(event.id, "btn1");
        assert_eq!(event.event, "onclick");
    }

    #[test]
    fn test_malformed_inbound_is_protocol_error() {
        assert!(decode_event("{not json").is_err());
        assert!(decode_event(r#"{"data": {"id": "btn1"}}"#).is_err());
        assert!(decode_handshake_binary(b"\xff\xfe").is_err());
        assert!(decode_handshake_text(r#"{"url": "/"}"#).is_err());
    }
}
