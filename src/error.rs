//! Error types for the session runtime.
//!
//! Every variant of [`SessionError`] is fatal to exactly one session: the
//! loop exits, the connection is torn down, and no other session or any
//! retained hook-store value is affected.

use thiserror::Error;

// ============================================================================
// ProtocolError
// ============================================================================

/// Wire codec failures on inbound frames.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed JSON payload")]
    Malformed(#[from] serde_json::Error),

    /// A frame arrived whose kind the current phase does not admit
    /// (e.g. a binary frame during the event phase).
    #[error("unexpected frame kind for this phase")]
    UnexpectedFrame,
}

// ============================================================================
// SessionError
// ============================================================================

/// Fatal session conditions, one per connection.
#[derive(Debug, Error)]
pub enum SessionError {
    /// First message carried neither a binary nor a text payload.
    #[error("handshake message carried neither binary nor text payload")]
    Handshake,

    /// The handshake URL has no bound page.
    #[error("no page bound to `{0}`")]
    RouteNotFound(String),

    /// Malformed or unexpected inbound message.
    #[error("failed to decode inbound message")]
    Decode(#[from] ProtocolError),

    /// Event referenced an `(id, event)` pair absent from the registry
    /// built by the most recent render.
    #[error("no handler bound to element `{id}` for `{event}`")]
    HandlerNotFound { id: String, event: String },

    /// A dispatched event handler returned an error.
    #[error("event handler failed")]
    Handler(#[source] anyhow::Error),

    /// The route's render function returned an error.
    #[error("render failed")]
    Render(#[source] anyhow::Error),

    /// The peer went away while the session still had frames to push.
    #[error("connection closed")]
    ConnectionClosed,
}

// ============================================================================
// HookError
// ============================================================================

/// Hook store misuse detected at lookup time.
#[derive(Debug, Error)]
pub enum HookError {
    /// A state cell holds a value of a different type than the lookup
    /// requested. Cells are keyed by bare name process-wide, so two call
    /// sites sharing a name must agree on the stored type.
    #[error("state cell `{name}` holds a different type")]
    TypeMismatch { name: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_error_display() {
        let err = SessionError::RouteNotFound("/missing".into());
        assert!(format!("{err}").contains("/missing"));

        let err = SessionError::HandlerNotFound {
            id: "e3".into(),
            event: "onclick".into(),
        };
        let display = format!("{err}");
        assert!(display.contains("e3"));
        assert!(display.contains("onclick"));
    }

    #[test]
    fn test_protocol_error_from_serde() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{nope").unwrap_err();
        let err: ProtocolError = parse_err.into();
        assert!(matches!(err, ProtocolError::Malformed(_)));

        let session_err: SessionError = err.into();
        assert!(matches!(session_err, SessionError::Decode(_)));
    }
}
