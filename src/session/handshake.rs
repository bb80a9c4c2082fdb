//! Session handshake - the first inbound message.
//!
//! The client reports its initial location as either a binary payload
//! (`{"url", "query", "hash"}`) or a text payload with the same shape
//! nested under `data`. Both normalize to a [`Location`]. A first message
//! carrying neither payload kind is fatal: the connection is considered
//! unusable and no response frame is sent.

use percent_encoding::percent_decode_str;
use rustc_hash::FxHashMap;

use super::transport::Frame;
use crate::error::SessionError;
use crate::wire::{self, HandshakePayload};

/// The location a session was opened at: path, query parameters, fragment.
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    path: String,
    query: FxHashMap<String, String>,
    hash: String,
}

impl Location {
    /// Location path, percent-decoded.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Query parameters. Duplicate keys keep the last pair.
    pub fn query(&self) -> &FxHashMap<String, String> {
        &self.query
    }

    /// Location fragment (empty string when absent).
    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub(crate) fn from_payload(payload: HandshakePayload) -> Self {
        let path = percent_decode_str(&payload.url)
            .decode_utf8()
            .map(|decoded| decoded.into_owned())
            .unwrap_or(payload.url);

        Self {
            path,
            query: payload.query.into_iter().collect(),
            hash: payload.hash,
        }
    }
}

/// Decode and normalize the handshake frame.
pub(crate) fn read_location(frame: Option<Frame>) -> Result<Location, SessionError> {
    match frame {
        Some(Frame::Binary(bytes)) => {
            let payload = wire::decode_handshake_binary(&bytes)?;
            Ok(Location::from_payload(payload))
        }
        Some(Frame::Text(text)) => {
            let payload = wire::decode_handshake_text(&text)?;
            Ok(Location::from_payload(payload))
        }
        Some(Frame::Other) => Err(SessionError::Handshake),
        None => Err(SessionError::ConnectionClosed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_and_text_forms_agree() {
        let binary = read_location(Some(Frame::Binary(
            br##"{"url": "/docs", "query": [["page", "2"]], "hash": "#top"}"##.to_vec(),
        )))
        .unwrap();
        let text = read_location(Some(Frame::Text(
            r##"{"data": {"url": "/docs", "query": [["page", "2"]], "hash": "#top"}}"##.into(),
        )))
        .unwrap();

        assert_eq!(binary, text);
        assert_eq!(binary.path(), "/docs");
        assert_eq!(binary.query().get("page").map(String::as_str), Some("2"));
        assert_eq!(binary.hash(), "#top");
    }

    #[test]
    fn test_percent_encoded_path_is_decoded() {
        let location = read_location(Some(Frame::Text(
            r#"{"data": {"url": "/caf%C3%A9", "query": [], "hash": ""}}"#.into(),
        )))
        .unwrap();
        assert_eq!(location.path(), "/café");
    }

    #[test]
    fn test_neither_payload_kind_is_fatal() {
        assert!(matches!(
            read_location(Some(Frame::Other)),
            Err(SessionError::Handshake)
        ));
    }

    #[test]
    fn test_malformed_payload_is_decode_error() {
        assert!(matches!(
            read_location(Some(Frame::Text("{broken".into()))),
            Err(SessionError::Decode(_))
        ));
    }

    #[test]
    fn test_closed_before_handshake() {
        assert!(matches!(
            read_location(None),
            Err(SessionError::ConnectionClosed)
        ));
    }
}
