//! Socket IO bridge - one thread per connection.
//!
//! The session loop is a tokio task; the socket is a blocking tungstenite
//! stream. A dedicated IO thread owns the socket: it performs the
//! WebSocket accept, switches to non-blocking reads, and then polls -
//! forwarding inbound frames over a tokio channel and draining the
//! session's outbound channel onto the wire as binary frames.
//!
//! Channel teardown doubles as cancellation: when the socket closes, the
//! inbound sender drops and the session loop observes `None` at its next
//! suspension point; when the session exits, the outbound receiver
//! disconnects and the IO thread closes the socket.

use std::net::TcpStream;

use crossbeam::channel::{self, TryRecvError};
use tokio::sync::mpsc as async_mpsc;
use tungstenite::WebSocket;
use tungstenite::protocol::Message;

use crate::error::SessionError;
use crate::wire::ServerMessage;

/// Poll interval for the non-blocking socket loop
const POLL_INTERVAL: std::time::Duration = std::time::Duration::from_millis(10);

/// Inbound channel depth per session
const INBOUND_BUFFER: usize = 32;

/// An inbound frame as the session loop sees it.
#[derive(Debug, Clone)]
pub(crate) enum Frame {
    Text(String),
    Binary(Vec<u8>),
    /// A frame with neither binary nor text payload (ping/pong/raw)
    Other,
}

/// Cloneable outbound sink. Frames are encoded here and written to the
/// wire by the IO thread.
#[derive(Clone)]
pub(crate) struct Outbound {
    tx: channel::Sender<Vec<u8>>,
}

impl Outbound {
    /// Encode and enqueue one server message.
    pub(crate) fn send(&self, msg: &ServerMessage) -> Result<(), SessionError> {
        self.tx
            .send(msg.to_bytes())
            .map_err(|_| SessionError::ConnectionClosed)
    }
}

/// The session-facing halves of a connection.
pub(crate) struct SessionChannels {
    pub inbound: async_mpsc::Receiver<Frame>,
    pub outbound: Outbound,
}

/// Create an unconnected channel pair for tests and in-process drivers.
///
/// Returns the session halves plus the far ends: a sender to script
/// inbound frames and a receiver observing encoded outbound frames.
pub(crate) fn channel_pair() -> (
    SessionChannels,
    async_mpsc::Sender<Frame>,
    channel::Receiver<Vec<u8>>,
) {
    let (inbound_tx, inbound_rx) = async_mpsc::channel(INBOUND_BUFFER);
    let (outbound_tx, outbound_rx) = channel::unbounded();
    let channels = SessionChannels {
        inbound: inbound_rx,
        outbound: Outbound { tx: outbound_tx },
    };
    (channels, inbound_tx, outbound_rx)
}

/// Take ownership of an accepted TCP stream and bridge it to channels.
///
/// Spawns the IO thread; returns the session halves.
pub(crate) fn spawn_io(stream: TcpStream) -> SessionChannels {
    let (channels, inbound_tx, outbound_rx) = channel_pair();

    std::thread::spawn(move || {
        socket_loop(stream, inbound_tx, outbound_rx);
    });

    channels
}

fn socket_loop(
    stream: TcpStream,
    inbound_tx: async_mpsc::Sender<Frame>,
    outbound_rx: channel::Receiver<Vec<u8>>,
) {
    // Keep blocking mode during the WebSocket accept, switch after
    let mut ws = match tungstenite::accept(stream) {
        Ok(ws) => ws,
        Err(e) => {
            crate::log!("ws"; "handshake failed: {}", e);
            return;
        }
    };
    let _ = ws.get_ref().set_nonblocking(true);

    loop {
        // Inbound: non-blocking read, forward to the session task
        match ws.read() {
            Ok(Message::Text(text)) => {
                if inbound_tx.blocking_send(Frame::Text(text.to_string())).is_err() {
                    break; // session gone
                }
            }
            Ok(Message::Binary(bytes)) => {
                if inbound_tx.blocking_send(Frame::Binary(bytes.to_vec())).is_err() {
                    break;
                }
            }
            Ok(Message::Close(_)) => {
                crate::debug!("ws"; "client disconnected");
                return;
            }
            Ok(_) => {
                if inbound_tx.blocking_send(Frame::Other).is_err() {
                    break;
                }
            }
            Err(tungstenite::Error::Io(ref e))
                if e.kind() == std::io::ErrorKind::WouldBlock =>
            {
                // No data available
            }
            Err(e) => {
                crate::debug!("ws"; "read error, dropping connection: {}", e);
                return;
            }
        }

        // Outbound: drain everything the session queued
        loop {
            match outbound_rx.try_recv() {
                Ok(bytes) => {
                    if write_binary(&mut ws, bytes).is_err() {
                        return;
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    // Session ended; close out politely
                    let _ = ws.close(None);
                    let _ = ws.flush();
                    return;
                }
            }
        }

        std::thread::sleep(POLL_INTERVAL);
    }

    let _ = ws.close(None);
    let _ = ws.flush();
}

/// Write one binary frame, retrying flush on a non-blocking socket.
///
/// A peer that stops draining for more than ~5s counts as gone.
fn write_binary(ws: &mut WebSocket<TcpStream>, bytes: Vec<u8>) -> Result<(), tungstenite::Error> {
    const MAX_FLUSH_RETRIES: u32 = 500;

    match ws.send(Message::Binary(bytes.into())) {
        Ok(()) => Ok(()),
        Err(tungstenite::Error::Io(ref e)) if e.kind() == std::io::ErrorKind::WouldBlock => {
            for _ in 0..MAX_FLUSH_RETRIES {
                match ws.flush() {
                    Ok(()) => return Ok(()),
                    Err(tungstenite::Error::Io(ref e))
                        if e.kind() == std::io::ErrorKind::WouldBlock =>
                    {
                        std::thread::sleep(POLL_INTERVAL);
                    }
                    Err(e) => return Err(e),
                }
            }
            Err(tungstenite::Error::Io(std::io::ErrorKind::TimedOut.into()))
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::ServerMessage;

    #[test]
    fn test_outbound_encodes_onto_channel() {
        let (channels, _inbound_tx, outbound_rx) = channel_pair();

        channels
            .outbound
            .send(&ServerMessage::console_clear())
            .unwrap();

        let bytes = outbound_rx.try_recv().unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["type"], "console-clear");
    }

    #[test]
    fn test_outbound_send_after_disconnect_errors() {
        let (channels, _inbound_tx, outbound_rx) = channel_pair();
        drop(outbound_rx);

        assert!(matches!(
            channels.outbound.send(&ServerMessage::console_clear()),
            Err(SessionError::ConnectionClosed)
        ));
    }
}
