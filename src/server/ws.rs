//! WebSocket listener and session supervisor.
//!
//! An acceptor thread hands raw TCP streams to the supervisor task over a
//! channel; the supervisor spawns one session task per connection. A
//! session failing - protocol violation, unresolved route, handler error -
//! is logged and torn down alone; the supervisor and every other session
//! keep running.

use std::net::{IpAddr, SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;

use anyhow::Result;
use crossbeam::channel::Receiver;
use tokio::sync::mpsc;

use crate::hooks::HookStore;
use crate::session::{PageTable, Session, spawn_io};
use crate::{debug, log};

/// Maximum port retry attempts
const MAX_PORT_RETRIES: u16 = 10;

/// Start the WebSocket listener; accepted streams go to the supervisor.
///
/// Returns the actually bound port (may differ from `base_port` when it
/// was in use).
pub(crate) fn start_ws_listener(
    interface: IpAddr,
    base_port: u16,
    session_tx: mpsc::Sender<TcpStream>,
) -> Result<u16> {
    let (listener, actual_port) = try_bind_port(interface, base_port, MAX_PORT_RETRIES)?;
    listener.set_nonblocking(true)?;

    // Spawn acceptor thread
    std::thread::spawn(move || {
        loop {
            match listener.accept() {
                Ok((stream, addr)) => {
                    debug!("ws"; "client connected: {}", addr);

                    // Back to blocking for the WebSocket accept
                    let _ = stream.set_nonblocking(false);

                    if session_tx.blocking_send(stream).is_err() {
                        log!("ws"; "supervisor gone, stopping acceptor");
                        break;
                    }
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    std::thread::sleep(std::time::Duration::from_millis(100));
                    continue;
                }
                Err(e) => {
                    log!("ws"; "accept error: {}", e);
                    std::thread::sleep(std::time::Duration::from_millis(100));
                }
            }
        }
    });

    Ok(actual_port)
}

/// Run sessions until the stream channel closes or shutdown is signaled.
pub(crate) async fn run_sessions(
    mut session_rx: mpsc::Receiver<TcpStream>,
    hooks: Arc<HookStore>,
    pages: Arc<PageTable>,
    shutdown_rx: Receiver<()>,
) {
    loop {
        tokio::select! {
            stream = session_rx.recv() => {
                let Some(stream) = stream else { break };
                let channels = spawn_io(stream);
                let session = Session::new(channels, Arc::clone(&hooks), Arc::clone(&pages));
                tokio::spawn(async move {
                    match session.run().await {
                        Ok(()) => debug!("session"; "closed"),
                        Err(e) => log!("session"; "terminated: {}", e),
                    }
                });
            }
            _ = wait_shutdown(&shutdown_rx) => {
                debug!("session"; "shutdown signal received");
                break;
            }
        }
    }
}

/// Resolve once the shutdown channel delivers (or disconnects).
async fn wait_shutdown(shutdown_rx: &Receiver<()>) {
    loop {
        if shutdown_rx.try_recv().is_ok() {
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    }
}

/// Try binding to port, retry with incremented port if in use
fn try_bind_port(
    interface: IpAddr,
    base_port: u16,
    max_retries: u16,
) -> Result<(TcpListener, u16)> {
    let mut last_error = None;

    for offset in 0..max_retries {
        let port = base_port.saturating_add(offset);
        match TcpListener::bind(SocketAddr::new(interface, port)) {
            Ok(listener) => {
                let actual_port = listener.local_addr()?.port();
                return Ok((listener, actual_port));
            }
            Err(e) => {
                last_error = Some(e);
                continue;
            }
        }
    }

    Err(anyhow::anyhow!(
        "failed to bind WebSocket listener after {} attempts: {}",
        max_retries,
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn test_bind_retries_past_taken_port() {
        let localhost = IpAddr::V4(Ipv4Addr::LOCALHOST);
        let (first, first_port) = try_bind_port(localhost, 0, 1).expect("ephemeral bind");

        // Binding the same port again must fall through to the next one.
        let (_second, second_port) =
            try_bind_port(localhost, first_port, MAX_PORT_RETRIES).expect("retry bind");
        assert_ne!(first_port, second_port);
        drop(first);
    }
}
