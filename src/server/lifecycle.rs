//! Server lifecycle - binding, runtime thread, graceful shutdown.
//!
//! Shutdown states:
//! - `SHUTDOWN`: set by the Ctrl+C handler; request workers answer 503
//! - registered server handle: unblocked so the request loop can exit
//! - shutdown channel: drains the session supervisor

use std::net::{IpAddr, SocketAddr, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread::{self, JoinHandle};

use anyhow::Result;
use crossbeam::channel::{Receiver, Sender};
use tiny_http::Server;
use tokio::sync::mpsc;

use super::ws;
use crate::hooks::HookStore;
use crate::session::PageTable;
use crate::{debug, log};

/// Maximum number of port binding attempts.
const MAX_PORT_RETRIES: u16 = 10;

/// Shutdown has been requested (Ctrl+C received)
static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// HTTP server reference for graceful shutdown
static SERVER: OnceLock<Arc<Server>> = OnceLock::new();

/// Shutdown signal sender for the session supervisor
static SHUTDOWN_TX: OnceLock<Sender<()>> = OnceLock::new();

/// Check if shutdown has been requested
pub fn is_shutdown() -> bool {
    SHUTDOWN.load(Ordering::Relaxed)
}

/// Setup the global Ctrl+C handler. Call once at program start.
///
/// Before a server is registered the process exits immediately; after,
/// the handler unblocks the request loop and signals the supervisor.
pub fn setup_shutdown_handler() -> Result<()> {
    ctrlc::set_handler(|| {
        SHUTDOWN.store(true, Ordering::SeqCst);

        if let Some(tx) = SHUTDOWN_TX.get() {
            let _ = tx.send(());
        }

        if let Some(server) = SERVER.get() {
            log!("serve"; "shutting down...");
            server.unblock();
        } else {
            std::process::exit(0);
        }
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {}", e))
}

/// Register the HTTP server for graceful shutdown.
///
/// Call after binding, before entering the request loop.
pub(crate) fn register_server(server: Arc<Server>, shutdown_tx: Sender<()>) {
    let _ = SERVER.set(server);
    let _ = SHUTDOWN_TX.set(shutdown_tx);
}

/// Bind to the specified interface and port, with automatic port retry.
pub(crate) fn bind_with_retry(interface: IpAddr, base_port: u16) -> Result<(Server, SocketAddr)> {
    for offset in 0..MAX_PORT_RETRIES {
        let port = base_port.saturating_add(offset);
        let addr = SocketAddr::new(interface, port);

        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    log!("serve"; "port {} in use, using {} instead", base_port, port);
                }
                return Ok((server, addr));
            }
            Err(_) if offset + 1 < MAX_PORT_RETRIES => continue,
            Err(e) => {
                return Err(anyhow::anyhow!(
                    "failed to bind after {} attempts (ports {}-{}): {}",
                    MAX_PORT_RETRIES,
                    base_port,
                    port,
                    e
                ));
            }
        }
    }
    unreachable!()
}

/// Spawn the session supervisor on a dedicated tokio runtime thread.
pub(crate) fn spawn_supervisor(
    session_rx: mpsc::Receiver<TcpStream>,
    hooks: Arc<HookStore>,
    pages: Arc<PageTable>,
    shutdown_rx: Receiver<()>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let rt = match tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
        {
            Ok(rt) => rt,
            Err(e) => {
                log!("serve"; "failed to create runtime: {}", e);
                return;
            }
        };

        rt.block_on(ws::run_sessions(session_rx, hooks, pages, shutdown_rx));
        debug!("serve"; "supervisor stopped");
    })
}

/// Wait for the supervisor to shut down gracefully (max 2 seconds).
pub(crate) fn wait_for_shutdown(handle: JoinHandle<()>) {
    for _ in 0..40 {
        if handle.is_finished() {
            let _ = handle.join();
            return;
        }
        thread::sleep(std::time::Duration::from_millis(50));
    }
}
