use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Context;
use tokio::net::{TcpListener, ToSocketAddrs};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::info;

use crate::http::connection::Connection;
use crate::http::parser::ReadLimits;
use crate::server::handler::Handler;

/// Per-connection hardening knobs. The defaults impose no deadline and no size limit.
#[derive(Debug, Clone, Copy, Default)]
pub struct ServerOptions {
    /// Deadline for receiving a complete request.
    pub read_timeout: Option<Duration>,
    pub limits: ReadLimits,
}

/// State shared between the accept loop and every connection task.
#[derive(Debug, Default)]
pub struct ServerState {
    // Bookkeeping only; held for a single insert or remove.
    connections: Mutex<HashMap<u64, SocketAddr>>,
    next_id: AtomicU64,
    closing: AtomicBool,
}

impl ServerState {
    pub fn is_closing(&self) -> bool {
        self.closing.load(Ordering::Relaxed)
    }

    fn register(self: &Arc<Self>, peer: SocketAddr) -> Registration {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut conns) = self.connections.lock() {
            conns.insert(id, peer);
        }
        Registration {
            id,
            state: Arc::clone(self),
        }
    }

    fn open_connections(&self) -> usize {
        self.connections.lock().map(|c| c.len()).unwrap_or(0)
    }
}

/// Removes its connection from the registry when dropped.
struct Registration {
    id: u64,
    state: Arc<ServerState>,
}

impl Drop for Registration {
    fn drop(&mut self) {
        if let Ok(mut conns) = self.state.connections.lock() {
            conns.remove(&self.id);
        }
    }
}

/// Handle to a running server.
///
/// Dropping the handle without calling [`close`](Self::close) detaches the server: the accept
/// loop keeps serving until the runtime shuts down.
pub struct Server {
    local_addr: SocketAddr,
    state: Arc<ServerState>,
    shutdown: broadcast::Sender<()>,
    accept_task: JoinHandle<()>,
}

impl Server {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Number of connections currently being served.
    pub fn open_connections(&self) -> usize {
        self.state.open_connections()
    }

    pub fn is_closing(&self) -> bool {
        self.state.is_closing()
    }

    /// Stops accepting connections.
    ///
    /// The listening socket is dropped by the accept loop, and no connection is accepted once
    /// this returns, even one already queued. Connections already accepted keep running until
    /// their response is written.
    pub fn close(&self) {
        self.state.closing.store(true, Ordering::Relaxed);
        let _ = self.shutdown.send(());
    }

    /// Waits for the accept loop to exit. Call after [`close`](Self::close).
    pub async fn wait(self) {
        if let Err(e) = self.accept_task.await {
            tracing::error!(error = %e, "Accept loop panicked");
        }
    }
}

/// Binds `addr` and starts serving `handler` in the background.
pub async fn serve<A, H>(addr: A, handler: H) -> anyhow::Result<Server>
where
    A: ToSocketAddrs,
    H: Handler,
{
    serve_with(addr, handler, ServerOptions::default()).await
}

pub async fn serve_with<A, H>(addr: A, handler: H, options: ServerOptions) -> anyhow::Result<Server>
where
    A: ToSocketAddrs,
    H: Handler,
{
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind listener")?;
    let local_addr = listener.local_addr()?;
    info!("Listening on {}", local_addr);

    let state = Arc::new(ServerState::default());
    let (shutdown, shutdown_rx) = broadcast::channel(1);
    let accept_task = tokio::spawn(accept_loop(
        listener,
        Arc::new(handler),
        Arc::clone(&state),
        options,
        shutdown_rx,
    ));

    Ok(Server {
        local_addr,
        state,
        shutdown,
        accept_task,
    })
}

async fn accept_loop<H: Handler>(
    listener: TcpListener,
    handler: Arc<H>,
    state: Arc<ServerState>,
    options: ServerOptions,
    mut shutdown: broadcast::Receiver<()>,
) {
    // Cleared when the `Server` handle is dropped without `close()`.
    let mut watch_shutdown = true;

    loop {
        let (socket, peer) = tokio::select! {
            biased;

            signal = shutdown.recv(), if watch_shutdown => match signal {
                Ok(()) | Err(RecvError::Lagged(_)) => break,
                Err(RecvError::Closed) if state.is_closing() => break,
                Err(RecvError::Closed) => {
                    tracing::debug!("Server handle dropped, serving detached");
                    watch_shutdown = false;
                    continue;
                }
            },
            accepted = listener.accept() => match accepted {
                Ok(conn) => conn,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to accept connection");
                    break;
                }
            },
        };

        info!("Accepted connection from {}", peer);
        let registration = state.register(peer);
        let conn = Connection::new(
            socket,
            peer,
            Arc::clone(&handler),
            Arc::clone(&state),
            options,
        );

        tokio::spawn(async move {
            conn.run().await;
            drop(registration);
        });
    }

    info!("Listener on {:?} closed", listener.local_addr().ok());
}
