//! Bounded TCP listener.
//!
//! A connection slot is taken before `accept()` is called, so at most
//! `max_connections` sockets are open at once. Further clients wait in the
//! kernel backlog until a slot frees up.

use std::io::ErrorKind;
use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::config::ListenerConfig;

/// `EBADF` has the same value on every Unix.
#[cfg(unix)]
const EBADF: i32 = 9;

/// Error type for listener operations.
#[derive(Debug)]
pub enum ListenerError {
    /// The address did not parse or could not be bound.
    Bind {
        address: String,
        source: std::io::Error,
    },
    /// `accept(2)` failed.
    Accept(std::io::Error),
}

impl ListenerError {
    /// Whether the listening socket itself is unusable.
    ///
    /// Accept errors caused by one client (aborted handshakes) or by
    /// temporary resource exhaustion (`EMFILE`, `ENFILE`, `ENOBUFS`) are not
    /// fatal; they clear once connections close.
    pub fn is_fatal(&self) -> bool {
        match self {
            ListenerError::Bind { .. } => true,
            ListenerError::Accept(e) => {
                #[cfg(unix)]
                if e.raw_os_error() == Some(EBADF) {
                    return true;
                }
                matches!(
                    e.kind(),
                    ErrorKind::InvalidInput | ErrorKind::NotConnected | ErrorKind::Unsupported
                )
            }
        }
    }
}

impl std::fmt::Display for ListenerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListenerError::Bind { address, source } => {
                write!(f, "Failed to bind {}: {}", address, source)
            }
            ListenerError::Accept(e) => write!(f, "Failed to accept: {}", e),
        }
    }
}

impl std::error::Error for ListenerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ListenerError::Bind { source, .. } => Some(source),
            ListenerError::Accept(e) => Some(e),
        }
    }
}

/// One accepted socket and the slot it occupies.
///
/// The slot is released when this value (or the `slot` field moved out of
/// it) is dropped, including when the owning task is aborted.
#[derive(Debug)]
pub struct Accepted {
    pub stream: TcpStream,
    pub peer: SocketAddr,
    pub slot: OwnedSemaphorePermit,
}

/// Source of client connections for the lifecycle manager.
#[async_trait]
pub trait Acceptor: Send + Sync + 'static {
    /// Wait for the next client. Must be cancel safe.
    async fn accept(&self) -> Result<Accepted, ListenerError>;

    fn local_addr(&self) -> std::io::Result<SocketAddr>;
}

/// The server's listening socket.
pub struct Listener {
    socket: TcpListener,
    slots: Arc<Semaphore>,
}

impl Listener {
    pub async fn bind(config: &ListenerConfig) -> Result<Self, ListenerError> {
        let bind_error = |source| ListenerError::Bind {
            address: config.bind_address.clone(),
            source,
        };

        let addr: SocketAddr = config
            .bind_address
            .parse()
            .map_err(|e| bind_error(std::io::Error::new(ErrorKind::InvalidInput, e)))?;
        let socket = TcpListener::bind(addr).await.map_err(bind_error)?;
        let local_addr = socket.local_addr().map_err(bind_error)?;

        tracing::info!(
            address = %local_addr,
            max_connections = config.max_connections,
            "Listener bound"
        );

        Ok(Self {
            socket,
            slots: Arc::new(Semaphore::new(config.max_connections)),
        })
    }

    /// Slots not currently held by an open connection.
    fn idle_slots(&self) -> usize {
        self.slots.available_permits()
    }
}

#[async_trait]
impl Acceptor for Listener {
    /// Wait for a free slot, then for a client.
    ///
    /// Cancel safe: dropping the future before it resolves loses no
    /// connection and leaks no slot.
    async fn accept(&self) -> Result<Accepted, ListenerError> {
        // The semaphore is never closed.
        let slot = Arc::clone(&self.slots).acquire_owned().await.map_err(|_| {
            ListenerError::Accept(std::io::Error::new(
                ErrorKind::NotConnected,
                "connection slots closed",
            ))
        })?;

        let (stream, peer) = self.socket.accept().await.map_err(ListenerError::Accept)?;
        tracing::debug!(peer = %peer, idle_slots = self.idle_slots(), "Connection accepted");

        Ok(Accepted { stream, peer, slot })
    }

    fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }
}
