//! TCP listener with transport tuning and backpressure.
//!
//! # Responsibilities
//! - Bind to the profile's address
//! - Apply the `server` transport options verbatim (backlog, reuse-port,
//!   nodelay)
//! - Enforce the max_connections limit via semaphore

use std::net::SocketAddr;
use std::sync::Arc;

use socket2::{Domain, Socket, Type};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;

use crate::config::schema::{ServerProfile, TransportOptions};

/// Error type for listener operations.
#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    #[error("invalid bind address {0}: {1}")]
    Address(String, std::net::AddrParseError),
    #[error("failed to bind {0}: {1}")]
    Bind(String, std::io::Error),
    #[error("failed to accept: {0}")]
    Accept(std::io::Error),
}

/// Handle to the bound listener, kept by the prototype instance so the
/// application knows which server it is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerHandle {
    local_addr: SocketAddr,
}

impl ServerHandle {
    pub fn new(local_addr: SocketAddr) -> Self {
        Self { local_addr }
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

/// A bounded TCP listener that limits concurrent connections.
///
/// Uses a semaphore to enforce `maxConnections`. When the limit is reached,
/// new connections wait until a slot becomes available.
pub struct Listener {
    inner: TcpListener,
    options: TransportOptions,
    connection_limit: Arc<Semaphore>,
}

impl Listener {
    /// Bind to the profile's address, applying its transport options.
    pub fn bind(profile: &ServerProfile) -> Result<Self, ListenerError> {
        let address = profile.bind_address();
        let addr: SocketAddr = address
            .parse()
            .map_err(|e| ListenerError::Address(address.clone(), e))?;
        let options = profile.server.clone();

        let socket = Socket::new(Domain::for_address(addr), Type::STREAM, None)
            .map_err(|e| ListenerError::Bind(address.clone(), e))?;
        socket
            .set_reuse_address(true)
            .map_err(|e| ListenerError::Bind(address.clone(), e))?;
        if options.reuse_port {
            #[cfg(unix)]
            socket
                .set_reuse_port(true)
                .map_err(|e| ListenerError::Bind(address.clone(), e))?;
        }
        socket
            .bind(&addr.into())
            .map_err(|e| ListenerError::Bind(address.clone(), e))?;
        socket
            .listen(options.backlog.unwrap_or(1024))
            .map_err(|e| ListenerError::Bind(address.clone(), e))?;
        socket
            .set_nonblocking(true)
            .map_err(|e| ListenerError::Bind(address.clone(), e))?;

        let std_listener: std::net::TcpListener = socket.into();
        let inner = TcpListener::from_std(std_listener)
            .map_err(|e| ListenerError::Bind(address.clone(), e))?;

        let local_addr = inner
            .local_addr()
            .map_err(|e| ListenerError::Bind(address, e))?;

        tracing::info!(
            address = %local_addr,
            max_connections = options.max_connections,
            reuse_port = options.reuse_port,
            "Listener bound"
        );

        Ok(Self {
            connection_limit: Arc::new(Semaphore::new(options.max_connections)),
            options,
            inner,
        })
    }

    /// Accept a new connection, respecting the connection limit.
    ///
    /// Returns the stream and a permit that must be held for the
    /// connection's lifetime.
    pub async fn accept(
        &self,
    ) -> Result<(TcpStream, SocketAddr, ConnectionPermit), ListenerError> {
        // Acquire the permit first so a full worker stops accepting.
        let permit = self
            .connection_limit
            .clone()
            .acquire_owned()
            .await
            .expect("Semaphore closed unexpectedly");

        let (stream, addr) = self.inner.accept().await.map_err(ListenerError::Accept)?;
        if self.options.nodelay {
            let _ = stream.set_nodelay(true);
        }

        tracing::debug!(
            peer_addr = %addr,
            available_permits = self.connection_limit.available_permits(),
            "Connection accepted"
        );

        Ok((stream, addr, ConnectionPermit { _permit: permit }))
    }

    pub fn local_addr(&self) -> Result<SocketAddr, std::io::Error> {
        self.inner.local_addr()
    }

    pub fn handle(&self) -> Result<ServerHandle, std::io::Error> {
        Ok(ServerHandle::new(self.local_addr()?))
    }
}

/// A permit representing a connection slot.
///
/// When dropped, the slot is released back to the pool, so backpressure
/// holds even if the connection task dies early.
#[derive(Debug)]
pub struct ConnectionPermit {
    _permit: tokio::sync::OwnedSemaphorePermit,
}
