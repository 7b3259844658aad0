//! The seam between the link state machine and real sockets.
//!
//! [`LinkManager`](super::LinkManager) never calls `TcpStream::connect`
//! directly.  It asks a [`Connector`] for a fresh pair of read/write halves,
//! which lets tests script refused connections, broken pipes and silent
//! peers without touching the network.

use std::io;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

/// Type-erased read half, handy for connectors that hand out mixed stream
/// types (in-memory pipes, scripted mocks).
pub type BoxedReader = Box<dyn AsyncRead + Unpin + Send>;
/// Type-erased write half.
pub type BoxedWriter = Box<dyn AsyncWrite + Unpin + Send>;

/// Opens a new connection to the device and returns its two halves.
///
/// The halves are owned separately so the read path and the write path never
/// contend for the same lock.
#[cfg_attr(test, mockall::automock(type Reader = BoxedReader; type Writer = BoxedWriter;))]
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    type Reader: AsyncRead + Unpin + Send + 'static;
    type Writer: AsyncWrite + Unpin + Send + 'static;

    /// Performs one connection attempt.  Retrying is the caller's job.
    async fn connect(&self, endpoint: &str) -> io::Result<(Self::Reader, Self::Writer)>;
}

/// Plain TCP: no TLS, no authentication.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector;

#[async_trait]
impl Connector for TcpConnector {
    type Reader = OwnedReadHalf;
    type Writer = OwnedWriteHalf;

    async fn connect(&self, endpoint: &str) -> io::Result<(OwnedReadHalf, OwnedWriteHalf)> {
        let stream = TcpStream::connect(endpoint).await?;
        // Commands are tiny and latency-sensitive; don't let Nagle hold them.
        stream.set_nodelay(true)?;
        Ok(stream.into_split())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
