//! Network infrastructure: the device link and the receive loop.
//!
//! Architecture:
//! - [`LinkManager`] owns the TCP socket.  It connects with unlimited retry,
//!   serializes sends, bounds every read by a timeout, and reconnects
//!   whenever either path sees the socket fail.
//! - [`Dispatcher`] runs on its own task, pulls chunks from the link, frames
//!   them into lines and forwards the lines over a bounded `mpsc` channel to
//!   the single consumer.
//! - [`Connector`] is the seam between the two and real sockets;
//!   [`TcpConnector`] is the production implementation.
//!
//! # Reconnection (for beginners)
//!
//! There is no background "keepalive" task.  A reconnect only happens when
//! an operation fails: a `send` whose write errors, or a `receive` whose read
//! errors or sees the device hang up.  The failing caller performs the
//! reconnect itself, and anyone else who notices the same dead socket waits
//! for it instead of opening a second one.

pub mod config;
pub mod connector;
pub mod dispatcher;
pub mod link;

#[cfg(test)]
pub mod mock;

pub use config::LinkConfig;
pub use connector::{Connector, TcpConnector};
pub use dispatcher::{deliver_lines, Dispatcher};
pub use link::{LinkError, LinkManager, LinkState, LinkStatus, ReceivedChunk};
