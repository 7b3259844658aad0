//! The device link: connect-with-retry, reconnect-on-error, serialized
//! sends, and timeout-bounded receives over one TCP connection.
//!
//! # State machine
//!
//! ```text
//!              connect() / failure detected
//! Disconnected ───────────────────────────────> Connecting ──┐
//!      ^                                            │  ^      │ attempt failed:
//!      │ send/receive failure                       │  └──────┘ sleep(reconnect_delay)
//!      │ (only for the current generation)          │ attempt succeeded:
//!      └──────────────────── Connected <────────────┘ generation += 1
//! ```
//!
//! The state and the generation of the installed socket are published on a
//! `tokio::sync::watch` channel.  The operator display samples it; nothing
//! is pushed.
//!
//! # Locking discipline
//!
//! - `writer` – the send lock.  Held for one `write_all`, bounded by
//!   `write_timeout`, so two commands never interleave on the wire.
//! - `reader` – held for one timeout-bounded read.  Independent of `writer`,
//!   so a long poll never delays a command.
//! - `generation` – the reconnect lock.  Every handle replacement happens
//!   while holding it, from either path.
//!
//! No path holds `reader` or `writer` while waiting for `generation`, which
//! is what keeps the three locks deadlock-free.
//!
//! # Generations
//!
//! Each successful connection gets a new generation number, and each handle
//! remembers the generation it belongs to.  When the read path and the write
//! path both discover the same dead socket, both report the *same*
//! generation; whichever takes the reconnect lock second sees that the
//! generation already moved on and returns without opening another socket.

use std::borrow::Cow;
use std::io;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::{watch, Mutex};
use tokio::time;
use tracing::{debug, info, warn};

use twin_core::{encode_line, ProtocolError};

use super::config::LinkConfig;
use super::connector::Connector;
use crate::application::operator::DeviceLink;

/// Coarse connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// No usable socket and nobody is trying to open one.
    Disconnected,
    /// A connection attempt (or the backoff after a failed one) is running.
    Connecting,
    /// A socket is installed and believed usable.
    Connected,
}

/// State plus the generation of the socket it refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkStatus {
    pub state: LinkState,
    /// Incremented on every successful connection; `0` before the first one.
    pub generation: u64,
}

/// Why a command did not reach the socket.
#[derive(Debug, Error, PartialEq)]
pub enum LinkError {
    /// The command text cannot be sent as a single line.
    #[error("command refused: {0}")]
    InvalidCommand(#[from] ProtocolError),

    /// The link was not writable.  It has been re-established, but the
    /// command itself is gone and must be re-issued by the caller.
    #[error("command dropped with connection generation {generation}; link re-established")]
    Dropped { generation: u64 },
}

/// One raw read from the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedChunk {
    /// Bytes as read.  A multi-byte character may be cut at either end.
    pub bytes: Vec<u8>,
    /// Generation of the socket the bytes came from.
    pub generation: u64,
}

impl ReceivedChunk {
    /// Decoded text with invalid UTF-8 replaced, not trimmed.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }
}

struct Handle<T> {
    io: T,
    generation: u64,
}

/// Owns the single socket to the device.
///
/// Share it behind an `Arc`: every method takes `&self`.
pub struct LinkManager<C: Connector> {
    config: LinkConfig,
    endpoint: String,
    connector: C,
    status: watch::Sender<LinkStatus>,
    generation: Mutex<u64>,
    reader: Mutex<Option<Handle<C::Reader>>>,
    writer: Mutex<Option<Handle<C::Writer>>>,
}

impl<C: Connector> LinkManager<C> {
    /// Creates a disconnected link.  Nothing touches the network until
    /// [`connect`](Self::connect), [`send`](Self::send) or
    /// [`receive`](Self::receive) is called.
    pub fn new(config: LinkConfig, connector: C) -> Self {
        let endpoint = config.endpoint();
        let (status, _) = watch::channel(LinkStatus {
            state: LinkState::Disconnected,
            generation: 0,
        });
        Self {
            config,
            endpoint,
            connector,
            status,
            generation: Mutex::new(0),
            reader: Mutex::new(None),
            writer: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Samples the current state and generation.
    pub fn status(&self) -> LinkStatus {
        *self.status.borrow()
    }

    /// The live/not-live flag.
    pub fn is_connected(&self) -> bool {
        self.status().state == LinkState::Connected
    }

    /// A receiver that observes every published state change.
    pub fn subscribe(&self) -> watch::Receiver<LinkStatus> {
        self.status.subscribe()
    }

    /// Blocks until a connection exists.
    ///
    /// Retries forever with a fixed `reconnect_delay` between attempts.  A
    /// no-op when already connected.
    pub async fn connect(&self) {
        let mut generation = self.generation.lock().await;
        if self.is_connected() {
            debug!(generation = *generation, "connect requested but link is already up");
            return;
        }
        self.establish(&mut generation).await;
    }

    /// Sends one command line.
    ///
    /// The send lock is held for the whole write, so concurrent callers are
    /// serialized.  The write is bounded by `write_timeout`, so a device that
    /// stops reading cannot hold the lock forever.  On failure or expiry the
    /// link is marked not-live and re-established before this returns; the
    /// failing caller pays for the reconnect.
    ///
    /// # Errors
    ///
    /// [`LinkError::InvalidCommand`] if `message` contains a line break
    /// (nothing is written), [`LinkError::Dropped`] if the write could not be
    /// performed (the link is connected again when this is returned).
    pub async fn send(&self, message: &str) -> Result<(), LinkError> {
        let line = encode_line(message)?;

        let failed_generation = {
            let mut slot = self.writer.lock().await;
            match slot.as_mut() {
                None => None,
                Some(handle) => {
                    let generation = handle.generation;
                    let write = write_line(&mut handle.io, &line);
                    match time::timeout(self.config.write_timeout, write).await {
                        Ok(Ok(())) => {
                            debug!(command = message, generation, "sent command");
                            return Ok(());
                        }
                        Ok(Err(e)) => {
                            warn!(command = message, generation, error = %e, "write to device failed; reconnecting");
                        }
                        Err(_elapsed) => {
                            warn!(
                                command = message,
                                generation,
                                timeout = ?self.config.write_timeout,
                                "device stopped accepting data; reconnecting"
                            );
                        }
                    }
                    *slot = None;
                    Some(generation)
                }
            }
        };

        let generation = match failed_generation {
            Some(generation) => {
                self.recover(generation).await;
                generation
            }
            None => {
                warn!(command = message, "link is down; dropping command");
                let generation = self.status().generation;
                self.connect().await;
                generation
            }
        };
        Err(LinkError::Dropped { generation })
    }

    /// One read of at most `read_chunk_size` bytes, trimmed.
    ///
    /// Returns `None` when nothing arrived within `read_timeout` (the state
    /// is left untouched) and after recovering from a failed read.
    pub async fn receive(&self) -> Option<String> {
        let chunk = self.receive_chunk().await?;
        let text = chunk.text();
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }

    /// Like [`receive`](Self::receive) but returns the undecoded bytes
    /// together with the generation they were read from, for callers that
    /// frame lines themselves.
    pub async fn receive_chunk(&self) -> Option<ReceivedChunk> {
        let mut buf = vec![0u8; self.config.read_chunk_size.max(1)];

        let failed_generation = {
            let mut slot = self.reader.lock().await;
            match slot.as_mut() {
                None => None,
                Some(handle) => {
                    let generation = handle.generation;
                    match time::timeout(self.config.read_timeout, handle.io.read(&mut buf)).await {
                        Err(_elapsed) => return None,
                        Ok(Ok(n)) if n > 0 => {
                            return Some(ReceivedChunk {
                                bytes: buf[..n].to_vec(),
                                generation,
                            });
                        }
                        Ok(Ok(_)) => info!(generation, "device closed the connection"),
                        Ok(Err(e)) => warn!(generation, error = %e, "read from device failed"),
                    }
                    *slot = None;
                    Some(generation)
                }
            }
        };

        match failed_generation {
            Some(generation) => self.recover(generation).await,
            None => self.connect().await,
        }
        None
    }

    /// Drops the socket and publishes `Disconnected`.
    ///
    /// Meant for shutdown: a later `send` or `receive` reconnects.
    pub async fn close(&self) {
        let generation = self.generation.lock().await;
        self.reader.lock().await.take();
        self.writer.lock().await.take();
        self.publish(LinkState::Disconnected, *generation);
        info!(endpoint = %self.endpoint, "link closed");
    }

    /// Handles a failure observed on a socket of `failed_generation`.
    async fn recover(&self, failed_generation: u64) {
        self.mark_lost(failed_generation);

        let mut generation = self.generation.lock().await;
        if *generation != failed_generation && self.is_connected() {
            debug!(failed_generation, current = *generation, "link already re-established");
            return;
        }
        self.establish(&mut generation).await;
    }

    /// Flips `Connected` to `Disconnected`, unless a newer connection has
    /// been published in the meantime.
    fn mark_lost(&self, failed_generation: u64) {
        self.status.send_if_modified(|status| {
            if status.generation == failed_generation && status.state == LinkState::Connected {
                status.state = LinkState::Disconnected;
                true
            } else {
                false
            }
        });
    }

    /// Connection loop.  Caller must hold the reconnect lock.
    async fn establish(&self, generation: &mut u64) {
        // At most one socket at a time: drop what is left of the old one first.
        self.reader.lock().await.take();
        self.writer.lock().await.take();

        let mut attempt: u64 = 0;
        loop {
            attempt += 1;
            self.publish(LinkState::Connecting, *generation);
            info!(endpoint = %self.endpoint, attempt, "connecting to device");

            match self.connector.connect(&self.endpoint).await {
                Ok((reader, writer)) => {
                    *generation += 1;
                    let current = *generation;
                    *self.reader.lock().await = Some(Handle {
                        io: reader,
                        generation: current,
                    });
                    *self.writer.lock().await = Some(Handle {
                        io: writer,
                        generation: current,
                    });
                    self.publish(LinkState::Connected, current);
                    info!(endpoint = %self.endpoint, generation = current, attempt, "connected to device");
                    return;
                }
                Err(e) => {
                    warn!(
                        endpoint = %self.endpoint,
                        attempt,
                        error = %e,
                        "connection attempt failed; retrying in {:?}",
                        self.config.reconnect_delay
                    );
                    time::sleep(self.config.reconnect_delay).await;
                }
            }
        }
    }

    fn publish(&self, state: LinkState, generation: u64) {
        let previous = self.status.send_replace(LinkStatus { state, generation });
        if previous.state != state {
            debug!(from = ?previous.state, to = ?state, generation, "link state changed");
        }
    }
}

async fn write_line<W: AsyncWrite + Unpin>(writer: &mut W, line: &str) -> io::Result<()> {
    writer.write_all(line.as_bytes()).await?;
    writer.flush().await
}

#[async_trait]
impl<C: Connector> DeviceLink for LinkManager<C> {
    async fn send_line(&self, command: &str) -> bool {
        self.send(command).await.is_ok()
    }

    fn is_live(&self) -> bool {
        self.is_connected()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
