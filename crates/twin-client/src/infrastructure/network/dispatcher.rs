//! Receive loop: turns raw socket chunks into protocol lines and hands them
//! to the single consumer context.
//!
//! # How lines flow
//!
//! ```text
//! LinkManager::receive_chunk()  ──>  LineFramer::push()  ──>  mpsc::Sender<String>
//!         (dispatcher task)             (dispatcher task)            │
//!                                                                    v
//!                                          consumer task: handler(line), in order
//! ```
//!
//! The dispatcher task never touches operator state.  It only pulls from the
//! link and pushes lines into a bounded channel; the consumer owns the
//! receiver and calls its handler sequentially, so read order is delivery
//! order.  A full channel applies backpressure to the receive loop instead
//! of dropping lines.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use twin_core::LineFramer;

use super::connector::Connector;
use super::link::LinkManager;

/// Pulls from a [`LinkManager`] and forwards complete lines.
pub struct Dispatcher<C: Connector> {
    link: Arc<LinkManager<C>>,
    framer: LineFramer,
    capacity: usize,
}

impl<C: Connector> Dispatcher<C> {
    /// Takes framing mode and channel capacity from the link's configuration.
    pub fn new(link: Arc<LinkManager<C>>) -> Self {
        let framer = LineFramer::new(link.config().framing);
        let capacity = link.config().dispatch_capacity.max(1);
        Self {
            link,
            framer,
            capacity,
        }
    }

    /// Spawns the receive loop and returns the consumer end of the channel.
    ///
    /// The loop exits when `running` is cleared or when the returned receiver
    /// is dropped.  It never exits on I/O errors; those are the link's
    /// business.
    pub fn start(self, running: Arc<AtomicBool>) -> (mpsc::Receiver<String>, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(self.capacity);
        let handle = tokio::spawn(self.run(tx, running));
        (rx, handle)
    }

    async fn run(mut self, tx: mpsc::Sender<String>, running: Arc<AtomicBool>) {
        info!(framing = ?self.framer.mode(), "receive loop started");
        let mut last_generation: Option<u64> = None;

        while running.load(Ordering::Relaxed) {
            let Some(chunk) = self.link.receive_chunk().await else {
                continue;
            };

            if last_generation.is_some_and(|g| g != chunk.generation) {
                if !self.framer.pending().is_empty() {
                    debug!(
                        discarded = self.framer.pending(),
                        "dropping partial line from the previous connection"
                    );
                }
                self.framer.reset();
            }
            last_generation = Some(chunk.generation);

            for line in self.framer.push_bytes(&chunk.bytes) {
                debug!(%line, generation = chunk.generation, "inbound line");
                if tx.send(line).await.is_err() {
                    info!("line consumer went away; receive loop exiting");
                    return;
                }
            }
        }
        info!("receive loop stopped");
    }
}

/// Drains `lines` on the calling task, invoking `handler` once per line in
/// arrival order.  Returns when the dispatcher side is gone.
pub async fn deliver_lines<F>(mut lines: mpsc::Receiver<String>, mut handler: F)
where
    F: FnMut(String),
{
    while let Some(line) = lines.recv().await {
        handler(line);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
