//! Recording device link for unit tests.
//!
//! `RecordingLink` implements [`DeviceLink`] without a socket.  Every
//! command that would have been written is pushed into a `Mutex<Vec<String>>`
//! so tests can assert exactly what was sent and in what order.
//!
//! Flip the live flag with [`RecordingLink::set_live`] to simulate a link
//! that is down: sends then return `false` and record nothing, the same
//! outcome a caller of the real link sees when its command is dropped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use twin_core::encode_line;

use crate::application::operator::DeviceLink;

pub struct RecordingLink {
    sent: Mutex<Vec<String>>,
    live: AtomicBool,
}

impl RecordingLink {
    /// A live link with nothing recorded.
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            live: AtomicBool::new(true),
        }
    }

    pub fn set_live(&self, live: bool) {
        self.live.store(live, Ordering::SeqCst);
    }

    /// Commands accepted so far, without delimiters.
    pub fn sent(&self) -> Vec<String> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }
}

impl Default for RecordingLink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DeviceLink for RecordingLink {
    async fn send_line(&self, command: &str) -> bool {
        if !self.is_live() || encode_line(command).is_err() {
            return false;
        }
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(command.to_string());
        }
        true
    }

    fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }
}
