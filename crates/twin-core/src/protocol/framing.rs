//! Splitting raw socket chunks into protocol lines.
//!
//! # Why framing is needed
//!
//! TCP is a *stream* protocol.  A single `read()` may return several lines
//! coalesced together (`"OK:START\nOK:VEL:5\n"`), or only part of a line if
//! the device's write straddled two TCP segments.
//!
//! Two behaviours are offered:
//!
//! - [`FramingMode::PerRead`] (default) – every chunk is split on its own.
//!   A line that arrives across two reads is delivered as two fragments,
//!   each of which will most likely be classified as unrecognized or
//!   malformed.  This mirrors what deployed operators have always done.
//!
//! - [`FramingMode::Buffered`] – an incomplete trailing fragment is kept and
//!   prefixed to the next chunk, so split lines are reassembled.  The pending
//!   fragment must be discarded with [`LineFramer::reset`] whenever the
//!   underlying connection is replaced.
//!
//! Raw socket bytes go through [`LineFramer::push_bytes`].  In buffered mode
//! a multi-byte character cut by the read boundary is held back until its
//! remaining bytes arrive, so it decodes intact.

use serde::{Deserialize, Serialize};

use crate::protocol::command::LINE_DELIMITER;

/// Upper bound on a buffered partial line.  A device that never sends a
/// delimiter would otherwise grow the buffer without limit.
pub const MAX_PENDING_BYTES: usize = 4096;

/// How chunk boundaries are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FramingMode {
    /// Split each chunk independently; no state carried between reads.
    #[default]
    PerRead,
    /// Carry an incomplete trailing line over to the next chunk.
    Buffered,
}

impl std::str::FromStr for FramingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "per_read" | "per-read" => Ok(FramingMode::PerRead),
            "buffered" => Ok(FramingMode::Buffered),
            other => Err(format!("unknown framing mode {other:?} (expected per_read or buffered)")),
        }
    }
}

/// Splits `chunk` on the delimiter, trims each piece, and skips blank ones.
///
/// Relative order is preserved.
pub fn split_lines(chunk: &str) -> impl Iterator<Item = &str> {
    chunk
        .split(LINE_DELIMITER)
        .map(str::trim)
        .filter(|line| !line.is_empty())
}

/// Stateful line splitter used by the receive loop.
#[derive(Debug, Default)]
pub struct LineFramer {
    mode: FramingMode,
    pending: String,
    /// Leading bytes of a UTF-8 sequence cut off at the end of the last chunk.
    partial: Vec<u8>,
}

impl LineFramer {
    /// Creates a framer with the given mode and an empty buffer.
    pub fn new(mode: FramingMode) -> Self {
        Self {
            mode,
            pending: String::new(),
            partial: Vec::new(),
        }
    }

    pub fn mode(&self) -> FramingMode {
        self.mode
    }

    /// The incomplete fragment carried over from previous chunks.
    ///
    /// Always empty in [`FramingMode::PerRead`].
    pub fn pending(&self) -> &str {
        &self.pending
    }

    /// Feeds one raw chunk and returns the complete lines it yields, in order.
    pub fn push(&mut self, chunk: &str) -> Vec<String> {
        match self.mode {
            FramingMode::PerRead => split_lines(chunk).map(str::to_owned).collect(),
            FramingMode::Buffered => self.push_buffered(chunk),
        }
    }

    /// Feeds one chunk of undecoded socket bytes.
    ///
    /// Invalid UTF-8 is replaced with U+FFFD.  In [`FramingMode::Buffered`]
    /// an incomplete character at the end of `bytes` is kept back and
    /// completed by the next chunk instead.
    pub fn push_bytes(&mut self, bytes: &[u8]) -> Vec<String> {
        match self.mode {
            FramingMode::PerRead => self.push(&String::from_utf8_lossy(bytes)),
            FramingMode::Buffered => {
                let mut joined = std::mem::take(&mut self.partial);
                joined.extend_from_slice(bytes);
                if let Some(start) = incomplete_tail_start(&joined) {
                    self.partial = joined.split_off(start);
                }
                self.push_buffered(&String::from_utf8_lossy(&joined))
            }
        }
    }

    /// Drops any partial line.  Call when the connection is replaced.
    pub fn reset(&mut self) {
        self.pending.clear();
        self.partial.clear();
    }

    fn push_buffered(&mut self, chunk: &str) -> Vec<String> {
        self.pending.push_str(chunk);

        let Some(last_delimiter) = self.pending.rfind(LINE_DELIMITER) else {
            if self.pending.len() > MAX_PENDING_BYTES {
                self.pending.clear();
            }
            return Vec::new();
        };

        // Everything up to and including the last delimiter is complete.
        let tail = self.pending.split_off(last_delimiter + LINE_DELIMITER.len_utf8());
        let complete = std::mem::replace(&mut self.pending, tail);
        split_lines(&complete).map(str::to_owned).collect()
    }
}

/// Index where a truncated UTF-8 sequence starts at the end of `bytes`, if
/// the buffer ends part-way through one.
fn incomplete_tail_start(bytes: &[u8]) -> Option<usize> {
    let lead = bytes
        .iter()
        .enumerate()
        .rev()
        .take(3)
        .find(|(_, b)| **b & 0b1100_0000 != 0b1000_0000)?
        .0;
    let needed = match bytes[lead] {
        b if b & 0b1110_0000 == 0b1100_0000 => 2,
        b if b & 0b1111_0000 == 0b1110_0000 => 3,
        b if b & 0b1111_1000 == 0b1111_0000 => 4,
        _ => return None,
    };
    (bytes.len() - lead < needed).then_some(lead)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
