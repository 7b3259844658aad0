//! Outbound command vocabulary and line encoding.
//!
//! Wire format:
//! ```text
//! start\n
//! stop\n
//! velocidad:<step delay in ms>\n
//! ```
//!
//! The vocabulary is open: [`encode_line`] accepts any text that does not
//! contain a line break, so callers can send commands this enum does not
//! know about yet.

use std::fmt;

use crate::protocol::error::ProtocolError;

/// The single byte that terminates every protocol line.
pub const LINE_DELIMITER: char = '\n';

/// A command understood by the device firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Start turning the wheel.
    Start,
    /// Stop the wheel.
    Stop,
    /// Set the motor step delay in milliseconds per step (lower is faster).
    Speed(u32),
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Start => f.write_str("start"),
            Command::Stop => f.write_str("stop"),
            Command::Speed(ms) => write!(f, "velocidad:{ms}"),
        }
    }
}

/// Appends the line delimiter to `message`, refusing text with embedded
/// line breaks.
///
/// # Errors
///
/// Returns [`ProtocolError::EmbeddedLineBreak`] if `message` contains `\n`
/// or `\r`.
///
/// # Examples
///
/// ```rust
/// use twin_core::protocol::{encode_line, Command};
///
/// assert_eq!(encode_line("stop").unwrap(), "stop\n");
/// assert_eq!(encode_line(&Command::Speed(4).to_string()).unwrap(), "velocidad:4\n");
/// assert!(encode_line("start\nstop").is_err());
/// ```
pub fn encode_line(message: &str) -> Result<String, ProtocolError> {
    if message.contains(|c| c == '\n' || c == '\r') {
        return Err(ProtocolError::EmbeddedLineBreak(message.to_string()));
    }
    let mut line = String::with_capacity(message.len() + 1);
    line.push_str(message);
    line.push(LINE_DELIMITER);
    Ok(line)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_display_matches_firmware_vocabulary() {
        assert_eq!(Command::Start.to_string(), "start");
        assert_eq!(Command::Stop.to_string(), "stop");
        assert_eq!(Command::Speed(12).to_string(), "velocidad:12");
    }

    #[test]
    fn test_encode_line_appends_single_delimiter() {
        // Arrange / Act
        let line = encode_line("start").unwrap();

        // Assert
        assert_eq!(line, "start\n");
        assert_eq!(line.matches(LINE_DELIMITER).count(), 1);
    }

    #[test]
    fn test_encode_line_rejects_embedded_line_feed() {
        let result = encode_line("start\nstop");
        assert_eq!(
            result,
            Err(ProtocolError::EmbeddedLineBreak("start\nstop".to_string()))
        );
    }

    #[test]
    fn test_encode_line_rejects_embedded_carriage_return() {
        assert!(encode_line("stop\r").is_err());
    }

    #[test]
    fn test_encode_line_accepts_unknown_commands() {
        // The vocabulary is extensible; unknown verbs pass through untouched.
        assert_eq!(encode_line("luz:on").unwrap(), "luz:on\n");
    }

    #[test]
    fn test_encode_line_accepts_empty_message() {
        assert_eq!(encode_line("").unwrap(), "\n");
    }
}
