//! Error type shared by the protocol encoder and parser.

use thiserror::Error;

/// Errors that can occur while encoding a command or parsing a device line.
///
/// None of these are fatal to the link: an outbound error means the command
/// is refused before it reaches the socket, an inbound error means a single
/// line is logged and dropped.
#[derive(Debug, Error, PartialEq)]
pub enum ProtocolError {
    /// The command text contains a line break, which would split it into
    /// several protocol lines on the wire.
    #[error("command contains an embedded line break: {0:?}")]
    EmbeddedLineBreak(String),

    /// A `SENSOR:` line whose payload is not a JSON object with numeric
    /// `temperatura` and `humedad` fields.
    #[error("malformed sensor payload: {0}")]
    MalformedSensor(String),

    /// An `OK:VEL` acknowledgment whose trailing field is not an integer.
    #[error("malformed speed acknowledgment: {0:?}")]
    MalformedSpeed(String),
}
