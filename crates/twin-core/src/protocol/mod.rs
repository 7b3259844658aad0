//! Protocol module containing the command encoder, the inbound message
//! parser, and the line framer.

pub mod command;
pub mod error;
pub mod framing;
pub mod message;

pub use command::{encode_line, Command, LINE_DELIMITER};
pub use error::ProtocolError;
pub use framing::{split_lines, FramingMode, LineFramer};
pub use message::{parse_line, DeviceMessage, SensorReading};
