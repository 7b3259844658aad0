//! # twin-core
//!
//! Shared library for the wheel digital twin containing the line protocol,
//! the command vocabulary, and the device state model.
//!
//! This crate has zero dependencies on sockets, async runtimes, or UI
//! frameworks.  Everything here is plain data and pure functions, so it can
//! be tested exhaustively without a device on the network.
//!
//! # Architecture overview (for beginners)
//!
//! The twin talks to an embedded controller (the "device") that drives a
//! stepper motor and reports sensor readings.  The two sides exchange plain
//! text, one message per line, separated by a single line feed (`\n`):
//!
//! ```text
//! operator  ── "start\n", "velocidad:5\n" ──>  device
//! operator  <── "OK:START\n", "SENSOR:{...}\n"  device
//! ```
//!
//! This crate defines:
//!
//! - **`protocol`** – How lines travel over the wire.  Outbound commands are
//!   rendered and delimited, inbound lines are classified into typed
//!   [`DeviceMessage`]s, and raw socket chunks are split into lines.
//!
//! - **`domain`** – The operator-side picture of the device: the motor state,
//!   the latest sensor readings, and the step-delay speed setting.

pub mod domain;
pub mod protocol;

pub use domain::speed::SpeedSetting;
pub use domain::twin::{MotorState, TwinState};
pub use protocol::command::{encode_line, Command, LINE_DELIMITER};
pub use protocol::error::ProtocolError;
pub use protocol::framing::{split_lines, FramingMode, LineFramer};
pub use protocol::message::{parse_line, DeviceMessage, SensorReading};
