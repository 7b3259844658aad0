//! twin-client library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does twin-client do? (for beginners)
//!
//! The *device* is an embedded controller driving a stepper-motor wheel.
//! It listens on a TCP port and speaks a line protocol: the operator sends
//! `start`, `stop` and `velocidad:<n>`; the device answers with
//! acknowledgments, fault notices and periodic sensor readings.
//!
//! The client:
//!
//! 1. Connects to the device, retrying every few seconds until it answers.
//! 2. Runs a background task that reads from the socket, splits the bytes
//!    into lines and hands them to a single consumer in order.
//! 3. Applies each line to a local picture of the device (motor state,
//!    temperature, humidity, speed).
//! 4. Sends operator commands at any time.  A write failure reconnects the
//!    link; the failed command is reported, not retried.
//! 5. Samples the link's live/not-live flag once per second for display.

/// Application layer: use cases for the twin.
pub mod application;

/// Infrastructure layer: network link, config storage, and console bridge.
pub mod infrastructure;
