//! Application layer use cases for the wheel twin.
//!
//! - **`operator`** – The consumer-side session.  Applies inbound device
//!   lines to the twin state, turns operator actions into commands, and
//!   samples the link flag.  The link is reached only through the
//!   [`DeviceLink`](operator::DeviceLink) trait, so this layer never touches
//!   sockets.

pub mod operator;
