//! Infrastructure layer for the wheel twin.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `twin_core`, but MUST NOT be imported by the `application` layer.
//!
//! # Sub-modules
//!
//! - **`network`** – The TCP link to the device (connect, retry, reconnect,
//!   serialized sends, timeout-bounded reads) and the dispatcher that turns
//!   raw reads into lines for the consumer.
//!
//! - **`storage`** – TOML configuration file: schema, defaults, load/save.
//!
//! - **`ui_bridge`** – Operator console commands and serializable status
//!   snapshots.

pub mod network;
pub mod storage;
pub mod ui_bridge;
