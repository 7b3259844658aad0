//! Domain module containing the operator-side model of the device.
//!
//! Nothing here performs I/O.  The state model is mutated by exactly one
//! owner (the operator session in `twin-client`), which is what lets it do
//! without locks.

pub mod speed;
pub mod twin;

pub use speed::SpeedSetting;
pub use twin::{MotorState, TwinState};
