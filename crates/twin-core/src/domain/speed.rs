//! Step-delay speed setting.
//!
//! The motor speed is expressed as a delay between steps, in milliseconds.
//! A *lower* delay means a *faster* wheel, which is why [`SpeedSetting::faster`]
//! decrements the value.

use serde::{Deserialize, Serialize};

use crate::protocol::command::Command;

/// Shortest step delay the firmware accepts.
pub const MIN_STEP_DELAY_MS: u32 = 1;
/// Longest step delay the operator may request.
pub const MAX_STEP_DELAY_MS: u32 = 20;
/// Step delay assumed at startup.
pub const DEFAULT_STEP_DELAY_MS: u32 = 2;

/// The step delay most recently requested by the operator.
///
/// Always within `[MIN_STEP_DELAY_MS, MAX_STEP_DELAY_MS]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeedSetting {
    step_delay_ms: u32,
}

impl SpeedSetting {
    /// Creates a setting, clamping `step_delay_ms` into the accepted range.
    pub fn new(step_delay_ms: u32) -> Self {
        Self {
            step_delay_ms: step_delay_ms.clamp(MIN_STEP_DELAY_MS, MAX_STEP_DELAY_MS),
        }
    }

    pub fn step_delay_ms(&self) -> u32 {
        self.step_delay_ms
    }

    /// Shortens the step delay by one millisecond and returns the command
    /// that applies it.  Saturates at [`MIN_STEP_DELAY_MS`].
    pub fn faster(&mut self) -> Command {
        self.step_delay_ms = self.step_delay_ms.saturating_sub(1).max(MIN_STEP_DELAY_MS);
        self.command()
    }

    /// Lengthens the step delay by one millisecond and returns the command
    /// that applies it.  Saturates at [`MAX_STEP_DELAY_MS`].
    pub fn slower(&mut self) -> Command {
        self.step_delay_ms = (self.step_delay_ms + 1).min(MAX_STEP_DELAY_MS);
        self.command()
    }

    /// The `velocidad:<n>` command for the current value.
    pub fn command(&self) -> Command {
        Command::Speed(self.step_delay_ms)
    }
}

impl Default for SpeedSetting {
    fn default() -> Self {
        Self::new(DEFAULT_STEP_DELAY_MS)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
