//! The digital twin: what the operator currently believes about the device.
//!
//! `TwinState` is updated from two directions:
//!
//! - **Device messages** (`apply`) – acknowledgments, faults and telemetry.
//! - **Operator actions** (`mark_running`, `mark_stopped`, `set_step_delay`) –
//!   applied optimistically as soon as the command is issued, before the
//!   device acknowledges it.  The acknowledgment then confirms (or, for a
//!   fault, overrides) the optimistic value.
//!
//! The connection indicator (`link_up`) is sampled from the link
//! periodically rather than pushed, so it may lag the real socket state by
//! up to one poll interval.

use serde::{Deserialize, Serialize};

use crate::domain::speed::DEFAULT_STEP_DELAY_MS;
use crate::protocol::message::DeviceMessage;

/// Motor state as last reported or requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MotorState {
    /// Nothing known yet (no command issued, no acknowledgment seen).
    #[default]
    Unknown,
    /// The wheel is turning.
    Running,
    /// The wheel was stopped on request.
    Stopped,
    /// The device reported a fault and stopped on its own.
    Blocked,
}

/// Operator-side picture of the device.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TwinState {
    pub motor: MotorState,
    /// Last reported temperature in °C, if any telemetry has arrived.
    pub temperature_c: Option<f64>,
    /// Last reported relative humidity in %, if any telemetry has arrived.
    pub humidity_pct: Option<f64>,
    /// Displayed step delay in ms/step.
    pub step_delay_ms: u32,
    /// Whether the link was live at the last sample.
    pub link_up: bool,
}

impl Default for TwinState {
    fn default() -> Self {
        Self {
            motor: MotorState::Unknown,
            temperature_c: None,
            humidity_pct: None,
            step_delay_ms: DEFAULT_STEP_DELAY_MS,
            link_up: false,
        }
    }
}

impl TwinState {
    /// Applies a device message.  Returns `true` if anything changed.
    pub fn apply(&mut self, message: &DeviceMessage) -> bool {
        let before = self.clone();
        match message {
            DeviceMessage::Sensor(reading) => {
                self.temperature_c = Some(reading.temperature);
                self.humidity_pct = Some(reading.humidity);
            }
            DeviceMessage::Blocked => self.motor = MotorState::Blocked,
            DeviceMessage::StopAck => self.motor = MotorState::Stopped,
            DeviceMessage::StartAck => self.motor = MotorState::Running,
            DeviceMessage::SpeedAck(ms) => self.step_delay_ms = *ms,
            DeviceMessage::Empty | DeviceMessage::Unrecognized => {}
        }
        *self != before
    }

    pub fn mark_running(&mut self) {
        self.motor = MotorState::Running;
    }

    pub fn mark_stopped(&mut self) {
        self.motor = MotorState::Stopped;
    }

    pub fn set_step_delay(&mut self, step_delay_ms: u32) {
        self.step_delay_ms = step_delay_ms;
    }

    /// Records a sample of the link flag.  Returns `true` if it flipped.
    pub fn set_link_up(&mut self, up: bool) -> bool {
        let changed = self.link_up != up;
        self.link_up = up;
        changed
    }

    /// One-line human-readable summary, e.g.
    /// `link=up motor=Running temp=21.5°C humidity=60.0% speed=2 ms/step`.
    pub fn summary(&self) -> String {
        let link = if self.link_up { "up" } else { "down" };
        let temp = self
            .temperature_c
            .map(|t| format!("{t:.1}°C"))
            .unwrap_or_else(|| "---".to_string());
        let humidity = self
            .humidity_pct
            .map(|h| format!("{h:.1}%"))
            .unwrap_or_else(|| "---".to_string());
        format!(
            "link={link} motor={:?} temp={temp} humidity={humidity} speed={} ms/step",
            self.motor, self.step_delay_ms
        )
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
