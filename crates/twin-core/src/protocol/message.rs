//! Inbound device message classification.
//!
//! The device speaks a loose, human-readable vocabulary.  Apart from the
//! `SENSOR:` prefix, recognition is by substring, and the checks run in a
//! fixed order so that a line matching several patterns is classified the
//! same way every time:
//!
//! | Order | Pattern              | Result                                |
//! |-------|----------------------|---------------------------------------|
//! | 1     | starts with `SENSOR:`| [`DeviceMessage::Sensor`] (JSON body) |
//! | 2     | contains `BLOQUEADO` | [`DeviceMessage::Blocked`]            |
//! | 3     | contains `OK:STOP`   | [`DeviceMessage::StopAck`]            |
//! | 4     | contains `OK:START`  | [`DeviceMessage::StartAck`]           |
//! | 5     | contains `OK:VEL`    | [`DeviceMessage::SpeedAck`]           |
//! | –     | anything else        | [`DeviceMessage::Unrecognized`]       |

use serde::{Deserialize, Serialize};

use crate::protocol::error::ProtocolError;

/// Prefix of telemetry lines carrying a JSON object.
pub const SENSOR_PREFIX: &str = "SENSOR:";

const BLOCKED_MARKER: &str = "BLOQUEADO";
const STOP_ACK_MARKER: &str = "OK:STOP";
const START_ACK_MARKER: &str = "OK:START";
const SPEED_ACK_MARKER: &str = "OK:VEL";

/// One telemetry sample reported by the device.
///
/// The firmware uses Spanish field names on the wire; they are renamed here.
/// Extra fields in the JSON object are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    /// Ambient temperature in degrees Celsius.
    #[serde(rename = "temperatura")]
    pub temperature: f64,
    /// Relative humidity in percent.
    #[serde(rename = "humedad")]
    pub humidity: f64,
}

/// A classified inbound line.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceMessage {
    /// The line was blank after trimming.
    Empty,
    /// Telemetry sample.
    Sensor(SensorReading),
    /// The device reports a fault or lock condition and has stopped.
    Blocked,
    /// Acknowledgment of `stop`.
    StopAck,
    /// Acknowledgment of `start`.
    StartAck,
    /// Acknowledgment of `velocidad:<n>` carrying the applied step delay.
    SpeedAck(u32),
    /// Any other line; ignored by consumers.
    Unrecognized,
}

/// Classifies a single protocol line.
///
/// Surrounding whitespace is trimmed first.
///
/// # Errors
///
/// Returns [`ProtocolError::MalformedSensor`] when a `SENSOR:` payload is not
/// a JSON object with numeric `temperatura` and `humedad`, and
/// [`ProtocolError::MalformedSpeed`] when the last colon-separated field of an
/// `OK:VEL` line is not an unsigned integer.  Callers log and drop such lines.
///
/// # Examples
///
/// ```rust
/// use twin_core::protocol::{parse_line, DeviceMessage};
///
/// let msg = parse_line(r#"SENSOR:{"temperatura":21.5,"humedad":60.0}"#).unwrap();
/// match msg {
///     DeviceMessage::Sensor(reading) => assert_eq!(reading.temperature, 21.5),
///     other => panic!("unexpected {other:?}"),
/// }
/// assert_eq!(parse_line("OK:VEL:5").unwrap(), DeviceMessage::SpeedAck(5));
/// ```
pub fn parse_line(line: &str) -> Result<DeviceMessage, ProtocolError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(DeviceMessage::Empty);
    }

    if let Some(payload) = line.strip_prefix(SENSOR_PREFIX) {
        let reading: SensorReading = serde_json::from_str(payload.trim())
            .map_err(|e| ProtocolError::MalformedSensor(e.to_string()))?;
        return Ok(DeviceMessage::Sensor(reading));
    }

    if line.contains(BLOCKED_MARKER) {
        Ok(DeviceMessage::Blocked)
    } else if line.contains(STOP_ACK_MARKER) {
        Ok(DeviceMessage::StopAck)
    } else if line.contains(START_ACK_MARKER) {
        Ok(DeviceMessage::StartAck)
    } else if line.contains(SPEED_ACK_MARKER) {
        parse_speed_ack(line)
    } else {
        Ok(DeviceMessage::Unrecognized)
    }
}

/// The value is whatever follows the last colon, e.g. `OK:VEL:5`.
fn parse_speed_ack(line: &str) -> Result<DeviceMessage, ProtocolError> {
    let value = line.rsplit(':').next().unwrap_or(line).trim();
    value
        .parse::<u32>()
        .map(DeviceMessage::SpeedAck)
        .map_err(|_| ProtocolError::MalformedSpeed(line.to_string()))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
