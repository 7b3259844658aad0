//! Integration tests for the inbound half of the twin-core protocol.
//!
//! These tests push raw socket chunks through the public framer and parser
//! and then apply the results to a `TwinState`, the same pipeline the
//! operator session runs for every chunk read from the device.

use twin_core::{
    parse_line, DeviceMessage, FramingMode, LineFramer, MotorState, ProtocolError, TwinState,
};

/// Frames a chunk and parses every line, keeping errors in place.
fn classify(framer: &mut LineFramer, chunk: &str) -> Vec<Result<DeviceMessage, ProtocolError>> {
    framer.push(chunk).iter().map(|line| parse_line(line)).collect()
}

#[test]
fn test_sensor_chunk_yields_one_reading() {
    // Arrange
    let mut framer = LineFramer::new(FramingMode::PerRead);

    // Act
    let messages = classify(&mut framer, "SENSOR:{\"temperatura\":21.5,\"humedad\":60.0}\n");

    // Assert
    assert_eq!(messages.len(), 1);
    match &messages[0] {
        Ok(DeviceMessage::Sensor(reading)) => {
            assert_eq!(reading.temperature, 21.5);
            assert_eq!(reading.humidity, 60.0);
        }
        other => panic!("expected sensor reading, got {other:?}"),
    }
}

#[test]
fn test_coalesced_acks_are_classified_in_order() {
    let mut framer = LineFramer::new(FramingMode::PerRead);

    let messages = classify(&mut framer, "OK:START\nOK:VEL:5\n");

    assert_eq!(
        messages,
        vec![Ok(DeviceMessage::StartAck), Ok(DeviceMessage::SpeedAck(5))]
    );
}

#[test]
fn test_malformed_sensor_does_not_poison_following_lines() {
    let mut framer = LineFramer::new(FramingMode::PerRead);
    let mut state = TwinState::default();

    for result in classify(&mut framer, "SENSOR:{oops\nOK:START\n") {
        if let Ok(msg) = result {
            state.apply(&msg);
        }
    }

    assert_eq!(state.motor, MotorState::Running);
    assert_eq!(state.temperature_c, None);
}

#[test]
fn test_split_sensor_line_is_lost_in_per_read_mode() {
    // A sensor line straddling two reads cannot be parsed without reassembly.
    let mut framer = LineFramer::new(FramingMode::PerRead);

    let first = classify(&mut framer, "SENSOR:{\"temperatura\":21.5,");
    let second = classify(&mut framer, "\"humedad\":60.0}\n");

    assert!(matches!(first[0], Err(ProtocolError::MalformedSensor(_))));
    assert_eq!(second, vec![Ok(DeviceMessage::Unrecognized)]);
}

#[test]
fn test_split_sensor_line_is_recovered_in_buffered_mode() {
    let mut framer = LineFramer::new(FramingMode::Buffered);

    let first = classify(&mut framer, "SENSOR:{\"temperatura\":21.5,");
    let second = classify(&mut framer, "\"humedad\":60.0}\n");

    assert!(first.is_empty());
    assert_eq!(second.len(), 1);
    assert!(matches!(second[0], Ok(DeviceMessage::Sensor(_))));
}
