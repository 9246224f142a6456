//! Test utilities for building records and messages
//!
//! This module provides fixtures that can be used across unit tests,
//! integration tests and benchmarks.

use ctxbridge_senml::Pack;
use serde_json::Value;
use time::OffsetDateTime;
use time::macros::datetime;

use crate::message::{InboundMessage, Location, MeasurementRecord, MessageKind, ThingRecord};

/// Fixed record timestamp used by fixtures (epoch 1714557600)
pub const RECORD_TIME: OffsetDateTime = datetime!(2024-05-01 10:00 UTC);

/// Create a measurement record for `sensor` carrying `pack`
pub fn measurement(sensor: &str, pack: Pack) -> MeasurementRecord {
    MeasurementRecord {
        sensor: sensor.to_string(),
        tenant: "default".to_string(),
        timestamp: RECORD_TIME,
        location: None,
        pack,
    }
}

/// Create a measurement record with a location
pub fn measurement_at(sensor: &str, pack: Pack, latitude: f64, longitude: f64) -> MeasurementRecord {
    MeasurementRecord {
        location: Some(Location {
            latitude,
            longitude,
        }),
        ..measurement(sensor, pack)
    }
}

/// Create a thing record from the JSON of the inner thing
///
/// Panics if `thing` is not a valid thing object.
pub fn thing(thing: Value) -> ThingRecord {
    let kind = thing
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let id = thing
        .get("id")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    ThingRecord {
        id,
        kind,
        thing: serde_json::from_value(thing).expect("valid thing fixture"),
        tenant: "default".to_string(),
        timestamp: RECORD_TIME,
    }
}

/// Wrap a measurement record into a JSON message
pub fn measurement_message(record: &MeasurementRecord) -> InboundMessage {
    InboundMessage::json(
        MessageKind::Measurement,
        serde_json::to_vec(record).expect("serializable record"),
    )
}

/// Wrap a thing record into a JSON message
pub fn thing_message(record: &ThingRecord) -> InboundMessage {
    InboundMessage::json(
        MessageKind::Thing,
        serde_json::to_vec(record).expect("serializable record"),
    )
}
