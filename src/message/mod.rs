//! Inbound records and their decoding
//!
//! Two record shapes arrive from the message bus: measurement records carrying
//! a SenML pack, and thing records carrying the state of a managed asset. The
//! topic decides which shape a payload is decoded as; the content format
//! decides how.

use ctxbridge_senml::SenMLError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::{OffsetDateTime, macros::datetime};

pub mod measurement;
pub mod thing;

pub use measurement::MeasurementRecord;
pub use thing::{RefDevice, Thing, ThingRecord};

/// Topic carrying measurement records
pub const TOPIC_MESSAGE_ACCEPTED: &str = "message.accepted";
/// Topics carrying thing records
pub const TOPIC_THING_UPDATED: &str = "thing.updated";
pub const TOPIC_THING_CREATED: &str = "thing.created";

/// Errors raised while turning a payload into a record
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("unknown topic: {0}")]
    UnknownTopic(String),

    #[error("malformed JSON payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed CBOR payload: {0}")]
    Cbor(String),

    #[error("invalid measurement pack: {0}")]
    Pack(#[from] SenMLError),

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("reading time not representable: {0} epoch seconds")]
    TimeOutOfRange(f64),
}

/// Which record shape a message carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Measurement,
    Thing,
}

impl MessageKind {
    pub fn from_topic(topic: &str) -> Result<Self, DecodeError> {
        match topic {
            TOPIC_MESSAGE_ACCEPTED => Ok(Self::Measurement),
            TOPIC_THING_UPDATED | TOPIC_THING_CREATED => Ok(Self::Thing),
            other => Err(DecodeError::UnknownTopic(other.to_string())),
        }
    }
}

/// Encoding of a message body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentFormat {
    #[default]
    Json,
    Cbor,
}

impl ContentFormat {
    /// Map a content type header value to a format, defaulting to JSON
    pub fn from_content_type(content_type: &str) -> Self {
        if content_type.contains("cbor") {
            Self::Cbor
        } else {
            Self::Json
        }
    }
}

/// A raw message as handed over by the transport
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub kind: MessageKind,
    pub format: ContentFormat,
    pub body: Vec<u8>,
}

/// A decoded record
#[derive(Debug, Clone, PartialEq)]
pub enum InboundRecord {
    Measurement(MeasurementRecord),
    Thing(ThingRecord),
}

impl InboundMessage {
    pub fn json(kind: MessageKind, body: impl Into<Vec<u8>>) -> Self {
        Self {
            kind,
            format: ContentFormat::Json,
            body: body.into(),
        }
    }

    pub fn cbor(kind: MessageKind, body: impl Into<Vec<u8>>) -> Self {
        Self {
            kind,
            format: ContentFormat::Cbor,
            body: body.into(),
        }
    }

    pub fn decode(&self) -> Result<InboundRecord, DecodeError> {
        match self.kind {
            MessageKind::Measurement => {
                let record: MeasurementRecord = self.parse()?;
                record.validate()?;
                Ok(InboundRecord::Measurement(record))
            }
            MessageKind::Thing => {
                let record: ThingRecord = self.parse()?;
                Ok(InboundRecord::Thing(record))
            }
        }
    }

    fn parse<T: serde::de::DeserializeOwned>(&self) -> Result<T, DecodeError> {
        match self.format {
            ContentFormat::Json => Ok(serde_json::from_slice(&self.body)?),
            ContentFormat::Cbor => ciborium::de::from_reader(self.body.as_slice())
                .map_err(|e| DecodeError::Cbor(e.to_string())),
        }
    }
}

impl InboundRecord {
    pub fn tenant(&self) -> &str {
        match self {
            Self::Measurement(m) => &m.tenant,
            Self::Thing(t) => t.tenant(),
        }
    }
}

/// Geographic position in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

/// True for timestamps a producer sends when it has no observation time
pub fn is_unset(ts: &OffsetDateTime) -> bool {
    *ts == datetime!(0001-01-01 0:00 UTC) || ts.unix_timestamp() == 0
}

/// Convert epoch seconds to a UTC timestamp, keeping sub-second precision
pub fn from_epoch_seconds(seconds: f64) -> Option<OffsetDateTime> {
    if !seconds.is_finite() {
        return None;
    }
    let nanos = (seconds.trunc() as i128)
        .checked_mul(1_000_000_000)?
        .checked_add((seconds.fract() * 1e9).round() as i128)?;
    OffsetDateTime::from_unix_timestamp_nanos(nanos).ok()
}

/// True when `ts` falls in the years RFC 3339 can express
pub fn is_representable(ts: &OffsetDateTime) -> bool {
    (0..=9999).contains(&ts.year())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topics() {
        assert_eq!(
            MessageKind::from_topic("message.accepted").unwrap(),
            MessageKind::Measurement
        );
        assert_eq!(
            MessageKind::from_topic("thing.updated").unwrap(),
            MessageKind::Thing
        );
        assert!(matches!(
            MessageKind::from_topic("device-status"),
            Err(DecodeError::UnknownTopic(_))
        ));
    }

    #[test]
    fn test_content_format() {
        assert_eq!(
            ContentFormat::from_content_type("application/cbor"),
            ContentFormat::Cbor
        );
        assert_eq!(
            ContentFormat::from_content_type("application/json; charset=utf-8"),
            ContentFormat::Json
        );
    }

    #[test]
    fn test_is_unset() {
        assert!(is_unset(&datetime!(0001-01-01 0:00 UTC)));
        assert!(is_unset(&OffsetDateTime::UNIX_EPOCH));
        assert!(!is_unset(&datetime!(2024-05-01 10:00 UTC)));
    }

    #[test]
    fn test_from_epoch_seconds() {
        assert_eq!(
            from_epoch_seconds(1_714_557_600.0),
            Some(datetime!(2024-05-01 10:00 UTC))
        );
        assert_eq!(
            from_epoch_seconds(1_714_557_600.5),
            Some(datetime!(2024-05-01 10:00:00.5 UTC))
        );
        assert_eq!(from_epoch_seconds(f64::NAN), None);
        assert_eq!(from_epoch_seconds(1e30), None);
        assert_eq!(from_epoch_seconds(-1e30), None);
        assert_eq!(from_epoch_seconds(f64::MAX), None);
    }

    #[test]
    fn test_is_representable() {
        assert!(is_representable(&datetime!(2024-05-01 10:00 UTC)));
        let epoch = OffsetDateTime::UNIX_EPOCH;
        assert!(is_representable(&epoch.replace_year(0).unwrap()));
        assert!(!is_representable(&epoch.replace_year(-1).unwrap()));
    }

    #[test]
    fn test_malformed_payload() {
        let message = InboundMessage::json(MessageKind::Measurement, b"{not json".to_vec());
        assert!(matches!(message.decode(), Err(DecodeError::Json(_))));

        let message = InboundMessage::cbor(MessageKind::Thing, vec![0xff]);
        assert!(matches!(message.decode(), Err(DecodeError::Cbor(_))));
    }
}
