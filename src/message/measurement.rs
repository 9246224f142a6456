use ctxbridge_senml::{Pack, Record};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use super::{DecodeError, Location, from_epoch_seconds, is_representable};
use crate::entity;
use crate::lwm2m;

/// A normalized device event carrying a measurement pack
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRecord {
    #[serde(alias = "sensorID")]
    pub sensor: String,
    #[serde(default)]
    pub tenant: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    pub pack: Pack,
}

impl MeasurementRecord {
    pub fn validate(&self) -> Result<(), DecodeError> {
        if self.sensor.is_empty() {
            return Err(DecodeError::MissingField("sensor"));
        }
        self.pack.validate()?;

        if let Some(bt) = self.pack.base_time() {
            representable(bt)?;
        }
        for reading in self.pack.iter() {
            if let Some(seconds) = self.pack.resolved_time(reading) {
                representable(seconds)?;
            } else if let Some(offset) = reading.t {
                let shifted = Duration::checked_seconds_f64(offset)
                    .and_then(|offset| self.timestamp.checked_add(offset))
                    .filter(is_representable);
                if shifted.is_none() {
                    return Err(DecodeError::TimeOutOfRange(
                        self.timestamp.unix_timestamp() as f64 + offset,
                    ));
                }
            }
        }
        Ok(())
    }

    /// Vocabulary URN of the pack, suffixed with `/<env>` when the pack reports one
    pub fn classification_key(&self) -> Option<String> {
        self.pack
            .base_type()
            .map(|urn| lwm2m::classification_key(urn, self.pack.environment()))
    }

    /// Entity id of the device that produced this record
    pub fn device_urn(&self) -> String {
        entity::device_urn(&self.sensor)
    }

    /// Observation time of the pack as a whole
    pub fn observed_at(&self) -> OffsetDateTime {
        self.pack
            .base_time()
            .and_then(from_epoch_seconds)
            .unwrap_or(self.timestamp)
    }

    /// Observation time of a single reading of this record's pack
    pub fn reading_time(&self, record: &Record) -> OffsetDateTime {
        match self.pack.resolved_time(record).and_then(from_epoch_seconds) {
            Some(ts) => ts,
            None => record
                .t
                .and_then(Duration::checked_seconds_f64)
                .and_then(|offset| self.timestamp.checked_add(offset))
                .unwrap_or(self.timestamp),
        }
    }
}

fn representable(seconds: f64) -> Result<(), DecodeError> {
    from_epoch_seconds(seconds)
        .filter(is_representable)
        .map(|_| ())
        .ok_or(DecodeError::TimeOutOfRange(seconds))
}
