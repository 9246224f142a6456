//! Entity builders
//!
//! Every builder turns one record into zero or more entity updates. A builder
//! that finds the record structurally fine but lacking the readings it needs
//! *declines*; that is a normal outcome and not an error. A builder that cannot
//! even form an identity for the entity *fails*. Both outcomes drop the record.
//!
//! The set of builders is closed: measurement records are handled by a
//! [`MeasurementTransformer`], thing records by a [`ThingTransformer`].

use time::OffsetDateTime;

use crate::entity::EntityUpdate;
use crate::message::{MeasurementRecord, ThingRecord};
use crate::property::{self, Property, PropertySet};

pub mod device;
pub mod greenspace;
pub mod indoor;
pub mod things;
pub mod water;
pub mod weather;

/// Result of running a builder over a record
#[derive(Debug, Clone, PartialEq)]
pub enum BuildOutcome {
    /// Updates to upsert, in order
    Built(Vec<EntityUpdate>),
    /// Not enough data for a meaningful entity
    Declined(String),
    /// The record cannot be turned into an entity at all
    Failed(String),
}

impl BuildOutcome {
    pub fn single(update: EntityUpdate) -> Self {
        Self::Built(vec![update])
    }

    pub fn declined<S: Into<String>>(reason: S) -> Self {
        Self::Declined(reason.into())
    }

    pub fn failed<S: Into<String>>(reason: S) -> Self {
        Self::Failed(reason.into())
    }
}

/// Builders for measurement records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeasurementTransformer {
    Device,
    WeatherObserved,
    IndoorEnvironmentObserved,
    WaterQualityObserved,
    GreenspaceRecord,
    WaterConsumptionObserved,
}

impl MeasurementTransformer {
    pub fn build(&self, record: &MeasurementRecord) -> BuildOutcome {
        match self {
            Self::Device => device::device(record),
            Self::WeatherObserved => weather::weather_observed(record),
            Self::IndoorEnvironmentObserved => indoor::indoor_environment_observed(record),
            Self::WaterQualityObserved => weather::water_quality_observed(record),
            Self::GreenspaceRecord => greenspace::greenspace_record(record),
            Self::WaterConsumptionObserved => water::water_consumption_observed(record),
        }
    }
}

/// Builders for thing records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThingTransformer {
    WasteContainer,
    Sewer,
    PumpingStation,
    Lifebuoy,
    Room,
    PointOfInterest,
    WaterMeter,
}

impl ThingTransformer {
    /// `now` is the processing time, used by builders that substitute it for a
    /// missing observation time
    pub fn build(&self, record: &ThingRecord, now: OffsetDateTime) -> BuildOutcome {
        match self {
            Self::WasteContainer => things::waste_container(record),
            Self::Sewer => things::sewer(record),
            Self::PumpingStation => things::pumping_station(record),
            Self::Lifebuoy => things::lifebuoy(record),
            Self::Room => things::room(record, now),
            Self::PointOfInterest => things::point_of_interest(record),
            Self::WaterMeter => water::water_meter(record),
        }
    }
}

/// A reading observed by the record's device
pub(crate) fn measured(
    record: &MeasurementRecord,
    name: &str,
    value: f64,
    observed_at: OffsetDateTime,
) -> Property {
    property::number(name, value, observed_at).observed_by(record.device_urn())
}

/// `dateObserved` plus `location` when the record carries one
pub(crate) fn observation_base(record: &MeasurementRecord, observed_at: OffsetDateTime) -> PropertySet {
    let mut properties = PropertySet::new().with(property::date_observed(observed_at));
    if let Some(location) = record.location {
        properties.insert(property::location(location.latitude, location.longitude));
    }
    properties
}
