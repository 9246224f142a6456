//! Outdoor air and water temperature observations

use ctxbridge_senml::extract;

use super::{BuildOutcome, measured, observation_base};
use crate::entity::{EntityUpdate, entity_id};
use crate::lwm2m::{self, resource};
use crate::message::MeasurementRecord;
use crate::property::{self, PropertySet, units};

/// Temperature plus the optional free-text `source`, or `None` without a temperature
fn temperature_properties(record: &MeasurementRecord) -> Option<PropertySet> {
    let temperature = extract::get::<f64>(&record.pack, lwm2m::TEMPERATURE, resource::SENSOR_VALUE)?;

    let observed_at = record.observed_at();
    let mut properties = observation_base(record, observed_at);
    properties.insert(measured(record, "temperature", temperature, observed_at).unit(units::CELSIUS));

    if let Some(source) = extract::get::<String>(&record.pack, lwm2m::TEMPERATURE, resource::SOURCE)
        .filter(|s| !s.is_empty())
    {
        properties.insert(property::text("source", source));
    }

    Some(properties)
}

pub fn weather_observed(record: &MeasurementRecord) -> BuildOutcome {
    match temperature_properties(record) {
        Some(properties) => BuildOutcome::single(EntityUpdate::new(
            entity_id("WeatherObserved", &[], &record.sensor),
            "WeatherObserved",
            properties,
        )),
        None => BuildOutcome::declined("no temperature reading"),
    }
}

pub fn water_quality_observed(record: &MeasurementRecord) -> BuildOutcome {
    match temperature_properties(record) {
        Some(properties) => BuildOutcome::single(EntityUpdate::new(
            entity_id("WaterQualityObserved", &["temperature"], &record.sensor),
            "WaterQualityObserved",
            properties,
        )),
        None => BuildOutcome::declined("no water temperature reading"),
    }
}
