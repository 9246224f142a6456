use ctxbridge_senml::extract;

use super::{BuildOutcome, measured, observation_base};
use crate::entity::{EntityUpdate, entity_id};
use crate::lwm2m::{self, resource};
use crate::message::MeasurementRecord;
use crate::property::units;

/// Soil moisture tension in kPa from the raw pressure reading
pub fn to_kilopascal(raw: f64) -> f64 {
    raw / 1000.0
}

/// Soil sensor readings; never declines, an empty record still refreshes
/// the observation time and location
pub fn greenspace_record(record: &MeasurementRecord) -> BuildOutcome {
    let pressure = extract::get::<f64>(&record.pack, lwm2m::PRESSURE, resource::SENSOR_VALUE);
    let conductivity = extract::get::<f64>(&record.pack, lwm2m::CONDUCTIVITY, resource::SENSOR_VALUE);

    let observed_at = record.observed_at();
    let mut properties = observation_base(record, observed_at);

    if let Some(pressure) = pressure {
        properties.insert(
            measured(record, "soilMoisturePressure", to_kilopascal(pressure), observed_at)
                .unit(units::KILOPASCAL),
        );
    }
    if let Some(conductivity) = conductivity {
        properties.insert(measured(record, "soilMoistureEc", conductivity, observed_at));
    }

    BuildOutcome::single(EntityUpdate::new(
        entity_id("GreenspaceRecord", &[], &record.sensor),
        "GreenspaceRecord",
        properties,
    ))
}
