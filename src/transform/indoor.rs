use ctxbridge_senml::extract;

use super::{BuildOutcome, measured, observation_base};
use crate::entity::{EntityUpdate, entity_id};
use crate::lwm2m::{self, resource};
use crate::message::MeasurementRecord;
use crate::property::units;

/// Indoor climate from up to four readings; declines only if all are absent
pub fn indoor_environment_observed(record: &MeasurementRecord) -> BuildOutcome {
    let pack = &record.pack;
    let readings = [
        (
            "temperature",
            extract::get::<f64>(pack, lwm2m::TEMPERATURE, resource::SENSOR_VALUE),
            Some(units::CELSIUS),
        ),
        (
            "humidity",
            extract::get::<f64>(pack, lwm2m::HUMIDITY, resource::SENSOR_VALUE),
            Some(units::PERCENT),
        ),
        (
            "illuminance",
            extract::get::<f64>(pack, lwm2m::ILLUMINANCE, resource::SENSOR_VALUE),
            Some(units::LUX),
        ),
        (
            "peopleCount",
            extract::get::<f64>(pack, lwm2m::PEOPLE_COUNTER, resource::ACTUAL_NUMBER_OF_PERSONS),
            None,
        ),
    ];

    if readings.iter().all(|(_, value, _)| value.is_none()) {
        return BuildOutcome::declined("no indoor environment readings");
    }

    let observed_at = record.observed_at();
    let mut properties = observation_base(record, observed_at);

    for (name, value, unit) in readings {
        let Some(value) = value else { continue };
        let mut property = measured(record, name, value, observed_at);
        if let Some(unit) = unit {
            property = property.unit(unit);
        }
        properties.insert(property);
    }

    BuildOutcome::single(EntityUpdate::new(
        entity_id("IndoorEnvironmentObserved", &[], &record.sensor),
        "IndoorEnvironmentObserved",
        properties,
    ))
}
