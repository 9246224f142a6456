//! Water consumption, from metering packs and from water meter things

use ctxbridge_senml::extract;

use super::{BuildOutcome, measured, observation_base};
use crate::entity::{EntityUpdate, device_urn, entity_id};
use crate::lwm2m::{self, resource};
use crate::message::{MeasurementRecord, ThingRecord};
use crate::property::{self, PropertySet, units};

/// Convert cubic metres to whole litres, rounding half up at millilitre precision
pub fn to_litres(cubic_metres: f64) -> f64 {
    ((cubic_metres + 0.0005) * 1000.0).floor()
}

/// One update per cumulated volume reading in the pack
///
/// Leak and backflow alarms are always written, as `0` when the pack does not
/// report them. The tamper alarm is only written when the fraud reading is
/// present. Updates are returned in pack order.
pub fn water_consumption_observed(record: &MeasurementRecord) -> BuildOutcome {
    let pack = &record.pack;
    let leak = extract::get::<bool>(pack, lwm2m::WATER_METER, resource::LEAK_DETECTED);
    let backflow = extract::get::<bool>(pack, lwm2m::WATER_METER, resource::BACKFLOW_DETECTED);
    let fraud = extract::get::<bool>(pack, lwm2m::WATER_METER, resource::FRAUD_DETECTED);

    let id = entity_id("WaterConsumptionObserved", &[], &record.sensor);

    let updates: Vec<EntityUpdate> =
        extract::get_all::<f64>(pack, lwm2m::WATER_METER, resource::CUMULATED_WATER_VOLUME)
            .map(|(reading, volume)| {
                let observed_at = record.reading_time(reading);
                let mut properties = observation_base(record, observed_at);

                properties.insert(
                    measured(record, "waterConsumption", to_litres(volume), observed_at)
                        .unit(units::LITRE),
                );
                properties.insert(property::flag(
                    "alarmStopsLeaks",
                    leak.unwrap_or(false),
                    observed_at,
                ));
                properties.insert(property::flag(
                    "alarmBackflow",
                    backflow.unwrap_or(false),
                    observed_at,
                ));
                properties.insert_opt(
                    fraud.map(|fraud| property::flag("alarmTamper", fraud, observed_at)),
                );

                EntityUpdate::new(id.clone(), "WaterConsumptionObserved", properties)
            })
            .collect();

    if updates.is_empty() {
        return BuildOutcome::declined("no cumulated water volume readings");
    }

    BuildOutcome::Built(updates)
}

/// Water meter thing reporting a cumulative volume in cubic metres
pub fn water_meter(record: &ThingRecord) -> BuildOutcome {
    let thing = &record.thing;
    let Some(local_id) = thing.local_id() else {
        return BuildOutcome::failed("water meter has no name or id");
    };
    let Some(volume) = thing.cumulative_volume else {
        return BuildOutcome::declined("no cumulative volume");
    };

    let observed_at = record.observed_at().unwrap_or(record.timestamp);
    let mut consumption =
        property::number("waterConsumption", to_litres(volume), observed_at).unit(units::LITRE);
    if let Some(device) = thing.ref_devices.first() {
        consumption = consumption.observed_by(device_urn(&device.device_id));
    }

    let mut properties = PropertySet::new().with(property::date_observed(observed_at));
    properties.insert_opt(
        thing
            .location
            .map(|location| property::location(location.latitude, location.longitude)),
    );
    properties.insert(consumption);
    properties.insert(property::flag(
        "alarmStopsLeaks",
        thing.leakage.unwrap_or(false),
        observed_at,
    ));
    properties.insert(property::flag(
        "alarmBackflow",
        thing.backflow.unwrap_or(false),
        observed_at,
    ));
    properties.insert_opt(
        thing
            .fraud
            .map(|fraud| property::flag("alarmTamper", fraud, observed_at)),
    );

    BuildOutcome::single(EntityUpdate::new(
        entity_id("WaterConsumptionObserved", &[], &local_id),
        "WaterConsumptionObserved",
        properties,
    ))
}
