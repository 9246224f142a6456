//! Builders for managed assets
//!
//! Thing entities are named after the asset, not the device observing it:
//! the local id is the alternative name, else the name, else the raw id. A
//! thing without any of those cannot be identified and fails to build.
//!
//! Missing observation times are handled per kind. A room substitutes the
//! processing time, a pumping station is skipped, everything else falls back
//! to the record timestamp.

use time::OffsetDateTime;

use super::BuildOutcome;
use crate::entity::{EntityUpdate, device_urn, entity_id};
use crate::message::{Thing, ThingRecord};
use crate::property::{self, PropertySet, units};

fn unidentified(kind: &str) -> BuildOutcome {
    BuildOutcome::failed(format!("{kind} has no alternative name, name or id"))
}

/// `name`, `description` and `location` shared by all thing entities
fn descriptive(thing: &Thing) -> PropertySet {
    let mut properties = PropertySet::new();
    if !thing.name.is_empty() {
        properties.insert(property::text("name", thing.name.as_str()));
    }
    properties.insert_opt(
        thing
            .description
            .as_deref()
            .filter(|d| !d.is_empty())
            .map(|d| property::text("description", d)),
    );
    properties.insert_opt(
        thing
            .location
            .map(|location| property::location(location.latitude, location.longitude)),
    );
    properties
}

fn observed_or_record_time(record: &ThingRecord) -> OffsetDateTime {
    record.observed_at().unwrap_or(record.timestamp)
}

pub fn waste_container(record: &ThingRecord) -> BuildOutcome {
    let thing = &record.thing;
    let Some(local_id) = thing.local_id() else {
        return unidentified("container");
    };
    if thing.percent.is_none() && thing.current_level.is_none() {
        return BuildOutcome::declined("container reports neither fill level nor current level");
    }

    let observed_at = observed_or_record_time(record);
    let mut properties = descriptive(thing).with(property::date_observed(observed_at));
    properties.insert_opt(
        thing
            .percent
            .map(|p| property::number("fillingLevel", p, observed_at).unit(units::PERCENT)),
    );
    properties.insert_opt(
        thing
            .current_level
            .map(|l| property::number("currentLevel", l, observed_at).unit(units::METRE)),
    );

    BuildOutcome::single(EntityUpdate::new(
        entity_id("WasteContainer", &[], &local_id),
        "WasteContainer",
        properties,
    ))
}

/// Sewer or combined sewage overflow
///
/// A single referenced device becomes a `refDevice` relationship. Several
/// become one relationship instance each. In both cases the first device is
/// reported as `source`.
pub fn sewer(record: &ThingRecord) -> BuildOutcome {
    let thing = &record.thing;
    let Some(local_id) = thing.local_id() else {
        return unidentified("sewer");
    };
    if thing.current_level.is_none() && thing.percent.is_none() && thing.overflow_observed.is_none()
    {
        return BuildOutcome::declined("sewer reports no level or overflow");
    }

    let observed_at = observed_or_record_time(record);
    let mut properties = descriptive(thing).with(property::date_observed(observed_at));

    properties.insert_opt(
        thing
            .current_level
            .map(|l| property::number("currentLevel", l, observed_at).unit(units::METRE)),
    );
    properties.insert_opt(
        thing
            .percent
            .map(|p| property::number("fillingLevel", p, observed_at).unit(units::PERCENT)),
    );

    if let Some(overflow) = thing.overflow_observed {
        let overflow_at = Thing::event_time(thing.overflow_observed_at).unwrap_or(observed_at);
        properties.insert(property::boolean("overflowObserved", overflow, overflow_at));
        properties.insert_opt(
            thing
                .overflow_duration
                .map(|d| property::number("overflowDuration", d, overflow_at).unit(units::SECOND)),
        );
    }

    let devices: Vec<String> = thing
        .ref_devices
        .iter()
        .filter(|d| !d.device_id.is_empty())
        .map(|d| device_urn(&d.device_id))
        .collect();

    match devices.as_slice() {
        [] => {}
        [device] => {
            properties.insert(property::relationship("refDevice", device.as_str()));
            properties.insert(property::text("source", device.as_str()));
        }
        [first, ..] => {
            properties.insert(property::text("source", first.as_str()));
            properties.insert(property::relationships("refDevice", devices.clone()));
        }
    }

    BuildOutcome::single(EntityUpdate::new(
        entity_id("Sewer", &[], &local_id),
        "Sewer",
        properties,
    ))
}

/// Skipped entirely when the station reports no observation time
pub fn pumping_station(record: &ThingRecord) -> BuildOutcome {
    let thing = &record.thing;
    let Some(local_id) = thing.local_id() else {
        return unidentified("pumping station");
    };
    let Some(observed_at) = record.observed_at() else {
        return BuildOutcome::declined("pumping station has no observation time");
    };
    let Some(pumping) = thing.pumping_observed else {
        return BuildOutcome::declined("pumping station reports no pumping state");
    };

    let pumping_at = Thing::event_time(thing.pumping_observed_at);
    let mut properties = descriptive(thing)
        .with(property::date_observed(observed_at))
        .with(property::boolean(
            "pumpingObserved",
            pumping,
            pumping_at.unwrap_or(observed_at),
        ));
    properties.insert_opt(pumping_at.map(|ts| property::date_time("pumpingObservedAt", ts)));
    properties.insert_opt(
        thing
            .pumping_duration
            .map(|d| property::number("pumpingDuration", d, observed_at).unit(units::SECOND)),
    );

    BuildOutcome::single(EntityUpdate::new(
        entity_id("SewagePumpingStation", &[], &local_id),
        "SewagePumpingStation",
        properties,
    ))
}

pub fn lifebuoy(record: &ThingRecord) -> BuildOutcome {
    let thing = &record.thing;
    let Some(local_id) = thing.local_id() else {
        return unidentified("lifebuoy");
    };
    let Some(presence) = thing.presence else {
        return BuildOutcome::declined("lifebuoy reports no presence");
    };

    let observed_at = observed_or_record_time(record);
    let properties = descriptive(thing)
        .with(property::status(presence, observed_at))
        .with(property::date_last_value_reported(observed_at));

    BuildOutcome::single(EntityUpdate::new(
        entity_id("Lifebuoy", &[], &local_id),
        "Lifebuoy",
        properties,
    ))
}

/// Indoor temperature of a room; a missing observation time becomes `now`
pub fn room(record: &ThingRecord, now: OffsetDateTime) -> BuildOutcome {
    let thing = &record.thing;
    let Some(local_id) = thing.local_id() else {
        return unidentified("room");
    };
    let Some(temperature) = thing.temperature else {
        return BuildOutcome::declined("room reports no temperature");
    };

    let observed_at = record.observed_at().unwrap_or(now);
    let properties = descriptive(thing)
        .with(property::date_observed(observed_at))
        .with(property::number("temperature", temperature, observed_at).unit(units::CELSIUS));

    BuildOutcome::single(EntityUpdate::new(
        entity_id("IndoorEnvironmentObserved", &["Room"], &local_id),
        "IndoorEnvironmentObserved",
        properties,
    ))
}

/// Point of interest or beach; the classification key picks the entity type
pub fn point_of_interest(record: &ThingRecord) -> BuildOutcome {
    let thing = &record.thing;
    let Some(local_id) = thing.local_id() else {
        return unidentified("point of interest");
    };

    let entity_type = match record.classification_key() {
        "Beach" => "Beach",
        _ => "PointOfInterest",
    };

    let observed_at = observed_or_record_time(record);
    let mut properties = descriptive(thing).with(property::date_observed(observed_at));
    properties.insert_opt(
        thing
            .temperature
            .map(|t| property::number("temperature", t, observed_at).unit(units::CELSIUS)),
    );

    BuildOutcome::single(EntityUpdate::new(
        entity_id(entity_type, &[], &local_id),
        entity_type,
        properties,
    ))
}
