use ctxbridge_senml::extract;

use super::BuildOutcome;
use crate::entity::EntityUpdate;
use crate::lwm2m::{self, resource};
use crate::message::MeasurementRecord;
use crate::property::{self, PropertySet};

/// Presence or digital input state of a device, reported as `status` on/off
pub fn device(record: &MeasurementRecord) -> BuildOutcome {
    let state = extract::get::<bool>(&record.pack, lwm2m::PRESENCE, resource::DIGITAL_INPUT_STATE)
        .or_else(|| {
            extract::get::<bool>(&record.pack, lwm2m::DIGITAL_INPUT, resource::DIGITAL_INPUT_STATE)
        });

    let Some(state) = state else {
        return BuildOutcome::declined("no presence reading");
    };

    let observed_at = record.observed_at();
    let mut properties = PropertySet::new()
        .with(property::status(state, observed_at))
        .with(property::date_last_value_reported(observed_at));

    if let Some(location) = record.location {
        properties.insert(property::location(location.latitude, location.longitude));
    }

    BuildOutcome::single(EntityUpdate::new(record.device_urn(), "Device", properties))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::PropertyValue;
    use crate::test_utils::{measurement, measurement_at};
    use ctxbridge_senml::PackBuilder;

    #[test]
    fn test_presence_on() {
        let record = measurement_at(
            "pir-1",
            PackBuilder::new(lwm2m::PRESENCE)
                .add_bool_value("5500", true)
                .build(),
            62.0,
            17.0,
        );

        let BuildOutcome::Built(updates) = device(&record) else {
            panic!("expected entity");
        };
        let update = &updates[0];
        assert_eq!(update.id, "urn:ngsi-ld:Device:pir-1");
        assert_eq!(update.entity_type, "Device");
        assert_eq!(
            update.properties.get("status").map(|p| &p.value),
            Some(&PropertyValue::Text("on".into()))
        );
        assert!(update.properties.contains("dateLastValueReported"));
        assert!(update.properties.contains("location"));
    }

    #[test]
    fn test_digital_input_off() {
        let record = measurement(
            "di-1",
            PackBuilder::new(lwm2m::DIGITAL_INPUT)
                .add_bool_value("5500", false)
                .build(),
        );

        let BuildOutcome::Built(updates) = device(&record) else {
            panic!("expected entity");
        };
        assert_eq!(
            updates[0].properties.get("status").map(|p| &p.value),
            Some(&PropertyValue::Text("off".into()))
        );
        assert!(!updates[0].properties.contains("location"));
    }

    #[test]
    fn test_declines_without_presence() {
        let record = measurement_at(
            "pir-1",
            PackBuilder::new(lwm2m::PRESENCE)
                .add_value("5700", 1.0)
                .add_bool_value("5501", true)
                .build(),
            62.0,
            17.0,
        );

        assert!(matches!(device(&record), BuildOutcome::Declined(_)));
    }
}
