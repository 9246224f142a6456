//! Classification registry
//!
//! Maps classification keys to builders. There are two keyspaces: one for
//! measurement records (vocabulary URN, optionally with `/<env>`) and one for
//! thing records (sub-type or type). Lookups are exact string matches.
//!
//! A registry is assembled once with [`RegistryBuilder`] and is read-only
//! afterwards, so it can be shared between concurrent dispatches behind an
//! `Arc` without locking.

use std::collections::HashMap;

use crate::lwm2m::{self, env};
use crate::transform::{MeasurementTransformer, ThingTransformer};

#[derive(Debug, Clone, Default)]
pub struct Registry {
    measurements: HashMap<String, MeasurementTransformer>,
    things: HashMap<String, ThingTransformer>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Registry holding every builder this crate ships
    pub fn with_defaults() -> Self {
        use MeasurementTransformer as M;
        use ThingTransformer as T;

        let key = lwm2m::classification_key;

        Self::builder()
            .register_measurement(key(lwm2m::DIGITAL_INPUT, None), M::Device)
            .register_measurement(key(lwm2m::PRESENCE, None), M::Device)
            .register_measurement(key(lwm2m::TEMPERATURE, None), M::WeatherObserved)
            .register_measurement(key(lwm2m::TEMPERATURE, Some(env::AIR)), M::WeatherObserved)
            .register_measurement(key(lwm2m::TEMPERATURE, Some(env::OUTDOORS)), M::WeatherObserved)
            .register_measurement(
                key(lwm2m::TEMPERATURE, Some(env::INDOORS)),
                M::IndoorEnvironmentObserved,
            )
            .register_measurement(
                key(lwm2m::HUMIDITY, Some(env::INDOORS)),
                M::IndoorEnvironmentObserved,
            )
            .register_measurement(
                key(lwm2m::ILLUMINANCE, Some(env::INDOORS)),
                M::IndoorEnvironmentObserved,
            )
            .register_measurement(
                key(lwm2m::PEOPLE_COUNTER, Some(env::INDOORS)),
                M::IndoorEnvironmentObserved,
            )
            .register_measurement(key(lwm2m::TEMPERATURE, Some(env::WATER)), M::WaterQualityObserved)
            .register_measurement(key(lwm2m::PRESSURE, Some(env::SOIL)), M::GreenspaceRecord)
            .register_measurement(key(lwm2m::CONDUCTIVITY, Some(env::SOIL)), M::GreenspaceRecord)
            .register_measurement(key(lwm2m::WATER_METER, None), M::WaterConsumptionObserved)
            .register_thing("Container", T::WasteContainer)
            .register_thing("WasteContainer", T::WasteContainer)
            .register_thing("Sewer", T::Sewer)
            .register_thing("CombinedSewageOverflow", T::Sewer)
            .register_thing("PumpingStation", T::PumpingStation)
            .register_thing("Lifebuoy", T::Lifebuoy)
            .register_thing("Room", T::Room)
            .register_thing("PointOfInterest", T::PointOfInterest)
            .register_thing("Beach", T::PointOfInterest)
            .register_thing("WaterMeter", T::WaterMeter)
            .build()
    }

    pub fn lookup_measurement(&self, key: &str) -> Option<MeasurementTransformer> {
        self.measurements.get(key).copied()
    }

    pub fn lookup_thing(&self, key: &str) -> Option<ThingTransformer> {
        self.things.get(key).copied()
    }

    pub fn measurement_keys(&self) -> impl Iterator<Item = &str> {
        self.measurements.keys().map(String::as_str)
    }

    pub fn thing_keys(&self) -> impl Iterator<Item = &str> {
        self.things.keys().map(String::as_str)
    }
}

/// Builder for a [`Registry`]; registering a key twice keeps the last builder
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    registry: Registry,
}

impl RegistryBuilder {
    pub fn register_measurement<K: Into<String>>(
        mut self,
        key: K,
        transformer: MeasurementTransformer,
    ) -> Self {
        self.registry.measurements.insert(key.into(), transformer);
        self
    }

    pub fn register_thing<K: Into<String>>(mut self, key: K, transformer: ThingTransformer) -> Self {
        self.registry.things.insert(key.into(), transformer);
        self
    }

    pub fn build(self) -> Registry {
        self.registry
    }
}
