//! LwM2M object URNs and the resource ids read from them.

pub const DIGITAL_INPUT: &str = "urn:oma:lwm2m:ext:3200";
pub const ILLUMINANCE: &str = "urn:oma:lwm2m:ext:3301";
pub const PRESENCE: &str = "urn:oma:lwm2m:ext:3302";
pub const TEMPERATURE: &str = "urn:oma:lwm2m:ext:3303";
pub const HUMIDITY: &str = "urn:oma:lwm2m:ext:3304";
pub const PRESSURE: &str = "urn:oma:lwm2m:ext:3323";
pub const CONDUCTIVITY: &str = "urn:oma:lwm2m:ext:3327";
pub const WATER_METER: &str = "urn:oma:lwm2m:ext:3424";
pub const PEOPLE_COUNTER: &str = "urn:oma:lwm2m:ext:3434";

/// Resource ids
pub mod resource {
    /// Sensor Value
    pub const SENSOR_VALUE: &str = "5700";
    /// Digital Input State / presence state
    pub const DIGITAL_INPUT_STATE: &str = "5500";
    /// Free-text origin of the measurement
    pub const SOURCE: &str = "source";

    /// Water meter: Cumulated water volume (m3)
    pub const CUMULATED_WATER_VOLUME: &str = "1";
    pub const LEAK_DETECTED: &str = "10";
    pub const BACKFLOW_DETECTED: &str = "11";
    pub const FRAUD_DETECTED: &str = "13";

    /// People counter: Actual number of persons
    pub const ACTUAL_NUMBER_OF_PERSONS: &str = "1";
}

/// Environments reported in the `env` reading of a pack
pub mod env {
    pub const INDOORS: &str = "indoors";
    pub const OUTDOORS: &str = "outdoors";
    pub const AIR: &str = "air";
    pub const WATER: &str = "water";
    pub const SOIL: &str = "soil";
}

/// Build a classification key from an URN and an optional environment
pub fn classification_key(urn: &str, env: Option<&str>) -> String {
    match env {
        Some(env) => format!("{urn}/{env}"),
        None => urn.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_key() {
        assert_eq!(classification_key(TEMPERATURE, None), TEMPERATURE);
        assert_eq!(
            classification_key(TEMPERATURE, Some(env::INDOORS)),
            "urn:oma:lwm2m:ext:3303/indoors"
        );
    }
}
