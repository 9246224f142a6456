use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::{Location, is_unset};

/// State of a managed asset ("thing") as published by the asset registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThingRecord {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    pub thing: Thing,
    #[serde(default)]
    pub tenant: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

/// A reference from a thing to a device observing it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefDevice {
    #[serde(rename = "deviceID")]
    pub device_id: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thing {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub sub_type: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub alternative_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default)]
    pub tenant: String,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub observed_at: Option<OffsetDateTime>,

    #[serde(default)]
    pub current_level: Option<f64>,
    #[serde(default)]
    pub percent: Option<f64>,
    #[serde(default)]
    pub presence: Option<bool>,
    #[serde(default)]
    pub temperature: Option<f64>,

    #[serde(default)]
    pub overflow_observed: Option<bool>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub overflow_observed_at: Option<OffsetDateTime>,
    /// Seconds
    #[serde(default)]
    pub overflow_duration: Option<f64>,

    #[serde(default)]
    pub pumping_observed: Option<bool>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub pumping_observed_at: Option<OffsetDateTime>,
    /// Seconds
    #[serde(default)]
    pub pumping_duration: Option<f64>,

    #[serde(default)]
    pub ref_devices: Vec<RefDevice>,

    /// Cubic metres
    #[serde(default)]
    pub cumulative_volume: Option<f64>,
    #[serde(default)]
    pub leakage: Option<bool>,
    #[serde(default)]
    pub backflow: Option<bool>,
    #[serde(default)]
    pub fraud: Option<bool>,
}

impl ThingRecord {
    pub fn tenant(&self) -> &str {
        if self.tenant.is_empty() {
            &self.thing.tenant
        } else {
            &self.tenant
        }
    }

    /// Declared sub-type when present, else the declared type
    pub fn classification_key(&self) -> &str {
        let kind = if self.thing.kind.is_empty() {
            self.kind.as_str()
        } else {
            self.thing.kind.as_str()
        };

        self.thing
            .sub_type
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(kind)
    }

    /// Observation time, or `None` when the producer sent none or a zero time
    pub fn observed_at(&self) -> Option<OffsetDateTime> {
        self.thing.observed_at.filter(|ts| !is_unset(ts))
    }
}

impl Thing {
    /// Local part of the entity id: alternative name, else name with spaces
    /// replaced by `-`, else the raw id
    pub fn local_id(&self) -> Option<String> {
        if let Some(alt) = self.alternative_name.as_deref().filter(|s| !s.is_empty()) {
            return Some(alt.to_string());
        }
        if !self.name.is_empty() {
            return Some(self.name.replace(' ', "-"));
        }
        if !self.id.is_empty() {
            return Some(self.id.clone());
        }
        None
    }

    /// Observation time of an event field, filtered for zero times
    pub fn event_time(ts: Option<OffsetDateTime>) -> Option<OffsetDateTime> {
        ts.filter(|ts| !is_unset(ts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_decode_container() {
        let json = r#"{
            "id": "t-1",
            "type": "Container",
            "tenant": "default",
            "timestamp": "2024-05-01T10:00:00Z",
            "thing": {
                "id": "t-1",
                "type": "Container",
                "name": "Soptunna 1",
                "alternativeName": "Soptunnor.XY",
                "location": {"latitude": 62, "longitude": 17},
                "tenant": "default",
                "observedAt": "2024-05-01T09:58:00Z",
                "percent": 56,
                "refDevices": [{"deviceID": "dev-1"}]
            }
        }"#;

        let record: ThingRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.classification_key(), "Container");
        assert_eq!(record.thing.percent, Some(56.0));
        assert_eq!(record.thing.ref_devices[0].device_id, "dev-1");
        assert_eq!(record.observed_at(), Some(datetime!(2024-05-01 9:58 UTC)));
        assert_eq!(record.thing.local_id().as_deref(), Some("Soptunnor.XY"));
    }

    #[test]
    fn test_sub_type_wins() {
        let record = ThingRecord {
            id: "t".into(),
            kind: "PointOfInterest".into(),
            thing: Thing {
                kind: "PointOfInterest".into(),
                sub_type: Some("Beach".into()),
                ..Default::default()
            },
            tenant: String::new(),
            timestamp: datetime!(2024-05-01 10:00 UTC),
        };
        assert_eq!(record.classification_key(), "Beach");
    }

    #[test]
    fn test_local_id_fallbacks() {
        let mut thing = Thing {
            id: "raw-id".into(),
            name: "Pump House 3".into(),
            alternative_name: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(thing.local_id().as_deref(), Some("Pump-House-3"));

        thing.name.clear();
        assert_eq!(thing.local_id().as_deref(), Some("raw-id"));

        thing.id.clear();
        assert_eq!(thing.local_id(), None);
    }

    #[test]
    fn test_zero_observed_at() {
        let json = r#"{"type":"Room","timestamp":"2024-05-01T10:00:00Z",
            "thing":{"id":"r","type":"Room","observedAt":"0001-01-01T00:00:00Z"}}"#;
        let record: ThingRecord = serde_json::from_str(json).unwrap();
        assert!(record.thing.observed_at.is_some());
        assert_eq!(record.observed_at(), None);
    }
}
