//! Property descriptors and the functions that synthesize them
//!
//! A [`PropertySet`] serializes to the attribute part of an NGSI-LD entity:
//! every descriptor becomes `{"type": "Property", "value": ...}` (or a
//! `GeoProperty` / `Relationship`) keyed by its name.
//!
//! All timestamps are rendered with [`format_timestamp`]. Every component must
//! use it, otherwise equal observations stop comparing equal downstream.

use serde::ser::{Error as _, SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use time::format_description::well_known::Rfc3339;
use time::{OffsetDateTime, UtcOffset};

pub mod units;

/// The value held by a property descriptor
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Number(f64),
    Text(String),
    Boolean(bool),
    DateTime(OffsetDateTime),
    GeoPoint { longitude: f64, latitude: f64 },
    Relationship(String),
    /// One relationship instance per target, each with its own dataset id
    Relationships(Vec<String>),
}

/// A named, optionally timestamped and unit-tagged value
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub name: String,
    pub value: PropertyValue,
    pub unit_code: Option<String>,
    pub observed_at: Option<OffsetDateTime>,
    pub observed_by: Option<String>,
}

impl Property {
    pub fn new<S: Into<String>>(name: S, value: PropertyValue) -> Self {
        Self {
            name: name.into(),
            value,
            unit_code: None,
            observed_at: None,
            observed_by: None,
        }
    }

    pub fn observed_at(mut self, ts: OffsetDateTime) -> Self {
        self.observed_at = Some(ts);
        self
    }

    /// Attach the entity id of the observing device
    pub fn observed_by<S: Into<String>>(mut self, device: S) -> Self {
        self.observed_by = Some(device.into());
        self
    }

    pub fn unit<S: Into<String>>(mut self, code: S) -> Self {
        self.unit_code = Some(code.into());
        self
    }
}

/// Insertion-ordered set of properties with unique names
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PropertySet {
    properties: Vec<Property>,
}

impl PropertySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a property, replacing any existing property with the same name in place
    pub fn insert(&mut self, property: Property) {
        match self.properties.iter_mut().find(|p| p.name == property.name) {
            Some(existing) => *existing = property,
            None => self.properties.push(property),
        }
    }

    pub fn with(mut self, property: Property) -> Self {
        self.insert(property);
        self
    }

    /// Insert when present
    pub fn insert_opt(&mut self, property: Option<Property>) {
        if let Some(property) = property {
            self.insert(property);
        }
    }

    pub fn get(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Property> {
        self.properties.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.properties.iter().map(|p| p.name.as_str()).collect()
    }
}

impl Extend<Property> for PropertySet {
    fn extend<I: IntoIterator<Item = Property>>(&mut self, iter: I) {
        for property in iter {
            self.insert(property);
        }
    }
}

impl FromIterator<Property> for PropertySet {
    fn from_iter<I: IntoIterator<Item = Property>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

/// Render a timestamp as UTC RFC 3339 with up to nanosecond precision
///
/// Trailing zeros of the fractional part are dropped and UTC is written as `Z`,
/// e.g. `2024-05-01T10:00:00Z` or `2024-05-01T10:00:00.25Z`.
pub fn format_timestamp(ts: &OffsetDateTime) -> Result<String, time::error::Format> {
    ts.to_offset(UtcOffset::UTC).format(&Rfc3339)
}

/// Presence-like vocabulary: `true` is `"on"`, `false` is `"off"`
pub fn status_value(on: bool) -> &'static str {
    if on { "on" } else { "off" }
}

pub fn number<S: Into<String>>(name: S, value: f64, observed_at: OffsetDateTime) -> Property {
    Property::new(name, PropertyValue::Number(value)).observed_at(observed_at)
}

pub fn boolean<S: Into<String>>(name: S, value: bool, observed_at: OffsetDateTime) -> Property {
    Property::new(name, PropertyValue::Boolean(value)).observed_at(observed_at)
}

pub fn text<S: Into<String>, V: Into<String>>(name: S, value: V) -> Property {
    Property::new(name, PropertyValue::Text(value.into()))
}

/// Alarm flag rendered as 1 or 0
pub fn flag<S: Into<String>>(name: S, raised: bool, observed_at: OffsetDateTime) -> Property {
    number(name, if raised { 1.0 } else { 0.0 }, observed_at)
}

pub fn status(on: bool, observed_at: OffsetDateTime) -> Property {
    text("status", status_value(on)).observed_at(observed_at)
}

pub fn date_time<S: Into<String>>(name: S, ts: OffsetDateTime) -> Property {
    Property::new(name, PropertyValue::DateTime(ts))
}

pub fn date_observed(ts: OffsetDateTime) -> Property {
    date_time("dateObserved", ts)
}

pub fn date_last_value_reported(ts: OffsetDateTime) -> Property {
    date_time("dateLastValueReported", ts)
}

pub fn location(latitude: f64, longitude: f64) -> Property {
    Property::new(
        "location",
        PropertyValue::GeoPoint {
            longitude,
            latitude,
        },
    )
}

pub fn relationship<S: Into<String>, T: Into<String>>(name: S, target: T) -> Property {
    Property::new(name, PropertyValue::Relationship(target.into()))
}

pub fn relationships<S: Into<String>>(name: S, targets: Vec<String>) -> Property {
    Property::new(name, PropertyValue::Relationships(targets))
}

/// Dataset id of one instance of a multi-valued relationship
///
/// The target's `urn:ngsi-ld:<Type>:` prefix is replaced, the rest of the id
/// is kept whole so distinct targets keep distinct dataset ids.
pub fn dataset_id(target: &str) -> String {
    let local = target
        .strip_prefix("urn:ngsi-ld:")
        .and_then(|rest| rest.split_once(':'))
        .map_or(target, |(_, local)| local);
    format!("urn:ngsi-ld:Dataset:{local}")
}

impl Serialize for PropertySet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.properties.len()))?;
        for property in &self.properties {
            map.serialize_entry(&property.name, &Descriptor(property))?;
        }
        map.end()
    }
}

struct Descriptor<'a>(&'a Property);

struct Timestamp<'a>(&'a OffsetDateTime);

struct Number(f64);

struct GeoJsonPoint {
    longitude: f64,
    latitude: f64,
}

struct DateTimeValue<'a>(&'a OffsetDateTime);

struct ObservedBy<'a>(&'a str);

struct RelationshipInstance<'a> {
    object: &'a str,
    dataset_id: Option<String>,
    observed_at: Option<&'a OffsetDateTime>,
}

impl Serialize for Timestamp<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let formatted = format_timestamp(self.0).map_err(S::Error::custom)?;
        serializer.serialize_str(&formatted)
    }
}

impl Serialize for Number {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        // Integral values are written without a fractional part
        if self.0.fract() == 0.0 && self.0.abs() < 9_007_199_254_740_992.0 {
            serializer.serialize_i64(self.0 as i64)
        } else {
            serializer.serialize_f64(self.0)
        }
    }
}

impl Serialize for GeoJsonPoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("type", "Point")?;
        map.serialize_entry("coordinates", &[self.longitude, self.latitude])?;
        map.end()
    }
}

impl Serialize for DateTimeValue<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("@type", "DateTime")?;
        map.serialize_entry("@value", &Timestamp(self.0))?;
        map.end()
    }
}

impl Serialize for ObservedBy<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("type", "Relationship")?;
        map.serialize_entry("object", self.0)?;
        map.end()
    }
}

impl Serialize for RelationshipInstance<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("type", "Relationship")?;
        map.serialize_entry("object", self.object)?;
        if let Some(dataset_id) = &self.dataset_id {
            map.serialize_entry("datasetId", dataset_id)?;
        }
        if let Some(ts) = self.observed_at {
            map.serialize_entry("observedAt", &Timestamp(ts))?;
        }
        map.end()
    }
}

impl Serialize for Descriptor<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let property = self.0;

        match &property.value {
            PropertyValue::Relationship(object) => {
                return RelationshipInstance {
                    object,
                    dataset_id: None,
                    observed_at: property.observed_at.as_ref(),
                }
                .serialize(serializer);
            }
            PropertyValue::Relationships(objects) => {
                let mut seq = serializer.serialize_seq(Some(objects.len()))?;
                for object in objects {
                    seq.serialize_element(&RelationshipInstance {
                        object,
                        dataset_id: Some(dataset_id(object)),
                        observed_at: property.observed_at.as_ref(),
                    })?;
                }
                return seq.end();
            }
            _ => {}
        }

        let mut map = serializer.serialize_map(None)?;
        match &property.value {
            PropertyValue::GeoPoint {
                longitude,
                latitude,
            } => {
                map.serialize_entry("type", "GeoProperty")?;
                map.serialize_entry(
                    "value",
                    &GeoJsonPoint {
                        longitude: *longitude,
                        latitude: *latitude,
                    },
                )?;
            }
            value => {
                map.serialize_entry("type", "Property")?;
                match value {
                    PropertyValue::Number(n) => map.serialize_entry("value", &Number(*n))?,
                    PropertyValue::Text(s) => map.serialize_entry("value", s)?,
                    PropertyValue::Boolean(b) => map.serialize_entry("value", b)?,
                    PropertyValue::DateTime(ts) => {
                        map.serialize_entry("value", &DateTimeValue(ts))?
                    }
                    _ => {}
                }
            }
        }
        if let Some(ts) = &property.observed_at {
            map.serialize_entry("observedAt", &Timestamp(ts))?;
        }
        if let Some(device) = &property.observed_by {
            map.serialize_entry("observedBy", &ObservedBy(device))?;
        }
        if let Some(unit) = &property.unit_code {
            map.serialize_entry("unitCode", unit)?;
        }
        map.end()
    }
}
