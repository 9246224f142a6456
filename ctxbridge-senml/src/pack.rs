//! Measurement pack - ordered collection of readings

use crate::{Record, Result, SenMLError, BASE_TYPE_MARKER, ENVIRONMENT};
use serde::{Deserialize, Serialize};

/// An ordered sequence of readings
///
/// The first record carries the base values (`bn`, `bt`) for the whole pack and,
/// for normalized device events, the base-type marker naming the vocabulary URN.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pack {
    pub records: Vec<Record>,
}

impl Pack {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    pub fn add_record(&mut self, record: Record) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.iter()
    }

    /// Base name of the pack (device identity segment)
    pub fn base_name(&self) -> Option<&str> {
        self.records.first().and_then(|r| r.bn.as_deref())
    }

    /// Base time of the pack in epoch seconds
    pub fn base_time(&self) -> Option<f64> {
        self.records.first().and_then(|r| r.bt)
    }

    /// Vocabulary URN carried by the first record
    pub fn base_type(&self) -> Option<&str> {
        self.records
            .first()
            .filter(|r| r.name() == Some(BASE_TYPE_MARKER))
            .and_then(|r| r.vs.as_deref())
    }

    /// True when any base-type marker in the pack names `urn`
    pub fn declares(&self, urn: &str) -> bool {
        self.records
            .iter()
            .any(|r| r.name() == Some(BASE_TYPE_MARKER) && r.vs.as_deref() == Some(urn))
    }

    /// Value of the first `env` reading
    pub fn environment(&self) -> Option<&str> {
        self.records
            .iter()
            .find(|r| r.name() == Some(ENVIRONMENT))
            .and_then(|r| r.vs.as_deref())
            .filter(|env| !env.is_empty())
    }

    /// Absolute time of a reading in epoch seconds, resolved against the base time
    pub fn resolved_time(&self, record: &Record) -> Option<f64> {
        match (self.base_time(), record.t) {
            (Some(bt), Some(t)) => Some(bt + t),
            (Some(bt), None) => Some(bt),
            (None, _) => None,
        }
    }

    /// Validate the pack structure
    pub fn validate(&self) -> Result<()> {
        if self.records.is_empty() {
            return Err(SenMLError::validation("pack cannot be empty"));
        }

        for (i, record) in self.records.iter().enumerate() {
            record
                .validate()
                .map_err(|e| SenMLError::validation(format!("invalid record at index {}: {}", i, e)))?;
        }

        Ok(())
    }
}

impl FromIterator<Record> for Pack {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Pack {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PackBuilder;

    #[test]
    fn test_empty_pack_is_invalid() {
        let pack = Pack::new();
        assert!(pack.is_empty());
        assert!(pack.validate().is_err());
    }

    #[test]
    fn test_base_values() {
        let pack = PackBuilder::new("urn:oma:lwm2m:ext:3303")
            .base_name("dev/3303/")
            .base_time(100.0)
            .add_value("5700", 20.0)
            .build();

        assert_eq!(pack.base_name(), Some("dev/3303/"));
        assert_eq!(pack.base_time(), Some(100.0));
        assert_eq!(pack.base_type(), Some("urn:oma:lwm2m:ext:3303"));
    }

    #[test]
    fn test_environment() {
        let pack = PackBuilder::new("urn:oma:lwm2m:ext:3303")
            .add_string_value("env", "indoors")
            .add_value("5700", 20.0)
            .build();
        assert_eq!(pack.environment(), Some("indoors"));

        let plain = PackBuilder::new("urn:oma:lwm2m:ext:3303").build();
        assert_eq!(plain.environment(), None);
    }

    #[test]
    fn test_resolved_time() {
        let pack = PackBuilder::new("urn:oma:lwm2m:ext:3424")
            .base_time(1000.0)
            .add_record(Record::with_value("1", 1.0).with_time(-60.0))
            .add_value("1", 2.0)
            .build();

        assert_eq!(pack.resolved_time(&pack.records[1]), Some(940.0));
        assert_eq!(pack.resolved_time(&pack.records[2]), Some(1000.0));
    }

    #[test]
    fn test_marker_must_be_first_for_base_type() {
        let pack: Pack = vec![
            Record::with_value("5700", 1.0),
            Record::with_string_value("0", "urn:oma:lwm2m:ext:3303"),
        ]
        .into_iter()
        .collect();

        assert_eq!(pack.base_type(), None);
        assert!(pack.declares("urn:oma:lwm2m:ext:3303"));
    }
}
