//! Builder pattern for creating measurement packs

use crate::{Pack, Record, BASE_TYPE_MARKER};

/// Builder for creating packs with a fluent API
///
/// The first record of the built pack is always the base-type marker naming
/// the vocabulary URN, carrying the base name and base time if set.
#[derive(Debug)]
pub struct PackBuilder {
    urn: String,
    base_name: Option<String>,
    base_time: Option<f64>,
    base_unit: Option<String>,
    records: Vec<Record>,
}

impl PackBuilder {
    /// Create a builder for a pack of the given vocabulary URN
    pub fn new<S: Into<String>>(urn: S) -> Self {
        Self {
            urn: urn.into(),
            base_name: None,
            base_time: None,
            base_unit: None,
            records: Vec::new(),
        }
    }

    pub fn base_name<S: Into<String>>(mut self, name: S) -> Self {
        self.base_name = Some(name.into());
        self
    }

    /// Set the base time in epoch seconds
    pub fn base_time(mut self, time: f64) -> Self {
        self.base_time = Some(time);
        self
    }

    pub fn base_unit<S: Into<String>>(mut self, unit: S) -> Self {
        self.base_unit = Some(unit.into());
        self
    }

    pub fn add_value<S: Into<String>>(mut self, name: S, value: f64) -> Self {
        self.records.push(Record::with_value(name, value));
        self
    }

    pub fn add_string_value<S: Into<String>, V: Into<String>>(mut self, name: S, value: V) -> Self {
        self.records.push(Record::with_string_value(name, value));
        self
    }

    pub fn add_bool_value<S: Into<String>>(mut self, name: S, value: bool) -> Self {
        self.records.push(Record::with_bool_value(name, value));
        self
    }

    /// Add a numeric reading with a time offset relative to the base time
    pub fn add_measurement<S: Into<String>>(mut self, name: S, value: f64, time: f64) -> Self {
        self.records.push(Record::with_value(name, value).with_time(time));
        self
    }

    pub fn add_record(mut self, record: Record) -> Self {
        self.records.push(record);
        self
    }

    pub fn build(self) -> Pack {
        let marker = Record {
            bn: self.base_name,
            bt: self.base_time,
            bu: self.base_unit,
            ..Record::with_string_value(BASE_TYPE_MARKER, self.urn)
        };

        let mut records = Vec::with_capacity(self.records.len() + 1);
        records.push(marker);
        records.extend(self.records);

        Pack { records }
    }
}
