//! Measurement readings and their values

use serde::{Deserialize, Serialize};

/// A single reading in a measurement pack
///
/// Base fields (`bn`, `bt`, `bu`) are only meaningful on the first record of a
/// pack. A well-formed reading populates exactly one of `v`, `vs` or `vb`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Record {
    /// Base Name - device identity segment
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bn: Option<String>,

    /// Base Time - epoch seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bt: Option<f64>,

    /// Base Unit
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bu: Option<String>,

    /// Name - a resource id, `"0"` for the base-type marker
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n: Option<String>,

    /// Unit
    #[serde(skip_serializing_if = "Option::is_none")]
    pub u: Option<String>,

    /// Numeric value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub v: Option<f64>,

    /// String value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vs: Option<String>,

    /// Boolean value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vb: Option<bool>,

    /// Sum - integrated sum of values over time
    #[serde(rename = "s", alias = "sum", skip_serializing_if = "Option::is_none")]
    pub s: Option<f64>,

    /// Time - offset relative to base time, in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub t: Option<f64>,
}

/// The populated value slot of a reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    String(String),
    Boolean(bool),
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a reading with a numeric value
    pub fn with_value<S: Into<String>>(name: S, value: f64) -> Self {
        Self {
            n: Some(name.into()),
            v: Some(value),
            ..Default::default()
        }
    }

    /// Create a reading with a string value
    pub fn with_string_value<S: Into<String>, V: Into<String>>(name: S, value: V) -> Self {
        Self {
            n: Some(name.into()),
            vs: Some(value.into()),
            ..Default::default()
        }
    }

    /// Create a reading with a boolean value
    pub fn with_bool_value<S: Into<String>>(name: S, value: bool) -> Self {
        Self {
            n: Some(name.into()),
            vb: Some(value),
            ..Default::default()
        }
    }

    pub fn with_unit<S: Into<String>>(mut self, unit: S) -> Self {
        self.u = Some(unit.into());
        self
    }

    /// Set the time offset (seconds relative to the pack base time)
    pub fn with_time(mut self, time: f64) -> Self {
        self.t = Some(time);
        self
    }

    pub fn with_sum(mut self, sum: f64) -> Self {
        self.s = Some(sum);
        self
    }

    /// Name of this reading, if any
    pub fn name(&self) -> Option<&str> {
        self.n.as_deref()
    }

    /// Get the populated value of this reading
    pub fn value(&self) -> Option<Value> {
        if let Some(v) = self.v {
            Some(Value::Number(v))
        } else if let Some(ref vs) = self.vs {
            Some(Value::String(vs.clone()))
        } else {
            self.vb.map(Value::Boolean)
        }
    }

    /// Number of populated value slots
    pub fn value_count(&self) -> usize {
        usize::from(self.v.is_some()) + usize::from(self.vs.is_some()) + usize::from(self.vb.is_some())
    }

    pub fn has_value(&self) -> bool {
        self.value_count() > 0
    }

    /// Check the reading carries at most one value slot and only finite numbers
    pub fn validate(&self) -> crate::Result<()> {
        if self.value_count() > 1 {
            return Err(crate::SenMLError::validation(format!(
                "reading {:?} populates more than one value field",
                self.n.as_deref().unwrap_or_default()
            )));
        }

        for (field, value) in [("v", self.v), ("s", self.s), ("t", self.t), ("bt", self.bt)] {
            if let Some(value) = value {
                if !value.is_finite() {
                    return Err(crate::SenMLError::invalid_field_value(
                        field.to_string(),
                        value.to_string(),
                    ));
                }
            }
        }

        Ok(())
    }
}

impl From<Value> for Record {
    fn from(value: Value) -> Self {
        match value {
            Value::Number(n) => Self {
                v: Some(n),
                ..Default::default()
            },
            Value::String(s) => Self {
                vs: Some(s),
                ..Default::default()
            },
            Value::Boolean(b) => Self {
                vb: Some(b),
                ..Default::default()
            },
        }
    }
}
