//! # ctxbridge SenML - Measurement packs
//!
//! A subset of [RFC 8428](https://tools.ietf.org/html/rfc8428) Sensor Measurement Lists
//! tailored to normalized LwM2M device events.
//!
//! A pack is an ordered list of readings. The reading named `"0"` is the
//! *base-type marker*: its string value is the vocabulary URN (for example
//! `urn:oma:lwm2m:ext:3303`) that gives meaning to the resource ids of the
//! readings following it, up to the next marker.
//!
//! ## Quick Start
//!
//! ```rust
//! use ctxbridge_senml::{extract, PackBuilder};
//!
//! let pack = PackBuilder::new("urn:oma:lwm2m:ext:3303")
//!     .base_name("sensor-1/3303/")
//!     .base_time(1_714_557_600.0)
//!     .add_value("5700", 22.5)
//!     .build();
//!
//! let temperature: Option<f64> = extract::get(&pack, "urn:oma:lwm2m:ext:3303", "5700");
//! assert_eq!(temperature, Some(22.5));
//! ```
//!
//! ## Ordering
//!
//! Pack order is significant. When several readings share a resource id, the
//! first one is authoritative for [`extract::get`]; [`extract::get_all`] visits
//! every occurrence in order.

pub mod builder;
pub mod error;
pub mod extract;
pub mod pack;
pub mod record;

#[cfg(feature = "json")]
pub mod json;

#[cfg(feature = "cbor")]
pub mod cbor;

// Re-export main types
pub use builder::PackBuilder;
pub use error::{Result, SenMLError};
pub use extract::Extract;
pub use pack::Pack;
pub use record::{Record, Value};

/// Name of the reading that carries the vocabulary URN of a pack.
pub const BASE_TYPE_MARKER: &str = "0";

/// Name of the reading that carries the deployment environment (`indoors`, `soil`, ...).
pub const ENVIRONMENT: &str = "env";
