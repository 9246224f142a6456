//! Bridge from normalized IoT records to an NGSI-LD context broker
//!
//! Inbound measurement records (carrying a SenML pack) and thing records are
//! classified by a [`Registry`], turned into [`EntityUpdate`]s by the matching
//! builder and published to a [`ContextStore`] with a merge-or-create upsert.
//! [`Dispatcher`] ties the steps together per message.

pub mod config;
pub mod dispatch;
pub mod entity;
pub mod lwm2m;
pub mod message;
pub mod property;
pub mod registry;
pub mod store;
pub mod transform;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::Config;
pub use dispatch::{DispatchError, DispatchOutcome, Dispatcher, DropReason};
pub use entity::EntityUpdate;
pub use message::{ContentFormat, DecodeError, InboundMessage, InboundRecord, MessageKind};
pub use property::{Property, PropertySet, PropertyValue};
pub use registry::Registry;
pub use store::{
    ContextStore, HttpContextStore, MemContextStore, StoreError, UpsertOutcome, merge_or_create,
};
pub use transform::{BuildOutcome, MeasurementTransformer, ThingTransformer};

pub use ctxbridge_senml as senml;
