//! Per-message dispatch: decode, classify, build, upsert
//!
//! Decode failures, unclassified records and records a builder declines or
//! fails on are dropped and logged; [`Dispatcher::dispatch`] reports them as
//! [`DispatchOutcome::Dropped`]. Only upsert failures are returned as errors,
//! leaving the redelivery decision to the caller.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use thiserror::Error;
use time::OffsetDateTime;
use tokio_util::sync::CancellationToken;
use tower::Service;

use crate::entity::EntityUpdate;
use crate::message::{InboundMessage, InboundRecord};
use crate::registry::Registry;
use crate::store::{ContextStore, StoreError, UpsertOutcome, merge_or_create};
use crate::transform::BuildOutcome;

/// Source of the processing time handed to builders
pub type Clock = Arc<dyn Fn() -> OffsetDateTime + Send + Sync>;

/// Why a message produced no upsert
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    /// The payload could not be decoded into a record
    Decode(String),
    /// No builder is registered for the record; `None` when the record has no key at all
    ClassificationMiss { key: Option<String> },
    /// The builder found too little data
    Declined(String),
    /// The builder could not identify the entity
    BuildFailed(String),
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropReason::Decode(err) => write!(f, "undecodable message: {err}"),
            DropReason::ClassificationMiss { key: Some(key) } => {
                write!(f, "no builder registered for {key}")
            }
            DropReason::ClassificationMiss { key: None } => write!(f, "record has no type"),
            DropReason::Declined(reason) => write!(f, "declined: {reason}"),
            DropReason::BuildFailed(reason) => write!(f, "build failed: {reason}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Every update reached the store
    Upserted { created: usize, merged: usize },
    Dropped(DropReason),
}

impl DispatchOutcome {
    pub fn upserted(&self) -> usize {
        match self {
            DispatchOutcome::Upserted { created, merged } => created + merged,
            DispatchOutcome::Dropped(_) => 0,
        }
    }
}

/// An upsert that did not complete
///
/// Updates before `entity_id` in the same message have been applied; the
/// remaining ones were not attempted.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DispatchError {
    #[error("upsert of {entity_id} failed: {source}")]
    Upsert {
        entity_id: String,
        #[source]
        source: StoreError,
    },
    #[error("upsert of {entity_id} cancelled")]
    Cancelled { entity_id: String },
}

impl DispatchError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DispatchError::Cancelled { .. })
    }
}

pub struct Dispatcher<C: ?Sized> {
    registry: Arc<Registry>,
    store: Arc<C>,
    shutdown: CancellationToken,
    clock: Clock,
}

impl<C: ?Sized> Clone for Dispatcher<C> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
            store: self.store.clone(),
            shutdown: self.shutdown.clone(),
            clock: self.clock.clone(),
        }
    }
}

impl<C> Dispatcher<C>
where
    C: ContextStore + ?Sized + 'static,
{
    pub fn new(registry: Arc<Registry>, store: Arc<C>) -> Self {
        Self {
            registry,
            store,
            shutdown: CancellationToken::new(),
            clock: Arc::new(OffsetDateTime::now_utc),
        }
    }

    /// Replace the processing time source
    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> OffsetDateTime + Send + Sync + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }

    /// Token cancelling upserts started through the [`Service`] interface
    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn store(&self) -> &Arc<C> {
        &self.store
    }

    /// Process one message, upserting every update its builder produces in order
    ///
    /// The first failed upsert stops the message.
    pub async fn dispatch(
        &self,
        message: &InboundMessage,
        cancel: &CancellationToken,
    ) -> Result<DispatchOutcome, DispatchError> {
        let record = match message.decode() {
            Ok(record) => record,
            Err(err) => {
                tracing::warn!(kind = ?message.kind, error = %err, "dropping undecodable message");
                return Ok(DispatchOutcome::Dropped(DropReason::Decode(err.to_string())));
            }
        };

        let tenant = record.tenant().to_string();
        let updates = match self.build(&record) {
            Ok(updates) => updates,
            Err(reason) => {
                tracing::info!(tenant = %tenant, reason = %reason, "dropping record");
                return Ok(DispatchOutcome::Dropped(reason));
            }
        };

        let mut created = 0;
        let mut merged = 0;

        for update in &updates {
            match merge_or_create(self.store.as_ref(), &tenant, update, cancel).await {
                Ok(UpsertOutcome::Created) => created += 1,
                Ok(UpsertOutcome::Merged) => merged += 1,
                Err(StoreError::Cancelled) => {
                    tracing::warn!(tenant = %tenant, entity_id = %update.id, "upsert cancelled");
                    return Err(DispatchError::Cancelled {
                        entity_id: update.id.clone(),
                    });
                }
                Err(source) => {
                    tracing::error!(tenant = %tenant, entity_id = %update.id, error = %source, "upsert failed");
                    return Err(DispatchError::Upsert {
                        entity_id: update.id.clone(),
                        source,
                    });
                }
            }
            tracing::debug!(tenant = %tenant, entity_id = %update.id, "entity upserted");
        }

        Ok(DispatchOutcome::Upserted { created, merged })
    }

    /// Classify a record and run its builder
    pub fn build(&self, record: &InboundRecord) -> Result<Vec<EntityUpdate>, DropReason> {
        let outcome = match record {
            InboundRecord::Measurement(measurement) => {
                let Some(key) = measurement.classification_key() else {
                    return Err(DropReason::ClassificationMiss { key: None });
                };
                let Some(transformer) = self.registry.lookup_measurement(&key) else {
                    return Err(DropReason::ClassificationMiss { key: Some(key) });
                };
                tracing::trace!(sensor = %measurement.sensor, key = %key, ?transformer, "classified measurement");
                transformer.build(measurement)
            }
            InboundRecord::Thing(thing) => {
                let key = thing.classification_key();
                if key.is_empty() {
                    return Err(DropReason::ClassificationMiss { key: None });
                }
                let Some(transformer) = self.registry.lookup_thing(key) else {
                    return Err(DropReason::ClassificationMiss {
                        key: Some(key.to_string()),
                    });
                };
                tracing::trace!(thing = %thing.id, key = %key, ?transformer, "classified thing");
                transformer.build(thing, (self.clock)())
            }
        };

        match outcome {
            BuildOutcome::Built(updates) => Ok(updates),
            BuildOutcome::Declined(reason) => Err(DropReason::Declined(reason)),
            BuildOutcome::Failed(reason) => Err(DropReason::BuildFailed(reason)),
        }
    }
}

impl<C> Service<InboundMessage> for Dispatcher<C>
where
    C: ContextStore + ?Sized + 'static,
{
    type Response = DispatchOutcome;
    type Error = DispatchError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        // No back-pressure of its own; concurrency is bounded by the caller
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, message: InboundMessage) -> Self::Future {
        let dispatcher = self.clone();

        Box::pin(async move {
            let cancel = dispatcher.shutdown.clone();
            dispatcher.dispatch(&message, &cancel).await
        })
    }
}
