//! Context store backends and the merge-or-create upsert
//!
//! A [`ContextStore`] knows two operations: merging an attribute fragment
//! into an existing entity and creating a full entity. [`merge_or_create`]
//! combines them into an idempotent upsert. Replaying the same update any
//! number of times converges to the same attribute values.

use std::future::Future;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::entity::EntityUpdate;

pub mod http;
pub mod memory;

pub use http::HttpContextStore;
pub use memory::{MemContextStore, StoreCall};

/// Errors raised by a context store
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// The entity does not exist; consumed by [`merge_or_create`]
    #[error("entity not found: {0}")]
    NotFound(String),
    #[error("context broker rejected the request with status {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("request timed out")]
    Timeout,
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("failed to encode entity: {0}")]
    Encode(String),
    #[error("cancelled")]
    Cancelled,
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Encode(err.to_string())
    }
}

/// A remote (or local) store of context entities
#[async_trait]
pub trait ContextStore: Send + Sync {
    /// Merge `fragment` into the entity `entity_id`
    ///
    /// Must return [`StoreError::NotFound`] when the entity does not exist.
    async fn merge_entity(
        &self,
        tenant: &str,
        entity_id: &str,
        fragment: &Value,
    ) -> Result<(), StoreError>;

    /// Create `entity`, which carries its own `id` and `type`
    async fn create_entity(&self, tenant: &str, entity: &Value) -> Result<(), StoreError>;
}

/// Store that accepts every request and keeps nothing
#[async_trait]
impl ContextStore for () {
    async fn merge_entity(
        &self,
        _tenant: &str,
        _entity_id: &str,
        _fragment: &Value,
    ) -> Result<(), StoreError> {
        Ok(())
    }

    async fn create_entity(&self, _tenant: &str, _entity: &Value) -> Result<(), StoreError> {
        Ok(())
    }
}

/// How an upsert reached the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// The entity existed and was updated
    Merged,
    /// The entity did not exist and was created
    Created,
}

/// Merge `update` into its entity, creating the entity when it does not exist
///
/// Only a not-found merge falls back to create. Every other failure of either
/// step is returned as is; nothing is retried here. When `cancel` fires the
/// pending request is dropped and [`StoreError::Cancelled`] is returned.
pub async fn merge_or_create<C>(
    store: &C,
    tenant: &str,
    update: &EntityUpdate,
    cancel: &CancellationToken,
) -> Result<UpsertOutcome, StoreError>
where
    C: ContextStore + ?Sized,
{
    let fragment = update.fragment()?;

    match cancellable(cancel, store.merge_entity(tenant, &update.id, &fragment)).await {
        Ok(()) => Ok(UpsertOutcome::Merged),
        Err(StoreError::NotFound(_)) => {
            tracing::debug!(entity_id = %update.id, "entity not found, creating");

            let entity = update.entity()?;
            cancellable(cancel, store.create_entity(tenant, &entity)).await?;
            Ok(UpsertOutcome::Created)
        }
        Err(err) => Err(err),
    }
}

async fn cancellable<F>(cancel: &CancellationToken, request: F) -> Result<(), StoreError>
where
    F: Future<Output = Result<(), StoreError>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(StoreError::Cancelled),
        result = request => result,
    }
}
