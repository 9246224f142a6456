use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use super::{ContextStore, StoreError};

/// A request received by a [`MemContextStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Merge { tenant: String, entity_id: String },
    Create { tenant: String, entity_id: String },
}

/// A memory-based context store, keyed by tenant and entity id.
///
/// Merges replace attributes one by one, like a broker applying a partial
/// update. Every request is recorded in a journal, including failed ones.
#[derive(Clone, Debug, Default)]
pub struct MemContextStore {
    entities: Arc<RwLock<HashMap<(String, String), Map<String, Value>>>>,
    journal: Arc<RwLock<Vec<StoreCall>>>,
    failure: Arc<RwLock<Option<StoreError>>>,
}

impl MemContextStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every following request with `error`, or stop failing with `None`
    pub async fn fail_with(&self, error: Option<StoreError>) {
        *self.failure.write().await = error;
    }

    /// Current state of an entity, without its `@context`
    pub async fn entity(&self, tenant: &str, entity_id: &str) -> Option<Value> {
        self.entities
            .read()
            .await
            .get(&(tenant.to_string(), entity_id.to_string()))
            .cloned()
            .map(Value::Object)
    }

    pub async fn entity_count(&self) -> usize {
        self.entities.read().await.len()
    }

    pub async fn journal(&self) -> Vec<StoreCall> {
        self.journal.read().await.clone()
    }

    async fn injected_failure(&self) -> Result<(), StoreError> {
        match self.failure.read().await.clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

fn attributes(body: &Value) -> Result<impl Iterator<Item = (&String, &Value)>, StoreError> {
    match body {
        Value::Object(map) => Ok(map.iter().filter(|(k, _)| k.as_str() != "@context")),
        _ => Err(StoreError::InvalidRequest("body is not a JSON object".into())),
    }
}

#[async_trait]
impl ContextStore for MemContextStore {
    async fn merge_entity(
        &self,
        tenant: &str,
        entity_id: &str,
        fragment: &Value,
    ) -> Result<(), StoreError> {
        self.journal.write().await.push(StoreCall::Merge {
            tenant: tenant.to_string(),
            entity_id: entity_id.to_string(),
        });
        self.injected_failure().await?;

        let mut entities = self.entities.write().await;
        let entity = entities
            .get_mut(&(tenant.to_string(), entity_id.to_string()))
            .ok_or_else(|| StoreError::NotFound(entity_id.to_string()))?;

        for (name, value) in attributes(fragment)? {
            entity.insert(name.clone(), value.clone());
        }

        tracing::trace!(tenant, entity_id, "merged entity");
        Ok(())
    }

    async fn create_entity(&self, tenant: &str, entity: &Value) -> Result<(), StoreError> {
        let entity_id = entity
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| StoreError::InvalidRequest("entity has no id".into()))?
            .to_string();

        self.journal.write().await.push(StoreCall::Create {
            tenant: tenant.to_string(),
            entity_id: entity_id.clone(),
        });
        self.injected_failure().await?;

        let key = (tenant.to_string(), entity_id);
        let mut entities = self.entities.write().await;
        if entities.contains_key(&key) {
            return Err(StoreError::Rejected {
                status: 409,
                body: format!("entity {} already exists", key.1),
            });
        }

        let attributes = attributes(entity)?
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        entities.insert(key, attributes);

        Ok(())
    }
}
