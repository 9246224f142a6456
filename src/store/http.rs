//! NGSI-LD context broker over HTTP

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url, header::CONTENT_TYPE};
use serde_json::Value;

use super::{ContextStore, StoreError};
use crate::config::Config;

/// Header selecting the tenant on the broker
pub const TENANT_HEADER: &str = "NGSILD-Tenant";

const LD_JSON: &str = "application/ld+json";

#[derive(Clone, Debug)]
pub struct HttpContextStore {
    client: Client,
    base_url: Url,
}

impl HttpContextStore {
    pub fn new(config: &Config) -> Result<Self, StoreError> {
        let base_url = Url::parse(&config.broker_url)
            .map_err(|e| StoreError::InvalidRequest(format!("broker url: {e}")))?;

        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: Url) -> Self {
        Self { client, base_url }
    }

    /// `{base}/ngsi-ld/v1/entities/{id}`, or with a trailing slash when `id` is `None`
    fn entities_url(&self, entity_id: Option<&str>) -> Result<Url, StoreError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| StoreError::InvalidRequest("broker url cannot be a base".into()))?;
            segments
                .pop_if_empty()
                .extend(["ngsi-ld", "v1", "entities"])
                .push(entity_id.unwrap_or(""));
        }
        Ok(url)
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        tenant: &str,
        body: &Value,
    ) -> Result<reqwest::Response, StoreError> {
        let mut request = request
            .header(CONTENT_TYPE, LD_JSON)
            .body(serde_json::to_vec(body)?);
        if !tenant.is_empty() {
            request = request.header(TENANT_HEADER, tenant);
        }

        request.send().await.map_err(transport_error)
    }
}

fn transport_error(err: reqwest::Error) -> StoreError {
    if err.is_timeout() {
        StoreError::Timeout
    } else {
        StoreError::Transport(err.to_string())
    }
}

async fn rejected(response: reqwest::Response) -> StoreError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    StoreError::Rejected { status, body }
}

#[async_trait]
impl ContextStore for HttpContextStore {
    async fn merge_entity(
        &self,
        tenant: &str,
        entity_id: &str,
        fragment: &Value,
    ) -> Result<(), StoreError> {
        let url = self.entities_url(Some(entity_id))?;
        let response = self.send(self.client.patch(url), tenant, fragment).await?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Err(StoreError::NotFound(entity_id.to_string())),
            _ => Err(rejected(response).await),
        }
    }

    async fn create_entity(&self, tenant: &str, entity: &Value) -> Result<(), StoreError> {
        let url = self.entities_url(None)?;
        let response = self.send(self.client.post(url), tenant, entity).await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(rejected(response).await)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(base: &str) -> HttpContextStore {
        HttpContextStore::with_client(Client::new(), Url::parse(base).unwrap())
    }

    #[test]
    fn test_entities_url() {
        let store = store("http://broker:8080");
        assert_eq!(
            store
                .entities_url(Some("urn:ngsi-ld:Device:abc"))
                .unwrap()
                .as_str(),
            "http://broker:8080/ngsi-ld/v1/entities/urn:ngsi-ld:Device:abc"
        );
        assert_eq!(
            store.entities_url(None).unwrap().as_str(),
            "http://broker:8080/ngsi-ld/v1/entities/"
        );
    }

    #[test]
    fn test_entities_url_keeps_prefix() {
        let store = store("http://broker:8080/context/");
        assert_eq!(
            store.entities_url(None).unwrap().as_str(),
            "http://broker:8080/context/ngsi-ld/v1/entities/"
        );
    }

    #[test]
    fn test_entity_id_is_one_segment() {
        let store = store("http://broker");
        assert_eq!(
            store.entities_url(Some("a/b c")).unwrap().as_str(),
            "http://broker/ngsi-ld/v1/entities/a%2Fb%20c"
        );
    }
}
