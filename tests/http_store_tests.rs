//! Merge-or-create against a mocked NGSI-LD broker

use std::time::Duration;

use ctxbridge::{
    Config, ContextStore, EntityUpdate, HttpContextStore, StoreError, UpsertOutcome,
    merge_or_create, property,
    property::PropertySet,
};
use serde_json::json;
use time::macros::datetime;
use tokio_util::sync::CancellationToken;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_partial_json, header, method, path},
};

const ENTITY_ID: &str = "urn:ngsi-ld:Lifebuoy:lb-1";

fn store(server: &MockServer) -> HttpContextStore {
    HttpContextStore::new(&Config {
        broker_url: server.uri(),
        request_timeout: Duration::from_millis(500),
        ..Default::default()
    })
    .unwrap()
}

fn update() -> EntityUpdate {
    let ts = datetime!(2024-05-01 10:00 UTC);
    EntityUpdate::new(
        ENTITY_ID,
        "Lifebuoy",
        PropertySet::new()
            .with(property::status(true, ts))
            .with(property::date_last_value_reported(ts)),
    )
}

#[tokio::test]
async fn test_merge_existing_entity() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path(format!("/ngsi-ld/v1/entities/{ENTITY_ID}")))
        .and(header("NGSILD-Tenant", "default"))
        .and(header("content-type", "application/ld+json"))
        .and(body_partial_json(json!({"status": {"type": "Property", "value": "on"}})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = merge_or_create(&store(&server), "default", &update(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome, UpsertOutcome::Merged);
}

#[tokio::test]
async fn test_create_after_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path(format!("/ngsi-ld/v1/entities/{ENTITY_ID}")))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "type": "https://uri.etsi.org/ngsi-ld/errors/ResourceNotFound"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/ngsi-ld/v1/entities/"))
        .and(header("NGSILD-Tenant", "default"))
        .and(body_partial_json(json!({
            "id": ENTITY_ID,
            "type": "Lifebuoy",
            "@context": ["https://uri.etsi.org/ngsi-ld/v1/ngsi-ld-core-context.jsonld"],
            "dateLastValueReported": {
                "type": "Property",
                "value": {"@type": "DateTime", "@value": "2024-05-01T10:00:00Z"}
            }
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = merge_or_create(&store(&server), "default", &update(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome, UpsertOutcome::Created);
}

#[tokio::test]
async fn test_server_error_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(400).set_body_string("invalid fragment"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let err = merge_or_create(&store(&server), "default", &update(), &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(
        err,
        StoreError::Rejected {
            status: 400,
            body: "invalid fragment".into()
        }
    );
}

#[tokio::test]
async fn test_create_conflict_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(409))
        .mount(&server)
        .await;

    let err = merge_or_create(&store(&server), "default", &update(), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, StoreError::Rejected { status: 409, .. }));
}

#[tokio::test]
async fn test_slow_broker_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(204).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let err = store(&server)
        .merge_entity("default", ENTITY_ID, &json!({}))
        .await
        .unwrap_err();

    assert_eq!(err, StoreError::Timeout);
}

#[tokio::test]
async fn test_cancellation_aborts_request() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(204).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let store = HttpContextStore::new(&Config {
        broker_url: server.uri(),
        ..Default::default()
    })
    .unwrap();
    let cancel = CancellationToken::new();
    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceller.cancel();
    });

    let err = merge_or_create(&store, "default", &update(), &cancel)
        .await
        .unwrap_err();

    assert_eq!(err, StoreError::Cancelled);
}
