//! End-to-end dispatch against the in-memory context store

use std::sync::Arc;

use ctxbridge::{
    DispatchOutcome, Dispatcher, DropReason, InboundMessage, MemContextStore, MessageKind,
    Registry, StoreError,
    lwm2m,
    store::StoreCall,
    test_utils::{measurement, measurement_at, measurement_message, thing, thing_message},
};
use ctxbridge_senml::{PackBuilder, Record};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

fn dispatcher() -> Dispatcher<MemContextStore> {
    Dispatcher::new(
        Arc::new(Registry::with_defaults()),
        Arc::new(MemContextStore::new()),
    )
}

async fn dispatch(dispatcher: &Dispatcher<MemContextStore>, message: &InboundMessage) -> DispatchOutcome {
    dispatcher
        .dispatch(message, &CancellationToken::new())
        .await
        .expect("dispatch should succeed")
}

#[tokio::test]
async fn test_first_reading_wins() {
    let dispatcher = dispatcher();
    let record = measurement(
        "temp-1",
        PackBuilder::new(lwm2m::TEMPERATURE)
            .add_value("5700", 21.5)
            .add_value("5700", 99.0)
            .build(),
    );

    dispatch(&dispatcher, &measurement_message(&record)).await;

    let entity = dispatcher
        .store()
        .entity("default", "urn:ngsi-ld:WeatherObserved:temp-1")
        .await
        .unwrap();
    assert_eq!(entity["temperature"]["value"], json!(21.5));
}

#[tokio::test]
async fn test_redelivery_is_idempotent() {
    let dispatcher = dispatcher();
    let record = measurement_at(
        "pir-1",
        PackBuilder::new(lwm2m::PRESENCE)
            .add_bool_value("5500", true)
            .build(),
        62.0,
        17.0,
    );
    let message = measurement_message(&record);

    let first = dispatch(&dispatcher, &message).await;
    let after_first = dispatcher
        .store()
        .entity("default", "urn:ngsi-ld:Device:pir-1")
        .await;
    let second = dispatch(&dispatcher, &message).await;
    let after_second = dispatcher
        .store()
        .entity("default", "urn:ngsi-ld:Device:pir-1")
        .await;

    assert_eq!(first, DispatchOutcome::Upserted { created: 1, merged: 0 });
    assert_eq!(second, DispatchOutcome::Upserted { created: 0, merged: 1 });
    assert_eq!(after_first, after_second);

    let id = "urn:ngsi-ld:Device:pir-1".to_string();
    let tenant = "default".to_string();
    assert_eq!(
        dispatcher.store().journal().await,
        vec![
            StoreCall::Merge { tenant: tenant.clone(), entity_id: id.clone() },
            StoreCall::Create { tenant: tenant.clone(), entity_id: id.clone() },
            StoreCall::Merge { tenant, entity_id: id },
        ]
    );
}

#[tokio::test]
async fn test_two_volume_readings_two_upserts() {
    let dispatcher = dispatcher();
    let record = measurement(
        "meter-1",
        PackBuilder::new(lwm2m::WATER_METER)
            .base_time(1_714_557_600.0)
            .add_measurement("1", 11.899, -60.0)
            .add_measurement("1", 11.950, 0.0)
            .build(),
    );

    let outcome = dispatch(&dispatcher, &measurement_message(&record)).await;
    assert_eq!(outcome, DispatchOutcome::Upserted { created: 1, merged: 1 });
    assert_eq!(dispatcher.store().journal().await.len(), 3);

    let entity = dispatcher
        .store()
        .entity("default", "urn:ngsi-ld:WaterConsumptionObserved:meter-1")
        .await
        .unwrap();
    assert_eq!(entity["waterConsumption"]["value"], json!(11950));
    assert_eq!(entity["waterConsumption"]["observedAt"], "2024-05-01T10:00:00Z");
    assert_eq!(entity["alarmStopsLeaks"]["value"], json!(0));
    assert_eq!(entity["alarmBackflow"]["value"], json!(0));
}

#[tokio::test]
async fn test_device_without_presence_declines() {
    let dispatcher = dispatcher();
    let record = measurement_at(
        "pir-1",
        PackBuilder::new(lwm2m::PRESENCE)
            .add_value("5700", 1.0)
            .add_string_value("5750", "hallway")
            .build(),
        62.0,
        17.0,
    );

    let outcome = dispatch(&dispatcher, &measurement_message(&record)).await;

    assert!(matches!(outcome, DispatchOutcome::Dropped(DropReason::Declined(_))));
    assert!(dispatcher.store().journal().await.is_empty());
}

#[tokio::test]
async fn test_pack_without_marker_is_unclassified() {
    let dispatcher = dispatcher();
    let pack = [Record::with_bool_value("5500", true)].into_iter().collect();
    let record = measurement("pir-1", pack);

    let outcome = dispatch(&dispatcher, &measurement_message(&record)).await;

    assert_eq!(
        outcome,
        DispatchOutcome::Dropped(DropReason::ClassificationMiss { key: None })
    );
    assert!(dispatcher.store().journal().await.is_empty());
}

#[tokio::test]
async fn test_container_end_to_end() {
    let dispatcher = dispatcher();
    let record = thing(json!({
        "id": "container-1",
        "type": "Container",
        "name": "Soptunna 1",
        "alternativeName": "Soptunnor.XY",
        "location": {"latitude": 62, "longitude": 17},
        "observedAt": "2024-05-01T09:58:00Z",
        "percent": 56
    }));

    let outcome = dispatch(&dispatcher, &thing_message(&record)).await;
    assert_eq!(outcome, DispatchOutcome::Upserted { created: 1, merged: 0 });

    let entity = dispatcher
        .store()
        .entity("default", "urn:ngsi-ld:WasteContainer:Soptunnor.XY")
        .await
        .unwrap();
    assert_eq!(entity["type"], "WasteContainer");
    assert_eq!(entity["fillingLevel"]["value"], json!(56));
    assert_eq!(entity["fillingLevel"]["unitCode"], "P1");

    let coordinates: Vec<f64> = entity["location"]["value"]["coordinates"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(Value::as_f64)
        .collect();
    assert_eq!(coordinates, vec![17.0, 62.0]);
}

#[tokio::test]
async fn test_sewer_with_two_devices() {
    let dispatcher = dispatcher();
    let record = thing(json!({
        "id": "sewer-1",
        "type": "Sewer",
        "name": "Brunn 12",
        "currentLevel": 0.8,
        "refDevices": [{"deviceID": "level-a"}, {"deviceID": "level-b"}]
    }));

    dispatch(&dispatcher, &thing_message(&record)).await;

    let entity = dispatcher
        .store()
        .entity("default", "urn:ngsi-ld:Sewer:Brunn-12")
        .await
        .unwrap();

    assert_eq!(entity["source"]["value"], "urn:ngsi-ld:Device:level-a");
    let objects: Vec<&str> = entity["refDevice"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|r| r["object"].as_str())
        .collect();
    assert_eq!(
        objects,
        vec!["urn:ngsi-ld:Device:level-a", "urn:ngsi-ld:Device:level-b"]
    );
    assert_eq!(entity["refDevice"][1]["datasetId"], "urn:ngsi-ld:Dataset:level-b");
}

#[tokio::test]
async fn test_upsert_failure_is_surfaced() {
    let dispatcher = dispatcher();
    dispatcher
        .store()
        .fail_with(Some(StoreError::Rejected {
            status: 500,
            body: "internal error".into(),
        }))
        .await;

    let record = measurement(
        "temp-1",
        PackBuilder::new(lwm2m::TEMPERATURE)
            .add_value("5700", 21.5)
            .build(),
    );

    let err = dispatcher
        .dispatch(&measurement_message(&record), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(!err.is_cancelled());
    assert!(err.to_string().contains("urn:ngsi-ld:WeatherObserved:temp-1"));
}

#[tokio::test]
async fn test_cancelled_upsert() {
    let dispatcher = dispatcher();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let record = measurement(
        "temp-1",
        PackBuilder::new(lwm2m::TEMPERATURE)
            .add_value("5700", 21.5)
            .build(),
    );

    let err = dispatcher
        .dispatch(&measurement_message(&record), &cancel)
        .await
        .unwrap_err();

    assert!(err.is_cancelled());
    assert_eq!(dispatcher.store().entity_count().await, 0);
}

#[tokio::test]
async fn test_cbor_measurement() {
    let dispatcher = dispatcher();
    let record = measurement(
        "soil-1",
        PackBuilder::new(lwm2m::PRESSURE)
            .add_value("5700", 12000.0)
            .add_string_value("env", "soil")
            .build(),
    );

    let mut body = Vec::new();
    ciborium::ser::into_writer(&record, &mut body).unwrap();
    let message = InboundMessage::cbor(MessageKind::Measurement, body);

    let outcome = dispatch(&dispatcher, &message).await;
    assert_eq!(outcome.upserted(), 1);

    let entity = dispatcher
        .store()
        .entity("default", "urn:ngsi-ld:GreenspaceRecord:soil-1")
        .await
        .unwrap();
    assert_eq!(entity["soilMoisturePressure"]["value"], json!(12));
    assert_eq!(entity["soilMoisturePressure"]["unitCode"], "KPA");
}

#[tokio::test]
async fn test_unknown_thing_type_is_dropped() {
    let dispatcher = dispatcher();
    let record = thing(json!({"id": "x", "type": "Bench", "name": "Bench 1"}));

    let outcome = dispatch(&dispatcher, &thing_message(&record)).await;

    assert_eq!(
        outcome,
        DispatchOutcome::Dropped(DropReason::ClassificationMiss {
            key: Some("Bench".into())
        })
    );
}

#[tokio::test]
async fn test_unrepresentable_base_time_is_dropped() {
    let dispatcher = dispatcher();

    for bt in [1e30, -1e11] {
        let record = measurement(
            "temp-1",
            PackBuilder::new(lwm2m::TEMPERATURE)
                .base_time(bt)
                .add_value("5700", 21.5)
                .build(),
        );

        let outcome = dispatch(&dispatcher, &measurement_message(&record)).await;

        assert!(
            matches!(outcome, DispatchOutcome::Dropped(DropReason::Decode(_))),
            "bt = {bt}: {outcome:?}"
        );
    }
    assert!(dispatcher.store().journal().await.is_empty());
}
