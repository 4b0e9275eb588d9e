use axum::http::{Method, StatusCode};
use serde_json::{Value, json};

mod common;
use common::mock_app::MockApp;

/// Submit and approve one application, returning the provisioned room's id
/// and name.
async fn provision_room(app: &MockApp, sensor_type_ids: Value) -> (i64, String) {
    let (_, application) = app
        .send(
            Method::POST,
            "/api/applications",
            Some(&app.user_token),
            Some(json!({
                "rooms_config": [{ "room_type_id": 3, "sensor_type_ids": sensor_type_ids }]
            })),
        )
        .await;
    let application_id = application["id"].as_i64().unwrap();

    let (status, _) = app
        .send(
            Method::PUT,
            &format!("/api/applications/{application_id}"),
            Some(&app.admin_token),
            Some(json!({ "status": "approved" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, approved) = app
        .send(
            Method::GET,
            &format!("/api/applications/{application_id}"),
            Some(&app.user_token),
            None,
        )
        .await;
    let room_id = approved["created_room_ids"][0].as_i64().unwrap();

    let (_, room) = app
        .send(
            Method::GET,
            &format!("/api/rooms/{room_id}"),
            Some(&app.user_token),
            None,
        )
        .await;

    (room_id, room["name"].as_str().unwrap().to_string())
}

async fn room_sensors(app: &MockApp, room_id: i64) -> Value {
    let (status, sensors) = app
        .send(
            Method::GET,
            &format!("/api/sensors/room/{room_id}"),
            Some(&app.user_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    sensors
}

#[tokio::test]
async fn test_unknown_room_is_rejected() {
    let app = MockApp::new().await;

    let (status, _) = app
        .send(
            Method::POST,
            "/api/telemetry/readings",
            None,
            Some(json!({
                "room_id": 99,
                "room_name": "Кухня",
                "sensors": [{ "sensor_number": 1, "type": "temperature", "value": 21.0 }]
            })),
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_room_name_must_match_id() {
    let app = MockApp::new().await;
    let (room_id, _) = provision_room(&app, json!([1])).await;

    let (status, _) = app
        .send(
            Method::POST,
            "/api/telemetry/readings",
            None,
            Some(json!({
                "room_id": room_id,
                "room_name": "Спальня",
                "sensors": [{ "sensor_number": 1, "type": "temperature", "value": 21.0 }]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // The provisioned default survived untouched.
    let sensors = room_sensors(&app, room_id).await;
    assert_eq!(sensors["temperature_sensors"][0]["value"], json!(20.0));
}

#[tokio::test]
async fn test_readings_update_provisioned_sensors() {
    let app = MockApp::new().await;
    let (room_id, room_name) = provision_room(&app, json!([1, 2, 3])).await;

    let (status, report) = app
        .send(
            Method::POST,
            "/api/telemetry/readings",
            None,
            Some(json!({
                "room_id": room_id,
                "room_name": room_name,
                "sensors": [
                    { "sensor_number": 1, "type": "temperature", "value": 23.5 },
                    { "sensor_number": 1, "type": "light", "is_on": true },
                    { "sensor_number": 1, "type": "gas", "ppm": 850.0 }
                ]
            })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["processed_sensors"], json!(3));
    assert_eq!(report["success"], json!(true));

    let sensors = room_sensors(&app, room_id).await;
    assert_eq!(sensors["temperature_sensors"][0]["value"], json!(23.5));
    assert_eq!(sensors["light_sensors"][0]["is_on"], json!(true));
    assert_eq!(sensors["gas_sensors"][0]["ppm"], json!(850.0));
    assert_eq!(
        sensors["gas_sensors"][0]["status"],
        json!("рекомендованная концентрация")
    );

    // No duplicate (room, sensor_number) rows were created.
    assert_eq!(sensors["temperature_sensors"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_reading_for_new_number_creates_the_sensor() {
    let app = MockApp::new().await;
    let (room_id, room_name) = provision_room(&app, json!([1])).await;

    let (status, report) = app
        .send(
            Method::POST,
            "/api/telemetry/readings",
            None,
            Some(json!({
                "room_id": room_id,
                "room_name": room_name,
                "sensors": [{ "sensor_number": 5, "type": "temperature", "value": 19.0 }]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["success"], json!(true));

    let sensors = room_sensors(&app, room_id).await;
    let temperature = sensors["temperature_sensors"].as_array().unwrap();
    assert_eq!(temperature.len(), 2);
    assert_eq!(temperature[1]["sensor_number"], json!(5));
    assert_eq!(temperature[1]["value"], json!(19.0));
}

#[tokio::test]
async fn test_gas_status_follows_thresholds() {
    let app = MockApp::new().await;
    let (room_id, room_name) = provision_room(&app, json!([3])).await;

    for (ppm, expected) in [
        (400.0, "уличный воздух"),
        (1000.0, "рекомендованная концентрация"),
        (1500.0, "предельная концентрация"),
        (1501.0, "смертельная концентрация"),
    ] {
        let (status, _) = app
            .send(
                Method::POST,
                "/api/telemetry/readings",
                None,
                Some(json!({
                    "room_id": room_id,
                    "room_name": room_name,
                    "sensors": [{ "sensor_number": 1, "type": "gas", "ppm": ppm }]
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);

        let sensors = room_sensors(&app, room_id).await;
        assert_eq!(sensors["gas_sensors"][0]["status"], json!(expected));
    }
}

#[tokio::test]
async fn test_bad_entries_are_skipped_not_fatal() {
    let app = MockApp::new().await;
    let (room_id, room_name) = provision_room(&app, json!([1])).await;

    let (status, report) = app
        .send(
            Method::POST,
            "/api/telemetry/readings",
            None,
            Some(json!({
                "room_id": room_id,
                "room_name": room_name,
                "sensors": [
                    { "sensor_number": 1, "type": "temperature", "value": 25.0 },
                    { "sensor_number": 2, "type": "sound", "value": 1.0 },
                    { "sensor_number": 3, "type": "temperature" }
                ]
            })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["processed_sensors"], json!(1));
    assert_eq!(report["success"], json!(false));
    assert_eq!(report["message"], json!("Processed 1 sensors, errors: 2"));

    let sensors = room_sensors(&app, room_id).await;
    assert_eq!(sensors["temperature_sensors"][0]["value"], json!(25.0));
}
