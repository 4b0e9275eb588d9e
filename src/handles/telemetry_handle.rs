use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::{ApiError, RoomError};
use crate::repositories::RoomRepository;
use crate::services::{IngestService, SensorReading};

/// One batch of readings from a room controller: every sensor of the room in
/// a single request.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct DeviceReport {
    pub room_id: i64,
    pub room_name: String,
    pub sensors: Vec<SensorReading>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DeviceReportResponse {
    pub room_id: i64,
    pub room_name: String,
    pub processed_sensors: usize,
    pub success: bool,
    pub message: String,
}

#[derive(Clone)]
pub struct TelemetryState {
    pub room_repository: Arc<RoomRepository>,
    pub ingest_service: Arc<IngestService>,
}

// No bearer auth: controllers identify themselves by the exact
// (room_id, room_name) pair.
pub fn telemetry_router(state: TelemetryState) -> Router {
    Router::new()
        .route("/api/telemetry/readings", post(receive_readings))
        .with_state(state)
}

#[utoipa::path(
    post,
    path = "/api/telemetry/readings",
    tag = "telemetry",
    request_body = DeviceReport,
    responses(
        (status = 200, description = "Batch processed", body = DeviceReportResponse),
        (status = 404, description = "Room not found")
    )
)]
pub async fn receive_readings(
    State(state): State<TelemetryState>,
    Json(body): Json<DeviceReport>,
) -> Result<Json<DeviceReportResponse>, ApiError> {
    // The room must match by id and name together; otherwise nothing is
    // mutated.
    let room = state
        .room_repository
        .find_by_id_and_name(body.room_id, &body.room_name)
        .await?
        .ok_or(RoomError::RoomNotFound)?;

    let mut processed_sensors = 0;
    let mut errors: Vec<String> = Vec::new();

    let mut tx = state.room_repository.get_pool().begin().await?;

    for reading in &body.sensors {
        match state
            .ingest_service
            .apply_reading(&mut tx, &room, reading)
            .await
        {
            Ok(_) => {
                processed_sensors += 1;
                tracing::info!(
                    kind = %reading.kind,
                    sensor_number = reading.sensor_number,
                    room = %room.name,
                    "processed sensor reading"
                );
            }
            Err(e) => {
                let message = format!(
                    "Error processing sensor {} ({}): {}",
                    reading.sensor_number, reading.kind, e
                );
                tracing::error!("{message}");
                errors.push(message);
            }
        }
    }

    tx.commit().await?;

    let success = errors.is_empty();
    let message = if success {
        format!("Processed {processed_sensors} sensors")
    } else {
        format!("Processed {processed_sensors} sensors, errors: {}", errors.len())
    };

    Ok(Json(DeviceReportResponse {
        room_id: room.id,
        room_name: room.name,
        processed_sensors,
        success,
        message,
    }))
}
