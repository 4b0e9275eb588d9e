use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router, middleware};
use serde::Serialize;

use crate::errors::{ApiError, RoomError};
use crate::middlewares::{TokenState, auth};
use crate::models::sensor::{
    GasSensor, HumiditySensor, LightSensor, MotionSensor, TemperatureSensor, VentilationSensor,
};
use crate::repositories::{RoomRepository, SensorRepository};

#[derive(Debug, Clone, Serialize)]
pub struct RoomSensorsResponse {
    pub room_id: i64,
    pub room_name: String,
    pub temperature_sensors: Vec<TemperatureSensor>,
    pub light_sensors: Vec<LightSensor>,
    pub gas_sensors: Vec<GasSensor>,
    pub humidity_sensors: Vec<HumiditySensor>,
    pub ventilation_sensors: Vec<VentilationSensor>,
    pub motion_sensors: Vec<MotionSensor>,
}

#[derive(Clone)]
pub struct SensorState {
    pub room_repository: Arc<RoomRepository>,
    pub sensor_repository: Arc<SensorRepository>,
}

pub fn sensor_router(state: SensorState, token_state: TokenState) -> Router {
    Router::new()
        .route("/api/sensors/room/:room_id", get(get_room_sensors))
        .route_layer(middleware::from_fn_with_state(token_state, auth))
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/api/sensors/room/{room_id}",
    tag = "sensors",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Every sensor in the room, grouped by kind"),
        (status = 404, description = "Room not found")
    )
)]
pub async fn get_room_sensors(
    Path(room_id): Path<i64>,
    State(state): State<SensorState>,
) -> Result<Json<RoomSensorsResponse>, ApiError> {
    let room = state
        .room_repository
        .find_by_id(room_id)
        .await?
        .ok_or(RoomError::RoomNotFound)?;

    Ok(Json(RoomSensorsResponse {
        room_id: room.id,
        room_name: room.name,
        temperature_sensors: state.sensor_repository.list_temperature(room_id).await?,
        light_sensors: state.sensor_repository.list_light(room_id).await?,
        gas_sensors: state.sensor_repository.list_gas(room_id).await?,
        humidity_sensors: state.sensor_repository.list_humidity(room_id).await?,
        ventilation_sensors: state.sensor_repository.list_ventilation(room_id).await?,
        motion_sensors: state.sensor_repository.list_motion(room_id).await?,
    }))
}
