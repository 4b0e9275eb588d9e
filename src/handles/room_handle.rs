use std::str::FromStr;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Extension, Json, Router, middleware};
use serde::Serialize;
use utoipa::ToSchema;

use crate::errors::{ApiError, RoomError};
use crate::middlewares::{TokenState, auth};
use crate::models::{ApplicationStatus, Room, SensorKind};
use crate::repositories::{ApplicationRepository, RoomRepository, SensorRepository};
use crate::services::TokenClaims;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SensorCount {
    #[serde(rename = "type")]
    pub kind: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RoomSummary {
    pub id: i64,
    pub name: String,
    pub sensors: Vec<SensorCount>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SensorInfo {
    pub sensor_number: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub room_id: i64,
    pub room_name: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserRoomResponse {
    pub id: i64,
    pub name: String,
    pub sensors: Vec<SensorInfo>,
}

#[derive(Clone)]
pub struct RoomState {
    pub room_repository: Arc<RoomRepository>,
    pub sensor_repository: Arc<SensorRepository>,
    pub application_repository: Arc<ApplicationRepository>,
}

pub fn room_router(state: RoomState, token_state: TokenState) -> Router {
    Router::new()
        .route("/api/rooms", get(get_rooms))
        .route("/api/rooms/user", get(get_user_rooms))
        .route("/api/rooms/:room_id", get(get_room_by_id))
        .route_layer(middleware::from_fn_with_state(token_state, auth))
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/api/rooms",
    tag = "rooms",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "All rooms with per-kind sensor counts")
    )
)]
pub async fn get_rooms(
    State(state): State<RoomState>,
) -> Result<Json<Vec<RoomSummary>>, ApiError> {
    let rooms = state.room_repository.find_all().await?;

    let mut summaries = Vec::with_capacity(rooms.len());
    for room in rooms {
        let mut sensors = Vec::new();
        for kind in SensorKind::ALL {
            let count = state.sensor_repository.count_by_room(kind, room.id).await?;
            if count > 0 {
                sensors.push(SensorCount {
                    kind: kind.to_string(),
                    count,
                });
            }
        }

        summaries.push(RoomSummary {
            id: room.id,
            name: room.name,
            sensors,
        });
    }

    Ok(Json(summaries))
}

#[utoipa::path(
    get,
    path = "/api/rooms/user",
    tag = "rooms",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Rooms provisioned from the caller's approved applications")
    )
)]
pub async fn get_user_rooms(
    Extension(token_data): Extension<TokenClaims>,
    State(state): State<RoomState>,
) -> Result<Json<Vec<UserRoomResponse>>, ApiError> {
    let applications = state
        .application_repository
        .find_by_user(token_data.sub)
        .await?;

    let mut room_ids: Vec<i64> = Vec::new();
    for application in applications {
        if ApplicationStatus::from_str(&application.status) != Ok(ApplicationStatus::Approved) {
            continue;
        }
        if let Some(created_room_ids) = application.created_room_ids {
            for room_id in created_room_ids.0 {
                if !room_ids.contains(&room_id) {
                    room_ids.push(room_id);
                }
            }
        }
    }

    let mut responses = Vec::with_capacity(room_ids.len());
    for room in state.room_repository.find_by_ids(&room_ids).await? {
        let sensors = collect_sensor_infos(&state, &room).await?;

        responses.push(UserRoomResponse {
            id: room.id,
            name: room.name,
            sensors,
        });
    }

    Ok(Json(responses))
}

#[utoipa::path(
    get,
    path = "/api/rooms/{room_id}",
    tag = "rooms",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Room detail"),
        (status = 404, description = "Room not found")
    )
)]
pub async fn get_room_by_id(
    Path(room_id): Path<i64>,
    State(state): State<RoomState>,
) -> Result<Json<Room>, ApiError> {
    let room = state
        .room_repository
        .find_by_id(room_id)
        .await?
        .ok_or(RoomError::RoomNotFound)?;

    Ok(Json(room))
}

async fn collect_sensor_infos(state: &RoomState, room: &Room) -> Result<Vec<SensorInfo>, ApiError> {
    let info = |kind: SensorKind, sensor_number: i64| SensorInfo {
        sensor_number,
        kind: kind.to_string(),
        name: kind.display_name().to_string(),
        room_id: room.id,
        room_name: room.name.clone(),
    };

    let mut sensors = Vec::new();

    for sensor in state.sensor_repository.list_temperature(room.id).await? {
        sensors.push(info(SensorKind::Temperature, sensor.sensor_number));
    }
    for sensor in state.sensor_repository.list_light(room.id).await? {
        sensors.push(info(SensorKind::Light, sensor.sensor_number));
    }
    for sensor in state.sensor_repository.list_gas(room.id).await? {
        sensors.push(info(SensorKind::Gas, sensor.sensor_number));
    }
    for sensor in state.sensor_repository.list_humidity(room.id).await? {
        sensors.push(info(SensorKind::Humidity, sensor.sensor_number));
    }
    for sensor in state.sensor_repository.list_ventilation(room.id).await? {
        sensors.push(info(SensorKind::Ventilation, sensor.sensor_number));
    }
    for sensor in state.sensor_repository.list_motion(room.id).await? {
        sensors.push(info(SensorKind::Motion, sensor.sensor_number));
    }

    Ok(sensors)
}
