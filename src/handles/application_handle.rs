use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Extension, Json, Router, middleware};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::{ApiError, ApplicationError, AuthError};
use crate::middlewares::{TokenState, auth};
use crate::models::{ApplicationStatus, ApplicationView, Dictionaries, Role, RoomConfig};
use crate::repositories::{ApplicationRepository, UserRepository};
use crate::services::{ProvisionService, TokenClaims};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ApplicationCreateRequest {
    pub rooms_config: Vec<RoomConfig>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ApplicationDecisionRequest {
    /// "approved" or "rejected".
    pub status: String,
    pub rejection_comment: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DecisionResponse {
    pub message: String,
    pub rejection_comment: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DictionariesResponse {
    pub rooms: BTreeMap<i64, String>,
    pub sensors: BTreeMap<i64, String>,
}

#[derive(Clone)]
pub struct ApplicationState {
    pub dictionaries: Arc<Dictionaries>,
    pub application_repository: Arc<ApplicationRepository>,
    pub user_repository: Arc<UserRepository>,
    pub provision_service: Arc<ProvisionService>,
}

pub fn application_router(state: ApplicationState, token_state: TokenState) -> Router {
    let protected = Router::new()
        .route("/api/applications", post(create_application))
        .route("/api/applications/my", get(get_my_applications))
        .route("/api/applications/admin/all", get(get_all_applications))
        .route(
            "/api/applications/admin/pending",
            get(get_pending_applications),
        )
        .route(
            "/api/applications/admin/users/:user_id",
            get(get_user_applications),
        )
        .route(
            "/api/applications/:application_id",
            get(get_application).put(decide_application),
        )
        .route_layer(middleware::from_fn_with_state(token_state, auth));

    Router::new()
        .route("/api/applications/dictionaries", get(get_dictionaries))
        .merge(protected)
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/api/applications/dictionaries",
    tag = "applications",
    responses(
        (status = 200, description = "Room and sensor type dictionaries")
    )
)]
pub async fn get_dictionaries(
    State(state): State<ApplicationState>,
) -> Json<DictionariesResponse> {
    Json(DictionariesResponse {
        rooms: state.dictionaries.rooms().clone(),
        sensors: state.dictionaries.sensors().clone(),
    })
}

#[utoipa::path(
    post,
    path = "/api/applications",
    tag = "applications",
    security(
        ("bearer_auth" = [])
    ),
    request_body = ApplicationCreateRequest,
    responses(
        (status = 200, description = "Application submitted"),
        (status = 400, description = "Invalid room or sensor configuration"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn create_application(
    Extension(token_data): Extension<TokenClaims>,
    State(state): State<ApplicationState>,
    Json(body): Json<ApplicationCreateRequest>,
) -> Result<Json<ApplicationView>, ApiError> {
    if Role::from(token_data.role.clone()) == Role::Admin {
        return Err(ApplicationError::AdminCannotApply.into());
    }

    validate_rooms_config(&state.dictionaries, &body.rooms_config)?;

    let mut tx = state.application_repository.get_pool().begin().await?;
    let application = state
        .application_repository
        .create(token_data.sub, &body.rooms_config, &mut tx)
        .await?;
    tx.commit().await?;

    let view = state
        .application_repository
        .find_view_by_id(application.id)
        .await?
        .ok_or(ApplicationError::ApplicationNotFound)?;

    Ok(Json(view))
}

#[utoipa::path(
    get,
    path = "/api/applications/my",
    tag = "applications",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Applications of the current user"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn get_my_applications(
    Extension(token_data): Extension<TokenClaims>,
    State(state): State<ApplicationState>,
) -> Result<Json<Vec<ApplicationView>>, ApiError> {
    let views = state
        .application_repository
        .find_by_user(token_data.sub)
        .await?;

    Ok(Json(views))
}

#[utoipa::path(
    get,
    path = "/api/applications/admin/all",
    tag = "applications",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "All applications"),
        (status = 403, description = "Not an admin")
    )
)]
pub async fn get_all_applications(
    Extension(token_data): Extension<TokenClaims>,
    State(state): State<ApplicationState>,
) -> Result<Json<Vec<ApplicationView>>, ApiError> {
    require_admin(&token_data)?;

    let views = state.application_repository.find_all().await?;

    Ok(Json(views))
}

#[utoipa::path(
    get,
    path = "/api/applications/admin/pending",
    tag = "applications",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Pending applications"),
        (status = 403, description = "Not an admin")
    )
)]
pub async fn get_pending_applications(
    Extension(token_data): Extension<TokenClaims>,
    State(state): State<ApplicationState>,
) -> Result<Json<Vec<ApplicationView>>, ApiError> {
    require_admin(&token_data)?;

    let views = state.application_repository.find_pending().await?;

    Ok(Json(views))
}

#[utoipa::path(
    get,
    path = "/api/applications/admin/users/{user_id}",
    tag = "applications",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Applications of one user"),
        (status = 403, description = "Not an admin"),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user_applications(
    Extension(token_data): Extension<TokenClaims>,
    Path(user_id): Path<i64>,
    State(state): State<ApplicationState>,
) -> Result<Json<Vec<ApplicationView>>, ApiError> {
    require_admin(&token_data)?;

    state
        .user_repository
        .find_by_id(user_id)
        .await?
        .ok_or(AuthError::UserNotFound)?;

    let views = state.application_repository.find_by_user(user_id).await?;

    Ok(Json(views))
}

#[utoipa::path(
    get,
    path = "/api/applications/{application_id}",
    tag = "applications",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Application detail"),
        (status = 403, description = "Not the owner and not an admin"),
        (status = 404, description = "Application not found")
    )
)]
pub async fn get_application(
    Extension(token_data): Extension<TokenClaims>,
    Path(application_id): Path<i64>,
    State(state): State<ApplicationState>,
) -> Result<Json<ApplicationView>, ApiError> {
    let view = state
        .application_repository
        .find_view_by_id(application_id)
        .await?
        .ok_or(ApplicationError::ApplicationNotFound)?;

    if Role::from(token_data.role.clone()) != Role::Admin && view.user_id != token_data.sub {
        return Err(AuthError::InsufficientPermission.into());
    }

    Ok(Json(view))
}

#[utoipa::path(
    put,
    path = "/api/applications/{application_id}",
    tag = "applications",
    security(
        ("bearer_auth" = [])
    ),
    request_body = ApplicationDecisionRequest,
    responses(
        (status = 200, description = "Decision recorded", body = DecisionResponse),
        (status = 400, description = "Invalid decision status"),
        (status = 403, description = "Not an admin"),
        (status = 404, description = "Application not found"),
        (status = 409, description = "Application already decided")
    )
)]
pub async fn decide_application(
    Extension(token_data): Extension<TokenClaims>,
    Path(application_id): Path<i64>,
    State(state): State<ApplicationState>,
    Json(body): Json<ApplicationDecisionRequest>,
) -> Result<Json<DecisionResponse>, ApiError> {
    require_admin(&token_data)?;

    let application = state
        .application_repository
        .find_by_id(application_id)
        .await?
        .ok_or(ApplicationError::ApplicationNotFound)?;

    let decision = match ApplicationStatus::from_str(&body.status) {
        Ok(ApplicationStatus::Approved) => ApplicationStatus::Approved,
        Ok(ApplicationStatus::Rejected) => ApplicationStatus::Rejected,
        _ => return Err(ApplicationError::InvalidDecision.into()),
    };

    if ApplicationStatus::from_str(&application.status) != Ok(ApplicationStatus::Pending) {
        return Err(ApplicationError::AlreadyDecided.into());
    }

    // One transaction per decision: either the whole provisioned set lands
    // together with the status flip, or none of it does.
    let mut tx = state.application_repository.get_pool().begin().await?;

    let rejection_comment = match decision {
        ApplicationStatus::Approved => {
            let created_room_ids = state
                .provision_service
                .provision(&mut tx, &application.rooms_config.0)
                .await?;

            state
                .user_repository
                .mark_application_submitted(application.user_id, &mut tx)
                .await?;

            state
                .application_repository
                .decide(
                    application_id,
                    ApplicationStatus::Approved,
                    None,
                    Some(&created_room_ids),
                    &mut tx,
                )
                .await?;

            None
        }
        _ => {
            state
                .application_repository
                .decide(
                    application_id,
                    ApplicationStatus::Rejected,
                    body.rejection_comment.as_deref(),
                    None,
                    &mut tx,
                )
                .await?;

            body.rejection_comment.clone()
        }
    };

    tx.commit().await?;

    Ok(Json(DecisionResponse {
        message: format!("Application {decision} successfully"),
        rejection_comment,
    }))
}

fn require_admin(token_data: &TokenClaims) -> Result<(), ApiError> {
    match Role::from(token_data.role.clone()) {
        Role::Admin => Ok(()),
        Role::User => Err(AuthError::InsufficientPermission.into()),
    }
}

fn validate_rooms_config(
    dictionaries: &Dictionaries,
    rooms_config: &[RoomConfig],
) -> Result<(), ApplicationError> {
    if rooms_config.is_empty() {
        return Err(ApplicationError::EmptyRoomsConfig);
    }

    for room_config in rooms_config {
        if dictionaries.room_type_name(room_config.room_type_id).is_none() {
            return Err(ApplicationError::InvalidRoomType(room_config.room_type_id));
        }

        if room_config.sensor_type_ids.is_empty() {
            return Err(ApplicationError::RoomWithoutSensors(
                room_config.room_type_id,
            ));
        }

        for sensor_type_id in &room_config.sensor_type_ids {
            if dictionaries.sensor_kind(*sensor_type_id).is_none() {
                return Err(ApplicationError::InvalidSensorType {
                    sensor_type_id: *sensor_type_id,
                    room_type_id: room_config.room_type_id,
                });
            }
        }
    }

    Ok(())
}
