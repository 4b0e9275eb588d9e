use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Extension, Json, Router, middleware};

use crate::errors::{ApiError, AuthError};
use crate::middlewares::{TokenState, auth};
use crate::models::{Role, UserOverview};
use crate::repositories::UserRepository;
use crate::services::TokenClaims;

#[derive(Clone)]
pub struct UserState {
    pub user_repository: Arc<UserRepository>,
}

pub fn user_router(state: UserState, token_state: TokenState) -> Router {
    Router::new()
        .route("/api/users/admin/list", get(list_users))
        .route_layer(middleware::from_fn_with_state(token_state, auth))
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/api/users/admin/list",
    tag = "users",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "All users with their application counts"),
        (status = 403, description = "Not an admin")
    )
)]
pub async fn list_users(
    Extension(token_data): Extension<TokenClaims>,
    State(state): State<UserState>,
) -> Result<Json<Vec<UserOverview>>, ApiError> {
    match Role::from(token_data.role.clone()) {
        Role::Admin => {
            let overviews = state.user_repository.list_with_application_stats().await?;

            Ok(Json(overviews))
        }
        Role::User => Err(AuthError::InsufficientPermission.into()),
    }
}
