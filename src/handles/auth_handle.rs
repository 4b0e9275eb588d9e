use std::sync::Arc;

use anyhow::anyhow;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Extension, Json, Router, middleware};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::ToSchema;

use crate::errors::{ApiError, AuthError};
use crate::middlewares::{TokenState, auth};
use crate::models::User;
use crate::repositories::{ApplicationRepository, UserRepository};
use crate::services::{AuthService, TokenClaims, TokenScope, TokenService};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub login: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub middle_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub login: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TokenPairResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: i64,
    pub login: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub middle_name: Option<String>,
    pub is_active: bool,
    pub is_admin: bool,
    pub application_submitted: bool,
    pub has_pending_application: bool,
}

impl UserResponse {
    fn from_user(user: User, has_pending_application: bool) -> Self {
        Self {
            id: user.id,
            login: user.login,
            first_name: user.first_name,
            last_name: user.last_name,
            middle_name: user.middle_name,
            is_active: user.is_active,
            is_admin: user.is_admin,
            application_submitted: user.application_submitted,
            has_pending_application,
        }
    }
}

#[derive(Clone)]
pub struct AuthState {
    pub auth_service: Arc<AuthService>,
    pub token_service: Arc<TokenService>,
    pub user_repository: Arc<UserRepository>,
    pub application_repository: Arc<ApplicationRepository>,
}

pub fn auth_router(auth_state: AuthState, token_state: TokenState) -> Router {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/refresh", post(refresh_token))
        .route(
            "/api/auth/change_password",
            post(change_password)
                .route_layer(middleware::from_fn_with_state(token_state.clone(), auth)),
        )
        .route(
            "/api/auth/me",
            get(get_current_user)
                .route_layer(middleware::from_fn_with_state(token_state.clone(), auth)),
        )
        .with_state(auth_state)
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Registration successful", body = UserResponse),
        (status = 409, description = "Login already exists"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn register(
    State(state): State<AuthState>,
    Json(body): Json<RegisterRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    if let Ok(Some(_)) = state.user_repository.find_by_login(&body.login).await {
        return Err(AuthError::LoginExists.into());
    }

    let hash_password = state
        .auth_service
        .hash(&body.password)
        .map_err(|e| anyhow!("Failed to hash password: {}", e))?;

    let user = User {
        id: 0,
        login: body.login.clone(),
        password: hash_password,
        first_name: body.first_name,
        last_name: body.last_name,
        middle_name: body.middle_name,
        is_active: true,
        is_admin: false,
        application_submitted: false,
        created_at: OffsetDateTime::now_utc(),
    };

    let mut tx = state.user_repository.get_pool().begin().await?;

    let id = state.user_repository.create(&user, &mut tx).await?;

    tx.commit().await?;

    let created_user = state
        .user_repository
        .find_by_id(id)
        .await?
        .ok_or(AuthError::UserNotFound)?;

    Ok(Json(UserResponse::from_user(created_user, false)))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful, return token pair", body = TokenPairResponse),
        (status = 404, description = "User not found"),
        (status = 401, description = "Invalid password"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn login(
    State(state): State<AuthState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<TokenPairResponse>, ApiError> {
    let user = state
        .user_repository
        .find_by_login(&body.login)
        .await?
        .ok_or(AuthError::UserNotFound)?;

    let result = state
        .auth_service
        .verify(&user.password, &body.password)
        .map_err(|e| anyhow!("Failed to verify password: {}", e))?;

    if !result {
        return Err(AuthError::InvalidPassword.into());
    }

    issue_token_pair(&state, &user)
}

#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    tag = "auth",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Refresh successful, return new token pair", body = TokenPairResponse),
        (status = 401, description = "Invalid refresh token")
    )
)]
pub async fn refresh_token(
    State(state): State<AuthState>,
    Json(body): Json<RefreshRequest>,
) -> Result<Json<TokenPairResponse>, ApiError> {
    let claims = state
        .token_service
        .retrieve_token_claims(&body.refresh_token, TokenScope::Refresh)
        .map_err(|_| AuthError::InvalidToken)?
        .claims;

    let user = state
        .user_repository
        .find_by_id(claims.sub)
        .await?
        .ok_or(AuthError::UserNotFound)?;

    issue_token_pair(&state, &user)
}

#[utoipa::path(
    post,
    path = "/api/auth/change_password",
    tag = "auth",
    security(
        ("bearer_auth" = [])
    ),
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed"),
        (status = 400, description = "Old password is incorrect"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn change_password(
    Extension(token_data): Extension<TokenClaims>,
    State(state): State<AuthState>,
    Json(body): Json<ChangePasswordRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user = state
        .user_repository
        .find_by_id(token_data.sub)
        .await?
        .ok_or(AuthError::UserNotFound)?;

    let result = state
        .auth_service
        .verify(&user.password, &body.old_password)
        .map_err(|e| anyhow!("Failed to verify password: {}", e))?;

    if !result {
        return Err(AuthError::InvalidPassword.into());
    }

    let hash_password = state
        .auth_service
        .hash(&body.new_password)
        .map_err(|e| anyhow!("Failed to hash password: {}", e))?;

    let mut tx = state.user_repository.get_pool().begin().await?;

    state
        .user_repository
        .update_password(user.id, &hash_password, &mut tx)
        .await?;

    tx.commit().await?;

    Ok(Json(
        serde_json::json!({ "message": "Password successfully changed" }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "auth",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Current user information", body = UserResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "User does not exist")
    )
)]
pub async fn get_current_user(
    Extension(token_data): Extension<TokenClaims>,
    State(state): State<AuthState>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .user_repository
        .find_by_id(token_data.sub)
        .await?
        .ok_or(AuthError::UserNotFound)?;

    let has_pending_application = state.application_repository.has_pending(user.id).await?;

    Ok(Json(UserResponse::from_user(user, has_pending_application)))
}

fn issue_token_pair(state: &AuthState, user: &User) -> Result<Json<TokenPairResponse>, ApiError> {
    let access = state
        .token_service
        .generate_token(user, TokenScope::Access)
        .map_err(|e| anyhow!("Failed to generate token: {}", e))?;
    let refresh = state
        .token_service
        .generate_token(user, TokenScope::Refresh)
        .map_err(|e| anyhow!("Failed to generate token: {}", e))?;

    Ok(Json(TokenPairResponse {
        access_token: access.token,
        refresh_token: refresh.token,
        token_type: "bearer".to_string(),
    }))
}
