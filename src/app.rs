use std::sync::Arc;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::configs::{Auth, SchemaManager, Settings, Storage};
use crate::handles::*;
use crate::middlewares::TokenState;
use crate::models::Dictionaries;
use crate::repositories::{
    ApplicationRepository, RoomRepository, SensorRepository, UserRepository,
};
use crate::services::{AuthService, IngestService, ProvisionService, TokenService};

pub async fn create_app(settings: &Arc<Settings>) -> Router {
    let storage = Arc::new(
        Storage::new(settings.database.clone(), SchemaManager::default())
            .await
            .unwrap(),
    );

    build_router(storage, settings.auth.clone())
}

/// Wire repositories, services and handlers onto one router. Shared with the
/// integration tests, which bring their own in-memory storage.
pub fn build_router(storage: Arc<Storage>, auth: Auth) -> Router {
    let dictionaries = Arc::new(Dictionaries::new());

    let user_repository = Arc::new(UserRepository::new(storage.clone()));
    let application_repository = Arc::new(ApplicationRepository::new(storage.clone()));
    let room_repository = Arc::new(RoomRepository::new(storage.clone()));
    let sensor_repository = Arc::new(SensorRepository::new(storage.clone()));

    let auth_service = Arc::new(AuthService::new());
    let token_service = Arc::new(TokenService::new(auth));
    let provision_service = Arc::new(ProvisionService::new(
        dictionaries.clone(),
        room_repository.clone(),
        sensor_repository.clone(),
    ));
    let ingest_service = Arc::new(IngestService::new(sensor_repository.clone()));

    let token_state = TokenState {
        token_service: token_service.clone(),
    };

    Router::new()
        .merge(auth_router(
            AuthState {
                auth_service: auth_service.clone(),
                token_service: token_service.clone(),
                user_repository: user_repository.clone(),
                application_repository: application_repository.clone(),
            },
            token_state.clone(),
        ))
        .merge(user_router(
            UserState {
                user_repository: user_repository.clone(),
            },
            token_state.clone(),
        ))
        .merge(application_router(
            ApplicationState {
                dictionaries: dictionaries.clone(),
                application_repository: application_repository.clone(),
                user_repository: user_repository.clone(),
                provision_service: provision_service.clone(),
            },
            token_state.clone(),
        ))
        .merge(room_router(
            RoomState {
                room_repository: room_repository.clone(),
                sensor_repository: sensor_repository.clone(),
                application_repository: application_repository.clone(),
            },
            token_state.clone(),
        ))
        .merge(sensor_router(
            SensorState {
                room_repository: room_repository.clone(),
                sensor_repository: sensor_repository.clone(),
            },
            token_state.clone(),
        ))
        .merge(telemetry_router(TelemetryState {
            room_repository: room_repository.clone(),
            ingest_service: ingest_service.clone(),
        }))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
