use super::{ApplicationError, AuthError, RoomError, SensorError};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Authentication error: {0}")]
    AuthError(#[from] AuthError),

    #[error("Application error: {0}")]
    ApplicationError(#[from] ApplicationError),

    #[error("Room error: {0}")]
    RoomError(#[from] RoomError),

    #[error("Sensor error: {0}")]
    SensorError(#[from] SensorError),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}
