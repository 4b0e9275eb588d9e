use axum::http::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum ApplicationError {
    #[error("Application not found")]
    ApplicationNotFound,

    #[error("Admin cannot create applications")]
    AdminCannotApply,

    #[error("Application must request at least one room")]
    EmptyRoomsConfig,

    #[error("Invalid room type: {0}")]
    InvalidRoomType(i64),

    #[error("Invalid sensor type {sensor_type_id} in room type {room_type_id}")]
    InvalidSensorType {
        sensor_type_id: i64,
        room_type_id: i64,
    },

    #[error("Room type {0} must have at least one sensor")]
    RoomWithoutSensors(i64),

    #[error("Status must be 'approved' or 'rejected'")]
    InvalidDecision,

    #[error("Application has already been decided")]
    AlreadyDecided,
}

impl ApplicationError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApplicationError::ApplicationNotFound => StatusCode::NOT_FOUND,
            ApplicationError::AdminCannotApply => StatusCode::BAD_REQUEST,
            ApplicationError::EmptyRoomsConfig => StatusCode::BAD_REQUEST,
            ApplicationError::InvalidRoomType(_) => StatusCode::BAD_REQUEST,
            ApplicationError::InvalidSensorType { .. } => StatusCode::BAD_REQUEST,
            ApplicationError::RoomWithoutSensors(_) => StatusCode::BAD_REQUEST,
            ApplicationError::InvalidDecision => StatusCode::BAD_REQUEST,
            ApplicationError::AlreadyDecided => StatusCode::CONFLICT,
        }
    }
}
