use axum::http::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum SensorError {
    #[error("Unknown sensor type: {0}")]
    UnknownSensorKind(String),

    #[error("Sensor reading for {kind} is missing required field '{field}'")]
    MissingField {
        kind: &'static str,
        field: &'static str,
    },
}

impl SensorError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            SensorError::UnknownSensorKind(_) => StatusCode::BAD_REQUEST,
            SensorError::MissingField { .. } => StatusCode::BAD_REQUEST,
        }
    }
}
