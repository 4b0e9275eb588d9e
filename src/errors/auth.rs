use axum::http::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Login already exists")]
    LoginExists,

    #[error("User not found")]
    UserNotFound,

    #[error("Invalid password")]
    InvalidPassword,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Not enough permissions")]
    InsufficientPermission,
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::LoginExists => StatusCode::CONFLICT,
            AuthError::UserNotFound => StatusCode::NOT_FOUND,
            AuthError::InvalidPassword => StatusCode::UNAUTHORIZED,
            AuthError::InvalidToken => StatusCode::UNAUTHORIZED,
            AuthError::InsufficientPermission => StatusCode::FORBIDDEN,
        }
    }
}
