use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use time::OffsetDateTime;
use utoipa::ToSchema;

use crate::models::Table;

/// One requested room with the sensor types it should be provisioned with.
#[derive(Serialize, Deserialize, Debug, Clone, ToSchema)]
pub struct RoomConfig {
    pub room_type_id: i64,
    pub sensor_type_ids: Vec<i64>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
        }
    }
}

impl std::str::FromStr for ApplicationStatus {
    type Err = ();

    fn from_str(input: &str) -> Result<ApplicationStatus, Self::Err> {
        match input {
            "pending" => Ok(ApplicationStatus::Pending),
            "approved" => Ok(ApplicationStatus::Approved),
            "rejected" => Ok(ApplicationStatus::Rejected),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct Application {
    pub id: i64,
    pub user_id: i64,
    pub rooms_config: Json<Vec<RoomConfig>>,
    pub status: String,
    pub rejection_comment: Option<String>,
    /// Set exactly once, when the application is approved and its rooms are
    /// provisioned. Never mutated afterwards.
    pub created_room_ids: Option<Json<Vec<i64>>>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Application row joined with the submitting user's login, the shape every
/// read endpoint returns.
#[derive(Serialize, Debug, Clone, sqlx::FromRow)]
pub struct ApplicationView {
    pub id: i64,
    pub user_id: i64,
    pub rooms_config: Json<Vec<RoomConfig>>,
    pub status: String,
    pub rejection_comment: Option<String>,
    pub created_room_ids: Option<Json<Vec<i64>>>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    pub user_login: String,
}

pub struct ApplicationTable;

impl Table for ApplicationTable {
    fn name(&self) -> &'static str {
        "applications"
    }

    fn create(&self) -> String {
        String::from(
            r#"
            CREATE TABLE IF NOT EXISTS applications (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                rooms_config TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending',
                rejection_comment TEXT,
                created_room_ids TEXT,
                created_at DATETIME NOT NULL,
                updated_at DATETIME NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users (id)
            );
            "#,
        )
    }

    fn dispose(&self) -> String {
        String::from("DROP TABLE IF EXISTS applications;")
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec!["users"]
    }
}
