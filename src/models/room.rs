use serde::{Deserialize, Serialize};

use crate::models::Table;

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct Room {
    pub id: i64,
    /// Globally unique display name, e.g. "Кухня" or "Кухня 2".
    pub name: String,
    pub room_type_id: i64,
}

pub struct RoomTable;

impl Table for RoomTable {
    fn name(&self) -> &'static str {
        "rooms"
    }

    fn create(&self) -> String {
        String::from(
            r#"
            CREATE TABLE IF NOT EXISTS rooms (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                room_type_id INTEGER NOT NULL
            );
            "#,
        )
    }

    fn dispose(&self) -> String {
        String::from("DROP TABLE IF EXISTS rooms;")
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec![]
    }
}
