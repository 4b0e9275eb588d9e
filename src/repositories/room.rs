use std::sync::Arc;

use sqlx::{Error, Sqlite, SqlitePool, Transaction};

use crate::configs::Storage;
use crate::models::Room;

pub struct RoomRepository {
    storage: Arc<Storage>,
}

impl RoomRepository {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    pub fn get_pool(&self) -> &SqlitePool {
        self.storage.get_pool()
    }

    // Insert relies on the UNIQUE constraint on name; callers treat a
    // uniqueness violation as a signal to retry with another name.
    pub async fn create(
        &self,
        name: &str,
        room_type_id: i64,
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<i64, Error> {
        let id = sqlx::query(
            r#"
            INSERT INTO rooms (name, room_type_id)
            VALUES ($1, $2)
            "#,
        )
        .bind(name)
        .bind(room_type_id)
        .execute(&mut **transaction)
        .await?
        .last_insert_rowid();

        Ok(id)
    }

    pub async fn exists_by_name(
        &self,
        name: &str,
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<bool, Error> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM rooms WHERE name = $1)")
            .bind(name)
            .fetch_one(&mut **transaction)
            .await?;

        Ok(exists)
    }

    /// Snapshot of every room name, read inside the provisioning transaction.
    pub async fn all_names(
        &self,
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<Vec<String>, Error> {
        let names: Vec<String> = sqlx::query_scalar("SELECT name FROM rooms")
            .fetch_all(&mut **transaction)
            .await?;

        Ok(names)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Room>, Error> {
        let room: Option<Room> = sqlx::query_as("SELECT * FROM rooms WHERE id = $1")
            .bind(id)
            .fetch_optional(self.storage.get_pool())
            .await?;

        Ok(room)
    }

    // Devices address a room by id and name together.
    pub async fn find_by_id_and_name(&self, id: i64, name: &str) -> Result<Option<Room>, Error> {
        let room: Option<Room> = sqlx::query_as("SELECT * FROM rooms WHERE id = $1 AND name = $2")
            .bind(id)
            .bind(name)
            .fetch_optional(self.storage.get_pool())
            .await?;

        Ok(room)
    }

    pub async fn find_all(&self) -> Result<Vec<Room>, Error> {
        let rooms: Vec<Room> = sqlx::query_as("SELECT * FROM rooms ORDER BY id")
            .fetch_all(self.storage.get_pool())
            .await?;

        Ok(rooms)
    }

    pub async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<Room>, Error> {
        let mut rooms = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(room) = self.find_by_id(*id).await? {
                rooms.push(room);
            }
        }

        Ok(rooms)
    }
}

#[cfg(test)]
mod tests {
    use crate::configs::{Database, SchemaManager};

    use super::*;

    async fn setup_test_db() -> Arc<Storage> {
        Arc::new(
            Storage::new(
                Database {
                    migration_path: None,
                    clean_start: true,
                    url: String::from("sqlite::memory:"),
                },
                SchemaManager::default(),
            )
            .await
            .unwrap(),
        )
    }

    #[tokio::test]
    async fn test_create_and_find_room() {
        let storage = setup_test_db().await;
        let repo = RoomRepository::new(storage.clone());

        let mut tx = storage.get_pool().begin().await.unwrap();
        let id = repo.create("Кухня", 3, &mut tx).await.unwrap();
        tx.commit().await.unwrap();

        let room = repo.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(room.name, "Кухня");
        assert_eq!(room.room_type_id, 3);

        assert!(repo.find_by_id_and_name(id, "Кухня").await.unwrap().is_some());
        assert!(repo.find_by_id_and_name(id, "Спальня").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_name_is_rejected() {
        let storage = setup_test_db().await;
        let repo = RoomRepository::new(storage.clone());

        let mut tx = storage.get_pool().begin().await.unwrap();
        repo.create("Кухня", 3, &mut tx).await.unwrap();
        let duplicate = repo.create("Кухня", 3, &mut tx).await;

        let error = duplicate.unwrap_err();
        match error {
            Error::Database(e) => assert!(e.is_unique_violation()),
            other => panic!("expected unique violation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_exists_and_all_names() {
        let storage = setup_test_db().await;
        let repo = RoomRepository::new(storage.clone());

        let mut tx = storage.get_pool().begin().await.unwrap();
        repo.create("Кухня", 3, &mut tx).await.unwrap();
        repo.create("Кухня 2", 3, &mut tx).await.unwrap();

        assert!(repo.exists_by_name("Кухня", &mut tx).await.unwrap());
        assert!(!repo.exists_by_name("Балкон", &mut tx).await.unwrap());

        let names = repo.all_names(&mut tx).await.unwrap();
        assert_eq!(names.len(), 2);
        tx.commit().await.unwrap();
    }
}
