use std::sync::Arc;

use sqlx::types::Json;
use sqlx::{Error, Sqlite, SqlitePool, Transaction};
use time::OffsetDateTime;

use crate::configs::Storage;
use crate::models::{Application, ApplicationStatus, ApplicationView, RoomConfig};

const VIEW_COLUMNS: &str = r#"
    SELECT a.id, a.user_id, a.rooms_config, a.status, a.rejection_comment,
           a.created_room_ids, a.created_at, a.updated_at, u.login AS user_login
        FROM applications a
        JOIN users u ON u.id = a.user_id
"#;

pub struct ApplicationRepository {
    storage: Arc<Storage>,
}

impl ApplicationRepository {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    pub fn get_pool(&self) -> &SqlitePool {
        self.storage.get_pool()
    }

    pub async fn create(
        &self,
        user_id: i64,
        rooms_config: &[RoomConfig],
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<Application, Error> {
        let now = OffsetDateTime::now_utc();

        let application: Application = sqlx::query_as(
            r#"
            INSERT INTO applications (user_id, rooms_config, status, created_at, updated_at)
                VALUES ($1, $2, 'pending', $3, $3)
                RETURNING *;
            "#,
        )
        .bind(user_id)
        .bind(Json(rooms_config))
        .bind(now)
        .fetch_one(&mut **transaction)
        .await?;

        Ok(application)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Application>, Error> {
        let application: Option<Application> =
            sqlx::query_as("SELECT * FROM applications WHERE id = $1")
                .bind(id)
                .fetch_optional(self.storage.get_pool())
                .await?;

        Ok(application)
    }

    pub async fn find_view_by_id(&self, id: i64) -> Result<Option<ApplicationView>, Error> {
        let view: Option<ApplicationView> =
            sqlx::query_as(&format!("{VIEW_COLUMNS} WHERE a.id = $1"))
                .bind(id)
                .fetch_optional(self.storage.get_pool())
                .await?;

        Ok(view)
    }

    pub async fn find_by_user(&self, user_id: i64) -> Result<Vec<ApplicationView>, Error> {
        let views: Vec<ApplicationView> = sqlx::query_as(&format!(
            "{VIEW_COLUMNS} WHERE a.user_id = $1 ORDER BY a.created_at DESC, a.id DESC"
        ))
        .bind(user_id)
        .fetch_all(self.storage.get_pool())
        .await?;

        Ok(views)
    }

    pub async fn find_all(&self) -> Result<Vec<ApplicationView>, Error> {
        let views: Vec<ApplicationView> = sqlx::query_as(&format!(
            "{VIEW_COLUMNS} ORDER BY a.created_at DESC, a.id DESC"
        ))
        .fetch_all(self.storage.get_pool())
        .await?;

        Ok(views)
    }

    pub async fn find_pending(&self) -> Result<Vec<ApplicationView>, Error> {
        let views: Vec<ApplicationView> = sqlx::query_as(&format!(
            "{VIEW_COLUMNS} WHERE a.status = 'pending' ORDER BY a.created_at DESC, a.id DESC"
        ))
        .fetch_all(self.storage.get_pool())
        .await?;

        Ok(views)
    }

    pub async fn has_pending(&self, user_id: i64) -> Result<bool, Error> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM applications WHERE user_id = $1 AND status = 'pending')",
        )
        .bind(user_id)
        .fetch_one(self.storage.get_pool())
        .await?;

        Ok(exists)
    }

    /// Record the admin decision. `created_room_ids` is only ever passed on
    /// approval and written once; the row never transitions again.
    pub async fn decide(
        &self,
        id: i64,
        status: ApplicationStatus,
        rejection_comment: Option<&str>,
        created_room_ids: Option<&[i64]>,
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<(), Error> {
        sqlx::query(
            r#"
            UPDATE applications
            SET status = $1, rejection_comment = $2, created_room_ids = $3, updated_at = $4
            WHERE id = $5
            "#,
        )
        .bind(status.as_str())
        .bind(rejection_comment)
        .bind(created_room_ids.map(Json))
        .bind(OffsetDateTime::now_utc())
        .bind(id)
        .execute(&mut **transaction)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use time::OffsetDateTime;

    use crate::configs::{Database, SchemaManager};
    use crate::models::User;
    use crate::repositories::UserRepository;

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

    async fn create_test_user(storage: Arc<Storage>) -> i64 {
        let user = User {
            id: 0,
            login: "resident".to_string(),
            password: "hash".to_string(),
            first_name: None,
            last_name: None,
            middle_name: None,
            is_active: true,
            is_admin: false,
            application_submitted: false,
            created_at: OffsetDateTime::now_utc(),
        };

        let repo = UserRepository::new(storage.clone());
        let mut tx = storage.get_pool().begin().await.unwrap();
        let id = repo.create(&user, &mut tx).await.unwrap();
        tx.commit().await.unwrap();

        id
    }

    fn kitchen_config() -> Vec<RoomConfig> {
        vec![RoomConfig {
            room_type_id: 3,
            sensor_type_ids: vec![1, 2],
        }]
    }

    #[tokio::test]
    async fn test_create_application_starts_pending() {
        let storage = setup_test_db().await;
        let user_id = create_test_user(storage.clone()).await;
        let repo = ApplicationRepository::new(storage.clone());

        let mut tx = storage.get_pool().begin().await.unwrap();
        let application = repo.create(user_id, &kitchen_config(), &mut tx).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(application.status, "pending");
        assert!(application.created_room_ids.is_none());
        assert_eq!(application.rooms_config.0.len(), 1);
        assert_eq!(application.rooms_config.0[0].room_type_id, 3);
    }

    #[tokio::test]
    async fn test_decide_records_created_rooms() {
        let storage = setup_test_db().await;
        let user_id = create_test_user(storage.clone()).await;
        let repo = ApplicationRepository::new(storage.clone());

        let mut tx = storage.get_pool().begin().await.unwrap();
        let application = repo.create(user_id, &kitchen_config(), &mut tx).await.unwrap();
        repo.decide(
            application.id,
            ApplicationStatus::Approved,
            None,
            Some(&[7, 9]),
            &mut tx,
        )
        .await
        .unwrap();
        tx.commit().await.unwrap();

        let found = repo.find_by_id(application.id).await.unwrap().unwrap();
        assert_eq!(found.status, "approved");
        assert_eq!(found.created_room_ids.unwrap().0, vec![7, 9]);
    }

    #[tokio::test]
    async fn test_views_carry_user_login() {
        let storage = setup_test_db().await;
        let user_id = create_test_user(storage.clone()).await;
        let repo = ApplicationRepository::new(storage.clone());

        let mut tx = storage.get_pool().begin().await.unwrap();
        repo.create(user_id, &kitchen_config(), &mut tx).await.unwrap();
        tx.commit().await.unwrap();

        let pending = repo.find_pending().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].user_login, "resident");

        assert!(repo.has_pending(user_id).await.unwrap());
    }
}
