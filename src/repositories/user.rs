use std::sync::Arc;

use sqlx::{Error, Sqlite, SqlitePool, Transaction};

use crate::configs::Storage;
use crate::models::{User, UserOverview};

pub struct UserRepository {
    storage: Arc<Storage>,
}

impl UserRepository {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    pub fn get_pool(&self) -> &SqlitePool {
        self.storage.get_pool()
    }

    pub async fn create(
        &self,
        item: &User,
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<i64, Error> {
        let id = sqlx::query(
            r#"
            INSERT INTO users (login, password, first_name, last_name, middle_name,
                               is_active, is_admin, application_submitted, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(&item.login)
        .bind(&item.password)
        .bind(&item.first_name)
        .bind(&item.last_name)
        .bind(&item.middle_name)
        .bind(item.is_active)
        .bind(item.is_admin)
        .bind(item.application_submitted)
        .bind(item.created_at)
        .execute(&mut **transaction)
        .await?
        .last_insert_rowid();

        Ok(id)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<User>, Error> {
        let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(self.storage.get_pool())
            .await?;

        Ok(user)
    }

    pub async fn find_by_login(&self, login: &str) -> Result<Option<User>, Error> {
        let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE login = $1")
            .bind(login)
            .fetch_optional(self.storage.get_pool())
            .await?;

        Ok(user)
    }

    pub async fn update_password(
        &self,
        id: i64,
        password: &str,
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<(), Error> {
        sqlx::query("UPDATE users SET password = $1 WHERE id = $2")
            .bind(password)
            .bind(id)
            .execute(&mut **transaction)
            .await?;

        Ok(())
    }

    // Set once when the user's first application is approved
    pub async fn mark_application_submitted(
        &self,
        id: i64,
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<(), Error> {
        sqlx::query("UPDATE users SET application_submitted = TRUE WHERE id = $1")
            .bind(id)
            .execute(&mut **transaction)
            .await?;

        Ok(())
    }

    /// Every user with their application counts broken down by status.
    pub async fn list_with_application_stats(&self) -> Result<Vec<UserOverview>, Error> {
        let overviews: Vec<UserOverview> = sqlx::query_as(
            r#"
            SELECT u.id, u.login, u.is_active, u.is_admin, u.application_submitted, u.created_at,
                   COUNT(a.id) AS applications_count,
                   COALESCE(SUM(CASE WHEN a.status = 'pending' THEN 1 ELSE 0 END), 0) AS pending_applications,
                   COALESCE(SUM(CASE WHEN a.status = 'approved' THEN 1 ELSE 0 END), 0) AS approved_applications,
                   COALESCE(SUM(CASE WHEN a.status = 'rejected' THEN 1 ELSE 0 END), 0) AS rejected_applications
                FROM users u
                LEFT JOIN applications a ON a.user_id = u.id
                GROUP BY u.id
                ORDER BY u.id;
            "#,
        )
        .fetch_all(self.storage.get_pool())
        .await?;

        Ok(overviews)
    }
}
