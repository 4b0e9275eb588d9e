#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use serde_json::Value;
use time::OffsetDateTime;
use tower::ServiceExt;

use homegrid_server::app::build_router;
use homegrid_server::configs::{Auth, Database, SchemaManager, Storage};
use homegrid_server::models::User;
use homegrid_server::repositories::UserRepository;
use homegrid_server::services::{AuthService, TokenScope, TokenService};

pub struct MockApp {
    pub storage: Arc<Storage>,
    pub router: Router,
    pub admin: User,
    pub admin_token: String,
    pub user: User,
    pub user_token: String,
}

impl MockApp {
    pub async fn new() -> Self {
        let auth = Auth {
            secret: String::from("test"),
            expiration: 1000,
            refresh_expiration: 10000,
        };

        let storage = Arc::new(
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
        );

        let router = build_router(storage.clone(), auth.clone());

        let token_service = TokenService::new(auth);

        let admin = Self::seed_user(storage.clone(), "admin", "admin-pass", true).await;
        let user = Self::seed_user(storage.clone(), "resident", "resident-pass", false).await;

        let admin_token = token_service
            .generate_token(&admin, TokenScope::Access)
            .unwrap()
            .token;
        let user_token = token_service
            .generate_token(&user, TokenScope::Access)
            .unwrap()
            .token;

        Self {
            storage,
            router,
            admin,
            admin_token,
            user,
            user_token,
        }
    }

    async fn seed_user(storage: Arc<Storage>, login: &str, password: &str, is_admin: bool) -> User {
        let auth_service = AuthService::new();
        let user_repository = UserRepository::new(storage.clone());

        let user = User {
            id: 0,
            login: login.to_string(),
            password: auth_service.hash(password).unwrap(),
            first_name: None,
            last_name: None,
            middle_name: None,
            is_active: true,
            is_admin,
            application_submitted: false,
            created_at: OffsetDateTime::now_utc(),
        };

        let mut tx = storage.get_pool().begin().await.unwrap();
        let id = user_repository.create(&user, &mut tx).await.unwrap();
        tx.commit().await.unwrap();

        user_repository.find_by_id(id).await.unwrap().unwrap()
    }

    /// Fire one request at the app and parse the JSON body, if any.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().uri(uri).method(method);

        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }

        let request = match body {
            Some(value) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(serde_json::to_string(&value).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        (status, value)
    }
}
