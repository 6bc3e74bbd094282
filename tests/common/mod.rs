#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use sea_orm::{
    ColumnTrait, ConnectOptions, Database, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
};
use sea_orm_migration::MigratorTrait;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

use calculator_backend::config::AppConfig;
use calculator_backend::entities::{operations, prelude::Operations, users};
use calculator_backend::router::create_router;
use calculator_backend::services::random_string::{RandomStringError, RandomStringProvider};
use calculator_backend::services::users::create_user;
use calculator_backend::AppState;

pub const TEST_PASSWORD: &str = "correct-horse";
pub const STUB_RANDOM_STRING: &str = "qwertyuiop";

/// Set up a fresh in-memory database with every migration applied.
/// A single pooled connection keeps the in-memory database alive and shared.
pub async fn setup_test_db() -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);

    let db = Database::connect(options).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

pub struct StubRandomStrings;

#[async_trait]
impl RandomStringProvider for StubRandomStrings {
    async fn generate(&self) -> Result<String, RandomStringError> {
        Ok(STUB_RANDOM_STRING.to_string())
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        database_url: "sqlite::memory:".to_string(),
        bind_addr: "127.0.0.1:0".to_string(),
        token_lifetime_secs: 3600,
        random_api_key: None,
        random_api_url: "http://127.0.0.1:9/invoke".to_string(),
    }
}

pub async fn create_test_app() -> (Router, AppState) {
    let db = setup_test_db().await.expect("Failed to set up test DB");
    let state = AppState::new(db, test_config(), Arc::new(StubRandomStrings));
    (create_router(state.clone()), state)
}

pub async fn create_test_user(db: &DatabaseConnection, username: &str, balance: f64) -> users::Model {
    create_user(db, username, TEST_PASSWORD, Some(balance))
        .await
        .expect("Failed to create test user")
}

pub async fn operation_id(db: &DatabaseConnection, operation_type: &str) -> i32 {
    Operations::find()
        .filter(operations::Column::OperationType.eq(operation_type))
        .one(db)
        .await
        .expect("Failed to query operations")
        .expect("Operation not seeded")
        .id
}

/// Send a request and decode the JSON body (Null when empty)
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

pub async fn login(app: &Router, username: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/login",
        None,
        Some(serde_json::json!({"username": username, "password": TEST_PASSWORD})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {}", body);
    body["token"].as_str().unwrap().to_string()
}

/// Run an operation through POST /record
pub async fn execute(
    app: &Router,
    token: &str,
    operation_id: i32,
    variables: &str,
) -> (StatusCode, Value) {
    send(
        app,
        Method::POST,
        "/record",
        Some(token),
        Some(serde_json::json!({"operation_id": operation_id, "variables": variables})),
    )
    .await
}

pub async fn user_balance(db: &DatabaseConnection, user_id: i32) -> f64 {
    calculator_backend::services::ledger::current_balance(db, user_id)
        .await
        .expect("Failed to read balance")
}
