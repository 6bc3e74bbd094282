// src/lib.rs

use sea_orm::DatabaseConnection;
use std::sync::Arc;

use config::AppConfig;
use services::{
    auth::TokenStore, executor::OperationExecutor, ledger::UserLocks,
    random_string::RandomStringProvider,
};

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: AppConfig,
    pub tokens: TokenStore,
    pub executor: OperationExecutor,
}

impl AppState {
    pub fn new(
        db: DatabaseConnection,
        config: AppConfig,
        random_strings: Arc<dyn RandomStringProvider>,
    ) -> Self {
        let tokens = TokenStore::new(db.clone(), config.token_lifetime());
        let executor = OperationExecutor::new(db.clone(), random_strings, UserLocks::new());

        Self {
            db,
            config,
            tokens,
            executor,
        }
    }
}

pub mod entities {
    pub mod prelude;
    pub mod operations;
    pub mod records;
    pub mod tokens;
    pub mod users;
}

pub mod services {
    pub mod auth;
    pub mod executor;
    pub mod ledger;
    pub mod listing;
    pub mod random_string;
    pub mod records;
    pub mod users;
}

pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod query;
pub mod router;
