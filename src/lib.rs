// Library exports for the API server, the entry tool and tests
pub mod config;
pub mod db;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use redis::Client as RedisClient;
use sqlx::PgPool;

use config::Config;
use services::board::Board;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub redis_client: RedisClient,
    pub config: Arc<Config>,
    pub board: Board,
}
