use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, Method},
    routing::{get, post},
    Router,
};
use redis::Client as RedisClient;
use tower_http::cors::{AllowHeaders, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lunchboard_api::{
    config::Config,
    db::{self, records::PgRecordStore},
    routes,
    services::{
        board::{Board, Secrets},
        changefeed::Changefeed,
        clock::SystemClock,
        metrics,
        storage::LocalMediaStorage,
    },
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Arc::new(Config::from_env()?);

    let pool = db::create_pool(&config.database_url).await?;
    db::run_migrations(&pool).await?;
    info!("Database connected and migrations applied");

    let redis_client = RedisClient::open(config.redis_url.as_str())?;
    let redis_conn = redis_client.get_multiplexed_async_connection().await?;
    info!("Redis connected");

    tokio::fs::create_dir_all(&config.media_dir).await?;

    let board = Board::new(
        Arc::new(PgRecordStore::new(pool.clone())),
        Arc::new(LocalMediaStorage::new(
            &config.media_dir,
            &config.public_base_url,
        )),
        Arc::new(SystemClock),
        Secrets {
            advice: config.advice_password.clone(),
            status: config.status_password.clone(),
        },
    )
    .with_changefeed(Changefeed::new(redis_conn));

    metrics::start(pool.clone());

    let state = AppState {
        db: pool,
        redis_client,
        config: config.clone(),
        board,
    };

    // The board is a public screen: any origin may read it.
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::HeaderName::from_static(routes::board::PASSWORD_HEADER),
        ]))
        .allow_origin(Any);

    let app = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/metrics", get(routes::metrics::metrics_handler))
        // Board
        .route("/board/today", get(routes::board::get_today_board))
        .route("/entries", post(routes::board::append_entry))
        .route("/entries/{kind}/today", get(routes::board::get_today_entry))
        .route("/entries/{kind}/history", get(routes::board::get_history))
        .route("/auth/unlock", post(routes::board::unlock))
        // Photos
        .route("/photos", post(routes::photos::upload_photo))
        .route(
            "/dish-photos",
            get(routes::photos::list_dish_photos).post(routes::photos::submit_dish_photo),
        )
        .route("/dish-photos/all", get(routes::photos::list_all_dish_photos))
        .route("/media/files/{*path}", get(routes::photos::serve_media))
        // Outbound
        .route("/catalog", get(routes::catalog::open_catalog))
        // WebSocket
        .route("/ws", get(routes::websocket::ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // Phone photos arrive uncompressed
        .layer(DefaultBodyLimit::max(25 * 1024 * 1024))
        .with_state(state);

    let addr = format!("{}:{}", config.host, config.port);
    info!("lunchboard API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
