use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_gauge, register_gauge_vec, CounterVec, Gauge, GaugeVec,
};
use sqlx::PgPool;
use tracing::{info, warn};

use crate::models::record::EntryKind;

lazy_static! {
    // ── Event counters (increment on each event) ────────────────────────────
    pub static ref RECORDS_INSERTED_COUNTER: CounterVec = register_counter_vec!(
        "board_records_inserted_total",
        "Rows appended per board table",
        &["table"]
    ).unwrap();

    pub static ref PHOTO_UPLOADS_COUNTER: CounterVec = register_counter_vec!(
        "board_photo_uploads_total",
        "Photo uploads by outcome",
        &["status"]
    ).unwrap();

    pub static ref UNLOCK_ATTEMPTS_COUNTER: CounterVec = register_counter_vec!(
        "board_unlock_attempts_total",
        "Password unlock attempts per entry kind and outcome",
        &["kind", "status"]
    ).unwrap();

    pub static ref WS_CONNECTIONS_GAUGE: Gauge = register_gauge!(
        "board_ws_connections",
        "Open change-feed websocket connections"
    ).unwrap();

    // ── Business metrics ────────────────────────────────────────────────────
    pub static ref RECORDS_GAUGE: GaugeVec = register_gauge_vec!(
        "board_records_total",
        "Rows stored per board table",
        &["table"]
    ).unwrap();
}

/// Spawn the background metrics collector (refreshes every 5 minutes).
pub fn start(pool: PgPool) {
    tokio::spawn(async move {
        if let Err(e) = collect(&pool).await {
            warn!("Metrics: initial collection failed: {}", e);
        }
        loop {
            tokio::time::sleep(tokio::time::Duration::from_secs(300)).await;
            if let Err(e) = collect(&pool).await {
                warn!("Metrics: collection failed: {}", e);
            }
        }
    });
}

async fn collect(pool: &PgPool) -> anyhow::Result<()> {
    for kind in EntryKind::ALL {
        let table = kind.table();
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*)::BIGINT FROM {table}"))
            .fetch_one(pool)
            .await
            .unwrap_or(0);
        RECORDS_GAUGE.with_label_values(&[table]).set(count as f64);
    }

    info!("Metrics: collected for {} table(s)", EntryKind::ALL.len());
    Ok(())
}
