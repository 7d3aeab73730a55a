use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::{models::board::BoardToday, AppState};

/// Which of today's entries are on the board.
fn board_summary(today: &BoardToday) -> Value {
    json!({
        "date": today.date_str,
        "menu": today.menu.is_some(),
        "advice": today.advice.is_some(),
        "status": today.status.is_some(),
        "dish_photos": today.dish_photos.len(),
    })
}

/// GET /health: database ping plus a summary of today's board
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    if let Err(e) = sqlx::query("SELECT 1").execute(&state.db).await {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "error", "db": e.to_string() })),
        );
    }

    match state.board.board_today().await {
        Ok(today) => (
            StatusCode::OK,
            Json(json!({ "status": "ok", "db": "connected", "board": board_summary(&today) })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "error", "board": e.to_string() })),
        ),
    }
}
