use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde_json::{json, Value};
use tracing::warn;

use crate::{
    models::{
        board::{UnlockRequest, UnlockResponse},
        record::{EntryKind, Payload},
    },
    AppState,
};

/// Header carrying the shared password on writes to gated kinds.
pub const PASSWORD_HEADER: &str = "x-board-password";

fn internal(e: anyhow::Error) -> (StatusCode, Json<Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": e.to_string() })),
    )
}

fn bad_request(msg: impl ToString) -> (StatusCode, Json<Value>) {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": msg.to_string() })))
}

fn parse_kind(kind: &str) -> Result<EntryKind, (StatusCode, Json<Value>)> {
    kind.parse().map_err(bad_request)
}

/// GET /board/today: today's menu (with photos per section), advice, status and dish photos
pub async fn get_today_board(
    State(state): State<AppState>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    state
        .board
        .board_today()
        .await
        .map(|today| Json(json!(today)))
        .map_err(internal)
}

/// GET /entries/{kind}/today: `null` until something is entered today
pub async fn get_today_entry(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let kind = parse_kind(&kind)?;
    state
        .board
        .today(kind)
        .await
        .map(|record| Json(json!(record)))
        .map_err(internal)
}

/// GET /entries/{kind}/history: one record per day, newest day first
pub async fn get_history(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let kind = parse_kind(&kind)?;
    let history = if kind == EntryKind::Menu {
        state.board.menu_history().await.map(|days| json!(days))
    } else {
        state.board.history(kind).await.map(|records| json!(records))
    };
    history.map(Json).map_err(internal)
}

/// POST /entries: append a menu, advice or status record. Advice and status
/// need the shared password.
pub async fn append_entry(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<Payload>,
) -> Result<(StatusCode, Json<Value>), (StatusCode, Json<Value>)> {
    let kind = payload.kind();
    match kind {
        EntryKind::Burrito => {
            return Err(bad_request(
                "Burrito entries are read-only; use the status flags",
            ))
        }
        EntryKind::DishPhoto => {
            return Err(bad_request(
                "Dish photos are uploaded through POST /dish-photos",
            ))
        }
        _ => {}
    }

    if state.board.is_gated(kind) {
        let attempt = headers
            .get(PASSWORD_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        if !state.board.check_password(kind, attempt) {
            warn!("Rejected {} entry: wrong password", kind);
            return Err((
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Wrong password" })),
            ));
        }
    }

    if !payload.is_submittable() {
        return Err(bad_request(format!("The {kind} entry is empty")));
    }

    state
        .board
        .append(payload)
        .await
        .map(|record| (StatusCode::CREATED, Json(json!(record))))
        .map_err(internal)
}

/// POST /auth/unlock: check a password attempt for a gated kind
pub async fn unlock(
    State(state): State<AppState>,
    Json(body): Json<UnlockRequest>,
) -> Result<Json<UnlockResponse>, (StatusCode, Json<Value>)> {
    let kind = parse_kind(&body.kind)?;
    let unlocked = state.board.check_password(kind, &body.password);
    if !unlocked {
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Wrong password" })),
        ));
    }
    Ok(Json(UnlockResponse { unlocked }))
}
