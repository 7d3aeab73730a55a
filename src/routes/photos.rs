use axum::{
    body::Body,
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::Response,
    Json,
};
use serde_json::{json, Value};

use crate::{
    models::photo::{DishPhotoForm, DishPhotoQuery},
    services::session::SubmitError,
    AppState,
};

fn bad_request(msg: impl ToString) -> (StatusCode, Json<Value>) {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": msg.to_string() })))
}

fn internal(msg: impl ToString) -> (StatusCode, Json<Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": msg.to_string() })),
    )
}

/// POST /photos: multipart `file`; compressed, stored, answered with its URL
pub async fn upload_photo(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    while let Some(field) = multipart.next_field().await.map_err(bad_request)? {
        if field.name() != Some("file") {
            continue;
        }
        let data = field.bytes().await.map_err(bad_request)?;
        let url = state.board.upload_photo(&data).await.map_err(internal)?;
        return Ok(Json(json!({ "url": url })));
    }

    Err(bad_request("No file provided"))
}

/// POST /dish-photos: multipart `file`, `dish_section`, `uploader_name`, `comment`, `rating`
pub async fn submit_dish_photo(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Value>), (StatusCode, Json<Value>)> {
    let mut form = DishPhotoForm::default();

    while let Some(field) = multipart.next_field().await.map_err(bad_request)? {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => form.photo = Some(field.bytes().await.map_err(bad_request)?.to_vec()),
            "dish_section" => form.dish_section = field.text().await.map_err(bad_request)?,
            "uploader_name" => form.uploader_name = field.text().await.map_err(bad_request)?,
            "comment" => form.comment = field.text().await.map_err(bad_request)?,
            "rating" => {
                form.rating = field
                    .text()
                    .await
                    .map_err(bad_request)?
                    .trim()
                    .parse()
                    .unwrap_or(0)
            }
            _ => {}
        }
    }

    match state.board.submit_dish_photo(form).await {
        Ok(record) => Ok((StatusCode::CREATED, Json(json!(record)))),
        Err(SubmitError::Invalid | SubmitError::NotReady) => Err(bad_request(
            "A photo, your name and a rating from 1 to 5 are required",
        )),
        Err(e @ SubmitError::Upload(_)) => Err(internal(e)),
        Err(SubmitError::Store(e)) => Err(internal(e)),
    }
}

/// GET /dish-photos?date=YYYY-MM-DD: photos of one business day (default today)
pub async fn list_dish_photos(
    State(state): State<AppState>,
    Query(params): Query<DishPhotoQuery>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let date = params.date.unwrap_or_else(|| state.board.today_key());
    state
        .board
        .dish_photos_on(&date)
        .await
        .map(|photos| Json(json!(photos)))
        .map_err(internal)
}

/// GET /dish-photos/all
pub async fn list_all_dish_photos(
    State(state): State<AppState>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    state
        .board
        .all_dish_photos()
        .await
        .map(|photos| Json(json!(photos)))
        .map_err(internal)
}

/// GET /media/files/{*path}: stored photos
pub async fn serve_media(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<Response, StatusCode> {
    let file_path = std::path::PathBuf::from(&state.config.media_dir).join(&path);

    // The resolved file must stay inside the media directory.
    let canonical_media =
        std::fs::canonicalize(&state.config.media_dir).map_err(|_| StatusCode::NOT_FOUND)?;
    let canonical_file = std::fs::canonicalize(&file_path).map_err(|_| StatusCode::NOT_FOUND)?;
    if !canonical_file.starts_with(&canonical_media) {
        return Err(StatusCode::FORBIDDEN);
    }

    let data = tokio::fs::read(&canonical_file)
        .await
        .map_err(|_| StatusCode::NOT_FOUND)?;
    let content_type = mime_guess::from_path(&canonical_file)
        .first_raw()
        .unwrap_or("application/octet-stream");

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, data.len().to_string())
        .header(header::CACHE_CONTROL, "public, max-age=31536000, immutable")
        .body(Body::from(data))
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}
