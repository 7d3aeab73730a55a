use axum::http::{header, StatusCode};
use prometheus::{Encoder, TextEncoder, TEXT_FORMAT};

/// GET /metrics: Prometheus scrape endpoint (keep it off the public proxy).
pub async fn metrics_handler() -> Result<([(header::HeaderName, &'static str); 1], String), StatusCode>
{
    let mut buffer = Vec::new();
    TextEncoder::new()
        .encode(&prometheus::gather(), &mut buffer)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    let body = String::from_utf8(buffer).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok(([(header::CONTENT_TYPE, TEXT_FORMAT)], body))
}
