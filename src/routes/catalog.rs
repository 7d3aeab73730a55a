use axum::{
    extract::{Query, State},
    response::Redirect,
};
use serde::Deserialize;

use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CatalogQuery {
    /// Fragment of a product on the ordering site, e.g. "#290996".
    pub anchor: Option<String>,
}

/// Target URL for the external catalog, with the anchor (if any) appended.
pub fn catalog_target(base: &str, anchor: Option<&str>) -> String {
    match anchor.map(str::trim).filter(|a| !a.is_empty()) {
        Some(anchor) if anchor.starts_with('#') => format!("{base}{anchor}"),
        Some(anchor) => format!("{base}#{anchor}"),
        None => base.to_string(),
    }
}

/// GET /catalog?anchor=#290996: 307 to the ordering site
pub async fn open_catalog(
    State(state): State<AppState>,
    Query(params): Query<CatalogQuery>,
) -> Redirect {
    Redirect::temporary(&catalog_target(
        &state.config.catalog_url,
        params.anchor.as_deref(),
    ))
}
