// src/handlers/families.rs

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use crate::{
    common::error::ApiError, config::AppState, middleware::i18n::Locale,
    models::family::FamilySummary,
};

#[derive(Debug, Deserialize)]
pub struct FamilySearchQuery {
    #[serde(default)]
    pub search: String,
}

// GET /api/families?search=
#[utoipa::path(
    get,
    path = "/api/families",
    tag = "Families",
    responses(
        (status = 200, description = "Famílias encontradas", body = Vec<FamilySummary>)
    ),
    params(
        ("search" = Option<String>, Query, description = "Parte do nome")
    )
)]
pub async fn search_families(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(query): Query<FamilySearchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let families = app_state
        .family_service
        .search(&query.search)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(families)))
}
