// src/handlers/needs.rs

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    common::error::ApiError, config::AppState, middleware::i18n::Locale,
    models::need::{NeedCategory, NeedFilters, NeedPriority, NeedRow, NeedStatus},
};

// GET /api/needs
#[utoipa::path(
    get,
    path = "/api/needs",
    tag = "Needs",
    responses(
        (status = 200, description = "Lista de necessidades", body = Vec<NeedRow>)
    ),
    params(
        ("category" = Option<NeedCategory>, Query, description = "Categoria"),
        ("priority" = Option<NeedPriority>, Query, description = "Prioridade"),
        ("status" = Option<NeedStatus>, Query, description = "Situação"),
        ("individualId" = Option<Uuid>, Query, description = "Indivíduo")
    )
)]
pub async fn list_needs(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(filters): Query<NeedFilters>,
) -> Result<impl IntoResponse, ApiError> {
    let needs = app_state
        .need_service
        .list(filters)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(needs)))
}
