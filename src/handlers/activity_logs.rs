// src/handlers/activity_logs.rs

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{
    common::error::ApiError, config::AppState, middleware::i18n::Locale,
    models::activity_log::{ActivityLog, ActivityLogFilters, LogAction, LogEntityType},
};

// GET /api/activity-logs
#[utoipa::path(
    get,
    path = "/api/activity-logs",
    tag = "Activity Logs",
    responses(
        (status = 200, description = "Histórico, mais recentes primeiro", body = Vec<ActivityLog>)
    ),
    params(
        ("action" = Option<LogAction>, Query, description = "create, update ou delete"),
        ("entityType" = Option<LogEntityType>, Query, description = "individual, family ou child"),
        ("limit" = Option<usize>, Query, description = "Padrão: 50")
    )
)]
pub async fn list_activity_logs(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(filters): Query<ActivityLogFilters>,
) -> Result<impl IntoResponse, ApiError> {
    let logs = app_state
        .activity_log_service
        .list(filters)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(logs)))
}
