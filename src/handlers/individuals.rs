// src/handlers/individuals.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::i18n::Locale,
    models::individual::IndividualFilters,
};

// GET /api/individuals
#[utoipa::path(
    get,
    path = "/api/individuals",
    tag = "Individuals",
    responses(
        (status = 200, description = "Lista de indivíduos")
    ),
    params(
        ("district" = Option<String>, Query, description = "Bairro"),
        ("listStatus" = Option<String>, Query, description = "whitelist, blacklist ou waitinglist"),
        ("familyId" = Option<Uuid>, Query, description = "Família"),
        ("search" = Option<String>, Query, description = "Parte do nome completo")
    )
)]
pub async fn list_individuals(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(filters): Query<IndividualFilters>,
) -> Result<impl IntoResponse, ApiError> {
    let individuals = app_state
        .individual_service
        .list(filters)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(individuals)))
}

// GET /api/individuals/{id}
#[utoipa::path(
    get,
    path = "/api/individuals/{id}",
    tag = "Individuals",
    responses(
        (status = 200, description = "Indivíduo"),
        (status = 404, description = "Indivíduo não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do indivíduo")
    )
)]
pub async fn get_individual(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(individual_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let individual = app_state
        .individual_service
        .get(individual_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(individual)))
}

// GET /api/individuals/{id}/record
// O registro completo no formato do assistente (filhos, membros e necessidades)
#[utoipa::path(
    get,
    path = "/api/individuals/{id}/record",
    tag = "Individuals",
    responses(
        (status = 200, description = "Registro completo"),
        (status = 404, description = "Indivíduo não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do indivíduo")
    )
)]
pub async fn get_individual_record(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(individual_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let record = app_state
        .individual_service
        .load(individual_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(record)))
}

// DELETE /api/individuals/{id}
#[utoipa::path(
    delete,
    path = "/api/individuals/{id}",
    tag = "Individuals",
    responses(
        (status = 200, description = "Indivíduo removido"),
        (status = 404, description = "Indivíduo não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do indivíduo")
    )
)]
pub async fn delete_individual(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(individual_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .individual_service
        .delete(individual_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let message = app_state.i18n_store.translate(&locale.0, "successDelete", &[]);
    Ok((StatusCode::OK, Json(json!({ "message": message }))))
}
