// src/handlers/intake.rs

use std::collections::BTreeMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    i18n::I18nStore,
    intake::{lists::ChildRemoval, steps::Step, WizardSnapshot},
    middleware::i18n::Locale,
    models::{
        members::{AdditionalMember, Child},
        need::Need,
    },
};

// =============================================================================
//  RESPOSTA PADRÃO DA SESSÃO
// =============================================================================

/// A foto da sessão com os textos já traduzidos.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    #[serde(flatten)]
    pub session: WizardSnapshot,
    pub step_title: String,
    pub error_messages: BTreeMap<String, Vec<String>>,
}

fn session_response(session: WizardSnapshot, locale: &Locale, i18n: &I18nStore) -> SessionResponse {
    let lang = locale.0.as_str();
    SessionResponse {
        step_title: i18n.translate(lang, session.step_title_key, &[]),
        error_messages: session.errors.localize(i18n, lang),
        session,
    }
}

// =============================================================================
//  ÁREA 1: SESSÕES
// =============================================================================

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionPayload {
    /// Preenchido para editar um indivíduo já salvo
    #[serde(default)]
    pub individual_id: Option<Uuid>,
}

// POST /api/intake/sessions
#[utoipa::path(
    post,
    path = "/api/intake/sessions",
    tag = "Intake",
    request_body = CreateSessionPayload,
    responses(
        (status = 201, description = "Sessão criada"),
        (status = 404, description = "Indivíduo não encontrado")
    )
)]
pub async fn create_session(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<CreateSessionPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let session = app_state
        .intake_service
        .create_session(payload.individual_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((
        StatusCode::CREATED,
        Json(session_response(session, &locale, &app_state.i18n_store)),
    ))
}

// GET /api/intake/sessions/{id}
#[utoipa::path(
    get,
    path = "/api/intake/sessions/{id}",
    tag = "Intake",
    responses(
        (status = 200, description = "Foto da sessão"),
        (status = 404, description = "Sessão não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da sessão")
    )
)]
pub async fn get_session(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let session = app_state
        .intake_service
        .snapshot(session_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((
        StatusCode::OK,
        Json(session_response(session, &locale, &app_state.i18n_store)),
    ))
}

// DELETE /api/intake/sessions/{id}
#[utoipa::path(
    delete,
    path = "/api/intake/sessions/{id}",
    tag = "Intake",
    responses(
        (status = 204, description = "Sessão descartada"),
        (status = 404, description = "Sessão não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da sessão")
    )
)]
pub async fn discard_session(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .intake_service
        .discard(session_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  ÁREA 2: CAMPOS
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetFieldPayload {
    #[validate(length(min = 1, message = "validationRequired"))]
    #[schema(example = "debt_assistance.debt_amount")]
    pub path: String,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub value: Value,
}

// PUT /api/intake/sessions/{id}/fields
#[utoipa::path(
    put,
    path = "/api/intake/sessions/{id}/fields",
    tag = "Intake",
    request_body = SetFieldPayload,
    responses(
        (status = 200, description = "Campo atualizado"),
        (status = 400, description = "Campo desconhecido ou valor inválido"),
        (status = 404, description = "Sessão não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da sessão")
    )
)]
pub async fn set_field(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(session_id): Path<Uuid>,
    Json(payload): Json<SetFieldPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let session = app_state
        .intake_service
        .set_value(session_id, &payload.path, payload.value)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((
        StatusCode::OK,
        Json(session_response(session, &locale, &app_state.i18n_store)),
    ))
}

#[derive(Debug, Deserialize)]
pub struct FieldQuery {
    pub path: String,
}

// GET /api/intake/sessions/{id}/fields?path=
#[utoipa::path(
    get,
    path = "/api/intake/sessions/{id}/fields",
    tag = "Intake",
    responses(
        (status = 200, description = "Valor, erros e estado do campo"),
        (status = 400, description = "Campo desconhecido"),
        (status = 404, description = "Sessão não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da sessão"),
        ("path" = String, Query, description = "Caminho do campo, ex: debt_assistance.debt_amount")
    )
)]
pub async fn get_field(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(session_id): Path<Uuid>,
    Query(query): Query<FieldQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let field = app_state
        .intake_service
        .get_field(session_id, &query.path)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let messages: Vec<String> = field
        .errors
        .iter()
        .map(|issue| app_state.i18n_store.translate(&locale.0, &issue.key, &[]))
        .collect();

    Ok((
        StatusCode::OK,
        Json(json!({
            "field": field,
            "errorMessages": messages,
        })),
    ))
}

// =============================================================================
//  ÁREA 3: NAVEGAÇÃO
// =============================================================================

// POST /api/intake/sessions/{id}/next
#[utoipa::path(
    post,
    path = "/api/intake/sessions/{id}/next",
    tag = "Intake",
    responses(
        (status = 200, description = "Etapa seguinte"),
        (status = 404, description = "Sessão não encontrada"),
        (status = 409, description = "A etapa atual tem erros")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da sessão")
    )
)]
pub async fn next_step(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let session = app_state
        .intake_service
        .next(session_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((
        StatusCode::OK,
        Json(session_response(session, &locale, &app_state.i18n_store)),
    ))
}

// POST /api/intake/sessions/{id}/previous
#[utoipa::path(
    post,
    path = "/api/intake/sessions/{id}/previous",
    tag = "Intake",
    responses(
        (status = 200, description = "Etapa anterior"),
        (status = 404, description = "Sessão não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da sessão")
    )
)]
pub async fn previous_step(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let session = app_state
        .intake_service
        .previous(session_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((
        StatusCode::OK,
        Json(session_response(session, &locale, &app_state.i18n_store)),
    ))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct GotoPayload {
    pub step: Step,
}

// POST /api/intake/sessions/{id}/goto
#[utoipa::path(
    post,
    path = "/api/intake/sessions/{id}/goto",
    tag = "Intake",
    request_body = GotoPayload,
    responses(
        (status = 200, description = "Etapa escolhida"),
        (status = 404, description = "Sessão não encontrada"),
        (status = 409, description = "Etapa ainda não alcançada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da sessão")
    )
)]
pub async fn goto_step(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(session_id): Path<Uuid>,
    Json(payload): Json<GotoPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let session = app_state
        .intake_service
        .goto(session_id, payload.step)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((
        StatusCode::OK,
        Json(session_response(session, &locale, &app_state.i18n_store)),
    ))
}

// =============================================================================
//  ÁREA 4: LISTAS
// =============================================================================

fn entry_response(key: Uuid, session: WizardSnapshot, locale: &Locale, i18n: &I18nStore) -> Value {
    json!({
        "key": key,
        "session": session_response(session, locale, i18n),
    })
}

// POST /api/intake/sessions/{id}/children
#[utoipa::path(
    post,
    path = "/api/intake/sessions/{id}/children",
    tag = "Intake",
    request_body = Child,
    responses(
        (status = 201, description = "Filho adicionado"),
        (status = 400, description = "Dados inválidos"),
        (status = 404, description = "Sessão não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da sessão")
    )
)]
pub async fn add_child(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(session_id): Path<Uuid>,
    Json(child): Json<Child>,
) -> Result<impl IntoResponse, ApiError> {
    let (key, session) = app_state
        .intake_service
        .append_child(session_id, child)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((
        StatusCode::CREATED,
        Json(entry_response(key, session, &locale, &app_state.i18n_store)),
    ))
}

// POST /api/intake/sessions/{id}/members
#[utoipa::path(
    post,
    path = "/api/intake/sessions/{id}/members",
    tag = "Intake",
    request_body = AdditionalMember,
    responses(
        (status = 201, description = "Membro adicionado"),
        (status = 400, description = "Dados inválidos"),
        (status = 404, description = "Sessão não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da sessão")
    )
)]
pub async fn add_member(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(session_id): Path<Uuid>,
    Json(member): Json<AdditionalMember>,
) -> Result<impl IntoResponse, ApiError> {
    let (key, session) = app_state
        .intake_service
        .append_member(session_id, member)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((
        StatusCode::CREATED,
        Json(entry_response(key, session, &locale, &app_state.i18n_store)),
    ))
}

// POST /api/intake/sessions/{id}/needs
#[utoipa::path(
    post,
    path = "/api/intake/sessions/{id}/needs",
    tag = "Intake",
    request_body = Need,
    responses(
        (status = 201, description = "Necessidade adicionada"),
        (status = 400, description = "Dados inválidos"),
        (status = 404, description = "Sessão não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da sessão")
    )
)]
pub async fn add_need(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(session_id): Path<Uuid>,
    Json(need): Json<Need>,
) -> Result<impl IntoResponse, ApiError> {
    let (key, session) = app_state
        .intake_service
        .append_need(session_id, need)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((
        StatusCode::CREATED,
        Json(entry_response(key, session, &locale, &app_state.i18n_store)),
    ))
}

// DELETE /api/intake/sessions/{id}/members/{key}
#[utoipa::path(
    delete,
    path = "/api/intake/sessions/{id}/members/{key}",
    tag = "Intake",
    responses(
        (status = 200, description = "Membro removido"),
        (status = 404, description = "Sessão não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da sessão"),
        ("key" = Uuid, Path, description = "Chave da entrada na lista")
    )
)]
pub async fn remove_member(
    State(app_state): State<AppState>,
    locale: Locale,
    Path((session_id, key)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let session = app_state
        .intake_service
        .remove_member(session_id, key)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((
        StatusCode::OK,
        Json(session_response(session, &locale, &app_state.i18n_store)),
    ))
}

// DELETE /api/intake/sessions/{id}/needs/{key}
#[utoipa::path(
    delete,
    path = "/api/intake/sessions/{id}/needs/{key}",
    tag = "Intake",
    responses(
        (status = 200, description = "Necessidade removida"),
        (status = 404, description = "Sessão não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da sessão"),
        ("key" = Uuid, Path, description = "Chave da entrada na lista")
    )
)]
pub async fn remove_need(
    State(app_state): State<AppState>,
    locale: Locale,
    Path((session_id, key)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let session = app_state
        .intake_service
        .remove_need(session_id, key)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((
        StatusCode::OK,
        Json(session_response(session, &locale, &app_state.i18n_store)),
    ))
}

// --- Remoção de filhos ---

// POST /api/intake/sessions/{id}/children/{key}/removal
#[utoipa::path(
    post,
    path = "/api/intake/sessions/{id}/children/{key}/removal",
    tag = "Intake",
    responses(
        (status = 200, description = "Confirmação aberta"),
        (status = 404, description = "Sessão não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da sessão"),
        ("key" = Uuid, Path, description = "Chave da entrada na lista")
    )
)]
pub async fn request_child_removal(
    State(app_state): State<AppState>,
    locale: Locale,
    Path((session_id, key)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let (pending, session) = app_state
        .intake_service
        .request_child_removal(session_id, key)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "pending": pending,
            "session": session_response(session, &locale, &app_state.i18n_store),
        })),
    ))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ConfirmRemovalPayload {
    pub mode: ChildRemoval,
}

// POST /api/intake/sessions/{id}/children/removal/confirm
#[utoipa::path(
    post,
    path = "/api/intake/sessions/{id}/children/removal/confirm",
    tag = "Intake",
    request_body = ConfirmRemovalPayload,
    responses(
        (status = 200, description = "Filho removido"),
        (status = 404, description = "Sessão não encontrada"),
        (status = 409, description = "Nenhuma remoção pendente")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da sessão")
    )
)]
pub async fn confirm_child_removal(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(session_id): Path<Uuid>,
    Json(payload): Json<ConfirmRemovalPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let (report, session) = app_state
        .intake_service
        .confirm_child_removal(session_id, payload.mode)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let message = match payload.mode {
        ChildRemoval::Permanent => app_state.i18n_store.translate(&locale.0, "successDelete", &[]),
        ChildRemoval::DetachOnly => {
            app_state
                .i18n_store
                .translate(&locale.0, "childRemovedFromFamily", &[])
        }
    };

    Ok((
        StatusCode::OK,
        Json(json!({
            "message": message,
            "removal": report,
            "session": session_response(session, &locale, &app_state.i18n_store),
        })),
    ))
}

// DELETE /api/intake/sessions/{id}/children/removal
#[utoipa::path(
    delete,
    path = "/api/intake/sessions/{id}/children/removal",
    tag = "Intake",
    responses(
        (status = 200, description = "Confirmação cancelada"),
        (status = 404, description = "Sessão não encontrada"),
        (status = 409, description = "Nenhuma remoção pendente")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da sessão")
    )
)]
pub async fn cancel_child_removal(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let session = app_state
        .intake_service
        .cancel_child_removal(session_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((
        StatusCode::OK,
        Json(session_response(session, &locale, &app_state.i18n_store)),
    ))
}

// =============================================================================
//  ÁREA 5: BUSCA DE FAMÍLIAS
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct FamilySearchPayload {
    #[validate(length(max = 100, message = "validationTooLong"))]
    pub term: String,
}

// POST /api/intake/sessions/{id}/family-search
#[utoipa::path(
    post,
    path = "/api/intake/sessions/{id}/family-search",
    tag = "Intake",
    request_body = FamilySearchPayload,
    responses(
        (status = 202, description = "Busca agendada"),
        (status = 404, description = "Sessão não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da sessão")
    )
)]
pub async fn search_families(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(session_id): Path<Uuid>,
    Json(payload): Json<FamilySearchPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let scheduled = app_state
        .intake_service
        .search_families(session_id, payload.term)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::ACCEPTED, Json(json!({ "scheduled": scheduled }))))
}

// GET /api/intake/sessions/{id}/family-search
#[utoipa::path(
    get,
    path = "/api/intake/sessions/{id}/family-search",
    tag = "Intake",
    responses(
        (status = 200, description = "Últimos resultados"),
        (status = 404, description = "Sessão não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da sessão")
    )
)]
pub async fn get_family_results(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let (results, pending) = app_state
        .intake_service
        .family_results(session_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((
        StatusCode::OK,
        Json(json!({ "results": results, "pending": pending })),
    ))
}

// =============================================================================
//  ÁREA 6: ENVIO
// =============================================================================

// POST /api/intake/sessions/{id}/submit
#[utoipa::path(
    post,
    path = "/api/intake/sessions/{id}/submit",
    tag = "Intake",
    responses(
        (status = 201, description = "Indivíduo salvo (201 na criação, 200 na edição)"),
        (status = 400, description = "O formulário tem erros"),
        (status = 404, description = "Sessão não encontrada"),
        (status = 409, description = "Envio em andamento ou identidade duplicada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da sessão")
    )
)]
pub async fn submit(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let (report, session) = app_state
        .intake_service
        .submit(session_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let (status, key) = if report.created {
        (StatusCode::CREATED, "individualCreated")
    } else {
        (StatusCode::OK, "individualUpdated")
    };

    Ok((
        status,
        Json(json!({
            "message": app_state.i18n_store.translate(&locale.0, key, &[]),
            "individualId": report.individual_id,
            "created": report.created,
            "session": session_response(session, &locale, &app_state.i18n_store),
        })),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intake::IntakeWizard;

    #[test]
    fn session_response_translates_title_and_errors() {
        let i18n = I18nStore::load().unwrap();
        let mut wizard = IntakeWizard::new();
        wizard.set_value("phone", json!("abc")).unwrap();

        let response = session_response(wizard.snapshot(), &Locale("en".into()), &i18n);
        assert_eq!(response.step_title, "Personal Information");
        assert_eq!(
            response.error_messages["phone"],
            vec!["Invalid phone number format".to_string()]
        );

        let body = serde_json::to_value(&response).unwrap();
        assert_eq!(body["stepTitleKey"], json!("personalInformation"));
        assert_eq!(body["step"], json!("personal"));
        assert!(body["errors"]["phone"].is_array());
    }

    #[test]
    fn payload_errors_are_translated() {
        let i18n = I18nStore::load().unwrap();
        let payload = FamilySearchPayload {
            term: "x".repeat(101),
        };
        let errors = payload.validate().unwrap_err();

        let api = AppError::from(errors).to_api_error(&Locale("en".into()), &i18n);
        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        assert!(api.details.unwrap().to_string().contains("This value is too long"));
    }
}
