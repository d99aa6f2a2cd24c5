// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::{
    db::GatewayError,
    i18n::I18nStore,
    intake::{
        field::FieldError,
        lists::ListError,
        rules::ValidationState,
        steps::NavigationError,
        IntakeError,
    },
    middleware::i18n::Locale,
};

// Nosso tipo de erro, com `thiserror` para a mensagem de log.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("O formulário tem erros")]
    IntakeValidation(ValidationState),

    #[error("Erro de campo: {0}")]
    Field(FieldError),

    #[error("Navegação recusada: {0}")]
    Navigation(NavigationError),

    #[error("Sessão de cadastro não encontrada")]
    SessionNotFound,

    #[error("Indivíduo não encontrado")]
    IndividualNotFound,

    #[error("Envio já em andamento")]
    SubmissionInFlight,

    #[error("Nenhuma remoção pendente")]
    NoPendingRemoval,

    #[error("Entrada de lista não encontrada")]
    ListEntryNotFound,

    #[error("Número de identidade duplicado")]
    DuplicateIdNumber,

    #[error("Erro no gateway: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Erro de serialização: {0}")]
    Serialization(#[from] serde_json::Error),

    // Qualquer outro erro inesperado
    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),
}

impl From<IntakeError> for AppError {
    fn from(err: IntakeError) -> Self {
        match err {
            IntakeError::Field(e) => AppError::Field(e),
            IntakeError::Navigation(e) => AppError::Navigation(e),
            IntakeError::List(ListError::EntryNotFound(_)) => AppError::ListEntryNotFound,
            IntakeError::List(ListError::NoPendingRemoval) => AppError::NoPendingRemoval,
            IntakeError::InvalidEntry(state) | IntakeError::Invalid(state) => {
                AppError::IntakeValidation(state)
            }
            IntakeError::SubmissionInFlight => AppError::SubmissionInFlight,
        }
    }
}

/// O erro já traduzido, pronto para virar resposta HTTP.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

impl AppError {
    pub fn to_api_error(&self, locale: &Locale, i18n: &I18nStore) -> ApiError {
        let lang = locale.0.as_str();
        let t = |key: &str, params: &[(&str, &str)]| i18n.translate(lang, key, params);

        let simple = |status: StatusCode, key: &str| ApiError {
            status,
            error: t(key, &[]),
            details: None,
        };

        match self {
            AppError::ValidationError(errors) => {
                let mut state = ValidationState::default();
                state.absorb(None, errors);
                ApiError {
                    status: StatusCode::BAD_REQUEST,
                    error: t("errorInvalidFields", &[]),
                    details: Some(json!(state.localize(i18n, lang))),
                }
            }
            AppError::IntakeValidation(state) => ApiError {
                status: StatusCode::BAD_REQUEST,
                error: t("errorInvalidFields", &[]),
                details: Some(json!(state.localize(i18n, lang))),
            },

            AppError::Field(FieldError::UnknownPath(path)) => ApiError {
                status: StatusCode::BAD_REQUEST,
                error: t("errorUnknownField", &[("path", path.as_str())]),
                details: None,
            },
            AppError::Field(FieldError::InvalidValue { path, reason }) => ApiError {
                status: StatusCode::BAD_REQUEST,
                error: t("errorInvalidFieldValue", &[("path", path.as_str())]),
                details: Some(json!({ "reason": reason })),
            },
            AppError::Field(FieldError::ListPath(path)) => ApiError {
                status: StatusCode::BAD_REQUEST,
                error: t("errorListField", &[("path", path.as_str())]),
                details: None,
            },

            AppError::Navigation(NavigationError::NotReached(step)) => {
                let title = t(step.title_key(), &[]);
                ApiError {
                    status: StatusCode::CONFLICT,
                    error: t("errorStepNotReached", &[("step", title.as_str())]),
                    details: None,
                }
            }
            AppError::Navigation(NavigationError::StepHasErrors { step, paths }) => {
                let title = t(step.title_key(), &[]);
                ApiError {
                    status: StatusCode::CONFLICT,
                    error: t("errorStepHasErrors", &[("step", title.as_str())]),
                    details: Some(json!({ "paths": paths })),
                }
            }

            AppError::SessionNotFound => simple(StatusCode::NOT_FOUND, "errorSessionNotFound"),
            AppError::IndividualNotFound => simple(StatusCode::NOT_FOUND, "errorIndividualNotFound"),
            AppError::ListEntryNotFound => simple(StatusCode::NOT_FOUND, "errorListEntryNotFound"),
            AppError::Gateway(GatewayError::NotFound { .. }) => {
                simple(StatusCode::NOT_FOUND, "errorRecordNotFound")
            }
            AppError::SubmissionInFlight => simple(StatusCode::CONFLICT, "errorSubmissionInFlight"),
            AppError::NoPendingRemoval => simple(StatusCode::CONFLICT, "errorNoPendingRemoval"),
            AppError::DuplicateIdNumber => simple(StatusCode::CONFLICT, "errorDuplicateIdNumber"),

            // A mensagem do gateway vai junto, sem tradução
            AppError::Gateway(e) => {
                tracing::error!("Erro no gateway: {}", e);
                ApiError {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    error: t("errorUnexpected", &[]),
                    details: Some(json!({ "message": e.to_string() })),
                }
            }

            // Vira 500 genérico; o `tracing` guarda o detalhe.
            AppError::Field(FieldError::Serialization(e)) | AppError::Serialization(e) => {
                tracing::error!("Erro de serialização: {}", e);
                simple(StatusCode::INTERNAL_SERVER_ERROR, "errorUnexpected")
            }
            AppError::InternalServerError(e) => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                simple(StatusCode::INTERNAL_SERVER_ERROR, "errorUnexpected")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intake::steps::Step;

    fn store() -> I18nStore {
        I18nStore::load().unwrap()
    }

    #[test]
    fn intake_validation_is_localized_per_path() {
        let mut state = ValidationState::default();
        state.push("district", "validationDistrictRequired");

        let api = AppError::IntakeValidation(state).to_api_error(&Locale("en".into()), &store());
        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        assert_eq!(api.details, Some(json!({ "district": ["District is required"] })));
    }

    #[test]
    fn navigation_errors_name_the_step() {
        let api = AppError::Navigation(NavigationError::NotReached(Step::Needs))
            .to_api_error(&Locale("en".into()), &store());
        assert_eq!(api.status, StatusCode::CONFLICT);
        assert!(api.error.contains("Needs"));
    }

    #[test]
    fn gateway_message_is_carried_in_details() {
        let err = AppError::Gateway(GatewayError::Message("connection refused".into()));
        let api = err.to_api_error(&Locale("ar".into()), &store());

        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.details, Some(json!({ "message": "connection refused" })));
    }

    #[test]
    fn internal_errors_hide_their_detail() {
        let err = AppError::from(anyhow::anyhow!("task cancelada"));
        let api = err.to_api_error(&Locale("en".into()), &store());

        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.details, None);
        assert!(!api.error.contains("task"));
    }

    #[test]
    fn intake_errors_map_onto_app_errors() {
        assert!(matches!(
            AppError::from(IntakeError::SubmissionInFlight),
            AppError::SubmissionInFlight
        ));
        assert!(matches!(
            AppError::from(IntakeError::List(ListError::NoPendingRemoval)),
            AppError::NoPendingRemoval
        ));
    }
}
