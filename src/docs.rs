// src/docs.rs

use utoipa::OpenApi;
use crate::handlers;
use crate::intake;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Intake: sessão ---
        handlers::intake::create_session,
        handlers::intake::get_session,
        handlers::intake::discard_session,
        handlers::intake::set_field,
        handlers::intake::get_field,

        // --- Intake: navegação ---
        handlers::intake::next_step,
        handlers::intake::previous_step,
        handlers::intake::goto_step,

        // --- Intake: listas ---
        handlers::intake::add_child,
        handlers::intake::add_member,
        handlers::intake::add_need,
        handlers::intake::remove_member,
        handlers::intake::remove_need,
        handlers::intake::request_child_removal,
        handlers::intake::confirm_child_removal,
        handlers::intake::cancel_child_removal,

        // --- Intake: família e envio ---
        handlers::intake::search_families,
        handlers::intake::get_family_results,
        handlers::intake::submit,

        // --- Individuals ---
        handlers::individuals::list_individuals,
        handlers::individuals::get_individual,
        handlers::individuals::get_individual_record,
        handlers::individuals::delete_individual,

        // --- Outros ---
        handlers::families::search_families,
        handlers::needs::list_needs,
        handlers::activity_logs::list_activity_logs,
    ),
    components(
        schemas(
            // --- Assistente ---
            intake::steps::Step,
            intake::lists::ChildRemoval,
            intake::lists::PendingChildRemoval,

            // --- Membros ---
            models::individual::Gender,
            models::members::ChildGender,
            models::members::SchoolStage,
            models::members::MemberRole,
            models::members::Child,
            models::members::AdditionalMember,

            // --- Necessidades ---
            models::need::NeedCategory,
            models::need::NeedPriority,
            models::need::NeedStatus,
            models::need::Need,
            models::need::NeedRow,

            // --- Famílias e histórico ---
            models::family::FamilyStatus,
            models::family::FamilySummary,
            models::activity_log::LogAction,
            models::activity_log::LogEntityType,
            models::activity_log::ActivityLog,

            // --- Payloads ---
            handlers::intake::CreateSessionPayload,
            handlers::intake::SetFieldPayload,
            handlers::intake::GotoPayload,
            handlers::intake::ConfirmRemovalPayload,
            handlers::intake::FamilySearchPayload,
        )
    ),
    tags(
        (name = "Intake", description = "Assistente de Cadastro de Indivíduos"),
        (name = "Individuals", description = "Consulta e Remoção de Indivíduos"),
        (name = "Families", description = "Busca de Famílias"),
        (name = "Needs", description = "Necessidades Registradas"),
        (name = "Activity Logs", description = "Histórico de Alterações")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_intake_routes() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/intake/sessions"));
        assert!(doc.paths.paths.contains_key("/api/individuals/{id}/record"));
    }
}
