// src/intake/normalize.rs

use std::collections::HashSet;

use crate::{
    intake::rules::ValidationState,
    models::{
        assistance::AssistanceSections,
        individual::{IndividualRecord, IndividualSubmission},
        members::Child,
    },
};

/// Filhos únicos por (nome, sobrenome); o primeiro que aparece fica.
pub fn dedupe_children(children: &[Child]) -> Vec<Child> {
    let mut seen = HashSet::new();
    children
        .iter()
        .filter(|child| seen.insert(child.identity()))
        .cloned()
        .collect()
}

/// Transforma o rascunho no registro que vai para o banco.
/// Qualquer erro aborta e devolve todos os erros.
pub fn normalize(
    record: &IndividualRecord,
    validation: &ValidationState,
) -> Result<IndividualSubmission, ValidationState> {
    if !validation.is_valid() {
        return Err(validation.clone());
    }

    Ok(IndividualSubmission {
        person: record.person.clone(),
        assistance: AssistanceSections::from_draft(&record.assistance),
        children: dedupe_children(&record.children),
        additional_members: record.additional_members.clone(),
        needs: record.needs.clone(),
    })
}
