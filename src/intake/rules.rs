// src/intake/rules.rs

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;
use validator::{Validate, ValidationErrors};

use crate::{
    i18n::I18nStore,
    models::individual::{EmploymentStatus, IndividualRecord},
};

/// Um problema de validação é só uma chave de tradução.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationIssue {
    pub key: String,
}

impl ValidationIssue {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

/// Resultado de uma passada de validação: caminho -> problemas.
/// Nunca é lançado; quem consome decide o que bloquear.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidationState {
    issues: BTreeMap<String, Vec<ValidationIssue>>,
}

impl ValidationState {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn errors_for(&self, path: &str) -> &[ValidationIssue] {
        self.issues.get(path).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.issues.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.issues.values().map(Vec::len).sum()
    }

    pub fn push(&mut self, path: impl Into<String>, key: &str) {
        self.issues
            .entry(path.into())
            .or_default()
            .push(ValidationIssue::new(key));
    }

    /// Copia os erros do `validator`, prefixando os caminhos (ex: `children.0`).
    pub fn absorb(&mut self, prefix: Option<&str>, errors: &ValidationErrors) {
        for (field, field_errors) in errors.field_errors() {
            let path = match prefix {
                Some(prefix) => format!("{}.{}", prefix, field),
                None => field.to_string(),
            };
            for error in field_errors.iter() {
                // A mensagem carrega a chave; sem ela, caímos no código
                let key = error.message.as_deref().unwrap_or(&error.code);
                self.push(path.clone(), key);
            }
        }
    }

    /// Textos prontos para exibição no idioma pedido.
    pub fn localize(&self, store: &I18nStore, lang: &str) -> BTreeMap<String, Vec<String>> {
        self.issues
            .iter()
            .map(|(path, issues)| {
                let messages = issues
                    .iter()
                    .map(|issue| store.translate(lang, &issue.key, &[]))
                    .collect();
                (path.clone(), messages)
            })
            .collect()
    }
}

// =========================================================================
//  VALIDAÇÃO DO REGISTRO COMPLETO
// =========================================================================

pub fn validate_entry<T: Validate>(entry: &T) -> ValidationState {
    let mut state = ValidationState::default();
    if let Err(errors) = entry.validate() {
        state.absorb(None, &errors);
    }
    state
}

pub fn validate_record(record: &IndividualRecord) -> ValidationState {
    let mut state = ValidationState::default();

    if let Err(errors) = record.person.validate() {
        state.absorb(None, &errors);
    }

    absorb_list(&mut state, "children", &record.children);
    absorb_list(&mut state, "additional_members", &record.additional_members);
    absorb_list(&mut state, "needs", &record.needs);

    apply_cross_field_rules(record, &mut state);
    state
}

fn absorb_list<T: Validate>(state: &mut ValidationState, list: &str, entries: &[T]) {
    for (index, entry) in entries.iter().enumerate() {
        if let Err(errors) = entry.validate() {
            state.absorb(Some(&format!("{}.{}", list, index)), &errors);
        }
    }
}

// Regras que olham para mais de um campo ao mesmo tempo
fn apply_cross_field_rules(record: &IndividualRecord, state: &mut ValidationState) {
    let person = &record.person;

    // --- Família ---
    match (&person.family_id, &person.new_family_name) {
        (Some(_), Some(_)) => state.push("family_id", "validationFamilyExclusive"),
        (None, None) if record.has_family_members() => {
            state.push("family_id", "validationFamilyRequiredForChildren")
        }
        _ => {}
    }

    if person
        .new_family_name
        .as_deref()
        .is_some_and(|name| name.trim().is_empty())
    {
        state.push("new_family_name", "validationFamilyNameEmpty");
    }

    // --- Salário ---
    if person.employment_status == EmploymentStatus::HasSalary
        && !person.salary.is_some_and(|salary| salary > Decimal::ZERO)
    {
        state.push("salary", "validationSalaryRequired");
    }

    // --- Dívidas ---
    let debt = &record.assistance.debt_assistance;
    if debt.needs_debt_assistance && debt.debt_amount <= Decimal::ZERO {
        state.push("debt_assistance.debt_amount", "validationDebtAmountRequired");
    }
}
