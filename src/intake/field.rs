// src/intake/field.rs

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    intake::{
        lists::{ListEditor, ListError},
        rules::{validate_record, ValidationIssue, ValidationState},
    },
    models::{
        assistance::AssistanceDraft,
        individual::{EmploymentStatus, IndividualRecord, PersonDetails},
        members::{AdditionalMember, Child},
        need::Need,
    },
};

/// Listas só mudam pelos editores de lista.
pub const LIST_PATHS: [&str; 3] = ["children", "additional_members", "needs"];

#[derive(Debug, Error)]
pub enum FieldError {
    #[error("Campo desconhecido: {0}")]
    UnknownPath(String),

    #[error("Valor inválido para '{path}': {reason}")]
    InvalidValue { path: String, reason: String },

    #[error("'{0}' é uma lista; use os editores de lista")]
    ListPath(String),

    #[error("Falha ao serializar o formulário: {0}")]
    Serialization(#[from] serde_json::Error),
}

// Os campos editáveis um a um, na mesma forma do registro
#[derive(Serialize, Deserialize)]
struct EditableFields {
    #[serde(flatten)]
    person: PersonDetails,
    #[serde(flatten)]
    assistance: AssistanceDraft,
}

// "debt_assistance.debt_amount" -> "/debt_assistance/debt_amount"
fn to_pointer(path: &str) -> Option<String> {
    if path.is_empty() {
        return None;
    }
    let mut pointer = String::with_capacity(path.len() + 1);
    for segment in path.split('.') {
        if segment.is_empty() || segment.contains(['/', '~']) {
            return None;
        }
        pointer.push('/');
        pointer.push_str(segment);
    }
    Some(pointer)
}

fn root_of(path: &str) -> &str {
    path.split('.').next().unwrap_or(path)
}

/// Valor, estado "sujo" e erros de um registro em edição.
#[derive(Debug, Clone, Default)]
pub struct FieldModel {
    person: PersonDetails,
    assistance: AssistanceDraft,
    children: ListEditor<Child>,
    additional_members: ListEditor<AdditionalMember>,
    needs: ListEditor<Need>,
    dirty: BTreeSet<String>,
    validation: ValidationState,
}

impl FieldModel {
    pub fn new() -> Self {
        let mut model = Self::default();
        model.revalidate();
        model
    }

    /// Modelo pré-carregado a partir de um registro salvo (nada fica sujo).
    pub fn from_record(record: IndividualRecord) -> Self {
        let mut model = Self {
            person: record.person,
            assistance: record.assistance,
            children: ListEditor::from_values(record.children),
            additional_members: ListEditor::from_values(record.additional_members),
            needs: ListEditor::from_values(record.needs),
            ..Default::default()
        };
        model.revalidate();
        model
    }

    pub fn record(&self) -> IndividualRecord {
        IndividualRecord {
            person: self.person.clone(),
            assistance: self.assistance.clone(),
            children: self.children.values(),
            additional_members: self.additional_members.values(),
            needs: self.needs.values(),
        }
    }

    // =========================================================================
    //  LEITURA / ESCRITA POR CAMINHO
    // =========================================================================

    pub fn get_value(&self, path: &str) -> Result<Value, FieldError> {
        let pointer = to_pointer(path).ok_or_else(|| FieldError::UnknownPath(path.to_string()))?;
        let snapshot = serde_json::to_value(self.record())?;
        snapshot
            .pointer(&pointer)
            .cloned()
            .ok_or_else(|| FieldError::UnknownPath(path.to_string()))
    }

    /// Troca um valor checando o tipo contra a forma do registro.
    /// Em caso de erro nada muda.
    pub fn set_value(&mut self, path: &str, value: Value) -> Result<(), FieldError> {
        if LIST_PATHS.contains(&root_of(path)) {
            return Err(FieldError::ListPath(path.to_string()));
        }
        let pointer = to_pointer(path).ok_or_else(|| FieldError::UnknownPath(path.to_string()))?;

        let mut document = serde_json::to_value(EditableFields {
            person: self.person.clone(),
            assistance: self.assistance.clone(),
        })?;

        let slot = document
            .pointer_mut(&pointer)
            .ok_or_else(|| FieldError::UnknownPath(path.to_string()))?;
        *slot = value;

        let updated: EditableFields =
            serde_json::from_value(document).map_err(|e| FieldError::InvalidValue {
                path: path.to_string(),
                reason: e.to_string(),
            })?;

        self.person = updated.person;
        self.assistance = updated.assistance;
        self.apply_dependencies(path);

        self.dirty.insert(path.to_string());
        self.revalidate();
        Ok(())
    }

    // Limpa campos que dependem do que acabou de mudar
    fn apply_dependencies(&mut self, path: &str) {
        match path {
            "new_family_name" => {
                if self.person.new_family_name.as_deref().is_some_and(|n| !n.is_empty()) {
                    self.person.family_id = None;
                }
            }
            "family_id" => {
                if self.person.family_id.is_some() {
                    self.person.new_family_name = None;
                }
            }
            _ => {}
        }

        if self.person.employment_status != EmploymentStatus::HasSalary {
            self.person.salary = None;
        }
        if !self.assistance.debt_assistance.needs_debt_assistance {
            self.assistance.debt_assistance.clear_details();
        }
        if !self.assistance.marriage_assistance.marriage_support_needed {
            self.assistance.marriage_assistance.clear_details();
        }

        // Hashtags sem repetição, na ordem em que chegaram
        let mut seen = BTreeSet::new();
        self.person.hashtags.retain(|tag| seen.insert(tag.clone()));
    }

    // =========================================================================
    //  ESTADO
    // =========================================================================

    pub fn get_errors(&self, path: &str) -> &[ValidationIssue] {
        self.validation.errors_for(path)
    }

    pub fn validation(&self) -> &ValidationState {
        &self.validation
    }

    pub fn revalidate(&mut self) -> &ValidationState {
        self.validation = validate_record(&self.record());
        &self.validation
    }

    pub fn is_dirty(&self, path: &str) -> bool {
        self.dirty.contains(path)
            || self
                .dirty
                .iter()
                .any(|dirty| dirty.strip_prefix(path).is_some_and(|rest| rest.starts_with('.')))
    }

    pub fn dirty_count(&self) -> usize {
        self.dirty.len()
    }

    pub fn dirty_paths(&self) -> impl Iterator<Item = &str> {
        self.dirty.iter().map(String::as_str)
    }

    // =========================================================================
    //  LISTAS
    // =========================================================================

    pub fn children(&self) -> &ListEditor<Child> {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut ListEditor<Child> {
        &mut self.children
    }

    pub fn additional_members(&self) -> &ListEditor<AdditionalMember> {
        &self.additional_members
    }

    pub fn needs(&self) -> &ListEditor<Need> {
        &self.needs
    }

    /// Filho novo nunca traz `id`: só o registro carregado aponta para linhas salvas.
    pub fn append_child(&mut self, mut child: Child) -> Result<Uuid, ValidationState> {
        child.id = None;
        let key = self.children.append(child)?;
        self.list_changed("children");
        Ok(key)
    }

    pub fn append_member(&mut self, member: AdditionalMember) -> Result<Uuid, ValidationState> {
        let key = self.additional_members.append(member)?;
        self.list_changed("additional_members");
        Ok(key)
    }

    pub fn append_need(&mut self, need: Need) -> Result<Uuid, ValidationState> {
        let key = self.needs.append(need)?;
        self.list_changed("needs");
        Ok(key)
    }

    pub fn remove_member(&mut self, key: Uuid) -> Result<AdditionalMember, ListError> {
        let member = self.additional_members.remove(key)?;
        self.list_changed("additional_members");
        Ok(member)
    }

    pub fn remove_need(&mut self, key: Uuid) -> Result<Need, ListError> {
        let need = self.needs.remove(key)?;
        self.list_changed("needs");
        Ok(need)
    }

    /// Chamado depois de qualquer mudança feita direto em um editor.
    pub fn list_changed(&mut self, list: &str) {
        self.dirty.insert(list.to_string());
        self.revalidate();
    }
}
