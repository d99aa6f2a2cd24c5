// src/intake/lists.rs

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    intake::rules::{validate_entry, ValidationState},
    models::members::Child,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListError {
    #[error("Entrada {0} não encontrada")]
    EntryNotFound(Uuid),

    #[error("Nenhuma remoção aguardando confirmação")]
    NoPendingRemoval,
}

/// Cada entrada recebe uma chave estável, independente da posição.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListEntry<T> {
    pub key: Uuid,
    #[serde(flatten)]
    pub value: T,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListEditor<T> {
    entries: Vec<ListEntry<T>>,
}

impl<T> Default for ListEditor<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T: Validate + Clone> ListEditor<T> {
    /// Carrega valores já salvos (modo edição), sem revalidar.
    pub fn from_values(values: Vec<T>) -> Self {
        Self {
            entries: values
                .into_iter()
                .map(|value| ListEntry {
                    key: Uuid::new_v4(),
                    value,
                })
                .collect(),
        }
    }

    /// Entradas inválidas não entram na lista; os problemas voltam para quem chamou.
    pub fn append(&mut self, value: T) -> Result<Uuid, ValidationState> {
        let issues = validate_entry(&value);
        if !issues.is_valid() {
            return Err(issues);
        }

        let key = Uuid::new_v4();
        self.entries.push(ListEntry { key, value });
        Ok(key)
    }

    pub fn remove(&mut self, key: Uuid) -> Result<T, ListError> {
        let position = self
            .entries
            .iter()
            .position(|entry| entry.key == key)
            .ok_or(ListError::EntryNotFound(key))?;
        Ok(self.entries.remove(position).value)
    }

    pub fn get(&self, key: Uuid) -> Option<&T> {
        self.entries
            .iter()
            .find(|entry| entry.key == key)
            .map(|entry| &entry.value)
    }

    pub fn entries(&self) -> &[ListEntry<T>] {
        &self.entries
    }

    pub fn values(&self) -> Vec<T> {
        self.entries.iter().map(|entry| entry.value.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =========================================================================
//  REMOÇÃO DE FILHOS (com confirmação)
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum ChildRemoval {
    /// Apaga também o registro salvo do filho
    Permanent,
    /// Só tira o filho deste formulário
    DetachOnly,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PendingChildRemoval {
    pub key: Uuid,
    pub child_id: Option<Uuid>,
    pub child_name: String,
}

/// O que a confirmação decidiu.
#[derive(Debug, Clone, PartialEq)]
pub enum ChildRemovalOutcome {
    /// Já saiu do formulário
    Removed(Child),
    /// Precisa apagar no banco antes de sair do formulário
    DeleteStored { key: Uuid, child_id: Uuid },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChildRemovalDialog {
    pending: Option<PendingChildRemoval>,
}

impl ChildRemovalDialog {
    pub fn open(
        &mut self,
        key: Uuid,
        children: &ListEditor<Child>,
    ) -> Result<&PendingChildRemoval, ListError> {
        let child = children.get(key).ok_or(ListError::EntryNotFound(key))?;
        Ok(self.pending.insert(PendingChildRemoval {
            key,
            child_id: child.id,
            child_name: child.full_name(),
        }))
    }

    pub fn pending(&self) -> Option<&PendingChildRemoval> {
        self.pending.as_ref()
    }

    pub fn cancel(&mut self) -> Result<(), ListError> {
        self.pending
            .take()
            .map(|_| ())
            .ok_or(ListError::NoPendingRemoval)
    }

    /// Fecha o diálogo. Um filho sem `id` salvo sai direto do formulário,
    /// mesmo no modo permanente.
    pub fn confirm(
        &mut self,
        mode: ChildRemoval,
        children: &mut ListEditor<Child>,
    ) -> Result<ChildRemovalOutcome, ListError> {
        let pending = self.pending.take().ok_or(ListError::NoPendingRemoval)?;

        match (mode, pending.child_id) {
            (ChildRemoval::Permanent, Some(child_id)) => {
                if children.get(pending.key).is_none() {
                    return Err(ListError::EntryNotFound(pending.key));
                }
                Ok(ChildRemovalOutcome::DeleteStored {
                    key: pending.key,
                    child_id,
                })
            }
            _ => children
                .remove(pending.key)
                .map(ChildRemovalOutcome::Removed),
        }
    }

    pub fn close(&mut self) {
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::need::Need;
    use chrono::NaiveDate;

    fn child(first_name: &str, id: Option<Uuid>) -> Child {
        Child {
            id,
            first_name: first_name.into(),
            last_name: "Said".into(),
            date_of_birth: NaiveDate::from_ymd_opt(2016, 9, 12),
            ..Default::default()
        }
    }

    #[test]
    fn invalid_entries_are_not_appended() {
        let mut needs: ListEditor<Need> = ListEditor::default();

        let issues = needs.append(Need::default()).unwrap_err();
        assert_eq!(
            issues.errors_for("description")[0].key,
            "validationDescriptionRequired"
        );
        assert!(needs.is_empty());

        let key = needs
            .append(Need {
                description: "Insulin".into(),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(needs.get(key).map(|n| n.description.as_str()), Some("Insulin"));
    }

    #[test]
    fn keys_survive_removal_of_earlier_entries() {
        let mut children = ListEditor::default();
        let first = children.append(child("Omar", None)).unwrap();
        let second = children.append(child("Laila", None)).unwrap();

        children.remove(first).unwrap();
        assert_eq!(children.get(second).map(|c| c.first_name.as_str()), Some("Laila"));
        assert_eq!(children.remove(first), Err(ListError::EntryNotFound(first)));
    }

    #[test]
    fn unsaved_child_is_removed_even_in_permanent_mode() {
        let mut children = ListEditor::default();
        let key = children.append(child("Omar", None)).unwrap();
        let mut dialog = ChildRemovalDialog::default();

        dialog.open(key, &children).unwrap();
        let outcome = dialog.confirm(ChildRemoval::Permanent, &mut children).unwrap();

        assert!(matches!(outcome, ChildRemovalOutcome::Removed(_)));
        assert!(children.is_empty());
        assert!(dialog.pending().is_none());
    }

    #[test]
    fn stored_child_waits_for_storage_deletion() {
        let child_id = Uuid::new_v4();
        let mut children = ListEditor::from_values(vec![child("Omar", Some(child_id))]);
        let key = children.entries()[0].key;
        let mut dialog = ChildRemovalDialog::default();

        let pending = dialog.open(key, &children).unwrap();
        assert_eq!(pending.child_name, "Omar Said");

        let outcome = dialog.confirm(ChildRemoval::Permanent, &mut children).unwrap();
        assert_eq!(outcome, ChildRemovalOutcome::DeleteStored { key, child_id });
        assert_eq!(children.len(), 1);
    }

    #[test]
    fn detach_only_keeps_storage_untouched() {
        let mut children = ListEditor::from_values(vec![child("Omar", Some(Uuid::new_v4()))]);
        let key = children.entries()[0].key;
        let mut dialog = ChildRemovalDialog::default();

        dialog.open(key, &children).unwrap();
        let outcome = dialog.confirm(ChildRemoval::DetachOnly, &mut children).unwrap();

        assert!(matches!(outcome, ChildRemovalOutcome::Removed(_)));
        assert!(children.is_empty());
    }

    #[test]
    fn confirm_and_cancel_require_an_open_dialog() {
        let mut children: ListEditor<Child> = ListEditor::default();
        let mut dialog = ChildRemovalDialog::default();

        assert_eq!(dialog.cancel(), Err(ListError::NoPendingRemoval));
        assert_eq!(
            dialog.confirm(ChildRemoval::DetachOnly, &mut children),
            Err(ListError::NoPendingRemoval)
        );
    }
}
