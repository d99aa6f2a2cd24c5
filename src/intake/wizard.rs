// src/intake/wizard.rs

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    intake::{
        field::{FieldError, FieldModel},
        lists::{
            ChildRemoval, ChildRemovalDialog, ChildRemovalOutcome, ListEntry, ListError,
            PendingChildRemoval,
        },
        normalize::normalize,
        rules::{ValidationIssue, ValidationState},
        steps::{NavigationError, Step, StepController},
    },
    models::{
        family::FamilySummary,
        individual::{IndividualRecord, IndividualSubmission},
        members::{AdditionalMember, Child},
        need::Need,
    },
};

#[derive(Debug, Error)]
pub enum IntakeError {
    #[error(transparent)]
    Field(#[from] FieldError),

    #[error(transparent)]
    Navigation(#[from] NavigationError),

    #[error(transparent)]
    List(#[from] ListError),

    #[error("Entrada de lista inválida")]
    InvalidEntry(ValidationState),

    #[error("O formulário tem erros")]
    Invalid(ValidationState),

    #[error("Já existe um envio em andamento")]
    SubmissionInFlight,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WizardMode {
    #[default]
    Create,
    Edit(Uuid),
}

impl WizardMode {
    pub fn individual_id(self) -> Option<Uuid> {
        match self {
            WizardMode::Create => None,
            WizardMode::Edit(id) => Some(id),
        }
    }
}

/// Uma sessão do assistente de cadastro: campos, etapas, listas e envio.
#[derive(Debug)]
pub struct IntakeWizard {
    id: Uuid,
    mode: WizardMode,
    model: FieldModel,
    steps: StepController,
    child_removal: ChildRemovalDialog,
    family_results: Vec<FamilySummary>,
    submitting: bool,
}

impl IntakeWizard {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            mode: WizardMode::Create,
            model: FieldModel::new(),
            steps: StepController::default(),
            child_removal: ChildRemovalDialog::default(),
            family_results: Vec::new(),
            submitting: false,
        }
    }

    /// Modo edição: começa com o registro salvo.
    pub fn edit(individual_id: Uuid, record: IndividualRecord) -> Self {
        Self {
            mode: WizardMode::Edit(individual_id),
            model: FieldModel::from_record(record),
            ..Self::new()
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn mode(&self) -> WizardMode {
        self.mode
    }

    pub fn model(&self) -> &FieldModel {
        &self.model
    }

    pub fn current_step(&self) -> Step {
        self.steps.current()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    fn ensure_idle(&self) -> Result<(), IntakeError> {
        if self.submitting {
            return Err(IntakeError::SubmissionInFlight);
        }
        Ok(())
    }

    // =========================================================================
    //  CAMPOS
    // =========================================================================

    pub fn set_value(&mut self, path: &str, value: Value) -> Result<(), IntakeError> {
        self.ensure_idle()?;
        self.model.set_value(path, value)?;
        Ok(())
    }

    pub fn get_value(&self, path: &str) -> Result<Value, IntakeError> {
        Ok(self.model.get_value(path)?)
    }

    pub fn errors_for(&self, path: &str) -> &[ValidationIssue] {
        self.model.get_errors(path)
    }

    // =========================================================================
    //  NAVEGAÇÃO
    // =========================================================================

    pub fn next(&mut self) -> Result<Step, IntakeError> {
        self.ensure_idle()?;
        Ok(self.steps.next(self.model.validation())?)
    }

    pub fn previous(&mut self) -> Result<Step, IntakeError> {
        self.ensure_idle()?;
        Ok(self.steps.previous())
    }

    pub fn goto(&mut self, step: Step) -> Result<Step, IntakeError> {
        self.ensure_idle()?;
        Ok(self.steps.goto(step)?)
    }

    pub fn progress(&self) -> u8 {
        StepController::progress(self.model.dirty_count())
    }

    // =========================================================================
    //  LISTAS
    // =========================================================================

    pub fn append_child(&mut self, child: Child) -> Result<Uuid, IntakeError> {
        self.ensure_idle()?;
        self.model.append_child(child).map_err(IntakeError::InvalidEntry)
    }

    pub fn append_member(&mut self, member: AdditionalMember) -> Result<Uuid, IntakeError> {
        self.ensure_idle()?;
        self.model.append_member(member).map_err(IntakeError::InvalidEntry)
    }

    pub fn append_need(&mut self, need: Need) -> Result<Uuid, IntakeError> {
        self.ensure_idle()?;
        self.model.append_need(need).map_err(IntakeError::InvalidEntry)
    }

    pub fn remove_member(&mut self, key: Uuid) -> Result<(), IntakeError> {
        self.ensure_idle()?;
        self.model.remove_member(key)?;
        Ok(())
    }

    pub fn remove_need(&mut self, key: Uuid) -> Result<(), IntakeError> {
        self.ensure_idle()?;
        self.model.remove_need(key)?;
        Ok(())
    }

    pub fn request_child_removal(&mut self, key: Uuid) -> Result<PendingChildRemoval, IntakeError> {
        self.ensure_idle()?;
        let pending = self.child_removal.open(key, self.model.children())?;
        Ok(pending.clone())
    }

    pub fn cancel_child_removal(&mut self) -> Result<(), IntakeError> {
        Ok(self.child_removal.cancel()?)
    }

    /// `DeleteStored` deixa o filho no formulário até o banco confirmar;
    /// quem chama termina com [`IntakeWizard::drop_child`].
    pub fn confirm_child_removal(
        &mut self,
        mode: ChildRemoval,
    ) -> Result<ChildRemovalOutcome, IntakeError> {
        self.ensure_idle()?;
        let outcome = self
            .child_removal
            .confirm(mode, self.model.children_mut())?;
        if matches!(outcome, ChildRemovalOutcome::Removed(_)) {
            self.model.list_changed("children");
        }
        Ok(outcome)
    }

    pub fn drop_child(&mut self, key: Uuid) -> Result<Child, IntakeError> {
        let child = self.model.children_mut().remove(key)?;
        self.model.list_changed("children");
        Ok(child)
    }

    // =========================================================================
    //  BUSCA DE FAMÍLIAS
    // =========================================================================

    pub fn set_family_results(&mut self, results: Vec<FamilySummary>) {
        self.family_results = results;
    }

    pub fn family_results(&self) -> &[FamilySummary] {
        &self.family_results
    }

    // =========================================================================
    //  ENVIO
    // =========================================================================

    /// Revalida tudo e normaliza. Se der certo, a sessão fica "enviando"
    /// até [`IntakeWizard::finish_submission`].
    pub fn begin_submission(&mut self) -> Result<(IndividualSubmission, WizardMode), IntakeError> {
        self.ensure_idle()?;
        let record = self.model.record();
        let validation = self.model.revalidate().clone();
        let submission = normalize(&record, &validation).map_err(IntakeError::Invalid)?;

        self.submitting = true;
        Ok((submission, self.mode))
    }

    /// Sucesso descarta o rascunho e volta para a primeira etapa;
    /// falha mantém tudo como estava.
    pub fn finish_submission(&mut self, success: bool) {
        self.submitting = false;
        if success {
            self.model = FieldModel::new();
            self.steps.reset();
            self.child_removal.close();
            self.family_results.clear();
            self.mode = WizardMode::Create;
        }
    }

    pub fn snapshot(&self) -> WizardSnapshot {
        let step = self.steps.current();
        WizardSnapshot {
            id: self.id,
            individual_id: self.mode.individual_id(),
            step,
            step_index: step.index(),
            step_title_key: step.title_key(),
            furthest_step: self.steps.furthest(),
            progress: self.progress(),
            record: self.model.record(),
            errors: self.model.validation().clone(),
            dirty: self.model.dirty_paths().map(str::to_string).collect(),
            entries: ListEntries {
                children: self.model.children().entries().to_vec(),
                additional_members: self.model.additional_members().entries().to_vec(),
                needs: self.model.needs().entries().to_vec(),
            },
            pending_child_removal: self.child_removal.pending().cloned(),
            family_results: self.family_results.clone(),
            submitting: self.submitting,
        }
    }
}

impl Default for IntakeWizard {
    fn default() -> Self {
        Self::new()
    }
}

// =========================================================================
//  FOTO DA SESSÃO (resposta da API)
// =========================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListEntries {
    pub children: Vec<ListEntry<Child>>,
    pub additional_members: Vec<ListEntry<AdditionalMember>>,
    pub needs: Vec<ListEntry<Need>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardSnapshot {
    pub id: Uuid,
    pub individual_id: Option<Uuid>,
    pub step: Step,
    pub step_index: usize,
    pub step_title_key: &'static str,
    pub furthest_step: Step,
    pub progress: u8,
    pub record: IndividualRecord,
    pub errors: ValidationState,
    pub dirty: Vec<String>,
    pub entries: ListEntries,
    pub pending_child_removal: Option<PendingChildRemoval>,
    pub family_results: Vec<FamilySummary>,
    pub submitting: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn fill_minimal(wizard: &mut IntakeWizard) {
        wizard.set_value("first_name", json!("Amal")).unwrap();
        wizard.set_value("last_name", json!("Said")).unwrap();
        wizard.set_value("district", json!("Downtown")).unwrap();
    }

    fn child() -> Child {
        Child {
            first_name: "Omar".into(),
            last_name: "Said".into(),
            date_of_birth: NaiveDate::from_ymd_opt(2019, 7, 8),
            ..Default::default()
        }
    }

    #[test]
    fn minimal_submission_has_no_sections() {
        let mut wizard = IntakeWizard::new();
        fill_minimal(&mut wizard);

        let (submission, mode) = wizard.begin_submission().unwrap();
        assert_eq!(mode, WizardMode::Create);
        assert_eq!(submission.assistance.present_count(), 0);
        assert!(submission.children.is_empty());
        assert!(wizard.is_submitting());
    }

    #[test]
    fn child_without_family_blocks_submission_until_named() {
        let mut wizard = IntakeWizard::new();
        fill_minimal(&mut wizard);
        wizard.append_child(child()).unwrap();

        match wizard.begin_submission() {
            Err(IntakeError::Invalid(errors)) => {
                assert_eq!(errors.len(), 1);
                assert_eq!(
                    errors.errors_for("family_id")[0].key,
                    "validationFamilyRequiredForChildren"
                );
            }
            other => panic!("esperava erro de validação, veio {:?}", other.map(|_| ())),
        }
        assert!(!wizard.is_submitting());

        wizard.set_value("new_family_name", json!("Said Family")).unwrap();
        assert!(wizard.begin_submission().is_ok());
    }

    #[test]
    fn in_flight_submission_rejects_mutations() {
        let mut wizard = IntakeWizard::new();
        fill_minimal(&mut wizard);
        wizard.begin_submission().unwrap();

        assert!(matches!(
            wizard.set_value("job", json!("Teacher")),
            Err(IntakeError::SubmissionInFlight)
        ));
        assert!(matches!(
            wizard.begin_submission(),
            Err(IntakeError::SubmissionInFlight)
        ));
    }

    #[test]
    fn success_resets_and_failure_keeps_state() {
        let mut wizard = IntakeWizard::new();
        fill_minimal(&mut wizard);
        wizard.next().unwrap();

        wizard.begin_submission().unwrap();
        wizard.finish_submission(false);
        assert_eq!(wizard.get_value("first_name").unwrap(), json!("Amal"));
        assert_eq!(wizard.current_step(), Step::Contact);
        assert_eq!(wizard.progress(), 38);

        wizard.begin_submission().unwrap();
        wizard.finish_submission(true);
        assert_eq!(wizard.get_value("first_name").unwrap(), json!(""));
        assert_eq!(wizard.current_step(), Step::Personal);
        assert_eq!(wizard.progress(), 0);
    }

    #[test]
    fn progress_only_grows_while_editing() {
        let mut wizard = IntakeWizard::new();
        let mut last = wizard.progress();

        for (path, value) in [
            ("first_name", json!("Amal")),
            ("first_name", json!("Amira")),
            ("job", json!("Tailor")),
            ("first_name", json!("")),
        ] {
            wizard.set_value(path, value).unwrap();
            assert!(wizard.progress() >= last);
            last = wizard.progress();
        }
    }

    #[test]
    fn permanent_removal_of_stored_child_waits_for_drop() {
        let stored = Child {
            id: Some(Uuid::new_v4()),
            ..child()
        };
        let record = IndividualRecord {
            children: vec![stored],
            ..Default::default()
        };
        let mut wizard = IntakeWizard::edit(Uuid::new_v4(), record);
        let key = wizard.snapshot().entries.children[0].key;

        wizard.request_child_removal(key).unwrap();
        let outcome = wizard.confirm_child_removal(ChildRemoval::Permanent).unwrap();
        assert!(matches!(outcome, ChildRemovalOutcome::DeleteStored { .. }));
        assert_eq!(wizard.model().children().len(), 1);

        wizard.drop_child(key).unwrap();
        assert!(wizard.model().children().is_empty());
        assert!(wizard.model().is_dirty("children"));
    }

    #[test]
    fn snapshot_reports_step_and_localizable_keys() {
        let wizard = IntakeWizard::new();
        let snapshot = serde_json::to_value(wizard.snapshot()).unwrap();

        assert_eq!(snapshot["step"], json!("personal"));
        assert_eq!(snapshot["stepTitleKey"], json!("personalInformation"));
        assert_eq!(snapshot["errors"]["first_name"], json!(["validationFirstNameRequired"]));
        assert_eq!(snapshot["record"]["children"], json!([]));
    }
}
