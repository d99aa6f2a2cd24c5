// src/services/intake_service.rs

use std::{
    collections::HashMap,
    sync::{Arc, Weak},
    time::Duration,
};

use serde::Serialize;
use serde_json::Value;
use tokio::{
    sync::{Mutex, RwLock},
    time::Instant,
};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    intake::{
        debounce::Debouncer,
        lists::{ChildRemoval, ChildRemovalOutcome, PendingChildRemoval},
        rules::ValidationIssue,
        steps::Step,
        IntakeError, IntakeWizard, WizardSnapshot,
    },
    models::{
        family::FamilySummary,
        members::{AdditionalMember, Child},
        need::Need,
    },
    services::{family_service::FamilyService, individual_service::IndividualService},
};

pub const DEFAULT_SEARCH_WAIT: Duration = Duration::from_millis(300);
pub const DEFAULT_SESSION_IDLE: Duration = Duration::from_secs(60 * 60);

/// Uma sessão aberta: o assistente e a sua busca de famílias.
struct SessionHandle {
    wizard: Arc<Mutex<IntakeWizard>>,
    family_search: Debouncer<String>,
    touched: Mutex<Instant>,
}

type SessionStore = Arc<RwLock<HashMap<Uuid, Arc<SessionHandle>>>>;

// --- Respostas ---

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldView {
    pub path: String,
    pub value: Value,
    pub errors: Vec<ValidationIssue>,
    pub dirty: bool,
    pub step: Option<Step>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildRemovalReport {
    pub child_name: String,
    pub deleted_stored: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReport {
    pub individual_id: Uuid,
    pub created: bool,
}

/// Guarda as sessões do assistente em memória e liga cada uma aos serviços.
#[derive(Clone)]
pub struct IntakeService {
    sessions: SessionStore,
    individuals: IndividualService,
    families: FamilyService,
    search_wait: Duration,
    idle_timeout: Duration,
}

impl IntakeService {
    pub fn new(
        individuals: IndividualService,
        families: FamilyService,
        search_wait: Duration,
        idle_timeout: Duration,
    ) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            individuals,
            families,
            search_wait,
            idle_timeout,
        }
    }

    // =========================================================================
    //  SESSÕES
    // =========================================================================

    /// Abre uma sessão nova; com `individual_id` entra em modo edição.
    pub async fn create_session(&self, individual_id: Option<Uuid>) -> Result<WizardSnapshot, AppError> {
        let wizard = match individual_id {
            Some(id) => IntakeWizard::edit(id, self.individuals.load(id).await?),
            None => IntakeWizard::new(),
        };
        let session_id = wizard.id();
        let snapshot = wizard.snapshot();

        let wizard = Arc::new(Mutex::new(wizard));
        let family_search = self.family_search(Arc::downgrade(&wizard));
        self.sessions.write().await.insert(
            session_id,
            Arc::new(SessionHandle {
                wizard,
                family_search,
                touched: Mutex::new(Instant::now()),
            }),
        );

        tracing::info!("📝 Sessão de cadastro {} aberta", session_id);
        Ok(snapshot)
    }

    // Resultado da busca vai direto para a sessão, se ela ainda existir
    fn family_search(&self, wizard: Weak<Mutex<IntakeWizard>>) -> Debouncer<String> {
        let families = self.families.clone();
        Debouncer::new(self.search_wait, move |term: String| {
            let wizard = wizard.clone();
            let families = families.clone();
            async move {
                let Some(wizard) = wizard.upgrade() else {
                    return;
                };
                match families.search(&term).await {
                    Ok(results) => wizard.lock().await.set_family_results(results),
                    Err(e) => tracing::warn!("⚠️ Busca de famílias por '{}' falhou: {}", term, e),
                }
            }
        })
    }

    // Todo acesso conta como atividade da sessão
    async fn session(&self, id: Uuid) -> Result<Arc<SessionHandle>, AppError> {
        let sessions = self.sessions.read().await;
        let session = sessions.get(&id).cloned().ok_or(AppError::SessionNotFound)?;
        *session.touched.lock().await = Instant::now();
        Ok(session)
    }

    // Executa uma operação com a sessão travada e devolve a foto atualizada
    async fn with_wizard<T>(
        &self,
        id: Uuid,
        operation: impl FnOnce(&mut IntakeWizard) -> Result<T, IntakeError>,
    ) -> Result<(T, WizardSnapshot), AppError> {
        let session = self.session(id).await?;
        let mut wizard = session.wizard.lock().await;
        let value = operation(&mut *wizard)?;
        Ok((value, wizard.snapshot()))
    }

    pub async fn snapshot(&self, id: Uuid) -> Result<WizardSnapshot, AppError> {
        let session = self.session(id).await?;
        let snapshot = session.wizard.lock().await.snapshot();
        Ok(snapshot)
    }

    pub async fn discard(&self, id: Uuid) -> Result<(), AppError> {
        self.sessions
            .write()
            .await
            .remove(&id)
            .ok_or(AppError::SessionNotFound)?;
        tracing::info!("Sessão de cadastro {} descartada", id);
        Ok(())
    }

    /// Descarta as sessões sem acesso há mais de `idle_timeout`.
    pub async fn reap_idle(&self) -> usize {
        let mut sessions = self.sessions.write().await;

        let mut expired = Vec::new();
        for (id, session) in sessions.iter() {
            if session.touched.lock().await.elapsed() >= self.idle_timeout {
                expired.push(*id);
            }
        }
        for id in &expired {
            sessions.remove(id);
        }
        expired.len()
    }

    /// Varre as sessões paradas enquanto o processo estiver de pé.
    pub fn spawn_reaper(&self) {
        let service = self.clone();
        let period = (self.idle_timeout / 2).max(Duration::from_secs(1));

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                let reaped = service.reap_idle().await;
                if reaped > 0 {
                    tracing::info!("🧹 {} sessões de cadastro expiradas", reaped);
                }
            }
        });
    }

    // =========================================================================
    //  CAMPOS E NAVEGAÇÃO
    // =========================================================================

    pub async fn set_value(&self, id: Uuid, path: &str, value: Value) -> Result<WizardSnapshot, AppError> {
        let ((), snapshot) = self
            .with_wizard(id, |wizard| wizard.set_value(path, value))
            .await?;
        Ok(snapshot)
    }

    pub async fn get_field(&self, id: Uuid, path: &str) -> Result<FieldView, AppError> {
        let session = self.session(id).await?;
        let wizard = session.wizard.lock().await;
        let value = wizard.get_value(path).map_err(AppError::from)?;

        Ok(FieldView {
            path: path.to_string(),
            value,
            errors: wizard.errors_for(path).to_vec(),
            dirty: wizard.model().is_dirty(path),
            step: Step::for_path(path),
        })
    }

    pub async fn next(&self, id: Uuid) -> Result<WizardSnapshot, AppError> {
        Ok(self.with_wizard(id, IntakeWizard::next).await?.1)
    }

    pub async fn previous(&self, id: Uuid) -> Result<WizardSnapshot, AppError> {
        Ok(self.with_wizard(id, IntakeWizard::previous).await?.1)
    }

    pub async fn goto(&self, id: Uuid, step: Step) -> Result<WizardSnapshot, AppError> {
        Ok(self.with_wizard(id, |wizard| wizard.goto(step)).await?.1)
    }

    // =========================================================================
    //  LISTAS
    // =========================================================================

    pub async fn append_child(&self, id: Uuid, child: Child) -> Result<(Uuid, WizardSnapshot), AppError> {
        self.with_wizard(id, |wizard| wizard.append_child(child)).await
    }

    pub async fn append_member(
        &self,
        id: Uuid,
        member: AdditionalMember,
    ) -> Result<(Uuid, WizardSnapshot), AppError> {
        self.with_wizard(id, |wizard| wizard.append_member(member)).await
    }

    pub async fn append_need(&self, id: Uuid, need: Need) -> Result<(Uuid, WizardSnapshot), AppError> {
        self.with_wizard(id, |wizard| wizard.append_need(need)).await
    }

    pub async fn remove_member(&self, id: Uuid, key: Uuid) -> Result<WizardSnapshot, AppError> {
        Ok(self.with_wizard(id, |wizard| wizard.remove_member(key)).await?.1)
    }

    pub async fn remove_need(&self, id: Uuid, key: Uuid) -> Result<WizardSnapshot, AppError> {
        Ok(self.with_wizard(id, |wizard| wizard.remove_need(key)).await?.1)
    }

    // --- Remoção de filhos (com confirmação) ---

    pub async fn request_child_removal(
        &self,
        id: Uuid,
        key: Uuid,
    ) -> Result<(PendingChildRemoval, WizardSnapshot), AppError> {
        self.with_wizard(id, |wizard| wizard.request_child_removal(key)).await
    }

    pub async fn cancel_child_removal(&self, id: Uuid) -> Result<WizardSnapshot, AppError> {
        Ok(self
            .with_wizard(id, IntakeWizard::cancel_child_removal)
            .await?
            .1)
    }

    /// Remoção permanente de um filho salvo apaga a linha antes de tirá-lo
    /// do formulário. Se o banco falhar, o filho continua no formulário.
    pub async fn confirm_child_removal(
        &self,
        id: Uuid,
        mode: ChildRemoval,
    ) -> Result<(ChildRemovalReport, WizardSnapshot), AppError> {
        let session = self.session(id).await?;
        let mut wizard = session.wizard.lock().await;

        let report = match wizard.confirm_child_removal(mode)? {
            ChildRemovalOutcome::Removed(child) => ChildRemovalReport {
                child_name: child.full_name(),
                deleted_stored: false,
            },
            ChildRemovalOutcome::DeleteStored { key, child_id } => {
                let name = wizard
                    .model()
                    .children()
                    .get(key)
                    .map(Child::full_name)
                    .unwrap_or_default();
                self.individuals.delete_child(child_id, &name).await?;
                let child = wizard.drop_child(key)?;
                ChildRemovalReport {
                    child_name: child.full_name(),
                    deleted_stored: true,
                }
            }
        };
        Ok((report, wizard.snapshot()))
    }

    // =========================================================================
    //  BUSCA DE FAMÍLIAS
    // =========================================================================

    /// Agenda a busca. Devolve `true` quando esta chamada armou o timer.
    pub async fn search_families(&self, id: Uuid, term: String) -> Result<bool, AppError> {
        let session = self.session(id).await?;
        Ok(session.family_search.call(term))
    }

    pub async fn family_results(&self, id: Uuid) -> Result<(Vec<FamilySummary>, bool), AppError> {
        let session = self.session(id).await?;
        let results = session.wizard.lock().await.family_results().to_vec();
        Ok((results, session.family_search.is_pending()))
    }

    // =========================================================================
    //  ENVIO
    // =========================================================================

    /// A trava da sessão é liberada durante a gravação; um segundo envio
    /// nesse intervalo recebe `SubmissionInFlight`. Gravar e fechar o envio
    /// rodam numa task própria, então a sessão sai de "enviando" mesmo se a
    /// requisição for abandonada ou a gravação entrar em pânico.
    pub async fn submit(&self, id: Uuid) -> Result<(SubmissionReport, WizardSnapshot), AppError> {
        let session = self.session(id).await?;
        let (submission, mode) = session.wizard.lock().await.begin_submission()?;

        let wizard = session.wizard.clone();
        let individuals = self.individuals.clone();
        let task = tokio::spawn(async move {
            let result = tokio::spawn(async move { individuals.submit(submission, mode).await })
                .await
                .unwrap_or_else(|e| {
                    Err(anyhow::anyhow!("Falha na task de gravação: {}", e).into())
                });

            let mut wizard = wizard.lock().await;
            wizard.finish_submission(result.is_ok());
            result.map(|individual_id| (individual_id, wizard.snapshot()))
        });

        let (individual_id, snapshot) = task
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de envio: {}", e))??;

        Ok((
            SubmissionReport {
                individual_id,
                created: mode.individual_id().is_none(),
            },
            snapshot,
        ))
    }
}
