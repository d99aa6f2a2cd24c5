// src/services/individual_service.rs

use std::sync::Arc;

use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{Filter, PersistenceGateway, Query, Table, Write},
    intake::WizardMode,
    models::{
        activity_log::{LogAction, LogEntityType},
        assistance::AssistanceDraft,
        individual::{Individual, IndividualFilters, IndividualRecord, IndividualSubmission},
        members::{AdditionalMember, Child},
        need::{Need, NeedRow},
    },
    services::{activity_log_service::ActivityLogService, family_service::FamilyService},
};

// Colunas de texto opcionais: string vazia vira NULL
const OPTIONAL_TEXT_COLUMNS: [&str; 5] = ["id_number", "phone", "address", "description", "job"];

/// Monta a linha de `individuals`. Seções ausentes vão como `null`
/// para que uma edição apague o que existia.
fn individual_row(submission: &IndividualSubmission, family_id: Option<Uuid>) -> Result<Value, AppError> {
    let mut row = match serde_json::to_value(&submission.person)? {
        Value::Object(fields) => fields,
        _ => Map::new(),
    };
    row.remove("new_family_name");
    row.insert("family_id".into(), json!(family_id));

    for column in OPTIONAL_TEXT_COLUMNS {
        if row.get(column).and_then(Value::as_str).is_some_and(|v| v.trim().is_empty()) {
            row.insert(column.into(), Value::Null);
        }
    }

    let sections = serde_json::to_value(&submission.assistance)?;
    for section in AssistanceDraft::SECTION_NAMES {
        row.insert(
            section.into(),
            sections.get(section).cloned().unwrap_or(Value::Null),
        );
    }

    Ok(Value::Object(row))
}

fn child_row(child: &Child, individual_id: Uuid, family_id: Option<Uuid>) -> Value {
    json!({
        "family_id": family_id,
        "parent_id": individual_id,
        "first_name": child.first_name,
        "last_name": child.last_name,
        "date_of_birth": child.date_of_birth,
        "gender": child.gender,
        "school_stage": child.school_stage,
        "description": child.description,
    })
}

fn member_row(member: &AdditionalMember, individual_id: Uuid) -> Result<Value, AppError> {
    let mut row = serde_json::to_value(member)?;
    if let Value::Object(fields) = &mut row {
        fields.insert("individual_id".into(), json!(individual_id));
    }
    Ok(row)
}

fn need_row(need: &Need, individual_id: Uuid) -> Result<Value, AppError> {
    let mut row = serde_json::to_value(need)?;
    if let Value::Object(fields) = &mut row {
        fields.insert("individual_id".into(), json!(individual_id));
    }
    Ok(row)
}

/// Orquestra a gravação de um indivíduo e de tudo que pende dele.
#[derive(Clone)]
pub struct IndividualService {
    gateway: Arc<dyn PersistenceGateway>,
    activity: ActivityLogService,
}

impl IndividualService {
    pub fn new(gateway: Arc<dyn PersistenceGateway>, activity: ActivityLogService) -> Self {
        Self { gateway, activity }
    }

    // =========================================================================
    //  ENVIO DO ASSISTENTE
    // =========================================================================

    /// Grava tudo num único lote: se qualquer escrita falhar nada fica no
    /// banco e o mesmo envio pode ser repetido.
    pub async fn submit(
        &self,
        submission: IndividualSubmission,
        mode: WizardMode,
    ) -> Result<Uuid, AppError> {
        let own_id = mode.individual_id();
        self.ensure_unique_id_number(&submission.person.id_number, own_id)
            .await?;

        let mut writes = Vec::new();

        // 1. Família: nova ou existente
        let person = &submission.person;
        let (family_id, new_family) = match person.new_family_name.as_deref() {
            Some(name) => {
                let non_blank = |v: &str| (!v.trim().is_empty()).then(|| v.to_string());
                let (id, write) = FamilyService::create(
                    name,
                    non_blank(&person.district).as_deref(),
                    non_blank(&person.phone).as_deref(),
                    non_blank(&person.address).as_deref(),
                );
                writes.push(write);
                (Some(id), Some((id, name.trim())))
            }
            None => (person.family_id, None),
        };

        // 2. O próprio indivíduo
        let record = individual_row(&submission, family_id)?;
        let individual_id = own_id.unwrap_or_else(Uuid::new_v4);
        writes.push(match own_id {
            Some(id) => Write::Update {
                table: Table::Individuals,
                id,
                record,
            },
            None => Write::Create {
                table: Table::Individuals,
                id: individual_id,
                record,
            },
        });

        // 3. Filhos: os que já existem são atualizados
        for child in &submission.children {
            let record = child_row(child, individual_id, family_id);
            writes.push(match child.id {
                Some(id) => Write::Update {
                    table: Table::Children,
                    id,
                    record,
                },
                None => Write::Create {
                    table: Table::Children,
                    id: Uuid::new_v4(),
                    record,
                },
            });
        }

        // 4. Membros e necessidades são substituídos na edição
        if own_id.is_some() {
            writes.extend(self.owned_deletes(Table::AdditionalMembers, individual_id).await?);
            writes.extend(self.owned_deletes(Table::Needs, individual_id).await?);
        }
        for member in &submission.additional_members {
            writes.push(Write::Create {
                table: Table::AdditionalMembers,
                id: Uuid::new_v4(),
                record: member_row(member, individual_id)?,
            });
        }
        for need in &submission.needs {
            writes.push(Write::Create {
                table: Table::Needs,
                id: Uuid::new_v4(),
                record: need_row(need, individual_id)?,
            });
        }

        self.gateway.apply(writes).await?;

        if let Some((id, name)) = new_family {
            tracing::info!("👪 Família '{}' criada ({})", name, id);
            self.activity
                .log(LogAction::Create, LogEntityType::Family, Some(id), Some(name), None)
                .await;
        }

        let action = if own_id.is_some() {
            LogAction::Update
        } else {
            LogAction::Create
        };
        self.activity
            .log(
                action,
                LogEntityType::Individual,
                Some(individual_id),
                Some(&submission.person.full_name()),
                Some(json!({
                    "children": submission.children.len(),
                    "additional_members": submission.additional_members.len(),
                    "needs": submission.needs.len(),
                    "sections": submission.assistance.present_count(),
                })),
            )
            .await;

        tracing::info!("✅ Indivíduo {} salvo ({:?})", individual_id, action);
        Ok(individual_id)
    }

    async fn ensure_unique_id_number(
        &self,
        id_number: &str,
        own_id: Option<Uuid>,
    ) -> Result<(), AppError> {
        if id_number.is_empty() {
            return Ok(());
        }

        let matches = self
            .gateway
            .query(
                Table::Individuals,
                Query::new().filter(Filter::equals("id_number", id_number)),
            )
            .await?;

        let own = own_id.map(|id| id.to_string());
        let taken = matches
            .iter()
            .any(|row| row.get("id").and_then(Value::as_str) != own.as_deref());
        if taken {
            return Err(AppError::DuplicateIdNumber);
        }
        Ok(())
    }

    // Apaga as linhas de `table` que pertencem ao indivíduo
    async fn owned_deletes(&self, table: Table, individual_id: Uuid) -> Result<Vec<Write>, AppError> {
        let rows = self
            .gateway
            .query(table, Query::new().filter(Filter::equals("individual_id", individual_id)))
            .await?;

        Ok(rows
            .iter()
            .filter_map(|row| row.get("id").and_then(Value::as_str))
            .filter_map(|id| Uuid::parse_str(id).ok())
            .map(|id| Write::Delete { table, id })
            .collect())
    }

    // =========================================================================
    //  CONSULTAS
    // =========================================================================

    pub async fn get(&self, id: Uuid) -> Result<Individual, AppError> {
        self.gateway
            .fetch_one(Table::Individuals, id)
            .await?
            .ok_or(AppError::IndividualNotFound)
    }

    /// O registro salvo no formato do assistente (modo edição).
    pub async fn load(&self, id: Uuid) -> Result<IndividualRecord, AppError> {
        let individual = self.get(id).await?;

        let children: Vec<Child> = self
            .gateway
            .fetch(Table::Children, Query::new().filter(Filter::equals("parent_id", id)))
            .await?;
        let additional_members: Vec<AdditionalMember> = self
            .gateway
            .fetch(
                Table::AdditionalMembers,
                Query::new().filter(Filter::equals("individual_id", id)),
            )
            .await?;
        let needs: Vec<NeedRow> = self
            .gateway
            .fetch(Table::Needs, Query::new().filter(Filter::equals("individual_id", id)))
            .await?;

        let (person, assistance) = individual.into_draft();
        Ok(IndividualRecord {
            person,
            assistance,
            children,
            additional_members,
            needs: needs.into_iter().map(Need::from).collect(),
        })
    }

    pub async fn list(&self, filters: IndividualFilters) -> Result<Vec<Individual>, AppError> {
        let query = Query::new()
            .maybe(filters.district.map(|d| Filter::equals("district", d)))
            .maybe(filters.list_status.map(|s| Filter::equals_wire("list_status", s)))
            .maybe(filters.family_id.map(|id| Filter::equals("family_id", id)));

        let individuals: Vec<Individual> = self.gateway.fetch(Table::Individuals, query).await?;

        // Busca por nome completo, sem diferenciar maiúsculas
        let search = filters
            .search
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());
        Ok(match search {
            Some(term) => individuals
                .into_iter()
                .filter(|i| {
                    format!("{} {}", i.first_name, i.last_name)
                        .to_lowercase()
                        .contains(&term)
                })
                .collect(),
            None => individuals,
        })
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let individual = self.get(id).await?;
        self.gateway.delete(Table::Individuals, id).await?;

        let name = format!("{} {}", individual.first_name, individual.last_name);
        self.activity
            .log(LogAction::Delete, LogEntityType::Individual, Some(id), Some(&name), None)
            .await;
        tracing::info!("🗑️ Indivíduo {} removido", id);
        Ok(())
    }

    /// Apaga o registro salvo de um filho (remoção permanente no assistente).
    pub async fn delete_child(&self, child_id: Uuid, child_name: &str) -> Result<(), AppError> {
        self.gateway.delete(Table::Children, child_id).await?;
        self.activity
            .log(LogAction::Delete, LogEntityType::Child, Some(child_id), Some(child_name), None)
            .await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::{memory_gateway::Operation, MemoryGateway},
        intake::normalize::normalize,
        intake::rules::validate_record,
        models::{
            assistance::MedicalHelp,
            individual::PersonDetails,
            need::NeedCategory,
        },
    };
    use chrono::NaiveDate;

    fn service(gateway: Arc<MemoryGateway>) -> IndividualService {
        let activity = ActivityLogService::new(gateway.clone());
        IndividualService::new(gateway, activity)
    }

    fn amal() -> IndividualRecord {
        IndividualRecord {
            person: PersonDetails {
                first_name: "Amal".into(),
                last_name: "Said".into(),
                district: "Downtown".into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn submission(record: &IndividualRecord) -> IndividualSubmission {
        normalize(record, &validate_record(record)).unwrap()
    }

    fn child(first_name: &str) -> Child {
        Child {
            first_name: first_name.into(),
            last_name: "Said".into(),
            date_of_birth: NaiveDate::from_ymd_opt(2016, 3, 4),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn minimal_individual_is_stored_with_null_sections() {
        let gateway = Arc::new(MemoryGateway::new());
        let service = service(gateway.clone());

        let id = service.submit(submission(&amal()), WizardMode::Create).await.unwrap();

        let rows = gateway.rows(Table::Individuals).await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["medical_help"], Value::Null);
        assert_eq!(rows[0]["id_number"], Value::Null);
        assert!(rows[0].get("new_family_name").is_none());

        let stored = service.get(id).await.unwrap();
        assert_eq!(stored.district.as_deref(), Some("Downtown"));
        assert_eq!(gateway.rows(Table::ActivityLogs).await.len(), 1);
    }

    #[tokio::test]
    async fn new_family_is_created_and_linked_to_children() {
        let gateway = Arc::new(MemoryGateway::new());
        let service = service(gateway.clone());

        let mut record = amal();
        record.person.new_family_name = Some("Said Family".into());
        record.children = vec![child("Omar"), child("Laila")];
        service.submit(submission(&record), WizardMode::Create).await.unwrap();

        let families = gateway.rows(Table::Families).await;
        assert_eq!(families.len(), 1);
        let family_id = families[0]["id"].clone();

        let children = gateway.rows(Table::Children).await;
        assert_eq!(children.len(), 2);
        assert!(children.iter().all(|c| c["family_id"] == family_id));
    }

    #[tokio::test]
    async fn duplicate_id_number_is_rejected_except_for_self() {
        let gateway = Arc::new(MemoryGateway::new());
        let service = service(gateway.clone());

        let mut record = amal();
        record.person.id_number = "29801011234567".into();
        let id = service.submit(submission(&record), WizardMode::Create).await.unwrap();

        let again = service.submit(submission(&record), WizardMode::Create).await;
        assert!(matches!(again, Err(AppError::DuplicateIdNumber)));

        let update = service.submit(submission(&record), WizardMode::Edit(id)).await;
        assert!(update.is_ok());
    }

    #[tokio::test]
    async fn editing_replaces_needs_and_round_trips_the_record() {
        let gateway = Arc::new(MemoryGateway::new());
        let service = service(gateway.clone());

        let mut record = amal();
        record.assistance.medical_help = MedicalHelp {
            health_insurance_coverage: true,
            ..Default::default()
        };
        record.needs = vec![Need {
            category: NeedCategory::Food,
            description: "Monthly basket".into(),
            ..Default::default()
        }];
        let id = service.submit(submission(&record), WizardMode::Create).await.unwrap();

        let mut loaded = service.load(id).await.unwrap();
        assert!(loaded.assistance.medical_help.health_insurance_coverage);
        assert_eq!(loaded.needs.len(), 1);

        loaded.needs[0].description = "Rent".into();
        loaded.assistance.medical_help = MedicalHelp::default();
        service.submit(submission(&loaded), WizardMode::Edit(id)).await.unwrap();

        let needs = gateway.rows(Table::Needs).await;
        assert_eq!(needs.len(), 1);
        assert_eq!(needs[0]["description"], json!("Rent"));
        assert_eq!(gateway.rows(Table::Individuals).await[0]["medical_help"], Value::Null);
    }

    #[tokio::test]
    async fn gateway_failures_propagate() {
        let gateway = Arc::new(MemoryGateway::new());
        gateway.fail_on(Operation::Create, Table::Individuals).await;
        let service = service(gateway.clone());

        let result = service.submit(submission(&amal()), WizardMode::Create).await;
        assert!(matches!(result, Err(AppError::Gateway(_))));
    }

    #[tokio::test]
    async fn failed_child_insert_leaves_nothing_behind_and_can_be_retried() {
        let gateway = Arc::new(MemoryGateway::new());
        let service = service(gateway.clone());

        let mut record = amal();
        record.person.id_number = "29801011234567".into();
        record.person.new_family_name = Some("Said Family".into());
        record.children = vec![child("Omar"), child("Laila")];

        gateway.fail_on(Operation::Create, Table::Children).await;
        let failed = service.submit(submission(&record), WizardMode::Create).await;
        assert!(matches!(failed, Err(AppError::Gateway(_))));
        assert!(gateway.rows(Table::Individuals).await.is_empty());
        assert!(gateway.rows(Table::Families).await.is_empty());
        assert!(gateway.rows(Table::ActivityLogs).await.is_empty());

        gateway.recover().await;
        service.submit(submission(&record), WizardMode::Create).await.unwrap();
        assert_eq!(gateway.rows(Table::Individuals).await.len(), 1);
        assert_eq!(gateway.rows(Table::Families).await.len(), 1);
        assert_eq!(gateway.rows(Table::Children).await.len(), 2);
    }

    #[tokio::test]
    async fn failed_edit_keeps_stored_needs() {
        let gateway = Arc::new(MemoryGateway::new());
        let service = service(gateway.clone());

        let mut record = amal();
        record.needs = vec![Need {
            category: NeedCategory::Food,
            description: "Monthly basket".into(),
            ..Default::default()
        }];
        let id = service.submit(submission(&record), WizardMode::Create).await.unwrap();

        gateway.fail_on(Operation::Create, Table::Needs).await;
        let mut loaded = service.load(id).await.unwrap();
        loaded.needs[0].description = "Rent".into();
        assert!(service.submit(submission(&loaded), WizardMode::Edit(id)).await.is_err());

        let needs = gateway.rows(Table::Needs).await;
        assert_eq!(needs.len(), 1);
        assert_eq!(needs[0]["description"], json!("Monthly basket"));
    }

    #[tokio::test]
    async fn list_filters_by_district_and_name() {
        let gateway = Arc::new(MemoryGateway::new());
        let service = service(gateway.clone());

        service.submit(submission(&amal()), WizardMode::Create).await.unwrap();
        let mut other = amal();
        other.person.first_name = "Mona".into();
        other.person.district = "Harbor".into();
        service.submit(submission(&other), WizardMode::Create).await.unwrap();

        let downtown = service
            .list(IndividualFilters {
                district: Some("Downtown".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(downtown.len(), 1);

        let by_name = service
            .list(IndividualFilters {
                search: Some("mona said".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].first_name, "Mona");
    }

    #[tokio::test]
    async fn delete_unknown_individual_is_not_found() {
        let service = service(Arc::new(MemoryGateway::new()));
        assert!(matches!(
            service.delete(Uuid::new_v4()).await,
            Err(AppError::IndividualNotFound)
        ));
    }
}
