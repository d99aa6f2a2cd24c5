// src/db/gateway.rs

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

// =========================================================================
//  TABELAS CONHECIDAS
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Individuals,
    Families,
    Children,
    AdditionalMembers,
    Needs,
    ActivityLogs,
}

impl Table {
    pub fn name(self) -> &'static str {
        match self {
            Table::Individuals => "individuals",
            Table::Families => "families",
            Table::Children => "children",
            Table::AdditionalMembers => "additional_members",
            Table::Needs => "needs",
            Table::ActivityLogs => "activity_logs",
        }
    }

    /// Todas as colunas, na ordem da migração.
    pub fn columns(self) -> &'static [&'static str] {
        match self {
            Table::Individuals => &[
                "id",
                "first_name",
                "last_name",
                "id_number",
                "date_of_birth",
                "gender",
                "marital_status",
                "phone",
                "district",
                "address",
                "description",
                "job",
                "employment_status",
                "salary",
                "list_status",
                "family_id",
                "hashtags",
                "medical_help",
                "food_assistance",
                "marriage_assistance",
                "debt_assistance",
                "education_assistance",
                "shelter_assistance",
                "created_at",
                "updated_at",
            ],
            Table::Families => &[
                "id", "name", "status", "district", "phone", "address", "created_at",
            ],
            Table::Children => &[
                "id",
                "family_id",
                "parent_id",
                "first_name",
                "last_name",
                "date_of_birth",
                "gender",
                "school_stage",
                "description",
                "created_at",
                "updated_at",
            ],
            Table::AdditionalMembers => &[
                "id",
                "individual_id",
                "name",
                "date_of_birth",
                "gender",
                "role",
                "relation",
                "job_title",
                "phone_number",
                "created_at",
            ],
            Table::Needs => &[
                "id",
                "individual_id",
                "category",
                "priority",
                "description",
                "status",
                "created_at",
            ],
            Table::ActivityLogs => &[
                "id",
                "action",
                "entity_type",
                "entity_id",
                "entity_name",
                "details",
                "created_at",
            ],
        }
    }

    pub fn has_column(self, column: &str) -> bool {
        self.columns().contains(&column)
    }

    /// Colunas preenchidas pelo banco nunca vêm do registro.
    pub fn is_writable(self, column: &str) -> bool {
        self.has_column(column) && !matches!(column, "id" | "created_at" | "updated_at")
    }

    pub fn has_updated_at(self) -> bool {
        self.has_column("updated_at")
    }
}

// =========================================================================
//  FILTROS
// =========================================================================

/// Os valores são comparados como texto (`coluna ->> 'x'`).
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq { column: &'static str, value: String },
    /// Substring sem diferenciar maiúsculas
    Contains { column: &'static str, value: String },
    In { column: &'static str, values: Vec<String> },
}

impl Filter {
    pub fn equals(column: &'static str, value: impl ToString) -> Self {
        Filter::Eq {
            column,
            value: value.to_string(),
        }
    }

    /// Igualdade com o texto que o serde grava para `value`
    /// (`NeedStatus::InProgress` -> "in_progress").
    pub fn equals_wire(column: &'static str, value: impl Serialize) -> Self {
        let value = match serde_json::to_value(value) {
            Ok(Value::String(text)) => text,
            Ok(other) => other.to_string(),
            Err(_) => String::new(),
        };
        Filter::Eq { column, value }
    }

    pub fn contains(column: &'static str, value: impl Into<String>) -> Self {
        Filter::Contains {
            column,
            value: value.into(),
        }
    }

    pub fn is_in<I, V>(column: &'static str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: ToString,
    {
        Filter::In {
            column,
            values: values.into_iter().map(|v| v.to_string()).collect(),
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            Filter::Eq { column, .. } | Filter::Contains { column, .. } | Filter::In { column, .. } => {
                *column
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn maybe(self, filter: Option<Filter>) -> Self {
        match filter {
            Some(filter) => self.filter(filter),
            None => self,
        }
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

// =========================================================================
//  ERROS E CONTRATO
// =========================================================================

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("{0}")]
    Message(String),

    #[error("Registro {id} não encontrado em {table}")]
    NotFound { table: &'static str, id: Uuid },

    #[error("Coluna desconhecida em {table}: {column}")]
    UnknownColumn { table: &'static str, column: String },

    #[error("Erro de banco de dados: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Erro de serialização: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Checa o registro antes de mandar para o banco: precisa ser um objeto
/// com colunas graváveis da tabela.
pub fn writable_columns(table: Table, record: &Value) -> Result<Vec<&'static str>, GatewayError> {
    let object = record
        .as_object()
        .ok_or_else(|| GatewayError::Message(format!("O registro de {} deve ser um objeto", table.name())))?;

    object
        .keys()
        .map(|key| {
            table
                .columns()
                .iter()
                .copied()
                .find(|column| *column == key.as_str() && table.is_writable(column))
                .ok_or_else(|| GatewayError::UnknownColumn {
                    table: table.name(),
                    column: key.clone(),
                })
        })
        .collect()
}

pub fn check_filters(table: Table, query: &Query) -> Result<(), GatewayError> {
    match query.filters.iter().find(|f| !table.has_column(f.column())) {
        Some(filter) => Err(GatewayError::UnknownColumn {
            table: table.name(),
            column: filter.column().to_string(),
        }),
        None => Ok(()),
    }
}

// =========================================================================
//  LOTES
// =========================================================================

/// Uma escrita dentro de um lote. `Create` já leva o id da linha nova,
/// assim as escritas seguintes do mesmo lote podem apontar para ela.
#[derive(Debug, Clone, PartialEq)]
pub enum Write {
    Create { table: Table, id: Uuid, record: Value },
    Update { table: Table, id: Uuid, record: Value },
    Delete { table: Table, id: Uuid },
}

impl Write {
    pub fn table(&self) -> Table {
        match self {
            Write::Create { table, .. } | Write::Update { table, .. } | Write::Delete { table, .. } => {
                *table
            }
        }
    }
}

/// O que o núcleo precisa do armazenamento. Tudo trafega como JSON.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    async fn create(&self, table: Table, record: Value) -> Result<Uuid, GatewayError>;

    async fn update(&self, table: Table, id: Uuid, record: Value) -> Result<Uuid, GatewayError>;

    async fn delete(&self, table: Table, id: Uuid) -> Result<(), GatewayError>;

    /// Aplica todas as escritas, em ordem, ou nenhuma.
    async fn apply(&self, writes: Vec<Write>) -> Result<(), GatewayError>;

    /// Mais recentes primeiro.
    async fn query(&self, table: Table, query: Query) -> Result<Vec<Value>, GatewayError>;
}

impl dyn PersistenceGateway {
    /// `query` já decodificado para o tipo da linha.
    pub async fn fetch<T: DeserializeOwned>(
        &self,
        table: Table,
        query: Query,
    ) -> Result<Vec<T>, GatewayError> {
        self.query(table, query)
            .await?
            .into_iter()
            .map(|row| serde_json::from_value(row).map_err(GatewayError::from))
            .collect()
    }

    pub async fn fetch_one<T: DeserializeOwned>(
        &self,
        table: Table,
        id: Uuid,
    ) -> Result<Option<T>, GatewayError> {
        let mut rows = self
            .fetch::<T>(table, Query::new().filter(Filter::equals("id", id)).limit(1))
            .await?;
        Ok(rows.pop())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn records_may_only_touch_writable_columns() {
        let columns =
            writable_columns(Table::Needs, &json!({ "description": "Rent", "status": "pending" }))
                .unwrap();
        assert_eq!(columns.len(), 2);

        assert!(matches!(
            writable_columns(Table::Needs, &json!({ "id": "x" })),
            Err(GatewayError::UnknownColumn { .. })
        ));
        assert!(matches!(
            writable_columns(Table::Needs, &json!({ "nickname": "x" })),
            Err(GatewayError::UnknownColumn { .. })
        ));
        assert!(matches!(
            writable_columns(Table::Needs, &json!([1, 2])),
            Err(GatewayError::Message(_))
        ));
    }

    #[test]
    fn enum_filters_use_the_stored_text() {
        use crate::models::{activity_log::LogEntityType, need::NeedStatus};

        assert_eq!(
            Filter::equals_wire("status", NeedStatus::InProgress),
            Filter::equals("status", "in_progress")
        );
        assert_eq!(
            Filter::equals_wire("entity_type", LogEntityType::Child),
            Filter::equals("entity_type", "child")
        );
    }

    #[test]
    fn filters_are_checked_against_the_table() {
        let query = Query::new().filter(Filter::equals("district", "Downtown"));
        assert!(check_filters(Table::Individuals, &query).is_ok());
        assert!(check_filters(Table::Needs, &query).is_err());
    }
}
