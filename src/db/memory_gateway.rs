// src/db/memory_gateway.rs
//
// Dublê de teste do gateway: guarda as linhas em memória e pode ser
// configurado para falhar em operações específicas.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::db::gateway::{
    check_filters, writable_columns, Filter, GatewayError, PersistenceGateway, Query, Table,
    Write,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Update,
    Delete,
    Query,
}

// O mesmo texto que `->>` devolveria no Postgres
fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

// Largura fixa para que a ordem do texto seja a ordem do tempo
fn now() -> Value {
    Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true))
}

fn matches(row: &Value, filter: &Filter) -> bool {
    let Some(text) = row.get(filter.column()).and_then(as_text) else {
        return false;
    };
    match filter {
        Filter::Eq { value, .. } => text == *value,
        Filter::Contains { value, .. } => text.to_lowercase().contains(&value.to_lowercase()),
        Filter::In { values, .. } => values.contains(&text),
    }
}

type Rows = HashMap<Table, Vec<Value>>;

// Colunas omitidas ficam de fora, como os DEFAULTs do banco
fn insert(rows: &mut Rows, table: Table, id: Uuid, record: Value) -> Result<Uuid, GatewayError> {
    writable_columns(table, &record)?;

    let mut row = match record {
        Value::Object(fields) => fields,
        _ => Map::new(),
    };
    row.insert("id".into(), Value::String(id.to_string()));
    row.insert("created_at".into(), now());
    if table.has_updated_at() {
        row.insert("updated_at".into(), Value::Null);
    }

    rows.entry(table).or_default().push(Value::Object(row));
    Ok(id)
}

fn update_row(rows: &mut Rows, table: Table, id: Uuid, record: Value) -> Result<Uuid, GatewayError> {
    writable_columns(table, &record)?;

    let row = rows
        .get_mut(&table)
        .and_then(|rows| {
            rows.iter_mut()
                .find(|row| row["id"] == Value::String(id.to_string()))
        })
        .and_then(Value::as_object_mut)
        .ok_or(GatewayError::NotFound {
            table: table.name(),
            id,
        })?;

    if let Value::Object(fields) = record {
        row.extend(fields);
    }
    if table.has_updated_at() {
        row.insert("updated_at".into(), now());
    }
    Ok(id)
}

fn delete_row(rows: &mut Rows, table: Table, id: Uuid) -> Result<(), GatewayError> {
    let rows = rows.entry(table).or_default();
    let before = rows.len();
    rows.retain(|row| row["id"] != Value::String(id.to_string()));

    if rows.len() == before {
        return Err(GatewayError::NotFound {
            table: table.name(),
            id,
        });
    }
    Ok(())
}

#[derive(Default)]
pub struct MemoryGateway {
    rows: Mutex<Rows>,
    failures: Mutex<HashSet<(Operation, Table)>>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn fail_on(&self, operation: Operation, table: Table) {
        self.failures.lock().await.insert((operation, table));
    }

    pub async fn recover(&self) {
        self.failures.lock().await.clear();
    }

    pub async fn rows(&self, table: Table) -> Vec<Value> {
        self.rows
            .lock()
            .await
            .get(&table)
            .cloned()
            .unwrap_or_default()
    }

    async fn check(&self, operation: Operation, table: Table) -> Result<(), GatewayError> {
        if self.failures.lock().await.contains(&(operation, table)) {
            return Err(GatewayError::Message(format!(
                "Falha simulada: {:?} em {}",
                operation,
                table.name()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl PersistenceGateway for MemoryGateway {
    async fn create(&self, table: Table, record: Value) -> Result<Uuid, GatewayError> {
        self.check(Operation::Create, table).await?;
        insert(&mut *self.rows.lock().await, table, Uuid::new_v4(), record)
    }

    async fn update(&self, table: Table, id: Uuid, record: Value) -> Result<Uuid, GatewayError> {
        self.check(Operation::Update, table).await?;
        update_row(&mut *self.rows.lock().await, table, id, record)
    }

    async fn delete(&self, table: Table, id: Uuid) -> Result<(), GatewayError> {
        self.check(Operation::Delete, table).await?;
        delete_row(&mut *self.rows.lock().await, table, id)
    }

    // Trabalha numa cópia e só a publica se todas as escritas passarem
    async fn apply(&self, writes: Vec<Write>) -> Result<(), GatewayError> {
        let mut rows = self.rows.lock().await;
        let mut staged = rows.clone();

        for write in writes {
            match write {
                Write::Create { table, id, record } => {
                    self.check(Operation::Create, table).await?;
                    insert(&mut staged, table, id, record)?;
                }
                Write::Update { table, id, record } => {
                    self.check(Operation::Update, table).await?;
                    update_row(&mut staged, table, id, record)?;
                }
                Write::Delete { table, id } => {
                    self.check(Operation::Delete, table).await?;
                    delete_row(&mut staged, table, id)?;
                }
            }
        }

        *rows = staged;
        Ok(())
    }

    async fn query(&self, table: Table, query: Query) -> Result<Vec<Value>, GatewayError> {
        self.check(Operation::Query, table).await?;
        check_filters(table, &query)?;

        let rows = self.rows.lock().await;
        let mut found: Vec<Value> = rows
            .get(&table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| query.filters.iter().all(|f| matches(row, f)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        // Mais recentes primeiro; inserções mais novas ganham no empate
        found.reverse();
        found.sort_by(|a, b| {
            b["created_at"]
                .as_str()
                .unwrap_or_default()
                .cmp(a["created_at"].as_str().unwrap_or_default())
        });
        if let Some(limit) = query.limit {
            found.truncate(limit);
        }
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn created_rows_can_be_queried_and_deleted() {
        let gateway = MemoryGateway::new();
        let id = gateway
            .create(Table::Families, json!({ "name": "Said Family", "district": "Downtown" }))
            .await
            .unwrap();

        let rows = gateway
            .query(Table::Families, Query::new().filter(Filter::contains("name", "said")))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["id"], json!(id.to_string()));

        gateway.delete(Table::Families, id).await.unwrap();
        assert!(matches!(
            gateway.delete(Table::Families, id).await,
            Err(GatewayError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn injected_failures_surface_as_messages() {
        let gateway = MemoryGateway::new();
        gateway.fail_on(Operation::Create, Table::Needs).await;

        let err = gateway
            .create(Table::Needs, json!({ "description": "Rent" }))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("needs"));
    }

    #[tokio::test]
    async fn batches_are_all_or_nothing() {
        let gateway = MemoryGateway::new();
        gateway.fail_on(Operation::Create, Table::Needs).await;

        let family = Uuid::new_v4();
        let writes = vec![
            Write::Create {
                table: Table::Families,
                id: family,
                record: json!({ "name": "Said Family" }),
            },
            Write::Create {
                table: Table::Needs,
                id: Uuid::new_v4(),
                record: json!({ "description": "Rent" }),
            },
        ];
        assert!(gateway.apply(writes.clone()).await.is_err());
        assert!(gateway.rows(Table::Families).await.is_empty());

        gateway.recover().await;
        gateway.apply(writes).await.unwrap();
        assert_eq!(gateway.rows(Table::Families).await[0]["id"], json!(family.to_string()));
        assert_eq!(gateway.rows(Table::Needs).await.len(), 1);
    }
}
