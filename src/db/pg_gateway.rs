// src/db/pg_gateway.rs

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{Executor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::db::gateway::{
    check_filters, writable_columns, Filter, GatewayError, PersistenceGateway, Query, Table,
    Write,
};

// "50%_off" -> "%50\%\_off%"
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

// As escritas aceitam o pool ou uma transação aberta (`&mut *tx`)

async fn insert<'e, E>(
    executor: E,
    table: Table,
    id: Option<Uuid>,
    record: &Value,
) -> Result<Uuid, GatewayError>
where
    E: Executor<'e, Database = Postgres>,
{
    let columns = writable_columns(table, record)?;
    let t = table.name();
    let list = columns.join(", ");

    let sql = match (columns.is_empty(), id.is_some()) {
        (true, false) => format!("INSERT INTO {t} DEFAULT VALUES RETURNING id"),
        (true, true) => format!("INSERT INTO {t} (id) VALUES ($1) RETURNING id"),
        (false, false) => format!(
            "INSERT INTO {t} ({list}) SELECT {list} FROM jsonb_populate_record(NULL::{t}, $1) RETURNING id"
        ),
        (false, true) => format!(
            "INSERT INTO {t} (id, {list}) SELECT $2, {list} FROM jsonb_populate_record(NULL::{t}, $1) RETURNING id"
        ),
    };

    let mut query = sqlx::query_scalar::<_, Uuid>(&sql);
    if !columns.is_empty() {
        query = query.bind(record);
    }
    if let Some(id) = id {
        query = query.bind(id);
    }
    let id = query.fetch_one(executor).await?;

    tracing::debug!("Registro {} criado em {}", id, t);
    Ok(id)
}

async fn update_row<'e, E>(
    executor: E,
    table: Table,
    id: Uuid,
    record: &Value,
) -> Result<Uuid, GatewayError>
where
    E: Executor<'e, Database = Postgres>,
{
    let columns = writable_columns(table, record)?;

    let mut assignments: Vec<String> = columns
        .iter()
        .map(|column| format!("{c} = r.{c}", c = column))
        .collect();
    if table.has_updated_at() {
        assignments.push("updated_at = NOW()".to_string());
    }
    if assignments.is_empty() {
        return Err(GatewayError::Message(format!(
            "Nada para atualizar em {}",
            table.name()
        )));
    }

    let sql = format!(
        "UPDATE {t} SET {set} FROM jsonb_populate_record(NULL::{t}, $2) r WHERE {t}.id = $1 RETURNING {t}.id",
        t = table.name(),
        set = assignments.join(", "),
    );

    sqlx::query_scalar::<_, Uuid>(&sql)
        .bind(id)
        .bind(record)
        .fetch_optional(executor)
        .await?
        .ok_or(GatewayError::NotFound {
            table: table.name(),
            id,
        })
}

async fn delete_row<'e, E>(executor: E, table: Table, id: Uuid) -> Result<(), GatewayError>
where
    E: Executor<'e, Database = Postgres>,
{
    let sql = format!("DELETE FROM {} WHERE id = $1", table.name());
    let result = sqlx::query(&sql).bind(id).execute(executor).await?;

    if result.rows_affected() == 0 {
        return Err(GatewayError::NotFound {
            table: table.name(),
            id,
        });
    }
    Ok(())
}

/// Gateway sobre o Postgres. Os registros JSON viram linhas com
/// `jsonb_populate_record`, então o tipo de cada coluna vem do próprio banco.
#[derive(Clone)]
pub struct PgGateway {
    pool: PgPool,
}

impl PgGateway {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PersistenceGateway for PgGateway {
    async fn create(&self, table: Table, record: Value) -> Result<Uuid, GatewayError> {
        insert(&self.pool, table, None, &record).await
    }

    async fn update(&self, table: Table, id: Uuid, record: Value) -> Result<Uuid, GatewayError> {
        update_row(&self.pool, table, id, &record).await
    }

    async fn delete(&self, table: Table, id: Uuid) -> Result<(), GatewayError> {
        delete_row(&self.pool, table, id).await
    }

    async fn apply(&self, writes: Vec<Write>) -> Result<(), GatewayError> {
        // Qualquer erro devolve antes do commit e o drop do tx faz o rollback
        let mut tx = self.pool.begin().await?;
        let count = writes.len();

        for write in &writes {
            match write {
                Write::Create { table, id, record } => {
                    insert(&mut *tx, *table, Some(*id), record).await?;
                }
                Write::Update { table, id, record } => {
                    update_row(&mut *tx, *table, *id, record).await?;
                }
                Write::Delete { table, id } => {
                    delete_row(&mut *tx, *table, *id).await?;
                }
            }
        }

        tx.commit().await?;
        tracing::debug!("Lote de {} escritas aplicado", count);
        Ok(())
    }

    async fn query(&self, table: Table, query: Query) -> Result<Vec<Value>, GatewayError> {
        check_filters(table, &query)?;

        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT to_jsonb(t) FROM {} t WHERE TRUE", table.name()));

        for filter in query.filters {
            builder.push(format!(" AND to_jsonb(t) ->> '{}'", filter.column()));
            match filter {
                Filter::Eq { value, .. } => {
                    builder.push(" = ").push_bind(value);
                }
                Filter::Contains { value, .. } => {
                    builder.push(" ILIKE ").push_bind(like_pattern(&value));
                }
                Filter::In { values, .. } => {
                    builder.push(" = ANY(").push_bind(values).push(")");
                }
            }
        }

        builder.push(" ORDER BY t.created_at DESC");
        if let Some(limit) = query.limit {
            builder
                .push(" LIMIT ")
                .push_bind(i64::try_from(limit).unwrap_or(i64::MAX));
        }

        let rows = builder
            .build_query_scalar::<Value>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}
