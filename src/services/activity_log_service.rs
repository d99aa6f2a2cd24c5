// src/services/activity_log_service.rs

use std::sync::Arc;

use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{Filter, PersistenceGateway, Query, Table},
    models::activity_log::{ActivityLog, ActivityLogFilters, LogAction, LogEntityType},
};

pub const DEFAULT_LOG_LIMIT: usize = 50;
pub const MAX_LOG_LIMIT: usize = 500;

#[derive(Clone)]
pub struct ActivityLogService {
    gateway: Arc<dyn PersistenceGateway>,
}

impl ActivityLogService {
    pub fn new(gateway: Arc<dyn PersistenceGateway>) -> Self {
        Self { gateway }
    }

    /// Registra uma ação. Nunca derruba a operação principal: falhas só vão para o log.
    pub async fn log(
        &self,
        action: LogAction,
        entity_type: LogEntityType,
        entity_id: Option<Uuid>,
        entity_name: Option<&str>,
        details: Option<Value>,
    ) {
        let record = json!({
            "action": action,
            "entity_type": entity_type,
            "entity_id": entity_id,
            "entity_name": entity_name,
            "details": details,
        });

        if let Err(e) = self.gateway.create(Table::ActivityLogs, record).await {
            tracing::warn!("⚠️ Falha ao registrar atividade {:?}/{:?}: {}", action, entity_type, e);
        }
    }

    pub async fn list(&self, filters: ActivityLogFilters) -> Result<Vec<ActivityLog>, AppError> {
        let query = Query::new()
            .maybe(filters.action.map(|a| Filter::equals_wire("action", a)))
            .maybe(
                filters
                    .entity_type
                    .map(|e| Filter::equals_wire("entity_type", e)),
            )
            .limit(filters.limit.unwrap_or(DEFAULT_LOG_LIMIT).min(MAX_LOG_LIMIT));

        Ok(self.gateway.fetch(Table::ActivityLogs, query).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{memory_gateway::Operation, MemoryGateway};

    #[tokio::test]
    async fn logs_are_listed_newest_first_with_filters() {
        let gateway = Arc::new(MemoryGateway::new());
        let service = ActivityLogService::new(gateway.clone());

        service
            .log(LogAction::Create, LogEntityType::Individual, None, Some("Amal Said"), None)
            .await;
        service
            .log(LogAction::Delete, LogEntityType::Child, None, Some("Omar Said"), None)
            .await;

        let all = service.list(ActivityLogFilters::default()).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].action, LogAction::Delete);

        let deletes = service
            .list(ActivityLogFilters {
                action: Some(LogAction::Delete),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(deletes.len(), 1);
        assert_eq!(deletes[0].entity_name.as_deref(), Some("Omar Said"));
    }

    #[tokio::test]
    async fn oversized_limits_are_clamped() {
        let gateway = Arc::new(MemoryGateway::new());
        let service = ActivityLogService::new(gateway.clone());
        for _ in 0..(MAX_LOG_LIMIT + 5) {
            service
                .log(LogAction::Create, LogEntityType::Family, None, None, None)
                .await;
        }

        let logs = service
            .list(ActivityLogFilters {
                limit: Some(usize::MAX),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(logs.len(), MAX_LOG_LIMIT);
    }

    #[tokio::test]
    async fn logging_failures_are_swallowed() {
        let gateway = Arc::new(MemoryGateway::new());
        gateway.fail_on(Operation::Create, Table::ActivityLogs).await;
        let service = ActivityLogService::new(gateway.clone());

        service
            .log(LogAction::Update, LogEntityType::Family, None, None, None)
            .await;
        assert!(gateway.rows(Table::ActivityLogs).await.is_empty());
    }
}
