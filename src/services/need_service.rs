// src/services/need_service.rs

use std::sync::Arc;

use crate::{
    common::error::AppError,
    db::{Filter, PersistenceGateway, Query, Table},
    models::need::{NeedFilters, NeedRow},
};

#[derive(Clone)]
pub struct NeedService {
    gateway: Arc<dyn PersistenceGateway>,
}

impl NeedService {
    pub fn new(gateway: Arc<dyn PersistenceGateway>) -> Self {
        Self { gateway }
    }

    pub async fn list(&self, filters: NeedFilters) -> Result<Vec<NeedRow>, AppError> {
        let query = Query::new()
            .maybe(filters.category.map(|c| Filter::equals_wire("category", c)))
            .maybe(filters.priority.map(|p| Filter::equals_wire("priority", p)))
            .maybe(filters.status.map(|s| Filter::equals_wire("status", s)))
            .maybe(filters.individual_id.map(|id| Filter::equals("individual_id", id)));

        Ok(self.gateway.fetch(Table::Needs, query).await?)
    }
}
