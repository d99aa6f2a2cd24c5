// src/services/family_service.rs

use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{Filter, PersistenceGateway, Query, Table, Write},
    models::family::{Family, FamilyStatus, FamilySummary},
};

pub const FAMILY_SEARCH_LIMIT: usize = 10;

#[derive(Clone)]
pub struct FamilyService {
    gateway: Arc<dyn PersistenceGateway>,
}

impl FamilyService {
    pub fn new(gateway: Arc<dyn PersistenceGateway>) -> Self {
        Self { gateway }
    }

    /// Busca por parte do nome. Termo vazio não consulta o banco.
    pub async fn search(&self, term: &str) -> Result<Vec<FamilySummary>, AppError> {
        let term = term.trim();
        if term.is_empty() {
            return Ok(Vec::new());
        }

        let families: Vec<Family> = self
            .gateway
            .fetch(
                Table::Families,
                Query::new()
                    .filter(Filter::contains("name", term))
                    .limit(FAMILY_SEARCH_LIMIT),
            )
            .await?;

        Ok(families.into_iter().map(FamilySummary::from).collect())
    }

    /// A escrita que cria a família nova escolhida no assistente. O id já
    /// vem pronto para o indivíduo e os filhos apontarem para ela no mesmo lote.
    pub fn create(
        name: &str,
        district: Option<&str>,
        phone: Option<&str>,
        address: Option<&str>,
    ) -> (Uuid, Write) {
        let id = Uuid::new_v4();
        let write = Write::Create {
            table: Table::Families,
            id,
            record: json!({
                "name": name.trim(),
                "status": FamilyStatus::default(),
                "district": district,
                "phone": phone,
                "address": address,
            }),
        };
        (id, write)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryGateway;

    async fn add(gateway: &MemoryGateway, name: &str, district: Option<&str>) {
        let (_, write) = FamilyService::create(name, district, None, None);
        gateway.apply(vec![write]).await.unwrap();
    }

    #[tokio::test]
    async fn search_matches_name_substrings_case_insensitively() {
        let gateway = Arc::new(MemoryGateway::new());
        let service = FamilyService::new(gateway.clone());
        add(&gateway, "Said Family", Some("Downtown")).await;
        add(&gateway, "Haddad Family", None).await;

        let found = service.search("  SAID ").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Said Family");
        assert_eq!(found[0].district.as_deref(), Some("Downtown"));
    }

    #[tokio::test]
    async fn blank_term_returns_nothing() {
        let service = FamilyService::new(Arc::new(MemoryGateway::new()));
        assert!(service.search("   ").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn results_are_capped() {
        let gateway = Arc::new(MemoryGateway::new());
        let service = FamilyService::new(gateway.clone());
        for i in 0..15 {
            add(&gateway, &format!("Family {}", i), None).await;
        }
        assert_eq!(service.search("family").await.unwrap().len(), FAMILY_SEARCH_LIMIT);
    }
}
