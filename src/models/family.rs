// src/models/family.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FamilyStatus {
    #[default]
    Green,
    Yellow,
    Red,
}

/// Linha da tabela `families`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Family {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub status: FamilyStatus,
    pub district: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// O que a busca de famílias devolve para o assistente
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FamilySummary {
    pub id: Uuid,
    pub name: String,
    pub district: Option<String>,
}

impl From<Family> for FamilySummary {
    fn from(family: Family) -> Self {
        Self {
            id: family.id,
            name: family.name,
            district: family.district,
        }
    }
}
