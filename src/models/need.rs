// src/models/need.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// --- ENUMS ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NeedCategory {
    #[default]
    Medical,
    Financial,
    Food,
    Shelter,
    Clothing,
    Education,
    Employment,
    Transportation,
    Other,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NeedPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NeedStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

/// Uma necessidade pertence exclusivamente ao indivíduo.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct Need {
    #[serde(default)]
    pub category: NeedCategory,

    #[serde(default)]
    pub priority: NeedPriority,

    #[serde(default)]
    #[validate(length(min = 1, message = "validationDescriptionRequired"))]
    pub description: String,

    #[serde(default)]
    pub status: NeedStatus,
}

/// Linha da tabela `needs`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NeedRow {
    pub id: Uuid,
    pub individual_id: Uuid,
    pub category: NeedCategory,
    pub priority: NeedPriority,
    pub description: String,
    pub status: NeedStatus,
    pub created_at: DateTime<Utc>,
}

impl From<NeedRow> for Need {
    fn from(row: NeedRow) -> Self {
        Self {
            category: row.category,
            priority: row.priority,
            description: row.description,
            status: row.status,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NeedFilters {
    pub category: Option<NeedCategory>,
    pub priority: Option<NeedPriority>,
    pub status: Option<NeedStatus>,
    pub individual_id: Option<Uuid>,
}
