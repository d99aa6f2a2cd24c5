// src/models/members.rs

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::individual::{validate_not_future, validate_phone, validation_issue, Gender};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ChildGender {
    #[default]
    Boy,
    Girl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SchoolStage {
    Kindergarten,
    Primary,
    Preparatory,
    Secondary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MemberRole {
    Spouse,
    Sibling,
    Grandparent,
    Other,
}

// Menor de 18 anos na data de hoje
fn validate_child_age(date_of_birth: &NaiveDate) -> Result<(), ValidationError> {
    validate_not_future(date_of_birth)?;
    let today = Utc::now().date_naive();
    match today.years_since(*date_of_birth) {
        Some(age) if age < 18 => Ok(()),
        _ => Err(validation_issue("age", "validationChildUnder18")),
    }
}

// =========================================================================
//  FILHOS
// =========================================================================

/// Um filho pode já existir no banco (`id`) e ser compartilhado com a família.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct Child {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,

    #[serde(default)]
    #[validate(length(min = 1, message = "validationFirstNameRequired"))]
    pub first_name: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "validationLastNameRequired"))]
    pub last_name: String,

    #[serde(default)]
    #[validate(
        required(message = "validationDateOfBirthRequired"),
        custom(function = "validate_child_age")
    )]
    pub date_of_birth: Option<NaiveDate>,

    #[serde(default)]
    pub gender: ChildGender,

    #[serde(default)]
    pub school_stage: Option<SchoolStage>,

    #[serde(default)]
    pub description: Option<String>,
}

impl Child {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Chave de unicidade usada na normalização.
    pub fn identity(&self) -> (&str, &str) {
        (&self.first_name, &self.last_name)
    }
}

// =========================================================================
//  OUTROS MEMBROS ADULTOS
// =========================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct AdditionalMember {
    #[serde(default)]
    #[validate(length(min = 1, message = "validationNameRequired"))]
    pub name: String,

    #[serde(default)]
    #[validate(
        required(message = "validationDateOfBirthRequired"),
        custom(function = "validate_not_future")
    )]
    pub date_of_birth: Option<NaiveDate>,

    #[serde(default)]
    pub gender: Gender,

    #[serde(default)]
    pub role: Option<MemberRole>,

    // Texto livre: "wife", "brother", "mother_in_law"...
    #[serde(default)]
    #[validate(length(min = 1, message = "validationRelationRequired"))]
    pub relation: String,

    #[serde(default)]
    pub job_title: Option<String>,

    #[serde(default)]
    #[validate(custom(function = "validate_phone"))]
    pub phone_number: Option<String>,
}
