// src/models/individual.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::{
    assistance::{AssistanceDraft, AssistanceSections},
    members::{AdditionalMember, Child},
    need::Need,
};

// --- ENUMS ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    #[default]
    Male,
    Female,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaritalStatus {
    #[default]
    Single,
    Married,
    Widowed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentStatus {
    #[default]
    NoSalary,
    HasSalary,
    SocialSupport,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListStatus {
    #[default]
    Whitelist,
    Blacklist,
    Waitinglist,
}

// ---
// Validações customizadas (as mensagens são chaves de tradução)
// ---

pub(crate) fn validation_issue(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

fn validate_id_number(value: &str) -> Result<(), ValidationError> {
    // Campo opcional: só valida o formato quando preenchido
    if value.is_empty() {
        return Ok(());
    }
    if !value.chars().all(|c| c.is_ascii_digit()) {
        return Err(validation_issue("digits", "validationIdNumberOnlyNumbers"));
    }
    if value.len() != 14 {
        return Err(validation_issue("length", "validationIdNumber14Digits"));
    }
    Ok(())
}

pub(crate) fn validate_phone(value: &str) -> Result<(), ValidationError> {
    let valid = value
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' ' | '(' | ')'));
    if !valid {
        return Err(validation_issue("phone", "validationInvalidPhoneFormat"));
    }
    Ok(())
}

pub(crate) fn validate_not_future(value: &NaiveDate) -> Result<(), ValidationError> {
    if *value > Utc::now().date_naive() {
        return Err(validation_issue("date", "validationDateOfBirthInFuture"));
    }
    Ok(())
}

// =========================================================================
//  RASCUNHO (O que o assistente edita campo a campo)
// =========================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct PersonDetails {
    // --- Pessoal ---
    #[validate(length(min = 1, message = "validationFirstNameRequired"))]
    pub first_name: String,

    #[validate(length(min = 1, message = "validationLastNameRequired"))]
    pub last_name: String,

    #[validate(custom(function = "validate_id_number"))]
    pub id_number: String,

    #[validate(custom(function = "validate_not_future"))]
    pub date_of_birth: Option<NaiveDate>,

    pub gender: Gender,
    pub marital_status: MaritalStatus,

    // --- Contato ---
    #[validate(custom(function = "validate_phone"))]
    pub phone: String,

    #[validate(length(min = 1, message = "validationDistrictRequired"))]
    pub district: String,

    pub address: String,
    pub description: String,

    // --- Emprego ---
    pub job: String,
    pub employment_status: EmploymentStatus,
    pub salary: Option<Decimal>,
    pub list_status: ListStatus,

    // --- Família (no máximo um dos dois) ---
    pub family_id: Option<Uuid>,
    pub new_family_name: Option<String>,

    pub hashtags: Vec<String>,
}

impl PersonDetails {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

/// Foto completa do formulário: campos, seções (sempre presentes) e listas.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndividualRecord {
    #[serde(flatten)]
    pub person: PersonDetails,

    #[serde(flatten)]
    pub assistance: AssistanceDraft,

    #[serde(default)]
    pub children: Vec<Child>,
    #[serde(default)]
    pub additional_members: Vec<AdditionalMember>,
    #[serde(default)]
    pub needs: Vec<Need>,
}

impl IndividualRecord {
    pub fn has_family_members(&self) -> bool {
        !self.children.is_empty() || !self.additional_members.is_empty()
    }
}

/// O registro pronto para persistir (saída do normalizador).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndividualSubmission {
    #[serde(flatten)]
    pub person: PersonDetails,

    #[serde(flatten)]
    pub assistance: AssistanceSections,

    pub children: Vec<Child>,
    pub additional_members: Vec<AdditionalMember>,
    pub needs: Vec<Need>,
}

impl From<IndividualSubmission> for IndividualRecord {
    fn from(submission: IndividualSubmission) -> Self {
        Self {
            person: submission.person,
            assistance: submission.assistance.into_draft(),
            children: submission.children,
            additional_members: submission.additional_members,
            needs: submission.needs,
        }
    }
}

// =========================================================================
//  REGISTRO SALVO (linha da tabela individuals)
// =========================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Individual {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub id_number: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub gender: Gender,
    #[serde(default)]
    pub marital_status: MaritalStatus,
    pub phone: Option<String>,
    pub district: Option<String>,
    pub address: Option<String>,
    pub description: Option<String>,
    pub job: Option<String>,
    #[serde(default)]
    pub employment_status: EmploymentStatus,
    pub salary: Option<Decimal>,
    #[serde(default)]
    pub list_status: ListStatus,
    pub family_id: Option<Uuid>,
    #[serde(default)]
    pub hashtags: Option<Vec<String>>,

    #[serde(flatten)]
    pub assistance: AssistanceSections,

    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Individual {
    /// Converte a linha salva de volta para o rascunho (modo edição).
    pub fn into_draft(self) -> (PersonDetails, AssistanceDraft) {
        let person = PersonDetails {
            first_name: self.first_name,
            last_name: self.last_name,
            id_number: self.id_number.unwrap_or_default(),
            date_of_birth: self.date_of_birth,
            gender: self.gender,
            marital_status: self.marital_status,
            phone: self.phone.unwrap_or_default(),
            district: self.district.unwrap_or_default(),
            address: self.address.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            job: self.job.unwrap_or_default(),
            employment_status: self.employment_status,
            salary: self.salary,
            list_status: self.list_status,
            family_id: self.family_id,
            new_family_name: None,
            hashtags: self.hashtags.unwrap_or_default(),
        };
        (person, self.assistance.into_draft())
    }
}

/// Filtros da listagem de indivíduos
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndividualFilters {
    pub district: Option<String>,
    pub list_status: Option<ListStatus>,
    pub family_id: Option<Uuid>,
    pub search: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn id_number_is_optional_but_strict_when_given() {
        assert!(validate_id_number("").is_ok());
        assert!(validate_id_number("29801011234567").is_ok());

        let short = validate_id_number("123").unwrap_err();
        assert_eq!(short.message.as_deref(), Some("validationIdNumber14Digits"));

        let letters = validate_id_number("2980101123456a").unwrap_err();
        assert_eq!(letters.message.as_deref(), Some("validationIdNumberOnlyNumbers"));
    }

    #[test]
    fn phone_accepts_common_separators() {
        assert!(validate_phone("+20 (123) 456-7890").is_ok());
        assert!(validate_phone("call me").is_err());
    }

    #[test]
    fn stored_row_converts_back_to_draft() {
        let row: Individual = serde_json::from_value(json!({
            "id": "6f1c4c1e-7a53-4a8e-9d61-0b5f0d1e2a33",
            "first_name": "Amal",
            "last_name": "Said",
            "id_number": null,
            "date_of_birth": "1990-04-02",
            "gender": "female",
            "marital_status": "married",
            "phone": null,
            "district": "Downtown",
            "address": null,
            "description": null,
            "job": null,
            "employment_status": "has_salary",
            "salary": 1500.0,
            "list_status": "waitinglist",
            "family_id": null,
            "hashtags": ["عيدية"],
            "medical_help": null,
            "debt_assistance": { "needs_debt_assistance": true, "debt_amount": 300 },
            "created_at": "2025-03-01T10:00:00+00:00",
            "updated_at": null
        }))
        .unwrap();

        let (person, assistance) = row.into_draft();
        assert_eq!(person.district, "Downtown");
        assert_eq!(person.salary, Some(Decimal::new(1500, 0)));
        assert_eq!(person.hashtags, vec!["عيدية".to_string()]);
        assert!(assistance.debt_assistance.needs_debt_assistance);
        assert_eq!(assistance.medical_help, Default::default());
    }
}
