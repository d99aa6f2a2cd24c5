// src/models/assistance.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// =========================================================================
//  SEÇÕES DE ASSISTÊNCIA (Rascunho)
// =========================================================================

/// Uma seção só é enviada quando tem pelo menos um valor significativo.
pub trait AssistanceDetails {
    fn has_meaningful_content(&self) -> bool;
}

fn is_filled(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MedicalHelp {
    // Ex: "Medical Checkup", "Lab Tests", "X-rays/Scans", "Surgeries"
    pub type_of_medical_assistance_needed: Vec<String>,
    pub medication_distribution_frequency: Option<String>,
    pub estimated_cost_of_treatment: Option<String>,
    pub health_insurance_coverage: bool,
    pub additional_details: Option<String>,
}

impl AssistanceDetails for MedicalHelp {
    fn has_meaningful_content(&self) -> bool {
        !self.type_of_medical_assistance_needed.is_empty()
            || self.health_insurance_coverage
            || is_filled(&self.medication_distribution_frequency)
            || is_filled(&self.estimated_cost_of_treatment)
            || is_filled(&self.additional_details)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FoodAssistance {
    pub type_of_food_assistance_needed: Vec<String>,
    pub food_supply_card: bool,
}

impl AssistanceDetails for FoodAssistance {
    fn has_meaningful_content(&self) -> bool {
        !self.type_of_food_assistance_needed.is_empty() || self.food_supply_card
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarriageAssistance {
    pub marriage_support_needed: bool,
    pub wedding_contract_signed: bool,
    pub wedding_date: Option<String>,
    pub specific_needs: Option<String>,
}

impl MarriageAssistance {
    /// Zera os campos dependentes quando o apoio não é necessário.
    pub fn clear_details(&mut self) {
        self.wedding_contract_signed = false;
        self.wedding_date = None;
        self.specific_needs = None;
    }
}

impl AssistanceDetails for MarriageAssistance {
    fn has_meaningful_content(&self) -> bool {
        self.marriage_support_needed
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebtAssistance {
    pub needs_debt_assistance: bool,
    pub debt_amount: Decimal,
    pub household_appliances: bool,
    pub hospital_bills: bool,
    pub education_fees: bool,
    pub business_debt: bool,
    pub other_debt: bool,
}

impl DebtAssistance {
    pub fn clear_details(&mut self) {
        self.debt_amount = Decimal::ZERO;
        self.household_appliances = false;
        self.hospital_bills = false;
        self.education_fees = false;
        self.business_debt = false;
        self.other_debt = false;
    }
}

impl AssistanceDetails for DebtAssistance {
    fn has_meaningful_content(&self) -> bool {
        self.needs_debt_assistance
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EducationAssistance {
    pub family_education_level: Option<String>,
    pub desire_for_education: Option<String>,
    pub children_educational_needs: Vec<String>,
}

impl AssistanceDetails for EducationAssistance {
    fn has_meaningful_content(&self) -> bool {
        is_filled(&self.family_education_level)
            || is_filled(&self.desire_for_education)
            || !self.children_educational_needs.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShelterAssistance {
    pub type_of_housing: Option<String>,
    pub housing_condition: Option<String>,
    pub number_of_rooms: u32,
    pub household_appliances: Vec<String>,
}

impl AssistanceDetails for ShelterAssistance {
    fn has_meaningful_content(&self) -> bool {
        is_filled(&self.type_of_housing)
            || is_filled(&self.housing_condition)
            || self.number_of_rooms > 0
            || !self.household_appliances.is_empty()
    }
}

/// As seis seções como o formulário as mantém: sempre presentes, talvez vazias.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistanceDraft {
    pub medical_help: MedicalHelp,
    pub food_assistance: FoodAssistance,
    pub marriage_assistance: MarriageAssistance,
    pub debt_assistance: DebtAssistance,
    pub education_assistance: EducationAssistance,
    pub shelter_assistance: ShelterAssistance,
}

impl AssistanceDraft {
    pub const SECTION_NAMES: [&'static str; 6] = [
        "medical_help",
        "food_assistance",
        "marriage_assistance",
        "debt_assistance",
        "education_assistance",
        "shelter_assistance",
    ];

    pub fn is_section(name: &str) -> bool {
        Self::SECTION_NAMES.contains(&name)
    }
}

// =========================================================================
//  SEÇÃO ENVIADA: Ausente | Presente(dados)
// =========================================================================

/// No JSON uma seção ausente vira `null` (ou some do objeto), nunca `{}`.
#[derive(Debug, Clone, PartialEq)]
pub enum Section<T> {
    Absent,
    Present(T),
}

impl<T> Default for Section<T> {
    fn default() -> Self {
        Section::Absent
    }
}

impl<T> Section<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Section::Absent)
    }

    pub fn as_present(&self) -> Option<&T> {
        match self {
            Section::Present(data) => Some(data),
            Section::Absent => None,
        }
    }
}

impl<T: AssistanceDetails> Section<T> {
    pub fn from_draft(draft: T) -> Self {
        if draft.has_meaningful_content() {
            Section::Present(draft)
        } else {
            Section::Absent
        }
    }
}

impl<T: Default> Section<T> {
    pub fn into_draft(self) -> T {
        match self {
            Section::Present(data) => data,
            Section::Absent => T::default(),
        }
    }
}

impl<T: Serialize> Serialize for Section<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Section::Present(data) => serializer.serialize_some(data),
            Section::Absent => serializer.serialize_none(),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Section<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Option::<T>::deserialize(deserializer)?.map_or(Section::Absent, Section::Present))
    }
}

/// As seis seções depois da normalização.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssistanceSections {
    #[serde(default, skip_serializing_if = "Section::is_absent")]
    pub medical_help: Section<MedicalHelp>,
    #[serde(default, skip_serializing_if = "Section::is_absent")]
    pub food_assistance: Section<FoodAssistance>,
    #[serde(default, skip_serializing_if = "Section::is_absent")]
    pub marriage_assistance: Section<MarriageAssistance>,
    #[serde(default, skip_serializing_if = "Section::is_absent")]
    pub debt_assistance: Section<DebtAssistance>,
    #[serde(default, skip_serializing_if = "Section::is_absent")]
    pub education_assistance: Section<EducationAssistance>,
    #[serde(default, skip_serializing_if = "Section::is_absent")]
    pub shelter_assistance: Section<ShelterAssistance>,
}

impl AssistanceSections {
    pub fn from_draft(draft: &AssistanceDraft) -> Self {
        Self {
            medical_help: Section::from_draft(draft.medical_help.clone()),
            food_assistance: Section::from_draft(draft.food_assistance.clone()),
            marriage_assistance: Section::from_draft(draft.marriage_assistance.clone()),
            debt_assistance: Section::from_draft(draft.debt_assistance.clone()),
            education_assistance: Section::from_draft(draft.education_assistance.clone()),
            shelter_assistance: Section::from_draft(draft.shelter_assistance.clone()),
        }
    }

    pub fn into_draft(self) -> AssistanceDraft {
        AssistanceDraft {
            medical_help: self.medical_help.into_draft(),
            food_assistance: self.food_assistance.into_draft(),
            marriage_assistance: self.marriage_assistance.into_draft(),
            debt_assistance: self.debt_assistance.into_draft(),
            education_assistance: self.education_assistance.into_draft(),
            shelter_assistance: self.shelter_assistance.into_draft(),
        }
    }

    pub fn present_count(&self) -> usize {
        [
            self.medical_help.is_absent(),
            self.food_assistance.is_absent(),
            self.marriage_assistance.is_absent(),
            self.debt_assistance.is_absent(),
            self.education_assistance.is_absent(),
            self.shelter_assistance.is_absent(),
        ]
        .iter()
        .filter(|absent| !**absent)
        .count()
    }
}
