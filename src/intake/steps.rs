// src/intake/steps.rs

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::{intake::rules::ValidationState, models::assistance::AssistanceDraft};

/// Campos "sujos" necessários para 100% de progresso.
pub const PROGRESS_FIELD_TARGET: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum Step {
    Personal,
    Contact,
    Employment,
    Assistance,
    Family,
    Needs,
    Review,
}

impl Step {
    pub const ALL: [Step; 7] = [
        Step::Personal,
        Step::Contact,
        Step::Employment,
        Step::Assistance,
        Step::Family,
        Step::Needs,
        Step::Review,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Chave de tradução do título.
    pub fn title_key(self) -> &'static str {
        match self {
            Step::Personal => "personalInformation",
            Step::Contact => "contactInformation",
            Step::Employment => "employmentInformation",
            Step::Assistance => "assistanceInformation",
            Step::Family => "familyMembers",
            Step::Needs => "assistanceNeeds",
            Step::Review => "reviewAndSubmit",
        }
    }

    /// A etapa dona de um caminho (`children.0.first_name` pertence a `family`).
    pub fn for_path(path: &str) -> Option<Step> {
        let root = path.split('.').next().unwrap_or(path);
        let step = match root {
            "first_name" | "last_name" | "id_number" | "date_of_birth" | "gender"
            | "marital_status" => Step::Personal,
            "phone" | "district" | "address" | "description" => Step::Contact,
            "job" | "employment_status" | "salary" | "list_status" => Step::Employment,
            "family_id" | "new_family_name" | "children" | "additional_members" => Step::Family,
            "needs" | "hashtags" => Step::Needs,
            section if AssistanceDraft::is_section(section) => Step::Assistance,
            _ => return None,
        };
        Some(step)
    }

    pub fn owns(self, path: &str) -> bool {
        Self::for_path(path) == Some(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigationError {
    #[error("A etapa {0:?} ainda não foi alcançada")]
    NotReached(Step),

    #[error("A etapa {step:?} tem erros em {paths:?}")]
    StepHasErrors { step: Step, paths: Vec<String> },
}

/// Etapa atual e a mais distante já visitada.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepController {
    current: usize,
    furthest: usize,
}

impl StepController {
    pub fn current(&self) -> Step {
        Step::ALL[self.current]
    }

    pub fn furthest(&self) -> Step {
        Step::ALL[self.furthest]
    }

    /// Avança uma etapa se a atual não tiver erros. Na revisão não faz nada.
    pub fn next(&mut self, validation: &ValidationState) -> Result<Step, NavigationError> {
        let step = self.current();
        if step == Step::Review {
            return Ok(step);
        }

        let paths: Vec<String> = validation
            .paths()
            .filter(|path| step.owns(path))
            .map(str::to_string)
            .collect();
        if !paths.is_empty() {
            return Err(NavigationError::StepHasErrors { step, paths });
        }

        self.visit(self.current + 1);
        Ok(self.current())
    }

    /// Saindo de uma revisão aberta antes da hora, volta para a etapa mais
    /// distante já alcançada. Assim `current` nunca passa de `furthest + 1`.
    pub fn previous(&mut self) -> Step {
        self.current = if self.current > self.furthest {
            self.furthest
        } else {
            self.current.saturating_sub(1)
        };
        self.current()
    }

    pub fn can_goto(&self, step: Step) -> bool {
        step == Step::Review || step.index() <= self.furthest + 1
    }

    /// A revisão está sempre liberada, mas não conta como etapa alcançada.
    pub fn goto(&mut self, step: Step) -> Result<Step, NavigationError> {
        if !self.can_goto(step) {
            return Err(NavigationError::NotReached(step));
        }
        if step == Step::Review {
            self.current = step.index();
        } else {
            self.visit(step.index());
        }
        Ok(step)
    }

    fn visit(&mut self, index: usize) {
        self.current = index;
        self.furthest = self.furthest.max(index);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// `min(100, round(dirty / 8 * 100))`
    pub fn progress(dirty_count: usize) -> u8 {
        let rounded = (dirty_count * 100 + PROGRESS_FIELD_TARGET / 2) / PROGRESS_FIELD_TARGET;
        rounded.min(100) as u8
    }
}
