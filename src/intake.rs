// src/intake.rs

pub mod debounce;
pub mod field;
pub mod lists;
pub mod normalize;
pub mod rules;
pub mod steps;
pub mod wizard;

pub use wizard::{IntakeError, IntakeWizard, WizardMode, WizardSnapshot};
