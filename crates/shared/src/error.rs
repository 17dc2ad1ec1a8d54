use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::impact::ImpactLevel;

/// `{ "error": ... }` body the solver answers with instead of a layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact: Option<ImpactLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl SolverErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            impact: None,
            details: None,
        }
    }

    pub fn with_impact(mut self, impact: ImpactLevel) -> Self {
        self.impact = Some(impact);
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Input problems caught before anything is sent to the solver.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    #[error("at least 2 houses are required (have {0})")]
    TooFewHouses(usize),
    #[error("cost per meter must be a number greater than zero")]
    InvalidCostPerMeter,
    #[error("house {index} has invalid coordinates")]
    InvalidCoordinate { index: usize },
    #[error("substation {index} has invalid coordinates")]
    InvalidSubstation { index: usize },
    #[error("at least one substation is required")]
    NoSubstations,
}
