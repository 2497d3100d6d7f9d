use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::allocation::Adjustment;

/// A batch of deltas plus a human-readable explanation.
///
/// This is also the exact JSON shape the model is asked to return, so unknown
/// fields are rejected rather than ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AdjustmentPlan {
    pub adjustments: Vec<Adjustment>,
    pub explanation: String,
    /// Leaf total after applying the plan. Never taken from the model: the
    /// session fills it in from the tree it actually produced.
    #[serde(default)]
    pub total_ratio_after: Option<f64>,
}

#[derive(Debug, Error, PartialEq)]
pub enum PlanError {
    #[error("adjustment {index} has an empty brand_id")]
    EmptyBrandId { index: usize },

    #[error("adjustment {index} contains a non-finite ratio change")]
    NonFiniteChange { index: usize },

    #[error("plan explanation is empty")]
    EmptyExplanation,
}

impl AdjustmentPlan {
    pub fn empty(explanation: impl Into<String>) -> Self {
        Self {
            adjustments: Vec::new(),
            explanation: explanation.into(),
            total_ratio_after: None,
        }
    }

    /// Checks what serde cannot: non-empty ids, finite numbers, an explanation.
    pub fn validate(&self) -> Result<(), PlanError> {
        if self.explanation.trim().is_empty() {
            return Err(PlanError::EmptyExplanation);
        }
        for (index, adjustment) in self.adjustments.iter().enumerate() {
            if adjustment.brand_id.trim().is_empty() {
                return Err(PlanError::EmptyBrandId { index });
            }
            if !adjustment.is_finite() {
                return Err(PlanError::NonFiniteChange { index });
            }
        }
        Ok(())
    }
}

/// Which interpreter produced a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanSource {
    Model,
    Rules,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterpretationOutcome {
    pub plan: AdjustmentPlan,
    pub source: PlanSource,
}
