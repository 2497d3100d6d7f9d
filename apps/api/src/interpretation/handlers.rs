//! Axum route handlers for natural-language allocation instructions.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::allocation::apply_adjustments;
use crate::allocation::handlers::AllocationResponse;
use crate::errors::AppError;
use crate::interpretation::plan::{AdjustmentPlan, PlanSource};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct InstructionRequest {
    pub instruction: String,
}

#[derive(Debug, Serialize)]
pub struct InstructionResponse {
    pub plan: AdjustmentPlan,
    pub source: PlanSource,
    #[serde(flatten)]
    pub allocation: AllocationResponse,
}

fn require_instruction(request: &InstructionRequest) -> Result<(), AppError> {
    if request.instruction.trim().is_empty() {
        return Err(AppError::Validation(
            "instruction cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// POST /api/v1/allocation/instructions
///
/// Interprets the instruction against a snapshot, then applies the plan to the
/// tree as it stands when interpretation finishes. `total_ratio_after` is the
/// leaf total of the tree actually produced.
pub async fn handle_instruction(
    State(state): State<AppState>,
    Json(request): Json<InstructionRequest>,
) -> Result<Json<InstructionResponse>, AppError> {
    require_instruction(&request)?;

    let snapshot = state.allocation.snapshot().await;
    let outcome = state
        .interpreter
        .interpret(&request.instruction, &snapshot)
        .await;

    let tree = state.allocation.apply(&outcome.plan.adjustments).await;
    let mut plan = outcome.plan;
    plan.total_ratio_after = Some(tree.leaf_total());

    info!(
        "Applied instruction plan ({:?}, {} adjustments)",
        outcome.source,
        plan.adjustments.len()
    );

    Ok(Json(InstructionResponse {
        plan,
        source: outcome.source,
        allocation: tree.into(),
    }))
}

/// POST /api/v1/allocation/instructions/preview
///
/// Same as the apply endpoint but only shows the resulting tree; the session
/// allocation is not modified.
pub async fn handle_instruction_preview(
    State(state): State<AppState>,
    Json(request): Json<InstructionRequest>,
) -> Result<Json<InstructionResponse>, AppError> {
    require_instruction(&request)?;

    let snapshot = state.allocation.snapshot().await;
    let outcome = state
        .interpreter
        .interpret(&request.instruction, &snapshot)
        .await;

    let preview = apply_adjustments(&snapshot, &outcome.plan.adjustments);
    let mut plan = outcome.plan;
    plan.total_ratio_after = Some(preview.leaf_total());

    Ok(Json(InstructionResponse {
        plan,
        source: outcome.source,
        allocation: preview.into(),
    }))
}
