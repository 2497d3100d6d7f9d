//! Axum route handlers for the Allocation API.

use std::collections::BTreeMap;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::allocation::edit::{
    add_indicator, remove_indicator, set_indicator_ratio, set_total_ratio, NewIndicator,
};
use crate::allocation::models::{AllocationTree, IndicatorKind, IndicatorRatio, NodePath};
use crate::allocation::summary::{summarize, AllocationSummary};
use crate::allocation::Adjustment;
use crate::errors::AppError;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct AllocationResponse {
    pub allocation: AllocationTree,
    pub summary: AllocationSummary,
}

impl From<AllocationTree> for AllocationResponse {
    fn from(allocation: AllocationTree) -> Self {
        let summary = summarize(&allocation);
        Self {
            allocation,
            summary,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ApplyAdjustmentsRequest {
    pub adjustments: Vec<Adjustment>,
}

#[derive(Debug, Deserialize)]
pub struct SetTotalRequest {
    #[serde(flatten)]
    pub path: NodePath,
    pub total_ratio: f64,
}

#[derive(Debug, Deserialize)]
pub struct AddIndicatorRequest {
    #[serde(flatten)]
    pub path: NodePath,
    pub kind: IndicatorKind,
    pub id: Option<String>,
    pub name: String,
    pub ratio: f64,
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct AddIndicatorResponse {
    pub indicator_id: String,
    #[serde(flatten)]
    pub allocation: AllocationResponse,
}

#[derive(Debug, Deserialize)]
pub struct SetIndicatorRequest {
    #[serde(flatten)]
    pub path: NodePath,
    pub kind: IndicatorKind,
    pub ratio: f64,
}

/// Query string locating an indicator for deletion.
#[derive(Debug, Deserialize)]
pub struct IndicatorLocator {
    pub brand_id: String,
    pub sub_brand_name: Option<String>,
    pub kind: IndicatorKind,
}

#[derive(Debug, Serialize)]
pub struct RemoveIndicatorResponse {
    pub removed: IndicatorRatio,
    #[serde(flatten)]
    pub allocation: AllocationResponse,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/allocation
pub async fn handle_get_allocation(State(state): State<AppState>) -> Json<AllocationResponse> {
    Json(state.allocation.snapshot().await.into())
}

/// POST /api/v1/allocation/reset
///
/// Restores the seeded allocation.
pub async fn handle_reset(State(state): State<AppState>) -> Json<AllocationResponse> {
    info!("Allocation reset to seed");
    Json(state.allocation.reset().await.into())
}

/// POST /api/v1/allocation/adjustments
///
/// Applies a caller-supplied list of deltas, then renormalizes to 100%.
/// Adjustments addressing unknown nodes are skipped, not rejected.
pub async fn handle_apply_adjustments(
    State(state): State<AppState>,
    Json(request): Json<ApplyAdjustmentsRequest>,
) -> Result<Json<AllocationResponse>, AppError> {
    if let Some(index) = request.adjustments.iter().position(|a| !a.is_finite()) {
        return Err(AppError::Validation(format!(
            "adjustment {index} contains a non-finite ratio change"
        )));
    }

    let tree = state.allocation.apply(&request.adjustments).await;
    Ok(Json(tree.into()))
}

/// PUT /api/v1/allocation/total
pub async fn handle_set_total(
    State(state): State<AppState>,
    Json(request): Json<SetTotalRequest>,
) -> Result<Json<AllocationResponse>, AppError> {
    let ((), tree) = state
        .allocation
        .edit(|tree| set_total_ratio(tree, &request.path, request.total_ratio))
        .await?;
    Ok(Json(tree.into()))
}

/// POST /api/v1/allocation/indicators
pub async fn handle_add_indicator(
    State(state): State<AppState>,
    Json(request): Json<AddIndicatorRequest>,
) -> Result<Json<AddIndicatorResponse>, AppError> {
    if request.name.trim().is_empty() {
        return Err(AppError::Validation("name cannot be empty".to_string()));
    }

    let indicator = NewIndicator {
        id: request.id,
        name: request.name,
        ratio: request.ratio,
        metadata: request.metadata,
    };
    let (indicator_id, tree) = state
        .allocation
        .edit(|tree| add_indicator(tree, &request.path, request.kind, indicator))
        .await?;

    Ok(Json(AddIndicatorResponse {
        indicator_id,
        allocation: tree.into(),
    }))
}

/// PATCH /api/v1/allocation/indicators/:id
pub async fn handle_set_indicator(
    State(state): State<AppState>,
    Path(indicator_id): Path<String>,
    Json(request): Json<SetIndicatorRequest>,
) -> Result<Json<AllocationResponse>, AppError> {
    let ((), tree) = state
        .allocation
        .edit(|tree| {
            set_indicator_ratio(
                tree,
                &request.path,
                request.kind,
                &indicator_id,
                request.ratio,
            )
        })
        .await?;
    Ok(Json(tree.into()))
}

/// DELETE /api/v1/allocation/indicators/:id?brand_id=..&sub_brand_name=..&kind=..
pub async fn handle_remove_indicator(
    State(state): State<AppState>,
    Path(indicator_id): Path<String>,
    Query(locator): Query<IndicatorLocator>,
) -> Result<Json<RemoveIndicatorResponse>, AppError> {
    let path = NodePath {
        brand_id: locator.brand_id,
        sub_brand_name: locator.sub_brand_name,
    };
    let (removed, tree) = state
        .allocation
        .edit(|tree| remove_indicator(tree, &path, locator.kind, &indicator_id))
        .await?;
    Ok(Json(RemoveIndicatorResponse {
        removed,
        allocation: tree.into(),
    }))
}
