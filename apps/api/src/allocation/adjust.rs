//! Ratio adjustment: applies additive deltas to the allocation tree and
//! renormalizes the leaf totals back to 100%.
//!
//! Flow: locate leaf → add total delta (clamp to [0, f64::MAX]) → add indicator
//! deltas (same clamp) → repeat per adjustment → uniform rescale by 100 / Σ leaf totals.
//!
//! Adjustments that address a missing node or indicator are skipped without an
//! error: plans come from free-text interpretation and routinely name things
//! that do not exist in the current tree.

use serde::{Deserialize, Serialize};

use crate::allocation::models::{AllocationNode, AllocationTree, IndicatorKind, NodePath};

/// Target sum of all leaf totals, in percentage points.
pub const TARGET_TOTAL: f64 = 100.0;

/// Sums within this distance of `TARGET_TOTAL` are left untouched.
const RENORMALIZE_EPSILON: f64 = 1e-9;

/// A delta against one indicator of the addressed leaf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IndicatorAdjustment {
    pub indicator_id: String,
    #[serde(rename = "type")]
    pub kind: IndicatorKind,
    pub ratio_change: f64,
}

/// A batch of deltas against one leaf. Several adjustments may address the
/// same leaf; they are applied one after another, never merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Adjustment {
    pub brand_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_brand_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_ratio_change: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub indicator_adjustments: Vec<IndicatorAdjustment>,
}

impl Adjustment {
    pub fn path(&self) -> NodePath {
        NodePath {
            brand_id: self.brand_id.clone(),
            sub_brand_name: self.sub_brand_name.clone(),
        }
    }

    /// True when every delta in the adjustment is a finite number.
    pub fn is_finite(&self) -> bool {
        self.total_ratio_change.map_or(true, f64::is_finite)
            && self
                .indicator_adjustments
                .iter()
                .all(|i| i.ratio_change.is_finite())
    }
}

/// Applies `adjustments` to a copy of `tree` and returns the renormalized result.
pub fn apply_adjustments(tree: &AllocationTree, adjustments: &[Adjustment]) -> AllocationTree {
    let mut next = tree.clone();
    apply_adjustments_in_place(&mut next, adjustments);
    next
}

/// In-place variant of [`apply_adjustments`], used by the session store.
pub fn apply_adjustments_in_place(tree: &mut AllocationTree, adjustments: &[Adjustment]) {
    for adjustment in adjustments {
        if let Some(leaf) = tree.find_leaf_mut(&adjustment.path()) {
            apply_to_leaf(leaf, adjustment);
        }
    }
    renormalize(tree);
}

fn apply_to_leaf(leaf: &mut AllocationNode, adjustment: &Adjustment) {
    if let Some(change) = adjustment.total_ratio_change.filter(|c| c.is_finite()) {
        leaf.total_ratio = clamp_ratio(leaf.total_ratio + change);
    }
    for delta in &adjustment.indicator_adjustments {
        if !delta.ratio_change.is_finite() {
            continue;
        }
        if let Some(indicator) = leaf.indicator_mut(delta.kind, &delta.indicator_id) {
            indicator.ratio = clamp_ratio(indicator.ratio + delta.ratio_change);
        }
    }
}

/// Uniformly rescales every leaf total and every indicator ratio so that the
/// leaf totals sum to [`TARGET_TOTAL`]. Returns the final factor applied, or
/// `None` when the tree was left untouched (already at target, or all zero).
///
/// Leaf totals are bounded by `f64::MAX` but their sum is not. When the sum
/// overflows, or is so small that the factor would, every leaf is first
/// divided by the largest leaf total.
pub fn renormalize(tree: &mut AllocationTree) -> Option<f64> {
    let mut current_total = tree.leaf_total();
    let out_of_range = current_total.is_infinite()
        || (current_total > 0.0 && (TARGET_TOTAL / current_total).is_infinite());
    if out_of_range {
        let largest = tree.leaves().map(|l| l.total_ratio).fold(0.0, f64::max);
        for leaf in tree.leaves_mut() {
            leaf.shrink(largest);
        }
        current_total = tree.leaf_total();
    }
    if !current_total.is_finite()
        || current_total <= 0.0
        || (current_total - TARGET_TOTAL).abs() <= RENORMALIZE_EPSILON
    {
        return None;
    }
    let factor = TARGET_TOTAL / current_total;
    for leaf in tree.leaves_mut() {
        leaf.scale(factor);
    }
    Some(factor)
}

/// Bounds a ratio to `[0, f64::MAX]`, so a single leaf never becomes infinite.
pub(crate) fn clamp_ratio(value: f64) -> f64 {
    value.clamp(0.0, f64::MAX)
}
