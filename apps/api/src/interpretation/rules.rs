//! Rule-based interpretation: deterministic keyword matching used whenever the
//! model path is unavailable or returns something unusable.
//!
//! Rules (independent, both may fire):
//! 1. Non-CV focus: "non-cv" / "non cv" → Non-CV leaves +1.5, every other leaf -0.5
//! 2. Result emphasis: "result indicator" + "more"/"increase" → every result
//!    indicator gets +20% of its current ratio
//!
//! Adjustments for the same leaf are emitted separately and never merged.

use crate::allocation::models::{AllocationTree, IndicatorKind};
use crate::allocation::{Adjustment, IndicatorAdjustment};
use crate::interpretation::plan::AdjustmentPlan;

pub const NON_CV_INCREASE: f64 = 1.5;
pub const OTHER_DECREASE: f64 = -0.5;
/// Relative bump applied additively to each result indicator.
pub const RESULT_INDICATOR_BUMP: f64 = 0.2;

const NON_CV_KEYWORDS: &[&str] = &["non-cv", "non cv", "noncv"];
const RESULT_KEYWORDS: &[&str] = &["result indicator"];
const INCREASE_KEYWORDS: &[&str] = &["more", "increase"];

pub const GENERIC_ACKNOWLEDGEMENT: &str = "Instruction received. No allocation rule matched it, \
    so the current bonus ratios are left unchanged.";

fn mentions_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| text.contains(k))
}

/// Builds an adjustment plan from keyword rules. Pure and deterministic.
pub fn interpret_with_rules(
    instruction: &str,
    tree: &AllocationTree,
    non_cv_brands: &[String],
) -> AdjustmentPlan {
    let text = instruction.to_lowercase();
    let mut adjustments = Vec::new();
    let mut notes = Vec::new();

    if mentions_any(&text, NON_CV_KEYWORDS) {
        for (path, _) in tree.leaf_paths() {
            let change = if non_cv_brands.iter().any(|b| *b == path.brand_id) {
                NON_CV_INCREASE
            } else {
                OTHER_DECREASE
            };
            adjustments.push(Adjustment {
                brand_id: path.brand_id,
                sub_brand_name: path.sub_brand_name,
                total_ratio_change: Some(change),
                indicator_adjustments: Vec::new(),
            });
        }
        notes.push(format!(
            "Raised every Non-CV package by {NON_CV_INCREASE} points and lowered every other \
             package by {} points to support Non-CV product development.",
            -OTHER_DECREASE
        ));
    }

    if mentions_any(&text, RESULT_KEYWORDS) && mentions_any(&text, INCREASE_KEYWORDS) {
        for (path, leaf) in tree.leaf_paths() {
            if leaf.result_indicators.is_empty() {
                continue;
            }
            let indicator_adjustments = leaf
                .result_indicators
                .iter()
                .map(|indicator| IndicatorAdjustment {
                    indicator_id: indicator.id.clone(),
                    kind: IndicatorKind::Result,
                    ratio_change: indicator.ratio * RESULT_INDICATOR_BUMP,
                })
                .collect();
            adjustments.push(Adjustment {
                brand_id: path.brand_id,
                sub_brand_name: path.sub_brand_name,
                total_ratio_change: None,
                indicator_adjustments,
            });
        }
        notes.push(format!(
            "Increased every result indicator by {:.0}% of its current weight to emphasise \
             sales outcomes.",
            RESULT_INDICATOR_BUMP * 100.0
        ));
    }

    if notes.is_empty() {
        return AdjustmentPlan::empty(GENERIC_ACKNOWLEDGEMENT);
    }

    AdjustmentPlan {
        adjustments,
        explanation: format!(
            "{} All ratios are then rescaled so the bonus pool totals 100%.",
            notes.join(" ")
        ),
        total_ratio_after: None,
    }
}
