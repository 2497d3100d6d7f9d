//! Static starting allocation for a new session.
//!
//! Two cardiovascular (CV) brands and three Non-CV brands. Totals sum to 100.

use crate::allocation::models::{
    AllocationNode, AllocationTree, BrandAllocation, BrandGroup, IndicatorRatio,
};

/// Brand ids the rule-based interpreter treats as Non-CV when `NON_CV_BRANDS` is unset.
pub const NON_CV_BRAND_IDS: &[&str] = &["glucorin", "respira", "neurovix"];

pub fn default_non_cv_brands() -> Vec<String> {
    NON_CV_BRAND_IDS.iter().map(|s| s.to_string()).collect()
}

fn result_set(prefix: &str, sales: f64, growth: f64) -> Vec<IndicatorRatio> {
    vec![
        IndicatorRatio::new(format!("{prefix}-sales"), "Sales achievement", sales),
        IndicatorRatio::new(format!("{prefix}-growth"), "Year-on-year growth", growth),
    ]
}

fn process_set(prefix: &str, calls: f64, coverage: f64) -> Vec<IndicatorRatio> {
    vec![
        IndicatorRatio::new(format!("{prefix}-calls"), "Call frequency", calls),
        IndicatorRatio::new(format!("{prefix}-coverage"), "Target hospital coverage", coverage),
    ]
}

fn leaf(id: &str, name: &str, total: f64) -> AllocationNode {
    AllocationNode {
        id: id.to_string(),
        name: name.to_string(),
        total_ratio: total,
        result_indicators: result_set(id, total * 0.4, total * 0.2),
        process_indicators: process_set(id, total * 0.25, total * 0.15),
    }
}

/// Builds the session's initial allocation tree.
pub fn seed_tree() -> AllocationTree {
    AllocationTree::new(vec![
        BrandAllocation::Leaf(leaf("cardiolex", "Cardiolex", 30.0)),
        BrandAllocation::Group(BrandGroup {
            id: "vasoquil".to_string(),
            name: "Vasoquil".to_string(),
            sub_brands: vec![
                leaf("vasoquil-5", "Vasoquil 5mg", 12.0),
                leaf("vasoquil-10", "Vasoquil 10mg", 8.0),
            ],
        }),
        BrandAllocation::Leaf(leaf("glucorin", "Glucorin", 20.0)),
        BrandAllocation::Group(BrandGroup {
            id: "respira".to_string(),
            name: "Respira".to_string(),
            sub_brands: vec![
                leaf("respira-inhaler", "Respira Inhaler", 10.0),
                leaf("respira-tablet", "Respira Tablet", 5.0),
            ],
        }),
        BrandAllocation::Leaf(leaf("neurovix", "Neurovix", 15.0)),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_seed_sums_to_hundred() {
        assert!((seed_tree().leaf_total() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_seed_leaf_ids_unique() {
        let tree = seed_tree();
        let ids: HashSet<&str> = tree.leaves().map(|l| l.id.as_str()).collect();
        assert_eq!(ids.len(), tree.leaves().count());
    }

    #[test]
    fn test_non_cv_brands_exist_in_seed() {
        let tree = seed_tree();
        for id in NON_CV_BRAND_IDS {
            assert!(tree.brands.iter().any(|b| b.id() == *id), "{id} missing");
        }
    }
}
