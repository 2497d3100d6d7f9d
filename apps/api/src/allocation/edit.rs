//! Manual edits issued from the allocation table.
//!
//! Unlike plan application these target a node the user picked, so a missing
//! node or indicator is an error. Every edit commits through renormalization.

use std::collections::BTreeMap;

use thiserror::Error;
use uuid::Uuid;

use crate::allocation::adjust::{clamp_ratio, renormalize};
use crate::allocation::models::{
    AllocationNode, AllocationTree, IndicatorKind, IndicatorRatio, NodePath,
};

#[derive(Debug, Error)]
pub enum AllocationError {
    #[error("Allocation node '{0}' not found")]
    NodeNotFound(NodePath),

    #[error("{kind} indicator '{indicator_id}' not found on '{path}'")]
    IndicatorNotFound {
        path: NodePath,
        kind: IndicatorKind,
        indicator_id: String,
    },

    #[error("{kind} indicator '{indicator_id}' already exists on '{path}'")]
    DuplicateIndicator {
        path: NodePath,
        kind: IndicatorKind,
        indicator_id: String,
    },

    #[error("Ratio must be a finite number, got {0}")]
    InvalidRatio(f64),
}

/// A new indicator as submitted by the table. `id` is generated when absent.
#[derive(Debug, Clone)]
pub struct NewIndicator {
    pub id: Option<String>,
    pub name: String,
    pub ratio: f64,
    pub metadata: BTreeMap<String, serde_json::Value>,
}

fn leaf_mut<'a>(
    tree: &'a mut AllocationTree,
    path: &NodePath,
) -> Result<&'a mut AllocationNode, AllocationError> {
    tree.find_leaf_mut(path)
        .ok_or_else(|| AllocationError::NodeNotFound(path.clone()))
}

fn checked_ratio(ratio: f64) -> Result<f64, AllocationError> {
    if ratio.is_finite() {
        Ok(clamp_ratio(ratio))
    } else {
        Err(AllocationError::InvalidRatio(ratio))
    }
}

/// Resizes a leaf's package total, then renormalizes the tree.
pub fn set_total_ratio(
    tree: &mut AllocationTree,
    path: &NodePath,
    ratio: f64,
) -> Result<(), AllocationError> {
    let ratio = checked_ratio(ratio)?;
    leaf_mut(tree, path)?.total_ratio = ratio;
    renormalize(tree);
    Ok(())
}

/// Appends an indicator to a leaf and returns its id.
pub fn add_indicator(
    tree: &mut AllocationTree,
    path: &NodePath,
    kind: IndicatorKind,
    indicator: NewIndicator,
) -> Result<String, AllocationError> {
    let ratio = checked_ratio(indicator.ratio)?;
    let leaf = leaf_mut(tree, path)?;
    let id = indicator
        .id
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    if leaf.indicators(kind).iter().any(|i| i.id == id) {
        return Err(AllocationError::DuplicateIndicator {
            path: path.clone(),
            kind,
            indicator_id: id,
        });
    }

    leaf.indicators_mut(kind).push(IndicatorRatio {
        id: id.clone(),
        name: indicator.name,
        ratio,
        metadata: indicator.metadata,
    });
    renormalize(tree);
    Ok(id)
}

/// Sets one indicator's ratio, clamped at zero.
pub fn set_indicator_ratio(
    tree: &mut AllocationTree,
    path: &NodePath,
    kind: IndicatorKind,
    indicator_id: &str,
    ratio: f64,
) -> Result<(), AllocationError> {
    let ratio = checked_ratio(ratio)?;
    let indicator = leaf_mut(tree, path)?
        .indicator_mut(kind, indicator_id)
        .ok_or_else(|| AllocationError::IndicatorNotFound {
            path: path.clone(),
            kind,
            indicator_id: indicator_id.to_string(),
        })?;
    indicator.ratio = ratio;
    renormalize(tree);
    Ok(())
}

/// Removes an indicator and returns it.
pub fn remove_indicator(
    tree: &mut AllocationTree,
    path: &NodePath,
    kind: IndicatorKind,
    indicator_id: &str,
) -> Result<IndicatorRatio, AllocationError> {
    let list = leaf_mut(tree, path)?.indicators_mut(kind);
    let position = list.iter().position(|i| i.id == indicator_id).ok_or_else(|| {
        AllocationError::IndicatorNotFound {
            path: path.clone(),
            kind,
            indicator_id: indicator_id.to_string(),
        }
    })?;
    let removed = list.remove(position);
    renormalize(tree);
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation::models::BrandAllocation;

    fn tree() -> AllocationTree {
        AllocationTree::new(vec![
            BrandAllocation::Leaf(AllocationNode {
                id: "a".to_string(),
                name: "A".to_string(),
                total_ratio: 60.0,
                result_indicators: vec![IndicatorRatio::new("a-r1", "Sales", 20.0)],
                process_indicators: vec![],
            }),
            BrandAllocation::Leaf(AllocationNode {
                id: "b".to_string(),
                name: "B".to_string(),
                total_ratio: 40.0,
                result_indicators: vec![],
                process_indicators: vec![],
            }),
        ])
    }

    fn new_indicator(id: Option<&str>, ratio: f64) -> NewIndicator {
        NewIndicator {
            id: id.map(str::to_string),
            name: "Coverage".to_string(),
            ratio,
            metadata: BTreeMap::new(),
        }
    }

    #[test]
    fn test_set_total_ratio_renormalizes() {
        let mut t = tree();
        set_total_ratio(&mut t, &NodePath::brand("b"), 90.0).unwrap();
        assert!((t.leaf_total() - 100.0).abs() < 1e-6);
        let b = t.find_leaf(&NodePath::brand("b")).unwrap().total_ratio;
        assert!((b - 60.0).abs() < 1e-9, "b was {b}");
    }

    #[test]
    fn test_set_total_ratio_clamps_negative() {
        let mut t = tree();
        set_total_ratio(&mut t, &NodePath::brand("a"), -5.0).unwrap();
        assert_eq!(t.find_leaf(&NodePath::brand("a")).unwrap().total_ratio, 0.0);
        assert!((t.leaf_total() - 100.0).abs() < 1e-6);
    }

    #[test]
    fn test_set_total_ratio_rejects_nan() {
        let mut t = tree();
        let err = set_total_ratio(&mut t, &NodePath::brand("a"), f64::NAN).unwrap_err();
        assert!(matches!(err, AllocationError::InvalidRatio(_)));
        assert_eq!(t, tree());
    }

    #[test]
    fn test_missing_node_is_error() {
        let mut t = tree();
        let err = set_total_ratio(&mut t, &NodePath::brand("zzz"), 5.0).unwrap_err();
        assert!(matches!(err, AllocationError::NodeNotFound(_)));
    }

    #[test]
    fn test_add_indicator_generates_id() {
        let mut t = tree();
        let id = add_indicator(
            &mut t,
            &NodePath::brand("b"),
            IndicatorKind::Process,
            new_indicator(None, 5.0),
        )
        .unwrap();
        assert!(Uuid::parse_str(&id).is_ok());
        let b = t.find_leaf(&NodePath::brand("b")).unwrap();
        assert_eq!(b.process_indicators.len(), 1);
        assert_eq!(b.process_indicators[0].ratio, 5.0);
    }

    #[test]
    fn test_add_duplicate_indicator_rejected() {
        let mut t = tree();
        let err = add_indicator(
            &mut t,
            &NodePath::brand("a"),
            IndicatorKind::Result,
            new_indicator(Some("a-r1"), 1.0),
        )
        .unwrap_err();
        assert!(matches!(err, AllocationError::DuplicateIndicator { .. }));
    }

    #[test]
    fn test_same_id_allowed_in_other_kind() {
        let mut t = tree();
        let id = add_indicator(
            &mut t,
            &NodePath::brand("a"),
            IndicatorKind::Process,
            new_indicator(Some("a-r1"), 1.0),
        )
        .unwrap();
        assert_eq!(id, "a-r1");
    }

    #[test]
    fn test_set_indicator_ratio_clamps() {
        let mut t = tree();
        set_indicator_ratio(&mut t, &NodePath::brand("a"), IndicatorKind::Result, "a-r1", -3.0)
            .unwrap();
        let a = t.find_leaf(&NodePath::brand("a")).unwrap();
        assert_eq!(a.result_indicators[0].ratio, 0.0);
    }

    #[test]
    fn test_set_missing_indicator_is_error() {
        let mut t = tree();
        let err =
            set_indicator_ratio(&mut t, &NodePath::brand("a"), IndicatorKind::Process, "a-r1", 3.0)
                .unwrap_err();
        assert!(matches!(err, AllocationError::IndicatorNotFound { .. }));
    }

    #[test]
    fn test_remove_indicator() {
        let mut t = tree();
        let removed =
            remove_indicator(&mut t, &NodePath::brand("a"), IndicatorKind::Result, "a-r1").unwrap();
        assert_eq!(removed.name, "Sales");
        assert!(t
            .find_leaf(&NodePath::brand("a"))
            .unwrap()
            .result_indicators
            .is_empty());
    }
}
