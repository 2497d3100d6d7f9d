//! Allocation tree data model.
//!
//! A brand either owns its indicators directly (`Leaf`) or splits into
//! sub-brands (`Group`). Every algorithm in this module works on the flattened
//! set of leaves, so callers never branch on the brand shape themselves.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Which indicator list an edit or adjustment targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorKind {
    Result,
    Process,
}

impl fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorKind::Result => write!(f, "result"),
            IndicatorKind::Process => write!(f, "process"),
        }
    }
}

/// One weighted indicator inside a bonus package, in percentage points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRatio {
    pub id: String,
    pub name: String,
    pub ratio: f64,
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl IndicatorRatio {
    pub fn new(id: impl Into<String>, name: impl Into<String>, ratio: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ratio,
            metadata: BTreeMap::new(),
        }
    }
}

/// A leaf bonus package: a brand without sub-brands, or a single sub-brand.
///
/// `total_ratio` is independent of the indicator ratios; indicators are
/// sub-weights inside the package and need not add up to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationNode {
    pub id: String,
    pub name: String,
    pub total_ratio: f64,
    #[serde(default)]
    pub result_indicators: Vec<IndicatorRatio>,
    #[serde(default)]
    pub process_indicators: Vec<IndicatorRatio>,
}

impl AllocationNode {
    pub fn indicators(&self, kind: IndicatorKind) -> &[IndicatorRatio] {
        match kind {
            IndicatorKind::Result => &self.result_indicators,
            IndicatorKind::Process => &self.process_indicators,
        }
    }

    pub fn indicators_mut(&mut self, kind: IndicatorKind) -> &mut Vec<IndicatorRatio> {
        match kind {
            IndicatorKind::Result => &mut self.result_indicators,
            IndicatorKind::Process => &mut self.process_indicators,
        }
    }

    pub fn indicator_mut(&mut self, kind: IndicatorKind, id: &str) -> Option<&mut IndicatorRatio> {
        self.indicators_mut(kind).iter_mut().find(|i| i.id == id)
    }

    pub fn indicator_sum(&self, kind: IndicatorKind) -> f64 {
        self.indicators(kind).iter().map(|i| i.ratio).sum()
    }

    /// Multiplies the package total and every indicator ratio by `factor`.
    pub(crate) fn scale(&mut self, factor: f64) {
        self.total_ratio *= factor;
        for indicator in self
            .result_indicators
            .iter_mut()
            .chain(self.process_indicators.iter_mut())
        {
            indicator.ratio = (indicator.ratio * factor).min(f64::MAX);
        }
    }

    /// Divides the total and every indicator ratio by `divisor`.
    pub(crate) fn shrink(&mut self, divisor: f64) {
        self.total_ratio /= divisor;
        for indicator in self
            .result_indicators
            .iter_mut()
            .chain(self.process_indicators.iter_mut())
        {
            indicator.ratio = (indicator.ratio / divisor).min(f64::MAX);
        }
    }
}

/// A brand split into sub-brand packages. Its total is the sum of its children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrandGroup {
    pub id: String,
    pub name: String,
    pub sub_brands: Vec<AllocationNode>,
}

impl BrandGroup {
    pub fn total_ratio(&self) -> f64 {
        self.sub_brands.iter().map(|s| s.total_ratio).sum()
    }
}

/// A top-level brand entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BrandAllocation {
    Leaf(AllocationNode),
    Group(BrandGroup),
}

impl BrandAllocation {
    pub fn id(&self) -> &str {
        match self {
            BrandAllocation::Leaf(node) => &node.id,
            BrandAllocation::Group(group) => &group.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            BrandAllocation::Leaf(node) => &node.name,
            BrandAllocation::Group(group) => &group.name,
        }
    }

    pub fn total_ratio(&self) -> f64 {
        match self {
            BrandAllocation::Leaf(node) => node.total_ratio,
            BrandAllocation::Group(group) => group.total_ratio(),
        }
    }

    pub fn leaves(&self) -> &[AllocationNode] {
        match self {
            BrandAllocation::Leaf(node) => std::slice::from_ref(node),
            BrandAllocation::Group(group) => &group.sub_brands,
        }
    }
}

/// Address of a leaf: a top-level leaf brand, or a sub-brand by name within its group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodePath {
    pub brand_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_brand_name: Option<String>,
}

impl NodePath {
    pub fn brand(brand_id: impl Into<String>) -> Self {
        Self {
            brand_id: brand_id.into(),
            sub_brand_name: None,
        }
    }

    pub fn sub_brand(brand_id: impl Into<String>, sub_brand_name: impl Into<String>) -> Self {
        Self {
            brand_id: brand_id.into(),
            sub_brand_name: Some(sub_brand_name.into()),
        }
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.sub_brand_name {
            Some(sub) => write!(f, "{}/{}", self.brand_id, sub),
            None => write!(f, "{}", self.brand_id),
        }
    }
}

/// The session's full bonus allocation, in display order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AllocationTree {
    pub brands: Vec<BrandAllocation>,
}

impl AllocationTree {
    pub fn new(brands: Vec<BrandAllocation>) -> Self {
        Self { brands }
    }

    pub fn leaves(&self) -> impl Iterator<Item = &AllocationNode> {
        self.brands.iter().flat_map(|b| b.leaves().iter())
    }

    pub fn leaves_mut(&mut self) -> impl Iterator<Item = &mut AllocationNode> {
        self.brands.iter_mut().flat_map(|b| match b {
            BrandAllocation::Leaf(node) => std::slice::from_mut(node).iter_mut(),
            BrandAllocation::Group(group) => group.sub_brands.iter_mut(),
        })
    }

    /// Leaves paired with the path that addresses them.
    pub fn leaf_paths(&self) -> impl Iterator<Item = (NodePath, &AllocationNode)> {
        self.brands.iter().flat_map(|b| {
            let brand_id = b.id().to_string();
            let grouped = matches!(b, BrandAllocation::Group(_));
            b.leaves().iter().map(move |leaf| {
                let path = if grouped {
                    NodePath::sub_brand(brand_id.clone(), leaf.name.clone())
                } else {
                    NodePath::brand(brand_id.clone())
                };
                (path, leaf)
            })
        })
    }

    /// Sum of every leaf's `total_ratio`. Held at 100 after each committed change.
    pub fn leaf_total(&self) -> f64 {
        self.leaves().map(|l| l.total_ratio).sum()
    }

    /// Looks up a leaf. A path with a sub-brand name only matches inside a group;
    /// a path without one only matches a top-level leaf.
    pub fn find_leaf(&self, path: &NodePath) -> Option<&AllocationNode> {
        let brand = self.brands.iter().find(|b| b.id() == path.brand_id)?;
        match (brand, path.sub_brand_name.as_deref()) {
            (BrandAllocation::Leaf(node), None) => Some(node),
            (BrandAllocation::Group(group), Some(name)) => {
                group.sub_brands.iter().find(|s| s.name == name)
            }
            _ => None,
        }
    }

    pub fn find_leaf_mut(&mut self, path: &NodePath) -> Option<&mut AllocationNode> {
        let brand = self.brands.iter_mut().find(|b| b.id() == path.brand_id)?;
        match (brand, path.sub_brand_name.as_deref()) {
            (BrandAllocation::Leaf(node), None) => Some(node),
            (BrandAllocation::Group(group), Some(name)) => {
                group.sub_brands.iter_mut().find(|s| s.name == name)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> AllocationTree {
        AllocationTree::new(vec![
            BrandAllocation::Leaf(AllocationNode {
                id: "a".to_string(),
                name: "Brand A".to_string(),
                total_ratio: 60.0,
                result_indicators: vec![IndicatorRatio::new("a-r1", "Sales", 30.0)],
                process_indicators: vec![],
            }),
            BrandAllocation::Group(BrandGroup {
                id: "g".to_string(),
                name: "Group".to_string(),
                sub_brands: vec![
                    AllocationNode {
                        id: "g-1".to_string(),
                        name: "G One".to_string(),
                        total_ratio: 25.0,
                        result_indicators: vec![],
                        process_indicators: vec![],
                    },
                    AllocationNode {
                        id: "g-2".to_string(),
                        name: "G Two".to_string(),
                        total_ratio: 15.0,
                        result_indicators: vec![],
                        process_indicators: vec![],
                    },
                ],
            }),
        ])
    }

    #[test]
    fn test_leaves_flatten_groups() {
        let tree = sample_tree();
        let ids: Vec<&str> = tree.leaves().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "g-1", "g-2"]);
        assert!((tree.leaf_total() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_group_total_is_sum_of_sub_brands() {
        let tree = sample_tree();
        assert!((tree.brands[1].total_ratio() - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_find_leaf_respects_shape() {
        let tree = sample_tree();
        assert!(tree.find_leaf(&NodePath::brand("a")).is_some());
        assert!(tree.find_leaf(&NodePath::sub_brand("g", "G Two")).is_some());
        // a group is not itself a leaf
        assert!(tree.find_leaf(&NodePath::brand("g")).is_none());
        // a leaf brand has no sub-brands
        assert!(tree.find_leaf(&NodePath::sub_brand("a", "Brand A")).is_none());
        assert!(tree.find_leaf(&NodePath::brand("missing")).is_none());
    }

    #[test]
    fn test_leaf_paths_address_each_leaf() {
        let tree = sample_tree();
        let paths: Vec<NodePath> = tree.leaf_paths().map(|(p, _)| p).collect();
        assert_eq!(paths[0], NodePath::brand("a"));
        assert_eq!(paths[2], NodePath::sub_brand("g", "G Two"));
        for path in &paths {
            assert!(tree.find_leaf(path).is_some(), "{path} must resolve");
        }
    }

    #[test]
    fn test_brand_allocation_tagged_serde() {
        let json = serde_json::to_value(&sample_tree()).unwrap();
        assert_eq!(json["brands"][0]["kind"], "leaf");
        assert_eq!(json["brands"][1]["kind"], "group");
        let back: AllocationTree = serde_json::from_value(json).unwrap();
        assert_eq!(back, sample_tree());
    }
}
