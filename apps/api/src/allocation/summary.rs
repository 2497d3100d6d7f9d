use serde::{Deserialize, Serialize};

use crate::allocation::models::{AllocationTree, BrandAllocation, IndicatorKind};

/// Per-brand roll-up of the allocation, as shown in the table header and fed to prompts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrandSummary {
    pub brand_id: String,
    pub name: String,
    pub total_ratio: f64,
    pub result_ratio: f64,
    pub process_ratio: f64,
    pub sub_brand_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationSummary {
    pub brands: Vec<BrandSummary>,
    pub leaf_total: f64,
}

pub fn summarize(tree: &AllocationTree) -> AllocationSummary {
    let brands = tree
        .brands
        .iter()
        .map(|brand| {
            let leaves = brand.leaves();
            BrandSummary {
                brand_id: brand.id().to_string(),
                name: brand.name().to_string(),
                total_ratio: brand.total_ratio(),
                result_ratio: leaves
                    .iter()
                    .map(|l| l.indicator_sum(IndicatorKind::Result))
                    .sum(),
                process_ratio: leaves
                    .iter()
                    .map(|l| l.indicator_sum(IndicatorKind::Process))
                    .sum(),
                sub_brand_count: match brand {
                    BrandAllocation::Leaf(_) => 0,
                    BrandAllocation::Group(group) => group.sub_brands.len(),
                },
            }
        })
        .collect();

    AllocationSummary {
        brands,
        leaf_total: tree.leaf_total(),
    }
}

impl AllocationSummary {
    /// One line per brand with percentages to one decimal, for prompt embedding.
    pub fn to_prompt_lines(&self) -> String {
        self.brands
            .iter()
            .map(|b| {
                format!(
                    "- {} (id: {}): total {:.1}%, result {:.1}%, process {:.1}%",
                    b.name, b.brand_id, b.total_ratio, b.result_ratio, b.process_ratio
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
