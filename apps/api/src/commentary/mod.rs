//! Analyst commentary on the current allocation.
//!
//! With a configured model the commentary is generated; otherwise, or when the
//! call fails, a canned commentary is assembled from the allocation summary.

pub mod handlers;
pub mod prompts;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::allocation::models::AllocationTree;
use crate::allocation::summary::{summarize, AllocationSummary};
use crate::commentary::prompts::{COMMENTARY_PROMPT_TEMPLATE, COMMENTARY_SYSTEM};
use crate::llm_client::prompts::ANALYST_ROLE;
use crate::llm_client::LlmClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentarySource {
    Model,
    Canned,
}

#[derive(Debug, Clone, Serialize)]
pub struct Commentary {
    pub text: String,
    pub source: CommentarySource,
    pub generated_at: DateTime<Utc>,
}

pub async fn generate_commentary(
    llm: &LlmClient,
    tree: &AllocationTree,
    focus: Option<&str>,
) -> Commentary {
    let summary = summarize(tree);
    let prompt = COMMENTARY_PROMPT_TEMPLATE
        .replace("{analyst_role}", ANALYST_ROLE)
        .replace("{allocation_summary}", &summary.to_prompt_lines())
        .replace(
            "{focus}",
            focus
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .unwrap_or("overall balance of the bonus pool"),
        );

    match llm.call_text(&prompt, COMMENTARY_SYSTEM).await {
        Ok(text) => Commentary {
            text,
            source: CommentarySource::Model,
            generated_at: Utc::now(),
        },
        Err(e) => {
            warn!("Commentary generation failed, using canned commentary: {e}");
            Commentary {
                text: canned_commentary(&summary),
                source: CommentarySource::Canned,
                generated_at: Utc::now(),
            }
        }
    }
}

/// Deterministic commentary built from the summary alone.
pub fn canned_commentary(summary: &AllocationSummary) -> String {
    let Some(largest) = summary
        .brands
        .iter()
        .max_by(|a, b| a.total_ratio.total_cmp(&b.total_ratio))
    else {
        return "No brands are allocated yet, so there is nothing to assess.".to_string();
    };

    let result: f64 = summary.brands.iter().map(|b| b.result_ratio).sum();
    let process: f64 = summary.brands.iter().map(|b| b.process_ratio).sum();
    let emphasis = if result > process {
        "weighted toward result indicators, which rewards sales outcomes over field activity"
    } else if process > result {
        "weighted toward process indicators, which rewards field activity over sales outcomes"
    } else {
        "evenly split between result and process indicators"
    };

    format!(
        "{} holds the largest share of the bonus pool at {:.1}% across {} brands \
         (pool total {:.1}%). Indicator weights are {}. Review whether the smaller \
         brands carry enough incentive to sustain growth.",
        largest.name,
        largest.total_ratio,
        summary.brands.len(),
        summary.leaf_total,
        emphasis
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation::seed::seed_tree;
    use crate::config::Config;

    #[test]
    fn test_canned_names_largest_brand() {
        let text = canned_commentary(&summarize(&seed_tree()));
        assert!(text.starts_with("Cardiolex holds the largest share"), "{text}");
        assert!(text.contains("30.0%"));
        assert!(text.contains("result indicators"));
    }

    #[test]
    fn test_canned_handles_empty_tree() {
        let text = canned_commentary(&summarize(&AllocationTree::default()));
        assert!(text.contains("No brands"));
    }

    #[test]
    fn test_canned_is_deterministic() {
        let summary = summarize(&seed_tree());
        assert_eq!(canned_commentary(&summary), canned_commentary(&summary));
    }

    #[tokio::test]
    async fn test_without_key_returns_canned() {
        let llm = LlmClient::new(&Config::for_tests()).unwrap();
        let commentary = generate_commentary(&llm, &seed_tree(), Some("Non-CV growth")).await;
        assert_eq!(commentary.source, CommentarySource::Canned);
        assert_eq!(commentary.text, canned_commentary(&summarize(&seed_tree())));
    }
}
