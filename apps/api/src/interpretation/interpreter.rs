//! Instruction interpreters: pluggable, trait-based mapping from free text to
//! an `AdjustmentPlan`.
//!
//! Default with a credential: `LlmInterpreter` (model call, falls back to rules).
//! Without one: `RuleBasedInterpreter` only.
//!
//! `AppState` holds an `Arc<dyn InstructionInterpreter>`, chosen at startup.

use async_trait::async_trait;
use tracing::{info, warn};

use crate::allocation::models::{AllocationTree, IndicatorKind, IndicatorRatio};
use crate::allocation::summary::summarize;
use crate::interpretation::plan::{AdjustmentPlan, InterpretationOutcome, PlanError, PlanSource};
use crate::interpretation::prompts::{INTERPRET_PROMPT_TEMPLATE, INTERPRET_SYSTEM};
use crate::interpretation::rules::interpret_with_rules;
use crate::llm_client::prompts::ANALYST_ROLE;
use crate::llm_client::{LlmClient, LlmError};

/// Never fails: every implementation degrades to a deterministic plan.
#[async_trait]
pub trait InstructionInterpreter: Send + Sync {
    async fn interpret(&self, instruction: &str, tree: &AllocationTree) -> InterpretationOutcome;
}

// ────────────────────────────────────────────────────────────────────────────
// RuleBasedInterpreter
// ────────────────────────────────────────────────────────────────────────────

pub struct RuleBasedInterpreter {
    non_cv_brands: Vec<String>,
}

impl RuleBasedInterpreter {
    pub fn new(non_cv_brands: Vec<String>) -> Self {
        Self { non_cv_brands }
    }

    pub fn plan(&self, instruction: &str, tree: &AllocationTree) -> InterpretationOutcome {
        InterpretationOutcome {
            plan: interpret_with_rules(instruction, tree, &self.non_cv_brands),
            source: PlanSource::Rules,
        }
    }
}

#[async_trait]
impl InstructionInterpreter for RuleBasedInterpreter {
    async fn interpret(&self, instruction: &str, tree: &AllocationTree) -> InterpretationOutcome {
        self.plan(instruction, tree)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// LlmInterpreter
// ────────────────────────────────────────────────────────────────────────────

/// Failure modes of the model path. All of them trigger the rule fallback.
#[derive(Debug, thiserror::Error)]
enum ModelPlanError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("invalid plan: {0}")]
    Invalid(#[from] PlanError),
}

pub struct LlmInterpreter {
    llm: LlmClient,
    fallback: RuleBasedInterpreter,
}

impl LlmInterpreter {
    pub fn new(llm: LlmClient, fallback: RuleBasedInterpreter) -> Self {
        Self { llm, fallback }
    }

    async fn model_plan(
        &self,
        instruction: &str,
        tree: &AllocationTree,
    ) -> Result<AdjustmentPlan, ModelPlanError> {
        let prompt = build_interpret_prompt(instruction, tree);
        let mut plan: AdjustmentPlan = self.llm.call_json(&prompt, INTERPRET_SYSTEM).await?;
        plan.validate()?;
        // recomputed from the applied tree by the caller
        plan.total_ratio_after = None;
        Ok(plan)
    }
}

#[async_trait]
impl InstructionInterpreter for LlmInterpreter {
    async fn interpret(&self, instruction: &str, tree: &AllocationTree) -> InterpretationOutcome {
        match self.model_plan(instruction, tree).await {
            Ok(plan) => {
                info!(
                    "Model interpreted instruction into {} adjustments",
                    plan.adjustments.len()
                );
                InterpretationOutcome {
                    plan,
                    source: PlanSource::Model,
                }
            }
            Err(e) => {
                warn!("Model interpretation failed, using rule-based fallback: {e}");
                self.fallback.plan(instruction, tree)
            }
        }
    }
}

/// Fills the interpretation template with the instruction and the tree.
pub fn build_interpret_prompt(instruction: &str, tree: &AllocationTree) -> String {
    let leaf_catalog = tree
        .leaf_paths()
        .map(|(path, leaf)| {
            let ids = |list: &[IndicatorRatio]| {
                list.iter()
                    .map(|i| format!("{} ({:.1}%)", i.id, i.ratio))
                    .collect::<Vec<_>>()
                    .join(", ")
            };
            format!(
                "- brand_id={} sub_brand_name={} total={:.1}% | result: [{}] | process: [{}]",
                path.brand_id,
                path.sub_brand_name.as_deref().unwrap_or("null"),
                leaf.total_ratio,
                ids(leaf.indicators(IndicatorKind::Result)),
                ids(leaf.indicators(IndicatorKind::Process)),
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    INTERPRET_PROMPT_TEMPLATE
        .replace("{analyst_role}", ANALYST_ROLE)
        .replace("{allocation_summary}", &summarize(tree).to_prompt_lines())
        .replace("{leaf_catalog}", &leaf_catalog)
        .replace("{instruction}", instruction.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use axum::{http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};

    use crate::allocation::seed::{default_non_cv_brands, seed_tree};
    use crate::config::Config;

    /// Serves a fixed chat-completion reply on 127.0.0.1 and returns a client
    /// pointed at it, plus a counter of requests received.
    async fn stub_llm(status: StatusCode, reply: Value) -> (LlmClient, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let app = Router::new().route(
            "/v1/chat/completions",
            post(move || {
                let reply = reply.clone();
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    (status, Json(reply))
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let config = Config {
            llm_api_key: Some("test-key".to_string()),
            llm_api_url: format!("http://{addr}/v1/chat/completions"),
            ..Config::for_tests()
        };
        (LlmClient::new(&config).unwrap(), hits)
    }

    fn chat_reply(content: &str) -> Value {
        json!({
            "choices": [{"message": {"role": "assistant", "content": content}}],
            "usage": {"prompt_tokens": 812, "completion_tokens": 64}
        })
    }

    fn interpreter_for(llm: LlmClient) -> LlmInterpreter {
        LlmInterpreter::new(llm, RuleBasedInterpreter::new(default_non_cv_brands()))
    }

    fn rules_plan(instruction: &str) -> AdjustmentPlan {
        interpret_with_rules(instruction, &seed_tree(), &default_non_cv_brands())
    }

    #[test]
    fn test_prompt_lists_every_leaf() {
        let tree = seed_tree();
        let prompt = build_interpret_prompt("  develop non-CV products ", &tree);
        assert!(prompt.contains("INSTRUCTION:\ndevelop non-CV products"));
        assert!(prompt.contains("sub_brand_name=Respira Tablet"));
        assert!(prompt.contains("brand_id=cardiolex sub_brand_name=null"));
        assert!(prompt.contains("glucorin-sales"));
        assert!(!prompt.contains("{leaf_catalog}"));
    }

    #[tokio::test]
    async fn test_rule_interpreter_reports_rules_source() {
        let interpreter = RuleBasedInterpreter::new(default_non_cv_brands());
        let outcome = interpreter.interpret("develop non-cv", &seed_tree()).await;
        assert_eq!(outcome.source, PlanSource::Rules);
        assert!(!outcome.plan.adjustments.is_empty());
    }

    #[tokio::test]
    async fn test_llm_interpreter_without_key_falls_back() {
        let llm = LlmClient::new(&Config::for_tests()).unwrap();
        let fallback = RuleBasedInterpreter::new(default_non_cv_brands());
        let interpreter = LlmInterpreter::new(llm, fallback);
        let tree = seed_tree();

        let outcome = interpreter
            .interpret("Develop Non-CV products", &tree)
            .await;

        assert_eq!(outcome.source, PlanSource::Rules);
        let expected = interpret_with_rules("Develop Non-CV products", &tree, &default_non_cv_brands());
        assert_eq!(outcome.plan, expected);
    }

    #[tokio::test]
    async fn test_model_plan_in_fences_is_used() {
        let content = "```json\n{\"adjustments\": [{\"brand_id\": \"glucorin\", \
            \"total_ratio_change\": 2.0, \"indicator_adjustments\": [{\"indicator_id\": \
            \"glucorin-sales\", \"type\": \"result\", \"ratio_change\": 0.5}]}], \
            \"explanation\": \"Shift weight toward the diabetes line.\", \
            \"total_ratio_after\": 102.0}\n```";
        let (llm, hits) = stub_llm(StatusCode::OK, chat_reply(content)).await;

        let outcome = interpreter_for(llm)
            .interpret("Focus on diabetes", &seed_tree())
            .await;

        assert_eq!(outcome.source, PlanSource::Model);
        assert_eq!(outcome.plan.adjustments.len(), 1);
        let adjustment = &outcome.plan.adjustments[0];
        assert_eq!(adjustment.brand_id, "glucorin");
        assert_eq!(adjustment.total_ratio_change, Some(2.0));
        assert_eq!(adjustment.indicator_adjustments[0].kind, IndicatorKind::Result);
        assert_eq!(outcome.plan.explanation, "Shift weight toward the diabetes line.");
        // the model's own figure is never trusted
        assert_eq!(outcome.plan.total_ratio_after, None);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_wrongly_shaped_model_reply_falls_back() {
        let (llm, _) = stub_llm(StatusCode::OK, chat_reply("sure! {\"adjustments\": 3}")).await;

        let outcome = interpreter_for(llm)
            .interpret("Develop Non-CV products", &seed_tree())
            .await;

        assert_eq!(outcome.source, PlanSource::Rules);
        assert_eq!(outcome.plan.adjustments.len(), 7);
        assert_eq!(outcome.plan, rules_plan("Develop Non-CV products"));
    }

    #[tokio::test]
    async fn test_invalid_model_plan_falls_back() {
        // parses, but the blank brand id fails validation
        let content = r#"{"adjustments": [{"brand_id": " ", "total_ratio_change": 1.0}],
            "explanation": "Raise it."}"#;
        let (llm, _) = stub_llm(StatusCode::OK, chat_reply(content)).await;

        let outcome = interpreter_for(llm)
            .interpret("Develop Non-CV products", &seed_tree())
            .await;

        assert_eq!(outcome.source, PlanSource::Rules);
        assert_eq!(outcome.plan, rules_plan("Develop Non-CV products"));
    }

    #[tokio::test]
    async fn test_client_error_falls_back_without_retry() {
        let body = json!({"error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}});
        let (llm, hits) = stub_llm(StatusCode::UNAUTHORIZED, body).await;

        let outcome = interpreter_for(llm)
            .interpret("Develop Non-CV products", &seed_tree())
            .await;

        assert_eq!(outcome.source, PlanSource::Rules);
        assert_eq!(outcome.plan, rules_plan("Develop Non-CV products"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_rate_limited_model_falls_back_after_retries() {
        let body = json!({"error": {"message": "Rate limit reached", "type": "requests"}});
        let (llm, hits) = stub_llm(StatusCode::TOO_MANY_REQUESTS, body).await;

        let outcome = interpreter_for(llm)
            .interpret("Put more weight on result indicators", &seed_tree())
            .await;

        assert_eq!(outcome.source, PlanSource::Rules);
        assert_eq!(outcome.plan, rules_plan("Put more weight on result indicators"));
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }
}
