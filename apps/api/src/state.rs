use std::sync::Arc;

use crate::allocation::AllocationStore;
use crate::config::Config;
use crate::interpretation::interpreter::{
    InstructionInterpreter, LlmInterpreter, RuleBasedInterpreter,
};
use crate::llm_client::LlmClient;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub llm: LlmClient,
    pub config: Config,
    /// The session's allocation tree. Seeded at startup, never persisted.
    pub allocation: AllocationStore,
    /// Pluggable interpreter. `LlmInterpreter` when a key is configured, rules otherwise.
    pub interpreter: Arc<dyn InstructionInterpreter>,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let llm = LlmClient::new(&config)?;
        let rules = RuleBasedInterpreter::new(config.non_cv_brands.clone());
        let interpreter: Arc<dyn InstructionInterpreter> = if llm.is_configured() {
            Arc::new(LlmInterpreter::new(llm.clone(), rules))
        } else {
            Arc::new(rules)
        };

        Ok(Self {
            llm,
            config,
            allocation: AllocationStore::seeded(),
            interpreter,
        })
    }
}
