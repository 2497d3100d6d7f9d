// Instruction interpretation: free text → AdjustmentPlan.
// All model calls go through llm_client; any failure degrades to the keyword rules.

pub mod handlers;
pub mod interpreter;
pub mod plan;
pub mod prompts;
pub mod rules;
