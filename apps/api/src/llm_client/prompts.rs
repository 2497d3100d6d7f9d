// Shared prompt constants and prompt-building utilities.
// Each service that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

/// Domain framing shared by every pharmaceutical incentive prompt.
pub const ANALYST_ROLE: &str = "\
    You are a senior sales-incentive analyst for a pharmaceutical company. \
    Bonus packages are allocated across brands and sub-brands as percentages of the \
    total bonus pool; the pool always sums to 100%. Each package is split into result \
    indicators (sales outcomes) and process indicators (field activity).";
