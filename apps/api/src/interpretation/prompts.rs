// All LLM prompt constants for instruction interpretation.
// Reuses cross-cutting fragments from llm_client::prompts.

/// System prompt for instruction interpretation, enforcing JSON-only output.
pub const INTERPRET_SYSTEM: &str = "You translate a sales manager's instruction into \
    concrete bonus-ratio deltas. \
    You MUST respond with valid JSON only, as a single JSON object. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT invent brands, sub-brands or indicator ids that are not listed.";

/// Interpretation prompt template.
/// Replace: {analyst_role}, {allocation_summary}, {leaf_catalog}, {instruction}
pub const INTERPRET_PROMPT_TEMPLATE: &str = r#"{analyst_role}

CURRENT ALLOCATION (per brand, percentage of the bonus pool):
{allocation_summary}

ADDRESSABLE PACKAGES (use these ids exactly):
{leaf_catalog}

INSTRUCTION:
{instruction}

Return a JSON object with this EXACT schema (no extra fields):
{
  "adjustments": [
    {
      "brand_id": "glucorin",
      "sub_brand_name": null,
      "total_ratio_change": 1.5,
      "indicator_adjustments": [
        {"indicator_id": "glucorin-sales", "type": "result", "ratio_change": 0.8}
      ]
    }
  ],
  "explanation": "One or two sentences a sales manager can read.",
  "total_ratio_after": 100.0
}

HARD RULES:
1. Changes are ADDITIVE deltas in percentage points, not new absolute values
2. `sub_brand_name` is required for packages listed under a group and must be null otherwise
3. `type` is either "result" or "process"
4. Omit `total_ratio_change` or `indicator_adjustments` when they do not change
5. Do NOT rebalance to 100% yourself; the system rescales all ratios afterwards
6. If the instruction does not call for any change, return an empty `adjustments` array"#;
