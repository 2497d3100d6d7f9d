/// System prompt for commentary: plain prose, no JSON.
pub const COMMENTARY_SYSTEM: &str = "You write short, concrete commentary for pharmaceutical \
    sales leadership. Respond in plain prose of at most 120 words. \
    Do NOT use markdown headings or bullet lists. \
    Do NOT invent figures that are not in the allocation provided.";

/// Commentary prompt template.
/// Replace: {analyst_role}, {allocation_summary}, {focus}
pub const COMMENTARY_PROMPT_TEMPLATE: &str = r#"{analyst_role}

CURRENT ALLOCATION (per brand, percentage of the bonus pool):
{allocation_summary}

FOCUS: {focus}

Comment on how well this bonus allocation supports the focus above. Name the brands that look
over- or under-incentivised and suggest one concrete adjustment."#;
