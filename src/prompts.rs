//! Centralized prompt definitions.
//!
//! Every instruction sent to a provider lives here so the conversational,
//! analysis and summary flows can be reviewed and versioned together.

/// System prompt for the conversational intake turn.
pub const INTAKE_SYSTEM_PROMPT: &str = r#"You are a professional legal case analyst helping people understand their legal situation. Your answers are informational, not legal advice; the user has already been told this.

CORE PRINCIPLES:
- Analyze the situation and name the legal perspectives that apply
- Be direct, professional and focused on next steps
- Ground your answer in the facts the user has given

RESPONSE STYLE:
- Keep responses under 80 words unless a detailed analysis is warranted
- Ask ONE specific clarifying question when critical information is missing (location, dates, witnesses, damages)
- Never open with disclaimers about being an AI or not being a lawyer
- No small talk

WHEN THE USER DESCRIBES A SITUATION:
1. Acknowledge it in one sentence
2. Identify the legal area and potential claims
3. Ask the single most important missing question, if any

EXAMPLE:
"This appears to be a potential negligence claim. Rear-end collisions typically establish fault. What state did this occur in?""#;

/// System prompt for the structured analysis call.
pub const ANALYSIS_SYSTEM_PROMPT: &str =
    "You are a legal analysis engine. Return ONLY valid JSON, no other text.";

/// System prompt for conversation summaries.
pub const SUMMARY_SYSTEM_PROMPT: &str = "You are a legal assistant. Summarize the following legal case conversation in a professional, concise manner. Include key facts, timeline, and potential legal issues.";

/// Note appended to the user turn when inline media accompanies it.
pub fn media_note(count: usize) -> String {
    format!(
        "Additional Context: The user has provided {} file(s) as evidence. Analyze the content carefully and incorporate your findings into the legal assessment.",
        count
    )
}

/// User prompt for the structured analysis call.
pub fn analysis_prompt(situation: &str) -> String {
    format!(
        r#"Based on this legal situation, provide a structured analysis in JSON format.

SITUATION: {situation}

Return ONLY valid JSON with this exact structure (no markdown, no extra text):
{{
    "winProbability": "65%",
    "winMessage": "Brief assessment of case strength",
    "legalArea": "Type of law (e.g., Personal Injury, Contract Law)",
    "jurisdiction": "State/jurisdiction if mentioned",
    "relevantLaws": [
        {{"citation": "California Civil Code § 1714", "description": "General Negligence"}},
        {{"citation": "California Vehicle Code § 21703", "description": "Following Too Closely"}}
    ],
    "precedentCases": [
        {{"citation": "Rowland v. Christian, 69 Cal. 2d 108 (1968)", "summary": "Landmark duty of care case"}}
    ],
    "keyFactors": ["Factor 1", "Factor 2"]
}}

Rules:
- winProbability: estimate 0-100% based on typical case outcomes
- winMessage: one sentence about case viability
- If the jurisdiction is unknown, use "Varies by state"
- relevantLaws: 2-4 entries; "citation" is the full statute citation (e.g., "18 U.S.C. § 1001"), "description" is a 3-6 word plain English summary
- precedentCases: 1-3 landmark cases; "citation" includes the year, "summary" is 3-7 words on what the case established
- keyFactors: 2-4 factors affecting the case"#,
        situation = situation
    )
}

/// User prompt for the summary call.
pub fn summary_prompt(conversation: &str) -> String {
    format!(
        "Please summarize this legal case conversation:\n\n{}",
        conversation
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompts_are_not_empty() {
        assert!(!INTAKE_SYSTEM_PROMPT.is_empty());
        assert!(!ANALYSIS_SYSTEM_PROMPT.is_empty());
        assert!(!SUMMARY_SYSTEM_PROMPT.is_empty());
    }

    #[test]
    fn test_analysis_prompt_embeds_situation_and_schema() {
        let prompt = analysis_prompt("I was rear-ended in Sacramento");
        assert!(prompt.contains("SITUATION: I was rear-ended in Sacramento"));
        assert!(prompt.contains("\"relevantLaws\""));
        assert!(prompt.contains("\"precedentCases\""));
        assert!(!prompt.contains("{{"));
    }

    #[test]
    fn test_media_note_counts_files() {
        assert!(media_note(2).contains("2 file(s)"));
    }
}
