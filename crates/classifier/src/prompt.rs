//! Prompt construction for the LLM classification path

use leadflow_core::classification::truncate_chars;
use leadflow_core::LeadContext;

/// System message establishing the strict JSON contract
pub const SYSTEM_PROMPT: &str = "You are an email reply classifier for a B2B sales team. \
Respond with a single JSON object and nothing else. Schema: \
{\"classification\": string, \"confidence\": number, \"reasoning\": string, \
\"extracted_dates\": [string], \"is_auto_reply\": boolean}";

/// Build the user prompt for one reply
///
/// The reply body is capped at `max_reply_chars` so a pasted email chain
/// cannot blow out the context window.
pub fn build_prompt(reply_body: &str, context: &LeadContext, max_reply_chars: usize) -> String {
    let stage = context
        .current_stage
        .map(|s| s.as_str().to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let industry = context.industry.as_deref().unwrap_or("unknown");

    format!(
        "Classify this inbound email reply from a B2B sales lead.\n\
         \n\
         Lead context: Lead: {name}, Company: {company}, Industry: {industry}, Current stage: {stage}\n\
         \n\
         Reply text:\n\
         ---\n\
         {body}\n\
         ---\n\
         \n\
         Classify the reply into one of these categories:\n\
         - INTERESTED_BOOK_DEMO: The person wants to schedule a demo, meeting, or call. Extract any date/time references.\n\
         - NOT_INTERESTED: The person is declining or expressing disinterest.\n\
         - QUESTION: The person is asking questions and wants more information.\n\
         - OUT_OF_OFFICE: This is an auto-reply or out-of-office message.\n\
         - UNSUBSCRIBE: The person wants to stop receiving emails.\n\
         - UNCLEAR: The reply doesn't clearly fit any category.\n\
         \n\
         Provide your confidence (0-1), reasoning, and any extracted dates.",
        name = context.name,
        company = context.company,
        industry = industry,
        stage = stage,
        body = truncate_chars(reply_body, max_reply_chars),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadflow_core::OutcomeStage;

    #[test]
    fn test_prompt_includes_context() {
        let context = LeadContext {
            name: "Ada Lovelace".to_string(),
            company: "Analytical Engines".to_string(),
            industry: Some("Computing".to_string()),
            current_stage: Some(OutcomeStage::EmailSent),
        };
        let prompt = build_prompt("Tell me more", &context, 1500);
        assert!(prompt.contains("Ada Lovelace"));
        assert!(prompt.contains("Analytical Engines"));
        assert!(prompt.contains("Current stage: EMAIL_SENT"));
        assert!(prompt.contains("Tell me more"));
    }

    #[test]
    fn test_prompt_unknown_fields() {
        let context = LeadContext::default();
        let prompt = build_prompt("hi", &context, 1500);
        assert!(prompt.contains("Industry: unknown"));
        assert!(prompt.contains("Current stage: unknown"));
    }

    #[test]
    fn test_prompt_caps_reply() {
        let context = LeadContext::default();
        let long = "y".repeat(5000);
        let prompt = build_prompt(&long, &context, 1500);
        assert!(!prompt.contains(&"y".repeat(1501)));
        assert!(prompt.contains(&"y".repeat(1500)));
    }
}
