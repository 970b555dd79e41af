//! Rule-based reply classification
//!
//! Pattern families are checked in a fixed priority order. Auto-replies
//! outrank everything because any other signal inside an out-of-office
//! body was written before the person left. Opt-outs outrank interest so
//! a "please unsubscribe me, though the demo sounded nice" never books a
//! meeting.

use once_cell::sync::Lazy;
use regex::Regex;

use leadflow_core::{ClassificationOutcome, ReplyClassification};

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).unwrap_or_else(|e| panic!("bad pattern {p}: {e}")))
        .collect()
}

static OOO_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"out of (?:the )?office",
        r"on (?:annual |parental )?leave",
        r"on vacation",
        r"away from (?:my )?(?:desk|email)",
        r"limited access to email",
        r"auto[- ]?reply",
        r"automatic reply",
        r"i am currently (?:out|away|unavailable)",
        r"will (?:return|be back|respond) (?:on|after)",
    ])
});

static UNSUBSCRIBE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"unsubscribe",
        r"remove me",
        r"stop (?:emailing|contacting|sending)",
        r"opt[- ]?out",
        r"do not (?:contact|email|send)",
        r"take me off",
    ])
});

static NOT_INTERESTED_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"not interested",
        r"no thank(?:s| you)",
        r"not (?:a good |the right )?fit",
        r"pass on this",
        r"we(?:'re| are) (?:all )?set",
        r"already have a (?:solution|vendor|provider)",
        r"not (?:looking|in the market)",
        r"decline",
    ])
});

static INTERESTED_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"(?:schedule|book|set up) (?:a )?(?:demo|meeting|call|chat)",
        r"(?:love|like|want) to (?:see|learn|schedule|chat|discuss|meet)",
        r"(?:let's|lets|can we) (?:set up|schedule|book|find|arrange)",
        r"(?:i'?m|we(?:'re| are)) interested",
        r"sounds? (?:great|good|interesting)",
        r"free (?:on|next|this)",
        r"(?:available|availability) (?:on|next|this|for)",
        r"(?:next|this) (?:monday|tuesday|wednesday|thursday|friday|week)",
    ])
});

static QUESTION_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"\?",
        r"(?:can|could|do|does|how|what|which|where|when|why|is|are) (?:you|your|it|this|the)",
        r"tell me more",
        r"more (?:info|information|details)",
        r"curious about",
    ])
});

static DATE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"\b(?:monday|tuesday|wednesday|thursday|friday|saturday|sunday)\b",
        r"\b(?:next|this) (?:monday|tuesday|wednesday|thursday|friday|week)\b",
        r"\b(?:jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|jun(?:e)?|jul(?:y)?|aug(?:ust)?|sep(?:tember)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)\s+\d{1,2}(?:st|nd|rd|th)?\b",
        r"\b\d{1,2}(?:st|nd|rd|th)?\s+(?:of\s+)?(?:jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|jun(?:e)?|jul(?:y)?|aug(?:ust)?|sep(?:tember)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)\b",
        r"\b\d{1,2}/\d{1,2}(?:/\d{2,4})?\b",
    ])
});

fn matches_any(text_lower: &str, patterns: &[Regex]) -> bool {
    patterns.iter().any(|p| p.is_match(text_lower))
}

/// Pull date-like substrings out of a reply, in text order
///
/// Each pattern family matches independently, so overlapping phrases like
/// "next monday" can yield both the phrase and the bare weekday. Matches
/// are ordered by their position in the text, not by pattern.
pub fn extract_dates(text: &str) -> Vec<String> {
    let text_lower = text.to_lowercase();
    let mut found: Vec<(usize, String)> = Vec::new();
    for pattern in DATE_PATTERNS.iter() {
        for m in pattern.find_iter(&text_lower) {
            found.push((m.start(), m.as_str().to_string()));
        }
    }
    found.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| b.1.len().cmp(&a.1.len())));
    found.into_iter().map(|(_, s)| s).collect()
}

/// Classify a reply with the regex rule families
///
/// Always produces an outcome. Priority: out-of-office, unsubscribe,
/// not-interested, interested, question, then UNCLEAR at 0.5 confidence.
pub fn classify_with_rules(reply_body: &str) -> ClassificationOutcome {
    let text_lower = reply_body.to_lowercase();

    if matches_any(&text_lower, &OOO_PATTERNS) {
        return ClassificationOutcome {
            classification: ReplyClassification::OutOfOffice,
            confidence: 0.85,
            reasoning: "Reply matches out-of-office patterns".to_string(),
            extracted_dates: extract_dates(reply_body),
            is_auto_reply: true,
        };
    }

    if matches_any(&text_lower, &UNSUBSCRIBE_PATTERNS) {
        return ClassificationOutcome {
            classification: ReplyClassification::Unsubscribe,
            confidence: 0.9,
            reasoning: "Reply contains unsubscribe/opt-out language".to_string(),
            extracted_dates: Vec::new(),
            is_auto_reply: false,
        };
    }

    if matches_any(&text_lower, &NOT_INTERESTED_PATTERNS) {
        return ClassificationOutcome {
            classification: ReplyClassification::NotInterested,
            confidence: 0.8,
            reasoning: "Reply contains not-interested language".to_string(),
            extracted_dates: Vec::new(),
            is_auto_reply: false,
        };
    }

    if matches_any(&text_lower, &INTERESTED_PATTERNS) {
        return ClassificationOutcome {
            classification: ReplyClassification::InterestedBookDemo,
            confidence: 0.75,
            reasoning: "Reply contains interest/scheduling language".to_string(),
            extracted_dates: extract_dates(reply_body),
            is_auto_reply: false,
        };
    }

    if matches_any(&text_lower, &QUESTION_PATTERNS) {
        return ClassificationOutcome {
            classification: ReplyClassification::Question,
            confidence: 0.7,
            reasoning: "Reply contains question patterns".to_string(),
            extracted_dates: Vec::new(),
            is_auto_reply: false,
        };
    }

    ClassificationOutcome {
        classification: ReplyClassification::Unclear,
        confidence: 0.5,
        reasoning: "Reply does not match any known patterns".to_string(),
        extracted_dates: Vec::new(),
        is_auto_reply: false,
    }
}
