//! Parameter extraction from free text.
//!
//! Four independent pattern families derive `content`, `due_date`,
//! `priority` and `category` from the raw (non-normalized) message. A miss
//! in one family never blocks the others. Due dates are captured as
//! normalized tokens ("today", "in_3_days", "by_date:12/25") — resolving
//! them to calendar dates is the caller's business.

use once_cell::sync::Lazy;
use regex::Regex;

use tasktalk_schema::{IntentKind, ParamMap, PriorityLevel};

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("invalid extraction pattern")
}

static CONTENT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        // Action word, then a todo noun, then the payload.
        re(
            r"(?i)(?:create|add|make|new|set up|schedule|plan|update|change|modify|edit|adjust|show|list|display|see|view|find|get|tell me|what).*?\b(todo|task|to-do|thing|item|do|appointment|reminder)\b\s+(.+?)(?:\.|$)",
        ),
        // "add X for/by/on/at ..."
        re(r"(?i)(?:add|create|new|make)\s+(.+?)(?:\s+for|\s+by|\s+on|\s+at|\.|$)"),
        // "to/that/should VERB X"
        re(
            r"(?i)(?:to|that|should)\s+(do|buy|call|meet|work on|prepare|finish|complete)\s+(.+?)(?:\s+for|\s+by|\s+on|\s+at|\.|$)",
        ),
    ]
});

static ACTION_PREFIX: Lazy<Regex> = Lazy::new(|| {
    re(
        r"(?i)^(create|add|make|new|set up|schedule|plan|update|change|modify|edit|adjust|show|list|display|see|view|find|get|tell me|what)\s+",
    )
});

static NOUN_WORDS: Lazy<Regex> =
    Lazy::new(|| re(r"(?i)\b(todo|task|to-do|thing|item|do|appointment|reminder)\b\s*"));

static IN_DAYS: Lazy<Regex> = Lazy::new(|| re(r"(?i)in (\d+) days?"));
static ON_DATE: Lazy<Regex> = Lazy::new(|| re(r"(?i)on (\d{1,2}[/-]\d{1,2}[/-]?\d{2,4})"));
static BY_DATE: Lazy<Regex> = Lazy::new(|| re(r"(?i)by (\d{1,2}[/-]\d{1,2}[/-]?\d{2,4})"));
static BY_DAY: Lazy<Regex> =
    Lazy::new(|| re(r"(?i)by (monday|tuesday|wednesday|thursday|friday|saturday|sunday)"));
static TODAY: Lazy<Regex> = Lazy::new(|| re(r"(?i)today"));
static TOMORROW: Lazy<Regex> = Lazy::new(|| re(r"(?i)tomorrow"));
static NEXT_WEEK: Lazy<Regex> = Lazy::new(|| re(r"(?i)next week"));
static NEXT_MONTH: Lazy<Regex> = Lazy::new(|| re(r"(?i)next month"));

// Priority buckets are plain alternations, matched as substrings.
static PRIORITY_HIGH: Lazy<Regex> = Lazy::new(|| re(r"(?i)(high|top|critical|urgent|important)"));
static PRIORITY_MEDIUM: Lazy<Regex> = Lazy::new(|| re(r"(?i)(medium|normal|regular)"));
static PRIORITY_LOW: Lazy<Regex> = Lazy::new(|| re(r"(?i)(low|lowest)"));

static CATEGORY: Lazy<Regex> =
    Lazy::new(|| re(r"(?i)\b(work|personal|shopping|health|home|family|school|business)\b"));

/// Extract the parameters relevant for `intent` from the original text.
pub fn extract_parameters(text: &str, intent: IntentKind) -> ParamMap {
    let mut parameters = ParamMap::new();

    if matches!(
        intent,
        IntentKind::CreateTodo | IntentKind::UpdateTodo | IntentKind::QueryTodos
    ) {
        if let Some(content) = extract_content(text) {
            parameters.insert("content".to_string(), content.into());
        }
    }

    if let Some(due_date) = extract_due_date(text) {
        parameters.insert("due_date".to_string(), due_date.into());
    }
    if let Some(priority) = extract_priority(text) {
        parameters.insert("priority".to_string(), priority.as_str().into());
    }
    if let Some(category) = extract_category(text) {
        parameters.insert("category".to_string(), category.into());
    }

    parameters
}

/// Coarse extraction pass used by the agent on the sanitized message:
/// date, priority and category only — content stays with the classifier.
pub fn extract_from_text(text: &str) -> ParamMap {
    let mut parameters = ParamMap::new();
    if let Some(due_date) = extract_due_date(text) {
        parameters.insert("due_date".to_string(), due_date.into());
    }
    if let Some(priority) = extract_priority(text) {
        parameters.insert("priority".to_string(), priority.as_str().into());
    }
    if let Some(category) = extract_category(text) {
        parameters.insert("category".to_string(), category.into());
    }
    parameters
}

/// Strip characters that have no place in a chat message and bound the
/// length. The result is what classification and extraction operate on.
pub fn sanitize_user_input(text: &str) -> String {
    let stripped: String = text
        .chars()
        .filter(|c| !matches!(c, '<' | '>' | '{' | '}' | '[' | ']'))
        .collect();
    truncate_chars(&stripped, 2000)
}

/// Truncate on a character boundary, never mid-codepoint.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

fn extract_content(text: &str) -> Option<String> {
    for pattern in CONTENT_PATTERNS.iter() {
        if let Some(captures) = pattern.captures(text) {
            // Take the last non-empty capture group.
            for i in (1..captures.len()).rev() {
                if let Some(group) = captures.get(i) {
                    let trimmed = group.as_str().trim();
                    if !trimmed.is_empty() {
                        return Some(trimmed.to_string());
                    }
                }
            }
        }
    }

    // No pattern matched: strip a leading action word and all todo nouns
    // and use the remainder, if any.
    let without_action = ACTION_PREFIX.replace(text, "");
    let without_nouns = NOUN_WORDS.replace_all(&without_action, "");
    let remainder = without_nouns.trim();
    if remainder.is_empty() {
        None
    } else {
        Some(remainder.to_string())
    }
}

fn extract_due_date(text: &str) -> Option<String> {
    if TODAY.is_match(text) {
        return Some("today".to_string());
    }
    if TOMORROW.is_match(text) {
        return Some("tomorrow".to_string());
    }
    if NEXT_WEEK.is_match(text) {
        return Some("next_week".to_string());
    }
    if NEXT_MONTH.is_match(text) {
        return Some("next_month".to_string());
    }
    if let Some(captures) = IN_DAYS.captures(text) {
        return Some(format!("in_{}_days", &captures[1]));
    }
    if let Some(captures) = ON_DATE.captures(text) {
        return Some(format!("on_date:{}", &captures[1]));
    }
    if let Some(captures) = BY_DATE.captures(text) {
        return Some(format!("by_date:{}", &captures[1]));
    }
    if let Some(captures) = BY_DAY.captures(text) {
        return Some(format!("by_day:{}", captures[1].to_lowercase()));
    }
    None
}

fn extract_priority(text: &str) -> Option<PriorityLevel> {
    // Buckets are checked high to low; the first with any match wins.
    if PRIORITY_HIGH.is_match(text) {
        return Some(PriorityLevel::High);
    }
    if PRIORITY_MEDIUM.is_match(text) {
        return Some(PriorityLevel::Medium);
    }
    if PRIORITY_LOW.is_match(text) {
        return Some(PriorityLevel::Low);
    }
    None
}

fn extract_category(text: &str) -> Option<String> {
    CATEGORY
        .captures(text)
        .map(|captures| captures[1].to_lowercase())
}
