//! Rule-based intent classification.
//!
//! Every intent owns an ordered list of `(pattern, base_confidence)` rules
//! evaluated against normalized text. No training data, no model: given the
//! same input the classifier always produces the same result, and
//! `matched_patterns` records exactly why it fired.

use once_cell::sync::Lazy;
use regex::Regex;

use tasktalk_schema::{Classification, IntentKind};

use crate::extract::extract_parameters;
use crate::normalize::normalize;

struct Rule {
    regex: Regex,
    confidence: f64,
}

fn rule(pattern: &str, confidence: f64) -> Rule {
    Rule {
        regex: Regex::new(pattern).expect("invalid intent pattern"),
        confidence,
    }
}

/// Rule tables in declaration order. Order matters twice: rules within an
/// intent are tried top to bottom, and with equal confidence across intents
/// the first-declared intent keeps the lead.
static RULES: Lazy<Vec<(IntentKind, Vec<Rule>)>> = Lazy::new(|| {
    vec![
        (
            IntentKind::CreateTodo,
            vec![
                rule(
                    r"\b(create|add|make|new|set up|schedule|plan)\b.*\b(todo|task|to-do|thing|item|do|appointment|reminder)\b",
                    0.9,
                ),
                rule(r"\b(add|create)\b.*\b(task|todo)\b", 0.85),
                rule(r"\b(make|set up)\b.*\b(reminder|appointment)\b", 0.85),
                rule(r"\b(new)\b.*\b(item|thing to do)\b", 0.8),
                rule(
                    r"\b(create|add|make|new|set up|schedule|plan)\b.*\b(to )?(buy|call|meet|work on|prepare|finish|complete|do|get|pick up|send|write|read|watch|attend|organize|clean|fix|order|pay|cook|exercise|study|learn|review|start|begin|launch|implement|execute|perform|carry out|undertake|achieve|reach|visit)\b",
                    0.95,
                ),
                rule(
                    r"\b(i need to|i want to|i have to|i should|i must|i will|i shall|time to|going to|need to|want to|have to|should|must|will|shall|gonna|wanna|gotta|got to)\b.*\b(buy|call|meet|work on|prepare|finish|complete|do|get|pick up|send|write|read|watch|attend|organize|clean|fix|order|pay|cook|exercise|study|practice|learn|teach|review|approve|reject|confirm|cancel|start|begin|launch|implement|execute|perform|carry out|undertake|accomplish|achieve|reach|visit)\b",
                    0.9,
                ),
                rule(
                    r"\b(todo|task|to-do|thing|item|do|appointment|reminder)\b.*\b(i need to|i want to|i have to|i should|i must|i will|i shall|time to|going to|need to|want to|have to|should|must|will|shall|gonna|wanna|gotta|got to)\b",
                    0.85,
                ),
            ],
        ),
        (
            IntentKind::UpdateTodo,
            vec![
                rule(
                    r"\b(update|change|modify|edit|adjust)\b.*\b(todo|task|to-do|thing|item|description|details|priority|due date|title)\b",
                    0.85,
                ),
                rule(r"\b(modify|edit|change)\b.*\b(task|todo)\b", 0.8),
                rule(
                    r"\b(change|update|modify)\b.*\b(the )?(description|details|priority|due date|title|status)\b",
                    0.75,
                ),
                rule(r"\b(make|set|update|change)\b.*(priorit|import|urg|secondar|low)", 0.7),
            ],
        ),
        (
            IntentKind::DeleteTodo,
            vec![
                rule(
                    r"\b(delete|remove|cancel|eliminate|get rid of|scrub|erase|wipe|clear|discard|throw away|trash|dispose of)\b.*\b(todo|task|to-do|thing|item)\b",
                    0.9,
                ),
                rule(
                    r"\b(complete|finish|done|mark as done|check off|tick off|done with)\b.*\b(task|todo)\b",
                    0.85,
                ),
                rule(r"\b(remove|delete|get rid of|eliminate)\b.*\b(item|entry|the )", 0.8),
                rule(
                    r"\b(cross off|check off|mark as done|complete|finish)\b.*\b(my |the )?(list|todos|tasks|to-dos)\b",
                    0.8,
                ),
            ],
        ),
        (
            IntentKind::QueryTodos,
            vec![
                rule(
                    r"\b(show|list|display|see|view|find|get|tell me|what)\b.*\b(my )?(todos|tasks|to-dos|things|items)\b",
                    0.9,
                ),
                rule(
                    r"\b(what do i have|what are my|show my|list my|see my|view my|get my|fetch my|retrieve my)\b",
                    0.85,
                ),
                rule(
                    r"\b(today|tomorrow|this week|this weekend|tonight|upcoming|later|soon|next week|next month|this month|this year)\b",
                    0.75,
                ),
                rule(
                    r"\b(high priority|urgent|important|critical|top priority|must do|need to do|should do|have to do|immediate|asap|as soon as possible)\b",
                    0.7,
                ),
                rule(
                    r"\b(uncompleted|incomplete|pending|not done|not finished|not completed|remaining|left to do|still to do|yet to do)\b",
                    0.7,
                ),
                rule(
                    r"\b(completed|finished|done|marked as done|already done|already completed|past tasks|accomplished|achieved)\b",
                    0.7,
                ),
            ],
        ),
    ]
});

/// Pattern-matching intent classifier.
///
/// Stateless: the rule tables are compiled once and shared; any number of
/// threads can classify concurrently.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntentClassifier;

impl IntentClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn classify(&self, text: &str) -> Classification {
        let normalized = normalize(text);

        let mut best_intent = IntentKind::Unknown;
        let mut best_confidence = 0.0_f64;
        let mut matched_patterns = Vec::new();

        for (intent, rules) in RULES.iter() {
            for rule in rules {
                if !rule.regex.is_match(&normalized) {
                    continue;
                }
                let mut confidence = rule.confidence;
                // Corroborating matches for the intent currently in the lead
                // get a capped boost; matches across intents never do.
                if *intent == best_intent {
                    confidence = (confidence * 1.1).min(0.99);
                }
                // Strict comparison: the first-seen maximum wins ties, and
                // matched_patterns records the improvement history.
                if confidence > best_confidence {
                    best_confidence = confidence;
                    best_intent = *intent;
                    matched_patterns.push(rule.regex.as_str().to_string());
                }
            }
        }

        // Parameters come from the original text: extraction patterns carry
        // their own case-insensitivity and punctuation handling.
        let parameters = extract_parameters(text, best_intent);

        Classification {
            intent: best_intent,
            skill_name: best_intent.skill_name().map(str::to_string),
            confidence: best_confidence,
            matched_patterns,
            parameters,
        }
    }

    pub fn supported_intents(&self) -> Vec<&'static str> {
        vec![
            IntentKind::CreateTodo.as_str(),
            IntentKind::UpdateTodo.as_str(),
            IntentKind::DeleteTodo.as_str(),
            IntentKind::QueryTodos.as_str(),
            IntentKind::Unknown.as_str(),
        ]
    }
}
