//! The agent orchestrating classification and skill execution.
//!
//! One `process_message` call runs the whole pipeline: sanitize, classify,
//! merge extracted parameters, pick a skill, validate, execute, format.
//! The contract with the transport layer is total: every input produces a
//! well-formed `AgentReply`, never an error.

use std::sync::Arc;

use tasktalk_memory::TodoStore;
use tasktalk_schema::{AgentReply, IntentKind, ParamMap};

use crate::audit::ChatAuditEntry;
use crate::classifier::IntentClassifier;
use crate::create_skill::TodoCreateSkill;
use crate::delete_skill::TodoDeleteSkill;
use crate::extract::{extract_from_text, sanitize_user_input, truncate_chars};
use crate::query_skill::TodoQuerySkill;
use crate::skill::{Skill, SkillRegistry};
use crate::update_skill::TodoUpdateSkill;

/// Below this confidence the agent answers with the fallback instead of
/// dispatching a skill.
const CONFIDENCE_THRESHOLD: f64 = 0.5;

/// How much of the user's message the fallback response echoes back.
const ECHO_LEN: usize = 50;

pub struct TodoAgent {
    classifier: IntentClassifier,
    skills: SkillRegistry,
}

impl TodoAgent {
    /// Build an agent from an explicit classifier and skill registry.
    pub fn new(classifier: IntentClassifier, skills: SkillRegistry) -> Self {
        Self { classifier, skills }
    }

    /// Build an agent with the four standard todo skills wired to `store`.
    pub fn with_default_skills(store: Arc<dyn TodoStore>) -> Self {
        let mut skills = SkillRegistry::new();
        skills.register(Arc::new(TodoCreateSkill::new(store.clone())));
        skills.register(Arc::new(TodoUpdateSkill::new(store.clone())));
        skills.register(Arc::new(TodoDeleteSkill::new(store.clone())));
        skills.register(Arc::new(TodoQuerySkill::new(store)));
        Self::new(IntentClassifier::new(), skills)
    }

    pub fn register_skill(&mut self, skill: Arc<dyn Skill>) {
        self.skills.register(skill);
    }

    pub fn skill_names(&self) -> Vec<String> {
        self.skills.names()
    }

    /// Process one user message end to end.
    pub async fn process_message(&self, user_id: &str, message: &str) -> AgentReply {
        let sanitized = sanitize_user_input(message);

        let classification = self.classifier.classify(&sanitized);
        ChatAuditEntry::intent_classified(user_id, &sanitized, &classification).emit();

        // Coarse extraction first, then the classifier's parameters on top:
        // on a key collision the classifier wins.
        let mut parameters = extract_from_text(&sanitized);
        for (key, value) in classification.parameters.iter() {
            parameters.insert(key.clone(), value.clone());
        }

        let intent = classification.intent;
        let confidence = classification.confidence;
        let mut action_taken = ParamMap::new();

        let response = if intent != IntentKind::Unknown && confidence >= CONFIDENCE_THRESHOLD {
            let skill_name = classification.skill_name.as_deref().unwrap_or_default();
            match self.skills.get(skill_name) {
                Some(skill) => {
                    if skill.validate_parameters(&parameters) {
                        let outcome = skill.execute(user_id, &parameters).await;
                        ChatAuditEntry::skill_executed(user_id, skill.name(), &outcome).emit();

                        if outcome.success {
                            action_taken = outcome.data.unwrap_or_default();
                            outcome.message
                        } else {
                            let error = outcome
                                .error
                                .unwrap_or_else(|| "Unknown error".to_string());
                            ChatAuditEntry::error(user_id, &sanitized, &error, "skill_execution")
                                .emit();
                            format!("I encountered an issue: {error}")
                        }
                    } else {
                        ChatAuditEntry::validation_failed(user_id, skill_name).emit();
                        "I couldn't understand the parameters in your request. \
                         Could you please rephrase?"
                            .to_string()
                    }
                }
                None => {
                    ChatAuditEntry::error(
                        user_id,
                        &sanitized,
                        format!("no skill registered for intent {}", intent.as_str()),
                        "missing_skill",
                    )
                    .emit();
                    format!(
                        "I recognize the intent '{}' but I don't have the capability to handle it yet.",
                        intent.as_str()
                    )
                }
            }
        } else {
            let fallback = fallback_response(&sanitized);
            ChatAuditEntry::interaction(user_id, &sanitized, &fallback, "FALLBACK", confidence)
                .emit();
            fallback
        };

        AgentReply {
            response,
            intent: intent.as_str().to_string(),
            confidence,
            action_taken,
            parameters_extracted: parameters,
        }
    }
}

fn fallback_response(message: &str) -> String {
    let preview = truncate_chars(message, ECHO_LEN);
    let ellipsis = if message.chars().count() > ECHO_LEN {
        "..."
    } else {
        ""
    };
    format!(
        "I'm not sure I understood your request: '{preview}{ellipsis}'. \
         You can try commands like 'Create a new task to buy groceries', \
         'Show me my tasks for today', 'Mark task 1 as complete', or \
         'Delete the meeting prep task'."
    )
}
