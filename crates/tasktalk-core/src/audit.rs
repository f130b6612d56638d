//! Structured audit logging for chat processing.
//!
//! Every classification, skill execution and fallback is recorded as a flat
//! event with a timestamp and user id. Emission goes through `tracing`, so a
//! missing subscriber (or a failing one) can never abort a request.

use chrono::{DateTime, Utc};
use serde::Serialize;

use tasktalk_schema::{Classification, SkillOutcome};

use crate::extract::truncate_chars;

/// Longest message/response preview kept in an audit record.
const PREVIEW_LEN: usize = 200;

#[derive(Debug, Clone, Serialize)]
pub struct ChatAuditEntry {
    pub timestamp: DateTime<Utc>,
    pub user_id: String,
    #[serde(flatten)]
    pub event: ChatEvent,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ChatEvent {
    IntentClassified {
        message: String,
        intent: String,
        confidence: f64,
        matched_patterns: Vec<String>,
    },
    SkillExecuted {
        skill_name: String,
        success: bool,
        message: String,
        error: Option<String>,
    },
    Interaction {
        message: String,
        response: String,
        intent: String,
        confidence: f64,
    },
    AgentError {
        message: String,
        error: String,
        context: String,
    },
}

impl ChatAuditEntry {
    pub fn intent_classified(
        user_id: impl Into<String>,
        message: &str,
        classification: &Classification,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            user_id: user_id.into(),
            event: ChatEvent::IntentClassified {
                message: truncate_chars(message, PREVIEW_LEN),
                intent: classification.intent.as_str().to_string(),
                confidence: classification.confidence,
                matched_patterns: classification.matched_patterns.clone(),
            },
        }
    }

    pub fn skill_executed(
        user_id: impl Into<String>,
        skill_name: impl Into<String>,
        outcome: &SkillOutcome,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            user_id: user_id.into(),
            event: ChatEvent::SkillExecuted {
                skill_name: skill_name.into(),
                success: outcome.success,
                message: outcome.message.clone(),
                error: outcome.error.clone(),
            },
        }
    }

    pub fn validation_failed(user_id: impl Into<String>, skill_name: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            user_id: user_id.into(),
            event: ChatEvent::SkillExecuted {
                skill_name: skill_name.into(),
                success: false,
                message: "Parameter validation failed".to_string(),
                error: Some("Invalid parameters provided".to_string()),
            },
        }
    }

    pub fn interaction(
        user_id: impl Into<String>,
        message: &str,
        response: &str,
        intent: impl Into<String>,
        confidence: f64,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            user_id: user_id.into(),
            event: ChatEvent::Interaction {
                message: truncate_chars(message, PREVIEW_LEN),
                response: truncate_chars(response, PREVIEW_LEN),
                intent: intent.into(),
                confidence,
            },
        }
    }

    pub fn error(
        user_id: impl Into<String>,
        message: &str,
        error: impl Into<String>,
        context: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            user_id: user_id.into(),
            event: ChatEvent::AgentError {
                message: truncate_chars(message, PREVIEW_LEN),
                error: error.into(),
                context: context.into(),
            },
        }
    }

    /// Emit this entry to the tracing log.
    pub fn emit(&self) {
        match &self.event {
            ChatEvent::IntentClassified {
                message,
                intent,
                confidence,
                matched_patterns,
            } => {
                tracing::info!(
                    target: "tasktalk::audit",
                    user_id = %self.user_id,
                    intent = %intent,
                    confidence = %confidence,
                    patterns = matched_patterns.len(),
                    message = %message,
                    "intent_classified"
                );
            }
            ChatEvent::SkillExecuted {
                skill_name,
                success,
                message,
                error,
            } => {
                tracing::info!(
                    target: "tasktalk::audit",
                    user_id = %self.user_id,
                    skill = %skill_name,
                    success = success,
                    message = %message,
                    "skill_executed"
                );
                if let Some(error) = error {
                    tracing::warn!(
                        target: "tasktalk::audit",
                        user_id = %self.user_id,
                        skill = %skill_name,
                        error = %error,
                        "skill execution failed"
                    );
                }
            }
            ChatEvent::Interaction {
                message,
                response,
                intent,
                confidence,
            } => {
                tracing::info!(
                    target: "tasktalk::audit",
                    user_id = %self.user_id,
                    intent = %intent,
                    confidence = %confidence,
                    message = %message,
                    response = %response,
                    "chat_interaction"
                );
            }
            ChatEvent::AgentError {
                message,
                error,
                context,
            } => {
                tracing::warn!(
                    target: "tasktalk::audit",
                    user_id = %self.user_id,
                    context = %context,
                    error = %error,
                    message = %message,
                    "agent_error"
                );
            }
        }
    }
}
