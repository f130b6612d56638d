//! Skill execution framework.
//!
//! This module provides:
//! - The `Skill` trait every handler implements
//! - `SkillRegistry` for looking skills up by name
//! - Parameter coercion helpers shared by the skill implementations
//!
//! Skills are stateless and never let a failure escape: `execute` always
//! returns a `SkillOutcome`, with store and validation failures folded into
//! `success = false`.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use tasktalk_schema::{ParamMap, SkillOutcome};

/// A handler for one intent's business logic.
#[async_trait]
pub trait Skill: Send + Sync {
    /// Unique, stable identifier used for registry lookup.
    fn name(&self) -> &str;

    /// Human-readable description of what the skill does.
    fn description(&self) -> &str;

    /// Declarative input schema: an object with `properties` and `required`.
    fn input_schema(&self) -> serde_json::Value;

    /// Execute for the given user. Must not panic and must not error —
    /// every failure is reported through the returned outcome.
    async fn execute(&self, user_id: &str, parameters: &ParamMap) -> SkillOutcome;

    /// Check that every required parameter is present.
    ///
    /// Presence only — types are coerced (and rejected) during execution,
    /// not here.
    fn validate_parameters(&self, parameters: &ParamMap) -> bool {
        let schema = self.input_schema();
        let Some(required) = schema.get("required").and_then(|r| r.as_array()) else {
            return true;
        };
        required
            .iter()
            .filter_map(|key| key.as_str())
            .all(|key| parameters.contains_key(key))
    }
}

/// Registry of available skills, keyed by name. Populated once at startup
/// and read-only afterwards.
#[derive(Default)]
pub struct SkillRegistry {
    skills: HashMap<String, Arc<dyn Skill>>,
}

impl SkillRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a skill. A later registration under the same name replaces
    /// the earlier one.
    pub fn register(&mut self, skill: Arc<dyn Skill>) {
        self.skills.insert(skill.name().to_string(), skill);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Skill>> {
        self.skills.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.skills.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn names(&self) -> Vec<String> {
        self.skills.keys().cloned().collect()
    }
}

/// Read a string parameter, accepting only JSON strings.
pub(crate) fn param_str(parameters: &ParamMap, key: &str) -> Option<String> {
    parameters
        .get(key)
        .and_then(|v| v.as_str())
        .map(str::to_string)
}

/// Read an integer parameter, accepting numbers and numeric strings.
pub(crate) fn param_i64(parameters: &ParamMap, key: &str) -> Option<i64> {
    match parameters.get(key)? {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Read a boolean parameter, accepting booleans and "true"/"false" strings.
pub(crate) fn param_bool(parameters: &ParamMap, key: &str) -> Option<bool> {
    match parameters.get(key)? {
        serde_json::Value::Bool(b) => Some(*b),
        serde_json::Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoSkill;

    #[async_trait]
    impl Skill for EchoSkill {
        fn name(&self) -> &str {
            "echo_skill"
        }

        fn description(&self) -> &str {
            "Echoes its text parameter"
        }

        fn input_schema(&self) -> serde_json::Value {
            serde_json::json!({
                "type": "object",
                "properties": {
                    "text": {"type": "string", "description": "Text to echo"}
                },
                "required": ["text"]
            })
        }

        async fn execute(&self, _user_id: &str, parameters: &ParamMap) -> SkillOutcome {
            let text = param_str(parameters, "text").unwrap_or_default();
            SkillOutcome::ok(text, ParamMap::new())
        }
    }

    fn params(pairs: &[(&str, serde_json::Value)]) -> ParamMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn registry_register_and_lookup() {
        let mut registry = SkillRegistry::new();
        assert!(registry.is_empty());

        registry.register(Arc::new(EchoSkill));
        assert_eq!(registry.len(), 1);
        assert!(registry.contains("echo_skill"));
        assert!(registry.get("echo_skill").is_some());
        assert!(registry.get("missing_skill").is_none());
    }

    #[test]
    fn default_validator_checks_required_keys_only() {
        let skill = EchoSkill;

        assert!(!skill.validate_parameters(&ParamMap::new()));
        assert!(skill.validate_parameters(&params(&[("text", "hi".into())])));
        // Presence is enough; a wrong type still passes validation.
        assert!(skill.validate_parameters(&params(&[("text", serde_json::json!(42))])));
    }

    #[tokio::test]
    async fn execute_through_registry() {
        let mut registry = SkillRegistry::new();
        registry.register(Arc::new(EchoSkill));

        let skill = registry.get("echo_skill").unwrap();
        let outcome = skill
            .execute("user-1", &params(&[("text", "hello".into())]))
            .await;
        assert!(outcome.success);
        assert_eq!(outcome.message, "hello");
    }

    #[test]
    fn param_coercion_accepts_reasonable_shapes() {
        let p = params(&[
            ("a", serde_json::json!(7)),
            ("b", serde_json::json!("12")),
            ("c", serde_json::json!("true")),
            ("d", serde_json::json!(false)),
            ("e", serde_json::json!("not a number")),
        ]);

        assert_eq!(param_i64(&p, "a"), Some(7));
        assert_eq!(param_i64(&p, "b"), Some(12));
        assert_eq!(param_i64(&p, "e"), None);
        assert_eq!(param_bool(&p, "c"), Some(true));
        assert_eq!(param_bool(&p, "d"), Some(false));
        assert_eq!(param_bool(&p, "e"), None);
        assert_eq!(param_str(&p, "e").as_deref(), Some("not a number"));
        assert_eq!(param_str(&p, "a"), None);
    }
}
