use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Parameter maps exchanged between the classifier, the agent and skills.
pub type ParamMap = serde_json::Map<String, serde_json::Value>;

/// A single todo item, always owned by exactly one user.
///
/// `priority` runs 1 (high) to 5 (low). `due_date` is kept as the raw token
/// string the user supplied ("today", "by_day:friday", ...) — date resolution
/// happens outside this system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Todo {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub completed: bool,
    pub priority: i64,
    #[serde(default)]
    pub due_date: Option<String>,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

/// Fields for inserting a new todo. The store assigns the id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTodo {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub completed: bool,
    pub priority: i64,
    #[serde(default)]
    pub due_date: Option<String>,
    pub user_id: String,
}

/// Sparse update set for a todo. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TodoPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub completed: Option<bool>,
    #[serde(default)]
    pub priority: Option<i64>,
    #[serde(default)]
    pub due_date: Option<String>,
}

impl TodoPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.completed.is_none()
            && self.priority.is_none()
            && self.due_date.is_none()
    }

    /// Names of the fields present in this patch, in declaration order.
    pub fn field_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        if self.title.is_some() {
            names.push("title".to_string());
        }
        if self.description.is_some() {
            names.push("description".to_string());
        }
        if self.completed.is_some() {
            names.push("completed".to_string());
        }
        if self.priority.is_some() {
            names.push("priority".to_string());
        }
        if self.due_date.is_some() {
            names.push("due_date".to_string());
        }
        names
    }
}

/// Filter for listing a user's todos. Every field is optional; an empty
/// filter returns everything the user owns.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TodoFilter {
    #[serde(default)]
    pub completed: Option<bool>,
    #[serde(default)]
    pub priority: Option<i64>,
}

/// Priority expressed as the three user-facing buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriorityLevel {
    High,
    Medium,
    Low,
}

impl PriorityLevel {
    /// Parse a bucket keyword. Unrecognized keywords return None.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword.to_lowercase().as_str() {
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }

    /// Map to the stored integer scale: high=1, medium=3, low=5.
    pub fn as_int(self) -> i64 {
        match self {
            Self::High => 1,
            Self::Medium => 3,
            Self::Low => 5,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

/// The closed set of intents the classifier can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntentKind {
    CreateTodo,
    UpdateTodo,
    DeleteTodo,
    QueryTodos,
    Unknown,
}

impl IntentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CreateTodo => "CREATE_TODO",
            Self::UpdateTodo => "UPDATE_TODO",
            Self::DeleteTodo => "DELETE_TODO",
            Self::QueryTodos => "QUERY_TODOS",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Fixed mapping from intent to the skill registered for it.
    pub fn skill_name(self) -> Option<&'static str> {
        match self {
            Self::CreateTodo => Some("todo_create_skill"),
            Self::UpdateTodo => Some("todo_update_skill"),
            Self::DeleteTodo => Some("todo_delete_skill"),
            Self::QueryTodos => Some("todo_query_skill"),
            Self::Unknown => None,
        }
    }
}

/// Result of classifying one message. Created per call, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classification {
    pub intent: IntentKind,
    pub skill_name: Option<String>,
    pub confidence: f64,
    /// Identifiers of every pattern that improved the running best while
    /// scoring, in match order — the audit trail for why this fired.
    pub matched_patterns: Vec<String>,
    pub parameters: ParamMap,
}

/// Standard result structure returned by every skill execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillOutcome {
    pub success: bool,
    pub message: String,
    #[serde(default)]
    pub data: Option<ParamMap>,
    #[serde(default)]
    pub error: Option<String>,
}

impl SkillOutcome {
    pub fn ok(message: impl Into<String>, data: ParamMap) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            error: None,
        }
    }

    pub fn fail(message: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            error: Some(error.into()),
        }
    }
}

/// Envelope returned by the agent for every processed message.
///
/// This is a total contract: the agent produces one of these for any input,
/// it never surfaces an error to the transport layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentReply {
    pub response: String,
    pub intent: String,
    pub confidence: f64,
    pub action_taken: ParamMap,
    pub parameters_extracted: ParamMap,
}

/// A registered account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub salt: String,
    pub created_at: DateTime<Utc>,
}

/// A login session. Only the hash of the bearer token is stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub token_hash: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_levels_map_to_stored_scale() {
        assert_eq!(PriorityLevel::High.as_int(), 1);
        assert_eq!(PriorityLevel::Medium.as_int(), 3);
        assert_eq!(PriorityLevel::Low.as_int(), 5);
        assert_eq!(PriorityLevel::from_keyword("HIGH"), Some(PriorityLevel::High));
        assert_eq!(PriorityLevel::from_keyword("urgent"), None);
    }

    #[test]
    fn intent_skill_mapping_is_fixed() {
        assert_eq!(IntentKind::CreateTodo.skill_name(), Some("todo_create_skill"));
        assert_eq!(IntentKind::UpdateTodo.skill_name(), Some("todo_update_skill"));
        assert_eq!(IntentKind::DeleteTodo.skill_name(), Some("todo_delete_skill"));
        assert_eq!(IntentKind::QueryTodos.skill_name(), Some("todo_query_skill"));
        assert_eq!(IntentKind::Unknown.skill_name(), None);
    }

    #[test]
    fn empty_patch_reports_no_fields() {
        let patch = TodoPatch::default();
        assert!(patch.is_empty());
        assert!(patch.field_names().is_empty());

        let patch = TodoPatch {
            completed: Some(true),
            priority: Some(1),
            ..Default::default()
        };
        assert!(!patch.is_empty());
        assert_eq!(patch.field_names(), vec!["completed", "priority"]);
    }

    #[test]
    fn skill_outcome_roundtrips_json() {
        let mut data = ParamMap::new();
        data.insert("todo_id".into(), serde_json::json!(7));
        let outcome = SkillOutcome::ok("Successfully created todo: 'x'", data);

        let json = serde_json::to_string(&outcome).unwrap();
        let back: SkillOutcome = serde_json::from_str(&json).unwrap();
        assert!(back.success);
        assert_eq!(back.data.unwrap()["todo_id"], serde_json::json!(7));
        assert!(back.error.is_none());
    }
}
