//! Skill for querying and summarizing a user's todos.

use std::sync::Arc;

use async_trait::async_trait;

use tasktalk_memory::TodoStore;
use tasktalk_schema::{ParamMap, PriorityLevel, SkillOutcome, TodoFilter};

use crate::skill::{param_str, Skill};

/// How many todo titles the summary lists before "...and N more".
const SUMMARY_LIMIT: usize = 3;

pub struct TodoQuerySkill {
    store: Arc<dyn TodoStore>,
}

impl TodoQuerySkill {
    pub fn new(store: Arc<dyn TodoStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Skill for TodoQuerySkill {
    fn name(&self) -> &str {
        "todo_query_skill"
    }

    fn description(&self) -> &str {
        "Queries and retrieves todos based on natural language input"
    }

    fn input_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "status": {
                    "type": "string",
                    "enum": ["completed", "pending"],
                    "description": "Filter by completion status (optional)"
                },
                "priority": {
                    "type": "string",
                    "enum": ["low", "medium", "high"],
                    "description": "Filter by priority level (optional)"
                },
                "due_date": {
                    "type": "string",
                    "description": "Due date token (accepted but not applied)"
                }
            },
            "required": []
        })
    }

    async fn execute(&self, user_id: &str, parameters: &ParamMap) -> SkillOutcome {
        let mut filter = TodoFilter::default();
        let mut filters_applied = ParamMap::new();

        if let Some(status) = param_str(parameters, "status") {
            match status.as_str() {
                "completed" => filter.completed = Some(true),
                "pending" => filter.completed = Some(false),
                _ => {}
            }
            if filter.completed.is_some() {
                filters_applied.insert("status".to_string(), status.into());
            }
        }
        if let Some(priority) = param_str(parameters, "priority") {
            if let Some(level) = PriorityLevel::from_keyword(&priority) {
                filter.priority = Some(level.as_int());
                filters_applied.insert("priority".to_string(), priority.into());
            }
        }
        // Due-date filtering is accepted and echoed back, but not applied.
        if let Some(due_date) = param_str(parameters, "due_date") {
            filters_applied.insert("due_date".to_string(), due_date.into());
        }

        let todos = match self.store.list_todos(user_id, &filter).await {
            Ok(todos) => todos,
            Err(err) => return SkillOutcome::fail("Failed to query todos", err.to_string()),
        };

        let count = todos.len();
        let mut message = format!(
            "You have {count} task{}",
            if count == 1 { "" } else { "s" }
        );
        if count == 0 {
            message.push('.');
        } else {
            message.push(':');
            for todo in todos.iter().take(SUMMARY_LIMIT) {
                let marker = if todo.completed { "[x]" } else { "[ ]" };
                message.push_str(&format!("\n{marker} {}", todo.title));
            }
            if count > SUMMARY_LIMIT {
                message.push_str(&format!("\n...and {} more", count - SUMMARY_LIMIT));
            }
        }

        let todo_values: Vec<serde_json::Value> = todos
            .iter()
            .map(|todo| {
                serde_json::json!({
                    "id": todo.id,
                    "title": todo.title,
                    "description": todo.description,
                    "completed": todo.completed,
                    "priority": todo.priority,
                    "due_date": todo.due_date,
                })
            })
            .collect();

        let mut data = ParamMap::new();
        data.insert("count".to_string(), count.into());
        data.insert("todos".to_string(), todo_values.into());
        data.insert("filters_applied".to_string(), filters_applied.into());
        SkillOutcome::ok(message, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tasktalk_memory::SqliteStore;
    use tasktalk_schema::NewTodo;

    fn params(pairs: &[(&str, serde_json::Value)]) -> ParamMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    async fn seed(store: &SqliteStore, title: &str, completed: bool, priority: i64) {
        let todo = store
            .insert_todo(NewTodo {
                title: title.to_string(),
                description: Some(title.to_string()),
                completed: false,
                priority,
                due_date: None,
                user_id: "user-1".to_string(),
            })
            .await
            .unwrap();
        if completed {
            store
                .update_todo(
                    "user-1",
                    todo.id,
                    &tasktalk_schema::TodoPatch {
                        completed: Some(true),
                        ..Default::default()
                    },
                )
                .await
                .unwrap();
        }
    }

    #[test]
    fn skill_properties() {
        let skill = TodoQuerySkill::new(Arc::new(SqliteStore::open_in_memory().unwrap()));
        assert_eq!(skill.name(), "todo_query_skill");
        assert!(skill.description().to_lowercase().contains("queries and retrieves"));
        // No required parameters: an empty map always validates.
        assert!(skill.validate_parameters(&ParamMap::new()));
    }

    #[tokio::test]
    async fn lists_all_todos_with_markers() {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        seed(&store, "one", false, 3).await;
        seed(&store, "two", true, 1).await;
        let skill = TodoQuerySkill::new(store);

        let outcome = skill.execute("user-1", &ParamMap::new()).await;

        assert!(outcome.success);
        assert!(outcome.message.to_lowercase().contains("you have 2"));
        assert!(outcome.message.contains("[ ] one"));
        assert!(outcome.message.contains("[x] two"));
        let data = outcome.data.unwrap();
        assert_eq!(data["count"], 2);
        assert_eq!(data["todos"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn empty_result_reports_zero() {
        let skill = TodoQuerySkill::new(Arc::new(SqliteStore::open_in_memory().unwrap()));

        let outcome = skill.execute("user-1", &ParamMap::new()).await;

        assert!(outcome.success);
        assert!(outcome.message.contains("You have 0 tasks"));
        let data = outcome.data.unwrap();
        assert_eq!(data["count"], 0);
    }

    #[tokio::test]
    async fn summary_caps_at_three_titles() {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        for i in 1..=5 {
            seed(&store, &format!("task {i}"), false, 3).await;
        }
        let skill = TodoQuerySkill::new(store);

        let outcome = skill.execute("user-1", &ParamMap::new()).await;

        assert!(outcome.message.contains("task 1"));
        assert!(outcome.message.contains("task 3"));
        assert!(!outcome.message.contains("task 4"));
        assert!(outcome.message.contains("...and 2 more"));
        assert_eq!(outcome.data.unwrap()["count"], 5);
    }

    #[tokio::test]
    async fn status_and_priority_filters_apply() {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        seed(&store, "pending high", false, 1).await;
        seed(&store, "done high", true, 1).await;
        seed(&store, "pending medium", false, 3).await;
        let skill = TodoQuerySkill::new(store);

        let outcome = skill
            .execute(
                "user-1",
                &params(&[("status", "pending".into()), ("priority", "high".into())]),
            )
            .await;

        assert!(outcome.success);
        let data = outcome.data.unwrap();
        assert_eq!(data["count"], 1);
        assert_eq!(data["todos"][0]["title"], "pending high");
        assert_eq!(data["filters_applied"]["status"], "pending");
        assert_eq!(data["filters_applied"]["priority"], "high");
    }

    #[tokio::test]
    async fn due_date_filter_recorded_but_not_applied() {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        seed(&store, "anytime", false, 3).await;
        let skill = TodoQuerySkill::new(store);

        let outcome = skill
            .execute("user-1", &params(&[("due_date", "today".into())]))
            .await;

        let data = outcome.data.unwrap();
        // Recorded...
        assert_eq!(data["filters_applied"]["due_date"], "today");
        // ...but everything still comes back.
        assert_eq!(data["count"], 1);
    }

    #[tokio::test]
    async fn only_sees_own_todos() {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        store
            .insert_todo(NewTodo {
                title: "someone else's".to_string(),
                description: None,
                completed: false,
                priority: 3,
                due_date: None,
                user_id: "user-2".to_string(),
            })
            .await
            .unwrap();
        let skill = TodoQuerySkill::new(store);

        let outcome = skill.execute("user-1", &ParamMap::new()).await;

        assert_eq!(outcome.data.unwrap()["count"], 0);
    }
}
