//! Skill for deleting todos.

use std::sync::Arc;

use async_trait::async_trait;

use tasktalk_memory::TodoStore;
use tasktalk_schema::{ParamMap, SkillOutcome};

use crate::skill::{param_i64, Skill};

pub struct TodoDeleteSkill {
    store: Arc<dyn TodoStore>,
}

impl TodoDeleteSkill {
    pub fn new(store: Arc<dyn TodoStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Skill for TodoDeleteSkill {
    fn name(&self) -> &str {
        "todo_delete_skill"
    }

    fn description(&self) -> &str {
        "Deletes existing todos based on natural language input"
    }

    fn input_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "todo_id": {
                    "type": "integer",
                    "description": "The ID of the todo to delete"
                }
            },
            "required": ["todo_id"]
        })
    }

    async fn execute(&self, user_id: &str, parameters: &ParamMap) -> SkillOutcome {
        if !self.validate_parameters(parameters) {
            return SkillOutcome::fail(
                "Invalid parameters provided",
                "Required parameters missing or invalid",
            );
        }

        let Some(todo_id) = param_i64(parameters, "todo_id") else {
            return SkillOutcome::fail(
                "Invalid parameters provided",
                "todo_id must be an integer",
            );
        };

        // Fetch first so the reply can name what was deleted.
        let todo = match self.store.find_todo(user_id, todo_id).await {
            Ok(Some(todo)) => todo,
            Ok(None) => {
                return SkillOutcome::fail(
                    format!("Todo with ID {todo_id} not found or doesn't belong to user"),
                    "Todo not found or access denied",
                )
            }
            Err(err) => return SkillOutcome::fail("Failed to delete todo", err.to_string()),
        };

        match self.store.delete_todo(user_id, todo_id).await {
            Ok(true) => {
                let mut data = ParamMap::new();
                data.insert("deleted_todo_id".to_string(), todo.id.into());
                data.insert("deleted_title".to_string(), todo.title.clone().into());
                SkillOutcome::ok(
                    format!("Successfully deleted todo: '{}'", todo.title),
                    data,
                )
            }
            Ok(false) => SkillOutcome::fail(
                format!("Todo with ID {todo_id} not found or doesn't belong to user"),
                "Todo not found or access denied",
            ),
            Err(err) => SkillOutcome::fail("Failed to delete todo", err.to_string()),
        }
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

    async fn seeded_store() -> (Arc<SqliteStore>, i64) {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let todo = store
            .insert_todo(NewTodo {
                title: "meeting prep".to_string(),
                description: None,
                completed: false,
                priority: 3,
                due_date: None,
                user_id: "user-1".to_string(),
            })
            .await
            .unwrap();
        (store, todo.id)
    }

    #[test]
    fn skill_properties() {
        let skill = TodoDeleteSkill::new(Arc::new(SqliteStore::open_in_memory().unwrap()));
        assert_eq!(skill.name(), "todo_delete_skill");
        assert!(skill.description().to_lowercase().contains("deletes existing todos"));
        let schema = skill.input_schema();
        assert!(schema["properties"]["todo_id"].is_object());
        assert_eq!(schema["required"][0], "todo_id");
    }

    #[tokio::test]
    async fn deletes_owned_todo() {
        let (store, id) = seeded_store().await;
        let skill = TodoDeleteSkill::new(store.clone());

        let outcome = skill
            .execute("user-1", &params(&[("todo_id", id.into())]))
            .await;

        assert!(outcome.success);
        assert!(outcome.message.to_lowercase().contains("successfully deleted todo"));
        let data = outcome.data.unwrap();
        assert_eq!(data["deleted_todo_id"], serde_json::json!(id));
        assert_eq!(data["deleted_title"], "meeting prep");

        assert!(store.find_todo("user-1", id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn wrong_owner_gets_not_found() {
        let (store, id) = seeded_store().await;
        let skill = TodoDeleteSkill::new(store.clone());

        let outcome = skill
            .execute("someone-else", &params(&[("todo_id", id.into())]))
            .await;

        assert!(!outcome.success);
        assert!(outcome.message.contains("not found or doesn't belong to user"));
        // The todo is untouched for its real owner.
        assert!(store.find_todo("user-1", id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn unknown_id_gets_not_found() {
        let (store, _) = seeded_store().await;
        let skill = TodoDeleteSkill::new(store);

        let outcome = skill
            .execute("user-1", &params(&[("todo_id", 9999.into())]))
            .await;

        assert!(!outcome.success);
        assert!(outcome.message.contains("not found or doesn't belong to user"));
    }

    #[tokio::test]
    async fn missing_todo_id_fails_validation() {
        let (store, _) = seeded_store().await;
        let skill = TodoDeleteSkill::new(store);

        let outcome = skill.execute("user-1", &ParamMap::new()).await;

        assert!(!outcome.success);
        assert_eq!(outcome.message, "Invalid parameters provided");
    }
}
