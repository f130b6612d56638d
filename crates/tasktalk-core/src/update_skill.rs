//! Skill for updating existing todos.

use std::sync::Arc;

use async_trait::async_trait;

use tasktalk_memory::TodoStore;
use tasktalk_schema::{ParamMap, PriorityLevel, SkillOutcome, TodoPatch};

use crate::skill::{param_bool, param_i64, param_str, Skill};

pub struct TodoUpdateSkill {
    store: Arc<dyn TodoStore>,
}

impl TodoUpdateSkill {
    pub fn new(store: Arc<dyn TodoStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Skill for TodoUpdateSkill {
    fn name(&self) -> &str {
        "todo_update_skill"
    }

    fn description(&self) -> &str {
        "Updates existing todos based on natural language input"
    }

    fn input_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "todo_id": {
                    "type": "integer",
                    "description": "The ID of the todo to update"
                },
                "title": {
                    "type": "string",
                    "description": "The new title for the todo (optional)"
                },
                "description": {
                    "type": "string",
                    "description": "The new description for the todo (optional)"
                },
                "completed": {
                    "type": "boolean",
                    "description": "Whether the todo is completed (optional)"
                },
                "priority": {
                    "type": "string",
                    "enum": ["low", "medium", "high"],
                    "description": "The new priority level (optional)"
                },
                "due_date": {
                    "type": "string",
                    "description": "The new due date token for the todo (optional)"
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

        let patch = TodoPatch {
            title: param_str(parameters, "title"),
            description: param_str(parameters, "description"),
            completed: param_bool(parameters, "completed"),
            priority: param_str(parameters, "priority").map(|p| {
                PriorityLevel::from_keyword(&p)
                    .unwrap_or(PriorityLevel::Medium)
                    .as_int()
            }),
            due_date: param_str(parameters, "due_date"),
        };

        if patch.is_empty() {
            return SkillOutcome::fail("No valid fields to update", "No update parameters provided");
        }

        match self.store.update_todo(user_id, todo_id, &patch).await {
            Ok(Some(todo)) => {
                let mut data = ParamMap::new();
                data.insert("todo_id".to_string(), todo.id.into());
                data.insert("title".to_string(), todo.title.into());
                data.insert("completed".to_string(), todo.completed.into());
                data.insert("priority".to_string(), todo.priority.into());
                data.insert(
                    "updated_fields".to_string(),
                    patch.field_names().into(),
                );
                SkillOutcome::ok(format!("Successfully updated todo ID {todo_id}"), data)
            }
            Ok(None) => SkillOutcome::fail(
                format!("Todo with ID {todo_id} not found or doesn't belong to user"),
                "Todo not found or access denied",
            ),
            Err(err) => SkillOutcome::fail("Failed to update todo", err.to_string()),
        }
    }
}
