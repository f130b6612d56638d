//! Skill for creating todos from natural language input.

use std::sync::Arc;

use async_trait::async_trait;

use tasktalk_memory::TodoStore;
use tasktalk_schema::{NewTodo, ParamMap, PriorityLevel, SkillOutcome};

use crate::skill::{param_str, Skill};

pub struct TodoCreateSkill {
    store: Arc<dyn TodoStore>,
}

impl TodoCreateSkill {
    pub fn new(store: Arc<dyn TodoStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Skill for TodoCreateSkill {
    fn name(&self) -> &str {
        "todo_create_skill"
    }

    fn description(&self) -> &str {
        "Creates new todos based on natural language input"
    }

    fn input_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "content": {
                    "type": "string",
                    "description": "The content/description of the todo"
                },
                "due_date": {
                    "type": "string",
                    "description": "Due date token for the todo (optional)"
                },
                "priority": {
                    "type": "string",
                    "enum": ["low", "medium", "high"],
                    "description": "Priority level (default: medium)"
                },
                "category": {
                    "type": "string",
                    "description": "Category/area of life for the todo (optional)"
                }
            },
            "required": ["content"]
        })
    }

    async fn execute(&self, user_id: &str, parameters: &ParamMap) -> SkillOutcome {
        if !self.validate_parameters(parameters) {
            return SkillOutcome::fail(
                "Invalid parameters provided",
                "Required parameters missing or invalid",
            );
        }

        let content = param_str(parameters, "content")
            .unwrap_or_default()
            .trim()
            .to_string();
        if content.is_empty() {
            return SkillOutcome::fail(
                "Cannot create a todo without content",
                "Empty content provided",
            );
        }

        let priority_str = param_str(parameters, "priority")
            .unwrap_or_else(|| "medium".to_string())
            .to_lowercase();
        let priority = PriorityLevel::from_keyword(&priority_str)
            .unwrap_or(PriorityLevel::Medium)
            .as_int();
        let due_date = param_str(parameters, "due_date");
        let category = param_str(parameters, "category");

        let new_todo = NewTodo {
            title: content.clone(),
            // The raw content doubles as the description.
            description: Some(content.clone()),
            completed: false,
            priority,
            due_date: due_date.clone(),
            user_id: user_id.to_string(),
        };

        match self.store.insert_todo(new_todo).await {
            Ok(todo) => {
                let mut data = ParamMap::new();
                data.insert("todo_id".to_string(), todo.id.into());
                data.insert("content".to_string(), content.clone().into());
                data.insert(
                    "due_date".to_string(),
                    due_date.map(Into::into).unwrap_or(serde_json::Value::Null),
                );
                data.insert("priority".to_string(), priority_str.into());
                data.insert(
                    "category".to_string(),
                    category.map(Into::into).unwrap_or(serde_json::Value::Null),
                );
                SkillOutcome::ok(format!("Successfully created todo: '{content}'"), data)
            }
            Err(err) => SkillOutcome::fail("Failed to create todo", err.to_string()),
        }
    }
}
