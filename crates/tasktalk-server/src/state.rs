use std::sync::Arc;

use tasktalk_auth::TokenManager;
use tasktalk_core::TodoAgent;
use tasktalk_memory::{SqliteStore, TodoStore, UserStore};

/// Shared application state accessible from all route handlers.
#[derive(Clone)]
pub struct AppState {
    /// The chat agent with its four todo skills.
    pub agent: Arc<TodoAgent>,
    pub todos: Arc<dyn TodoStore>,
    pub users: Arc<dyn UserStore>,
    pub tokens: TokenManager,
}

impl AppState {
    /// Wire everything to one sqlite store.
    pub fn new(store: Arc<SqliteStore>, token_ttl_secs: i64) -> Self {
        let agent = Arc::new(TodoAgent::with_default_skills(store.clone()));
        Self {
            agent,
            todos: store.clone(),
            users: store.clone(),
            tokens: TokenManager::new(store, token_ttl_secs),
        }
    }
}
