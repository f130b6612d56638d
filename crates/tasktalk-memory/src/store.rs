use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use thiserror::Error;
use tokio::task;

use tasktalk_schema::{NewTodo, Session, Todo, TodoFilter, TodoPatch, User};

use crate::migrations::run_migrations;

/// Errors surfaced by the persistence boundary.
///
/// Skills fold these into failed outcomes; nothing above the store layer
/// matches on sqlite error strings.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} already exists")]
    Conflict(String),
    #[error("failed to lock sqlite connection")]
    Lock,
    #[error("storage task failed: {0}")]
    Task(String),
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Owner-scoped todo persistence. Every operation filters by the owning
/// user — a todo id alone never resolves across users.
#[async_trait]
pub trait TodoStore: Send + Sync {
    async fn insert_todo(&self, todo: NewTodo) -> StoreResult<Todo>;
    async fn find_todo(&self, user_id: &str, id: i64) -> StoreResult<Option<Todo>>;
    async fn list_todos(&self, user_id: &str, filter: &TodoFilter) -> StoreResult<Vec<Todo>>;
    async fn update_todo(
        &self,
        user_id: &str,
        id: i64,
        patch: &TodoPatch,
    ) -> StoreResult<Option<Todo>>;
    async fn delete_todo(&self, user_id: &str, id: i64) -> StoreResult<bool>;
}

/// Account persistence. Emails are unique.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create_user(&self, user: User) -> StoreResult<User>;
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn find_user(&self, id: &str) -> StoreResult<Option<User>>;
}

/// Login session persistence, keyed by token hash.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn insert_session(&self, session: Session) -> StoreResult<()>;
    async fn find_session(&self, token_hash: &str) -> StoreResult<Option<Session>>;
    async fn delete_session(&self, token_hash: &str) -> StoreResult<bool>;
    async fn purge_expired(&self, now: DateTime<Utc>) -> StoreResult<u64>;
}

#[derive(Clone)]
pub struct SqliteStore {
    db: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn open(path: &str) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        run_migrations(&conn).map_err(|e| StoreError::Task(e.to_string()))?;
        Ok(Self {
            db: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        run_migrations(&conn).map_err(|e| StoreError::Task(e.to_string()))?;
        Ok(Self {
            db: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn db(&self) -> Arc<Mutex<Connection>> {
        Arc::clone(&self.db)
    }
}

fn row_to_todo(row: &Row<'_>) -> rusqlite::Result<Todo> {
    Ok(Todo {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        completed: row.get(3)?,
        priority: row.get(4)?,
        due_date: row.get(5)?,
        user_id: row.get(6)?,
        created_at: parse_ts(row, 7)?,
    })
}

fn row_to_user(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        password_hash: row.get(2)?,
        salt: row.get(3)?,
        created_at: parse_ts(row, 4)?,
    })
}

fn row_to_session(row: &Row<'_>) -> rusqlite::Result<Session> {
    Ok(Session {
        token_hash: row.get(0)?,
        user_id: row.get(1)?,
        created_at: parse_ts(row, 2)?,
        expires_at: parse_ts(row, 3)?,
    })
}

fn parse_ts(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

const TODO_COLUMNS: &str = "id, title, description, completed, priority, due_date, user_id, created_at";

fn find_todo_locked(conn: &Connection, user_id: &str, id: i64) -> rusqlite::Result<Option<Todo>> {
    conn.query_row(
        &format!("SELECT {TODO_COLUMNS} FROM todos WHERE id = ?1 AND user_id = ?2"),
        params![id, user_id],
        row_to_todo,
    )
    .optional()
}

#[async_trait]
impl TodoStore for SqliteStore {
    async fn insert_todo(&self, todo: NewTodo) -> StoreResult<Todo> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || {
            let conn = db.lock().map_err(|_| StoreError::Lock)?;
            let created_at = Utc::now();
            conn.execute(
                r#"
                INSERT INTO todos (title, description, completed, priority, due_date, user_id, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
                params![
                    todo.title,
                    todo.description,
                    todo.completed,
                    todo.priority,
                    todo.due_date,
                    todo.user_id,
                    created_at.to_rfc3339(),
                ],
            )?;
            let id = conn.last_insert_rowid();
            Ok(Todo {
                id,
                title: todo.title,
                description: todo.description,
                completed: todo.completed,
                priority: todo.priority,
                due_date: todo.due_date,
                user_id: todo.user_id,
                created_at,
            })
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }

    async fn find_todo(&self, user_id: &str, id: i64) -> StoreResult<Option<Todo>> {
        let db = Arc::clone(&self.db);
        let user_id = user_id.to_owned();
        task::spawn_blocking(move || {
            let conn = db.lock().map_err(|_| StoreError::Lock)?;
            Ok(find_todo_locked(&conn, &user_id, id)?)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }

    async fn list_todos(&self, user_id: &str, filter: &TodoFilter) -> StoreResult<Vec<Todo>> {
        let db = Arc::clone(&self.db);
        let user_id = user_id.to_owned();
        let filter = filter.clone();
        task::spawn_blocking(move || {
            let conn = db.lock().map_err(|_| StoreError::Lock)?;

            let mut sql = format!("SELECT {TODO_COLUMNS} FROM todos WHERE user_id = ?1");
            let mut args: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(user_id)];
            if let Some(completed) = filter.completed {
                args.push(Box::new(completed));
                sql.push_str(&format!(" AND completed = ?{}", args.len()));
            }
            if let Some(priority) = filter.priority {
                args.push(Box::new(priority));
                sql.push_str(&format!(" AND priority = ?{}", args.len()));
            }
            sql.push_str(" ORDER BY created_at ASC, id ASC");

            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(
                rusqlite::params_from_iter(args.iter().map(|a| a.as_ref())),
                row_to_todo,
            )?;
            let mut todos = Vec::new();
            for row in rows {
                todos.push(row?);
            }
            Ok(todos)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }

    async fn update_todo(
        &self,
        user_id: &str,
        id: i64,
        patch: &TodoPatch,
    ) -> StoreResult<Option<Todo>> {
        let db = Arc::clone(&self.db);
        let user_id = user_id.to_owned();
        let patch = patch.clone();
        task::spawn_blocking(move || {
            let conn = db.lock().map_err(|_| StoreError::Lock)?;

            if find_todo_locked(&conn, &user_id, id)?.is_none() {
                return Ok(None);
            }

            let mut sets = Vec::new();
            let mut args: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
            if let Some(title) = patch.title {
                args.push(Box::new(title));
                sets.push(format!("title = ?{}", args.len()));
            }
            if let Some(description) = patch.description {
                args.push(Box::new(description));
                sets.push(format!("description = ?{}", args.len()));
            }
            if let Some(completed) = patch.completed {
                args.push(Box::new(completed));
                sets.push(format!("completed = ?{}", args.len()));
            }
            if let Some(priority) = patch.priority {
                args.push(Box::new(priority));
                sets.push(format!("priority = ?{}", args.len()));
            }
            if let Some(due_date) = patch.due_date {
                args.push(Box::new(due_date));
                sets.push(format!("due_date = ?{}", args.len()));
            }

            if !sets.is_empty() {
                args.push(Box::new(id));
                let id_pos = args.len();
                args.push(Box::new(user_id.clone()));
                let user_pos = args.len();
                let sql = format!(
                    "UPDATE todos SET {} WHERE id = ?{} AND user_id = ?{}",
                    sets.join(", "),
                    id_pos,
                    user_pos,
                );
                conn.execute(
                    &sql,
                    rusqlite::params_from_iter(args.iter().map(|a| a.as_ref())),
                )?;
            }

            Ok(find_todo_locked(&conn, &user_id, id)?)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }

    async fn delete_todo(&self, user_id: &str, id: i64) -> StoreResult<bool> {
        let db = Arc::clone(&self.db);
        let user_id = user_id.to_owned();
        task::spawn_blocking(move || {
            let conn = db.lock().map_err(|_| StoreError::Lock)?;
            let affected = conn.execute(
                "DELETE FROM todos WHERE id = ?1 AND user_id = ?2",
                params![id, user_id],
            )?;
            Ok(affected > 0)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

#[async_trait]
impl UserStore for SqliteStore {
    async fn create_user(&self, user: User) -> StoreResult<User> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || {
            let conn = db.lock().map_err(|_| StoreError::Lock)?;
            let result = conn.execute(
                r#"
                INSERT INTO users (id, email, password_hash, salt, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
                params![
                    user.id,
                    user.email,
                    user.password_hash,
                    user.salt,
                    user.created_at.to_rfc3339(),
                ],
            );
            match result {
                Ok(_) => Ok(user),
                Err(err) if is_unique_violation(&err) => {
                    Err(StoreError::Conflict(format!("user '{}'", user.email)))
                }
                Err(err) => Err(err.into()),
            }
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let db = Arc::clone(&self.db);
        let email = email.to_owned();
        task::spawn_blocking(move || {
            let conn = db.lock().map_err(|_| StoreError::Lock)?;
            let user = conn
                .query_row(
                    "SELECT id, email, password_hash, salt, created_at FROM users WHERE email = ?1",
                    params![email],
                    row_to_user,
                )
                .optional()?;
            Ok(user)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }

    async fn find_user(&self, id: &str) -> StoreResult<Option<User>> {
        let db = Arc::clone(&self.db);
        let id = id.to_owned();
        task::spawn_blocking(move || {
            let conn = db.lock().map_err(|_| StoreError::Lock)?;
            let user = conn
                .query_row(
                    "SELECT id, email, password_hash, salt, created_at FROM users WHERE id = ?1",
                    params![id],
                    row_to_user,
                )
                .optional()?;
            Ok(user)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

#[async_trait]
impl SessionStore for SqliteStore {
    async fn insert_session(&self, session: Session) -> StoreResult<()> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || {
            let conn = db.lock().map_err(|_| StoreError::Lock)?;
            conn.execute(
                r#"
                INSERT INTO sessions (token_hash, user_id, created_at, expires_at)
                VALUES (?1, ?2, ?3, ?4)
                "#,
                params![
                    session.token_hash,
                    session.user_id,
                    session.created_at.to_rfc3339(),
                    session.expires_at.to_rfc3339(),
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }

    async fn find_session(&self, token_hash: &str) -> StoreResult<Option<Session>> {
        let db = Arc::clone(&self.db);
        let token_hash = token_hash.to_owned();
        task::spawn_blocking(move || {
            let conn = db.lock().map_err(|_| StoreError::Lock)?;
            let session = conn
                .query_row(
                    "SELECT token_hash, user_id, created_at, expires_at FROM sessions WHERE token_hash = ?1",
                    params![token_hash],
                    row_to_session,
                )
                .optional()?;
            Ok(session)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }

    async fn delete_session(&self, token_hash: &str) -> StoreResult<bool> {
        let db = Arc::clone(&self.db);
        let token_hash = token_hash.to_owned();
        task::spawn_blocking(move || {
            let conn = db.lock().map_err(|_| StoreError::Lock)?;
            let affected = conn.execute(
                "DELETE FROM sessions WHERE token_hash = ?1",
                params![token_hash],
            )?;
            Ok(affected > 0)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> StoreResult<u64> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || {
            let conn = db.lock().map_err(|_| StoreError::Lock)?;
            let affected = conn.execute(
                "DELETE FROM sessions WHERE expires_at < ?1",
                params![now.to_rfc3339()],
            )?;
            Ok(affected as u64)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}
