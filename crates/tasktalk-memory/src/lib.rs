pub mod migrations;
pub mod store;

pub use store::{
    SessionStore, SqliteStore, StoreError, StoreResult, TodoStore, UserStore,
};
