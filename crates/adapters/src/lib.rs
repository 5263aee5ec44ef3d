//! autopost adapters crate
//!
//! This crate contains infrastructure adapters implementing the domain ports:
//! - `sqlite`: shared SQLite pool and schema
//! - `state`: SQLite and in-memory status stores
//! - `posts`: SQLite and in-memory post repositories
//! - `llm`: LLM content generators (OpenAI, Anthropic, stub)
//! - `http`: axum router for admin actions and the cron webhook

mod posts_memory;
mod posts_sqlite;
mod state_memory;
mod state_sqlite;

pub mod http;
pub mod llm;
pub mod sqlite;

/// Re-exports for status store adapters
pub mod state {
    pub use crate::state_memory::InMemoryStatusStore;
    pub use crate::state_sqlite::SqliteStatusStore;
}

/// Re-exports for post repository adapters
pub mod posts {
    pub use crate::posts_memory::InMemoryPostRepository;
    pub use crate::posts_sqlite::SqlitePostRepository;
}
