//! HeaderProbe Common Library
//!
//! Shared types, the store query surface, and the SQLite-backed store used
//! by the planner and the CLI.

pub mod db;
pub mod error;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use db::Database;
pub use error::{Error, Result};
pub use store::Store;
pub use types::*;

/// HeaderProbe version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default state directory
pub fn default_store_path() -> std::path::PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join(".headerprobe")
}

/// Default database path
pub fn default_db_path() -> std::path::PathBuf {
    default_store_path().join("corpus.db")
}

/// Home directory helper
mod dirs {
    pub fn home_dir() -> Option<std::path::PathBuf> {
        std::env::var_os("HOME").map(std::path::PathBuf::from)
    }
}
