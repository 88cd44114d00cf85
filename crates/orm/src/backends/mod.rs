//! Database Store Abstractions
//!
//! [`Store`] implementations over sqlx pools for each supported backend.

pub mod core;
pub mod postgres;
pub mod sqlite;

pub use self::core::*;
pub use postgres::PostgresStore;
pub use sqlite::SqliteStore;

/// Database backend type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendType {
    PostgreSQL,
    SQLite,
}

impl BackendType {
    /// Detect the backend from a database URL scheme
    pub fn from_url(url: &str) -> Option<Self> {
        if url.starts_with("postgresql://") || url.starts_with("postgres://") {
            Some(BackendType::PostgreSQL)
        } else if url.starts_with("sqlite:") || url.starts_with("file:") {
            Some(BackendType::SQLite)
        } else {
            None
        }
    }
}

impl std::fmt::Display for BackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendType::PostgreSQL => write!(f, "postgresql"),
            BackendType::SQLite => write!(f, "sqlite"),
        }
    }
}

impl std::str::FromStr for BackendType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgresql" | "postgres" => Ok(BackendType::PostgreSQL),
            "sqlite" => Ok(BackendType::SQLite),
            _ => Err(format!("Unsupported database backend: {}", s)),
        }
    }
}
