//! Runtime configuration read from the environment.

use std::env;
use std::path::PathBuf;

/// Environment variable naming the project database file.
pub const DB_VAR: &str = "APPMODEL_DB";
/// Environment variable holding the log filter.
pub const LOG_VAR: &str = "APPMODEL_LOG";
/// Environment variable holding the account session id.
pub const SESSION_VAR: &str = "APPMODEL_SESSION";

const DEFAULT_DB: &str = ".appmodel/projects.db";
const DEFAULT_LOG: &str = "warn";

/// Settings shared by every command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Project database file.
    pub db_path: PathBuf,
    /// `tracing` filter directive, e.g. `appmodel=debug`.
    pub log_filter: String,
    /// Session id, when signed in.
    pub session: Option<String>,
}

impl Config {
    /// Loads `.env` if present, then reads the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        // A missing .env file is the normal case.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from an arbitrary variable lookup. Empty values count
    /// as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        Self {
            db_path: read(DB_VAR).map_or_else(|| PathBuf::from(DEFAULT_DB), PathBuf::from),
            log_filter: read(LOG_VAR).unwrap_or_else(|| DEFAULT_LOG.to_string()),
            session: read(SESSION_VAR),
        }
    }

    /// Replaces the database path when `db` is given.
    #[must_use]
    pub fn with_db_override(mut self, db: Option<PathBuf>) -> Self {
        if let Some(db) = db {
            self.db_path = db;
        }
        self
    }
}
