//! Versioned schema for the project database.
//!
//! The on-disk version lives in `PRAGMA user_version`. Opening a database
//! applies every step newer than that version in one transaction. Steps use
//! `IF NOT EXISTS`, so re-running one against an upgraded file is harmless.

use rusqlite::Connection;
use tracing::info;

use crate::error::StoreError;

/// Schema version this build reads and writes.
pub const SCHEMA_VERSION: i64 = 1;

/// Table holding the project index.
pub const PROJECT_TABLE: &str = "project";
/// Table holding per-project assets.
pub const ASSET_TABLE: &str = "asset";

const STEPS: &[(i64, &str)] = &[(
    1,
    "CREATE TABLE IF NOT EXISTS project (
         id   TEXT PRIMARY KEY NOT NULL,
         name TEXT NOT NULL
     );
     CREATE TABLE IF NOT EXISTS asset (
         id      TEXT NOT NULL,
         path    TEXT NOT NULL,
         payload TEXT NOT NULL,
         PRIMARY KEY (id, path)
     );",
)];

/// Brings the schema of `conn` up to [`SCHEMA_VERSION`].
///
/// Returns the version found before upgrading.
///
/// # Errors
///
/// Returns [`StoreError::Unavailable`] if the file was written by a newer
/// build or an upgrade step fails.
pub fn migrate(conn: &mut Connection) -> Result<i64, StoreError> {
    let found = user_version(conn)?;
    if found > SCHEMA_VERSION {
        return Err(StoreError::unavailable(format!(
            "database schema version {found} is newer than supported version {SCHEMA_VERSION}"
        )));
    }
    if found == SCHEMA_VERSION {
        return Ok(found);
    }

    let tx = conn.transaction().map_err(upgrade_failed)?;
    for (version, sql) in STEPS.iter().filter(|(version, _)| *version > found) {
        info!(from = found, to = *version, "upgrading project database schema");
        tx.execute_batch(sql).map_err(upgrade_failed)?;
    }
    tx.pragma_update(None, "user_version", SCHEMA_VERSION).map_err(upgrade_failed)?;
    tx.commit().map_err(upgrade_failed)?;
    Ok(found)
}

/// Reads the stored schema version.
///
/// # Errors
///
/// Returns [`StoreError::Unavailable`] if the pragma cannot be read.
pub fn user_version(conn: &Connection) -> Result<i64, StoreError> {
    conn.pragma_query_value(None, "user_version", |row| row.get(0)).map_err(|err| {
        StoreError::Unavailable {
            reason: "cannot read schema version".into(),
            source: Some(Box::new(err)),
        }
    })
}

fn upgrade_failed(err: rusqlite::Error) -> StoreError {
    StoreError::Unavailable { reason: "schema upgrade failed".into(), source: Some(Box::new(err)) }
}
