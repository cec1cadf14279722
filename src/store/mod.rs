//! Project store: persistence for the project index and project assets.
//!
//! Backed by one SQLite file with two tables:
//!
//! ```text
//! project(id PK, name)
//! asset(id, path, payload)   PK = (id, path)
//! ```
//!
//! Every operation is `async`: it runs its statements in a transaction of
//! its own on a blocking worker, behind a mutex-guarded connection. Errors
//! are always returned to the caller.

pub mod schema;

use std::ops::Bound;
use std::path::Path;
use std::sync::{Arc, Mutex};

use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::StoreError;

/// A project index entry. Content lives in assets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Unique project id.
    pub id: String,
    /// Readable project name.
    pub name: String,
}

impl Project {
    /// Creates an index entry.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self { id: id.into(), name: name.into() }
    }
}

/// A JSON payload addressed by project id and path.
#[derive(Debug, Clone, PartialEq)]
pub struct Asset {
    /// Owning project id.
    pub id: String,
    /// Logical path within the project, e.g. `/app.json`.
    pub path: String,
    /// JSON content.
    pub payload: Value,
}

impl Asset {
    /// Creates an asset.
    pub fn new(id: impl Into<String>, path: impl Into<String>, payload: Value) -> Self {
        Self { id: id.into(), path: path.into(), payload }
    }
}

/// Scan order over project ids.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    /// Ascending key order.
    #[default]
    Next,
    /// Descending key order.
    Prev,
}

/// Bounds on project ids for [`ProjectRepository::query`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRange {
    /// Lower bound.
    pub lower: Bound<String>,
    /// Upper bound.
    pub upper: Bound<String>,
}

impl KeyRange {
    /// Exactly `key`.
    pub fn only(key: impl Into<String>) -> Self {
        let key = key.into();
        Self { lower: Bound::Included(key.clone()), upper: Bound::Included(key) }
    }

    /// Keys `>= lower`.
    pub fn at_least(lower: impl Into<String>) -> Self {
        Self { lower: Bound::Included(lower.into()), upper: Bound::Unbounded }
    }

    /// Keys `<= upper`.
    pub fn at_most(upper: impl Into<String>) -> Self {
        Self { lower: Bound::Unbounded, upper: Bound::Included(upper.into()) }
    }

    /// Keys in `lower..=upper`.
    pub fn between(lower: impl Into<String>, upper: impl Into<String>) -> Self {
        Self { lower: Bound::Included(lower.into()), upper: Bound::Included(upper.into()) }
    }

    fn where_clause(&self) -> (String, Vec<String>) {
        let mut clauses = Vec::new();
        let mut args = Vec::new();
        match &self.lower {
            Bound::Included(key) => {
                clauses.push("id >= ?");
                args.push(key.clone());
            }
            Bound::Excluded(key) => {
                clauses.push("id > ?");
                args.push(key.clone());
            }
            Bound::Unbounded => {}
        }
        match &self.upper {
            Bound::Included(key) => {
                clauses.push("id <= ?");
                args.push(key.clone());
            }
            Bound::Excluded(key) => {
                clauses.push("id < ?");
                args.push(key.clone());
            }
            Bound::Unbounded => {}
        }
        if clauses.is_empty() {
            (String::new(), args)
        } else {
            (format!(" WHERE {}", clauses.join(" AND ")), args)
        }
    }
}

/// Persistent store for projects and their assets.
///
/// Cloning shares the underlying connection.
#[derive(Clone)]
pub struct ProjectRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ProjectRepository {
    /// Opens (or creates) the database at `path` and upgrades its schema.
    /// Missing parent directories are created.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the file cannot be opened or
    /// upgraded.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let conn = tokio::task::spawn_blocking(move || open_file(&path))
            .await
            .map_err(|err| StoreError::Transaction { operation: "open", source: Box::new(err) })??;
        Ok(Self::from_connection(conn))
    }

    /// Opens a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if `SQLite` cannot allocate it.
    pub async fn open_in_memory() -> Result<Self, StoreError> {
        let conn = tokio::task::spawn_blocking(|| {
            let mut conn = Connection::open_in_memory().map_err(|err| {
                StoreError::Unavailable {
                    reason: "cannot open in-memory database".into(),
                    source: Some(Box::new(err)),
                }
            })?;
            schema::migrate(&mut conn)?;
            Ok::<_, StoreError>(conn)
        })
        .await
        .map_err(|err| StoreError::Transaction { operation: "open", source: Box::new(err) })??;
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        Self { conn: Arc::new(Mutex::new(conn)) }
    }

    /// Every project in id order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Transaction`] if the scan fails.
    pub async fn find_all_projects(&self) -> Result<Vec<Project>, StoreError> {
        let mut projects = Vec::new();
        self.query(|project| projects.push(project), None, Direction::Next).await?;
        Ok(projects)
    }

    /// A single project index entry.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if `id` is absent.
    pub async fn get_project(&self, id: &str) -> Result<Project, StoreError> {
        let id = id.to_string();
        self.run("get_project", move |conn| {
            let tx = conn.transaction().map_err(StoreError::transaction("get_project"))?;
            let project = tx
                .query_row("SELECT id, name FROM project WHERE id = ?1", params![id], |row| {
                    Ok(Project { id: row.get(0)?, name: row.get(1)? })
                })
                .optional()
                .map_err(StoreError::transaction("get_project"))?;
            tx.commit().map_err(StoreError::transaction("get_project"))?;
            project.ok_or_else(|| StoreError::NotFound { what: format!("project {id}") })
        })
        .await
    }

    /// Inserts or updates `project`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Transaction`] if the write fails.
    pub async fn put_project(&self, project: &Project) -> Result<(), StoreError> {
        let project = project.clone();
        debug!(id = %project.id, "put project");
        self.run("put_project", move |conn| {
            let tx = conn.transaction().map_err(StoreError::transaction("put_project"))?;
            tx.execute(
                "INSERT INTO project (id, name) VALUES (?1, ?2)
                 ON CONFLICT (id) DO UPDATE SET name = excluded.name",
                params![project.id, project.name],
            )
            .map_err(StoreError::transaction("put_project"))?;
            tx.commit().map_err(StoreError::transaction("put_project"))
        })
        .await
    }

    /// Deletes the project `id` together with its assets. Deleting an absent
    /// project succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Transaction`] if the write fails.
    pub async fn delete_project(&self, id: &str) -> Result<(), StoreError> {
        let id = id.to_string();
        debug!(%id, "delete project");
        self.run("delete_project", move |conn| {
            let tx = conn.transaction().map_err(StoreError::transaction("delete_project"))?;
            tx.execute("DELETE FROM asset WHERE id = ?1", params![id])
                .map_err(StoreError::transaction("delete_project"))?;
            tx.execute("DELETE FROM project WHERE id = ?1", params![id])
                .map_err(StoreError::transaction("delete_project"))?;
            tx.commit().map_err(StoreError::transaction("delete_project"))
        })
        .await
    }

    /// Inserts or updates `asset`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Malformed`] if the payload cannot be encoded and
    /// [`StoreError::Transaction`] if the write fails.
    pub async fn put_asset(&self, asset: &Asset) -> Result<(), StoreError> {
        let payload = serde_json::to_string(&asset.payload).map_err(|err| StoreError::Malformed {
            what: format!("asset {}:{}", asset.id, asset.path),
            reason: err.to_string(),
        })?;
        let (id, path) = (asset.id.clone(), asset.path.clone());
        debug!(%id, %path, bytes = payload.len(), "put asset");
        self.run("put_asset", move |conn| {
            let tx = conn.transaction().map_err(StoreError::transaction("put_asset"))?;
            tx.execute(
                "INSERT INTO asset (id, path, payload) VALUES (?1, ?2, ?3)
                 ON CONFLICT (id, path) DO UPDATE SET payload = excluded.payload",
                params![id, path, payload],
            )
            .map_err(StoreError::transaction("put_asset"))?;
            tx.commit().map_err(StoreError::transaction("put_asset"))
        })
        .await
    }

    /// Reads the asset at `(id, path)`.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`] if the key is absent.
    /// - [`StoreError::Malformed`] if the stored payload is not JSON or is
    ///   `null`.
    /// - [`StoreError::Transaction`] if the read fails.
    pub async fn get_asset(&self, id: &str, path: &str) -> Result<Asset, StoreError> {
        let (id, path) = (id.to_string(), path.to_string());
        debug!(%id, %path, "get asset");
        self.run("get_asset", move |conn| {
            let tx = conn.transaction().map_err(StoreError::transaction("get_asset"))?;
            let raw: Option<String> = tx
                .query_row(
                    "SELECT payload FROM asset WHERE id = ?1 AND path = ?2",
                    params![id, path],
                    |row| row.get(0),
                )
                .optional()
                .map_err(StoreError::transaction("get_asset"))?;
            tx.commit().map_err(StoreError::transaction("get_asset"))?;

            let what = format!("asset {id}:{path}");
            let raw = raw.ok_or_else(|| StoreError::NotFound { what: what.clone() })?;
            let payload: Value = serde_json::from_str(&raw)
                .map_err(|err| StoreError::Malformed { what: what.clone(), reason: err.to_string() })?;
            if payload.is_null() {
                return Err(StoreError::Malformed { what, reason: "payload is null".into() });
            }
            Ok(Asset { id, path, payload })
        })
        .await
    }

    /// Deletes the asset at `(id, path)`. Deleting an absent asset succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Transaction`] if the write fails.
    pub async fn delete_asset(&self, id: &str, path: &str) -> Result<(), StoreError> {
        let (id, path) = (id.to_string(), path.to_string());
        self.run("delete_asset", move |conn| {
            let tx = conn.transaction().map_err(StoreError::transaction("delete_asset"))?;
            tx.execute("DELETE FROM asset WHERE id = ?1 AND path = ?2", params![id, path])
                .map_err(StoreError::transaction("delete_asset"))?;
            tx.commit().map_err(StoreError::transaction("delete_asset"))
        })
        .await
    }

    /// Paths of every asset of project `id`, in key order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Transaction`] if the scan fails.
    pub async fn list_assets(&self, id: &str) -> Result<Vec<String>, StoreError> {
        let id = id.to_string();
        self.run("list_assets", move |conn| {
            let tx = conn.transaction().map_err(StoreError::transaction("list_assets"))?;
            let paths = {
                let mut stmt = tx
                    .prepare("SELECT path FROM asset WHERE id = ?1 ORDER BY path")
                    .map_err(StoreError::transaction("list_assets"))?;
                let rows = stmt
                    .query_map(params![id], |row| row.get(0))
                    .map_err(StoreError::transaction("list_assets"))?;
                rows.collect::<Result<Vec<String>, _>>()
                    .map_err(StoreError::transaction("list_assets"))?
            };
            tx.commit().map_err(StoreError::transaction("list_assets"))?;
            Ok(paths)
        })
        .await
    }

    /// Scans the project table, calling `visit` once per record in key
    /// order (reversed for [`Direction::Prev`]), optionally restricted to
    /// `range`. Resolves to the number of records visited.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Transaction`] if the scan fails; `visit` is not
    /// called in that case.
    pub async fn query<F>(
        &self,
        mut visit: F,
        range: Option<KeyRange>,
        direction: Direction,
    ) -> Result<usize, StoreError>
    where
        F: FnMut(Project),
    {
        let (filter, args) = range.map(|r| r.where_clause()).unwrap_or_default();
        let order = match direction {
            Direction::Next => "ASC",
            Direction::Prev => "DESC",
        };
        let sql = format!("SELECT id, name FROM project{filter} ORDER BY id {order}");

        let projects = self
            .run("query", move |conn| {
                let tx = conn.transaction().map_err(StoreError::transaction("query"))?;
                let projects = {
                    let mut stmt = tx.prepare(&sql).map_err(StoreError::transaction("query"))?;
                    let rows = stmt
                        .query_map(params_from_iter(args.iter()), |row| {
                            Ok(Project { id: row.get(0)?, name: row.get(1)? })
                        })
                        .map_err(StoreError::transaction("query"))?;
                    rows.collect::<Result<Vec<_>, _>>().map_err(StoreError::transaction("query"))?
                };
                tx.commit().map_err(StoreError::transaction("query"))?;
                Ok(projects)
            })
            .await?;

        let visited = projects.len();
        for project in projects {
            visit(project);
        }
        debug!(visited, "project scan finished");
        Ok(visited)
    }

    async fn run<T, F>(&self, operation: &'static str, op: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard =
                conn.lock().map_err(|_| StoreError::unavailable("connection mutex poisoned"))?;
            op(&mut guard)
        })
        .await
        .map_err(|err| StoreError::Transaction { operation, source: Box::new(err) })?
    }
}

fn open_file(path: &Path) -> Result<Connection, StoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|err| StoreError::Unavailable {
            reason: format!("cannot create {}", parent.display()),
            source: Some(Box::new(err)),
        })?;
    }
    let mut conn = Connection::open(path).map_err(|err| StoreError::Unavailable {
        reason: format!("cannot open {}", path.display()),
        source: Some(Box::new(err)),
    })?;
    let found = schema::migrate(&mut conn)?;
    debug!(path = %path.display(), found, "project database open");
    Ok(conn)
}
