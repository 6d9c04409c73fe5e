//! SqliteStore: SQLite-backed storage capability for feedback and responses.
//!
//! One connection behind a mutex; every query runs on tokio's blocking pool
//! so async callers never stall a runtime worker on disk I/O.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use livequiz_core::storage::{Aggregate, RecordStore, ScoreStore};
use livequiz_core::{Filter, PageSpec, QuizResponse, StorageError, StorageResult, UserScore};
use rusqlite::{params_from_iter, Connection, OptionalExtension};
use tracing::{debug, info, warn};

use crate::config::StoreConfig;
use crate::error::storage_error;
use crate::records::{Clause, SqlRecord};
use crate::schema::LIVEQUIZ_SCHEMA;

/// SQLite-backed store implementing [`RecordStore`] for both record families
/// and [`ScoreStore`] for responses.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a file-backed store with default settings.
    pub fn open(path: &Path) -> StorageResult<Self> {
        Self::from_config(&StoreConfig::default().with_path(path))
    }

    /// Create an in-memory store (for testing).
    pub fn memory() -> StorageResult<Self> {
        Self::from_config(&StoreConfig::default())
    }

    /// Open the database `config` describes.
    pub fn from_config(config: &StoreConfig) -> StorageResult<Self> {
        config.validate().map_err(StorageError::from_source)?;
        let conn = match &config.path {
            Some(path) => {
                debug!(path = %path.display(), "opening sqlite store");
                Connection::open(path)
            }
            None => {
                debug!("opening in-memory sqlite store");
                Connection::open_in_memory()
            }
        }
        .map_err(|e| storage_error("sqlite", e))?;
        Self::from_connection(conn, config)
    }

    /// Create store from an existing connection (for multi-connection tests).
    pub fn from_connection(conn: Connection, config: &StoreConfig) -> StorageResult<Self> {
        init_connection(&conn, config).map_err(|e| storage_error("sqlite", e))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `query` against the connection on the blocking pool.
    async fn run<T, F>(&self, table: &'static str, query: F) -> StorageResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = lock(&conn, table)?;
            query(&guard).map_err(|e| storage_error(table, e))
        })
        .await
        .map_err(StorageError::from_source)?
    }
}

fn init_connection(conn: &Connection, config: &StoreConfig) -> rusqlite::Result<()> {
    conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
    if config.wal {
        // In-memory databases report "memory" and stay that way.
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        debug!(journal_mode = %mode, "journal mode set");
    }
    conn.execute_batch(LIVEQUIZ_SCHEMA)?;
    info!("livequiz schema initialized");
    Ok(())
}

fn lock<'a>(
    conn: &'a Mutex<Connection>,
    table: &'static str,
) -> StorageResult<MutexGuard<'a, Connection>> {
    conn.lock().map_err(|e| {
        warn!(table, "sqlite connection lock poisoned");
        StorageError::Poisoned(e.to_string())
    })
}

#[async_trait]
impl<R: SqlRecord> RecordStore<R> for SqliteStore {
    async fn list(&self, filter: &Filter, page: PageSpec) -> StorageResult<Vec<R>> {
        let clause = Clause::filter::<R>(filter)
            .order_by("id ASC")
            .paginate(page);
        let sql = format!("SELECT {} FROM {}{}", R::COLUMNS, R::TABLE, clause.sql);
        self.run(R::TABLE, move |conn| {
            let mut stmt = conn.prepare_cached(&sql)?;
            let rows = stmt.query_map(params_from_iter(clause.params.iter()), R::from_row)?;
            let records = rows.collect::<rusqlite::Result<Vec<R>>>()?;
            Ok(records)
        })
        .await
    }

    async fn count(&self, filter: &Filter) -> StorageResult<u64> {
        let clause = Clause::filter::<R>(filter);
        let sql = format!("SELECT COUNT(*) FROM {}{}", R::TABLE, clause.sql);
        self.run(R::TABLE, move |conn| {
            let count: i64 =
                conn.query_row(&sql, params_from_iter(clause.params.iter()), |row| row.get(0))?;
            Ok(u64::try_from(count).unwrap_or_default())
        })
        .await
    }

    async fn aggregate(&self, filter: &Filter) -> StorageResult<Aggregate> {
        let clause = Clause::filter::<R>(filter);
        let sql = format!(
            "SELECT COALESCE(SUM({}), 0), COUNT(*) FROM {}{}",
            R::METRIC,
            R::TABLE,
            clause.sql
        );
        self.run(R::TABLE, move |conn| {
            let (sum, count): (i64, i64) =
                conn.query_row(&sql, params_from_iter(clause.params.iter()), |row| {
                    Ok((row.get(0)?, row.get(1)?))
                })?;
            Ok(Aggregate {
                sum,
                count: u64::try_from(count).unwrap_or_default(),
            })
        })
        .await
    }

    async fn delete(&self, filter: &Filter) -> StorageResult<u64> {
        let clause = Clause::filter::<R>(filter);
        let sql = format!("DELETE FROM {}{}", R::TABLE, clause.sql);
        let removed = self
            .run(R::TABLE, move |conn| {
                conn.execute(&sql, params_from_iter(clause.params.iter()))
            })
            .await? as u64;
        debug!(table = R::TABLE, %filter, removed, "deleted rows");
        Ok(removed)
    }

    async fn find_one(&self, filter: &Filter) -> StorageResult<Option<R>> {
        let clause = Clause::filter::<R>(filter).order_by("id ASC");
        let sql = format!(
            "SELECT {} FROM {}{} LIMIT 1",
            R::COLUMNS,
            R::TABLE,
            clause.sql
        );
        self.run(R::TABLE, move |conn| {
            conn.query_row(&sql, params_from_iter(clause.params.iter()), R::from_row)
                .optional()
        })
        .await
    }

    async fn insert(&self, draft: R::Draft) -> StorageResult<R> {
        let record = self
            .run(R::TABLE, move |conn| {
                let id = R::insert_draft(conn, &draft)?;
                Ok(R::from_draft(draft, id))
            })
            .await?;
        debug!(table = R::TABLE, id = record.id(), "inserted row");
        Ok(record)
    }
}

#[async_trait]
impl ScoreStore for SqliteStore {
    async fn ranked_scores(&self, quiz_id: &str, page: PageSpec) -> StorageResult<Vec<UserScore>> {
        let clause = Clause::filter::<QuizResponse>(&Filter::quiz(quiz_id))
            .group_by("username")
            .order_by("total_score DESC, username ASC")
            .paginate(page);
        let sql = format!(
            "SELECT username, COALESCE(SUM(score), 0) AS total_score FROM response{}",
            clause.sql
        );
        self.run("response", move |conn| {
            let mut stmt = conn.prepare_cached(&sql)?;
            let rows = stmt.query_map(params_from_iter(clause.params.iter()), |row| {
                Ok(UserScore {
                    username: row.get(0)?,
                    total_score: row.get(1)?,
                })
            })?;
            let ranked = rows.collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(ranked)
        })
        .await
    }
}
