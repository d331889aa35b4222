// History store backed by a single SQLite file

use crate::error::{Result, StorageContext, StoreError};
use crate::record::{CommandRecord, DEFAULT_SESSION, NewCommand, UNKNOWN_CWD, format_timestamp, parse_timestamp};
use crate::search::{CaseMode, SearchQuery};
use crate::window::Selection;
use chrono::{DateTime, Utc};
use rusqlite::types::{Type, Value};
use rusqlite::{Connection, Row, params_from_iter};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SELECT_COLUMNS: &str = "SELECT id, timestamp, command, session_id, cwd, exit_code, metadata FROM commands";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Target {
    File(PathBuf),
    Memory,
}

/// Append-only log of shell commands
///
/// The store is an explicit handle: construct it, `initialize` it, use it, and
/// `close` it (or let it drop). Every operation on a handle that is not open
/// fails with `StoreError::NotInitialized`.
pub struct HistoryStore {
    target: Target,
    case: CaseMode,
    db: Option<Connection>,
}

impl HistoryStore {
    /// Create an unopened handle for the database file at `path`
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            target: Target::File(path.as_ref().to_path_buf()),
            case: CaseMode::default(),
            db: None,
        }
    }

    /// Create an unopened handle for a private in-memory database
    pub fn in_memory() -> Self {
        Self {
            target: Target::Memory,
            case: CaseMode::default(),
            db: None,
        }
    }

    /// Open or create the store at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut store = Self::new(path);
        store.initialize()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        let mut store = Self::in_memory();
        store.initialize()?;
        Ok(store)
    }

    /// Case policy used by `search_substring`
    pub fn with_case_mode(mut self, case: CaseMode) -> Self {
        self.case = case;
        self
    }

    pub fn case_mode(&self) -> CaseMode {
        self.case
    }

    /// Path of the backing file, `None` for in-memory stores
    pub fn path(&self) -> Option<&Path> {
        match &self.target {
            Target::File(path) => Some(path),
            Target::Memory => None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.db.is_some()
    }

    /// Open the database and make sure the schema exists.
    ///
    /// Calling this on an already open store does nothing; reopening an
    /// existing file leaves its records untouched.
    pub fn initialize(&mut self) -> Result<()> {
        const OP: &str = "initialize";

        if self.db.is_some() {
            debug!("initialize: store already open");
            return Ok(());
        }

        let db = match &self.target {
            Target::File(path) => {
                // Create the data directory if it doesn't exist
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    fs::create_dir_all(parent).during(OP)?;
                }
                debug!(path = %path.display(), "Opening history database");
                Connection::open(path).during(OP)?
            }
            Target::Memory => Connection::open_in_memory().during(OP)?,
        };

        // Let concurrent shells wait for the write lock instead of failing
        db.busy_timeout(BUSY_TIMEOUT).during(OP)?;
        db.pragma_update(None, "journal_mode", "WAL").during(OP)?;

        Self::create_schema(&db).during(OP)?;
        Self::normalize_legacy_timestamps(&db).during(OP)?;

        self.db = Some(db);
        Ok(())
    }

    /// Release the connection. Later operations fail with `NotInitialized`.
    pub fn close(&mut self) -> Result<()> {
        if let Some(db) = self.db.take() {
            db.close().map_err(|(_, e)| StoreError::storage("close", e))?;
            debug!("History database closed");
        }
        Ok(())
    }

    fn create_schema(db: &Connection) -> rusqlite::Result<()> {
        db.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS commands (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT NOT NULL,
                command TEXT NOT NULL,
                session_id TEXT NOT NULL DEFAULT 'default',
                cwd TEXT NOT NULL DEFAULT 'unknown',
                exit_code INTEGER NOT NULL DEFAULT 0,
                metadata TEXT NOT NULL DEFAULT ''
            );

            CREATE INDEX IF NOT EXISTS idx_commands_timestamp ON commands(timestamp);
            "#,
        )
    }

    /// Rewrite `YYYY-MM-DD HH:MM:SS` timestamps left by older versions of the
    /// tool (SQLite's `CURRENT_TIMESTAMP`, UTC) into the fixed-width form, so
    /// range predicates compare them correctly.
    fn normalize_legacy_timestamps(db: &Connection) -> rusqlite::Result<()> {
        let updated = db.execute(
            "UPDATE commands
             SET timestamp = strftime('%Y-%m-%dT%H:%M:%S', timestamp) || '.000000000Z'
             WHERE timestamp NOT LIKE '____-__-__T__:__:__._________Z'
               AND strftime('%Y-%m-%dT%H:%M:%S', timestamp) IS NOT NULL",
            [],
        )?;
        if updated > 0 {
            info!(updated, "Normalized legacy timestamps");
        }
        Ok(())
    }

    fn conn(&self, op: &'static str) -> Result<&Connection> {
        self.db.as_ref().ok_or(StoreError::NotInitialized { op })
    }

    fn conn_mut(&mut self, op: &'static str) -> Result<&mut Connection> {
        self.db.as_mut().ok_or(StoreError::NotInitialized { op })
    }

    // ========================================================================
    // Operations
    // ========================================================================

    /// Insert a command and return its id. The timestamp is now unless the
    /// input carries a backfilled one.
    pub fn append(&mut self, entry: &NewCommand) -> Result<i64> {
        const OP: &str = "append";
        let db = self.conn(OP)?;

        // Stamp with now unless the caller backfilled a time
        let timestamp = entry.timestamp.unwrap_or_else(Utc::now);
        db.execute(
            "INSERT INTO commands (timestamp, command, session_id, cwd, exit_code, metadata)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                format_timestamp(&timestamp),
                entry.command,
                entry.session_id,
                entry.cwd,
                entry.exit_code,
                entry.metadata
            ],
        )
        .during(OP)?;

        let id = db.last_insert_rowid();
        debug!(id, session = %entry.session_id, exit_code = entry.exit_code, "Appended command");
        Ok(id)
    }

    /// Records whose command contains the query pattern, most recent first
    pub fn search(&self, query: &SearchQuery) -> Result<Vec<CommandRecord>> {
        const OP: &str = "search";
        let db = self.conn(OP)?;

        // Zero means no rows, not "unlimited"
        if query.limit() == 0 {
            return Ok(Vec::new());
        }

        // Empty pattern has no predicate and matches everything
        let (sql, params) = match query.to_sql() {
            Some((clause, pattern)) => (
                format!("{} WHERE {} ORDER BY id DESC LIMIT ?2", SELECT_COLUMNS, clause),
                vec![Value::Text(pattern), Value::Integer(query.limit())],
            ),
            None => (
                format!("{} ORDER BY id DESC LIMIT ?1", SELECT_COLUMNS),
                vec![Value::Integer(query.limit())],
            ),
        };

        let mut stmt = db.prepare(&sql).during(OP)?;
        let rows = stmt.query_map(params_from_iter(params), Self::record_from_row).during(OP)?;

        let records = rows.collect::<rusqlite::Result<Vec<_>>>().during(OP)?;
        debug!(pattern = query.pattern(), limit = query.limit(), found = records.len(), "Searched history");
        Ok(records)
    }

    /// Substring search using the store's case policy
    pub fn search_substring(&self, substring: &str, limit: i64) -> Result<Vec<CommandRecord>> {
        let query = SearchQuery::new(substring, limit)?.case(self.case);
        self.search(&query)
    }

    /// Delete (or with `dry_run`, count) records in the window described by
    /// `from`, `to` and `all`. Returns how many records matched.
    pub fn delete_range(
        &mut self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
        all: bool,
        dry_run: bool,
    ) -> Result<u64> {
        self.conn("delete_range")?;
        let selection = Selection::new(from, to, all)?;
        self.delete_selection(&selection, dry_run)
    }

    /// Delete or count the records in `selection` inside one transaction.
    ///
    /// Counting and deleting use the same predicate, so a dry run reports what
    /// a real run with the same selection would remove.
    pub fn delete_selection(&mut self, selection: &Selection, dry_run: bool) -> Result<u64> {
        const OP: &str = "delete_range";
        let db = self.conn_mut(OP)?;

        // One predicate for both paths, inside one transaction
        let (clause, params) = selection.to_sql();
        let tx = db.transaction().during(OP)?;

        let matched = if dry_run {
            let sql = format!("SELECT COUNT(*) FROM commands WHERE {}", clause);
            let count: i64 = tx
                .query_row(&sql, params_from_iter(params.iter()), |row| row.get(0))
                .during(OP)?;
            count as u64
        } else {
            let sql = format!("DELETE FROM commands WHERE {}", clause);
            tx.execute(&sql, params_from_iter(params.iter())).during(OP)? as u64
        };

        tx.commit().during(OP)?;

        if dry_run {
            debug!(%selection, matched, "Dry run over history");
        } else {
            info!(%selection, deleted = matched, "Deleted commands from history");
        }
        Ok(matched)
    }

    /// Total number of stored records
    pub fn count(&self) -> Result<u64> {
        const OP: &str = "count";
        let count: i64 = self
            .conn(OP)?
            .query_row("SELECT COUNT(*) FROM commands", [], |row| row.get(0))
            .during(OP)?;
        Ok(count as u64)
    }

    fn record_from_row(row: &Row<'_>) -> rusqlite::Result<CommandRecord> {
        let raw_ts: String = row.get(1)?;
        let timestamp = parse_timestamp(&raw_ts).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(1, Type::Text, format!("bad timestamp: {}", raw_ts).into())
        })?;

        // Databases written by older versions allow NULL in these columns
        Ok(CommandRecord {
            id: row.get(0)?,
            timestamp,
            command: row.get(2)?,
            session_id: row
                .get::<_, Option<String>>(3)?
                .unwrap_or_else(|| DEFAULT_SESSION.to_string()),
            cwd: row.get::<_, Option<String>>(4)?.unwrap_or_else(|| UNKNOWN_CWD.to_string()),
            exit_code: row.get::<_, Option<i64>>(5)?.unwrap_or(0),
            metadata: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
        })
    }
}

impl Drop for HistoryStore {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
