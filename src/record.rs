// Command records as stored in and returned by the history store

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};

pub const DEFAULT_SESSION: &str = "default";
pub const UNKNOWN_CWD: &str = "unknown";

/// One logged shell invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandRecord {
    pub id: i64,
    #[serde(serialize_with = "serialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    pub command: String,
    pub session_id: String,
    pub cwd: String,
    pub exit_code: i64,
    pub metadata: String,
}

/// Input to `HistoryStore::append`
///
/// Everything except the command text has a default, so a hook only needs to
/// pass what it knows.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCommand {
    pub command: String,
    pub session_id: String,
    pub cwd: String,
    pub exit_code: i64,
    pub metadata: String,
    /// Backfilled timestamp; `None` lets the store stamp the record with now
    pub timestamp: Option<DateTime<Utc>>,
}

impl NewCommand {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            session_id: DEFAULT_SESSION.to_string(),
            cwd: current_dir_or_unknown(),
            exit_code: 0,
            metadata: String::new(),
            timestamp: None,
        }
    }

    /// Empty values fall back to the defaults
    pub fn session(mut self, session_id: impl Into<String>) -> Self {
        let session_id = session_id.into();
        self.session_id = if session_id.is_empty() {
            DEFAULT_SESSION.to_string()
        } else {
            session_id
        };
        self
    }

    /// Empty values fall back to the current directory
    pub fn cwd(mut self, cwd: impl Into<String>) -> Self {
        let cwd = cwd.into();
        self.cwd = if cwd.is_empty() { current_dir_or_unknown() } else { cwd };
        self
    }

    pub fn exit_code(mut self, exit_code: i64) -> Self {
        self.exit_code = exit_code;
        self
    }

    pub fn metadata(mut self, metadata: impl Into<String>) -> Self {
        self.metadata = metadata.into();
        self
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

fn current_dir_or_unknown() -> String {
    std::env::current_dir()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| UNKNOWN_CWD.to_string())
}

/// Fixed-width RFC 3339 text (UTC, nanoseconds) so that string order matches time order
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Also accepts the `YYYY-MM-DD HH:MM:SS` UTC text of SQLite's `CURRENT_TIMESTAMP`,
/// which older versions of the database stored.
pub(crate) fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S"))
        .ok()
        .map(|naive| naive.and_utc())
}

fn serialize_timestamp<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_timestamp(ts))
}
