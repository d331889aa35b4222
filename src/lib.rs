// Consolidate - shell command history logger backed by SQLite

pub mod config;
pub mod error;
pub mod output;
pub mod record;
pub mod search;
pub mod store;
pub mod window;

// Re-export main types for convenience
pub use config::Config;
pub use error::{Result, StoreError};
pub use output::OutputFormat;
pub use record::{CommandRecord, NewCommand};
pub use search::{CaseMode, SearchQuery};
pub use store::HistoryStore;
pub use window::{Bound, Selection, resolve_datetime};
