// Locations and user settings

use crate::search::CaseMode;
use eyre::{Context, Result, eyre};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DATA_DIR_NAME: &str = ".consolidate";
pub const DB_FILE_NAME: &str = "history.db";
pub const CONFIG_FILE_NAME: &str = "config.yaml";
pub const DB_ENV_VAR: &str = "CONSOLIDATE_DB";

/// Settings read from `~/.consolidate/config.yaml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub db_path: Option<PathBuf>,
    pub case_sensitive: bool,
    pub search_limit: i64,
    pub history_limit: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: None,
            case_sensitive: true,
            search_limit: 10,
            history_limit: 100,
        }
    }
}

impl Config {
    /// Load the config file from the data directory; a missing file yields defaults
    pub fn load() -> Result<Self> {
        let path = data_dir()?.join(CONFIG_FILE_NAME);
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config =
            serde_yaml::from_str(&content).with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    pub fn case_mode(&self) -> CaseMode {
        CaseMode::from_sensitive(self.case_sensitive)
    }

    /// Database location: explicit override, then `CONSOLIDATE_DB`, then config, then default
    pub fn resolve_db_path(&self, cli_override: Option<&Path>) -> Result<PathBuf> {
        self.resolve_db_path_with(cli_override, std::env::var_os(DB_ENV_VAR))
    }

    fn resolve_db_path_with(&self, cli_override: Option<&Path>, env_value: Option<OsString>) -> Result<PathBuf> {
        if let Some(path) = cli_override {
            return Ok(path.to_path_buf());
        }
        // An empty variable counts as unset
        if let Some(path) = env_value.filter(|v| !v.is_empty()) {
            return Ok(PathBuf::from(path));
        }
        if let Some(path) = &self.db_path {
            return Ok(path.clone());
        }
        Ok(data_dir()?.join(DB_FILE_NAME))
    }
}

/// Per-user data directory holding the database and config
pub fn data_dir() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(DATA_DIR_NAME))
        .ok_or_else(|| eyre!("Could not determine home directory"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let config = Config::load_from(&temp.path().join("config.yaml")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.case_mode(), CaseMode::Sensitive);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        fs::write(&path, "case_sensitive: false\nsearch_limit: 25\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.case_mode(), CaseMode::Insensitive);
        assert_eq!(config.search_limit, 25);
        assert_eq!(config.history_limit, 100);
        assert!(config.db_path.is_none());
    }

    #[test]
    fn test_malformed_file_names_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        fs::write(&path, "search_limit: [not a number\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(format!("{}", err).contains("config.yaml"));
    }

    #[test]
    fn test_cli_override_wins() {
        let config = Config {
            db_path: Some(PathBuf::from("/from/config.db")),
            ..Config::default()
        };
        let path = config.resolve_db_path_with(Some(Path::new("/from/cli.db")), None).unwrap();
        assert_eq!(path, PathBuf::from("/from/cli.db"));
    }

    #[test]
    fn test_env_value_beats_config_but_not_cli() {
        let config = Config {
            db_path: Some(PathBuf::from("/from/config.db")),
            ..Config::default()
        };
        let env = Some(OsString::from("/from/env.db"));

        let path = config.resolve_db_path_with(None, env.clone()).unwrap();
        assert_eq!(path, PathBuf::from("/from/env.db"));

        let path = config.resolve_db_path_with(Some(Path::new("/from/cli.db")), env).unwrap();
        assert_eq!(path, PathBuf::from("/from/cli.db"));
    }

    #[test]
    fn test_empty_env_value_falls_through_to_config() {
        let config = Config {
            db_path: Some(PathBuf::from("/from/config.db")),
            ..Config::default()
        };
        let path = config.resolve_db_path_with(None, Some(OsString::new())).unwrap();
        assert_eq!(path, PathBuf::from("/from/config.db"));
    }

    #[test]
    fn test_resolve_db_path_reads_env_var() {
        let config = Config {
            db_path: Some(PathBuf::from("/from/config.db")),
            ..Config::default()
        };
        let saved = std::env::var_os(DB_ENV_VAR);

        // SAFETY: no other test in this crate reads or writes this variable
        unsafe { std::env::set_var(DB_ENV_VAR, "/from/env.db") };
        let resolved = config.resolve_db_path(None);
        match saved {
            Some(value) => unsafe { std::env::set_var(DB_ENV_VAR, value) },
            None => unsafe { std::env::remove_var(DB_ENV_VAR) },
        }

        assert_eq!(resolved.unwrap(), PathBuf::from("/from/env.db"));
    }
}
