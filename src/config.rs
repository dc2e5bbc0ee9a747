//! Runtime configuration.
//!
//! Defaults live under the platform data directory and can be overridden by
//! environment variables:
//! - `TKCONFIG_DATA_DIR`: base directory
//! - `TKCONFIG_DB`: preferences database file
//! - `TKCONFIG_BACKUP`: default backup file
//! - `TKCONFIG_LOG`: tracing filter directive

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::models::error::{Result, TkConfigError};

const APP_DIR: &str = "tkconfig";
const DATABASE_FILE: &str = "tkconfig.db";
const BACKUP_FILE: &str = "tkconfig_backup.txt";
pub const DEFAULT_LOG_FILTER: &str = "tkconfig=debug,info";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub database_path: PathBuf,
    /// Backup file used when no `backupPath` preference is stored
    pub backup_path: PathBuf,
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR);
        Self::with_data_dir(data_dir)
    }
}

impl AppConfig {
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        let backup_dir = dirs::document_dir().unwrap_or_else(|| data_dir.clone());
        Self {
            database_path: data_dir.join(DATABASE_FILE),
            backup_path: backup_dir.join(BACKUP_FILE),
            data_dir,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }

    /// Defaults overridden by the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = match non_empty(&lookup, "TKCONFIG_DATA_DIR") {
            Some(dir) => Self::with_data_dir(PathBuf::from(dir)),
            None => Self::default(),
        };

        if let Some(db) = non_empty(&lookup, "TKCONFIG_DB") {
            config.database_path = PathBuf::from(db);
        }
        if let Some(backup) = non_empty(&lookup, "TKCONFIG_BACKUP") {
            config.backup_path = PathBuf::from(backup);
        }
        if let Some(filter) = non_empty(&lookup, "TKCONFIG_LOG") {
            config.log_filter = filter;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.database_path.is_dir() {
            return Err(TkConfigError::InvalidConfiguration(format!(
                "database path {} is a directory",
                self.database_path.display()
            )));
        }
        if self.log_filter.trim().is_empty() {
            return Err(TkConfigError::InvalidConfiguration(
                "log filter is empty".to_string(),
            ));
        }
        Ok(())
    }
}

fn non_empty(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key).filter(|v| !v.trim().is_empty())
}
