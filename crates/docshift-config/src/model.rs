use std::path::{Path, PathBuf};
use std::time::Duration;

use docshift_common::{Error, Result};
use docshift_db::validate_collection_name;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MIGRATIONS_COLLECTION: &str = "schema_migrations";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub migrations: MigrationsConfig,
    /// Upper bound for a whole up/down/status/force operation.
    pub timeout_secs: u64,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database file. Defaults to `<config dir>/data/docshift.db`.
    pub path: Option<PathBuf>,
    /// Collection holding one record per applied migration.
    pub migrations_collection: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationsConfig {
    /// Where `create` writes new migration templates.
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            migrations: MigrationsConfig::default(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            log: LogConfig::default(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: None,
            migrations_collection: DEFAULT_MIGRATIONS_COLLECTION.to_string(),
        }
    }
}

impl Default for MigrationsConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./migrations"),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<()> {
        let collection = &self.database.migrations_collection;
        validate_collection_name(collection)
            .map_err(|_| Error::Config(format!("invalid migrations_collection: {collection:?}")))?;
        if self.timeout_secs == 0 {
            return Err(Error::Config("timeout_secs must be positive".into()));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn resolved_database_path(&self, config_dir: &Path) -> PathBuf {
        self.database
            .path
            .clone()
            .unwrap_or_else(|| config_dir.join("data").join("docshift.db"))
    }
}
