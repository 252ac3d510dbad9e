use std::path::{Path, PathBuf};

use docshift_common::{Error, Result};
use tracing::{debug, info};

use crate::model::AppConfig;

const CONFIG_FILE_NAMES: &[&str] = &["config.yml", "config.yaml", "config.toml"];
const ENV_FILES: &[&str] = &[".env", ".env.local"];

/// Loads `AppConfig` from a YAML or TOML file, `.env` files and
/// `DOCSHIFT_*` environment variables, in increasing precedence.
pub struct ConfigLoader {
    config_dir: PathBuf,
}

impl ConfigLoader {
    /// Loader rooted at `~/.docshift`.
    pub fn new() -> Self {
        Self::with_dir(Self::default_config_dir())
    }

    pub fn with_dir(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
        }
    }

    pub fn default_config_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".docshift")
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Load configuration. An explicit path must exist; otherwise the first
    /// `config.{yml,yaml,toml}` in the config dir is used, falling back to
    /// defaults when there is none.
    pub fn load(&self, explicit: Option<&Path>) -> Result<AppConfig> {
        load_env_files(Path::new("."))?;

        let mut config = match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(Error::Config(format!(
                        "config file not found: {}",
                        path.display()
                    )));
                }
                read_config_file(path)?
            }
            None => match self.find_config_file() {
                Some(path) => read_config_file(&path)?,
                None => {
                    debug!(
                        "no config file in {}, using defaults",
                        self.config_dir.display()
                    );
                    AppConfig::default()
                }
            },
        };

        apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    fn find_config_file(&self) -> Option<PathBuf> {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| self.config_dir.join(name))
            .find(|path| path.exists())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Load `.env` then `.env.local` from `dir` into the process environment.
/// Missing files are skipped; variables already set are left alone.
pub fn load_env_files(dir: &Path) -> Result<()> {
    for name in ENV_FILES {
        let path = dir.join(name);
        if path.exists() {
            dotenvy::from_path(&path).map_err(|e| {
                Error::Config(format!("failed to load env file {}: {e}", path.display()))
            })?;
            debug!("loaded environment from {}", path.display());
        }
    }
    Ok(())
}

pub fn read_config_file(path: &Path) -> Result<AppConfig> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;

    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let config = match ext {
        "yml" | "yaml" => serde_yaml::from_str(&contents)
            .map_err(|e| Error::Config(format!("YAML parse error: {e}")))?,
        "toml" => {
            toml::from_str(&contents).map_err(|e| Error::Config(format!("TOML parse error: {e}")))?
        }
        other => {
            return Err(Error::Config(format!(
                "unsupported config extension: {other}"
            )));
        }
    };

    info!("config loaded from {}", path.display());
    Ok(config)
}

/// Apply `DOCSHIFT_*` overrides using `lookup` to read variables.
pub fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = lookup("DOCSHIFT_DATABASE_PATH") {
        config.database.path = Some(PathBuf::from(path));
    }
    if let Some(collection) = lookup("DOCSHIFT_MIGRATIONS_COLLECTION") {
        config.database.migrations_collection = collection;
    }
    if let Some(path) = lookup("DOCSHIFT_MIGRATIONS_PATH") {
        config.migrations.path = PathBuf::from(path);
    }
    if let Some(timeout) = lookup("DOCSHIFT_TIMEOUT_SECS") {
        config.timeout_secs = timeout.trim().parse().map_err(|_| {
            Error::Config(format!("DOCSHIFT_TIMEOUT_SECS is not a number: {timeout:?}"))
        })?;
    }
    if let Some(level) = lookup("DOCSHIFT_LOG_LEVEL") {
        config.log.level = level;
    }
    Ok(())
}
