//! Storage configuration
//!
//! Settings come from an optional `hbnb.toml` and are overridden by the
//! `HBNB_*` environment variables. The resolved `Config` is what
//! `open_storage` consumes.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::storage::file::DEFAULT_FILE_PATH;
use crate::{Error, Result};

pub const ENV_STORAGE: &str = "HBNB_TYPE_STORAGE";
pub const ENV_FILE_PATH: &str = "HBNB_FILE_PATH";
pub const ENV_DB_USER: &str = "HBNB_DB_USER";
pub const ENV_DB_PASSWORD: &str = "HBNB_DB_PWD";
pub const ENV_DB_HOST: &str = "HBNB_DB_HOST";
pub const ENV_DB_NAME: &str = "HBNB_DB_NAME";
pub const ENV_ENV: &str = "HBNB_ENV";

/// On-disk config file. Every field is optional.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct HbnbConfig {
    /// `file` or `db`
    pub storage: Option<String>,
    pub file_path: Option<String>,
    pub env: Option<String>,
    pub database: Option<DatabaseSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct DatabaseSection {
    pub user: Option<String>,
    pub password: Option<String>,
    pub host: Option<String>,
    pub name: Option<String>,
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("hbnb.toml")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<HbnbConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: HbnbConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &HbnbConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

/// Which backend the process runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageMode {
    #[default]
    File,
    Database,
}

impl StorageMode {
    /// Only the exact value `db` selects the database store
    fn parse(value: Option<&str>) -> Self {
        match value {
            Some("db") => StorageMode::Database,
            _ => StorageMode::File,
        }
    }
}

/// Connection parameters for the database store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub user: String,
    pub password: String,
    /// Directory holding the database file; `localhost` is the working directory
    pub host: String,
    /// Database file name, or `:memory:`
    pub name: String,
}

/// Where a `DatabaseConfig` points
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseLocator {
    Memory,
    File(PathBuf),
}

impl DatabaseConfig {
    pub fn locator(&self) -> DatabaseLocator {
        if self.name == ":memory:" {
            return DatabaseLocator::Memory;
        }

        let mut file = PathBuf::from(&self.name);
        if file.extension().is_none() {
            file.set_extension("db");
        }
        match self.host.as_str() {
            "" | "localhost" => DatabaseLocator::File(file),
            dir => DatabaseLocator::File(Path::new(dir).join(file)),
        }
    }

    /// Connection string safe for logs
    pub fn redacted_url(&self) -> String {
        format!("sqlite://{}:***@{}/{}", self.user, self.host, self.name)
    }
}

/// Fully resolved storage settings
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub storage: StorageMode,
    pub file_path: PathBuf,
    pub database: Option<DatabaseConfig>,
    pub env: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage: StorageMode::File,
            file_path: PathBuf::from(DEFAULT_FILE_PATH),
            database: None,
            env: None,
        }
    }
}

impl Config {
    /// Resolve from the process environment over an optional config file
    pub fn from_env(file: Option<HbnbConfig>) -> Result<Self> {
        Self::resolve_with(file, |name| std::env::var(name).ok())
    }

    /// Resolve with `lookup` standing in for the environment.
    ///
    /// The database store needs all four connection parameters; a missing
    /// one is a configuration error rather than a silent fallback.
    pub fn resolve_with(file: Option<HbnbConfig>, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let file = file.unwrap_or_default();
        let section = file.database.unwrap_or_default();

        let storage = StorageMode::parse(lookup(ENV_STORAGE).or(file.storage).as_deref());
        let file_path = lookup(ENV_FILE_PATH)
            .or(file.file_path)
            .unwrap_or_else(|| DEFAULT_FILE_PATH.to_string());
        let env = lookup(ENV_ENV).or(file.env);

        let database = match storage {
            StorageMode::File => None,
            StorageMode::Database => {
                let require = |var: &str, fallback: Option<String>| {
                    lookup(var)
                        .or(fallback)
                        .ok_or_else(|| Error::Config(format!("{} is required for database storage", var)))
                };
                Some(DatabaseConfig {
                    user: require(ENV_DB_USER, section.user)?,
                    password: require(ENV_DB_PASSWORD, section.password)?,
                    host: require(ENV_DB_HOST, section.host)?,
                    name: require(ENV_DB_NAME, section.name)?,
                })
            }
        };

        let config = Self {
            storage,
            file_path: PathBuf::from(file_path),
            database,
            env,
        };
        tracing::debug!("resolved config: {:?} (test env: {})", config.storage, config.is_test_env());
        Ok(config)
    }

    /// Test environment: the database store starts from empty tables
    pub fn is_test_env(&self) -> bool {
        self.env.as_deref() == Some("test")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |name| vars.get(name).cloned()
    }

    fn db_vars() -> Vec<(&'static str, &'static str)> {
        vec![
            (ENV_STORAGE, "db"),
            (ENV_DB_USER, "hbnb_dev"),
            (ENV_DB_PASSWORD, "hbnb_dev_pwd"),
            (ENV_DB_HOST, "localhost"),
            (ENV_DB_NAME, "hbnb_dev_db"),
        ]
    }

    #[test]
    fn test_defaults_to_file_storage() {
        let config = Config::resolve_with(None, lookup_from(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.file_path, PathBuf::from("file.json"));
    }

    #[test]
    fn test_only_db_selects_database() {
        let config = Config::resolve_with(None, lookup_from(&[(ENV_STORAGE, "mysql")])).unwrap();
        assert_eq!(config.storage, StorageMode::File);

        let config = Config::resolve_with(None, lookup_from(&db_vars())).unwrap();
        assert_eq!(config.storage, StorageMode::Database);
        let database = config.database.unwrap();
        assert_eq!(database.user, "hbnb_dev");
        assert_eq!(database.locator(), DatabaseLocator::File(PathBuf::from("hbnb_dev_db.db")));
    }

    #[test]
    fn test_missing_connection_parameter() {
        let vars: Vec<_> = db_vars().into_iter().filter(|(k, _)| *k != ENV_DB_PASSWORD).collect();
        let err = Config::resolve_with(None, lookup_from(&vars)).unwrap_err();
        assert!(matches!(err, Error::Config(msg) if msg.contains(ENV_DB_PASSWORD)));
    }

    #[test]
    fn test_environment_overrides_file() {
        let file = HbnbConfig {
            storage: Some("db".to_string()),
            file_path: Some("from_file.json".to_string()),
            env: Some("test".to_string()),
            database: Some(DatabaseSection {
                user: Some("file_user".to_string()),
                password: Some("file_pwd".to_string()),
                host: Some("/var/lib/hbnb".to_string()),
                name: Some("hbnb.sqlite".to_string()),
            }),
        };

        let config = Config::resolve_with(Some(file), lookup_from(&[(ENV_DB_USER, "env_user")])).unwrap();

        assert!(config.is_test_env());
        assert_eq!(config.file_path, PathBuf::from("from_file.json"));
        let database = config.database.unwrap();
        assert_eq!(database.user, "env_user");
        assert_eq!(database.password, "file_pwd");
        assert_eq!(
            database.locator(),
            DatabaseLocator::File(PathBuf::from("/var/lib/hbnb/hbnb.sqlite"))
        );
    }

    #[test]
    fn test_memory_locator_and_redaction() {
        let database = DatabaseConfig {
            user: "u".to_string(),
            password: "secret".to_string(),
            host: "localhost".to_string(),
            name: ":memory:".to_string(),
        };
        assert_eq!(database.locator(), DatabaseLocator::Memory);
        assert!(!database.redacted_url().contains("secret"));
    }

    #[test]
    fn test_load_and_write_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hbnb.toml");
        assert_eq!(load_config(Some(&path)).unwrap(), None);

        let config = HbnbConfig {
            storage: Some("file".to_string()),
            file_path: Some("data.json".to_string()),
            ..HbnbConfig::default()
        };
        write_config(&path, &config, false).unwrap();
        assert_eq!(load_config(Some(&path)).unwrap(), Some(config.clone()));

        assert!(write_config(&path, &config, false).is_err());
        write_config(&path, &config, true).unwrap();
    }
}
