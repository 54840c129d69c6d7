//! Configuration file handling for the finance planner.
//!
//! The configuration file is stored at `$FINPLAN_HOME/config.json` and contains settings for
//! the planner including the base URL used for share links, backup settings and the currency
//! symbol used when printing amounts.

use crate::backup::Backup;
use crate::ledger::Ledger;
use crate::store::{RecordStore, SqliteMedium};
use crate::{utils, Result};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

const APP_NAME: &str = "finance-planner";
const CONFIG_VERSION: u8 = 1;
const BACKUP_COPIES: u32 = 5;
const BACKUPS: &str = ".backups";
const CONFIG_JSON: &str = "config.json";
const PLANNER_SQLITE: &str = "planner.sqlite";
pub const DEFAULT_SHARE_BASE_URL: &str = "http://localhost:5173/";
const DEFAULT_CURRENCY_SYMBOL: &str = "₹";

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$FINPLAN_HOME` and from there it loads `$FINPLAN_HOME/config.json`. It provides
/// paths to other items that are expected in a certain location within the home directory, and
/// the `RecordStore` over the database kept there.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    backups: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
    store: RecordStore,
    sqlite_path: PathBuf,
}

impl Config {
    /// Creates the home directory, its subdirectories and:
    /// - Creates an initial `config.json` file using `share_base_url` along with default settings
    /// - Creates an empty SQLite database
    ///
    /// # Arguments
    /// - `dir` - The directory that will be the root of the home directory, e.g.
    ///   `$HOME/finance-planner`
    /// - `share_base_url` - The address of the planner that share links should point at.
    ///
    /// # Errors
    /// - Returns an error if `share_base_url` is not a URL or any file operations fail.
    pub async fn create(dir: impl Into<PathBuf>, share_base_url: &str) -> Result<Self> {
        Url::parse(share_base_url)
            .with_context(|| format!("Invalid share base URL '{share_base_url}'"))?;

        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the finance planner home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let config_path = root.join(CONFIG_JSON);
        if config_path.exists() {
            bail!(
                "A config file already exists at '{}'",
                config_path.display()
            );
        }

        let backups_dir = root.join(BACKUPS);
        utils::make_dir(&backups_dir).await?;

        let config_file = ConfigFile {
            share_base_url: share_base_url.to_string(),
            ..ConfigFile::default()
        };
        config_file.save(&config_path).await?;

        let sqlite_path = root.join(PLANNER_SQLITE);
        let medium = SqliteMedium::init(&sqlite_path)
            .await
            .context("Unable to create SQLite DB")?;

        Ok(Self {
            root,
            backups: backups_dir,
            config_path,
            config_file,
            store: RecordStore::new(medium),
            sqlite_path,
        })
    }

    /// This will
    /// - validate that the home directory exists and that the config file exists
    /// - load the config file
    /// - validate that the backups directory exists
    /// - open the database
    pub async fn load(home: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = home.into();
        let root = utils::canonicalize(&maybe_relative)
            .await
            .context("The finance planner home is missing, run 'finplan init' first")?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;

        let backups = root.join(BACKUPS);
        if !backups.is_dir() {
            bail!("The backups directory is missing '{}'", backups.display())
        }

        let sqlite_path = root.join(PLANNER_SQLITE);
        let medium = SqliteMedium::load(&sqlite_path)
            .await
            .context("Unable to load SQLite DB")?;

        Ok(Self {
            root,
            backups,
            config_path,
            config_file,
            store: RecordStore::new(medium),
            sqlite_path,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn backups(&self) -> &Path {
        &self.backups
    }

    pub fn sqlite_path(&self) -> &Path {
        &self.sqlite_path
    }

    pub fn share_base_url(&self) -> &str {
        &self.config_file.share_base_url
    }

    pub fn backup_copies(&self) -> u32 {
        self.config_file.backup_copies
    }

    pub fn currency_symbol(&self) -> &str {
        &self.config_file.currency_symbol
    }

    /// The persistence service over this home's database.
    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn ledger(&self) -> Ledger {
        Ledger::new(self.store.clone())
    }

    /// Creates a new `Backup` instance for managing backup files.
    pub fn backup(&self) -> Backup {
        Backup::new(self)
    }
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "finance-planner",
///   "config_version": 1,
///   "share_base_url": "https://planner.example.com/",
///   "backup_copies": 5,
///   "currency_symbol": "₹"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "finance-planner"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// The planner address that share links are built on
    share_base_url: String,

    /// Number of pre-import backup copies to keep
    backup_copies: u32,

    /// Printed in front of amounts
    #[serde(default = "default_currency_symbol")]
    currency_symbol: String,
}

fn default_currency_symbol() -> String {
    DEFAULT_CURRENCY_SYMBOL.to_string()
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            share_base_url: DEFAULT_SHARE_BASE_URL.to_string(),
            backup_copies: BACKUP_COPIES,
            currency_symbol: default_currency_symbol(),
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile asynchronously from the specified path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file at {}", path.display()))?;

        let config: ConfigFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file at {}", path.display()))?;

        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );
        Url::parse(&config.share_base_url).with_context(|| {
            format!(
                "Invalid share_base_url in config file: '{}'",
                config.share_base_url
            )
        })?;

        Ok(config)
    }

    /// Saves the ConfigFile to the specified path.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let p = path.as_ref();
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(p, data)
            .await
            .context("Unable to write config file")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Key;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_config_create() {
        let dir = TempDir::new().unwrap();
        let home_dir = dir.path().join("finance-planner");
        let url = "https://planner.example.com/";

        let config = Config::create(&home_dir, url).await.unwrap();

        assert_eq!(url, config.share_base_url());
        assert_eq!(5, config.backup_copies());
        assert_eq!("₹", config.currency_symbol());
        assert!(config.backups().is_dir());
        assert!(config.sqlite_path().is_file());
        assert!(config.config_path().is_file());
    }

    #[tokio::test]
    async fn test_config_create_twice_fails() {
        let dir = TempDir::new().unwrap();
        Config::create(dir.path(), DEFAULT_SHARE_BASE_URL)
            .await
            .unwrap();
        assert!(Config::create(dir.path(), DEFAULT_SHARE_BASE_URL)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_config_create_rejects_bad_url() {
        let dir = TempDir::new().unwrap();
        assert!(Config::create(dir.path().join("home"), "not a url")
            .await
            .is_err());
        assert!(!dir.path().join("home").exists());
    }

    #[tokio::test]
    async fn test_config_load_reopens_store() {
        let dir = TempDir::new().unwrap();
        let config = Config::create(dir.path(), DEFAULT_SHARE_BASE_URL)
            .await
            .unwrap();
        assert!(config.store().write_raw(Key::Theme, "ocean").await);
        drop(config);

        let config = Config::load(dir.path()).await.unwrap();
        assert_eq!(
            config.store().read_raw(Key::Theme).await.as_deref(),
            Some("ocean")
        );
    }

    #[tokio::test]
    async fn test_config_load_missing_home() {
        let dir = TempDir::new().unwrap();
        assert!(Config::load(dir.path().join("nope")).await.is_err());
    }

    #[test]
    fn test_config_file_default() {
        let config = ConfigFile::default();
        assert_eq!(config.app_name, APP_NAME);
        assert_eq!(config.share_base_url, DEFAULT_SHARE_BASE_URL);
        assert_eq!(config.backup_copies, 5);
    }

    #[tokio::test]
    async fn test_config_file_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");

        let original = ConfigFile {
            share_base_url: "https://planner.example.com/app".to_string(),
            backup_copies: 7,
            currency_symbol: "$".to_string(),
            ..ConfigFile::default()
        };
        original.save(&config_path).await.unwrap();
        let loaded = ConfigFile::load(&config_path).await.unwrap();
        assert_eq!(original, loaded);
    }

    #[tokio::test]
    async fn test_config_file_load_with_minimal_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        let json = r#"{
            "app_name": "finance-planner",
            "config_version": 1,
            "share_base_url": "https://planner.example.com/",
            "backup_copies": 3
        }"#;
        utils::write(&config_path, json).await.unwrap();

        let config = ConfigFile::load(&config_path).await.unwrap();
        assert_eq!(config.backup_copies, 3);
        assert_eq!(config.currency_symbol, DEFAULT_CURRENCY_SYMBOL);
    }

    #[tokio::test]
    async fn test_config_file_load_invalid_app_name() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        let json = r#"{
            "app_name": "wrong_app",
            "config_version": 1,
            "share_base_url": "https://planner.example.com/",
            "backup_copies": 5
        }"#;
        utils::write(&config_path, json).await.unwrap();

        let result = ConfigFile::load(&config_path).await;
        assert!(result.unwrap_err().to_string().contains("Invalid app_name"));
    }
}
