//! Configuration file handling.
//!
//! The configuration file is stored at `$CEM_HOME/config.json`. Next to it, `$CEM_HOME/storage`
//! holds the key-value store and `$CEM_HOME/.backups` holds backup documents.

use crate::backup::Backup;
use crate::model::{Categories, DEFAULT_CATEGORIES};
use crate::storage::FileStore;
use crate::store::Ledger;
use crate::{utils, Result};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const APP_NAME: &str = "cem";
const CONFIG_VERSION: u8 = 1;
const BACKUP_COPIES: u32 = 5;
const CURRENCY_SYMBOL: &str = "₹";
const BACKUPS: &str = ".backups";
const STORAGE: &str = "storage";
const CONFIG_JSON: &str = "config.json";

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$CEM_HOME` and from there it loads `$CEM_HOME/config.json`.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    backups: PathBuf,
    storage: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
}

impl Config {
    /// Creates the home directory, its subdirectories and an initial `config.json` with default
    /// settings.
    ///
    /// # Errors
    /// - Returns an error if the directory already holds a `config.json`, or if any file operation
    ///   fails.
    pub async fn create(dir: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the cem home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let config_path = root.join(CONFIG_JSON);
        if config_path.exists() {
            bail!(
                "A config file already exists at '{}'",
                config_path.display()
            )
        }

        let backups = root.join(BACKUPS);
        utils::make_dir(&backups).await?;
        let storage = root.join(STORAGE);
        utils::make_dir(&storage).await?;

        let config_file = ConfigFile::default();
        config_file.save(&config_path).await?;

        Ok(Self {
            root,
            backups,
            storage,
            config_path,
            config_file,
        })
    }

    /// This will
    /// - validate that `cem_home` exists and that the config file exists
    /// - load the config file
    /// - validate that the backups and storage directories exist
    pub async fn load(cem_home: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = cem_home.into();
        let root = utils::canonicalize(&maybe_relative)
            .await
            .context("The cem home directory is missing, run `cem init` first")?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;

        let config = Self {
            root: root.clone(),
            backups: root.join(BACKUPS),
            storage: root.join(STORAGE),
            config_path,
            config_file,
        };
        if !config.backups.is_dir() {
            bail!(
                "The backups directory is missing '{}'",
                config.backups.display()
            )
        }
        if !config.storage.is_dir() {
            bail!(
                "The storage directory is missing '{}'",
                config.storage.display()
            )
        }
        Ok(config)
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

    pub fn storage(&self) -> &Path {
        &self.storage
    }

    pub fn backup_copies(&self) -> u32 {
        self.config_file.backup_copies
    }

    pub fn currency_symbol(&self) -> &str {
        &self.config_file.currency_symbol
    }

    /// The categories a user starts with when nothing is stored for them yet.
    pub fn default_categories(&self) -> Categories {
        Categories::new(&self.config_file.default_categories)
    }

    /// Opens the ledger backed by the storage directory.
    pub fn ledger(&self) -> Result<Ledger<FileStore>> {
        let store = FileStore::open(&self.storage)?;
        Ok(Ledger::new(store).with_default_categories(self.default_categories()))
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
///   "app_name": "cem",
///   "config_version": 1,
///   "default_categories": ["Food", "Transport", "Tools", "Events", "Misc"],
///   "currency_symbol": "₹",
///   "backup_copies": 5
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "cem"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// Categories seeded for a user who has none stored
    #[serde(default = "default_categories")]
    default_categories: Vec<String>,

    /// Prefix used when printing money
    #[serde(default = "default_currency_symbol")]
    currency_symbol: String,

    /// Number of backup copies to keep per user
    #[serde(default = "default_backup_copies")]
    backup_copies: u32,
}

fn default_categories() -> Vec<String> {
    DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect()
}

fn default_currency_symbol() -> String {
    CURRENCY_SYMBOL.to_string()
}

fn default_backup_copies() -> u32 {
    BACKUP_COPIES
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            default_categories: default_categories(),
            currency_symbol: default_currency_symbol(),
            backup_copies: BACKUP_COPIES,
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile asynchronously from the specified path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or if it belongs to another app or a
    /// newer version.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = utils::read(path).await?;
        let config: ConfigFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file at {}", path.display()))?;

        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );
        anyhow::ensure!(
            config.config_version <= CONFIG_VERSION,
            "Unsupported config_version {} in config file, this build understands up to {}",
            config.config_version,
            CONFIG_VERSION
        );

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
