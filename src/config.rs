//! Configuration file handling.
//!
//! The configuration file is stored at `$POS_HOME/config.json`. Next to it live the local data
//! files (`catalog.json`, `records.json`, `staged.json`) and the `.backups` directory.

use crate::auth::SharedSecret;
use crate::backup::Backup;
use crate::error::{ErrorType, IntoResult, Res};
use crate::model::{BulkEntries, PriceCatalog, RecordStore};
use crate::{utils, Result};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

const APP_NAME: &str = "pos";
const CONFIG_VERSION: u8 = 1;
const BACKUP_COPIES: u32 = 5;
pub(crate) const SALES_SHEET: &str = "Sales_data";
pub(crate) const PRICE_SHEET: &str = "December";
const PRICE_EDIT_PASSWORD: &str = "bushman";
const SECRETS: &str = ".secrets";
const BACKUPS: &str = ".backups";
const TOKEN_JSON: &str = "token.json";
const CONFIG_JSON: &str = "config.json";
const CATALOG_JSON: &str = "catalog.json";
const RECORDS_JSON: &str = "records.json";
const STAGED_JSON: &str = "staged.json";

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$POS_HOME` and from there it loads `$POS_HOME/config.json`. It provides paths to
/// the data files, which are expected in fixed locations within the home directory.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    backups: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
    spreadsheet_id: String,
}

impl Config {
    /// Creates the data directory, its subdirectories and:
    /// - an initial `config.json` using `sheet_url` (which may be empty) and default settings
    /// - `catalog.json` holding the house menu, unless a catalog is already there
    /// - empty `records.json` and `staged.json`, unless they are already there
    ///
    /// Running it again on an existing directory rewrites `config.json` but keeps the data.
    pub async fn create(dir: impl Into<PathBuf>, sheet_url: &str) -> Res<Self> {
        let spreadsheet_id = extract_spreadsheet_id(sheet_url)
            .context("Failed to extract spreadsheet ID from sheet URL")?
            .to_string();

        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the pos home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let backups = root.join(BACKUPS);
        utils::make_dir(&backups).await?;
        utils::make_dir(root.join(SECRETS)).await?;

        let config_path = root.join(CONFIG_JSON);
        let config_file = ConfigFile {
            sheet_url: sheet_url.to_string(),
            ..ConfigFile::default()
        };
        config_file.save(&config_path).await?;

        let config = Self {
            root,
            backups,
            config_path,
            config_file,
            spreadsheet_id,
        };
        seed(&config.catalog_path(), PriceCatalog::house_menu).await?;
        seed(&config.records_path(), RecordStore::new).await?;
        seed(&config.staged_path(), BulkEntries::new).await?;
        Ok(config)
    }

    /// This will
    /// - validate that `pos_home` and its config file exist
    /// - load the config file
    /// - validate that the backups directory exists
    /// - return the loaded configuration object
    ///
    /// Any failure is an `ErrorType::Config` error.
    pub async fn load(pos_home: impl Into<PathBuf>) -> Result<Self> {
        Self::load_inner(pos_home.into())
            .await
            .pub_result(ErrorType::Config)
    }

    async fn load_inner(maybe_relative: PathBuf) -> Res<Self> {
        let root = utils::canonicalize(&maybe_relative)
            .await
            .context("The pos home directory is missing, run 'pos init' first")?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;

        let spreadsheet_id = extract_spreadsheet_id(&config_file.sheet_url)
            .context("Failed to extract spreadsheet ID from sheet URL")?
            .to_string();

        let config = Self {
            backups: root.join(BACKUPS),
            root,
            config_path,
            config_file,
            spreadsheet_id,
        };
        if !config.backups.is_dir() {
            bail!(
                "The backups directory is missing '{}'",
                config.backups.display()
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

    pub fn catalog_path(&self) -> PathBuf {
        self.root.join(CATALOG_JSON)
    }

    pub fn records_path(&self) -> PathBuf {
        self.root.join(RECORDS_JSON)
    }

    pub fn staged_path(&self) -> PathBuf {
        self.root.join(STAGED_JSON)
    }

    pub fn sheet_url(&self) -> &str {
        &self.config_file.sheet_url
    }

    /// The spreadsheet ID, which is empty when no sheet URL has been configured.
    pub fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    /// Like `spreadsheet_id` but fails when no sheet has been configured.
    pub fn require_spreadsheet_id(&self) -> Res<&str> {
        if self.spreadsheet_id.is_empty() {
            bail!(
                "No sheet_url is set in {}, run 'pos init --sheet-url <URL>' or edit the file",
                self.config_path.display()
            )
        }
        Ok(&self.spreadsheet_id)
    }

    /// The tab holding one row of item quantities per day.
    pub fn sales_sheet(&self) -> &str {
        &self.config_file.sales_sheet
    }

    /// The tab holding `[Item, Price]` rows.
    pub fn price_sheet(&self) -> &str {
        &self.config_file.price_sheet
    }

    pub fn backup_copies(&self) -> u32 {
        self.config_file.backup_copies
    }

    /// Creates a new `Backup` instance for managing backup files.
    pub fn backup(&self) -> Backup {
        Backup::new(self)
    }

    /// The authorizer for price edits.
    pub fn authorizer(&self) -> SharedSecret {
        SharedSecret::new(self.config_file.price_edit_password.clone())
    }

    /// Returns the stored `token_path` if it is absolute, otherwise resolves it against the home
    /// directory.
    pub fn token_path(&self) -> PathBuf {
        let p = self.config_file.token_path();
        if p.is_absolute() {
            return p;
        }
        self.root.join(p)
    }
}

/// Writes `make()` to `path` unless a file is already there.
async fn seed<T, F>(path: &Path, make: F) -> Res<()>
where
    T: Serialize,
    F: FnOnce() -> T,
{
    if utils::exists(path).await? {
        debug!("Keeping existing {}", path.display());
        return Ok(());
    }
    utils::serialize(path, &make()).await
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "pos",
///   "config_version": 1,
///   "sheet_url": "https://docs.google.com/spreadsheets/d/1PosSa1es9kXq2TrVbHw7NcLm4ZdYe8GuJf3RiAo6Qp",
///   "sales_sheet": "Sales_data",
///   "price_sheet": "December",
///   "backup_copies": 5,
///   "price_edit_password": "bushman",
///   "token_path": ".secrets/token.json"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "pos"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// URL to the Google Sheet, empty when only local files are used
    #[serde(default)]
    sheet_url: String,

    #[serde(default = "default_sales_sheet")]
    sales_sheet: String,

    #[serde(default = "default_price_sheet")]
    price_sheet: String,

    /// Number of backup copies to keep per backup prefix
    #[serde(default = "default_backup_copies")]
    backup_copies: u32,

    /// The shared password that unlocks price edits
    #[serde(default = "default_price_edit_password")]
    price_edit_password: String,

    /// Path to a file holding a Google access token (relative to $POS_HOME or absolute).
    /// Defaults to $POS_HOME/.secrets/token.json if not specified
    #[serde(skip_serializing_if = "Option::is_none")]
    token_path: Option<PathBuf>,
}

fn default_sales_sheet() -> String {
    SALES_SHEET.to_string()
}

fn default_price_sheet() -> String {
    PRICE_SHEET.to_string()
}

fn default_backup_copies() -> u32 {
    BACKUP_COPIES
}

fn default_price_edit_password() -> String {
    PRICE_EDIT_PASSWORD.to_string()
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            sheet_url: String::new(),
            sales_sheet: default_sales_sheet(),
            price_sheet: default_price_sheet(),
            backup_copies: BACKUP_COPIES,
            price_edit_password: default_price_edit_password(),
            token_path: None,
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile from `path`, checking that it belongs to this app.
    async fn load(path: impl AsRef<Path>) -> Res<Self> {
        let config: ConfigFile = utils::deserialize(path.as_ref())
            .await
            .context("Unable to load the config file")?;

        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );

        Ok(config)
    }

    async fn save(&self, path: impl AsRef<Path>) -> Res<()> {
        utils::serialize(path.as_ref(), self)
            .await
            .context("Unable to write config file")
    }

    fn token_path(&self) -> PathBuf {
        self.token_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(SECRETS).join(TOKEN_JSON))
    }
}

/// Extracts the spreadsheet ID from a Google Sheets URL
///
/// # Arguments
/// * `url` - The Google Sheets URL (e.g., "https://docs.google.com/spreadsheets/d/SPREADSHEET_ID/...")
///
/// # Returns
/// The spreadsheet ID or an error if the URL format is invalid. Returns an empty string if the URL
/// is empty.
fn extract_spreadsheet_id(url: &str) -> Res<&str> {
    if url.is_empty() {
        return Ok(url);
    }

    // URL format: https://docs.google.com/spreadsheets/d/SPREADSHEET_ID/...
    // or: https://docs.google.com/spreadsheets/d/SPREADSHEET_ID?foo=bar
    let mut parts = url.split('/').skip_while(|part| *part != "d");
    if let Some(id_part) = parts.nth(1) {
        let id = id_part
            .split(['?', '#'])
            .next()
            .unwrap_or(id_part);
        if !id.is_empty() {
            return Ok(id);
        }
    }
    bail!(
        "Invalid Google Sheets URL format. Expected: https://docs.google.com/spreadsheets/d/SPREADSHEET_ID"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const URL: &str =
        "https://docs.google.com/spreadsheets/d/1PosSa1es9kXq2TrVbHw7NcLm4ZdYe8GuJf3RiAo6Qp/edit";

    #[tokio::test]
    async fn test_config_create() {
        let dir = TempDir::new().unwrap();
        let home_dir = dir.path().join("pos_home");

        let config = Config::create(&home_dir, URL).await.unwrap();

        assert_eq!(URL, config.sheet_url());
        assert_eq!(
            "1PosSa1es9kXq2TrVbHw7NcLm4ZdYe8GuJf3RiAo6Qp",
            config.spreadsheet_id()
        );
        assert!(config.backups().is_dir());
        assert_eq!(config.sales_sheet(), SALES_SHEET);
        assert_eq!(config.price_sheet(), PRICE_SHEET);

        let catalog: PriceCatalog = utils::deserialize(&config.catalog_path()).await.unwrap();
        assert_eq!(catalog, PriceCatalog::house_menu());
        let records: RecordStore = utils::deserialize(&config.records_path()).await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_config_create_keeps_existing_data() {
        let dir = TempDir::new().unwrap();
        let config = Config::create(dir.path(), "").await.unwrap();
        let catalog = PriceCatalog::new();
        utils::serialize(&config.catalog_path(), &catalog)
            .await
            .unwrap();

        let config = Config::create(dir.path(), URL).await.unwrap();
        let reloaded: PriceCatalog = utils::deserialize(&config.catalog_path()).await.unwrap();
        assert!(reloaded.is_empty());
        assert_eq!(config.sheet_url(), URL);
    }

    #[tokio::test]
    async fn test_config_load() {
        let dir = TempDir::new().unwrap();
        let created = Config::create(dir.path(), URL).await.unwrap();
        let loaded = Config::load(dir.path()).await.unwrap();
        assert_eq!(created.config_file, loaded.config_file);
        assert_eq!(created.root(), loaded.root());
    }

    #[tokio::test]
    async fn test_config_load_missing_home() {
        let dir = TempDir::new().unwrap();
        let err = Config::load(dir.path().join("nope")).await.unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Config);
        assert!(err.to_string().contains("pos init"));
    }

    #[tokio::test]
    async fn test_config_without_sheet() {
        let dir = TempDir::new().unwrap();
        let config = Config::create(dir.path(), "").await.unwrap();
        assert_eq!(config.spreadsheet_id(), "");
        assert!(config.require_spreadsheet_id().is_err());
    }

    #[test]
    fn test_config_file_default() {
        let config = ConfigFile::default();
        assert_eq!(config.sheet_url, "");
        assert_eq!(config.backup_copies, 5);
        assert_eq!(config.token_path(), PathBuf::from(SECRETS).join(TOKEN_JSON));
    }

    #[tokio::test]
    async fn test_config_file_load_with_minimal_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        let json = r#"{
            "app_name": "pos",
            "config_version": 1
        }"#;
        utils::write(&config_path, json).await.unwrap();

        let config = ConfigFile::load(&config_path).await.unwrap();

        assert_eq!(config, ConfigFile::default());
    }

    #[tokio::test]
    async fn test_config_file_load_invalid_app_name() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        let json = r#"{
            "app_name": "cashbook",
            "config_version": 1,
            "sheet_url": ""
        }"#;
        utils::write(&config_path, json).await.unwrap();

        let result = ConfigFile::load(&config_path).await;
        assert!(result.unwrap_err().to_string().contains("Invalid app_name"));
    }

    #[test]
    fn test_config_file_serialization_omits_none_fields() {
        let json = serde_json::to_string(&ConfigFile::default()).unwrap();
        assert!(!json.contains("token_path"));
    }

    #[test]
    fn test_extract_spreadsheet_id() {
        assert_eq!(
            extract_spreadsheet_id(URL).unwrap(),
            "1PosSa1es9kXq2TrVbHw7NcLm4ZdYe8GuJf3RiAo6Qp"
        );
        assert_eq!(
            extract_spreadsheet_id("https://docs.google.com/spreadsheets/d/ABC123?foo=bar")
                .unwrap(),
            "ABC123"
        );
        assert_eq!(
            extract_spreadsheet_id("https://docs.google.com/spreadsheets/d/ABC123#gid=0").unwrap(),
            "ABC123"
        );
        assert!(extract_spreadsheet_id("https://example.com/invalid").is_err());
        assert_eq!(extract_spreadsheet_id("").unwrap(), "");
    }
}
