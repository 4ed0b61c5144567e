use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::{Config, Result};
use anyhow::Context;
use std::path::Path;

/// Creates the data directory, its subdirectories and:
/// - Creates an initial `config.json` file using `sheet_url` along with default settings
/// - Seeds `catalog.json` with the house menu and empty record and stage files, leaving any that
///   already exist untouched.
///
/// # Arguments
/// - `pos_home` - The directory that will be the root of data directory, e.g. `$HOME/pos`
/// - `sheet_url` - The URL of the Google Sheet to sync with, if any.
///   e.g. https://docs.google.com/spreadsheets/d/1PosSa1es9kXq2TrVbHw7NcLm4ZdYe8GuJf3RiAo6Qp
///
/// # Errors
/// - Returns an error if any file operations fail or the sheet URL has no spreadsheet ID.
pub async fn init(pos_home: &Path, sheet_url: Option<&str>) -> Result<Out<()>> {
    let config = Config::create(pos_home, sheet_url.unwrap_or_default())
        .await
        .context("Unable to create the data directory and configs")
        .pub_result(ErrorType::Config)?;
    Ok(format!(
        "Successfully created the pos directory and config at {}",
        config.root().display()
    )
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init_then_load() {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join("pos");
        let out = init(&home, None).await.unwrap();
        assert!(out.message().contains("Successfully created"));

        let config = Config::load(&home).await.unwrap();
        assert!(utils::exists(config.catalog_path()).await.unwrap());
        assert!(config.sheet_url().is_empty());
    }

    #[tokio::test]
    async fn test_init_bad_url() {
        let dir = TempDir::new().unwrap();
        let err = init(dir.path(), Some("https://example.com/nothing"))
            .await
            .unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Config);
    }
}
