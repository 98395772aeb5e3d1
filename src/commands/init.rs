use crate::commands::Out;
use crate::{Config, Result};
use anyhow::Context;
use std::path::Path;

/// Creates the data directory, its subdirectories and an initial `config.json` with default
/// settings.
///
/// # Arguments
/// - `cem_home` - The directory that will be the root of data directory, e.g. `$HOME/cem`
///
/// # Errors
/// - Returns an error if the directory is already initialized or if any file operations fail.
pub async fn init(cem_home: &Path) -> Result<Out<()>> {
    let config = Config::create(cem_home)
        .await
        .context("Unable to create the data directory and configs")?;
    Ok(format!(
        "Successfully created the cem directory at '{}'",
        config.root().display()
    )
    .into())
}
