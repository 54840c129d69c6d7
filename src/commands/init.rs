use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::{Config, Result};
use anyhow::Context;
use std::path::Path;

/// Creates the home directory, its subdirectories and:
/// - Creates an initial `config.json` file using `share_url` along with default settings
/// - Creates an empty SQLite database
///
/// # Arguments
/// - `home` - The directory that will be the root of the home directory, e.g.
///   `$HOME/finance-planner`
/// - `share_url` - The address of the planner that share links should open.
///
/// # Errors
/// - Returns an error if the directory is already initialized or any file operations fail.
pub async fn init(home: &Path, share_url: &str) -> Result<Out<()>> {
    let config = Config::create(home, share_url)
        .await
        .context("Unable to create the home directory and configs")
        .pub_result(ErrorType::Config)?;
    Ok(format!(
        "Successfully created the finance planner home at {}",
        config.root().display()
    )
    .into())
}
