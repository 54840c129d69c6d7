use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::snapshot::{share, Snapshot};
use crate::{Config, Result};
use std::path::{Path, PathBuf};

/// Writes a snapshot of every stored value to `dir` as `finance-planner-data-<date>.json`.
pub async fn export(config: &Config, dir: &Path) -> Result<Out<PathBuf>> {
    let snapshot = Snapshot::build(config.store()).await;
    let path = snapshot
        .export_file(dir)
        .await
        .pub_result(ErrorType::Io)?;
    Ok(Out::new(
        format!("Exported all data to {}", path.display()),
        path,
    ))
}

/// Builds a share link on the configured base URL that carries a snapshot of every stored value.
pub async fn share(config: &Config) -> Result<Out<String>> {
    let snapshot = Snapshot::build(config.store()).await;
    let link = share::link(config.share_base_url(), &snapshot)
        .pub_result(ErrorType::Config)?
        .to_string();
    Ok(Out::new(link.clone(), link))
}
