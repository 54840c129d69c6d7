use crate::Result;
use anyhow::Context;
use chrono::{DateTime, SecondsFormat, Utc};
use std::path::{Path, PathBuf};

/// Write a file.
pub(crate) async fn write(path: impl AsRef<Path>, contents: impl AsRef<[u8]>) -> Result<()> {
    let path = path.as_ref();
    tokio::fs::write(path, contents)
        .await
        .context(format!("Unable to write to {}", path.to_string_lossy()))
}

/// Read a file to a `String`.
pub async fn read(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read file at {}", path.display()))
}

/// Create a directory and any missing parents.
pub(crate) async fn make_dir(p: &Path) -> Result<()> {
    tokio::fs::create_dir_all(p)
        .await
        .with_context(|| format!("Unable to create directory at {}", p.to_string_lossy()))
}

pub(crate) async fn canonicalize(p: &Path) -> Result<PathBuf> {
    tokio::fs::canonicalize(p)
        .await
        .with_context(|| format!("Unable to canonicalize the path {}", p.to_string_lossy()))
}

pub(crate) async fn read_dir(p: &Path) -> Result<tokio::fs::ReadDir> {
    tokio::fs::read_dir(p)
        .await
        .with_context(|| format!("Unable to read directory {}", p.to_string_lossy()))
}

pub(crate) async fn remove(p: &Path) -> Result<()> {
    tokio::fs::remove_file(p)
        .await
        .with_context(|| format!("Unable to remove file {}", p.to_string_lossy()))
}

/// The current instant in the same shape a browser's `Date.toISOString` produces, e.g.
/// `2025-01-15T10:30:00.000Z`.
pub(crate) fn iso_now() -> String {
    iso(Utc::now())
}

pub(crate) fn iso(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Today's date in YYYY-MM-DD format (UTC).
pub(crate) fn today() -> String {
    Utc::now().format("%Y-%m-%d").to_string()
}
