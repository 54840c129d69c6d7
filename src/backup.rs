//! Local snapshot backups taken before an import overwrites the store.

use crate::snapshot::Snapshot;
use crate::{utils, Config, Result};
use anyhow::Context;
use chrono::Local;
use std::path::PathBuf;

/// Prefix for the backup written just before an import is committed.
pub const PRE_IMPORT: &str = "pre-import";

const EXTENSION: &str = "json";

/// Manages backup file creation and rotation.
///
/// The `Backup` struct is immutable and owns copies of the paths and settings it needs.
/// Create a new instance via `Config::backup()` or `Backup::new()`.
#[derive(Debug, Clone)]
pub struct Backup {
    backups_dir: PathBuf,
    backup_copies: u32,
}

impl Backup {
    /// Creates a new `Backup` instance from a `Config`.
    pub fn new(config: &Config) -> Self {
        Self {
            backups_dir: config.backups().to_path_buf(),
            backup_copies: config.backup_copies(),
        }
    }

    /// Saves `snapshot` as a JSON backup file that can later be imported like any export.
    ///
    /// The filename format is `{prefix}.YYYY-MM-DD-NNN.json` where NNN is a sequence number.
    /// Automatically rotates old backups, keeping only `backup_copies` files.
    ///
    /// Returns the path to the created backup file.
    pub async fn save_snapshot(&self, prefix: &str, snapshot: &Snapshot) -> Result<PathBuf> {
        let date = today();
        let seq = self.next_sequence_number(prefix, &date).await?;
        let filename = format!("{prefix}.{date}-{seq:03}.{EXTENSION}");
        let path = self.backups_dir.join(&filename);

        let json = snapshot
            .to_json()
            .context("Failed to serialize the backup snapshot")?;
        utils::write(&path, json).await?;

        self.rotate(prefix).await?;

        Ok(path)
    }

    /// Scans the backups directory for existing files with the given prefix and date,
    /// and returns the next sequence number.
    async fn next_sequence_number(&self, prefix: &str, date: &str) -> Result<u32> {
        let mut max_seq: u32 = 0;
        for name in self.file_names().await? {
            if let Some(seq) = parse_sequence_number(&name, prefix, date) {
                max_seq = max_seq.max(seq);
            }
        }
        Ok(max_seq + 1)
    }

    /// Rotates old backup files, keeping only `backup_copies` files with the given prefix.
    async fn rotate(&self, prefix: &str) -> Result<()> {
        let mut files: Vec<String> = self
            .file_names()
            .await?
            .into_iter()
            .filter(|name| is_backup_file(name, prefix))
            .collect();

        // Sorts by date and sequence number due to the name format
        files.sort();

        let to_delete = files.len().saturating_sub(self.backup_copies as usize);
        for name in files.into_iter().take(to_delete) {
            utils::remove(&self.backups_dir.join(name)).await?;
        }

        Ok(())
    }

    async fn file_names(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut dir = utils::read_dir(&self.backups_dir).await?;
        while let Some(entry) = dir
            .next_entry()
            .await
            .context("Failed to read directory entry")?
        {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
        Ok(names)
    }
}

/// Returns today's date in YYYY-MM-DD format.
fn today() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}

/// Parses the sequence number from a backup filename.
/// Returns None if the filename doesn't match `{prefix}.{date}-{NNN}.json`.
fn parse_sequence_number(filename: &str, prefix: &str, date: &str) -> Option<u32> {
    filename
        .strip_prefix(&format!("{prefix}.{date}-"))?
        .strip_suffix(&format!(".{EXTENSION}"))?
        .parse()
        .ok()
}

fn is_backup_file(filename: &str, prefix: &str) -> bool {
    filename.starts_with(&format!("{prefix}.")) && filename.ends_with(&format!(".{EXTENSION}"))
}
