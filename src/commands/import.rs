use crate::args::ImportSource;
use crate::backup::PRE_IMPORT;
use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::snapshot::{commit, share, stage_file, ImportReport, PendingImport, Snapshot};
use crate::{Config, Result};
use anyhow::{anyhow, Context};
use dialoguer::theme::ColorfulTheme;
use dialoguer::Confirm;
use serde::Serialize;
use std::fmt::Write;
use std::path::PathBuf;
use tracing::{debug, info};
use url::Url;

/// What happened to an import.
#[derive(Debug, Clone, Serialize)]
pub struct ImportOutcome {
    /// `None` when nothing was written: the source was empty or the user declined.
    pub report: Option<ImportReport>,
    /// The snapshot of the previous data, saved before anything was overwritten.
    pub backup: Option<PathBuf>,
    /// For a link import, the same link without its `data` parameter.
    pub cleaned_link: Option<String>,
}

/// Stages the snapshot in `source`, asks the user to confirm unless `yes` is set, saves a backup
/// of the current data and then writes the snapshot's values.
pub async fn import(
    config: &Config,
    source: ImportSource,
    yes: bool,
) -> Result<Out<ImportOutcome>> {
    import_with(config, source, |pending| {
        if yes {
            return Ok(true);
        }
        Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt(pending))
            .default(false)
            .interact()
            .context("Unable to read the confirmation")
    })
    .await
}

async fn import_with<F>(
    config: &Config,
    source: ImportSource,
    confirm: F,
) -> Result<Out<ImportOutcome>>
where
    F: FnOnce(&PendingImport) -> Result<bool>,
{
    let (pending, cleaned_link) = match source {
        ImportSource::File(path) => {
            let pending = stage_file(&path).await.pub_result(ErrorType::Import)?;
            (Some(pending), None)
        }
        ImportSource::Link(link) => {
            let url = Url::parse(link.trim())
                .with_context(|| format!("'{link}' is not a valid link"))
                .pub_result(ErrorType::Import)?;
            let pending = share::stage_link(url.as_str()).pub_result(ErrorType::Import)?;
            (pending, Some(share::strip_data_param(&url).to_string()))
        }
    };

    let mut outcome = ImportOutcome {
        report: None,
        backup: None,
        cleaned_link,
    };
    let Some(pending) = pending else {
        return Ok(Out::new("The link does not carry any data", outcome));
    };
    if pending.is_empty() {
        return Ok(Out::new(
            "The snapshot does not contain any data, nothing was changed",
            outcome,
        ));
    }

    if !confirm(&pending).pub_result(ErrorType::Io)? {
        info!("Import declined");
        return Ok(Out::new("Import cancelled, nothing was changed", outcome));
    }

    let current = Snapshot::build(config.store()).await;
    let backup = config
        .backup()
        .save_snapshot(PRE_IMPORT, &current)
        .await
        .context("Unable to back up the current data before importing")
        .pub_result(ErrorType::Io)?;
    debug!("Saved pre-import backup to {}", backup.display());

    let report = commit(config.store(), pending).await;
    if !report.is_complete() {
        let failed: Vec<String> = report.failed().iter().map(ToString::to_string).collect();
        return Err(anyhow!(
            "Unable to store {}. The data from before the import is in {}",
            failed.join(", "),
            backup.display()
        ))
        .pub_result(ErrorType::Storage);
    }

    let mut message = format!("Imported {}", key_list(&report));
    if report.reload_required() {
        message.push_str(". The next command will read the imported data");
    }
    if let Some(link) = &outcome.cleaned_link {
        let _ = write!(message, "\nOpen {link} to continue without re-importing");
    }
    outcome.report = Some(report);
    outcome.backup = Some(backup);
    Ok(Out::new(message, outcome))
}

fn prompt(pending: &PendingImport) -> String {
    let from = pending
        .taken_at()
        .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
        .or_else(|| pending.timestamp().map(str::to_string))
        .unwrap_or_else(|| "an unknown date".to_string());
    let keys: Vec<String> = pending.entries().iter().map(|(k, _)| k.to_string()).collect();
    format!(
        "Data from {from} will replace your {}. Continue?",
        keys.join(", ")
    )
}

fn key_list(report: &ImportReport) -> String {
    let keys: Vec<String> = report.written().iter().map(ToString::to_string).collect();
    keys.join(", ")
}
