//! Snapshot export and import.
//!
//! A `Snapshot` holds the raw stored string of every snapshot key plus a timestamp. It can be
//! written out as a JSON file or packed into a share link (see `share`). Importing is split in two
//! phases: staging parses and checks an incoming payload without touching storage and returns a
//! `PendingImport`; `commit` writes the staged values. A caller that decides not to import simply
//! drops the `PendingImport`.

pub mod share;

use crate::store::{Key, RecordStore};
use crate::{utils, Result};
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info, warn};

/// The name of the field that carries the export time. It is never merged back into storage.
pub const TIMESTAMP: &str = "timestamp";

/// Prefix of exported snapshot files.
pub const FILE_PREFIX: &str = "finance-planner-data";

/// Everything the application knows, as raw stored strings.
///
/// Collections appear doubly encoded: the `expenses` field holds the JSON text of the expense
/// array, not the array itself. A key that has never been written is `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    expenses: Option<String>,
    loans: Option<String>,
    total_income: Option<String>,
    theme: Option<String>,
    monthly_salary: Option<String>,
    #[serde(default)]
    side_incomes: Option<String>,
    timestamp: String,
}

impl Snapshot {
    /// Reads every snapshot key from `store` and stamps the result with the current time.
    pub async fn build(store: &RecordStore) -> Self {
        Self::build_at(store, Utc::now()).await
    }

    pub async fn build_at(store: &RecordStore, at: DateTime<Utc>) -> Self {
        let snapshot = Self {
            expenses: store.read_raw(Key::Expenses).await,
            loans: store.read_raw(Key::Loans).await,
            total_income: store.read_raw(Key::TotalIncome).await,
            theme: store.read_raw(Key::Theme).await,
            monthly_salary: store.read_raw(Key::MonthlySalary).await,
            side_incomes: store.read_raw(Key::SideIncomes).await,
            timestamp: utils::iso(at),
        };
        debug!("Built snapshot at {}", snapshot.timestamp);
        snapshot
    }

    /// The raw value captured for `key`.
    pub fn value(&self, key: Key) -> Option<&str> {
        match key {
            Key::Expenses => self.expenses.as_deref(),
            Key::Loans => self.loans.as_deref(),
            Key::TotalIncome => self.total_income.as_deref(),
            Key::Theme => self.theme.as_deref(),
            Key::MonthlySalary => self.monthly_salary.as_deref(),
            Key::SideIncomes => self.side_incomes.as_deref(),
        }
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).context("Unable to serialize the snapshot")
    }

    /// `finance-planner-data-<YYYY-MM-DD>.json`, dated by the snapshot's timestamp.
    pub fn file_name(&self) -> String {
        let date = self
            .timestamp
            .split('T')
            .next()
            .filter(|d| !d.is_empty())
            .map(str::to_string)
            .unwrap_or_else(utils::today);
        format!("{FILE_PREFIX}-{date}.json")
    }

    /// Writes the snapshot into `dir` under `file_name()` and returns the path.
    pub async fn export_file(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(self.file_name());
        utils::write(&path, self.to_json()?).await?;
        info!("Exported snapshot to {}", path.display());
        Ok(path)
    }
}

/// The ways an incoming snapshot can be rejected before anything is written.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("the share link is not a valid URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("the share link payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("the share link payload is not UTF-8 text")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("the snapshot is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("the snapshot must be a JSON object, found {0}")]
    NotAnObject(&'static str),
}

/// Why a field of an incoming snapshot was not staged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The export time, which is never stored.
    Timestamp,
    /// A field that is not part of the key namespace.
    UnknownKey,
    /// `null`, `false`, `0` or `""`: the source had nothing under this key.
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Skipped {
    field: String,
    reason: SkipReason,
}

impl Skipped {
    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn reason(&self) -> SkipReason {
        self.reason
    }
}

/// A parsed snapshot waiting for the user's decision. Nothing has been written yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingImport {
    entries: Vec<(Key, String)>,
    skipped: Vec<Skipped>,
    timestamp: Option<String>,
}

impl PendingImport {
    /// The values that `commit` will write, ordered by field name.
    pub fn entries(&self) -> &[(Key, String)] {
        &self.entries
    }

    pub fn skipped(&self) -> &[Skipped] {
        &self.skipped
    }

    /// The `timestamp` field as it appeared in the payload.
    pub fn timestamp(&self) -> Option<&str> {
        self.timestamp.as_deref()
    }

    /// The export time, if the payload carried a parseable one.
    pub fn taken_at(&self) -> Option<DateTime<Utc>> {
        let ts = self.timestamp.as_deref()?;
        DateTime::parse_from_rfc3339(ts)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn skip(&mut self, field: String, reason: SkipReason) {
        self.skipped.push(Skipped { field, reason });
    }
}

/// Parses snapshot JSON text and stages it.
pub fn stage_json(text: &str) -> std::result::Result<PendingImport, SnapshotError> {
    let value: Value = serde_json::from_str(text)?;
    stage_value(value)
}

/// Stages an already parsed snapshot. The value must be a JSON object.
pub fn stage_value(value: Value) -> std::result::Result<PendingImport, SnapshotError> {
    let object = match value {
        Value::Object(object) => object,
        Value::Array(_) => return Err(SnapshotError::NotAnObject("an array")),
        Value::String(_) => return Err(SnapshotError::NotAnObject("a string")),
        Value::Number(_) => return Err(SnapshotError::NotAnObject("a number")),
        Value::Bool(_) => return Err(SnapshotError::NotAnObject("a boolean")),
        Value::Null => return Err(SnapshotError::NotAnObject("null")),
    };

    let mut pending = PendingImport {
        entries: Vec::new(),
        skipped: Vec::new(),
        timestamp: None,
    };
    for (field, value) in object {
        if field == TIMESTAMP {
            if let Value::String(ts) = &value {
                pending.timestamp = Some(ts.clone());
            }
            pending.skip(field, SkipReason::Timestamp);
            continue;
        }
        let Ok(key) = Key::from_str(&field) else {
            warn!("Ignoring unknown snapshot field '{field}'");
            pending.skip(field, SkipReason::UnknownKey);
            continue;
        };
        match coerce(value) {
            Some(text) => pending.entries.push((key, text)),
            None => pending.skip(field, SkipReason::Empty),
        }
    }
    Ok(pending)
}

/// Reads a snapshot file and stages it.
pub async fn stage_file(path: &Path) -> Result<PendingImport> {
    let text = utils::read(path).await?;
    stage_json(&text).with_context(|| format!("Unable to import '{}'", path.display()))
}

/// Turns a snapshot field into the string to store. Falsy values yield `None`. Strings are kept
/// verbatim; anything else is stored as its JSON text.
fn coerce(value: Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

/// The outcome of `commit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    written: Vec<Key>,
    failed: Vec<Key>,
    skipped: Vec<Skipped>,
    timestamp: Option<String>,
}

impl ImportReport {
    pub fn written(&self) -> &[Key] {
        &self.written
    }

    /// Keys whose write could not be persisted.
    pub fn failed(&self) -> &[Key] {
        &self.failed
    }

    pub fn skipped(&self) -> &[Skipped] {
        &self.skipped
    }

    pub fn timestamp(&self) -> Option<&str> {
        self.timestamp.as_deref()
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// Anything holding state read before the import must read it again.
    pub fn reload_required(&self) -> bool {
        !self.written.is_empty()
    }
}

/// Writes every staged value into `store`, overwriting what is there.
///
/// Each key is written independently; a failed write is logged and reported but does not stop
/// the remaining keys.
pub async fn commit(store: &RecordStore, pending: PendingImport) -> ImportReport {
    let PendingImport {
        entries,
        skipped,
        timestamp,
    } = pending;
    let mut written = Vec::new();
    let mut failed = Vec::new();
    for (key, value) in entries {
        if store.write_raw(key, &value).await {
            written.push(key);
        } else {
            failed.push(key);
        }
    }
    info!(
        "Imported {} key(s) from snapshot{}",
        written.len(),
        timestamp
            .as_deref()
            .map(|t| format!(" taken at {t}"))
            .unwrap_or_default()
    );
    ImportReport {
        written,
        failed,
        skipped,
        timestamp,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Medium, MemoryMedium};
    use chrono::TimeZone;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    async fn seeded() -> (MemoryMedium, RecordStore) {
        let medium = MemoryMedium::new();
        medium
            .set_item(
                "expenses",
                r#"[{"id":"e1","description":"Rent","amount":"100","category":"Housing","date":"2025-01-01","notes":""}]"#,
            )
            .await
            .unwrap();
        medium.set_item("monthlySalary", "50000").await.unwrap();
        medium.set_item("totalIncome", "50000").await.unwrap();
        medium.set_item("theme", "ocean").await.unwrap();
        (medium.clone(), RecordStore::new(medium))
    }

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 9, 18, 4, 5).unwrap()
    }

    #[tokio::test]
    async fn test_build_captures_raw_strings() {
        let (_, store) = seeded().await;
        let snapshot = Snapshot::build_at(&store, at()).await;
        assert_eq!(snapshot.value(Key::MonthlySalary), Some("50000"));
        assert_eq!(snapshot.value(Key::Theme), Some("ocean"));
        assert_eq!(snapshot.value(Key::Loans), None);
        assert_eq!(snapshot.timestamp(), "2025-03-09T18:04:05.000Z");

        // Collections are carried as strings inside the outer object.
        let json: Value = serde_json::from_str(&snapshot.to_json().unwrap()).unwrap();
        assert!(json["expenses"].is_string());
        assert!(json["loans"].is_null());
        assert_eq!(json["totalIncome"], "50000");
    }

    #[tokio::test]
    async fn test_file_name_uses_snapshot_date() {
        let (_, store) = seeded().await;
        let snapshot = Snapshot::build_at(&store, at()).await;
        assert_eq!(snapshot.file_name(), "finance-planner-data-2025-03-09.json");
    }

    #[tokio::test]
    async fn test_export_file_writes_json() {
        let (_, store) = seeded().await;
        let snapshot = Snapshot::build_at(&store, at()).await;
        let dir = TempDir::new().unwrap();
        let path = snapshot.export_file(dir.path()).await.unwrap();
        assert!(path.ends_with("finance-planner-data-2025-03-09.json"));
        let text = utils::read(&path).await.unwrap();
        let back: Snapshot = serde_json::from_str(&text).unwrap();
        assert_eq!(back, snapshot);
    }

    #[tokio::test]
    async fn test_export_then_import_is_idempotent() {
        let (medium, store) = seeded().await;
        let before: BTreeMap<String, String> = medium.items().unwrap();

        let json = Snapshot::build(&store).await.to_json().unwrap();
        let pending = stage_json(&json).unwrap();
        let report = commit(&store, pending).await;

        assert!(report.is_complete());
        assert_eq!(medium.items().unwrap(), before);
    }

    #[tokio::test]
    async fn test_import_never_stores_timestamp() {
        let (medium, store) = seeded().await;
        let json = Snapshot::build_at(&store, at()).await.to_json().unwrap();

        let target = MemoryMedium::new();
        let target_store = RecordStore::new(target.clone());
        commit(&target_store, stage_json(&json).unwrap()).await;

        let items = target.items().unwrap();
        assert!(!items.contains_key(TIMESTAMP));
        assert!(items.values().all(|v| v != "2025-03-09T18:04:05.000Z"));
        assert_eq!(items, medium.items().unwrap());
    }

    #[tokio::test]
    async fn test_import_overwrites_existing_keys() {
        let (medium, store) = seeded().await;
        let pending =
            stage_json(r#"{"theme":"forest","monthlySalary":"60000","timestamp":"x"}"#).unwrap();
        let report = commit(&store, pending).await;
        assert_eq!(report.written(), &[Key::MonthlySalary, Key::Theme]);
        assert!(report.reload_required());
        assert_eq!(
            medium.get_item("theme").await.unwrap().as_deref(),
            Some("forest")
        );
        assert_eq!(
            medium.get_item("monthlySalary").await.unwrap().as_deref(),
            Some("60000")
        );
    }

    #[tokio::test]
    async fn test_malformed_payloads_change_nothing() {
        let (medium, _) = seeded().await;
        let before = medium.items().unwrap();

        assert!(matches!(
            stage_json("this is not json"),
            Err(SnapshotError::Json(_))
        ));
        assert!(matches!(
            stage_json(r#"[{"theme":"forest"}]"#),
            Err(SnapshotError::NotAnObject("an array"))
        ));
        assert!(matches!(
            stage_json(r#"{"theme":"forest""#),
            Err(SnapshotError::Json(_))
        ));

        assert_eq!(medium.items().unwrap(), before);
    }

    #[test]
    fn test_stage_skips_falsy_unknown_and_timestamp() {
        let pending = stage_json(
            r#"{"expenses":null,"loans":"","totalIncome":0,"theme":false,"colour":"red","timestamp":"2025-03-09T18:04:05.000Z","monthlySalary":"1"}"#,
        )
        .unwrap();
        assert_eq!(
            pending.entries(),
            &[(Key::MonthlySalary, "1".to_string())]
        );
        let reasons: Vec<(&str, SkipReason)> = pending
            .skipped()
            .iter()
            .map(|s| (s.field(), s.reason()))
            .collect();
        assert!(reasons.contains(&("expenses", SkipReason::Empty)));
        assert!(reasons.contains(&("loans", SkipReason::Empty)));
        assert!(reasons.contains(&("totalIncome", SkipReason::Empty)));
        assert!(reasons.contains(&("theme", SkipReason::Empty)));
        assert!(reasons.contains(&("colour", SkipReason::UnknownKey)));
        assert!(reasons.contains(&("timestamp", SkipReason::Timestamp)));
        assert_eq!(pending.taken_at(), Some(at()));
    }

    #[test]
    fn test_stage_coerces_non_strings() {
        let pending =
            stage_json(r#"{"totalIncome":55000,"loans":[{"amount":500}],"theme":true}"#).unwrap();
        let entries: BTreeMap<Key, String> = pending.entries().iter().cloned().collect();
        assert_eq!(entries[&Key::TotalIncome], "55000");
        assert_eq!(entries[&Key::Loans], r#"[{"amount":500}]"#);
        assert_eq!(entries[&Key::Theme], "true");
    }

    #[tokio::test]
    async fn test_unexpected_shape_is_written_and_read_soft() {
        let store = RecordStore::new(MemoryMedium::new());
        let pending = stage_json(r#"{"expenses":"not an array"}"#).unwrap();
        let report = commit(&store, pending).await;
        assert_eq!(report.written(), &[Key::Expenses]);

        let expenses: Vec<crate::model::Expense> = store.read(Key::Expenses).await;
        assert!(expenses.is_empty());
    }

    #[tokio::test]
    async fn test_declined_import_writes_nothing() {
        let (medium, _) = seeded().await;
        let before = medium.items().unwrap();
        let pending = stage_json(r#"{"theme":"forest"}"#).unwrap();
        drop(pending);
        assert_eq!(medium.items().unwrap(), before);
    }

    #[tokio::test]
    async fn test_commit_reports_failed_writes() {
        let medium = MemoryMedium::with_quota(20);
        let store = RecordStore::new(medium.clone());
        let pending =
            stage_json(r#"{"theme":"forest","expenses":"[{\"amount\":\"100\"}]"}"#).unwrap();
        let report = commit(&store, pending).await;
        assert_eq!(report.written(), &[Key::Theme]);
        assert_eq!(report.failed(), &[Key::Expenses]);
        assert!(!report.is_complete());
    }

    #[tokio::test]
    async fn test_stage_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("in.json");
        utils::write(&path, r#"{"theme":"sunset","timestamp":"t"}"#)
            .await
            .unwrap();
        let pending = stage_file(&path).await.unwrap();
        assert_eq!(pending.entries(), &[(Key::Theme, "sunset".to_string())]);
        assert_eq!(pending.timestamp(), Some("t"));
        assert!(pending.taken_at().is_none());

        assert!(stage_file(&dir.path().join("missing.json")).await.is_err());
    }
}
