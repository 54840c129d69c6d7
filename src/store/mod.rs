//! The Record Store: durable reads and writes of named values.
//!
//! Every piece of application data lives under one of a fixed set of string keys (`Key`) in a
//! string-keyed, string-valued storage medium (`Medium`). `RecordStore` is the only thing that
//! talks to the medium; everything else receives a `RecordStore` and never sees the medium.
//!
//! Reads and writes fail soft. A read that cannot produce a value returns the type's default and
//! logs a warning. A write that cannot be persisted logs an error and reports `false`. There are
//! no transactions across keys and no locking: the last write to a key wins.

mod memory;
mod sqlite;

pub use memory::MemoryMedium;
pub use sqlite::SqliteMedium;

use crate::model::parse_leading_decimal;
use crate::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::sync::Arc;
use tracing::{error, trace, warn};

/// The fixed key namespace of the application.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum Key {
    /// JSON array of `Expense`.
    Expenses,
    /// JSON array of `Loan`.
    Loans,
    /// Cached salary plus side incomes, as a numeric string.
    TotalIncome,
    /// The selected theme, as a plain string.
    Theme,
    /// The monthly salary, as a numeric string.
    MonthlySalary,
    /// JSON array of `SideIncome`.
    SideIncomes,
}

serde_plain::derive_display_from_serialize!(Key);
serde_plain::derive_fromstr_from_deserialize!(Key);

impl Key {
    pub const ALL: [Key; 6] = [
        Key::Expenses,
        Key::Loans,
        Key::TotalIncome,
        Key::Theme,
        Key::MonthlySalary,
        Key::SideIncomes,
    ];

    /// The string under which the value is stored in the medium.
    pub fn as_str(&self) -> &'static str {
        match self {
            Key::Expenses => "expenses",
            Key::Loans => "loans",
            Key::TotalIncome => "totalIncome",
            Key::Theme => "theme",
            Key::MonthlySalary => "monthlySalary",
            Key::SideIncomes => "sideIncomes",
        }
    }
}

/// A durable, string-keyed storage medium. Each `set_item` is atomic for its key.
#[async_trait]
pub trait Medium: Debug + Send + Sync {
    /// Returns the stored string, or `None` if the key has never been written.
    async fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    async fn set_item(&self, key: &str, value: &str) -> Result<()>;
}

/// The persistence service injected into every consumer of application data.
///
/// Cloning a `RecordStore` yields another handle onto the same medium.
#[derive(Debug, Clone)]
pub struct RecordStore {
    medium: Arc<dyn Medium>,
}

impl RecordStore {
    pub fn new<M>(medium: M) -> Self
    where
        M: Medium + 'static,
    {
        Self {
            medium: Arc::new(medium),
        }
    }

    pub fn from_arc(medium: Arc<dyn Medium>) -> Self {
        Self { medium }
    }

    /// Returns the raw stored string for `key`. `None` means the key was never written or the
    /// medium could not be read.
    pub async fn read_raw(&self, key: Key) -> Option<String> {
        match self.medium.get_item(key.as_str()).await {
            Ok(value) => value,
            Err(e) => {
                warn!("Unable to read '{key}' from storage: {e:#}");
                None
            }
        }
    }

    /// Reads and deserializes the JSON value stored under `key`. Returns `T::default()` when the
    /// key is missing or its contents cannot be deserialized.
    pub async fn read<T>(&self, key: Key) -> T
    where
        T: DeserializeOwned + Default,
    {
        let Some(raw) = self.read_raw(key).await else {
            trace!("'{key}' has not been written, using the default");
            return T::default();
        };
        match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                warn!("The value stored under '{key}' could not be parsed, using the default: {e}");
                T::default()
            }
        }
    }

    /// Reads a numeric scalar. Missing or unparsable values read as zero.
    pub async fn read_decimal(&self, key: Key) -> Decimal {
        self.read_raw(key)
            .await
            .and_then(|raw| parse_leading_decimal(&raw))
            .unwrap_or_default()
    }

    /// Serializes `value` as JSON and stores it under `key`. Returns `false`, after logging, if
    /// the value could not be persisted.
    pub async fn write<T>(&self, key: Key, value: &T) -> bool
    where
        T: Serialize + ?Sized + Sync,
    {
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                error!("Unable to serialize the value for '{key}': {e}");
                return false;
            }
        };
        self.write_raw(key, &json).await
    }

    /// Stores `value` under `key` verbatim.
    pub async fn write_raw(&self, key: Key, value: &str) -> bool {
        match self.medium.set_item(key.as_str(), value).await {
            Ok(()) => {
                trace!("Wrote {} bytes to '{key}'", value.len());
                true
            }
            Err(e) => {
                error!("Unable to write '{key}' to storage: {e:#}");
                false
            }
        }
    }

    /// Stores a numeric scalar in its shortest text form, e.g. `55000` or `55000.5`.
    pub async fn write_decimal(&self, key: Key, value: Decimal) -> bool {
        self.write_raw(key, &value.normalize().to_string()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Expense, Loan, SideIncome};
    use std::str::FromStr;

    fn store() -> (MemoryMedium, RecordStore) {
        let medium = MemoryMedium::new();
        (medium.clone(), RecordStore::new(medium))
    }

    #[test]
    fn test_key_text_forms() {
        for key in Key::ALL {
            assert_eq!(key.to_string(), key.as_str());
            assert_eq!(Key::from_str(key.as_str()).unwrap(), key);
        }
        assert!(Key::from_str("timestamp").is_err());
    }

    #[tokio::test]
    async fn test_write_then_read_collection() {
        let (_, store) = store();
        let expenses: Vec<Expense> = serde_json::from_str(
            r#"[{"id":"1","description":"Rent","amount":"100","category":"Housing","date":"2025-01-01","notes":""},
                {"id":"2","description":"Bus","amount":250.5,"category":"Transportation","date":"2025-01-02","notes":"x"}]"#,
        )
        .unwrap();
        assert!(store.write(Key::Expenses, &expenses).await);
        let read: Vec<Expense> = store.read(Key::Expenses).await;
        assert_eq!(read, expenses);
    }

    #[tokio::test]
    async fn test_read_never_written_is_default() {
        let (_, store) = store();
        let expenses: Vec<Expense> = store.read(Key::Expenses).await;
        let loans: Vec<Loan> = store.read(Key::Loans).await;
        let incomes: Vec<SideIncome> = store.read(Key::SideIncomes).await;
        assert!(expenses.is_empty());
        assert!(loans.is_empty());
        assert!(incomes.is_empty());
        assert!(store.read_raw(Key::Theme).await.is_none());
        assert_eq!(store.read_decimal(Key::MonthlySalary).await, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_read_corrupt_value_is_default() {
        let (medium, store) = store();
        medium.set_item("expenses", "{not json").await.unwrap();
        let expenses: Vec<Expense> = store.read(Key::Expenses).await;
        assert!(expenses.is_empty());

        // An object where an array is expected is just as unreadable.
        medium.set_item("loans", r#"{"amount":1}"#).await.unwrap();
        let loans: Vec<Loan> = store.read(Key::Loans).await;
        assert!(loans.is_empty());
    }

    #[tokio::test]
    async fn test_decimal_scalars() {
        let (medium, store) = store();
        assert!(store.write_decimal(Key::TotalIncome, Decimal::new(5500000, 2)).await);
        assert_eq!(
            medium.get_item("totalIncome").await.unwrap().as_deref(),
            Some("55000")
        );
        assert_eq!(
            store.read_decimal(Key::TotalIncome).await,
            Decimal::from(55000)
        );

        medium.set_item("monthlySalary", "abc").await.unwrap();
        assert_eq!(store.read_decimal(Key::MonthlySalary).await, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_write_failure_is_reported_not_raised() {
        let medium = MemoryMedium::with_quota(16);
        let store = RecordStore::new(medium.clone());
        assert!(store.write_raw(Key::Theme, "ocean").await);
        assert!(!store.write_raw(Key::Expenses, "[1,2,3,4,5,6,7,8,9]").await);
        assert!(medium.get_item("expenses").await.unwrap().is_none());
        assert_eq!(store.read_raw(Key::Theme).await.as_deref(), Some("ocean"));
    }

    #[tokio::test]
    async fn test_last_writer_wins_across_handles() {
        let medium = MemoryMedium::new();
        let tab_a = RecordStore::new(medium.clone());
        let tab_b = RecordStore::new(medium.clone());

        let a: Vec<SideIncome> = vec![SideIncome::new(Decimal::from(1).into(), "a")];
        let b: Vec<SideIncome> = vec![SideIncome::new(Decimal::from(2).into(), "b")];
        assert!(tab_a.write(Key::SideIncomes, &a).await);
        assert!(tab_b.write(Key::SideIncomes, &b).await);

        let seen_by_a: Vec<SideIncome> = tab_a.read(Key::SideIncomes).await;
        assert_eq!(seen_by_a, b);
    }
}
