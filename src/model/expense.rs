use crate::model::Amount;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// The spending categories offered when an expense is entered.
///
/// Values read from storage are not validated, so a category that is not one of the known ones
/// is kept as `Custom` and written back unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Food,
    Transportation,
    Housing,
    Utilities,
    Loans,
    #[default]
    Other,
    Custom(String),
}

impl Category {
    /// The categories offered for new expenses, in display order.
    pub const KNOWN: [Category; 6] = [
        Category::Food,
        Category::Transportation,
        Category::Housing,
        Category::Utilities,
        Category::Loans,
        Category::Other,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Category::Food => "Food",
            Category::Transportation => "Transportation",
            Category::Housing => "Housing",
            Category::Utilities => "Utilities",
            Category::Loans => "Loans",
            Category::Other => "Other",
            Category::Custom(s) => s.as_str(),
        }
    }

    /// The bucket used when grouping totals: an empty category counts as `Other`.
    pub fn bucket(&self) -> Category {
        match self {
            Category::Custom(s) if s.is_empty() => Category::Other,
            other => other.clone(),
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Category::Custom(_))
    }
}

impl FromStr for Category {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Category::KNOWN
            .iter()
            .find(|c| c.as_str() == s)
            .cloned()
            .unwrap_or_else(|| Category::Custom(s.to_string())))
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl Serialize for Category {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        // Infallible
        Ok(Category::from_str(&s).unwrap_or_default())
    }
}

/// A single expense as stored under the `expenses` key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    #[serde(default)]
    pub(crate) id: String,
    #[serde(default)]
    pub(crate) description: String,
    #[serde(default)]
    pub(crate) amount: Amount,
    #[serde(default)]
    pub(crate) category: Category,
    #[serde(default)]
    pub(crate) date: String,
    #[serde(default)]
    pub(crate) notes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) created_at: Option<String>,
    /// Fields this version does not know about, preserved on round trip.
    #[serde(flatten)]
    pub(crate) other_fields: BTreeMap<String, Value>,
}

impl Expense {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn amount(&self) -> &Amount {
        &self.amount
    }

    pub fn category(&self) -> &Category {
        &self.category
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    pub fn created_at(&self) -> Option<&str> {
        self.created_at.as_deref()
    }
}

/// The user-editable fields of an expense, used for both adding and updating.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpenseDraft {
    pub description: String,
    pub amount: Amount,
    pub category: Category,
    /// Defaults to today when `None`.
    pub date: Option<String>,
    pub notes: String,
}
