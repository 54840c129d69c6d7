use crate::model::Amount;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A single loan as stored under the `loans` key.
///
/// Only the fields the planner computes with are named. Everything else the loan form recorded
/// (tenure, lender, EMI figures and so on) lives in `other_fields` and is written back untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Loan {
    #[serde(default)]
    pub(crate) id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) amount: Amount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) interest_rate: Option<Amount>,
    #[serde(default)]
    pub(crate) start_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) created_at: Option<String>,
    #[serde(flatten)]
    pub(crate) other_fields: BTreeMap<String, Value>,
}

impl Loan {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn amount(&self) -> &Amount {
        &self.amount
    }

    pub fn interest_rate(&self) -> Option<&Amount> {
        self.interest_rate.as_ref()
    }

    pub fn start_date(&self) -> &str {
        &self.start_date
    }

    pub fn created_at(&self) -> Option<&str> {
        self.created_at.as_deref()
    }

    pub fn other_fields(&self) -> &BTreeMap<String, Value> {
        &self.other_fields
    }
}

/// The user-editable fields of a loan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoanDraft {
    pub name: String,
    pub amount: Amount,
    pub interest_rate: Option<Amount>,
    /// Defaults to today when `None`.
    pub start_date: Option<String>,
}
