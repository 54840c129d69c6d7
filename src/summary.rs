//! The dashboard figures: totals, spending by category, savings rate and recent activity.

use crate::model::{saturating_sum, Category, Expense, Loan};
use chrono::{DateTime, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use std::cmp::Ordering;
use tracing::warn;

/// How many entries `Summary::recent` holds at most.
pub const RECENT_LIMIT: usize = 5;

/// Spending for one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: Category,
    pub total: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Expense,
    Loan,
}

serde_plain::derive_display_from_serialize!(EntryKind);

/// An expense or loan as shown in the recent activity list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentEntry {
    pub kind: EntryKind,
    pub id: String,
    /// The expense description or the loan name.
    pub label: String,
    pub amount: Decimal,
    /// The expense date or the loan start date, as stored.
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total_income: Decimal,
    pub total_expenses: Decimal,
    pub total_loans: Decimal,
    /// In the order each category first appears among the expenses.
    pub expenses_by_category: Vec<CategoryTotal>,
    /// Percentage of income left after expenses, to one decimal place. Zero when there is no
    /// income.
    pub savings_rate: Decimal,
    pub recent: Vec<RecentEntry>,
}

impl Summary {
    pub fn compute(expenses: &[Expense], loans: &[Loan], total_income: Decimal) -> Self {
        let total_expenses = saturating_sum(expenses.iter().map(|e| e.amount().value()));
        let total_loans = saturating_sum(loans.iter().map(|l| l.amount().value()));
        Self {
            total_income,
            total_expenses,
            total_loans,
            expenses_by_category: by_category(expenses),
            savings_rate: savings_rate(total_income, total_expenses),
            recent: recent(expenses, loans),
        }
    }
}

fn by_category(expenses: &[Expense]) -> Vec<CategoryTotal> {
    let mut totals: Vec<CategoryTotal> = Vec::new();
    for expense in expenses {
        let category = expense.category().bucket();
        let amount = expense.amount().value();
        match totals.iter_mut().find(|t| t.category == category) {
            Some(existing) => existing.total = existing.total.saturating_add(amount),
            None => totals.push(CategoryTotal {
                category,
                total: amount,
            }),
        }
    }
    totals
}

fn savings_rate(income: Decimal, expenses: Decimal) -> Decimal {
    if income <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let left = income.saturating_sub(expenses);
    match left
        .checked_div(income)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
    {
        Some(rate) => rate.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero),
        None => {
            warn!("The savings rate for income {income} and expenses {expenses} is out of range");
            if left.is_sign_negative() {
                Decimal::MIN
            } else {
                Decimal::MAX
            }
        }
    }
}

fn recent(expenses: &[Expense], loans: &[Loan]) -> Vec<RecentEntry> {
    let mut entries: Vec<RecentEntry> = expenses
        .iter()
        .map(|e| RecentEntry {
            kind: EntryKind::Expense,
            id: e.id().to_string(),
            label: e.description().to_string(),
            amount: e.amount().value(),
            date: e.date().to_string(),
        })
        .chain(loans.iter().map(|l| RecentEntry {
            kind: EntryKind::Loan,
            id: l.id().to_string(),
            label: l.name().to_string(),
            amount: l.amount().value(),
            date: l.start_date().to_string(),
        }))
        .collect();
    // Stable, so entries on the same date keep expenses-then-loans order.
    entries.sort_by(|a, b| newest_first(parse_date(&a.date), parse_date(&b.date)));
    entries.truncate(RECENT_LIMIT);
    entries
}

fn newest_first(a: Option<NaiveDate>, b: Option<NaiveDate>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp.
fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|t| t.date_naive()))
}
