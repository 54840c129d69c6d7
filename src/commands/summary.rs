use crate::commands::Out;
use crate::model::format_money;
use crate::summary::Summary;
use crate::{Config, Result};
use std::fmt::Write;

/// Recomputes the total income, as the dashboard does whenever it is opened, then reports the
/// figures derived from the stored records.
pub async fn summary(config: &Config) -> Result<Out<Summary>> {
    let ledger = config.ledger();
    let total_income = ledger.recompute_total_income().await?;
    let expenses = ledger.expenses().await;
    let loans = ledger.loans().await;
    let summary = Summary::compute(&expenses, &loans, total_income);

    let symbol = config.currency_symbol();
    let mut message = format!(
        "Total income:   {}\nTotal expenses: {}\nTotal loans:    {}\nSavings rate:   {}%",
        format_money(summary.total_income, symbol),
        format_money(summary.total_expenses, symbol),
        format_money(summary.total_loans, symbol),
        summary.savings_rate,
    );
    if !summary.expenses_by_category.is_empty() {
        message.push_str("\n\nExpenses by category:");
        for t in &summary.expenses_by_category {
            let _ = write!(
                message,
                "\n  {:<16}{:>14}",
                t.category,
                format_money(t.total, symbol)
            );
        }
    }
    if !summary.recent.is_empty() {
        message.push_str("\n\nRecent activity:");
        for r in &summary.recent {
            let _ = write!(
                message,
                "\n  {:<10} {:<8}{:>14}  {}",
                r.date,
                r.kind.to_string(),
                format_money(r.amount, symbol),
                r.label
            );
        }
    }
    Ok(Out::new(message, summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Key;
    use crate::test::TestEnv;
    use rust_decimal::Decimal;

    #[tokio::test]
    async fn test_summary_recomputes_income() {
        let env = TestEnv::new().await;
        env.seed().await;
        let config = env.config();
        // A stale cached value is replaced.
        assert!(config.store().write_raw(Key::TotalIncome, "1").await);

        let out = summary(&config).await.unwrap();
        let s = out.structure().unwrap();
        assert_eq!(s.total_income, Decimal::from(55000));
        assert_eq!(s.total_expenses, Decimal::new(35050, 2));
        assert_eq!(s.total_loans, Decimal::from(500));
        assert_eq!(s.recent.len(), 3);
        assert_eq!(s.recent[0].id, "e2");
        assert_eq!(
            config.store().read_raw(Key::TotalIncome).await.as_deref(),
            Some("55000")
        );
        assert!(out.message().contains("Total loans:    ₹500.00"));
    }

    #[tokio::test]
    async fn test_summary_of_empty_store() {
        let env = TestEnv::new().await;
        let out = summary(&env.config()).await.unwrap();
        let s = out.structure().unwrap();
        assert_eq!(s.total_income, Decimal::ZERO);
        assert_eq!(s.savings_rate, Decimal::ZERO);
        assert!(s.recent.is_empty());
    }
}
