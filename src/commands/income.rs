use crate::commands::Out;
use crate::model::{format_money, Amount, SideIncome};
use crate::{Config, Result};
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt::Write;

/// The salary together with the income derived from it.
#[derive(Debug, Clone, Serialize)]
pub struct Income {
    pub monthly_salary: Decimal,
    pub total_income: Decimal,
}

pub async fn salary_show(config: &Config) -> Result<Out<Income>> {
    let ledger = config.ledger();
    let income = Income {
        monthly_salary: ledger.monthly_salary().await,
        total_income: ledger.total_income().await,
    };
    Ok(Out::new(
        income_message(config, "Monthly salary", &income),
        income,
    ))
}

pub async fn salary_set(config: &Config, salary: Decimal) -> Result<Out<Income>> {
    let total_income = config.ledger().set_monthly_salary(salary).await?;
    let income = Income {
        monthly_salary: salary,
        total_income,
    };
    Ok(Out::new(
        income_message(config, "Monthly salary set to", &income),
        income,
    ))
}

pub async fn side_income_add(
    config: &Config,
    amount: Amount,
    source: &str,
) -> Result<Out<Decimal>> {
    let total = config
        .ledger()
        .add_side_income(SideIncome::new(amount, source))
        .await?;
    Ok(Out::new(
        format!(
            "Added side income, total income is now {}",
            format_money(total, config.currency_symbol())
        ),
        total,
    ))
}

pub async fn side_income_list(config: &Config) -> Result<Out<Vec<SideIncome>>> {
    let incomes = config.ledger().side_incomes().await;
    if incomes.is_empty() {
        return Ok(Out::new("No side incomes recorded", incomes));
    }
    let mut message = format!("{} side income(s):", incomes.len());
    for (i, income) in incomes.iter().enumerate() {
        let _ = write!(
            message,
            "\n  {:>3}. {:>14}  {}",
            i + 1,
            format_money(income.amount().value(), config.currency_symbol()),
            income.source()
        );
    }
    Ok(Out::new(message, incomes))
}

/// Removes the side income at `position`, counted from 1 as `side_income_list` shows them.
pub async fn side_income_remove(config: &Config, position: u32) -> Result<Out<SideIncome>> {
    let index = (position as usize).saturating_sub(1);
    let (removed, total) = config.ledger().remove_side_income(index).await?;
    Ok(Out::new(
        format!(
            "Removed side income {position}, total income is now {}",
            format_money(total, config.currency_symbol())
        ),
        removed,
    ))
}

fn income_message(config: &Config, label: &str, income: &Income) -> String {
    format!(
        "{label} {}, total income {}",
        format_money(income.monthly_salary, config.currency_symbol()),
        format_money(income.total_income, config.currency_symbol())
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_salary_and_side_incomes() {
        let env = TestEnv::new().await;
        let config = env.config();

        let out = salary_set(&config, Decimal::from(50000)).await.unwrap();
        assert_eq!(out.structure().unwrap().total_income, Decimal::from(50000));
        assert_eq!(
            out.message(),
            "Monthly salary set to ₹50,000.00, total income ₹50,000.00"
        );

        let out = side_income_add(&config, "5000".parse().unwrap(), "Tutoring")
            .await
            .unwrap();
        assert_eq!(out.structure(), Some(&Decimal::from(55000)));

        let shown = salary_show(&config).await.unwrap();
        assert_eq!(shown.structure().unwrap().total_income, Decimal::from(55000));

        let listed = side_income_list(&config).await.unwrap();
        assert!(listed.message().contains("₹5,000.00  Tutoring"));

        let removed = side_income_remove(&config, 1).await.unwrap();
        assert_eq!(removed.structure().unwrap().source(), "Tutoring");
        assert!(side_income_remove(&config, 1).await.is_err());
        let shown = salary_show(&config).await.unwrap();
        assert_eq!(shown.structure().unwrap().total_income, Decimal::from(50000));
    }
}
