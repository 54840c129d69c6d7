use crate::args::{ExpenseArgs, ExpenseUpdateArgs};
use crate::commands::Out;
use crate::model::{format_money, Expense, ExpenseDraft};
use crate::{Config, Result};
use std::fmt::Write;

pub async fn expense_add(config: &Config, args: ExpenseArgs) -> Result<Out<Expense>> {
    let draft = ExpenseDraft {
        description: args.description,
        amount: args.amount,
        category: args.category,
        date: args.date,
        notes: args.notes,
    };
    let expense = config.ledger().add_expense(draft).await?;
    Ok(Out::new(
        format!(
            "Added expense {} for {}",
            expense.id(),
            format_money(expense.amount().value(), config.currency_symbol())
        ),
        expense,
    ))
}

pub async fn expense_list(config: &Config) -> Result<Out<Vec<Expense>>> {
    let expenses = config.ledger().expenses().await;
    if expenses.is_empty() {
        return Ok(Out::new("No expenses recorded", expenses));
    }
    let mut message = format!("{} expense(s):", expenses.len());
    for e in &expenses {
        let _ = write!(
            message,
            "\n  {}  {}  {:>14}  {:<14}  {}",
            e.id(),
            e.date(),
            format_money(e.amount().value(), config.currency_symbol()),
            e.category().bucket(),
            e.description()
        );
    }
    Ok(Out::new(message, expenses))
}

/// Applies the fields given in `args` on top of the stored expense.
pub async fn expense_update(config: &Config, args: ExpenseUpdateArgs) -> Result<Out<Expense>> {
    let ledger = config.ledger();
    let current = ledger
        .expenses()
        .await
        .into_iter()
        .find(|e| e.id() == args.id);
    let draft = match current {
        Some(e) => ExpenseDraft {
            description: args.description.unwrap_or_else(|| e.description().to_string()),
            amount: args.amount.unwrap_or_else(|| e.amount().clone()),
            category: args.category.unwrap_or_else(|| e.category().clone()),
            date: args.date,
            notes: args.notes.unwrap_or_else(|| e.notes().to_string()),
        },
        // Let the ledger report the unknown id.
        None => ExpenseDraft::default(),
    };
    let expense = ledger.update_expense(&args.id, draft).await?;
    Ok(Out::new(format!("Updated expense {}", expense.id()), expense))
}

pub async fn expense_delete(config: &Config, id: &str) -> Result<Out<Expense>> {
    let expense = config.ledger().delete_expense(id).await?;
    Ok(Out::new(
        format!("Deleted expense {} ({})", expense.id(), expense.description()),
        expense,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Category;
    use crate::test::TestEnv;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    #[tokio::test]
    async fn test_expense_commands() {
        let env = TestEnv::new().await;
        let config = env.config();
        let added = expense_add(
            &config,
            ExpenseArgs {
                description: "Bus".to_string(),
                amount: "250.50".parse().unwrap(),
                category: Category::Transportation,
                date: Some("2025-02-01".to_string()),
                notes: String::new(),
            },
        )
        .await
        .unwrap();
        assert!(added.message().contains("₹250.50"));
        let id = added.structure().unwrap().id().to_string();

        let updated = expense_update(
            &config,
            ExpenseUpdateArgs {
                id: id.clone(),
                description: None,
                amount: Some("300".parse().unwrap()),
                category: None,
                date: None,
                notes: Some("monthly pass".to_string()),
            },
        )
        .await
        .unwrap();
        let updated = updated.structure().unwrap();
        assert_eq!(updated.description(), "Bus");
        assert_eq!(updated.amount().value(), Decimal::from_str("300").unwrap());
        assert_eq!(updated.category(), &Category::Transportation);
        assert_eq!(updated.date(), "2025-02-01");
        assert_eq!(updated.notes(), "monthly pass");

        let listed = expense_list(&config).await.unwrap();
        assert_eq!(listed.structure().unwrap().len(), 1);
        assert!(listed.message().contains(&id));

        expense_delete(&config, &id).await.unwrap();
        assert!(expense_delete(&config, &id).await.is_err());
        let listed = expense_list(&config).await.unwrap();
        assert_eq!(listed.message(), "No expenses recorded");
    }

    #[tokio::test]
    async fn test_update_unknown_expense_fails() {
        let env = TestEnv::new().await;
        let result = expense_update(
            &env.config(),
            ExpenseUpdateArgs {
                id: "missing".to_string(),
                description: None,
                amount: None,
                category: None,
                date: None,
                notes: None,
            },
        )
        .await;
        assert!(result.is_err());
    }
}
