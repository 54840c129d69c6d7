use crate::args::{LoanArgs, LoanUpdateArgs};
use crate::commands::Out;
use crate::model::{format_money, Loan, LoanDraft};
use crate::{Config, Result};
use std::fmt::Write;

pub async fn loan_add(config: &Config, args: LoanArgs) -> Result<Out<Loan>> {
    let draft = LoanDraft {
        name: args.name,
        amount: args.amount,
        interest_rate: args.interest_rate,
        start_date: args.start_date,
    };
    let loan = config.ledger().add_loan(draft).await?;
    Ok(Out::new(
        format!(
            "Added loan {} for {}",
            loan.id(),
            format_money(loan.amount().value(), config.currency_symbol())
        ),
        loan,
    ))
}

pub async fn loan_list(config: &Config) -> Result<Out<Vec<Loan>>> {
    let loans = config.ledger().loans().await;
    if loans.is_empty() {
        return Ok(Out::new("No loans recorded", loans));
    }
    let mut message = format!("{} loan(s):", loans.len());
    for l in &loans {
        let rate = l
            .interest_rate()
            .map(|r| format!("{r}%"))
            .unwrap_or_else(|| "-".to_string());
        let _ = write!(
            message,
            "\n  {}  {}  {:>14}  {:>7}  {}",
            l.id(),
            l.start_date(),
            format_money(l.amount().value(), config.currency_symbol()),
            rate,
            l.name()
        );
    }
    Ok(Out::new(message, loans))
}

/// Applies the fields given in `args` on top of the stored loan.
pub async fn loan_update(config: &Config, args: LoanUpdateArgs) -> Result<Out<Loan>> {
    let ledger = config.ledger();
    let current = ledger.loans().await.into_iter().find(|l| l.id() == args.id);
    let draft = match current {
        Some(l) => LoanDraft {
            name: args.name.unwrap_or_else(|| l.name().to_string()),
            amount: args.amount.unwrap_or_else(|| l.amount().clone()),
            interest_rate: args.interest_rate.or_else(|| l.interest_rate().cloned()),
            start_date: args.start_date,
        },
        None => LoanDraft::default(),
    };
    let loan = ledger.update_loan(&args.id, draft).await?;
    Ok(Out::new(format!("Updated loan {}", loan.id()), loan))
}

pub async fn loan_delete(config: &Config, id: &str) -> Result<Out<Loan>> {
    let loan = config.ledger().delete_loan(id).await?;
    Ok(Out::new(format!("Deleted loan {}", loan.id()), loan))
}
