//! Page-level operations on the planner's records.
//!
//! A `Ledger` holds no state of its own. Every operation reads the collection it needs from the
//! `RecordStore`, changes it and writes the whole collection back, so the store is always the
//! source of truth and a reload after an import needs nothing more than the next call.

use crate::error::{ErrorType, IntoResult};
use crate::model::{total_income, Expense, ExpenseDraft, Loan, LoanDraft, SideIncome};
use crate::store::{Key, RecordStore};
use crate::{utils, Result};
use anyhow::anyhow;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct Ledger {
    store: RecordStore,
}

impl Ledger {
    pub fn new(store: RecordStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub async fn expenses(&self) -> Vec<Expense> {
        self.store.read(Key::Expenses).await
    }

    /// Appends a new expense with a fresh id and creation time. Returns the stored record.
    pub async fn add_expense(&self, draft: ExpenseDraft) -> Result<Expense> {
        let mut expenses = self.expenses().await;
        let expense = Expense {
            id: new_id(),
            description: draft.description,
            amount: draft.amount,
            category: draft.category,
            date: draft.date.unwrap_or_else(utils::today),
            notes: draft.notes,
            created_at: Some(utils::iso_now()),
            other_fields: Default::default(),
        };
        expenses.push(expense.clone());
        self.save(Key::Expenses, &expenses).await?;
        debug!("Added expense {}", expense.id);
        Ok(expense)
    }

    /// Replaces the editable fields of the expense with `id`. The id, creation time and any
    /// fields this program does not know about are kept.
    pub async fn update_expense(&self, id: &str, draft: ExpenseDraft) -> Result<Expense> {
        let mut expenses = self.expenses().await;
        let expense = expenses
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| anyhow!("No expense with id '{id}'"))
            .pub_result(ErrorType::Input)?;
        expense.description = draft.description;
        expense.amount = draft.amount;
        expense.category = draft.category;
        if let Some(date) = draft.date {
            expense.date = date;
        }
        expense.notes = draft.notes;
        let updated = expense.clone();
        self.save(Key::Expenses, &expenses).await?;
        Ok(updated)
    }

    pub async fn delete_expense(&self, id: &str) -> Result<Expense> {
        let mut expenses = self.expenses().await;
        let index = expenses
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| anyhow!("No expense with id '{id}'"))
            .pub_result(ErrorType::Input)?;
        let removed = expenses.remove(index);
        self.save(Key::Expenses, &expenses).await?;
        Ok(removed)
    }

    pub async fn loans(&self) -> Vec<Loan> {
        self.store.read(Key::Loans).await
    }

    pub async fn add_loan(&self, draft: LoanDraft) -> Result<Loan> {
        let mut loans = self.loans().await;
        let loan = Loan {
            id: new_id(),
            name: draft.name,
            amount: draft.amount,
            interest_rate: draft.interest_rate,
            start_date: draft.start_date.unwrap_or_else(utils::today),
            created_at: Some(utils::iso_now()),
            other_fields: Default::default(),
        };
        loans.push(loan.clone());
        self.save(Key::Loans, &loans).await?;
        debug!("Added loan {}", loan.id);
        Ok(loan)
    }

    pub async fn update_loan(&self, id: &str, draft: LoanDraft) -> Result<Loan> {
        let mut loans = self.loans().await;
        let loan = loans
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or_else(|| anyhow!("No loan with id '{id}'"))
            .pub_result(ErrorType::Input)?;
        loan.name = draft.name;
        loan.amount = draft.amount;
        loan.interest_rate = draft.interest_rate;
        if let Some(start_date) = draft.start_date {
            loan.start_date = start_date;
        }
        let updated = loan.clone();
        self.save(Key::Loans, &loans).await?;
        Ok(updated)
    }

    pub async fn delete_loan(&self, id: &str) -> Result<Loan> {
        let mut loans = self.loans().await;
        let index = loans
            .iter()
            .position(|l| l.id == id)
            .ok_or_else(|| anyhow!("No loan with id '{id}'"))
            .pub_result(ErrorType::Input)?;
        let removed = loans.remove(index);
        self.save(Key::Loans, &loans).await?;
        Ok(removed)
    }

    pub async fn monthly_salary(&self) -> Decimal {
        self.store.read_decimal(Key::MonthlySalary).await
    }

    /// Stores the salary and refreshes the total income. Returns the new total income.
    pub async fn set_monthly_salary(&self, salary: Decimal) -> Result<Decimal> {
        if salary.is_sign_negative() && !salary.is_zero() {
            return Err(anyhow!("The monthly salary cannot be negative: {salary}"))
                .pub_result(ErrorType::Input);
        }
        if !self.store.write_decimal(Key::MonthlySalary, salary).await {
            return Err(anyhow!("Unable to save the monthly salary"))
                .pub_result(ErrorType::Storage);
        }
        self.recompute_total_income().await
    }

    pub async fn side_incomes(&self) -> Vec<SideIncome> {
        self.store.read(Key::SideIncomes).await
    }

    /// Appends a side income and refreshes the total income. Returns the new total income.
    pub async fn add_side_income(&self, income: SideIncome) -> Result<Decimal> {
        let mut incomes = self.side_incomes().await;
        incomes.push(income);
        self.save(Key::SideIncomes, &incomes).await?;
        self.recompute_total_income().await
    }

    /// Removes the side income at `index` (zero based) and refreshes the total income.
    pub async fn remove_side_income(&self, index: usize) -> Result<(SideIncome, Decimal)> {
        let mut incomes = self.side_incomes().await;
        if index >= incomes.len() {
            return Err(anyhow!(
                "There is no side income at position {index}, there are {}",
                incomes.len()
            ))
            .pub_result(ErrorType::Input);
        }
        let removed = incomes.remove(index);
        self.save(Key::SideIncomes, &incomes).await?;
        let total = self.recompute_total_income().await?;
        Ok((removed, total))
    }

    /// Salary plus all side incomes, written to `totalIncome`.
    pub async fn recompute_total_income(&self) -> Result<Decimal> {
        let salary = self.monthly_salary().await;
        let incomes = self.side_incomes().await;
        let total = total_income(salary, &incomes);
        if !self.store.write_decimal(Key::TotalIncome, total).await {
            return Err(anyhow!("Unable to save the total income")).pub_result(ErrorType::Storage);
        }
        info!("Total income is now {}", total.normalize());
        Ok(total)
    }

    /// The cached total income as last written.
    pub async fn total_income(&self) -> Decimal {
        self.store.read_decimal(Key::TotalIncome).await
    }

    pub async fn theme(&self) -> Option<String> {
        self.store.read_raw(Key::Theme).await
    }

    pub async fn set_theme(&self, theme: &str) -> Result<()> {
        let theme = theme.trim();
        if theme.is_empty() {
            return Err(anyhow!("The theme name cannot be empty")).pub_result(ErrorType::Input);
        }
        if !self.store.write_raw(Key::Theme, theme).await {
            return Err(anyhow!("Unable to save the theme")).pub_result(ErrorType::Storage);
        }
        Ok(())
    }

    async fn save<T>(&self, key: Key, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized + Sync,
    {
        if self.store.write(key, value).await {
            Ok(())
        } else {
            Err(anyhow!("Unable to save '{key}'")).pub_result(ErrorType::Storage)
        }
    }
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::error_type;
    use crate::model::{Amount, Category};
    use crate::store::{Medium, MemoryMedium};

    fn ledger() -> (MemoryMedium, Ledger) {
        let medium = MemoryMedium::new();
        (medium.clone(), Ledger::new(RecordStore::new(medium)))
    }

    fn amount(value: i64) -> Amount {
        Amount::new(Decimal::from(value))
    }

    fn draft(description: &str, value: i64) -> ExpenseDraft {
        ExpenseDraft {
            description: description.to_string(),
            amount: amount(value),
            category: Category::Food,
            date: Some("2025-03-01".to_string()),
            notes: String::new(),
        }
    }

    #[tokio::test]
    async fn test_add_update_delete_expense() {
        let (_, ledger) = ledger();
        let added = ledger.add_expense(draft("Lunch", 12)).await.unwrap();
        assert!(Uuid::parse_str(added.id()).is_ok());
        assert!(added.created_at().is_some());
        assert_eq!(ledger.expenses().await, vec![added.clone()]);

        let mut changed = draft("Dinner", 30);
        changed.date = None;
        let updated = ledger.update_expense(added.id(), changed).await.unwrap();
        assert_eq!(updated.id(), added.id());
        assert_eq!(updated.created_at(), added.created_at());
        assert_eq!(updated.description(), "Dinner");
        assert_eq!(updated.date(), "2025-03-01");

        ledger.delete_expense(added.id()).await.unwrap();
        assert!(ledger.expenses().await.is_empty());
    }

    #[tokio::test]
    async fn test_update_keeps_unknown_fields() {
        let (medium, ledger) = ledger();
        medium
            .set_item(
                "expenses",
                r#"[{"id":"e1","description":"Rent","amount":"100","category":"Housing","date":"2025-01-01","notes":"","receipt":"r.png"}]"#,
            )
            .await
            .unwrap();
        ledger.update_expense("e1", draft("Rent", 120)).await.unwrap();
        let stored = medium.get_item("expenses").await.unwrap().unwrap();
        assert!(stored.contains(r#""receipt":"r.png""#));
    }

    #[tokio::test]
    async fn test_unknown_id_is_input_error() {
        let (_, ledger) = ledger();
        let e = ledger.delete_expense("missing").await.unwrap_err();
        assert_eq!(error_type(&e), Some(ErrorType::Input));
        let e = ledger
            .update_loan("missing", LoanDraft::default())
            .await
            .unwrap_err();
        assert_eq!(error_type(&e), Some(ErrorType::Input));
    }

    #[tokio::test]
    async fn test_add_and_delete_loan() {
        let (_, ledger) = ledger();
        let loan = ledger
            .add_loan(LoanDraft {
                name: "Car".to_string(),
                amount: amount(500),
                interest_rate: Some(Amount::new(Decimal::new(85, 1))),
                start_date: None,
            })
            .await
            .unwrap();
        assert_eq!(loan.start_date(), utils::today());
        assert_eq!(ledger.loans().await.len(), 1);
        ledger.delete_loan(loan.id()).await.unwrap();
        assert!(ledger.loans().await.is_empty());
    }

    #[tokio::test]
    async fn test_salary_then_side_income_updates_total() {
        let (medium, ledger) = ledger();
        let total = ledger
            .set_monthly_salary(Decimal::from(50000))
            .await
            .unwrap();
        assert_eq!(total, Decimal::from(50000));
        assert_eq!(
            medium.get_item("totalIncome").await.unwrap().as_deref(),
            Some("50000")
        );

        let total = ledger
            .add_side_income(SideIncome::new(amount(5000), "Tutoring"))
            .await
            .unwrap();
        assert_eq!(total, Decimal::from(55000));
        assert_eq!(
            medium.get_item("totalIncome").await.unwrap().as_deref(),
            Some("55000")
        );
        assert_eq!(ledger.total_income().await, Decimal::from(55000));
    }

    #[tokio::test]
    async fn test_imported_huge_side_income_clamps_total() {
        let (medium, ledger) = ledger();
        let pending = crate::snapshot::stage_json(
            r#"{"monthlySalary":"1",
                "sideIncomes":[{"amount":"79228162514264337593543950335","source":"Lottery"}]}"#,
        )
        .unwrap();
        let report = crate::snapshot::commit(ledger.store(), pending).await;
        assert!(report.is_complete());

        assert_eq!(ledger.recompute_total_income().await.unwrap(), Decimal::MAX);
        assert_eq!(
            ledger.set_monthly_salary(Decimal::from(2)).await.unwrap(),
            Decimal::MAX
        );
        let total = ledger
            .add_side_income(SideIncome::new(amount(5000), "Tutoring"))
            .await
            .unwrap();
        assert_eq!(total, Decimal::MAX);
        assert_eq!(
            medium.get_item("totalIncome").await.unwrap().as_deref(),
            Some("79228162514264337593543950335")
        );
    }

    #[tokio::test]
    async fn test_salary_change_keeps_side_incomes() {
        let (_, ledger) = ledger();
        ledger
            .add_side_income(SideIncome::new(amount(5000), "Tutoring"))
            .await
            .unwrap();
        let total = ledger
            .set_monthly_salary(Decimal::from(40000))
            .await
            .unwrap();
        assert_eq!(total, Decimal::from(45000));
    }

    #[tokio::test]
    async fn test_remove_side_income() {
        let (_, ledger) = ledger();
        ledger
            .set_monthly_salary(Decimal::from(1000))
            .await
            .unwrap();
        ledger
            .add_side_income(SideIncome::new(amount(200), "a"))
            .await
            .unwrap();
        let (removed, total) = ledger.remove_side_income(0).await.unwrap();
        assert_eq!(removed.source(), "a");
        assert_eq!(total, Decimal::from(1000));
        assert!(ledger.remove_side_income(0).await.is_err());
    }

    #[tokio::test]
    async fn test_negative_salary_rejected() {
        let (medium, ledger) = ledger();
        let e = ledger
            .set_monthly_salary(Decimal::from(-1))
            .await
            .unwrap_err();
        assert_eq!(error_type(&e), Some(ErrorType::Input));
        assert!(medium.items().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_write_is_storage_error() {
        let ledger = Ledger::new(RecordStore::new(MemoryMedium::with_quota(8)));
        let e = ledger.add_expense(draft("Lunch", 12)).await.unwrap_err();
        assert_eq!(error_type(&e), Some(ErrorType::Storage));
        assert!(ledger.expenses().await.is_empty());
    }

    #[tokio::test]
    async fn test_theme() {
        let (_, ledger) = ledger();
        assert!(ledger.theme().await.is_none());
        ledger.set_theme(" forest ").await.unwrap();
        assert_eq!(ledger.theme().await.as_deref(), Some("forest"));
        assert!(ledger.set_theme("  ").await.is_err());
    }
}
