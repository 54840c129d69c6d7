//! Types that represent the stored records, such as `Expense` and `Loan`.
mod amount;
mod expense;
mod income;
mod loan;

pub use amount::{format_money, parse_leading_decimal, saturating_sum, Amount, AmountError};
pub use expense::{Category, Expense, ExpenseDraft};
pub use income::{total_income, SideIncome};
pub use loan::{Loan, LoanDraft};
