use crate::model::{saturating_sum, Amount};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One additional income source stored under the `sideIncomes` key. Side incomes are summed into
/// the total income and are not tracked individually anywhere else.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SideIncome {
    #[serde(default)]
    pub(crate) amount: Amount,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub(crate) source: String,
    #[serde(flatten)]
    pub(crate) other_fields: BTreeMap<String, Value>,
}

impl SideIncome {
    pub fn new(amount: Amount, source: impl Into<String>) -> Self {
        Self {
            amount,
            source: source.into(),
            other_fields: BTreeMap::new(),
        }
    }

    pub fn amount(&self) -> &Amount {
        &self.amount
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

/// Salary plus the sum of all side incomes.
pub fn total_income(salary: Decimal, side_incomes: &[SideIncome]) -> Decimal {
    let sides = side_incomes.iter().map(|income| income.amount().value());
    saturating_sum(std::iter::once(salary).chain(sides))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_income_without_side_incomes() {
        assert_eq!(total_income(Decimal::from(50000), &[]), Decimal::from(50000));
    }

    #[test]
    fn test_total_income_with_side_incomes() {
        let incomes: Vec<SideIncome> =
            serde_json::from_str(r#"[{"amount":"5000","source":"Tutoring"},{"amount":""}]"#)
                .unwrap();
        assert_eq!(
            total_income(Decimal::from(50000), &incomes),
            Decimal::from(55000)
        );
    }

    #[test]
    fn test_total_income_clamps_instead_of_overflowing() {
        let incomes: Vec<SideIncome> =
            serde_json::from_str(r#"[{"amount":"79228162514264337593543950335"}]"#).unwrap();
        assert_eq!(total_income(Decimal::from(1), &incomes), Decimal::MAX);
    }
}
