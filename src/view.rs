//! Read-only views computed from a list of transactions: filtering, totals and aggregates.
//!
//! Nothing here touches storage. Callers pass whatever slice they are presenting, so totals always
//! reflect the active filter.

use crate::model::{Transaction, TransactionType};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::str::FromStr;

/// Which transaction types a filter lets through.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeFilter {
    #[default]
    All,
    Income,
    Expense,
}

serde_plain::derive_display_from_serialize!(TypeFilter);
serde_plain::derive_fromstr_from_deserialize!(TypeFilter);

impl TypeFilter {
    fn accepts(self, kind: TransactionType) -> bool {
        match self {
            TypeFilter::All => true,
            TypeFilter::Income => kind == TransactionType::Income,
            TypeFilter::Expense => kind == TransactionType::Expense,
        }
    }
}

/// Either every category or exactly one named category.
///
/// Income records carry the income category, so a named filter only lets income through when the
/// name is that category.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub enum CategoryFilter {
    #[default]
    All,
    Named(String),
}

impl FromStr for CategoryFilter {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            Ok(CategoryFilter::All)
        } else {
            Ok(CategoryFilter::Named(s.to_string()))
        }
    }
}

/// The predicates a presentation applies. Unset fields do not filter.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct FilterSpec {
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub kind: TypeFilter,
    pub category: CategoryFilter,
    pub search: Option<String>,
}

impl FilterSpec {
    pub fn matches(&self, t: &Transaction) -> bool {
        if self.date_from.is_some_and(|from| t.date() < from) {
            return false;
        }
        if self.date_to.is_some_and(|to| t.date() > to) {
            return false;
        }
        if !self.kind.accepts(t.kind()) {
            return false;
        }
        if let CategoryFilter::Named(name) = &self.category {
            if t.category() != name.as_str() {
                return false;
            }
        }
        match self.search.as_deref().map(str::trim) {
            Some(needle) if !needle.is_empty() => format!("{} {}", t.title(), t.notes())
                .to_lowercase()
                .contains(&needle.to_lowercase()),
            _ => true,
        }
    }
}

/// The records in `transactions` that pass every predicate of `spec`, in their original order.
pub fn filter<'a>(transactions: &'a [Transaction], spec: &FilterSpec) -> Vec<&'a Transaction> {
    transactions.iter().filter(|t| spec.matches(t)).collect()
}

/// Sorts by date, newest first. Records on the same date keep their relative order.
pub fn newest_first<T: Borrow<Transaction>>(transactions: &mut [T]) {
    transactions.sort_by(|a, b| b.borrow().date().cmp(&a.borrow().date()));
}

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub income: Decimal,
    pub expense: Decimal,
    pub balance: Decimal,
}

/// Sums income and expense. `balance` is income minus expense.
pub fn totals<'a, I>(transactions: I) -> Totals
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let mut totals = Totals::default();
    for t in transactions {
        match t.kind() {
            TransactionType::Income => totals.income += t.amount().value(),
            TransactionType::Expense => totals.expense += t.amount().value(),
        }
    }
    totals.balance = totals.income - totals.expense;
    totals
}

/// Expense totals per category, largest first. Ties keep the order categories were first seen.
pub fn by_category<'a, I>(transactions: I) -> Vec<(String, Decimal)>
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let mut sums: Vec<(String, Decimal)> = Vec::new();
    for t in transactions.into_iter().filter(|t| t.is_expense()) {
        match sums.iter_mut().find(|(c, _)| c.as_str() == t.category()) {
            Some((_, sum)) => *sum += t.amount().value(),
            None => sums.push((t.category().to_string(), t.amount().value())),
        }
    }
    sums.sort_by(|a, b| b.1.cmp(&a.1));
    sums
}

#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct MonthTotals {
    /// `YYYY-MM`
    pub month: String,
    pub income: Decimal,
    pub expense: Decimal,
}

/// Income and expense per calendar month, oldest month first.
pub fn by_month<'a, I>(transactions: I) -> Vec<MonthTotals>
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let mut months: BTreeMap<String, (Decimal, Decimal)> = BTreeMap::new();
    for t in transactions {
        let entry = months.entry(t.month()).or_default();
        match t.kind() {
            TransactionType::Income => entry.0 += t.amount().value(),
            TransactionType::Expense => entry.1 += t.amount().value(),
        }
    }
    months
        .into_iter()
        .map(|(month, (income, expense))| MonthTotals {
            month,
            income,
            expense,
        })
        .collect()
}

#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotals {
    pub category: String,
    pub income: Decimal,
    pub expense: Decimal,
}

/// Income and expense side by side for every category label present, in first-seen order.
pub fn category_breakdown<'a, I>(transactions: I) -> Vec<CategoryTotals>
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let mut rows: Vec<CategoryTotals> = Vec::new();
    for t in transactions {
        let index = match rows.iter().position(|r| r.category == t.category()) {
            Some(index) => index,
            None => {
                rows.push(CategoryTotals {
                    category: t.category().to_string(),
                    ..Default::default()
                });
                rows.len() - 1
            }
        };
        match t.kind() {
            TransactionType::Income => rows[index].income += t.amount().value(),
            TransactionType::Expense => rows[index].expense += t.amount().value(),
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Amount, TransactionFields};

    fn tx(
        id: &str,
        date: &str,
        title: &str,
        kind: TransactionType,
        category: &str,
        amount: i64,
    ) -> Transaction {
        Transaction::from_fields(
            id.to_string(),
            "ann@club.org".to_string(),
            TransactionFields {
                date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
                title: title.to_string(),
                kind,
                category: category.to_string(),
                amount: Amount::new(Decimal::from(amount)).unwrap(),
                notes: if title == "Venue" {
                    "Hall deposit".to_string()
                } else {
                    String::new()
                },
            },
        )
    }

    fn sample() -> Vec<Transaction> {
        use TransactionType::{Expense, Income};
        vec![
            tx("1", "2024-01-15", "Venue", Expense, "Events", 500),
            tx("2", "2024-01-20", "Dues", Income, "Income", 1000),
            tx("3", "2024-02-03", "Pizza", Expense, "Food", 80),
            tx("4", "2024-02-10", "Bus", Expense, "Transport", 80),
            tx("5", "2024-03-01", "Snacks", Expense, "Food", 40),
            tx("6", "2024-03-01", "Grant", Income, "Income", 300),
        ]
    }

    #[test]
    fn test_empty_spec_keeps_everything() {
        let all = sample();
        assert_eq!(filter(&all, &FilterSpec::default()).len(), all.len());
    }

    #[test]
    fn test_date_range_is_inclusive() {
        let all = sample();
        let spec = FilterSpec {
            date_from: NaiveDate::from_ymd_opt(2024, 1, 20),
            date_to: NaiveDate::from_ymd_opt(2024, 2, 10),
            ..Default::default()
        };
        let ids: Vec<_> = filter(&all, &spec).iter().map(|t| t.id()).collect();
        assert_eq!(ids, vec!["2", "3", "4"]);
    }

    #[test]
    fn test_income_filter_totals_have_no_expense() {
        let all = sample();
        let spec = FilterSpec {
            kind: TypeFilter::Income,
            ..Default::default()
        };
        let totals = totals(filter(&all, &spec));
        assert_eq!(totals.expense, Decimal::ZERO);
        assert_eq!(totals.income, Decimal::from(1300));
        assert_eq!(totals.balance, Decimal::from(1300));
    }

    #[test]
    fn test_category_filter_excludes_income() {
        let all = sample();
        let spec = FilterSpec {
            category: "Food".parse().unwrap(),
            ..Default::default()
        };
        let ids: Vec<_> = filter(&all, &spec).iter().map(|t| t.id()).collect();
        assert_eq!(ids, vec!["3", "5"]);

        let spec = FilterSpec {
            category: "Income".parse().unwrap(),
            ..Default::default()
        };
        assert_eq!(filter(&all, &spec).len(), 2);
        assert_eq!("all".parse::<CategoryFilter>().unwrap(), CategoryFilter::All);
    }

    #[test]
    fn test_search_matches_title_and_notes() {
        let all = sample();
        let spec = FilterSpec {
            search: Some("HALL".to_string()),
            ..Default::default()
        };
        let ids: Vec<_> = filter(&all, &spec).iter().map(|t| t.id()).collect();
        assert_eq!(ids, vec!["1"]);

        let spec = FilterSpec {
            search: Some("pi".to_string()),
            kind: TypeFilter::Expense,
            ..Default::default()
        };
        let ids: Vec<_> = filter(&all, &spec).iter().map(|t| t.id()).collect();
        assert_eq!(ids, vec!["3"]);
    }

    #[test]
    fn test_totals_follow_filter() {
        let all = sample();
        let everything = totals(&all);
        assert_eq!(everything.income, Decimal::from(1300));
        assert_eq!(everything.expense, Decimal::from(700));
        assert_eq!(everything.balance, Decimal::from(600));

        let spec = FilterSpec {
            date_from: NaiveDate::from_ymd_opt(2024, 3, 1),
            ..Default::default()
        };
        let march = totals(filter(&all, &spec));
        assert_eq!(march.expense, Decimal::from(40));
        assert_eq!(march.income, Decimal::from(300));
    }

    #[test]
    fn test_by_category_sorted_with_stable_ties() {
        let all = sample();
        let rows = by_category(&all);
        assert_eq!(
            rows,
            vec![
                ("Events".to_string(), Decimal::from(500)),
                ("Food".to_string(), Decimal::from(120)),
                ("Transport".to_string(), Decimal::from(80)),
            ]
        );

        // Equal totals keep first-seen order.
        let tied = vec![all[3].clone(), all[2].clone()];
        let rows = by_category(&tied);
        assert_eq!(rows[0].0, "Transport");
        assert_eq!(rows[1].0, "Food");
    }

    #[test]
    fn test_by_month_ascending() {
        let mut all = sample();
        all.reverse();
        let months = by_month(&all);
        let keys: Vec<_> = months.iter().map(|m| m.month.as_str()).collect();
        assert_eq!(keys, vec!["2024-01", "2024-02", "2024-03"]);
        assert_eq!(months[0].income, Decimal::from(1000));
        assert_eq!(months[0].expense, Decimal::from(500));
        assert_eq!(months[1].income, Decimal::ZERO);
        assert_eq!(months[1].expense, Decimal::from(160));
    }

    #[test]
    fn test_category_breakdown() {
        let all = sample();
        let rows = category_breakdown(&all);
        let labels: Vec<_> = rows.iter().map(|r| r.category.as_str()).collect();
        assert_eq!(labels, vec!["Events", "Income", "Food", "Transport"]);
        assert_eq!(rows[1].income, Decimal::from(1300));
        assert_eq!(rows[2].expense, Decimal::from(120));
    }

    #[test]
    fn test_newest_first_is_stable() {
        let all = sample();
        let mut shown = filter(&all, &FilterSpec::default());
        newest_first(&mut shown);
        let ids: Vec<_> = shown.iter().map(|t| t.id()).collect();
        assert_eq!(ids, vec!["5", "6", "4", "3", "2", "1"]);
    }

    #[test]
    fn test_type_filter_parses() {
        assert_eq!("income".parse::<TypeFilter>().unwrap(), TypeFilter::Income);
        assert_eq!(TypeFilter::Expense.to_string(), "expense");
        assert!("both".parse::<TypeFilter>().is_err());
    }
}
