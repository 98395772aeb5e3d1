use crate::args::FilterArgs;
use crate::commands::{current_user, Out};
use crate::model::format_money;
use crate::view::{self, MonthTotals, Totals};
use crate::{Config, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// The aggregates shown by `cem summary`, computed over the filtered transactions.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub count: usize,
    pub totals: Totals,
    pub by_category: Vec<(String, Decimal)>,
    pub by_month: Vec<MonthTotals>,
}

pub async fn summary(config: &Config, args: &FilterArgs) -> Result<Out<Summary>> {
    let ledger = config.ledger()?;
    let ctx = current_user(&ledger)?;
    let all = ledger.transactions(&ctx);
    let shown = view::filter(&all, &args.spec());

    let summary = Summary {
        count: shown.len(),
        totals: view::totals(shown.iter().copied()),
        by_category: view::by_category(shown.iter().copied()),
        by_month: view::by_month(shown.iter().copied()),
    };

    let money = |value: Decimal| format_money(value, config.currency_symbol());
    let mut message = format!(
        "{} transactions\nIncome:  {}\nExpense: {}\nBalance: {}",
        summary.count,
        money(summary.totals.income),
        money(summary.totals.expense),
        money(summary.totals.balance)
    );
    if !summary.by_category.is_empty() {
        message.push_str("\n\nExpenses by category");
        for (category, total) in &summary.by_category {
            let _ = write!(message, "\n  {category:<14} {:>14}", money(*total));
        }
    }
    if !summary.by_month.is_empty() {
        message.push_str("\n\nBy month");
        for month in &summary.by_month {
            let _ = write!(
                message,
                "\n  {}  in {:>14}  out {:>14}",
                month.month,
                money(month.income),
                money(month.expense)
            );
        }
    }
    Ok(Out::new(message, summary))
}
