//! Add, edit, delete and list transactions.

use crate::args::{DeleteArgs, EditArgs, FilterArgs, TransactionArgs};
use crate::commands::{current_user, Out};
use crate::error::Notice;
use crate::model::Transaction;
use crate::{view, Config, Result};
use anyhow::Context;
use chrono::Local;
use std::fmt::Write;

/// Records a new transaction for the signed-in user. The date defaults to today.
pub async fn add(config: &Config, args: &TransactionArgs) -> Result<Out<Transaction>> {
    let mut ledger = config.ledger()?;
    let ctx = current_user(&ledger)?;
    let mut draft = args.draft();
    if args.date().is_none() {
        draft.date = Some(Local::now().date_naive().to_string());
    }
    let transaction = ledger
        .add_transaction(&ctx, draft)
        .context("Unable to add the transaction")?;
    let message = format!(
        "Added {} '{}' of {} ({})",
        transaction.kind(),
        transaction.title(),
        transaction.amount().formatted(config.currency_symbol()),
        transaction.id()
    );
    Ok(Out::new(message, transaction))
}

/// Changes the fields given in `args`, keeping the rest of the stored record.
pub async fn edit(config: &Config, args: &EditArgs) -> Result<Out<Transaction>> {
    let mut ledger = config.ledger()?;
    let ctx = current_user(&ledger)?;
    let transaction = ledger
        .update_transaction(&ctx, args.id(), args.fields().draft())
        .context("Unable to update the transaction")?;
    Ok(Out::new(
        format!("Updated '{}' ({})", transaction.title(), transaction.id()),
        transaction,
    ))
}

/// Deletes a transaction. An id that is not there is reported but is not an error.
pub async fn delete(config: &Config, args: &DeleteArgs) -> Result<Out<()>> {
    let mut ledger = config.ledger()?;
    let ctx = current_user(&ledger)?;
    if !ledger.delete_transaction(&ctx, args.id())? {
        return Ok(Notice::info(format!("Nothing to delete for id '{}'", args.id()))
            .to_string()
            .into());
    }
    Ok(format!("Deleted transaction {}", args.id()).into())
}

/// Lists the transactions that pass the filters, newest first.
pub async fn list(config: &Config, args: &FilterArgs) -> Result<Out<Vec<Transaction>>> {
    let ledger = config.ledger()?;
    let ctx = current_user(&ledger)?;
    let all = ledger.transactions(&ctx);
    let mut shown = view::filter(&all, &args.spec());
    view::newest_first(&mut shown);

    let mut message = format!("{} of {} transactions", shown.len(), all.len());
    for t in &shown {
        let _ = write!(
            message,
            "\n{}  {:<7}  {:<12}  {:>14}  {}  [{}]",
            t.date(),
            t.kind().to_string(),
            t.category(),
            t.amount().formatted(config.currency_symbol()),
            t.title(),
            t.id()
        );
    }
    let structure = shown.into_iter().cloned().collect();
    Ok(Out::new(message, structure))
}
