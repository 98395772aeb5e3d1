//! A small ledger for a club's income and expenses.
//!
//! Everything a user owns (transactions and expense categories) is kept in a key-value store
//! under keys derived from their email. The [`Ledger`] type holds the rules for changing that
//! data, [`view`] computes filtered lists and totals from it, and [`reconcile`] moves it in and
//! out of JSON backups and CSV files.

pub mod args;
mod backup;
pub mod commands;
mod config;
mod error;
mod fs;
pub mod model;
pub mod reconcile;
pub mod storage;
mod store;
mod utils;
pub mod view;


pub use backup::Backup;
pub use config::Config;
pub use error::{Error, Notice, Result, Severity, StoreError};
pub use model::Amount;
pub use store::Ledger;
