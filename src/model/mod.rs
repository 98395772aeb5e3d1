//! Types that represent the core data model, such as `Transaction` and `Categories`.
mod amount;
mod category;
mod transaction;
mod user;

pub use amount::{format_money, Amount, AmountError};
pub use category::{is_reserved, Categories, DEFAULT_CATEGORIES};
pub(crate) use transaction::{parse_date, AmountPolicy, TransactionFields};
pub use transaction::{
    AmountInput, Transaction, TransactionDraft, TransactionType, FALLBACK_EXPENSE_CATEGORY,
    INCOME_CATEGORY,
};
pub use user::{normalize, ScopeKey, UserContext, UserIdentity};
