use crate::error::StoreError;
use crate::model::{is_reserved, Amount};
use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;

/// The category that every income record carries. It is not a managed category.
pub const INCOME_CATEGORY: &str = "Income";

/// The category an expense falls back to when none was given.
pub const FALLBACK_EXPENSE_CATEGORY: &str = "Misc";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Whether money came in or went out.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    #[default]
    Expense,
}

serde_plain::derive_display_from_serialize!(TransactionType);
serde_plain::derive_fromstr_from_deserialize!(TransactionType);

impl TransactionType {
    /// Parses `income` or `expense` ignoring case and surrounding whitespace.
    pub fn parse_loose(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "income" => Some(TransactionType::Income),
            "expense" => Some(TransactionType::Expense),
            _ => None,
        }
    }
}

/// A single income or expense record.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub(crate) id: String,
    pub(crate) date: NaiveDate,
    pub(crate) title: String,
    #[serde(rename = "type")]
    pub(crate) kind: TransactionType,
    pub(crate) category: String,
    pub(crate) amount: Amount,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub(crate) notes: String,
    #[serde(rename = "email", alias = "owner", default)]
    pub(crate) owner: String,
}

impl Transaction {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn kind(&self) -> TransactionType {
        self.kind
    }

    pub fn is_income(&self) -> bool {
        self.kind == TransactionType::Income
    }

    pub fn is_expense(&self) -> bool {
        self.kind == TransactionType::Expense
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// The `YYYY-MM` month this record falls in.
    pub fn month(&self) -> String {
        self.date.format("%Y-%m").to_string()
    }

    /// Builds a record from already validated fields.
    pub(crate) fn from_fields(id: String, owner: String, fields: TransactionFields) -> Self {
        Self {
            id,
            date: fields.date,
            title: fields.title,
            kind: fields.kind,
            category: fields.category,
            amount: fields.amount,
            notes: fields.notes,
            owner,
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// An amount as it arrives from outside: a JSON number or text typed by a person.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AmountInput {
    Number(f64),
    Text(String),
}

impl AmountInput {
    fn parse(&self) -> Result<Amount, StoreError> {
        let parsed = match self {
            AmountInput::Number(n) => Amount::try_from(*n),
            AmountInput::Text(s) => Amount::from_str(s),
        };
        parsed.map_err(|e| StoreError::validation(format!("invalid amount: {e}")))
    }
}

impl From<&str> for AmountInput {
    fn from(value: &str) -> Self {
        AmountInput::Text(value.to_string())
    }
}

impl From<String> for AmountInput {
    fn from(value: String) -> Self {
        AmountInput::Text(value)
    }
}

impl From<f64> for AmountInput {
    fn from(value: f64) -> Self {
        AmountInput::Number(value)
    }
}

/// The fields a caller may supply when adding, editing or importing a transaction.
///
/// Every field is optional here. Whether a missing field is an error, a default, or "keep what is
/// already stored" is decided when the draft is resolved by the ledger.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionDraft {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub amount: Option<AmountInput>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default, alias = "owner")]
    pub email: Option<String>,
}

impl TransactionDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn kind(mut self, kind: TransactionType) -> Self {
        self.kind = Some(kind.to_string());
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn amount(mut self, amount: impl Into<AmountInput>) -> Self {
        self.amount = Some(amount.into());
        self
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Validates the draft, filling absent fields from `base` when editing an existing record.
    ///
    /// Income always resolves to the income category. An expense with no category keeps the
    /// category of `base` if `base` was an expense, otherwise it gets the fallback category.
    pub(crate) fn resolve(
        &self,
        base: Option<&Transaction>,
        policy: AmountPolicy,
    ) -> Result<TransactionFields, StoreError> {
        let title = match (&self.title, base) {
            (Some(title), _) => title.trim().to_string(),
            (None, Some(base)) => base.title.clone(),
            (None, None) => String::new(),
        };
        if title.is_empty() {
            return Err(StoreError::validation("title is required"));
        }

        let date = match (non_empty(&self.date), base) {
            (Some(date), _) => parse_date(date)?,
            (None, Some(base)) if self.date.is_none() => base.date,
            _ => return Err(StoreError::validation("date is required")),
        };

        let kind = match (non_empty(&self.kind), base) {
            (Some(kind), _) => TransactionType::parse_loose(kind).ok_or_else(|| {
                StoreError::validation(format!("type must be income or expense, got '{kind}'"))
            })?,
            (None, Some(base)) => base.kind,
            (None, None) => TransactionType::Expense,
        };

        let amount = match (&self.amount, base) {
            (Some(amount), _) => amount.parse()?,
            (None, Some(base)) => base.amount,
            (None, None) => return Err(StoreError::validation("amount is required")),
        };
        if policy == AmountPolicy::Positive && amount.is_zero() {
            return Err(StoreError::validation("amount must be greater than zero"));
        }

        let category = match kind {
            TransactionType::Income => INCOME_CATEGORY.to_string(),
            TransactionType::Expense => match (non_empty(&self.category), base) {
                (Some(category), _) if is_reserved(category) => {
                    return Err(StoreError::validation(format!(
                        "'{category}' is only for income, pick another category for an expense"
                    )));
                }
                (Some(category), _) => category.to_string(),
                (None, Some(base)) if base.is_expense() => base.category.clone(),
                _ => FALLBACK_EXPENSE_CATEGORY.to_string(),
            },
        };

        let notes = match (&self.notes, base) {
            (Some(notes), _) => notes.trim().to_string(),
            (None, Some(base)) => base.notes.clone(),
            (None, None) => String::new(),
        };

        Ok(TransactionFields {
            date,
            title,
            kind,
            category,
            amount,
            notes,
        })
    }
}

/// How strict amount validation is.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub(crate) enum AmountPolicy {
    /// Interactive edits: zero is rejected.
    Positive,
    /// Imported records: zero is kept.
    NonNegative,
}

/// The validated, user-editable part of a transaction.
#[derive(Debug, Clone, Eq, PartialEq)]
pub(crate) struct TransactionFields {
    pub(crate) date: NaiveDate,
    pub(crate) title: String,
    pub(crate) kind: TransactionType,
    pub(crate) category: String,
    pub(crate) amount: Amount,
    pub(crate) notes: String,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Parses an ISO-8601 calendar date. A full timestamp is accepted and its date part kept.
pub(crate) fn parse_date(s: &str) -> Result<NaiveDate, StoreError> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .or_else(|_| DateTime::parse_from_rfc3339(s).map(|dt| dt.date_naive()))
        .map_err(|_| StoreError::validation(format!("'{s}' is not a YYYY-MM-DD date")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored_expense() -> Transaction {
        Transaction {
            id: "t1".into(),
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            title: "Venue".into(),
            kind: TransactionType::Expense,
            category: "Events".into(),
            amount: Amount::from_str("500").unwrap(),
            notes: "deposit".into(),
            owner: "a@b.com".into(),
        }
    }

    #[test]
    fn test_type_display_and_parse() {
        assert_eq!(TransactionType::Income.to_string(), "income");
        assert_eq!(
            TransactionType::from_str("expense").unwrap(),
            TransactionType::Expense
        );
        assert_eq!(
            TransactionType::parse_loose(" INCOME "),
            Some(TransactionType::Income)
        );
        assert_eq!(TransactionType::parse_loose("refund"), None);
    }

    #[test]
    fn test_resolve_new_expense() {
        let fields = TransactionDraft::new()
            .date("2024-03-01")
            .title("  Venue ")
            .category("Events")
            .amount("500")
            .resolve(None, AmountPolicy::Positive)
            .unwrap();
        assert_eq!(fields.title, "Venue");
        assert_eq!(fields.kind, TransactionType::Expense);
        assert_eq!(fields.category, "Events");
        assert_eq!(fields.notes, "");
    }

    #[test]
    fn test_resolve_forces_income_category() {
        let fields = TransactionDraft::new()
            .date("2024-03-01")
            .title("Sponsorship")
            .kind(TransactionType::Income)
            .category("Food")
            .amount(1000.0)
            .resolve(None, AmountPolicy::Positive)
            .unwrap();
        assert_eq!(fields.category, INCOME_CATEGORY);
    }

    #[test]
    fn test_resolve_expense_without_category_falls_back() {
        let fields = TransactionDraft::new()
            .date("2024-03-01")
            .title("Tape")
            .amount("3")
            .resolve(None, AmountPolicy::Positive)
            .unwrap();
        assert_eq!(fields.category, FALLBACK_EXPENSE_CATEGORY);
    }

    #[test]
    fn test_resolve_rejects_income_category_for_expense() {
        let draft = TransactionDraft::new()
            .date("2024-03-01")
            .title("Y")
            .kind(TransactionType::Expense)
            .category("income")
            .amount(5.0);
        let err = draft.resolve(None, AmountPolicy::NonNegative).unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));

        let income = draft.kind(TransactionType::Income);
        let fields = income.resolve(None, AmountPolicy::Positive).unwrap();
        assert_eq!(fields.category, INCOME_CATEGORY);
    }

    #[test]
    fn test_resolve_rejects_missing_fields() {
        let missing_title = TransactionDraft::new().date("2024-03-01").amount("1");
        assert!(matches!(
            missing_title.resolve(None, AmountPolicy::Positive),
            Err(StoreError::Validation(_))
        ));
        let missing_date = TransactionDraft::new().title("x").amount("1");
        assert!(missing_date.resolve(None, AmountPolicy::Positive).is_err());
        let missing_amount = TransactionDraft::new().title("x").date("2024-03-01");
        assert!(missing_amount.resolve(None, AmountPolicy::Positive).is_err());
        let bad_date = TransactionDraft::new().title("x").date("03/01/2024").amount("1");
        assert!(bad_date.resolve(None, AmountPolicy::Positive).is_err());
        let bad_type = TransactionDraft {
            kind: Some("gift".into()),
            ..TransactionDraft::new().title("x").date("2024-03-01").amount("1")
        };
        assert!(bad_type.resolve(None, AmountPolicy::Positive).is_err());
    }

    #[test]
    fn test_resolve_amount_policy() {
        let zero = TransactionDraft::new().title("x").date("2024-03-01").amount("0");
        assert!(zero.resolve(None, AmountPolicy::Positive).is_err());
        assert!(zero.resolve(None, AmountPolicy::NonNegative).is_ok());
        let negative = TransactionDraft::new().title("x").date("2024-03-01").amount("-2");
        assert!(negative.resolve(None, AmountPolicy::NonNegative).is_err());
    }

    #[test]
    fn test_resolve_merges_over_base() {
        let base = stored_expense();
        let fields = TransactionDraft::new()
            .amount("650")
            .resolve(Some(&base), AmountPolicy::Positive)
            .unwrap();
        assert_eq!(fields.title, "Venue");
        assert_eq!(fields.category, "Events");
        assert_eq!(fields.notes, "deposit");
        assert_eq!(fields.amount, Amount::from_str("650").unwrap());
    }

    #[test]
    fn test_resolve_switching_income_to_expense_drops_sentinel() {
        let mut base = stored_expense();
        base.kind = TransactionType::Income;
        base.category = INCOME_CATEGORY.into();
        let fields = TransactionDraft::new()
            .kind(TransactionType::Expense)
            .resolve(Some(&base), AmountPolicy::Positive)
            .unwrap();
        assert_eq!(fields.category, FALLBACK_EXPENSE_CATEGORY);
    }

    #[test]
    fn test_resolve_rejects_cleared_title_on_edit() {
        let base = stored_expense();
        let draft = TransactionDraft::new().title("   ");
        assert!(draft.resolve(Some(&base), AmountPolicy::Positive).is_err());
    }

    #[test]
    fn test_parse_date_accepts_timestamp() {
        let date = parse_date("2024-03-01T10:00:00Z").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    }

    #[test]
    fn test_transaction_json_shape() {
        let json = serde_json::to_value(stored_expense()).unwrap();
        assert_eq!(json["type"], "expense");
        assert_eq!(json["date"], "2024-03-01");
        assert_eq!(json["amount"], 500);
        assert_eq!(json["email"], "a@b.com");
    }

    #[test]
    fn test_transaction_reads_owner_alias_and_null_notes() {
        let json = r#"{"id":"x","date":"2024-01-02","title":"T","type":"income",
            "category":"Income","amount":"10.5","notes":null,"owner":"o@x.com"}"#;
        let txn: Transaction = serde_json::from_str(json).unwrap();
        assert_eq!(txn.owner(), "o@x.com");
        assert_eq!(txn.notes(), "");
        assert_eq!(txn.month(), "2024-01");
    }

    #[test]
    fn test_draft_amount_accepts_number_or_text() {
        let draft: TransactionDraft =
            serde_json::from_str(r#"{"title":"a","amount":12}"#).unwrap();
        assert_eq!(draft.amount, Some(AmountInput::Number(12.0)));
        let draft: TransactionDraft =
            serde_json::from_str(r#"{"title":"a","amount":"12"}"#).unwrap();
        assert_eq!(draft.amount, Some(AmountInput::Text("12".into())));
    }
}
