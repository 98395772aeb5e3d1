//! Error types.
//!
//! Plumbing (configuration, files, command handlers) uses `anyhow` through the crate-level
//! [`Result`] alias. The ledger itself returns [`StoreError`] so that callers can tell a rejected
//! edit apart from a duplicate category or an import that needs confirmation.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub type Error = anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// The outcomes of a ledger operation that did not apply.
///
/// None of these leave a partial change behind in the collection that the operation targeted.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A required field is missing or a value could not be understood.
    #[error("{0}")]
    Validation(String),

    /// An update referenced a transaction id that does not exist for this user.
    #[error("transaction '{0}' was not found")]
    NotFound(String),

    /// At least one expense still uses the category.
    #[error("category '{0}' is in use by at least one expense")]
    CategoryInUse(String),

    /// A category with the same name, ignoring case, already exists.
    #[error("category '{0}' already exists")]
    DuplicateCategory(String),

    /// There is no category with exactly this name.
    #[error("category '{0}' does not exist")]
    CategoryNotFound(String),

    /// An import payload could not be parsed as a whole.
    #[error("invalid format: {0}")]
    Format(String),

    /// The backup document belongs to someone else. The caller decides whether to go ahead.
    #[error("backup belongs to {declared}, not {current}")]
    OwnershipMismatch { declared: String, current: String },

    /// The key-value backend failed to write.
    #[error("storage failure: {0}")]
    Storage(#[source] anyhow::Error),
}

impl StoreError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        StoreError::Validation(message.into())
    }

    /// How a user-facing notice for this outcome should be presented.
    pub fn severity(&self) -> Severity {
        match self {
            StoreError::DuplicateCategory(_) | StoreError::OwnershipMismatch { .. } => {
                Severity::Info
            }
            _ => Severity::Error,
        }
    }
}

/// The presentation level of a [`Notice`].
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Success,
    Info,
}

serde_plain::derive_display_from_serialize!(Severity);
serde_plain::derive_fromstr_from_deserialize!(Severity);

/// A short, transient message about the outcome of an operation.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Notice {
    severity: Severity,
    message: String,
}

impl Notice {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(Severity::Success, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Severity::Info, message)
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<&StoreError> for Notice {
    fn from(error: &StoreError) -> Self {
        Notice::new(error.severity(), error.to_string())
    }
}

impl Display for Notice {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.severity, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_category_is_not_an_error_notice() {
        let err = StoreError::DuplicateCategory("Food".into());
        let notice = Notice::from(&err);
        assert_eq!(notice.severity(), Severity::Info);
        assert_eq!(notice.message(), "category 'Food' already exists");
    }

    #[test]
    fn test_in_use_is_an_error_notice() {
        let err = StoreError::CategoryInUse("Events".into());
        assert_eq!(err.severity(), Severity::Error);
    }

    #[test]
    fn test_notice_display() {
        let notice = Notice::success("Saved");
        assert_eq!(notice.to_string(), "[success] Saved");
    }
}
