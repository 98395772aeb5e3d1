//! Export to, and import from, JSON backups and CSV files.
//!
//! An import runs in two phases. [`ImportPayload::parse`] turns raw text into drafts without
//! touching storage, so it can run after an asynchronous file read and fail without side effects.
//! [`Ledger::import`] then applies the drafts under the same rules as interactive edits.

mod csv_rows;
mod export;

pub use export::{to_csv, BackupDocument, CsvColumns};

use crate::error::StoreError;
use crate::model::{AmountPolicy, Transaction, TransactionDraft, TransactionType, UserContext};
use crate::storage::KeyValueStore;
use crate::store::Ledger;
use crate::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt::{Display, Formatter};
use std::path::Path;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// What happens to the existing transactions when importing.
#[derive(
    Debug, Clone, Copy, Default, Eq, PartialEq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum MergeMode {
    /// Keep existing records. An imported record whose id is already present is skipped.
    #[default]
    Merge,
    /// Discard the existing records first.
    Replace,
}

serde_plain::derive_display_from_serialize!(MergeMode);
serde_plain::derive_fromstr_from_deserialize!(MergeMode);

#[derive(
    Debug, Clone, Copy, Default, Eq, PartialEq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum FileFormat {
    #[default]
    Json,
    Csv,
}

serde_plain::derive_display_from_serialize!(FileFormat);
serde_plain::derive_fromstr_from_deserialize!(FileFormat);

impl FileFormat {
    /// Picks the format from the file extension, falling back to looking at the content.
    pub fn detect(path: Option<&Path>, content: &str) -> Self {
        let extension = path
            .and_then(Path::extension)
            .map(|e| e.to_string_lossy().to_lowercase());
        match extension.as_deref() {
            Some("json") => FileFormat::Json,
            Some("csv") => FileFormat::Csv,
            _ => Self::sniff(content),
        }
    }

    fn sniff(content: &str) -> Self {
        match content.trim_start_matches('\u{feff}').trim_start().chars().next() {
            Some('{') | Some('[') => FileFormat::Json,
            _ => FileFormat::Csv,
        }
    }
}

/// The JSON shape accepted on import. Older exports used the camel-case names.
#[derive(Debug, Default, Deserialize)]
struct JsonBackup {
    #[serde(default, alias = "owner")]
    owner_email: Option<String>,
    #[serde(default, alias = "exportedAt")]
    exported_at: Option<String>,
    #[serde(default)]
    categories: Vec<String>,
    #[serde(default, alias = "transactions")]
    expenses: Vec<TransactionDraft>,
}

/// Parsed import content, not yet applied to anything.
#[derive(Debug, Clone, Default)]
pub struct ImportPayload {
    format: FileFormat,
    owner: Option<String>,
    exported_at: Option<String>,
    categories: Vec<String>,
    records: Vec<TransactionDraft>,
    malformed: usize,
}

impl ImportPayload {
    pub fn parse(content: &str, format: FileFormat) -> std::result::Result<Self, StoreError> {
        match format {
            FileFormat::Json => Self::from_json(content),
            FileFormat::Csv => Self::from_csv(content),
        }
    }

    /// Reads a backup document, or a bare array of transactions.
    ///
    /// Any syntax or shape error fails the whole payload.
    pub fn from_json(content: &str) -> std::result::Result<Self, StoreError> {
        let content = content.trim_start_matches('\u{feff}');
        let value: serde_json::Value = serde_json::from_str(content)
            .map_err(|e| StoreError::Format(format!("not valid JSON: {e}")))?;
        let backup = match value {
            serde_json::Value::Array(_) => JsonBackup {
                expenses: serde_json::from_value(value)
                    .map_err(|e| StoreError::Format(format!("invalid transaction list: {e}")))?,
                ..Default::default()
            },
            serde_json::Value::Object(_) => serde_json::from_value(value)
                .map_err(|e| StoreError::Format(format!("invalid backup document: {e}")))?,
            _ => {
                return Err(StoreError::Format(
                    "expected a backup object or a list of transactions".to_string(),
                ))
            }
        };
        Ok(Self {
            format: FileFormat::Json,
            owner: backup
                .owner_email
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty()),
            exported_at: backup.exported_at,
            categories: backup.categories,
            records: backup.expenses,
            malformed: 0,
        })
    }

    /// Reads CSV with a header row. Bad rows are dropped and counted rather than failing the whole
    /// payload.
    pub fn from_csv(content: &str) -> std::result::Result<Self, StoreError> {
        let records = csv_rows::read_records(content)?;
        Ok(Self {
            format: FileFormat::Csv,
            records: records.drafts,
            malformed: records.skipped,
            ..Default::default()
        })
    }

    pub fn format(&self) -> FileFormat {
        self.format
    }

    /// The owner the document declares for itself. Only JSON backups carry one.
    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    pub fn exported_at(&self) -> Option<&str> {
        self.exported_at.as_deref()
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn records(&self) -> &[TransactionDraft] {
        &self.records
    }

    /// Rows that could not be read at all.
    pub fn malformed(&self) -> usize {
        self.malformed
    }
}

/// How an import should treat existing data and foreign backups.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct ImportOptions {
    pub mode: MergeMode,
    /// Go ahead even though the backup declares a different owner. Records owned by that declared
    /// owner are then taken over by the current user.
    pub allow_foreign_owner: bool,
}

impl ImportOptions {
    pub fn new(mode: MergeMode) -> Self {
        Self {
            mode,
            allow_foreign_owner: false,
        }
    }

    pub fn allow_foreign_owner(mut self, allow: bool) -> Self {
        self.allow_foreign_owner = allow;
        self
    }
}

/// Counts of what an import did.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ImportReport {
    pub mode: MergeMode,
    pub imported: usize,
    /// Skipped because the id already existed.
    pub duplicates: usize,
    /// Skipped because the record belongs to someone else.
    pub foreign: usize,
    /// Skipped because the row or record could not be read or did not validate.
    pub invalid: usize,
    pub categories_added: Vec<String>,
}

impl ImportReport {
    pub fn skipped(&self) -> usize {
        self.duplicates + self.foreign + self.invalid
    }
}

impl Display for ImportReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Import completed ({}): {} imported, {} skipped",
            self.mode,
            self.imported,
            self.skipped()
        )?;
        if self.skipped() > 0 {
            write!(
                f,
                " ({} existing, {} other owner, {} invalid)",
                self.duplicates, self.foreign, self.invalid
            )?;
        }
        if !self.categories_added.is_empty() {
            write!(f, ", new categories: {}", self.categories_added.join(", "))?;
        }
        Ok(())
    }
}

impl<S: KeyValueStore> Ledger<S> {
    /// A snapshot of everything the user owns.
    pub fn export_document(&self, ctx: &UserContext, exported_at: DateTime<Utc>) -> BackupDocument {
        BackupDocument::new(
            ctx.email(),
            exported_at,
            self.categories(ctx),
            self.transactions(ctx),
        )
    }

    /// The user's transactions as CSV.
    pub fn export_csv(&self, ctx: &UserContext, columns: CsvColumns) -> Result<String> {
        to_csv(&self.transactions(ctx), ctx.email(), columns)
    }

    /// Applies a parsed payload to the user's collections.
    ///
    /// If the payload declares an owner other than the current user this fails with
    /// [`StoreError::OwnershipMismatch`] before anything is examined, unless the options allow it.
    /// Records carrying another owner's email are left out. Category names from the payload and
    /// from imported expenses are added to the category list in both modes.
    pub fn import(
        &mut self,
        ctx: &UserContext,
        payload: &ImportPayload,
        options: ImportOptions,
    ) -> std::result::Result<ImportReport, StoreError> {
        let adopted = match payload.owner() {
            Some(declared) if !ctx.identity().is_email(declared) => {
                if !options.allow_foreign_owner {
                    return Err(StoreError::OwnershipMismatch {
                        declared: declared.to_string(),
                        current: ctx.email().to_string(),
                    });
                }
                info!("Importing a backup owned by {declared} into {}", ctx.email());
                Some(declared)
            }
            _ => None,
        };
        let accepts_owner = |email: &str| {
            ctx.identity().is_email(email)
                || adopted.is_some_and(|declared| declared.eq_ignore_ascii_case(email.trim()))
        };

        let mut report = ImportReport {
            mode: options.mode,
            invalid: payload.malformed(),
            ..Default::default()
        };
        let mut categories = self.categories(ctx);
        let mut transactions = match options.mode {
            MergeMode::Merge => self.transactions(ctx),
            MergeMode::Replace => Vec::new(),
        };
        let mut ids: HashSet<String> = transactions.iter().map(|t| t.id().to_string()).collect();

        for name in payload.categories() {
            if categories.push(name) {
                report.categories_added.push(name.trim().to_string());
            }
        }

        for (index, draft) in payload.records().iter().enumerate() {
            if let Some(email) = draft.email.as_deref().filter(|e| !e.trim().is_empty()) {
                if !accepts_owner(email) {
                    debug!("Skipping record {index}: it belongs to {email}");
                    report.foreign += 1;
                    continue;
                }
            }
            let mut fields = match draft.resolve(None, AmountPolicy::NonNegative) {
                Ok(fields) => fields,
                Err(e) => {
                    warn!("Skipping record {index}: {e}");
                    report.invalid += 1;
                    continue;
                }
            };
            let id = match draft.id.as_deref().map(str::trim).filter(|id| !id.is_empty()) {
                Some(id) if ids.contains(id) => {
                    debug!("Skipping record {index}: id {id} already exists");
                    report.duplicates += 1;
                    continue;
                }
                Some(id) => id.to_string(),
                None => Uuid::new_v4().to_string(),
            };
            if fields.kind == TransactionType::Expense {
                if categories.push(&fields.category) {
                    report.categories_added.push(fields.category.clone());
                }
                if let Some(stored) = categories.find(&fields.category) {
                    fields.category = stored.to_string();
                }
            }
            ids.insert(id.clone());
            transactions.push(Transaction::from_fields(
                id,
                ctx.email().to_string(),
                fields,
            ));
            report.imported += 1;
        }

        self.save_categories(ctx, &categories)?;
        self.save_transactions(ctx, &transactions)?;
        info!("{report}");
        Ok(report)
    }
}
