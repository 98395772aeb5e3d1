use crate::model::{Categories, Transaction};
use crate::Result;
use anyhow::{anyhow, Context};
use chrono::{DateTime, SecondsFormat, Utc};
use csv::{QuoteStyle, Terminator, WriterBuilder};
use serde::{Deserialize, Serialize};

/// A full backup of one user's data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupDocument {
    owner_email: String,
    exported_at: DateTime<Utc>,
    categories: Categories,
    expenses: Vec<Transaction>,
}

impl BackupDocument {
    pub(crate) fn new(
        owner_email: impl Into<String>,
        exported_at: DateTime<Utc>,
        categories: Categories,
        expenses: Vec<Transaction>,
    ) -> Self {
        Self {
            owner_email: owner_email.into(),
            exported_at,
            categories,
            expenses,
        }
    }

    pub fn owner_email(&self) -> &str {
        &self.owner_email
    }

    pub fn exported_at(&self) -> DateTime<Utc> {
        self.exported_at
    }

    pub fn categories(&self) -> &Categories {
        &self.categories
    }

    pub fn expenses(&self) -> &[Transaction] {
        &self.expenses
    }

    /// Pretty-printed JSON, the format `import` reads back.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Unable to serialize the backup document")
    }

    /// The timestamp as written in file names and messages.
    pub fn exported_at_rfc3339(&self) -> String {
        self.exported_at.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

/// Which columns a CSV export carries.
#[derive(
    Debug, Clone, Copy, Default, Eq, PartialEq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum CsvColumns {
    /// `date,title,type,category,amount,notes`
    Basic,
    /// `email,id` followed by the basic columns.
    #[default]
    Full,
}

serde_plain::derive_display_from_serialize!(CsvColumns);
serde_plain::derive_fromstr_from_deserialize!(CsvColumns);

const BASIC_HEADER: [&str; 6] = ["date", "title", "type", "category", "amount", "notes"];

/// Writes `transactions` as CSV with a header row. Fields are quoted only when they contain a
/// comma, a quote or a line break, and embedded quotes are doubled.
pub fn to_csv(transactions: &[Transaction], owner: &str, columns: CsvColumns) -> Result<String> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Necessary)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    let mut header: Vec<&str> = Vec::with_capacity(8);
    if columns == CsvColumns::Full {
        header.extend(["email", "id"]);
    }
    header.extend(BASIC_HEADER);
    writer
        .write_record(&header)
        .context("Unable to write the CSV header")?;

    for t in transactions {
        let mut record: Vec<String> = Vec::with_capacity(header.len());
        if columns == CsvColumns::Full {
            record.push(owner.to_string());
            record.push(t.id().to_string());
        }
        record.extend([
            t.date().format("%Y-%m-%d").to_string(),
            t.title().to_string(),
            t.kind().to_string(),
            t.category().to_string(),
            t.amount().to_string(),
            t.notes().to_string(),
        ]);
        writer
            .write_record(&record)
            .with_context(|| format!("Unable to write transaction {} as CSV", t.id()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow!("Unable to finish the CSV export: {}", e.error()))?;
    String::from_utf8(bytes).context("The CSV export was not valid UTF-8")
}
