//! Reading CSV text into transaction drafts.
//!
//! The tokenizer is a small state machine over RFC 4180 quoting: a field that starts with `"` runs
//! until the next lone `"`, a doubled `""` inside it is one literal quote, and `,` or a line break
//! ends a field only outside quotes. `\n`, `\r\n` and a bare `\r` all end a row. It never fails:
//! an unterminated quoted field runs to the end of the input, and a quote in the middle of an
//! unquoted field is kept as text. The `csv` crate is used only for writing.

use crate::error::StoreError;
use crate::model::{AmountInput, TransactionDraft};
use tracing::warn;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
enum State {
    /// Nothing read for the current field yet.
    FieldStart,
    Unquoted,
    Quoted,
    /// Just saw a `"` inside a quoted field. Either an escaped quote or the closing quote.
    QuoteInQuoted,
}

/// Splits `text` into rows of fields.
pub(crate) fn tokenize(text: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut row = Vec::new();
    let mut field = String::new();
    let mut state = State::FieldStart;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match (state, c) {
            (State::Quoted, '"') => state = State::QuoteInQuoted,
            (State::Quoted, c) => field.push(c),
            (State::QuoteInQuoted, '"') => {
                field.push('"');
                state = State::Quoted;
            }
            (State::FieldStart, '"') => state = State::Quoted,
            (_, ',') => {
                row.push(std::mem::take(&mut field));
                state = State::FieldStart;
            }
            (_, '\n') | (_, '\r') => {
                if c == '\r' && chars.peek() == Some(&'\n') {
                    chars.next();
                }
                row.push(std::mem::take(&mut field));
                rows.push(std::mem::take(&mut row));
                state = State::FieldStart;
            }
            (_, c) => {
                field.push(c);
                state = State::Unquoted;
            }
        }
    }

    let at_row_start = state == State::FieldStart && field.is_empty() && row.is_empty();
    if !at_row_start {
        row.push(field);
        rows.push(row);
    }
    rows
}

const REQUIRED: [&str; 3] = ["date", "title", "amount"];

/// Column positions, found by case-insensitive header name.
#[derive(Debug)]
struct Columns {
    email: Option<usize>,
    id: Option<usize>,
    date: usize,
    title: usize,
    kind: Option<usize>,
    category: Option<usize>,
    amount: usize,
    notes: Option<usize>,
    width: usize,
}

impl Columns {
    fn from_header(header: &[String]) -> Result<Self, StoreError> {
        let names: Vec<String> = header.iter().map(|h| h.trim().to_lowercase()).collect();
        let find = |name: &str| names.iter().position(|n| n == name);
        let missing: Vec<&str> = REQUIRED
            .iter()
            .copied()
            .filter(|&name| find(name).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(StoreError::Format(format!(
                "the CSV header is missing the column(s): {}",
                missing.join(", ")
            )));
        }
        Ok(Self {
            email: find("email"),
            id: find("id"),
            date: find("date").unwrap_or_default(),
            title: find("title").unwrap_or_default(),
            kind: find("type"),
            category: find("category"),
            amount: find("amount").unwrap_or_default(),
            notes: find("notes"),
            width: names.len(),
        })
    }
}

/// The drafts read from a CSV document and the number of rows that were dropped on the way.
#[derive(Debug, Default)]
pub(crate) struct CsvRecords {
    pub(crate) drafts: Vec<TransactionDraft>,
    pub(crate) skipped: usize,
}

/// Reads a header row followed by data rows.
///
/// A header without `date`, `title` and `amount` columns fails the whole document. A data row with
/// the wrong number of fields or an empty amount is skipped and counted. Blank lines are ignored.
pub(crate) fn read_records(text: &str) -> Result<CsvRecords, StoreError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut rows = tokenize(text).into_iter().filter(|r| !is_blank(r));
    let header = rows
        .next()
        .ok_or_else(|| StoreError::Format("the CSV document is empty".to_string()))?;
    let columns = Columns::from_header(&header)?;

    let mut records = CsvRecords::default();
    // Line numbers are counted among non-blank rows, with the header as row 1.
    for (row_number, row) in (2..).zip(rows) {
        if row.len() != columns.width {
            warn!(
                "Skipping CSV row {row_number}: it has {} fields, the header has {}",
                row.len(),
                columns.width
            );
            records.skipped += 1;
            continue;
        }
        let amount = row[columns.amount].trim();
        if amount.is_empty() {
            warn!("Skipping CSV row {row_number}: the amount is empty");
            records.skipped += 1;
            continue;
        }
        let cell = |index: Option<usize>| {
            index
                .map(|i| row[i].trim())
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        records.drafts.push(TransactionDraft {
            id: cell(columns.id),
            date: cell(Some(columns.date)),
            title: cell(Some(columns.title)),
            kind: cell(columns.kind),
            category: cell(columns.category),
            amount: Some(AmountInput::from(amount)),
            notes: cell(columns.notes),
            email: cell(columns.email),
        });
    }
    Ok(records)
}

fn is_blank(row: &[String]) -> bool {
    row.iter().all(|f| f.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(v: &[&[&str]]) -> Vec<Vec<String>> {
        v.iter()
            .map(|r| r.iter().map(|f| f.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_tokenize_plain() {
        assert_eq!(
            tokenize("a,b,c\n1,2,3\n"),
            rows(&[&["a", "b", "c"], &["1", "2", "3"]])
        );
        // No trailing newline.
        assert_eq!(tokenize("a,b\n1,2"), rows(&[&["a", "b"], &["1", "2"]]));
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn test_tokenize_quoted_fields() {
        let text = "title,notes\n\"Pizza, large\",\"said \"\"hi\"\"\"\n\"two\nlines\",x\n";
        assert_eq!(
            tokenize(text),
            rows(&[
                &["title", "notes"],
                &["Pizza, large", "said \"hi\""],
                &["two\nlines", "x"]
            ])
        );
    }

    #[test]
    fn test_tokenize_empty_fields_and_crlf() {
        assert_eq!(
            tokenize("a,,c\r\n,,\r\n\"\",x"),
            rows(&[&["a", "", "c"], &["", "", ""], &["", "x"]])
        );
        assert_eq!(tokenize("a,\n"), rows(&[&["a", ""]]));
    }

    #[test]
    fn test_tokenize_is_lenient() {
        // Unterminated quote runs to the end.
        assert_eq!(tokenize("\"abc,def\nx"), rows(&[&["abc,def\nx"]]));
        // A stray quote inside an unquoted field is text.
        assert_eq!(tokenize("5\" pipe,x"), rows(&[&["5\" pipe", "x"]]));
    }

    #[test]
    fn test_read_records_skips_row_missing_amount() {
        let text = "date,title,type,category,amount\n\
                    2024-03-01,Venue,expense,Events,500\n\
                    2024-03-02,Snacks,expense,Food\n\
                    2024-03-03,Dues,income,,1000\n";
        let records = read_records(text).unwrap();
        assert_eq!(records.skipped, 1);
        assert_eq!(records.drafts.len(), 2);
        assert_eq!(records.drafts[0].title.as_deref(), Some("Venue"));
        assert_eq!(records.drafts[1].category, None);
    }

    #[test]
    fn test_read_records_empty_amount_is_skipped() {
        let text = "date,title,amount\n2024-03-01,Venue,\n2024-03-01,Hall,20\n";
        let records = read_records(text).unwrap();
        assert_eq!(records.skipped, 1);
        assert_eq!(records.drafts.len(), 1);
    }

    #[test]
    fn test_read_records_header_is_case_insensitive_and_reordered() {
        let text = "\u{feff}Amount, Title ,DATE,Notes,EMAIL,Id\n\
                    12.50,Tape,2024-01-01,\"roll, blue\",ann@club.org,abc\n\
                    \n";
        let records = read_records(text).unwrap();
        assert_eq!(records.skipped, 0);
        let draft = &records.drafts[0];
        assert_eq!(draft.title.as_deref(), Some("Tape"));
        assert_eq!(draft.date.as_deref(), Some("2024-01-01"));
        assert_eq!(draft.amount, Some(AmountInput::from("12.50")));
        assert_eq!(draft.notes.as_deref(), Some("roll, blue"));
        assert_eq!(draft.email.as_deref(), Some("ann@club.org"));
        assert_eq!(draft.id.as_deref(), Some("abc"));
        assert_eq!(draft.kind, None);
    }

    #[test]
    fn test_read_records_requires_core_columns() {
        let err = read_records("date,title,type\n2024-01-01,x,expense\n").unwrap_err();
        assert!(matches!(err, StoreError::Format(ref m) if m.contains("amount")));
        assert!(matches!(read_records("\n\n"), Err(StoreError::Format(_))));
    }
}
