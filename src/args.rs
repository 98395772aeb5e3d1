//! These structs provide the CLI interface for the cem CLI.

use crate::model::{TransactionDraft, TransactionType};
use crate::reconcile::{CsvColumns, FileFormat, MergeMode};
use crate::view::{CategoryFilter, FilterSpec, TypeFilter};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// cem: keep track of a club's income and expenses.
///
/// Records are kept on this machine, one set per signed-in email address. Sign in with
/// `cem login --email you@example.com`, then add, list and summarize transactions. Everything can
/// be exported to JSON or CSV and imported back.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the data directory and the default configuration file.
    ///
    /// This is the first command you should run. The directory is $HOME/cem unless you pass
    /// --cem-home or set CEM_HOME.
    Init,
    /// Sign in as the given email. Later commands act on this user's data.
    Login(LoginArgs),
    /// Forget who signed in last. Stored data is kept.
    Logout,
    /// Show who is signed in.
    Whoami,
    /// Record a new income or expense.
    Add(TransactionArgs),
    /// Change fields of an existing transaction.
    Edit(EditArgs),
    /// Delete a transaction.
    Delete(DeleteArgs),
    /// List transactions, newest first.
    List(FilterArgs),
    /// Manage expense categories.
    Categories(CategoriesArgs),
    /// Show totals and breakdowns by category and month.
    Summary(FilterArgs),
    /// Write the signed-in user's data to a JSON backup or a CSV file.
    Export(ExportArgs),
    /// Read transactions from a JSON backup or a CSV file.
    Import(ImportArgs),
    /// Save a JSON backup to $CEM_HOME/.backups, keeping the newest few.
    Backup,
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where cem data and configuration is held. Defaults to ~/cem
    #[arg(long, env = "CEM_HOME", default_value_t = default_cem_home())]
    cem_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, cem_home: PathBuf) -> Self {
        Self {
            log_level,
            cem_home: cem_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn cem_home(&self) -> &DisplayPath {
        &self.cem_home
    }
}

/// Args for the `cem login` command.
#[derive(Debug, Parser, Clone)]
pub struct LoginArgs {
    /// Your email address. It identifies your data.
    #[arg(long)]
    email: String,

    /// The name to greet you with. Keeps the previous name if left out.
    #[arg(long)]
    name: Option<String>,
}

impl LoginArgs {
    pub fn new(email: impl Into<String>, name: Option<String>) -> Self {
        Self {
            email: email.into(),
            name,
        }
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

/// The fields of a transaction. Fields left out are defaulted when adding and kept when editing.
#[derive(Debug, Parser, Clone, Default)]
pub struct TransactionArgs {
    /// The date, as YYYY-MM-DD. Defaults to today when adding.
    #[arg(long)]
    date: Option<String>,

    /// A short description.
    #[arg(long)]
    title: Option<String>,

    /// income or expense. Defaults to expense when adding.
    #[arg(long = "type")]
    kind: Option<TransactionType>,

    /// The expense category. Created if it does not exist. Ignored for income.
    #[arg(long)]
    category: Option<String>,

    /// The amount, e.g. 1250 or 1,250.50
    #[arg(long)]
    amount: Option<String>,

    /// Free-form notes.
    #[arg(long)]
    notes: Option<String>,
}

impl TransactionArgs {
    pub fn new(
        date: Option<String>,
        title: Option<String>,
        kind: Option<TransactionType>,
        category: Option<String>,
        amount: Option<String>,
        notes: Option<String>,
    ) -> Self {
        Self {
            date,
            title,
            kind,
            category,
            amount,
            notes,
        }
    }

    pub fn date(&self) -> Option<&str> {
        self.date.as_deref()
    }

    /// The fields as a draft for the ledger.
    pub fn draft(&self) -> TransactionDraft {
        TransactionDraft {
            date: self.date.clone(),
            title: self.title.clone(),
            kind: self.kind.map(|k| k.to_string()),
            category: self.category.clone(),
            amount: self.amount.clone().map(Into::into),
            notes: self.notes.clone(),
            ..Default::default()
        }
    }
}

/// Args for the `cem edit` command.
#[derive(Debug, Parser, Clone)]
pub struct EditArgs {
    /// The id of the transaction, as shown by `cem list`.
    id: String,

    #[clap(flatten)]
    fields: TransactionArgs,
}

impl EditArgs {
    pub fn new(id: impl Into<String>, fields: TransactionArgs) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn fields(&self) -> &TransactionArgs {
        &self.fields
    }
}

/// Args for the `cem delete` command.
#[derive(Debug, Parser, Clone)]
pub struct DeleteArgs {
    /// The id of the transaction, as shown by `cem list`.
    id: String,
}

impl DeleteArgs {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

/// Filters shared by `cem list` and `cem summary`.
#[derive(Debug, Parser, Clone, Default)]
pub struct FilterArgs {
    /// Only transactions on or after this date (YYYY-MM-DD).
    #[arg(long)]
    from: Option<NaiveDate>,

    /// Only transactions on or before this date (YYYY-MM-DD).
    #[arg(long)]
    to: Option<NaiveDate>,

    /// all, income or expense
    #[arg(long = "type", default_value_t = TypeFilter::All)]
    kind: TypeFilter,

    /// Only this category. "Income" selects income.
    #[arg(long)]
    category: Option<String>,

    /// Only transactions whose title or notes contain this text, ignoring case.
    #[arg(long)]
    search: Option<String>,
}

impl FilterArgs {
    pub fn new(
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        kind: TypeFilter,
        category: Option<String>,
        search: Option<String>,
    ) -> Self {
        Self {
            from,
            to,
            kind,
            category,
            search,
        }
    }

    pub fn spec(&self) -> FilterSpec {
        let category = match self.category.as_deref() {
            Some(name) => match CategoryFilter::from_str(name) {
                Ok(filter) => filter,
                Err(never) => match never {},
            },
            None => CategoryFilter::All,
        };
        FilterSpec {
            date_from: self.from,
            date_to: self.to,
            kind: self.kind,
            category,
            search: self.search.clone(),
        }
    }
}

/// Args for the `cem categories` command.
#[derive(Debug, Parser, Clone)]
pub struct CategoriesArgs {
    #[command(subcommand)]
    action: CategoriesAction,
}

impl CategoriesArgs {
    pub fn new(action: CategoriesAction) -> Self {
        Self { action }
    }

    pub fn action(&self) -> &CategoriesAction {
        &self.action
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum CategoriesAction {
    /// Show the categories in the order they were added.
    List,
    /// Add a category.
    Add {
        /// The category name.
        name: String,
    },
    /// Remove a category that no expense uses.
    Remove {
        /// The exact category name.
        name: String,
    },
}

/// Args for the `cem export` command.
#[derive(Debug, Parser, Clone)]
pub struct ExportArgs {
    /// json or csv
    format: FileFormat,

    /// Where to write the file. Defaults to a file named after your email in the current
    /// directory.
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Which columns a CSV export carries: full (with email and id) or basic.
    #[arg(long, value_enum, default_value_t = CsvColumns::Full)]
    columns: CsvColumns,
}

impl ExportArgs {
    pub fn new(format: FileFormat, output: Option<PathBuf>, columns: CsvColumns) -> Self {
        Self {
            format,
            output,
            columns,
        }
    }

    pub fn format(&self) -> FileFormat {
        self.format
    }

    pub fn output(&self) -> Option<&Path> {
        self.output.as_deref()
    }

    pub fn columns(&self) -> CsvColumns {
        self.columns
    }
}

/// Args for the `cem import` command.
#[derive(Debug, Parser, Clone)]
pub struct ImportArgs {
    /// The JSON backup or CSV file to read.
    file: PathBuf,

    /// json or csv. Guessed from the file name or content when left out.
    #[arg(long, value_enum)]
    format: Option<FileFormat>,

    /// merge keeps your existing transactions, replace discards them first.
    #[arg(long, value_enum, default_value_t = MergeMode::Merge)]
    mode: MergeMode,

    /// Import a backup that belongs to another email without asking.
    #[arg(long, short)]
    yes: bool,
}

impl ImportArgs {
    pub fn new(
        file: impl Into<PathBuf>,
        format: Option<FileFormat>,
        mode: MergeMode,
        yes: bool,
    ) -> Self {
        Self {
            file: file.into(),
            format,
            mode,
            yes,
        }
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    pub fn format(&self) -> Option<FileFormat> {
        self.format
    }

    pub fn mode(&self) -> MergeMode {
        self.mode
    }

    pub fn yes(&self) -> bool {
        self.yes
    }
}

fn default_cem_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("cem"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --cem-home or CEM_HOME instead of relying on the default \
                cem home directory. If you continue using the program right now, you may have \
                problems!",
            );
            PathBuf::from("cem")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn new(path: PathBuf) -> Self {
        Self(path)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        <Args as CommandFactory>::command().debug_assert();
    }

    #[test]
    fn test_parse_add() {
        let args = Args::try_parse_from([
            "cem",
            "--cem-home",
            "/tmp/cem",
            "add",
            "--title",
            "Venue",
            "--type",
            "expense",
            "--category",
            "Events",
            "--amount",
            "500",
        ])
        .unwrap();
        assert_eq!(args.common().cem_home().path(), Path::new("/tmp/cem"));
        let Command::Add(fields) = args.command() else {
            panic!("expected add, got {:?}", args.command());
        };
        let draft = fields.draft();
        assert_eq!(draft.title.as_deref(), Some("Venue"));
        assert_eq!(draft.kind.as_deref(), Some("expense"));
        assert_eq!(draft.amount, Some("500".into()));
        assert_eq!(draft.date, None);
    }

    #[test]
    fn test_parse_import() {
        let args = Args::try_parse_from([
            "cem", "import", "backup.json", "--mode", "replace", "--yes",
        ])
        .unwrap();
        let Command::Import(import) = args.command() else {
            panic!("expected import, got {:?}", args.command());
        };
        assert_eq!(import.file(), Path::new("backup.json"));
        assert_eq!(import.mode(), MergeMode::Replace);
        assert_eq!(import.format(), None);
        assert!(import.yes());
    }

    #[test]
    fn test_filter_spec() {
        let args = Args::try_parse_from([
            "cem", "list", "--from", "2024-01-01", "--type", "income", "--category", "all",
        ])
        .unwrap();
        let Command::List(filter) = args.command() else {
            panic!("expected list, got {:?}", args.command());
        };
        let spec = filter.spec();
        assert_eq!(spec.date_from, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(spec.kind, TypeFilter::Income);
        assert_eq!(spec.category, CategoryFilter::All);
    }
}
