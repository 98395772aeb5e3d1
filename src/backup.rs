//! Backup files written to `$CEM_HOME/.backups`.

use crate::model::ScopeKey;
use crate::reconcile::BackupDocument;
use crate::{utils, Config, Result};
use anyhow::Context;
use chrono::{Local, NaiveDate};
use std::path::PathBuf;

/// Prefix shared by every backup file name. The user's scope key follows it.
pub const PREFIX: &str = "cem_backup";

const EXTENSION: &str = "json";

/// Manages backup file creation and rotation.
///
/// The `Backup` struct is immutable and owns copies of the paths and settings it needs.
/// Create a new instance via `Config::backup()` or `Backup::new()`.
#[derive(Debug, Clone)]
pub struct Backup {
    backups_dir: PathBuf,
    backup_copies: u32,
}

impl Backup {
    /// Creates a new `Backup` instance from a `Config`.
    pub fn new(config: &Config) -> Self {
        Self {
            backups_dir: config.backups().to_path_buf(),
            backup_copies: config.backup_copies(),
        }
    }

    /// Saves `document` as a pretty-printed JSON backup file for the user at `scope`.
    ///
    /// The filename format is `cem_backup_{scope}.YYYY-MM-DD-NNN.json` where NNN is a sequence
    /// number. Older backups for the same user are rotated so only `backup_copies` remain.
    ///
    /// Returns the path to the created backup file.
    pub async fn save(&self, scope: &ScopeKey, document: &BackupDocument) -> Result<PathBuf> {
        let prefix = format!("{PREFIX}_{scope}");
        let date = today();
        let seq = self.next_sequence_number(&prefix, &date).await?;
        let filename = format!("{prefix}.{date}-{seq:03}.{EXTENSION}");
        let path = self.backups_dir.join(&filename);

        let json = document
            .to_json()
            .context("Failed to serialize the backup document")?;
        utils::write(&path, json).await?;

        self.rotate(&prefix).await?;

        Ok(path)
    }

    /// Returns the backup files for the user at `scope`, oldest first.
    pub async fn list(&self, scope: &ScopeKey) -> Result<Vec<PathBuf>> {
        let prefix = format!("{PREFIX}_{scope}");
        Ok(self
            .matching(&prefix)
            .await?
            .into_iter()
            .map(|(path, _)| path)
            .collect())
    }

    /// Scans the backups directory for existing files with the given prefix and date,
    /// and returns the next sequence number.
    async fn next_sequence_number(&self, prefix: &str, date: &str) -> Result<u32> {
        let max_seq = self
            .matching(prefix)
            .await?
            .iter()
            .filter_map(|(_, name)| parse_stamp(name, prefix))
            .filter(|(d, _)| d.format("%Y-%m-%d").to_string() == date)
            .map(|(_, seq)| seq)
            .max()
            .unwrap_or(0);
        Ok(max_seq + 1)
    }

    /// Rotates old backup files, keeping only `backup_copies` files with the given prefix.
    async fn rotate(&self, prefix: &str) -> Result<()> {
        let files = self.matching(prefix).await?;
        let to_delete = files.len().saturating_sub(self.backup_copies as usize);
        for (path, _) in files.into_iter().take(to_delete) {
            utils::remove(&path).await?;
        }
        Ok(())
    }

    /// Backup files for `prefix`, sorted by name, which sorts by date and then sequence number.
    async fn matching(&self, prefix: &str) -> Result<Vec<(PathBuf, String)>> {
        let mut files: Vec<(PathBuf, String)> = Vec::new();
        let mut dir = utils::read_dir(&self.backups_dir).await?;
        while let Some(entry) = dir
            .next_entry()
            .await
            .context("Failed to read directory entry")?
        {
            let name = entry.file_name().to_string_lossy().to_string();
            if parse_stamp(&name, prefix).is_some() {
                files.push((entry.path(), name));
            }
        }
        files.sort_by(|a, b| a.1.cmp(&b.1));
        Ok(files)
    }
}

/// Returns today's date in YYYY-MM-DD format.
fn today() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}

/// Parses `{prefix}.YYYY-MM-DD-NNN.json` into its date and sequence number.
///
/// Returns None for anything else, including files of a user whose scope key merely starts with
/// the same characters.
fn parse_stamp(filename: &str, prefix: &str) -> Option<(NaiveDate, u32)> {
    let stamp = filename
        .strip_prefix(prefix)?
        .strip_prefix('.')?
        .strip_suffix(EXTENSION)?
        .strip_suffix('.')?;
    let (date, seq) = stamp.rsplit_once('-')?;
    if seq.is_empty() || !seq.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    Some((date, seq.parse().ok()?))
}
