use crate::fs;
use crate::storage::KeyValueStore;
use crate::Result;
use std::fmt::Write;
use std::path::{Path, PathBuf};

/// Keeps each key as its own `.json` file inside one directory.
///
/// Key characters outside `[A-Za-z0-9._-]` are percent-escaped in the file name, so
/// `cem_expenses::ann_club.org` lives in `cem_expenses%3A%3Aann_club.org.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Opens the store at `root`, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, key: &str) -> PathBuf {
        self.root.join(file_name(key))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        fs::read_optional(self.path(key))
    }

    fn set(&mut self, key: &str, value: String) -> Result<()> {
        fs::write_replace(self.path(key), value.as_bytes())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        fs::remove_file(self.path(key))
    }
}

fn file_name(key: &str) -> String {
    let mut name = String::with_capacity(key.len() + 5);
    for b in key.bytes() {
        match b {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'.' | b'_' | b'-' => name.push(b as char),
            _ => {
                let _ = write!(name, "%{b:02X}");
            }
        }
    }
    name.push_str(".json");
    name
}
