use anyhow::{Context, Result};
use std::io::{ErrorKind, Write};
use std::path::Path;

pub(crate) fn create_dir_all(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    std::fs::create_dir_all(path).context(format!("Unable to create directory {}", path.display()))
}

/// Reads a file, returning `None` when it does not exist.
pub(crate) fn read_optional(path: impl AsRef<Path>) -> Result<Option<String>> {
    let path = path.as_ref();
    match std::fs::read_to_string(path) {
        Ok(s) => Ok(Some(s)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).context(format!("Unable to read file {}", path.display())),
    }
}

/// Writes `data` next to `path` and then renames it into place so readers never see a partial file.
pub(crate) fn write_replace(path: impl AsRef<Path>, data: &[u8]) -> Result<()> {
    let path = path.as_ref();
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = Path::new(&tmp);
    {
        let mut f = std::fs::File::create(tmp)
            .context(format!("Unable to create file {}", tmp.display()))?;
        f.write_all(data)
            .context(format!("Unable to write data to {}", tmp.display()))?;
        f.sync_all()
            .context(format!("Unable to flush {}", tmp.display()))?;
    }
    std::fs::rename(tmp, path).context(format!(
        "Unable to move {} to {}",
        tmp.display(),
        path.display()
    ))
}

/// Removes a file. A file that is already gone is fine.
pub(crate) fn remove_file(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    match std::fs::remove_file(path) {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).context(format!("Unable to remove {}", path.display())),
    }
}
