use crate::commands::{current_user, Out};
use crate::{Config, Result};
use chrono::Utc;
use std::path::PathBuf;

/// Saves a JSON backup of the signed-in user's data to `$CEM_HOME/.backups`. Only the newest
/// `backup_copies` files per user are kept.
pub async fn backup(config: &Config) -> Result<Out<PathBuf>> {
    let ledger = config.ledger()?;
    let ctx = current_user(&ledger)?;
    let document = ledger.export_document(&ctx, Utc::now());
    let path = config.backup().save(ctx.scope(), &document).await?;
    Ok(Out::new(
        format!(
            "Backed up {} transactions to '{}'",
            document.expenses().len(),
            path.display()
        ),
        path,
    ))
}
