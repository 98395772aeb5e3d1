use crate::args::ImportArgs;
use crate::commands::{current_user, Out};
use crate::error::StoreError;
use crate::reconcile::{FileFormat, ImportOptions, ImportPayload, ImportReport};
use crate::{utils, Config, Result};
use anyhow::{bail, Context};
use tracing::{debug, info};

/// Reads a JSON backup or CSV file and adds its transactions to the signed-in user's data.
///
/// The file is read and parsed completely before anything is stored, so a file that cannot be
/// parsed changes nothing. When a backup declares a different owner, `confirm` is asked (unless
/// `--yes` was given) and the import stops if it answers no.
pub async fn import<F>(
    config: &Config,
    args: &ImportArgs,
    confirm: F,
) -> Result<Out<ImportReport>>
where
    F: FnOnce(&str) -> Result<bool>,
{
    let content = utils::read(args.file()).await?;
    let format = args
        .format()
        .unwrap_or_else(|| FileFormat::detect(Some(args.file()), &content));
    debug!("Importing '{}' as {format}", args.file().display());
    let payload = ImportPayload::parse(&content, format)
        .with_context(|| format!("Unable to import '{}'", args.file().display()))?;

    let mut ledger = config.ledger()?;
    let ctx = current_user(&ledger)?;
    let options = ImportOptions::new(args.mode()).allow_foreign_owner(args.yes());
    let report = match ledger.import(&ctx, &payload, options) {
        Ok(report) => report,
        Err(StoreError::OwnershipMismatch { declared, current }) => {
            let prompt = format!(
                "This backup belongs to {declared}. Import it into {current}'s data anyway?"
            );
            if !confirm(&prompt)? {
                bail!("Import cancelled, the backup belongs to {declared}")
            }
            info!("Importing a backup from {declared}");
            ledger.import(&ctx, &payload, options.allow_foreign_owner(true))?
        }
        Err(e) => return Err(e.into()),
    };
    Ok(Out::new(report.to_string(), report))
}
