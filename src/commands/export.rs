use crate::args::ExportArgs;
use crate::commands::{current_user, Out};
use crate::reconcile::FileFormat;
use crate::{utils, Config, Result};
use chrono::{Local, Utc};
use std::path::PathBuf;

/// Writes the signed-in user's data to a file.
///
/// JSON produces a full backup document (owner, time of export, categories and every
/// transaction). CSV produces one row per transaction. Without `--output` the file is named after
/// the user and written to the current directory.
pub async fn export(config: &Config, args: &ExportArgs) -> Result<Out<PathBuf>> {
    let ledger = config.ledger()?;
    let ctx = current_user(&ledger)?;
    let (content, count, default_name) = match args.format() {
        FileFormat::Json => {
            let document = ledger.export_document(&ctx, Utc::now());
            let name = format!(
                "cem_backup_{}_{}.json",
                ctx.scope(),
                Local::now().format("%Y-%m-%d")
            );
            (document.to_json()?, document.expenses().len(), name)
        }
        FileFormat::Csv => {
            let count = ledger.transactions(&ctx).len();
            let name = format!("cem_{}_transactions.csv", ctx.scope());
            (ledger.export_csv(&ctx, args.columns())?, count, name)
        }
    };
    let path = args
        .output()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from(default_name));
    utils::write(&path, content).await?;
    Ok(Out::new(
        format!(
            "Exported {count} transactions as {} to '{}'",
            args.format(),
            path.display()
        ),
        path,
    ))
}
