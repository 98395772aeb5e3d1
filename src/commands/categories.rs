use crate::args::{CategoriesAction, CategoriesArgs};
use crate::commands::{current_user, Out};
use crate::error::{Notice, StoreError};
use crate::{Config, Result};

/// Lists, adds or removes the signed-in user's expense categories.
///
/// Adding a name that already exists, in any letter case, is not an error. The message says so
/// and nothing changes.
pub async fn categories(config: &Config, args: &CategoriesArgs) -> Result<Out<Vec<String>>> {
    let mut ledger = config.ledger()?;
    let ctx = current_user(&ledger)?;
    let message = match args.action() {
        CategoriesAction::List => {
            let categories = ledger.categories(&ctx);
            format!("{} categories: {}", categories.len(), categories.names().join(", "))
        }
        CategoriesAction::Add { name } => match ledger.add_category(&ctx, name) {
            Ok(stored) => Notice::success(format!("Added category '{stored}'")).to_string(),
            Err(e @ StoreError::DuplicateCategory(_)) => Notice::from(&e).to_string(),
            Err(e) => return Err(e.into()),
        },
        CategoriesAction::Remove { name } => {
            ledger.remove_category(&ctx, name)?;
            Notice::success(format!("Removed category '{name}'")).to_string()
        }
    };
    let names = ledger.categories(&ctx).into();
    Ok(Out::new(message, names))
}
