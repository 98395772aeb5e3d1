//! Sign-in state: who the other commands act for.

use crate::args::LoginArgs;
use crate::commands::{current_user, Out};
use crate::model::UserIdentity;
use crate::{Config, Result};
use anyhow::Context;
use tracing::debug;

/// Signs in as the email in `args`. Data stored earlier for the same email, in any letter case,
/// becomes visible again.
pub async fn login(config: &Config, args: &LoginArgs) -> Result<Out<UserIdentity>> {
    let mut ledger = config.ledger()?;
    let previous = ledger.last_user();
    let identity = UserIdentity::new(args.email(), args.name().unwrap_or_default());
    let ctx = ledger
        .remember_user(&identity)
        .context("Unable to sign in")?;
    if let Some(previous) = previous.filter(|p| !p.is_email(ctx.email())) {
        debug!("Switched user from {}", previous.email());
    }
    let stored = ctx.identity().clone();
    let message = match stored.display_name() {
        "" => format!("Signed in as {}", stored.email()),
        name => format!("Signed in as {name} <{}>", stored.email()),
    };
    Ok(Out::new(message, stored))
}

/// Forgets the signed-in user. Their data stays on disk.
pub async fn logout(config: &Config) -> Result<Out<()>> {
    let mut ledger = config.ledger()?;
    match ledger.last_user() {
        Some(identity) => {
            ledger
                .forget_last_user()
                .context("Unable to sign out")?;
            Ok(format!("Signed out {}", identity.email()).into())
        }
        None => Ok("Nobody was signed in".into()),
    }
}

pub async fn whoami(config: &Config) -> Result<Out<UserIdentity>> {
    let ledger = config.ledger()?;
    let ctx = current_user(&ledger)?;
    let identity = ctx.identity().clone();
    let message = match identity.display_name() {
        "" => identity.email().to_string(),
        name => format!("{name} <{}>", identity.email()),
    };
    Ok(Out::new(message, identity))
}
