use clap::Parser;
use club_expenses::args::{Args, Command};
use club_expenses::{commands, Config, Result};
use dialoguer::Confirm;
use std::process::ExitCode;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().cem_home().path();

    let _: () = match args.command() {
        Command::Init => commands::init(home).await?.print(),

        Command::Login(login_args) => {
            let config = Config::load(home).await?;
            commands::login(&config, login_args).await?.print()
        }

        Command::Logout => commands::logout(&Config::load(home).await?)
            .await?
            .print(),

        Command::Whoami => commands::whoami(&Config::load(home).await?)
            .await?
            .print(),

        Command::Add(fields) => {
            let config = Config::load(home).await?;
            commands::add(&config, fields).await?.print()
        }

        Command::Edit(edit_args) => {
            let config = Config::load(home).await?;
            commands::edit(&config, edit_args).await?.print()
        }

        Command::Delete(delete_args) => {
            let config = Config::load(home).await?;
            commands::delete(&config, delete_args).await?.print()
        }

        Command::List(filter) => {
            let config = Config::load(home).await?;
            commands::list(&config, filter).await?.print()
        }

        Command::Categories(categories_args) => {
            let config = Config::load(home).await?;
            commands::categories(&config, categories_args)
                .await?
                .print()
        }

        Command::Summary(filter) => {
            let config = Config::load(home).await?;
            commands::summary(&config, filter).await?.print()
        }

        Command::Export(export_args) => {
            let config = Config::load(home).await?;
            commands::export(&config, export_args).await?.print()
        }

        Command::Import(import_args) => {
            let config = Config::load(home).await?;
            commands::import(&config, import_args, confirm)
                .await?
                .print()
        }

        Command::Backup => commands::backup(&Config::load(home).await?)
            .await?
            .print(),
    };
    Ok(())
}

/// Asks a yes/no question on the terminal. The answer defaults to no.
fn confirm(prompt: &str) -> Result<bool> {
    Ok(Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()?)
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use default log level for this crate only.
            EnvFilter::new(format!(
                "{}={},{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                level,
                env!("CARGO_BIN_NAME"),
                level
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
