//! Tripboard CLI - plan a trip with friends from the terminal
//!
//! Every command runs a short sync session: it loads the active trip, applies
//! the change, pushes it, and exits.

mod cli;
mod commands;
mod error;


use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::add::run_add;
use crate::commands::clear::run_clear;
use crate::commands::common::resolve_db_path;
use crate::commands::completions::run_completions;
use crate::commands::config::run_config;
use crate::commands::delete::run_delete;
use crate::commands::details::run_details;
use crate::commands::edit::{run_edit, PlaceEdit};
use crate::commands::history::run_history;
use crate::commands::list::run_list;
use crate::commands::new::run_new;
use crate::commands::open::run_open;
use crate::commands::share::run_share;
use crate::commands::suggest::run_suggest;
use crate::commands::vote::run_vote;
use crate::commands::watch::run_watch;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = "tripboard=info".parse() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let db_path = resolve_db_path(cli.db_path);

    match cli.command {
        Some(Commands::Add { name, fields }) => run_add(&name, fields, &db_path).await?,
        Some(Commands::List { json }) => run_list(json, &db_path).await?,
        Some(Commands::Vote { id, times }) => run_vote(&id, times, &db_path).await?,
        Some(Commands::Edit {
            id,
            name,
            fields,
            clear_images,
        }) => {
            let edit = PlaceEdit {
                name,
                fields,
                clear_images,
            };
            run_edit(&id, edit, &db_path).await?;
        }
        Some(Commands::Delete { id }) => run_delete(&id, &db_path).await?,
        Some(Commands::Clear { yes }) => run_clear(yes, &db_path).await?,
        Some(Commands::Details { details, clear }) => {
            run_details(details, clear, &db_path).await?;
        }
        Some(Commands::Suggest { details }) => run_suggest(details, &db_path).await?,
        Some(Commands::Share {
            base_url,
            with_credentials,
        }) => run_share(base_url.as_deref(), with_credentials, &db_path).await?,
        Some(Commands::Open { target }) => run_open(&target, &db_path).await?,
        Some(Commands::New) => run_new(&db_path).await?,
        Some(Commands::History { json }) => run_history(json, &db_path).await?,
        Some(Commands::Watch) => run_watch(&db_path).await?,
        Some(Commands::Config { command }) => run_config(command, &db_path).await?,
        Some(Commands::Completions { shell, output }) => {
            run_completions(shell, output.as_deref())?;
        }
        None => {
            Cli::command().print_help().map_err(CliError::Io)?;
            println!();
        }
    }

    Ok(())
}
