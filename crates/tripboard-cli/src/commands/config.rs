use std::path::Path;

use tripboard_core::config::ConnectionConfig;
use tripboard_core::AppContext;

use crate::cli::ConfigCommands;
use crate::commands::common::{normalize_content, open_store};
use crate::error::CliError;

/// Where the connection in use comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionSource {
    BuildTime,
    Environment,
    Stored,
    Missing,
}

impl ConnectionSource {
    pub const fn describe(self) -> &'static str {
        match self {
            Self::BuildTime => "built into this binary",
            Self::Environment => "environment",
            Self::Stored => "stored configuration",
            Self::Missing => "not configured (local draft only)",
        }
    }
}

pub async fn run_config(command: ConfigCommands, db_path: &Path) -> Result<(), CliError> {
    let store = open_store(db_path).await?;
    let mut context = AppContext::load(store).await?;

    match command {
        ConfigCommands::Show => {
            let env = ConnectionConfig::from_env();
            let source = connection_source(&ConnectionConfig::build_time(), &env, &context);
            println!("source: {}", source.describe());
            if let Some(connection) = context.resolve_connection(env) {
                println!(
                    "supabase_url: {}",
                    connection.supabase_url.as_deref().unwrap_or_default()
                );
                println!(
                    "supabase_anon_key: {}",
                    mask_secret(connection.supabase_anon_key.as_deref().unwrap_or_default())
                );
            }
        }
        ConfigCommands::Set {
            supabase_url,
            supabase_anon_key,
        } => {
            let connection = validate_connection(&supabase_url, &supabase_anon_key)?;
            context.set_connection(Some(connection));
            context.save().await?;
            println!("Stored connection for {}", supabase_url.trim());
        }
        ConfigCommands::Clear => {
            context.set_connection(None);
            context.save().await?;
            println!("Stored connection removed");
        }
    }

    Ok(())
}

pub fn connection_source(
    build_time: &ConnectionConfig,
    env: &ConnectionConfig,
    context: &AppContext,
) -> ConnectionSource {
    if build_time.is_configured() {
        ConnectionSource::BuildTime
    } else if env.is_configured() {
        ConnectionSource::Environment
    } else if context.stored_connection().is_some() {
        ConnectionSource::Stored
    } else {
        ConnectionSource::Missing
    }
}

pub fn validate_connection(url: &str, anon_key: &str) -> Result<ConnectionConfig, CliError> {
    let url = normalize_content(url)
        .ok_or_else(|| CliError::Config("supabase_url must not be empty".to_string()))?;
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(CliError::Config(
            "supabase_url must include http:// or https://".to_string(),
        ));
    }
    let anon_key = normalize_content(anon_key)
        .ok_or_else(|| CliError::Config("supabase_anon_key must not be empty".to_string()))?;
    Ok(ConnectionConfig::new(url.trim_end_matches('/'), anon_key))
}

/// Show only the first few characters of a key.
pub fn mask_secret(secret: &str) -> String {
    let visible = secret.chars().take(6).collect::<String>();
    if secret.chars().count() <= 6 {
        "*".repeat(secret.chars().count())
    } else {
        format!("{visible}...")
    }
}
