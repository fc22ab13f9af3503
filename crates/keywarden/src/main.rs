// SPDX-FileCopyrightText: 2026 Keywarden Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Keywarden - envelope-encrypted credential vault.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod commands;
mod prompt;
mod rotate;
mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use keywarden_config::model::KeywardenConfig;
use keywarden_core::{KeywardenError, RecordId};

/// Keywarden - envelope-encrypted credential vault.
#[derive(Parser, Debug)]
#[command(name = "keywarden", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the XDG hierarchy.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Set the master passphrase of a new vault.
    Init,
    /// Start the HTTP gateway.
    Serve,
    /// Rotate every stored secret to a new master passphrase.
    Rotate {
        /// Only retry the records that failed in this earlier job.
        #[arg(long)]
        retry_of: Option<String>,
    },
    /// Store (or replace) an account secret read from the prompt or stdin.
    Protect {
        /// Account name.
        name: String,
        /// Login shown next to the account.
        #[arg(long, default_value = "")]
        login: String,
    },
    /// Print an account secret.
    Reveal {
        /// Account id.
        id: i64,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(errors) => {
            keywarden_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.logging.level);

    if let Err(e) = run(cli.command, config).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn load_config(
    path: Option<&std::path::Path>,
) -> Result<KeywardenConfig, Vec<keywarden_config::ConfigError>> {
    let Some(path) = path else {
        return keywarden_config::load_and_validate();
    };
    let config = keywarden_config::load_config_from_path(path).map_err(|e| {
        keywarden_config::diagnostic::figment_to_config_errors(
            e,
            &keywarden_config::TomlSources::read([path]),
        )
    })?;
    keywarden_config::validation::validate_config(&config)?;
    Ok(config)
}

async fn run(command: Commands, config: KeywardenConfig) -> Result<(), KeywardenError> {
    match command {
        Commands::Init => {
            let passphrase = prompt::new_master_passphrase()?;
            let db = commands::open_database(&config).await?;
            commands::init_vault(&db, &config.vault, &passphrase).await?;
            println!("vault initialized");
        }
        Commands::Serve => serve::run_serve(config).await?,
        Commands::Rotate { retry_of } => {
            let retry_of = retry_of
                .map(|raw| {
                    raw.parse().map_err(|_| {
                        KeywardenError::RotationSetup(format!("`{raw}` is not a job id"))
                    })
                })
                .transpose()?;
            rotate::run_rotate(config, retry_of).await?;
        }
        Commands::Protect { name, login } => {
            let passphrase = prompt::master_passphrase()?;
            let secret = prompt::account_secret()?;
            let db = commands::open_database(&config).await?;
            let id =
                commands::protect_account(&db, &config.vault, &passphrase, &name, &login, &secret)
                    .await?;
            println!("stored account {id}");
        }
        Commands::Reveal { id } => {
            let passphrase = prompt::master_passphrase()?;
            let db = commands::open_database(&config).await?;
            let secret =
                commands::reveal_account(&db, &config.vault, &passphrase, RecordId(id)).await?;
            println!("{}", secrecy::ExposeSecret::expose_secret(&secret));
        }
    }
    Ok(())
}

/// Log to stderr so command output on stdout stays pipeable.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("keywarden={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
