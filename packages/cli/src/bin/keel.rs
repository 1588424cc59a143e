use clap::{Parser, Subcommand};
use colored::*;
use std::process;

use keel_cli::{build_store, init_tracing, serve};
use keel_config::Config;
use keel_security::{generate_token, hash_token};
use keel_settings::store::SYSTEM_ACTOR;

#[derive(Parser)]
#[command(name = "keel")]
#[command(about = "Keel - settings service for the admin panel")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the settings API server
    Serve {
        #[arg(long, help = "Address to bind (overrides KEEL_HOST)")]
        host: Option<String>,
        #[arg(long, help = "Port to listen on (overrides KEEL_PORT)")]
        port: Option<u16>,
    },
    /// Print a new admin token and the hash to put in KEEL_ADMIN_TOKEN_HASH
    HashToken {
        /// Hash this token instead of generating one
        #[arg(long)]
        token: Option<String>,
    },
    /// Print the stored settings document
    Show,
    /// Replace the stored settings with the defaults
    Reset,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if let Err(e) = handle_command(cli.command).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        process::exit(1);
    }
}

async fn handle_command(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Serve { host, port } => {
            init_tracing();
            let config = Config::from_env()?.with_overrides(host, port)?;
            serve(config).await
        }
        Commands::HashToken { token } => {
            let generated = token.is_none();
            let token = token.unwrap_or_else(generate_token);
            if generated {
                println!("{} {}", "Token:".cyan().bold(), token);
            }
            println!("{} {}", "KEEL_ADMIN_TOKEN_HASH=".cyan().bold(), hash_token(&token));
            Ok(())
        }
        Commands::Show => {
            let config = Config::from_env()?;
            let store = build_store(&config).await?;
            let current = store.current().await?;
            println!("{}", serde_json::to_string_pretty(&current)?);
            Ok(())
        }
        Commands::Reset => {
            let config = Config::from_env()?;
            let store = build_store(&config).await?;
            let stored = store.reset(SYSTEM_ACTOR).await?;
            println!(
                "{} Settings '{}' reset to defaults (version {})",
                "✓".green().bold(),
                stored.name,
                stored.version
            );
            Ok(())
        }
    }
}
