//! Relnote CLI - Command line interface for relnote
//!
//! Turns completed Linear tickets into customer-facing release notes and
//! posts them to Slack.

mod commands;

use clap::{Parser, Subcommand};
use relnote_core::{Config, Secrets};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{ChangelogArgs, CustomerArgs, StateArgs, TicketsArgs};

/// Relnote: release notes from completed tickets
#[derive(Parser, Debug)]
#[command(name = "relnote")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Model to use (overrides config and env)
    #[arg(long, global = true, env = "RELNOTE_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show version information
    Version,

    /// Generate release notes for the window since the last run
    #[command(visible_alias = "run")]
    Changelog(ChangelogArgs),

    /// Generate release notes tailored to one customer
    Customer(CustomerArgs),

    /// List completed tickets in the window without drafting anything
    Tickets(TicketsArgs),

    /// Show or clear the persisted run state
    State(StateArgs),

    /// Show current configuration
    Config,

    /// Create a secrets file template
    InitSecrets,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    // Load configuration with overrides
    let config = Config::load_with_overrides(cli.model.clone())?;

    if cli.verbose {
        tracing::info!(
            model = %config.model.model,
            lookback_days = config.run.lookback_days,
            "Configuration loaded"
        );
    }

    match cli.command {
        Some(Commands::Version) => {
            println!("relnote {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Changelog(args)) => {
            args.execute(cli.verbose, &config).await?;
        }
        Some(Commands::Customer(args)) => {
            args.execute(cli.verbose, &config).await?;
        }
        Some(Commands::Tickets(args)) => {
            args.execute(&config).await?;
        }
        Some(Commands::State(args)) => {
            args.execute(&config)?;
        }
        Some(Commands::Config) => {
            println!("Relnote Configuration");
            println!("=====================");
            println!();
            println!("Model Settings:");
            println!("  model: {}", config.model.model);
            println!("  max_tokens: {}", config.model.max_tokens);
            println!("  thinking_budget: {}", config.model.thinking_budget);
            println!();
            println!("Run Settings:");
            println!("  lookback_days: {}", config.run.lookback_days);
            println!("  stage_retries: {}", config.run.stage_retries);
            println!();
            if let Some(path) = Config::default_config_path() {
                println!("Config file: {}", path.display());
                if path.exists() {
                    println!("  (exists)");
                } else {
                    println!("  (not found - using defaults)");
                }
            }
        }
        Some(Commands::InitSecrets) => {
            let path = Secrets::create_template()?;
            println!("Created secrets template at {}", path.display());
            println!("Edit it to add your Linear and Anthropic API keys.");
        }
        None => {
            println!("Relnote - release notes from completed tickets");
            println!();
            println!("Use --help for usage information");
        }
    }

    Ok(())
}
