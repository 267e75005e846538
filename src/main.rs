use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use engojee::cli::args::{Cli, Commands};
use engojee::cli::commands;
use engojee::config::Config;
use engojee::features::automation::{AutomationService, CommandBridge};
use engojee::features::rules::RuleStore;
use engojee::storage::SqliteStore;
use engojee::OutputFormat;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {:#}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;
    let format = cli.output.unwrap_or(config.general.default_output);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    let output = runtime.block_on(dispatch(cli.command, &config, format))?;

    if !output.is_empty() {
        println!("{output}");
    }
    Ok(())
}

async fn dispatch(command: Commands, config: &Config, format: OutputFormat) -> Result<String> {
    let output = match command {
        Commands::Rules(args) => {
            let store = RuleStore::new(SqliteStore::open()?);
            commands::rules(&store, args.command, format).await?
        }
        Commands::Service(args) => {
            let store = RuleStore::new(SqliteStore::open()?);
            let service = AutomationService::new(CommandBridge::from_config(&config.engine));
            commands::service(
                &service,
                &store,
                args.command,
                config.activity.capacity,
                format,
            )
            .await?
        }
        Commands::Completions { shell } => commands::completions(shell),
    };
    Ok(output)
}
