use std::io;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use bt_cli::commands::{analyze, batch, convert, template, validate};
use bt_cli::{Cli, Commands, Config};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    let mut stdout = io::stdout();
    match &cli.command {
        Some(Commands::Template(args)) => template::run(&mut stdout, args)?,
        Some(Commands::Convert(args)) => {
            let config = load_config(&cli)?;
            convert::run(&mut stdout, args, &config)?;
        }
        Some(Commands::Batch(args)) => {
            let config = load_config(&cli)?;
            batch::run(&mut stdout, args, &config)?;
        }
        Some(Commands::Validate(args)) => validate::run(&mut stdout, args)?,
        Some(Commands::Analyze(args)) => analyze::run(&mut stdout, args)?,
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}

fn load_config(cli: &Cli) -> Result<Config> {
    let config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");
    Ok(config)
}
