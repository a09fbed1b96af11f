use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use ct_cli::commands::{analyze, normalize};
use ct_cli::{Cli, Commands, Config};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Logs go to stderr so stdout stays machine-readable
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    let mut stdout = std::io::stdout().lock();
    match &cli.command {
        Some(Commands::Normalize {
            trace,
            strict,
            append_tail,
            only,
        }) => {
            let options = normalize::Options {
                strict: *strict,
                append_tail: *append_tail,
                only: *only,
            };
            let report = normalize::run(&mut stdout, trace, &config, options)?;
            eprintln!("{}", normalize::format_report(&report));
        }
        Some(Commands::Analyze {
            trace,
            json,
            player,
        }) => {
            analyze::run(&mut stdout, trace, &config, *player, *json)?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
