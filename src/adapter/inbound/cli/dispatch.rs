//! Route a parsed command line to its handler.

use super::command::{Cli, Commands};
use super::context::Context;
use super::diagnostic::{self, Reported};
use super::{batch, bill, catalog, config, consolidate, expense, order, output};
use crate::infrastructure::config::settings::Config;

/// Log filter implied by `-v` flags, if any.
fn verbosity_filter(verbose: u8) -> Option<&'static str> {
    match verbose {
        0 => None,
        1 => Some("debug"),
        _ => Some("trace"),
    }
}

/// Load the effective configuration with command-line overrides applied.
///
/// # Errors
/// Returns a diagnostic pointing into the config file when it is invalid.
pub fn effective_config(cli: &Cli) -> miette::Result<Config> {
    let mut config =
        Config::load_or_default(&cli.config).map_err(|e| diagnostic::config_report(&cli.config, e))?;
    if let Some(database) = &cli.database {
        config.database = database.display().to_string();
    }
    if let Some(level) = verbosity_filter(cli.verbose) {
        config.logging.level = level.to_string();
    }
    Ok(config)
}

/// Execute the parsed command.
///
/// # Errors
/// Returns the rendered diagnostic of the first failure.
pub async fn execute(cli: Cli) -> miette::Result<()> {
    output::apply_color(&cli.color);
    output::configure(output::OutputConfig::new(cli.json, cli.quiet, cli.verbose));

    if let Commands::Config(command) = &cli.command {
        return config::execute(&cli.config, command);
    }

    let config = effective_config(&cli)?;
    config.init_logging();
    let ctx = Context::open(config).reported()?;

    match &cli.command {
        Commands::Consolidate(args) => consolidate::execute(&ctx, args).await,
        Commands::Batch(command) => batch::execute(&ctx, command).await,
        Commands::Bill(command) => bill::execute(&ctx, command).await,
        Commands::Order(command) => order::execute(&ctx, command).await,
        Commands::Expense(command) => expense::execute(&ctx, command).await,
        Commands::Catalog(command) => catalog::execute(&ctx, command).await,
        Commands::Config(command) => config::execute(&cli.config, command),
    }
}
