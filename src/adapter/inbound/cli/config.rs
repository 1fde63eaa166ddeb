//! Handler for the `config` command group.
//!
//! These commands never open the ledger.

use std::fs;
use std::path::Path;

use super::command::ConfigCommand;
use super::diagnostic::{self, Reported};
use super::{output, paths};
use crate::error::{ConfigError, Result};
use crate::infrastructure::config::settings::Config;

/// Default config template with documentation.
const CONFIG_TEMPLATE: &str = include_str!("../../../../config.toml.example");

/// Execute a `config` subcommand against the file at `path`.
pub fn execute(path: &Path, command: &ConfigCommand) -> miette::Result<()> {
    match command {
        ConfigCommand::Init { force } => init(path, *force).reported(),
        ConfigCommand::Show => show(path),
        ConfigCommand::Validate => validate(path),
    }
}

fn init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(ConfigError::InvalidValue {
            field: "config",
            reason: "file already exists (use --force to overwrite)".to_string(),
        }
        .into());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, CONFIG_TEMPLATE)?;

    if output::data("config.init", &serde_json::json!({ "path": path })) {
        return Ok(());
    }
    output::header(env!("CARGO_PKG_VERSION"));
    output::success("Created configuration file");
    output::field("Path", path.display());
    output::hint(&format!(
        "check it with `marketrun config validate -c {}`",
        path.display()
    ));
    Ok(())
}

fn show(path: &Path) -> miette::Result<()> {
    let config = Config::load_or_default(path).map_err(|e| diagnostic::config_report(path, e))?;
    if output::data("config.show", &config) {
        return Ok(());
    }

    output::header(env!("CARGO_PKG_VERSION"));
    output::section("Effective Configuration");
    if path.exists() {
        output::field("File", path.display());
    } else {
        output::field("File", output::muted(format!("{} (not found, defaults)", path.display())));
    }
    output::field("Database", &config.database);

    output::section("Logging");
    output::field("Level", &config.logging.level);
    output::field("Format", &config.logging.format);

    output::section("Billing");
    output::field(
        "Confirmed bills",
        if config.billing.protect_confirmed {
            "protected"
        } else {
            "reopened on regeneration"
        },
    );

    output::section("Purchasing");
    output::field(
        "Default market",
        config.purchasing.default_market.as_deref().unwrap_or("-"),
    );

    if !path.exists() {
        output::hint(&format!(
            "create one with `marketrun config init`, or keep the ledger at {}",
            paths::default_database().display()
        ));
    }
    Ok(())
}

fn validate(path: &Path) -> miette::Result<()> {
    if !path.exists() {
        return Err(diagnostic::report(
            ConfigError::ReadFile(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} does not exist", path.display()),
            ))
            .into(),
        ));
    }
    let config = Config::load(path).map_err(|e| diagnostic::config_report(path, e))?;
    if output::data("config.validate", &serde_json::json!({ "path": path, "valid": true })) {
        return Ok(());
    }

    output::header(env!("CARGO_PKG_VERSION"));
    output::section("Config Validation");
    output::field("Path", path.display());
    output::success("Config file is valid");
    if config.database == "marketrun.db" {
        output::warning("database is a relative path; it resolves against the working directory");
    }
    output::hint(&format!("marketrun config show -c {}", path.display()));
    Ok(())
}
