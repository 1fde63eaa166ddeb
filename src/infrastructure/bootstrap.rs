//! Composition root: turn a loaded [`Config`] into ready services.

use std::path::Path;

use tracing::info;

use crate::adapter::outbound::sqlite::SqliteLedger;
use crate::application::BillingService;
use crate::error::Result;
use crate::infrastructure::config::settings::Config;

/// Open the configured SQLite ledger, creating its directory and applying
/// pending migrations.
///
/// # Errors
/// Returns an error if the directory cannot be created or the database
/// cannot be opened or migrated.
pub fn open_ledger(config: &Config) -> Result<SqliteLedger> {
    if let Some(parent) = Path::new(&config.database).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let ledger = SqliteLedger::open(&config.database)?;
    info!(database = %config.database, "Ledger opened");
    Ok(ledger)
}

/// Billing service with the configured confirmed-bill policy.
#[must_use]
pub fn billing_service(config: &Config, ledger: SqliteLedger) -> BillingService<SqliteLedger> {
    BillingService::new(ledger).protect_confirmed(config.billing.protect_confirmed)
}
