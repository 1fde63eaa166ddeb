//! Services shared by command handlers for one invocation.

use crate::adapter::outbound::sqlite::SqliteLedger;
use crate::application::catalog::CatalogSnapshot;
use crate::application::{
    BillingService, CatalogService, ConsolidationService, ExpenseService, OrderService,
    PurchasingService,
};
use crate::error::Result;
use crate::infrastructure::bootstrap;
use crate::infrastructure::config::settings::Config;

/// Loaded configuration plus an open ledger.
pub struct Context {
    pub config: Config,
    ledger: SqliteLedger,
}

impl Context {
    /// Open the configured ledger.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open(config: Config) -> Result<Self> {
        let ledger = bootstrap::open_ledger(&config)?;
        Ok(Self { config, ledger })
    }

    pub fn consolidation(&self) -> ConsolidationService<SqliteLedger> {
        ConsolidationService::new(self.ledger.clone())
    }

    pub fn purchasing(&self) -> PurchasingService<SqliteLedger> {
        PurchasingService::new(self.ledger.clone())
    }

    pub fn billing(&self) -> BillingService<SqliteLedger> {
        bootstrap::billing_service(&self.config, self.ledger.clone())
    }

    pub fn orders(&self) -> OrderService<SqliteLedger> {
        OrderService::new(self.ledger.clone())
    }

    pub fn expenses(&self) -> ExpenseService<SqliteLedger> {
        ExpenseService::new(self.ledger.clone())
    }

    pub fn catalog(&self) -> CatalogService<SqliteLedger> {
        CatalogService::new(self.ledger.clone())
    }

    /// Current catalog, used to resolve names in input files and tables.
    ///
    /// # Errors
    /// Storage errors only.
    pub async fn snapshot(&self) -> Result<CatalogSnapshot> {
        self.catalog().show().await
    }
}
