pub mod auth;
pub mod config;
pub mod constants;
pub mod database;
pub mod error;
pub mod expenses;
pub mod ledger;
pub mod membership;
pub mod models;
pub mod projects;
pub mod store;
pub mod utils;

// Re-export types at crate root for convenient importing
pub use crate::database::{Db, TransactionError, with_transaction};
pub use crate::error::LedgerError;
pub use crate::ledger::LedgerService;
pub use crate::membership::MembershipOracle;
pub use crate::store::ExpenseStore;

/// Application state shared across all request handlers
#[derive(Clone)]
pub struct AppState {
    /// Shared database handle (users, projects, expense ledger)
    pub db: Db,
    /// The expense ledger operations, with store and membership oracle injected
    pub ledger: LedgerService,
}
