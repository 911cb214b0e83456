//! Core domain logic for the expense ledger.
//! Owns the record model, SQLite persistence and the record service.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::expense::{Expense, ExpenseId};
pub use repo::expense_repo::{
    ColumnMapping, ExpenseRepository, RepoError, RepoResult, SqliteExpenseRepository,
    EXPENSE_COLUMNS, EXPENSES_TABLE,
};
pub use service::expense_service::ExpenseService;

/// Minimal health-check API.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
