//! HTTP surface of the expense ledger.
//!
//! # Responsibility
//! - Map `/api/expenses` verbs and paths onto `ExpenseService` calls.
//! - Render status codes: 404 and 500 carry no body.
//! - Host the server loop with CORS and per-request logging.

pub mod error;
pub mod routes;
pub mod server;

pub use error::ApiError;
pub use routes::{expense_router, AppState, ExpensePayload, SharedRepository, EXPENSES_PATH};
pub use server::{build_app, run_server, ServerConfig, ServerError};
