//! Domain model for the expense ledger.
//!
//! # Responsibility
//! - Define the one record type shared by storage, service and HTTP layers.
//!
//! # Invariants
//! - Every persisted record carries an engine-assigned `ExpenseId`.
//! - Updates replace the whole record; there is no partial patch shape.

pub mod expense;
