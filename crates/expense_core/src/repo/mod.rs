//! Storage gateway for expense records.
//!
//! # Responsibility
//! - Define the data access contract used by the record service.
//! - Keep SQL and row mapping inside the persistence boundary.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.
//! - Each operation is a single statement; no explicit transactions.

pub mod expense_repo;
