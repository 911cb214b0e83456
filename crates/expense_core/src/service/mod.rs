//! Core use-case services.
//!
//! # Responsibility
//! - Expose the record operations used by the HTTP layer.
//! - Keep callers decoupled from storage details.

pub mod expense_service;
