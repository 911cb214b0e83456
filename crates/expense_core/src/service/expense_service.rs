//! Expense record service.
//!
//! # Responsibility
//! - Provide save/lookup/filter/delete entry points for expense records.
//! - Delegate persistence to a repository implementation.
//!
//! # Invariants
//! - `save` never decides insert vs update itself; the repository does,
//!   based on whether `id` is set.
//! - `delete` does not pre-check existence; a missing id surfaces as
//!   `RepoError::NotFound` from the repository.

use crate::model::expense::{Expense, ExpenseId};
use crate::repo::expense_repo::{ExpenseRepository, RepoResult};
use log::debug;

/// Use-case service wrapper for expense records.
pub struct ExpenseService<R: ExpenseRepository> {
    repo: R,
}

impl<R: ExpenseRepository> ExpenseService<R> {
    /// Creates a service owning the provided repository.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Lists every stored expense.
    pub fn get_all(&self) -> RepoResult<Vec<Expense>> {
        self.repo.find_all()
    }

    pub fn get_by_id(&self, id: ExpenseId) -> RepoResult<Option<Expense>> {
        self.repo.find_by_id(id)
    }

    /// Lists expenses whose category equals `category` exactly.
    pub fn get_by_category(&self, category: &str) -> RepoResult<Vec<Expense>> {
        self.repo.find_by_category(category)
    }

    pub fn exists(&self, id: ExpenseId) -> RepoResult<bool> {
        self.repo.exists_by_id(id)
    }

    /// Inserts a new record or replaces an existing one.
    ///
    /// Returns the persisted record with its identity set.
    pub fn save(&self, expense: &Expense) -> RepoResult<Expense> {
        let saved = self.repo.insert_or_replace(expense)?;
        debug!(
            "event=expense_save module=service status=ok id={} created={}",
            saved.id.unwrap_or_default(),
            expense.is_new()
        );
        Ok(saved)
    }

    /// Deletes the record with `id`.
    ///
    /// # Errors
    /// - `RepoError::NotFound` when no such record exists.
    pub fn delete(&self, id: ExpenseId) -> RepoResult<()> {
        self.repo.delete_by_id(id)?;
        debug!("event=expense_delete module=service status=ok id={id}");
        Ok(())
    }
}
