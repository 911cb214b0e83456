//! Expense record.
//!
//! # Invariants
//! - `id` is `None` until the record is first persisted, then immutable.
//! - Identities are never reused after deletion.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Engine-assigned identity of a persisted expense.
pub type ExpenseId = i64;

/// One ledger entry.
///
/// Serialized as `{id, description, amount, category, date}` with absent
/// optional fields omitted; `date` uses the `YYYY-MM-DD` form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ExpenseId>,
    pub description: String,
    #[serde(default)]
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
}

impl Expense {
    /// Creates a new, not yet persisted expense with no category or date.
    pub fn new(description: impl Into<String>, amount: f64) -> Self {
        Self {
            id: None,
            description: description.into(),
            amount,
            category: None,
            date: None,
        }
    }

    /// Builder-style setter for `category`.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Builder-style setter for `date`.
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    /// Returns whether this record has never been persisted.
    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    /// Replaces every mutable field with the ones from `incoming`.
    ///
    /// `self.id` is kept; `incoming.id` is ignored. Fields that are `None`
    /// in `incoming` become `None` here too.
    pub fn replace_fields(&mut self, incoming: Expense) {
        self.description = incoming.description;
        self.amount = incoming.amount;
        self.category = incoming.category;
        self.date = incoming.date;
    }
}
