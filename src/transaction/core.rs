//! Defines the core data models for transactions and the validation of
//! user-submitted transaction data.

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{
    Error,
    category::Category,
    database_id::TransactionId,
    error::ValidationErrors,
};

// ============================================================================
// MODELS
// ============================================================================

/// An expense, i.e. an event where money was spent.
///
/// To create a new `Transaction`, validate a [TransactionForm] into a
/// [NewTransaction] and hand it to a [RecordStore](crate::RecordStore).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction, assigned by the store.
    pub id: TransactionId,
    /// The amount of money spent. Always greater than zero.
    pub amount: f64,
    /// When the transaction happened.
    pub date: Date,
    /// What the money was spent on.
    pub category: Category,
    /// An optional text description of what the transaction was for.
    pub description: Option<String>,
    /// When the transaction was first stored.
    pub created_at: OffsetDateTime,
    /// When the transaction was last changed.
    pub updated_at: OffsetDateTime,
}

/// The validated contents of a transaction that is about to be created or
/// updated.
///
/// A `NewTransaction` always has a positive, finite amount, so stores never
/// see a request that breaks that invariant. Build one with
/// [TransactionForm::validate].
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    amount: f64,
    date: Date,
    category: Category,
    description: Option<String>,
}

impl NewTransaction {
    /// The amount of money spent.
    pub fn amount(&self) -> f64 {
        self.amount
    }

    /// When the transaction happened.
    pub fn date(&self) -> Date {
        self.date
    }

    /// What the money was spent on.
    pub fn category(&self) -> Category {
        self.category
    }

    /// The description, if one was given.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

/// Raw, unvalidated transaction data as submitted by a user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionForm {
    /// The amount of money spent.
    pub amount: f64,
    /// When the transaction happened.
    pub date: Option<Date>,
    /// The name of the category, e.g. "Food".
    pub category: String,
    /// What the transaction was for.
    pub description: Option<String>,
}

impl TransactionForm {
    /// Check every field and convert the form into a [NewTransaction].
    ///
    /// All problems are reported together rather than stopping at the first
    /// bad field. Blank descriptions are treated as no description.
    ///
    /// # Errors
    ///
    /// Returns an [Error::Validation] listing each field that:
    /// - `amount`: is not a finite number greater than zero,
    /// - `date`: is missing,
    /// - `category`: does not name a [Category].
    pub fn validate(self) -> Result<NewTransaction, Error> {
        let mut errors = ValidationErrors::default();

        if !self.amount.is_finite() || self.amount <= 0.0 {
            errors.push("amount", "Amount must be greater than zero");
        }

        if self.date.is_none() {
            errors.push("date", "Please add a date");
        }

        let category = match self.category.parse::<Category>() {
            Ok(category) => Some(category),
            Err(Error::Validation(category_errors)) => {
                for error in category_errors.fields() {
                    errors.push(error.field, error.message.clone());
                }
                None
            }
            Err(error) => return Err(error),
        };

        let description = self
            .description
            .map(|description| description.trim().to_owned())
            .filter(|description| !description.is_empty());

        match (self.date, category) {
            (Some(date), Some(category)) => errors.into_result(|| NewTransaction {
                amount: self.amount,
                date,
                category,
                description,
            }),
            _ => Err(Error::Validation(errors)),
        }
    }
}
