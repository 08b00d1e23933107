//! Defines the budget model and the validation of user-submitted budgets.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Error, category::Category, database_id::BudgetId, error::ValidationErrors, month::MonthKey,
};

/// A monthly spending limit for one category.
///
/// There is at most one budget per (category, month) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    /// The ID of the budget, assigned by the store.
    pub id: BudgetId,
    /// The category the limit applies to.
    pub category: Category,
    /// The spending limit. Never negative.
    pub amount: f64,
    /// The month the limit applies to.
    pub month: MonthKey,
    /// When the budget was first stored.
    pub created_at: OffsetDateTime,
    /// When the budget amount was last set.
    pub updated_at: OffsetDateTime,
}

/// A validated request to set the budget for a (category, month) pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BudgetUpsert {
    category: Category,
    month: MonthKey,
    amount: f64,
}

impl BudgetUpsert {
    /// The category the limit applies to.
    pub fn category(&self) -> Category {
        self.category
    }

    /// The month the limit applies to.
    pub fn month(&self) -> MonthKey {
        self.month
    }

    /// The spending limit.
    pub fn amount(&self) -> f64 {
        self.amount
    }
}

/// Raw, unvalidated budget data as submitted by a user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BudgetForm {
    /// The name of the category, e.g. "Food".
    pub category: String,
    /// The month in "YYYY-MM" form.
    pub month: String,
    /// The spending limit.
    pub amount: f64,
}

impl BudgetForm {
    /// Check every field and convert the form into a [BudgetUpsert].
    ///
    /// # Errors
    ///
    /// Returns an [Error::Validation] listing each field that:
    /// - `category`: does not name a [Category],
    /// - `month`: does not match `YYYY-MM`,
    /// - `amount`: is negative or not a finite number.
    pub fn validate(self) -> Result<BudgetUpsert, Error> {
        let mut errors = ValidationErrors::default();

        let category = collect_field_errors(self.category.parse::<Category>(), &mut errors)?;
        let month = collect_field_errors(MonthKey::new(&self.month), &mut errors)?;

        if !self.amount.is_finite() || self.amount < 0.0 {
            errors.push("amount", "Budget amount cannot be negative");
        }

        match (category, month) {
            (Some(category), Some(month)) => errors.into_result(|| BudgetUpsert {
                category,
                month,
                amount: self.amount,
            }),
            _ => Err(Error::Validation(errors)),
        }
    }
}

/// Move the field errors of a failed parse into `errors`.
fn collect_field_errors<T>(
    result: Result<T, Error>,
    errors: &mut ValidationErrors,
) -> Result<Option<T>, Error> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(Error::Validation(field_errors)) => {
            for error in field_errors.fields() {
                errors.push(error.field, error.message.clone());
            }
            Ok(None)
        }
        Err(error) => Err(error),
    }
}
