//! Monthly budgets: the `Budget` model, validation of user input, and the
//! database functions for setting and querying budgets.

mod core;
mod db;

pub use core::{Budget, BudgetForm, BudgetUpsert};
pub use db::{
    create_budget_table, delete_budget, get_budgets_for_month, insert_budget, map_budget_row,
    upsert_budget,
};
