//! Database operations for budgets.

use rusqlite::{Connection, Row};
use time::OffsetDateTime;

use crate::{
    Error,
    budget::{Budget, BudgetUpsert},
    database_id::BudgetId,
    month::MonthKey,
};

/// Set the budget for the upsert's (category, month) pair.
///
/// Inserts a new budget, or overwrites the amount of the existing budget for
/// that pair. This is a single statement, so repeated or concurrent calls for
/// the same pair always leave exactly one row holding the last amount written.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn upsert_budget(budget: &BudgetUpsert, connection: &Connection) -> Result<Budget, Error> {
    let budget = connection
        .prepare(
            "INSERT INTO budget (category, month, amount, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)
             ON CONFLICT(category, month)
             DO UPDATE SET amount = excluded.amount, updated_at = excluded.updated_at
             RETURNING id, category, month, amount, created_at, updated_at",
        )?
        .query_row(
            (
                budget.category(),
                budget.month(),
                budget.amount(),
                OffsetDateTime::now_utc(),
            ),
            map_budget_row,
        )?;

    Ok(budget)
}

/// Insert a budget without overwriting an existing one.
///
/// This is the plain insert for stores that do not upsert. The
/// [RecordStore](crate::RecordStore) implementations use [upsert_budget]
/// instead, so they never report a duplicate.
///
/// # Errors
/// This function will return a:
/// - [Error::DuplicateBudget] if a budget for the (category, month) pair exists,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn insert_budget(budget: &BudgetUpsert, connection: &Connection) -> Result<Budget, Error> {
    connection
        .prepare(
            "INSERT INTO budget (category, month, amount, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)
             RETURNING id, category, month, amount, created_at, updated_at",
        )?
        .query_row(
            (
                budget.category(),
                budget.month(),
                budget.amount(),
                OffsetDateTime::now_utc(),
            ),
            map_budget_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(sql_error, _)
                if sql_error.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
            {
                Error::DuplicateBudget {
                    category: budget.category(),
                    month: budget.month(),
                }
            }
            error => error.into(),
        })
}

/// Retrieve the budgets set for `month`, in category order.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn get_budgets_for_month(month: MonthKey, connection: &Connection) -> Result<Vec<Budget>, Error> {
    let mut budgets: Vec<Budget> = connection
        .prepare(
            "SELECT id, category, month, amount, created_at, updated_at
             FROM budget WHERE month = :month",
        )?
        .query_map(&[(":month", &month)], map_budget_row)?
        .collect::<Result<_, _>>()?;

    budgets.sort_by_key(|budget| budget.category);

    Ok(budgets)
}

/// Delete the budget with `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::DeleteMissingBudget] if `id` does not refer to a budget,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_budget(id: BudgetId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute("DELETE FROM budget WHERE id = ?1", [id])?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingBudget);
    }

    Ok(())
}

/// Create the budget table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_budget_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS budget (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            category TEXT NOT NULL CHECK (
                category IN ('Food', 'Rent', 'Transport', 'Utilities', 'Entertainment', 'Other')
            ),
            month TEXT NOT NULL,
            amount REAL NOT NULL CHECK (amount >= 0),
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE(category, month)
        );

        CREATE INDEX IF NOT EXISTS idx_budget_month ON budget(month);",
    )?;

    Ok(())
}

/// Map a database row to a Budget.
pub fn map_budget_row(row: &Row) -> Result<Budget, rusqlite::Error> {
    Ok(Budget {
        id: row.get(0)?,
        category: row.get(1)?,
        month: row.get(2)?,
        amount: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}
