//! A single value holding every dashboard view for one pair of snapshots.

use serde::Serialize;
use time::Date;

use crate::{
    budget::Budget,
    dashboard::{
        aggregation::{
            CategoryShare, CategoryTotal, MonthOverMonth, MonthlyTotal, category_breakdown,
            category_totals, month_over_month, monthly_totals, total_spent,
        },
        budget::{BudgetComparison, BudgetInsight, budget_comparison, budget_insights},
    },
    month::MonthKey,
    transaction::Transaction,
};

/// Every aggregate view the dashboard shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    /// The month containing "today", which the budget views are for.
    pub month: MonthKey,
    /// The sum of every transaction amount.
    pub total_spent: f64,
    /// This month's spending against last month's.
    pub month_over_month: MonthOverMonth,
    /// Totals for categories with transactions, largest first.
    pub category_totals: Vec<CategoryTotal>,
    /// Every category's total and share of spending.
    pub category_breakdown: Vec<CategoryShare>,
    /// Totals per month, oldest first.
    pub monthly_totals: Vec<MonthlyTotal>,
    /// This month's budget against spending for every category.
    pub budget_comparison: Vec<BudgetComparison>,
    /// This month's budget usage for categories with a positive budget.
    pub budget_insights: Vec<BudgetInsight>,
}

impl DashboardSummary {
    /// Compute every view from the transactions and budgets snapshots.
    ///
    /// `today` picks the current month. Only budgets for that month are used.
    pub fn new(transactions: &[Transaction], budgets: &[Budget], today: Date) -> Self {
        let month = MonthKey::from_date(today);

        Self {
            month,
            total_spent: total_spent(transactions),
            month_over_month: month_over_month(transactions, today),
            category_totals: category_totals(transactions),
            category_breakdown: category_breakdown(transactions),
            monthly_totals: monthly_totals(transactions),
            budget_comparison: budget_comparison(transactions, budgets, month),
            budget_insights: budget_insights(transactions, budgets, month),
        }
    }
}
