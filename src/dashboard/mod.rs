//! Dashboard module
//!
//! The aggregation engine: pure functions that turn a transactions snapshot
//! and a budgets snapshot into the views the dashboard displays.

mod aggregation;
mod budget;
mod summary;

pub use aggregation::{
    CategoryShare, CategoryTotal, MonthOverMonth, MonthlyTotal, category_breakdown,
    category_totals, month_over_month, monthly_totals, total_spent,
};
pub use budget::{
    BudgetComparison, BudgetInsight, InsightStatus, OVER_PERCENTAGE, WARNING_PERCENTAGE,
    budget_comparison, budget_insights,
};
pub use summary::DashboardSummary;
