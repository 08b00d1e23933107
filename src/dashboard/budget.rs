//! Budget views: how much of each category's budget has been spent this
//! month.

use std::fmt::Display;

use serde::Serialize;

use crate::{budget::Budget, category::Category, month::MonthKey, transaction::Transaction};

/// The share of a budget at which an insight changes from ok to warning.
pub const WARNING_PERCENTAGE: f64 = 80.0;

/// The share of a budget at which an insight changes to over budget.
pub const OVER_PERCENTAGE: f64 = 100.0;

/// Budget against actual spending for one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetComparison {
    /// The category being compared.
    pub category: Category,
    /// The budgeted amount, 0 if no budget is set.
    pub budget_amount: f64,
    /// The amount spent in the month.
    pub actual_amount: f64,
    /// What is left of the budget, never negative.
    pub remaining: f64,
}

/// How far through its budget a category is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightStatus {
    /// Less than [WARNING_PERCENTAGE] of the budget spent.
    Ok,
    /// At least [WARNING_PERCENTAGE] but less than [OVER_PERCENTAGE] spent.
    Warning,
    /// At least [OVER_PERCENTAGE] spent.
    Over,
}

impl InsightStatus {
    /// The status for a budget that is `percentage_used` percent spent.
    pub fn from_percentage(percentage_used: f64) -> Self {
        if percentage_used >= OVER_PERCENTAGE {
            InsightStatus::Over
        } else if percentage_used >= WARNING_PERCENTAGE {
            InsightStatus::Warning
        } else {
            InsightStatus::Ok
        }
    }
}

impl Display for InsightStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            InsightStatus::Ok => "ok",
            InsightStatus::Warning => "warning",
            InsightStatus::Over => "over",
        };

        write!(f, "{text}")
    }
}

/// How much of a positive budget has been used.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetInsight {
    /// The category the budget is for.
    pub category: Category,
    /// The amount spent as a percentage of the budget.
    pub percentage_used: f64,
    /// The budget minus the amount spent, negative when over budget.
    pub remaining: f64,
    /// Whether the category is within, near or over its budget.
    pub status: InsightStatus,
}

/// Compare the budgets for `month` with the spending in `month`, for every
/// category in [Category] order.
///
/// Budgets for other months are ignored.
pub fn budget_comparison(
    transactions: &[Transaction],
    budgets: &[Budget],
    month: MonthKey,
) -> Vec<BudgetComparison> {
    let spent = spent_by_category(transactions, month);

    Category::ALL
        .iter()
        .zip(spent)
        .map(|(&category, actual_amount)| {
            let budget_amount = budget_for(budgets, category, month).unwrap_or(0.0);

            BudgetComparison {
                category,
                budget_amount,
                actual_amount,
                remaining: (budget_amount - actual_amount).max(0.0),
            }
        })
        .collect()
}

/// One insight per category with a positive budget for `month`, in
/// [Category] order.
pub fn budget_insights(
    transactions: &[Transaction],
    budgets: &[Budget],
    month: MonthKey,
) -> Vec<BudgetInsight> {
    let spent = spent_by_category(transactions, month);

    Category::ALL
        .iter()
        .zip(spent)
        .filter_map(|(&category, actual)| {
            let budget = budget_for(budgets, category, month).filter(|&amount| amount > 0.0)?;
            let percentage_used = actual * 100.0 / budget;

            Some(BudgetInsight {
                category,
                percentage_used,
                remaining: budget - actual,
                status: InsightStatus::from_percentage(percentage_used),
            })
        })
        .collect()
}

/// The amount spent in `month` per category, indexed like [Category::ALL].
fn spent_by_category(
    transactions: &[Transaction],
    month: MonthKey,
) -> [f64; Category::ALL.len()] {
    Category::ALL.map(|category| {
        transactions
            .iter()
            .filter(|transaction| {
                transaction.category == category && month.contains(transaction.date)
            })
            .map(|transaction| transaction.amount)
            .sum()
    })
}

fn budget_for(budgets: &[Budget], category: Category, month: MonthKey) -> Option<f64> {
    budgets
        .iter()
        .find(|budget| budget.category == category && budget.month == month)
        .map(|budget| budget.amount)
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use crate::{
        category::Category,
        month::MonthKey,
        test_utils::{budget, transaction},
    };

    use super::{BudgetComparison, InsightStatus, budget_comparison, budget_insights};

    fn june() -> MonthKey {
        MonthKey::new("2024-06").unwrap()
    }

    #[test]
    fn comparison_clamps_remaining_at_zero() {
        let budgets = vec![budget(1, Category::Food, "2024-06", 100.0)];
        let transactions = vec![transaction(1, 120.0, date!(2024 - 06 - 10), Category::Food)];

        let comparison = budget_comparison(&transactions, &budgets, june());

        assert_eq!(
            comparison[0],
            BudgetComparison {
                category: Category::Food,
                budget_amount: 100.0,
                actual_amount: 120.0,
                remaining: 0.0,
            }
        );
    }

    #[test]
    fn comparison_lists_every_category() {
        let comparison = budget_comparison(&[], &[], june());

        let categories: Vec<Category> = comparison.iter().map(|row| row.category).collect();
        assert_eq!(categories, Category::ALL.to_vec());
        assert!(comparison.iter().all(|row| row.budget_amount == 0.0
            && row.actual_amount == 0.0
            && row.remaining == 0.0));
    }

    #[test]
    fn comparison_only_counts_the_given_month() {
        let budgets = vec![
            budget(1, Category::Rent, "2024-05", 500.0),
            budget(2, Category::Rent, "2024-06", 800.0),
        ];
        let transactions = vec![
            transaction(1, 800.0, date!(2024 - 05 - 01), Category::Rent),
            transaction(2, 300.0, date!(2024 - 06 - 01), Category::Rent),
        ];

        let comparison = budget_comparison(&transactions, &budgets, june());

        assert_eq!(comparison[1].category, Category::Rent);
        assert_eq!(comparison[1].budget_amount, 800.0);
        assert_eq!(comparison[1].actual_amount, 300.0);
        assert_eq!(comparison[1].remaining, 500.0);
    }

    #[test]
    fn insight_over_budget_has_negative_remaining() {
        let budgets = vec![budget(1, Category::Food, "2024-06", 100.0)];
        let transactions = vec![transaction(1, 120.0, date!(2024 - 06 - 10), Category::Food)];

        let insights = budget_insights(&transactions, &budgets, june());

        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].category, Category::Food);
        assert_eq!(insights[0].percentage_used, 120.0);
        assert_eq!(insights[0].remaining, -20.0);
        assert_eq!(insights[0].status, InsightStatus::Over);
    }

    #[test]
    fn insight_status_thresholds() {
        assert_eq!(InsightStatus::from_percentage(0.0), InsightStatus::Ok);
        assert_eq!(InsightStatus::from_percentage(79.99), InsightStatus::Ok);
        assert_eq!(InsightStatus::from_percentage(80.0), InsightStatus::Warning);
        assert_eq!(InsightStatus::from_percentage(99.99), InsightStatus::Warning);
        assert_eq!(InsightStatus::from_percentage(100.0), InsightStatus::Over);
    }

    #[test]
    fn no_insight_for_zero_or_missing_budget() {
        let budgets = vec![budget(1, Category::Food, "2024-06", 0.0)];
        let transactions = vec![
            transaction(1, 50.0, date!(2024 - 06 - 10), Category::Food),
            transaction(2, 50.0, date!(2024 - 06 - 10), Category::Transport),
        ];

        assert!(budget_insights(&transactions, &budgets, june()).is_empty());
    }

    #[test]
    fn insights_follow_category_order() {
        let budgets = vec![
            budget(1, Category::Other, "2024-06", 10.0),
            budget(2, Category::Food, "2024-06", 200.0),
        ];
        let transactions = vec![transaction(1, 170.0, date!(2024 - 06 - 10), Category::Food)];

        let insights = budget_insights(&transactions, &budgets, june());

        assert_eq!(insights.len(), 2);
        assert_eq!(insights[0].category, Category::Food);
        assert_eq!(insights[0].status, InsightStatus::Warning);
        assert_eq!(insights[1].category, Category::Other);
        assert_eq!(insights[1].status, InsightStatus::Ok);
        assert_eq!(insights[1].remaining, 10.0);
    }

    #[test]
    fn comparison_and_insights_cover_the_last_category() {
        let budgets = vec![budget(1, Category::Other, "2024-06", 40.0)];
        let transactions = vec![transaction(1, 40.0, date!(2024 - 06 - 30), Category::Other)];

        let comparison = budget_comparison(&transactions, &budgets, june());
        let insights = budget_insights(&transactions, &budgets, june());

        assert_eq!(comparison.len(), Category::ALL.len());
        let last = comparison.last().unwrap();
        assert_eq!(last.category, Category::Other);
        assert_eq!(last.actual_amount, 40.0);
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].category, Category::Other);
        assert_eq!(insights[0].status, InsightStatus::Over);
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&InsightStatus::Warning).unwrap(),
            "\"warning\""
        );
        assert_eq!(InsightStatus::Over.to_string(), "over");
    }
}
