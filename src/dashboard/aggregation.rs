//! Transaction aggregation: totals by category and by month, and the change
//! in spending between two months.
//!
//! Every function here is pure. Sums are accumulated in the order the
//! transactions are given and ties are broken by [Category] order, so the
//! same snapshot always produces the same output.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use time::Date;

use crate::{category::Category, month::MonthKey, transaction::Transaction};

/// The total spent in one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    /// The category the total is for.
    pub category: Category,
    /// The sum of the amounts of the category's transactions.
    pub total: f64,
}

/// A category's total and its share of all spending.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryShare {
    /// The category the share is for.
    pub category: Category,
    /// The sum of the amounts of the category's transactions.
    pub total: f64,
    /// `total` as a percentage of all spending, 0 if nothing was spent.
    pub percentage: f64,
}

/// The total spent in one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyTotal {
    /// The month the total is for.
    pub month: MonthKey,
    /// The display label for the month, e.g. "Jan 2024".
    pub label: String,
    /// The sum of the amounts of the month's transactions.
    pub total: f64,
}

/// Spending in the current month compared with the month before it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthOverMonth {
    /// The month containing "today".
    pub current_month: MonthKey,
    /// The total spent in the current month.
    pub current: f64,
    /// The total spent in the month before the current month.
    pub previous: f64,
    /// The change from `previous` to `current` in percent, 0 if nothing was
    /// spent in the previous month.
    pub percentage_change: f64,
}

/// Sum transaction amounts by category.
///
/// Categories without transactions are left out. The output is sorted by
/// total, largest first, with equal totals in [Category] order.
pub fn category_totals(transactions: &[Transaction]) -> Vec<CategoryTotal> {
    let mut totals: HashMap<Category, f64> = HashMap::new();

    for transaction in transactions {
        *totals.entry(transaction.category).or_insert(0.0) += transaction.amount;
    }

    let mut totals: Vec<CategoryTotal> = totals
        .into_iter()
        .map(|(category, total)| CategoryTotal { category, total })
        .collect();

    totals.sort_by(|a, b| {
        b.total
            .total_cmp(&a.total)
            .then_with(|| a.category.cmp(&b.category))
    });

    totals
}

/// Sum transaction amounts by calendar month, in chronological order.
pub fn monthly_totals(transactions: &[Transaction]) -> Vec<MonthlyTotal> {
    let mut totals: BTreeMap<MonthKey, f64> = BTreeMap::new();

    for transaction in transactions {
        *totals
            .entry(MonthKey::from_date(transaction.date))
            .or_insert(0.0) += transaction.amount;
    }

    totals
        .into_iter()
        .map(|(month, total)| MonthlyTotal {
            month,
            label: month.label(),
            total,
        })
        .collect()
}

/// The sum of every transaction amount.
pub fn total_spent(transactions: &[Transaction]) -> f64 {
    transactions
        .iter()
        .map(|transaction| transaction.amount)
        .sum()
}

/// Every category with its total and share of all spending, in [Category]
/// order. Categories without transactions have a total of 0.
pub fn category_breakdown(transactions: &[Transaction]) -> Vec<CategoryShare> {
    let totals = category_totals(transactions);
    let total_spent = total_spent(transactions);

    Category::ALL
        .iter()
        .map(|&category| {
            let total = totals
                .iter()
                .find(|total| total.category == category)
                .map_or(0.0, |total| total.total);

            CategoryShare {
                category,
                total,
                percentage: percentage_of(total, total_spent),
            }
        })
        .collect()
}

/// Compare spending in the month containing `today` with the month before.
pub fn month_over_month(transactions: &[Transaction], today: Date) -> MonthOverMonth {
    let current_month = MonthKey::from_date(today);
    let current = spent_in_month(transactions, current_month);
    let previous = spent_in_month(transactions, current_month.previous());

    let percentage_change = if previous == 0.0 {
        0.0
    } else {
        (current - previous) * 100.0 / previous
    };

    MonthOverMonth {
        current_month,
        current,
        previous,
        percentage_change,
    }
}

/// The sum of the amounts of the transactions dated in `month`.
fn spent_in_month(transactions: &[Transaction], month: MonthKey) -> f64 {
    transactions
        .iter()
        .filter(|transaction| month.contains(transaction.date))
        .map(|transaction| transaction.amount)
        .sum()
}

fn percentage_of(part: f64, whole: f64) -> f64 {
    if whole == 0.0 {
        0.0
    } else {
        part * 100.0 / whole
    }
}
