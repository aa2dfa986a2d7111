//! Dashboard metrics derived from fetched records.
//!
//! Every function here is pure and total: it borrows a snapshot of the
//! records, takes "now" explicitly where the calendar month matters, and
//! never fails. Zero denominators resolve to documented values instead of
//! non-finite ratios.

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::Serialize;

use crate::calendar_months::{MonthKey, trailing_months};
use crate::models::{Budget, Category, SavingsGoal, Transaction, TransactionKind};

pub const DEFAULT_MONTH_WINDOW: usize = 6;
pub const RECENT_ACTIVITY_LIMIT: usize = 6;

pub const UNKNOWN_CATEGORY: &str = "Unknown Category";
pub const OTHER_CATEGORY: &str = "Other";
pub const UNCATEGORIZED: &str = "Uncategorized";
pub const UNRESOLVED_CATEGORY: &str = "Unknown";

pub const CATEGORY_PALETTE: [&str; 8] = [
    "#3B82F6", "#10B981", "#8B5CF6", "#F59E0B", "#EF4444", "#EC4899", "#6366F1", "#14B8A6",
];

const WARNING_THRESHOLD: f64 = 80.0;
const OVER_THRESHOLD: f64 = 100.0;

fn clamp_percentage(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}

fn category_name<'a>(categories: &'a [Category], id: &str) -> Option<&'a str> {
    categories
        .iter()
        .find(|c| c.id == id)
        .map(|c| c.name.as_str())
}

// --- Overview ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewMetrics {
    pub total_balance: f64,
    pub monthly_income: f64,
    pub monthly_expenses: f64,
    pub savings_rate: f64,
}

impl OverviewMetrics {
    pub fn net_monthly_savings(&self) -> f64 {
        self.monthly_income - self.monthly_expenses
    }

    /// The savings-rate card never shows a negative rate.
    pub fn display_savings_rate(&self) -> f64 {
        self.savings_rate.max(0.0)
    }
}

pub fn overview_metrics(transactions: &[Transaction], now: NaiveDate) -> OverviewMetrics {
    let current = MonthKey::of(now);
    let mut total_income = 0.0;
    let mut total_expenses = 0.0;
    let mut monthly_income = 0.0;
    let mut monthly_expenses = 0.0;

    for txn in transactions {
        let this_month = current.contains(txn.date);
        match txn.kind {
            TransactionKind::Income => {
                total_income += txn.amount;
                if this_month {
                    monthly_income += txn.amount;
                }
            }
            TransactionKind::Expense => {
                total_expenses += txn.amount;
                if this_month {
                    monthly_expenses += txn.amount;
                }
            }
            TransactionKind::Unknown => {}
        }
    }

    let savings_rate = if monthly_income > 0.0 {
        (monthly_income - monthly_expenses) / monthly_income * 100.0
    } else {
        0.0
    };

    OverviewMetrics {
        total_balance: total_income - total_expenses,
        monthly_income,
        monthly_expenses,
        savings_rate,
    }
}

// --- Budget progress ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetStatus {
    Good,
    Warning,
    Over,
}

impl BudgetStatus {
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage >= OVER_THRESHOLD {
            Self::Over
        } else if percentage >= WARNING_THRESHOLD {
            Self::Warning
        } else {
            Self::Good
        }
    }

    pub fn classify(spent: f64, amount: f64) -> Self {
        Self::from_percentage(budget_percentage(spent, amount))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Good => "good",
            Self::Warning => "warning",
            Self::Over => "over",
        }
    }
}

/// `spent / amount * 100`, unclamped. A zero budget reads as 100% once
/// anything is spent against it and 0% otherwise.
pub fn budget_percentage(spent: f64, amount: f64) -> f64 {
    if amount == 0.0 {
        if spent > 0.0 { OVER_THRESHOLD } else { 0.0 }
    } else {
        spent / amount * 100.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetProgress {
    pub id: String,
    pub category_name: String,
    pub spent: f64,
    pub budget: f64,
    pub percentage: f64,
    pub status: BudgetStatus,
}

impl BudgetProgress {
    pub fn bar_percentage(&self) -> f64 {
        clamp_percentage(self.percentage)
    }
}

pub fn budget_progress(
    budgets: &[Budget],
    transactions: &[Transaction],
    now: NaiveDate,
) -> Vec<BudgetProgress> {
    let current = MonthKey::of(now);
    budgets
        .iter()
        .map(|budget| {
            let spent: f64 = transactions
                .iter()
                .filter(|t| {
                    t.is_expense()
                        && t.category_id.as_deref() == Some(budget.category_id.as_str())
                        && current.contains(t.date)
                })
                .map(|t| t.amount)
                .sum();
            let percentage = budget_percentage(spent, budget.amount);
            BudgetProgress {
                id: budget.id.clone(),
                category_name: budget
                    .category
                    .as_ref()
                    .map(|c| c.name.clone())
                    .unwrap_or_else(|| UNKNOWN_CATEGORY.to_string()),
                spent,
                budget: budget.amount,
                percentage,
                status: BudgetStatus::from_percentage(percentage),
            }
        })
        .collect()
}

// --- Monthly series ---

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyTotals {
    /// Month-of-year label only; repeats when the window spans more than a year.
    pub month: String,
    pub income: f64,
    pub expenses: f64,
}

pub fn monthly_series(
    transactions: &[Transaction],
    now: NaiveDate,
    window: usize,
) -> Vec<MonthlyTotals> {
    trailing_months(now, window)
        .into_iter()
        .map(|key| {
            let mut totals = MonthlyTotals {
                month: key.label().to_string(),
                income: 0.0,
                expenses: 0.0,
            };
            for txn in transactions.iter().filter(|t| key.contains(t.date)) {
                match txn.kind {
                    TransactionKind::Income => totals.income += txn.amount,
                    TransactionKind::Expense => totals.expenses += txn.amount,
                    TransactionKind::Unknown => {}
                }
            }
            totals
        })
        .collect()
}

// --- Category distribution ---

/// How distribution slices are named.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryLabels {
    /// The raw `category_id`, as the dashboard chart has always shown it.
    #[default]
    RawId,
    /// The category's name, joined through the category list.
    Resolved,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySlice {
    pub name: String,
    pub value: f64,
    pub color: String,
}

pub fn category_distribution(
    transactions: &[Transaction],
    categories: &[Category],
    labels: CategoryLabels,
) -> Vec<CategorySlice> {
    let mut spending: IndexMap<Option<&str>, f64> = IndexMap::new();
    for txn in transactions.iter().filter(|t| t.is_expense()) {
        *spending.entry(txn.category_id.as_deref()).or_insert(0.0) += txn.amount;
    }

    spending
        .into_iter()
        .enumerate()
        .map(|(index, (key, value))| {
            let name = match (key, labels) {
                (None, _) => OTHER_CATEGORY,
                (Some(id), CategoryLabels::RawId) => id,
                (Some(id), CategoryLabels::Resolved) => {
                    category_name(categories, id).unwrap_or(UNRESOLVED_CATEGORY)
                }
            };
            CategorySlice {
                name: name.to_string(),
                value,
                color: CATEGORY_PALETTE[index % CATEGORY_PALETTE.len()].to_string(),
            }
        })
        .collect()
}

// --- Savings goals ---

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalProgress {
    pub id: String,
    pub title: String,
    pub percentage: f64,
    pub remaining: f64,
}

impl GoalProgress {
    pub fn bar_percentage(&self) -> f64 {
        clamp_percentage(self.percentage)
    }
}

pub fn goal_percentage(goal: &SavingsGoal) -> f64 {
    if goal.target_amount == 0.0 {
        0.0
    } else {
        goal.current_amount / goal.target_amount * 100.0
    }
}

pub fn savings_goal_progress(goals: &[SavingsGoal]) -> Vec<GoalProgress> {
    goals
        .iter()
        .map(|goal| GoalProgress {
            id: goal.id.clone(),
            title: goal.title.clone(),
            percentage: goal_percentage(goal),
            remaining: goal.target_amount - goal.current_amount,
        })
        .collect()
}

/// New `current_amount` after an add-funds top-up.
pub fn fund_goal(goal: &SavingsGoal, amount: f64) -> f64 {
    goal.current_amount + amount
}

// --- Recent activity ---

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityItem {
    pub id: String,
    pub description: String,
    pub category_name: String,
    pub kind: TransactionKind,
    pub date: NaiveDate,
    pub signed_amount: f64,
}

pub fn recent_activity(
    transactions: &[Transaction],
    categories: &[Category],
    limit: usize,
) -> Vec<ActivityItem> {
    let mut ordered: Vec<&Transaction> = transactions.iter().collect();
    ordered.sort_by(|a, b| {
        b.date
            .cmp(&a.date)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });

    ordered
        .into_iter()
        .take(limit)
        .map(|txn| {
            let category_name = match txn.category_id.as_deref() {
                None => UNCATEGORIZED,
                Some(id) => category_name(categories, id).unwrap_or(UNRESOLVED_CATEGORY),
            };
            let signed_amount = match txn.kind {
                TransactionKind::Expense => -txn.amount,
                TransactionKind::Income | TransactionKind::Unknown => txn.amount,
            };
            ActivityItem {
                id: txn.id.clone(),
                description: txn.description.clone(),
                category_name: category_name.to_string(),
                kind: txn.kind,
                date: txn.date,
                signed_amount,
            }
        })
        .collect()
}
