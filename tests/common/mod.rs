#![allow(dead_code)]

use chrono::{DateTime, NaiveDate, Utc};
use walletwise::models::{
    Budget, BudgetPeriod, Category, SavingsGoal, Transaction, TransactionKind,
};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

pub fn created(day: NaiveDate, seconds: u32) -> Option<DateTime<Utc>> {
    day.and_hms_opt(12, 0, seconds).map(|dt| dt.and_utc())
}

pub fn txn(
    id: &str,
    amount: f64,
    kind: TransactionKind,
    category_id: Option<&str>,
    day: NaiveDate,
) -> Transaction {
    Transaction {
        id: id.to_string(),
        amount,
        description: format!("txn {id}"),
        category_id: category_id.map(str::to_string),
        kind,
        date: day,
        created_at: created(day, 0),
        user_id: Some("user-1".to_string()),
    }
}

pub fn income(id: &str, amount: f64, day: NaiveDate) -> Transaction {
    txn(id, amount, TransactionKind::Income, None, day)
}

pub fn expense(id: &str, amount: f64, category_id: Option<&str>, day: NaiveDate) -> Transaction {
    txn(id, amount, TransactionKind::Expense, category_id, day)
}

pub fn category(id: &str, name: &str) -> Category {
    Category {
        id: id.to_string(),
        name: name.to_string(),
        color: "#10B981".to_string(),
        icon: None,
    }
}

pub fn budget(id: &str, amount: f64, category: Option<Category>, category_id: &str) -> Budget {
    Budget {
        id: id.to_string(),
        amount,
        category_id: category_id.to_string(),
        period: BudgetPeriod::Monthly,
        user_id: Some("user-1".to_string()),
        category,
    }
}

pub fn goal(id: &str, title: &str, current: f64, target: f64) -> SavingsGoal {
    SavingsGoal {
        id: id.to_string(),
        title: title.to_string(),
        target_amount: target,
        current_amount: current,
        target_date: None,
        user_id: Some("user-1".to_string()),
        created_at: None,
    }
}

pub fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}
