use std::cell::RefCell;
use std::collections::HashMap;

use anyhow::{Result, anyhow};
use serde_json::{Value, json};
use walletwise::data_access::{CacheKey, DataError, FinanceData, RecordKind, Session};
use walletwise::models::{
    BudgetPeriod, NewBudget, NewSavingsGoal, NewTransaction, TransactionKind,
};
use walletwise::store::{Query, StoreApi};

#[derive(Default)]
struct FakeStore {
    tables: RefCell<HashMap<String, Vec<Value>>>,
    calls: RefCell<Vec<String>>,
    next_id: RefCell<u32>,
}

impl FakeStore {
    fn with_rows(table: &str, rows: Vec<Value>) -> Self {
        let store = Self::default();
        store.tables.borrow_mut().insert(table.to_string(), rows);
        store
    }

    fn seed(&self, table: &str, rows: Vec<Value>) {
        self.tables.borrow_mut().insert(table.to_string(), rows);
    }

    fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    fn selects(&self, table: &str) -> usize {
        let wanted = format!("select {table}");
        self.calls.borrow().iter().filter(|c| **c == wanted).count()
    }
}

fn field_matches(row: &Value, column: &str, expected: &str) -> bool {
    match row.get(column) {
        Some(Value::String(s)) => s == expected,
        Some(other) => other.to_string() == expected,
        None => false,
    }
}

impl StoreApi for FakeStore {
    fn select(&self, table: &str, query: &Query) -> Result<Vec<Value>> {
        self.calls.borrow_mut().push(format!("select {table}"));
        let tables = self.tables.borrow();
        let rows = tables.get(table).cloned().unwrap_or_default();
        Ok(rows
            .into_iter()
            .filter(|row| {
                query
                    .filters
                    .iter()
                    .all(|(column, value)| field_matches(row, column, value))
            })
            .collect())
    }

    fn insert(&self, table: &str, row: Value) -> Result<Value> {
        self.calls.borrow_mut().push(format!("insert {table}"));
        let mut row = row;
        let id = {
            let mut next = self.next_id.borrow_mut();
            *next += 1;
            format!("new-{next}")
        };
        if let Value::Object(fields) = &mut row {
            fields.insert("id".to_string(), Value::String(id));
            fields.insert(
                "created_at".to_string(),
                Value::String("2024-05-01T09:00:00+00:00".to_string()),
            );
        }
        self.tables
            .borrow_mut()
            .entry(table.to_string())
            .or_default()
            .push(row.clone());
        Ok(row)
    }

    fn update(&self, table: &str, id: &str, patch: Value) -> Result<Value> {
        self.calls.borrow_mut().push(format!("update {table} {id}"));
        let mut tables = self.tables.borrow_mut();
        let row = tables
            .get_mut(table)
            .and_then(|rows| rows.iter_mut().find(|r| field_matches(r, "id", id)))
            .ok_or_else(|| anyhow!("no row {id} in {table}"))?;
        if let (Value::Object(fields), Value::Object(changes)) = (row, patch) {
            fields.extend(changes);
            return Ok(Value::Object(fields.clone()));
        }
        Err(anyhow!("bad patch"))
    }
}

fn session() -> Option<Session> {
    Some(Session {
        user_id: "user-1".to_string(),
        email: Some("me@example.com".to_string()),
    })
}

fn transaction_row(id: &str, user: &str) -> Value {
    json!({
        "id": id,
        "amount": 10,
        "description": "Coffee",
        "category_id": "cat-1",
        "type": "expense",
        "date": "2024-05-01",
        "user_id": user
    })
}

fn goal_row(id: &str, current: f64) -> Value {
    json!({
        "id": id,
        "title": "Vacation",
        "target_amount": 1000,
        "current_amount": current,
        "user_id": "user-1"
    })
}

fn new_expense() -> NewTransaction {
    NewTransaction {
        amount: 12.5,
        description: "Lunch".to_string(),
        category_id: Some("cat-1".to_string()),
        kind: TransactionKind::Expense,
        date: chrono::NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
    }
}

#[test]
fn reads_are_scoped_to_session_user() {
    let store = FakeStore::with_rows(
        "transactions",
        vec![transaction_row("a", "user-1"), transaction_row("b", "user-2")],
    );
    let mut data = FinanceData::new(&store, session());
    let rows = data.transactions().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, "a");
}

#[test]
fn repeated_reads_hit_the_cache() {
    let store = FakeStore::with_rows("transactions", vec![transaction_row("a", "user-1")]);
    let mut data = FinanceData::new(&store, session());
    data.transactions().unwrap();
    data.transactions().unwrap();
    assert_eq!(store.selects("transactions"), 1);
    assert!(data.cache().contains(&CacheKey {
        kind: RecordKind::Transactions,
        user_id: Some("user-1".to_string()),
    }));
}

#[test]
fn signed_out_reads_are_empty_and_skip_the_store() {
    let store = FakeStore::with_rows("transactions", vec![transaction_row("a", "user-1")]);
    let mut data = FinanceData::new(&store, None);
    assert!(data.transactions().unwrap().is_empty());
    assert!(data.budgets().unwrap().is_empty());
    assert!(data.savings_goals().unwrap().is_empty());
    assert!(store.calls().is_empty());
}

#[test]
fn categories_are_global() {
    let store = FakeStore::with_rows(
        "categories",
        vec![json!({"id": "c1", "name": "Dining", "color": "#EF4444", "icon": null})],
    );
    let mut data = FinanceData::new(&store, None);
    let categories = data.categories().unwrap();
    assert_eq!(categories.len(), 1);
    assert!(data.cache().contains(&CacheKey {
        kind: RecordKind::Categories,
        user_id: None,
    }));
}

#[test]
fn signed_out_writes_fail() {
    let store = FakeStore::default();
    let mut data = FinanceData::new(&store, None);
    let err = data.add_transaction(new_expense()).unwrap_err();
    assert!(matches!(err, DataError::NotAuthenticated));
    insta::assert_snapshot!(err.to_string(), @"user not authenticated");
    assert!(store.calls().is_empty());
}

#[test]
fn adding_a_transaction_invalidates_only_transactions() {
    let store = FakeStore::with_rows("transactions", vec![transaction_row("a", "user-1")]);
    store.seed("savings_goals", vec![goal_row("g1", 100.0)]);
    let mut data = FinanceData::new(&store, session());
    data.transactions().unwrap();
    data.savings_goals().unwrap();
    assert_eq!(data.cache().len(), 2);

    let added = data.add_transaction(new_expense()).unwrap();
    assert_eq!(added.id, "new-1");
    assert_eq!(added.user_id.as_deref(), Some("user-1"));
    assert_eq!(data.cache().len(), 1);

    let rows = data.transactions().unwrap();
    assert_eq!(rows.len(), 2);
    data.savings_goals().unwrap();
    assert_eq!(store.selects("transactions"), 2);
    assert_eq!(store.selects("savings_goals"), 1);
}

#[test]
fn invalid_payloads_are_rejected_before_the_store() {
    let store = FakeStore::default();
    let mut data = FinanceData::new(&store, session());

    let mut zero = new_expense();
    zero.amount = 0.0;
    assert!(matches!(
        data.add_transaction(zero),
        Err(DataError::Invalid { .. })
    ));

    let mut blank = new_expense();
    blank.description = "  ".to_string();
    assert!(matches!(
        data.add_transaction(blank),
        Err(DataError::Invalid { .. })
    ));

    let mut uncategorized = new_expense();
    uncategorized.category_id = None;
    let err = data.add_transaction(uncategorized).unwrap_err();
    insta::assert_snapshot!(err.to_string(), @"invalid transaction: category is required");

    let err = data
        .add_budget(NewBudget {
            amount: f64::NAN,
            category_id: "cat-1".to_string(),
            period: BudgetPeriod::Monthly,
        })
        .unwrap_err();
    insta::assert_snapshot!(err.to_string(), @"invalid budget: amount must be a positive number");

    let err = data
        .add_savings_goal(NewSavingsGoal {
            title: String::new(),
            target_amount: 100.0,
            target_date: None,
        })
        .unwrap_err();
    insta::assert_snapshot!(err.to_string(), @"invalid savings goal: title is required");

    assert!(store.calls().is_empty());
}

#[test]
fn budget_and_goal_inserts_carry_user() {
    let store = FakeStore::default();
    let mut data = FinanceData::new(&store, session());
    let budget = data
        .add_budget(NewBudget {
            amount: 300.0,
            category_id: "cat-1".to_string(),
            period: BudgetPeriod::Yearly,
        })
        .unwrap();
    assert_eq!(budget.period, BudgetPeriod::Yearly);
    assert_eq!(budget.user_id.as_deref(), Some("user-1"));

    let goal = data
        .add_savings_goal(NewSavingsGoal {
            title: "Laptop".to_string(),
            target_amount: 2000.0,
            target_date: None,
        })
        .unwrap();
    assert_eq!(goal.current_amount, 0.0);
    assert_eq!(goal.user_id.as_deref(), Some("user-1"));
}

#[test]
fn add_funds_tops_up_and_refreshes_goals() {
    let store = FakeStore::with_rows("savings_goals", vec![goal_row("g1", 250.0)]);
    let mut data = FinanceData::new(&store, session());

    let goal = data.add_funds("g1", 100.0).unwrap();
    assert_eq!(goal.current_amount, 350.0);
    assert!(store.calls().contains(&"update savings_goals g1".to_string()));

    let goals = data.savings_goals().unwrap();
    assert_eq!(goals[0].current_amount, 350.0);
    assert_eq!(store.selects("savings_goals"), 2);
}

#[test]
fn add_funds_to_missing_goal_fails() {
    let store = FakeStore::with_rows("savings_goals", vec![goal_row("g1", 0.0)]);
    let mut data = FinanceData::new(&store, session());
    let err = data.add_funds("nope", 10.0).unwrap_err();
    assert!(matches!(err, DataError::GoalNotFound(ref id) if id == "nope"));

    let err = data.add_funds("g1", -5.0).unwrap_err();
    assert!(matches!(err, DataError::Invalid { .. }));
}

#[test]
fn store_failures_surface_as_store_errors() {
    let store = FakeStore::default();
    let mut data = FinanceData::new(&store, session());
    let err = data
        .update_savings_goal("missing", Default::default())
        .unwrap_err();
    assert!(matches!(err, DataError::Store(_)));
    assert!(err.to_string().contains("no row missing"));
}
