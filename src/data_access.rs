//! Typed reads and mutations over the remote store, scoped to the signed-in
//! user, with a per-(record kind, user) cache that mutations invalidate.

use std::collections::HashMap;

use anyhow::Context;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::metrics::fund_goal;
use crate::models::{
    Budget, Category, NewBudget, NewSavingsGoal, NewTransaction, SavingsGoal, SavingsGoalUpdate,
    Transaction,
};
use crate::store::{
    BUDGET_WITH_CATEGORY, BUDGETS, CATEGORIES, Query, SAVINGS_GOALS, StoreApi, TRANSACTIONS,
};

#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("user not authenticated")]
    NotAuthenticated,
    #[error("invalid {record}: {reason}")]
    Invalid {
        record: &'static str,
        reason: &'static str,
    },
    #[error("no savings goal with id {0}")]
    GoalNotFound(String),
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

pub type DataResult<T> = std::result::Result<T, DataError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    pub email: Option<String>,
}

// --- Cache ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Transactions,
    Categories,
    Budgets,
    SavingsGoals,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub kind: RecordKind,
    /// `None` for global tables.
    pub user_id: Option<String>,
}

#[derive(Debug, Clone)]
enum CachedRows {
    Transactions(Vec<Transaction>),
    Categories(Vec<Category>),
    Budgets(Vec<Budget>),
    SavingsGoals(Vec<SavingsGoal>),
}

#[derive(Debug, Default)]
pub struct QueryCache {
    entries: HashMap<CacheKey, CachedRows>,
}

impl QueryCache {
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every cached read of `kind`, for any user.
    pub fn invalidate(&mut self, kind: RecordKind) {
        let before = self.entries.len();
        self.entries.retain(|key, _| key.kind != kind);
        tracing::debug!(?kind, dropped = before - self.entries.len(), "cache invalidated");
    }

    fn get(&self, key: &CacheKey) -> Option<&CachedRows> {
        self.entries.get(key)
    }

    fn insert(&mut self, key: CacheKey, rows: CachedRows) {
        self.entries.insert(key, rows);
    }
}

// --- Validation ---

fn positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

fn validate_transaction(txn: &NewTransaction) -> DataResult<()> {
    let invalid = |reason| DataError::Invalid {
        record: "transaction",
        reason,
    };
    if !positive(txn.amount) {
        return Err(invalid("amount must be a positive number"));
    }
    if txn.description.trim().is_empty() {
        return Err(invalid("description is required"));
    }
    if txn.category_id.as_deref().is_none_or(|c| c.trim().is_empty()) {
        return Err(invalid("category is required"));
    }
    Ok(())
}

fn validate_budget(budget: &NewBudget) -> DataResult<()> {
    let invalid = |reason| DataError::Invalid {
        record: "budget",
        reason,
    };
    if !positive(budget.amount) {
        return Err(invalid("amount must be a positive number"));
    }
    if budget.category_id.trim().is_empty() {
        return Err(invalid("category is required"));
    }
    Ok(())
}

fn validate_goal(goal: &NewSavingsGoal) -> DataResult<()> {
    let invalid = |reason| DataError::Invalid {
        record: "savings goal",
        reason,
    };
    if goal.title.trim().is_empty() {
        return Err(invalid("title is required"));
    }
    if !positive(goal.target_amount) {
        return Err(invalid("target amount must be a positive number"));
    }
    Ok(())
}

fn decode_rows<T: DeserializeOwned>(rows: Vec<Value>, table: &str) -> anyhow::Result<Vec<T>> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).with_context(|| format!("decoding {table} row")))
        .collect()
}

fn decode_row<T: DeserializeOwned>(row: Value, table: &str) -> anyhow::Result<T> {
    serde_json::from_value(row).with_context(|| format!("decoding {table} row"))
}

fn to_row<T: serde::Serialize>(payload: &T) -> anyhow::Result<Value> {
    serde_json::to_value(payload).context("encoding row")
}

// --- Data access ---

pub struct FinanceData<'a> {
    store: &'a dyn StoreApi,
    session: Option<Session>,
    cache: QueryCache,
}

impl<'a> FinanceData<'a> {
    pub fn new(store: &'a dyn StoreApi, session: Option<Session>) -> Self {
        Self {
            store,
            session,
            cache: QueryCache::default(),
        }
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    fn user_id(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.user_id.as_str())
    }

    fn require_user(&self) -> DataResult<String> {
        self.user_id()
            .map(str::to_string)
            .ok_or(DataError::NotAuthenticated)
    }

    fn user_key(&self, kind: RecordKind) -> Option<CacheKey> {
        self.user_id().map(|user_id| CacheKey {
            kind,
            user_id: Some(user_id.to_string()),
        })
    }

    pub fn transactions(&mut self) -> DataResult<Vec<Transaction>> {
        let Some(key) = self.user_key(RecordKind::Transactions) else {
            return Ok(Vec::new());
        };
        if let Some(CachedRows::Transactions(rows)) = self.cache.get(&key) {
            tracing::trace!(?key, "cache hit");
            return Ok(rows.clone());
        }
        let user_id = key.user_id.clone().unwrap_or_default();
        let query = Query::default()
            .eq("user_id", &user_id)
            .order("date", false);
        let rows: Vec<Transaction> = decode_rows(
            self.store.select(TRANSACTIONS, &query)?,
            TRANSACTIONS,
        )?;
        tracing::debug!(count = rows.len(), "fetched transactions");
        self.cache
            .insert(key, CachedRows::Transactions(rows.clone()));
        Ok(rows)
    }

    pub fn categories(&mut self) -> DataResult<Vec<Category>> {
        let key = CacheKey {
            kind: RecordKind::Categories,
            user_id: None,
        };
        if let Some(CachedRows::Categories(rows)) = self.cache.get(&key) {
            tracing::trace!(?key, "cache hit");
            return Ok(rows.clone());
        }
        let query = Query::default().order("name", true);
        let rows: Vec<Category> =
            decode_rows(self.store.select(CATEGORIES, &query)?, CATEGORIES)?;
        tracing::debug!(count = rows.len(), "fetched categories");
        self.cache.insert(key, CachedRows::Categories(rows.clone()));
        Ok(rows)
    }

    pub fn budgets(&mut self) -> DataResult<Vec<Budget>> {
        let Some(key) = self.user_key(RecordKind::Budgets) else {
            return Ok(Vec::new());
        };
        if let Some(CachedRows::Budgets(rows)) = self.cache.get(&key) {
            tracing::trace!(?key, "cache hit");
            return Ok(rows.clone());
        }
        let user_id = key.user_id.clone().unwrap_or_default();
        let query = Query::select(BUDGET_WITH_CATEGORY).eq("user_id", &user_id);
        let rows: Vec<Budget> = decode_rows(self.store.select(BUDGETS, &query)?, BUDGETS)?;
        tracing::debug!(count = rows.len(), "fetched budgets");
        self.cache.insert(key, CachedRows::Budgets(rows.clone()));
        Ok(rows)
    }

    pub fn savings_goals(&mut self) -> DataResult<Vec<SavingsGoal>> {
        let Some(key) = self.user_key(RecordKind::SavingsGoals) else {
            return Ok(Vec::new());
        };
        if let Some(CachedRows::SavingsGoals(rows)) = self.cache.get(&key) {
            tracing::trace!(?key, "cache hit");
            return Ok(rows.clone());
        }
        let user_id = key.user_id.clone().unwrap_or_default();
        let query = Query::default()
            .eq("user_id", &user_id)
            .order("created_at", false);
        let rows: Vec<SavingsGoal> =
            decode_rows(self.store.select(SAVINGS_GOALS, &query)?, SAVINGS_GOALS)?;
        tracing::debug!(count = rows.len(), "fetched savings goals");
        self.cache
            .insert(key, CachedRows::SavingsGoals(rows.clone()));
        Ok(rows)
    }

    fn insert_owned<T: serde::Serialize>(&self, table: &str, payload: &T) -> DataResult<Value> {
        let user_id = self.require_user()?;
        let mut row = to_row(payload)?;
        if let Value::Object(fields) = &mut row {
            fields.insert("user_id".to_string(), Value::String(user_id));
        }
        Ok(self.store.insert(table, row)?)
    }

    pub fn add_transaction(&mut self, txn: NewTransaction) -> DataResult<Transaction> {
        self.require_user()?;
        validate_transaction(&txn)?;
        let row = self.insert_owned(TRANSACTIONS, &txn)?;
        self.cache.invalidate(RecordKind::Transactions);
        Ok(decode_row(row, TRANSACTIONS)?)
    }

    pub fn add_budget(&mut self, budget: NewBudget) -> DataResult<Budget> {
        self.require_user()?;
        validate_budget(&budget)?;
        let row = self.insert_owned(BUDGETS, &budget)?;
        self.cache.invalidate(RecordKind::Budgets);
        Ok(decode_row(row, BUDGETS)?)
    }

    pub fn add_savings_goal(&mut self, goal: NewSavingsGoal) -> DataResult<SavingsGoal> {
        self.require_user()?;
        validate_goal(&goal)?;
        let row = self.insert_owned(SAVINGS_GOALS, &goal)?;
        self.cache.invalidate(RecordKind::SavingsGoals);
        Ok(decode_row(row, SAVINGS_GOALS)?)
    }

    pub fn update_savings_goal(
        &mut self,
        id: &str,
        update: SavingsGoalUpdate,
    ) -> DataResult<SavingsGoal> {
        self.require_user()?;
        let row = self.store.update(SAVINGS_GOALS, id, to_row(&update)?)?;
        self.cache.invalidate(RecordKind::SavingsGoals);
        Ok(decode_row(row, SAVINGS_GOALS)?)
    }

    /// Tops up a goal's `current_amount` by `amount`.
    pub fn add_funds(&mut self, goal_id: &str, amount: f64) -> DataResult<SavingsGoal> {
        self.require_user()?;
        if !positive(amount) {
            return Err(DataError::Invalid {
                record: "top-up",
                reason: "amount must be a positive number",
            });
        }
        let goal = self
            .savings_goals()?
            .into_iter()
            .find(|g| g.id == goal_id)
            .ok_or_else(|| DataError::GoalNotFound(goal_id.to_string()))?;
        let update = SavingsGoalUpdate {
            current_amount: Some(fund_goal(&goal, amount)),
            ..SavingsGoalUpdate::default()
        };
        self.update_savings_goal(goal_id, update)
    }
}
