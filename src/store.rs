use anyhow::{Context, Result, bail};
use serde_json::Value;

// --- Tables ---

pub const TRANSACTIONS: &str = "transactions";
pub const CATEGORIES: &str = "categories";
pub const BUDGETS: &str = "budgets";
pub const SAVINGS_GOALS: &str = "savings_goals";

/// Projection for the budgets read, embedding the budget's category.
pub const BUDGET_WITH_CATEGORY: &str = "*,categories(id,name,color,icon)";

// --- Query description ---

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

/// A filtered, ordered read. Renders to PostgREST query parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub select: String,
    pub filters: Vec<(String, String)>,
    pub order: Option<Order>,
}

impl Default for Query {
    fn default() -> Self {
        Self {
            select: "*".to_string(),
            filters: Vec::new(),
            order: None,
        }
    }
}

impl Query {
    pub fn select(projection: &str) -> Self {
        Self {
            select: projection.to_string(),
            ..Self::default()
        }
    }

    pub fn eq(mut self, column: &str, value: &str) -> Self {
        self.filters.push((column.to_string(), value.to_string()));
        self
    }

    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        self.order = Some(Order {
            column: column.to_string(),
            ascending,
        });
        self
    }

    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![("select".to_string(), self.select.clone())];
        params.extend(
            self.filters
                .iter()
                .map(|(column, value)| (column.clone(), format!("eq.{value}"))),
        );
        if let Some(order) = &self.order {
            let direction = if order.ascending { "asc" } else { "desc" };
            params.push(("order".to_string(), format!("{}.{direction}", order.column)));
        }
        params
    }
}

// --- Client trait ---

pub trait StoreApi {
    fn select(&self, table: &str, query: &Query) -> Result<Vec<Value>>;
    /// Inserts one row and returns it as stored.
    fn insert(&self, table: &str, row: Value) -> Result<Value>;
    /// Applies `patch` to the row with `id` and returns the updated row.
    fn update(&self, table: &str, id: &str, patch: Value) -> Result<Value>;
}

// --- HTTP implementation ---

pub struct HttpStoreClient {
    client: reqwest::blocking::Client,
    base_url: String,
    api_key: String,
    access_token: String,
}

impl HttpStoreClient {
    pub fn new(base_url: &str, api_key: &str, access_token: &str) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .build()
            .context("building HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            access_token: access_token.to_string(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.base_url)
    }

    fn send_json<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::blocking::RequestBuilder,
        what: &str,
    ) -> Result<T> {
        let resp = request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.access_token)
            .send()
            .with_context(|| what.to_string())?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            bail!("store returned {status} for {what}: {body}");
        }

        resp.json::<T>()
            .with_context(|| format!("parsing response from {what}"))
    }

    fn single_row(rows: Vec<Value>, what: &str) -> Result<Value> {
        let mut rows = rows.into_iter();
        match (rows.next(), rows.next()) {
            (Some(row), None) => Ok(row),
            (None, _) => bail!("{what} returned no rows"),
            (Some(_), Some(_)) => bail!("{what} returned more than one row"),
        }
    }
}

impl StoreApi for HttpStoreClient {
    fn select(&self, table: &str, query: &Query) -> Result<Vec<Value>> {
        let url = self.table_url(table);
        tracing::debug!(%url, ?query, "select");
        let request = self.client.get(&url).query(&query.to_params());
        self.send_json(request, &format!("GET {url}"))
    }

    fn insert(&self, table: &str, row: Value) -> Result<Value> {
        let url = self.table_url(table);
        tracing::debug!(%url, "insert");
        let what = format!("POST {url}");
        let request = self
            .client
            .post(&url)
            .header("Prefer", "return=representation")
            .json(&[row]);
        let rows: Vec<Value> = self.send_json(request, &what)?;
        Self::single_row(rows, &what)
    }

    fn update(&self, table: &str, id: &str, patch: Value) -> Result<Value> {
        let url = self.table_url(table);
        tracing::debug!(%url, id, "update");
        let what = format!("PATCH {url} id={id}");
        let request = self
            .client
            .patch(&url)
            .query(&[("id", format!("eq.{id}"))])
            .header("Prefer", "return=representation")
            .json(&patch);
        let rows: Vec<Value> = self.send_json(request, &what)?;
        Self::single_row(rows, &what)
    }
}
