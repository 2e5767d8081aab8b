//! Hosted PostgREST backend
//!
//! Talks to `{url}/rest/v1/{table}` with the project's public key and, once a
//! user has signed in, the user's access token as bearer. Balance increments
//! go through the `laplata_increment` database function.

use std::sync::RwLock;
use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::{Backend, Filter, FilterOp, Query, Row, Table};
use crate::error::{LaplataError, LaplataResult};
use crate::models::Money;

const USER_AGENT: &str = concat!("laplata/", env!("CARGO_PKG_VERSION"));

/// Blocking HTTP client shared by the hosted backend and auth
pub fn http_client() -> LaplataResult<Client> {
    let client = Client::builder()
        .timeout(Duration::from_secs(15))
        .user_agent(USER_AGENT)
        .build()?;
    Ok(client)
}

/// PostgREST error body
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    details: Option<String>,
}

/// Backend speaking PostgREST over HTTPS
pub struct RestBackend {
    base_url: String,
    anon_key: String,
    access_token: RwLock<Option<String>>,
    client: Client,
}

impl RestBackend {
    pub fn new(base_url: impl Into<String>, anon_key: impl Into<String>) -> LaplataResult<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(LaplataError::Config("remote backend url is not set".into()));
        }
        Ok(Self {
            base_url,
            anon_key: anon_key.into(),
            access_token: RwLock::new(None),
            client: http_client()?,
        })
    }

    /// Use a signed-in user's token for subsequent requests
    pub fn set_access_token(&self, token: Option<String>) {
        match self.access_token.write() {
            Ok(mut guard) => *guard = token,
            Err(poisoned) => *poisoned.into_inner() = token,
        }
    }

    fn table_url(&self, table: Table) -> String {
        format!("{}/rest/v1/{}", self.base_url, table.name())
    }

    fn bearer(&self) -> String {
        let token = match self.access_token.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        token.unwrap_or_else(|| self.anon_key.clone())
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.anon_key)
            .bearer_auth(self.bearer())
            .header("Prefer", "return=representation")
    }

    fn rows(response: Response) -> LaplataResult<Vec<Row>> {
        let response = check(response)?;
        Ok(response.json::<Vec<Row>>()?)
    }
}

/// Turn a non-success response into a backend error carrying the provider message
fn check(response: Response) -> LaplataResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().unwrap_or_default();
    let body: ErrorBody = serde_json::from_str(&text).unwrap_or_default();
    let message = match (body.message, body.details) {
        (Some(message), Some(details)) => format!("{} ({})", message, details),
        (Some(message), None) => message,
        (None, _) if !text.is_empty() => text,
        (None, _) => status.to_string(),
    };
    Err(LaplataError::Backend {
        message,
        code: body.code.or_else(|| Some(status.as_u16().to_string())),
    })
}

/// Query-string pairs for filters, order and limit
pub fn query_params(filters: &[Filter], query: Option<&Query>) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = filters
        .iter()
        .map(|f| (f.column.clone(), format!("{}.{}", f.op.as_str(), f.value_text())))
        .collect();

    if let Some(query) = query {
        if !query.order.is_empty() {
            let order = query
                .order
                .iter()
                .map(|o| {
                    format!(
                        "{}.{}",
                        o.column,
                        if o.ascending { "asc" } else { "desc" }
                    )
                })
                .collect::<Vec<_>>()
                .join(",");
            params.push(("order".into(), order));
        }
        if let Some(limit) = query.limit {
            params.push(("limit".into(), limit.to_string()));
        }
    }
    params
}

fn eq_value<'a>(filters: &'a [Filter], column: &str) -> Option<&'a Value> {
    filters
        .iter()
        .find(|f| f.column == column && f.op == FilterOp::Eq)
        .map(|f| &f.value)
}

impl Backend for RestBackend {
    fn select(&self, table: Table, query: &Query) -> LaplataResult<Vec<Row>> {
        debug!(%table, "select");
        let mut params = vec![("select".to_string(), "*".to_string())];
        params.extend(query_params(&query.filters, Some(query)));
        let response = self
            .authorize(self.client.get(self.table_url(table)))
            .query(&params)
            .send()?;
        Self::rows(response)
    }

    fn insert(&self, table: Table, rows: Vec<Row>) -> LaplataResult<Vec<Row>> {
        debug!(%table, count = rows.len(), "insert");
        let response = self
            .authorize(self.client.post(self.table_url(table)))
            .json(&rows)
            .send()?;
        Self::rows(response)
    }

    fn update(&self, table: Table, filters: &[Filter], patch: Row) -> LaplataResult<Vec<Row>> {
        debug!(%table, "update");
        let response = self
            .authorize(self.client.patch(self.table_url(table)))
            .query(&query_params(filters, None))
            .json(&patch)
            .send()?;
        Self::rows(response)
    }

    fn delete(&self, table: Table, filters: &[Filter]) -> LaplataResult<Vec<Row>> {
        debug!(%table, "delete");
        let response = self
            .authorize(self.client.delete(self.table_url(table)))
            .query(&query_params(filters, None))
            .send()?;
        Self::rows(response)
    }

    fn increment(
        &self,
        table: Table,
        filters: &[Filter],
        column: &str,
        delta: Money,
    ) -> LaplataResult<Row> {
        debug!(%table, column, %delta, "increment");
        let (Some(row_id), Some(owner)) = (eq_value(filters, "id"), eq_value(filters, "owner_id"))
        else {
            return Err(LaplataError::backend(
                "increment requires id and owner_id equality filters",
            ));
        };

        let body = json!({
            "table_name": table.name(),
            "row_id": row_id,
            "owner": owner,
            "column_name": column,
            "delta": delta,
        });
        let response = self
            .authorize(
                self.client
                    .post(format!("{}/rest/v1/rpc/laplata_increment", self.base_url)),
            )
            .json(&body)
            .send()?;
        let response = check(response)?;

        match response.json::<Value>()? {
            Value::Object(row) => Ok(row),
            Value::Array(mut rows) if rows.len() == 1 => match rows.pop() {
                Some(Value::Object(row)) => Ok(row),
                _ => Err(LaplataError::backend("unexpected increment response")),
            },
            _ => Err(LaplataError::backend("unexpected increment response")),
        }
    }
}
