//! Hosted record store over HTTP
//!
//! Speaks the PostgREST dialect used by hosted Postgres backends:
//! `/rest/v1/<table>` with `eq.` filters, `order=`/`limit=` parameters and
//! `Prefer` headers for returned representations and upserts.

use super::{RecordStore, Result, Row, StoreError};
use crate::schema::{Order, Table, OWNER_COLUMN};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Error body returned by PostgREST
#[derive(Debug, Deserialize)]
struct PostgrestError {
    code: Option<String>,
    message: Option<String>,
}

/// Record store client for a hosted backend
pub struct RestStore {
    agent: ureq::Agent,
    base_url: String,
    /// Project key sent as `apikey` on every request
    api_key: String,
    /// Token sent as the bearer; the service key for privileged writers
    bearer: String,
    owner_id: String,
}

impl RestStore {
    pub fn new(base_url: &str, api_key: &str, bearer: Option<&str>, owner_id: &str) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(REQUEST_TIMEOUT).build();
        Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            bearer: bearer.unwrap_or(api_key).to_string(),
            owner_id: owner_id.to_string(),
        }
    }

    pub fn table_url(&self, table: Table) -> String {
        format!("{}/rest/v1/{}", self.base_url, table.name())
    }

    fn request(&self, method: &str, table: Table) -> ureq::Request {
        self.agent
            .request(method, &self.table_url(table))
            .set("apikey", &self.api_key)
            .set("Authorization", &format!("Bearer {}", self.bearer))
            .set("Accept", "application/json")
    }

    fn owner_filter(&self) -> String {
        format!("eq.{}", self.owner_id)
    }

    fn with_owner(&self, mut row: Row) -> Row {
        row.insert(OWNER_COLUMN.to_string(), Value::String(self.owner_id.clone()));
        row
    }

    fn rows(&self, table: Table, result: std::result::Result<ureq::Response, ureq::Error>) -> Result<Vec<Row>> {
        match result {
            Ok(response) => response
                .into_json::<Vec<Row>>()
                .map_err(|e| StoreError::Backend(format!("invalid response body: {}", e))),
            Err(ureq::Error::Status(status, response)) => {
                let body = response.into_string().unwrap_or_default();
                Err(classify_status(table, status, &body))
            }
            Err(ureq::Error::Transport(transport)) => Err(StoreError::Network(transport.to_string())),
        }
    }

    fn single(&self, table: Table, rows: Vec<Row>, id: Option<&str>) -> Result<Row> {
        rows.into_iter().next().ok_or_else(|| match id {
            Some(id) => StoreError::NotFound {
                table: table.name().to_string(),
                id: id.to_string(),
            },
            None => StoreError::Backend(format!("{} returned no representation", table)),
        })
    }
}

/// PostgREST `order` parameter value
pub fn order_param(order: Order) -> String {
    let direction = if order.descending { "desc" } else { "asc" };
    format!("{}.{}", order.column, direction)
}

/// Turn an HTTP error status and body into a store error
pub fn classify_status(table: Table, status: u16, body: &str) -> StoreError {
    let parsed: Option<PostgrestError> = serde_json::from_str(body).ok();
    let code = parsed
        .as_ref()
        .and_then(|e| e.code.clone())
        .unwrap_or_default();
    let message = parsed
        .and_then(|e| e.message)
        .unwrap_or_else(|| body.trim().to_string());

    match (status, code.as_str()) {
        (_, "42P01") | (_, "PGRST205") | (404, _) => StoreError::missing_table(table),
        (401, _) | (403, _) | (_, "42501") => StoreError::Unauthorized,
        (409, _) | (_, "23505") => StoreError::Constraint(message),
        (400, _) => StoreError::Invalid(message),
        _ => StoreError::Backend(format!("HTTP {}: {}", status, message)),
    }
}

impl RecordStore for RestStore {
    fn list(&self, table: Table, order: Order, limit: Option<u32>) -> Result<Vec<Row>> {
        let mut request = self
            .request("GET", table)
            .query("select", "*")
            .query(OWNER_COLUMN, &self.owner_filter())
            .query("order", &order_param(order));
        if let Some(limit) = limit {
            request = request.query("limit", &limit.to_string());
        }
        tracing::debug!(table = %table, "listing rows");
        self.rows(table, request.call())
    }

    fn insert(&self, table: Table, row: Row) -> Result<Row> {
        let request = self
            .request("POST", table)
            .set("Prefer", "return=representation");
        let rows = self.rows(table, request.send_json(Value::Object(self.with_owner(row))))?;
        self.single(table, rows, None)
    }

    fn update(&self, table: Table, id: &str, patch: Row) -> Result<Row> {
        let request = self
            .request("PATCH", table)
            .query("id", &format!("eq.{}", id))
            .query(OWNER_COLUMN, &self.owner_filter())
            .set("Prefer", "return=representation");
        let rows = self.rows(table, request.send_json(Value::Object(patch)))?;
        self.single(table, rows, Some(id))
    }

    fn upsert(&self, table: Table, row: Row, conflict_key: &str) -> Result<Row> {
        let request = self
            .request("POST", table)
            .query("on_conflict", &format!("{},{}", OWNER_COLUMN, conflict_key))
            .set("Prefer", "resolution=merge-duplicates,return=representation");
        let rows = self.rows(table, request.send_json(Value::Object(self.with_owner(row))))?;
        self.single(table, rows, None)
    }

    fn delete(&self, table: Table, id: &str) -> Result<()> {
        let request = self
            .request("DELETE", table)
            .query("id", &format!("eq.{}", id))
            .query(OWNER_COLUMN, &self.owner_filter())
            .set("Prefer", "return=representation");
        let rows = self.rows(table, request.call())?;
        self.single(table, rows, Some(id)).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_url_trims_trailing_slash() {
        let store = RestStore::new("https://abc.example.co/", "anon", None, "owner-1");
        assert_eq!(store.table_url(Table::Links), "https://abc.example.co/rest/v1/links");
    }

    #[test]
    fn test_order_param() {
        assert_eq!(order_param(Order::desc("created_at")), "created_at.desc");
        assert_eq!(order_param(Order { column: "date", descending: false }), "date.asc");
    }

    #[test]
    fn test_undefined_table_is_missing_table() {
        let body = r#"{"code":"42P01","message":"relation \"public.tasks\" does not exist"}"#;
        assert_eq!(
            classify_status(Table::Tasks, 404, body),
            StoreError::missing_table(Table::Tasks)
        );
        let body = r#"{"code":"PGRST205","message":"Could not find the table 'public.briefings' in the schema cache"}"#;
        assert_eq!(
            classify_status(Table::Briefings, 400, body),
            StoreError::missing_table(Table::Briefings)
        );
    }

    #[test]
    fn test_auth_and_constraint_statuses() {
        assert_eq!(classify_status(Table::Projects, 401, ""), StoreError::Unauthorized);
        assert_eq!(
            classify_status(Table::Projects, 403, r#"{"code":"42501","message":"denied"}"#),
            StoreError::Unauthorized
        );
        let body = r#"{"code":"23505","message":"duplicate key value violates unique constraint"}"#;
        assert_eq!(
            classify_status(Table::Links, 409, body),
            StoreError::Constraint("duplicate key value violates unique constraint".to_string())
        );
    }

    #[test]
    fn test_unparsable_body_is_kept_as_message() {
        match classify_status(Table::Updates, 502, "Bad Gateway\n") {
            StoreError::Backend(message) => assert_eq!(message, "HTTP 502: Bad Gateway"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_unreachable_host_is_network_error() {
        // Port 9 on localhost refuses connections
        let store = RestStore::new("http://127.0.0.1:9", "anon", None, "owner-1");
        let err = store
            .list(Table::Updates, Table::Updates.default_order(), None)
            .unwrap_err();
        assert!(matches!(err, StoreError::Network(_)), "{:?}", err);
    }
}
