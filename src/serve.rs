//! HTTP server for the dashboard
//!
//! `workdesk serve` → write endpoints for external callers plus a small read
//! API over the loaded collections.
//!
//! | Route | Auth | Does |
//! |-------|------|------|
//! | `POST /updates` | api token | append an update |
//! | `POST /briefings` | api token | upsert the briefing for a date |
//! | `POST /seed` | service key | bulk-load the seed dataset |
//! | `GET /trading` | none | simulated portfolio |
//! | `GET /api/dashboard` | none | mode and collections |
//! | `GET /api/search?q=` | none | search results |
//! | `POST /api/refresh` | none | reload from the store |
//!
//! Routing and validation live in [`handle_api`], a plain function from
//! request to reply; the tiny_http loop only moves bytes.

use crate::config::{Config, ConfigError};
use crate::dal::{DataAccess, Mode};
use crate::mapper::{self, MapError};
use crate::model::{Mood, NewBriefing, NewUpdate, UpdateType};
use crate::schema::Table;
use crate::seed;
use crate::state::Collections;
use crate::store::{RecordStore, StoreError};
use crate::trading;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::io::Read;
use std::sync::Arc;
use tiny_http::{Header, Method, Request, Response, Server};

/// Request bodies larger than this are cut off
const MAX_BODY_BYTES: u64 = 256 * 1024;

#[derive(Serialize)]
struct ApiResponse<T> {
    ok: bool,
    data: Option<T>,
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn success(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }
}

impl ApiResponse<()> {
    fn failure(message: String) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(message),
        }
    }
}

/// Error type for API requests; each variant maps to one status code
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    BadRequest(String),

    #[error("Not found")]
    NotFound,

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Store returned an unreadable row: {0}")]
    Map(#[from] MapError),
}

impl ApiError {
    pub fn status(&self) -> u16 {
        match self {
            ApiError::Unauthorized => 401,
            ApiError::BadRequest(_) => 400,
            ApiError::NotFound => 404,
            ApiError::MethodNotAllowed => 405,
            ApiError::Store(_) | ApiError::Map(_) => 500,
        }
    }
}

fn bad_request(message: &str) -> ApiError {
    ApiError::BadRequest(message.to_string())
}

/// An HTTP request reduced to what the handlers look at
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub body: String,
}

impl ApiRequest {
    pub fn new(method: Method, url: &str) -> Self {
        let (path, query) = match url.split_once('?') {
            Some((path, query)) => (path.to_string(), Some(query.to_string())),
            None => (url.to_string(), None),
        };
        Self {
            method,
            path,
            query,
            authorization: None,
            body: String::new(),
        }
    }

    pub fn bearer(mut self, token: &str) -> Self {
        self.authorization = Some(format!("Bearer {}", token));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = body.to_string();
        self
    }
}

/// Status plus JSON body
#[derive(Debug, Clone)]
pub struct ApiReply {
    pub status: u16,
    pub body: String,
}

impl ApiReply {
    fn success<T: Serialize>(data: T) -> Self {
        Self::encode(200, &ApiResponse::success(data))
    }

    fn failure(error: &ApiError) -> Self {
        Self::encode(error.status(), &ApiResponse::failure(error.to_string()))
    }

    fn encode<T: Serialize>(status: u16, response: &ApiResponse<T>) -> Self {
        match serde_json::to_string(response) {
            Ok(body) => Self { status, body },
            Err(e) => Self {
                status: 500,
                body: format!(r#"{{"ok":false,"data":null,"error":"encoding failed: {}"}}"#, e),
            },
        }
    }

    /// Parsed body, for callers that want to inspect the envelope
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap_or(Value::Null)
    }
}

/// Everything the handlers need, owned by the server loop
pub struct ServerContext {
    pub dal: DataAccess,
    /// Store the write endpoints go through
    pub store: Arc<dyn RecordStore>,
    /// Privileged store for seeding
    pub service_store: Arc<dyn RecordStore>,
    pub api_token: Option<String>,
    pub service_key: Option<String>,
    /// Set after a successful write; the next dashboard read reloads
    stale: bool,
}

impl ServerContext {
    pub fn new(
        store: Arc<dyn RecordStore>,
        service_store: Arc<dyn RecordStore>,
        api_token: Option<String>,
        service_key: Option<String>,
    ) -> Self {
        Self {
            dal: DataAccess::new(store.clone()),
            store,
            service_store,
            api_token,
            service_key,
            stale: false,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self::new(
            config.build_store()?,
            config.build_service_store()?,
            config.api.token.clone(),
            config.remote.service_key.clone(),
        ))
    }

    /// Writes made behind the DAL's back are picked up on the next read,
    /// but only a remote session reloads. Fallback stays put until an
    /// explicit refresh.
    fn mark_stale(&mut self) {
        self.stale = self.dal.mode() == Some(Mode::Remote);
    }

    fn current(&mut self) -> Mode {
        let mode = self.dal.load();
        if std::mem::take(&mut self.stale) && mode == Mode::Remote {
            return self.dal.refresh();
        }
        mode
    }
}

// ============================================================================
// Auth
// ============================================================================

/// Constant-length comparison of two secrets via their digests
fn secrets_match(given: &str, expected: &str) -> bool {
    Sha256::digest(given.as_bytes()) == Sha256::digest(expected.as_bytes())
}

/// `Authorization: Bearer <secret>` must match `expected`. No configured
/// secret means nobody is authorized.
fn authorize(expected: Option<&str>, header: Option<&str>) -> Result<(), ApiError> {
    let expected = expected.filter(|s| !s.is_empty()).ok_or(ApiError::Unauthorized)?;
    let given = header
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .ok_or(ApiError::Unauthorized)?;
    if secrets_match(given, expected) {
        Ok(())
    } else {
        Err(ApiError::Unauthorized)
    }
}

// ============================================================================
// Body validation
// ============================================================================

fn parse_object(body: &str) -> Result<serde_json::Map<String, Value>, ApiError> {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(bad_request("Body must be a JSON object")),
        Err(e) => Err(ApiError::BadRequest(format!("Invalid JSON: {}", e))),
    }
}

/// A present, non-blank string field
fn required_text(body: &serde_json::Map<String, Value>, field: &str) -> Result<String, ApiError> {
    match body.get(field) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.clone()),
        _ => Err(ApiError::BadRequest(format!("`{}` is required", field))),
    }
}

/// An optional enum literal; absent or null gives the default
fn optional_literal<T>(body: &serde_json::Map<String, Value>, field: &str, allowed: &[T]) -> Result<T, ApiError>
where
    T: std::str::FromStr + Default + std::fmt::Display,
{
    let invalid = || {
        let allowed: Vec<String> = allowed.iter().map(ToString::to_string).collect();
        ApiError::BadRequest(format!("`{}` must be one of: {}", field, allowed.join(", ")))
    };
    match body.get(field) {
        None | Some(Value::Null) => Ok(T::default()),
        Some(Value::String(s)) => s.parse().map_err(|_| invalid()),
        Some(_) => Err(invalid()),
    }
}

fn optional_string_list(body: &serde_json::Map<String, Value>, field: &str) -> Result<Vec<String>, ApiError> {
    let invalid = || ApiError::BadRequest(format!("`{}` must be an array of strings", field));
    match body.get(field) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string).ok_or_else(invalid))
            .collect(),
        Some(_) => Err(invalid()),
    }
}

fn is_calendar_date(date: &str) -> bool {
    date.len() == 10 && chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d").is_ok()
}

pub fn parse_update(body: &str) -> Result<NewUpdate, ApiError> {
    let body = parse_object(body)?;
    Ok(NewUpdate {
        content: required_text(&body, "content")?,
        kind: optional_literal(&body, "type", UpdateType::ALL)?,
    })
}

pub fn parse_briefing(body: &str) -> Result<NewBriefing, ApiError> {
    let body = parse_object(body)?;
    let date = required_text(&body, "date")?;
    if !is_calendar_date(date.trim()) {
        return Err(bad_request("`date` must be YYYY-MM-DD"));
    }
    Ok(NewBriefing {
        date: date.trim().to_string(),
        summary: required_text(&body, "summary")?,
        mood: optional_literal(&body, "mood", Mood::ALL)?,
        key_items: optional_string_list(&body, "key_items")?,
        whats_next: optional_string_list(&body, "whats_next")?,
    })
}

// ============================================================================
// Handlers
// ============================================================================

#[derive(Deserialize)]
struct SearchQuery {
    #[serde(default)]
    q: String,
}

#[derive(Serialize)]
struct Dashboard<'a> {
    mode: Mode,
    #[serde(flatten)]
    collections: &'a Collections,
}

fn post_update(ctx: &mut ServerContext, request: &ApiRequest) -> Result<ApiReply, ApiError> {
    authorize(ctx.api_token.as_deref(), request.authorization.as_deref())?;
    let input = parse_update(&request.body)?;
    let row = ctx.store.insert(Table::Updates, mapper::encode_new_update(&input))?;
    let update = mapper::decode_update(&row)?;
    tracing::info!(id = %update.id, kind = %update.kind, "update posted");
    ctx.mark_stale();
    Ok(ApiReply::success(update))
}

fn post_briefing(ctx: &mut ServerContext, request: &ApiRequest) -> Result<ApiReply, ApiError> {
    authorize(ctx.api_token.as_deref(), request.authorization.as_deref())?;
    let input = parse_briefing(&request.body)?;
    let row = ctx
        .store
        .upsert(Table::Briefings, mapper::encode_new_briefing(&input), "date")?;
    let briefing = mapper::decode_briefing(&row)?;
    tracing::info!(date = %briefing.date, "briefing saved");
    ctx.mark_stale();
    Ok(ApiReply::success(briefing))
}

fn post_seed(ctx: &mut ServerContext, request: &ApiRequest) -> Result<ApiReply, ApiError> {
    authorize(ctx.service_key.as_deref(), request.authorization.as_deref())?;
    let report = seed::seed_store(ctx.service_store.as_ref())?;
    ctx.mark_stale();
    Ok(ApiReply::success(report))
}

fn get_dashboard(ctx: &mut ServerContext) -> ApiReply {
    let mode = ctx.current();
    ApiReply::success(Dashboard {
        mode,
        collections: ctx.dal.collections(),
    })
}

fn get_search(ctx: &mut ServerContext, request: &ApiRequest) -> Result<ApiReply, ApiError> {
    let query: SearchQuery = serde_urlencoded::from_str(request.query.as_deref().unwrap_or(""))
        .map_err(|e| ApiError::BadRequest(format!("Invalid query string: {}", e)))?;
    ctx.current();
    Ok(ApiReply::success(ctx.dal.search(&query.q)))
}

fn post_refresh(ctx: &mut ServerContext) -> ApiReply {
    ctx.stale = false;
    let mode = ctx.dal.refresh();
    ApiReply::success(serde_json::json!({ "mode": mode, "counts": ctx.dal.collections().counts() }))
}

/// Route one request
pub fn handle_api(ctx: &mut ServerContext, request: &ApiRequest) -> ApiReply {
    let result = match (&request.method, request.path.as_str()) {
        (Method::Post, "/updates") => post_update(ctx, request),
        (Method::Post, "/briefings") => post_briefing(ctx, request),
        (Method::Post, "/seed") => post_seed(ctx, request),
        (Method::Get, "/trading") => Ok(ApiReply::success(trading::portfolio())),
        (Method::Get, "/api/dashboard") => Ok(get_dashboard(ctx)),
        (Method::Get, "/api/search") => get_search(ctx, request),
        (Method::Post, "/api/refresh") => Ok(post_refresh(ctx)),
        (_, "/updates" | "/briefings" | "/seed" | "/trading" | "/api/dashboard" | "/api/search" | "/api/refresh") => {
            Err(ApiError::MethodNotAllowed)
        }
        _ => Err(ApiError::NotFound),
    };

    let reply = result.unwrap_or_else(|e| {
        if e.status() >= 500 {
            tracing::warn!(path = %request.path, error = %e, "request failed");
        }
        ApiReply::failure(&e)
    });
    tracing::debug!(method = %request.method, path = %request.path, status = reply.status, "handled request");
    reply
}

// ============================================================================
// Server loop
// ============================================================================

/// Start the API server and serve until the process is stopped
pub fn start_server(port: u16, mut ctx: ServerContext) -> std::io::Result<()> {
    let addr = format!("127.0.0.1:{}", port);
    let server = Server::http(&addr).map_err(|e| std::io::Error::other(e.to_string()))?;

    let mode = ctx.dal.load();
    tracing::info!(%addr, %mode, "listening");
    eprintln!("Workdesk API on http://localhost:{} ({} mode)", port, mode);
    eprintln!("   Press Ctrl+C to stop");

    for request in server.incoming_requests() {
        if let Err(e) = handle_request(&mut ctx, request) {
            tracing::warn!(error = %e, "failed to answer request");
        }
    }

    Ok(())
}

fn handle_request(ctx: &mut ServerContext, mut request: Request) -> std::io::Result<()> {
    let mut api_request = ApiRequest::new(request.method().clone(), request.url());
    api_request.authorization = request
        .headers()
        .iter()
        .find(|h| h.field.equiv("Authorization"))
        .map(|h| h.value.as_str().to_string());

    let mut body = String::new();
    if let Err(e) = request.as_reader().take(MAX_BODY_BYTES).read_to_string(&mut body) {
        let reply = ApiReply::failure(&ApiError::BadRequest(format!("Failed to read body: {}", e)));
        return request.respond(json_response(reply));
    }
    api_request.body = body;

    let reply = handle_api(ctx, &api_request);
    request.respond(json_response(reply))
}

fn json_response(reply: ApiReply) -> Response<std::io::Cursor<Vec<u8>>> {
    let response = Response::from_string(reply.body).with_status_code(reply.status);
    match Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]) {
        Ok(header) => response.with_header(header),
        Err(()) => response,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;
    use serde_json::json;
    use tempfile::TempDir;

    const TOKEN: &str = "api-secret";
    const SERVICE: &str = "service-secret";

    fn context(dir: &TempDir, provisioned: bool) -> (ServerContext, Arc<SqliteStore>) {
        let store = Arc::new(SqliteStore::open_at(dir.path().join("api.db"), "me").unwrap());
        if provisioned {
            store.provision().unwrap();
        }
        let ctx = ServerContext::new(store.clone(), store.clone(), Some(TOKEN.into()), Some(SERVICE.into()));
        (ctx, store)
    }

    fn rows(store: &SqliteStore, table: Table) -> usize {
        store.list(table, table.default_order(), None).unwrap().len()
    }

    // === ApiResponse Tests ===

    #[test]
    fn test_api_response_serializes_to_json() {
        let response: ApiResponse<String> = ApiResponse::success("test".to_string());
        let json = serde_json::to_string(&response).unwrap();

        assert!(json.contains("\"ok\":true"));
        assert!(json.contains("\"data\":\"test\""));
        assert!(json.contains("\"error\":null"));
    }

    #[test]
    fn test_api_response_failure() {
        let json = serde_json::to_value(ApiResponse::failure("nope".to_string())).unwrap();
        assert_eq!(json, json!({"ok": false, "data": null, "error": "nope"}));
    }

    // === Auth Tests ===

    #[test]
    fn test_authorize() {
        assert!(authorize(Some("s"), Some("Bearer s")).is_ok());
        assert!(authorize(Some("s"), Some("Bearer t")).is_err());
        assert!(authorize(Some("s"), Some("s")).is_err());
        assert!(authorize(Some("s"), None).is_err());
        assert!(authorize(None, Some("Bearer ")).is_err());
        assert!(authorize(Some(""), Some("Bearer ")).is_err());
    }

    // === POST /updates ===

    #[test]
    fn test_update_without_auth_is_401_and_creates_nothing() {
        let dir = TempDir::new().unwrap();
        let (mut ctx, store) = context(&dir, true);
        let request = ApiRequest::new(Method::Post, "/updates").json(json!({"content": "hi", "type": "note"}));

        let reply = handle_api(&mut ctx, &request);
        assert_eq!(reply.status, 401);
        assert_eq!(reply.json()["error"], "Unauthorized");
        assert_eq!(rows(&store, Table::Updates), 0);
    }

    #[test]
    fn test_update_with_wrong_token_is_401() {
        let dir = TempDir::new().unwrap();
        let (mut ctx, _) = context(&dir, true);
        let request = ApiRequest::new(Method::Post, "/updates")
            .bearer(SERVICE)
            .json(json!({"content": "hi"}));
        assert_eq!(handle_api(&mut ctx, &request).status, 401);
    }

    #[test]
    fn test_update_with_invalid_type_is_400_and_creates_nothing() {
        let dir = TempDir::new().unwrap();
        let (mut ctx, store) = context(&dir, true);
        let request = ApiRequest::new(Method::Post, "/updates")
            .bearer(TOKEN)
            .json(json!({"content": "hi", "type": "invalid"}));

        let reply = handle_api(&mut ctx, &request);
        assert_eq!(reply.status, 400);
        assert!(reply.json()["error"].as_str().unwrap().contains("type"));
        assert_eq!(rows(&store, Table::Updates), 0);
    }

    #[test]
    fn test_update_validation() {
        for body in [json!({}), json!({"content": "   "}), json!({"content": 3}), json!(["content"])] {
            assert!(matches!(parse_update(&body.to_string()), Err(ApiError::BadRequest(_))), "{}", body);
        }
        assert!(matches!(parse_update("{not json"), Err(ApiError::BadRequest(_))));
        assert_eq!(parse_update(r#"{"content":"x"}"#).unwrap().kind, UpdateType::Note);
    }

    #[test]
    fn test_update_created() {
        let dir = TempDir::new().unwrap();
        let (mut ctx, store) = context(&dir, true);
        let request = ApiRequest::new(Method::Post, "/updates")
            .bearer(TOKEN)
            .json(json!({"content": "[DECISION] ship it", "type": "milestone"}));

        let reply = handle_api(&mut ctx, &request);
        assert_eq!(reply.status, 200);
        let data = &reply.json()["data"];
        assert_eq!(data["type"], "milestone");
        assert_eq!(data["content"], "[DECISION] ship it");
        assert!(data["id"].is_string());
        assert_eq!(rows(&store, Table::Updates), 1);
    }

    #[test]
    fn test_update_against_missing_tables_is_500() {
        let dir = TempDir::new().unwrap();
        let (mut ctx, _) = context(&dir, false);
        let request = ApiRequest::new(Method::Post, "/updates")
            .bearer(TOKEN)
            .json(json!({"content": "hi"}));
        let reply = handle_api(&mut ctx, &request);
        assert_eq!(reply.status, 500);
        assert_eq!(reply.json()["ok"], false);
    }

    // === POST /briefings ===

    #[test]
    fn test_briefing_upsert_keeps_one_row_per_date() {
        let dir = TempDir::new().unwrap();
        let (mut ctx, store) = context(&dir, true);
        for summary in ["first pass", "second pass"] {
            let request = ApiRequest::new(Method::Post, "/briefings").bearer(TOKEN).json(json!({
                "date": "2025-04-01",
                "summary": summary,
                "mood": "planning",
                "key_items": ["a"],
                "whats_next": [],
            }));
            assert_eq!(handle_api(&mut ctx, &request).status, 200);
        }

        let briefings = store.list(Table::Briefings, Table::Briefings.default_order(), None).unwrap();
        assert_eq!(briefings.len(), 1);
        assert_eq!(briefings[0]["summary"], "second pass");
    }

    #[test]
    fn test_briefing_validation() {
        let bad = [
            json!({"summary": "x"}),
            json!({"date": "2025-13-01", "summary": "x"}),
            json!({"date": "2025-1-1", "summary": "x"}),
            json!({"date": "2025-04-01"}),
            json!({"date": "2025-04-01", "summary": ""}),
            json!({"date": "2025-04-01", "summary": "x", "mood": "grumpy"}),
            json!({"date": "2025-04-01", "summary": "x", "key_items": [1, 2]}),
            json!({"date": "2025-04-01", "summary": "x", "whats_next": "later"}),
        ];
        for body in bad {
            assert!(matches!(parse_briefing(&body.to_string()), Err(ApiError::BadRequest(_))), "{}", body);
        }

        let ok = parse_briefing(r#"{"date":"2025-04-01","summary":"x"}"#).unwrap();
        assert_eq!(ok.mood, Mood::Productive);
        assert!(ok.key_items.is_empty());
    }

    // === POST /seed ===

    #[test]
    fn test_seed_requires_service_key() {
        let dir = TempDir::new().unwrap();
        let (mut ctx, store) = context(&dir, true);
        let request = ApiRequest::new(Method::Post, "/seed").bearer(TOKEN);
        assert_eq!(handle_api(&mut ctx, &request).status, 401);
        assert_eq!(rows(&store, Table::Projects), 0);

        let reply = handle_api(&mut ctx, &ApiRequest::new(Method::Post, "/seed").bearer(SERVICE));
        assert_eq!(reply.status, 200);
        assert_eq!(reply.json()["data"]["projects"], 3);
        assert_eq!(rows(&store, Table::Projects), 3);
    }

    // === Read API ===

    #[test]
    fn test_trading_is_static() {
        let dir = TempDir::new().unwrap();
        let (mut ctx, _) = context(&dir, false);
        let first = handle_api(&mut ctx, &ApiRequest::new(Method::Get, "/trading"));
        let second = handle_api(&mut ctx, &ApiRequest::new(Method::Get, "/trading"));
        assert_eq!(first.status, 200);
        assert_eq!(first.body, second.body);
        assert_eq!(first.json()["data"]["simulated"], true);
    }

    #[test]
    fn test_dashboard_sees_posted_update() {
        let dir = TempDir::new().unwrap();
        let (mut ctx, _) = context(&dir, true);
        let before = handle_api(&mut ctx, &ApiRequest::new(Method::Get, "/api/dashboard")).json();
        assert_eq!(before["data"]["mode"], "remote");
        assert_eq!(before["data"]["updates"].as_array().unwrap().len(), 0);

        let post = ApiRequest::new(Method::Post, "/updates")
            .bearer(TOKEN)
            .json(json!({"content": "from a webhook"}));
        assert_eq!(handle_api(&mut ctx, &post).status, 200);

        let after = handle_api(&mut ctx, &ApiRequest::new(Method::Get, "/api/dashboard")).json();
        assert_eq!(after["data"]["updates"][0]["content"], "from a webhook");
    }

    #[test]
    fn test_dashboard_in_fallback_mode() {
        let dir = TempDir::new().unwrap();
        let (mut ctx, _) = context(&dir, false);
        let reply = handle_api(&mut ctx, &ApiRequest::new(Method::Get, "/api/dashboard")).json();
        assert_eq!(reply["data"]["mode"], "fallback");
        assert_eq!(reply["data"]["projects"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_writes_do_not_lift_a_fallback_session() {
        let dir = TempDir::new().unwrap();
        let (mut ctx, store) = context(&dir, false);
        let dashboard = ApiRequest::new(Method::Get, "/api/dashboard");
        assert_eq!(handle_api(&mut ctx, &dashboard).json()["data"]["mode"], "fallback");

        store.provision().unwrap();
        let post = ApiRequest::new(Method::Post, "/updates")
            .bearer(TOKEN)
            .json(json!({"content": "landed while offline"}));
        assert_eq!(handle_api(&mut ctx, &post).status, 200);

        let after = handle_api(&mut ctx, &dashboard).json();
        assert_eq!(after["data"]["mode"], "fallback");
        assert_eq!(after["data"]["projects"].as_array().unwrap().len(), 3);
        let search = handle_api(&mut ctx, &ApiRequest::new(Method::Get, "/api/search?q=offline")).json();
        assert_eq!(search["data"]["updates"].as_array().unwrap().len(), 0);

        // only an explicit refresh leaves fallback
        handle_api(&mut ctx, &ApiRequest::new(Method::Post, "/api/refresh"));
        let refreshed = handle_api(&mut ctx, &dashboard).json();
        assert_eq!(refreshed["data"]["mode"], "remote");
        assert_eq!(refreshed["data"]["updates"][0]["content"], "landed while offline");
    }

    #[test]
    fn test_search_endpoint() {
        let dir = TempDir::new().unwrap();
        let (mut ctx, _) = context(&dir, false);
        let reply = handle_api(&mut ctx, &ApiRequest::new(Method::Get, "/api/search?q=TRADING%20journal"));
        assert_eq!(reply.status, 200);
        assert_eq!(reply.json()["data"]["projects"][0]["name"], "Trading Journal");

        let blank = handle_api(&mut ctx, &ApiRequest::new(Method::Get, "/api/search?q=+++"));
        assert_eq!(blank.json()["data"]["projects"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn test_refresh_endpoint_reports_mode() {
        let dir = TempDir::new().unwrap();
        let (mut ctx, store) = context(&dir, false);
        assert_eq!(ctx.dal.load(), Mode::Fallback);

        store.provision().unwrap();
        let reply = handle_api(&mut ctx, &ApiRequest::new(Method::Post, "/api/refresh"));
        assert_eq!(reply.json()["data"]["mode"], "remote");
    }

    #[test]
    fn test_unknown_route_and_wrong_method() {
        let dir = TempDir::new().unwrap();
        let (mut ctx, _) = context(&dir, true);
        assert_eq!(handle_api(&mut ctx, &ApiRequest::new(Method::Get, "/nope")).status, 404);
        assert_eq!(handle_api(&mut ctx, &ApiRequest::new(Method::Get, "/updates")).status, 405);
        assert_eq!(handle_api(&mut ctx, &ApiRequest::new(Method::Delete, "/trading")).status, 405);
    }
}
