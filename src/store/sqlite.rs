//! SQLite record store with Diesel
//!
//! Keeps the seven dashboard tables in a local SQLite file, scoped by owner
//! exactly like the hosted backend. Rows come back as JSON objects built by
//! SQLite's `json_object`, so both stores hand the mappers the same shape.
//! Server-side defaults (ids, `created_at`, `updated_at`) are filled in here.

use super::{RecordStore, Result, Row, StoreError};
use crate::model::format_timestamp;
use crate::schema::{Column, ColumnKind, Order, Table, TableSpec, OWNER_COLUMN};
use diesel::prelude::*;
use diesel::query_builder::{BoxedSqlQuery, SqlQuery};
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::sql_types::{Bool, Nullable, Text};
use diesel::sqlite::{Sqlite, SqliteConnection};
use serde_json::Value;
use std::path::Path;
use uuid::Uuid;

type DbPool = Pool<ConnectionManager<SqliteConnection>>;
type DbConn = PooledConnection<ConnectionManager<SqliteConnection>>;

/// One row rendered as a JSON object
#[derive(QueryableByName, Debug)]
struct RecordJson {
    #[diesel(sql_type = Text)]
    record: String,
}

/// A bound statement parameter
#[derive(Debug)]
enum Bind {
    Text(Option<String>),
    Bool(bool),
}

/// Record store backed by a local SQLite file
pub struct SqliteStore {
    pool: DbPool,
    owner_id: String,
}

impl SqliteStore {
    /// Open (creating if needed) the database file at `path`.
    ///
    /// Tables are not created; call [`SqliteStore::provision`] for that.
    pub fn open_at<P: AsRef<Path>>(path: P, owner_id: &str) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| StoreError::Network(format!("cannot create {}: {}", parent.display(), e)))?;
            }
        }

        let path_str = path.as_ref().to_string_lossy().to_string();
        let manager = ConnectionManager::<SqliteConnection>::new(&path_str);
        let pool = Pool::builder()
            .max_size(5)
            .build(manager)
            .map_err(|e| StoreError::Network(e.to_string()))?;

        Ok(Self {
            pool,
            owner_id: owner_id.to_string(),
        })
    }

    fn get_conn(&self) -> Result<DbConn> {
        self.pool.get().map_err(|e| StoreError::Network(e.to_string()))
    }

    /// Create all tables that don't exist yet
    pub fn provision(&self) -> Result<()> {
        let mut conn = self.get_conn()?;
        for table in Table::ALL {
            diesel::sql_query(table.spec().ddl)
                .execute(&mut conn)
                .map_err(|e| map_diesel_error(table, e))?;
        }
        diesel::sql_query("CREATE INDEX IF NOT EXISTS idx_updates_created_at ON updates(owner_id, created_at)")
            .execute(&mut conn)
            .map_err(|e| map_diesel_error(Table::Updates, e))?;
        diesel::sql_query("CREATE INDEX IF NOT EXISTS idx_tasks_project ON tasks(project_id)")
            .execute(&mut conn)
            .map_err(|e| map_diesel_error(Table::Tasks, e))?;
        Ok(())
    }

    fn query_records(&self, table: Table, sql: String, binds: Vec<Bind>) -> Result<Vec<Row>> {
        let mut conn = self.get_conn()?;
        let mut query: BoxedSqlQuery<'static, Sqlite, SqlQuery> = diesel::sql_query(sql).into_boxed();
        for bind in binds {
            query = match bind {
                Bind::Text(value) => query.bind::<Nullable<Text>, _>(value),
                Bind::Bool(value) => query.bind::<Bool, _>(value),
            };
        }

        let records = query
            .load::<RecordJson>(&mut conn)
            .map_err(|e| map_diesel_error(table, e))?;

        records
            .into_iter()
            .map(|r| {
                serde_json::from_str::<Row>(&r.record)
                    .map_err(|e| StoreError::Internal(format!("bad record from {}: {}", table, e)))
            })
            .collect()
    }

    /// Row with server defaults filled in, ready to insert
    fn prepare_insert(&self, spec: &TableSpec, mut row: Row) -> Result<Vec<(&'static Column, Bind)>> {
        let now = format_timestamp(chrono::Utc::now());
        row.insert(OWNER_COLUMN.to_string(), Value::String(self.owner_id.clone()));
        row.entry("id")
            .or_insert_with(|| Value::String(Uuid::new_v4().to_string()));
        for stamp in ["created_at", "updated_at"] {
            if spec.has_column(stamp) {
                row.entry(stamp).or_insert_with(|| Value::String(now.clone()));
            }
        }
        bind_columns(spec, row)
    }
}

fn quote(ident: &str) -> String {
    format!("\"{}\"", ident)
}

/// `json_object(...)` expression rendering a whole row
fn record_expr(spec: &TableSpec) -> String {
    let fields: Vec<String> = spec
        .columns
        .iter()
        .map(|c| {
            let value = match c.kind {
                ColumnKind::Text => quote(c.name),
                ColumnKind::Bool => format!("json(CASE WHEN {} THEN 'true' ELSE 'false' END)", quote(c.name)),
                ColumnKind::Json => format!("json({})", quote(c.name)),
            };
            format!("'{}', {}", c.name, value)
        })
        .collect();
    format!("json_object({}) AS record", fields.join(", "))
}

fn bind_value(table: &str, column: &Column, value: Value) -> Result<Bind> {
    match (column.kind, value) {
        (ColumnKind::Text, Value::String(s)) => Ok(Bind::Text(Some(s))),
        (ColumnKind::Text, Value::Null) | (ColumnKind::Json, Value::Null) => Ok(Bind::Text(None)),
        (ColumnKind::Bool, Value::Bool(b)) => Ok(Bind::Bool(b)),
        (ColumnKind::Json, v @ Value::Array(_)) | (ColumnKind::Json, v @ Value::Object(_)) => {
            Ok(Bind::Text(Some(v.to_string())))
        }
        (_, other) => Err(StoreError::Invalid(format!(
            "{}.{} cannot hold {}",
            table, column.name, other
        ))),
    }
}

/// Check every key against the table and convert values to parameters
fn bind_columns(spec: &TableSpec, row: Row) -> Result<Vec<(&'static Column, Bind)>> {
    row.into_iter()
        .map(|(name, value)| {
            let column = spec
                .column(&name)
                .ok_or_else(|| StoreError::Invalid(format!("{} has no column `{}`", spec.name, name)))?;
            Ok((column, bind_value(spec.name, column, value)?))
        })
        .collect()
}

fn map_diesel_error(table: Table, error: DieselError) -> StoreError {
    match &error {
        DieselError::DatabaseError(kind, info) => {
            let message = info.message().to_string();
            if message.contains("no such table") {
                StoreError::missing_table(table)
            } else if matches!(
                kind,
                DatabaseErrorKind::UniqueViolation
                    | DatabaseErrorKind::NotNullViolation
                    | DatabaseErrorKind::CheckViolation
                    | DatabaseErrorKind::ForeignKeyViolation
            ) {
                StoreError::Constraint(message)
            } else {
                StoreError::Backend(message)
            }
        }
        _ => StoreError::Backend(error.to_string()),
    }
}

impl RecordStore for SqliteStore {
    fn list(&self, table: Table, order: Order, limit: Option<u32>) -> Result<Vec<Row>> {
        let spec = table.spec();
        if !spec.has_column(order.column) {
            return Err(StoreError::Invalid(format!(
                "cannot order {} by `{}`",
                table, order.column
            )));
        }

        let mut sql = format!(
            "SELECT {} FROM {} WHERE {} = ? ORDER BY {} {}",
            record_expr(spec),
            quote(spec.name),
            quote(OWNER_COLUMN),
            quote(order.column),
            if order.descending { "DESC" } else { "ASC" },
        );
        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        self.query_records(table, sql, vec![Bind::Text(Some(self.owner_id.clone()))])
    }

    fn insert(&self, table: Table, row: Row) -> Result<Row> {
        let spec = table.spec();
        if row.contains_key(OWNER_COLUMN) {
            return Err(StoreError::Invalid("owner_id is assigned by the store".to_string()));
        }
        let columns = self.prepare_insert(spec, row)?;

        let names: Vec<String> = columns.iter().map(|(c, _)| quote(c.name)).collect();
        let placeholders = vec!["?"; columns.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
            quote(spec.name),
            names.join(", "),
            placeholders,
            record_expr(spec),
        );

        let binds = columns.into_iter().map(|(_, b)| b).collect();
        self.query_records(table, sql, binds)?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Backend(format!("insert into {} returned nothing", table)))
    }

    fn update(&self, table: Table, id: &str, patch: Row) -> Result<Row> {
        let spec = table.spec();
        if patch.is_empty() {
            return Err(StoreError::Invalid("empty patch".to_string()));
        }
        if patch.contains_key("id") || patch.contains_key(OWNER_COLUMN) {
            return Err(StoreError::Invalid("id and owner_id cannot be patched".to_string()));
        }
        let columns = bind_columns(spec, patch)?;

        let assignments: Vec<String> = columns
            .iter()
            .map(|(c, _)| format!("{} = ?", quote(c.name)))
            .collect();
        let sql = format!(
            "UPDATE {} SET {} WHERE \"id\" = ? AND {} = ? RETURNING {}",
            quote(spec.name),
            assignments.join(", "),
            quote(OWNER_COLUMN),
            record_expr(spec),
        );

        let mut binds: Vec<Bind> = columns.into_iter().map(|(_, b)| b).collect();
        binds.push(Bind::Text(Some(id.to_string())));
        binds.push(Bind::Text(Some(self.owner_id.clone())));

        self.query_records(table, sql, binds)?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::NotFound {
                table: table.name().to_string(),
                id: id.to_string(),
            })
    }

    fn upsert(&self, table: Table, row: Row, conflict_key: &str) -> Result<Row> {
        let spec = table.spec();
        if !spec.has_column(conflict_key) || conflict_key == OWNER_COLUMN {
            return Err(StoreError::Invalid(format!(
                "cannot upsert {} on `{}`",
                table, conflict_key
            )));
        }
        if row.contains_key(OWNER_COLUMN) {
            return Err(StoreError::Invalid("owner_id is assigned by the store".to_string()));
        }
        let columns = self.prepare_insert(spec, row)?;

        let names: Vec<String> = columns.iter().map(|(c, _)| quote(c.name)).collect();
        let mut assignments: Vec<String> = columns
            .iter()
            .map(|(c, _)| c.name)
            .filter(|name| !["id", OWNER_COLUMN, "created_at", conflict_key].contains(name))
            .map(|name| format!("{} = excluded.{}", quote(name), quote(name)))
            .collect();
        if assignments.is_empty() {
            // DO NOTHING would return no row
            assignments.push(format!("{} = excluded.{}", quote(conflict_key), quote(conflict_key)));
        }

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({}) ON CONFLICT({}, {}) DO UPDATE SET {} RETURNING {}",
            quote(spec.name),
            names.join(", "),
            vec!["?"; columns.len()].join(", "),
            quote(OWNER_COLUMN),
            quote(conflict_key),
            assignments.join(", "),
            record_expr(spec),
        );

        let binds = columns.into_iter().map(|(_, b)| b).collect();
        self.query_records(table, sql, binds)?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Backend(format!("upsert into {} returned nothing", table)))
    }

    fn delete(&self, table: Table, id: &str) -> Result<()> {
        let mut conn = self.get_conn()?;
        let sql = format!(
            "DELETE FROM {} WHERE \"id\" = ? AND {} = ?",
            quote(table.name()),
            quote(OWNER_COLUMN)
        );
        let deleted = diesel::sql_query(sql)
            .bind::<Text, _>(id)
            .bind::<Text, _>(&self.owner_id)
            .execute(&mut conn)
            .map_err(|e| map_diesel_error(table, e))?;
        if deleted == 0 {
            return Err(StoreError::NotFound {
                table: table.name().to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn row(value: Value) -> Row {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {}", other),
        }
    }

    fn provisioned(dir: &TempDir, owner: &str) -> SqliteStore {
        let store = SqliteStore::open_at(dir.path().join("workdesk.db"), owner).unwrap();
        store.provision().unwrap();
        store
    }

    #[test]
    fn test_unprovisioned_file_reports_missing_table() {
        let dir = TempDir::new().unwrap();
        let store = SqliteStore::open_at(dir.path().join("empty.db"), "me").unwrap();
        let err = store
            .list(Table::Projects, Table::Projects.default_order(), None)
            .unwrap_err();
        assert_eq!(err, StoreError::missing_table(Table::Projects));
        assert!(err.aborts_remote_load());
    }

    #[test]
    fn test_provision_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = provisioned(&dir, "me");
        store.provision().unwrap();
    }

    #[test]
    fn test_insert_fills_server_defaults() {
        let dir = TempDir::new().unwrap();
        let store = provisioned(&dir, "me");

        let stored = store
            .insert(Table::Updates, row(json!({"content": "hello", "type": "note"})))
            .unwrap();
        assert!(stored["id"].as_str().is_some_and(|id| !id.is_empty()));
        assert_eq!(stored["owner_id"], "me");
        assert_eq!(stored["content"], "hello");
        assert!(stored["created_at"].is_string());
    }

    #[test]
    fn test_list_is_owner_scoped_and_ordered() {
        let dir = TempDir::new().unwrap();
        let mine = provisioned(&dir, "me");
        let theirs = SqliteStore::open_at(dir.path().join("workdesk.db"), "them").unwrap();

        for (content, at) in [("first", "2025-01-01T00:00:00.000Z"), ("second", "2025-01-02T00:00:00.000Z")] {
            mine.insert(
                Table::Updates,
                row(json!({"content": content, "type": "note", "created_at": at})),
            )
            .unwrap();
        }
        theirs
            .insert(Table::Updates, row(json!({"content": "other", "type": "note"})))
            .unwrap();

        let rows = mine
            .list(Table::Updates, Table::Updates.default_order(), None)
            .unwrap();
        let contents: Vec<&str> = rows.iter().filter_map(|r| r["content"].as_str()).collect();
        assert_eq!(contents, vec!["second", "first"]);

        let limited = mine
            .list(Table::Updates, Table::Updates.default_order(), Some(1))
            .unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[test]
    fn test_update_returns_stored_row() {
        let dir = TempDir::new().unwrap();
        let store = provisioned(&dir, "me");
        let blocker = store
            .insert(
                Table::Blockers,
                row(json!({"title": "Card declined", "description": "", "severity": "high", "category": "billing"})),
            )
            .unwrap();
        assert_eq!(blocker["resolved"], json!(false));

        let id = blocker["id"].as_str().unwrap();
        let resolved = store
            .update(Table::Blockers, id, row(json!({"resolved": true})))
            .unwrap();
        assert_eq!(resolved["resolved"], json!(true));
        assert_eq!(resolved["title"], "Card declined");
    }

    #[test]
    fn test_update_unknown_id_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = provisioned(&dir, "me");
        let err = store
            .update(Table::Tasks, "nope", row(json!({"status": "done"})))
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn test_unknown_column_is_rejected() {
        let dir = TempDir::new().unwrap();
        let store = provisioned(&dir, "me");
        let err = store
            .insert(Table::Links, row(json!({"label": "x", "url": "y", "colour": "red"})))
            .unwrap_err();
        assert!(matches!(err, StoreError::Invalid(_)));
    }

    #[test]
    fn test_duplicate_natural_key_is_constraint_violation() {
        let dir = TempDir::new().unwrap();
        let store = provisioned(&dir, "me");
        let link = json!({"label": "Repo", "url": "https://example.com/repo", "category": "repo"});
        store.insert(Table::Links, row(link.clone())).unwrap();
        let err = store.insert(Table::Links, row(link)).unwrap_err();
        assert!(matches!(err, StoreError::Constraint(_)), "{:?}", err);
    }

    #[test]
    fn test_upsert_by_date_keeps_one_row() {
        let dir = TempDir::new().unwrap();
        let store = provisioned(&dir, "me");

        let first = store
            .upsert(
                Table::Briefings,
                row(json!({"date": "2025-03-01", "summary": "one", "mood": "planning", "key_items": ["a"], "whats_next": []})),
                "date",
            )
            .unwrap();
        let second = store
            .upsert(
                Table::Briefings,
                row(json!({"date": "2025-03-01", "summary": "two", "mood": "shipping", "key_items": ["b", "c"], "whats_next": ["d"]})),
                "date",
            )
            .unwrap();

        assert_eq!(first["id"], second["id"]);
        let rows = store
            .list(Table::Briefings, Table::Briefings.default_order(), None)
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["summary"], "two");
        assert_eq!(rows[0]["key_items"], json!(["b", "c"]));
    }

    #[test]
    fn test_delete_removes_row() {
        let dir = TempDir::new().unwrap();
        let store = provisioned(&dir, "me");
        let task = store
            .insert(Table::Tasks, row(json!({"title": "t", "status": "todo", "priority": "low"})))
            .unwrap();
        let id = task["id"].as_str().unwrap();
        store.delete(Table::Tasks, id).unwrap();
        let rows = store
            .list(Table::Tasks, Table::Tasks.default_order(), None)
            .unwrap();
        assert!(rows.is_empty());

        assert!(matches!(
            store.delete(Table::Tasks, id),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn test_delete_is_owner_scoped() {
        let dir = TempDir::new().unwrap();
        let mine = provisioned(&dir, "me");
        let theirs = SqliteStore::open_at(dir.path().join("workdesk.db"), "them").unwrap();
        let link = mine
            .insert(Table::Links, row(json!({"label": "l", "url": "https://l.example"})))
            .unwrap();

        assert!(theirs.delete(Table::Links, link["id"].as_str().unwrap()).is_err());
        assert_eq!(
            mine.list(Table::Links, Table::Links.default_order(), None).unwrap().len(),
            1
        );
    }
}
