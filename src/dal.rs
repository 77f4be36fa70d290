//! Data access layer
//!
//! The single entry point for reading and changing dashboard data. It decides
//! once per session whether the remote record store is usable and then routes
//! every change accordingly:
//!
//! | Mode | On change |
//! |------|-----------|
//! | `Remote` | write to the store, then apply the row the store returned |
//! | `Fallback` | apply locally via [`LocalStore`], no I/O at all |
//!
//! Errors never escape: a failed remote write is logged and the collections
//! stay exactly as they were.

use crate::fallback::LocalStore;
use crate::mapper;
use crate::model::*;
use crate::schema::Table;
use crate::search::{self, SearchResults};
use crate::seed;
use crate::state::{Collections, Entity};
use crate::store::{self, RecordStore, Row, StoreError};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Which store is authoritative for the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Remote,
    Fallback,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Remote => write!(f, "remote"),
            Mode::Fallback => write!(f, "fallback"),
        }
    }
}

/// Result of listing one table during a load
pub type LoadOutcome = (Table, store::Result<Vec<Row>>);

/// Pick the session mode from the outcomes of the initial load.
///
/// Any missing table or failed round trip means Fallback. Other errors
/// (e.g. a rejected token on one table) still leave the store authoritative;
/// that table simply loads empty.
pub fn decide_mode(outcomes: &[LoadOutcome]) -> Mode {
    let aborted = outcomes
        .iter()
        .any(|(_, result)| matches!(result, Err(e) if e.aborts_remote_load()));
    if aborted {
        Mode::Fallback
    } else {
        Mode::Remote
    }
}

/// List every table concurrently and wait for all of them
pub fn fetch_all(store: &dyn RecordStore) -> Vec<LoadOutcome> {
    std::thread::scope(|scope| {
        let handles: Vec<_> = Table::ALL
            .iter()
            .map(|&table| {
                let handle = scope.spawn(move || store.list(table, table.default_order(), table.default_limit()));
                (table, handle)
            })
            .collect();

        handles
            .into_iter()
            .map(|(table, handle)| {
                let result = handle
                    .join()
                    .unwrap_or_else(|_| Err(StoreError::Internal(format!("listing {} panicked", table))));
                (table, result)
            })
            .collect()
    })
}

fn decode_rows<T>(table: Table, rows: &[Row], decode: fn(&Row) -> mapper::Result<T>) -> Vec<T> {
    rows.iter()
        .filter_map(|row| match decode(row) {
            Ok(entity) => Some(entity),
            Err(e) => {
                tracing::warn!(table = %table, error = %e, "skipping row that failed to decode");
                None
            }
        })
        .collect()
}

/// Build collections from a successful remote load
pub fn collections_from_outcomes(outcomes: Vec<LoadOutcome>) -> Collections {
    let mut collections = Collections::default();
    for (table, result) in outcomes {
        let rows = match result {
            Ok(rows) => rows,
            Err(e) => {
                tracing::warn!(table = %table, error = %e, "table failed to load; showing it empty");
                continue;
            }
        };
        match table {
            Table::Projects => collections.projects = decode_rows(table, &rows, mapper::decode_project),
            Table::Documents => collections.documents = decode_rows(table, &rows, mapper::decode_document),
            Table::Updates => collections.updates = decode_rows(table, &rows, mapper::decode_update),
            Table::Tasks => collections.tasks = decode_rows(table, &rows, mapper::decode_task),
            Table::Links => collections.links = decode_rows(table, &rows, mapper::decode_link),
            Table::Blockers => collections.blockers = decode_rows(table, &rows, mapper::decode_blocker),
            Table::Briefings => {
                collections.briefing = decode_rows(table, &rows, mapper::decode_briefing)
                    .into_iter()
                    .next()
            }
        }
    }
    collections
}

/// Map a store reply to an entity, logging whatever went wrong
fn settle<T>(table: Table, op: &str, result: store::Result<Row>, decode: fn(&Row) -> mapper::Result<T>) -> Option<T> {
    let row = match result {
        Ok(row) => row,
        Err(e) => {
            tracing::warn!(table = %table, op, error = %e, "remote write failed; change dropped");
            return None;
        }
    };
    match decode(&row) {
        Ok(entity) => Some(entity),
        Err(e) => {
            tracing::warn!(table = %table, op, error = %e, "store returned a row that failed to decode");
            None
        }
    }
}

/// Dashboard data for one session
pub struct DataAccess {
    store: Arc<dyn RecordStore>,
    mode: Option<Mode>,
    collections: Collections,
    local: LocalStore,
}

impl DataAccess {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            mode: None,
            collections: Collections::default(),
            local: LocalStore::new(),
        }
    }

    /// `None` until the first load
    pub fn mode(&self) -> Option<Mode> {
        self.mode
    }

    pub fn collections(&self) -> &Collections {
        &self.collections
    }

    pub fn search(&self, query: &str) -> SearchResults {
        search::search(&self.collections, query)
    }

    /// Initial load. Only the first call does any work; later calls return
    /// the mode already chosen.
    pub fn load(&mut self) -> Mode {
        match self.mode {
            Some(mode) => mode,
            None => self.reload(),
        }
    }

    /// Re-run the full load and replace every collection
    pub fn refresh(&mut self) -> Mode {
        self.reload()
    }

    fn reload(&mut self) -> Mode {
        let outcomes = fetch_all(self.store.as_ref());
        let mode = decide_mode(&outcomes);
        self.collections = match mode {
            Mode::Remote => collections_from_outcomes(outcomes),
            Mode::Fallback => {
                for (table, result) in &outcomes {
                    if let Err(e) = result {
                        tracing::info!(table = %table, error = %e, "remote store unusable");
                    }
                }
                seed::seed_collections()
            }
        };
        if self.mode != Some(mode) {
            tracing::info!(%mode, "data access mode selected");
        }
        self.mode = Some(mode);
        mode
    }

    fn ready(&self, op: &str) -> Option<Mode> {
        if self.mode.is_none() {
            tracing::warn!(op, "data not loaded yet; change dropped");
        }
        self.mode
    }

    fn stamped(&mut self, mut row: Row) -> Row {
        row.insert("updated_at".to_string(), Value::String(self.local.now()));
        row
    }

    fn remote_insert<E: Entity>(&mut self, row: Row) -> Option<E> {
        let entity = settle(E::TABLE, "insert", self.store.insert(E::TABLE, row), E::decode)?;
        self.collections.prepend(entity.clone());
        Some(entity)
    }

    fn remote_update<E: Entity>(&mut self, id: &str, patch: Row) -> Option<E> {
        let entity = settle(E::TABLE, "update", self.store.update(E::TABLE, id, patch), E::decode)?;
        self.collections.replace(entity.clone());
        Some(entity)
    }

    fn delete<E: Entity>(&mut self, id: &str) -> bool {
        match self.ready("delete") {
            None => false,
            Some(Mode::Fallback) => self.collections.remove::<E>(id),
            Some(Mode::Remote) => match self.store.delete(E::TABLE, id) {
                Ok(()) => {
                    self.collections.remove::<E>(id);
                    true
                }
                Err(e) => {
                    tracing::warn!(table = %E::TABLE, id, error = %e, "remote delete failed");
                    false
                }
            },
        }
    }

    // ========================================================================
    // Projects
    // ========================================================================

    pub fn add_project(&mut self, input: NewProject) -> Option<Project> {
        match self.ready("add_project")? {
            Mode::Fallback => Some(self.local.add_project(&mut self.collections, input)),
            Mode::Remote => self.remote_insert(mapper::encode_new_project(&input)),
        }
    }

    pub fn update_project(&mut self, id: &str, patch: ProjectPatch) -> Option<Project> {
        match self.ready("update_project")? {
            Mode::Fallback => self.local.update_project(&mut self.collections, id, &patch),
            Mode::Remote => {
                let row = self.stamped(mapper::encode_project_patch(&patch));
                self.remote_update(id, row)
            }
        }
    }

    /// Tasks pointing at the project keep their (now dangling) `project_id`
    pub fn delete_project(&mut self, id: &str) -> bool {
        self.delete::<Project>(id)
    }

    // ========================================================================
    // Documents
    // ========================================================================

    pub fn add_document(&mut self, input: NewDocument) -> Option<Document> {
        match self.ready("add_document")? {
            Mode::Fallback => Some(self.local.add_document(&mut self.collections, input)),
            Mode::Remote => self.remote_insert(mapper::encode_new_document(&input)),
        }
    }

    pub fn update_document(&mut self, id: &str, patch: DocumentPatch) -> Option<Document> {
        match self.ready("update_document")? {
            Mode::Fallback => self.local.update_document(&mut self.collections, id, &patch),
            Mode::Remote => {
                let row = self.stamped(mapper::encode_document_patch(&patch));
                self.remote_update(id, row)
            }
        }
    }

    pub fn delete_document(&mut self, id: &str) -> bool {
        self.delete::<Document>(id)
    }

    // ========================================================================
    // Updates (append-only)
    // ========================================================================

    pub fn post_update(&mut self, input: NewUpdate) -> Option<Update> {
        match self.ready("post_update")? {
            Mode::Fallback => Some(self.local.post_update(&mut self.collections, input)),
            Mode::Remote => self.remote_insert(mapper::encode_new_update(&input)),
        }
    }

    // ========================================================================
    // Tasks
    // ========================================================================

    pub fn add_task(&mut self, input: NewTask) -> Option<Task> {
        match self.ready("add_task")? {
            Mode::Fallback => Some(self.local.add_task(&mut self.collections, input)),
            Mode::Remote => self.remote_insert(mapper::encode_new_task(&input)),
        }
    }

    pub fn update_task(&mut self, id: &str, patch: TaskPatch) -> Option<Task> {
        match self.ready("update_task")? {
            Mode::Fallback => self.local.update_task(&mut self.collections, id, &patch),
            Mode::Remote => {
                let row = self.stamped(mapper::encode_task_patch(&patch));
                self.remote_update(id, row)
            }
        }
    }

    /// Move a task to another board column
    pub fn move_task(&mut self, id: &str, status: TaskStatus) -> Option<Task> {
        self.update_task(id, TaskPatch::status(status))
    }

    pub fn delete_task(&mut self, id: &str) -> bool {
        self.delete::<Task>(id)
    }

    // ========================================================================
    // Links
    // ========================================================================

    pub fn add_link(&mut self, input: NewLink) -> Option<QuickLink> {
        match self.ready("add_link")? {
            Mode::Fallback => Some(self.local.add_link(&mut self.collections, input)),
            Mode::Remote => self.remote_insert(mapper::encode_new_link(&input)),
        }
    }

    pub fn delete_link(&mut self, id: &str) -> bool {
        self.delete::<QuickLink>(id)
    }

    // ========================================================================
    // Blockers
    // ========================================================================

    pub fn add_blocker(&mut self, input: NewBlocker) -> Option<Blocker> {
        match self.ready("add_blocker")? {
            Mode::Fallback => Some(self.local.add_blocker(&mut self.collections, input)),
            Mode::Remote => self.remote_insert(mapper::encode_new_blocker(&input)),
        }
    }

    /// Mark a blocker resolved. Safe to call again on a resolved blocker.
    pub fn resolve_blocker(&mut self, id: &str) -> Option<Blocker> {
        match self.ready("resolve_blocker")? {
            Mode::Fallback => self.local.resolve_blocker(&mut self.collections, id),
            Mode::Remote => self.remote_update(id, mapper::encode_blocker_resolved()),
        }
    }

    // ========================================================================
    // Daily briefing
    // ========================================================================

    /// Upsert the briefing for `input.date`
    pub fn save_briefing(&mut self, input: NewBriefing) -> Option<DailyBriefing> {
        match self.ready("save_briefing")? {
            Mode::Fallback => self.local.save_briefing(&mut self.collections, input),
            Mode::Remote => {
                let row = self.stamped(mapper::encode_new_briefing(&input));
                let result = self.store.upsert(Table::Briefings, row, "date");
                let briefing = settle(Table::Briefings, "upsert", result, mapper::decode_briefing)?;
                self.collections.offer_briefing(briefing.clone());
                Some(briefing)
            }
        }
    }
}
