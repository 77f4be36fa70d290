//! Workdesk - data layer for a personal collaboration dashboard
//!
//! Projects, documents, an update feed, a kanban board, quick links,
//! blockers and a daily briefing, backed by a table-oriented record store.
//!
//! # Overview
//!
//! The [`dal::DataAccess`] layer loads every table once per session. If the
//! store is reachable and provisioned it becomes authoritative (**remote**
//! mode); otherwise the dashboard runs on a fixed seed dataset held in memory
//! (**fallback** mode) and never touches the network again until an explicit
//! refresh.
//!
//! | Module | Role |
//! |--------|------|
//! | [`model`] | Entities, enums, creation inputs and patches |
//! | [`schema`] | The seven-table contract every store satisfies |
//! | [`store`] | [`RecordStore`] trait, REST and SQLite implementations |
//! | [`mapper`] | Row ↔ entity decoding and encoding |
//! | [`dal`] | Mode decision, loading and all mutators |
//! | [`search`], [`views`] | Read-only queries over loaded collections |
//! | [`serve`] | HTTP write endpoints and read API |
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use workdesk::{DataAccess, Mode, NewUpdate, SqliteStore, UpdateType};
//!
//! let store = SqliteStore::open_at(".workdesk/workdesk.db", "local").unwrap();
//! store.provision().unwrap();
//!
//! let mut dal = DataAccess::new(Arc::new(store));
//! assert_eq!(dal.load(), Mode::Remote);
//!
//! dal.post_update(NewUpdate {
//!     content: "[DECISION] keep the board in sqlite".to_string(),
//!     kind: UpdateType::Note,
//! });
//! println!("{} updates", dal.collections().updates.len());
//! ```

pub mod config;
pub mod dal;
pub mod fallback;
pub mod init;
pub mod mapper;
pub mod model;
pub mod schema;
pub mod search;
pub mod seed;
pub mod serve;
pub mod state;
pub mod store;
pub mod telemetry;
pub mod trading;
pub mod views;

pub use config::{Backend, Config};
pub use dal::{decide_mode, DataAccess, LoadOutcome, Mode};
pub use model::{
    Blocker, BlockerCategory, BlockerSeverity, DailyBriefing, Document, DocumentCategory, DocumentPatch,
    LinkCategory, Mood, NewBlocker, NewBriefing, NewDocument, NewLink, NewProject, NewTask, NewUpdate,
    Project, ProjectPatch, ProjectStatus, QuickLink, Task, TaskPatch, TaskPriority, TaskStatus, Update,
    UpdateType,
};
pub use schema::Table;
pub use search::SearchResults;
pub use state::Collections;
pub use store::{RecordStore, RestStore, Row, SqliteStore, StoreError};
