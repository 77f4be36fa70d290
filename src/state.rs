//! In-memory entity collections
//!
//! One `Collections` value is owned by the [`crate::dal::DataAccess`] that
//! built it. Everything else gets `&Collections` (or a clone), so the only
//! code that can change what the dashboard shows is the DAL itself.

use crate::mapper;
use crate::model::*;
use crate::schema::Table;
use crate::store::Row;
use serde::Serialize;

/// Everything currently loaded, newest first within each list
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Collections {
    pub projects: Vec<Project>,
    pub documents: Vec<Document>,
    pub updates: Vec<Update>,
    pub tasks: Vec<Task>,
    pub links: Vec<QuickLink>,
    pub blockers: Vec<Blocker>,
    /// The most recent daily briefing, if any
    pub briefing: Option<DailyBriefing>,
}

/// Per-collection sizes, for status output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Counts {
    pub projects: usize,
    pub documents: usize,
    pub updates: usize,
    pub tasks: usize,
    pub links: usize,
    pub blockers: usize,
    pub briefings: usize,
}

impl Collections {
    pub fn counts(&self) -> Counts {
        Counts {
            projects: self.projects.len(),
            documents: self.documents.len(),
            updates: self.updates.len(),
            tasks: self.tasks.len(),
            links: self.links.len(),
            blockers: self.blockers.len(),
            briefings: usize::from(self.briefing.is_some()),
        }
    }

    pub fn project(&self, id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn document(&self, id: &str) -> Option<&Document> {
        self.documents.iter().find(|d| d.id == id)
    }

    pub fn blocker(&self, id: &str) -> Option<&Blocker> {
        self.blockers.iter().find(|b| b.id == id)
    }

    /// Put a new entity at the front
    pub(crate) fn prepend<E: Entity>(&mut self, entity: E) {
        E::list_mut(self).insert(0, entity);
    }

    /// Swap in a new version of an entity, keeping its position
    pub(crate) fn replace<E: Entity>(&mut self, entity: E) -> bool {
        match E::list_mut(self).iter_mut().find(|e| e.id() == entity.id()) {
            Some(slot) => {
                *slot = entity;
                true
            }
            None => false,
        }
    }

    pub(crate) fn remove<E: Entity>(&mut self, id: &str) -> bool {
        let list = E::list_mut(self);
        let before = list.len();
        list.retain(|e| e.id() != id);
        list.len() != before
    }

    /// Whether a briefing dated `date` would be shown over the current one
    pub fn shows_briefing_for(&self, date: &str) -> bool {
        match &self.briefing {
            Some(current) => date >= current.date.as_str(),
            None => true,
        }
    }

    /// Show `briefing` unless a newer date is already shown
    pub(crate) fn offer_briefing(&mut self, briefing: DailyBriefing) -> bool {
        let shown = self.shows_briefing_for(&briefing.date);
        if shown {
            self.briefing = Some(briefing);
        }
        shown
    }
}

/// An entity kept in a list-shaped collection
pub(crate) trait Entity: Clone + Sized {
    const TABLE: Table;

    fn id(&self) -> &str;

    fn decode(row: &Row) -> mapper::Result<Self>;

    fn list_mut(collections: &mut Collections) -> &mut Vec<Self>;
}

macro_rules! entity {
    ($ty:ty, $table:expr, $field:ident, $decode:path) => {
        impl Entity for $ty {
            const TABLE: Table = $table;

            fn id(&self) -> &str {
                &self.id
            }

            fn decode(row: &Row) -> mapper::Result<Self> {
                $decode(row)
            }

            fn list_mut(collections: &mut Collections) -> &mut Vec<Self> {
                &mut collections.$field
            }
        }
    };
}

entity!(Project, Table::Projects, projects, mapper::decode_project);
entity!(Document, Table::Documents, documents, mapper::decode_document);
entity!(Update, Table::Updates, updates, mapper::decode_update);
entity!(Task, Table::Tasks, tasks, mapper::decode_task);
entity!(QuickLink, Table::Links, links, mapper::decode_link);
entity!(Blocker, Table::Blockers, blockers, mapper::decode_blocker);
