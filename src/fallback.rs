//! Local fallback store
//!
//! Degraded mode used when the remote store can't be used: every change is
//! applied straight to the in-memory collections, with ids and timestamps
//! made up locally. Nothing here touches the network and nothing survives a
//! restart.

use crate::model::*;
use crate::state::Collections;
use chrono::{TimeZone, Utc};

/// Issues local ids and timestamps and applies changes to collections
#[derive(Debug, Default)]
pub struct LocalStore {
    last_millis: i64,
    seq: u64,
}

impl LocalStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current time, strictly after every timestamp issued before
    pub fn now(&mut self) -> String {
        let millis = Utc::now().timestamp_millis().max(self.last_millis + 1);
        self.last_millis = millis;
        let at = Utc
            .timestamp_millis_opt(millis)
            .single()
            .unwrap_or_else(Utc::now);
        format_timestamp(at)
    }

    pub fn next_id(&mut self) -> String {
        self.seq += 1;
        format!("local-{}-{}", Utc::now().timestamp_millis(), self.seq)
    }

    // ========================================================================
    // Projects
    // ========================================================================

    pub fn add_project(&mut self, collections: &mut Collections, input: NewProject) -> Project {
        let now = self.now();
        let project = Project {
            id: self.next_id(),
            name: input.name,
            description: input.description,
            status: input.status,
            github_url: input.github_url,
            site_url: input.site_url,
            notes: input.notes,
            details: input.details,
            created_at: now.clone(),
            updated_at: now,
        };
        collections.prepend(project.clone());
        project
    }

    pub fn update_project(&mut self, collections: &mut Collections, id: &str, patch: &ProjectPatch) -> Option<Project> {
        let mut project = collections.project(id)?.clone();
        patch.apply(&mut project);
        project.updated_at = self.now();
        collections.replace(project.clone());
        Some(project)
    }

    // ========================================================================
    // Documents
    // ========================================================================

    pub fn add_document(&mut self, collections: &mut Collections, input: NewDocument) -> Document {
        let document = Document {
            id: self.next_id(),
            title: input.title,
            description: input.description,
            content: input.content,
            category: input.category,
            url: input.url,
            created_at: self.now(),
            updated_at: None,
        };
        collections.prepend(document.clone());
        document
    }

    pub fn update_document(&mut self, collections: &mut Collections, id: &str, patch: &DocumentPatch) -> Option<Document> {
        let mut document = collections.document(id)?.clone();
        patch.apply(&mut document);
        document.updated_at = Some(self.now());
        collections.replace(document.clone());
        Some(document)
    }

    // ========================================================================
    // Updates
    // ========================================================================

    pub fn post_update(&mut self, collections: &mut Collections, input: NewUpdate) -> Update {
        let update = Update {
            id: self.next_id(),
            content: input.content,
            kind: input.kind,
            timestamp: self.now(),
        };
        collections.prepend(update.clone());
        update
    }

    // ========================================================================
    // Tasks
    // ========================================================================

    pub fn add_task(&mut self, collections: &mut Collections, input: NewTask) -> Task {
        let now = self.now();
        let task = Task {
            id: self.next_id(),
            title: input.title,
            description: input.description,
            status: input.status,
            priority: input.priority,
            project_id: input.project_id,
            created_at: now.clone(),
            updated_at: now,
        };
        collections.prepend(task.clone());
        task
    }

    pub fn update_task(&mut self, collections: &mut Collections, id: &str, patch: &TaskPatch) -> Option<Task> {
        let mut task = collections.task(id)?.clone();
        patch.apply(&mut task);
        task.updated_at = self.now();
        collections.replace(task.clone());
        Some(task)
    }

    // ========================================================================
    // Links, blockers, briefing
    // ========================================================================

    pub fn add_link(&mut self, collections: &mut Collections, input: NewLink) -> QuickLink {
        let link = QuickLink {
            id: self.next_id(),
            label: input.label,
            url: input.url,
            category: input.category,
            description: input.description,
        };
        collections.prepend(link.clone());
        link
    }

    pub fn add_blocker(&mut self, collections: &mut Collections, input: NewBlocker) -> Blocker {
        let blocker = Blocker {
            id: self.next_id(),
            title: input.title,
            description: input.description,
            severity: input.severity,
            category: input.category,
            resolved: false,
            created_at: self.now(),
        };
        collections.prepend(blocker.clone());
        blocker
    }

    /// Mark a blocker resolved; resolving twice is fine
    pub fn resolve_blocker(&mut self, collections: &mut Collections, id: &str) -> Option<Blocker> {
        let mut blocker = collections.blocker(id)?.clone();
        blocker.resolved = true;
        collections.replace(blocker.clone());
        Some(blocker)
    }

    /// Upsert by date: the same date keeps its id. Only the shown briefing is
    /// held, so one older than it is turned away.
    pub fn save_briefing(&mut self, collections: &mut Collections, input: NewBriefing) -> Option<DailyBriefing> {
        if !collections.shows_briefing_for(&input.date) {
            tracing::warn!(date = %input.date, "briefing older than the one shown was not kept");
            return None;
        }
        let id = match &collections.briefing {
            Some(current) if current.date == input.date => current.id.clone(),
            _ => Some(self.next_id()),
        };
        let briefing = DailyBriefing {
            id,
            date: input.date,
            summary: input.summary,
            mood: input.mood,
            key_items: input.key_items,
            whats_next: input.whats_next,
        };
        collections.offer_briefing(briefing.clone());
        Some(briefing)
    }
}
