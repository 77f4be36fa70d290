//! Seed dataset
//!
//! The fixed starting data for the dashboard. It serves two purposes:
//! - [`seed_collections`] is what Fallback mode shows
//! - [`seed_store`] bulk-loads the same data into a provisioned backend
//!   (`POST /seed`, `workdesk seed`)

use crate::mapper;
use crate::model::*;
use crate::schema::Table;
use crate::state::Collections;
use crate::store::{self, RecordStore, Row};
use serde::Serialize;
use std::collections::HashMap;

/// A seed task, linked to a seed project by name
#[derive(Debug, Clone)]
pub struct SeedTask {
    pub task: NewTask,
    pub project: Option<&'static str>,
}

/// Seed inputs, newest first in every list
#[derive(Debug, Clone)]
pub struct SeedData {
    pub projects: Vec<NewProject>,
    pub documents: Vec<NewDocument>,
    pub updates: Vec<NewUpdate>,
    pub tasks: Vec<SeedTask>,
    pub links: Vec<NewLink>,
    pub blockers: Vec<NewBlocker>,
    pub briefing: NewBriefing,
}

fn s(text: &str) -> String {
    text.to_string()
}

pub fn seed_data() -> SeedData {
    SeedData {
        projects: vec![
            NewProject {
                name: s("Workdesk"),
                description: s("Personal collaboration dashboard"),
                status: ProjectStatus::Active,
                github_url: Some(s("https://github.com/workdesk/workdesk")),
                site_url: Some(s("https://workdesk.dev")),
                notes: Some(s("Kanban, briefings and the update feed live here.")),
                details: Some(s("<p>Single place for projects, tasks and docs.</p>")),
            },
            NewProject {
                name: s("Trading Journal"),
                description: s("Simulated portfolio and trade log"),
                status: ProjectStatus::OnHold,
                github_url: None,
                site_url: None,
                notes: Some(s("Paper trading only.")),
                details: None,
            },
            NewProject {
                name: s("Analytics Viewer"),
                description: s("Read-only view over site analytics exports"),
                status: ProjectStatus::Completed,
                github_url: Some(s("https://github.com/workdesk/analytics-viewer")),
                site_url: None,
                notes: None,
                details: None,
            },
        ],
        documents: vec![
            NewDocument {
                title: s("STATE: Workdesk"),
                description: s("Current state of the dashboard project"),
                content: Some(s("<h2>Now</h2><p>Briefings endpoint live. Search across all collections.</p>")),
                category: DocumentCategory::Technical,
                url: None,
            },
            NewDocument {
                title: s("Security audit checklist"),
                description: s("Pre-launch review of auth and row-level policies"),
                content: None,
                category: DocumentCategory::Audits,
                url: None,
            },
            NewDocument {
                title: s("Launch post draft"),
                description: s("Announcement copy"),
                content: Some(s("<p>Workdesk keeps the whole week on one screen.</p>")),
                category: DocumentCategory::Marketing,
                url: None,
            },
            NewDocument {
                title: s("Hosted Postgres notes"),
                description: s("Row-level security and REST API quirks"),
                content: None,
                category: DocumentCategory::Research,
                url: Some(s("https://postgrest.org/en/stable/")),
            },
        ],
        updates: vec![
            NewUpdate {
                content: s("[DECISION] Fall back to seeded data when tables are missing instead of showing an error"),
                kind: UpdateType::Note,
            },
            NewUpdate {
                content: s("[LESSON] Upserting briefings by date avoids duplicate days"),
                kind: UpdateType::Note,
            },
            NewUpdate {
                content: s("Kanban board shipped"),
                kind: UpdateType::Milestone,
            },
            NewUpdate {
                content: s("Moved search to the header"),
                kind: UpdateType::Task,
            },
            NewUpdate {
                content: s("Dashboard is live"),
                kind: UpdateType::Status,
            },
        ],
        tasks: vec![
            SeedTask {
                task: NewTask {
                    title: s("Add briefing history view"),
                    description: Some(s("List previous days under the current briefing")),
                    status: TaskStatus::Todo,
                    priority: TaskPriority::Medium,
                    project_id: None,
                },
                project: Some("Workdesk"),
            },
            SeedTask {
                task: NewTask {
                    title: s("Wire up update webhook"),
                    description: None,
                    status: TaskStatus::InProgress,
                    priority: TaskPriority::High,
                    project_id: None,
                },
                project: Some("Workdesk"),
            },
            SeedTask {
                task: NewTask {
                    title: s("Export trade log as CSV"),
                    description: None,
                    status: TaskStatus::Todo,
                    priority: TaskPriority::Low,
                    project_id: None,
                },
                project: Some("Trading Journal"),
            },
            SeedTask {
                task: NewTask {
                    title: s("Set up row-level security"),
                    description: Some(s("Owner-scoped policies on every table")),
                    status: TaskStatus::Done,
                    priority: TaskPriority::High,
                    project_id: None,
                },
                project: None,
            },
        ],
        links: vec![
            NewLink {
                label: s("Workdesk"),
                url: s("https://workdesk.dev"),
                category: LinkCategory::Site,
                description: None,
            },
            NewLink {
                label: s("Source"),
                url: s("https://github.com/workdesk/workdesk"),
                category: LinkCategory::Repo,
                description: Some(s("Main repository")),
            },
            NewLink {
                label: s("PostgREST docs"),
                url: s("https://postgrest.org"),
                category: LinkCategory::Docs,
                description: None,
            },
            NewLink {
                label: s("Regex tester"),
                url: s("https://regex101.com"),
                category: LinkCategory::Tool,
                description: None,
            },
        ],
        blockers: vec![
            NewBlocker {
                title: s("Hosting plan limit reached"),
                description: s("Build minutes exhausted for the month"),
                severity: BlockerSeverity::High,
                category: BlockerCategory::Billing,
            },
            NewBlocker {
                title: s("Analytics API throttled"),
                description: s("Export endpoint returns 429 after 100 calls"),
                severity: BlockerSeverity::Medium,
                category: BlockerCategory::RateLimit,
            },
        ],
        briefing: NewBriefing {
            date: s("2025-01-15"),
            summary: s("Dashboard core is done; next up is the briefing history."),
            mood: Mood::Shipping,
            key_items: vec![s("Kanban board shipped"), s("Search covers every collection")],
            whats_next: vec![s("Briefing history"), s("Update webhook")],
        },
    }
}

/// Fixed timestamp for the `index`th newest seed item
fn seed_timestamp(index: usize) -> String {
    let day = 15usize.saturating_sub(index).max(1);
    format!("2025-01-{:02}T09:00:00.000Z", day)
}

/// The Fallback-mode dataset: fixed ids and timestamps, so it is identical in
/// every session
pub fn seed_collections() -> Collections {
    let data = seed_data();

    let projects: Vec<Project> = data
        .projects
        .into_iter()
        .enumerate()
        .map(|(i, p)| Project {
            id: format!("seed-project-{}", i + 1),
            name: p.name,
            description: p.description,
            status: p.status,
            github_url: p.github_url,
            site_url: p.site_url,
            notes: p.notes,
            details: p.details,
            created_at: seed_timestamp(i),
            updated_at: seed_timestamp(i),
        })
        .collect();

    let project_ids: HashMap<String, String> = projects
        .iter()
        .map(|p| (p.name.clone(), p.id.clone()))
        .collect();

    let documents = data
        .documents
        .into_iter()
        .enumerate()
        .map(|(i, d)| Document {
            id: format!("seed-document-{}", i + 1),
            title: d.title,
            description: d.description,
            content: d.content,
            category: d.category,
            url: d.url,
            created_at: seed_timestamp(i),
            updated_at: None,
        })
        .collect();

    let updates = data
        .updates
        .into_iter()
        .enumerate()
        .map(|(i, u)| Update {
            id: format!("seed-update-{}", i + 1),
            content: u.content,
            kind: u.kind,
            timestamp: seed_timestamp(i),
        })
        .collect();

    let tasks = data
        .tasks
        .into_iter()
        .enumerate()
        .map(|(i, t)| Task {
            id: format!("seed-task-{}", i + 1),
            title: t.task.title,
            description: t.task.description,
            status: t.task.status,
            priority: t.task.priority,
            project_id: t.project.and_then(|name| project_ids.get(name).cloned()),
            created_at: seed_timestamp(i),
            updated_at: seed_timestamp(i),
        })
        .collect();

    let links = data
        .links
        .into_iter()
        .enumerate()
        .map(|(i, l)| QuickLink {
            id: format!("seed-link-{}", i + 1),
            label: l.label,
            url: l.url,
            category: l.category,
            description: l.description,
        })
        .collect();

    let blockers = data
        .blockers
        .into_iter()
        .enumerate()
        .map(|(i, b)| Blocker {
            id: format!("seed-blocker-{}", i + 1),
            title: b.title,
            description: b.description,
            severity: b.severity,
            category: b.category,
            resolved: false,
            created_at: seed_timestamp(i),
        })
        .collect();

    let briefing = DailyBriefing {
        id: Some("seed-briefing-1".to_string()),
        date: data.briefing.date,
        summary: data.briefing.summary,
        mood: data.briefing.mood,
        key_items: data.briefing.key_items,
        whats_next: data.briefing.whats_next,
    };

    Collections {
        projects,
        documents,
        updates,
        tasks,
        links,
        blockers,
        briefing: Some(briefing),
    }
}

/// Rows written per table by [`seed_store`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub projects: usize,
    pub documents: usize,
    pub updates: usize,
    pub tasks: usize,
    pub links: usize,
    pub blockers: usize,
    pub briefings: usize,
}

fn write(store: &dyn RecordStore, table: Table, row: Row) -> store::Result<Row> {
    match table.spec().natural_key {
        Some(key) => store.upsert(table, row, key),
        None => store.insert(table, row),
    }
}

/// Bulk-load the seed dataset into `store`.
///
/// Tables with a natural key (project name, document title, link url,
/// briefing date) are upserted, so running this twice leaves one copy of
/// those rows. Updates, tasks and blockers are plain inserts. Oldest items
/// are written first so creation order matches the dataset's order.
pub fn seed_store(store: &dyn RecordStore) -> store::Result<SeedReport> {
    let data = seed_data();
    let mut report = SeedReport::default();
    let mut project_ids: HashMap<String, String> = HashMap::new();

    for project in data.projects.iter().rev() {
        let row = write(store, Table::Projects, mapper::encode_new_project(project))?;
        if let Some(id) = row.get("id").and_then(|v| v.as_str()) {
            project_ids.insert(project.name.clone(), id.to_string());
        }
        report.projects += 1;
    }

    for document in data.documents.iter().rev() {
        write(store, Table::Documents, mapper::encode_new_document(document))?;
        report.documents += 1;
    }

    for update in data.updates.iter().rev() {
        write(store, Table::Updates, mapper::encode_new_update(update))?;
        report.updates += 1;
    }

    for seed in data.tasks.iter().rev() {
        let mut task = seed.task.clone();
        task.project_id = seed.project.and_then(|name| project_ids.get(name).cloned());
        write(store, Table::Tasks, mapper::encode_new_task(&task))?;
        report.tasks += 1;
    }

    for link in data.links.iter().rev() {
        write(store, Table::Links, mapper::encode_new_link(link))?;
        report.links += 1;
    }

    for blocker in data.blockers.iter().rev() {
        write(store, Table::Blockers, mapper::encode_new_blocker(blocker))?;
        report.blockers += 1;
    }

    write(store, Table::Briefings, mapper::encode_new_briefing(&data.briefing))?;
    report.briefings += 1;

    tracing::info!(?report, "seeded record store");
    Ok(report)
}
