//! Dashboard entities
//!
//! Application-side shapes for everything the dashboard shows: projects,
//! documents, updates, tasks, quick links, blockers and the daily briefing.
//! These are what the UI and the HTTP API see (camelCase JSON). The backend's
//! snake_case rows live in [`crate::mapper`].

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Timestamps are RFC 3339 in UTC with millisecond precision
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Error returned when a string is not one of an enum's literals
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} `{value}`")]
pub struct UnknownLiteral {
    pub kind: &'static str,
    pub value: String,
}

/// Declares a closed set of string literals as an enum.
///
/// The first variant is the `Default`.
macro_rules! literal_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $first:ident => $first_lit:literal
            $(, $variant:ident => $lit:literal)* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        pub enum $name {
            #[default]
            #[serde(rename = $first_lit)]
            $first,
            $(
                #[serde(rename = $lit)]
                $variant,
            )*
        }

        impl $name {
            /// Every value, in declaration order
            pub const ALL: &'static [$name] = &[$name::$first $(, $name::$variant)*];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $name::$first => $first_lit,
                    $($name::$variant => $lit,)*
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = UnknownLiteral;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $first_lit => Ok($name::$first),
                    $($lit => Ok($name::$variant),)*
                    other => Err(UnknownLiteral {
                        kind: stringify!($name),
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

literal_enum! {
    /// Lifecycle of a project
    ProjectStatus { Active => "active", Completed => "completed", OnHold => "on-hold" }
}

literal_enum! {
    DocumentCategory {
        Other => "other",
        Audits => "audits",
        Research => "research",
        Marketing => "marketing",
        Technical => "technical",
    }
}

literal_enum! {
    /// What kind of event an update records
    UpdateType { Note => "note", Status => "status", Task => "task", Milestone => "milestone" }
}

literal_enum! {
    /// Kanban column
    TaskStatus { Todo => "todo", InProgress => "in-progress", Done => "done" }
}

literal_enum! {
    TaskPriority { Medium => "medium", Low => "low", High => "high" }
}

literal_enum! {
    LinkCategory {
        Site => "site",
        Repo => "repo",
        Tool => "tool",
        Docs => "docs",
        Resource => "resource",
    }
}

literal_enum! {
    /// Ordered most severe first
    BlockerSeverity { Critical => "critical", High => "high", Medium => "medium" }
}

literal_enum! {
    BlockerCategory {
        Other => "other",
        Billing => "billing",
        Access => "access",
        RateLimit => "rate-limit",
        Account => "account",
        Technical => "technical",
    }
}

literal_enum! {
    /// Overall tone of a day, as reported by the daily briefing
    Mood { Productive => "productive", Blocked => "blocked", Planning => "planning", Shipping => "shipping" }
}

// ============================================================================
// Entities
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    pub description: String,
    pub status: ProjectStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Rich-text body, stored as HTML
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Title prefix marking a document as a canonical project-state snapshot
pub const STATE_PREFIX: &str = "STATE:";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub category: DocumentCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub created_at: String,
    /// Present only once the document has been edited
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Document {
    pub fn is_state_snapshot(&self) -> bool {
        self.title.starts_with(STATE_PREFIX)
    }
}

/// Append-only activity entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Update {
    pub id: String,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: UpdateType,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    /// Weak reference; may point at a project that no longer exists
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickLink {
    pub id: String,
    pub label: String,
    pub url: String,
    pub category: LinkCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blocker {
    pub id: String,
    pub title: String,
    pub description: String,
    pub severity: BlockerSeverity,
    pub category: BlockerCategory,
    /// Only ever goes from false to true
    pub resolved: bool,
    pub created_at: String,
}

/// One briefing per date; the newest date is the one shown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyBriefing {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// `YYYY-MM-DD`
    pub date: String,
    pub summary: String,
    pub mood: Mood,
    pub key_items: Vec<String>,
    pub whats_next: Vec<String>,
}

// ============================================================================
// Creation inputs
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewProject {
    pub name: String,
    pub description: String,
    pub status: ProjectStatus,
    pub github_url: Option<String>,
    pub site_url: Option<String>,
    pub notes: Option<String>,
    pub details: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewDocument {
    pub title: String,
    pub description: String,
    pub content: Option<String>,
    pub category: DocumentCategory,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewUpdate {
    pub content: String,
    pub kind: UpdateType,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub project_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewLink {
    pub label: String,
    pub url: String,
    pub category: LinkCategory,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewBlocker {
    pub title: String,
    pub description: String,
    pub severity: BlockerSeverity,
    pub category: BlockerCategory,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewBriefing {
    pub date: String,
    pub summary: String,
    pub mood: Mood,
    pub key_items: Vec<String>,
    pub whats_next: Vec<String>,
}

// ============================================================================
// Partial updates
//
// `None` leaves a field alone. Nullable fields take `Some(None)` to clear.
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<ProjectStatus>,
    pub github_url: Option<Option<String>>,
    pub site_url: Option<Option<String>>,
    pub notes: Option<Option<String>>,
    pub details: Option<Option<String>>,
}

impl ProjectPatch {
    pub fn apply(&self, project: &mut Project) {
        if let Some(name) = &self.name {
            project.name = name.clone();
        }
        if let Some(description) = &self.description {
            project.description = description.clone();
        }
        if let Some(status) = self.status {
            project.status = status;
        }
        if let Some(url) = &self.github_url {
            project.github_url = url.clone();
        }
        if let Some(url) = &self.site_url {
            project.site_url = url.clone();
        }
        if let Some(notes) = &self.notes {
            project.notes = notes.clone();
        }
        if let Some(details) = &self.details {
            project.details = details.clone();
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: Option<Option<String>>,
    pub category: Option<DocumentCategory>,
    pub url: Option<Option<String>>,
}

impl DocumentPatch {
    pub fn apply(&self, document: &mut Document) {
        if let Some(title) = &self.title {
            document.title = title.clone();
        }
        if let Some(description) = &self.description {
            document.description = description.clone();
        }
        if let Some(content) = &self.content {
            document.content = content.clone();
        }
        if let Some(category) = self.category {
            document.category = category;
        }
        if let Some(url) = &self.url {
            document.url = url.clone();
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub project_id: Option<Option<String>>,
}

impl TaskPatch {
    /// Patch that only moves a task to another column
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn apply(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(description) = &self.description {
            task.description = description.clone();
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(project_id) = &self.project_id {
            task.project_id = project_id.clone();
        }
    }
}
