//! Read-only views over loaded collections
//!
//! Pure functions only: they take slices and return new values, never touching
//! the DAL. The dashboard pages and the CLI render from these.

use crate::model::*;
use crate::state::Collections;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;

lazy_static::lazy_static! {
    // Leading `[TAG]` markers such as `[DECISION]` or `[LESSON]`
    static ref TAG_RE: Option<Regex> = Regex::new(r"\[([A-Za-z][A-Za-z0-9_-]*)\]").ok();
}

// =============================================================================
// Documents
// =============================================================================

/// Documents grouped by category; each group keeps collection order
pub fn documents_by_category(documents: &[Document]) -> BTreeMap<DocumentCategory, Vec<Document>> {
    let mut groups: BTreeMap<DocumentCategory, Vec<Document>> = BTreeMap::new();
    for doc in documents {
        groups.entry(doc.category).or_default().push(doc.clone());
    }
    groups
}

/// Canonical `STATE:` snapshot documents
pub fn state_snapshots(documents: &[Document]) -> Vec<Document> {
    documents.iter().filter(|d| d.is_state_snapshot()).cloned().collect()
}

// =============================================================================
// Updates
// =============================================================================

/// Bracketed tags in an update's content, uppercased, in order of appearance
pub fn update_tags(content: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    let Some(re) = TAG_RE.as_ref() else {
        return tags;
    };
    for cap in re.captures_iter(content) {
        let tag = cap[1].to_uppercase();
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    tags
}

/// Updates carrying `tag` (case-insensitive, brackets optional)
pub fn updates_tagged(updates: &[Update], tag: &str) -> Vec<Update> {
    let wanted = tag.trim_matches(|c| c == '[' || c == ']').to_uppercase();
    updates
        .iter()
        .filter(|u| update_tags(&u.content).contains(&wanted))
        .cloned()
        .collect()
}

// =============================================================================
// Tasks
// =============================================================================

/// Kanban board: one column per task status
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    pub todo: Vec<Task>,
    pub in_progress: Vec<Task>,
    pub done: Vec<Task>,
}

impl Board {
    pub fn column(&self, status: TaskStatus) -> &[Task] {
        match status {
            TaskStatus::Todo => &self.todo,
            TaskStatus::InProgress => &self.in_progress,
            TaskStatus::Done => &self.done,
        }
    }
}

pub fn board(tasks: &[Task]) -> Board {
    let mut board = Board::default();
    for task in tasks {
        let column = match task.status {
            TaskStatus::Todo => &mut board.todo,
            TaskStatus::InProgress => &mut board.in_progress,
            TaskStatus::Done => &mut board.done,
        };
        column.push(task.clone());
    }
    board
}

/// The project a task points at. A dangling `project_id` (the project was
/// deleted) resolves to `None`.
pub fn project_for_task<'a>(collections: &'a Collections, task: &Task) -> Option<&'a Project> {
    task.project_id.as_deref().and_then(|id| collections.project(id))
}

pub fn tasks_for_project(tasks: &[Task], project_id: &str) -> Vec<Task> {
    tasks
        .iter()
        .filter(|t| t.project_id.as_deref() == Some(project_id))
        .cloned()
        .collect()
}

// =============================================================================
// Links and blockers
// =============================================================================

pub fn links_by_category(links: &[QuickLink]) -> BTreeMap<LinkCategory, Vec<QuickLink>> {
    let mut groups: BTreeMap<LinkCategory, Vec<QuickLink>> = BTreeMap::new();
    for link in links {
        groups.entry(link.category).or_default().push(link.clone());
    }
    groups
}

/// Unresolved blockers, most severe first. Ties keep collection order.
pub fn open_blockers(blockers: &[Blocker]) -> Vec<Blocker> {
    let mut open: Vec<Blocker> = blockers.iter().filter(|b| !b.resolved).cloned().collect();
    open.sort_by_key(|b| b.severity);
    open
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::seed_collections;

    #[test]
    fn test_documents_by_category() {
        let collections = seed_collections();
        let groups = documents_by_category(&collections.documents);
        assert_eq!(groups.values().map(Vec::len).sum::<usize>(), collections.documents.len());
        assert_eq!(groups[&DocumentCategory::Technical][0].title, "STATE: Workdesk");
        assert!(!groups.contains_key(&DocumentCategory::Other));
    }

    #[test]
    fn test_state_snapshots() {
        let snapshots = state_snapshots(&seed_collections().documents);
        assert_eq!(snapshots.len(), 1);
        assert!(snapshots[0].title.starts_with(STATE_PREFIX));
    }

    #[test]
    fn test_update_tags() {
        assert_eq!(update_tags("[DECISION] use sqlite"), vec!["DECISION"]);
        assert_eq!(update_tags("[lesson] and [Lesson] again [risk]"), vec!["LESSON", "RISK"]);
        assert!(update_tags("plain note").is_empty());
        assert!(update_tags("array[0] is [ ]").is_empty());
    }

    #[test]
    fn test_updates_tagged() {
        let updates = seed_collections().updates;
        assert_eq!(updates_tagged(&updates, "decision").len(), 1);
        assert_eq!(updates_tagged(&updates, "[LESSON]").len(), 1);
        assert!(updates_tagged(&updates, "RISK").is_empty());
    }

    #[test]
    fn test_board_columns() {
        let collections = seed_collections();
        let board = board(&collections.tasks);
        assert_eq!(board.todo.len(), 2);
        assert_eq!(board.column(TaskStatus::InProgress).len(), 1);
        assert_eq!(board.done.len(), 1);
    }

    #[test]
    fn test_dangling_project_reference() {
        let mut collections = seed_collections();
        let task = collections.tasks[0].clone();
        let project_id = task.project_id.clone().unwrap();
        assert!(project_for_task(&collections, &task).is_some());
        assert!(!tasks_for_project(&collections.tasks, &project_id).is_empty());

        collections.remove::<Project>(&project_id);
        assert!(project_for_task(&collections, &task).is_none());
        // the reference itself is left alone
        assert_eq!(collections.tasks[0].project_id.as_deref(), Some(project_id.as_str()));
    }

    #[test]
    fn test_open_blockers_most_severe_first() {
        let mut blockers = seed_collections().blockers;
        blockers.push(Blocker {
            id: "b-crit".to_string(),
            title: "Domain expired".to_string(),
            description: String::new(),
            severity: BlockerSeverity::Critical,
            category: BlockerCategory::Account,
            resolved: false,
            created_at: "2025-01-01T00:00:00.000Z".to_string(),
        });
        blockers.push(Blocker {
            id: "b-done".to_string(),
            resolved: true,
            ..blockers[0].clone()
        });
        let open = open_blockers(&blockers);
        let severities: Vec<BlockerSeverity> = open.iter().map(|b| b.severity).collect();
        assert_eq!(
            severities,
            vec![BlockerSeverity::Critical, BlockerSeverity::High, BlockerSeverity::Medium]
        );
    }

    #[test]
    fn test_links_by_category() {
        let groups = links_by_category(&seed_collections().links);
        assert_eq!(groups.len(), 4);
        assert_eq!(groups[&LinkCategory::Repo][0].label, "Source");
    }
}
