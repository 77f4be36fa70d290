//! Search across loaded collections
//!
//! Case-insensitive substring match over a fixed set of text fields per
//! entity type. No ranking, no tokenizing; results keep collection order.

use crate::model::*;
use crate::state::Collections;
use serde::Serialize;

/// Matches per searchable collection
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchResults {
    pub projects: Vec<Project>,
    pub documents: Vec<Document>,
    pub updates: Vec<Update>,
    pub tasks: Vec<Task>,
    pub links: Vec<QuickLink>,
}

impl SearchResults {
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn total(&self) -> usize {
        self.projects.len() + self.documents.len() + self.updates.len() + self.tasks.len() + self.links.len()
    }
}

/// Text fields searched for each entity
trait Searchable {
    fn fields(&self) -> Vec<&str>;
}

impl Searchable for Project {
    fn fields(&self) -> Vec<&str> {
        let mut fields = vec![self.name.as_str(), self.description.as_str()];
        fields.extend(self.notes.as_deref());
        fields.extend(self.details.as_deref());
        fields
    }
}

impl Searchable for Document {
    fn fields(&self) -> Vec<&str> {
        let mut fields = vec![self.title.as_str(), self.description.as_str()];
        fields.extend(self.content.as_deref());
        fields
    }
}

impl Searchable for Update {
    fn fields(&self) -> Vec<&str> {
        vec![self.content.as_str()]
    }
}

impl Searchable for Task {
    fn fields(&self) -> Vec<&str> {
        let mut fields = vec![self.title.as_str()];
        fields.extend(self.description.as_deref());
        fields
    }
}

impl Searchable for QuickLink {
    fn fields(&self) -> Vec<&str> {
        let mut fields = vec![self.label.as_str(), self.url.as_str()];
        fields.extend(self.description.as_deref());
        fields
    }
}

fn matching<T: Searchable + Clone>(items: &[T], needle: &str) -> Vec<T> {
    items
        .iter()
        .filter(|item| item.fields().iter().any(|f| f.to_lowercase().contains(needle)))
        .cloned()
        .collect()
}

/// Find entities whose text contains `query`, ignoring case.
///
/// A blank query matches nothing.
pub fn search(collections: &Collections, query: &str) -> SearchResults {
    if query.trim().is_empty() {
        return SearchResults::default();
    }
    let needle = query.to_lowercase();

    SearchResults {
        projects: matching(&collections.projects, &needle),
        documents: matching(&collections.documents, &needle),
        updates: matching(&collections.updates, &needle),
        tasks: matching(&collections.tasks, &needle),
        links: matching(&collections.links, &needle),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::seed_collections;
    use proptest::prelude::*;

    #[test]
    fn test_blank_query_matches_nothing() {
        let collections = seed_collections();
        assert!(search(&collections, "").is_empty());
        assert!(search(&collections, "   ").is_empty());
        assert!(search(&collections, "\t\n").is_empty());
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let collections = seed_collections();
        let upper = search(&collections, "WORKDESK");
        let lower = search(&collections, "workdesk");
        assert_eq!(upper, lower);
        assert!(!upper.projects.is_empty());
        assert!(!upper.links.is_empty());
    }

    #[test]
    fn test_search_covers_optional_fields() {
        let collections = seed_collections();
        // only in a project's notes
        let results = search(&collections, "paper trading");
        assert_eq!(results.projects.len(), 1);
        assert_eq!(results.projects[0].name, "Trading Journal");

        // only in a link url
        let results = search(&collections, "regex101");
        assert_eq!(results.links.len(), 1);

        // only in a document's rich text
        let results = search(&collections, "whole week");
        assert_eq!(results.documents.len(), 1);
    }

    #[test]
    fn test_search_keeps_collection_order() {
        let collections = seed_collections();
        let results = search(&collections, "[");
        let ids: Vec<&str> = results.updates.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, vec!["seed-update-1", "seed-update-2"]);
    }

    #[test]
    fn test_no_match() {
        assert!(search(&seed_collections(), "zzzz-not-there").is_empty());
    }

    proptest! {
        #[test]
        fn prop_case_does_not_change_results(query in "[a-zA-Z ]{1,12}") {
            let collections = seed_collections();
            prop_assert_eq!(
                search(&collections, &query.to_uppercase()),
                search(&collections, &query.to_lowercase())
            );
        }

        #[test]
        fn prop_whitespace_only_matches_nothing(query in "[ \t\n]{0,8}") {
            prop_assert!(search(&seed_collections(), &query).is_empty());
        }
    }
}
