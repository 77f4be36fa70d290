//! Row mappers
//!
//! Translate between backend rows (snake_case, everything nullable) and the
//! dashboard entities in [`crate::model`]. Decoding is strict about required
//! fields and enum literals and lenient about optional ones: a `null` or
//! absent optional field becomes `None`, never an invented value. Encoding
//! writes only the fields a creation input or patch carries.

use crate::model::*;
use crate::schema::Table;
use crate::store::Row;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::str::FromStr;

/// Error type for row decoding
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MapError {
    #[error("{table} row is missing `{field}`")]
    MissingField { table: &'static str, field: &'static str },

    #[error("{table}.{field}: {source}")]
    InvalidValue {
        table: &'static str,
        field: &'static str,
        #[source]
        source: UnknownLiteral,
    },

    #[error("{table} row has the wrong shape: {message}")]
    Shape { table: &'static str, message: String },
}

pub type Result<T> = std::result::Result<T, MapError>;

fn parse_row<T: DeserializeOwned>(table: Table, row: &Row) -> Result<T> {
    serde_json::from_value(Value::Object(row.clone())).map_err(|e| MapError::Shape {
        table: table.name(),
        message: e.to_string(),
    })
}

fn required(table: Table, field: &'static str, value: Option<String>) -> Result<String> {
    value.ok_or(MapError::MissingField {
        table: table.name(),
        field,
    })
}

fn literal<T>(table: Table, field: &'static str, value: Option<String>) -> Result<T>
where
    T: FromStr<Err = UnknownLiteral>,
{
    required(table, field, value)?
        .parse()
        .map_err(|source| MapError::InvalidValue {
            table: table.name(),
            field,
            source,
        })
}

fn object(value: Value) -> Row {
    match value {
        Value::Object(map) => map,
        _ => Row::new(),
    }
}

/// Write `value` under `key` when the patch touches it
fn set<T: serde::Serialize>(row: &mut Row, key: &str, value: &Option<T>) {
    if let Some(value) = value {
        row.insert(key.to_string(), json!(value));
    }
}

// ============================================================================
// Projects
// ============================================================================

#[derive(Deserialize)]
struct ProjectRow {
    id: Option<String>,
    name: Option<String>,
    description: Option<String>,
    status: Option<String>,
    github_url: Option<String>,
    site_url: Option<String>,
    notes: Option<String>,
    details: Option<String>,
    created_at: Option<String>,
    updated_at: Option<String>,
}

pub fn decode_project(row: &Row) -> Result<Project> {
    const T: Table = Table::Projects;
    let r: ProjectRow = parse_row(T, row)?;
    Ok(Project {
        id: required(T, "id", r.id)?,
        name: required(T, "name", r.name)?,
        description: r.description.unwrap_or_default(),
        status: literal(T, "status", r.status)?,
        github_url: r.github_url,
        site_url: r.site_url,
        notes: r.notes,
        details: r.details,
        created_at: required(T, "created_at", r.created_at)?,
        updated_at: required(T, "updated_at", r.updated_at)?,
    })
}

pub fn encode_new_project(input: &NewProject) -> Row {
    object(json!({
        "name": input.name,
        "description": input.description,
        "status": input.status.as_str(),
        "github_url": input.github_url,
        "site_url": input.site_url,
        "notes": input.notes,
        "details": input.details,
    }))
}

pub fn encode_project_patch(patch: &ProjectPatch) -> Row {
    let mut row = Row::new();
    set(&mut row, "name", &patch.name);
    set(&mut row, "description", &patch.description);
    set(&mut row, "status", &patch.status.map(|s| s.as_str()));
    set(&mut row, "github_url", &patch.github_url);
    set(&mut row, "site_url", &patch.site_url);
    set(&mut row, "notes", &patch.notes);
    set(&mut row, "details", &patch.details);
    row
}

// ============================================================================
// Documents
// ============================================================================

#[derive(Deserialize)]
struct DocumentRow {
    id: Option<String>,
    title: Option<String>,
    description: Option<String>,
    content: Option<String>,
    category: Option<String>,
    url: Option<String>,
    created_at: Option<String>,
    updated_at: Option<String>,
}

pub fn decode_document(row: &Row) -> Result<Document> {
    const T: Table = Table::Documents;
    let r: DocumentRow = parse_row(T, row)?;
    Ok(Document {
        id: required(T, "id", r.id)?,
        title: required(T, "title", r.title)?,
        description: r.description.unwrap_or_default(),
        content: r.content,
        category: literal(T, "category", r.category)?,
        url: r.url,
        created_at: required(T, "created_at", r.created_at)?,
        updated_at: r.updated_at,
    })
}

pub fn encode_new_document(input: &NewDocument) -> Row {
    object(json!({
        "title": input.title,
        "description": input.description,
        "content": input.content,
        "category": input.category.as_str(),
        "url": input.url,
    }))
}

pub fn encode_document_patch(patch: &DocumentPatch) -> Row {
    let mut row = Row::new();
    set(&mut row, "title", &patch.title);
    set(&mut row, "description", &patch.description);
    set(&mut row, "content", &patch.content);
    set(&mut row, "category", &patch.category.map(|c| c.as_str()));
    set(&mut row, "url", &patch.url);
    row
}

// ============================================================================
// Updates
// ============================================================================

#[derive(Deserialize)]
struct UpdateRow {
    id: Option<String>,
    content: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    created_at: Option<String>,
}

pub fn decode_update(row: &Row) -> Result<Update> {
    const T: Table = Table::Updates;
    let r: UpdateRow = parse_row(T, row)?;
    Ok(Update {
        id: required(T, "id", r.id)?,
        content: required(T, "content", r.content)?,
        kind: literal(T, "type", r.kind)?,
        timestamp: required(T, "created_at", r.created_at)?,
    })
}

pub fn encode_new_update(input: &NewUpdate) -> Row {
    object(json!({
        "content": input.content,
        "type": input.kind.as_str(),
    }))
}

// ============================================================================
// Tasks
// ============================================================================

#[derive(Deserialize)]
struct TaskRow {
    id: Option<String>,
    title: Option<String>,
    description: Option<String>,
    status: Option<String>,
    priority: Option<String>,
    project_id: Option<String>,
    created_at: Option<String>,
    updated_at: Option<String>,
}

pub fn decode_task(row: &Row) -> Result<Task> {
    const T: Table = Table::Tasks;
    let r: TaskRow = parse_row(T, row)?;
    Ok(Task {
        id: required(T, "id", r.id)?,
        title: required(T, "title", r.title)?,
        description: r.description,
        status: literal(T, "status", r.status)?,
        priority: literal(T, "priority", r.priority)?,
        project_id: r.project_id,
        created_at: required(T, "created_at", r.created_at)?,
        updated_at: required(T, "updated_at", r.updated_at)?,
    })
}

pub fn encode_new_task(input: &NewTask) -> Row {
    object(json!({
        "title": input.title,
        "description": input.description,
        "status": input.status.as_str(),
        "priority": input.priority.as_str(),
        "project_id": input.project_id,
    }))
}

pub fn encode_task_patch(patch: &TaskPatch) -> Row {
    let mut row = Row::new();
    set(&mut row, "title", &patch.title);
    set(&mut row, "description", &patch.description);
    set(&mut row, "status", &patch.status.map(|s| s.as_str()));
    set(&mut row, "priority", &patch.priority.map(|p| p.as_str()));
    set(&mut row, "project_id", &patch.project_id);
    row
}

// ============================================================================
// Links
// ============================================================================

#[derive(Deserialize)]
struct LinkRow {
    id: Option<String>,
    label: Option<String>,
    url: Option<String>,
    category: Option<String>,
    description: Option<String>,
}

pub fn decode_link(row: &Row) -> Result<QuickLink> {
    const T: Table = Table::Links;
    let r: LinkRow = parse_row(T, row)?;
    Ok(QuickLink {
        id: required(T, "id", r.id)?,
        label: required(T, "label", r.label)?,
        url: required(T, "url", r.url)?,
        category: literal(T, "category", r.category)?,
        description: r.description,
    })
}

pub fn encode_new_link(input: &NewLink) -> Row {
    object(json!({
        "label": input.label,
        "url": input.url,
        "category": input.category.as_str(),
        "description": input.description,
    }))
}

// ============================================================================
// Blockers
// ============================================================================

#[derive(Deserialize)]
struct BlockerRow {
    id: Option<String>,
    title: Option<String>,
    description: Option<String>,
    severity: Option<String>,
    category: Option<String>,
    resolved: Option<bool>,
    created_at: Option<String>,
}

pub fn decode_blocker(row: &Row) -> Result<Blocker> {
    const T: Table = Table::Blockers;
    let r: BlockerRow = parse_row(T, row)?;
    Ok(Blocker {
        id: required(T, "id", r.id)?,
        title: required(T, "title", r.title)?,
        description: r.description.unwrap_or_default(),
        severity: literal(T, "severity", r.severity)?,
        category: literal(T, "category", r.category)?,
        resolved: r.resolved.unwrap_or(false),
        created_at: required(T, "created_at", r.created_at)?,
    })
}

pub fn encode_new_blocker(input: &NewBlocker) -> Row {
    object(json!({
        "title": input.title,
        "description": input.description,
        "severity": input.severity.as_str(),
        "category": input.category.as_str(),
        "resolved": false,
    }))
}

pub fn encode_blocker_resolved() -> Row {
    object(json!({ "resolved": true }))
}

// ============================================================================
// Briefings
// ============================================================================

#[derive(Deserialize)]
struct BriefingRow {
    id: Option<String>,
    date: Option<String>,
    summary: Option<String>,
    mood: Option<String>,
    key_items: Option<Vec<String>>,
    whats_next: Option<Vec<String>>,
}

pub fn decode_briefing(row: &Row) -> Result<DailyBriefing> {
    const T: Table = Table::Briefings;
    let r: BriefingRow = parse_row(T, row)?;
    Ok(DailyBriefing {
        id: r.id,
        date: required(T, "date", r.date)?,
        summary: required(T, "summary", r.summary)?,
        mood: literal(T, "mood", r.mood)?,
        key_items: r.key_items.unwrap_or_default(),
        whats_next: r.whats_next.unwrap_or_default(),
    })
}

pub fn encode_new_briefing(input: &NewBriefing) -> Row {
    object(json!({
        "date": input.date,
        "summary": input.summary,
        "mood": input.mood.as_str(),
        "key_items": input.key_items,
        "whats_next": input.whats_next,
    }))
}
