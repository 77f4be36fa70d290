// Workdesk schema - the seven owner-scoped backend tables

/// A backend table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Projects,
    Documents,
    Updates,
    Tasks,
    Links,
    Briefings,
    Blockers,
}

impl Table {
    pub const ALL: [Table; 7] = [
        Table::Projects,
        Table::Documents,
        Table::Updates,
        Table::Tasks,
        Table::Links,
        Table::Briefings,
        Table::Blockers,
    ];

    pub fn name(&self) -> &'static str {
        self.spec().name
    }

    pub fn spec(&self) -> &'static TableSpec {
        match self {
            Table::Projects => &PROJECTS,
            Table::Documents => &DOCUMENTS,
            Table::Updates => &UPDATES,
            Table::Tasks => &TASKS,
            Table::Links => &LINKS,
            Table::Briefings => &BRIEFINGS,
            Table::Blockers => &BLOCKERS,
        }
    }

    /// How the dashboard reads this table: newest first
    pub fn default_order(&self) -> Order {
        match self {
            Table::Briefings => Order::desc("date"),
            _ => Order::desc("created_at"),
        }
    }

    /// Only the latest briefing is ever shown
    pub fn default_limit(&self) -> Option<u32> {
        match self {
            Table::Briefings => Some(1),
            _ => None,
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Sort order for a list request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Order {
    pub column: &'static str,
    pub descending: bool,
}

impl Order {
    pub fn desc(column: &'static str) -> Self {
        Self { column, descending: true }
    }
}

/// Storage class of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Bool,
    /// JSON array stored as text
    Json,
}

#[derive(Debug)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnKind,
}

const fn text(name: &'static str) -> Column {
    Column { name, kind: ColumnKind::Text }
}

#[derive(Debug)]
pub struct TableSpec {
    pub name: &'static str,
    /// Every column, `id` and `owner_id` first
    pub columns: &'static [Column],
    /// Natural key used for idempotent seeding, owner column excluded
    pub natural_key: Option<&'static str>,
    pub ddl: &'static str,
}

impl TableSpec {
    pub fn column(&self, name: &str) -> Option<&'static Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }
}

pub const OWNER_COLUMN: &str = "owner_id";

pub static PROJECTS: TableSpec = TableSpec {
    name: "projects",
    columns: &[
        text("id"),
        text("owner_id"),
        text("name"),
        text("description"),
        text("status"),
        text("github_url"),
        text("site_url"),
        text("notes"),
        text("details"),
        text("created_at"),
        text("updated_at"),
    ],
    natural_key: Some("name"),
    ddl: r#"
        CREATE TABLE IF NOT EXISTS projects (
            id TEXT PRIMARY KEY NOT NULL,
            owner_id TEXT NOT NULL,
            name TEXT NOT NULL,
            description TEXT,
            status TEXT NOT NULL DEFAULT 'active',
            github_url TEXT,
            site_url TEXT,
            notes TEXT,
            details TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE(owner_id, name)
        )
    "#,
};

pub static DOCUMENTS: TableSpec = TableSpec {
    name: "documents",
    columns: &[
        text("id"),
        text("owner_id"),
        text("title"),
        text("description"),
        text("content"),
        text("category"),
        text("url"),
        text("created_at"),
        text("updated_at"),
    ],
    natural_key: Some("title"),
    ddl: r#"
        CREATE TABLE IF NOT EXISTS documents (
            id TEXT PRIMARY KEY NOT NULL,
            owner_id TEXT NOT NULL,
            title TEXT NOT NULL,
            description TEXT,
            content TEXT,
            category TEXT NOT NULL DEFAULT 'other',
            url TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT,
            UNIQUE(owner_id, title)
        )
    "#,
};

pub static UPDATES: TableSpec = TableSpec {
    name: "updates",
    columns: &[
        text("id"),
        text("owner_id"),
        text("content"),
        text("type"),
        text("created_at"),
    ],
    natural_key: None,
    ddl: r#"
        CREATE TABLE IF NOT EXISTS updates (
            id TEXT PRIMARY KEY NOT NULL,
            owner_id TEXT NOT NULL,
            content TEXT NOT NULL,
            type TEXT NOT NULL DEFAULT 'note',
            created_at TEXT NOT NULL
        )
    "#,
};

pub static TASKS: TableSpec = TableSpec {
    name: "tasks",
    columns: &[
        text("id"),
        text("owner_id"),
        text("title"),
        text("description"),
        text("status"),
        text("priority"),
        text("project_id"),
        text("created_at"),
        text("updated_at"),
    ],
    natural_key: None,
    ddl: r#"
        CREATE TABLE IF NOT EXISTS tasks (
            id TEXT PRIMARY KEY NOT NULL,
            owner_id TEXT NOT NULL,
            title TEXT NOT NULL,
            description TEXT,
            status TEXT NOT NULL DEFAULT 'todo',
            priority TEXT NOT NULL DEFAULT 'medium',
            project_id TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
    "#,
};

pub static LINKS: TableSpec = TableSpec {
    name: "links",
    columns: &[
        text("id"),
        text("owner_id"),
        text("label"),
        text("url"),
        text("category"),
        text("description"),
        text("created_at"),
    ],
    natural_key: Some("url"),
    ddl: r#"
        CREATE TABLE IF NOT EXISTS links (
            id TEXT PRIMARY KEY NOT NULL,
            owner_id TEXT NOT NULL,
            label TEXT NOT NULL,
            url TEXT NOT NULL,
            category TEXT NOT NULL DEFAULT 'resource',
            description TEXT,
            created_at TEXT NOT NULL,
            UNIQUE(owner_id, url)
        )
    "#,
};

pub static BRIEFINGS: TableSpec = TableSpec {
    name: "briefings",
    columns: &[
        text("id"),
        text("owner_id"),
        text("date"),
        text("summary"),
        text("mood"),
        Column { name: "key_items", kind: ColumnKind::Json },
        Column { name: "whats_next", kind: ColumnKind::Json },
        text("created_at"),
        text("updated_at"),
    ],
    natural_key: Some("date"),
    ddl: r#"
        CREATE TABLE IF NOT EXISTS briefings (
            id TEXT PRIMARY KEY NOT NULL,
            owner_id TEXT NOT NULL,
            date TEXT NOT NULL,
            summary TEXT NOT NULL,
            mood TEXT NOT NULL DEFAULT 'productive',
            key_items TEXT NOT NULL DEFAULT '[]',
            whats_next TEXT NOT NULL DEFAULT '[]',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE(owner_id, date)
        )
    "#,
};

pub static BLOCKERS: TableSpec = TableSpec {
    name: "blockers",
    columns: &[
        text("id"),
        text("owner_id"),
        text("title"),
        text("description"),
        text("severity"),
        text("category"),
        Column { name: "resolved", kind: ColumnKind::Bool },
        text("created_at"),
    ],
    natural_key: None,
    ddl: r#"
        CREATE TABLE IF NOT EXISTS blockers (
            id TEXT PRIMARY KEY NOT NULL,
            owner_id TEXT NOT NULL,
            title TEXT NOT NULL,
            description TEXT,
            severity TEXT NOT NULL DEFAULT 'medium',
            category TEXT NOT NULL DEFAULT 'other',
            resolved INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        )
    "#,
};
