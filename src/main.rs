use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use std::io;
use std::process::exit;
use std::sync::Arc;
use workdesk::config::{Backend, Config};
use workdesk::serve::{self, ServerContext};
use workdesk::store::{RecordStore, SqliteStore};
use workdesk::{seed, telemetry, views, DataAccess, Mode, NewUpdate, TaskStatus, UpdateType};

#[derive(Parser, Debug)]
#[command(name = "workdesk")]
#[command(author, version, about = "Personal collaboration dashboard: projects, tasks, docs and daily briefings")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// More log output on stderr (-v info, -vv debug); WORKDESK_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create .workdesk/ with a config template
    Init,

    /// Start the HTTP API
    Serve {
        /// Port to listen on (default: api.port from config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Show the data mode and what is loaded
    Status,

    /// Search projects, documents, updates, tasks and links
    Search {
        /// Case-insensitive text to look for
        query: String,
    },

    /// Print the kanban board
    Board,

    /// List unresolved blockers, most severe first
    Blockers,

    /// Post an update to the feed
    Post {
        /// Update text; [TAGS] like [DECISION] are kept as written
        content: String,

        /// note, status, task or milestone
        #[arg(short = 't', long = "type", default_value = "note")]
        kind: UpdateType,
    },

    /// Move a task to another board column
    Move {
        /// Task id
        id: String,

        /// todo, in-progress or done
        status: TaskStatus,
    },

    /// Mark a blocker resolved
    Resolve {
        /// Blocker id
        id: String,
    },

    /// Create the tables in the SQLite backend
    Provision,

    /// Bulk-load the starter dataset into the configured store
    Seed,

    /// Generate shell completions
    Completion {
        shell: Shell,
    },
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("{} {}", "Error:".red(), message);
    exit(1);
}

fn load_config() -> Config {
    Config::load().unwrap_or_else(|e| fail(e))
}

fn open_dal(config: &Config) -> DataAccess {
    let store = config.build_store().unwrap_or_else(|e| fail(e));
    let mut dal = DataAccess::new(store);
    if dal.load() == Mode::Fallback {
        eprintln!(
            "{} record store unavailable; showing seed data (changes are not saved)",
            "Fallback:".yellow()
        );
    }
    dal
}

fn main() {
    let cli = Cli::parse();
    telemetry::init(cli.verbose);

    match cli.command {
        Command::Init => {
            let cwd = std::env::current_dir().unwrap_or_else(|e| fail(format!("Could not get current directory: {}", e)));
            if let Err(e) = workdesk::init::init_project(&cwd) {
                fail(e);
            }
        }

        Command::Serve { port } => {
            let config = load_config();
            let port = port.unwrap_or(config.api.port);
            if config.api.token.is_none() {
                eprintln!("{} api.token is not set; POST /updates and /briefings will answer 401", "Warning:".yellow());
            }
            let ctx = ServerContext::from_config(&config).unwrap_or_else(|e| fail(e));
            if let Err(e) = serve::start_server(port, ctx) {
                fail(format!("Server error: {}", e));
            }
        }

        Command::Status => {
            let config = load_config();
            let dal = open_dal(&config);
            let mode = dal.mode().unwrap_or(Mode::Fallback);
            let backend = match config.backend() {
                Backend::Rest => format!("rest ({})", config.remote.url.as_deref().unwrap_or("")),
                Backend::Sqlite => format!("sqlite ({})", config.db_path().display()),
            };
            let counts = dal.collections().counts();

            println!("{} {}", "Mode:".bold(), mode.to_string().cyan());
            println!("{} {}", "Backend:".bold(), backend);
            println!("{} {}", "Owner:".bold(), config.remote.owner_id);
            println!("   projects  {}", counts.projects);
            println!("   documents {}", counts.documents);
            println!("   updates   {}", counts.updates);
            println!("   tasks     {}", counts.tasks);
            println!("   links     {}", counts.links);
            println!("   blockers  {}", counts.blockers);
            match &dal.collections().briefing {
                Some(b) => println!("   briefing  {} ({})", b.date, b.mood),
                None => println!("   briefing  none"),
            }
        }

        Command::Search { query } => {
            let dal = open_dal(&load_config());
            let results = dal.search(&query);
            if results.is_empty() {
                println!("No matches for {}", query.cyan());
                return;
            }
            for p in &results.projects {
                println!("{} {} {}", "project ".green(), p.name, p.id.dimmed());
            }
            for d in &results.documents {
                println!("{} {} {}", "document".green(), d.title, d.id.dimmed());
            }
            for u in &results.updates {
                println!("{} {} {}", "update  ".green(), u.content, u.id.dimmed());
            }
            for t in &results.tasks {
                println!("{} {} {}", "task    ".green(), t.title, t.id.dimmed());
            }
            for l in &results.links {
                println!("{} {} {}", "link    ".green(), l.label, l.url.dimmed());
            }
            println!("\n{} matches", results.total());
        }

        Command::Board => {
            let dal = open_dal(&load_config());
            let collections = dal.collections();
            let board = views::board(&collections.tasks);
            for status in TaskStatus::ALL {
                let column = board.column(*status);
                println!("\n{} ({})", status.to_string().to_uppercase().bold(), column.len());
                for task in column {
                    let project = views::project_for_task(collections, task)
                        .map(|p| format!(" [{}]", p.name))
                        .unwrap_or_default();
                    println!("  {} {}{} {}", task.priority.to_string().yellow(), task.title, project.cyan(), task.id.dimmed());
                }
            }
        }

        Command::Blockers => {
            let dal = open_dal(&load_config());
            let open = views::open_blockers(&dal.collections().blockers);
            if open.is_empty() {
                println!("{}", "Nothing blocking".green());
            }
            for b in open {
                println!("{} {} ({}) {}", b.severity.to_string().red(), b.title, b.category, b.id.dimmed());
            }
        }

        Command::Post { content, kind } => {
            let mut dal = open_dal(&load_config());
            match dal.post_update(NewUpdate { content, kind }) {
                Some(update) => println!("{} {}", "Posted".green(), update.id),
                None => fail("update was not saved (see log output)"),
            }
        }

        Command::Move { id, status } => {
            let mut dal = open_dal(&load_config());
            match dal.move_task(&id, status) {
                Some(task) => println!("{} {} → {}", "Moved".green(), task.title, task.status),
                None => fail(format!("could not move task {}", id)),
            }
        }

        Command::Resolve { id } => {
            let mut dal = open_dal(&load_config());
            match dal.resolve_blocker(&id) {
                Some(blocker) => println!("{} {}", "Resolved".green(), blocker.title),
                None => fail(format!("could not resolve blocker {}", id)),
            }
        }

        Command::Provision => {
            let config = load_config();
            if config.backend() != Backend::Sqlite {
                fail("provision only applies to the sqlite backend; create hosted tables with the provider's tools");
            }
            let path = config.db_path();
            let store = SqliteStore::open_at(&path, &config.remote.owner_id).unwrap_or_else(|e| fail(e));
            store.provision().unwrap_or_else(|e| fail(e));
            println!("{} {}", "Provisioned".green(), path.display());
        }

        Command::Seed => {
            let config = load_config();
            let store: Arc<dyn RecordStore> = config.build_service_store().unwrap_or_else(|e| fail(e));
            let report = seed::seed_store(store.as_ref()).unwrap_or_else(|e| fail(e));
            println!(
                "{} {} projects, {} documents, {} updates, {} tasks, {} links, {} blockers, {} briefing",
                "Seeded".green(),
                report.projects,
                report.documents,
                report.updates,
                report.tasks,
                report.links,
                report.blockers,
                report.briefings
            );
        }

        Command::Completion { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "workdesk", &mut io::stdout());
        }
    }
}
