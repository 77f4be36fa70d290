//! Project initialization for workdesk
//!
//! `workdesk init` creates `.workdesk/` with a commented config template and
//! keeps the local database out of git.

use crate::config::CONFIG_DIR;
use colored::Colorize;
use std::fs;
use std::path::Path;

const CONFIG_TEMPLATE: &str = r#"# workdesk configuration
#
# Every value can also be set with a WORKDESK_* environment variable,
# which wins over this file.

[remote]
# "rest" for a hosted API, "sqlite" for a local file.
# Unset: rest when url is set, sqlite otherwise.
# backend = "sqlite"

# Hosted API (WORKDESK_REMOTE_URL, WORKDESK_ANON_KEY, WORKDESK_SERVICE_KEY)
# url = "https://your-project.example.co"
# anon_key = ""
# service_key = ""

# Owner every row is scoped to (WORKDESK_OWNER_ID)
owner_id = "local"

# SQLite file for the sqlite backend (WORKDESK_DB_PATH)
# db_path = ".workdesk/workdesk.db"

[api]
# Bearer token for POST /updates and POST /briefings (WORKDESK_API_TOKEN)
# token = ""
port = 3000
"#;

/// Initialize workdesk in `root`
pub fn init_project(root: &Path) -> Result<(), String> {
    println!("\n{}", "Initializing Workdesk...".cyan().bold());
    println!("   Directory: {}\n", root.display());

    let config_dir = root.join(CONFIG_DIR);
    create_dir_if_missing(&config_dir)?;

    let config_path = config_dir.join("config.toml");
    write_file_if_missing(&config_path, CONFIG_TEMPLATE, ".workdesk/config.toml")?;

    add_to_gitignore(root)?;

    println!("\n{}", "Workdesk initialized!".green().bold());
    println!("\nNext steps:");
    println!("  1. Edit {} (or export WORKDESK_* variables)", ".workdesk/config.toml".cyan());
    println!("  2. Run {} to create the tables", "workdesk provision".cyan());
    println!("  3. Run {} to load the starter data", "workdesk seed".cyan());
    println!("  4. Run {} to start the API", "workdesk serve".cyan());
    println!();

    Ok(())
}

fn create_dir_if_missing(path: &Path) -> Result<(), String> {
    if !path.exists() {
        fs::create_dir_all(path).map_err(|e| format!("Could not create {}: {}", path.display(), e))?;
        println!("   {} {}", "Creating".green(), path.display());
    }
    Ok(())
}

fn write_file_if_missing(path: &Path, content: &str, display_name: &str) -> Result<(), String> {
    if path.exists() {
        println!("   {} {} (already exists)", "Skipping".yellow(), display_name);
    } else {
        fs::write(path, content).map_err(|e| format!("Could not write {}: {}", display_name, e))?;
        println!("   {} {}", "Creating".green(), display_name);
    }
    Ok(())
}

/// Only the database is ignored; the config is worth committing
fn add_to_gitignore(root: &Path) -> Result<(), String> {
    let gitignore_path = root.join(".gitignore");
    let entry = ".workdesk/*.db";

    if gitignore_path.exists() {
        let existing =
            fs::read_to_string(&gitignore_path).map_err(|e| format!("Could not read .gitignore: {}", e))?;

        if existing.lines().any(|line| line.trim() == entry) {
            return Ok(());
        }

        let new_content = format!("{}\n\n# Workdesk database (local)\n{}\n", existing.trim_end(), entry);
        fs::write(&gitignore_path, new_content).map_err(|e| format!("Could not update .gitignore: {}", e))?;
        println!("   {} .gitignore (added {})", "Updated".green(), entry);
    } else {
        let content = format!("# Workdesk database (local)\n{}\n", entry);
        fs::write(&gitignore_path, content).map_err(|e| format!("Could not create .gitignore: {}", e))?;
        println!("   {} .gitignore", "Creating".green());
    }

    Ok(())
}
