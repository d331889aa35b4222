//! Example 01: Logging and Searching
//!
//! This example logs a few commands the way a shell hook would, then searches
//! them by substring and prints them in both output formats.
//!
//! Run with: cargo run --example 01_log_and_search

use consolidate::output::{self, OutputFormat};
use consolidate::{CaseMode, HistoryStore, NewCommand};
use eyre::Result;

fn main() -> Result<()> {
    // Create a temporary directory for this example
    let temp_dir = tempfile::tempdir()?;
    let db_path = temp_dir.path().join("history.db");

    println!("Consolidate Log and Search Example");
    println!("==================================\n");
    println!("Database: {}\n", db_path.display());

    // Open (or create) the store
    let mut store = HistoryStore::open(&db_path)?;

    // LOG: Append commands as a shell hook would
    println!("1. LOG - Appending commands...");
    let entries = [
        NewCommand::new("git status").session("demo").cwd("/repo"),
        NewCommand::new("ls -la").session("demo").cwd("/repo"),
        NewCommand::new("cargo test").session("demo").cwd("/repo").exit_code(101),
        NewCommand::new("Git log --oneline").session("demo").cwd("/repo"),
    ];
    for entry in &entries {
        let id = store.append(entry)?;
        println!("   Logged #{}: {}", id, entry.command);
    }
    println!();

    // HISTORY: Everything, most recent first
    println!("2. HISTORY - Most recent first...");
    let all = store.search_substring("", 100)?;
    println!("{}\n", output::render(&all, OutputFormat::Text, false)?);

    // SEARCH: Case-sensitive by default
    println!("3. SEARCH - \"git\" (case-sensitive)...");
    let hits = store.search_substring("git", 10)?;
    println!("{}\n", output::render(&hits, OutputFormat::Text, false)?);

    // SEARCH: Switch the store to case-insensitive matching
    println!("4. SEARCH - \"git\" (case-insensitive, JSON)...");
    let store = store.with_case_mode(CaseMode::Insensitive);
    let hits = store.search_substring("git", 10)?;
    println!("{}\n", output::render(&hits, OutputFormat::Json, false)?);

    println!("Example complete!");
    Ok(())
}
