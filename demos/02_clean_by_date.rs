//! Example 02: Cleaning by Date
//!
//! This example backfills commands across several days, previews a deletion
//! with a dry run, and then removes a single day using date-only bounds.
//!
//! Run with: cargo run --example 02_clean_by_date

use chrono::{TimeZone, Utc};
use consolidate::{HistoryStore, NewCommand, Selection};
use eyre::Result;

fn main() -> Result<()> {
    println!("Consolidate Clean by Date Example");
    println!("=================================\n");

    let mut store = HistoryStore::open_in_memory()?;

    // Backfill one command at noon on each of five days
    println!("1. SETUP - Backfilling five days of history...");
    for day in 1..=5 {
        let at = Utc.with_ymd_and_hms(2023, 1, day, 12, 0, 0).unwrap();
        store.append(&NewCommand::new(format!("make day{}", day)).at(at))?;
    }
    println!("   Total commands: {}\n", store.count()?);

    // DRY RUN: Same selection as the real delete, nothing removed
    println!("2. DRY RUN - --from 2023-01-02 --to 2023-01-03...");
    let window = Selection::parse(Some("2023-01-02"), Some("2023-01-03"), false)?;
    let preview = store.delete_selection(&window, true)?;
    println!("   Would delete {} commands", preview);
    println!("   Still stored: {}\n", store.count()?);

    // CLEAN: A date-only window covers the whole day
    println!("3. CLEAN - --from 2023-01-02 --to 2023-01-03...");
    let deleted = store.delete_selection(&window, false)?;
    println!("   Deleted {} commands (matches preview: {})\n", deleted, deleted == preview);

    // Rejected selections never touch the data
    println!("4. VALIDATION - --all together with --from...");
    match Selection::parse(Some("2023-01-01"), None, true) {
        Ok(_) => println!("   Unexpectedly accepted"),
        Err(e) => println!("   Rejected: {}", e),
    }
    println!("   Still stored: {}\n", store.count()?);

    println!("Example complete!");
    Ok(())
}
