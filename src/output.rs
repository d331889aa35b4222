// Rendering of command records for the terminal

use crate::record::{CommandRecord, format_timestamp};
use colored::Colorize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_json_flag(json: bool) -> Self {
        if json { OutputFormat::Json } else { OutputFormat::Text }
    }
}

/// One line per record: `[<timestamp>] <command> (exit: <code>)`
pub fn render_line(record: &CommandRecord, color: bool) -> String {
    let timestamp = format!("[{}]", format_timestamp(&record.timestamp));
    let exit = format!("(exit: {})", record.exit_code);

    if !color {
        return format!("{} {} {}", timestamp, record.command, exit);
    }

    let exit = if record.exit_code == 0 { exit.normal() } else { exit.red() };
    format!("{} {} {}", timestamp.dimmed(), record.command, exit)
}

/// Render records as text lines or a pretty JSON array
pub fn render(records: &[CommandRecord], format: OutputFormat, color: bool) -> serde_json::Result<String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(records),
        OutputFormat::Text => Ok(records
            .iter()
            .map(|r| render_line(r, color))
            .collect::<Vec<_>>()
            .join("\n")),
    }
}
