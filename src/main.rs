use base64::Engine;
use clap::{Parser, Subcommand};
use consolidate::{Config, HistoryStore, NewCommand, OutputFormat, Selection, output};
use eyre::{Context, Result};
use std::path::PathBuf;
use tracing::Level;

#[derive(Parser)]
#[command(name = "consolidate")]
#[command(about = "Consolidate - log, search, and prune your shell command history")]
#[command(version = env!("GIT_DESCRIBE"))]
struct Cli {
    /// Path to the history database (default: ~/.consolidate/history.db)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Disable coloured output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the data directory and history database
    Init,

    /// Log a command to the history
    Log {
        /// Command text
        command: String,

        /// Session ID
        #[arg(long, default_value = "")]
        session: String,

        /// Working directory (default: current directory)
        #[arg(long, default_value = "")]
        cwd: String,

        /// Exit code of the command
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        exit_code: String,

        /// Additional metadata
        #[arg(long, default_value = "")]
        metadata: String,

        /// Command is base64 encoded
        #[arg(long)]
        encoded: bool,
    },

    /// Search logged commands by substring
    Search {
        /// Substring to look for
        query: String,

        /// Maximum number of results (default: config search_limit)
        #[arg(long, allow_hyphen_values = true)]
        limit: Option<i64>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Display command history, most recent first
    History {
        /// Maximum number of commands to display (default: config history_limit)
        #[arg(long, allow_hyphen_values = true)]
        limit: Option<i64>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Remove commands from history by datetime range
    Clean {
        /// Start datetime (RFC3339 or YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// End datetime (RFC3339 or YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,

        /// Delete all commands from history
        #[arg(long)]
        all: bool,

        /// Show what would be deleted without deleting
        #[arg(long)]
        dry_run: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.no_color {
        colored::control::set_override(false);
    }

    if let Err(err) = run(cli) {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let db_path = config.resolve_db_path(cli.db.as_deref())?;
    let color = !cli.no_color;

    let mut store = HistoryStore::open(&db_path)
        .with_context(|| format!("Error initializing database at {}", db_path.display()))?
        .with_case_mode(config.case_mode());

    match cli.command {
        Commands::Init => {
            println!("Consolidate initialized successfully. Database created at {}", db_path.display());
        }
        Commands::Log {
            command,
            session,
            cwd,
            exit_code,
            metadata,
            encoded,
        } => {
            let command = if encoded { decode_command(&command)? } else { command };
            let exit_code = parse_exit_code(&exit_code);

            let entry = NewCommand::new(command)
                .session(session)
                .cwd(cwd)
                .exit_code(exit_code)
                .metadata(metadata);
            store.append(&entry).context("Error saving command")?;
        }
        Commands::Search { query, limit, json } => {
            let limit = limit.unwrap_or(config.search_limit);
            let records = store.search_substring(&query, limit).context("Error searching commands")?;
            if records.is_empty() {
                println!("No matching commands found.");
            } else {
                println!("{}", output::render(&records, OutputFormat::from_json_flag(json), color)?);
            }
        }
        Commands::History { limit, json } => {
            let limit = limit.unwrap_or(config.history_limit);
            let records = store.search_substring("", limit).context("Error fetching history")?;
            if records.is_empty() {
                println!("No commands in history.");
            } else {
                println!("{}", output::render(&records, OutputFormat::from_json_flag(json), color)?);
            }
        }
        Commands::Clean {
            from,
            to,
            all,
            dry_run,
        } => {
            let selection =
                Selection::parse(from.as_deref(), to.as_deref(), all).context("Error parsing clean options")?;
            let count = store
                .delete_selection(&selection, dry_run)
                .context("Error cleaning history")?;

            if dry_run {
                println!("Dry run: Would delete {} commands", count);
            } else {
                println!("Deleted {} commands from history", count);
            }
        }
    }

    store.close()?;
    Ok(())
}

fn decode_command(encoded: &str) -> Result<String> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .context("Error decoding command")?;
    String::from_utf8(bytes).context("Decoded command is not valid UTF-8")
}

/// Hooks may pass an empty or odd status; treat it as success
fn parse_exit_code(raw: &str) -> i64 {
    raw.trim().parse::<i64>().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_exit_code() {
        assert_eq!(parse_exit_code("0"), 0);
        assert_eq!(parse_exit_code("127"), 127);
        assert_eq!(parse_exit_code(" -1 "), -1);
    }

    #[test]
    fn test_parse_exit_code_falls_back_to_zero() {
        assert_eq!(parse_exit_code(""), 0);
        assert_eq!(parse_exit_code("abc"), 0);
        assert_eq!(parse_exit_code("1.5"), 0);
    }

    #[test]
    fn test_decode_command() {
        // "git commit -m 'wip'"
        let decoded = decode_command("Z2l0IGNvbW1pdCAtbSAnd2lwJw==").unwrap();
        assert_eq!(decoded, "git commit -m 'wip'");

        let encoded = base64::engine::general_purpose::STANDARD.encode("echo \"$HOME\" | wc -c");
        assert_eq!(decode_command(&format!("{}\n", encoded)).unwrap(), "echo \"$HOME\" | wc -c");
    }

    #[test]
    fn test_decode_command_rejects_bad_base64() {
        let err = decode_command("not base64!").unwrap_err();
        assert!(format!("{}", err).contains("Error decoding command"));
    }

    #[test]
    fn test_decode_command_rejects_non_utf8() {
        let encoded = base64::engine::general_purpose::STANDARD.encode([0xff, 0xfe, 0xfd]);
        let err = decode_command(&encoded).unwrap_err();
        assert!(format!("{}", err).contains("not valid UTF-8"));
    }

    #[test]
    fn test_cli_parses_negative_exit_code() {
        let cli = Cli::try_parse_from(["consolidate", "log", "false", "--exit-code", "-1"]).unwrap();
        match cli.command {
            Commands::Log { command, exit_code, .. } => {
                assert_eq!(command, "false");
                assert_eq!(parse_exit_code(&exit_code), -1);
            }
            _ => panic!("expected log command"),
        }
    }
}
