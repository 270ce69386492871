use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use scoreboard::client::DEFAULT_TIMEOUT;
use scoreboard::{
    ClientError, ClientState, Connectivity, HttpTransport, LocalBackup, RankedEntry, ScoreClient,
};

/// CLI-specific errors.
#[derive(Error, Debug)]
pub enum AppError {
    /// Client error (network, rejection, backup)
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Offline mode requested without a place to keep the local copy
    #[error("--offline needs a backup directory")]
    MissingBackupDir,
}

#[derive(Parser)]
#[command(name = "scoreboard")]
#[command(about = "Submit and view leaderboard scores")]
struct Cli {
    /// Base URL of the scoreboard server
    #[arg(long, default_value = "http://localhost:3000", env = "SCOREBOARD_URL")]
    url: String,

    /// Keep working against a local copy when the server is unreachable
    #[arg(long, env = "SCOREBOARD_OFFLINE")]
    offline: bool,

    /// Directory holding the local copy used in offline mode
    #[arg(long, default_value = ".scoreboard-client", env = "SCOREBOARD_BACKUP_DIR")]
    backup_dir: PathBuf,

    /// Request timeout in seconds
    #[arg(long, env = "SCOREBOARD_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the ranked leaderboard and stats
    List,

    /// Add a count to a contributor (names match ignoring case)
    Add {
        /// Contributor name
        name: String,

        /// Positive whole number to add
        #[arg(allow_negative_numbers = true)]
        count: i64,
    },

    /// Remove every score
    Clear,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(cli).await {
        eprint!("{}", format_error(&err));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let timeout = cli
        .timeout_secs
        .map_or(DEFAULT_TIMEOUT, Duration::from_secs);
    let transport = HttpTransport::new(&cli.url, timeout)?;
    tracing::debug!(url = %transport.base_url(), ?timeout, offline = cli.offline, "client configured");

    let mut client = ScoreClient::new(transport);
    if cli.offline {
        if cli.backup_dir.as_os_str().is_empty() {
            return Err(AppError::MissingBackupDir);
        }
        client = client.with_offline_fallback(LocalBackup::in_dir(&cli.backup_dir));
    }

    match cli.command {
        Commands::List => {
            let connectivity = client.fetch_scores().await?;
            print_connectivity(connectivity);
            print_board(client.state(), &client.ranked());
        }

        Commands::Add { name, count } => {
            // Load first so a degraded add accumulates onto the local copy
            client.fetch_scores().await?;
            let connectivity = client.add_score(&name, count).await?;
            print_connectivity(connectivity);
            println!("Added {} to '{}'", count, name.trim());
            print_board(client.state(), &client.ranked());
        }

        Commands::Clear => {
            client.clear_all_scores().await?;
            println!("All scores cleared");
        }
    }

    Ok(())
}

fn print_connectivity(connectivity: Connectivity) {
    if connectivity == Connectivity::Degraded {
        eprintln!("Server unreachable; using the local copy");
    }
}

fn print_board(state: &ClientState, ranked: &[RankedEntry]) {
    if ranked.is_empty() {
        println!("No scores yet");
        return;
    }

    let width = ranked
        .iter()
        .map(|r| r.entry.name.chars().count())
        .max()
        .unwrap_or(0)
        .max("Name".len());

    println!("{:>4}  {:<width$}  {:>10}", "Rank", "Name", "Count");
    for r in ranked {
        println!("{:>4}  {:<width$}  {:>10}", r.rank, r.entry.name, r.entry.count);
    }

    let stats = state.stats();
    println!();
    println!(
        "Total: {}  Contributors: {}  Average: {}",
        stats.total_count, stats.contributor_count, stats.average_per_contributor
    );
}

/// Format an error with optional color and hints
fn format_error(err: &AppError) -> String {
    use std::io::IsTerminal;

    let use_colors = std::io::stderr().is_terminal();

    let (red, yellow, reset) = if use_colors {
        ("\x1b[0;31m", "\x1b[0;33m", "\x1b[0m")
    } else {
        ("", "", "")
    };

    let mut output = format!("{}Error:{} {}\n", red, reset, err);

    if let Some(hint) = get_error_hint(err) {
        output.push_str(&format!("{}Hint:{} {}\n", yellow, reset, hint));
    }

    output
}

/// Get a helpful hint for common errors
fn get_error_hint(err: &AppError) -> Option<&'static str> {
    match err {
        AppError::Client(e) if e.is_network() => {
            Some("Is the server running? Check --url, or pass --offline to use a local copy")
        }
        AppError::Client(ClientError::Service { .. }) => {
            Some("The server failed to reach its store; try again shortly")
        }
        AppError::Client(ClientError::BackupFormat(_)) => {
            Some("The local copy is unreadable; remove it from the backup directory")
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_add_with_negative_count() -> anyhow::Result<()> {
        let cli = Cli::try_parse_from(["scoreboard", "add", "Alice", "-3"])?;
        assert!(matches!(cli.command, Commands::Add { count: -3, .. }));
        Ok(())
    }

    #[test]
    fn test_parse_global_flags() -> anyhow::Result<()> {
        let cli = Cli::try_parse_from([
            "scoreboard",
            "--url",
            "http://scores.local:8080",
            "--offline",
            "--timeout-secs",
            "3",
            "list",
        ])?;
        assert_eq!(cli.url, "http://scores.local:8080");
        assert!(cli.offline);
        assert_eq!(cli.timeout_secs, Some(3));
        assert!(matches!(cli.command, Commands::List));
        Ok(())
    }

    #[test]
    fn test_network_errors_get_a_hint() {
        let err = AppError::Client(ClientError::Network("connection refused".into()));
        assert!(get_error_hint(&err).is_some());
        assert!(format_error(&err).contains("connection refused"));
    }
}
