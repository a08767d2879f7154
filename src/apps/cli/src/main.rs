use std::io::{self, Read, Write};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use redraft_cli::{render, ServerClient, Session};
use redraft_core_types::Phase;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "redraft", version, about = "Analyze and rewrite text with a Redraft server")]
struct Cli {
    /// Base URL of the Redraft server
    #[arg(long, env = "REDRAFT_SERVER_URL", default_value = "http://127.0.0.1:3000")]
    server: String,

    /// Print finished results as JSON
    #[arg(long)]
    json: bool,

    #[arg(long)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze text and report its type and context
    Analyze {
        /// Text to analyze; read from stdin when omitted
        text: Option<String>,
    },
    /// Analyze then rewrite text
    Rewrite {
        text: Option<String>,
        /// Also explain the individual changes
        #[arg(long)]
        changes: bool,
    },
}

/// Logs go to stderr so piped stdout stays clean. `REDRAFT_LOG_LEVEL` wins
/// over `RUST_LOG`.
fn init_logging(debug: bool) {
    let default = if debug { "debug" } else { "info" };
    let directives = std::env::var("REDRAFT_LOG_LEVEL")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| default.to_string());
    let filter = EnvFilter::try_new(&directives).unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn read_input(text: Option<String>) -> anyhow::Result<String> {
    match text {
        Some(text) => Ok(text),
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read text from stdin")?;
            Ok(buf)
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);

    let mut session = Session::new(ServerClient::new(cli.server));
    let mut stdout = io::stdout();

    let (text, rewrite, changes) = match cli.command {
        Command::Analyze { text } => (read_input(text)?, false, false),
        Command::Rewrite { text, changes } => (read_input(text)?, true, changes),
    };

    if session.analyze(&text, &mut stdout).await? != Phase::Ready {
        bail!(failure_reason(&session, "Analysis did not complete"));
    }
    let Some(analysis) = session.controller().analysis().cloned() else {
        bail!("Analysis did not complete");
    };
    if cli.json && !rewrite {
        writeln!(stdout, "{}", serde_json::to_string_pretty(&analysis)?)?;
    } else {
        writeln!(stdout, "{}", render::analysis_summary(&analysis))?;
    }
    if !rewrite {
        return Ok(());
    }

    if session.rewrite(&mut stdout).await? != Phase::Complete {
        bail!(failure_reason(&session, "Rewrite did not complete"));
    }
    let Some(result) = session.controller().rewrite().cloned() else {
        bail!("Rewrite did not complete");
    };
    if cli.json {
        writeln!(stdout, "{}", serde_json::to_string_pretty(&result)?)?;
    } else {
        writeln!(stdout, "{}", render::rewrite_summary(&result))?;
    }

    if changes {
        if let Some(result) = session.analyze_changes().await? {
            if cli.json {
                writeln!(stdout, "{}", serde_json::to_string_pretty(&result)?)?;
            } else {
                writeln!(stdout, "{}", render::changes_summary(&result))?;
            }
        }
    }
    Ok(())
}

fn failure_reason(session: &Session, fallback: &str) -> String {
    session
        .controller()
        .last_error()
        .unwrap_or(fallback)
        .to_string()
}
