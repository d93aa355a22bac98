//! Promptsmith CLI and REST API entry point.
//!
//! Binary name: `psmith`
//!
//! Parses CLI arguments, initializes the database and services, then
//! dispatches to the appropriate command handler or starts the REST API
//! server.

mod http;
mod state;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use tracing_subscriber::EnvFilter;

use state::AppState;

#[derive(Parser)]
#[command(name = "psmith", about = "Prompt optimizer agent with conversation memory")]
struct Cli {
    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Emit machine-readable JSON output
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the REST API server
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        #[arg(long, default_value_t = 8787)]
        port: u16,
    },

    /// Print recent conversation history for a user
    History {
        /// User id to query
        user: String,
        /// Restrict to one session thread
        #[arg(long)]
        session: Option<String>,
        /// Maximum turn-groups to print
        #[arg(long)]
        limit: Option<u32>,
    },

    /// Delete records older than the retention horizon
    Sweep,

    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up tracing based on verbosity
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info,promptsmith=debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();

    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = Cli::command();
        generate(*shell, &mut cmd, "psmith", &mut std::io::stdout());
        return Ok(());
    }

    let state = AppState::init().await?;

    match cli.command {
        Commands::Serve { host, port } => {
            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;

            println!(
                "  {} Promptsmith API listening on {}",
                console::style("⚡").bold(),
                console::style(format!("http://{addr}")).cyan()
            );
            if state.optimizer.is_none() {
                println!(
                    "  {}",
                    console::style("OPENAI_API_KEY not set -- /api/optimize will return an error")
                        .yellow()
                );
            }
            println!("  {}", console::style("Press Ctrl+C to stop").dim());

            let router = http::router::build_router(state);

            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await?;

            println!("\n  Server stopped.");
        }

        Commands::History { user, session, limit } => {
            let limit = limit.unwrap_or(state.config.history_page_turns);
            let records = state
                .conversations
                .fetch_history(&user, session.as_deref(), limit)
                .await
                .map_err(|e| anyhow::anyhow!("history query failed: {e}"))?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else if records.is_empty() {
                println!("  No conversation history for '{user}'.");
            } else {
                for record in &records {
                    println!();
                    println!(
                        "  {} {}  session {}",
                        console::style("●").cyan(),
                        record.created_at.format("%Y-%m-%d %H:%M:%S"),
                        console::style(&record.session_id).dim()
                    );
                    for message in &record.messages {
                        println!(
                            "    {} {}",
                            console::style(format!("{}:", message.role)).bold(),
                            message.content
                        );
                    }
                }
                println!();
            }
        }

        Commands::Sweep => {
            let removed = state
                .conversations
                .sweep()
                .await
                .map_err(|e| anyhow::anyhow!("sweep failed: {e}"))?;

            if cli.json {
                println!("{}", serde_json::json!({ "removed": removed }));
            } else {
                println!(
                    "  {} Removed {} expired record(s) (retention: {} days)",
                    console::style("✓").green(),
                    removed,
                    state.config.retention_days
                );
            }
        }

        Commands::Completions { .. } => unreachable!("handled above"),
    }

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
