//! Binary entry point: `serve` runs the HTTP surface (§6.2); `heal` is a
//! one-shot client that posts to a running server's `/heal` gateway and
//! streams its SSE progress to stdout.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use futures::StreamExt;
use tracing_subscriber::EnvFilter;

use store::memory::InMemoryStore;
use webhook::{router, AppConfig, AppState};

#[derive(Parser)]
#[command(name = "codeguard-pro", version, about = "Automated code-compliance service")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the webhook intake + healing gateway HTTP server.
    Serve {
        /// Address to bind, e.g. 0.0.0.0:8080.
        #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:8080")]
        bind: SocketAddr,
    },
    /// Kick off a heal session against a running server and stream progress.
    Heal {
        /// Base URL of a running `serve` instance.
        #[arg(long, default_value = "http://localhost:8080")]
        server: String,
        /// Repository URL, e.g. https://github.com/acme/widgets.
        #[arg(long)]
        repo_url: String,
        /// Team name, used in the healing branch name.
        #[arg(long)]
        team_name: String,
        /// Leader name, used in the healing branch name.
        #[arg(long)]
        leader_name: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .json()
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Serve { bind } => serve(bind).await,
        Commands::Heal { server, repo_url, team_name, leader_name } => {
            heal(&server, &repo_url, &team_name, &leader_name).await
        }
    }
}

async fn serve(bind: SocketAddr) -> Result<()> {
    println!("{}", "CodeGuard Pro".bold().cyan());
    println!("listening on {bind}");

    let config = AppConfig::from_env();
    let store = Arc::new(InMemoryStore::new());
    let state = Arc::new(AppState::new(config, store));

    let app = router(state).into_make_service_with_connect_info::<SocketAddr>();
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;

    axum::serve(listener, app).await.context("server error")
}

async fn heal(server: &str, repo_url: &str, team_name: &str, leader_name: &str) -> Result<()> {
    let client = reqwest::Client::new();
    let url = format!("{}/heal", server.trim_end_matches('/'));

    let resp = client
        .post(&url)
        .json(&serde_json::json!({
            "repo_url": repo_url,
            "team_name": team_name,
            "leader_name": leader_name,
        }))
        .send()
        .await
        .with_context(|| format!("failed to reach {url}"))?;

    if !resp.status().is_success() {
        anyhow::bail!("heal request rejected: {}", resp.status());
    }

    let mut stream = resp.bytes_stream();
    let mut buffer = String::new();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.context("error reading SSE stream")?;
        buffer.push_str(&String::from_utf8_lossy(&chunk));
        while let Some(pos) = buffer.find("\n\n") {
            let frame: String = buffer.drain(..pos + 2).collect();
            for line in frame.lines() {
                if let Some(data) = line.strip_prefix("data: ") {
                    println!("{data}");
                }
            }
        }
    }

    Ok(())
}
