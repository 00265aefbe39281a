//! ghtools - GitHub operations exposed as agent tools.
//!
//! Runs a single tool and prints its JSON envelope to stdout.

mod cli;

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use ghtools_config::{Config, auth};
use ghtools_github::{GitHubClient, GitHubTools};
use secrecy::SecretString;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    init_logging();
    let cli = Cli::parse();

    let config = Config::load()
        .await
        .context("failed to load configuration")?;
    let token = auth::resolve_token(config.github_token.as_deref())
        .await
        .map(SecretString::from);
    if token.is_none() {
        warn!("no GitHub token found, using unauthenticated access");
    }

    let client = GitHubClient::new(token)
        .await
        .context("failed to create GitHub client")?;
    if cli.validate_token {
        client
            .validate_token()
            .await
            .context("token validation failed")?;
    }
    let tools = GitHubTools::from_config(client, &config);

    // Ctrl-C aborts any rate limit or backoff wait in progress.
    let limiter = tools.operations().rate_limiter().clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            debug!("received Ctrl-C");
            limiter.shutdown();
        }
    });

    let result = cli.tool.run(&tools).await;
    let output = if cli.pretty {
        serde_json::to_string_pretty(&result)
    } else {
        serde_json::to_string(&result)
    }
    .context("failed to serialize result")?;
    println!("{output}");

    Ok(if result.is_successful() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn init_logging() {
    let default_level = "warn";
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(default_level))
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .try_init();
}
