use clap::Parser;
use colored::*;
use futures::future::join_all;
use repo_likes::actors::{ListStateConfig, ListStateController, ListStateHandle};
use repo_likes::cli::{Cli, Command};
use repo_likes::error::{RepoLikesError, Result};
use repo_likes::models::{Profile, RepositoryList};
use repo_likes::remote::HttpRepositoryClient;
use repo_likes::render::render_screen;
use repo_likes::types::RepositoryId;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists
    dotenv::dotenv().ok();

    // Logs go to stderr so the screen on stdout stays clean
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let client = HttpRepositoryClient::new(cli.client_config())?;
    info!(api_url = %client.base_url(), "Using repository service");

    // The startup load is issued explicitly below so its failure reaches us
    let config = ListStateConfig {
        load_on_start: false,
        ..Default::default()
    };
    let controller = ListStateController::start(Arc::new(client), config).await?;

    let result = run(&cli, &controller).await;

    controller.shutdown().ok();
    result
}

async fn run(cli: &Cli, controller: &ListStateHandle) -> Result<()> {
    let profile = cli.profile();
    let list = controller.load_repositories().await?;

    match cli.command() {
        Command::List => show(cli, &profile, &list)?,
        Command::Like { ids } => {
            let ids: Vec<RepositoryId> = ids.into_iter().map(RepositoryId::from).collect();
            let outcomes = join_all(ids.iter().map(|id| controller.like_repository(id))).await;

            let mut failed = Vec::new();
            for (id, outcome) in ids.iter().zip(outcomes) {
                match outcome {
                    Ok(repo) => {
                        eprintln!("{} {} ({})", "✅".green(), repo.title, repo.likes_label());
                    }
                    Err(e) => {
                        failed.push(id.to_string());
                        eprintln!("{} {}: {}", "❌".red(), id, e);
                    }
                }
            }

            show(cli, &profile, &controller.snapshot())?;

            if !failed.is_empty() {
                return Err(RepoLikesError::LikeFailure {
                    id: failed.join(", "),
                    reason: format!("{} of {} likes failed", failed.len(), ids.len()),
                });
            }
        }
        Command::Watch { refresh } => watch(cli, &profile, controller, refresh).await?,
    }

    Ok(())
}

fn show(cli: &Cli, profile: &Profile, list: &RepositoryList) -> Result<()> {
    if cli.json {
        println!("{}", serde_json::to_string_pretty(list.as_slice())?);
    } else {
        print!("{}", render_screen(profile, list));
    }
    Ok(())
}

async fn watch(cli: &Cli, profile: &Profile, controller: &ListStateHandle, refresh: u64) -> Result<()> {
    let mut updates = controller.subscribe();
    let mut reload = tokio::time::interval(Duration::from_secs(refresh.max(1)));
    reload.tick().await; // Skip first immediate tick

    let initial = updates.borrow_and_update().clone();
    show(cli, profile, &initial)?;
    println!("\nPress Ctrl+C to stop watching\n");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!("\n🛑 Stopped watching");
                return Ok(());
            }
            _ = reload.tick() => {
                if let Err(e) = controller.load_repositories().await {
                    error!("Reload failed: {}", e);
                }
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    return Err(RepoLikesError::SessionClosed("list controller stopped".to_string()));
                }
                let list = updates.borrow_and_update().clone();
                show(cli, profile, &list)?;
            }
        }
    }
}
