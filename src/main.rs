use anyhow::Context;
use clap::Parser;
use colored::*;
use popular_repos::actors::{view_stats, ListView, ListViewArgs, ListViewMessage};
use popular_repos::cli::Cli;
use popular_repos::github::GitHubClient;
use popular_repos::status::{start_status_server, StatusState};
use popular_repos::store::{FetchOutcome, RepositoryStore};
use popular_repos::view::{render_stats, Command, Pager, ROWS_PER_ITEM};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::error;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if it exists
    dotenv::dotenv().ok();

    // Logs go to stderr, the list owns stdout
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let query = cli.search_query()?;
    let observer = cli.observer_options()?;

    println!("{}", format!("Popular {} Repositories", query.term).bold().green());
    println!("{}\n", "=".repeat(50).dimmed());

    let client = GitHubClient::with_base_url(&cli.api_url, query, &cli.user_agent)?;
    let store = Arc::new(RepositoryStore::new(client));

    if let Some(port) = cli.status_port {
        let state = StatusState::new(store.subscribe());
        tokio::spawn(async move {
            if let Err(e) = start_status_server(state, port).await {
                error!("Status server failed: {}", e);
            }
        });
    }

    // First page is loaded before the trigger is attached
    if let FetchOutcome::Failed { page } = store.fetch_next().await {
        eprintln!("{}", format!("⚠️ Could not load page {}, scroll or press r to retry", page).yellow());
    }

    let (view, handle) = ListView::spawn(ListViewArgs {
        store: Arc::clone(&store),
        viewport_rows: cli.viewport_rows,
        rows_per_item: ROWS_PER_ITEM,
        observer,
    })
    .await
    .context("Failed to start list view")?;

    println!("{}", "Enter/j: scroll down  k: scroll up  r: retry  s: stats  q: quit\n".dimmed());

    let mut pager = Pager::new();
    let mut updates = store.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let scroll_step = i64::from(cli.viewport_rows);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                println!("\n🛑 Shutting down...");
                break;
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let message = match Command::parse(&line) {
                    Command::ScrollDown => ListViewMessage::ScrollBy(scroll_step),
                    Command::ScrollUp => ListViewMessage::ScrollBy(-scroll_step),
                    Command::Retry => ListViewMessage::Demand,
                    Command::Stats => {
                        println!("{}", render_stats(&view_stats(&view).await?));
                        continue;
                    }
                    Command::Quit => break,
                    Command::Unknown => {
                        println!("{}", format!("Unknown command: {}", line.trim()).red());
                        continue;
                    }
                };
                view.send_message(message)
                    .map_err(|e| anyhow::anyhow!("Failed to message list view: {}", e))?;
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }

        let stats = view_stats(&view).await?;
        let rendered = store.with_snapshot(|s| pager.render(&stats, &s.repositories));
        for line in rendered {
            println!("{}", line);
        }
    }

    let stats = view_stats(&view).await?;
    println!("\n{}", render_stats(&stats));

    view.stop(None);
    handle.await.context("List view did not shut down cleanly")?;

    println!("✅ Done");
    Ok(())
}
