// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Set up logging and Ctrl-C / SIGTERM handling
// 3. Dispatch to the appropriate subcommand handler
// 4. Print results and exit with proper code (0 = success, 2 = error)
//
// A cancelled crawl is not an error: it still writes a sitemap with every
// page found before the signal arrived.
// =============================================================================

mod cli;
mod crawl;
mod extract;
mod fetch;
mod logging;
mod sitemap;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crawl::{CrawlConfig, CrawlReport, Crawler};
use extract::Link;
use fetch::{HttpFetcher, SourceFetcher};

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            // {:#} prints the whole context chain on one line
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let cancel = CancellationToken::new();
    spawn_signal_listener(cancel.clone());

    match cli.command {
        Commands::Crawl {
            url,
            workers,
            output,
            timeout,
            user_agent,
            json,
        } => {
            let mut config = CrawlConfig {
                workers: usize::from(workers),
                timeout: Duration::from_secs(timeout),
                ..CrawlConfig::default()
            };
            if let Some(user_agent) = user_agent {
                config.user_agent = user_agent;
            }
            handle_crawl(&url, config, &output, json, cancel).await
        }
        Commands::Links { file, json } => handle_links(file, json, cancel).await,
    }
}

// Handles the 'crawl' subcommand
async fn handle_crawl(
    entry: &str,
    config: CrawlConfig,
    output: &Path,
    json: bool,
    cancel: CancellationToken,
) -> Result<i32> {
    let entry = crawl::parse_entry(entry)?;

    if !json {
        println!("🔍 Crawling: {}", entry);
        println!("👷 Workers: {}", config.workers);
    }

    let http = HttpFetcher::new(config.timeout, &config.user_agent)
        .context("Failed to create HTTP client")?;
    let crawler = Crawler::new(Arc::new(SourceFetcher::new(http)), config, cancel);

    let report = crawler.crawl(&entry).await;

    sitemap::write_sitemap(output, &report.urls)?;
    info!(path = %output.display(), urls = report.urls.len(), "sitemap written");

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report, output);
    }

    Ok(0)
}

// Handles the 'links' subcommand
async fn handle_links(file: PathBuf, json: bool, cancel: CancellationToken) -> Result<i32> {
    let path = file.clone();
    let links = tokio::task::spawn_blocking(move || -> Result<Vec<Link>> {
        let reader = std::fs::File::open(&path)
            .with_context(|| format!("Cannot open {}", path.display()))?;
        extract::links_from_reader(std::io::BufReader::new(reader), &cancel)
            .with_context(|| format!("Failed to read {}", path.display()))
    })
    .await
    .context("Link extraction task failed")??;

    if json {
        println!("{}", serde_json::to_string_pretty(&links)?);
        return Ok(0);
    }

    if links.is_empty() {
        println!("No links found in {}", file.display());
        return Ok(0);
    }

    println!("{:<50} {}", "HREF", "TEXT");
    println!("{}", "=".repeat(80));
    for link in &links {
        println!("{:<50} {}", link.href, link.text);
    }
    println!();
    println!("📋 Total: {}", links.len());

    Ok(0)
}

// Prints a human-readable summary of the crawl
fn print_summary(report: &CrawlReport, output: &Path) {
    println!();
    if report.cancelled {
        println!("⚠️  Crawl interrupted, sitemap is partial");
    }

    println!("📊 Summary:");
    println!("   📄 Pages discovered: {}", report.urls.len());
    println!("   ✅ Scanned: {}", report.pages_scanned);
    println!("   ❌ Unreachable: {}", report.pages_failed);
    println!("   🔗 Same-host links seen: {}", report.links_found);
    println!("   🗺️  Sitemap: {}", output.display());
}

// Cancels `cancel` on Ctrl-C, or SIGTERM on Unix
fn spawn_signal_listener(cancel: CancellationToken) {
    tokio::spawn(async move {
        wait_for_signal().await;
        warn!("shutdown signal received, finishing up");
        cancel.cancel();
    });
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut terminate) => {
            tokio::select! {
                _ = ctrl_c() => {}
                _ = terminate.recv() => {}
            }
        }
        Err(e) => {
            warn!(error = %e, "cannot listen for SIGTERM, only Ctrl-C will stop the crawl");
            ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    ctrl_c().await;
}

// Resolves on Ctrl-C. Never resolves if the handler cannot be installed,
// so a setup failure is not mistaken for an interrupt.
async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "cannot listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
