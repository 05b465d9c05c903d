// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// We use the "derive" API which lets us define the CLI structure using
// Rust structs and attributes (the #[...] things).
//
// Subcommands:
// - crawl: crawl a website (or a local folder) and write a sitemap
// - links: print every link found in one local HTML file
// =============================================================================

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "sitemap-crawler",
    version,
    about = "Crawl a website and write a sitemap of every page on it",
    long_about = "sitemap-crawler starts at one page, follows every link that stays on the same host, \
                  and writes the pages it found to a sitemap.xml file. Press Ctrl-C at any time to stop \
                  early and still get a sitemap of what was found so far."
)]
pub struct Cli {
    /// More log output (-v debug, -vv trace). RUST_LOG overrides this.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Crawl a website and write its sitemap
    ///
    /// Example: sitemap-crawler crawl https://books.toscrape.com/ --workers 8
    Crawl {
        /// Entry point: an absolute URL, or a path to a local HTML file
        url: String,

        /// How many pages to fetch at the same time
        #[arg(short, long, default_value_t = 4, value_parser = clap::value_parser!(u16).range(1..))]
        workers: u16,

        /// Where to write the sitemap
        #[arg(short, long, default_value = "sitemap.xml")]
        output: PathBuf,

        /// Request timeout in seconds
        #[arg(long, default_value_t = 10)]
        timeout: u64,

        /// User-Agent header to send (defaults to sitemap-crawler/<version>)
        #[arg(long)]
        user_agent: Option<String>,

        /// Print the crawl report as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Print every link in a local HTML file
    ///
    /// Example: sitemap-crawler links index.html
    Links {
        /// HTML file to read
        file: PathBuf,

        /// Output links as JSON
        #[arg(long)]
        json: bool,
    },
}
