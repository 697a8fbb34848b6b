//! Command-line interface for the `catalog` binary.
//!
//! # Usage
//!
//! ```bash
//! # Scrape the admin page and write courses to the database
//! catalog scrape
//!
//! # Parse a saved copy without touching the database
//! catalog scrape --html admin.html --dry-run
//!
//! # Report ids that produce the same slug
//! catalog collisions
//!
//! # Apply descriptions from static HTML exports
//! catalog descriptions export1.html export2.html
//!
//! # Show which stored courses still lack a description
//! catalog coverage
//!
//! # Check how two titles compare
//! catalog match "DSE Assessment" "Display Screen Equipment"
//! ```
//!
//! # Environment Variables
//!
//! - `CATALOG_ADMIN_URL`: admin page to scrape
//! - `CATALOG_ASSET_HOST`: host for icon, video and PDF links
//! - `CATALOG_DB_PATH`: `SQLite` database path
//! - `CATALOG_ALIAS_FILE`: JSON alias table replacing the built-in one
//! - `CATALOG_TOKEN_OVERLAP`: token-overlap threshold (`0.0..=1.0`)
//! - `RUST_LOG`: log filter

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::matching::{
    TitleMatcher, find_duplicate_ids, find_duplicate_slugs, find_slug_collisions, normalize_key,
    slugify,
};
use crate::report::{CoverageReport, DuplicateIdReport, ScrapeSummary, SlugReport};
use crate::scraping::{CatalogScraper, ScrapeReport, StaticDescription, parse_static_descriptions};
use crate::store::SqliteCourseStore;
use crate::sync;

/// Course catalog maintenance tool.
#[derive(Debug, Parser)]
#[command(name = "catalog")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Command to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Scrape courses and save them to the database
    Scrape {
        /// Parse and report without writing to the database
        #[arg(long)]
        dry_run: bool,

        /// Fail when any course lacks a purchase URL
        #[arg(long)]
        strict: bool,

        /// Read the admin page from a file instead of fetching it
        #[arg(long, value_name = "FILE")]
        html: Option<PathBuf>,
    },

    /// Report different course ids that produce the same slug
    Collisions {
        /// Read the admin page from a file instead of fetching it
        #[arg(long, value_name = "FILE")]
        html: Option<PathBuf>,
    },

    /// Report repeated course ids and repeated slugs
    Duplicates {
        /// Read the admin page from a file instead of fetching it
        #[arg(long, value_name = "FILE")]
        html: Option<PathBuf>,
    },

    /// Apply descriptions from static HTML exports
    Descriptions {
        /// Exported HTML files
        #[arg(required = true, value_name = "FILE")]
        files: Vec<PathBuf>,

        /// Print the parsed descriptions without writing them
        #[arg(long)]
        dry_run: bool,
    },

    /// Report stored courses with and without a description
    Coverage,

    /// Check whether two titles match, and by which rule
    Match {
        /// First title
        a: String,
        /// Second title
        b: String,
    },

    /// Print the slug for each title
    Slug {
        /// Titles to slugify
        #[arg(required = true)]
        titles: Vec<String>,
    },
}

/// Run the CLI.
///
/// # Returns
/// `ExitCode::SUCCESS` when the command succeeds, `1` on failure.
#[must_use]
pub fn run(cli: Cli) -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {e}");
            return ExitCode::from(1);
        }
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to create runtime: {e}");
            return ExitCode::from(1);
        }
    };

    if let Err(e) = rt.block_on(execute(cli.command, &config)) {
        tracing::error!("{e:#}");
        return ExitCode::from(1);
    }

    ExitCode::SUCCESS
}

/// Dispatch one command.
///
/// # Errors
/// Returns an error if the command fails.
pub async fn execute(command: Command, config: &AppConfig) -> Result<()> {
    match command {
        Command::Scrape {
            dry_run,
            strict,
            html,
        } => handle_scrape(config, html.as_deref(), dry_run, strict).await,
        Command::Collisions { html } => handle_collisions(config, html.as_deref()).await,
        Command::Duplicates { html } => handle_duplicates(config, html.as_deref()).await,
        Command::Descriptions { files, dry_run } => {
            handle_descriptions(config, &files, dry_run).await
        }
        Command::Coverage => handle_coverage(config).await,
        Command::Match { a, b } => {
            let matcher = config.title_matcher()?;
            println!("{}", describe_match(&matcher, &a, &b));
            Ok(())
        }
        Command::Slug { titles } => {
            for line in slug_lines(&titles) {
                println!("{line}");
            }
            Ok(())
        }
    }
}

fn build_scraper(config: &AppConfig) -> Result<CatalogScraper> {
    let matcher = config.title_matcher()?;
    CatalogScraper::new(config.scraping.clone(), matcher).context("Failed to build HTTP client")
}

async fn load_admin_page(scraper: &CatalogScraper, html: Option<&Path>) -> Result<String> {
    match html {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display())),
        None => scraper
            .fetch_admin_page()
            .await
            .with_context(|| format!("Failed to fetch {}", scraper.config().admin_url)),
    }
}

async fn handle_scrape(
    config: &AppConfig,
    html: Option<&Path>,
    dry_run: bool,
    strict: bool,
) -> Result<()> {
    let scraper = build_scraper(config)?;
    let page = load_admin_page(&scraper, html).await?;
    let report = scraper.scrape_html(&page)?;

    println!("{}", ScrapeSummary {
        report: &report,
        dry_run,
    });

    if !dry_run {
        persist_report(config, &report).await?;
    }

    if strict {
        check_purchase_urls(&report)?;
    }
    Ok(())
}

async fn persist_report(config: &AppConfig, report: &ScrapeReport) -> Result<()> {
    let store = SqliteCourseStore::new(&config.storage)
        .await
        .context("Failed to open course store")?;
    let summary = sync::persist(&store, &report.courses).await;
    println!(
        "Saved {} courses and {} assets ({} errors)",
        summary.saved,
        summary.assets_saved,
        summary.failed.len()
    );

    if !summary.is_complete() {
        bail!("{} courses could not be saved", summary.failed.len());
    }
    Ok(())
}

fn check_purchase_urls(report: &ScrapeReport) -> Result<()> {
    let missing = report.missing_purchase_urls();
    if missing.is_empty() {
        return Ok(());
    }
    let ids: Vec<String> = missing.iter().map(ToString::to_string).collect();
    bail!("Courses without a purchase URL: {}", ids.join(", "))
}

async fn handle_collisions(config: &AppConfig, html: Option<&Path>) -> Result<()> {
    let scraper = build_scraper(config)?;
    let page = load_admin_page(&scraper, html).await?;
    let identities = scraper.identities_from_html(&page)?;

    let unique = crate::matching::dedupe_by_id(&identities);
    println!("Total courses found: {}", identities.len());
    println!("Unique courses by ID: {}", unique.len());
    println!();

    let collisions = find_slug_collisions(&identities);
    println!("{}", SlugReport {
        groups: &collisions,
        distinct_ids: true,
    });
    Ok(())
}

async fn handle_duplicates(config: &AppConfig, html: Option<&Path>) -> Result<()> {
    let scraper = build_scraper(config)?;
    let page = load_admin_page(&scraper, html).await?;
    let identities = scraper.identities_from_html(&page)?;

    println!("Found {} total courses", identities.len());
    println!();

    let ids = find_duplicate_ids(&identities);
    println!("{}", DuplicateIdReport { groups: &ids });

    let slugs = find_duplicate_slugs(&identities);
    println!("{}", SlugReport {
        groups: &slugs,
        distinct_ids: false,
    });
    Ok(())
}

async fn handle_descriptions(config: &AppConfig, files: &[PathBuf], dry_run: bool) -> Result<()> {
    let mut descriptions: Vec<StaticDescription> = Vec::new();
    for path in files {
        let html = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let parsed = parse_static_descriptions(&html)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        tracing::info!("{}: {} descriptions", path.display(), parsed.len());
        descriptions.extend(parsed);
    }

    if descriptions.is_empty() {
        bail!("No descriptions found in {} files", files.len());
    }

    if dry_run {
        for entry in &descriptions {
            println!("{} {}: {}", entry.id, entry.title, entry.description);
        }
        println!("[DRY RUN] {} descriptions parsed", descriptions.len());
        return Ok(());
    }

    let store = SqliteCourseStore::new(&config.storage)
        .await
        .context("Failed to open course store")?;
    let summary = sync::apply_descriptions(&store, &descriptions).await;
    println!(
        "Updated {} descriptions ({} unknown ids, {} errors)",
        summary.updated,
        summary.not_found.len(),
        summary.failed.len()
    );

    let coverage = sync::description_coverage(&store)
        .await
        .context("Failed to read description coverage")?;
    println!("{}", CoverageReport {
        coverage: &coverage,
    });

    if !summary.failed.is_empty() {
        bail!("{} descriptions could not be saved", summary.failed.len());
    }
    if summary.updated == 0 {
        bail!("No stored course matched the parsed descriptions");
    }
    Ok(())
}

async fn handle_coverage(config: &AppConfig) -> Result<()> {
    let store = SqliteCourseStore::new(&config.storage)
        .await
        .context("Failed to open course store")?;
    let coverage = sync::description_coverage(&store)
        .await
        .context("Failed to read description coverage")?;
    println!("{}", CoverageReport {
        coverage: &coverage,
    });
    Ok(())
}

fn describe_match(matcher: &TitleMatcher, a: &str, b: &str) -> String {
    let verdict = matcher
        .explain(a, b)
        .map_or_else(|| "no match".to_string(), |rule| format!("match ({rule})"));
    format!(
        "{verdict}\n  a: {:?}\n  b: {:?}",
        normalize_key(a).as_str(),
        normalize_key(b).as_str()
    )
}

fn slug_lines(titles: &[String]) -> Vec<String> {
    titles
        .iter()
        .map(|title| format!("{title} -> {}", slugify(title)))
        .collect()
}
