//! Site-Audit main entry point
//!
//! This is the command-line interface for the Site-Audit SEO crawler.

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use site_audit::config::{load_config_with_hash, validate_page_budget, Config, SitemapMode};
use site_audit::crawler::{rescore_site, Coordinator, CrawlOutcome};
use site_audit::output::{load_site_statistics, print_statistics, write_markdown_report};
use site_audit::render::HttpEngineLauncher;
use site_audit::storage::{open_storage, SqliteStorage};
use site_audit::url::{site_root, sitemap_url};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;

/// Site-Audit: an on-page SEO crawler
///
/// Site-Audit crawls a website under a page budget, checks every page against
/// a fixed set of on-page SEO rules, records the issues it finds, and keeps a
/// 0-100 health score per site.
#[derive(Parser, Debug)]
#[command(name = "site-audit")]
#[command(version = "1.0.0")]
#[command(about = "An on-page SEO crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Domain or origin to crawl (e.g. example.com or http://localhost:8080)
    #[arg(long)]
    domain: Option<String>,

    /// Identifier the site's issues are stored under (defaults to the domain)
    #[arg(long)]
    site_id: Option<String>,

    /// Maximum number of pages to visit (defaults to crawler.max-pages)
    #[arg(long)]
    budget: Option<u32>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with_all = ["stats", "export_report", "rescore"])]
    dry_run: bool,

    /// Show issue statistics for the site and exit
    #[arg(long, conflicts_with_all = ["dry_run", "export_report", "rescore"])]
    stats: bool,

    /// Write the markdown audit report for the site and exit
    #[arg(long, conflicts_with_all = ["dry_run", "stats", "rescore"])]
    export_report: bool,

    /// Recompute the site's health score from its unresolved issues and exit
    #[arg(long, conflicts_with_all = ["dry_run", "stats", "export_report"])]
    rescore: bool,

    /// Report destination for --export-report (defaults to output.report-path)
    #[arg(long, requires = "export_report")]
    out: Option<PathBuf>,
}

impl Cli {
    fn site_id(&self) -> Result<String> {
        self.site_id
            .clone()
            .or_else(|| self.domain.clone())
            .ok_or_else(|| anyhow!("Either --site-id or --domain is required"))
    }

    fn domain(&self) -> Result<&str> {
        self.domain
            .as_deref()
            .ok_or_else(|| anyhow!("--domain is required to crawl"))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&cli, &config)
    } else if cli.stats {
        handle_stats(&cli, &config)
    } else if cli.export_report {
        handle_export_report(&cli, &config)
    } else if cli.rescore {
        handle_rescore(&cli, &config)
    } else {
        handle_crawl(&cli, config, config_hash).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("site_audit=info,warn"),
            1 => EnvFilter::new("site_audit=debug,info"),
            2 => EnvFilter::new("site_audit=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn open_database(config: &Config) -> Result<SqliteStorage> {
    open_storage(Path::new(&config.output.database_path))
        .with_context(|| format!("Failed to open database {}", config.output.database_path))
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(cli: &Cli, config: &Config) -> Result<()> {
    let budget = cli.budget.unwrap_or(config.crawler.max_pages);
    validate_page_budget(budget)?;

    println!("=== Site-Audit Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Page budget: {}", budget);
    println!(
        "  Navigation timeout: {}ms",
        config.crawler.navigation_timeout_ms
    );
    println!("  Wait until: {:?}", config.crawler.wait_until);
    println!("  Sitemap: {:?}", config.crawler.sitemap);
    println!("  Follow links: {}", config.crawler.follow_links);
    println!("  Max sitemap files: {}", config.crawler.max_sitemap_files);

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);
    if let Some(report_path) = &config.output.report_path {
        println!("  Report: {}", report_path);
    }

    println!("\n✓ Configuration is valid");

    if let Some(domain) = &cli.domain {
        let root = site_root(domain)?;
        println!("✓ Would crawl {} as site '{}'", root, cli.site_id()?);
        match config.crawler.sitemap {
            SitemapMode::Discover => {
                println!("✓ Would read {} for link discovery", sitemap_url(&root)?)
            }
            SitemapMode::Page => println!("✓ Would audit {} as a page", sitemap_url(&root)?),
            SitemapMode::Off => {}
        }
    }

    Ok(())
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(cli: &Cli, config: &Config) -> Result<()> {
    let site_id = cli.site_id()?;
    println!("Database: {}\n", config.output.database_path);

    let storage = open_database(config)?;
    let stats = load_site_statistics(&storage, &site_id)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the --export-report mode: generates the markdown audit report
fn handle_export_report(cli: &Cli, config: &Config) -> Result<()> {
    let site_id = cli.site_id()?;
    let output_path = cli
        .out
        .clone()
        .or_else(|| config.output.report_path.as_ref().map(PathBuf::from))
        .ok_or_else(|| anyhow!("No report path: pass --out or set output.report-path"))?;

    println!("=== Exporting Audit Report ===\n");
    println!("Database: {}", config.output.database_path);
    println!("Output: {}", output_path.display());
    println!();

    let storage = open_database(config)?;
    write_markdown_report(&storage, &site_id, &output_path)?;

    println!("✓ Report exported to: {}", output_path.display());

    Ok(())
}

/// Handles the --rescore mode: recomputes the stored health score
fn handle_rescore(cli: &Cli, config: &Config) -> Result<()> {
    let site_id = cli.site_id()?;
    let mut storage = open_database(config)?;

    let score = rescore_site(&mut storage, &site_id)?;
    println!("Health score for {}: {}/100", site_id, score);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(cli: &Cli, config: Config, config_hash: String) -> Result<()> {
    let domain = cli.domain()?;
    let site_id = cli.site_id()?;
    let budget = cli.budget.unwrap_or(config.crawler.max_pages);
    let report_path = config.output.report_path.clone();

    let storage = Arc::new(Mutex::new(open_database(&config)?));
    let launcher = Arc::new(HttpEngineLauncher::new(&config.user_agent));
    let coordinator =
        Coordinator::new(config, Arc::clone(&storage), launcher).with_config_hash(config_hash);

    let outcome = coordinator.start_crawl(&site_id, domain, budget).await;
    println!("{}", serde_json::to_string_pretty(&outcome)?);

    match outcome {
        CrawlOutcome::Completed { .. } => {
            if let Some(report_path) = report_path {
                let storage = storage
                    .lock()
                    .map_err(|_| anyhow!("Storage lock poisoned"))?;
                write_markdown_report(&*storage, &site_id, Path::new(&report_path))?;
            }
            Ok(())
        }
        CrawlOutcome::Failed { error } => bail!("Crawl failed: {}", error),
    }
}
