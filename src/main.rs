//! Jobglean main entry point
//!
//! Thin shell around the crawl engine: loads and validates the input
//! document, wires up collaborators, and prints the end-of-run report. A
//! live deployment injects a real headless-browser engine through the
//! library API; this binary drives the engine over saved HTML snapshots.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use jobglean::browser::FixtureBrowser;
use jobglean::config::{load_input, CrawlInput};
use jobglean::crawler::{Collaborators, Coordinator, CrawlRequest, MemoryFrontier};
use jobglean::output::print_report;
use jobglean::storage::{DirSideChannel, JsonlRecordSink};
use tracing_subscriber::EnvFilter;

/// Jobglean: a job-listing crawl orchestration engine
#[derive(Parser, Debug)]
#[command(name = "jobglean")]
#[command(version = "1.0.0")]
#[command(about = "A job-listing crawl orchestration engine", long_about = None)]
struct Cli {
    /// Path to the JSON input document
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate the input and show the seed requests without crawling
    #[arg(long)]
    dry_run: bool,

    /// Drive the engine over saved HTML snapshots from this directory
    /// (expects manifest.json plus the files it references)
    #[arg(long, value_name = "DIR", conflicts_with = "dry_run")]
    fixtures: Option<PathBuf>,

    /// Directory receiving records, diagnostics, and the run stats
    #[arg(short, long, value_name = "DIR", default_value = "./glean-output")]
    output: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading input from: {}", cli.input.display());
    let input = load_input(&cli.input).context("failed to load input document")?;
    let seeds = Coordinator::seed_requests(&input)?;

    if cli.dry_run {
        handle_dry_run(&input, &seeds);
        return Ok(());
    }

    let Some(fixture_dir) = cli.fixtures else {
        anyhow::bail!(
            "no browser engine attached; run with --fixtures <DIR> or embed the \
             crate with a Browser implementation"
        );
    };

    let browser = Arc::new(
        FixtureBrowser::from_manifest(&fixture_dir).context("failed to load fixtures")?,
    );
    std::fs::create_dir_all(&cli.output)?;
    let records = Arc::new(JsonlRecordSink::new(cli.output.join("jobs.jsonl"))?);
    let side_channel = Arc::new(DirSideChannel::new(cli.output.join("side-channel"))?);
    let frontier = Arc::new(MemoryFrontier::new());

    let coordinator = Coordinator::new(
        input,
        Collaborators {
            browser,
            frontier,
            records,
            side_channel,
        },
    );

    let snapshot = coordinator.run(seeds).await?;
    print_report(&snapshot);
    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("jobglean=info,warn"),
            1 => EnvFilter::new("jobglean=debug,info"),
            2 => EnvFilter::new("jobglean=trace,debug"),
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

/// Handles the --dry-run mode: validates input and shows the seed requests
fn handle_dry_run(input: &CrawlInput, seeds: &[CrawlRequest]) {
    println!("=== Jobglean Dry Run ===\n");

    println!("Limits:");
    println!("  Max results: {}", input.max_results);
    println!("  Max concurrency (requested): {}", input.max_concurrency);
    println!("  Max page depth: {}", input.max_page_depth);
    println!(
        "  Delay between requests: {}-{}ms",
        input.min_delay_ms, input.max_delay_ms
    );
    println!("  Debug mode: {}", input.debug_mode);

    if let Some(proxy) = &input.proxy {
        println!("\nProxy (passed through to the browser engine):");
        println!("  Enabled: {}", proxy.use_proxy);
        if !proxy.groups.is_empty() {
            println!("  Groups: {}", proxy.groups.join(", "));
        }
        if let Some(country) = &proxy.country_code {
            println!("  Country: {country}");
        }
    }

    if !input.search_urls.is_empty() {
        println!("\nDirect search URLs ({}):", input.search_urls.len());
        for url in &input.search_urls {
            println!("  - {url}");
        }
    } else {
        println!("\nSearch queries ({}):", input.search_queries.len());
        for query in &input.search_queries {
            println!("  - {query} @ {}", input.location);
        }
    }

    println!("\nSeed requests ({}):", seeds.len());
    for seed in seeds {
        println!("  [{}] {}", seed.kind, seed.url);
    }

    println!("\n✓ Input is valid");
}
