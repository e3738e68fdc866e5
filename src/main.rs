//! IAPD crawler command-line entry point
//!
//! Searches the Investment Adviser Public Disclosure site and fetches
//! firm filings or individual reports, optionally saving the documents.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use iapd_crawler::config::{load_config, Config};
use iapd_crawler::output::{
    format_firm_filings, format_individual_report, format_search_batch, to_json,
};
use iapd_crawler::{Iapd, RetryPolicy, SearchOptions, SearchScope, Target};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// IAPD crawler: investment adviser search and filing downloads
#[derive(Parser, Debug)]
#[command(name = "iapd-crawler")]
#[command(version)]
#[command(about = "Search adviserinfo.sec.gov and download adviser filings", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search firms or individuals by name
    Search {
        /// Name to search for
        term: String,

        /// Search scope: firm or individual
        #[arg(long, default_value = "firm")]
        scope: SearchScope,

        /// Filter by zip code
        #[arg(long)]
        zip: Option<String>,

        /// Radius around the zip code, in miles
        #[arg(long, default_value = "5")]
        zip_range: String,

        /// Current employer (individual searches only)
        #[arg(long)]
        at_firm: Option<String>,

        /// Only keep results hosted on the IAPD site
        #[arg(long)]
        iapd_only: bool,

        /// Stop after this many result pages
        #[arg(long)]
        max_pages: Option<usize>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Form ADV and Part 2 brochure of a firm
    FirmFilings(LookupArgs),

    /// Detailed report of an individual
    IndividualReport(LookupArgs),
}

#[derive(Args, Debug)]
struct LookupArgs {
    /// CRD number
    #[arg(required_unless_present = "url", conflicts_with = "url")]
    crd: Option<u64>,

    /// Profile URL instead of a CRD number
    #[arg(long)]
    url: Option<String>,

    /// Save the documents to disk
    #[arg(long)]
    download: bool,

    /// Directory for downloaded documents
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long)]
    json: bool,
}

impl LookupArgs {
    fn target(&self) -> anyhow::Result<Target> {
        match (self.crd, &self.url) {
            (Some(crd), _) => Ok(Target::Crd(crd)),
            (None, Some(url)) => Ok(Target::Url(url.clone())),
            (None, None) => anyhow::bail!("a CRD number or --url is required"),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?
        }
        None => Config::default(),
    };

    let iapd = Iapd::new(&config).context("Failed to build IAPD client")?;
    let policy = RetryPolicy::from_config(&config.retry);

    match cli.command {
        Command::Search {
            term,
            scope,
            zip,
            zip_range,
            at_firm,
            iapd_only,
            max_pages,
            json,
        } => {
            let options = SearchOptions {
                scope,
                zip_code: zip,
                zip_code_range: zip_range,
                at_firm,
                iapd_only,
                page_limit: max_pages,
            };
            handle_search(&iapd, &policy, &term, &options, json).await
        }
        Command::FirmFilings(args) => handle_firm_filings(&iapd, &policy, &args).await,
        Command::IndividualReport(args) => handle_individual_report(&iapd, &policy, &args).await,
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("iapd_crawler=info,warn"),
            1 => EnvFilter::new("iapd_crawler=debug,info"),
            2 => EnvFilter::new("iapd_crawler=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn handle_search(
    iapd: &Iapd,
    policy: &RetryPolicy,
    term: &str,
    options: &SearchOptions,
    json: bool,
) -> anyhow::Result<()> {
    tracing::info!("Searching {} records for '{}'", options.scope, term);

    let batches = policy
        .run(move || iapd.search_all(term, options.clone()))
        .await
        .with_context(|| format!("Search for '{}' failed", term))?;

    if json {
        println!("{}", to_json(&batches)?);
    } else {
        for (index, batch) in batches.iter().enumerate() {
            println!("{}", format_search_batch(index + 1, batch));
        }
    }

    let total: usize = batches.iter().map(Vec::len).sum();
    tracing::info!("{} results on {} pages", total, batches.len());
    Ok(())
}

async fn handle_firm_filings(
    iapd: &Iapd,
    policy: &RetryPolicy,
    args: &LookupArgs,
) -> anyhow::Result<()> {
    let target = &args.target()?;
    let output_dir = args.output_dir.as_deref();

    let filings = policy
        .run(move || iapd.get_firm_filings(target, args.download, output_dir))
        .await
        .with_context(|| format!("Filing lookup for {} failed", target))?;

    if args.json {
        println!("{}", to_json(&filings)?);
    } else {
        print!("{}", format_firm_filings(&filings));
    }
    Ok(())
}

async fn handle_individual_report(
    iapd: &Iapd,
    policy: &RetryPolicy,
    args: &LookupArgs,
) -> anyhow::Result<()> {
    let target = &args.target()?;
    let output_dir = args.output_dir.as_deref();

    let report = policy
        .run(move || iapd.get_individual_report(target, args.download, output_dir))
        .await
        .with_context(|| format!("Report lookup for {} failed", target))?;

    if args.json {
        println!("{}", to_json(&report)?);
    } else {
        print!("{}", format_individual_report(&report));
    }
    Ok(())
}
