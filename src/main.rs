//! Binary entry point for facetsearch.
//!
//! Runs searches against the configured engine, prints built requests, and
//! maintains the index.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow needless_pass_by_value for command functions
#![allow(clippy::needless_pass_by_value)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use facetsearch::config::SearchConfig;
use facetsearch::indexer::{Indexer, MapRecord, MemorySource};
use facetsearch::observability;
use facetsearch::services::{
    self, NormalizedRequest, ParamValue, RawParams, ResponseFormat, normalize,
};
use facetsearch::{SearchClient, SearchOutcome};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Facetsearch - faceted full-text search against a Solr-compatible engine.
#[derive(Parser)]
#[command(name = "facetsearch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true, env = "FACETSEARCH_CONFIG_PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Run a search and print the results.
    Search(SearchArgs),

    /// Print the engine parameters a search would send, without sending them.
    Request(SearchArgs),

    /// Remove every document from the index.
    Wipe {
        /// Skip the confirmation check.
        #[arg(long)]
        yes: bool,
    },

    /// Index records from a JSON array file.
    Index {
        /// File holding a JSON array of objects.
        file: PathBuf,

        /// Record type of every record in the file.
        #[arg(short = 't', long = "type")]
        record_type: String,

        /// Field holding each record's id.
        #[arg(long, default_value = "id")]
        id_field: String,

        /// Wipe the index first.
        #[arg(long)]
        wipe: bool,
    },
}

/// Output format for search results.
#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Text summary.
    Text,
    /// Engine response as JSON.
    Json,
}

/// Search parameters, mirroring the web query string.
#[derive(Args)]
struct SearchArgs {
    /// Query text; omit to match everything.
    query: Option<String>,

    /// Filter as `field=value`; repeat a field for multiple values.
    #[arg(short, long = "filter")]
    filters: Vec<String>,

    /// One-based page number.
    #[arg(long)]
    page: Option<u32>,

    /// Rows per page.
    #[arg(long)]
    per_page: Option<u32>,

    /// Sort spec, e.g. "title asc".
    #[arg(long)]
    sort: Option<String>,

    /// Use the literal query grammar.
    #[arg(long)]
    lucene: bool,

    /// Field to facet on; repeatable.
    #[arg(long = "facet")]
    facets: Vec<String>,

    /// Field to group results on.
    #[arg(long)]
    group: Option<String>,

    /// Ignore the given filters.
    #[arg(long)]
    reset_filters: bool,

    /// Output format.
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
}

fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    if let Err(e) = observability::init_from_env(cli.verbose) {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        },
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Search(args) => cmd_search(&config, &args),
        Commands::Request(args) => cmd_request(&config, &args),
        Commands::Wipe { yes } => cmd_wipe(&config, yes),
        Commands::Index {
            file,
            record_type,
            id_field,
            wipe,
        } => cmd_index(&config, &file, &record_type, &id_field, wipe),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<SearchConfig> {
    match path {
        Some(path) => SearchConfig::load_from_file(path)
            .with_context(|| format!("loading config from {}", path.display())),
        None => Ok(SearchConfig::load_default()),
    }
}

/// Builds the same raw parameter bag the web layer would receive.
fn raw_params(args: &SearchArgs) -> anyhow::Result<RawParams> {
    let mut raw = RawParams::new();
    if let Some(query) = &args.query {
        raw.set("q", ParamValue::Text(query.clone()));
    }

    let mut filters = RawParams::new();
    for filter in &args.filters {
        let Some((field, value)) = filter.split_once('=') else {
            bail!("invalid filter '{filter}': expected field=value");
        };
        let next = match filters.remove(field) {
            Some(ParamValue::Text(existing)) => ParamValue::List(vec![existing, value.to_string()]),
            Some(ParamValue::List(mut values)) => {
                values.push(value.to_string());
                ParamValue::List(values)
            },
            _ => ParamValue::Text(value.to_string()),
        };
        filters.set(field, next);
    }
    if !filters.is_empty() {
        raw.set("filters", ParamValue::Map(filters));
    }

    if let Some(page) = args.page {
        raw.set("page", ParamValue::Text(page.to_string()));
    }
    if let Some(per_page) = args.per_page {
        raw.set("per_page", ParamValue::Text(per_page.to_string()));
    }
    if let Some(sort) = &args.sort {
        raw.set("sort", ParamValue::Text(sort.clone()));
    }
    if args.lucene {
        raw.set("lucene", ParamValue::Flag(true));
    }
    if !args.facets.is_empty() {
        raw.set("facet", ParamValue::Flag(true));
        raw.set("facet.field", ParamValue::List(args.facets.clone()));
    }
    if let Some(group) = &args.group {
        raw.set("group", ParamValue::Flag(true));
        raw.set("group.field", ParamValue::Text(group.clone()));
    }
    if args.reset_filters {
        raw.set("reset_filters", ParamValue::Flag(true));
    }
    if matches!(args.format, OutputFormat::Json) {
        raw.set("format", ParamValue::Text("json".to_string()));
    }
    Ok(raw)
}

fn normalized(config: &SearchConfig, args: &SearchArgs) -> anyhow::Result<NormalizedRequest> {
    Ok(normalize(&raw_params(args)?, &config.defaults))
}

fn cmd_search(config: &SearchConfig, args: &SearchArgs) -> anyhow::Result<()> {
    let request = normalized(config, args)?;
    let client = SearchClient::from_config(config);
    let outcome = client.search(&request.options).context("search failed")?;

    match request.format {
        ResponseFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&outcome.raw)?);
        },
        ResponseFormat::Html => print_summary(&request, &outcome),
    }
    Ok(())
}

fn print_summary(request: &NormalizedRequest, outcome: &SearchOutcome) {
    let base = &request.base_href;
    println!("{} hits", outcome.total_found);

    let active = services::active_filters(&request.options.filters, base);
    if !active.is_empty() {
        let labels: Vec<&str> = active.iter().map(services::FilterLink::label).collect();
        println!("Filters: {}", labels.join(", "));
    }

    for doc in &outcome.documents {
        let id = doc.get("id").and_then(serde_json::Value::as_str).unwrap_or("?");
        let title = doc
            .get("title")
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default();
        println!("  {id}  {title}");
    }

    for group in services::facet_options(&outcome.facets, &request.options.filters, base, &[]) {
        println!("{}:", group.heading);
        for (link, count) in &group.links {
            let marker = if link.is_active() { "*" } else { " " };
            println!("  {marker} {} ({count})", link.label());
        }
    }

    if let Some(links) = services::render_pagination(&outcome.pagination, base) {
        let pages: Vec<String> = links
            .pages
            .iter()
            .map(|p| {
                if p.current {
                    format!("[{}]", p.number)
                } else {
                    p.number.to_string()
                }
            })
            .collect();
        let first = if links.first.is_some() { "« " } else { "" };
        let last = if links.last.is_some() { " »" } else { "" };
        println!(
            "Pages: {first}{}{last} of {}",
            pages.join(" "),
            outcome.pagination.total_pages
        );
    }
}

fn cmd_request(config: &SearchConfig, args: &SearchArgs) -> anyhow::Result<()> {
    let request = normalized(config, args)?;
    let built = services::SearchRequestBuilder::new(config).build(&request.options);
    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&built)?),
        OutputFormat::Text => {
            for (key, value) in built.to_params() {
                println!("{key}={value}");
            }
        },
    }
    Ok(())
}

fn cmd_wipe(config: &SearchConfig, yes: bool) -> anyhow::Result<()> {
    if !yes {
        bail!("refusing to wipe {} without --yes", config.endpoint.base_url());
    }
    let client = SearchClient::from_config(config);
    Indexer::new(client.engine(), &config.indexing)
        .wipe_index()
        .context("wipe failed")?;
    println!("Wiped {}", config.endpoint.base_url());
    Ok(())
}

fn cmd_index(
    config: &SearchConfig,
    file: &Path,
    record_type: &str,
    id_field: &str,
    wipe: bool,
) -> anyhow::Result<()> {
    let contents = std::fs::read_to_string(file)
        .with_context(|| format!("reading {}", file.display()))?;
    let values: Vec<serde_json::Value> = serde_json::from_str(&contents)
        .with_context(|| format!("{} is not a JSON array", file.display()))?;

    let mut records = Vec::with_capacity(values.len());
    for (position, value) in values.into_iter().enumerate() {
        let Some(record) = MapRecord::from_json(record_type, id_field, value) else {
            bail!("record {position} is not an object with a '{id_field}' field");
        };
        records.push(record);
    }

    let client = SearchClient::from_config(config);
    let indexer = Indexer::new(client.engine(), &config.indexing);
    let source = MemorySource::new(records);
    let stats = if wipe {
        indexer.wipe_and_reindex_all(&source)
    } else {
        indexer.reindex_all(&source)
    }
    .context("indexing failed")?;

    println!(
        "Indexed {} documents in {} batches",
        stats.documents, stats.batches
    );
    Ok(())
}
