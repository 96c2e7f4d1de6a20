//! websearch: command-line front end for the provider router

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;
use websearch_router::{
    config::{redacted_credentials, Credentials, Settings},
    diagnostics::Diagnostics,
    results::SearchResponse,
    search::{Router, SearchRequest},
};

/// Search the web through Serper or Tavily
#[derive(Debug, Parser)]
#[command(name = "websearch", version, about)]
struct Cli {
    /// Search query
    #[arg(required_unless_present = "show_config")]
    query: Option<String>,

    /// Maximum number of results (defaults to search.default_num_results)
    #[arg(short = 'n', long)]
    num_results: Option<u32>,

    /// Path to settings.yml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Record a per-request diagnostic trace and include it in the output
    #[arg(long)]
    diagnostics: bool,

    /// Print the effective configuration (secrets redacted) and exit
    #[arg(long)]
    show_config: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Logs go to stderr; stdout carries the JSON results
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    info!("Starting websearch v{}", websearch_router::VERSION);

    let mut settings = load_settings(cli.config.as_deref())?;
    if cli.diagnostics {
        settings.diagnostics.enabled = true;
    }
    settings.validate()?;

    let credentials = Credentials::from_env();

    if cli.show_config {
        print_config(&settings)?;
        return Ok(());
    }

    let query = cli.query.context("a search query is required")?;
    let request = SearchRequest::new(query).with_num_results(
        cli.num_results
            .unwrap_or(settings.search.default_num_results),
    );

    let router =
        Router::from_settings(&settings, credentials).context("failed to build router")?;

    // Entries are also logged as they are emitted, so a failed search keeps its trace
    let mut diagnostics = Diagnostics::new(settings.diagnostics.enabled);
    let report = match router.route_traced(&request, &mut diagnostics).await {
        Ok(report) => report,
        Err(e) => anyhow::bail!(e.safe_display(router.credentials())),
    };
    info!(
        "{} results from {} (request {})",
        report.results.len(),
        report.served_by,
        report.request_id
    );

    let mut response = SearchResponse::from(report.results);
    if diagnostics.is_enabled() {
        response = response.with_diagnostics(diagnostics.into_entries());
    }
    println!("{}", serde_json::to_string_pretty(&response)?);

    Ok(())
}

/// Load settings from file or use defaults
fn load_settings(explicit: Option<&std::path::Path>) -> Result<Settings> {
    if let Some(path) = explicit {
        info!("Loading settings from: {}", path.display());
        let mut settings = Settings::from_file(path)?;
        settings.merge_env();
        return Ok(settings);
    }

    // Check environment variable first
    if let Ok(path) = std::env::var("WEBSEARCH_SETTINGS_PATH") {
        let path = PathBuf::from(path);
        if path.exists() {
            info!("Loading settings from: {}", path.display());
            let mut settings = Settings::from_file(&path)?;
            settings.merge_env();
            return Ok(settings);
        }
    }

    let mut paths = vec![
        PathBuf::from("settings.yml"),
        PathBuf::from("config/settings.yml"),
    ];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("websearch-router/settings.yml"));
    }

    for path in paths.iter() {
        if path.exists() {
            info!("Loading settings from: {}", path.display());
            let mut settings = Settings::from_file(path)?;
            settings.merge_env();
            return Ok(settings);
        }
    }

    info!("No settings file found, using defaults");
    let mut settings = Settings::default();
    settings.merge_env();
    Ok(settings)
}

fn print_config(settings: &Settings) -> Result<()> {
    println!("{}", serde_yaml::to_string(settings)?);

    println!("credentials:");
    for (var, shown) in redacted_credentials(|name| std::env::var(name).ok()) {
        println!("  {}: {}", var, shown);
    }

    Ok(())
}
