//! `location-explorer` walks the ICDS location hierarchy from the command
//! line, the way the dashboard's location filter does.
//!
//! ```text
//! location-explorer -c explorer.yaml --open b1
//! location-explorer -c explorer.yaml --select "Andhra Pradesh" --select Guntur --json
//! ```

mod config;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use location_selector::{
    HttpLocationDirectory, LocationTree, PeriodFilter, ReportMonth, ReportQuery, Selection,
    SelectionSnapshot,
};
use location_selector_sdk::LocationDirectoryClient;
use serde::Serialize;
use static_ld_plugin::Service;
use tracing_subscriber::EnvFilter;

use config::{AppConfig, LoggingConfig};

/// Walk the ICDS location hierarchy
#[derive(Parser)]
#[command(name = "location-explorer")]
#[command(about = "Walk the ICDS location hierarchy")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Open the tree at this location id (defaults to the user's location)
    #[arg(long)]
    open: Option<String>,

    /// Pick a location by name at the next level; repeatable
    #[arg(long = "select", value_name = "NAME")]
    select: Vec<String>,

    /// Report month, 1-12
    #[arg(long)]
    month: Option<String>,

    /// Report year
    #[arg(long)]
    year: Option<String>,

    /// Print the selection as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct Report<'a> {
    selection: &'a SelectionSnapshot,
    query: &'a ReportQuery,
    disabled_level: Option<String>,
    period_was_reset: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;
    init_logging(&config.logging);

    let directory: Arc<dyn LocationDirectoryClient> = match &config.directory {
        Some(http) => Arc::new(HttpLocationDirectory::new(http)?),
        None => Arc::new(Service::from_config(&config.static_directory)),
    };
    let tree = LocationTree::new(directory, config.location_types(), config.selector.clone())
        .context("invalid location types")?;
    tracing::info!(levels = tree.hierarchy().level_count(), "location tree ready");

    tree.load_root().await?;
    if let Some(location_id) = cli.open.as_ref().or(config.selector.user_location_id.as_ref()) {
        open_location(&tree, location_id)
            .await
            .with_context(|| format!("cannot open location {location_id}"))?;
    }
    for name in &cli.select {
        select_by_name(&tree, name).await?;
    }

    let today = Utc::now().date_naive();
    let period = PeriodFilter::new(config.selector.dashboard).normalize(
        ReportMonth::from_query(cli.month.as_deref(), cli.year.as_deref(), today),
        today,
    );
    let snapshot = tree.snapshot();
    let query = ReportQuery::new(&snapshot, period.month);
    let disabled_level = tree
        .disabled_level()
        .and_then(|level| tree.hierarchy().level_label(level));

    if cli.json {
        let report = Report {
            selection: &snapshot,
            query: &query,
            disabled_level,
            period_was_reset: period.was_reset,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_path(&tree);
    println!("period: {}", period.month);
    if period.was_reset {
        println!("  requested month is outside the report window, showing the current month");
    }
    if let Some(level) = disabled_level {
        println!("no access at level: {level}");
    }
    let levels: Vec<_> = tree
        .aggregation_levels()
        .into_iter()
        .map(|level| level.name)
        .collect();
    println!("aggregation levels: {}", levels.join(" / "));
    Ok(())
}

/// Resolves `location_id` before rebuilding the path from its ancestors.
async fn open_location(tree: &LocationTree, location_id: &str) -> Result<()> {
    let (location, level) = tree.get_location(location_id).await?;
    tracing::info!(
        location_id,
        name = %location.name,
        level = %tree.hierarchy().level_label(level).unwrap_or_default(),
        "opening location"
    );
    let outcome = tree.open_at(location_id).await?;
    tracing::debug!(superseded = outcome.superseded, "opened location");
    Ok(())
}

/// Selects `name` one level below the deepest concrete location.
async fn select_by_name(tree: &LocationTree, name: &str) -> Result<()> {
    let level = tree.selected_location_index().map_or(0, |index| index + 1);
    if level > tree.max_level() {
        anyhow::bail!("cannot select {name}: the deepest level is already selected");
    }

    let options = tree.locations_for_level(level);
    let node = options
        .iter()
        .filter(|option| !option.is_all())
        .find(|option| option.name.eq_ignore_ascii_case(name))
        .cloned()
        .with_context(|| {
            let label = tree.hierarchy().level_label(level).unwrap_or_default();
            format!("no {label} named {name}")
        })?;
    if !node.is_selectable() {
        anyhow::bail!("{} is not accessible", node.name);
    }

    let outcome = tree.select(node, level).await?;
    tracing::debug!(level, superseded = outcome.superseded, "selected by name");
    Ok(())
}

fn print_path(tree: &LocationTree) {
    let path = tree.path();
    for level in 0..path.len() {
        if !tree.is_level_visible(level) {
            break;
        }
        let label = tree.hierarchy().level_label(level).unwrap_or_default();
        let value = match path.get(level) {
            Some(Selection::Location(node)) => node.name.as_str(),
            Some(Selection::All) => {
                if level == 0 {
                    tree.config().national_label.as_str()
                } else {
                    tree.config().all_label.as_str()
                }
            }
            None => "-",
        };
        let lock = if tree.is_level_locked(level) { " (locked)" } else { "" };
        println!("{label}: {value}{lock}");
    }
}

fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if config.json {
        builder.json().init();
    } else {
        builder.init();
    }
}
