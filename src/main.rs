// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{bail, Context, Result};
use cost_of_living::{
    load_from_config, logging, Dashboard, DashboardConfig, IndicatorCatalog, Selection,
};
use dotenvy::dotenv;
use std::env;
use std::sync::Arc;

fn main() -> Result<()> {
    dotenv().ok();
    let config = DashboardConfig::from_env()?;
    let args: Vec<String> = env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("view") => run_view(&config, &args[2..], false),
        Some("compare") => run_view(&config, &args[2..], true),
        Some("indicators") => run_indicators(&config),
        _ => run_ui_mode(&config),
    }
}

/// Load the table and wrap it in a dashboard; any load error is fatal
fn load_dashboard(config: &DashboardConfig) -> Result<Dashboard> {
    eprintln!("📂 Loading datasets from {}...", config.data_dir.display());

    let catalog = IndicatorCatalog::standard();
    let table = load_from_config(config, &catalog).context("Failed to load dataset")?;
    let bounds = table.bounds();
    eprintln!(
        "✓ Loaded {} years ({} - {})",
        table.len(),
        bounds.min_year,
        bounds.max_year
    );

    Ok(Dashboard::new(Arc::new(table), catalog, config.variant))
}

fn parse_year_arg(raw: Option<&String>, what: &str) -> Result<i32> {
    let raw = match raw {
        Some(raw) => raw,
        None => bail!("missing {}", what),
    };
    raw.trim()
        .parse()
        .with_context(|| format!("{} must be a year, got '{}'", what, raw))
}

/// `view <start> <end> [indicator]` or `compare <a> <b> [indicator]`
fn run_view(config: &DashboardConfig, args: &[String], pair: bool) -> Result<()> {
    logging::init_logging(config, "warn")?;

    let usage = if pair {
        "usage: cost-of-living compare <year-a> <year-b> [indicator]"
    } else {
        "usage: cost-of-living view <start> <end> [indicator]"
    };
    let first = parse_year_arg(args.first(), "first year").context(usage)?;
    let second = parse_year_arg(args.get(1), "second year").context(usage)?;

    let dashboard = load_dashboard(config)?;

    let mut selection = if pair {
        Selection::pair(first, second)
    } else {
        Selection::range(first, second)
    };
    if let Some(name) = args.get(2) {
        selection = selection.with_indicator(name.as_str());
    } else if let Some(default) = config.variant.default_indicator() {
        selection = selection.with_indicator(default.name());
    }

    let view = dashboard.render(&selection);
    println!("{}", serde_json::to_string_pretty(&view)?);

    Ok(())
}

fn run_indicators(config: &DashboardConfig) -> Result<()> {
    let catalog = IndicatorCatalog::standard();
    let selectable = config.variant.selectable();

    println!("📊 Indicators ({:?} layout)", config.variant);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for spec in catalog.list_all() {
        let marker = if selectable.contains(&spec.indicator) { "●" } else { "○" };
        println!(
            "{} {:<24} {:<13} {:<22} {}",
            marker,
            spec.indicator.name(),
            spec.indicator.code(),
            spec.series_id,
            spec.axis_title
        );
    }

    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(config: &DashboardConfig) -> Result<()> {
    logging::init_logging(config, "warn")?;

    println!("🖥️  Loading Cost of Living Dashboard...\n");

    let dashboard = match load_dashboard(config) {
        Ok(dashboard) => dashboard,
        Err(e) => {
            eprintln!("❌ {:#}", e);
            eprintln!("   Set COL_DATA_DIR to the folder holding the indicator CSV files.");
            std::process::exit(1);
        }
    };

    println!("Starting UI... (Press 'q' to quit)\n");

    let mut app = ui::App::new(dashboard, config.region.clone());
    ui::run_ui(&mut app)?;

    println!("\n✅ UI closed successfully");

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_config: &DashboardConfig) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the web UI: cargo run --bin col-server --features server");
    eprintln!("   Or query directly: cost-of-living view <start> <end> [indicator]");
    std::process::exit(1);
}
