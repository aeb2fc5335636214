use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use comfy_table::{Table, presets::UTF8_FULL};
use configuration::Settings;
use engine::{
    CycleReport, CycleSummary, DatesCalendar, MarketContext, RebalanceEngine, RebalanceRunner,
    RebalanceScheduler, TradingCalendar, WeekdayCalendar,
};
use portfolio::{HoldingsLedger, InstantExecution};
use rust_decimal::Decimal;
use std::path::PathBuf;
use universe::{CsvUniverse, UniverseProvider};

/// The main entry point for the Resonance selection engine.
fn main() -> Result<()> {
    // A missing .env file is fine; it only carries optional overrides.
    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => configuration::load_config_from(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => configuration::load_config().context("Failed to load configuration")?,
    };
    let _log_guard =
        configuration::init_tracing(&settings.logging).context("Failed to initialise logging")?;

    // Execute the appropriate command
    match cli.command {
        Commands::Select(args) => handle_select(args, &settings, cli.json),
        Commands::Run(args) => handle_run(args, &settings, cli.json),
        Commands::Calendar(args) => handle_calendar(args, &settings, cli.json),
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Growth/trend resonance stock selection: factor screening and portfolio reconstruction.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (defaults to ./config.toml when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print machine-readable JSON instead of tables.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one selection cycle on a date and print the resulting plan.
    Select(SelectArgs),
    /// Walk a date range, rebalancing on every scheduled date.
    Run(RunArgs),
    /// Show the rebalance dates of a year after rolling onto trading days.
    Calendar(CalendarArgs),
}

#[derive(Parser)]
struct SelectArgs {
    /// Selection date (format: YYYY-MM-DD).
    #[arg(long)]
    date: NaiveDate,

    /// How many ranked candidates to print.
    #[arg(long, default_value_t = 40)]
    show: usize,
}

#[derive(Parser)]
struct RunArgs {
    /// First day of the run (format: YYYY-MM-DD).
    #[arg(long)]
    from: NaiveDate,

    /// Last day of the run, inclusive (format: YYYY-MM-DD).
    #[arg(long)]
    to: NaiveDate,

    /// Hide the progress bar.
    #[arg(long)]
    quiet: bool,
}

#[derive(Parser)]
struct CalendarArgs {
    #[arg(long)]
    year: i32,

    /// Use the dates present in the data file as the trading calendar.
    #[arg(long)]
    from_data: bool,
}

// ==============================================================================
// Command Logic
// ==============================================================================

fn open_universe(settings: &Settings) -> Result<CsvUniverse> {
    CsvUniverse::open(&settings.data).with_context(|| {
        format!(
            "Failed to open universe data at {}",
            settings.data.path.display()
        )
    })
}

fn handle_select(args: SelectArgs, settings: &Settings, json: bool) -> Result<()> {
    let provider = open_universe(settings)?;
    let calendar = DatesCalendar::new(provider.available_dates());
    let market = MarketContext {
        universe: &provider,
        tradability: &provider,
        calendar: &calendar,
    };

    let engine = RebalanceEngine::from_settings(settings)?;
    let ledger = HoldingsLedger::default();
    let report = engine
        .prepare(args.date, &market, &ledger)
        .with_context(|| format!("Selection cycle for {} failed", args.date))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report, args.show);
    }
    Ok(())
}

fn handle_run(args: RunArgs, settings: &Settings, json: bool) -> Result<()> {
    let provider = open_universe(settings)?;
    let calendar = DatesCalendar::new(provider.available_dates());
    let market = MarketContext {
        universe: &provider,
        tradability: &provider,
        calendar: &calendar,
    };

    let engine = RebalanceEngine::from_settings(settings)?;
    let scheduler =
        RebalanceScheduler::new(settings.rebalance.dates.clone(), settings.rebalance.roll);
    let ledger = HoldingsLedger::default();
    let mut executor = InstantExecution::default();
    tracing::info!(from = %args.from, to = %args.to, top_n = engine.top_n(), "Starting run");

    let summaries = RebalanceRunner::new(&engine, scheduler)
        .with_progress(!args.quiet && !json)
        .run(args.from, args.to, &market, &ledger, &mut executor)
        .with_context(|| format!("Run from {} to {} failed", args.from, args.to))?;

    let holdings = ledger.snapshot()?;
    if json {
        let output = serde_json::json!({ "rebalances": summaries, "holdings": holdings });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    print_summaries(&summaries);
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Ticker", "Weight", "Quantity"]);
    for (ticker, position) in &holdings.positions {
        table.add_row(vec![
            ticker.to_string(),
            format_weight(position.weight),
            position.quantity.round_dp(2).to_string(),
        ]);
    }
    match holdings.as_of {
        Some(date) => println!("\nHoldings as of {date}:"),
        None => println!("\nNo rebalance was triggered; holdings are empty."),
    }
    println!("{table}");
    Ok(())
}

fn handle_calendar(args: CalendarArgs, settings: &Settings, json: bool) -> Result<()> {
    let calendar: Box<dyn TradingCalendar> = if args.from_data {
        Box::new(DatesCalendar::new(open_universe(settings)?.available_dates()))
    } else {
        Box::new(WeekdayCalendar::from_settings(&settings.calendar))
    };
    let scheduler =
        RebalanceScheduler::new(settings.rebalance.dates.clone(), settings.rebalance.roll);
    let resolved = scheduler.resolve_year(args.year, calendar.as_ref());

    if json {
        println!("{}", serde_json::to_string_pretty(&resolved)?);
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Anchor", "Rebalance date", "Rolled"]);
    for entry in &resolved {
        table.add_row(vec![
            entry.anchor.to_string(),
            entry
                .date
                .map(|d| d.to_string())
                .unwrap_or_else(|| "no session".to_string()),
            (if entry.is_substituted() { "yes" } else { "" }).to_string(),
        ]);
    }
    println!("Rebalance calendar for {} ({} roll):", args.year, scheduler.roll());
    println!("{table}");
    Ok(())
}

// ==============================================================================
// Output
// ==============================================================================

fn format_weight(weight: Decimal) -> String {
    format!("{}%", (weight * Decimal::ONE_HUNDRED).round_dp(2))
}

fn print_report(report: &CycleReport, show: usize) {
    println!(
        "Selection {} (orders on {})",
        report.selection_date, report.execution_date
    );

    let mut funnel = Table::new();
    funnel
        .load_preset(UTF8_FULL)
        .set_header(vec!["Stage", "In", "Passed", "Eliminated"]);
    for stage in &report.screening.funnel {
        funnel.add_row(vec![
            stage.stage.to_string(),
            stage.input.to_string(),
            stage.passed.to_string(),
            stage.eliminated().to_string(),
        ]);
    }
    println!("{funnel}");

    let mut candidates = Table::new();
    candidates.load_preset(UTF8_FULL).set_header(vec![
        "Rank",
        "Ticker",
        "Composite",
        "TTM growth",
        "Growth pct",
        "Revision",
        "Forecast",
        "Held",
    ]);
    for candidate in report.candidates.iter().take(show) {
        let held = report.plan.target.contains(candidate.ticker());
        candidates.add_row(vec![
            candidate.rank.to_string(),
            candidate.ticker().to_string(),
            format!("{:.2}", candidate.composite),
            format!("{:.4}", candidate.scores.ttm_growth),
            format!("{:.3}", candidate.scores.growth_percentile),
            format!("{:.4}", candidate.scores.analyst_revision),
            format!("{:.4}", candidate.scores.analyst_growth),
            (if held { "*" } else { "" }).to_string(),
        ]);
    }
    println!("{candidates}");

    for vacancy in &report.selection.vacancies {
        println!(
            "Vacancy: #{} {} is {} on {}",
            vacancy.rank, vacancy.ticker, vacancy.reason, report.execution_date
        );
    }

    let plan = &report.plan;
    println!(
        "Plan {}: {} holdings at {} each, exposure {}",
        plan.plan_id,
        plan.target.len(),
        plan.target
            .weights()
            .values()
            .last()
            .map(|w| format_weight(*w))
            .unwrap_or_else(|| "-".to_string()),
        format_weight(plan.target_exposure),
    );
}

fn print_summaries(summaries: &[CycleSummary]) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec![
        "Anchor",
        "Selected on",
        "Executed on",
        "Universe",
        "Qualified",
        "Holdings",
        "Vacancies",
        "Exits",
        "Entries",
        "Retains",
    ]);
    for s in summaries {
        table.add_row(vec![
            s.anchor.to_string(),
            s.selection_date.to_string(),
            s.execution_date.to_string(),
            s.universe.to_string(),
            s.qualified.to_string(),
            s.holdings.to_string(),
            s.vacancies.to_string(),
            s.exits.to_string(),
            s.entries.to_string(),
            s.retains.to_string(),
        ]);
    }
    println!("{table}");
}
