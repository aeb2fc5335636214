use chrono::NaiveDate;
use configuration::{ScreeningParams, Settings};
use core_types::{
    Holdings, MonthDay, Position, RollConvention, StockSnapshot, Ticker, UniverseSnapshot,
    Untradable,
};
use engine::{
    DatesCalendar, EngineError, MarketContext, RebalanceEngine, RebalanceRunner,
    RebalanceScheduler, WeekdayCalendar,
};
use portfolio::{HoldingsLedger, InstantExecution};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use universe::{InMemoryUniverse, UniverseError};

// ── Fixtures ─────────────────────────────────────────────────────────

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn code(idx: usize) -> String {
    format!("S{idx:03}")
}

/// 100 stocks of which the first 40 clear every factor; S000 ranks best.
fn universe(date: NaiveDate, suspended: &[usize]) -> UniverseSnapshot {
    UniverseSnapshot::new(date, stocks(date, suspended)).unwrap()
}

fn stocks(date: NaiveDate, suspended: &[usize]) -> Vec<StockSnapshot> {
    (0..100)
        .map(|idx| {
            let mut s = StockSnapshot::new(code(idx), date);
            let growth = 0.2 + idx as f64 / 100.0;
            s.ttm_growth = Some(growth);
            s.prior_growth = Some(growth / 2.0);
            s.npap_ratio = Some(0.9);
            s.solvency = Some(0.4);
            s.roe = Some(if idx < 40 { 0.15 } else { 0.0 });
            s.avg_traded_value = Some(1e8 + idx as f64);
            s.analyst_revision = Some((100 - idx) as f64);
            s.analyst_growth = Some((100 - idx) as f64 / 100.0);
            s.suspended = suspended.contains(&idx);
            s
        })
        .collect()
}

/// Relative cuts opened up so that only the absolute ROE threshold bites.
fn settings(execution_lag_days: u32) -> Settings {
    let mut settings = Settings::default();
    settings.screening = ScreeningParams {
        growth_min_percentile: 0.0,
        acceleration_min_percentile: 0.0,
        liquidity_min_percentile: 0.0,
        ..ScreeningParams::default()
    };
    settings.rebalance.execution_lag_days = execution_lag_days;
    settings
}

// ── Cycle ────────────────────────────────────────────────────────────

#[test]
fn hundred_stocks_forty_qualify_thirty_held_two_backfilled() {
    let selection_day = ymd(2024, 7, 15);
    let execution_day = ymd(2024, 7, 16);
    let provider = InMemoryUniverse::new()
        .with(universe(selection_day, &[]))
        .with(universe(execution_day, &[3, 17]));
    let calendar = WeekdayCalendar::default();
    let market = MarketContext {
        universe: &provider,
        tradability: &provider,
        calendar: &calendar,
    };

    let engine = RebalanceEngine::from_settings(&settings(1)).unwrap();
    let ledger = HoldingsLedger::default();
    let outcome = engine
        .run_cycle(selection_day, &market, &ledger, &mut InstantExecution::default())
        .unwrap();
    let report = &outcome.report;

    assert_eq!(report.execution_date, execution_day);
    assert_eq!(report.screening.qualified.len(), 40);
    assert_eq!(report.candidates.len(), 40);
    assert_eq!(report.selection.len(), 30);

    let held = report.selection.tickers();
    assert!(!held.contains(&Ticker::from(code(3))));
    assert!(!held.contains(&Ticker::from(code(17))));
    assert!(held.contains(&Ticker::from(code(30))));
    assert!(held.contains(&Ticker::from(code(31))));
    assert!(!held.contains(&Ticker::from(code(32))));

    assert_eq!(report.plan.target.total_weight(), Decimal::ONE);
    assert_eq!(ledger.snapshot().unwrap(), outcome.after);
    assert_eq!(outcome.after.len(), 30);
}

#[test]
fn name_turning_st_by_execution_day_is_never_held() {
    let selection_day = ymd(2024, 7, 15);
    let execution_day = ymd(2024, 7, 16);
    let mut late = stocks(execution_day, &[]);
    late[0].is_st = true;
    let provider = InMemoryUniverse::new()
        .with(universe(selection_day, &[]))
        .with(UniverseSnapshot::new(execution_day, late).unwrap());
    let calendar = WeekdayCalendar::default();
    let market = MarketContext {
        universe: &provider,
        tradability: &provider,
        calendar: &calendar,
    };

    let engine = RebalanceEngine::from_settings(&settings(1)).unwrap();
    let report = engine
        .prepare(selection_day, &market, &HoldingsLedger::default())
        .unwrap();

    assert_eq!(report.execution_date, execution_day);
    // Clean at selection time, so it is still the top candidate.
    assert_eq!(report.candidates.entries()[0].ticker(), &Ticker::from(code(0)));
    assert!(!report.plan.target.contains(&Ticker::from(code(0))));
    assert_eq!(report.selection.vacancies.len(), 1);
    assert_eq!(report.selection.vacancies[0].reason, Untradable::SpecialTreatment);
    assert!(report.plan.target.contains(&Ticker::from(code(30))));
    assert_eq!(report.plan.target.len(), 30);
}

#[test]
fn provider_failure_leaves_the_ledger_untouched() {
    let provider = InMemoryUniverse::new().with(universe(ymd(2024, 7, 15), &[]));
    let calendar = WeekdayCalendar::default();
    let market = MarketContext {
        universe: &provider,
        tradability: &provider,
        calendar: &calendar,
    };

    let mut existing = Holdings::empty();
    existing.as_of = Some(ymd(2024, 4, 30));
    existing.positions.insert(
        Ticker::from("KEEP"),
        Position {
            weight: dec!(1),
            quantity: dec!(1000),
        },
    );
    let ledger = HoldingsLedger::new(existing.clone());

    let engine = RebalanceEngine::from_settings(&settings(0)).unwrap();
    let result = engine.run_cycle(
        ymd(2024, 8, 30),
        &market,
        &ledger,
        &mut InstantExecution::default(),
    );
    assert!(matches!(
        result,
        Err(EngineError::Universe(UniverseError::Unavailable(_)))
    ));
    assert_eq!(ledger.snapshot().unwrap(), existing);
}

#[test]
fn missing_execution_session_is_an_error() {
    let day = ymd(2024, 7, 15);
    let provider = InMemoryUniverse::new().with(universe(day, &[]));
    let calendar = DatesCalendar::new([day]);
    let market = MarketContext {
        universe: &provider,
        tradability: &provider,
        calendar: &calendar,
    };
    let engine = RebalanceEngine::from_settings(&settings(1)).unwrap();
    let result = engine.prepare(day, &market, &HoldingsLedger::default());
    assert!(matches!(result, Err(EngineError::NoExecutionDate(d)) if d == day));
}

#[test]
fn preparing_twice_gives_the_same_selection() {
    let day = ymd(2024, 7, 15);
    let provider = InMemoryUniverse::new().with(universe(day, &[5]));
    let calendar = WeekdayCalendar::default();
    let market = MarketContext {
        universe: &provider,
        tradability: &provider,
        calendar: &calendar,
    };
    let engine = RebalanceEngine::from_settings(&settings(0)).unwrap();
    let ledger = HoldingsLedger::default();

    let first = engine.prepare(day, &market, &ledger).unwrap();
    let second = engine.prepare(day, &market, &ledger).unwrap();
    assert_eq!(first.candidates, second.candidates);
    assert_eq!(first.selection.tickers(), second.selection.tickers());
    assert_eq!(first.plan.target, second.plan.target);
    // Suspended at selection time: never a candidate.
    assert!(first.candidates.find(&Ticker::from(code(5))).is_none());
    assert!(ledger.snapshot().unwrap().is_empty());
}

// ── Runner ───────────────────────────────────────────────────────────

#[test]
fn weekend_anchor_fires_on_the_next_session() {
    // 2023-07-15 is a Saturday; the cycle must run on Monday the 17th.
    let provider = InMemoryUniverse::new().with(universe(ymd(2023, 7, 17), &[]));
    let calendar = WeekdayCalendar::default();
    let market = MarketContext {
        universe: &provider,
        tradability: &provider,
        calendar: &calendar,
    };

    let engine = RebalanceEngine::from_settings(&settings(0)).unwrap();
    let scheduler = RebalanceScheduler::new(
        vec![MonthDay::new(7, 15).unwrap()],
        RollConvention::Following,
    );
    let ledger = HoldingsLedger::default();
    let summaries = RebalanceRunner::new(&engine, scheduler)
        .run(
            ymd(2023, 7, 1),
            ymd(2023, 7, 31),
            &market,
            &ledger,
            &mut InstantExecution::default(),
        )
        .unwrap();

    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].anchor, ymd(2023, 7, 15));
    assert_eq!(summaries[0].selection_date, ymd(2023, 7, 17));
    assert_eq!(summaries[0].universe, 100);
    assert_eq!(summaries[0].holdings, 30);
    assert_eq!(summaries[0].entries, 30);
    assert_eq!(ledger.snapshot().unwrap().as_of, Some(ymd(2023, 7, 17)));
}

#[test]
fn consecutive_rebalances_retain_overlapping_names() {
    let provider = InMemoryUniverse::new()
        .with(universe(ymd(2024, 4, 30), &[]))
        .with(universe(ymd(2024, 7, 15), &[0]));
    let calendar = WeekdayCalendar::default();
    let market = MarketContext {
        universe: &provider,
        tradability: &provider,
        calendar: &calendar,
    };

    let engine = RebalanceEngine::from_settings(&settings(0)).unwrap();
    let scheduler = RebalanceScheduler::new(
        vec![MonthDay::new(4, 30).unwrap(), MonthDay::new(7, 15).unwrap()],
        RollConvention::Following,
    );
    let ledger = HoldingsLedger::default();
    let summaries = RebalanceRunner::new(&engine, scheduler)
        .run(
            ymd(2024, 4, 1),
            ymd(2024, 7, 31),
            &market,
            &ledger,
            &mut InstantExecution::default(),
        )
        .unwrap();

    assert_eq!(summaries.len(), 2);
    // S000 is suspended in July: it leaves and S030 comes in.
    assert_eq!(summaries[1].exits, 1);
    assert_eq!(summaries[1].entries, 1);
    assert_eq!(summaries[1].retains, 29);
    let held = ledger.snapshot().unwrap();
    assert!(!held.contains(&Ticker::from(code(0))));
    assert!(held.contains(&Ticker::from(code(30))));
}

#[test]
fn reversed_period_is_rejected() {
    let provider = InMemoryUniverse::new();
    let calendar = WeekdayCalendar::default();
    let market = MarketContext {
        universe: &provider,
        tradability: &provider,
        calendar: &calendar,
    };
    let engine = RebalanceEngine::from_settings(&Settings::default()).unwrap();
    let scheduler = RebalanceScheduler::new(Vec::new(), RollConvention::Following);
    let result = RebalanceRunner::new(&engine, scheduler).run(
        ymd(2024, 2, 1),
        ymd(2024, 1, 1),
        &market,
        &HoldingsLedger::default(),
        &mut InstantExecution::default(),
    );
    assert!(matches!(result, Err(EngineError::InvalidPeriod { .. })));
}
