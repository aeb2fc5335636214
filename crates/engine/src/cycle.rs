use crate::calendar::TradingCalendar;
use crate::error::EngineError;
use chrono::NaiveDate;
use configuration::Settings;
use core_types::{ExecutionTradability, Holdings, SnapshotTradability};
use portfolio::{
    ExecutionEngine, FinalSelection, HoldingsLedger, PortfolioConstructor, TransitionPlan,
    VacancyResolver,
};
use screener::{CandidateList, CompositeRanker, ScreeningOutcome, ScreeningPipeline};
use serde::Serialize;
use universe::UniverseProvider;

/// The outside world a cycle reads from.
pub struct MarketContext<'a> {
    pub universe: &'a dyn UniverseProvider,
    /// Live status on the execution date.
    pub tradability: &'a dyn ExecutionTradability,
    pub calendar: &'a dyn TradingCalendar,
}

/// Everything one rebalance cycle produced, up to the plan handed to execution.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub selection_date: NaiveDate,
    pub execution_date: NaiveDate,
    pub screening: ScreeningOutcome,
    pub candidates: CandidateList,
    pub selection: FinalSelection,
    pub plan: TransitionPlan,
    /// The holdings the plan was built against.
    pub before: Holdings,
}

/// A cycle that went all the way through execution.
#[derive(Debug, Clone, Serialize)]
pub struct RebalanceOutcome {
    pub report: CycleReport,
    pub after: Holdings,
}

/// Wires screening, ranking, vacancy resolution and portfolio construction into
/// one rebalance cycle.
#[derive(Debug, Clone)]
pub struct RebalanceEngine {
    pipeline: ScreeningPipeline,
    ranker: CompositeRanker,
    resolver: VacancyResolver,
    constructor: PortfolioConstructor,
    execution_lag_days: u32,
}

impl RebalanceEngine {
    pub fn new(
        pipeline: ScreeningPipeline,
        ranker: CompositeRanker,
        resolver: VacancyResolver,
        constructor: PortfolioConstructor,
        execution_lag_days: u32,
    ) -> Self {
        Self {
            pipeline,
            ranker,
            resolver,
            constructor,
            execution_lag_days,
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, EngineError> {
        Ok(Self::new(
            ScreeningPipeline::new(settings.screening.clone()),
            CompositeRanker::new(settings.ranking.clone()),
            VacancyResolver::new(settings.rebalance.top_n),
            PortfolioConstructor::new(settings.rebalance.cash_reserve)?,
            settings.rebalance.execution_lag_days,
        ))
    }

    pub fn top_n(&self) -> usize {
        self.resolver.top_n()
    }

    /// Runs a cycle up to the transition plan without touching the holdings.
    pub fn prepare(
        &self,
        selection_date: NaiveDate,
        market: &MarketContext<'_>,
        ledger: &HoldingsLedger,
    ) -> Result<CycleReport, EngineError> {
        // 1. Snapshot. Nothing has been read from the ledger yet if this fails.
        let universe = market.universe.snapshot(selection_date)?;

        // 2. Screen and rank against this snapshot only.
        let screening = self.pipeline.screen(&universe, &SnapshotTradability);
        let candidates = self.ranker.rank(&screening);

        // 3. Re-check tradability when the orders would actually go out.
        let execution_date = market
            .calendar
            .offset(selection_date, self.execution_lag_days)
            .ok_or(EngineError::NoExecutionDate(selection_date))?;
        let selection = self
            .resolver
            .resolve(&candidates, execution_date, market.tradability);

        // 4. Plan against one consistent view of the holdings.
        let before = ledger.snapshot()?;
        let plan = self.constructor.construct(&selection, &before);

        tracing::info!(
            selection_date = %selection_date,
            execution_date = %execution_date,
            universe = universe.len(),
            qualified = screening.qualified.len(),
            selected = selection.len(),
            vacancies = selection.vacancies.len(),
            "Rebalance cycle prepared"
        );

        Ok(CycleReport {
            selection_date,
            execution_date,
            screening,
            candidates,
            selection,
            plan,
            before,
        })
    }

    /// Runs a full cycle and commits the executed holdings.
    ///
    /// Any failure before the commit leaves the ledger exactly as it was.
    pub fn run_cycle(
        &self,
        selection_date: NaiveDate,
        market: &MarketContext<'_>,
        ledger: &HoldingsLedger,
        executor: &mut dyn ExecutionEngine,
    ) -> Result<RebalanceOutcome, EngineError> {
        let report = self.prepare(selection_date, market, ledger)?;
        let after = executor.execute(&report.plan, &report.before)?;
        ledger.commit(after.clone())?;
        Ok(RebalanceOutcome { report, after })
    }
}
