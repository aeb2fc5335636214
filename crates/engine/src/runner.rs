use crate::cycle::{MarketContext, RebalanceEngine, RebalanceOutcome};
use crate::error::EngineError;
use crate::scheduler::{RebalanceScheduler, SchedulerState};
use chrono::NaiveDate;
use indicatif::{ProgressBar, ProgressStyle};
use portfolio::{ExecutionEngine, HoldingsLedger};
use serde::Serialize;
use uuid::Uuid;

/// One row per executed rebalance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleSummary {
    pub anchor: NaiveDate,
    pub selection_date: NaiveDate,
    pub execution_date: NaiveDate,
    pub plan_id: Uuid,
    pub universe: usize,
    pub qualified: usize,
    pub holdings: usize,
    pub vacancies: usize,
    pub exits: usize,
    pub entries: usize,
    pub retains: usize,
}

impl CycleSummary {
    fn new(anchor: NaiveDate, outcome: &RebalanceOutcome) -> Self {
        let report = &outcome.report;
        Self {
            anchor,
            selection_date: report.selection_date,
            execution_date: report.execution_date,
            plan_id: report.plan.plan_id,
            universe: report
                .screening
                .funnel
                .first()
                .map(|stage| stage.input)
                .unwrap_or(0),
            qualified: report.screening.qualified.len(),
            holdings: outcome.after.len(),
            vacancies: report.selection.vacancies.len(),
            exits: report.plan.exits.len(),
            entries: report.plan.entries.len(),
            retains: report.plan.retains.len(),
        }
    }
}

/// Walks a date range day by day, rebalancing whenever the scheduler triggers.
pub struct RebalanceRunner<'a> {
    engine: &'a RebalanceEngine,
    scheduler: RebalanceScheduler,
    show_progress: bool,
}

impl<'a> RebalanceRunner<'a> {
    pub fn new(engine: &'a RebalanceEngine, scheduler: RebalanceScheduler) -> Self {
        Self {
            engine,
            scheduler,
            show_progress: false,
        }
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Runs every triggered cycle between `from` and `to`, both inclusive.
    ///
    /// Stops at the first failed cycle. Holdings committed by earlier cycles stay
    /// committed; the failed one leaves the ledger untouched.
    pub fn run(
        &mut self,
        from: NaiveDate,
        to: NaiveDate,
        market: &MarketContext<'_>,
        ledger: &HoldingsLedger,
        executor: &mut dyn ExecutionEngine,
    ) -> Result<Vec<CycleSummary>, EngineError> {
        if from > to {
            return Err(EngineError::InvalidPeriod { from, to });
        }
        let days: Vec<NaiveDate> = from.iter_days().take_while(|d| *d <= to).collect();

        let progress_bar = if self.show_progress {
            ProgressBar::new(days.len() as u64)
        } else {
            ProgressBar::hidden()
        };
        match ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            Ok(style) => progress_bar.set_style(style.progress_chars("=>-")),
            Err(err) => tracing::debug!("Progress bar template rejected: {}", err),
        }

        let mut summaries = Vec::new();
        for date in days {
            progress_bar.inc(1);
            if !market.calendar.is_trading_day(date) {
                continue;
            }
            let SchedulerState::Trigger { anchor, date } =
                self.scheduler.on_trading_day(date, market.calendar)
            else {
                continue;
            };

            progress_bar.set_message(format!("rebalancing {date}"));
            let outcome = self.engine.run_cycle(date, market, ledger, executor)?;
            let summary = CycleSummary::new(anchor, &outcome);
            tracing::info!(
                anchor = %summary.anchor,
                date = %summary.selection_date,
                holdings = summary.holdings,
                exits = summary.exits,
                entries = summary.entries,
                "Rebalance complete"
            );
            summaries.push(summary);
        }

        progress_bar.finish_with_message(format!("{} rebalances", summaries.len()));
        Ok(summaries)
    }
}
