use chrono::NaiveDate;
use configuration::ScreeningParams;
use core_types::{ScreeningTradability, StockSnapshot, Ticker, UniverseSnapshot, Untradable};
use factors::{Factor, FactorCalculator, FactorError, FactorInputs, FactorScoreSet};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Filter Stage
// ============================================================================

/// Screening stages, in the order they are applied.
///
/// Identity and status exclusions run before the factor stage so that excluded
/// names never enter the percentile bases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterStage {
    /// Special-treatment (ST) stocks.
    SpecialTreatment,
    /// Stocks with a recent equity financing event.
    EquityFinancing,
    /// Stocks with a missing or malformed factor input.
    DataQuality,
    /// The factor thresholds, all of which must pass.
    Factors,
    /// Stocks suspended or limit-locked on the snapshot date. Only this period is lost.
    Tradability,
}

impl FilterStage {
    pub const ALL: [FilterStage; 5] = [
        FilterStage::SpecialTreatment,
        FilterStage::EquityFinancing,
        FilterStage::DataQuality,
        FilterStage::Factors,
        FilterStage::Tradability,
    ];
}

impl fmt::Display for FilterStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SpecialTreatment => write!(f, "special treatment"),
            Self::EquityFinancing => write!(f, "equity financing"),
            Self::DataQuality => write!(f, "data quality"),
            Self::Factors => write!(f, "factors"),
            Self::Tradability => write!(f, "tradability"),
        }
    }
}

/// Counts for one stage of the funnel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageReport {
    pub stage: FilterStage,
    pub input: usize,
    pub passed: usize,
}

impl StageReport {
    pub fn eliminated(&self) -> usize {
        self.input.saturating_sub(self.passed)
    }
}

// ============================================================================
// Rejections
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RejectionReason {
    SpecialTreatment,
    EquityFinancing,
    /// The factor input that was missing or not finite.
    MissingData(String),
    FailedFactors(Vec<Factor>),
    Untradable(Untradable),
}

impl RejectionReason {
    pub fn stage(&self) -> FilterStage {
        match self {
            Self::SpecialTreatment => FilterStage::SpecialTreatment,
            Self::EquityFinancing => FilterStage::EquityFinancing,
            Self::MissingData(_) => FilterStage::DataQuality,
            Self::FailedFactors(_) => FilterStage::Factors,
            Self::Untradable(_) => FilterStage::Tradability,
        }
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SpecialTreatment => write!(f, "ST"),
            Self::EquityFinancing => write!(f, "recent equity financing"),
            Self::MissingData(field) => write!(f, "missing {field}"),
            Self::FailedFactors(failed) => {
                let names: Vec<String> = failed.iter().map(ToString::to_string).collect();
                write!(f, "failed {}", names.join(", "))
            }
            Self::Untradable(why) => write!(f, "{why}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rejection {
    pub ticker: Ticker,
    pub reason: RejectionReason,
}

// ============================================================================
// Outcome
// ============================================================================

/// Result of screening one universe: the qualified set (unranked) plus an account of
/// everything that was dropped and where.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreeningOutcome {
    pub date: NaiveDate,
    /// Score sets of every stock that cleared all stages, in ticker order.
    pub qualified: Vec<FactorScoreSet>,
    pub rejections: Vec<Rejection>,
    pub funnel: Vec<StageReport>,
}

impl ScreeningOutcome {
    pub fn rejected_at(&self, stage: FilterStage) -> impl Iterator<Item = &Rejection> {
        self.rejections
            .iter()
            .filter(move |r| r.reason.stage() == stage)
    }

    pub fn rejection_of(&self, ticker: &Ticker) -> Option<&RejectionReason> {
        self.rejections
            .iter()
            .find(|r| &r.ticker == ticker)
            .map(|r| &r.reason)
    }
}

// ============================================================================
// Pipeline
// ============================================================================

/// Reduces a universe to the stocks that qualify for ranking.
#[derive(Debug, Clone)]
pub struct ScreeningPipeline {
    calculator: FactorCalculator,
}

impl ScreeningPipeline {
    pub fn new(params: ScreeningParams) -> Self {
        Self {
            calculator: FactorCalculator::new(params),
        }
    }

    /// Runs every stage over `universe`.
    ///
    /// The factor percentiles are computed once, over every stock that survived the
    /// identity, status and data-quality stages, so each relative threshold is
    /// measured against the same base.
    pub fn screen<T>(&self, universe: &UniverseSnapshot, tradability: &T) -> ScreeningOutcome
    where
        T: ScreeningTradability + ?Sized,
    {
        let mut rejections = Vec::new();
        let mut funnel = Vec::with_capacity(FilterStage::ALL.len());

        // 1. Special treatment
        let survivors = retain(
            universe.stocks().iter().collect(),
            FilterStage::SpecialTreatment,
            &mut funnel,
            &mut rejections,
            |s| s.is_st.then_some(RejectionReason::SpecialTreatment),
        );

        // 2. Equity financing
        let survivors = retain(
            survivors,
            FilterStage::EquityFinancing,
            &mut funnel,
            &mut rejections,
            |s| s.recent_financing.then_some(RejectionReason::EquityFinancing),
        );

        // 3. Data quality: gaps are screening failures, never fatal.
        let mut base: Vec<(&StockSnapshot, FactorInputs)> = Vec::with_capacity(survivors.len());
        for &snapshot in &survivors {
            match FactorInputs::from_snapshot(snapshot) {
                Ok(inputs) => base.push((snapshot, inputs)),
                Err(err) => {
                    tracing::debug!("Screened out: {}", err);
                    let field = match err {
                        FactorError::MissingInput { field, .. }
                        | FactorError::NonFinite { field, .. } => field,
                    };
                    rejections.push(Rejection {
                        ticker: snapshot.ticker.clone(),
                        reason: RejectionReason::MissingData(field.to_string()),
                    });
                }
            }
        }
        record(&mut funnel, FilterStage::DataQuality, survivors.len(), base.len());

        // 4. Factors, against this universe's own percentile bases.
        let inputs: Vec<FactorInputs> = base.iter().map(|(_, i)| i.clone()).collect();
        let scores = self.calculator.compute(&inputs);
        let mut scored: Vec<(&StockSnapshot, FactorScoreSet)> = Vec::with_capacity(scores.len());
        for ((snapshot, _), score) in base.into_iter().zip(scores) {
            if score.passes.all() {
                scored.push((snapshot, score));
            } else {
                rejections.push(Rejection {
                    ticker: snapshot.ticker.clone(),
                    reason: RejectionReason::FailedFactors(score.passes.failures()),
                });
            }
        }
        record(&mut funnel, FilterStage::Factors, inputs.len(), scored.len());

        // 5. Selection-time tradability.
        let before = scored.len();
        let mut qualified = Vec::with_capacity(before);
        for (snapshot, score) in scored {
            match tradability.check(snapshot) {
                Ok(()) => qualified.push(score),
                Err(why) => rejections.push(Rejection {
                    ticker: snapshot.ticker.clone(),
                    reason: RejectionReason::Untradable(why),
                }),
            }
        }
        record(&mut funnel, FilterStage::Tradability, before, qualified.len());

        tracing::info!(
            date = %universe.date(),
            universe = universe.len(),
            qualified = qualified.len(),
            "Screening complete"
        );

        ScreeningOutcome {
            date: universe.date(),
            qualified,
            rejections,
            funnel,
        }
    }
}

fn retain<'a>(
    stocks: Vec<&'a StockSnapshot>,
    stage: FilterStage,
    funnel: &mut Vec<StageReport>,
    rejections: &mut Vec<Rejection>,
    reject: impl Fn(&StockSnapshot) -> Option<RejectionReason>,
) -> Vec<&'a StockSnapshot> {
    let input = stocks.len();
    let mut kept = Vec::with_capacity(input);
    for snapshot in stocks {
        match reject(snapshot) {
            Some(reason) => rejections.push(Rejection {
                ticker: snapshot.ticker.clone(),
                reason,
            }),
            None => kept.push(snapshot),
        }
    }
    record(funnel, stage, input, kept.len());
    kept
}

fn record(funnel: &mut Vec<StageReport>, stage: FilterStage, input: usize, passed: usize) {
    let report = StageReport { stage, input, passed };
    tracing::debug!(
        stage = %stage,
        input,
        passed,
        eliminated = report.eliminated(),
        "Filter stage applied"
    );
    funnel.push(report);
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::SnapshotTradability;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, 15).unwrap()
    }

    fn healthy(ticker: &str, growth: f64) -> StockSnapshot {
        let mut s = StockSnapshot::new(ticker, date());
        s.ttm_growth = Some(growth);
        // Halving keeps the acceleration exact, so it orders like growth.
        s.prior_growth = Some(growth / 2.0);
        s.npap_ratio = Some(0.9);
        s.solvency = Some(0.3);
        s.roe = Some(0.15);
        s.avg_traded_value = Some(1e8);
        s.analyst_revision = Some(0.01);
        s.analyst_growth = Some(0.2);
        s
    }

    #[test]
    fn funnel_accounts_for_every_stock() {
        let mut st = healthy("ST1", 0.9);
        st.is_st = true;
        let mut financed = healthy("FIN", 0.9);
        financed.recent_financing = true;
        let mut gap = healthy("GAP", 0.9);
        gap.roe = None;
        let mut halted = healthy("HALT", 0.9);
        halted.suspended = true;

        let universe = UniverseSnapshot::new(
            date(),
            vec![st, financed, gap, halted, healthy("OK", 0.9)],
        )
        .unwrap();
        // HALT and OK tie on every factor; drop the growth cut so both clear it.
        let params = ScreeningParams {
            growth_min_percentile: 0.0,
            ..ScreeningParams::default()
        };
        let pipeline = ScreeningPipeline::new(params);
        let outcome = pipeline.screen(&universe, &SnapshotTradability);

        assert_eq!(outcome.qualified.len(), 1);
        assert_eq!(outcome.qualified[0].ticker.as_str(), "OK");
        assert_eq!(outcome.funnel.len(), 5);
        let eliminated: usize = outcome.funnel.iter().map(StageReport::eliminated).sum();
        assert_eq!(eliminated + outcome.qualified.len(), universe.len());

        assert_eq!(
            outcome.rejection_of(&Ticker::from("GAP")),
            Some(&RejectionReason::MissingData("roe".to_string()))
        );
        assert_eq!(
            outcome.rejection_of(&Ticker::from("HALT")),
            Some(&RejectionReason::Untradable(Untradable::Suspended))
        );
        assert_eq!(outcome.rejected_at(FilterStage::SpecialTreatment).count(), 1);
    }

    #[test]
    fn excluded_names_do_not_skew_percentile_bases() {
        // With the ST giant in the base, "MID" would sit at the 0.5 percentile and
        // miss the growth cut. Excluded first, it tops a two-stock base instead.
        let mut giant = healthy("BIG", 5.0);
        giant.is_st = true;
        let universe = UniverseSnapshot::new(
            date(),
            vec![giant, healthy("MID", 0.8), healthy("LOW", 0.1)],
        )
        .unwrap();
        let outcome = ScreeningPipeline::new(ScreeningParams::default())
            .screen(&universe, &SnapshotTradability);
        let tickers: Vec<&str> = outcome.qualified.iter().map(|s| s.ticker.as_str()).collect();
        assert_eq!(tickers, vec!["MID"]);
        assert_eq!(outcome.qualified[0].growth_percentile, 1.0);
    }

    #[test]
    fn untradable_stocks_still_count_in_the_factor_base() {
        // HALT is the growth leader; it is removed only after percentiles are set, so
        // OK stays at the 0.5 percentile and fails the growth cut.
        let mut halted = healthy("HALT", 0.9);
        halted.limit_locked = true;
        let universe = UniverseSnapshot::new(
            date(),
            vec![halted, healthy("OK", 0.5), healthy("LOW", 0.1)],
        )
        .unwrap();
        let outcome = ScreeningPipeline::new(ScreeningParams::default())
            .screen(&universe, &SnapshotTradability);
        assert!(outcome.qualified.is_empty());
        assert_eq!(
            outcome.rejection_of(&Ticker::from("HALT")),
            Some(&RejectionReason::Untradable(Untradable::LimitLocked))
        );
    }
}
