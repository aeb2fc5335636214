use crate::error::FactorError;
use crate::percentile::percentile_ranks;
use configuration::ScreeningParams;
use core_types::{StockSnapshot, Ticker};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The six screened factors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Factor {
    Growth,
    Acceleration,
    Npap,
    Solvency,
    Roe,
    Liquidity,
}

impl fmt::Display for Factor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Factor::Growth => write!(f, "growth"),
            Factor::Acceleration => write!(f, "acceleration"),
            Factor::Npap => write!(f, "npap"),
            Factor::Solvency => write!(f, "solvency"),
            Factor::Roe => write!(f, "roe"),
            Factor::Liquidity => write!(f, "liquidity"),
        }
    }
}

/// The validated numeric inputs of one stock. Building it is the data-quality gate:
/// a snapshot with any gap never reaches the percentile base.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorInputs {
    pub ticker: Ticker,
    pub ttm_growth: f64,
    pub acceleration: f64,
    pub npap_ratio: f64,
    pub solvency: f64,
    pub roe: f64,
    pub avg_traded_value: f64,
    pub analyst_revision: f64,
    pub analyst_growth: f64,
}

impl FactorInputs {
    pub fn from_snapshot(snapshot: &StockSnapshot) -> Result<Self, FactorError> {
        let ticker = &snapshot.ticker;
        let ttm_growth = required(ticker, "ttm_growth", snapshot.ttm_growth)?;
        let prior_growth = required(ticker, "prior_growth", snapshot.prior_growth)?;
        Ok(Self {
            ticker: ticker.clone(),
            ttm_growth,
            acceleration: required(ticker, "acceleration", Some(ttm_growth - prior_growth))?,
            npap_ratio: required(ticker, "npap_ratio", snapshot.npap_ratio)?,
            solvency: required(ticker, "solvency", snapshot.solvency)?,
            roe: required(ticker, "roe", snapshot.roe)?,
            avg_traded_value: required(ticker, "avg_traded_value", snapshot.avg_traded_value)?,
            analyst_revision: required(ticker, "analyst_revision", snapshot.analyst_revision)?,
            analyst_growth: required(ticker, "analyst_growth", snapshot.analyst_growth)?,
        })
    }
}

fn required(ticker: &Ticker, field: &'static str, value: Option<f64>) -> Result<f64, FactorError> {
    match value {
        None => Err(FactorError::MissingInput {
            ticker: ticker.clone(),
            field,
        }),
        Some(v) if !v.is_finite() => Err(FactorError::NonFinite {
            ticker: ticker.clone(),
            field,
        }),
        Some(v) => Ok(v),
    }
}

/// Pass/fail of each factor for one stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FactorPasses {
    pub growth: bool,
    pub acceleration: bool,
    pub npap: bool,
    pub solvency: bool,
    pub roe: bool,
    pub liquidity: bool,
}

impl FactorPasses {
    pub fn all(&self) -> bool {
        self.failures().is_empty()
    }

    pub fn failures(&self) -> Vec<Factor> {
        [
            (Factor::Growth, self.growth),
            (Factor::Acceleration, self.acceleration),
            (Factor::Npap, self.npap),
            (Factor::Solvency, self.solvency),
            (Factor::Roe, self.roe),
            (Factor::Liquidity, self.liquidity),
        ]
        .into_iter()
        .filter(|(_, passed)| !passed)
        .map(|(factor, _)| factor)
        .collect()
    }
}

/// Derived factor values of one stock for one period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorScoreSet {
    pub ticker: Ticker,
    pub ttm_growth: f64,
    pub growth_percentile: f64,
    pub acceleration: f64,
    pub acceleration_percentile: f64,
    pub liquidity_percentile: f64,
    pub analyst_revision: f64,
    pub analyst_growth: f64,
    pub passes: FactorPasses,
}

/// Scores a whole percentile base at once.
#[derive(Debug, Clone)]
pub struct FactorCalculator {
    params: ScreeningParams,
}

impl FactorCalculator {
    pub fn new(params: ScreeningParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &ScreeningParams {
        &self.params
    }

    /// Computes one score set per input, in input order.
    ///
    /// `base` must be the complete set the relative thresholds are measured against;
    /// no pass/fail decision is possible until every member is known.
    pub fn compute(&self, base: &[FactorInputs]) -> Vec<FactorScoreSet> {
        let growth = percentile_ranks(&collect(base, |i| i.ttm_growth));
        let acceleration = percentile_ranks(&collect(base, |i| i.acceleration));
        let liquidity = percentile_ranks(&collect(base, |i| i.avg_traded_value));

        let p = &self.params;
        let scores: Vec<FactorScoreSet> = base
            .iter()
            .enumerate()
            .map(|(idx, inputs)| {
                let passes = FactorPasses {
                    growth: growth[idx] >= p.growth_min_percentile,
                    acceleration: inputs.acceleration > 0.0
                        && acceleration[idx] >= p.acceleration_min_percentile,
                    npap: inputs.npap_ratio > p.npap_min,
                    solvency: inputs.solvency > p.solvency_min,
                    roe: inputs.roe > p.roe_min,
                    liquidity: liquidity[idx] >= p.liquidity_min_percentile,
                };
                FactorScoreSet {
                    ticker: inputs.ticker.clone(),
                    ttm_growth: inputs.ttm_growth,
                    growth_percentile: growth[idx],
                    acceleration: inputs.acceleration,
                    acceleration_percentile: acceleration[idx],
                    liquidity_percentile: liquidity[idx],
                    analyst_revision: inputs.analyst_revision,
                    analyst_growth: inputs.analyst_growth,
                    passes,
                }
            })
            .collect();

        tracing::debug!(
            base = base.len(),
            passed = scores.iter().filter(|s| s.passes.all()).count(),
            "Factor scores computed"
        );
        scores
    }
}

fn collect(base: &[FactorInputs], field: impl Fn(&FactorInputs) -> f64) -> Vec<f64> {
    base.iter().map(field).collect()
}
