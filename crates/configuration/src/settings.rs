use crate::error::ConfigError;
use chrono::NaiveDate;
use core_types::{MonthDay, RollConvention};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::path::PathBuf;

/// The root configuration structure for the entire application.
///
/// Every section falls back to its defaults, so an empty `config.toml` describes the
/// stock selection model as published: five rebalance dates a year, 30 names.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub rebalance: RebalanceSettings,
    pub screening: ScreeningParams,
    pub ranking: RankingWeights,
    pub data: DataSettings,
    pub calendar: CalendarSettings,
    pub logging: LoggingSettings,
}

impl Settings {
    /// Rejects values that would make a rebalance cycle meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.rebalance.validate()?;
        self.screening.validate()?;
        self.ranking.validate()?;
        if self.data.liquidity_window == 0 {
            return Err(ConfigError::ValidationError(
                "data.liquidity_window must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// When to rebalance and how large the portfolio is.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RebalanceSettings {
    /// Month/day anchors, written as `"MM-DD"`.
    pub dates: Vec<MonthDay>,
    /// How an anchor that is not a trading day is moved onto one.
    pub roll: RollConvention,
    /// Target number of holdings.
    pub top_n: usize,
    /// Trading days between scoring and order placement. Tradability is re-checked on
    /// the later day.
    pub execution_lag_days: u32,
    /// Fraction of equity kept in cash; the rest is split equally across holdings.
    pub cash_reserve: Decimal,
}

impl Default for RebalanceSettings {
    fn default() -> Self {
        Self {
            dates: [(1, 31), (4, 30), (7, 15), (8, 31), (10, 31)]
                .into_iter()
                .filter_map(|(month, day)| MonthDay::new(month, day).ok())
                .collect(),
            roll: RollConvention::Following,
            top_n: 30,
            execution_lag_days: 0,
            cash_reserve: Decimal::ZERO,
        }
    }
}

impl RebalanceSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.dates.is_empty() {
            return Err(ConfigError::ValidationError(
                "rebalance.dates must name at least one month/day".to_string(),
            ));
        }
        if self.top_n == 0 {
            return Err(ConfigError::ValidationError(
                "rebalance.top_n must be greater than 0".to_string(),
            ));
        }
        if self.cash_reserve < Decimal::ZERO || self.cash_reserve >= dec!(1) {
            return Err(ConfigError::ValidationError(
                "rebalance.cash_reserve must be in [0, 1)".to_string(),
            ));
        }
        Ok(())
    }
}

/// Thresholds of the factor screen.
///
/// The `*_percentile` values are relative: they are compared against percentiles
/// recomputed over each period's universe, never against raw values.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ScreeningParams {
    /// Minimum percentile of TTM growth (top third by default).
    pub growth_min_percentile: f64,
    /// Minimum percentile of growth acceleration; the delta must also be positive.
    pub acceleration_min_percentile: f64,
    /// NPAP ratio must be strictly above this.
    pub npap_min: f64,
    /// Solvency score must be strictly above this.
    pub solvency_min: f64,
    /// Return on equity must be strictly above this.
    pub roe_min: f64,
    /// Minimum percentile of average traded value (drops the bottom decile by default).
    pub liquidity_min_percentile: f64,
}

impl Default for ScreeningParams {
    fn default() -> Self {
        Self {
            growth_min_percentile: 0.667,
            acceleration_min_percentile: 0.5,
            npap_min: 0.5,
            solvency_min: -1.0,
            roe_min: 0.01,
            liquidity_min_percentile: 0.10,
        }
    }
}

impl ScreeningParams {
    fn validate(&self) -> Result<(), ConfigError> {
        let percentiles = [
            ("screening.growth_min_percentile", self.growth_min_percentile),
            ("screening.acceleration_min_percentile", self.acceleration_min_percentile),
            ("screening.liquidity_min_percentile", self.liquidity_min_percentile),
        ];
        for (name, value) in percentiles {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::ValidationError(format!(
                    "{name} must be in [0, 1], got {value}"
                )));
            }
        }
        let absolutes = [
            ("screening.npap_min", self.npap_min),
            ("screening.solvency_min", self.solvency_min),
            ("screening.roe_min", self.roe_min),
        ];
        for (name, value) in absolutes {
            if !value.is_finite() {
                return Err(ConfigError::ValidationError(format!("{name} must be finite")));
            }
        }
        Ok(())
    }
}

/// Weights of the composite score. Both signals are min-max scaled to `[0, 100]`
/// over the qualified set before weighting.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RankingWeights {
    pub revision_weight: f64,
    pub forecast_weight: f64,
}

impl Default for RankingWeights {
    fn default() -> Self {
        Self {
            revision_weight: 0.5,
            forecast_weight: 0.5,
        }
    }
}

impl RankingWeights {
    fn validate(&self) -> Result<(), ConfigError> {
        let weights = [self.revision_weight, self.forecast_weight];
        // Negative weights would let a better signal lower the composite.
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(ConfigError::ValidationError(
                "ranking weights must be finite and non-negative".to_string(),
            ));
        }
        if weights.iter().sum::<f64>() <= 0.0 {
            return Err(ConfigError::ValidationError(
                "at least one ranking weight must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Where the universe snapshots come from.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    /// CSV file with one row per (date, ticker).
    pub path: PathBuf,
    /// Number of trailing rows averaged into the traded-value liquidity measure.
    pub liquidity_window: usize,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/universe.csv"),
            liquidity_window: 5,
        }
    }
}

/// Exchange holidays on top of weekends.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CalendarSettings {
    pub holidays: Vec<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter directive; `RUST_LOG` wins when set.
    pub level: String,
    /// When set, logs are also written to a daily rolling file in this directory.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
        }
    }
}
