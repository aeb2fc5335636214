use crate::error::UniverseError;
use crate::provider::{UniverseProvider, lookup, quote_check};
use chrono::NaiveDate;
use configuration::DataSettings;
use core_types::{ExecutionTradability, StockSnapshot, Ticker, UniverseSnapshot, Untradable};
use factors::{BalanceSheet, growth, solvency_ratio};
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::io;
use std::path::Path;

/// One line of the universe file.
///
/// Every numeric cell is optional and read leniently: an empty or unparsable cell is
/// a gap, which screening later rejects for that stock alone.
#[derive(Debug, Deserialize)]
struct CsvRow {
    date: NaiveDate,
    ticker: String,
    #[serde(default, deserialize_with = "number")]
    ttm_growth: Option<f64>,
    #[serde(default, deserialize_with = "number")]
    prior_growth: Option<f64>,
    #[serde(default, deserialize_with = "number")]
    npap_ratio: Option<f64>,
    #[serde(default, deserialize_with = "number")]
    solvency: Option<f64>,
    #[serde(default, deserialize_with = "number")]
    roe: Option<f64>,
    #[serde(default, deserialize_with = "number")]
    traded_value: Option<f64>,
    #[serde(default, deserialize_with = "number")]
    analyst_revision: Option<f64>,
    #[serde(default, deserialize_with = "number")]
    analyst_growth: Option<f64>,
    #[serde(default, deserialize_with = "flag")]
    recent_financing: Option<bool>,
    #[serde(default, deserialize_with = "flag")]
    is_st: Option<bool>,
    #[serde(default, deserialize_with = "flag")]
    suspended: Option<bool>,
    #[serde(default, deserialize_with = "flag")]
    limit_locked: Option<bool>,
    #[serde(default, deserialize_with = "number")]
    high: Option<f64>,
    #[serde(default, deserialize_with = "number")]
    low: Option<f64>,
    #[serde(default, deserialize_with = "number")]
    volume: Option<f64>,

    // Reported figures, used when the derived cells above are empty.
    /// Net profit after adjustment, trailing twelve months.
    #[serde(default, deserialize_with = "number")]
    net_profit_after: Option<f64>,
    /// The same figure one year earlier.
    #[serde(default, deserialize_with = "number")]
    net_profit_after_prior: Option<f64>,
    /// Reported net profit, trailing twelve months.
    #[serde(default, deserialize_with = "number")]
    net_profit: Option<f64>,
    #[serde(default, deserialize_with = "number")]
    short_term_borrowing: Option<f64>,
    #[serde(default, deserialize_with = "number")]
    short_term_bonds: Option<f64>,
    #[serde(default, deserialize_with = "number")]
    non_current_liabilities_due_within_one_year: Option<f64>,
    #[serde(default, deserialize_with = "number")]
    monetary_capital: Option<f64>,
    #[serde(default, deserialize_with = "number")]
    trading_financial_assets: Option<f64>,
    #[serde(default, deserialize_with = "number")]
    net_operating_cash: Option<f64>,
    #[serde(default, deserialize_with = "number")]
    total_assets: Option<f64>,
    #[serde(default, deserialize_with = "number")]
    total_liabilities: Option<f64>,
}

impl CsvRow {
    /// No volume at all means the stock did not trade that day.
    fn derived_suspended(&self) -> bool {
        self.suspended
            .unwrap_or_else(|| self.volume.is_some_and(|v| v == 0.0))
    }

    /// A session whose high equals its low never left the limit price.
    fn derived_limit_locked(&self) -> bool {
        self.limit_locked.unwrap_or_else(|| match (self.high, self.low) {
            (Some(high), Some(low)) => high == low,
            _ => false,
        })
    }

    fn derived_ttm_growth(&self) -> Option<f64> {
        self.ttm_growth.or_else(|| {
            growth::ttm_growth(self.net_profit_after?, self.net_profit_after_prior?)
        })
    }

    fn derived_npap_ratio(&self) -> Option<f64> {
        self.npap_ratio
            .or_else(|| growth::npap_ratio(self.net_profit_after?, self.net_profit?))
    }

    fn derived_solvency(&self) -> Option<f64> {
        self.solvency
            .or_else(|| solvency_ratio(&self.balance_sheet()?))
    }

    /// All eight lines, or nothing.
    fn balance_sheet(&self) -> Option<BalanceSheet> {
        Some(BalanceSheet {
            short_term_borrowing: self.short_term_borrowing?,
            short_term_bonds: self.short_term_bonds?,
            non_current_liabilities_due_within_one_year: self
                .non_current_liabilities_due_within_one_year?,
            monetary_capital: self.monetary_capital?,
            trading_financial_assets: self.trading_financial_assets?,
            net_operating_cash: self.net_operating_cash?,
            total_assets: self.total_assets?,
            total_liabilities: self.total_liabilities?,
        })
    }
}

/// A numeric cell: empty is `None`, and so is anything that does not parse as a number.
fn number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    let Some(raw) = raw else {
        return Ok(None);
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    match raw.parse::<f64>() {
        Ok(value) => Ok(Some(value)),
        Err(_) => {
            tracing::debug!(cell = raw, "Unparsable numeric cell read as missing");
            Ok(None)
        }
    }
}

/// Accepts `1/0`, `true/false`, `yes/no` and `y/n`; an empty cell is `None`.
fn flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    let Some(raw) = raw else {
        return Ok(None);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "" => Ok(None),
        "1" | "true" | "yes" | "y" => Ok(Some(true)),
        "0" | "false" | "no" | "n" => Ok(Some(false)),
        other => Err(serde::de::Error::custom(format!("not a flag: {other:?}"))),
    }
}

/// A universe read from a single CSV file, one row per (date, ticker).
///
/// Everything is loaded and validated up front; afterwards the provider is
/// read-only. The same rows answer execution-time tradability questions.
#[derive(Debug, Clone)]
pub struct CsvUniverse {
    by_date: BTreeMap<NaiveDate, UniverseSnapshot>,
}

impl CsvUniverse {
    /// Opens the file named in the data settings.
    pub fn open(settings: &DataSettings) -> Result<Self, UniverseError> {
        Self::from_path(&settings.path, settings.liquidity_window)
    }

    pub fn from_path(path: &Path, liquidity_window: usize) -> Result<Self, UniverseError> {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|source| UniverseError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        let universe = Self::from_csv(reader, liquidity_window)?;
        tracing::info!(
            path = %path.display(),
            dates = universe.by_date.len(),
            "Universe file loaded"
        );
        Ok(universe)
    }

    pub fn from_reader<R: io::Read>(
        reader: R,
        liquidity_window: usize,
    ) -> Result<Self, UniverseError> {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        Self::from_csv(reader, liquidity_window)
    }

    fn from_csv<R: io::Read>(
        mut reader: csv::Reader<R>,
        liquidity_window: usize,
    ) -> Result<Self, UniverseError> {
        if liquidity_window == 0 {
            return Err(UniverseError::InvalidRow {
                line: 0,
                reason: "liquidity window must be at least 1".to_string(),
            });
        }

        // 1. Parse, grouping rows by ticker so trailing windows can be taken.
        let mut by_ticker: BTreeMap<Ticker, Vec<CsvRow>> = BTreeMap::new();
        for (idx, record) in reader.deserialize::<CsvRow>().enumerate() {
            let row = record?;
            if row.ticker.is_empty() {
                return Err(UniverseError::InvalidRow {
                    // Header is line 1.
                    line: idx as u64 + 2,
                    reason: "empty ticker".to_string(),
                });
            }
            by_ticker
                .entry(Ticker::from(row.ticker.as_str()))
                .or_default()
                .push(row);
        }

        // 2. Build snapshots with the trailing liquidity average.
        let mut grouped: BTreeMap<NaiveDate, Vec<StockSnapshot>> = BTreeMap::new();
        for (ticker, mut rows) in by_ticker {
            rows.sort_by_key(|r| r.date);
            for (idx, row) in rows.iter().enumerate() {
                let start = (idx + 1).saturating_sub(liquidity_window);
                let mut snapshot = StockSnapshot::new(ticker.clone(), row.date);
                snapshot.ttm_growth = row.derived_ttm_growth();
                snapshot.prior_growth = row.prior_growth;
                snapshot.npap_ratio = row.derived_npap_ratio();
                snapshot.solvency = row.derived_solvency();
                snapshot.roe = row.roe;
                snapshot.avg_traded_value = trailing_mean(&rows[start..=idx]);
                snapshot.analyst_revision = row.analyst_revision;
                snapshot.analyst_growth = row.analyst_growth;
                snapshot.recent_financing = row.recent_financing.unwrap_or(false);
                snapshot.is_st = row.is_st.unwrap_or(false);
                snapshot.suspended = row.derived_suspended();
                snapshot.limit_locked = row.derived_limit_locked();
                grouped.entry(row.date).or_default().push(snapshot);
            }
        }

        // 3. Validate each date as a whole.
        let mut by_date = BTreeMap::new();
        for (date, stocks) in grouped {
            by_date.insert(date, UniverseSnapshot::new(date, stocks)?);
        }
        Ok(Self { by_date })
    }
}

/// Mean of the traded values present in the window.
fn trailing_mean(window: &[CsvRow]) -> Option<f64> {
    let values: Vec<f64> = window.iter().filter_map(|r| r.traded_value).collect();
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

impl UniverseProvider for CsvUniverse {
    fn snapshot(&self, date: NaiveDate) -> Result<UniverseSnapshot, UniverseError> {
        lookup(&self.by_date, date).cloned()
    }

    fn available_dates(&self) -> Vec<NaiveDate> {
        self.by_date.keys().copied().collect()
    }
}

impl ExecutionTradability for CsvUniverse {
    fn check(&self, ticker: &Ticker, date: NaiveDate) -> Result<(), Untradable> {
        quote_check(&self.by_date, ticker, date)
    }
}
