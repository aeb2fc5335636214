use crate::error::CoreError;
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// ==============================================================================
// Identity
// ==============================================================================

/// An exchange ticker such as `600519.SH`.
///
/// Ordering is plain byte order of the code, which is what the ranker uses as the
/// last-resort tie-break.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ticker(String);

impl Ticker {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Ticker {
    fn from(code: &str) -> Self {
        Self(code.to_string())
    }
}

impl From<String> for Ticker {
    fn from(code: String) -> Self {
        Self(code)
    }
}

impl Borrow<str> for Ticker {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// ==============================================================================
// Calendar anchors
// ==============================================================================

/// A month/day pair that recurs every year, e.g. `07-15`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MonthDay {
    month: u32,
    day: u32,
}

impl MonthDay {
    /// Builds a pair, rejecting combinations that never exist (`04-31`, `13-01`).
    /// `02-29` is accepted and clamps to Feb 28 in common years.
    pub fn new(month: u32, day: u32) -> Result<Self, CoreError> {
        // 2000 is a leap year, so every valid pair has a date in it.
        if NaiveDate::from_ymd_opt(2000, month, day).is_none() {
            return Err(CoreError::InvalidMonthDay(format!("{month:02}-{day:02}")));
        }
        Ok(Self { month, day })
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    /// The concrete date of this anchor in `year`, clamped to the last day of the month.
    pub fn in_year(&self, year: i32) -> NaiveDate {
        let mut day = self.day;
        loop {
            if let Some(date) = NaiveDate::from_ymd_opt(year, self.month, day) {
                return date;
            }
            day -= 1;
        }
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            month: date.month(),
            day: date.day(),
        }
    }
}

impl fmt::Display for MonthDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}-{:02}", self.month, self.day)
    }
}

impl FromStr for MonthDay {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CoreError::InvalidMonthDay(s.to_string());
        let (month, day) = s.trim().split_once('-').ok_or_else(invalid)?;
        let month = month.parse::<u32>().map_err(|_| invalid())?;
        let day = day.parse::<u32>().map_err(|_| invalid())?;
        Self::new(month, day).map_err(|_| invalid())
    }
}

impl TryFrom<String> for MonthDay {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MonthDay> for String {
    fn from(value: MonthDay) -> Self {
        value.to_string()
    }
}

// ==============================================================================
// Universe snapshot
// ==============================================================================

/// The raw per-stock observation for one date, as delivered by the universe provider.
///
/// Numeric inputs are optional so a provider can report a gap; a stock with a gap in
/// any required input is screened out for that period rather than failing the cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockSnapshot {
    pub ticker: Ticker,
    pub as_of: NaiveDate,
    /// Trailing-twelve-month net profit growth.
    pub ttm_growth: Option<f64>,
    /// The same growth measure one period earlier.
    pub prior_growth: Option<f64>,
    /// Net profit after adjustment divided by net profit.
    pub npap_ratio: Option<f64>,
    pub solvency: Option<f64>,
    pub roe: Option<f64>,
    /// Average daily traded value over the provider's trailing window.
    pub avg_traded_value: Option<f64>,
    pub analyst_revision: Option<f64>,
    pub analyst_growth: Option<f64>,
    pub recent_financing: bool,
    pub is_st: bool,
    pub suspended: bool,
    pub limit_locked: bool,
}

impl StockSnapshot {
    /// A snapshot with every flag cleared and every numeric input missing.
    pub fn new(ticker: impl Into<Ticker>, as_of: NaiveDate) -> Self {
        Self {
            ticker: ticker.into(),
            as_of,
            ttm_growth: None,
            prior_growth: None,
            npap_ratio: None,
            solvency: None,
            roe: None,
            avg_traded_value: None,
            analyst_revision: None,
            analyst_growth: None,
            recent_financing: false,
            is_st: false,
            suspended: false,
            limit_locked: false,
        }
    }

    /// Growth change since the prior period, when both sides are known.
    pub fn acceleration(&self) -> Option<f64> {
        match (self.ttm_growth, self.prior_growth) {
            (Some(current), Some(prior)) => Some(current - prior),
            _ => None,
        }
    }
}

/// Every stock snapshot of one date: the immutable input of one rebalance cycle.
///
/// Stocks are kept sorted by ticker so that the order a provider happens to return
/// rows in can never influence a result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniverseSnapshot {
    date: NaiveDate,
    stocks: Vec<StockSnapshot>,
}

impl UniverseSnapshot {
    /// Fails on a duplicated ticker or on a snapshot dated differently from `date`.
    pub fn new(date: NaiveDate, mut stocks: Vec<StockSnapshot>) -> Result<Self, CoreError> {
        if let Some(stray) = stocks.iter().find(|s| s.as_of != date) {
            return Err(CoreError::InvalidInput(
                "universe snapshot".to_string(),
                format!("{} is dated {} inside the {} universe", stray.ticker, stray.as_of, date),
            ));
        }
        stocks.sort_by(|a, b| a.ticker.cmp(&b.ticker));
        if let Some(pair) = stocks.windows(2).find(|w| w[0].ticker == w[1].ticker) {
            return Err(CoreError::InvalidInput(
                "universe snapshot".to_string(),
                format!("duplicate ticker {}", pair[0].ticker),
            ));
        }
        Ok(Self { date, stocks })
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn stocks(&self) -> &[StockSnapshot] {
        &self.stocks
    }

    pub fn get(&self, ticker: &Ticker) -> Option<&StockSnapshot> {
        self.stocks
            .binary_search_by(|s| s.ticker.cmp(ticker))
            .ok()
            .map(|idx| &self.stocks[idx])
    }

    pub fn len(&self) -> usize {
        self.stocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stocks.is_empty()
    }
}

// ==============================================================================
// Holdings
// ==============================================================================

/// A single held line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// Fraction of invested equity allocated to the line.
    pub weight: Decimal,
    /// Units held, as reported back by the execution engine.
    pub quantity: Decimal,
}

/// The positions currently held, as last reported by the execution engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holdings {
    /// Date of the transition that produced these holdings; `None` before the first one.
    pub as_of: Option<NaiveDate>,
    pub positions: BTreeMap<Ticker, Position>,
}

impl Holdings {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn contains(&self, ticker: &Ticker) -> bool {
        self.positions.contains_key(ticker)
    }

    pub fn weight_of(&self, ticker: &Ticker) -> Decimal {
        self.positions
            .get(ticker)
            .map(|p| p.weight)
            .unwrap_or(Decimal::ZERO)
    }

    pub fn total_weight(&self) -> Decimal {
        self.positions.values().map(|p| p.weight).sum()
    }

    pub fn tickers(&self) -> impl Iterator<Item = &Ticker> {
        self.positions.keys()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}
