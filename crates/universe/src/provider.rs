use crate::error::UniverseError;
use chrono::NaiveDate;
use core_types::{
    ExecutionTradability, ScreeningTradability, SnapshotTradability, Ticker, UniverseSnapshot,
    Untradable,
};
use std::collections::BTreeMap;

/// Source of the per-date universe a rebalance cycle runs on.
///
/// A date without data, and a date whose universe is empty, are both errors: the
/// cycle cannot proceed and the holdings must stay as they are.
pub trait UniverseProvider {
    fn snapshot(&self, date: NaiveDate) -> Result<UniverseSnapshot, UniverseError>;

    /// Every date the provider holds data for, ascending.
    fn available_dates(&self) -> Vec<NaiveDate>;
}

impl<P: UniverseProvider + ?Sized> UniverseProvider for &P {
    fn snapshot(&self, date: NaiveDate) -> Result<UniverseSnapshot, UniverseError> {
        (**self).snapshot(date)
    }

    fn available_dates(&self) -> Vec<NaiveDate> {
        (**self).available_dates()
    }
}

/// A provider over snapshots already held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUniverse {
    by_date: BTreeMap<NaiveDate, UniverseSnapshot>,
}

impl InMemoryUniverse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) the universe of one date.
    pub fn insert(&mut self, universe: UniverseSnapshot) {
        self.by_date.insert(universe.date(), universe);
    }

    pub fn with(mut self, universe: UniverseSnapshot) -> Self {
        self.insert(universe);
        self
    }

    pub fn len(&self) -> usize {
        self.by_date.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_date.is_empty()
    }
}

impl FromIterator<UniverseSnapshot> for InMemoryUniverse {
    fn from_iter<I: IntoIterator<Item = UniverseSnapshot>>(iter: I) -> Self {
        Self {
            by_date: iter.into_iter().map(|u| (u.date(), u)).collect(),
        }
    }
}

impl UniverseProvider for InMemoryUniverse {
    fn snapshot(&self, date: NaiveDate) -> Result<UniverseSnapshot, UniverseError> {
        lookup(&self.by_date, date).cloned()
    }

    fn available_dates(&self) -> Vec<NaiveDate> {
        self.by_date.keys().copied().collect()
    }
}

impl ExecutionTradability for InMemoryUniverse {
    fn check(&self, ticker: &Ticker, date: NaiveDate) -> Result<(), Untradable> {
        quote_check(&self.by_date, ticker, date)
    }
}

/// Shared by the providers: a missing or empty date is an error.
pub(crate) fn lookup(
    by_date: &BTreeMap<NaiveDate, UniverseSnapshot>,
    date: NaiveDate,
) -> Result<&UniverseSnapshot, UniverseError> {
    let universe = by_date.get(&date).ok_or(UniverseError::Unavailable(date))?;
    if universe.is_empty() {
        return Err(UniverseError::Empty(date));
    }
    Ok(universe)
}

/// Execution-time status from the stored row of that day; no row means no quote.
pub(crate) fn quote_check(
    by_date: &BTreeMap<NaiveDate, UniverseSnapshot>,
    ticker: &Ticker,
    date: NaiveDate,
) -> Result<(), Untradable> {
    let snapshot = by_date
        .get(&date)
        .and_then(|u| u.get(ticker))
        .ok_or(Untradable::NoQuote)?;
    SnapshotTradability.check(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::StockSnapshot;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn missing_and_empty_dates_are_errors() {
        let provider: InMemoryUniverse = [
            UniverseSnapshot::new(day(2), vec![StockSnapshot::new("AAA", day(2))]).unwrap(),
            UniverseSnapshot::new(day(3), Vec::new()).unwrap(),
        ]
        .into_iter()
        .collect();

        assert_eq!(provider.snapshot(day(2)).unwrap().len(), 1);
        assert!(matches!(provider.snapshot(day(3)), Err(UniverseError::Empty(_))));
        assert!(matches!(provider.snapshot(day(4)), Err(UniverseError::Unavailable(_))));
        assert_eq!(provider.available_dates(), vec![day(2), day(3)]);
    }

    #[test]
    fn execution_status_reads_the_day_of_execution() {
        let mut halted = StockSnapshot::new("AAA", day(3));
        halted.suspended = true;
        let provider = InMemoryUniverse::new()
            .with(UniverseSnapshot::new(day(2), vec![StockSnapshot::new("AAA", day(2))]).unwrap())
            .with(UniverseSnapshot::new(day(3), vec![halted]).unwrap());

        let ticker = Ticker::from("AAA");
        assert_eq!(provider.check(&ticker, day(2)), Ok(()));
        assert_eq!(provider.check(&ticker, day(3)), Err(Untradable::Suspended));
        assert_eq!(provider.check(&ticker, day(4)), Err(Untradable::NoQuote));
    }
}
