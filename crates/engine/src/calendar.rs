use chrono::{Datelike, Days, NaiveDate, Weekday};
use configuration::CalendarSettings;
use std::collections::BTreeSet;

/// How far a search for the next or previous trading day may wander.
const SEARCH_LIMIT_DAYS: u64 = 366;

/// Which calendar days the market is open.
pub trait TradingCalendar {
    fn is_trading_day(&self, date: NaiveDate) -> bool;

    /// First trading day on or after `date`.
    fn following(&self, date: NaiveDate) -> Option<NaiveDate> {
        (0..=SEARCH_LIMIT_DAYS)
            .filter_map(|n| date.checked_add_days(Days::new(n)))
            .find(|d| self.is_trading_day(*d))
    }

    /// Last trading day on or before `date`.
    fn preceding(&self, date: NaiveDate) -> Option<NaiveDate> {
        (0..=SEARCH_LIMIT_DAYS)
            .filter_map(|n| date.checked_sub_days(Days::new(n)))
            .find(|d| self.is_trading_day(*d))
    }

    /// The trading day `n` sessions after `date`. With `n == 0` this is `date` itself
    /// when it trades, otherwise the following session.
    fn offset(&self, date: NaiveDate, n: u32) -> Option<NaiveDate> {
        let mut current = self.following(date)?;
        for _ in 0..n {
            current = self.following(current.succ_opt()?)?;
        }
        Some(current)
    }
}

impl<C: TradingCalendar + ?Sized> TradingCalendar for &C {
    fn is_trading_day(&self, date: NaiveDate) -> bool {
        (**self).is_trading_day(date)
    }

    fn following(&self, date: NaiveDate) -> Option<NaiveDate> {
        (**self).following(date)
    }

    fn preceding(&self, date: NaiveDate) -> Option<NaiveDate> {
        (**self).preceding(date)
    }
}

/// Monday to Friday, minus a list of exchange holidays.
#[derive(Debug, Clone, Default)]
pub struct WeekdayCalendar {
    holidays: BTreeSet<NaiveDate>,
}

impl WeekdayCalendar {
    pub fn new(holidays: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            holidays: holidays.into_iter().collect(),
        }
    }

    pub fn from_settings(settings: &CalendarSettings) -> Self {
        Self::new(settings.holidays.iter().copied())
    }
}

impl TradingCalendar for WeekdayCalendar {
    fn is_trading_day(&self, date: NaiveDate) -> bool {
        !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) && !self.holidays.contains(&date)
    }
}

/// An explicit set of sessions, typically the dates present in the market data.
#[derive(Debug, Clone, Default)]
pub struct DatesCalendar {
    dates: BTreeSet<NaiveDate>,
}

impl DatesCalendar {
    pub fn new(dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            dates: dates.into_iter().collect(),
        }
    }

    pub fn first(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn last(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }
}

impl TradingCalendar for DatesCalendar {
    fn is_trading_day(&self, date: NaiveDate) -> bool {
        self.dates.contains(&date)
    }

    fn following(&self, date: NaiveDate) -> Option<NaiveDate> {
        self.dates.range(date..).next().copied()
    }

    fn preceding(&self, date: NaiveDate) -> Option<NaiveDate> {
        self.dates.range(..=date).next_back().copied()
    }
}
