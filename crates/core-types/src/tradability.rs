//! Tradability is checked twice per rebalance: once while screening, from the
//! snapshot the scores were computed on, and again at the execution moment, which
//! can be later. The two checks are separate capabilities so that a caller can
//! make a stock untradable between them without touching the snapshot.

use crate::enums::Untradable;
use crate::structs::{StockSnapshot, Ticker};
use chrono::NaiveDate;

/// Selection-time tradability, judged from the snapshot used for scoring.
pub trait ScreeningTradability {
    fn check(&self, snapshot: &StockSnapshot) -> Result<(), Untradable>;
}

/// Execution-time tradability, judged from live state on the execution date.
pub trait ExecutionTradability {
    fn check(&self, ticker: &Ticker, date: NaiveDate) -> Result<(), Untradable>;
}

/// Reads the suspension, limit-lock and ST flags carried on the snapshot itself.
///
/// An ST flag never reaches this check while screening, since ST names are excluded
/// first. It matters when the same rows are read again on a later execution date.
#[derive(Debug, Clone, Copy, Default)]
pub struct SnapshotTradability;

impl ScreeningTradability for SnapshotTradability {
    fn check(&self, snapshot: &StockSnapshot) -> Result<(), Untradable> {
        if snapshot.suspended {
            Err(Untradable::Suspended)
        } else if snapshot.limit_locked {
            Err(Untradable::LimitLocked)
        } else if snapshot.is_st {
            Err(Untradable::SpecialTreatment)
        } else {
            Ok(())
        }
    }
}

impl<T: ExecutionTradability + ?Sized> ExecutionTradability for &T {
    fn check(&self, ticker: &Ticker, date: NaiveDate) -> Result<(), Untradable> {
        (**self).check(ticker, date)
    }
}
