use crate::error::PortfolioError;
use core_types::Holdings;
use std::sync::RwLock;

/// The only state carried from one rebalance to the next.
///
/// Readers get a whole-value snapshot and writers replace the whole value, so a
/// half-applied transition is never observable.
#[derive(Debug, Default)]
pub struct HoldingsLedger {
    inner: RwLock<Holdings>,
}

impl HoldingsLedger {
    pub fn new(initial: Holdings) -> Self {
        Self {
            inner: RwLock::new(initial),
        }
    }

    /// A copy of the current holdings, taken under one read lock.
    pub fn snapshot(&self) -> Result<Holdings, PortfolioError> {
        let guard = self.inner.read().map_err(|_| PortfolioError::LedgerPoisoned)?;
        Ok(guard.clone())
    }

    /// Replaces the holdings with the value reported back by the execution engine.
    pub fn commit(&self, holdings: Holdings) -> Result<(), PortfolioError> {
        let mut guard = self.inner.write().map_err(|_| PortfolioError::LedgerPoisoned)?;
        tracing::debug!(
            as_of = ?holdings.as_of,
            positions = holdings.len(),
            "Holdings committed"
        );
        *guard = holdings;
        Ok(())
    }
}
