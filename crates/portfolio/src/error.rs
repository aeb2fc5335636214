use core_types::Ticker;
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PortfolioError {
    #[error("Cash reserve must lie in [0, 1), got {0}")]
    InvalidCashReserve(Decimal),

    #[error("The holdings ledger lock was poisoned by a panicking writer")]
    LedgerPoisoned,
}

/// Failures reported by an execution engine. A failed execution leaves the ledger as it was.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    #[error("Plan {plan} no longer matches the holdings: {ticker} {detail}")]
    StalePlan {
        plan: String,
        ticker: Ticker,
        detail: &'static str,
    },

    #[error("Execution rejected: {0}")]
    Rejected(String),
}
