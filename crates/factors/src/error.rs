use core_types::Ticker;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FactorError {
    #[error("{ticker}: required input '{field}' is missing")]
    MissingInput { ticker: Ticker, field: &'static str },

    #[error("{ticker}: required input '{field}' is not a finite number")]
    NonFinite { ticker: Ticker, field: &'static str },
}
