use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Universe error: {0}")]
    Universe(#[from] universe::UniverseError),

    #[error("Portfolio error: {0}")]
    Portfolio(#[from] portfolio::PortfolioError),

    #[error("Execution error: {0}")]
    Execution(#[from] portfolio::ExecutionError),

    #[error("No trading session to execute the {0} selection on")]
    NoExecutionDate(NaiveDate),

    #[error("Invalid run period: {from} is after {to}")]
    InvalidPeriod { from: NaiveDate, to: NaiveDate },
}
