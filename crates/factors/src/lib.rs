//! # Resonance Factor Calculator
//!
//! Turns raw `StockSnapshot`s into per-stock factor scores and pass flags.
//!
//! ## Architectural Principles
//!
//! - **Pure Logic:** No I/O and no state across calls. A percentile base goes in,
//!   score sets come out, so the relative thresholds can be tested against any
//!   synthetic distribution.
//! - **Relative Thresholds:** Growth, acceleration and liquidity are judged by
//!   percentile rank within the base handed in, recomputed on every call.
//!
//! ## Public API
//!
//! - `FactorInputs`: validated numeric inputs; building one is the data-quality gate.
//! - `FactorCalculator`: scores a whole base at once.
//! - `percentile`: the rank functions the relative thresholds use.
//! - `growth`, `solvency`: helpers that derive snapshot inputs from reported figures.

pub mod calculator;
pub mod error;
pub mod growth;
pub mod percentile;
pub mod solvency;

pub use calculator::{Factor, FactorCalculator, FactorInputs, FactorPasses, FactorScoreSet};
pub use error::FactorError;
pub use solvency::{BalanceSheet, solvency_ratio};
