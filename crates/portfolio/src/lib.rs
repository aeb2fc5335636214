//! # Resonance Portfolio Crate
//!
//! Turns a ranked candidate list into a concrete, equal-weight target and the plan
//! that moves the current holdings onto it.
//!
//! ## Architectural Principles
//!
//! - **Two-Phase Tradability:** Candidates already passed a selection-time check.
//!   The `VacancyResolver` checks them again on the execution date and backfills
//!   from further down the list, so an untradable name never reaches the target.
//! - **State vs. Logic Decoupling:** `PortfolioConstructor` only computes a
//!   `TransitionPlan`. Holdings change solely through an `ExecutionEngine`, whose
//!   result is committed to the `HoldingsLedger` in one replace.
//!
//! ## Public API
//!
//! - `VacancyResolver`, `FinalSelection`, `Vacancy`: execution-time backfill.
//! - `PortfolioConstructor`, `TargetPortfolio`, `TransitionPlan`, `Retain`.
//! - `HoldingsLedger`: the cross-cycle holdings state.
//! - `ExecutionEngine`, `InstantExecution`: the execution contract and a trivial engine.

// Declare the modules that constitute this crate.
pub mod constructor;
pub mod error;
pub mod execution;
pub mod ledger;
pub mod vacancy;

// Re-export the key components to provide a clean, public-facing API.
pub use constructor::{PortfolioConstructor, Retain, TargetPortfolio, TransitionPlan};
pub use error::{ExecutionError, PortfolioError};
pub use execution::{ExecutionEngine, InstantExecution};
pub use ledger::HoldingsLedger;
pub use vacancy::{FinalSelection, Vacancy, VacancyResolver};
