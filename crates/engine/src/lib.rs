//! # Resonance Engine Crate
//!
//! The orchestrator. It decides when to rebalance and runs each rebalance from
//! universe snapshot to committed holdings.
//!
//! ## Architectural Principles
//!
//! - **One Cycle at a Time:** A cycle runs to completion before the next date is
//!   considered. Its only cross-cycle effect is a single commit to the
//!   `HoldingsLedger`, made after execution succeeds.
//! - **Calendar Abstraction:** Scheduling and the execution lag only ask a
//!   `TradingCalendar` whether a day trades, so weekday rules and data-driven
//!   session lists are interchangeable.
//!
//! ## Public API
//!
//! - `TradingCalendar`, `WeekdayCalendar`, `DatesCalendar`: session calendars.
//! - `RebalanceScheduler`, `SchedulerState`: anchor resolution and triggering.
//! - `RebalanceEngine`, `MarketContext`: one rebalance cycle.
//! - `RebalanceRunner`: walks a date range and collects `CycleSummary` rows.

pub mod calendar;
pub mod cycle;
pub mod error;
pub mod runner;
pub mod scheduler;

pub use calendar::{DatesCalendar, TradingCalendar, WeekdayCalendar};
pub use cycle::{CycleReport, MarketContext, RebalanceEngine, RebalanceOutcome};
pub use error::EngineError;
pub use runner::{CycleSummary, RebalanceRunner};
pub use scheduler::{RebalanceScheduler, ResolvedAnchor, SchedulerState};
