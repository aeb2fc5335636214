//! # Resonance Core Types
//!
//! The shared vocabulary of the selection engine: tickers, per-date stock
//! snapshots, holdings, calendar anchors and the two tradability capabilities.
//! As the bottom layer it depends on no other workspace crate.

pub mod enums;
pub mod error;
pub mod structs;
pub mod tradability;

// Re-export the core types to provide a clean public API.
pub use enums::{RollConvention, Untradable};
pub use error::CoreError;
pub use structs::{Holdings, MonthDay, Position, StockSnapshot, Ticker, UniverseSnapshot};
pub use tradability::{ExecutionTradability, ScreeningTradability, SnapshotTradability};
