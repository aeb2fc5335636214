//! # Resonance Universe Crate
//!
//! The adapter between the selection engine and wherever per-stock observations
//! come from. The rest of the workspace only ever sees `UniverseSnapshot` values.
//!
//! ## Architectural Principles
//!
//! - **Adapter Layer:** Storage details stay inside this crate. Callers ask for the
//!   universe of a date through the `UniverseProvider` trait.
//! - **Load Once, Read Many:** Providers validate everything when they are built, so
//!   a rebalance cycle never sees a half-formed universe.
//!
//! ## Public API
//!
//! - `UniverseProvider`: the per-date snapshot contract.
//! - `InMemoryUniverse`: snapshots held in memory, mainly for tests.
//! - `CsvUniverse`: snapshots read from a flat file, with derived liquidity and status.
//! - `UniverseError`: the specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod csv_source;
pub mod error;
pub mod provider;

// Re-export the key components to create a clean, public-facing API.
pub use csv_source::CsvUniverse;
pub use error::UniverseError;
pub use provider::{InMemoryUniverse, UniverseProvider};
