//! # Resonance Screener
//!
//! Narrows a universe snapshot down to an ordered candidate list.
//!
//! ## Architectural Principles
//!
//! - **Fixed Stage Order:** Special treatment, equity financing and data quality are
//!   exclusions applied before any percentile is computed. The factor stage then
//!   scores every survivor against one shared base, and tradability is checked last
//!   so a suspended stock still counts towards the thresholds of its peers.
//! - **Accounted Funnel:** Every stock of the snapshot ends up either qualified or
//!   with exactly one rejection reason, and each stage reports its input and output
//!   counts.
//! - **Deterministic Ranking:** The composite order is strict, so the same snapshot
//!   always yields the same list whatever order the provider delivered rows in.
//!
//! ## Public API
//!
//! - `ScreeningPipeline`: runs the five stages and returns a `ScreeningOutcome`.
//! - `CompositeRanker`: orders the qualified set into a `CandidateList`.

pub mod pipeline;
pub mod ranker;

pub use pipeline::{
    FilterStage, Rejection, RejectionReason, ScreeningOutcome, ScreeningPipeline, StageReport,
};
pub use ranker::{CandidateList, CompositeRanker, RankedCandidate};
