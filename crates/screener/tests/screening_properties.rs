//! Property tests for screening and ranking invariants.
//!
//! Uses proptest to verify, over random universes:
//! 1. Qualification: every candidate clears every exclusion and every factor flag
//! 2. Funnel accounting: each stock is qualified or rejected exactly once
//! 3. Determinism: provider row order never changes the candidate list
//! 4. Ranking order: ranks are dense and composites never increase down the list

use chrono::NaiveDate;
use configuration::{RankingWeights, ScreeningParams};
use core_types::{SnapshotTradability, StockSnapshot, UniverseSnapshot};
use proptest::prelude::*;
use screener::{CompositeRanker, FilterStage, ScreeningPipeline};
use std::collections::HashSet;

// ── Strategies (proptest) ────────────────────────────────────────────

fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 4, 30).unwrap()
}

type Row = (
    Option<f64>,
    f64,
    f64,
    f64,
    Option<f64>,
    f64,
    f64,
    f64,
    bool,
    bool,
    bool,
    bool,
);

fn arb_row() -> impl Strategy<Value = Row> {
    (
        prop::option::weighted(0.95, -1.0..3.0_f64),
        -1.0..3.0_f64,
        0.0..1.5_f64,
        -2.0..1.0_f64,
        prop::option::weighted(0.95, -0.2..0.4_f64),
        1e6..1e9_f64,
        -0.5..0.5_f64,
        -0.5..1.0_f64,
        prop::bool::weighted(0.1),
        prop::bool::weighted(0.1),
        prop::bool::weighted(0.05),
        prop::bool::weighted(0.05),
    )
}

fn to_snapshots(rows: &[Row]) -> Vec<StockSnapshot> {
    rows.iter()
        .enumerate()
        .map(|(idx, row)| {
            let mut s = StockSnapshot::new(format!("{idx:04}.SZ"), as_of());
            s.ttm_growth = row.0;
            s.prior_growth = Some(row.1);
            s.npap_ratio = Some(row.2);
            s.solvency = Some(row.3);
            s.roe = row.4;
            s.avg_traded_value = Some(row.5);
            s.analyst_revision = Some(row.6);
            s.analyst_growth = Some(row.7);
            s.recent_financing = row.8;
            s.is_st = row.9;
            s.suspended = row.10;
            s.limit_locked = row.11;
            s
        })
        .collect()
}

fn arb_universe() -> impl Strategy<Value = Vec<StockSnapshot>> {
    prop::collection::vec(arb_row(), 1..80).prop_map(|rows| to_snapshots(&rows))
}

// ── 1. Qualification ─────────────────────────────────────────────────

proptest! {
    #[test]
    fn every_candidate_clears_every_stage(stocks in arb_universe()) {
        let universe = UniverseSnapshot::new(as_of(), stocks).unwrap();
        let outcome = ScreeningPipeline::new(ScreeningParams::default())
            .screen(&universe, &SnapshotTradability);

        for scores in &outcome.qualified {
            prop_assert!(scores.passes.all());
            prop_assert!(scores.acceleration > 0.0);
            let snapshot = universe.get(&scores.ticker).unwrap();
            prop_assert!(!snapshot.is_st);
            prop_assert!(!snapshot.recent_financing);
            prop_assert!(!snapshot.suspended);
            prop_assert!(!snapshot.limit_locked);
            prop_assert!(snapshot.ttm_growth.is_some() && snapshot.roe.is_some());
        }
    }
}

// ── 2. Funnel Accounting ─────────────────────────────────────────────

proptest! {
    #[test]
    fn every_stock_is_accounted_for_once(stocks in arb_universe()) {
        let universe = UniverseSnapshot::new(as_of(), stocks).unwrap();
        let outcome = ScreeningPipeline::new(ScreeningParams::default())
            .screen(&universe, &SnapshotTradability);

        prop_assert_eq!(outcome.qualified.len() + outcome.rejections.len(), universe.len());

        let mut seen = HashSet::new();
        for ticker in outcome
            .qualified
            .iter()
            .map(|s| &s.ticker)
            .chain(outcome.rejections.iter().map(|r| &r.ticker))
        {
            prop_assert!(seen.insert(ticker.clone()), "{} accounted twice", ticker);
        }

        let stages: Vec<FilterStage> = outcome.funnel.iter().map(|r| r.stage).collect();
        prop_assert_eq!(stages, FilterStage::ALL.to_vec());
        prop_assert_eq!(outcome.funnel[0].input, universe.len());
        for pair in outcome.funnel.windows(2) {
            prop_assert_eq!(pair[0].passed, pair[1].input);
        }
        for report in &outcome.funnel {
            prop_assert_eq!(outcome.rejected_at(report.stage).count(), report.eliminated());
        }
    }
}

// ── 3. Determinism ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn row_order_does_not_change_the_candidate_list(
        stocks in arb_universe(),
        shift in 0usize..80,
    ) {
        let pipeline = ScreeningPipeline::new(ScreeningParams::default());
        let ranker = CompositeRanker::new(RankingWeights::default());

        let mut rotated = stocks.clone();
        let len = rotated.len();
        rotated.rotate_left(shift % len);
        rotated.reverse();

        let first = UniverseSnapshot::new(as_of(), stocks).unwrap();
        let second = UniverseSnapshot::new(as_of(), rotated).unwrap();

        let a = ranker.rank(&pipeline.screen(&first, &SnapshotTradability));
        let b = ranker.rank(&pipeline.screen(&second, &SnapshotTradability));
        prop_assert_eq!(&a, &b);

        // Running again on the same snapshot is a no-op.
        let again = ranker.rank(&pipeline.screen(&first, &SnapshotTradability));
        prop_assert_eq!(a, again);
    }
}

// ── 4. Ranking Order ─────────────────────────────────────────────────

proptest! {
    #[test]
    fn ranks_are_dense_and_composites_descend(
        stocks in arb_universe(),
        revision_weight in 0.0..1.0_f64,
    ) {
        let universe = UniverseSnapshot::new(as_of(), stocks).unwrap();
        let outcome = ScreeningPipeline::new(ScreeningParams::default())
            .screen(&universe, &SnapshotTradability);
        let weights = RankingWeights {
            revision_weight,
            forecast_weight: 1.0 - revision_weight,
        };
        let list = CompositeRanker::new(weights).rank(&outcome);

        prop_assert_eq!(list.len(), outcome.qualified.len());
        for (idx, candidate) in list.iter().enumerate() {
            prop_assert_eq!(candidate.rank, idx + 1);
            prop_assert!((0.0..=100.0 + 1e-9).contains(&candidate.composite));
        }
        for pair in list.entries().windows(2) {
            prop_assert!(pair[0].composite >= pair[1].composite);
        }
    }
}
