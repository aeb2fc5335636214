use crate::pipeline::ScreeningOutcome;
use chrono::NaiveDate;
use configuration::RankingWeights;
use core_types::Ticker;
use factors::FactorScoreSet;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Scale both analyst signals are normalised onto before weighting.
const SCALE: f64 = 100.0;

/// A qualified stock with its position in the ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCandidate {
    /// 1-based position in the candidate list.
    pub rank: usize,
    pub composite: f64,
    pub scores: FactorScoreSet,
}

impl RankedCandidate {
    pub fn ticker(&self) -> &Ticker {
        &self.scores.ticker
    }
}

/// Every qualified stock of one period, best first.
///
/// The list is kept whole, not cut to the portfolio size, because vacancies are
/// backfilled from further down.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateList {
    pub date: NaiveDate,
    entries: Vec<RankedCandidate>,
}

impl CandidateList {
    pub fn entries(&self) -> &[RankedCandidate] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RankedCandidate> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn tickers(&self) -> Vec<Ticker> {
        self.entries.iter().map(|c| c.ticker().clone()).collect()
    }

    pub fn find(&self, ticker: &Ticker) -> Option<&RankedCandidate> {
        self.entries.iter().find(|c| c.ticker() == ticker)
    }
}

impl<'a> IntoIterator for &'a CandidateList {
    type Item = &'a RankedCandidate;
    type IntoIter = std::slice::Iter<'a, RankedCandidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Blends analyst revision and growth forecast into one score and orders the
/// qualified set by it.
#[derive(Debug, Clone)]
pub struct CompositeRanker {
    weights: RankingWeights,
}

impl CompositeRanker {
    pub fn new(weights: RankingWeights) -> Self {
        Self { weights }
    }

    /// Ranks the qualified set of a screening outcome.
    ///
    /// Each signal is min-max scaled over the qualified set and the scaled values are
    /// combined with non-negative weights, so raising either signal never lowers a
    /// stock's composite. Order: composite descending, then TTM growth descending,
    /// then ticker ascending. Tickers are unique within a universe, which makes the
    /// order strict.
    pub fn rank(&self, outcome: &ScreeningOutcome) -> CandidateList {
        let qualified = &outcome.qualified;
        let (min_rev, max_rev) = find_min_max(qualified, |s| s.analyst_revision);
        let (min_gro, max_gro) = find_min_max(qualified, |s| s.analyst_growth);

        let mut entries: Vec<RankedCandidate> = qualified
            .iter()
            .map(|scores| {
                let norm_rev = normalize(scores.analyst_revision, min_rev, max_rev);
                let norm_gro = normalize(scores.analyst_growth, min_gro, max_gro);
                let composite = (norm_rev * self.weights.revision_weight)
                    + (norm_gro * self.weights.forecast_weight);
                RankedCandidate {
                    rank: 0,
                    composite,
                    scores: scores.clone(),
                }
            })
            .collect();

        entries.sort_by(compare);
        for (idx, entry) in entries.iter_mut().enumerate() {
            entry.rank = idx + 1;
        }

        if let Some(top) = entries.first() {
            tracing::debug!(
                candidates = entries.len(),
                leader = %top.ticker(),
                composite = top.composite,
                "Candidates ranked"
            );
        }

        CandidateList {
            date: outcome.date,
            entries,
        }
    }
}

/// Best first. Ties on composite fall to higher growth, then to ticker order.
fn compare(a: &RankedCandidate, b: &RankedCandidate) -> Ordering {
    b.composite
        .total_cmp(&a.composite)
        .then_with(|| b.scores.ttm_growth.total_cmp(&a.scores.ttm_growth))
        .then_with(|| a.scores.ticker.cmp(&b.scores.ticker))
}

/// Min and max of one signal across the set.
fn find_min_max<F>(scores: &[FactorScoreSet], accessor: F) -> (f64, f64)
where
    F: Fn(&FactorScoreSet) -> f64,
{
    scores
        .iter()
        .map(accessor)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), val| {
            (min.min(val), max.max(val))
        })
}

/// Maps a value onto `[0, SCALE]`; a flat signal sits at the midpoint.
fn normalize(value: f64, min: f64, max: f64) -> f64 {
    if min == max {
        return SCALE / 2.0;
    }
    let span = max - min;
    if span.is_finite() {
        (value - min) / span * SCALE
    } else {
        // The range overflows f64; halving both ends keeps it representable.
        (value / 2.0 - min / 2.0) / (max / 2.0 - min / 2.0) * SCALE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use factors::FactorPasses;

    fn scores(ticker: &str, growth: f64, revision: f64, forecast: f64) -> FactorScoreSet {
        FactorScoreSet {
            ticker: Ticker::from(ticker),
            ttm_growth: growth,
            growth_percentile: 1.0,
            acceleration: 0.1,
            acceleration_percentile: 1.0,
            liquidity_percentile: 1.0,
            analyst_revision: revision,
            analyst_growth: forecast,
            passes: FactorPasses {
                growth: true,
                acceleration: true,
                npap: true,
                solvency: true,
                roe: true,
                liquidity: true,
            },
        }
    }

    fn outcome(qualified: Vec<FactorScoreSet>) -> ScreeningOutcome {
        ScreeningOutcome {
            date: NaiveDate::from_ymd_opt(2024, 10, 31).unwrap(),
            qualified,
            rejections: Vec::new(),
            funnel: Vec::new(),
        }
    }

    #[test]
    fn orders_by_composite_then_growth_then_ticker() {
        let ranker = CompositeRanker::new(RankingWeights::default());
        let list = ranker.rank(&outcome(vec![
            scores("DDD", 0.3, 0.0, 0.0),
            scores("CCC", 0.5, 0.5, 0.5),
            scores("BBB", 0.5, 0.5, 0.5),
            scores("AAA", 0.9, 0.5, 0.5),
            scores("EEE", 0.1, 1.0, 1.0),
        ]));
        let order: Vec<&str> = list.iter().map(|c| c.ticker().as_str()).collect();
        assert_eq!(order, vec!["EEE", "AAA", "BBB", "CCC", "DDD"]);
        let ranks: Vec<usize> = list.iter().map(|c| c.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3, 4, 5]);
        assert_eq!(list.find(&Ticker::from("EEE")).unwrap().composite, 100.0);
        assert_eq!(list.find(&Ticker::from("DDD")).unwrap().composite, 0.0);
    }

    #[test]
    fn flat_signals_sit_at_the_midpoint() {
        let ranker = CompositeRanker::new(RankingWeights::default());
        let list = ranker.rank(&outcome(vec![
            scores("AAA", 0.2, 0.3, 0.3),
            scores("BBB", 0.4, 0.3, 0.3),
        ]));
        assert!(list.iter().all(|c| c.composite == 50.0));
        // Equal composites: growth decides.
        assert_eq!(list.entries()[0].ticker().as_str(), "BBB");
    }

    #[test]
    fn raising_a_signal_never_lowers_the_composite() {
        let ranker = CompositeRanker::new(RankingWeights {
            revision_weight: 0.3,
            forecast_weight: 0.7,
        });
        let base = vec![
            scores("AAA", 0.2, 0.10, 0.05),
            scores("BBB", 0.3, 0.20, 0.15),
            scores("CCC", 0.4, 0.05, 0.25),
        ];
        let before = ranker.rank(&outcome(base.clone()));

        let mut improved = base;
        improved[0].analyst_revision = 0.15;
        let after = ranker.rank(&outcome(improved));

        let ticker = Ticker::from("AAA");
        assert!(after.find(&ticker).unwrap().composite >= before.find(&ticker).unwrap().composite);
    }

    #[test]
    fn extreme_signal_range_still_scales_into_bounds() {
        let ranker = CompositeRanker::new(RankingWeights::default());
        let list = ranker.rank(&outcome(vec![
            scores("AAA", 0.2, -1e308, 0.1),
            scores("BBB", 0.2, 0.0, 0.1),
            scores("CCC", 0.2, 1e308, 0.1),
        ]));
        assert!(list.iter().all(|c| c.composite.is_finite()));
        let order: Vec<&str> = list.iter().map(|c| c.ticker().as_str()).collect();
        assert_eq!(order, vec!["CCC", "BBB", "AAA"]);
        assert_eq!(list.find(&Ticker::from("CCC")).unwrap().composite, 75.0);
        assert_eq!(list.find(&Ticker::from("BBB")).unwrap().composite, 50.0);
        assert_eq!(list.find(&Ticker::from("AAA")).unwrap().composite, 25.0);
    }

    #[test]
    fn empty_set_ranks_to_empty_list() {
        let list = CompositeRanker::new(RankingWeights::default()).rank(&outcome(Vec::new()));
        assert!(list.is_empty());
    }
}
