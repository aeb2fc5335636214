//! Cross-sectional percentile ranks.
//!
//! Every relative threshold of the screen is expressed against these ranks, and
//! the ranks are always recomputed from the values handed in. Nothing here keeps
//! state between calls, so the same raw value can pass in one period and fail in
//! the next purely because the rest of the universe moved.

/// Percentile rank of every value within `values`, in input order.
///
/// The rank of `v` is the share of the *other* values below it, with each tie
/// counted as half: `(count(x < v) + (count(x == v) - 1) / 2) / (n - 1)`. A unique
/// minimum therefore ranks `0.0`, a unique maximum `1.0`, tied values share the
/// midpoint of the positions they occupy, and a single value ranks `1.0`.
///
/// Values must be finite; callers screen out gaps before ranking.
pub fn percentile_ranks(values: &[f64]) -> Vec<f64> {
    debug_assert!(values.iter().all(|v| v.is_finite()));
    match values.len() {
        0 => Vec::new(),
        1 => vec![1.0],
        n => {
            let mut sorted = values.to_vec();
            sorted.sort_by(f64::total_cmp);
            let denominator = (n - 1) as f64;
            values
                .iter()
                .map(|v| {
                    let below = sorted.partition_point(|x| x < v);
                    let up_to = sorted.partition_point(|x| x <= v);
                    let tied_others = up_to - below - 1;
                    (below as f64 + tied_others as f64 / 2.0) / denominator
                })
                .collect()
        }
    }
}

/// Pass flags for "rank at least `min_percentile`".
pub fn at_least(values: &[f64], min_percentile: f64) -> Vec<bool> {
    percentile_ranks(values)
        .into_iter()
        .map(|rank| rank >= min_percentile)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn ranks_span_zero_to_one() {
        let ranks = percentile_ranks(&[3.0, 1.0, 2.0]);
        assert_eq!(ranks, vec![1.0, 0.0, 0.5]);
    }

    #[test]
    fn ties_share_the_midpoint_rank() {
        let ranks = percentile_ranks(&[5.0, 5.0, 1.0, 9.0]);
        assert_eq!(ranks[0], ranks[1]);
        assert_eq!(ranks[0], 0.5);
        assert_eq!(ranks[2], 0.0);
        assert_eq!(ranks[3], 1.0);
    }

    #[test]
    fn degenerate_inputs() {
        assert!(percentile_ranks(&[]).is_empty());
        assert_eq!(percentile_ranks(&[42.0]), vec![1.0]);
        assert_eq!(percentile_ranks(&[7.0, 7.0, 7.0]), vec![0.5, 0.5, 0.5]);
    }

    #[test]
    fn top_third_of_one_hundred_is_thirty_three_names() {
        let values: Vec<f64> = (0..100).map(f64::from).collect();
        let passed = at_least(&values, 0.667).into_iter().filter(|p| *p).count();
        assert_eq!(passed, 33);
    }

    #[test]
    fn bottom_decile_is_cut_from_one_hundred() {
        let values: Vec<f64> = (0..100).map(f64::from).collect();
        let flags = at_least(&values, 0.10);
        assert_eq!(flags.iter().filter(|p| **p).count(), 90);
        assert!(flags[..10].iter().all(|p| !p));
    }

    #[test]
    fn same_value_can_pass_or_fail_depending_on_the_universe() {
        // 10.0 is the best of a weak universe and the worst of a strong one.
        assert!(at_least(&[10.0, 1.0, 2.0], 0.667)[0]);
        assert!(!at_least(&[10.0, 20.0, 30.0], 0.667)[0]);
    }

    proptest! {
        #[test]
        fn ranks_are_monotone_in_the_value(values in prop::collection::vec(-1e6..1e6_f64, 1..60)) {
            let ranks = percentile_ranks(&values);
            prop_assert_eq!(ranks.len(), values.len());
            for i in 0..values.len() {
                prop_assert!((0.0..=1.0).contains(&ranks[i]));
                for j in 0..values.len() {
                    if values[i] < values[j] {
                        prop_assert!(ranks[i] < ranks[j]);
                    } else if values[i] == values[j] {
                        prop_assert_eq!(ranks[i], ranks[j]);
                    }
                }
            }
        }
    }
}
