//! Earnings-based inputs derived from reported profit figures.

/// Trailing-twelve-month net profit growth: `current / previous - 1`.
///
/// `None` when the previous figure is zero or either figure is not finite.
pub fn ttm_growth(current: f64, previous: f64) -> Option<f64> {
    ratio(current, previous).map(|r| r - 1.0)
}

/// Net profit after adjustment over net profit, the quality-of-earnings ratio.
pub fn npap_ratio(net_profit_after_adjustment: f64, net_profit: f64) -> Option<f64> {
    ratio(net_profit_after_adjustment, net_profit)
}

fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 {
        return None;
    }
    let value = numerator / denominator;
    value.is_finite().then_some(value)
}
