use serde::{Deserialize, Serialize};

/// The balance-sheet lines the solvency score is built from.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BalanceSheet {
    pub short_term_borrowing: f64,
    pub short_term_bonds: f64,
    pub non_current_liabilities_due_within_one_year: f64,
    pub monetary_capital: f64,
    pub trading_financial_assets: f64,
    pub net_operating_cash: f64,
    pub total_assets: f64,
    pub total_liabilities: f64,
}

/// Liquid cash net of short-term debt, per unit of net assets.
///
/// `cash = monetary capital + trading financial assets - net operating cash` and
/// `short-term debt = borrowing + bonds + non-current liabilities due within a year`.
/// `None` when net assets are zero.
pub fn solvency_ratio(sheet: &BalanceSheet) -> Option<f64> {
    let short_term_debt = sheet.short_term_borrowing
        + sheet.short_term_bonds
        + sheet.non_current_liabilities_due_within_one_year;
    let cash =
        sheet.monetary_capital + sheet.trading_financial_assets - sheet.net_operating_cash;
    let net_assets = sheet.total_assets - sheet.total_liabilities;
    if net_assets == 0.0 {
        return None;
    }
    let score = (cash - short_term_debt) / net_assets;
    score.is_finite().then_some(score)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cash_rich_company_scores_positive() {
        let sheet = BalanceSheet {
            short_term_borrowing: 100.0,
            short_term_bonds: 0.0,
            non_current_liabilities_due_within_one_year: 50.0,
            monetary_capital: 400.0,
            trading_financial_assets: 50.0,
            net_operating_cash: 100.0,
            total_assets: 1_000.0,
            total_liabilities: 400.0,
        };
        // (350 - 150) / 600
        assert!((solvency_ratio(&sheet).unwrap() - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn zero_net_assets_has_no_score() {
        let sheet = BalanceSheet {
            total_assets: 500.0,
            total_liabilities: 500.0,
            ..BalanceSheet::default()
        };
        assert_eq!(solvency_ratio(&sheet), None);
    }
}
