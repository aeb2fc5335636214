use crate::error::PortfolioError;
use crate::vacancy::FinalSelection;
use chrono::NaiveDate;
use core_types::{Holdings, Ticker};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

// ==============================================================================
// Target
// ==============================================================================

/// The equal-weight portfolio the engine wants to hold after a rebalance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetPortfolio {
    pub date: NaiveDate,
    weights: BTreeMap<Ticker, Decimal>,
}

impl TargetPortfolio {
    /// Splits the whole portfolio equally over `tickers`.
    ///
    /// `1/K` rarely has an exact decimal form, so the rounding residue goes to the
    /// first (best-ranked) name and the weights sum to exactly one.
    pub fn equal_weight(date: NaiveDate, tickers: &[Ticker]) -> Self {
        let mut weights = BTreeMap::new();
        if let Some((first, rest)) = tickers.split_first() {
            let count = Decimal::from(tickers.len());
            let each = Decimal::ONE / count;
            let residue = Decimal::ONE - each * count;
            weights.insert(first.clone(), each + residue);
            for ticker in rest {
                weights.insert(ticker.clone(), each);
            }
        }
        Self { date, weights }
    }

    pub fn weights(&self) -> &BTreeMap<Ticker, Decimal> {
        &self.weights
    }

    pub fn weight_of(&self, ticker: &Ticker) -> Option<Decimal> {
        self.weights.get(ticker).copied()
    }

    pub fn contains(&self, ticker: &Ticker) -> bool {
        self.weights.contains_key(ticker)
    }

    pub fn total_weight(&self) -> Decimal {
        self.weights.values().copied().sum()
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

// ==============================================================================
// Transition Plan
// ==============================================================================

/// A name held both before and after the rebalance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Retain {
    pub ticker: Ticker,
    pub from_weight: Decimal,
    pub to_weight: Decimal,
}

impl Retain {
    pub fn weight_change(&self) -> Decimal {
        self.to_weight - self.from_weight
    }
}

/// Everything the execution engine needs to move from the current holdings to the target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionPlan {
    pub plan_id: Uuid,
    pub date: NaiveDate,
    pub target: TargetPortfolio,
    /// Held now, absent from the target.
    pub exits: Vec<Ticker>,
    /// In the target, not held now. Listed in rank order.
    pub entries: Vec<Ticker>,
    pub retains: Vec<Retain>,
    /// Fraction of equity to deploy; the rest stays in cash.
    pub target_exposure: Decimal,
}

impl TransitionPlan {
    pub fn is_noop(&self) -> bool {
        self.exits.is_empty()
            && self.entries.is_empty()
            && self.retains.iter().all(|r| r.weight_change().is_zero())
    }
}

// ==============================================================================
// Constructor
// ==============================================================================

/// Turns a final selection and the current holdings into a transition plan.
#[derive(Debug, Clone, Copy)]
pub struct PortfolioConstructor {
    cash_reserve: Decimal,
}

impl PortfolioConstructor {
    pub fn new(cash_reserve: Decimal) -> Result<Self, PortfolioError> {
        if cash_reserve.is_sign_negative() || cash_reserve >= Decimal::ONE {
            return Err(PortfolioError::InvalidCashReserve(cash_reserve));
        }
        Ok(Self { cash_reserve })
    }

    pub fn cash_reserve(&self) -> Decimal {
        self.cash_reserve
    }

    /// Builds the plan. `current` must be a snapshot taken once for this cycle.
    pub fn construct(&self, selection: &FinalSelection, current: &Holdings) -> TransitionPlan {
        let tickers = selection.tickers();
        let target = TargetPortfolio::equal_weight(selection.date, &tickers);

        let exits: Vec<Ticker> = current
            .tickers()
            .filter(|t| !target.contains(t))
            .cloned()
            .collect();

        let mut entries = Vec::new();
        let mut retains = Vec::new();
        for ticker in &tickers {
            let to_weight = target.weight_of(ticker).unwrap_or(Decimal::ZERO);
            if current.contains(ticker) {
                retains.push(Retain {
                    ticker: ticker.clone(),
                    from_weight: current.weight_of(ticker),
                    to_weight,
                });
            } else {
                entries.push(ticker.clone());
            }
        }

        let plan = TransitionPlan {
            plan_id: Uuid::new_v4(),
            date: selection.date,
            target,
            exits,
            entries,
            retains,
            target_exposure: Decimal::ONE - self.cash_reserve,
        };

        tracing::info!(
            plan_id = %plan.plan_id,
            date = %plan.date,
            holdings = plan.target.len(),
            exits = plan.exits.len(),
            entries = plan.entries.len(),
            retains = plan.retains.len(),
            "Transition plan built"
        );
        plan
    }
}
