use crate::constructor::TransitionPlan;
use crate::error::ExecutionError;
use core_types::{Holdings, Position, Ticker};
use rust_decimal::Decimal;

/// The boundary to whatever turns a plan into trades.
///
/// An engine receives the plan together with the holdings it was built against and
/// reports back the holdings it ended up with. Order matching, partial fills and
/// costs all live behind this trait.
pub trait ExecutionEngine {
    fn execute(
        &mut self,
        plan: &TransitionPlan,
        current: &Holdings,
    ) -> Result<Holdings, ExecutionError>;
}

/// Fills every plan at its target weights immediately.
///
/// Quantities are the notional allocated to each line: `equity * exposure * weight`.
/// No prices are involved.
#[derive(Debug, Clone)]
pub struct InstantExecution {
    equity: Decimal,
}

impl InstantExecution {
    pub fn new(equity: Decimal) -> Self {
        Self { equity }
    }

    pub fn equity(&self) -> Decimal {
        self.equity
    }
}

impl Default for InstantExecution {
    fn default() -> Self {
        Self::new(Decimal::ONE_THOUSAND * Decimal::ONE_THOUSAND)
    }
}

impl ExecutionEngine for InstantExecution {
    fn execute(
        &mut self,
        plan: &TransitionPlan,
        current: &Holdings,
    ) -> Result<Holdings, ExecutionError> {
        // 1. The plan must describe the holdings we were handed.
        let stale = |ticker: &Ticker, detail: &'static str| ExecutionError::StalePlan {
            plan: plan.plan_id.to_string(),
            ticker: ticker.clone(),
            detail,
        };
        if let Some(ticker) = plan.exits.iter().find(|t| !current.contains(t)) {
            return Err(stale(ticker, "is an exit but is not held"));
        }
        if let Some(ticker) = plan.entries.iter().find(|t| current.contains(t)) {
            return Err(stale(ticker, "is an entry but is already held"));
        }
        if let Some(retain) = plan.retains.iter().find(|r| {
            !current.contains(&r.ticker) || current.weight_of(&r.ticker) != r.from_weight
        }) {
            return Err(stale(&retain.ticker, "is retained from a different weight"));
        }

        // 2. Rebuild the book from the target.
        let deployed = self.equity * plan.target_exposure;
        let positions = plan
            .target
            .weights()
            .iter()
            .map(|(ticker, weight)| {
                let position = Position {
                    weight: *weight,
                    quantity: deployed * *weight,
                };
                (ticker.clone(), position)
            })
            .collect();

        tracing::debug!(
            plan_id = %plan.plan_id,
            sold = plan.exits.len(),
            bought = plan.entries.len(),
            "Plan filled"
        );

        Ok(Holdings {
            as_of: Some(plan.date),
            positions,
        })
    }
}
