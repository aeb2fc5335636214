use chrono::NaiveDate;
use core_types::{ExecutionTradability, Ticker, Untradable};
use screener::{CandidateList, RankedCandidate};
use serde::{Deserialize, Serialize};

/// A provisional selection that could not be traded at execution time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vacancy {
    pub ticker: Ticker,
    /// The candidate's rank in the list it was drawn from.
    pub rank: usize,
    pub reason: Untradable,
}

/// The names that will actually be held, in rank order, plus the ones skipped on the way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalSelection {
    /// The execution date the tradability checks were made for.
    pub date: NaiveDate,
    pub selected: Vec<RankedCandidate>,
    pub vacancies: Vec<Vacancy>,
}

impl FinalSelection {
    pub fn tickers(&self) -> Vec<Ticker> {
        self.selected.iter().map(|c| c.ticker().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Names taken from below the provisional cut-off to fill a vacancy.
    pub fn backfills(&self, top_n: usize) -> impl Iterator<Item = &RankedCandidate> {
        self.selected.iter().filter(move |c| c.rank > top_n)
    }
}

/// Secures up to `top_n` names that are tradable on the execution date.
#[derive(Debug, Clone, Copy)]
pub struct VacancyResolver {
    top_n: usize,
}

impl VacancyResolver {
    pub fn new(top_n: usize) -> Self {
        Self { top_n }
    }

    pub fn top_n(&self) -> usize {
        self.top_n
    }

    /// Walks the candidate list in rank order, re-checking each name on `execution_date`.
    ///
    /// The first `top_n` candidates are the provisional selection. An untradable one
    /// becomes a vacancy and the next untried candidate is considered in its place, so
    /// survivors keep their relative order. An exhausted list yields a short selection.
    pub fn resolve<T>(
        &self,
        candidates: &CandidateList,
        execution_date: NaiveDate,
        tradability: &T,
    ) -> FinalSelection
    where
        T: ExecutionTradability + ?Sized,
    {
        let mut selected = Vec::with_capacity(self.top_n.min(candidates.len()));
        let mut vacancies = Vec::new();

        for candidate in candidates {
            if selected.len() == self.top_n {
                break;
            }
            match tradability.check(candidate.ticker(), execution_date) {
                Ok(()) => {
                    if candidate.rank > self.top_n {
                        tracing::info!(
                            ticker = %candidate.ticker(),
                            rank = candidate.rank,
                            "Vacancy backfilled"
                        );
                    }
                    selected.push(candidate.clone());
                }
                Err(reason) => {
                    tracing::warn!(
                        ticker = %candidate.ticker(),
                        rank = candidate.rank,
                        %reason,
                        date = %execution_date,
                        "Candidate untradable at execution, skipping"
                    );
                    vacancies.push(Vacancy {
                        ticker: candidate.ticker().clone(),
                        rank: candidate.rank,
                        reason,
                    });
                }
            }
        }

        if selected.len() < self.top_n {
            tracing::warn!(
                secured = selected.len(),
                wanted = self.top_n,
                "Candidate list exhausted before the portfolio was full"
            );
        }

        FinalSelection {
            date: execution_date,
            selected,
            vacancies,
        }
    }
}
