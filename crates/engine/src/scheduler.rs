use crate::calendar::TradingCalendar;
use chrono::{Datelike, NaiveDate};
use core_types::{MonthDay, RollConvention};
use serde::Serialize;
use std::collections::BTreeSet;

/// What the scheduler says about one trading day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SchedulerState {
    Waiting,
    /// Rebalance today. `anchor` is the nominal calendar date that was rolled onto `date`.
    Trigger { anchor: NaiveDate, date: NaiveDate },
}

/// One anchor of one year and the session it resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResolvedAnchor {
    pub anchor: NaiveDate,
    /// `None` when the calendar has no session to roll onto.
    pub date: Option<NaiveDate>,
}

impl ResolvedAnchor {
    pub fn is_substituted(&self) -> bool {
        self.date.is_some_and(|d| d != self.anchor)
    }
}

/// Turns the configured month/day anchors into rebalance triggers.
///
/// Anchors falling on a closed day are rolled onto a session with the configured
/// convention. Each anchor fires at most once, and two anchors landing on the same
/// session fire once between them.
#[derive(Debug, Clone)]
pub struct RebalanceScheduler {
    anchors: Vec<MonthDay>,
    roll: RollConvention,
    fired: BTreeSet<NaiveDate>,
    last_trigger: Option<NaiveDate>,
}

impl RebalanceScheduler {
    pub fn new(anchors: Vec<MonthDay>, roll: RollConvention) -> Self {
        let mut anchors = anchors;
        anchors.sort();
        anchors.dedup();
        Self {
            anchors,
            roll,
            fired: BTreeSet::new(),
            last_trigger: None,
        }
    }

    pub fn roll(&self) -> RollConvention {
        self.roll
    }

    /// The session a nominal anchor date rolls onto.
    pub fn resolve<C>(&self, anchor: NaiveDate, calendar: &C) -> Option<NaiveDate>
    where
        C: TradingCalendar + ?Sized,
    {
        match self.roll {
            RollConvention::Following => calendar.following(anchor),
            RollConvention::Preceding => calendar.preceding(anchor),
            RollConvention::Nearest => {
                match (calendar.following(anchor), calendar.preceding(anchor)) {
                    (Some(after), Some(before)) => {
                        if (after - anchor) <= (anchor - before) {
                            Some(after)
                        } else {
                            Some(before)
                        }
                    }
                    (after, before) => after.or(before),
                }
            }
        }
    }

    /// Every anchor of `year` with its resolved session, in calendar order.
    pub fn resolve_year<C>(&self, year: i32, calendar: &C) -> Vec<ResolvedAnchor>
    where
        C: TradingCalendar + ?Sized,
    {
        let mut resolved: Vec<ResolvedAnchor> = self
            .anchors
            .iter()
            .map(|md| {
                let anchor = md.in_year(year);
                ResolvedAnchor {
                    anchor,
                    date: self.resolve(anchor, calendar),
                }
            })
            .collect();
        resolved.sort_by_key(|r| r.anchor);
        resolved.dedup_by_key(|r| r.anchor);
        resolved
    }

    /// Decides whether `date` is a rebalance day.
    ///
    /// Call once per trading day in ascending order. Anchors of the neighbouring
    /// years are considered too, since a roll can cross a year boundary.
    pub fn on_trading_day<C>(&mut self, date: NaiveDate, calendar: &C) -> SchedulerState
    where
        C: TradingCalendar + ?Sized,
    {
        if !calendar.is_trading_day(date) || self.last_trigger == Some(date) {
            return SchedulerState::Waiting;
        }

        let due: Vec<NaiveDate> = (date.year() - 1..=date.year() + 1)
            .flat_map(|year| self.resolve_year(year, calendar))
            .filter(|r| r.date == Some(date) && !self.fired.contains(&r.anchor))
            .map(|r| r.anchor)
            .collect();

        let Some(&anchor) = due.first() else {
            return SchedulerState::Waiting;
        };
        self.fired.extend(due.iter().copied());
        self.last_trigger = Some(date);

        if anchor != date {
            tracing::info!(
                anchor = %anchor,
                date = %date,
                roll = %self.roll,
                "Rebalance anchor is not a trading day, substituted"
            );
        }
        if due.len() > 1 {
            tracing::info!(date = %date, anchors = due.len(), "Anchors coincide, rebalancing once");
        }
        SchedulerState::Trigger { anchor, date }
    }
}
