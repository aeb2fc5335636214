use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Why a stock cannot be traded on a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Untradable {
    /// Trading in the stock is halted for the whole session.
    Suspended,
    /// Price sits on the regulatory up/down bound, so orders cannot be matched.
    LimitLocked,
    /// The provider has no quote for the stock on that day.
    NoQuote,
    /// Flagged special treatment (ST) on that day.
    SpecialTreatment,
}

impl fmt::Display for Untradable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Untradable::Suspended => write!(f, "suspended"),
            Untradable::LimitLocked => write!(f, "limit-locked"),
            Untradable::NoQuote => write!(f, "no quote"),
            Untradable::SpecialTreatment => write!(f, "special treatment"),
        }
    }
}

/// Direction used to move a calendar anchor that is not a trading day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RollConvention {
    /// First trading day on or after the anchor.
    #[default]
    Following,
    /// Last trading day on or before the anchor.
    Preceding,
    /// Whichever of the two is closer; a tie goes to `Following`.
    Nearest,
}

impl fmt::Display for RollConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RollConvention::Following => write!(f, "following"),
            RollConvention::Preceding => write!(f, "preceding"),
            RollConvention::Nearest => write!(f, "nearest"),
        }
    }
}

impl FromStr for RollConvention {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "following" => Ok(RollConvention::Following),
            "preceding" => Ok(RollConvention::Preceding),
            "nearest" => Ok(RollConvention::Nearest),
            other => Err(CoreError::InvalidInput(
                "roll convention".to_string(),
                format!("'{other}' is not one of following, preceding, nearest"),
            )),
        }
    }
}
