// Football positions drafted in the snake draft.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Draftable positions.
///
/// The derived `Ord` follows the declaration order, which is also the
/// canonical tie-break order used whenever two positions score equally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Position {
    Quarterback,
    RunningBack,
    WideReceiver,
    TightEnd,
    Defense,
    Kicker,
}

impl Position {
    /// Every position in canonical order.
    pub const ALL: [Position; 6] = [
        Position::Quarterback,
        Position::RunningBack,
        Position::WideReceiver,
        Position::TightEnd,
        Position::Defense,
        Position::Kicker,
    ];

    /// Parse a position string into a Position enum.
    ///
    /// Accepts the usual abbreviations plus a few aliases seen in projection
    /// exports ("D/ST", "DST", "K").
    pub fn from_str_pos(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "QB" => Some(Position::Quarterback),
            "RB" => Some(Position::RunningBack),
            "WR" => Some(Position::WideReceiver),
            "TE" => Some(Position::TightEnd),
            "DEF" | "DST" | "D/ST" => Some(Position::Defense),
            "PK" | "K" => Some(Position::Kicker),
            _ => None,
        }
    }

    /// Return the display string for this position.
    pub fn display_str(&self) -> &'static str {
        match self {
            Position::Quarterback => "QB",
            Position::RunningBack => "RB",
            Position::WideReceiver => "WR",
            Position::TightEnd => "TE",
            Position::Defense => "DEF",
            Position::Kicker => "PK",
        }
    }

    /// Index into `Position::ALL`.
    pub fn sort_order(&self) -> usize {
        match self {
            Position::Quarterback => 0,
            Position::RunningBack => 1,
            Position::WideReceiver => 2,
            Position::TightEnd => 3,
            Position::Defense => 4,
            Position::Kicker => 5,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_str())
    }
}

/// Parse a list of position strings, returning the first unrecognised one as
/// the error value.
pub fn parse_positions<S: AsRef<str>>(values: &[S]) -> Result<Vec<Position>, String> {
    values
        .iter()
        .map(|v| Position::from_str_pos(v.as_ref()).ok_or_else(|| v.as_ref().to_string()))
        .collect()
}
