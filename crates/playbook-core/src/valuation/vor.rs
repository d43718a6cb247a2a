// Value Over Replacement (VOR) for a pick window.
//
// For a drafter on the clock at `pick_number` who picks again
// `picks_until_next` picks later, a position's VOR is the best projection
// still on the board now minus the best projection expected to survive until
// the next turn. ADP is noisy, so the estimate is averaged over a few anchor
// picks around `pick_number`.

use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::Serialize;

use crate::draft::position::Position;
use crate::pool::{PlayerPool, PlayerRecord};

/// Offsets applied to the pick number when sampling availability.
pub const DEFAULT_ANCHOR_OFFSETS: [i32; 3] = [0, -6, 6];

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// How a position value was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ValueSource {
    /// Every anchor found both an available and a replacement player.
    Computed,
    /// At least one anchor was missing a player on one side; missing sides
    /// contributed 0 points.
    Partial,
    /// No anchor found any available player; the value is the fallback 0.
    Fallback,
}

/// Expected VOR for one position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PositionVor {
    pub vor: f64,
    /// Anchors that fell on a valid pick (>= 1).
    pub anchors: usize,
    /// Anchors where either side of the difference had no eligible player.
    pub gaps: usize,
    pub source: ValueSource,
}

impl PositionVor {
    fn fallback() -> Self {
        PositionVor {
            vor: 0.0,
            anchors: 0,
            gaps: 0,
            source: ValueSource::Fallback,
        }
    }
}

pub type VorByPosition = BTreeMap<Position, PositionVor>;

/// Best projections on both sides of a single anchor.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SingleVor {
    pub best_available: Option<f64>,
    pub best_replacement: Option<f64>,
}

impl SingleVor {
    /// Difference with absent sides counted as 0.
    pub fn vor(&self) -> f64 {
        self.best_available.unwrap_or(0.0) - self.best_replacement.unwrap_or(0.0)
    }

    fn has_gap(&self) -> bool {
        self.best_available.is_none() || self.best_replacement.is_none()
    }
}

// ---------------------------------------------------------------------------
// Core computation
// ---------------------------------------------------------------------------

fn max_into(slot: &mut Option<f64>, value: f64) {
    *slot = Some(slot.map_or(value, |cur| cur.max(value)));
}

/// VOR at a single anchor pick.
///
/// `best_available` is the top projection among players with
/// `adp >= anchor_pick`; `best_replacement` the top among players with
/// `adp >= replacement_pick`.
pub fn single_vor<'a, I>(
    players: I,
    positions: &[Position],
    anchor_pick: i64,
    replacement_pick: i64,
) -> BTreeMap<Position, SingleVor>
where
    I: IntoIterator<Item = &'a PlayerRecord>,
{
    let mut out: BTreeMap<Position, SingleVor> =
        positions.iter().map(|&p| (p, SingleVor::default())).collect();
    let anchor = anchor_pick as f64;
    let replacement = replacement_pick as f64;

    for player in players {
        let Some(entry) = out.get_mut(&player.position) else {
            continue;
        };
        if player.adp >= anchor {
            max_into(&mut entry.best_available, player.projected_points);
        }
        if player.adp >= replacement {
            max_into(&mut entry.best_replacement, player.projected_points);
        }
    }
    out
}

/// Expected VOR per position, averaged over the anchor offsets.
///
/// Anchors landing before pick 1 are skipped. Every requested position is
/// present in the result; positions without data carry
/// `ValueSource::Fallback` and a VOR of 0.
pub fn expected_vor<'a, I>(
    players: I,
    pick_number: u32,
    picks_until_next: u32,
    positions: &[Position],
    anchor_offsets: &[i32],
) -> VorByPosition
where
    I: IntoIterator<Item = &'a PlayerRecord> + Clone,
{
    let mut sums: BTreeMap<Position, (f64, usize, usize, usize)> =
        positions.iter().map(|&p| (p, (0.0, 0, 0, 0))).collect();

    for &offset in anchor_offsets {
        let anchor = i64::from(pick_number) + i64::from(offset);
        if anchor < 1 {
            continue;
        }
        let next = anchor + i64::from(picks_until_next);
        for (pos, single) in single_vor(players.clone(), positions, anchor, next) {
            if let Some((sum, anchors, gaps, missing)) = sums.get_mut(&pos) {
                *sum += single.vor();
                *anchors += 1;
                if single.has_gap() {
                    *gaps += 1;
                }
                if single.best_available.is_none() {
                    *missing += 1;
                }
            }
        }
    }

    sums.into_iter()
        .map(|(pos, (sum, anchors, gaps, missing))| {
            let value = if anchors == 0 || missing == anchors {
                PositionVor {
                    anchors,
                    gaps,
                    ..PositionVor::fallback()
                }
            } else {
                PositionVor {
                    vor: sum / anchors as f64,
                    anchors,
                    gaps,
                    source: if gaps > 0 {
                        ValueSource::Partial
                    } else {
                        ValueSource::Computed
                    },
                }
            };
            (pos, value)
        })
        .collect()
}

/// Highest-VOR position among those `admissible` accepts. Equal values keep
/// the earlier position in canonical order.
pub fn best_position<F>(vor: &VorByPosition, mut admissible: F) -> Option<(Position, f64)>
where
    F: FnMut(Position) -> bool,
{
    let mut best: Option<(Position, f64)> = None;
    for (&pos, value) in vor {
        if !admissible(pos) {
            continue;
        }
        match best {
            Some((_, v)) if value.vor <= v => {}
            _ => best = Some((pos, value.vor)),
        }
    }
    best
}

// ---------------------------------------------------------------------------
// VOR playbook table
// ---------------------------------------------------------------------------

/// Expected VOR for one (pick, gap) combination.
#[derive(Debug, Clone, PartialEq)]
pub struct VorTableRow {
    pub pick_number: u32,
    pub picks_until_next: u32,
    pub vor: VorByPosition,
}

/// Expected VOR for every pick in `1..=max_pick` and every gap in
/// `1..=max_gap`, ordered by pick then gap.
pub fn vor_table(
    pool: &PlayerPool,
    max_pick: u32,
    max_gap: u32,
    positions: &[Position],
    anchor_offsets: &[i32],
) -> Vec<VorTableRow> {
    (1..=max_pick)
        .into_par_iter()
        .flat_map_iter(|pick_number| {
            (1..=max_gap).map(move |picks_until_next| VorTableRow {
                pick_number,
                picks_until_next,
                vor: expected_vor(
                    pool.players(),
                    pick_number,
                    picks_until_next,
                    positions,
                    anchor_offsets,
                ),
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
