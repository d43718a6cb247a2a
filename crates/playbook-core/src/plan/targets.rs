// Player targets: the concrete player behind each planned round.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use crate::draft::position::Position;
use crate::plan::league::LeaguePlan;
use crate::plan::optimizer::DraftPlan;
use crate::pool::{PlayerId, PlayerPool};

/// The best-projected player expected to be on the board at a planned pick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerTarget {
    pub slot: u32,
    pub round: u32,
    pub pick: u32,
    pub position: Position,
    /// `None` when no player at the position has an ADP at or after the pick.
    pub player: Option<String>,
    pub projected_points: f64,
    pub adp: Option<f64>,
}

/// How often a player is targeted across the league.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetFrequency {
    pub player: String,
    pub position: Position,
    pub times_targeted: usize,
}

/// Targets for one drafter's plan. A player already targeted in an earlier
/// round is skipped so each round names a distinct player.
pub fn targets_for_plan(pool: &PlayerPool, slot: u32, plan: &DraftPlan) -> Vec<PlayerTarget> {
    let mut taken: HashSet<PlayerId> = HashSet::new();
    plan.entries()
        .iter()
        .map(|entry| {
            let found = pool.best_available_excluding(entry.position, entry.pick, &taken);
            if let Some((id, _)) = found {
                taken.insert(id);
            }
            PlayerTarget {
                slot,
                round: entry.round,
                pick: entry.pick,
                position: entry.position,
                player: found.map(|(_, p)| p.name.clone()),
                projected_points: found.map_or(0.0, |(_, p)| p.projected_points),
                adp: found.map(|(_, p)| p.adp),
            }
        })
        .collect()
}

/// Targets for every drafter, ordered by slot then round.
pub fn league_targets(pool: &PlayerPool, league: &LeaguePlan) -> Vec<PlayerTarget> {
    league
        .drafters()
        .iter()
        .flat_map(|d| targets_for_plan(pool, d.slot, &d.plan))
        .collect()
}

/// Count named targets per player, most targeted first; ties by name.
pub fn target_frequency(targets: &[PlayerTarget]) -> Vec<TargetFrequency> {
    let mut counts: BTreeMap<(&str, Position), usize> = BTreeMap::new();
    for t in targets {
        if let Some(name) = &t.player {
            *counts.entry((name.as_str(), t.position)).or_insert(0) += 1;
        }
    }
    let mut out: Vec<TargetFrequency> = counts
        .into_iter()
        .map(|((player, position), times_targeted)| TargetFrequency {
            player: player.to_string(),
            position,
            times_targeted,
        })
        .collect();
    out.sort_by(|a, b| {
        b.times_targeted
            .cmp(&a.times_targeted)
            .then_with(|| a.player.cmp(&b.player))
    });
    out
}
