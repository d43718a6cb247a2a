// Greedy VOR baseline: at each pick take the admissible position with the
// highest expected value over replacement.

use std::collections::HashSet;

use tracing::debug;

use crate::draft::position::Position;
use crate::draft::roster::{RosterCounts, RosterRules, RosterState};
use crate::draft::schedule::SnakeSchedule;
use crate::plan::optimizer::{flex_usage, DraftPlan, PlanError};
use crate::pool::PlayerPool;
use crate::valuation::vor::{best_position, expected_vor};

/// Build a heuristic plan for one slot.
///
/// The gap to the drafter's following pick sizes the replacement window; on
/// the final pick it is one full round. Each entry's points are those of the
/// best player at the chosen position still expected to be on the board,
/// never counting the same player twice for this drafter.
pub fn heuristic_plan(
    pool: &PlayerPool,
    schedule: &SnakeSchedule,
    slot: u32,
    positions: &[Position],
    rules: &RosterRules,
    existing: &RosterCounts,
    anchor_offsets: &[i32],
) -> Result<DraftPlan, PlanError> {
    let picks = schedule.picks_for_slot(slot)?;
    let rounds = picks.len();
    let mut roster = RosterState::with_existing(*existing);
    let mut taken = HashSet::new();
    let mut selections = Vec::with_capacity(rounds);

    for (r, &pick) in picks.iter().enumerate() {
        let next = schedule
            .next_pick_for_slot(slot, pick)?
            .unwrap_or(pick + schedule.num_slots());
        let vor = expected_vor(pool.players(), pick, next - pick, positions, anchor_offsets);

        let Some((position, value)) = best_position(&vor, |p| roster.can_draft(p, rules)) else {
            return Err(PlanError::Infeasible {
                rounds,
                reason: format!("no admissible position at round {} (pick {pick})", r + 1),
            });
        };

        let points = match pool.best_available_excluding(position, pick, &taken) {
            Some((id, player)) => {
                taken.insert(id);
                player.projected_points
            }
            None => 0.0,
        };
        debug!(
            "slot {} pick {}: {} (vor {:.1}, {:.1} pts)",
            slot, pick, position, value, points
        );
        roster.draft(pick, position);
        selections.push((pick, position, points));
    }

    debug!(
        "slot {} heuristic roster {} (flex used {})",
        slot,
        roster.counts(),
        roster.flex_used(rules)
    );
    Ok(DraftPlan::from_selections(
        &selections,
        flex_usage(rules, roster.counts()),
    ))
}
