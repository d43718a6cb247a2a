// League-wide planning: one optimizer run per draft slot.

use rayon::prelude::*;
use tracing::{debug, info};

use crate::draft::roster::RosterCounts;
use crate::draft::schedule::SnakeSchedule;
use crate::plan::optimizer::{DraftPlan, PlanError, RosterOptimizer};
use crate::pool::PlayerPool;
use crate::valuation::projections::ProjectionMatrix;

/// The optimal plan for one draft slot.
#[derive(Debug, Clone, PartialEq)]
pub struct DrafterPlan {
    pub slot: u32,
    pub picks: Vec<u32>,
    pub plan: DraftPlan,
}

/// Plans for every slot, ordered by slot.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LeaguePlan {
    drafters: Vec<DrafterPlan>,
}

impl LeaguePlan {
    pub fn drafters(&self) -> &[DrafterPlan] {
        &self.drafters
    }

    pub fn get(&self, slot: u32) -> Option<&DrafterPlan> {
        self.drafters.iter().find(|d| d.slot == slot)
    }

    /// `(slot, total projected points)` for each drafter.
    pub fn point_totals(&self) -> Vec<(u32, f64)> {
        self.drafters
            .iter()
            .map(|d| (d.slot, d.plan.total_points()))
            .collect()
    }

    /// Slot with the highest planned total; ties keep the earlier slot.
    pub fn best_slot(&self) -> Option<(u32, f64)> {
        self.point_totals()
            .into_iter()
            .fold(None, |best, (slot, total)| match best {
                Some((_, b)) if total <= b => best,
                _ => Some((slot, total)),
            })
    }
}

/// Optimal plan for a single slot.
pub fn plan_slot(
    pool: &PlayerPool,
    schedule: &SnakeSchedule,
    optimizer: &RosterOptimizer,
    slot: u32,
    existing: &RosterCounts,
    anchor_offsets: &[i32],
) -> Result<DrafterPlan, PlanError> {
    let picks = schedule.picks_for_slot(slot)?;
    let matrix = ProjectionMatrix::build(pool, &picks, optimizer.positions(), anchor_offsets);
    let fallbacks = matrix.fallback_cells().count();
    if fallbacks > 0 {
        debug!("slot {}: {} matrix cells had no eligible player", slot, fallbacks);
    }
    let plan = optimizer.solve(&picks, &matrix, existing)?;
    Ok(DrafterPlan { slot, picks, plan })
}

/// Run the optimizer for every slot in parallel. Each slot builds its own
/// projection matrix; nothing is shared mutably between workers.
pub fn plan_league(
    pool: &PlayerPool,
    schedule: &SnakeSchedule,
    optimizer: &RosterOptimizer,
    existing: &RosterCounts,
    anchor_offsets: &[i32],
) -> Result<LeaguePlan, PlanError> {
    let drafters = (1..=schedule.num_slots())
        .into_par_iter()
        .map(|slot| plan_slot(pool, schedule, optimizer, slot, existing, anchor_offsets))
        .collect::<Result<Vec<_>, _>>()?;

    let plan = LeaguePlan { drafters };
    if let Some((slot, total)) = plan.best_slot() {
        info!(
            "Planned {} slots; best projected total {:.1} at slot {}",
            plan.drafters.len(),
            total,
            slot
        );
    }
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::position::Position;
    use crate::draft::roster::{PositionConstraintGroup, RosterRules};
    use crate::pool::PlayerRecord;
    use crate::valuation::vor::DEFAULT_ANCHOR_OFFSETS;

    fn rules() -> RosterRules {
        RosterRules::new(
            vec![
                PositionConstraintGroup::new(vec![Position::Quarterback], 1, false),
                PositionConstraintGroup::new(vec![Position::RunningBack], 1, true),
                PositionConstraintGroup::new(vec![Position::WideReceiver], 1, true),
            ],
            1,
        )
    }

    fn pool() -> PlayerPool {
        let mut players = Vec::new();
        for i in 0..6 {
            let adp = f64::from(i * 2 + 1);
            players.push(PlayerRecord::new(
                &format!("QB{i}"),
                Position::Quarterback,
                "T",
                300.0 - f64::from(i) * 10.0,
                adp,
            ));
            players.push(PlayerRecord::new(
                &format!("RB{i}"),
                Position::RunningBack,
                "T",
                250.0 - f64::from(i) * 20.0,
                adp + 1.0,
            ));
            players.push(PlayerRecord::new(
                &format!("WR{i}"),
                Position::WideReceiver,
                "T",
                240.0 - f64::from(i) * 15.0,
                adp + 0.5,
            ));
        }
        PlayerPool::new(players).unwrap()
    }

    #[test]
    fn plans_every_slot_in_order() {
        let schedule = SnakeSchedule::new(4, 3).unwrap();
        let optimizer = RosterOptimizer::new(
            &[Position::Quarterback, Position::RunningBack, Position::WideReceiver],
            rules(),
        )
        .unwrap();
        let league = plan_league(
            &pool(),
            &schedule,
            &optimizer,
            &RosterCounts::new(),
            &DEFAULT_ANCHOR_OFFSETS,
        )
        .unwrap();

        assert_eq!(league.drafters().len(), 4);
        for (i, drafter) in league.drafters().iter().enumerate() {
            assert_eq!(drafter.slot, i as u32 + 1);
            assert_eq!(drafter.picks, schedule.picks_for_slot(drafter.slot).unwrap());
            assert_eq!(drafter.plan.entries().len(), 3);
            assert!(rules().admits(&drafter.plan.position_counts()));
        }
        assert_eq!(league.point_totals().len(), 4);
        assert!(league.best_slot().is_some());
        assert_eq!(league.get(2).unwrap().picks, vec![2, 7, 10]);
    }

    #[test]
    fn infeasible_slot_fails_the_league() {
        let schedule = SnakeSchedule::new(2, 5).unwrap();
        let optimizer = RosterOptimizer::new(
            &[Position::Quarterback, Position::RunningBack, Position::WideReceiver],
            rules(),
        )
        .unwrap();
        let err = plan_league(
            &pool(),
            &schedule,
            &optimizer,
            &RosterCounts::new(),
            &DEFAULT_ANCHOR_OFFSETS,
        )
        .unwrap_err();
        assert!(matches!(err, PlanError::Infeasible { rounds: 5, .. }));
    }

    #[test]
    fn best_slot_prefers_earlier_on_tie() {
        let plan = DraftPlan::from_selections(&[(1, Position::RunningBack, 10.0)], vec![]);
        let league = LeaguePlan {
            drafters: vec![
                DrafterPlan {
                    slot: 1,
                    picks: vec![1],
                    plan: plan.clone(),
                },
                DrafterPlan {
                    slot: 2,
                    picks: vec![2],
                    plan,
                },
            ],
        };
        assert_eq!(league.best_slot(), Some((1, 10.0)));
    }
}
