// Roster-constrained draft plan optimizer.
//
// Chooses one position per round to maximize the summed projection-matrix
// value, subject to:
//   1. exactly one position per round,
//   2. per group: drafted + existing <= limit + flex consumed by the group,
//   3. flex consumed is zero for groups that are not flex-eligible,
//   4. total flex consumed <= flex capacity.
//
// Constraints 2-4 depend only on how many players land at each position,
// and the objective is a sum of independent per-round terms. The solve is
// therefore an exact dynamic program over per-position count vectors: layer
// r holds every admissible roster after r rounds with the best objective
// reaching it. Admissibility is monotone in the counts, so an inadmissible
// partial roster can never become admissible and is pruned immediately.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::draft::position::Position;
use crate::draft::roster::{RosterCounts, RosterRules};
use crate::draft::schedule::ScheduleError;
use crate::valuation::projections::ProjectionMatrix;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanError {
    #[error("invalid optimizer configuration for `{field}`: {message}")]
    Configuration { field: String, message: String },

    #[error("no feasible draft plan over {rounds} rounds: {reason}")]
    Infeasible { rounds: usize, reason: String },

    #[error(transparent)]
    Schedule(#[from] ScheduleError),
}

impl PlanError {
    fn config(field: &str, message: impl Into<String>) -> Self {
        PlanError::Configuration {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Draft plan
// ---------------------------------------------------------------------------

/// One round of a plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanEntry {
    pub round: u32,
    pub pick: u32,
    pub position: Position,
    pub points: f64,
    pub cumulative_points: f64,
}

/// Flex capacity consumed by one constraint group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlexUsage {
    pub group: String,
    pub used: u32,
}

/// A drafter's per-round plan. Immutable once returned.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftPlan {
    entries: Vec<PlanEntry>,
    flex_usage: Vec<FlexUsage>,
}

impl DraftPlan {
    /// Build a plan from (pick, position, points) in round order, computing
    /// the running total.
    pub fn from_selections(selections: &[(u32, Position, f64)], flex_usage: Vec<FlexUsage>) -> Self {
        let mut cumulative = 0.0;
        let entries = selections
            .iter()
            .enumerate()
            .map(|(i, &(pick, position, points))| {
                cumulative += points;
                PlanEntry {
                    round: i as u32 + 1,
                    pick,
                    position,
                    points,
                    cumulative_points: cumulative,
                }
            })
            .collect();
        DraftPlan {
            entries,
            flex_usage,
        }
    }

    pub fn entries(&self) -> &[PlanEntry] {
        &self.entries
    }

    pub fn flex_usage(&self) -> &[FlexUsage] {
        &self.flex_usage
    }

    pub fn total_points(&self) -> f64 {
        self.entries.last().map_or(0.0, |e| e.cumulative_points)
    }

    pub fn positions(&self) -> Vec<Position> {
        self.entries.iter().map(|e| e.position).collect()
    }

    /// How many rounds went to each position.
    pub fn position_counts(&self) -> RosterCounts {
        let mut counts = RosterCounts::new();
        for e in &self.entries {
            counts.add(e.position);
        }
        counts
    }
}

// ---------------------------------------------------------------------------
// Optimizer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
struct Node {
    value: f64,
    parent: Option<(RosterCounts, Position)>,
}

/// Exact per-drafter solver. Holds only configuration; each `solve` is
/// independent.
#[derive(Debug, Clone)]
pub struct RosterOptimizer {
    positions: Vec<Position>,
    rules: RosterRules,
}

impl RosterOptimizer {
    /// Validate the selectable positions and constraint groups.
    ///
    /// Every group must be non-empty and only reference selectable positions.
    pub fn new(positions: &[Position], rules: RosterRules) -> Result<Self, PlanError> {
        if positions.is_empty() {
            return Err(PlanError::config("positions", "at least one position is required"));
        }
        let mut sorted = positions.to_vec();
        sorted.sort();
        sorted.dedup();
        if sorted.len() != positions.len() {
            return Err(PlanError::config("positions", "duplicate position"));
        }
        for (i, group) in rules.groups.iter().enumerate() {
            if group.positions.is_empty() {
                return Err(PlanError::config(
                    &format!("groups[{i}].positions"),
                    "group has no member positions",
                ));
            }
            if let Some(p) = group.positions.iter().find(|p| !sorted.contains(p)) {
                return Err(PlanError::config(
                    &format!("groups[{i}].positions"),
                    format!("{p} is not a selectable position"),
                ));
            }
        }
        Ok(RosterOptimizer {
            positions: sorted,
            rules,
        })
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    pub fn rules(&self) -> &RosterRules {
        &self.rules
    }

    /// Solve for one drafter.
    ///
    /// `picks` is the drafter's overall pick numbers in round order and
    /// `existing` the players already on their roster.
    pub fn solve(
        &self,
        picks: &[u32],
        matrix: &ProjectionMatrix,
        existing: &RosterCounts,
    ) -> Result<DraftPlan, PlanError> {
        if picks.is_empty() {
            return Err(PlanError::config("picks", "at least one pick is required"));
        }
        if picks.windows(2).any(|w| w[0] >= w[1]) {
            return Err(PlanError::config("picks", "picks must be strictly increasing"));
        }
        let rounds = picks.len();
        if !self.rules.admits(existing) {
            return Err(PlanError::Infeasible {
                rounds,
                reason: format!("existing roster {existing} already exceeds the group limits"),
            });
        }

        let mut layers: Vec<BTreeMap<RosterCounts, Node>> = Vec::with_capacity(rounds + 1);
        let mut start = BTreeMap::new();
        start.insert(
            RosterCounts::new(),
            Node {
                value: 0.0,
                parent: None,
            },
        );
        layers.push(start);

        for (r, &pick) in picks.iter().enumerate() {
            let mut next_layer: BTreeMap<RosterCounts, Node> = BTreeMap::new();
            for (counts, node) in &layers[r] {
                for &pos in &self.positions {
                    let next = counts.with(pos);
                    if !self.rules.admits(&existing.plus(&next)) {
                        continue;
                    }
                    let value = node.value + matrix.value(pick, pos);
                    let candidate = Node {
                        value,
                        parent: Some((*counts, pos)),
                    };
                    match next_layer.entry(next) {
                        Entry::Vacant(slot) => {
                            slot.insert(candidate);
                        }
                        Entry::Occupied(mut slot) => {
                            if value > slot.get().value {
                                slot.insert(candidate);
                            }
                        }
                    }
                }
            }
            if next_layer.is_empty() {
                return Err(PlanError::Infeasible {
                    rounds,
                    reason: format!(
                        "no admissible position for round {} (flex capacity {})",
                        r + 1,
                        self.rules.flex_capacity
                    ),
                });
            }
            debug!("round {}: {} admissible rosters", r + 1, next_layer.len());
            layers.push(next_layer);
        }

        // Equal objectives prefer the roster holding more players at earlier
        // canonical positions (largest count vector first).
        let (mut counts, _) = layers[rounds]
            .iter()
            .rev()
            .fold(None, |best: Option<(RosterCounts, f64)>, (c, n)| match best {
                Some((_, v)) if n.value <= v => best,
                _ => Some((*c, n.value)),
            })
            .ok_or_else(|| PlanError::Infeasible {
                rounds,
                reason: "no admissible roster".into(),
            })?;
        let final_counts = counts;

        let mut chosen = Vec::with_capacity(rounds);
        for r in (1..=rounds).rev() {
            let node = layers[r][&counts];
            let (prev, pos) = node
                .parent
                .ok_or_else(|| PlanError::Infeasible {
                    rounds,
                    reason: "broken back-pointer chain".into(),
                })?;
            chosen.push(pos);
            counts = prev;
        }
        chosen.reverse();

        let selections: Vec<(u32, Position, f64)> = picks
            .iter()
            .zip(chosen)
            .map(|(&pick, pos)| (pick, pos, matrix.value(pick, pos)))
            .collect();

        let flex_usage = flex_usage(&self.rules, &existing.plus(&final_counts));
        Ok(DraftPlan::from_selections(&selections, flex_usage))
    }
}

/// Flex consumed by each flex-eligible group for a finished roster.
pub(crate) fn flex_usage(rules: &RosterRules, counts: &RosterCounts) -> Vec<FlexUsage> {
    rules
        .groups
        .iter()
        .zip(rules.overflow(counts))
        .filter(|(g, _)| g.flex_eligible)
        .map(|(g, used)| FlexUsage {
            group: g.label(),
            used,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::roster::PositionConstraintGroup;

    const POSITIONS: [Position; 5] = [
        Position::Quarterback,
        Position::RunningBack,
        Position::WideReceiver,
        Position::TightEnd,
        Position::Kicker,
    ];

    const PICKS: [u32; 8] = [1, 24, 25, 48, 49, 72, 73, 96];

    fn rules(flex_capacity: u32) -> RosterRules {
        RosterRules::new(
            vec![
                PositionConstraintGroup::new(vec![Position::Quarterback], 1, false),
                PositionConstraintGroup::new(vec![Position::RunningBack], 2, true),
                PositionConstraintGroup::new(vec![Position::WideReceiver], 2, true),
                PositionConstraintGroup::new(vec![Position::TightEnd], 1, true),
                PositionConstraintGroup::new(vec![Position::Kicker], 1, false),
            ],
            flex_capacity,
        )
    }

    /// Values that decay with the pick, at different rates per position.
    fn matrix() -> ProjectionMatrix {
        let base = |pos: Position| match pos {
            Position::Quarterback => (330.0, 1.0),
            Position::RunningBack => (300.0, 1.5),
            Position::WideReceiver => (290.0, 1.2),
            Position::TightEnd => (200.0, 0.8),
            Position::Kicker => (140.0, 0.1),
            Position::Defense => (0.0, 0.0),
        };
        let mut cells = Vec::new();
        for &pick in &PICKS {
            for pos in POSITIONS {
                let (start, decay) = base(pos);
                cells.push(((pick, pos), start - decay * f64::from(pick)));
            }
        }
        ProjectionMatrix::from_entries(cells)
    }

    /// Brute force over every assignment, for cross-checking the DP.
    fn brute_force(picks: &[u32], m: &ProjectionMatrix, rules: &RosterRules) -> Option<f64> {
        let k = POSITIONS.len();
        let total = k.pow(picks.len() as u32);
        let mut best: Option<f64> = None;
        for code in 0..total {
            let mut c = code;
            let mut counts = RosterCounts::new();
            let mut value = 0.0;
            for &pick in picks {
                let pos = POSITIONS[c % k];
                c /= k;
                counts.add(pos);
                value += m.value(pick, pos);
            }
            if rules.admits(&counts) && best.map_or(true, |b| value > b) {
                best = Some(value);
            }
        }
        best
    }

    #[test]
    fn feasible_solve_picks_one_position_per_round() {
        let opt = RosterOptimizer::new(&POSITIONS, rules(1)).unwrap();
        let m = matrix();
        let plan = opt.solve(&PICKS, &m, &RosterCounts::new()).unwrap();
        assert_eq!(plan.entries().len(), 8);
        for (entry, &pick) in plan.entries().iter().zip(PICKS.iter()) {
            assert_eq!(entry.pick, pick);
        }
        let counts = plan.position_counts();
        assert_eq!(counts.total(), 8);
        assert!(rules(1).admits(&counts));
    }

    #[test]
    fn objective_is_exact_sum_of_chosen_cells() {
        let opt = RosterOptimizer::new(&POSITIONS, rules(1)).unwrap();
        let m = matrix();
        let plan = opt.solve(&PICKS, &m, &RosterCounts::new()).unwrap();
        let mut sum = 0.0;
        for e in plan.entries() {
            sum += m.value(e.pick, e.position);
            assert_eq!(e.cumulative_points, sum);
        }
        assert_eq!(plan.total_points(), sum);
    }

    #[test]
    fn matches_brute_force_optimum() {
        let picks = [3, 22, 27, 46, 51];
        let small_rules = RosterRules::new(
            vec![
                PositionConstraintGroup::new(vec![Position::Quarterback], 1, false),
                PositionConstraintGroup::new(vec![Position::RunningBack], 1, true),
                PositionConstraintGroup::new(vec![Position::WideReceiver], 1, true),
                PositionConstraintGroup::new(vec![Position::TightEnd], 1, true),
                PositionConstraintGroup::new(vec![Position::Kicker], 0, false),
            ],
            1,
        );
        let mut cells = Vec::new();
        for (i, &pick) in picks.iter().enumerate() {
            for (j, pos) in POSITIONS.iter().enumerate() {
                let wobble = ((i * 7 + j * 13) % 11) as f64;
                cells.push(((pick, *pos), 100.0 - f64::from(pick) + wobble * 3.0));
            }
        }
        let m = ProjectionMatrix::from_entries(cells);
        let opt = RosterOptimizer::new(&POSITIONS, small_rules.clone()).unwrap();
        let plan = opt.solve(&picks, &m, &RosterCounts::new()).unwrap();
        let expected = brute_force(&picks, &m, &small_rules).unwrap();
        assert!((plan.total_points() - expected).abs() < 1e-9);
    }

    #[test]
    fn zero_flex_with_seven_slots_is_infeasible() {
        let opt = RosterOptimizer::new(&POSITIONS, rules(0)).unwrap();
        let err = opt.solve(&PICKS, &matrix(), &RosterCounts::new()).unwrap_err();
        assert!(matches!(err, PlanError::Infeasible { rounds: 8, .. }));
    }

    #[test]
    fn existing_roster_reduces_capacity() {
        let opt = RosterOptimizer::new(&POSITIONS, rules(1)).unwrap();
        let existing = RosterCounts::new().with(Position::Quarterback);
        // Seven remaining slots (no QB) plus flex cover exactly seven picks.
        let plan = opt.solve(&PICKS[..7], &matrix(), &existing).unwrap();
        assert!(!plan.positions().contains(&Position::Quarterback));
        // Eight picks no longer fit.
        assert!(matches!(
            opt.solve(&PICKS, &matrix(), &existing),
            Err(PlanError::Infeasible { .. })
        ));
    }

    #[test]
    fn over_limit_existing_roster_is_infeasible() {
        let opt = RosterOptimizer::new(&POSITIONS, rules(1)).unwrap();
        let existing = RosterCounts::new()
            .with(Position::Kicker)
            .with(Position::Kicker);
        assert!(matches!(
            opt.solve(&PICKS[..2], &matrix(), &existing),
            Err(PlanError::Infeasible { .. })
        ));
    }

    #[test]
    fn flex_usage_reported_per_group() {
        let opt = RosterOptimizer::new(&POSITIONS, rules(1)).unwrap();
        let plan = opt.solve(&PICKS, &matrix(), &RosterCounts::new()).unwrap();
        let used: u32 = plan.flex_usage().iter().map(|f| f.used).sum();
        assert_eq!(used, 1);
        assert!(plan
            .flex_usage()
            .iter()
            .all(|f| ["RB", "WR", "TE"].contains(&f.group.as_str())));
    }

    #[test]
    fn solve_is_deterministic() {
        let opt = RosterOptimizer::new(&POSITIONS, rules(1)).unwrap();
        let m = matrix();
        let a = opt.solve(&PICKS, &m, &RosterCounts::new()).unwrap();
        let b = opt.solve(&PICKS, &m, &RosterCounts::new()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn ties_resolve_to_canonical_order() {
        // Every cell equal: the first round should take the earliest
        // admissible position in canonical order.
        let cells: Vec<_> = POSITIONS.iter().map(|&p| ((1, p), 10.0)).collect();
        let m = ProjectionMatrix::from_entries(cells);
        let opt = RosterOptimizer::new(&POSITIONS, rules(1)).unwrap();
        let plan = opt.solve(&[1], &m, &RosterCounts::new()).unwrap();
        assert_eq!(plan.positions(), vec![Position::Quarterback]);
    }

    #[test]
    fn rejects_group_with_unknown_position() {
        let bad = RosterRules::new(
            vec![PositionConstraintGroup::new(vec![Position::Defense], 1, false)],
            0,
        );
        let err = RosterOptimizer::new(&POSITIONS, bad).unwrap_err();
        assert!(matches!(err, PlanError::Configuration { .. }));
    }

    #[test]
    fn rejects_unsorted_picks() {
        let opt = RosterOptimizer::new(&POSITIONS, rules(1)).unwrap();
        let err = opt.solve(&[24, 1], &matrix(), &RosterCounts::new()).unwrap_err();
        assert!(matches!(err, PlanError::Configuration { .. }));
    }
}
