// Roster constraint groups, flex capacity and per-drafter roster state.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::position::Position;

/// A set of positions sharing a starter limit.
///
/// Players drafted into the group beyond `limit` must be absorbed by the
/// league-wide flex capacity, which only flex-eligible groups may draw on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionConstraintGroup {
    pub positions: Vec<Position>,
    pub limit: u32,
    pub flex_eligible: bool,
}

impl PositionConstraintGroup {
    pub fn new(positions: Vec<Position>, limit: u32, flex_eligible: bool) -> Self {
        PositionConstraintGroup {
            positions,
            limit,
            flex_eligible,
        }
    }

    pub fn contains(&self, pos: Position) -> bool {
        self.positions.contains(&pos)
    }

    /// "RB" for a single-position group, "RB/WR/TE" for a combined one.
    pub fn label(&self) -> String {
        self.positions
            .iter()
            .map(|p| p.display_str())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// How many players in `counts` fall into this group.
    pub fn count_in(&self, counts: &RosterCounts) -> u32 {
        self.positions.iter().map(|&p| counts.get(p)).sum()
    }
}

// ---------------------------------------------------------------------------
// Position counts
// ---------------------------------------------------------------------------

/// Number of players held at each position. Ordered so it can key
/// deterministic collections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RosterCounts {
    counts: [u32; Position::ALL.len()],
}

impl RosterCounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(map: &BTreeMap<Position, u32>) -> Self {
        let mut counts = Self::new();
        for (&pos, &n) in map {
            counts.counts[pos.sort_order()] = n;
        }
        counts
    }

    pub fn get(&self, pos: Position) -> u32 {
        self.counts[pos.sort_order()]
    }

    pub fn add(&mut self, pos: Position) {
        self.counts[pos.sort_order()] += 1;
    }

    /// A copy with one more player at `pos`.
    pub fn with(&self, pos: Position) -> Self {
        let mut next = *self;
        next.add(pos);
        next
    }

    /// Element-wise sum.
    pub fn plus(&self, other: &RosterCounts) -> Self {
        let mut sum = *self;
        for (a, b) in sum.counts.iter_mut().zip(other.counts.iter()) {
            *a += b;
        }
        sum
    }

    pub fn total(&self) -> u32 {
        self.counts.iter().sum()
    }

    /// Non-zero counts in canonical position order.
    pub fn iter(&self) -> impl Iterator<Item = (Position, u32)> + '_ {
        Position::ALL
            .iter()
            .map(|&p| (p, self.get(p)))
            .filter(|&(_, n)| n > 0)
    }
}

impl fmt::Display for RosterCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.iter().map(|(p, n)| format!("{p}:{n}")).collect();
        write!(f, "{{{}}}", parts.join(", "))
    }
}

// ---------------------------------------------------------------------------
// Roster rules
// ---------------------------------------------------------------------------

/// Constraint groups plus the shared flex capacity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterRules {
    pub groups: Vec<PositionConstraintGroup>,
    pub flex_capacity: u32,
}

impl RosterRules {
    pub fn new(groups: Vec<PositionConstraintGroup>, flex_capacity: u32) -> Self {
        RosterRules {
            groups,
            flex_capacity,
        }
    }

    /// Players each group holds beyond its limit.
    pub fn overflow(&self, counts: &RosterCounts) -> Vec<u32> {
        self.groups
            .iter()
            .map(|g| g.count_in(counts).saturating_sub(g.limit))
            .collect()
    }

    /// Minimum flex capacity needed to hold `counts`, or `None` when a group
    /// that may not use flex is already over its limit.
    pub fn flex_required(&self, counts: &RosterCounts) -> Option<u32> {
        let mut required = 0;
        for (group, over) in self.groups.iter().zip(self.overflow(counts)) {
            if over > 0 && !group.flex_eligible {
                return None;
            }
            required += over;
        }
        Some(required)
    }

    /// Whether a roster holding `counts` satisfies every group and the flex
    /// capacity.
    pub fn admits(&self, counts: &RosterCounts) -> bool {
        self.flex_required(counts)
            .is_some_and(|needed| needed <= self.flex_capacity)
    }

    /// Whether any group constrains `pos`.
    pub fn covers(&self, pos: Position) -> bool {
        self.groups.iter().any(|g| g.contains(pos))
    }

    /// Upper bound on roster size when every one of `positions` is covered
    /// by some group; `None` if any position is unconstrained.
    pub fn max_roster_size(&self, positions: &[Position]) -> Option<u32> {
        if positions.iter().all(|&p| self.covers(p)) {
            Some(self.groups.iter().map(|g| g.limit).sum::<u32>() + self.flex_capacity)
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Roster state
// ---------------------------------------------------------------------------

/// Mutable per-drafter roster during a plan or a simulated draft.
#[derive(Debug, Clone, Default)]
pub struct RosterState {
    counts: RosterCounts,
    picks: Vec<(u32, Position)>,
}

impl RosterState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from players already on the roster.
    pub fn with_existing(counts: RosterCounts) -> Self {
        RosterState {
            counts,
            picks: Vec::new(),
        }
    }

    pub fn counts(&self) -> &RosterCounts {
        &self.counts
    }

    pub fn picks(&self) -> &[(u32, Position)] {
        &self.picks
    }

    /// Whether adding a player at `pos` keeps the roster within `rules`.
    pub fn can_draft(&self, pos: Position, rules: &RosterRules) -> bool {
        rules.admits(&self.counts.with(pos))
    }

    pub fn draft(&mut self, pick: u32, pos: Position) {
        self.counts.add(pos);
        self.picks.push((pick, pos));
    }

    /// Flex slots the current roster occupies.
    pub fn flex_used(&self, rules: &RosterRules) -> u32 {
        rules.overflow(&self.counts).iter().sum()
    }
}
