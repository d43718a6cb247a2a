// Snake draft pick scheduling: draft order and pick/slot/round conversions.
//
// Odd rounds (1-indexed) run slots ascending 1..N, even rounds run them
// descending N..1. Overall pick numbers are 1-based and contiguous across
// the whole draft.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("invalid schedule parameter `{field}`: must be greater than 0")]
    NonPositive { field: &'static str },

    #[error("draft slot {slot} out of range 1..={num_slots}")]
    SlotOutOfRange { slot: u32, num_slots: u32 },

    #[error("round {round} out of range 1..={rounds}")]
    RoundOutOfRange { round: u32, rounds: u32 },

    #[error("overall pick {pick} out of range 1..={total}")]
    PickOutOfRange { pick: u32, total: u32 },

    #[error("{num_slots} slots over {rounds} rounds overflows the pick numbering")]
    TooLarge { num_slots: u32, rounds: u32 },
}

/// One position in the draft: which participant picks, in which round, at
/// which overall pick number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PickSlot {
    pub overall_pick: u32,
    pub draft_slot: u32,
    pub round_index: u32,
}

/// A validated snake draft shape: `num_slots` participants over `rounds`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnakeSchedule {
    num_slots: u32,
    rounds: u32,
}

impl SnakeSchedule {
    /// Create a schedule, rejecting zero participants or zero rounds.
    ///
    /// Pick numbers one round past the end must still fit in a `u32`, since
    /// the final pick's gap to the following pick is one full round.
    pub fn new(num_slots: u32, rounds: u32) -> Result<Self, ScheduleError> {
        if num_slots == 0 {
            return Err(ScheduleError::NonPositive { field: "num_slots" });
        }
        if rounds == 0 {
            return Err(ScheduleError::NonPositive { field: "rounds" });
        }
        if rounds
            .checked_add(1)
            .and_then(|r| r.checked_mul(num_slots))
            .is_none()
        {
            return Err(ScheduleError::TooLarge { num_slots, rounds });
        }
        Ok(SnakeSchedule { num_slots, rounds })
    }

    pub fn num_slots(&self) -> u32 {
        self.num_slots
    }

    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    pub fn total_picks(&self) -> u32 {
        self.num_slots * self.rounds
    }

    /// Slot id for every overall pick, in pick order. Index 0 is pick 1.
    pub fn pick_order(&self) -> Vec<u32> {
        let mut order = Vec::with_capacity(self.total_picks() as usize);
        for round in 1..=self.rounds {
            if round % 2 == 1 {
                order.extend(1..=self.num_slots);
            } else {
                order.extend((1..=self.num_slots).rev());
            }
        }
        order
    }

    /// Overall pick number for a slot in a given round.
    pub fn overall_pick(&self, slot: u32, round: u32) -> Result<u32, ScheduleError> {
        self.check_slot(slot)?;
        self.check_round(round)?;
        let n = self.num_slots;
        Ok(if round % 2 == 1 {
            (round - 1) * n + slot
        } else {
            round * n - slot + 1
        })
    }

    /// Inverse of `overall_pick`.
    pub fn slot_for_pick(&self, overall_pick: u32) -> Result<PickSlot, ScheduleError> {
        let total = self.total_picks();
        if overall_pick == 0 || overall_pick > total {
            return Err(ScheduleError::PickOutOfRange {
                pick: overall_pick,
                total,
            });
        }
        let n = self.num_slots;
        let round_index = (overall_pick - 1) / n + 1;
        let offset = (overall_pick - 1) % n;
        let draft_slot = if round_index % 2 == 1 { offset + 1 } else { n - offset };
        Ok(PickSlot {
            overall_pick,
            draft_slot,
            round_index,
        })
    }

    /// Every overall pick owned by `slot`, in round order.
    pub fn picks_for_slot(&self, slot: u32) -> Result<Vec<u32>, ScheduleError> {
        self.check_slot(slot)?;
        (1..=self.rounds)
            .map(|round| self.overall_pick(slot, round))
            .collect()
    }

    /// The next pick owned by `slot` strictly after `after_pick`, if the
    /// draft has one.
    pub fn next_pick_for_slot(&self, slot: u32, after_pick: u32) -> Result<Option<u32>, ScheduleError> {
        Ok(self
            .picks_for_slot(slot)?
            .into_iter()
            .find(|&p| p > after_pick))
    }

    /// All pick slots in draft order.
    pub fn slots(&self) -> Vec<PickSlot> {
        self.pick_order()
            .into_iter()
            .enumerate()
            .map(|(i, draft_slot)| {
                let overall_pick = i as u32 + 1;
                PickSlot {
                    overall_pick,
                    draft_slot,
                    round_index: (overall_pick - 1) / self.num_slots + 1,
                }
            })
            .collect()
    }

    fn check_slot(&self, slot: u32) -> Result<(), ScheduleError> {
        if slot == 0 || slot > self.num_slots {
            return Err(ScheduleError::SlotOutOfRange {
                slot,
                num_slots: self.num_slots,
            });
        }
        Ok(())
    }

    fn check_round(&self, round: u32) -> Result<(), ScheduleError> {
        if round == 0 || round > self.rounds {
            return Err(ScheduleError::RoundOutOfRange {
                round,
                rounds: self.rounds,
            });
        }
        Ok(())
    }
}
