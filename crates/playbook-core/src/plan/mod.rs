// Draft planning: exact optimizer, greedy VOR baseline, league-wide runs and
// player targets.

pub mod greedy;
pub mod league;
pub mod optimizer;
pub mod targets;
