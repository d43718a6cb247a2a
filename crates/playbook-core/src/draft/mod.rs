// Draft mechanics: positions, snake scheduling, roster rules.

pub mod position;
pub mod roster;
pub mod schedule;
