// Valuation engine: VOR estimates and the optimizer's projection matrix.

pub mod projections;
pub mod vor;
