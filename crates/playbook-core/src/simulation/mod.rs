// Full-league draft simulation and iterative ADP refinement.

pub mod convergence;
pub mod draft;
