// Library root: re-exports all modules so the binary and integration tests
// can access the crate's public API.

pub mod config;
pub mod draft;
pub mod plan;
pub mod pool;
pub mod simulation;
pub mod valuation;
