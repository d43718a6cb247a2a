// Iterative ADP refinement.
//
// Each iteration runs one full simulated draft on the current pool snapshot
// and records the pick at which every player went. Those picks become the
// ADP of the next snapshot; players nobody took fall back to a fixed late
// ADP. Iteration stops once the mean absolute change over players drafted in
// two consecutive iterations drops below the tolerance, or at the iteration
// cap. The refined ADP averages each player's observed picks over the
// trailing iterations that drafted them.

use std::collections::HashMap;

use rand::Rng;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::draft::position::Position;
use crate::draft::schedule::{ScheduleError, SnakeSchedule};
use crate::pool::{PlayerId, PlayerPool};
use crate::simulation::draft::{simulate_draft, DraftModel};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error("invalid simulation parameter `{field}`: {message}")]
    Configuration { field: String, message: String },

    #[error(transparent)]
    Schedule(#[from] ScheduleError),
}

impl SimulationError {
    fn config(field: &str, message: impl Into<String>) -> Self {
        SimulationError::Configuration {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Settings and results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConvergenceSettings {
    pub max_iterations: u32,
    pub tolerance: f64,
    pub trailing_window: u32,
    pub undrafted_adp: f64,
}

impl Default for ConvergenceSettings {
    fn default() -> Self {
        ConvergenceSettings {
            max_iterations: 50,
            tolerance: 0.05,
            trailing_window: 10,
            undrafted_adp: 150.0,
        }
    }
}

/// Statistics for one iteration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IterationSummary {
    pub iteration: u32,
    pub players_drafted: usize,
    /// Mean absolute ADP change against the previous iteration; absent for
    /// the first iteration or when no player was drafted in both.
    pub mean_abs_change: Option<f64>,
    pub mean_team_points: f64,
    /// Population standard deviation of team projected points.
    pub team_points_spread: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConvergenceStatus {
    Converged { iterations: u32, delta: f64 },
    NotConverged { iterations: u32, last_delta: Option<f64> },
}

impl ConvergenceStatus {
    pub fn is_converged(&self) -> bool {
        matches!(self, ConvergenceStatus::Converged { .. })
    }

    pub fn iterations(&self) -> u32 {
        match *self {
            ConvergenceStatus::Converged { iterations, .. }
            | ConvergenceStatus::NotConverged { iterations, .. } => iterations,
        }
    }
}

/// Refined ADP for one player.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdpEstimate {
    #[serde(skip)]
    pub player: PlayerId,
    pub name: String,
    pub position: Position,
    pub adp: f64,
    /// Trailing iterations in which the player was drafted.
    pub times_drafted: u32,
    /// Never drafted in the trailing window; `adp` is the fallback value.
    pub fallback: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationOutcome {
    /// Every pool player, sorted by refined ADP then name.
    pub estimates: Vec<AdpEstimate>,
    pub history: Vec<IterationSummary>,
    pub status: ConvergenceStatus,
}

impl SimulationOutcome {
    /// Refined ADP keyed by player id, for building a new snapshot of the
    /// pool the simulation ran on.
    pub fn adp_table(&self) -> HashMap<PlayerId, f64> {
        self.estimates.iter().map(|e| (e.player, e.adp)).collect()
    }
}

// ---------------------------------------------------------------------------
// Simulator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ConvergenceSimulator {
    schedule: SnakeSchedule,
    model: DraftModel,
    settings: ConvergenceSettings,
}

impl ConvergenceSimulator {
    pub fn new(
        schedule: SnakeSchedule,
        model: DraftModel,
        settings: ConvergenceSettings,
    ) -> Result<Self, SimulationError> {
        if settings.max_iterations == 0 {
            return Err(SimulationError::config("max_iterations", "must be > 0"));
        }
        if settings.trailing_window == 0 {
            return Err(SimulationError::config("trailing_window", "must be > 0"));
        }
        if !settings.tolerance.is_finite() || settings.tolerance < 0.0 {
            return Err(SimulationError::config(
                "tolerance",
                format!("must be finite and >= 0, got {}", settings.tolerance),
            ));
        }
        if !settings.undrafted_adp.is_finite() || settings.undrafted_adp < 1.0 {
            return Err(SimulationError::config(
                "undrafted_adp",
                format!("must be a finite value >= 1, got {}", settings.undrafted_adp),
            ));
        }
        if !(0.0..1.0).contains(&model.candidate_window) {
            return Err(SimulationError::config(
                "candidate_window",
                format!("must be in [0, 1), got {}", model.candidate_window),
            ));
        }
        if model.positions.is_empty() {
            return Err(SimulationError::config("positions", "must not be empty"));
        }
        if model.anchor_offsets.is_empty() {
            return Err(SimulationError::config("anchor_offsets", "must not be empty"));
        }
        for (i, group) in model.rules.groups.iter().enumerate() {
            if let Some(p) = group.positions.iter().find(|p| !model.positions.contains(p)) {
                return Err(SimulationError::config(
                    &format!("groups[{i}].positions"),
                    format!("{p} is not a selectable position"),
                ));
            }
        }
        Ok(ConvergenceSimulator {
            schedule,
            model,
            settings,
        })
    }

    /// Iterate to a fixed point starting from `pool`'s ADP. The same seeded
    /// `rng` yields the same outcome.
    pub fn run<R>(&self, pool: &PlayerPool, rng: &mut R) -> Result<SimulationOutcome, SimulationError>
    where
        R: Rng + ?Sized,
    {
        let mut snapshot = pool.clone();
        let mut observations: Vec<HashMap<PlayerId, u32>> = Vec::new();
        let mut history = Vec::new();
        let mut status = None;

        for iteration in 1..=self.settings.max_iterations {
            let draft = simulate_draft(&snapshot, &self.schedule, &self.model, rng)?;
            let observed = draft.observed_adp();
            let delta = observations
                .last()
                .and_then(|prev| mean_abs_change(prev, &observed));
            let (mean_team_points, team_points_spread) = mean_and_spread(&draft.team_points());

            debug!(
                "iteration {}: {} drafted, delta {:?}, mean team points {:.1}",
                iteration,
                observed.len(),
                delta,
                mean_team_points
            );
            history.push(IterationSummary {
                iteration,
                players_drafted: observed.len(),
                mean_abs_change: delta,
                mean_team_points,
                team_points_spread,
            });

            let undrafted = self.settings.undrafted_adp;
            snapshot = pool.with_adp(|id| observed.get(&id).map_or(undrafted, |&p| f64::from(p)));
            observations.push(observed);

            if let Some(d) = delta {
                if d < self.settings.tolerance {
                    info!("ADP converged after {} iterations (delta {:.4})", iteration, d);
                    status = Some(ConvergenceStatus::Converged {
                        iterations: iteration,
                        delta: d,
                    });
                    break;
                }
            }
        }

        let status = status.unwrap_or_else(|| {
            let last_delta = history.last().and_then(|h| h.mean_abs_change);
            warn!(
                "ADP did not converge within {} iterations (last delta {:?})",
                self.settings.max_iterations, last_delta
            );
            ConvergenceStatus::NotConverged {
                iterations: self.settings.max_iterations,
                last_delta,
            }
        });

        let estimates = self.trailing_estimates(pool, &observations);
        Ok(SimulationOutcome {
            estimates,
            history,
            status,
        })
    }

    /// Average each player's observed picks over the trailing window. Only
    /// iterations that drafted the player count; a player never drafted in
    /// the window gets the fallback ADP.
    fn trailing_estimates(
        &self,
        pool: &PlayerPool,
        observations: &[HashMap<PlayerId, u32>],
    ) -> Vec<AdpEstimate> {
        let window = (self.settings.trailing_window as usize).min(observations.len());
        let trailing = &observations[observations.len() - window..];
        let mut estimates: Vec<AdpEstimate> = pool
            .iter()
            .map(|(id, player)| {
                let picks: Vec<f64> = trailing
                    .iter()
                    .filter_map(|obs| obs.get(&id).map(|&p| f64::from(p)))
                    .collect();
                let times_drafted = picks.len() as u32;
                let adp = if picks.is_empty() {
                    self.settings.undrafted_adp
                } else {
                    picks.iter().sum::<f64>() / picks.len() as f64
                };
                AdpEstimate {
                    player: id,
                    name: player.name.clone(),
                    position: player.position,
                    adp,
                    times_drafted,
                    fallback: picks.is_empty(),
                }
            })
            .collect();
        estimates.sort_by(|a, b| a.adp.total_cmp(&b.adp).then_with(|| a.name.cmp(&b.name)));
        estimates
    }
}

/// Mean absolute pick difference over players present in both maps.
fn mean_abs_change(prev: &HashMap<PlayerId, u32>, cur: &HashMap<PlayerId, u32>) -> Option<f64> {
    let mut total = 0.0;
    let mut n = 0usize;
    for (id, &pick) in cur {
        if let Some(&before) = prev.get(id) {
            total += (f64::from(pick) - f64::from(before)).abs();
            n += 1;
        }
    }
    (n > 0).then(|| total / n as f64)
}

/// Mean and population standard deviation; `(0, 0)` for no values.
fn mean_and_spread(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}
