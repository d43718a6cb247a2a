// Projection matrix: expected achievable points per (pick, position).
//
// Answers "if this drafter waits until pick P to take position X, what
// quality should they expect?" by sampling the best projection still
// available at a few anchor cutoffs around P.

use std::collections::BTreeMap;

use tracing::debug;

use crate::draft::position::Position;
use crate::pool::PlayerPool;

/// One matrix cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatrixEntry {
    pub points: f64,
    /// Anchors that found at least one eligible player. Zero means `points`
    /// is the fallback value 0 rather than a computed one.
    pub samples: usize,
}

impl MatrixEntry {
    pub fn is_fallback(&self) -> bool {
        self.samples == 0
    }
}

/// Read-only lookup built once per optimization run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectionMatrix {
    entries: BTreeMap<(u32, Position), MatrixEntry>,
}

impl ProjectionMatrix {
    /// Build the matrix for every requested pick and position.
    ///
    /// For each anchor offset the cutoff is `pick + offset`; players at the
    /// position with `adp >= cutoff` are eligible (a cutoff below 1 admits
    /// everyone). The cell is the mean of the per-anchor maxima over anchors
    /// that had any eligible player, or 0 when none did.
    pub fn build(
        pool: &PlayerPool,
        picks: &[u32],
        positions: &[Position],
        anchor_offsets: &[i32],
    ) -> Self {
        let mut entries = BTreeMap::new();
        for &pick in picks {
            for &pos in positions {
                let mut total = 0.0;
                let mut samples = 0;
                for &offset in anchor_offsets {
                    let cutoff = (i64::from(pick) + i64::from(offset)) as f64;
                    let top = pool
                        .players()
                        .iter()
                        .filter(|p| p.position == pos && p.adp >= cutoff)
                        .map(|p| p.projected_points)
                        .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.max(v))));
                    if let Some(top) = top {
                        total += top;
                        samples += 1;
                    }
                }
                let points = if samples > 0 { total / samples as f64 } else { 0.0 };
                if samples == 0 {
                    debug!("no eligible {} at pick {}; using fallback 0", pos, pick);
                }
                entries.insert((pick, pos), MatrixEntry { points, samples });
            }
        }
        ProjectionMatrix { entries }
    }

    /// Build directly from known cells.
    pub fn from_entries<I>(cells: I) -> Self
    where
        I: IntoIterator<Item = ((u32, Position), f64)>,
    {
        ProjectionMatrix {
            entries: cells
                .into_iter()
                .map(|(key, points)| (key, MatrixEntry { points, samples: 1 }))
                .collect(),
        }
    }

    pub fn entry(&self, pick: u32, pos: Position) -> Option<&MatrixEntry> {
        self.entries.get(&(pick, pos))
    }

    /// Cell value; cells never built read as 0.
    pub fn value(&self, pick: u32, pos: Position) -> f64 {
        self.entry(pick, pos).map_or(0.0, |e| e.points)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cells that fell back to 0.
    pub fn fallback_cells(&self) -> impl Iterator<Item = (u32, Position)> + '_ {
        self.entries
            .iter()
            .filter(|(_, e)| e.is_fallback())
            .map(|(&key, _)| key)
    }
}
