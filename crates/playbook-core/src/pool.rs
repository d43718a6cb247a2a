// Player pool snapshots and loading of the cleaned projection table.
//
// The input CSV carries one row per player: name, position, team, projected
// points and average draft position. A pool is an immutable arena; every
// consumer that "removes" players does so on its own availability markers,
// and refined ADP produces a fresh snapshot.

use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::path::Path;
use tracing::warn;

use crate::draft::position::Position;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Stable index of a player within a pool and every snapshot derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PlayerId(pub usize);

/// One draftable player.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerRecord {
    pub name: String,
    pub position: Position,
    pub team: String,
    pub projected_points: f64,
    pub adp: f64,
}

impl PlayerRecord {
    pub fn new(name: &str, position: Position, team: &str, projected_points: f64, adp: f64) -> Self {
        PlayerRecord {
            name: name.to_string(),
            position,
            team: team.to_string(),
            projected_points,
            adp,
        }
    }
}

/// An immutable snapshot of the player pool.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerPool {
    players: Vec<PlayerRecord>,
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("validation error: {0}")]
    Validation(String),
}

// ---------------------------------------------------------------------------
// Pool
// ---------------------------------------------------------------------------

impl PlayerPool {
    /// Build a pool, rejecting non-finite values and negative projections.
    pub fn new(players: Vec<PlayerRecord>) -> Result<Self, PoolError> {
        for p in &players {
            if !p.projected_points.is_finite() || p.projected_points < 0.0 {
                return Err(PoolError::Validation(format!(
                    "player '{}' has invalid projected points {}",
                    p.name, p.projected_points
                )));
            }
            if !p.adp.is_finite() {
                return Err(PoolError::Validation(format!(
                    "player '{}' has non-finite ADP",
                    p.name
                )));
            }
        }
        Ok(PlayerPool { players })
    }

    pub fn players(&self) -> &[PlayerRecord] {
        &self.players
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn get(&self, id: PlayerId) -> Option<&PlayerRecord> {
        self.players.get(id.0)
    }

    /// Players paired with their ids, in arena order.
    pub fn iter(&self) -> impl Iterator<Item = (PlayerId, &PlayerRecord)> + '_ {
        self.players.iter().enumerate().map(|(i, p)| (PlayerId(i), p))
    }

    /// A new snapshot where each player's ADP is replaced by `adp_for(id)`.
    pub fn with_adp<F>(&self, mut adp_for: F) -> PlayerPool
    where
        F: FnMut(PlayerId) -> f64,
    {
        let players = self
            .players
            .iter()
            .enumerate()
            .map(|(i, p)| PlayerRecord {
                adp: adp_for(PlayerId(i)),
                ..p.clone()
            })
            .collect();
        PlayerPool { players }
    }

    /// A new snapshot taking ADP from a table keyed by player id (e.g.
    /// refined estimates); players missing from the table receive
    /// `fallback_adp`.
    pub fn with_adp_table(&self, table: &HashMap<PlayerId, f64>, fallback_adp: f64) -> PlayerPool {
        self.with_adp(|id| table.get(&id).copied().unwrap_or(fallback_adp))
    }

    /// The best-projected player at `position` whose ADP is at least `pick`.
    /// Ties keep the earlier arena entry.
    pub fn best_available(&self, position: Position, pick: u32) -> Option<(PlayerId, &PlayerRecord)> {
        self.best_available_excluding(position, pick, &HashSet::new())
    }

    /// Like `best_available`, skipping players in `taken`.
    pub fn best_available_excluding(
        &self,
        position: Position,
        pick: u32,
        taken: &HashSet<PlayerId>,
    ) -> Option<(PlayerId, &PlayerRecord)> {
        let cutoff = f64::from(pick);
        self.iter()
            .filter(|(id, p)| p.position == position && p.adp >= cutoff && !taken.contains(id))
            .fold(None, |best: Option<(PlayerId, &PlayerRecord)>, cur| match best {
                Some(b) if b.1.projected_points >= cur.1.projected_points => Some(b),
                _ => Some(cur),
            })
    }
}

// ---------------------------------------------------------------------------
// Raw CSV serde struct (private)
// ---------------------------------------------------------------------------

/// One row of the cleaned projection table. Extra columns are ignored.
#[derive(Debug, Deserialize)]
struct RawPlayerRow {
    #[serde(alias = "Name", alias = "Player Name", alias = "player")]
    name: String,
    #[serde(alias = "Position", alias = "pos")]
    position: String,
    #[serde(default, alias = "Team")]
    team: String,
    #[serde(alias = "projected_points", alias = "points")]
    proj_points: f64,
    #[serde(alias = "ADP", alias = "average_draft_position")]
    adp: f64,
}

// ---------------------------------------------------------------------------
// Loaders
// ---------------------------------------------------------------------------

fn load_pool_rows<R: Read>(rdr: R) -> Result<Vec<PlayerRecord>, csv::Error> {
    let mut reader = csv::Reader::from_reader(rdr);
    let mut players = Vec::new();
    for result in reader.deserialize::<RawPlayerRow>() {
        match result {
            Ok(raw) => {
                let name = raw.name.trim().to_string();
                let Some(position) = Position::from_str_pos(&raw.position) else {
                    warn!("skipping player '{}': unknown position '{}'", name, raw.position);
                    continue;
                };
                if !raw.proj_points.is_finite() || raw.proj_points < 0.0 {
                    warn!("skipping player '{}': invalid projected points", name);
                    continue;
                }
                if !raw.adp.is_finite() {
                    warn!("skipping player '{}': non-finite ADP", name);
                    continue;
                }
                players.push(PlayerRecord {
                    name,
                    position,
                    team: raw.team.trim().to_string(),
                    projected_points: raw.proj_points,
                    adp: raw.adp,
                });
            }
            Err(e) => {
                warn!("skipping malformed player row: {}", e);
            }
        }
    }
    Ok(players)
}

/// Load a pool from any reader producing the cleaned CSV table.
pub fn load_pool_from_reader<R: Read>(rdr: R) -> Result<PlayerPool, PoolError> {
    let players = load_pool_rows(rdr).map_err(|e| PoolError::Csv {
        path: "<reader>".into(),
        source: e,
    })?;
    finish(players)
}

/// Load a pool from a CSV file.
pub fn load_pool(path: &Path) -> Result<PlayerPool, PoolError> {
    let file = std::fs::File::open(path).map_err(|e| PoolError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    let players = load_pool_rows(file).map_err(|e| PoolError::Csv {
        path: path.display().to_string(),
        source: e,
    })?;
    finish(players)
}

fn finish(players: Vec<PlayerRecord>) -> Result<PlayerPool, PoolError> {
    if players.is_empty() {
        return Err(PoolError::Validation(
            "player CSV produced zero valid rows".into(),
        ));
    }
    let mut seen: HashMap<&str, usize> = HashMap::new();
    for p in &players {
        *seen.entry(p.name.as_str()).or_default() += 1;
    }
    for (name, n) in seen {
        if n > 1 {
            warn!("player name '{}' appears {} times; rows are kept as separate players", name, n);
        }
    }
    PlayerPool::new(players)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
