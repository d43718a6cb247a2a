// Configuration loading and parsing (league.toml, strategy.toml).

use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::draft::position::{parse_positions, Position};
use crate::draft::roster::{PositionConstraintGroup, RosterCounts, RosterRules};
use crate::draft::schedule::{ScheduleError, SnakeSchedule};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

impl ConfigError {
    fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        ConfigError::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub league: LeagueConfig,
    pub strategy: StrategyConfig,
    pub data_paths: DataPaths,
}

// ---------------------------------------------------------------------------
// league.toml structs
// ---------------------------------------------------------------------------

/// Wrapper for the top-level `[league]` table in league.toml.
#[derive(Debug, Clone, Deserialize)]
struct LeagueFile {
    league: RawLeague,
}

/// Integers are read signed so that negative values produce a validation
/// error naming the field instead of a generic parse failure.
#[derive(Debug, Clone, Deserialize)]
struct RawLeague {
    name: String,
    num_teams: i64,
    rounds: i64,
    flex_capacity: i64,
    positions: Vec<String>,
    constraint_groups: Vec<RawConstraintGroup>,
    #[serde(default)]
    current_roster: HashMap<String, i64>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawConstraintGroup {
    positions: Vec<String>,
    limit: i64,
    #[serde(default)]
    flex: bool,
}

/// League shape and roster rules.
#[derive(Debug, Clone)]
pub struct LeagueConfig {
    pub name: String,
    pub num_teams: u32,
    pub rounds: u32,
    /// Selectable positions in canonical order.
    pub positions: Vec<Position>,
    pub rules: RosterRules,
    /// Players each drafter already holds before the draft starts.
    pub current_roster: RosterCounts,
}

impl LeagueConfig {
    pub fn schedule(&self) -> Result<SnakeSchedule, ScheduleError> {
        SnakeSchedule::new(self.num_teams, self.rounds)
    }
}

// ---------------------------------------------------------------------------
// strategy.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire strategy.toml file.
#[derive(Debug, Clone, Deserialize)]
struct StrategyFile {
    #[serde(default)]
    valuation: ValuationConfig,
    vor_table: VorTableConfig,
    #[serde(default)]
    simulation: SimulationConfig,
    data_paths: DataPaths,
}

/// The public strategy config assembled from the strategy.toml sections.
#[derive(Debug, Clone)]
pub struct StrategyConfig {
    pub valuation: ValuationConfig,
    pub vor_table: VorTableConfig,
    pub simulation: SimulationConfig,
}

/// Missing keys take their defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ValuationConfig {
    /// Offsets added to a pick number when sampling availability.
    pub anchor_offsets: Vec<i32>,
    /// Fraction below the best projection still treated as an equally
    /// plausible pick during simulation (0.10 = within 10%).
    pub candidate_window: f64,
}

impl Default for ValuationConfig {
    fn default() -> Self {
        ValuationConfig {
            anchor_offsets: crate::valuation::vor::DEFAULT_ANCHOR_OFFSETS.to_vec(),
            candidate_window: 0.10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct VorTableConfig {
    pub max_pick: u32,
    pub max_gap: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub max_iterations: u32,
    pub tolerance: f64,
    /// Iterations averaged into the final ADP estimate.
    pub trailing_window: u32,
    /// ADP assigned to players nobody drafted in an iteration.
    pub undrafted_adp: f64,
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            max_iterations: 50,
            tolerance: 0.05,
            trailing_window: 10,
            undrafted_adp: 150.0,
            seed: 2025,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataPaths {
    pub pool: String,
    pub output_dir: String,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/league.toml` and
/// `config/strategy.toml`, relative to the given `base_dir`.
///
/// This is the lower-level loading primitive that does not auto-copy defaults.
/// Prefer `load_config()` which handles default initialization automatically.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let config_dir = base_dir.join("config");

    // --- league.toml (required) ---
    let league_path = config_dir.join("league.toml");
    let league_text = read_file(&league_path)?;
    let league_file: LeagueFile =
        toml::from_str(&league_text).map_err(|e| ConfigError::ParseError {
            path: league_path.clone(),
            source: e,
        })?;
    let league = build_league(league_file.league)?;

    // --- strategy.toml (required) ---
    let strategy_path = config_dir.join("strategy.toml");
    let strategy_text = read_file(&strategy_path)?;
    let strategy_file: StrategyFile =
        toml::from_str(&strategy_text).map_err(|e| ConfigError::ParseError {
            path: strategy_path.clone(),
            source: e,
        })?;

    let strategy = StrategyConfig {
        valuation: strategy_file.valuation,
        vor_table: strategy_file.vor_table,
        simulation: strategy_file.simulation,
    };

    let config = Config {
        league,
        strategy,
        data_paths: strategy_file.data_paths,
    };

    validate(&config)?;

    Ok(config)
}

/// Files read from `config/`, each seeded from `defaults/` on first run.
const CONFIG_FILES: [&str; 2] = ["league.toml", "strategy.toml"];

/// Copy `league.toml` and `strategy.toml` from `defaults/` into `config/`
/// when they are missing there. Existing files are never overwritten.
/// Returns the files that were copied.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");
    let mut copied = Vec::new();

    for name in CONFIG_FILES {
        let target = config_dir.join(name);
        if target.exists() {
            continue;
        }
        let source = defaults_dir.join(name);
        if !source.is_file() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "config/{name} is missing and there is no defaults/{name} to copy in {}",
                    base_dir.display()
                ),
            });
        }
        std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to create {}: {e}", config_dir.display()),
        })?;
        std::fs::copy(&source, &target).map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to copy defaults/{name} to config/{name}: {e}"),
        })?;
        info!("Copied defaults/{} to {}", name, target.display());
        copied.push(target);
    }

    Ok(copied)
}

/// Convenience wrapper: loads config relative to `base_dir` after copying
/// any missing default files.
pub fn load_config(base_dir: &Path) -> Result<Config, ConfigError> {
    ensure_config_files(base_dir)?;
    load_config_from(base_dir)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

fn non_negative(field: &str, value: i64) -> Result<u32, ConfigError> {
    if value < 0 {
        return Err(ConfigError::invalid(field, format!("must be >= 0, got {value}")));
    }
    u32::try_from(value).map_err(|_| ConfigError::invalid(field, format!("too large: {value}")))
}

fn positive(field: &str, value: i64) -> Result<u32, ConfigError> {
    if value <= 0 {
        return Err(ConfigError::invalid(field, "must be greater than 0"));
    }
    non_negative(field, value)
}

fn parse_position(field: &str, raw: &str) -> Result<Position, ConfigError> {
    Position::from_str_pos(raw)
        .ok_or_else(|| ConfigError::invalid(field, format!("unknown position '{raw}'")))
}

fn build_league(raw: RawLeague) -> Result<LeagueConfig, ConfigError> {
    let num_teams = positive("league.num_teams", raw.num_teams)?;
    let rounds = positive("league.rounds", raw.rounds)?;
    let flex_capacity = non_negative("league.flex_capacity", raw.flex_capacity)?;

    let mut positions = parse_positions(&raw.positions).map_err(|bad| {
        ConfigError::invalid("league.positions", format!("unknown position '{bad}'"))
    })?;
    positions.sort();
    if positions.windows(2).any(|w| w[0] == w[1]) {
        return Err(ConfigError::invalid("league.positions", "duplicate position"));
    }

    let mut groups = Vec::with_capacity(raw.constraint_groups.len());
    for (i, g) in raw.constraint_groups.iter().enumerate() {
        let field = format!("league.constraint_groups[{i}]");
        let mut members = Vec::with_capacity(g.positions.len());
        for p in &g.positions {
            members.push(parse_position(&format!("{field}.positions"), p)?);
        }
        let limit = non_negative(&format!("{field}.limit"), g.limit)?;
        groups.push(PositionConstraintGroup::new(members, limit, g.flex));
    }

    let mut existing = BTreeMap::new();
    for (key, &count) in &raw.current_roster {
        let pos = parse_position("league.current_roster", key)?;
        let n = non_negative(&format!("league.current_roster.{key}"), count)?;
        existing.insert(pos, n);
    }

    Ok(LeagueConfig {
        name: raw.name,
        num_teams,
        rounds,
        positions,
        rules: RosterRules::new(groups, flex_capacity),
        current_roster: RosterCounts::from_map(&existing),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    let league = &config.league;

    if league.positions.is_empty() {
        return Err(ConfigError::invalid("league.positions", "must not be empty"));
    }

    for (i, group) in league.rules.groups.iter().enumerate() {
        let field = format!("league.constraint_groups[{i}].positions");
        if group.positions.is_empty() {
            return Err(ConfigError::invalid(field, "must not be empty"));
        }
        if let Some(p) = group.positions.iter().find(|p| !league.positions.contains(p)) {
            return Err(ConfigError::invalid(
                field,
                format!("{p} is not listed in league.positions"),
            ));
        }
    }

    // Limits that cannot hold a full draft are a configuration mistake.
    if let Some(capacity) = league.rules.max_roster_size(&league.positions) {
        let needed = league.rounds + league.current_roster.total();
        if capacity < needed {
            return Err(ConfigError::invalid(
                "league.constraint_groups",
                format!(
                    "group limits plus flex capacity hold {capacity} players but \
                     {needed} are required ({} rounds + existing roster)",
                    league.rounds
                ),
            ));
        }
    }

    // Strategy validations
    let valuation = &config.strategy.valuation;
    if valuation.anchor_offsets.is_empty() {
        return Err(ConfigError::invalid(
            "valuation.anchor_offsets",
            "must contain at least one offset",
        ));
    }
    let window = valuation.candidate_window;
    if !(0.0..1.0).contains(&window) {
        return Err(ConfigError::invalid(
            "valuation.candidate_window",
            format!("must be in [0.0, 1.0), got {window}"),
        ));
    }

    let table = &config.strategy.vor_table;
    let table_fields: &[(&str, u32)] = &[
        ("vor_table.max_pick", table.max_pick),
        ("vor_table.max_gap", table.max_gap),
    ];
    for (name, val) in table_fields {
        if *val == 0 {
            return Err(ConfigError::invalid(*name, "must be > 0"));
        }
    }

    let sim = &config.strategy.simulation;
    if sim.max_iterations == 0 {
        return Err(ConfigError::invalid("simulation.max_iterations", "must be > 0"));
    }
    if sim.trailing_window == 0 {
        return Err(ConfigError::invalid("simulation.trailing_window", "must be > 0"));
    }
    if !sim.tolerance.is_finite() || sim.tolerance < 0.0 {
        return Err(ConfigError::invalid(
            "simulation.tolerance",
            format!("must be a finite value >= 0, got {}", sim.tolerance),
        ));
    }
    if !sim.undrafted_adp.is_finite() || sim.undrafted_adp < 1.0 {
        return Err(ConfigError::invalid(
            "simulation.undrafted_adp",
            format!("must be a finite value >= 1, got {}", sim.undrafted_adp),
        ));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
