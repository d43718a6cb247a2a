// Snake draft playbook entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file)
// 2. Load config, copying defaults on first run
// 3. Load the player pool
// 4. Run the requested subcommand and write its output tables

mod output;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

use playbook_core::config::{self, Config};
use playbook_core::plan::greedy::heuristic_plan;
use playbook_core::plan::league::{plan_league, plan_slot, DrafterPlan};
use playbook_core::plan::optimizer::RosterOptimizer;
use playbook_core::plan::targets::{target_frequency, targets_for_plan};
use playbook_core::pool::{self, PlayerPool};
use playbook_core::simulation::convergence::{ConvergenceSettings, ConvergenceSimulator};
use playbook_core::simulation::draft::DraftModel;
use playbook_core::valuation::vor::vor_table;

#[derive(Parser)]
#[command(name = "playbook")]
#[command(about = "Snake draft planning: optimal position plans, VOR tables and simulated ADP")]
#[command(version)]
struct Cli {
    /// Project directory holding config/ and defaults/
    #[arg(long, default_value = ".")]
    base_dir: PathBuf,

    /// Player pool CSV, overriding data_paths.pool
    #[arg(long)]
    pool: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Optimal per-round position plan and player targets
    Plan {
        /// Only plan this draft slot
        #[arg(short, long)]
        slot: Option<u32>,
    },

    /// Greedy VOR plan, a fast baseline next to `plan`
    Heuristic {
        /// Only plan this draft slot
        #[arg(short, long)]
        slot: Option<u32>,
    },

    /// Refine ADP by repeated full-league simulation
    Simulate {
        /// RNG seed, overriding simulation.seed
        #[arg(long)]
        seed: Option<u64>,

        /// Iteration cap, overriding simulation.max_iterations
        #[arg(long)]
        max_iterations: Option<u32>,

        /// Re-plan the league from the refined ADP
        #[arg(long)]
        replan: bool,
    },

    /// Expected VOR per position for every pick and gap
    VorTable,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(&cli.base_dir)?;
    info!("Playbook starting up");

    let config = config::load_config(&cli.base_dir).context("failed to load configuration")?;
    info!(
        "Config loaded: league={}, {} teams, {} rounds",
        config.league.name, config.league.num_teams, config.league.rounds
    );

    let pool_path = cli
        .pool
        .clone()
        .unwrap_or_else(|| cli.base_dir.join(&config.data_paths.pool));
    let pool = pool::load_pool(&pool_path)
        .with_context(|| format!("failed to load player pool from {}", pool_path.display()))?;
    info!("Loaded {} players", pool.len());

    let output_dir = cli.base_dir.join(&config.data_paths.output_dir);
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;

    match cli.command {
        Commands::Plan { slot } => run_plan(&config, &pool, &output_dir, slot, ""),
        Commands::Heuristic { slot } => run_heuristic(&config, &pool, &output_dir, slot),
        Commands::Simulate {
            seed,
            max_iterations,
            replan,
        } => run_simulate(&config, &pool, &output_dir, seed, max_iterations, replan),
        Commands::VorTable => run_vor_table(&config, &pool, &output_dir),
    }?;

    info!("Playbook finished");
    Ok(())
}

/// Slots to plan: one when requested, otherwise the whole league.
fn selected_slots(config: &Config, slot: Option<u32>) -> anyhow::Result<Vec<u32>> {
    match slot {
        Some(s) if s == 0 || s > config.league.num_teams => anyhow::bail!(
            "slot {} is outside 1..={}",
            s,
            config.league.num_teams
        ),
        Some(s) => Ok(vec![s]),
        None => Ok((1..=config.league.num_teams).collect()),
    }
}

fn run_plan(
    config: &Config,
    pool: &PlayerPool,
    output_dir: &Path,
    slot: Option<u32>,
    suffix: &str,
) -> anyhow::Result<()> {
    let league = &config.league;
    let schedule = league.schedule()?;
    let optimizer = RosterOptimizer::new(&league.positions, league.rules.clone())?;
    let offsets = &config.strategy.valuation.anchor_offsets;

    let plans: Vec<DrafterPlan> = match slot {
        Some(s) => vec![plan_slot(pool, &schedule, &optimizer, s, &league.current_roster, offsets)?],
        None => plan_league(pool, &schedule, &optimizer, &league.current_roster, offsets)?
            .drafters()
            .to_vec(),
    };

    output::write_plans(&output_dir.join(format!("draft_plan{suffix}.csv")), &plans)?;

    let targets: Vec<_> = plans
        .iter()
        .flat_map(|d| targets_for_plan(pool, d.slot, &d.plan))
        .collect();
    output::write_targets(&output_dir.join(format!("player_targets{suffix}.csv")), &targets)?;
    output::write_target_frequency(
        &output_dir.join(format!("target_frequency{suffix}.csv")),
        &target_frequency(&targets),
    )?;

    for d in &plans {
        let positions: Vec<&str> = d.plan.positions().iter().map(|p| p.display_str()).collect();
        println!(
            "slot {:>2}: {:>8.1} pts  {}",
            d.slot,
            d.plan.total_points(),
            positions.join(" ")
        );
    }
    info!("Wrote {} plans to {}", plans.len(), output_dir.display());
    Ok(())
}

fn run_heuristic(
    config: &Config,
    pool: &PlayerPool,
    output_dir: &Path,
    slot: Option<u32>,
) -> anyhow::Result<()> {
    let league = &config.league;
    let schedule = league.schedule()?;
    let slots = selected_slots(config, slot)?;

    let mut plans = Vec::with_capacity(slots.len());
    for s in slots {
        let plan = heuristic_plan(
            pool,
            &schedule,
            s,
            &league.positions,
            &league.rules,
            &league.current_roster,
            &config.strategy.valuation.anchor_offsets,
        )
        .with_context(|| format!("heuristic plan failed for slot {s}"))?;
        plans.push(DrafterPlan {
            slot: s,
            picks: schedule.picks_for_slot(s)?,
            plan,
        });
    }

    output::write_plans(&output_dir.join("heuristic_plan.csv"), &plans)?;
    info!("Wrote {} heuristic plans", plans.len());
    Ok(())
}

fn run_simulate(
    config: &Config,
    pool: &PlayerPool,
    output_dir: &Path,
    seed: Option<u64>,
    max_iterations: Option<u32>,
    replan: bool,
) -> anyhow::Result<()> {
    let league = &config.league;
    let sim = &config.strategy.simulation;
    let seed = seed.unwrap_or(sim.seed);

    let model = DraftModel {
        positions: league.positions.clone(),
        rules: league.rules.clone(),
        existing: league.current_roster,
        anchor_offsets: config.strategy.valuation.anchor_offsets.clone(),
        candidate_window: config.strategy.valuation.candidate_window,
    };
    let settings = ConvergenceSettings {
        max_iterations: max_iterations.unwrap_or(sim.max_iterations),
        tolerance: sim.tolerance,
        trailing_window: sim.trailing_window,
        undrafted_adp: sim.undrafted_adp,
    };
    let simulator = ConvergenceSimulator::new(league.schedule()?, model, settings)?;

    info!("Simulating drafts with seed {}", seed);
    let mut rng = StdRng::seed_from_u64(seed);
    let outcome = simulator.run(pool, &mut rng)?;

    output::write_adp(&output_dir.join("simulated_adp.csv"), &outcome.estimates)?;
    output::write_simulation_summary(
        &output_dir.join("simulation_summary.json"),
        &outcome,
        seed,
    )?;

    if outcome.status.is_converged() {
        println!("converged after {} iterations", outcome.status.iterations());
    } else {
        println!(
            "not converged after {} iterations",
            outcome.status.iterations()
        );
    }

    if replan {
        let refined = pool.with_adp_table(&outcome.adp_table(), sim.undrafted_adp);
        run_plan(config, &refined, output_dir, None, "_refined")?;
    }
    Ok(())
}

fn run_vor_table(config: &Config, pool: &PlayerPool, output_dir: &Path) -> anyhow::Result<()> {
    let table = &config.strategy.vor_table;
    let rows = vor_table(
        pool,
        table.max_pick,
        table.max_gap,
        &config.league.positions,
        &config.strategy.valuation.anchor_offsets,
    );
    output::write_vor_table(
        &output_dir.join("vor_playbook.csv"),
        &rows,
        &config.league.positions,
    )?;
    info!("Wrote {} VOR rows", rows.len());
    Ok(())
}

/// Initialize tracing to log to a file under `<base_dir>/logs`.
fn init_tracing(base_dir: &Path) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = base_dir.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("playbook.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("playbook=info,playbook_core=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
