// Output tables: CSV writers for plans, targets, ADP and the VOR playbook,
// plus the JSON simulation summary.

use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Serialize;

use playbook_core::draft::position::Position;
use playbook_core::plan::league::DrafterPlan;
use playbook_core::plan::targets::{PlayerTarget, TargetFrequency};
use playbook_core::simulation::convergence::{
    AdpEstimate, ConvergenceStatus, IterationSummary, SimulationOutcome,
};
use playbook_core::valuation::vor::VorTableRow;

#[derive(Serialize)]
struct PlanRow {
    slot: u32,
    round: u32,
    overall_pick: u32,
    position: &'static str,
    projected_points: f64,
    cumulative_points: f64,
}

#[derive(Serialize)]
struct TargetRow<'a> {
    slot: u32,
    round: u32,
    overall_pick: u32,
    position: &'static str,
    player: &'a str,
    projected_points: f64,
    adp: Option<f64>,
}

#[derive(Serialize)]
struct FrequencyRow<'a> {
    player: &'a str,
    position: &'static str,
    times_targeted: usize,
}

#[derive(Serialize)]
struct AdpRow<'a> {
    player: &'a str,
    position: &'static str,
    refined_average_draft_position: f64,
    times_drafted: u32,
    fallback: bool,
}

#[derive(Serialize)]
struct SimulationSummary<'a> {
    generated_at: DateTime<Utc>,
    seed: u64,
    status: ConvergenceStatus,
    iterations: &'a [IterationSummary],
}

fn writer(path: &Path) -> anyhow::Result<csv::Writer<std::fs::File>> {
    csv::Writer::from_path(path).with_context(|| format!("failed to create {}", path.display()))
}

/// One row per (slot, round).
pub fn write_plans(path: &Path, plans: &[DrafterPlan]) -> anyhow::Result<()> {
    let mut wtr = writer(path)?;
    for drafter in plans {
        for entry in drafter.plan.entries() {
            wtr.serialize(PlanRow {
                slot: drafter.slot,
                round: entry.round,
                overall_pick: entry.pick,
                position: entry.position.display_str(),
                projected_points: entry.points,
                cumulative_points: entry.cumulative_points,
            })?;
        }
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_targets(path: &Path, targets: &[PlayerTarget]) -> anyhow::Result<()> {
    let mut wtr = writer(path)?;
    for t in targets {
        wtr.serialize(TargetRow {
            slot: t.slot,
            round: t.round,
            overall_pick: t.pick,
            position: t.position.display_str(),
            player: t.player.as_deref().unwrap_or(""),
            projected_points: t.projected_points,
            adp: t.adp,
        })?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_target_frequency(path: &Path, freq: &[TargetFrequency]) -> anyhow::Result<()> {
    let mut wtr = writer(path)?;
    for f in freq {
        wtr.serialize(FrequencyRow {
            player: &f.player,
            position: f.position.display_str(),
            times_targeted: f.times_targeted,
        })?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_adp(path: &Path, estimates: &[AdpEstimate]) -> anyhow::Result<()> {
    let mut wtr = writer(path)?;
    for e in estimates {
        wtr.serialize(AdpRow {
            player: &e.name,
            position: e.position.display_str(),
            refined_average_draft_position: e.adp,
            times_drafted: e.times_drafted,
            fallback: e.fallback,
        })?;
    }
    wtr.flush()?;
    Ok(())
}

/// `pick_number, picks_until_next` followed by one VOR column per position.
pub fn write_vor_table(
    path: &Path,
    rows: &[VorTableRow],
    positions: &[Position],
) -> anyhow::Result<()> {
    let mut wtr = writer(path)?;
    let mut header = vec!["pick_number".to_string(), "picks_until_next".to_string()];
    header.extend(positions.iter().map(|p| p.display_str().to_string()));
    wtr.write_record(&header)?;

    for row in rows {
        let mut record = vec![row.pick_number.to_string(), row.picks_until_next.to_string()];
        record.extend(
            positions
                .iter()
                .map(|p| format!("{:.2}", row.vor.get(p).map_or(0.0, |v| v.vor))),
        );
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_simulation_summary(
    path: &Path,
    outcome: &SimulationOutcome,
    seed: u64,
) -> anyhow::Result<()> {
    let summary = SimulationSummary {
        generated_at: Utc::now(),
        seed,
        status: outcome.status,
        iterations: &outcome.history,
    };
    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(file, &summary)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use playbook_core::plan::optimizer::DraftPlan;
    use playbook_core::valuation::vor::{PositionVor, ValueSource};
    use std::fs;

    fn scratch(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(name);
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn plan_csv_has_expected_columns() {
        let dir = scratch("playbook_output_plan");
        let plan = DraftPlan::from_selections(
            &[
                (3, Position::RunningBack, 250.0),
                (10, Position::Quarterback, 200.0),
            ],
            vec![],
        );
        let path = dir.join("draft_plan.csv");
        write_plans(
            &path,
            &[DrafterPlan {
                slot: 3,
                picks: vec![3, 10],
                plan,
            }],
        )
        .unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "slot,round,overall_pick,position,projected_points,cumulative_points"
        );
        assert_eq!(lines[1], "3,1,3,RB,250.0,250.0");
        assert_eq!(lines[2], "3,2,10,QB,200.0,450.0");
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn vor_table_has_one_column_per_position() {
        let dir = scratch("playbook_output_vor");
        let vor = [(
            Position::RunningBack,
            PositionVor {
                vor: 12.345,
                anchors: 3,
                gaps: 0,
                source: ValueSource::Computed,
            },
        )]
        .into_iter()
        .collect();
        let rows = vec![VorTableRow {
            pick_number: 1,
            picks_until_next: 2,
            vor,
        }];
        let path = dir.join("vor_playbook.csv");
        write_vor_table(&path, &rows, &[Position::RunningBack, Position::Kicker]).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text, "pick_number,picks_until_next,RB,PK\n1,2,12.35,0.00\n");
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn summary_json_carries_status_and_history() {
        let dir = scratch("playbook_output_summary");
        let outcome = SimulationOutcome {
            estimates: vec![],
            history: vec![IterationSummary {
                iteration: 1,
                players_drafted: 4,
                mean_abs_change: None,
                mean_team_points: 100.0,
                team_points_spread: 5.0,
            }],
            status: ConvergenceStatus::NotConverged {
                iterations: 1,
                last_delta: None,
            },
        };
        let path = dir.join("simulation_summary.json");
        write_simulation_summary(&path, &outcome, 7).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["seed"], 7);
        assert_eq!(value["status"]["status"], "not_converged");
        assert_eq!(value["iterations"][0]["players_drafted"], 4);
        assert!(value["generated_at"].is_string());
        let _ = fs::remove_dir_all(&dir);
    }
}
