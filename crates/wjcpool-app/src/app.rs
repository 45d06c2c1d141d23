// Pipeline: submissions -> provider records -> scoring -> leaderboard ->
// snapshot. Nothing is written unless every earlier step succeeded.

use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Utc};
use tracing::{info, warn};
use wjcpool_core::aggregate::{score_teams, AggregationReport, EntryKind};
use wjcpool_core::leaderboard::{build_leaderboard, Leaderboard};
use wjcpool_core::roster::RosterIssue;

use crate::config::Config;
use crate::snapshot::{write_snapshot, Snapshot};
use crate::stats_client::{StatsKind, StatsSource};
use crate::submissions::{load_submissions, MalformedRow};

/// Everything a run produced, for callers that want more than the files.
#[derive(Debug)]
pub struct RunOutcome {
    pub leaderboard: Leaderboard,
    pub report: AggregationReport,
    pub roster_issues: Vec<RosterIssue>,
    pub malformed: Vec<MalformedRow>,
    pub snapshot_path: PathBuf,
}

/// Score every submission under `base_dir` against `source` and write a
/// snapshot stamped `now`. Relative config paths resolve against `base_dir`.
pub async fn run(
    config: &Config,
    base_dir: &Path,
    source: &dyn StatsSource,
    now: DateTime<Utc>,
) -> anyhow::Result<RunOutcome> {
    let submissions_dir = base_dir.join(&config.paths.submissions_dir);
    let results_dir = base_dir.join(&config.paths.results_dir);

    let submissions = load_submissions(&submissions_dir, config.roster.goalie_pick_policy)
        .context("failed to load submissions")?;
    let mut teams = submissions.teams;
    info!("Loaded {} submissions", teams.len());

    // Both fetches complete before any scoring or output.
    info!("Fetching skater stats...");
    let skaters = source
        .fetch(StatsKind::Skater)
        .await
        .context("failed to fetch skater stats")?;
    info!("Fetching goaltender stats...");
    let goalies = source
        .fetch(StatsKind::Goaltender)
        .await
        .context("failed to fetch goaltender stats")?;

    let report = score_teams(&mut teams, &skaters, &goalies);
    info!(
        "Skater pass: {} records, {} matched, {} unscored",
        report.skaters.records, report.skaters.matched, report.skaters.unscored
    );
    info!(
        "Goalie pass: {} records, {} matched, {} without competitor",
        report.goalies.records, report.goalies.matched, report.goalies.missing_competitor
    );

    log_collisions(&report);
    if config.diagnostics.suggest_matches {
        log_unmatched(&report);
    }

    let leaderboard = build_leaderboard(&teams);
    if let Some(leader) = leaderboard.teams.first() {
        info!("Leader: {} with {:.2}", leader.name, leader.score);
    }

    let mut snapshot = Snapshot::new(
        now,
        &config.stats.season,
        &config.stats.season_type,
        &leaderboard,
    )
    .with_collisions(&report.collisions);
    if config.diagnostics.suggest_matches {
        snapshot = snapshot.with_unmatched(&report.unmatched);
    }
    let snapshot_path =
        write_snapshot(&results_dir, &snapshot).context("failed to write result snapshot")?;
    info!("Wrote {}", snapshot_path.display());

    Ok(RunOutcome {
        leaderboard,
        report,
        roster_issues: submissions.roster_issues,
        malformed: submissions.malformed,
        snapshot_path,
    })
}

fn log_unmatched(report: &AggregationReport) {
    if report.unmatched.is_empty() {
        info!("Every roster entry matched a stats record");
        return;
    }
    warn!("{} roster entries were not found in the stats", report.unmatched.len());
    for entry in &report.unmatched {
        let kind = match entry.kind {
            EntryKind::Skater => "player",
            EntryKind::Goalie => "goalie pick",
        };
        if entry.candidates.is_empty() {
            warn!("{}: {} '{}' not found", entry.team, kind, entry.name);
        } else {
            let names: Vec<&str> = entry.candidates.iter().map(|c| c.name.as_str()).collect();
            warn!(
                "{}: {} '{}' not found, possible matches: {}",
                entry.team,
                kind,
                entry.name,
                names.join(", ")
            );
        }
    }
}

fn log_collisions(report: &AggregationReport) {
    for collision in &report.collisions {
        warn!(
            "Ambiguous name `{}` ({}): records {} all credited; check the roster",
            collision.key,
            collision.teams.join(", "),
            collision.records.join(" / ")
        );
    }
}
