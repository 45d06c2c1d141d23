// Aggregation engine: credits provider records to every roster that holds
// the player (or the goalie country), then reports entries nothing matched.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::debug;

use crate::normalize::{name_key, normalize_country, title_case};
use crate::roster::Team;
use crate::scoring::{score_record, Bucket, ScoreOutcome, StatisticsRecord};

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

/// Counters for one pass over a record set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PassSummary {
    pub records: usize,
    /// Records that credited at least one team.
    pub matched: usize,
    /// Scored records no roster or goalie pick referenced.
    pub unmatched: usize,
    /// Records whose position is not scored.
    pub unscored: usize,
    /// Goalie records without a competitor identifier.
    pub missing_competitor: usize,
    /// Skater records whose name normalizes to nothing.
    pub missing_name: usize,
    /// Individual team credits (one record can credit several teams).
    pub credits: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Skater,
    Goalie,
}

/// An observed provider name or country that overlaps an unmatched key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    pub key: String,
    pub name: String,
}

/// A roster entry or goalie pick that no record matched, with near-match
/// candidates for manual review. Candidates are never applied automatically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnmatchedEntry {
    pub team: String,
    pub kind: EntryKind,
    pub name: String,
    pub key: String,
    pub candidates: Vec<Candidate>,
}

/// Distinct provider records whose names normalize to one rostered key.
/// Every such record is still credited; the collision is only reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NameCollision {
    pub key: String,
    /// Each distinct "Name (POS)" seen under the key, in record order.
    pub records: Vec<String>,
    /// Teams whose roster holds the key.
    pub teams: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregationReport {
    pub skaters: PassSummary,
    pub goalies: PassSummary,
    pub unmatched: Vec<UnmatchedEntry>,
    pub collisions: Vec<NameCollision>,
}

// ---------------------------------------------------------------------------
// Aggregator
// ---------------------------------------------------------------------------

/// Holds exclusive access to the teams for the duration of a scoring run.
pub struct Aggregator<'a> {
    teams: &'a mut [Team],
    /// Normalized key -> display name of every named record seen.
    observed_names: BTreeMap<String, String>,
    observed_countries: BTreeSet<String>,
    /// Normalized key -> distinct "Name (POS)" of scored skater records.
    skater_variants: BTreeMap<String, Vec<String>>,
}

impl<'a> Aggregator<'a> {
    pub fn new(teams: &'a mut [Team]) -> Self {
        Self {
            teams,
            observed_names: BTreeMap::new(),
            observed_countries: BTreeSet::new(),
            skater_variants: BTreeMap::new(),
        }
    }

    /// Score every record and credit all matching teams in place.
    pub fn apply(&mut self, records: &[StatisticsRecord]) -> PassSummary {
        let mut summary = PassSummary {
            records: records.len(),
            ..PassSummary::default()
        };

        for record in records {
            let key = name_key(&record.first_name, &record.last_name);
            if !key.is_empty() {
                self.observed_names
                    .entry(key.clone())
                    .or_insert_with(|| record.display_name());
            }

            let (points, bucket) = match score_record(record) {
                ScoreOutcome::Scored { points, bucket } => (points, bucket),
                ScoreOutcome::Unscored => {
                    debug!(
                        "ignoring {} with unscored position `{}`",
                        record.display_name(),
                        record.position
                    );
                    summary.unscored += 1;
                    continue;
                }
            };

            let credited = match bucket {
                Bucket::Goalie => {
                    let Some(competitor) = record.competitor.as_deref().map(normalize_country)
                    else {
                        debug!("goalie {} has no competitor id, skipping", record.display_name());
                        summary.missing_competitor += 1;
                        continue;
                    };
                    if competitor.is_empty() {
                        summary.missing_competitor += 1;
                        continue;
                    }
                    self.observed_countries.insert(competitor.clone());
                    self.credit_goalies(&competitor, points)
                }
                Bucket::Forward | Bucket::Defense => {
                    if key.is_empty() {
                        debug!("{} record without a name, skipping", bucket);
                        summary.missing_name += 1;
                        continue;
                    }
                    self.note_variant(&key, record);
                    self.credit_skaters(&key, points)
                }
            };

            if credited > 0 {
                summary.matched += 1;
                summary.credits += credited;
            } else {
                summary.unmatched += 1;
            }
        }

        summary
    }

    fn note_variant(&mut self, key: &str, record: &StatisticsRecord) {
        let variant = format!(
            "{} ({})",
            record.display_name(),
            record.position.trim().to_uppercase()
        );
        let seen = self.skater_variants.entry(key.to_string()).or_default();
        if !seen.contains(&variant) {
            seen.push(variant);
        }
    }

    fn credit_goalies(&mut self, country: &str, points: f64) -> usize {
        let mut credited = 0;
        for team in self.teams.iter_mut() {
            if team.goalie_country.as_deref() == Some(country) {
                team.credit_goalie(points);
                credited += 1;
            }
        }
        credited
    }

    fn credit_skaters(&mut self, key: &str, points: f64) -> usize {
        self.teams
            .iter_mut()
            .map(|team| team.credit_player(key, points))
            .filter(|&hit| hit)
            .count()
    }

    /// Rostered keys that more than one distinct skater record mapped onto,
    /// in key order.
    pub fn collisions(&self) -> Vec<NameCollision> {
        self.skater_variants
            .iter()
            .filter(|(_, records)| records.len() > 1)
            .filter_map(|(key, records)| {
                let teams: Vec<String> = self
                    .teams
                    .iter()
                    .filter(|t| t.players.contains_key(key))
                    .map(|t| t.name.clone())
                    .collect();
                (!teams.is_empty()).then(|| NameCollision {
                    key: key.clone(),
                    records: records.clone(),
                    teams,
                })
            })
            .collect()
    }

    /// Every skater entry and goalie pick still unfound, in team order.
    pub fn unmatched(&self) -> Vec<UnmatchedEntry> {
        let mut out = Vec::new();
        for team in self.teams.iter() {
            for entry in team.players.values().filter(|p| !p.found) {
                out.push(UnmatchedEntry {
                    team: team.name.clone(),
                    kind: EntryKind::Skater,
                    name: entry.display_name(),
                    key: entry.key.clone(),
                    candidates: overlapping(
                        &entry.key,
                        self.observed_names
                            .iter()
                            .map(|(k, name)| (k.as_str(), name.clone())),
                    ),
                });
            }

            if let Some(country) = team.goalie_country.as_deref() {
                if !team.goalie_found {
                    out.push(UnmatchedEntry {
                        team: team.name.clone(),
                        kind: EntryKind::Goalie,
                        name: team.goalie_label().unwrap_or_default(),
                        key: country.to_string(),
                        candidates: overlapping(
                            country,
                            self.observed_countries
                                .iter()
                                .map(|c| (c.as_str(), title_case(c))),
                        ),
                    });
                }
            }
        }
        out
    }
}

/// Observed keys containing `key`, or contained in it.
fn overlapping<'k, I>(key: &str, observed: I) -> Vec<Candidate>
where
    I: Iterator<Item = (&'k str, String)>,
{
    if key.is_empty() {
        return Vec::new();
    }
    observed
        .filter(|(k, _)| !k.is_empty() && (k.contains(key) || key.contains(k)))
        .map(|(k, name)| Candidate {
            key: k.to_string(),
            name,
        })
        .collect()
}

/// Run the skater pass, then the goalie pass, then collect unmatched entries.
pub fn score_teams(
    teams: &mut [Team],
    skaters: &[StatisticsRecord],
    goalies: &[StatisticsRecord],
) -> AggregationReport {
    let mut aggregator = Aggregator::new(teams);
    let skaters = aggregator.apply(skaters);
    let goalies = aggregator.apply(goalies);
    AggregationReport {
        skaters,
        goalies,
        unmatched: aggregator.unmatched(),
        collisions: aggregator.collisions(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::{GoaliePickPolicy, SubmissionRow};

    fn skater(first: &str, last: &str, position: &str, goals: u32, assists: u32) -> StatisticsRecord {
        StatisticsRecord {
            first_name: first.into(),
            last_name: last.into(),
            position: position.into(),
            goals,
            assists,
            ..Default::default()
        }
    }

    fn goalie(country: Option<&str>, saves: u32, wins: u32, losses: u32) -> StatisticsRecord {
        StatisticsRecord {
            first_name: "Net".into(),
            last_name: "Minder".into(),
            position: "G".into(),
            saves,
            wins,
            losses,
            competitor: country.map(str::to_string),
            ..Default::default()
        }
    }

    fn team(name: &str, rows: Vec<SubmissionRow>) -> Team {
        Team::from_rows(name, rows, GoaliePickPolicy::FirstWins).0
    }

    fn assert_totals_consistent(teams: &[Team]) {
        for t in teams {
            assert!(
                (t.total - t.recomputed_total()).abs() < 1e-9,
                "{}: total {} != recomputed {}",
                t.name,
                t.total,
                t.recomputed_total()
            );
        }
    }

    #[test]
    fn skater_record_credits_every_roster_holding_the_player() {
        let mut teams = vec![
            team("a", vec![SubmissionRow::skater("Jon", "Doe", "Canada")]),
            team("b", vec![SubmissionRow::skater("JON", "doe", "Canada")]),
            team("c", vec![SubmissionRow::skater("Other", "Guy", "Canada")]),
        ];
        let summary = Aggregator::new(&mut teams).apply(&[skater("Jon", "Doe", "C", 1, 2)]);

        assert_eq!(summary.matched, 1);
        assert_eq!(summary.credits, 2);
        assert_eq!(teams[0].players["jondoe"].score, Some(3.5));
        assert_eq!(teams[1].players["jondoe"].score, Some(3.5));
        assert!(teams[0].players["jondoe"].found);
        assert!((teams[2].total).abs() < 1e-9);
        assert!(!teams[2].players["otherguy"].found);
        assert_totals_consistent(&teams);
    }

    #[test]
    fn goalie_record_broadcasts_to_every_matching_country() {
        let mut teams = vec![
            team("a", vec![SubmissionRow::goalie("usa")]),
            team("b", vec![SubmissionRow::goalie("USA")]),
            team("c", vec![SubmissionRow::goalie("canada")]),
        ];
        let summary = Aggregator::new(&mut teams).apply(&[goalie(Some("USA"), 20, 1, 0)]);

        assert_eq!(summary.credits, 2);
        for t in &teams[..2] {
            assert!(t.goalie_found);
            assert!((t.goalie_score.unwrap() - 8.0).abs() < 1e-9);
            assert!((t.total - 8.0).abs() < 1e-9);
        }
        assert!(!teams[2].goalie_found);
        assert_eq!(teams[2].goalie_score, None);
        assert_totals_consistent(&teams);
    }

    #[test]
    fn goalie_scores_accumulate_across_records() {
        let mut teams = vec![team("a", vec![SubmissionRow::goalie("finland")])];
        Aggregator::new(&mut teams).apply(&[
            goalie(Some("finland"), 20, 1, 0),
            goalie(Some("finland"), 0, 0, 1),
        ]);
        assert!((teams[0].goalie_score.unwrap() - 5.0).abs() < 1e-9);
        assert!((teams[0].total - 5.0).abs() < 1e-9);
    }

    #[test]
    fn goalie_without_competitor_is_skipped() {
        let mut teams = vec![team("a", vec![SubmissionRow::goalie("finland")])];
        let summary = Aggregator::new(&mut teams)
            .apply(&[goalie(None, 30, 1, 0), goalie(Some("  "), 30, 1, 0)]);
        assert_eq!(summary.missing_competitor, 2);
        assert_eq!(summary.matched, 0);
        assert!(!teams[0].goalie_found);
        assert!(teams[0].total.abs() < 1e-9);
    }

    #[test]
    fn unscored_positions_change_nothing() {
        let mut teams = vec![team("a", vec![SubmissionRow::skater("Jon", "Doe", "Canada")])];
        let before = teams.clone();
        let summary = Aggregator::new(&mut teams).apply(&[skater("Jon", "Doe", "UNK", 5, 5)]);
        assert_eq!(summary.unscored, 1);
        assert_eq!(teams, before);
    }

    #[test]
    fn zero_point_record_still_marks_found() {
        let mut teams = vec![team("a", vec![SubmissionRow::skater("Jon", "Doe", "Canada")])];
        Aggregator::new(&mut teams).apply(&[skater("Jon", "Doe", "D", 0, 0)]);
        let entry = &teams[0].players["jondoe"];
        assert!(entry.found);
        assert_eq!(entry.score, Some(0.0));
    }

    #[test]
    fn nameless_skater_record_is_counted_and_skipped() {
        let mut teams = vec![team("a", vec![SubmissionRow::skater("", "", "Canada")])];
        let summary = Aggregator::new(&mut teams).apply(&[skater("", " ", "F", 3, 0)]);
        assert_eq!(summary.missing_name, 1);
        assert!(teams[0].total.abs() < 1e-9);
    }

    #[test]
    fn skater_and_goalie_passes_sum_into_total() {
        let mut teams = vec![team(
            "a",
            vec![
                SubmissionRow::skater("Jon", "Doe", "Canada"),
                SubmissionRow::skater("Ann", "Smith", "USA"),
                SubmissionRow::goalie("Finland"),
            ],
        )];
        let report = score_teams(
            &mut teams,
            &[
                skater("Jon", "Doe", "F", 1, 2),
                skater("Ann", "Smith", "RD", 1, 0),
                skater("Jon", "Doe", "F", 1, 0),
            ],
            &[goalie(Some("finland"), 10, 1, 0)],
        );

        assert_eq!(report.skaters.records, 3);
        assert_eq!(report.skaters.matched, 3);
        assert_eq!(report.goalies.matched, 1);
        assert_eq!(teams[0].players["jondoe"].score, Some(5.0));
        assert_eq!(teams[0].players["annsmith"].score, Some(3.0));
        assert!((teams[0].total - 14.5).abs() < 1e-9);
        assert!(report.unmatched.is_empty());
        assert_totals_consistent(&teams);
    }

    #[test]
    fn unmatched_entries_get_substring_candidates() {
        let mut teams = vec![team(
            "a",
            vec![
                SubmissionRow::skater("Matt", "Savoie", "Canada"),
                SubmissionRow::skater("Zach", "Benson", "Canada"),
                SubmissionRow::goalie("czech"),
            ],
        )];
        let report = score_teams(
            &mut teams,
            &[
                skater("Matthew", "Savoie", "C", 0, 1),
                skater("Zachary", "Benson", "LW", 0, 0),
                skater("Savoie", "", "C", 0, 0),
            ],
            &[goalie(Some("czechia"), 5, 0, 0)],
        );

        assert_eq!(report.unmatched.len(), 3);

        let benson = report.unmatched.iter().find(|u| u.key == "zachbenson").unwrap();
        assert_eq!(benson.kind, EntryKind::Skater);
        assert_eq!(benson.name, "Zach Benson");
        assert!(benson.candidates.is_empty());

        let savoie = report.unmatched.iter().find(|u| u.key == "mattsavoie").unwrap();
        let keys: Vec<&str> = savoie.candidates.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, vec!["savoie"]);

        let goalie_pick = report
            .unmatched
            .iter()
            .find(|u| u.kind == EntryKind::Goalie)
            .unwrap();
        assert_eq!(goalie_pick.name, "Goalie (Czech)");
        assert_eq!(goalie_pick.candidates.len(), 1);
        assert_eq!(goalie_pick.candidates[0].key, "czechia");
        assert_eq!(goalie_pick.candidates[0].name, "Czechia");

        // Suggestions never credit anything.
        assert!(teams[0].total.abs() < 1e-9);
    }

    #[test]
    fn unscored_record_name_is_still_offered_as_candidate() {
        let mut teams = vec![team("a", vec![SubmissionRow::skater("Jon", "Doe", "Canada")])];
        let report = score_teams(&mut teams, &[skater("Jon", "Doe", "UNK", 1, 0)], &[]);
        assert_eq!(report.unmatched.len(), 1);
        assert_eq!(report.unmatched[0].candidates[0].name, "Jon Doe");
    }

    #[test]
    fn distinct_records_sharing_a_key_are_reported() {
        let mut teams = vec![
            team("a", vec![SubmissionRow::skater("Jon", "Doe", "Canada")]),
            team("b", vec![SubmissionRow::skater("Other", "Guy", "Canada")]),
        ];
        let report = score_teams(
            &mut teams,
            &[skater("Jon", "Doe", "F", 1, 0), skater("Jön", "Doe", "D", 2, 0)],
            &[],
        );

        // Both records still credit the entry.
        assert_eq!(teams[0].players["jondoe"].score, Some(7.5));
        assert_eq!(report.skaters.credits, 2);
        assert_eq!(
            report.collisions,
            vec![NameCollision {
                key: "jondoe".into(),
                records: vec!["Jon Doe (F)".into(), "Jön Doe (D)".into()],
                teams: vec!["a".into()],
            }]
        );
    }

    #[test]
    fn same_player_in_several_records_is_not_a_collision() {
        let mut teams = vec![team("a", vec![SubmissionRow::skater("Jon", "Doe", "Canada")])];
        let report = score_teams(
            &mut teams,
            &[skater("Jon", "Doe", "F", 1, 0), skater("Jon", "Doe", "f", 1, 0)],
            &[],
        );
        assert!(report.collisions.is_empty());
    }

    #[test]
    fn collision_on_unrostered_key_is_not_reported() {
        let mut teams = vec![team("a", vec![SubmissionRow::skater("Other", "Guy", "Canada")])];
        let report = score_teams(
            &mut teams,
            &[skater("Jon", "Doe", "F", 1, 0), skater("Jön", "Doe", "D", 2, 0)],
            &[],
        );
        assert!(report.collisions.is_empty());
    }

    #[test]
    fn empty_key_gets_no_candidates() {
        assert!(overlapping("", [("abc", "Abc".to_string())].into_iter()).is_empty());
        let found = overlapping("abc", [("", String::new()), ("xabcx", "X".to_string())].into_iter());
        assert_eq!(found.len(), 1);
    }
}
