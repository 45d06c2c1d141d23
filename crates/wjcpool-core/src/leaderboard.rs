// Ranked leaderboard built from the finished teams.

use std::cmp::Ordering;

use serde::Serialize;

use crate::roster::Team;
use crate::scoring::round2;

/// One row of a team's score breakdown. `score` is `None` for entries no
/// record ever matched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakdownRow {
    pub name: String,
    pub score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub name: String,
    pub score: f64,
    pub players: Vec<BreakdownRow>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Leaderboard {
    pub teams: Vec<LeaderboardEntry>,
}

impl Leaderboard {
    pub fn get(&self, team: &str) -> Option<&LeaderboardEntry> {
        self.teams.iter().find(|e| e.name == team)
    }
}

/// Sort key for breakdown rows, compared descending: positive scores first,
/// then zeros, then by raw value with absent counted as -1.
fn breakdown_key(score: Option<f64>) -> (bool, bool, f64) {
    (
        score.is_some_and(|s| s > 0.0),
        score.is_some_and(|s| s == 0.0),
        score.unwrap_or(-1.0),
    )
}

fn cmp_breakdown(a: Option<f64>, b: Option<f64>) -> Ordering {
    let (a_pos, a_zero, a_raw) = breakdown_key(a);
    let (b_pos, b_zero, b_raw) = breakdown_key(b);
    b_pos
        .cmp(&a_pos)
        .then(b_zero.cmp(&a_zero))
        .then(b_raw.total_cmp(&a_raw))
}

/// Breakdown for one team: every skater, then the goalie pick if any, sorted
/// by `cmp_breakdown`. The sort is stable so equal rows keep roster order.
fn breakdown(team: &Team) -> Vec<BreakdownRow> {
    let mut rows: Vec<(Option<f64>, String)> = team
        .players
        .values()
        .map(|p| (p.score, p.display_name()))
        .collect();

    if let Some(label) = team.goalie_label() {
        rows.push((team.goalie_score, label));
    }

    rows.sort_by(|a, b| cmp_breakdown(a.0, b.0));
    rows.into_iter()
        .map(|(score, name)| BreakdownRow {
            name,
            score: score.map(round2),
        })
        .collect()
}

/// Rank teams by total score, highest first. Equal totals keep their input
/// order, and ranks are simply positions (1, 2, 3, ...) with no shared ranks.
pub fn build_leaderboard(teams: &[Team]) -> Leaderboard {
    let mut order: Vec<&Team> = teams.iter().collect();
    order.sort_by(|a, b| b.total.total_cmp(&a.total));

    Leaderboard {
        teams: order
            .into_iter()
            .enumerate()
            .map(|(idx, team)| LeaderboardEntry {
                rank: idx + 1,
                name: team.name.clone(),
                score: round2(team.total),
                players: breakdown(team),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::{GoaliePickPolicy, RosterEntry, SubmissionRow};

    fn team_with_total(name: &str, total: f64) -> Team {
        let mut t = Team::new(name);
        t.total = total;
        t
    }

    fn entry(first: &str, last: &str, score: Option<f64>) -> RosterEntry {
        RosterEntry {
            first_name: first.into(),
            last_name: last.into(),
            country: "canada".into(),
            key: crate::normalize::name_key(first, last),
            score,
            found: score.is_some(),
        }
    }

    #[test]
    fn teams_sorted_descending_with_sequential_ranks() {
        let teams = vec![
            team_with_total("low", 1.0),
            team_with_total("high", 20.0),
            team_with_total("mid", 10.0),
        ];
        let board = build_leaderboard(&teams);
        let names: Vec<&str> = board.teams.iter().map(|e| e.name.as_str()).collect();
        let ranks: Vec<usize> = board.teams.iter().map(|e| e.rank).collect();
        assert_eq!(names, vec!["high", "mid", "low"]);
        assert_eq!(ranks, vec![1, 2, 3]);
    }

    #[test]
    fn ties_keep_input_order_and_get_distinct_ranks() {
        let teams = vec![
            team_with_total("first", 10.0),
            team_with_total("top", 12.0),
            team_with_total("second", 10.0),
            team_with_total("third", 10.0),
        ];
        let board = build_leaderboard(&teams);
        let names: Vec<&str> = board.teams.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["top", "first", "second", "third"]);
        assert_eq!(board.get("first").unwrap().rank, 2);
        assert_eq!(board.get("second").unwrap().rank, 3);
        assert_eq!(board.get("third").unwrap().rank, 4);
    }

    #[test]
    fn total_is_rounded_to_two_decimals() {
        let board = build_leaderboard(&[team_with_total("a", 10.456)]);
        assert!((board.teams[0].score - 10.46).abs() < 1e-9);
    }

    #[test]
    fn breakdown_orders_positive_then_zero_then_absent() {
        let mut t = Team::new("a");
        for e in [
            entry("Absent", "Player", None),
            entry("Zero", "Player", Some(0.0)),
            entry("Five", "Player", Some(5.0)),
            entry("Big", "Player", Some(7.5)),
        ] {
            t.players.insert(e.key.clone(), e);
        }
        let board = build_leaderboard(&[t]);
        let rows = &board.teams[0].players;
        let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Big Player", "Five Player", "Zero Player", "Absent Player"]
        );
        assert_eq!(rows[3].score, None);
        assert_eq!(rows[2].score, Some(0.0));
    }

    #[test]
    fn goalie_row_is_added_and_sorted_with_skaters() {
        let (mut t, _) = Team::from_rows(
            "a",
            vec![
                SubmissionRow::skater("jon", "doe", "canada"),
                SubmissionRow::goalie("finland"),
            ],
            GoaliePickPolicy::FirstWins,
        );
        t.goalie_score = Some(6.5);
        t.goalie_found = true;
        t.total = 6.5;

        let board = build_leaderboard(&[t]);
        let rows = &board.teams[0].players;
        assert_eq!(
            rows,
            &vec![
                BreakdownRow {
                    name: "Goalie (Finland)".into(),
                    score: Some(6.5)
                },
                BreakdownRow {
                    name: "Jon Doe".into(),
                    score: None
                },
            ]
        );
    }

    #[test]
    fn no_goalie_row_without_a_pick() {
        let mut t = Team::new("a");
        let e = entry("Jon", "Doe", Some(1.0));
        t.players.insert(e.key.clone(), e);
        let board = build_leaderboard(&[t]);
        assert_eq!(board.teams[0].players.len(), 1);
    }

    #[test]
    fn unfound_goalie_pick_shows_absent_score() {
        let (t, _) = Team::from_rows(
            "a",
            vec![SubmissionRow::goalie("usa")],
            GoaliePickPolicy::FirstWins,
        );
        let board = build_leaderboard(&[t]);
        assert_eq!(
            board.teams[0].players,
            vec![BreakdownRow {
                name: "Goalie (Usa)".into(),
                score: None
            }]
        );
    }

    #[test]
    fn breakdown_scores_are_rounded() {
        let mut t = Team::new("a");
        let e = entry("Jon", "Doe", Some(1.0 / 3.0));
        t.players.insert(e.key.clone(), e);
        let board = build_leaderboard(&[t]);
        assert_eq!(board.teams[0].players[0].score, Some(0.33));
    }

    #[test]
    fn serializes_absent_score_as_null() {
        let board = Leaderboard {
            teams: vec![LeaderboardEntry {
                rank: 1,
                name: "a".into(),
                score: 0.0,
                players: vec![BreakdownRow {
                    name: "Jon Doe".into(),
                    score: None,
                }],
            }],
        };
        let json = serde_json::to_value(&board).unwrap();
        assert!(json["teams"][0]["players"][0]["score"].is_null());
        assert_eq!(json["teams"][0]["rank"], 1);
    }
}
