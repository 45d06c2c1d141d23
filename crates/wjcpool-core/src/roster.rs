// Team rosters built from submission rows.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::normalize::{name_key, normalize_country, title_case};

/// One parsed row of a team's submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionRow {
    pub first_name: String,
    pub last_name: String,
    pub country: String,
    pub is_goalie: bool,
}

impl SubmissionRow {
    pub fn skater(first_name: &str, last_name: &str, country: &str) -> Self {
        Self {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            country: country.to_string(),
            is_goalie: false,
        }
    }

    pub fn goalie(country: &str) -> Self {
        Self {
            first_name: String::new(),
            last_name: String::new(),
            country: country.to_string(),
            is_goalie: true,
        }
    }
}

/// What to do when a submission carries more than one goalie row.
///
/// There is no default: the pool organiser has to pick one in config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoaliePickPolicy {
    /// Keep the first goalie row; later ones are reported and ignored.
    FirstWins,
    /// Each goalie row replaces the previous pick; replacements are reported.
    LastWins,
}

/// A skater a team submitted, plus the score it has accumulated so far.
#[derive(Debug, Clone, PartialEq)]
pub struct RosterEntry {
    pub first_name: String,
    pub last_name: String,
    pub country: String,
    pub key: String,
    /// `None` until a matching statistics record has been seen.
    pub score: Option<f64>,
    pub found: bool,
}

impl RosterEntry {
    pub fn display_name(&self) -> String {
        title_case(&format!("{} {}", self.first_name, self.last_name))
    }

    fn credit(&mut self, points: f64) {
        *self.score.get_or_insert(0.0) += points;
        self.found = true;
    }
}

/// One participant's submission and its running totals.
#[derive(Debug, Clone, PartialEq)]
pub struct Team {
    pub name: String,
    /// Skaters keyed by normalized name.
    pub players: BTreeMap<String, RosterEntry>,
    /// Normalized country of the goalie pick, if any. Used for matching.
    pub goalie_country: Option<String>,
    /// The goalie country as submitted (trimmed), for display.
    pub goalie_display: Option<String>,
    pub total: f64,
    pub goalie_score: Option<f64>,
    pub goalie_found: bool,
}

/// Recoverable problems found while building a team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RosterIssue {
    /// A later row normalized to a key already on the roster; the first row
    /// was kept unchanged.
    DuplicatePlayer {
        team: String,
        first_name: String,
        last_name: String,
        key: String,
    },
    /// More than one goalie row. `kept` is the pick in effect afterwards.
    ExtraGoaliePick {
        team: String,
        kept: String,
        dropped: String,
    },
}

impl fmt::Display for RosterIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RosterIssue::DuplicatePlayer {
                team,
                first_name,
                last_name,
                key,
            } => write!(
                f,
                "{team}: duplicate player {first_name} {last_name} (key `{key}`), keeping first entry"
            ),
            RosterIssue::ExtraGoaliePick {
                team,
                kept,
                dropped,
            } => write!(
                f,
                "{team}: more than one goalie pick, keeping `{kept}` and dropping `{dropped}`"
            ),
        }
    }
}

impl Team {
    /// An empty team with no goalie pick.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            players: BTreeMap::new(),
            goalie_country: None,
            goalie_display: None,
            total: 0.0,
            goalie_score: None,
            goalie_found: false,
        }
    }

    /// Build a team from its submission rows.
    ///
    /// Skater rows are keyed by normalized name; the first occurrence of a
    /// key wins. Goalie rows set the goalie country according to `policy`.
    /// Every deviation is logged and returned alongside the team.
    pub fn from_rows<I>(name: &str, rows: I, policy: GoaliePickPolicy) -> (Self, Vec<RosterIssue>)
    where
        I: IntoIterator<Item = SubmissionRow>,
    {
        let mut team = Team::new(name);
        let mut issues = Vec::new();

        for row in rows {
            if row.is_goalie {
                if let Some(issue) = team.pick_goalie(&row.country, policy) {
                    warn!("{}", issue);
                    issues.push(issue);
                }
                continue;
            }

            let key = name_key(&row.first_name, &row.last_name);
            if team.players.contains_key(&key) {
                let issue = RosterIssue::DuplicatePlayer {
                    team: team.name.clone(),
                    first_name: row.first_name,
                    last_name: row.last_name,
                    key,
                };
                warn!("{}", issue);
                issues.push(issue);
                continue;
            }

            team.players.insert(
                key.clone(),
                RosterEntry {
                    first_name: row.first_name.trim().to_string(),
                    last_name: row.last_name.trim().to_string(),
                    country: normalize_country(&row.country),
                    key,
                    score: None,
                    found: false,
                },
            );
        }

        (team, issues)
    }

    fn pick_goalie(&mut self, submitted: &str, policy: GoaliePickPolicy) -> Option<RosterIssue> {
        let country = normalize_country(submitted);
        let previous = match &self.goalie_country {
            None => {
                self.goalie_country = Some(country);
                self.goalie_display = Some(submitted.trim().to_string());
                return None;
            }
            Some(previous) => previous.clone(),
        };

        match policy {
            GoaliePickPolicy::FirstWins => Some(RosterIssue::ExtraGoaliePick {
                team: self.name.clone(),
                kept: previous,
                dropped: country,
            }),
            GoaliePickPolicy::LastWins => {
                self.goalie_country = Some(country.clone());
                self.goalie_display = Some(submitted.trim().to_string());
                Some(RosterIssue::ExtraGoaliePick {
                    team: self.name.clone(),
                    kept: country,
                    dropped: previous,
                })
            }
        }
    }

    /// Display label of the goalie pick, e.g. "Goalie (Finland)". Uses the
    /// country as submitted; a bare lowercase spelling is title-cased.
    pub fn goalie_label(&self) -> Option<String> {
        let country = self.goalie_display.as_deref().or(self.goalie_country.as_deref())?;
        if country.chars().any(char::is_uppercase) {
            Some(format!("Goalie ({country})"))
        } else {
            Some(format!("Goalie ({})", title_case(country)))
        }
    }

    /// Add points to the skater under `key`. Returns false when the key is
    /// not on this roster.
    pub(crate) fn credit_player(&mut self, key: &str, points: f64) -> bool {
        match self.players.get_mut(key) {
            Some(entry) => {
                entry.credit(points);
                self.total += points;
                true
            }
            None => false,
        }
    }

    pub(crate) fn credit_goalie(&mut self, points: f64) {
        *self.goalie_score.get_or_insert(0.0) += points;
        self.goalie_found = true;
        self.total += points;
    }

    /// Sum of every entry's score plus the goalie score, absent counted as
    /// zero. Always equal to `total` up to float error.
    pub fn recomputed_total(&self) -> f64 {
        let skaters: f64 = self.players.values().filter_map(|p| p.score).sum();
        skaters + self.goalie_score.unwrap_or(0.0)
    }
}
