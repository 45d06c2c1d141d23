// Roster submission loading from a directory of CSV exports.
//
// One file per participant. Columns: firstName, lastName, country, is_goalie.
// The team name is the file stem.

use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use wjcpool_core::roster::{GoaliePickPolicy, RosterIssue, SubmissionRow, Team};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// A row that was skipped because it could not be used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MalformedRow {
    pub file: String,
    /// 1-based line in the source file, when known.
    pub line: Option<u64>,
    pub reason: String,
}

/// All teams loaded from the submissions directory, in file-name order.
#[derive(Debug, Clone, Default)]
pub struct Submissions {
    pub teams: Vec<Team>,
    pub roster_issues: Vec<RosterIssue>,
    pub malformed: Vec<MalformedRow>,
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("no .csv submissions found in {0}")]
    NoSubmissions(String),
}

// ---------------------------------------------------------------------------
// Raw CSV row (private)
// ---------------------------------------------------------------------------

/// Every column is optional here so a short or blank row is reported as
/// malformed instead of failing the whole file.
#[derive(Debug, Deserialize)]
struct RawSubmissionRow {
    #[serde(rename = "firstName", default)]
    first_name: Option<String>,
    #[serde(rename = "lastName", default)]
    last_name: Option<String>,
    #[serde(default)]
    country: Option<String>,
    #[serde(default)]
    is_goalie: Option<String>,
}

fn trimmed(field: Option<String>) -> String {
    field.map(|s| s.trim().to_string()).unwrap_or_default()
}

fn parse_row(raw: RawSubmissionRow) -> Result<SubmissionRow, String> {
    let country = trimmed(raw.country);
    let is_goalie = match raw.is_goalie.as_deref().map(|s| s.trim().to_lowercase()) {
        Some(flag) if flag == "true" => true,
        Some(flag) if flag == "false" => false,
        Some(flag) => return Err(format!("is_goalie must be true or false, got `{flag}`")),
        None => return Err("missing is_goalie".into()),
    };
    if country.is_empty() {
        return Err("missing country".into());
    }

    let first_name = trimmed(raw.first_name);
    let last_name = trimmed(raw.last_name);
    if !is_goalie && first_name.is_empty() && last_name.is_empty() {
        return Err("skater row has no name".into());
    }

    Ok(SubmissionRow {
        first_name,
        last_name,
        country,
        is_goalie,
    })
}

// ---------------------------------------------------------------------------
// Reader-based loader (private, enables testing without temp files)
// ---------------------------------------------------------------------------

fn load_rows_from_reader<R: Read>(
    rdr: R,
    source: &str,
) -> Result<(Vec<SubmissionRow>, Vec<MalformedRow>), csv::Error> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(rdr);
    let headers = reader.headers()?.clone();

    let mut rows = Vec::new();
    let mut malformed = Vec::new();
    for result in reader.records() {
        let record = match result {
            Ok(record) => record,
            Err(e) if e.is_io_error() => return Err(e),
            Err(e) => {
                warn!("{}: skipping unreadable row: {}", source, e);
                malformed.push(MalformedRow {
                    file: source.to_string(),
                    line: e.position().map(|p| p.line()),
                    reason: e.to_string(),
                });
                continue;
            }
        };
        let line = record.position().map(|p| p.line());

        let parsed = record
            .deserialize::<RawSubmissionRow>(Some(&headers))
            .map_err(|e| e.to_string())
            .and_then(parse_row);
        match parsed {
            Ok(row) => rows.push(row),
            Err(reason) => {
                warn!("{} line {:?}: skipping malformed row: {}", source, line, reason);
                malformed.push(MalformedRow {
                    file: source.to_string(),
                    line,
                    reason,
                });
            }
        }
    }
    Ok((rows, malformed))
}

// ---------------------------------------------------------------------------
// Public path-based loaders
// ---------------------------------------------------------------------------

/// Team name for a submission file: the file stem.
pub fn team_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Load one submission file into a team.
pub fn load_submission(
    path: &Path,
    policy: GoaliePickPolicy,
) -> Result<(Team, Vec<RosterIssue>, Vec<MalformedRow>), SubmissionError> {
    let display = path.display().to_string();
    let file = std::fs::File::open(path).map_err(|e| SubmissionError::Io {
        path: display.clone(),
        source: e,
    })?;
    let (rows, malformed) =
        load_rows_from_reader(file, &display).map_err(|e| SubmissionError::Csv {
            path: display.clone(),
            source: e,
        })?;

    let (team, issues) = Team::from_rows(&team_name(path), rows, policy);
    Ok((team, issues, malformed))
}

/// Load every `*.csv` in `dir`, sorted by file name.
pub fn load_submissions(dir: &Path, policy: GoaliePickPolicy) -> Result<Submissions, SubmissionError> {
    let io_err = |e: std::io::Error| SubmissionError::Io {
        path: dir.display().to_string(),
        source: e,
    };

    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        let is_csv = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
        if path.is_file() && is_csv {
            paths.push(path);
        }
    }
    paths.sort();

    if paths.is_empty() {
        return Err(SubmissionError::NoSubmissions(dir.display().to_string()));
    }

    let mut out = Submissions::default();
    for path in paths {
        let (team, issues, malformed) = load_submission(&path, policy)?;
        info!(
            "Loaded submission '{}': {} skaters, goalie pick {}",
            team.name,
            team.players.len(),
            team.goalie_country.as_deref().unwrap_or("none")
        );
        out.teams.push(team);
        out.roster_issues.extend(issues);
        out.malformed.extend(malformed);
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
