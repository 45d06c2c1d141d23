// Result snapshot files: one timestamped leaderboard per run plus a
// `latest.json` pointer at the newest one.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use wjcpool_core::aggregate::{NameCollision, UnmatchedEntry};
use wjcpool_core::leaderboard::{Leaderboard, LeaderboardEntry};

pub const LATEST_FILE: &str = "latest.json";

#[derive(Debug, Clone, Serialize)]
pub struct Snapshot<'a> {
    pub generated_at: DateTime<Utc>,
    pub season: &'a str,
    pub season_type: &'a str,
    pub teams: &'a [LeaderboardEntry],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unmatched: Option<&'a [UnmatchedEntry]>,
    pub collisions: &'a [NameCollision],
}

impl<'a> Snapshot<'a> {
    pub fn new(
        generated_at: DateTime<Utc>,
        season: &'a str,
        season_type: &'a str,
        leaderboard: &'a Leaderboard,
    ) -> Self {
        Self {
            generated_at,
            season,
            season_type,
            teams: &leaderboard.teams,
            unmatched: None,
            collisions: &[],
        }
    }

    pub fn with_unmatched(mut self, unmatched: &'a [UnmatchedEntry]) -> Self {
        self.unmatched = Some(unmatched);
        self
    }

    pub fn with_collisions(mut self, collisions: &'a [NameCollision]) -> Self {
        self.collisions = collisions;
        self
    }
}

/// Contents of `latest.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatestPointer {
    pub file: String,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to serialize snapshot: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("{path} is not a valid snapshot pointer: {source}")]
    CorruptPointer {
        path: String,
        source: serde_json::Error,
    },
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> SnapshotError + '_ {
    move |source| SnapshotError::Io {
        path: path.display().to_string(),
        source,
    }
}

/// File name of the snapshot taken at `at`, with millisecond precision.
pub fn snapshot_file_name(at: &DateTime<Utc>) -> String {
    format!("scores-{}.json", at.format("%Y%m%dT%H%M%S%.3fZ"))
}

fn to_json<T: Serialize>(value: &T) -> Result<String, SnapshotError> {
    let mut json = serde_json::to_string_pretty(value)?;
    json.push('\n');
    Ok(json)
}

/// Create a snapshot file that did not exist before. A name already taken
/// gets a `-1`, `-2`, ... suffix; an existing snapshot is never reopened.
fn create_snapshot_file(
    results_dir: &Path,
    at: &DateTime<Utc>,
) -> Result<(String, PathBuf, std::fs::File), SnapshotError> {
    let base = snapshot_file_name(at);
    let stem = base.trim_end_matches(".json");
    let mut attempt = 0u32;
    loop {
        let file = if attempt == 0 {
            base.clone()
        } else {
            format!("{stem}-{attempt}.json")
        };
        let path = results_dir.join(&file);
        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
        {
            Ok(handle) => return Ok((file, path, handle)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => attempt += 1,
            Err(e) => return Err(io_error(&path)(e)),
        }
    }
}

/// Write the snapshot to a new file, then point `latest.json` at it.
/// Returns the snapshot path.
pub fn write_snapshot(results_dir: &Path, snapshot: &Snapshot<'_>) -> Result<PathBuf, SnapshotError> {
    std::fs::create_dir_all(results_dir).map_err(io_error(results_dir))?;

    let json = to_json(snapshot)?;
    let (file, path, mut handle) = create_snapshot_file(results_dir, &snapshot.generated_at)?;
    handle.write_all(json.as_bytes()).map_err(io_error(&path))?;

    let pointer = LatestPointer {
        file,
        generated_at: snapshot.generated_at,
    };
    let latest = results_dir.join(LATEST_FILE);
    std::fs::write(&latest, to_json(&pointer)?).map_err(io_error(&latest))?;

    Ok(path)
}

/// Read `latest.json`. `Ok(None)` means no snapshot has been written yet.
pub fn read_latest(results_dir: &Path) -> Result<Option<LatestPointer>, SnapshotError> {
    let path = results_dir.join(LATEST_FILE);
    let text = match std::fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(io_error(&path)(e)),
    };
    serde_json::from_str(&text)
        .map(Some)
        .map_err(|source| SnapshotError::CorruptPointer {
            path: path.display().to_string(),
            source,
        })
}
