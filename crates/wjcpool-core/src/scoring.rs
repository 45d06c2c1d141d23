// Per-position scoring formula and the provider statistics record.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Statistics record
// ---------------------------------------------------------------------------

/// One player's tournament line as published by the stats provider.
///
/// Every numeric field is optional on the wire and defaults to zero. The
/// provider is inconsistent about numbers vs numeric strings, so both are
/// accepted.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub first_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub last_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub position: String,
    #[serde(default, deserialize_with = "lenient_count")]
    pub goals: u32,
    #[serde(default, deserialize_with = "lenient_count")]
    pub assists: u32,
    #[serde(default, deserialize_with = "lenient_count")]
    pub saves: u32,
    #[serde(default, deserialize_with = "lenient_count")]
    pub wins: u32,
    #[serde(default, deserialize_with = "lenient_count")]
    pub shutouts: u32,
    #[serde(default, deserialize_with = "lenient_count")]
    pub losses: u32,
    /// Country slug on goaltender records (e.g. "finland").
    #[serde(
        default,
        rename = "competitor-seo-identifier",
        skip_serializing_if = "Option::is_none"
    )]
    pub competitor: Option<String>,
}

impl StatisticsRecord {
    /// "First Last" as published.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }
}

/// Accept a counting stat as an integer, a float (truncated) or a numeric
/// string. Null and empty strings read as zero.
fn lenient_count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let value = Option::<Value>::deserialize(deserializer)?;
    let parsed = match value {
        None | Some(Value::Null) => Some(0.0),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) if s.trim().is_empty() => Some(0.0),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(other) => return Err(D::Error::custom(format!("expected a count, got {other}"))),
    };
    match parsed {
        Some(v) if v.is_finite() && v >= 0.0 => Ok(v.trunc() as u32),
        _ => Err(D::Error::custom("counting stat must be a non-negative number")),
    }
}

/// Accept a string field that may be null.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Buckets
// ---------------------------------------------------------------------------

/// Scoring category derived from a position code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Bucket {
    Forward,
    Defense,
    Goalie,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("position code `{0}` is not scored")]
pub struct UnknownPosition(pub String);

impl FromStr for Bucket {
    type Err = UnknownPosition;

    /// Codes are trimmed and compared case-insensitively.
    fn from_str(code: &str) -> Result<Self, Self::Err> {
        match code.trim().to_uppercase().as_str() {
            "C" | "LW" | "RW" | "F" | "W" => Ok(Bucket::Forward),
            "D" | "LD" | "RD" => Ok(Bucket::Defense),
            "G" => Ok(Bucket::Goalie),
            _ => Err(UnknownPosition(code.to_string())),
        }
    }
}

impl Bucket {
    pub fn display_str(&self) -> &'static str {
        match self {
            Bucket::Forward => "F",
            Bucket::Defense => "D",
            Bucket::Goalie => "G",
        }
    }

    /// Points for a record under this bucket's formula.
    pub fn points(&self, record: &StatisticsRecord) -> f64 {
        let count = |n: u32| f64::from(n);
        match self {
            Bucket::Forward => count(record.goals) * 1.5 + count(record.assists),
            Bucket::Defense => count(record.goals) * 3.0 + count(record.assists) * 2.0,
            Bucket::Goalie => {
                count(record.saves) * 0.15 + count(record.wins) * 5.0 + count(record.shutouts) * 5.0
                    - count(record.losses) * 3.0
            }
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_str())
    }
}

// ---------------------------------------------------------------------------
// Score outcome
// ---------------------------------------------------------------------------

/// Result of scoring one record. `Unscored` is distinct from a zero score:
/// the record's position is not part of the pool.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScoreOutcome {
    Scored { points: f64, bucket: Bucket },
    Unscored,
}

/// Score a provider record by its own position code.
pub fn score_record(record: &StatisticsRecord) -> ScoreOutcome {
    match record.position.parse::<Bucket>() {
        Ok(bucket) => ScoreOutcome::Scored {
            points: bucket.points(record),
            bucket,
        },
        Err(_) => ScoreOutcome::Unscored,
    }
}

/// Round to two decimals, half away from zero. Every emitted score goes
/// through this.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
