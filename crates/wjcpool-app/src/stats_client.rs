// Stats provider client: fetches skater and goaltender season lines.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};
use wjcpool_core::scoring::StatisticsRecord;

use crate::config::StatsConfig;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// The two resources the provider publishes per season.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsKind {
    Skater,
    Goaltender,
}

impl StatsKind {
    /// Path segment appended to the configured base URL.
    pub fn resource(&self) -> &'static str {
        match self {
            StatsKind::Skater => "skater",
            StatsKind::Goaltender => "goaltender",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StatsError {
    #[error("request for {resource} stats failed: {source}")]
    Transport {
        resource: &'static str,
        source: reqwest::Error,
    },

    #[error("{resource} stats returned HTTP {status}")]
    Status {
        resource: &'static str,
        status: reqwest::StatusCode,
    },

    #[error("{resource} stats response is not the expected JSON: {source}")]
    Decode {
        resource: &'static str,
        source: serde_json::Error,
    },
}

/// Wire envelope: the provider nests each player's line under `stats`.
#[derive(Debug, Deserialize)]
struct ApiPlayer {
    stats: StatisticsRecord,
}

/// Decode a provider response body into statistics records.
pub fn parse_stats_response(body: &str) -> Result<Vec<StatisticsRecord>, serde_json::Error> {
    let players: Vec<ApiPlayer> = serde_json::from_str(body)?;
    Ok(players.into_iter().map(|p| p.stats).collect())
}

// ---------------------------------------------------------------------------
// Source trait
// ---------------------------------------------------------------------------

/// Anything that can supply a season's statistics records.
#[async_trait]
pub trait StatsSource: Send + Sync {
    async fn fetch(&self, kind: StatsKind) -> Result<Vec<StatisticsRecord>, StatsError>;
}

// ---------------------------------------------------------------------------
// HTTP implementation
// ---------------------------------------------------------------------------

pub struct HttpStatsSource {
    http: reqwest::Client,
    base_url: String,
    query: Vec<(&'static str, String)>,
}

impl HttpStatsSource {
    pub fn from_config(config: &StatsConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            query: query_params(config),
        })
    }

    pub fn url(&self, kind: StatsKind) -> String {
        format!("{}{}", self.base_url, kind.resource())
    }
}

/// Query string sent with both requests.
pub fn query_params(config: &StatsConfig) -> Vec<(&'static str, String)> {
    vec![
        ("brand", config.brand.clone()),
        ("type", config.format.clone()),
        ("seasonType", config.season_type.clone()),
        ("season", config.season.clone()),
    ]
}

#[async_trait]
impl StatsSource for HttpStatsSource {
    async fn fetch(&self, kind: StatsKind) -> Result<Vec<StatisticsRecord>, StatsError> {
        let resource = kind.resource();
        let url = self.url(kind);
        debug!(%url, "requesting {resource} stats");

        let response = self
            .http
            .get(&url)
            .query(&self.query)
            .send()
            .await
            .map_err(|source| StatsError::Transport { resource, source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(StatsError::Status { resource, status });
        }

        let body = response
            .text()
            .await
            .map_err(|source| StatsError::Transport { resource, source })?;
        let records =
            parse_stats_response(&body).map_err(|source| StatsError::Decode { resource, source })?;

        info!("Fetched {} {} records", records.len(), resource);
        Ok(records)
    }
}
