// Configuration loading and validation (config/pool.toml).

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use wjcpool_core::roster::GoaliePickPolicy;

const POOL_FILE: &str = "pool.toml";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// pool.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub stats: StatsConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    pub roster: RosterConfig,
    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,
}

/// Where and what to fetch from the stats provider.
#[derive(Debug, Clone, Deserialize)]
pub struct StatsConfig {
    /// Resource kind (`skater`, `goaltender`) is appended to this.
    pub base_url: String,
    #[serde(default = "default_brand")]
    pub brand: String,
    #[serde(default = "default_format")]
    pub format: String,
    pub season: String,
    pub season_type: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_submissions_dir")]
    pub submissions_dir: String,
    #[serde(default = "default_results_dir")]
    pub results_dir: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            submissions_dir: default_submissions_dir(),
            results_dir: default_results_dir(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RosterConfig {
    /// Required: there is no sensible default for duplicate goalie picks.
    pub goalie_pick_policy: GoaliePickPolicy,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiagnosticsConfig {
    #[serde(default = "default_true")]
    pub suggest_matches: bool,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            suggest_matches: true,
        }
    }
}

fn default_brand() -> String {
    "tsn".into()
}

fn default_format() -> String {
    "json".into()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_submissions_dir() -> String {
    "submissions".into()
}

fn default_results_dir() -> String {
    "results".into()
}

fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate `config/pool.toml` relative to `base_dir`.
///
/// Does not copy defaults; `load_config()` does that first.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join(POOL_FILE);
    let text = read_file(&path)?;
    let config = parse_config(&text, &path)?;
    validate(&config)?;
    Ok(config)
}

fn parse_config(text: &str, path: &Path) -> Result<Config, ConfigError> {
    toml::from_str(text).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Ensure all config files exist by copying missing ones from `defaults/`.
/// Returns the list of files that were copied. Skips `.example` files.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.exists() {
        if !config_dir.exists() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "neither defaults/ nor config/ directory found in {}; \
                     run from the project root or ensure defaults/ is present",
                    base_dir.display()
                ),
            });
        }
        return Ok(vec![]);
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let entries = std::fs::read_dir(&defaults_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to read defaults directory: {e}"),
    })?;

    let mut copied = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to read defaults entry: {e}"),
        })?;
        let path = entry.path();

        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name() else {
            continue;
        };
        if file_name.to_str().is_some_and(|n| n.ends_with(".example")) {
            continue;
        }
        let target = config_dir.join(file_name);

        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
        {
            Ok(mut dest) => {
                let content = std::fs::read(&path).map_err(|e| ConfigError::DefaultsCopyError {
                    message: format!("failed to read {}: {e}", path.display()),
                })?;
                std::io::Write::write_all(&mut dest, &content).map_err(|e| {
                    ConfigError::DefaultsCopyError {
                        message: format!("failed to write {}: {e}", target.display()),
                    }
                })?;
                copied.push(target);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
            Err(e) => {
                return Err(ConfigError::DefaultsCopyError {
                    message: format!("failed to create {}: {e}", target.display()),
                });
            }
        }
    }

    Ok(copied)
}

/// Load config relative to the current working directory, copying defaults
/// into `config/` first.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.to_string(),
        message: message.into(),
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    let stats = &config.stats;
    if !(stats.base_url.starts_with("http://") || stats.base_url.starts_with("https://")) {
        return Err(invalid(
            "stats.base_url",
            format!("must be an http(s) URL, got `{}`", stats.base_url),
        ));
    }

    let required: &[(&str, &str)] = &[
        ("stats.season", stats.season.as_str()),
        ("stats.season_type", stats.season_type.as_str()),
        ("paths.submissions_dir", config.paths.submissions_dir.as_str()),
        ("paths.results_dir", config.paths.results_dir.as_str()),
    ];
    for (name, val) in required {
        if val.trim().is_empty() {
            return Err(invalid(name, "must not be empty"));
        }
    }

    if stats.timeout_secs == 0 {
        return Err(invalid("stats.timeout_secs", "must be > 0"));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
