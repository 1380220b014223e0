//! Configuration for peerbench
//!
//! Reads `peerbench.toml` from the working directory, falling back to
//! `~/.peerbench/config.toml`. Every section is optional; missing keys take
//! their defaults. `PEERBENCH_DATA` overrides the data path.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use crate::chart::ChartOptions;
use crate::dataset::LoadOptions;
use crate::stats::DEFAULT_BINS;

/// Environment variable replacing `data.path`
pub const DATA_ENV: &str = "PEERBENCH_DATA";

/// Project-level config file name
pub const CONFIG_FILE: &str = "peerbench.toml";

// =============================================================================
// Config Types
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub data: DataSection,
    #[serde(default)]
    pub chart: ChartSection,
    #[serde(default)]
    pub serve: ServeSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSection {
    /// Report metadata file
    #[serde(default = "default_data_path")]
    pub path: PathBuf,
    /// Single-character field delimiter
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
}

fn default_data_path() -> PathBuf {
    PathBuf::from("report_data.csv")
}
fn default_delimiter() -> String {
    ",".to_string()
}

impl Default for DataSection {
    fn default() -> Self {
        Self {
            path: default_data_path(),
            delimiter: default_delimiter(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSection {
    /// Histogram bin count
    #[serde(default = "default_bins")]
    pub bins: usize,
    /// Samples along the violin density curve
    #[serde(default = "default_kde_points")]
    pub kde_points: usize,
    /// Fix strip plot jitter for reproducible output
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jitter_seed: Option<u64>,
}

fn default_bins() -> usize {
    DEFAULT_BINS
}
fn default_kde_points() -> usize {
    100
}

impl Default for ChartSection {
    fn default() -> Self {
        Self {
            bins: default_bins(),
            kde_points: default_kde_points(),
            jitter_seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServeSection {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    8501
}

impl Default for ServeSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Config {
    /// Reader settings derived from `[data]`
    pub fn load_options(&self) -> Result<LoadOptions> {
        let delimiter = match self.data.delimiter.as_bytes() {
            [b] if b.is_ascii() => *b,
            _ if self.data.delimiter == "\\t" => b'\t',
            _ => bail!(
                "data.delimiter must be a single ASCII character, got '{}'",
                self.data.delimiter
            ),
        };
        Ok(LoadOptions { delimiter })
    }

    /// Chart settings derived from `[chart]`
    pub fn chart_options(&self) -> ChartOptions {
        ChartOptions {
            bins: self.chart.bins.max(1),
            kde_points: self.chart.kde_points.max(2),
            jitter_seed: self.chart.jitter_seed,
        }
    }
}

// =============================================================================
// Path Functions
// =============================================================================

/// User-level fallback: `~/.peerbench/config.toml`
pub fn user_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".peerbench")
        .join("config.toml")
}

/// First config file that exists: project, then user level
pub fn discover(project_dir: &Path) -> Option<PathBuf> {
    discover_in(project_dir, &user_config_path())
}

fn discover_in(project_dir: &Path, user_config: &Path) -> Option<PathBuf> {
    [project_dir.join(CONFIG_FILE), user_config.to_path_buf()]
        .into_iter()
        .find(|p| p.exists())
}

// =============================================================================
// Load
// =============================================================================

/// Parse a config file
pub fn load_file(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    toml::from_str(&contents).with_context(|| format!("Failed to parse config: {}", path.display()))
}

/// Load config: explicit path if given, otherwise discovery; then apply env.
pub fn load(explicit: Option<&Path>) -> Result<Config> {
    let mut config = match explicit {
        Some(path) => load_file(path)?,
        None => {
            let cwd = std::env::current_dir()?;
            match discover(&cwd) {
                Some(path) => load_file(&path)?,
                None => Config::default(),
            }
        }
    };

    Ok(apply_env(config, std::env::var_os(DATA_ENV)))
}

/// Apply a `PEERBENCH_DATA` value; empty values are ignored.
pub fn apply_env(mut config: Config, data: Option<OsString>) -> Config {
    if let Some(path) = data.filter(|p| !p.is_empty()) {
        config.data.path = PathBuf::from(path);
    }
    config
}
