//! Dashboard configuration, stored as TOML.
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! working setup: the JPX listing in the working directory, the Tokyo market
//! suffix, and the fund-price CSV endpoints used as benchmarks.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors loading or validating a config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// A benchmark fund: display name and the CSV endpoint that serves its prices.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BenchmarkDef {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub default_on: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DrawdownConfig {
    /// Trailing observations used for the recent high.
    pub window: usize,
    /// Drop rates strictly below this (in percent) are classified as a dip.
    pub dip_threshold_pct: f64,
}

impl Default for DrawdownConfig {
    fn default() -> Self {
        Self {
            window: 20,
            dip_threshold_pct: -5.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TileConfig {
    pub columns: usize,
    pub instrument_decimals: usize,
    pub benchmark_decimals: usize,
    /// Rises drawn in red and falls in green, as Japanese quote boards do.
    pub inverse_delta_colors: bool,
}

impl Default for TileConfig {
    fn default() -> Self {
        Self {
            columns: 3,
            instrument_decimals: 0,
            benchmark_decimals: 1,
            inverse_delta_colors: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".into(),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DashboardConfig {
    /// Candidate locations of the listing file, tried in order.
    pub universe_paths: Vec<PathBuf>,
    /// Appended to an instrument code to form the provider ticker.
    pub market_suffix: String,
    /// Instruments selected on first start.
    pub default_codes: Vec<String>,
    pub benchmarks: Vec<BenchmarkDef>,
    pub drawdown: DrawdownConfig,
    pub tiles: TileConfig,
    pub http: HttpConfig,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        let mut universe_paths = vec![PathBuf::from("./jpx_stocks.csv")];
        if let Some(dir) = config_dir() {
            universe_paths.push(dir.join("jpx_stocks.csv"));
        }

        Self {
            universe_paths,
            market_suffix: ".T".into(),
            default_codes: ["8306", "1802", "6758", "5334", "8766", "2802", "6701", "8750"]
                .into_iter()
                .map(String::from)
                .collect(),
            benchmarks: default_benchmarks(),
            drawdown: DrawdownConfig::default(),
            tiles: TileConfig::default(),
            http: HttpConfig::default(),
        }
    }
}

fn default_benchmarks() -> Vec<BenchmarkDef> {
    const FUND_EXPORT: &str = "https://www.amova-am.com/api/fund-export?funds[]=";
    [
        ("S&P", "645067", true),
        ("TOPIX", "358290", false),
        ("Tracers50", "945109", false),
        ("Gold", "643718", false),
    ]
    .into_iter()
    .map(|(name, fund, default_on)| BenchmarkDef {
        name: name.into(),
        url: format!("{FUND_EXPORT}{fund}"),
        default_on,
    })
    .collect()
}

/// Per-user config directory: `<config_dir>/dipwatch`.
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("dipwatch"))
}

/// Default location of the config file.
pub fn default_config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

impl DashboardConfig {
    /// Load a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if given, else the default location if it exists, else defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::from_file(p),
            None => match default_config_path() {
                Some(p) if p.exists() => Self::from_file(&p),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.drawdown.window == 0 {
            return Err(ConfigError::Invalid("drawdown.window must be at least 1".into()));
        }
        if !(self.drawdown.dip_threshold_pct <= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "drawdown.dip_threshold_pct must be <= 0, got {}",
                self.drawdown.dip_threshold_pct
            )));
        }
        if self.tiles.columns == 0 {
            return Err(ConfigError::Invalid("tiles.columns must be at least 1".into()));
        }
        let mut seen = std::collections::HashSet::new();
        for b in &self.benchmarks {
            if b.name.trim().is_empty() {
                return Err(ConfigError::Invalid("benchmark with empty name".into()));
            }
            if !seen.insert(b.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate benchmark name '{}'",
                    b.name
                )));
            }
        }
        Ok(())
    }

    pub fn benchmark(&self, name: &str) -> Option<&BenchmarkDef> {
        self.benchmarks.iter().find(|b| b.name == name)
    }

    /// Names of benchmarks checked by default, in registry order.
    pub fn default_benchmarks(&self) -> Vec<String> {
        self.benchmarks
            .iter()
            .filter(|b| b.default_on)
            .map(|b| b.name.clone())
            .collect()
    }
}
