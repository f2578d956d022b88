//! Configuration management for lcdscan.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides. Every tunable of the discovery engine
//! (marker strings, strides, density thresholds, pool size, throttle) lives
//! here rather than in code.

use crate::error::{ConfigError, ConfigResult};
use crate::types::{PolicyId, StrategyKind};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main application configuration.
///
/// This is loaded from `~/.config/lcdscan/config.toml` (or platform equivalent).
/// If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Remote catalog being searched
    pub source: SourceConfig,
    /// Page classification markers
    pub classifier: ClassifierConfig,
    /// Fetch boundary: timeouts, retries, pool size, throttle
    pub fetch: FetchConfig,
    /// Density-adaptive refinement tunables
    pub refine: RefineConfig,
    /// Strategy selection and per-strategy settings
    pub strategies: StrategiesConfig,
    /// Document rendering (bulk download) settings
    pub render: RenderConfig,
}

impl AppConfig {
    /// Load configuration from the default path, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML
    pub fn load() -> ConfigResult<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path, falling back to defaults if it doesn't exist.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if path.exists() {
            tracing::debug!("Loading config from {}", path.display());
            let contents = fs::read_to_string(path)?;
            let config = toml::from_str(&contents)?;
            Ok(config)
        } else {
            tracing::debug!("Config file not found at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Load configuration with environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `LCDSCAN_CONCURRENCY`: Override the probe pool size
    /// - `LCDSCAN_HEADLESS`: Override browser headless mode (true/false)
    /// - `LCDSCAN_MIN_PROBE_DELAY_MS`: Override the per-worker inter-probe delay
    /// - `LCDSCAN_FETCH_BACKEND`: Override the fetch backend (browser/http)
    pub fn load_with_env(path: Option<&Path>) -> ConfigResult<Self> {
        let mut config = match path {
            Some(path) => Self::load_from(path)?,
            None => Self::load()?,
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply `LCDSCAN_*` environment overrides on top of the loaded values.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("LCDSCAN_CONCURRENCY") {
            if let Ok(concurrency) = val.parse() {
                self.fetch.concurrency = concurrency;
                tracing::debug!("Override fetch.concurrency from env: {}", concurrency);
            }
        }

        if let Ok(val) = std::env::var("LCDSCAN_HEADLESS") {
            if let Ok(headless) = val.parse() {
                self.fetch.headless = headless;
                tracing::debug!("Override fetch.headless from env: {}", headless);
            }
        }

        if let Ok(val) = std::env::var("LCDSCAN_MIN_PROBE_DELAY_MS") {
            if let Ok(delay) = val.parse() {
                self.fetch.min_probe_delay_ms = delay;
                tracing::debug!("Override fetch.min_probe_delay_ms from env: {}", delay);
            }
        }

        if let Ok(val) = std::env::var("LCDSCAN_FETCH_BACKEND") {
            match val.to_ascii_lowercase().as_str() {
                "browser" => self.fetch.backend = FetchBackend::Browser,
                "http" => self.fetch.backend = FetchBackend::Http,
                other => tracing::warn!("Ignoring unknown LCDSCAN_FETCH_BACKEND '{}'", other),
            }
        }
    }

    /// Save configuration to a path, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        let config_dir = path.parent().ok_or_else(|| ConfigError::InvalidValue {
            field: "config_path".to_string(),
            reason: "no parent directory".to_string(),
        })?;

        fs::create_dir_all(config_dir)?;
        tracing::debug!("Saving config to {}", path.display());

        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/lcdscan/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs = ProjectDirs::from("org", "lcdscan", "lcdscan").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Check every value that would otherwise fail only after probing started.
    ///
    /// Invalid search ranges are configuration errors and are fatal to the
    /// whole run when detected here.
    pub fn validate(&self) -> ConfigResult<()> {
        if !self.source.record_url_template.contains("{id}") {
            return Err(invalid("source.record_url_template", "must contain '{id}'"));
        }
        if self.fetch.concurrency == 0 {
            return Err(invalid("fetch.concurrency", "must be at least 1"));
        }
        if self.fetch.max_attempts == 0 {
            return Err(invalid("fetch.max_attempts", "must be at least 1"));
        }
        if self.fetch.backoff_multiplier == 0 {
            return Err(invalid("fetch.backoff_multiplier", "must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.refine.density_threshold) {
            return Err(invalid("refine.density_threshold", "must be within [0, 1]"));
        }
        if self.refine.refinement_factor < 2 {
            return Err(invalid("refine.refinement_factor", "must be at least 2"));
        }
        if self.classifier.positive_marker.is_empty() {
            return Err(invalid("classifier.positive_marker", "must not be empty"));
        }
        if self.strategies.enabled.is_empty() {
            return Err(invalid("strategies.enabled", "at least one strategy is required"));
        }
        for id in &self.strategies.seeded_ids {
            PolicyId::new(*id).map_err(|e| invalid("strategies.seeded_ids", &e.to_string()))?;
        }
        for range in &self.strategies.range_probe.ranges {
            range.validate()?;
        }
        Ok(())
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

/// The remote catalog being searched.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Human-readable source name, persisted with the catalog
    pub name: String,
    /// Origin used to absolutize relative links
    pub base_url: String,
    /// Record page URL with an `{id}` placeholder
    pub record_url_template: String,
}

impl SourceConfig {
    /// Build the probe URL for a candidate identifier.
    #[must_use]
    pub fn record_url(&self, id: PolicyId) -> String {
        self.record_url_template.replace("{id}", &id.to_string())
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            name: "CMS Medicare Coverage Database".to_string(),
            base_url: "https://www.cms.gov".to_string(),
            record_url_template:
                "https://www.cms.gov/medicare-coverage-database/view/lcd.aspx?LCDId={id}"
                    .to_string(),
        }
    }
}

/// Marker strings and selectors used to classify record pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Case-sensitive substrings that mark a page as not found
    pub negative_signals: Vec<String>,
    /// Long-form marker that a valid record page body contains
    pub positive_marker: String,
    /// Short-form marker that a valid record page title contains
    pub short_marker: String,
    /// Regex for the secondary document code
    pub code_pattern: String,
    /// CSS selector for the record heading
    pub heading_selector: String,
    /// Suffix stripped from the page title when used as the record title
    pub title_suffix: String,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            negative_signals: vec!["Error".to_string(), "Not Found".to_string()],
            positive_marker: "Local Coverage Determination".to_string(),
            short_marker: "LCD".to_string(),
            code_pattern: r"\bL\d+\b".to_string(),
            heading_selector: "h1, .title, #title".to_string(),
            title_suffix: " - CMS".to_string(),
        }
    }
}

/// Which transport performs page fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchBackend {
    /// Headless Chromium with consent dismissal (required for rendering)
    Browser,
    /// Plain HTTP GET, no script execution
    Http,
}

/// Fetch boundary settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Transport used for probes and index pages
    pub backend: FetchBackend,
    /// Per-probe timeout in seconds
    pub timeout_secs: u64,
    /// Maximum fetch attempts per URL (including the first)
    pub max_attempts: u32,
    /// Base retry delay in milliseconds
    pub base_backoff_ms: u64,
    /// Exponential growth factor between retries
    pub backoff_multiplier: u32,
    /// Upper bound for a single retry delay
    pub max_backoff_ms: u64,
    /// Extra multiplier applied after a rate-limited response
    pub rate_limit_multiplier: u32,
    /// Probe pool size shared by every strategy
    pub concurrency: usize,
    /// Minimum delay between probes issued by one worker
    pub min_probe_delay_ms: u64,
    /// Run the browser headless
    pub headless: bool,
    /// Selector of the terms-acceptance control dismissed after navigation
    pub consent_selector: String,
    /// Wait after navigation or consent dismissal, in milliseconds
    pub settle_ms: u64,
}

impl FetchConfig {
    /// Per-probe timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Minimum inter-probe delay.
    #[must_use]
    pub fn min_probe_delay(&self) -> Duration {
        Duration::from_millis(self.min_probe_delay_ms)
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            backend: FetchBackend::Browser,
            timeout_secs: 12,
            max_attempts: 3,
            base_backoff_ms: 1000,
            backoff_multiplier: 2,
            max_backoff_ms: 15_000,
            rate_limit_multiplier: 3,
            concurrency: 4,
            min_probe_delay_ms: 750,
            headless: true,
            consent_selector:
                "input[value='I Accept'], input[type='submit'][value*='Accept']".to_string(),
            settle_ms: 1000,
        }
    }
}

/// Density-adaptive refinement settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RefineConfig {
    /// Hit rate above which a range is re-scanned at a finer stride
    pub density_threshold: f64,
    /// Maximum number of refinement levels below the coarse pass
    pub max_depth: u32,
    /// Divisor applied to the stride at each refinement level
    pub refinement_factor: u64,
}

impl Default for RefineConfig {
    fn default() -> Self {
        Self {
            density_threshold: 0.05,
            max_depth: 2,
            refinement_factor: 5,
        }
    }
}

/// Strategy selection and settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategiesConfig {
    /// Strategies to run; order decides provenance under deduplication
    pub enabled: Vec<StrategyKind>,
    /// Previously confirmed identifiers probed by seeded validation
    pub seeded_ids: Vec<u64>,
    /// Link harvest settings
    pub link_harvest: LinkHarvestConfig,
    /// Range probe settings
    pub range_probe: RangeProbeConfig,
}

impl Default for StrategiesConfig {
    fn default() -> Self {
        Self {
            enabled: StrategyKind::ALL.to_vec(),
            seeded_ids: vec![33822, 35000, 35070, 33803, 33393, 38617],
            link_harvest: LinkHarvestConfig::default(),
            range_probe: RangeProbeConfig::default(),
        }
    }
}

/// Link harvest settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkHarvestConfig {
    /// Index and report pages to harvest
    pub index_pages: Vec<String>,
    /// Hard cap on pages followed per index page
    pub max_pages: usize,
    /// CSS selector for candidate record links
    pub link_selector: String,
    /// CSS selector for "next page" candidates
    pub next_selector: String,
}

impl Default for LinkHarvestConfig {
    fn default() -> Self {
        let reports = "https://www.cms.gov/medicare-coverage-database/reports";
        Self {
            index_pages: vec![
                format!("{reports}/finallcdalphabeticalreport.aspx"),
                format!("{reports}/finallcdcontractorreport.aspx"),
                format!("{reports}/finallcdstatereport.aspx"),
                "https://www.cms.gov/medicare-coverage-database/search.aspx?DocType=LCD"
                    .to_string(),
                "https://www.cms.gov/medicare-coverage-database/indexes/lcd-index.html"
                    .to_string(),
            ],
            max_pages: 50,
            link_selector: "a[href*='lcd.aspx']".to_string(),
            next_selector: "a".to_string(),
        }
    }
}

/// Range probe settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RangeProbeConfig {
    /// Coarse ranges covering the plausible identifier space
    pub ranges: Vec<RangeSpec>,
}

impl Default for RangeProbeConfig {
    fn default() -> Self {
        Self {
            ranges: vec![
                RangeSpec::new(33000, 34000, 50),
                RangeSpec::new(35000, 36000, 50),
                RangeSpec::new(37000, 39000, 100),
                RangeSpec::new(30000, 33000, 100),
                RangeSpec::new(25000, 30000, 200),
            ],
        }
    }
}

/// A configured half-open identifier range `[start, end)` with its starting stride.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeSpec {
    /// First candidate identifier
    pub start: u64,
    /// Exclusive upper bound
    pub end: u64,
    /// Distance between candidates
    pub stride: u64,
}

impl RangeSpec {
    /// Create a range specification without validating it.
    #[must_use]
    pub const fn new(start: u64, end: u64, stride: u64) -> Self {
        Self { start, end, stride }
    }

    /// Check `stride >= 1`, `start >= 1` and `start <= end`.
    pub fn validate(&self) -> ConfigResult<()> {
        let reason = if self.stride < 1 {
            "stride must be at least 1"
        } else if self.start < 1 {
            "identifiers start at 1"
        } else if self.start > self.end {
            "start is after end"
        } else {
            return Ok(());
        };

        Err(ConfigError::InvalidRange {
            start: self.start,
            end: self.end,
            stride: self.stride,
            reason: reason.to_string(),
        })
    }
}

/// Document rendering settings for bulk download.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Directory that receives `Policy_<id>.pdf` files
    pub output_dir: PathBuf,
    /// Number of policies rendered in sample mode
    pub sample_size: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("Download_PDFs"),
            sample_size: 10,
        }
    }
}
