//! Configuration management for vocabfetch.
//!
//! Settings come from an optional TOML file. Every field has a default so an
//! empty (or absent) file yields a working configuration.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::scrapers::http_client::IMPERSONATE_USER_AGENTS;

/// Default pronunciation dictionary host.
pub const DEFAULT_DICTIONARY_BASE: &str = "https://www.oxfordlearnersdictionaries.com";

/// Default gloss lookup host.
pub const DEFAULT_LOOKUP_BASE: &str = "https://www.onelook.com";

/// Default directory for downloaded audio.
pub const DEFAULT_AUDIO_DIR: &str = "audio";

/// Default diagnostic log file.
pub const DEFAULT_LOG_FILE: &str = "vocabfetch.log";

/// Errors raised while loading settings.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Invalid setting `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Inclusive range of seconds used for randomized waits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DelayRange {
    pub min_secs: f64,
    pub max_secs: f64,
}

impl DelayRange {
    pub const fn new(min_secs: f64, max_secs: f64) -> Self {
        Self { min_secs, max_secs }
    }

    /// A range that always yields zero.
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0)
    }

    /// Pick a duration uniformly within the range.
    pub fn sample<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let secs = if self.max_secs > self.min_secs {
            rng.gen_range(self.min_secs..=self.max_secs)
        } else {
            self.min_secs
        };
        Duration::from_secs_f64(secs.max(0.0))
    }

    fn validate(&self, key: &'static str) -> Result<(), ConfigError> {
        if !(self.min_secs >= 0.0 && self.max_secs >= self.min_secs && self.max_secs.is_finite())
        {
            return Err(ConfigError::Invalid {
                key,
                reason: format!(
                    "expected finite 0 <= min_secs <= max_secs, got {}..{}",
                    self.min_secs, self.max_secs
                ),
            });
        }
        Ok(())
    }
}

/// Pacing between rows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PacingConfig {
    /// Base delay between rows.
    #[serde(default = "default_row_delay")]
    pub row_delay: DelayRange,

    /// Multiplier applied after rows that fetched a gloss or found audio.
    #[serde(default = "default_heavy_backoff")]
    pub heavy_backoff: f64,
}

fn default_row_delay() -> DelayRange {
    DelayRange::new(2.0, 4.0)
}

fn default_heavy_backoff() -> f64 {
    1.5
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            row_delay: default_row_delay(),
            heavy_backoff: default_heavy_backoff(),
        }
    }
}

impl PacingConfig {
    /// No waiting at all.
    pub fn disabled() -> Self {
        Self {
            row_delay: DelayRange::zero(),
            heavy_backoff: 1.0,
        }
    }

    /// Delay to apply after a row; `heavy` rows back off more.
    pub fn delay_after<R: rand::Rng + ?Sized>(&self, rng: &mut R, heavy: bool) -> Duration {
        let base = self.row_delay.sample(rng);
        if heavy {
            base.mul_f64(self.heavy_backoff)
        } else {
            base
        }
    }
}

/// HTTP settings for probing and downloading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpSettings {
    /// Timeout for existence probes, in seconds.
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout: u64,

    /// Timeout for audio downloads, in seconds.
    #[serde(default = "default_download_timeout")]
    pub download_timeout: u64,

    /// User agents rotated across requests.
    #[serde(default = "default_user_agents")]
    pub user_agents: Vec<String>,

    /// Honor HTTP(S)_PROXY environment variables.
    #[serde(default = "default_true")]
    pub use_system_proxy: bool,
}

fn default_probe_timeout() -> u64 {
    10
}

fn default_download_timeout() -> u64 {
    15
}

fn default_user_agents() -> Vec<String> {
    IMPERSONATE_USER_AGENTS
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_true() -> bool {
    true
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            probe_timeout: default_probe_timeout(),
            download_timeout: default_download_timeout(),
            user_agents: default_user_agents(),
            use_system_proxy: true,
        }
    }
}

impl HttpSettings {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout)
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout)
    }
}

/// Headless browser settings for gloss lookups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrowserSettings {
    /// Run in headless mode (default: true).
    #[serde(default = "default_true")]
    pub headless: bool,

    /// Window size as (width, height).
    #[serde(default = "default_window_size")]
    pub window_size: (u32, u32),

    /// Wait after navigation for dynamic content to render.
    #[serde(default = "default_render_wait")]
    pub render_wait: DelayRange,

    /// Explicit Chrome/Chromium executable.
    #[serde(default)]
    pub chrome_path: Option<PathBuf>,

    /// Remote Chrome DevTools URL (e.g., "ws://localhost:9222").
    /// If set, connects to an existing browser instead of launching one.
    #[serde(default)]
    pub remote_url: Option<String>,

    /// Additional Chrome arguments.
    #[serde(default)]
    pub chrome_args: Vec<String>,
}

fn default_window_size() -> (u32, u32) {
    (1200, 800)
}

fn default_render_wait() -> DelayRange {
    DelayRange::new(2.0, 6.0)
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: true,
            window_size: default_window_size(),
            render_wait: default_render_wait(),
            chrome_path: None,
            remote_url: None,
            chrome_args: Vec::new(),
        }
    }
}

/// Top-level settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Host serving pronunciation media and definition pages.
    #[serde(default = "default_dictionary_base")]
    pub dictionary_base: String,

    /// Host serving the gloss search page.
    #[serde(default = "default_lookup_base")]
    pub lookup_base: String,

    /// Directory audio files are written to when `--audio-dir` is absent.
    #[serde(default = "default_audio_dir")]
    pub audio_dir: PathBuf,

    /// Append-only diagnostic log.
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,

    #[serde(default)]
    pub pacing: PacingConfig,

    #[serde(default)]
    pub http: HttpSettings,

    #[serde(default)]
    pub browser: BrowserSettings,
}

fn default_dictionary_base() -> String {
    DEFAULT_DICTIONARY_BASE.to_string()
}

fn default_lookup_base() -> String {
    DEFAULT_LOOKUP_BASE.to_string()
}

fn default_audio_dir() -> PathBuf {
    PathBuf::from(DEFAULT_AUDIO_DIR)
}

fn default_log_file() -> PathBuf {
    PathBuf::from(DEFAULT_LOG_FILE)
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            dictionary_base: default_dictionary_base(),
            lookup_base: default_lookup_base(),
            audio_dir: default_audio_dir(),
            log_file: default_log_file(),
            pacing: PacingConfig::default(),
            http: HttpSettings::default(),
            browser: BrowserSettings::default(),
        }
    }
}

impl Settings {
    /// Parse settings from TOML text.
    pub fn from_toml(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        let settings: Settings = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check value constraints that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.pacing.row_delay.validate("pacing.row_delay")?;
        self.browser.render_wait.validate("browser.render_wait")?;
        let backoff = self.pacing.heavy_backoff;
        if !(backoff >= 1.0 && backoff.is_finite()) {
            return Err(ConfigError::Invalid {
                key: "pacing.heavy_backoff",
                reason: format!("must be a finite value >= 1.0, got {}", backoff),
            });
        }
        if self.http.user_agents.is_empty() {
            return Err(ConfigError::Invalid {
                key: "http.user_agents",
                reason: "at least one user agent is required".to_string(),
            });
        }
        if self.http.probe_timeout == 0 || self.http.download_timeout == 0 {
            return Err(ConfigError::Invalid {
                key: "http",
                reason: "timeouts must be positive".to_string(),
            });
        }
        Ok(())
    }
}

/// Load settings from `path`, or defaults when no path is given.
pub fn load_settings(path: Option<&Path>) -> Result<Settings, ConfigError> {
    let Some(path) = path else {
        return Ok(Settings::default());
    };

    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Settings::from_toml(&text, path)
}
