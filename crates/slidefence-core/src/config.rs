#![forbid(unsafe_code)]

//! Engine configuration.
//!
//! [`EngineOptions`] is the loose, caller-facing option bag (every field
//! defaulted, loadable from TOML or JSON with camelCase keys). It is
//! validated exactly once into an immutable [`EngineConfig`], which is what
//! the engine holds for its whole lifetime.
//!
//! ```toml
//! mode = "auto-fix"
//! threshold = 2
//! checkInterval = 200
//! excludeSelectors = ["aside.notes", ".fragment"]
//! ```
//!
//! # Failure Modes
//!
//! Invalid values fail at [`EngineConfig::from_options`]; nothing is
//! clamped or silently corrected.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::selector::{SelectorError, SelectorList, TreeElement};

/// Default sweep period.
pub const DEFAULT_CHECK_INTERVAL_MS: u64 = 100;
/// Default per-element remediation retry cap.
pub const DEFAULT_MAX_ITERATIONS: u32 = 10;
/// Default bound on waiting for images/fonts before a scan.
pub const DEFAULT_READINESS_TIMEOUT_MS: u64 = 5_000;
/// Exclusions applied when the caller does not supply any.
pub const DEFAULT_EXCLUDE_SELECTORS: [&str; 2] = [".notes", "aside"];

/// Remediation policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    /// Clamp size, clip, and pull positioned elements back inside.
    #[default]
    Strict,
    /// Shrink font, then padding, then fall back to the strict clamp.
    AutoFix,
    /// Record only; never mutate.
    Warn,
}

impl Mode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::AutoFix => "auto-fix",
            Self::Warn => "warn",
        }
    }

    /// Whether this mode ever writes to elements.
    #[inline]
    pub const fn mutates(self) -> bool {
        !matches!(self, Self::Warn)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "auto-fix" | "autofix" | "auto_fix" => Ok(Self::AutoFix),
            "warn" => Ok(Self::Warn),
            other => Err(ConfigError::UnknownMode(other.to_string())),
        }
    }
}

/// Configuration failure.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown mode {0:?} (expected strict, auto-fix, or warn)")]
    UnknownMode(String),

    #[error("threshold must be a finite number >= 0, got {0}")]
    InvalidThreshold(f64),

    #[error("checkInterval must be a positive number of milliseconds")]
    InvalidCheckInterval,

    #[error("maxIterations must be at least 1")]
    InvalidMaxIterations,

    #[error("invalid exclude selector {selector:?}: {source}")]
    Selector {
        selector: String,
        #[source]
        source: SelectorError,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Caller-facing engine options. All fields are optional on input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineOptions {
    pub mode: Mode,
    pub enable_logs: bool,
    /// Informational; carried for parity with deck integrations.
    pub auto_resize: bool,
    pub max_iterations: u32,
    /// Pixel tolerance; overflow must strictly exceed it.
    pub threshold: f64,
    /// Sweep period in milliseconds.
    pub check_interval: u64,
    pub exclude_selectors: Vec<String>,
    /// Milliseconds to wait for host readiness before scanning anyway.
    /// `0` waits indefinitely.
    pub readiness_timeout: u64,
    /// Harden the container itself (`overflow: hidden`, containment).
    pub constrain_container: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            mode: Mode::Strict,
            enable_logs: true,
            auto_resize: true,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            threshold: 0.0,
            check_interval: DEFAULT_CHECK_INTERVAL_MS,
            exclude_selectors: DEFAULT_EXCLUDE_SELECTORS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            readiness_timeout: DEFAULT_READINESS_TIMEOUT_MS,
            constrain_container: true,
        }
    }
}

impl EngineOptions {
    #[must_use]
    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn threshold(mut self, px: f64) -> Self {
        self.threshold = px;
        self
    }

    #[must_use]
    pub fn check_interval_ms(mut self, ms: u64) -> Self {
        self.check_interval = ms;
        self
    }

    #[must_use]
    pub fn enable_logs(mut self, on: bool) -> Self {
        self.enable_logs = on;
        self
    }

    #[must_use]
    pub fn max_iterations(mut self, n: u32) -> Self {
        self.max_iterations = n;
        self
    }

    #[must_use]
    pub fn exclude_selectors<I, S>(mut self, selectors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_selectors = selectors.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn readiness_timeout_ms(mut self, ms: u64) -> Self {
        self.readiness_timeout = ms;
        self
    }

    #[must_use]
    pub fn constrain_container(mut self, on: bool) -> Self {
        self.constrain_container = on;
        self
    }

    /// Load from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Load from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Load from a file; `.json` is parsed as JSON, anything else as TOML.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_toml_str(&content)
        }
    }

    /// Validate into an immutable [`EngineConfig`].
    pub fn build(self) -> Result<EngineConfig, ConfigError> {
        EngineConfig::from_options(self)
    }
}

/// Validated, immutable engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    mode: Mode,
    enable_logs: bool,
    auto_resize: bool,
    max_iterations: u32,
    threshold: f64,
    check_interval: Duration,
    exclude: Vec<SelectorList>,
    readiness_timeout: Option<Duration>,
    constrain_container: bool,
}

impl EngineConfig {
    pub fn from_options(opts: EngineOptions) -> Result<Self, ConfigError> {
        if !opts.threshold.is_finite() || opts.threshold < 0.0 {
            return Err(ConfigError::InvalidThreshold(opts.threshold));
        }
        if opts.check_interval == 0 {
            return Err(ConfigError::InvalidCheckInterval);
        }
        if opts.max_iterations == 0 {
            return Err(ConfigError::InvalidMaxIterations);
        }
        let exclude = opts
            .exclude_selectors
            .iter()
            .map(|s| {
                SelectorList::parse(s).map_err(|source| ConfigError::Selector {
                    selector: s.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            mode: opts.mode,
            enable_logs: opts.enable_logs,
            auto_resize: opts.auto_resize,
            max_iterations: opts.max_iterations,
            threshold: opts.threshold,
            check_interval: Duration::from_millis(opts.check_interval),
            exclude,
            readiness_timeout: (opts.readiness_timeout > 0)
                .then(|| Duration::from_millis(opts.readiness_timeout)),
            constrain_container: opts.constrain_container,
        })
    }

    #[inline]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    #[inline]
    pub fn enable_logs(&self) -> bool {
        self.enable_logs
    }

    #[inline]
    pub fn auto_resize(&self) -> bool {
        self.auto_resize
    }

    #[inline]
    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    #[inline]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    #[inline]
    pub fn check_interval(&self) -> Duration {
        self.check_interval
    }

    /// `None` means wait for readiness indefinitely.
    #[inline]
    pub fn readiness_timeout(&self) -> Option<Duration> {
        self.readiness_timeout
    }

    #[inline]
    pub fn constrain_container(&self) -> bool {
        self.constrain_container
    }

    pub fn exclude_selectors(&self) -> &[SelectorList] {
        &self.exclude
    }

    /// Whether `element` or any of its ancestors matches an exclusion.
    pub fn is_excluded(&self, element: &TreeElement<'_>) -> bool {
        self.exclude
            .iter()
            .any(|list| list.matches_self_or_ancestor(element))
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Strict,
            enable_logs: true,
            auto_resize: true,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            threshold: 0.0,
            check_interval: Duration::from_millis(DEFAULT_CHECK_INTERVAL_MS),
            exclude: DEFAULT_EXCLUDE_SELECTORS
                .iter()
                .filter_map(|s| SelectorList::parse(s).ok())
                .collect(),
            readiness_timeout: Some(Duration::from_millis(DEFAULT_READINESS_TIMEOUT_MS)),
            constrain_container: true,
        }
    }
}

impl TryFrom<EngineOptions> for EngineConfig {
    type Error = ConfigError;

    fn try_from(opts: EngineOptions) -> Result<Self, Self::Error> {
        Self::from_options(opts)
    }
}
