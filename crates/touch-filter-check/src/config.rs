//! Configuration for the touch-filter check
//!
//! Every field has a compiled-in default that reproduces the reference run:
//! a 1024x768 touch viewport against `http://localhost:8000`, touch point
//! (100, 100), a brush drag 50px to 150px below the top of the first axis
//! brush and settle delays between 100ms and 1000ms. A TOML file can
//! override any subset of them:
//!
//! ```toml
//! [target]
//! url = "http://127.0.0.1:8080"
//!
//! [browser]
//! sandbox = true
//! cpu_slowdown = 4.0
//!
//! [settle]
//! mode = "poll"
//! poll_timeout = 2000
//!
//! [selectors]
//! brush = ".axis:nth-of-type(2) .brush"
//! ```

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming an optional TOML configuration file
pub const CONFIG_ENV: &str = "TOUCH_CHECK_CONFIG";

/// Environment variable overriding the target URL
pub const URL_ENV: &str = "TOUCH_CHECK_URL";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Page under test
    #[serde(default)]
    pub target: TargetConfig,
    /// Browser launch options
    #[serde(default)]
    pub browser: BrowserOptions,
    /// Emulated viewport
    #[serde(default)]
    pub viewport: ViewportConfig,
    /// Fixed settle delays between steps
    #[serde(default)]
    pub timing: TimingConfig,
    /// How waits that expect a visible tooltip are resolved
    #[serde(default)]
    pub settle: SettleConfig,
    /// DOM contract of the page under test
    #[serde(default)]
    pub selectors: Selectors,
    /// Touch and brush gesture geometry
    #[serde(default)]
    pub gesture: GestureConfig,
    /// Report output
    #[serde(default)]
    pub report: ReportConfig,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or the TOML is malformed
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string
    ///
    /// ```
    /// use touch_filter_check::config::Config;
    ///
    /// # fn example() -> anyhow::Result<()> {
    /// let config = Config::from_str(r#"
    ///     [target]
    ///     url = "http://127.0.0.1:9000"
    /// "#)?;
    /// assert_eq!(config.viewport.width, 1024);
    /// # Ok(())
    /// # }
    /// ```
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> anyhow::Result<Self> {
        toml::from_str(s).context("Failed to parse TOML configuration")
    }

    /// Build the configuration from the process environment
    ///
    /// Reads the file named by `TOUCH_CHECK_CONFIG` when set, otherwise starts
    /// from the defaults, then applies `TOUCH_CHECK_URL`.
    pub fn from_env() -> anyhow::Result<Self> {
        let mut config = match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(PathBuf::from(path))?,
            None => Self::default(),
        };
        if let Ok(url) = std::env::var(URL_ENV) {
            if !url.trim().is_empty() {
                config.target.url = url;
            }
        }
        config.validate()?;
        Ok(config)
    }

    /// Reject values the browser would refuse or the scenario cannot use
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.browser.cpu_slowdown < 1.0 {
            anyhow::bail!(
                "cpu_slowdown must be >= 1.0 (got {})",
                self.browser.cpu_slowdown
            );
        }
        if self.viewport.width == 0 || self.viewport.height == 0 {
            anyhow::bail!(
                "viewport must be non-empty (got {}x{})",
                self.viewport.width,
                self.viewport.height
            );
        }
        if self.gesture.brush_end_offset <= self.gesture.brush_start_offset {
            anyhow::bail!(
                "brush_end_offset ({}) must be below brush_start_offset ({})",
                self.gesture.brush_end_offset,
                self.gesture.brush_start_offset
            );
        }
        if self.settle.mode == SettleMode::Poll && self.settle.poll_interval.is_zero() {
            anyhow::bail!("poll_interval must be greater than zero");
        }
        Ok(())
    }
}

/// Page under test
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TargetConfig {
    /// URL of the visualization page (default: http://localhost:8000)
    #[serde(default = "default_url")]
    pub url: String,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self { url: default_url() }
    }
}

fn default_url() -> String {
    "http://localhost:8000".to_string()
}

/// Browser launch options
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BrowserOptions {
    /// Explicit Chrome binary; falls back to Chrome for Testing, then auto-detection
    #[serde(default)]
    pub chrome_executable: Option<PathBuf>,
    /// Run Chrome with its sandbox (default: off)
    #[serde(default)]
    pub sandbox: bool,
    /// CPU slowdown multiplier (1.0 = full speed)
    #[serde(default = "default_cpu_slowdown")]
    pub cpu_slowdown: f64,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            chrome_executable: None,
            sandbox: false,
            cpu_slowdown: default_cpu_slowdown(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_cpu_slowdown() -> f64 {
    1.0
}

/// Emulated viewport
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ViewportConfig {
    /// Width in CSS pixels (default: 1024)
    #[serde(default = "default_width")]
    pub width: u32,
    /// Height in CSS pixels (default: 768)
    #[serde(default = "default_height")]
    pub height: u32,
    /// Enable touch emulation (default: true)
    #[serde(default = "default_true")]
    pub has_touch: bool,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            has_touch: true,
        }
    }
}

fn default_width() -> u32 {
    1024
}

fn default_height() -> u32 {
    768
}

/// Fixed settle delays, in milliseconds in TOML
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimingConfig {
    /// After the page load completes, before the first assertion (default: 1000ms)
    #[serde(default = "default_initial_settle", with = "duration_ms")]
    pub initial_settle: Duration,
    /// After a touch dispatch (default: 300ms)
    #[serde(default = "default_touch_settle", with = "duration_ms")]
    pub touch_settle: Duration,
    /// After the brush gesture (default: 300ms)
    #[serde(default = "default_touch_settle", with = "duration_ms")]
    pub brush_settle: Duration,
    /// After dismissing the tooltip (default: 100ms)
    #[serde(default = "default_dismiss_settle", with = "duration_ms")]
    pub dismiss_settle: Duration,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            initial_settle: default_initial_settle(),
            touch_settle: default_touch_settle(),
            brush_settle: default_touch_settle(),
            dismiss_settle: default_dismiss_settle(),
        }
    }
}

fn default_initial_settle() -> Duration {
    Duration::from_millis(1000)
}

fn default_touch_settle() -> Duration {
    Duration::from_millis(300)
}

fn default_dismiss_settle() -> Duration {
    Duration::from_millis(100)
}

/// How a wait that expects the tooltip to appear is resolved
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SettleMode {
    /// Sleep for the fixed delay, then assert
    #[default]
    Fixed,
    /// Poll the tooltip selector until it is visible or the timeout elapses
    Poll,
}

/// Settle strategy
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SettleConfig {
    #[serde(default)]
    pub mode: SettleMode,
    /// Delay between polls (default: 50ms)
    #[serde(default = "default_poll_interval", with = "duration_ms")]
    pub poll_interval: Duration,
    /// Upper bound for a polled wait (default: 2000ms)
    #[serde(default = "default_poll_timeout", with = "duration_ms")]
    pub poll_timeout: Duration,
}

impl Default for SettleConfig {
    fn default() -> Self {
        Self {
            mode: SettleMode::Fixed,
            poll_interval: default_poll_interval(),
            poll_timeout: default_poll_timeout(),
        }
    }
}

fn default_poll_interval() -> Duration {
    Duration::from_millis(50)
}

fn default_poll_timeout() -> Duration {
    Duration::from_millis(2000)
}

/// CSS selectors and class names the page under test is expected to use
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Selectors {
    /// Floating tooltip element
    #[serde(default = "default_tooltip")]
    pub tooltip: String,
    /// Class toggled on the tooltip while it is shown
    #[serde(default = "default_visible_class")]
    pub visible_class: String,
    /// Invisible, oversized touch targets, one per data row
    #[serde(default = "default_hit_region")]
    pub hit_region: String,
    /// Visible data paths, index-aligned with the hit regions
    #[serde(default = "default_foreground")]
    pub foreground: String,
    /// Class marking filtered-out paths
    #[serde(default = "default_dimmed_class")]
    pub dimmed_class: String,
    /// Axis brush; the first match receives the drag gesture
    #[serde(default = "default_brush")]
    pub brush: String,
}

impl Selectors {
    /// Selector matching the tooltip only while it is visible
    pub fn visible_tooltip(&self) -> String {
        format!("{}.{}", self.tooltip, self.visible_class)
    }

    /// Selector matching dimmed foreground paths
    pub fn dimmed_foreground(&self) -> String {
        format!("{}.{}", self.foreground, self.dimmed_class)
    }

    /// Selector matching foreground paths that survived the filter
    pub fn active_foreground(&self) -> String {
        format!("{}:not(.{})", self.foreground, self.dimmed_class)
    }
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            tooltip: default_tooltip(),
            visible_class: default_visible_class(),
            hit_region: default_hit_region(),
            foreground: default_foreground(),
            dimmed_class: default_dimmed_class(),
            brush: default_brush(),
        }
    }
}

fn default_tooltip() -> String {
    ".tooltip".to_string()
}

fn default_visible_class() -> String {
    "visible".to_string()
}

fn default_hit_region() -> String {
    ".hitarea path".to_string()
}

fn default_foreground() -> String {
    ".foreground path".to_string()
}

fn default_dimmed_class() -> String {
    "dimmed".to_string()
}

fn default_brush() -> String {
    ".axis .brush".to_string()
}

/// Touch point and brush drag geometry, in CSS pixels
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GestureConfig {
    /// Client X of synthetic touches (default: 100)
    #[serde(default = "default_touch_coord")]
    pub touch_x: f64,
    /// Client Y of synthetic touches (default: 100)
    #[serde(default = "default_touch_coord")]
    pub touch_y: f64,
    /// Drag start, measured down from the top of the brush box (default: 50)
    #[serde(default = "default_brush_start")]
    pub brush_start_offset: f64,
    /// Drag end, measured down from the top of the brush box (default: 150)
    #[serde(default = "default_brush_end")]
    pub brush_end_offset: f64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            touch_x: default_touch_coord(),
            touch_y: default_touch_coord(),
            brush_start_offset: default_brush_start(),
            brush_end_offset: default_brush_end(),
        }
    }
}

fn default_touch_coord() -> f64 {
    100.0
}

fn default_brush_start() -> f64 {
    50.0
}

fn default_brush_end() -> f64 {
    150.0
}

/// Report output
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReportConfig {
    /// Also write the report as pretty JSON to this path
    #[serde(default)]
    pub json_path: Option<PathBuf>,
}

/// Serde module for serializing/deserializing Duration as milliseconds
mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let ms = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(ms))
    }
}
