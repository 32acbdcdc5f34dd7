use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;
use crate::paths::Paths;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowserConfig {
    /// CDP debug port of the browser to attach to.
    #[serde(default = "default_debug_port")]
    pub debug_port: u16,
    /// Launch a managed browser when nothing is listening on the debug port.
    #[serde(default = "default_auto_launch")]
    pub auto_launch: bool,
    /// Launch the managed browser with a visible window.
    #[serde(default = "default_headed")]
    pub headed: bool,
    /// Browser engine for the managed launch: "chrome" or "edge".
    #[serde(default = "default_engine")]
    pub engine: String,
}

fn default_debug_port() -> u16 {
    9222
}

fn default_auto_launch() -> bool {
    true
}

fn default_headed() -> bool {
    true
}

fn default_engine() -> String {
    "chrome".to_string()
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            debug_port: default_debug_port(),
            auto_launch: default_auto_launch(),
            headed: default_headed(),
            engine: default_engine(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerConfig {
    /// URL substring identifying the watched tab. Empty = no tab is watched.
    #[serde(default)]
    pub url_match: String,
    /// Text of the saved-searches control on the tracker page.
    #[serde(default = "default_saved_searches_text")]
    pub saved_searches_text: String,
    /// Text of the saved-search option to select.
    #[serde(default = "default_filter_option_text")]
    pub filter_option_text: String,
    /// Marker substring excluding a task from notification (case-insensitive).
    #[serde(default = "default_contacted_marker")]
    pub contacted_marker: String,
    /// Seconds between refresh ticks.
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,
    /// Delay between reloading the tab and starting a scan.
    #[serde(default = "default_reload_settle_ms")]
    pub reload_settle_ms: u64,
}

fn default_saved_searches_text() -> String {
    "Saved searches".to_string()
}

fn default_filter_option_text() -> String {
    "PH".to_string()
}

fn default_contacted_marker() -> String {
    "Contacted".to_string()
}

fn default_refresh_interval() -> u64 {
    300
}

fn default_reload_settle_ms() -> u64 {
    2000
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            url_match: String::new(),
            saved_searches_text: default_saved_searches_text(),
            filter_option_text: default_filter_option_text(),
            contacted_marker: default_contacted_marker(),
            refresh_interval_secs: default_refresh_interval(),
            reload_settle_ms: default_reload_settle_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScannerConfig {
    /// Full-sequence attempts before the scan reports a terminal error.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Base backoff unit; attempt N waits N x this before retrying.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// Settle delay after clicking the saved-searches control.
    #[serde(default = "default_click_settle_ms")]
    pub click_settle_ms: u64,
    /// Wait before searching for the saved-search option.
    #[serde(default = "default_option_pre_delay_ms")]
    pub option_pre_delay_ms: u64,
    /// Settle delay after selecting the saved-search option.
    #[serde(default = "default_option_settle_ms")]
    pub option_settle_ms: u64,
    /// Upper bound on waiting for the task list to render.
    #[serde(default = "default_list_timeout_secs")]
    pub list_timeout_secs: u64,
    /// Extra delay after mutation-based list detection.
    #[serde(default = "default_render_settle_ms")]
    pub render_settle_ms: u64,
}

fn default_max_retries() -> u32 {
    10
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_click_settle_ms() -> u64 {
    1500
}

fn default_option_pre_delay_ms() -> u64 {
    2000
}

fn default_option_settle_ms() -> u64 {
    2000
}

fn default_list_timeout_secs() -> u64 {
    30
}

fn default_render_settle_ms() -> u64 {
    1000
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            click_settle_ms: default_click_settle_ms(),
            option_pre_delay_ms: default_option_pre_delay_ms(),
            option_settle_ms: default_option_settle_ms(),
            list_timeout_secs: default_list_timeout_secs(),
            render_settle_ms: default_render_settle_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationsConfig {
    #[serde(default = "default_notifications_enabled")]
    pub enabled: bool,
    /// Notification sound name (macOS only).
    #[serde(default = "default_sound")]
    pub sound: String,
}

fn default_notifications_enabled() -> bool {
    true
}

fn default_sound() -> String {
    "default".to_string()
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            enabled: default_notifications_enabled(),
            sound: default_sound(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub tracker: TrackerConfig,
    #[serde(default)]
    pub scanner: ScannerConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn load_or_default(paths: &Paths) -> Result<Self> {
        let config_path = paths.config_file();
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.browser.debug_port, 9222);
        assert_eq!(cfg.tracker.saved_searches_text, "Saved searches");
        assert_eq!(cfg.tracker.filter_option_text, "PH");
        assert_eq!(cfg.tracker.refresh_interval_secs, 300);
        assert_eq!(cfg.scanner.max_retries, 10);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let raw = r#"{
  "tracker": { "urlMatch": "tracker.example.com", "filterOptionText": "Mine" }
}"#;
        let cfg: Config = serde_json::from_str(raw).unwrap();
        assert_eq!(cfg.tracker.url_match, "tracker.example.com");
        assert_eq!(cfg.tracker.filter_option_text, "Mine");
        assert_eq!(cfg.tracker.contacted_marker, "Contacted");
        assert_eq!(cfg.scanner.retry_delay_ms, 1000);
    }
}
