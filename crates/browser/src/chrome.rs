//! Browser bootstrap: attach to a running Chromium-family browser, or launch
//! a managed one with a dedicated profile when nothing is listening.

use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use taskwatch_core::config::BrowserConfig;
use taskwatch_core::{Error, Paths, Result};
use tokio::process::{Child, Command};
use tracing::{debug, info};

/// Supported browser engines for a managed launch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BrowserEngine {
    Chrome,
    Edge,
}

impl BrowserEngine {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "edge" | "msedge" => Self::Edge,
            _ => Self::Chrome,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Chrome => "chrome",
            Self::Edge => "edge",
        }
    }
}

/// A reachable browser debugging endpoint, optionally backed by a child
/// process we launched ourselves.
pub struct Browser {
    pub debug_port: u16,
    process: Option<Child>,
}

impl Browser {
    /// Attach to the browser on the configured debug port; if nothing is
    /// listening and auto-launch is enabled, start a managed instance.
    pub async fn attach_or_launch(config: &BrowserConfig, paths: &Paths) -> Result<Self> {
        if endpoint_version(config.debug_port).await.is_ok() {
            info!(port = config.debug_port, "Attached to running browser");
            return Ok(Self {
                debug_port: config.debug_port,
                process: None,
            });
        }

        if !config.auto_launch {
            return Err(Error::Browser(format!(
                "no browser listening on port {} and autoLaunch is disabled",
                config.debug_port
            )));
        }

        let engine = BrowserEngine::from_str(&config.engine);
        let child = launch(engine, config.debug_port, &paths.profile_dir(), config.headed)?;
        wait_until_ready(config.debug_port, 15).await?;

        info!(
            port = config.debug_port,
            browser = engine.name(),
            headed = config.headed,
            "Launched managed browser"
        );

        Ok(Self {
            debug_port: config.debug_port,
            process: Some(child),
        })
    }

    /// Whether this endpoint is backed by a process we own.
    pub fn is_managed(&self) -> bool {
        self.process.is_some()
    }

    /// Shut down a managed browser. Attached browsers are left alone.
    pub async fn close(&mut self) {
        if let Some(child) = self.process.as_mut() {
            let _ = child.kill().await;
        }
    }
}

impl Drop for Browser {
    fn drop(&mut self) {
        if let Some(child) = self.process.as_mut() {
            let _ = child.start_kill();
        }
    }
}

fn launch(
    engine: BrowserEngine,
    debug_port: u16,
    user_data_dir: &Path,
    headed: bool,
) -> Result<Child> {
    let binary = find_browser_binary(engine).ok_or_else(|| {
        Error::Browser(format!("{} not found. Please install it.", engine.name()))
    })?;

    std::fs::create_dir_all(user_data_dir)
        .map_err(|e| Error::Browser(format!("create user data dir: {}", e)))?;

    let mut args = vec![
        format!("--remote-debugging-port={}", debug_port),
        format!("--user-data-dir={}", user_data_dir.display()),
        "--no-first-run".to_string(),
        "--no-default-browser-check".to_string(),
        "--disable-background-networking".to_string(),
        "--disable-sync".to_string(),
        "--disable-translate".to_string(),
        "--metrics-recording-only".to_string(),
        "--password-store=basic".to_string(),
    ];
    if !headed {
        args.push("--headless=new".to_string());
    }
    args.push("--window-size=1280,720".to_string());
    args.push("about:blank".to_string());

    debug!(binary = %binary, port = debug_port, "Spawning browser");

    Command::new(&binary)
        .args(&args)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| Error::Browser(format!("launch {}: {}", engine.name(), e)))
}

/// Find a browser binary on the system for the given engine.
pub fn find_browser_binary(engine: BrowserEngine) -> Option<String> {
    let candidates = match engine {
        BrowserEngine::Chrome => {
            if cfg!(target_os = "macos") {
                vec![
                    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
                    "/Applications/Chromium.app/Contents/MacOS/Chromium",
                    "/Applications/Brave Browser.app/Contents/MacOS/Brave Browser",
                ]
            } else if cfg!(target_os = "linux") {
                vec![
                    "google-chrome",
                    "google-chrome-stable",
                    "chromium",
                    "chromium-browser",
                    "/usr/bin/google-chrome",
                    "/usr/bin/chromium",
                ]
            } else {
                vec![
                    r"C:\Program Files\Google\Chrome\Application\chrome.exe",
                    r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
                ]
            }
        }
        BrowserEngine::Edge => {
            if cfg!(target_os = "macos") {
                vec!["/Applications/Microsoft Edge.app/Contents/MacOS/Microsoft Edge"]
            } else if cfg!(target_os = "linux") {
                vec![
                    "microsoft-edge",
                    "microsoft-edge-stable",
                    "/usr/bin/microsoft-edge",
                ]
            } else {
                vec![
                    r"C:\Program Files (x86)\Microsoft\Edge\Application\msedge.exe",
                    r"C:\Program Files\Microsoft\Edge\Application\msedge.exe",
                ]
            }
        }
    };

    for candidate in candidates {
        if PathBuf::from(candidate).exists() {
            return Some(candidate.to_string());
        }
        if !candidate.contains('/') && !candidate.contains('\\') && which::which(candidate).is_ok() {
            return Some(candidate.to_string());
        }
    }
    None
}

/// Probe a debugging endpoint and return its browser product string.
pub async fn probe(port: u16) -> Result<String> {
    let body = endpoint_version(port).await?;
    Ok(body
        .get("Browser")
        .and_then(|v| v.as_str())
        .unwrap_or("unknown")
        .to_string())
}

/// Fetch /json/version from the debugging endpoint.
async fn endpoint_version(port: u16) -> Result<Value> {
    let url = format!("http://127.0.0.1:{}/json/version", port);
    let resp = reqwest::get(&url)
        .await
        .map_err(|e| Error::Browser(format!("CDP endpoint on port {} unreachable: {}", port, e)))?;
    resp.json::<Value>()
        .await
        .map_err(|e| Error::Browser(format!("parse /json/version: {}", e)))
}

/// Poll /json/version until the endpoint responds, up to `timeout_secs`.
async fn wait_until_ready(port: u16, timeout_secs: u64) -> Result<()> {
    let start = std::time::Instant::now();
    let timeout = std::time::Duration::from_secs(timeout_secs);

    loop {
        if start.elapsed() > timeout {
            return Err(Error::Timeout(format!(
                "browser CDP endpoint not ready after {}s on port {}",
                timeout_secs, port
            )));
        }
        if endpoint_version(port).await.is_ok() {
            return Ok(());
        }
        tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_from_str() {
        assert_eq!(BrowserEngine::from_str("edge"), BrowserEngine::Edge);
        assert_eq!(BrowserEngine::from_str("msedge"), BrowserEngine::Edge);
        assert_eq!(BrowserEngine::from_str("chrome"), BrowserEngine::Chrome);
        assert_eq!(BrowserEngine::from_str("anything"), BrowserEngine::Chrome);
    }
}
