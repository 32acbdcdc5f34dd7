//! CDP-backed tab management.
//!
//! Chrome's HTTP endpoint lists page targets in tab-strip order; commands go
//! to a per-target WebSocket. CDP does not expose a tab's pinned state, so a
//! tab is reported pinned when its URL matches the configured tracker
//! pattern.

use async_trait::async_trait;
use serde_json::Value;
use taskwatch_core::{Error, Result};
use tracing::{debug, info};

use crate::cdp::CdpClient;
use crate::page::CdpPage;
use crate::{PageDriver, TabRecord, Tabs};

pub struct CdpTabs {
    debug_port: u16,
    /// URL substring marking the watched tab. Empty = nothing is pinned.
    url_match: String,
}

impl CdpTabs {
    pub fn new(debug_port: u16, url_match: &str) -> Self {
        Self {
            debug_port,
            url_match: url_match.to_string(),
        }
    }

    async fn fetch_targets(&self) -> Result<Vec<Value>> {
        let url = format!("http://127.0.0.1:{}/json/list", self.debug_port);
        let resp = reqwest::get(&url)
            .await
            .map_err(|e| Error::Browser(format!("list tabs: {}", e)))?;
        resp.json::<Vec<Value>>()
            .await
            .map_err(|e| Error::Browser(format!("parse tab list: {}", e)))
    }

    /// Resolve a tab id to its WebSocket debugger URL. Retries briefly since
    /// a freshly reloaded target may not be listed immediately.
    async fn ws_url(&self, tab_id: &str) -> Result<String> {
        for attempt in 0..10 {
            if attempt > 0 {
                tokio::time::sleep(std::time::Duration::from_millis(300)).await;
            }

            let targets = match self.fetch_targets().await {
                Ok(t) => t,
                Err(_) => continue,
            };

            for target in &targets {
                if target.get("id").and_then(|v| v.as_str()) == Some(tab_id) {
                    if let Some(ws) = target
                        .get("webSocketDebuggerUrl")
                        .and_then(|v| v.as_str())
                    {
                        return Ok(ws.to_string());
                    }
                }
            }
        }

        Err(Error::NotFound(format!(
            "no WebSocket URL for tab '{}' after retries",
            tab_id
        )))
    }

    async fn connect(&self, tab_id: &str) -> Result<CdpClient> {
        let ws_url = self.ws_url(tab_id).await?;
        let cdp = CdpClient::connect(&ws_url).await?;
        cdp.enable_domain("Page").await?;
        cdp.enable_domain("Runtime").await?;
        Ok(cdp)
    }
}

#[async_trait]
impl Tabs for CdpTabs {
    async fn list(&self) -> Result<Vec<TabRecord>> {
        let targets = self.fetch_targets().await?;

        let tabs: Vec<TabRecord> = targets
            .iter()
            .filter(|t| t.get("type").and_then(|v| v.as_str()) == Some("page"))
            .filter_map(|t| {
                let id = t.get("id").and_then(|v| v.as_str())?;
                let url = t.get("url").and_then(|v| v.as_str()).unwrap_or("");
                let title = t.get("title").and_then(|v| v.as_str()).unwrap_or("");
                let pinned = !self.url_match.is_empty() && url.contains(&self.url_match);
                Some(TabRecord {
                    id: id.to_string(),
                    url: url.to_string(),
                    title: title.to_string(),
                    pinned,
                })
            })
            .collect();

        debug!(count = tabs.len(), "Listed page targets");
        Ok(tabs)
    }

    async fn reload(&self, tab_id: &str) -> Result<()> {
        let cdp = self.connect(tab_id).await?;
        cdp.reload().await?;
        info!(tab = tab_id, "Reloaded tab");
        Ok(())
    }

    async fn page(&self, tab_id: &str) -> Result<Box<dyn PageDriver>> {
        let cdp = self.connect(tab_id).await?;
        Ok(Box::new(CdpPage::new(cdp)))
    }
}
