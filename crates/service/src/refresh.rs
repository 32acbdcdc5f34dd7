//! The refresh timer: every tick, reload the first pinned tab and trigger a
//! scan inside it. The first tick fires immediately at startup.

use std::sync::Arc;
use std::time::Duration;

use taskwatch_browser::Tabs;
use taskwatch_core::Result;
use taskwatch_scanner::Scanner;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};

use crate::{ReportService, ScanMessage};

pub struct RefreshService {
    tabs: Arc<dyn Tabs>,
    scanner: Arc<Scanner>,
    report: Arc<ReportService>,
    events_tx: mpsc::Sender<ScanMessage>,
    interval: Duration,
    reload_settle: Duration,
}

impl RefreshService {
    pub fn new(
        tabs: Arc<dyn Tabs>,
        scanner: Arc<Scanner>,
        report: Arc<ReportService>,
        events_tx: mpsc::Sender<ScanMessage>,
        interval: Duration,
        reload_settle: Duration,
    ) -> Self {
        Self {
            tabs,
            scanner,
            report,
            events_tx,
            interval,
            reload_settle,
        }
    }

    /// One refresh cycle. The absence of a pinned tab is a normal no-op, not
    /// an error.
    pub async fn tick(&self) -> Result<()> {
        let tabs = self.tabs.list().await?;
        let Some(pinned) = tabs.into_iter().find(|t| t.pinned) else {
            debug!("No pinned tab found");
            return Ok(());
        };

        info!(url = %pinned.url, "Refreshing pinned tab");
        self.tabs.reload(&pinned.id).await?;
        self.report
            .record_check(chrono::Utc::now().timestamp_millis())
            .await;

        // Give the reload a head start before driving the page.
        tokio::time::sleep(self.reload_settle).await;

        let page = self.tabs.page(&pinned.id).await?;
        let scanner = self.scanner.clone();
        let events_tx = self.events_tx.clone();

        // The scan runs detached so a slow page cannot stall the timer; the
        // scanner's own state machine drops overlapping triggers.
        tokio::spawn(async move {
            let Some(event) = scanner.run(page.as_ref()).await else {
                return;
            };
            let (msg, ack) = ScanMessage::new(event);
            if events_tx.send(msg).await.is_err() {
                warn!("Report channel closed, dropping scan result");
                return;
            }
            match ack.await {
                Ok(true) => debug!("Scan report acknowledged"),
                _ => warn!("Scan report was not acknowledged"),
            }
        });

        Ok(())
    }

    pub async fn run_loop(self: Arc<Self>, mut shutdown: broadcast::Receiver<()>) {
        info!(
            interval_secs = self.interval.as_secs(),
            "RefreshService started"
        );

        let mut interval = tokio::time::interval(self.interval);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.tick().await {
                        error!(error = %e.to_string(), "Refresh tick failed");
                    }
                }
                _ = shutdown.recv() => {
                    info!("RefreshService shutting down");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use taskwatch_core::config::{ScannerConfig, TrackerConfig};
    use taskwatch_core::ScanEvent;
    use taskwatch_notify::Notifier;
    use taskwatch_browser::{Candidate, ListWait, PageDriver, TabRecord};
    use tempfile::TempDir;

    struct SilentNotifier;

    #[async_trait]
    impl Notifier for SilentNotifier {
        async fn notify(&self, _title: &str, _message: &str) -> Result<()> {
            Ok(())
        }
        async fn notify_list(
            &self,
            _title: &str,
            _items: &[String],
            _message: &str,
        ) -> Result<()> {
            Ok(())
        }
    }

    struct StaticPage;

    #[async_trait]
    impl PageDriver for StaticPage {
        async fn click_selector(&self, _selector: &str) -> Result<bool> {
            Ok(true)
        }
        async fn click_containing(&self, _text: &str, _tags: &[&str]) -> Result<bool> {
            Ok(true)
        }
        async fn await_list_render(
            &self,
            _selectors: &[&str],
            _timeout: Duration,
            _render_settle: Duration,
        ) -> Result<ListWait> {
            Ok(ListWait::Present)
        }
        async fn collect_candidates(&self, _selectors: &[&str]) -> Result<Vec<Candidate>> {
            Ok(vec![Candidate {
                text: "Chase missing payment".to_string(),
                visible: true,
                leaf: true,
            }])
        }
    }

    struct FakeTabs {
        tabs: Vec<TabRecord>,
        reloads: AtomicUsize,
        pages: AtomicUsize,
    }

    impl FakeTabs {
        fn new(tabs: Vec<TabRecord>) -> Self {
            Self {
                tabs,
                reloads: AtomicUsize::new(0),
                pages: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Tabs for FakeTabs {
        async fn list(&self) -> Result<Vec<TabRecord>> {
            Ok(self.tabs.clone())
        }

        async fn reload(&self, _tab_id: &str) -> Result<()> {
            self.reloads.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn page(&self, _tab_id: &str) -> Result<Box<dyn PageDriver>> {
            self.pages.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(StaticPage))
        }
    }

    fn tab(id: &str, pinned: bool) -> TabRecord {
        TabRecord {
            id: id.to_string(),
            url: format!("https://tracker.example.com/{}", id),
            title: id.to_string(),
            pinned,
        }
    }

    fn fast_scanner() -> Arc<Scanner> {
        Arc::new(Scanner::new(
            TrackerConfig::default(),
            ScannerConfig {
                max_retries: 2,
                retry_delay_ms: 1,
                click_settle_ms: 0,
                option_pre_delay_ms: 0,
                option_settle_ms: 0,
                list_timeout_secs: 1,
                render_settle_ms: 0,
            },
        ))
    }

    async fn report_service(dir: &TempDir) -> Arc<ReportService> {
        let paths = taskwatch_core::Paths::with_base(dir.path().to_path_buf());
        Arc::new(
            ReportService::load(&paths, Arc::new(SilentNotifier), false)
                .await
                .unwrap(),
        )
    }

    #[tokio::test]
    async fn test_no_pinned_tab_is_a_noop() {
        let dir = TempDir::new().unwrap();
        let tabs = Arc::new(FakeTabs::new(vec![tab("a", false), tab("b", false)]));
        let (tx, _rx) = mpsc::channel(8);
        let service = RefreshService::new(
            tabs.clone(),
            fast_scanner(),
            report_service(&dir).await,
            tx,
            Duration::from_secs(300),
            Duration::ZERO,
        );

        service.tick().await.unwrap();

        assert_eq!(tabs.reloads.load(Ordering::SeqCst), 0);
        assert_eq!(tabs.pages.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_tick_reloads_first_pinned_tab_and_reports_titles() {
        let dir = TempDir::new().unwrap();
        let tabs = Arc::new(FakeTabs::new(vec![
            tab("a", false),
            tab("b", true),
            tab("c", true),
        ]));
        let (tx, mut rx) = mpsc::channel(8);
        let report = report_service(&dir).await;
        let service = RefreshService::new(
            tabs.clone(),
            fast_scanner(),
            report.clone(),
            tx,
            Duration::from_secs(300),
            Duration::ZERO,
        );

        service.tick().await.unwrap();

        // Only the first pinned tab is touched.
        assert_eq!(tabs.reloads.load(Ordering::SeqCst), 1);

        let msg = rx.recv().await.expect("scan report");
        match msg.event {
            ScanEvent::TitleReport { titles, .. } => {
                assert_eq!(titles, vec!["Chase missing payment".to_string()]);
            }
            other => panic!("expected title report, got {:?}", other),
        }
        if let Some(ack) = msg.ack {
            let _ = ack.send(true);
        }
    }
}
