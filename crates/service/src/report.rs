//! Dedup and notify: receives title reports, filters them against the
//! persisted notified set, and raises notifications for what is left.

use std::sync::Arc;

use taskwatch_core::{Paths, Result, ScanEvent};
use taskwatch_notify::{raise_notifications, Notifier};
use taskwatch_store::{HistoryEntry, HistoryStore, NotifiedStore};
use tokio::sync::{broadcast, mpsc, Mutex};
use tracing::{debug, error, info, warn};

use crate::ScanMessage;

pub struct ReportService {
    notified: Mutex<NotifiedStore>,
    history: Mutex<HistoryStore>,
    notifier: Arc<dyn Notifier>,
    notifications_enabled: bool,
}

impl ReportService {
    /// Load both state files before any tick can mutate them.
    pub async fn load(
        paths: &Paths,
        notifier: Arc<dyn Notifier>,
        notifications_enabled: bool,
    ) -> Result<Self> {
        let notified = NotifiedStore::load(paths.notified_file()).await?;
        let history = HistoryStore::load(paths.history_file()).await?;
        info!(known_titles = notified.len(), "Report service loaded");
        Ok(Self {
            notified: Mutex::new(notified),
            history: Mutex::new(history),
            notifier,
            notifications_enabled,
        })
    }

    /// Handle one scan event. The returned flag is the acknowledgement sent
    /// back over the message channel.
    pub async fn handle(&self, event: ScanEvent) -> bool {
        match event {
            ScanEvent::TitleReport { titles, .. } => {
                self.on_titles_received(titles).await;
                true
            }
            ScanEvent::ErrorReport { error, .. } => {
                error!(error = %error, "Scan reported a terminal failure");
                false
            }
        }
    }

    async fn on_titles_received(&self, titles: Vec<String>) {
        if titles.is_empty() {
            debug!("No tasks reported");
            return;
        }

        let new_titles = {
            let mut notified = self.notified.lock().await;
            let added = notified.add_all(&titles);
            if added.is_empty() {
                debug!(reported = titles.len(), "All titles already notified");
                return;
            }
            // Persist before notifying so a crash cannot re-notify.
            if let Err(e) = notified.persist().await {
                error!(error = %e, "Failed to persist notified titles");
            }
            added
        };

        {
            let mut history = self.history.lock().await;
            history.record(&new_titles, chrono::Utc::now().timestamp_millis());
            if let Err(e) = history.persist().await {
                error!(error = %e, "Failed to persist task history");
            }
        }

        info!(count = new_titles.len(), "New tasks found");

        if self.notifications_enabled {
            if let Err(e) = raise_notifications(self.notifier.as_ref(), &new_titles).await {
                warn!(error = %e, "Failed to raise notifications");
            }
        }
    }

    /// Record a completed refresh tick for the status display.
    pub async fn record_check(&self, now_ms: i64) {
        let mut history = self.history.lock().await;
        history.touch_check(now_ms);
        if let Err(e) = history.persist().await {
            warn!(error = %e, "Failed to persist last-check time");
        }
    }

    pub async fn known_title_count(&self) -> usize {
        self.notified.lock().await.len()
    }

    pub async fn recent_history(&self, now_ms: i64, limit: usize) -> Vec<HistoryEntry> {
        self.history.lock().await.recent(now_ms, limit)
    }

    /// Dispatch loop over the scanner message channel.
    pub async fn run_loop(
        self: Arc<Self>,
        mut rx: mpsc::Receiver<ScanMessage>,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        info!("ReportService started");
        loop {
            tokio::select! {
                msg = rx.recv() => {
                    match msg {
                        Some(msg) => {
                            let ok = self.handle(msg.event).await;
                            if let Some(ack) = msg.ack {
                                let _ = ack.send(ok);
                            }
                        }
                        None => {
                            debug!("Scan message channel closed");
                            break;
                        }
                    }
                }
                _ = shutdown.recv() => {
                    info!("ReportService shutting down");
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
    use std::sync::Mutex as StdMutex;
    use tempfile::TempDir;

    #[derive(Default)]
    struct Recorder {
        simple: StdMutex<Vec<String>>,
        grouped: StdMutex<Vec<Vec<String>>>,
    }

    #[async_trait]
    impl Notifier for Recorder {
        async fn notify(&self, _title: &str, message: &str) -> Result<()> {
            self.simple.lock().unwrap().push(message.to_string());
            Ok(())
        }

        async fn notify_list(&self, _title: &str, items: &[String], _message: &str) -> Result<()> {
            self.grouped.lock().unwrap().push(items.to_vec());
            Ok(())
        }
    }

    fn titles(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    async fn service(dir: &TempDir) -> (Arc<ReportService>, Arc<Recorder>) {
        let paths = Paths::with_base(dir.path().to_path_buf());
        let notifier = Arc::new(Recorder::default());
        let service = ReportService::load(&paths, notifier.clone(), true)
            .await
            .unwrap();
        (Arc::new(service), notifier)
    }

    #[tokio::test]
    async fn test_single_new_title_raises_one_simple_notification() {
        let dir = TempDir::new().unwrap();
        let (service, notifier) = service(&dir).await;

        let ok = service.handle(ScanEvent::titles(titles(&["Task A"]))).await;
        assert!(ok);
        assert_eq!(*notifier.simple.lock().unwrap(), vec!["Task A".to_string()]);
        assert!(notifier.grouped.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_known_titles_are_never_renotified() {
        let dir = TempDir::new().unwrap();
        let (service, notifier) = service(&dir).await;

        service.handle(ScanEvent::titles(titles(&["Task A"]))).await;
        for _ in 0..3 {
            service
                .handle(ScanEvent::titles(titles(&["Task A", "Task B"])))
                .await;
        }

        // Task A notified once; Task B once (as the only new title of the
        // second report).
        assert_eq!(
            *notifier.simple.lock().unwrap(),
            vec!["Task A".to_string(), "Task B".to_string()]
        );
        assert_eq!(service.known_title_count().await, 2);
    }

    #[tokio::test]
    async fn test_empty_report_is_a_noop() {
        let dir = TempDir::new().unwrap();
        let (service, notifier) = service(&dir).await;

        assert!(service.handle(ScanEvent::titles(vec![])).await);
        assert!(notifier.simple.lock().unwrap().is_empty());
        assert_eq!(service.known_title_count().await, 0);
    }

    #[tokio::test]
    async fn test_error_report_is_not_acknowledged_as_success() {
        let dir = TempDir::new().unwrap();
        let (service, _) = service(&dir).await;

        assert!(!service.handle(ScanEvent::error("retries exhausted")).await);
    }

    #[tokio::test]
    async fn test_new_titles_survive_restart() {
        let dir = TempDir::new().unwrap();
        {
            let (service, _) = service(&dir).await;
            service.handle(ScanEvent::titles(titles(&["Task A"]))).await;
        }

        let (service, notifier) = service(&dir).await;
        service.handle(ScanEvent::titles(titles(&["Task A"]))).await;
        assert!(notifier.simple.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_run_loop_acknowledges_messages() {
        let dir = TempDir::new().unwrap();
        let (service, _) = service(&dir).await;

        let (tx, rx) = mpsc::channel(8);
        let (shutdown_tx, _) = broadcast::channel(1);
        let handle = tokio::spawn(service.clone().run_loop(rx, shutdown_tx.subscribe()));

        let (msg, ack) = ScanMessage::new(ScanEvent::titles(titles(&["Task A"])));
        tx.send(msg).await.unwrap();
        assert!(ack.await.unwrap());

        let (msg, ack) = ScanMessage::new(ScanEvent::error("boom"));
        tx.send(msg).await.unwrap();
        assert!(!ack.await.unwrap());

        drop(tx);
        handle.await.unwrap();
    }
}
