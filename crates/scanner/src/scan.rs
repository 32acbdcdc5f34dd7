//! The scan driver: a two-state machine {Idle, Scanning} around a bounded
//! retry loop over the page sequence (open saved searches, select option,
//! wait for the list, collect and classify titles).

use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;

use taskwatch_core::config::{ScannerConfig, TrackerConfig};
use taskwatch_core::{Error, Result, ScanEvent};
use taskwatch_browser::PageDriver;
use tracing::{debug, error, info, warn};

use crate::finder::{activate_first, filter_option_finders, saved_searches_finders};
use crate::title::classify;

/// Structural selectors likely to match task rows, most specific first.
const TASK_SELECTORS: &[&str] = &[
    ".task-item",
    ".task",
    ".item",
    ".row",
    "[data-task]",
    "[data-item]",
    "[class*=\"task\"]",
    "tr",
    "li",
    ".list-item",
    ".entry",
];

/// Selectors that indicate the list is already rendered during the wait.
const PRESENT_SELECTORS: &[&str] = &[".task", ".item", "tr", "li"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Idle,
    Scanning,
}

pub struct Scanner {
    tracker: TrackerConfig,
    config: ScannerConfig,
    state: Mutex<ScanState>,
}

impl Scanner {
    pub fn new(tracker: TrackerConfig, config: ScannerConfig) -> Self {
        Self {
            tracker,
            config,
            state: Mutex::new(ScanState::Idle),
        }
    }

    /// Run a full scan against `page`. A trigger arriving while a scan is
    /// already in progress is dropped (returns `None`), not queued. Otherwise
    /// returns the event to report: a title list, or a terminal error after
    /// the retry budget is exhausted.
    pub async fn run(&self, page: &dyn PageDriver) -> Option<ScanEvent> {
        {
            let mut state = self.state.lock().expect("scanner state lock");
            if *state == ScanState::Scanning {
                debug!("Scan already in progress, dropping trigger");
                return None;
            }
            *state = ScanState::Scanning;
        }

        let event = self.run_attempts(page).await;

        *self.state.lock().expect("scanner state lock") = ScanState::Idle;
        Some(event)
    }

    async fn run_attempts(&self, page: &dyn PageDriver) -> ScanEvent {
        let max_attempts = self.config.max_retries.max(1);
        let mut last_error = String::new();

        for attempt in 1..=max_attempts {
            match self.scan_once(page).await {
                Ok(titles) => {
                    info!(attempt, count = titles.len(), "Scan completed");
                    return ScanEvent::titles(titles);
                }
                Err(e) => {
                    warn!(attempt, max_attempts, error = %e, "Scan attempt failed");
                    last_error = e.to_string();
                    if attempt < max_attempts {
                        tokio::time::sleep(backoff_delay(attempt, self.config.retry_delay_ms))
                            .await;
                    }
                }
            }
        }

        error!(max_attempts, error = %last_error, "Scan retries exhausted");
        ScanEvent::error(last_error)
    }

    /// One pass of the page sequence. Any error restarts the whole pass.
    async fn scan_once(&self, page: &dyn PageDriver) -> Result<Vec<String>> {
        // Open the saved-searches panel.
        let finders = saved_searches_finders(&self.tracker.saved_searches_text);
        if !activate_first(page, &finders).await? {
            return Err(Error::Scan(format!(
                "could not activate '{}'",
                self.tracker.saved_searches_text
            )));
        }
        tokio::time::sleep(Duration::from_millis(self.config.click_settle_ms)).await;

        // Select the saved-search option once the panel has had time to open.
        tokio::time::sleep(Duration::from_millis(self.config.option_pre_delay_ms)).await;
        let finders = filter_option_finders(&self.tracker.filter_option_text);
        if !activate_first(page, &finders).await? {
            return Err(Error::Scan(format!(
                "could not select '{}'",
                self.tracker.filter_option_text
            )));
        }
        tokio::time::sleep(Duration::from_millis(self.config.option_settle_ms)).await;

        // Let the task list materialize. A timeout here is not an error; the
        // filter may legitimately match nothing.
        page.await_list_render(
            PRESENT_SELECTORS,
            Duration::from_secs(self.config.list_timeout_secs),
            Duration::from_millis(self.config.render_settle_ms),
        )
        .await?;

        // Collect and classify in document order, deduplicating within the run.
        let candidates = page.collect_candidates(TASK_SELECTORS).await?;
        let mut titles = Vec::new();
        let mut seen = HashSet::new();
        for candidate in &candidates {
            if !candidate.visible {
                continue;
            }
            let Some(title) = classify(&candidate.text, &self.tracker.contacted_marker) else {
                continue;
            };
            if seen.insert(title.clone()) {
                titles.push(title);
            }
        }

        info!(
            candidates = candidates.len(),
            titles = titles.len(),
            "Scan pass collected titles"
        );
        Ok(titles)
    }
}

/// Linear backoff: attempt N waits N x the base delay.
fn backoff_delay(attempt: u32, base_ms: u64) -> Duration {
    Duration::from_millis(base_ms.saturating_mul(attempt as u64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use taskwatch_browser::{Candidate, ListWait};

    fn fast_config(max_retries: u32) -> ScannerConfig {
        ScannerConfig {
            max_retries,
            retry_delay_ms: 1,
            click_settle_ms: 0,
            option_pre_delay_ms: 0,
            option_settle_ms: 0,
            list_timeout_secs: 1,
            render_settle_ms: 0,
        }
    }

    fn candidate(text: &str) -> Candidate {
        Candidate {
            text: text.to_string(),
            visible: true,
            leaf: true,
        }
    }

    /// Page where every click succeeds and the list holds fixed candidates.
    struct ListedPage {
        candidates: Vec<Candidate>,
    }

    #[async_trait]
    impl PageDriver for ListedPage {
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
            Ok(ListWait::Mutation)
        }

        async fn collect_candidates(&self, _selectors: &[&str]) -> Result<Vec<Candidate>> {
            Ok(self.candidates.clone())
        }
    }

    /// Page where nothing is ever clickable; every scan pass fails.
    struct DeadPage {
        passes: AtomicU32,
    }

    #[async_trait]
    impl PageDriver for DeadPage {
        async fn click_selector(&self, _selector: &str) -> Result<bool> {
            Ok(false)
        }

        async fn click_containing(&self, text: &str, _tags: &[&str]) -> Result<bool> {
            // The text strategy is the last one tried per pass, so counting it
            // counts scan passes.
            if text == "Saved searches" {
                self.passes.fetch_add(1, Ordering::SeqCst);
            }
            Ok(false)
        }

        async fn await_list_render(
            &self,
            _selectors: &[&str],
            _timeout: Duration,
            _render_settle: Duration,
        ) -> Result<ListWait> {
            Ok(ListWait::TimedOut)
        }

        async fn collect_candidates(&self, _selectors: &[&str]) -> Result<Vec<Candidate>> {
            Ok(vec![])
        }
    }

    /// Page whose first click blocks until released, to hold a scan open.
    struct GatedPage {
        gate: tokio::sync::Semaphore,
    }

    #[async_trait]
    impl PageDriver for GatedPage {
        async fn click_selector(&self, _selector: &str) -> Result<bool> {
            let _permit = self.gate.acquire().await.expect("gate closed");
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
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn test_scan_collects_ordered_deduplicated_titles() {
        let page = ListedPage {
            candidates: vec![
                candidate("1. Chase missing payment"),
                candidate("Call supplier about invoice"),
                candidate("Chase missing payment"),
                candidate("Client B — Contacted"),
                candidate("OK"),
            ],
        };
        let scanner = Scanner::new(TrackerConfig::default(), fast_config(3));

        let event = scanner.run(&page).await.expect("not dropped");
        match event {
            ScanEvent::TitleReport { titles, .. } => {
                assert_eq!(
                    titles,
                    vec![
                        "Chase missing payment".to_string(),
                        "Call supplier about invoice".to_string(),
                    ]
                );
            }
            other => panic!("expected title report, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_invisible_candidates_are_skipped() {
        let mut hidden = candidate("Hidden but plausible task title");
        hidden.visible = false;
        let page = ListedPage {
            candidates: vec![hidden, candidate("Visible task title")],
        };
        let scanner = Scanner::new(TrackerConfig::default(), fast_config(1));

        match scanner.run(&page).await.expect("not dropped") {
            ScanEvent::TitleReport { titles, .. } => {
                assert_eq!(titles, vec!["Visible task title".to_string()]);
            }
            other => panic!("expected title report, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_failing_scan_attempts_exactly_max_retries_then_one_error() {
        let page = DeadPage {
            passes: AtomicU32::new(0),
        };
        let scanner = Scanner::new(TrackerConfig::default(), fast_config(10));

        let event = scanner.run(&page).await.expect("not dropped");
        assert!(matches!(event, ScanEvent::ErrorReport { .. }));
        assert_eq!(page.passes.load(Ordering::SeqCst), 10);
    }

    #[tokio::test]
    async fn test_backoff_delays_increase_linearly() {
        let base = 1000;
        let mut previous = Duration::ZERO;
        for attempt in 1..=10 {
            let delay = backoff_delay(attempt, base);
            assert_eq!(delay, Duration::from_millis(base * attempt as u64));
            assert!(delay > previous);
            previous = delay;
        }
    }

    #[tokio::test]
    async fn test_trigger_during_scan_is_dropped() {
        let page = Arc::new(GatedPage {
            gate: tokio::sync::Semaphore::new(0),
        });
        let scanner = Arc::new(Scanner::new(TrackerConfig::default(), fast_config(1)));

        let first = {
            let scanner = scanner.clone();
            let page = page.clone();
            tokio::spawn(async move { scanner.run(page.as_ref()).await })
        };

        // Let the first scan reach the gated click.
        tokio::task::yield_now().await;

        // A second trigger while the first is in flight is dropped.
        assert!(scanner.run(page.as_ref()).await.is_none());

        // Release the first scan; it completes and frees the state machine.
        page.gate.add_permits(10);
        assert!(first.await.unwrap().is_some());

        // Once idle again, a new trigger is accepted.
        assert!(scanner.run(page.as_ref()).await.is_some());
    }
}
