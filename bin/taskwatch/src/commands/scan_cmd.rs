use std::sync::Arc;
use std::time::Duration;

use taskwatch_browser::{Browser, CdpTabs, Tabs};
use taskwatch_core::{Config, Paths, ScanEvent};
use taskwatch_notify::DesktopNotifier;
use taskwatch_scanner::Scanner;
use taskwatch_service::ReportService;

/// One manual refresh cycle, waiting for the scan to finish instead of
/// leaving it to the timer.
pub async fn run() -> anyhow::Result<()> {
    let paths = Paths::new();
    paths.ensure_dirs()?;
    let config = Config::load_or_default(&paths)?;

    if config.tracker.url_match.is_empty() {
        anyhow::bail!(
            "tracker.urlMatch is not set; edit {} first",
            paths.config_file().display()
        );
    }

    let mut browser = Browser::attach_or_launch(&config.browser, &paths).await?;
    let tabs = CdpTabs::new(browser.debug_port, &config.tracker.url_match);

    let all_tabs = tabs.list().await?;
    let Some(pinned) = all_tabs.into_iter().find(|t| t.pinned) else {
        println!("No pinned tab found; nothing to scan.");
        return Ok(());
    };

    println!("Refreshing {} ...", pinned.url);
    tabs.reload(&pinned.id).await?;
    tokio::time::sleep(Duration::from_millis(config.tracker.reload_settle_ms)).await;

    let scanner = Scanner::new(config.tracker.clone(), config.scanner.clone());
    let page = tabs.page(&pinned.id).await?;

    let notifier = Arc::new(DesktopNotifier::new(&config.notifications.sound));
    let report = ReportService::load(&paths, notifier, config.notifications.enabled).await?;
    report
        .record_check(chrono::Utc::now().timestamp_millis())
        .await;

    match scanner.run(page.as_ref()).await {
        Some(ScanEvent::TitleReport { titles, .. }) => {
            let known_before = report.known_title_count().await;
            let count = titles.len();
            report.handle(ScanEvent::titles(titles)).await;
            let new = report.known_title_count().await - known_before;
            println!("Scan collected {} titles ({} new).", count, new);
        }
        Some(ScanEvent::ErrorReport { error, .. }) => {
            println!("Scan failed: {}", error);
        }
        None => {
            println!("A scan is already in progress.");
        }
    }

    if browser.is_managed() {
        browser.close().await;
    }

    Ok(())
}
