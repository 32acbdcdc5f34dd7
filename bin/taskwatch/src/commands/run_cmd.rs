use std::sync::Arc;
use std::time::Duration;

use taskwatch_browser::{Browser, CdpTabs};
use taskwatch_core::{Config, Paths};
use taskwatch_notify::DesktopNotifier;
use taskwatch_scanner::Scanner;
use taskwatch_service::{RefreshService, ReportService, ScanMessage};
use tokio::sync::{broadcast, mpsc};
use tracing::info;

/// Start the watcher daemon: attach to (or launch) a browser, then run the
/// refresh timer and the report handler until Ctrl-C.
pub async fn run() -> anyhow::Result<()> {
    let paths = Paths::new();
    paths.ensure_dirs()?;
    let config = Config::load_or_default(&paths)?;

    if config.tracker.url_match.is_empty() {
        println!("⚠ tracker.urlMatch is not set; no tab will be watched.");
        println!("  Edit {} and set it first.", paths.config_file().display());
    }

    let mut browser = Browser::attach_or_launch(&config.browser, &paths).await?;

    let tabs = Arc::new(CdpTabs::new(
        browser.debug_port,
        &config.tracker.url_match,
    ));
    let scanner = Arc::new(Scanner::new(
        config.tracker.clone(),
        config.scanner.clone(),
    ));
    let notifier = Arc::new(DesktopNotifier::new(&config.notifications.sound));
    let report = Arc::new(
        ReportService::load(&paths, notifier, config.notifications.enabled).await?,
    );

    let (events_tx, events_rx) = mpsc::channel::<ScanMessage>(16);
    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    let report_handle = tokio::spawn(
        report
            .clone()
            .run_loop(events_rx, shutdown_tx.subscribe()),
    );

    let refresh = Arc::new(RefreshService::new(
        tabs,
        scanner,
        report,
        events_tx,
        Duration::from_secs(config.tracker.refresh_interval_secs),
        Duration::from_millis(config.tracker.reload_settle_ms),
    ));
    let refresh_handle = tokio::spawn(refresh.run_loop(shutdown_tx.subscribe()));

    info!("taskwatch running; press Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested");

    let _ = shutdown_tx.send(());
    let _ = refresh_handle.await;
    let _ = report_handle.await;

    if browser.is_managed() {
        browser.close().await;
    }

    Ok(())
}
