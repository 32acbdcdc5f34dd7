use taskwatch_browser::{CdpTabs, Tabs};
use taskwatch_core::{Config, Paths};
use taskwatch_store::{HistoryStore, NotifiedStore};

use super::format_relative;

pub async fn run() -> anyhow::Result<()> {
    let paths = Paths::new();

    println!("taskwatch status");
    println!("================");
    println!();

    let config_path = paths.config_file();
    let config_exists = config_path.exists();
    println!(
        "Config:   {} {}",
        config_path.display(),
        if config_exists { "✓" } else { "✗ (not found)" }
    );

    if !config_exists {
        println!();
        println!("Run `taskwatch onboard` to initialize.");
        return Ok(());
    }

    let config = Config::load(&config_path)?;

    println!("Tracker:  {}", describe_tracker(&config));
    println!("Interval: every {}s", config.tracker.refresh_interval_secs);
    println!();

    // Pinned tabs, if a browser is reachable.
    let tabs = CdpTabs::new(config.browser.debug_port, &config.tracker.url_match);
    match tabs.list().await {
        Ok(tabs) => {
            let pinned = tabs.iter().filter(|t| t.pinned).count();
            println!("Browser:  ✓ reachable on port {}", config.browser.debug_port);
            println!("Tabs:     {} open, {} pinned", tabs.len(), pinned);
            if pinned == 0 {
                println!("          ⚠ no tab matches tracker.urlMatch; nothing will be watched");
            }
        }
        Err(_) => {
            println!(
                "Browser:  ✗ nothing listening on port {}",
                config.browser.debug_port
            );
        }
    }
    println!();

    // Persisted state.
    let notified = NotifiedStore::load(paths.notified_file()).await?;
    let history = HistoryStore::load(paths.history_file()).await?;
    let now_ms = chrono::Utc::now().timestamp_millis();

    println!("Tasks seen:  {}", notified.len());
    match history.last_check_ms() {
        Some(ts) => println!("Last check:  {}", format_relative(now_ms, ts)),
        None => println!("Last check:  Never"),
    }

    Ok(())
}

fn describe_tracker(config: &Config) -> String {
    if config.tracker.url_match.is_empty() {
        "✗ tracker.urlMatch not set".to_string()
    } else {
        format!("urls containing \"{}\"", config.tracker.url_match)
    }
}
