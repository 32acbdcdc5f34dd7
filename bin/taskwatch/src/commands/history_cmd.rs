use taskwatch_core::Paths;
use taskwatch_store::HistoryStore;

use super::format_relative;

pub async fn run(limit: usize) -> anyhow::Result<()> {
    let paths = Paths::new();
    let history = HistoryStore::load(paths.history_file()).await?;
    let now_ms = chrono::Utc::now().timestamp_millis();

    let recent = history.recent(now_ms, limit);
    if recent.is_empty() {
        println!("No tasks found in the last 24 hours.");
        return Ok(());
    }

    println!("Recent tasks");
    println!("============");
    for entry in recent {
        println!(
            "  {:<10} {}",
            format_relative(now_ms, entry.timestamp_ms),
            entry.title
        );
    }

    Ok(())
}
