use std::io::{self, Write};

use taskwatch_core::Paths;
use taskwatch_store::{HistoryStore, NotifiedStore};

pub async fn run(force: bool) -> anyhow::Result<()> {
    if !force {
        print!("Clear the notification history? Previously notified tasks will notify again. [y/N] ");
        io::stdout().flush()?;

        let mut answer = String::new();
        io::stdin().read_line(&mut answer)?;
        if !matches!(answer.trim().to_lowercase().as_str(), "y" | "yes") {
            println!("Aborted.");
            return Ok(());
        }
    }

    let paths = Paths::new();
    paths.ensure_dirs()?;

    let mut notified = NotifiedStore::load(paths.notified_file()).await?;
    let cleared = notified.len();
    notified.clear().await?;

    let mut history = HistoryStore::load(paths.history_file()).await?;
    history.clear().await?;

    println!("Cleared {} notified titles and the task history.", cleared);
    Ok(())
}
