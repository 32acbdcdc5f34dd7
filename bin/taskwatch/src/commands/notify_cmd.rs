use taskwatch_core::{Config, Paths};
use taskwatch_notify::{DesktopNotifier, Notifier};

pub async fn run(message: Option<String>) -> anyhow::Result<()> {
    let paths = Paths::new();
    let config = Config::load_or_default(&paths)?;

    let body = message
        .unwrap_or_else(|| "This is a test notification from taskwatch.".to_string());

    let notifier = DesktopNotifier::new(&config.notifications.sound);
    notifier.notify("Test Notification", &body).await?;

    println!("Test notification sent.");
    Ok(())
}
