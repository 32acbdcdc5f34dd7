//! Platform-native desktop notifications.
//!
//! macOS goes through `osascript` (Notification Center); Linux through
//! `notify-send`; other platforms are a logged no-op.

use async_trait::async_trait;
use taskwatch_core::Result;
use tracing::info;

use crate::Notifier;

pub struct DesktopNotifier {
    /// Notification sound name (macOS only).
    sound: String,
}

impl DesktopNotifier {
    pub fn new(sound: &str) -> Self {
        Self {
            sound: sound.to_string(),
        }
    }
}

#[async_trait]
impl Notifier for DesktopNotifier {
    async fn notify(&self, title: &str, message: &str) -> Result<()> {
        send_platform_notification(title, message, &self.sound).await?;
        info!(title = %title, "Notification sent");
        Ok(())
    }

    async fn notify_list(&self, title: &str, items: &[String], message: &str) -> Result<()> {
        // Neither backend has a native list form; render the items as
        // bulleted lines in the body.
        let mut body = String::from(message);
        for item in items {
            body.push('\n');
            body.push_str("• ");
            body.push_str(item);
        }
        send_platform_notification(title, &body, &self.sound).await?;
        info!(title = %title, items = items.len(), "Grouped notification sent");
        Ok(())
    }
}

#[cfg(target_os = "macos")]
async fn send_platform_notification(title: &str, message: &str, sound: &str) -> Result<()> {
    use taskwatch_core::Error;

    let escaped_msg = message.replace('\\', "\\\\").replace('"', "\\\"");
    let escaped_title = title.replace('\\', "\\\\").replace('"', "\\\"");
    let escaped_sound = sound.replace('\\', "\\\\").replace('"', "\\\"");

    let script = format!(
        r#"display notification "{}" with title "{}" sound name "{}""#,
        escaped_msg, escaped_title, escaped_sound
    );

    let output = tokio::process::Command::new("osascript")
        .arg("-e")
        .arg(&script)
        .output()
        .await
        .map_err(|e| Error::Notify(format!("osascript failed: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::Notify(format!("osascript error: {}", stderr)));
    }
    Ok(())
}

#[cfg(target_os = "linux")]
async fn send_platform_notification(title: &str, message: &str, _sound: &str) -> Result<()> {
    use taskwatch_core::Error;

    if which::which("notify-send").is_err() {
        tracing::debug!("notify-send not found, skipping notification");
        return Ok(());
    }

    let output = tokio::process::Command::new("notify-send")
        .arg(title)
        .arg(message)
        .output()
        .await
        .map_err(|e| Error::Notify(format!("notify-send failed: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::Notify(format!("notify-send error: {}", stderr)));
    }
    Ok(())
}

#[cfg(not(any(target_os = "macos", target_os = "linux")))]
async fn send_platform_notification(_title: &str, _message: &str, _sound: &str) -> Result<()> {
    tracing::debug!("desktop notifications unsupported on this platform");
    Ok(())
}
