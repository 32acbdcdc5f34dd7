//! User-facing notifications: the delivery trait, the grouping policy for a
//! batch of new titles, and the platform desktop backend.

pub mod desktop;

pub use desktop::DesktopNotifier;

use async_trait::async_trait;
use taskwatch_core::Result;

/// A grouped notification lists at most this many titles; the rest are
/// summarized in a follow-up notification.
pub const GROUP_LIMIT: usize = 5;

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Display a simple notification.
    async fn notify(&self, title: &str, message: &str) -> Result<()>;

    /// Display a grouped notification with itemized lines.
    async fn notify_list(&self, title: &str, items: &[String], message: &str) -> Result<()>;
}

/// Presentation policy for newly found titles: exactly one title gets a
/// simple notification carrying it; multiple titles get one grouped
/// notification listing the first [`GROUP_LIMIT`], plus an overflow summary
/// when there are more.
pub async fn raise_notifications(notifier: &dyn Notifier, titles: &[String]) -> Result<()> {
    match titles.len() {
        0 => Ok(()),
        1 => notifier.notify("New Task Found", &titles[0]).await,
        n => {
            let listed: Vec<String> = titles.iter().take(GROUP_LIMIT).cloned().collect();
            notifier
                .notify_list(
                    &format!("{} New Tasks Found", n),
                    &listed,
                    "Tasks without \"Contacted\" text:",
                )
                .await?;

            if n > GROUP_LIMIT {
                let remaining = n - GROUP_LIMIT;
                notifier
                    .notify(
                        &format!("{} More Tasks", remaining),
                        &format!("And {} more tasks found...", remaining),
                    )
                    .await?;
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Debug, PartialEq)]
    enum Sent {
        Simple { title: String, message: String },
        Grouped { title: String, items: Vec<String> },
    }

    #[derive(Default)]
    struct Recorder {
        sent: Mutex<Vec<Sent>>,
    }

    #[async_trait]
    impl Notifier for Recorder {
        async fn notify(&self, title: &str, message: &str) -> Result<()> {
            self.sent.lock().unwrap().push(Sent::Simple {
                title: title.to_string(),
                message: message.to_string(),
            });
            Ok(())
        }

        async fn notify_list(&self, title: &str, items: &[String], _message: &str) -> Result<()> {
            self.sent.lock().unwrap().push(Sent::Grouped {
                title: title.to_string(),
                items: items.to_vec(),
            });
            Ok(())
        }
    }

    fn titles(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("Task {}", i)).collect()
    }

    #[tokio::test]
    async fn test_no_titles_sends_nothing() {
        let recorder = Recorder::default();
        raise_notifications(&recorder, &[]).await.unwrap();
        assert!(recorder.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_single_title_sends_one_simple_notification() {
        let recorder = Recorder::default();
        raise_notifications(&recorder, &titles(1)).await.unwrap();

        let sent = recorder.sent.lock().unwrap();
        assert_eq!(
            *sent,
            vec![Sent::Simple {
                title: "New Task Found".to_string(),
                message: "Task 1".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_seven_titles_send_group_of_five_plus_overflow_of_two() {
        let recorder = Recorder::default();
        raise_notifications(&recorder, &titles(7)).await.unwrap();

        let sent = recorder.sent.lock().unwrap();
        assert_eq!(sent.len(), 2);
        match &sent[0] {
            Sent::Grouped { title, items } => {
                assert_eq!(title, "7 New Tasks Found");
                assert_eq!(items.len(), 5);
                assert_eq!(items[0], "Task 1");
                assert_eq!(items[4], "Task 5");
            }
            other => panic!("expected grouped notification, got {:?}", other),
        }
        match &sent[1] {
            Sent::Simple { title, message } => {
                assert_eq!(title, "2 More Tasks");
                assert!(message.contains("2 more tasks"));
            }
            other => panic!("expected overflow notification, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_five_titles_send_group_without_overflow() {
        let recorder = Recorder::default();
        raise_notifications(&recorder, &titles(5)).await.unwrap();

        let sent = recorder.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert!(matches!(&sent[0], Sent::Grouped { items, .. } if items.len() == 5));
    }
}
