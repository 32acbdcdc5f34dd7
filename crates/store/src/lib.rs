//! Durable state: the set of already-notified titles and the task history
//! shown by the status commands.

pub mod history;
pub mod notified;

pub use history::{HistoryEntry, HistoryStore};
pub use notified::NotifiedStore;
