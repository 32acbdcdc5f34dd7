//! Browser collaborators: tab listing/reload and in-page driving over the
//! Chrome DevTools Protocol.
//!
//! The scan logic depends only on the [`Tabs`] and [`PageDriver`] traits;
//! the CDP-backed implementations live in [`tabs`] and [`page`].

pub mod cdp;
pub mod chrome;
pub mod page;
pub mod tabs;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use taskwatch_core::Result;

pub use chrome::Browser;
pub use tabs::CdpTabs;

/// One open page target, in tab-strip order.
#[derive(Debug, Clone)]
pub struct TabRecord {
    pub id: String,
    pub url: String,
    pub title: String,
    /// Whether this tab is the designated watch target.
    pub pinned: bool,
}

/// Raw page text under consideration as a task title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub text: String,
    pub visible: bool,
    /// No child elements, i.e. a leaf of displayed content.
    pub leaf: bool,
}

/// How a task-list wait resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListWait {
    /// A DOM mutation added substantial content.
    Mutation,
    /// A structural selector already matched.
    Present,
    /// Nothing showed up before the deadline. Not an error; the page may
    /// simply render nothing for the selected filter.
    TimedOut,
}

/// Tab management: list open tabs, reload one, attach a page driver to one.
#[async_trait]
pub trait Tabs: Send + Sync {
    async fn list(&self) -> Result<Vec<TabRecord>>;
    async fn reload(&self, tab_id: &str) -> Result<()>;
    async fn page(&self, tab_id: &str) -> Result<Box<dyn PageDriver>>;
}

/// In-page operations the scanner needs. Each maps to one JavaScript
/// evaluation in the tab; nothing else about the page is assumed.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Click the first clickable element matching a CSS selector.
    /// Returns false when nothing matching is clickable.
    async fn click_selector(&self, selector: &str) -> Result<bool>;

    /// Click the first clickable element among `tags` whose text contains
    /// `text` (case-insensitive).
    async fn click_containing(&self, text: &str, tags: &[&str]) -> Result<bool>;

    /// Wait until the task list materializes: a mutation adds substantial
    /// content, one of `selectors` already matches, or `timeout` elapses.
    async fn await_list_render(
        &self,
        selectors: &[&str],
        timeout: Duration,
        render_settle: Duration,
    ) -> Result<ListWait>;

    /// Enumerate candidate elements via the first of `selectors` that yields
    /// at least one match, falling back to visible leaf elements with text in
    /// a plausible length range.
    async fn collect_candidates(&self, selectors: &[&str]) -> Result<Vec<Candidate>>;
}
