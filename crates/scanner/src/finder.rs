//! Finder strategies for named controls on an uncontrolled page.
//!
//! Selector fragility is inherent to the domain, so each control is located
//! through an ordered chain of strategies tried until one yields a clickable
//! element: attribute selectors first, then free-text containment search
//! across candidate tag names.

use taskwatch_core::Result;
use taskwatch_browser::PageDriver;
use tracing::debug;

/// One way of locating and activating a control.
#[derive(Debug, Clone)]
pub enum Finder {
    /// CSS selector match.
    Selector(String),
    /// Case-insensitive text containment over candidate tag names.
    TextContains { text: String, tags: Vec<String> },
}

impl Finder {
    /// Try to click the element this strategy describes. `Ok(false)` means
    /// nothing clickable matched; the caller moves on to the next strategy.
    pub async fn activate(&self, page: &dyn PageDriver) -> Result<bool> {
        match self {
            Finder::Selector(selector) => page.click_selector(selector).await,
            Finder::TextContains { text, tags } => {
                let tag_refs: Vec<&str> = tags.iter().map(|s| s.as_str()).collect();
                page.click_containing(text, &tag_refs).await
            }
        }
    }
}

fn text_contains(text: &str, tags: &[&str]) -> Finder {
    Finder::TextContains {
        text: text.to_string(),
        tags: tags.iter().map(|s| s.to_string()).collect(),
    }
}

/// Strategies for the saved-searches control, most specific first.
pub fn saved_searches_finders(text: &str) -> Vec<Finder> {
    vec![
        Finder::Selector(format!("[aria-label*=\"{}\"]", text)),
        Finder::Selector(format!("[title*=\"{}\"]", text)),
        Finder::Selector(
            "a[href*=\"saved\"], button[title*=\"saved\"], .saved-searches".to_string(),
        ),
        text_contains(text, &["span", "div", "li", "a", "button"]),
    ]
}

/// Strategies for the saved-search option inside the opened panel.
pub fn filter_option_finders(text: &str) -> Vec<Finder> {
    vec![
        Finder::Selector(format!("[aria-label*=\"{}\"]", text)),
        Finder::Selector(format!("[title*=\"{}\"]", text)),
        Finder::Selector(format!("option[value*=\"{}\"]", text)),
        text_contains(text, &["li", "div", "span", "button", "a", "option"]),
    ]
}

/// Walk the strategies in order; the first that activates a clickable element
/// wins. Strategy errors (bad selector, page hiccup) skip to the next one.
pub async fn activate_first(page: &dyn PageDriver, finders: &[Finder]) -> Result<bool> {
    for finder in finders {
        match finder.activate(page).await {
            Ok(true) => return Ok(true),
            Ok(false) => continue,
            Err(e) => {
                debug!(strategy = ?finder, error = %e, "Finder strategy failed");
                continue;
            }
        }
    }
    Ok(false)
}
