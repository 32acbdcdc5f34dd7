//! CDP-backed page driving.
//!
//! Each operation is one JavaScript evaluation in the tab. Clickability is
//! checked page-side (on-screen, not hidden, accepts pointer events); text
//! extraction returns plain data for the scanner to classify.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use taskwatch_core::{Error, Result};
use tracing::debug;

use crate::cdp::CdpClient;
use crate::{Candidate, ListWait, PageDriver};

const EVAL_TIMEOUT: Duration = Duration::from_secs(30);

pub struct CdpPage {
    cdp: CdpClient,
}

impl CdpPage {
    pub fn new(cdp: CdpClient) -> Self {
        Self { cdp }
    }

    async fn eval(&self, expression: &str, timeout: Duration) -> Result<Value> {
        let result = self.cdp.evaluate_js(expression, timeout).await?;
        if let Some(exc) = result.get("exceptionDetails") {
            let text = exc
                .get("exception")
                .and_then(|e| e.get("description"))
                .and_then(|v| v.as_str())
                .unwrap_or("unknown page exception");
            return Err(Error::Scan(format!("page script threw: {}", text)));
        }
        Ok(result
            .get("result")
            .and_then(|r| r.get("value"))
            .cloned()
            .unwrap_or(Value::Null))
    }
}

/// Quote a string as a JavaScript single-quoted literal.
fn js_str(s: &str) -> String {
    let escaped = s
        .replace('\\', "\\\\")
        .replace('\'', "\\'")
        .replace('\n', "\\n")
        .replace('\r', "\\r");
    format!("'{}'", escaped)
}

/// Serialize a selector list as a JavaScript array literal.
fn js_str_array(items: &[&str]) -> String {
    serde_json::to_string(items).unwrap_or_else(|_| "[]".to_string())
}

#[async_trait]
impl PageDriver for CdpPage {
    async fn click_selector(&self, selector: &str) -> Result<bool> {
        let js = format!(
            r#"(() => {{
    const els = document.querySelectorAll({sel});
    for (const el of els) {{
        const style = window.getComputedStyle(el);
        const clickable = el.offsetParent !== null &&
            style.visibility !== 'hidden' &&
            style.display !== 'none' &&
            style.pointerEvents !== 'none';
        if (!clickable) continue;
        el.scrollIntoView({{block: 'center'}});
        el.click();
        return true;
    }}
    return false;
}})()"#,
            sel = js_str(selector)
        );

        let value = self.eval(&js, EVAL_TIMEOUT).await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn click_containing(&self, text: &str, tags: &[&str]) -> Result<bool> {
        let js = format!(
            r#"(() => {{
    const needle = {needle}.toLowerCase();
    for (const tag of {tags}) {{
        for (const el of document.querySelectorAll(tag)) {{
            if (!(el.textContent || '').toLowerCase().includes(needle)) continue;
            const style = window.getComputedStyle(el);
            const clickable = el.offsetParent !== null &&
                style.visibility !== 'hidden' &&
                style.display !== 'none' &&
                style.pointerEvents !== 'none';
            if (!clickable) continue;
            el.scrollIntoView({{block: 'center'}});
            el.click();
            return true;
        }}
    }}
    return false;
}})()"#,
            needle = js_str(text),
            tags = js_str_array(tags)
        );

        let value = self.eval(&js, EVAL_TIMEOUT).await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn await_list_render(
        &self,
        selectors: &[&str],
        timeout: Duration,
        render_settle: Duration,
    ) -> Result<ListWait> {
        // The whole wait runs page-side as a single promise; the CDP command
        // deadline is padded so the promise owns the timeout.
        let js = format!(
            r#"new Promise((resolve) => {{
    const timer = setTimeout(() => {{
        observer.disconnect();
        resolve('timeout');
    }}, {timeout_ms});
    const observer = new MutationObserver((mutations) => {{
        for (const m of mutations) {{
            if (m.type !== 'childList') continue;
            for (const node of m.addedNodes) {{
                if (node.nodeType === 1 &&
                    ((node.textContent || '').length > 20 ||
                     node.querySelectorAll('*').length > 2)) {{
                    clearTimeout(timer);
                    observer.disconnect();
                    setTimeout(() => resolve('mutation'), {settle_ms});
                    return;
                }}
            }}
        }}
    }});
    observer.observe(document.body, {{childList: true, subtree: true}});
    setTimeout(() => {{
        for (const sel of {selectors}) {{
            if (document.querySelectorAll(sel).length > 0) {{
                clearTimeout(timer);
                observer.disconnect();
                resolve('present');
                return;
            }}
        }}
    }}, 2000);
}})"#,
            timeout_ms = timeout.as_millis(),
            settle_ms = render_settle.as_millis(),
            selectors = js_str_array(selectors)
        );

        let value = self
            .eval(&js, timeout + render_settle + Duration::from_secs(10))
            .await?;

        let outcome = match value.as_str() {
            Some("mutation") => ListWait::Mutation,
            Some("present") => ListWait::Present,
            _ => ListWait::TimedOut,
        };
        debug!(?outcome, "Task list wait resolved");
        Ok(outcome)
    }

    async fn collect_candidates(&self, selectors: &[&str]) -> Result<Vec<Candidate>> {
        let js = format!(
            r#"(() => {{
    let els = [];
    for (const sel of {selectors}) {{
        const found = document.querySelectorAll(sel);
        if (found.length > 0) {{
            els = Array.from(found);
            break;
        }}
    }}
    if (els.length === 0) {{
        els = Array.from(document.querySelectorAll('*')).filter((el) => {{
            const text = (el.textContent || '').trim();
            return text && text.length > 10 && text.length < 200 &&
                !el.querySelector('*') &&
                el.offsetParent !== null;
        }});
    }}
    return els.map((el) => {{
        return {{
            text: (el.textContent || '').trim().slice(0, 1000),
            visible: el.offsetParent !== null,
            leaf: !el.querySelector('*'),
        }};
    }});
}})()"#,
            selectors = js_str_array(selectors)
        );

        let value = self.eval(&js, EVAL_TIMEOUT).await?;
        let candidates: Vec<Candidate> = serde_json::from_value(value)
            .map_err(|e| Error::Scan(format!("parse candidate list: {}", e)))?;
        debug!(count = candidates.len(), "Collected candidate elements");
        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_js_str_escapes_quotes_and_backslashes() {
        assert_eq!(js_str("plain"), "'plain'");
        assert_eq!(js_str("it's"), "'it\\'s'");
        assert_eq!(js_str(r"a\b"), "'a\\\\b'");
        assert_eq!(js_str("a\nb"), "'a\\nb'");
    }

    #[test]
    fn test_js_str_array() {
        assert_eq!(js_str_array(&["tr", ".task"]), r#"["tr",".task"]"#);
        assert_eq!(js_str_array(&[]), "[]");
    }
}
