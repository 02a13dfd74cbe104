//! Page automation capability consumed by the crawl and verification code.
//!
//! Elements are addressed positionally: a CSS selector plus the element's index
//! in document order, optionally nested inside one scoping element (a form).

pub mod webdriver;

use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;

pub use webdriver::WebDriverPage;

/// Position of an element the page can act on
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementHandle {
    /// Scoping element as `(selector, index)`, if the query was nested
    pub scope: Option<(String, usize)>,
    /// Selector the element was found with
    pub selector: String,
    /// Index of the element among the selector's matches
    pub index: usize,
}

impl ElementHandle {
    pub fn new(selector: &str, index: usize) -> Self {
        Self {
            scope: None,
            selector: selector.to_string(),
            index,
        }
    }

    pub fn within(scope: &ElementHandle, selector: &str, index: usize) -> Self {
        Self {
            scope: Some((scope.selector.clone(), scope.index)),
            selector: selector.to_string(),
            index,
        }
    }
}

/// Snapshot of an element's readable state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementInfo {
    pub handle: ElementHandle,
    /// Lowercase tag name
    pub tag: String,
    /// Visible text with whitespace collapsed
    pub text: String,
    pub value: Option<String>,
    pub aria_label: Option<String>,
    pub href: Option<String>,
    pub input_type: Option<String>,
    pub visible: bool,
}

impl ElementInfo {
    /// Visible label: text, then `value`, then `aria-label`
    pub fn label(&self) -> &str {
        if !self.text.trim().is_empty() {
            return self.text.trim();
        }
        if let Some(value) = self.value.as_deref().filter(|v| !v.trim().is_empty()) {
            return value.trim();
        }
        self.aria_label.as_deref().map(str::trim).unwrap_or("")
    }
}

/// Browser page operations needed to crawl and verify a live site
#[async_trait]
pub trait PageHandle: Send {
    /// Navigate to `url`
    async fn goto(&mut self, url: &str) -> Result<()>;

    /// Wait until the page reports it has finished loading, bounded by `timeout`
    async fn wait_for_network_idle(&mut self, timeout: Duration) -> Result<()>;

    /// Wait for client-side rendering to stabilise, never longer than `max`
    async fn settle(&mut self, max: Duration) -> Result<()> {
        tokio::time::sleep(max).await;
        Ok(())
    }

    /// All elements matching `selector`, in document order
    async fn query(&mut self, selector: &str) -> Result<Vec<ElementInfo>>;

    /// Elements matching `selector` inside the element at `scope`
    async fn query_within(
        &mut self,
        scope: &ElementHandle,
        selector: &str,
    ) -> Result<Vec<ElementInfo>>;

    async fn click(&mut self, element: &ElementHandle) -> Result<()>;

    /// Clear the field and type `value` into it
    async fn fill(&mut self, element: &ElementHandle, value: &str) -> Result<()>;

    /// PNG of the full scrollable page
    async fn screenshot(&mut self) -> Result<Vec<u8>>;

    async fn current_url(&mut self) -> Result<String>;

    async fn title(&mut self) -> Result<String>;

    /// Serialized DOM of the current document
    async fn content(&mut self) -> Result<String>;

    async fn viewport_size(&mut self) -> Result<Option<(u32, u32)>>;

    /// Error messages the page logged to its console since the last navigation
    async fn console_errors(&mut self) -> Result<Vec<String>>;

    /// Drop cookies and web storage
    async fn clear_storage(&mut self) -> Result<()> {
        Ok(())
    }

    /// Release the browser session
    async fn close(&mut self) -> Result<()>;
}
