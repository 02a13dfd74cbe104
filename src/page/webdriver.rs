use super::{ElementHandle, ElementInfo, PageHandle};
use crate::error::{ProbeError, Result};
use async_trait::async_trait;
use fantoccini::elements::Element;
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::{Value, json};
use std::time::{Duration, Instant};

/// Installs a `console.error` / `window.onerror` recorder on the current document.
const CONSOLE_HOOK: &str = r#"
    if (!window.__probeConsoleHook) {
        window.__probeConsoleHook = true;
        window.__probeErrors = [];
        const originalError = console.error;
        console.error = function(...args) {
            window.__probeErrors.push(args.map(a => String(a)).join(' '));
            originalError.apply(console, args);
        };
        window.addEventListener('error', e => window.__probeErrors.push(String(e.message)));
    }
"#;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// [`PageHandle`] backed by a WebDriver session
pub struct WebDriverPage {
    client: Client,
    closed: bool,
}

impl WebDriverPage {
    /// Open a new session, trying common local driver ports when `webdriver_url` is unreachable
    pub async fn connect(webdriver_url: &str, headless: bool) -> Result<Self> {
        let caps = capabilities(headless);

        let first_error = match ClientBuilder::native()
            .capabilities(caps.clone())
            .connect(webdriver_url)
            .await
        {
            Ok(client) => {
                ::log::debug!("Connected to WebDriver at {}", webdriver_url);
                return Ok(Self::from_client(client));
            }
            Err(e) => {
                ::log::error!("Failed to connect to WebDriver at {}: {}", webdriver_url, e);
                e
            }
        };

        let fallback_urls = [
            "http://localhost:9515", // ChromeDriver default
            "http://localhost:4723", // Appium default
            "http://localhost:9222", // Chrome debug port default
            "http://127.0.0.1:4444",
        ];

        for url in fallback_urls.iter().filter(|url| **url != webdriver_url) {
            ::log::info!("Trying fallback WebDriver URL: {}", url);
            if let Ok(client) = ClientBuilder::native()
                .capabilities(caps.clone())
                .connect(url)
                .await
            {
                ::log::debug!("Connected to fallback WebDriver at {}", url);
                return Ok(Self::from_client(client));
            }
        }

        ::log::error!(
            "Make sure a WebDriver server is running or set the WEBDRIVER_URL environment variable"
        );
        Err(ProbeError::Session(first_error))
    }

    /// Wrap an already established session
    pub fn from_client(client: Client) -> Self {
        Self {
            client,
            closed: false,
        }
    }

    async fn install_console_hook(&self) {
        if let Err(e) = self.client.execute(CONSOLE_HOOK, vec![]).await {
            ::log::debug!("Could not install console hook: {}", e);
        }
    }

    async fn resolve(&self, handle: &ElementHandle) -> Result<Element> {
        let candidates = match &handle.scope {
            Some((scope_selector, scope_index)) => {
                let scopes = self.client.find_all(Locator::Css(scope_selector)).await?;
                let scope = scopes.into_iter().nth(*scope_index).ok_or_else(|| {
                    ProbeError::NotFound(format!("{}[{}]", scope_selector, scope_index))
                })?;
                scope.find_all(Locator::Css(&handle.selector)).await?
            }
            None => self.client.find_all(Locator::Css(&handle.selector)).await?,
        };

        candidates
            .into_iter()
            .nth(handle.index)
            .ok_or_else(|| ProbeError::NotFound(format!("{}[{}]", handle.selector, handle.index)))
    }

    async fn describe_all(
        &self,
        elements: Vec<Element>,
        make_handle: impl Fn(usize) -> ElementHandle,
    ) -> Result<Vec<ElementInfo>> {
        let mut infos = Vec::with_capacity(elements.len());
        for (index, element) in elements.into_iter().enumerate() {
            infos.push(describe(&element, make_handle(index)).await?);
        }
        Ok(infos)
    }

    async fn dom_size(&self) -> Option<u64> {
        self.client
            .execute("return document.getElementsByTagName('*').length;", vec![])
            .await
            .ok()
            .and_then(|v| v.as_u64())
    }
}

fn capabilities(headless: bool) -> serde_json::Map<String, Value> {
    let mut args = vec![
        "--no-sandbox".to_string(),
        "--disable-setuid-sandbox".to_string(),
        "--disable-dev-shm-usage".to_string(),
    ];
    if headless {
        args.push("--headless=new".to_string());
    }

    let mut caps = serde_json::Map::new();
    caps.insert("goog:chromeOptions".to_string(), json!({ "args": args }));
    caps
}

async fn describe(element: &Element, handle: ElementHandle) -> Result<ElementInfo> {
    let text = element.text().await?;
    Ok(ElementInfo {
        handle,
        tag: element.tag_name().await?.to_lowercase(),
        text: text.split_whitespace().collect::<Vec<_>>().join(" "),
        value: element.attr("value").await?,
        aria_label: element.attr("aria-label").await?,
        href: element.attr("href").await?,
        input_type: element.attr("type").await?,
        visible: element.is_displayed().await?,
    })
}

#[async_trait]
impl PageHandle for WebDriverPage {
    async fn goto(&mut self, url: &str) -> Result<()> {
        ::log::info!("Navigating to {}", url);
        self.client.goto(url).await?;
        self.install_console_hook().await;
        Ok(())
    }

    async fn wait_for_network_idle(&mut self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            let ready = self
                .client
                .execute("return document.readyState === 'complete';", vec![])
                .await
                .ok()
                .and_then(|v| v.as_bool())
                .unwrap_or(false);
            if ready {
                self.install_console_hook().await;
                return Ok(());
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
        ::log::warn!("Page not idle after {:?}, continuing", timeout);
        Ok(())
    }

    async fn settle(&mut self, max: Duration) -> Result<()> {
        // Stable once the element count is unchanged across several polls.
        let deadline = Instant::now() + max;
        let mut last = self.dom_size().await;
        let mut stable_polls = 0;
        while Instant::now() < deadline {
            tokio::time::sleep(POLL_INTERVAL * 2).await;
            let current = self.dom_size().await;
            if current.is_some() && current == last {
                stable_polls += 1;
                if stable_polls >= 3 {
                    break;
                }
            } else {
                stable_polls = 0;
            }
            last = current;
        }
        self.install_console_hook().await;
        Ok(())
    }

    async fn query(&mut self, selector: &str) -> Result<Vec<ElementInfo>> {
        let elements = self.client.find_all(Locator::Css(selector)).await?;
        self.describe_all(elements, |index| ElementHandle::new(selector, index))
            .await
    }

    async fn query_within(
        &mut self,
        scope: &ElementHandle,
        selector: &str,
    ) -> Result<Vec<ElementInfo>> {
        let scope_element = self.resolve(scope).await?;
        let elements = scope_element.find_all(Locator::Css(selector)).await?;
        self.describe_all(elements, |index| {
            ElementHandle::within(scope, selector, index)
        })
        .await
    }

    async fn click(&mut self, element: &ElementHandle) -> Result<()> {
        self.resolve(element).await?.click().await?;
        Ok(())
    }

    async fn fill(&mut self, element: &ElementHandle, value: &str) -> Result<()> {
        let element = self.resolve(element).await?;
        element.clear().await?;
        element.send_keys(value).await?;
        Ok(())
    }

    async fn screenshot(&mut self) -> Result<Vec<u8>> {
        let original = self.client.get_window_size().await?;
        let full = self
            .client
            .execute(
                "return [document.documentElement.scrollWidth, document.documentElement.scrollHeight];",
                vec![],
            )
            .await?;

        let dims = full
            .as_array()
            .map(|a| a.iter().filter_map(Value::as_u64).collect::<Vec<_>>())
            .unwrap_or_default();

        let resized = match dims.as_slice() {
            [w, h] if *h > original.1 => {
                let width = (*w).max(original.0) as u32;
                self.client.set_window_size(width, *h as u32).await.is_ok()
            }
            _ => false,
        };

        let png = self.client.screenshot().await;

        if resized {
            if let Err(e) = self
                .client
                .set_window_size(original.0 as u32, original.1 as u32)
                .await
            {
                ::log::warn!("Failed to restore window size: {}", e);
            }
        }

        Ok(png?)
    }

    async fn current_url(&mut self) -> Result<String> {
        Ok(self.client.current_url().await?.to_string())
    }

    async fn title(&mut self) -> Result<String> {
        Ok(self.client.title().await?)
    }

    async fn content(&mut self) -> Result<String> {
        Ok(self.client.source().await?)
    }

    async fn viewport_size(&mut self) -> Result<Option<(u32, u32)>> {
        let value = self
            .client
            .execute("return [window.innerWidth, window.innerHeight];", vec![])
            .await?;
        let size = value.as_array().and_then(|a| match a.as_slice() {
            [w, h] => Some((w.as_u64()? as u32, h.as_u64()? as u32)),
            _ => None,
        });
        Ok(size)
    }

    async fn console_errors(&mut self) -> Result<Vec<String>> {
        let value = self
            .client
            .execute("return window.__probeErrors || [];", vec![])
            .await?;
        Ok(value
            .as_array()
            .map(|a| {
                a.iter()
                    .filter_map(|v| v.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn clear_storage(&mut self) -> Result<()> {
        self.client.delete_all_cookies().await?;
        self.client
            .execute(
                "try { localStorage.clear(); sessionStorage.clear(); } catch (e) {}",
                vec![],
            )
            .await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.client.clone().close().await?;
        ::log::debug!("WebDriver session closed");
        Ok(())
    }
}
