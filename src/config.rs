use crate::error::{ProbeError, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Hard ceiling on the number of distinct pages one crawl may visit
pub const MAX_PAGES: usize = 5;

/// Configuration for a probe run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// URL for the WebDriver instance
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    /// Whether the browser runs without a window
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Directory screenshots are written to
    #[serde(default = "default_screenshots_dir")]
    pub screenshots_dir: PathBuf,

    /// Root directory of the saved test store
    #[serde(default = "default_store_dir")]
    pub store_dir: PathBuf,

    /// Distinct pages a crawl may visit (clamped to 1..=5)
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,

    /// Settle delay after the first navigation
    #[serde(default = "default_initial_settle_ms")]
    pub initial_settle_ms: u64,

    /// Settle delay after a verification click
    #[serde(default = "default_click_settle_ms")]
    pub click_settle_ms: u64,

    /// Settle delay between crawl steps
    #[serde(default = "default_crawl_settle_ms")]
    pub crawl_settle_ms: u64,

    /// Settle delay after a form submission
    #[serde(default = "default_form_settle_ms")]
    pub form_settle_ms: u64,

    /// Upper bound on any network-idle wait
    #[serde(default = "default_network_idle_timeout_ms")]
    pub network_idle_timeout_ms: u64,
}

fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

fn default_headless() -> bool {
    true
}

fn default_screenshots_dir() -> PathBuf {
    PathBuf::from("public/screenshots")
}

fn default_store_dir() -> PathBuf {
    PathBuf::from("tests")
}

fn default_max_pages() -> usize {
    MAX_PAGES
}

fn default_initial_settle_ms() -> u64 {
    3000
}

fn default_click_settle_ms() -> u64 {
    3000
}

fn default_crawl_settle_ms() -> u64 {
    2000
}

fn default_form_settle_ms() -> u64 {
    2000
}

fn default_network_idle_timeout_ms() -> u64 {
    10_000
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            webdriver_url: default_webdriver_url(),
            headless: default_headless(),
            screenshots_dir: default_screenshots_dir(),
            store_dir: default_store_dir(),
            max_pages: default_max_pages(),
            initial_settle_ms: default_initial_settle_ms(),
            click_settle_ms: default_click_settle_ms(),
            crawl_settle_ms: default_crawl_settle_ms(),
            form_settle_ms: default_form_settle_ms(),
            network_idle_timeout_ms: default_network_idle_timeout_ms(),
        }
    }
}

impl ProbeConfig {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        Self::from_json(&contents)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Override the WebDriver URL with `WEBDRIVER_URL` when it is set and non-empty
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(webdriver_url) = std::env::var("WEBDRIVER_URL") {
            if !webdriver_url.is_empty() {
                self.webdriver_url = webdriver_url;
            }
        }
        self
    }

    fn validate(&self) -> Result<()> {
        if self.webdriver_url.trim().is_empty() {
            return Err(ProbeError::Config("webdriver_url must not be empty".into()));
        }
        if self.screenshots_dir.as_os_str().is_empty() {
            return Err(ProbeError::Config("screenshots_dir must not be empty".into()));
        }
        Ok(())
    }

    /// Page budget for one crawl, never more than [`MAX_PAGES`]
    pub fn page_budget(&self) -> usize {
        self.max_pages.clamp(1, MAX_PAGES)
    }

    pub fn initial_settle(&self) -> Duration {
        Duration::from_millis(self.initial_settle_ms)
    }

    pub fn click_settle(&self) -> Duration {
        Duration::from_millis(self.click_settle_ms)
    }

    pub fn crawl_settle(&self) -> Duration {
        Duration::from_millis(self.crawl_settle_ms)
    }

    pub fn form_settle(&self) -> Duration {
        Duration::from_millis(self.form_settle_ms)
    }

    pub fn network_idle_timeout(&self) -> Duration {
        Duration::from_millis(self.network_idle_timeout_ms)
    }
}
