//! Bounded navigation and verification of live web pages.
//!
//! A run lands on a URL, executes the verification routines selected by a block
//! of previously generated instruction text, and optionally walks up to five
//! pages following an intent phrase, capturing a screenshot of each.

pub mod config;
pub mod crawl;
pub mod dispatch;
pub mod dom;
pub mod error;
pub mod evidence;
pub mod navigation;
pub mod page;
pub mod report;
pub mod results;
pub mod runner;
pub mod scorer;
pub mod store;

#[cfg(test)]
mod tests;

// Re-export commonly used types for convenience
pub use config::ProbeConfig;
pub use error::{ProbeError, Result};
pub use page::{PageHandle, WebDriverPage};
pub use results::{TestResult, VerificationOutcome};
pub use runner::{TestRequest, run_test, run_with_webdriver};

use std::path::Path;

/// Builder for a single verification run
pub struct Probe {
    request: TestRequest,
    config: ProbeConfig,
}

impl Probe {
    /// Create a new probe for the given URL
    pub fn new(url: &str) -> Self {
        Self {
            request: TestRequest::new(url, ""),
            config: ProbeConfig::default().with_env_overrides(),
        }
    }

    /// Instruction text whose trigger phrases select the verification routines
    pub fn with_instructions(mut self, instructions: &str) -> Self {
        self.request.instructions = instructions.to_string();
        self
    }

    /// Intent phrase for the navigation walk
    pub fn with_intent(mut self, intent: &str) -> Self {
        self.request.intent = Some(intent.to_string());
        self
    }

    /// Name shown in the report
    pub fn with_name(mut self, name: &str) -> Self {
        self.request.test_name = name.to_string();
        self
    }

    pub fn with_prompt(mut self, prompt: &str) -> Self {
        self.request.prompt = prompt.to_string();
        self
    }

    pub fn with_config(mut self, config: ProbeConfig) -> Self {
        self.config = config;
        self
    }

    /// Load configuration from a JSON file
    pub fn with_config_file(self, path: impl AsRef<Path>) -> Result<Self> {
        let config = ProbeConfig::from_file(path)?.with_env_overrides();
        Ok(self.with_config(config))
    }

    /// Load configuration from a JSON string
    pub fn with_config_str(self, json: &str) -> Result<Self> {
        let config = ProbeConfig::from_json(json)?.with_env_overrides();
        Ok(self.with_config(config))
    }

    pub fn request(&self) -> &TestRequest {
        &self.request
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// Run against an existing page
    pub async fn run_on<P: PageHandle + ?Sized>(&self, page: &mut P) -> TestResult {
        run_test(page, &self.request, &self.config).await
    }

    /// Open a WebDriver session and run
    pub async fn run(self) -> TestResult {
        run_with_webdriver(&self.request, &self.config).await
    }
}
