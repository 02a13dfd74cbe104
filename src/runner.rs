use crate::config::ProbeConfig;
use crate::crawl::{self, CrawlOptions};
use crate::dispatch::{Dispatcher, RoutineTiming};
use crate::dom::PageSummary;
use crate::error::Result;
use crate::evidence::EvidenceSink;
use crate::page::{PageHandle, WebDriverPage};
use crate::report::{FinalPage, Report};
use crate::results::TestResult;
use crate::store::TestConfig;
use chrono::{DateTime, Utc};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;

/// One test to run against a live page
#[derive(Debug, Clone, Default)]
pub struct TestRequest {
    pub test_name: String,
    pub url: String,
    pub prompt: String,
    pub created_at: Option<DateTime<Utc>>,
    /// Previously generated instruction text
    pub instructions: String,
    /// Intent phrase for the navigation walk; no walk when absent
    pub intent: Option<String>,
}

impl TestRequest {
    pub fn new(url: &str, instructions: &str) -> Self {
        Self {
            test_name: url.to_string(),
            url: url.to_string(),
            instructions: instructions.to_string(),
            ..Self::default()
        }
    }

    /// Request for a stored test
    pub fn from_saved(config: &TestConfig, instructions: String) -> Self {
        Self {
            test_name: config.test_name.clone(),
            url: config.url.clone(),
            prompt: config.prompt.clone(),
            created_at: Some(config.created_at),
            instructions,
            intent: None,
        }
    }
}

fn crawl_options(config: &ProbeConfig) -> CrawlOptions {
    CrawlOptions {
        max_pages: config.page_budget(),
        network_idle_timeout: config.network_idle_timeout(),
        initial_settle: config.initial_settle(),
        step_settle: config.crawl_settle(),
    }
}

fn routine_timing(config: &ProbeConfig) -> RoutineTiming {
    RoutineTiming {
        click_settle: config.click_settle(),
        form_settle: config.form_settle(),
        network_idle_timeout: config.network_idle_timeout(),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Run `request` on an already open page. Always returns a structured result.
pub async fn run_test<P: PageHandle + ?Sized>(
    page: &mut P,
    request: &TestRequest,
    config: &ProbeConfig,
) -> TestResult {
    let generated_code = Some(request.instructions.clone()).filter(|c| !c.is_empty());
    let mut report = Report::new(
        &request.test_name,
        &request.url,
        &request.prompt,
        request.created_at,
        generated_code,
    );

    let sink = EvidenceSink::new(&config.screenshots_dir);
    let outcome = AssertUnwindSafe(execute(page, request, config, &sink, &mut report))
        .catch_unwind()
        .await;

    match outcome {
        Ok(Ok(())) => report.finish(),
        Ok(Err(e)) => {
            ::log::error!("Test {:?} failed: {}", request.test_name, e);
            report.keep_evidence(sink.saved());
            report.fault(&e.to_string(), Some(&e.trace()))
        }
        Err(panic) => {
            let message = panic_message(&*panic);
            ::log::error!("Test {:?} panicked: {}", request.test_name, message);
            report.keep_evidence(sink.saved());
            report.fault(&message, None)
        }
    }
}

async fn execute<P: PageHandle + ?Sized>(
    page: &mut P,
    request: &TestRequest,
    config: &ProbeConfig,
    sink: &EvidenceSink,
    report: &mut Report,
) -> Result<()> {
    tokio::fs::create_dir_all(sink.dir()).await?;

    ::log::info!("Running test {:?} against {}", request.test_name, request.url);
    page.goto(&request.url).await?;
    page.wait_for_network_idle(config.network_idle_timeout()).await?;
    page.settle(config.initial_settle()).await?;

    if let Err(e) = page.clear_storage().await {
        ::log::warn!("Could not clear browser storage: {}", e);
    }

    report.note(format!("[PASS] Target URL: {}", request.url));
    let title = page.title().await?;
    report.note(format!("[PASS] Page title: {}", title));

    let dispatcher = Dispatcher::new(sink.clone(), routine_timing(config));
    dispatcher
        .dispatch_into(page, &request.instructions, &request.url, report.outcomes_mut())
        .await;

    report.set_final_page(FinalPage {
        url: page.current_url().await?,
        viewport: page.viewport_size().await?,
        summary: PageSummary::from_html(&page.content().await?),
        console_errors: page.console_errors().await?,
    });

    if let Some(intent) = request.intent.as_deref().filter(|i| !i.trim().is_empty()) {
        let crawl = crawl::crawl(page, &request.url, intent, sink, &crawl_options(config)).await;
        report.set_crawl(crawl);
    }

    Ok(())
}

/// Open a WebDriver session, run `request`, and close the session on every path.
pub async fn run_with_webdriver(request: &TestRequest, config: &ProbeConfig) -> TestResult {
    let mut page = match WebDriverPage::connect(&config.webdriver_url, config.headless).await {
        Ok(page) => page,
        Err(e) => {
            let report = Report::new(
                &request.test_name,
                &request.url,
                &request.prompt,
                request.created_at,
                Some(request.instructions.clone()).filter(|c| !c.is_empty()),
            );
            return report.fault(&e.to_string(), Some(&e.trace()));
        }
    };

    let result = run_test(&mut page, request, config).await;

    if let Err(e) = page.close().await {
        ::log::warn!("Failed to close browser session: {}", e);
    }
    result
}
