use crate::config::MAX_PAGES;
use crate::evidence::EvidenceSink;
use crate::navigation;
use crate::page::PageHandle;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use url::Url;

/// A distinct page reached during a crawl
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageVisit {
    pub url: String,
    pub title: String,
    pub screenshot_path: String,
    pub timestamp: DateTime<Utc>,
    pub index: usize,
}

/// Why a crawl stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The current URL had been visited before
    Cycle,
    /// The page budget was used up
    BudgetExhausted,
    /// Nothing on the page could be clicked
    DeadEnd,
    /// A click left the URL unchanged
    NoOpNavigation,
    /// The page automation capability failed
    Fault,
}

/// Timing knobs for one crawl
#[derive(Debug, Clone, Copy)]
pub struct CrawlOptions {
    pub max_pages: usize,
    pub network_idle_timeout: Duration,
    pub initial_settle: Duration,
    pub step_settle: Duration,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            max_pages: MAX_PAGES,
            network_idle_timeout: Duration::from_secs(10),
            initial_settle: Duration::from_secs(3),
            step_settle: Duration::from_secs(2),
        }
    }
}

/// State of one bounded crawl
#[derive(Debug)]
pub struct CrawlSession {
    pub start_url: String,
    pub intent: String,
    pub max_pages: usize,
    pub visited_urls: HashSet<String>,
    pub page_count: usize,
}

impl CrawlSession {
    pub fn new(start_url: &str, intent: &str, max_pages: usize) -> Self {
        Self {
            start_url: start_url.to_string(),
            intent: intent.to_string(),
            max_pages: max_pages.clamp(1, MAX_PAGES),
            visited_urls: HashSet::new(),
            page_count: 0,
        }
    }

    /// Record `url`; false if it was already visited
    pub fn mark_visited(&mut self, url: &str) -> bool {
        if self.visited_urls.contains(url) {
            ::log::trace!("Already visited: {}", url);
            return false;
        }
        self.visited_urls.insert(url.to_string());
        self.page_count += 1;
        true
    }

    pub fn budget_exhausted(&self) -> bool {
        self.page_count >= self.max_pages
    }
}

/// Result of a crawl: the pages visited, in order, and why it ended
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlReport {
    pub visits: Vec<PageVisit>,
    pub stop_reason: StopReason,
}

/// Strip the fragment so in-page anchors count as the same page
pub fn normalize_url(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(mut url) => {
            url.set_fragment(None);
            url.to_string()
        }
        Err(_) => raw.to_string(),
    }
}

/// Walk at most `options.max_pages` distinct pages from `start_url`, following `intent`.
///
/// Never fails: faults end the walk early and the visits gathered so far are returned.
pub async fn crawl<P: PageHandle + ?Sized>(
    page: &mut P,
    start_url: &str,
    intent: &str,
    sink: &EvidenceSink,
    options: &CrawlOptions,
) -> CrawlReport {
    ::log::info!("Starting crawl from {} with intent {:?}", start_url, intent);
    let mut session = CrawlSession::new(start_url, intent, options.max_pages);
    let mut visits = Vec::new();

    let stop_reason = match walk(page, &mut session, &mut visits, sink, options).await {
        Ok(reason) => reason,
        Err(e) => {
            ::log::warn!("Crawl step failed, stopping: {}", e);
            StopReason::Fault
        }
    };

    ::log::info!(
        "Crawl finished after {} page(s): {:?}",
        session.page_count,
        stop_reason
    );
    CrawlReport {
        visits,
        stop_reason,
    }
}

async fn walk<P: PageHandle + ?Sized>(
    page: &mut P,
    session: &mut CrawlSession,
    visits: &mut Vec<PageVisit>,
    sink: &EvidenceSink,
    options: &CrawlOptions,
) -> crate::Result<StopReason> {
    page.goto(&session.start_url).await?;
    page.wait_for_network_idle(options.network_idle_timeout).await?;
    page.settle(options.initial_settle).await?;

    while !session.budget_exhausted() {
        let current = normalize_url(&page.current_url().await?);
        if !session.mark_visited(&current) {
            return Ok(StopReason::Cycle);
        }

        let title = page.title().await?;
        let png = page.screenshot().await?;
        let screenshot_path = sink
            .save(&png, &format!("crawl-page{}", session.page_count))
            .await?;
        ::log::info!("Visited page {}: {}", session.page_count, current);
        visits.push(PageVisit {
            url: current.clone(),
            title,
            screenshot_path,
            timestamp: Utc::now(),
            index: session.page_count - 1,
        });

        if session.budget_exhausted() {
            return Ok(StopReason::BudgetExhausted);
        }

        let Some(candidate) = navigation::advance(page, &session.intent, options.step_settle).await?
        else {
            return Ok(StopReason::DeadEnd);
        };
        ::log::debug!(
            "Clicked {:?} {:?} (scored: {})",
            candidate.selector_class,
            candidate.display_text,
            candidate.scored
        );

        let next = normalize_url(&page.current_url().await?);
        if next == current {
            return Ok(StopReason::NoOpNavigation);
        }

        page.settle(options.step_settle).await?;
    }

    Ok(StopReason::BudgetExhausted)
}
