use crate::crawl::CrawlReport;
use crate::dom::PageSummary;
use crate::results::{TestResult, VerificationOutcome, overall_success};
use chrono::{DateTime, Utc};

/// State of the page when verification finished
#[derive(Debug, Clone, Default)]
pub struct FinalPage {
    pub url: String,
    pub viewport: Option<(u32, u32)>,
    pub summary: PageSummary,
    pub console_errors: Vec<String>,
}

/// Accumulates everything a run produced, so a fault can still report partial evidence
#[derive(Debug, Clone)]
pub struct Report {
    test_name: String,
    url: String,
    prompt: String,
    created_at: Option<DateTime<Utc>>,
    generated_code: Option<String>,
    notes: Vec<String>,
    outcomes: Vec<VerificationOutcome>,
    crawl: Option<CrawlReport>,
    final_page: Option<FinalPage>,
    /// Saved screenshots no outcome or visit accounts for
    stray: Vec<String>,
}

impl Report {
    pub fn new(
        test_name: &str,
        url: &str,
        prompt: &str,
        created_at: Option<DateTime<Utc>>,
        generated_code: Option<String>,
    ) -> Self {
        Self {
            test_name: test_name.to_string(),
            url: url.to_string(),
            prompt: prompt.to_string(),
            created_at,
            generated_code,
            notes: Vec::new(),
            outcomes: Vec::new(),
            crawl: None,
            final_page: None,
            stray: Vec::new(),
        }
    }

    /// Informational line shown before the check results
    pub fn note(&mut self, line: impl Into<String>) {
        self.notes.push(line.into());
    }

    pub fn extend_outcomes(&mut self, outcomes: Vec<VerificationOutcome>) {
        self.outcomes.extend(outcomes);
    }

    /// Outcome list routines append to as they finish
    pub fn outcomes_mut(&mut self) -> &mut Vec<VerificationOutcome> {
        &mut self.outcomes
    }

    /// Keep every path in `saved` that is not already part of the report
    pub fn keep_evidence(&mut self, saved: Vec<String>) {
        let known = self.screenshots();
        self.stray.extend(saved.into_iter().filter(|path| !known.contains(path)));
    }

    pub fn set_crawl(&mut self, crawl: CrawlReport) {
        self.crawl = Some(crawl);
    }

    pub fn set_final_page(&mut self, page: FinalPage) {
        self.final_page = Some(page);
    }

    pub fn outcomes(&self) -> &[VerificationOutcome] {
        &self.outcomes
    }

    /// Screenshots in capture order: verification evidence, then crawl visits
    pub fn screenshots(&self) -> Vec<String> {
        let mut shots: Vec<String> = self
            .outcomes
            .iter()
            .flat_map(|o| o.screenshots.iter().cloned())
            .collect();
        if let Some(crawl) = &self.crawl {
            shots.extend(crawl.visits.iter().map(|v| v.screenshot_path.clone()));
        }
        shots.extend(self.stray.iter().cloned());
        shots
    }

    fn header(&self) -> String {
        let created = self
            .created_at
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "-".to_string());
        format!(
            "Test info:\n- Name: {}\n- Target URL: {}\n- Prompt: {}\n- Created: {}",
            self.test_name, self.url, self.prompt, created
        )
    }

    fn check_lines(&self) -> Vec<String> {
        self.notes
            .iter()
            .cloned()
            .chain(self.outcomes.iter().map(VerificationOutcome::line))
            .collect()
    }

    fn crawl_section(&self) -> Option<String> {
        let crawl = self.crawl.as_ref()?;
        let mut lines = vec![format!(
            "Crawl ({} page(s), stopped: {:?}):",
            crawl.visits.len(),
            crawl.stop_reason
        )];
        for visit in &crawl.visits {
            lines.push(format!(
                "{}. {} - {} ({})",
                visit.index + 1,
                visit.url,
                visit.title,
                visit.screenshot_path
            ));
        }
        Some(lines.join("\n"))
    }

    /// Successful completion: success is decided by the mandatory checks
    pub fn finish(self) -> TestResult {
        let success = overall_success(&self.outcomes);
        let mut sections = vec![self.header()];

        if let Some(page) = &self.final_page {
            let viewport = page
                .viewport
                .map(|(w, h)| format!("{}x{}", w, h))
                .unwrap_or_else(|| "unknown".to_string());
            sections.push(format!(
                "Execution:\n- Current URL: {}\n- Viewport: {}\n- Links: {}\n- Buttons: {}\n\
                 - Forms: {}\n- Images: {}\n- Console errors: {}",
                page.url,
                viewport,
                page.summary.links,
                page.summary.buttons,
                page.summary.forms,
                page.summary.images,
                page.console_errors.len()
            ));
        }

        sections.push(format!("Checks:\n{}", self.check_lines().join("\n")));

        if let Some(crawl) = self.crawl_section() {
            sections.push(crawl);
        }

        if let Some(page) = &self.final_page {
            if !page.console_errors.is_empty() {
                sections.push(format!("Console errors:\n{}", page.console_errors.join("\n")));
            }
        }

        let message = if success {
            format!("Test \"{}\" completed successfully.", self.test_name)
        } else {
            format!("Test \"{}\" finished with failures.", self.test_name)
        };

        TestResult {
            success,
            message,
            screenshots: self.screenshots(),
            details: sections.join("\n\n"),
            generated_code: self.generated_code,
        }
    }

    /// A fault ended the run; keep whatever evidence was gathered
    pub fn fault(self, error: &str, trace: Option<&str>) -> TestResult {
        let mut sections = vec![self.header(), format!("Error details:\n{}", error)];
        if let Some(trace) = trace {
            sections.push(format!("Trace:\n{}", trace));
        }
        let lines = self.check_lines();
        if !lines.is_empty() {
            sections.push(format!("Checks before the failure:\n{}", lines.join("\n")));
        }
        if let Some(crawl) = self.crawl_section() {
            sections.push(crawl);
        }

        TestResult {
            success: false,
            message: format!("Test execution failed: {}", error),
            screenshots: self.screenshots(),
            details: sections.join("\n\n"),
            generated_code: self.generated_code,
        }
    }
}
