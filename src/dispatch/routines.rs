//! Verification routines run against the current page.
//!
//! Every routine returns a [`VerificationOutcome`]; automation faults are
//! reported as failed outcomes and never escape.

use crate::error::{ProbeError, Result};
use crate::evidence::EvidenceSink;
use crate::page::{ElementInfo, PageHandle};
use crate::results::{Check, VerificationOutcome};
use crate::scorer::normalize;
use std::time::Duration;

const SUBMIT_SELECTOR: &str = r#"button[type="submit"], input[type="submit"]"#;

/// Timing shared by the routines
#[derive(Debug, Clone, Copy)]
pub struct RoutineTiming {
    pub click_settle: Duration,
    pub form_settle: Duration,
    pub network_idle_timeout: Duration,
}

impl Default for RoutineTiming {
    fn default() -> Self {
        Self {
            click_settle: Duration::from_secs(3),
            form_settle: Duration::from_secs(2),
            network_idle_timeout: Duration::from_secs(10),
        }
    }
}

async fn capture<P: PageHandle + ?Sized>(
    page: &mut P,
    sink: &EvidenceSink,
    name: &str,
) -> Result<String> {
    let png = page.screenshot().await?;
    sink.save(&png, name).await
}

/// First `button` whose text contains `label`, ignoring case and spacing
async fn find_button<P: PageHandle + ?Sized>(
    page: &mut P,
    label: &str,
) -> Result<Option<ElementInfo>> {
    let label = normalize(label);
    let buttons = page.query("button").await?;
    Ok(buttons
        .into_iter()
        .find(|b| normalize(&b.text).contains(&label)))
}

async fn try_scripted_click<P: PageHandle + ?Sized>(
    page: &mut P,
    label: &str,
    sink: &EvidenceSink,
    timing: &RoutineTiming,
    shots: &mut Vec<String>,
) -> Result<()> {
    let Some(button) = find_button(page, label).await? else {
        return Err(ProbeError::NotFound(format!("button \"{}\"", label)));
    };
    if !button.visible {
        return Err(ProbeError::Automation(format!(
            "button \"{}\" exists but is hidden",
            label
        )));
    }

    shots.push(capture(page, sink, "page1").await?);
    page.click(&button.handle).await?;
    page.wait_for_network_idle(timing.network_idle_timeout).await?;
    page.settle(timing.click_settle).await?;
    shots.push(capture(page, sink, "page2").await?);
    Ok(())
}

/// Locate the exact button, require it visible, and click it between a
/// before and an after screenshot.
pub async fn scripted_click<P: PageHandle + ?Sized>(
    page: &mut P,
    label: &str,
    sink: &EvidenceSink,
    timing: &RoutineTiming,
) -> VerificationOutcome {
    let mut shots = Vec::new();
    let result = try_scripted_click(page, label, sink, timing, &mut shots).await;

    match result {
        Ok(()) => VerificationOutcome::pass(
            Check::ScriptedClick,
            format!(
                "Ran the scripted click on \"{}\" ({} screenshots)",
                label,
                shots.len()
            ),
        )
        .with_screenshots(shots),
        Err(e) => {
            ::log::warn!("Scripted click on {:?} failed: {}", label, e);
            VerificationOutcome::fail(
                Check::ScriptedClick,
                format!("Scripted click on \"{}\" failed: {}", label, e),
            )
            .with_screenshots(shots)
        }
    }
}

/// `Ok(Err(_))` is a not-found style failure; `Err(_)` an automation fault.
async fn try_button_click<P: PageHandle + ?Sized>(
    page: &mut P,
    label: &str,
    sink: &EvidenceSink,
    timing: &RoutineTiming,
) -> Result<std::result::Result<(String, String), String>> {
    let Some(button) = find_button(page, label).await? else {
        return Ok(Err(format!("Button \"{}\" not found", label)));
    };
    if !button.visible {
        return Ok(Err(format!("Button \"{}\" exists but is hidden", label)));
    }

    page.click(&button.handle).await?;
    page.settle(timing.click_settle).await?;
    page.wait_for_network_idle(timing.network_idle_timeout).await?;
    let url = page.current_url().await?;
    let shot = capture(page, sink, "button-click").await?;
    Ok(Ok((url, shot)))
}

/// Click the labelled button once, wait, and capture the page afterwards.
pub async fn button_click<P: PageHandle + ?Sized>(
    page: &mut P,
    label: &str,
    sink: &EvidenceSink,
    timing: &RoutineTiming,
) -> VerificationOutcome {
    let result = try_button_click(page, label, sink, timing).await;

    match result {
        Ok(Ok((url, shot))) => VerificationOutcome::pass(
            Check::ButtonClick,
            format!("Clicked \"{}\"; now at {}", label, url),
        )
        .with_screenshots(vec![shot]),
        Ok(Err(message)) => VerificationOutcome::fail(Check::ButtonClick, message),
        Err(e) => {
            ::log::warn!("Button click on {:?} failed: {}", label, e);
            VerificationOutcome::fail(
                Check::ButtonClick,
                format!("Button click test raised an error: {}", e),
            )
        }
    }
}

/// One full-page screenshot per requested name
pub async fn capture_screenshots<P: PageHandle + ?Sized>(
    page: &mut P,
    names: &[String],
    sink: &EvidenceSink,
) -> VerificationOutcome {
    let mut shots = Vec::with_capacity(names.len());
    for name in names {
        match capture(page, sink, name).await {
            Ok(path) => shots.push(path),
            Err(e) => {
                ::log::warn!("Screenshot {:?} failed: {}", name, e);
                return VerificationOutcome::fail(
                    Check::ScreenshotCapture,
                    format!("Screenshot \"{}\" failed: {}", name, e),
                )
                .with_screenshots(shots);
            }
        }
    }

    VerificationOutcome::pass(
        Check::ScreenshotCapture,
        format!("Captured {} requested screenshot(s)", shots.len()),
    )
    .with_screenshots(shots)
}

async fn try_submit_form<P: PageHandle + ?Sized>(
    page: &mut P,
    selector: &str,
    fields: &[(String, String)],
    sink: &EvidenceSink,
    timing: &RoutineTiming,
    shots: &mut Vec<String>,
) -> Result<std::result::Result<String, String>> {
    let forms = page.query(selector).await?;
    let Some(form) = forms.first() else {
        return Ok(Err("Form not found".to_string()));
    };
    let form = form.handle.clone();

    for (field_selector, value) in fields {
        let inputs = page.query_within(&form, field_selector).await?;
        let Some(input) = inputs.first() else {
            return Ok(Err(format!("Input field {} not found", field_selector)));
        };
        page.fill(&input.handle, value).await?;
    }

    let submits = page.query_within(&form, SUBMIT_SELECTOR).await?;
    let Some(submit) = submits.first() else {
        return Ok(Err("Submit button not found".to_string()));
    };
    page.click(&submit.handle).await?;

    page.wait_for_network_idle(timing.network_idle_timeout).await?;
    page.settle(timing.form_settle).await?;
    let url = page.current_url().await?;
    shots.push(capture(page, sink, "form-submit").await?);
    Ok(Ok(url))
}

/// Fill probe values into the form, submit it and capture the result.
pub async fn submit_form<P: PageHandle + ?Sized>(
    page: &mut P,
    form_selector: Option<&str>,
    fields: &[(String, String)],
    sink: &EvidenceSink,
    timing: &RoutineTiming,
) -> VerificationOutcome {
    let selector = form_selector.unwrap_or("form");
    let mut shots = Vec::new();

    let result = try_submit_form(page, selector, fields, sink, timing, &mut shots).await;

    match result {
        Ok(Ok(url)) => VerificationOutcome::pass(
            Check::FormSubmit,
            format!("Form submitted; now at {}", url),
        )
        .with_screenshots(shots),
        Ok(Err(message)) => {
            VerificationOutcome::fail(Check::FormSubmit, format!("Form test: {}", message))
                .with_screenshots(shots)
        }
        Err(e) => {
            ::log::warn!("Form routine failed: {}", e);
            VerificationOutcome::fail(
                Check::FormSubmit,
                format!("Form test raised an error: {}", e),
            )
            .with_screenshots(shots)
        }
    }
}

/// Header, main content and footer presence. Never fails the run.
pub async fn landmarks<P: PageHandle + ?Sized>(page: &mut P) -> Vec<VerificationOutcome> {
    let landmarks = [
        (Check::Header, "header", "Header"),
        (Check::MainContent, "main", "Main content"),
        (Check::Footer, "footer", "Footer"),
    ];

    let mut outcomes = Vec::with_capacity(landmarks.len());
    for (check, selector, name) in landmarks {
        let outcome = match page.query(selector).await {
            Ok(found) => match found.first() {
                Some(el) if el.visible => {
                    VerificationOutcome::pass(check, format!("{} is visible", name))
                }
                Some(_) => VerificationOutcome::warn(
                    check,
                    format!("{} element exists but is hidden", name),
                ),
                None => VerificationOutcome::warn(check, format!("{} element not found", name)),
            },
            Err(e) => VerificationOutcome::warn(check, format!("{} check failed: {}", name, e)),
        };
        outcomes.push(outcome);
    }
    outcomes
}

/// The document must have a body element
pub async fn body<P: PageHandle + ?Sized>(page: &mut P) -> VerificationOutcome {
    match page.query("body").await {
        Ok(found) if !found.is_empty() => {
            VerificationOutcome::pass(Check::Body, "Page body element exists")
        }
        Ok(_) => VerificationOutcome::fail(Check::Body, "Page body element not found"),
        Err(e) => VerificationOutcome::fail(Check::Body, format!("Body check failed: {}", e)),
    }
}

/// Compare where the page ended up with where the run started.
pub async fn url_note<P: PageHandle + ?Sized>(
    page: &mut P,
    requested_url: &str,
    clicked: bool,
) -> VerificationOutcome {
    let current = match page.current_url().await {
        Ok(url) => url,
        Err(e) => {
            let message = format!("Could not read URL: {}", e);
            return VerificationOutcome::warn(Check::UrlNote, message);
        }
    };

    let same = crate::crawl::normalize_url(&current) == crate::crawl::normalize_url(requested_url);
    match (same, clicked) {
        (true, false) => {
            VerificationOutcome::pass(Check::UrlNote, "URL matches the requested page")
        }
        (true, true) => VerificationOutcome::info(
            Check::UrlNote,
            format!("Button click kept the page at {}", current),
        ),
        (false, true) => VerificationOutcome::info(
            Check::UrlNote,
            format!("Button click navigated to {}", current),
        ),
        (false, false) => VerificationOutcome::warn(
            Check::UrlNote,
            format!("URL differs from the requested page: {}", current),
        ),
    }
}
