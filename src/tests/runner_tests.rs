use super::fake_page::{Fault, FakePage};
use super::{config_in, layout};
use crate::runner::{TestRequest, run_test};
use crate::Probe;

const HOME: &str = "https://fortune.test/";

const SCRIPTED: &str = r#"
    await page.goto('https://fortune.test/');
    const button = page.locator('button:has-text("Free Reading")');
    await button.click();
"#;

fn fortune_site() -> FakePage {
    FakePage::new().with_page(
        HOME,
        &layout("Fortune", r#"<h1>Welcome</h1><button>Free Reading</button>"#),
    )
}

#[tokio::test]
async fn test_scripted_click_yields_before_and_after_shots() {
    let dir = tempfile::tempdir().unwrap();
    let mut page = fortune_site();
    let mut request = TestRequest::new(HOME, SCRIPTED);
    request.test_name = "Reading button".into();

    let result = run_test(&mut page, &request, &config_in(dir.path())).await;

    assert!(result.success, "{}", result.details);
    assert_eq!(result.message, "Test \"Reading button\" completed successfully.");
    assert_eq!(result.screenshots.len(), 2);
    assert!(result.details.contains("[PASS] Page title: Fortune"));
    assert!(result.details.contains("[INFO] Button click kept the page at"));
    assert_eq!(result.generated_code.as_deref(), Some(SCRIPTED));

    let files = std::fs::read_dir(dir.path().join("screenshots")).unwrap().count();
    assert_eq!(files, 2);
}

#[tokio::test]
async fn test_missing_form_does_not_fail_run() {
    let dir = tempfile::tempdir().unwrap();
    let mut page = FakePage::new().with_page(HOME, &layout("Fortune", "<p>No inputs here</p>"));
    let request = TestRequest::new(HOME, "Check that the contact form works");

    let result = run_test(&mut page, &request, &config_in(dir.path())).await;

    assert!(result.success, "{}", result.details);
    assert!(result.details.contains("[WARN] Form test: Form not found"));
    assert!(result.details.contains("[PASS] Header is visible"));
    assert!(result.details.contains("[PASS] Main content is visible"));
    assert!(result.details.contains("[PASS] Footer is visible"));
    assert!(result.screenshots.is_empty());
}

#[tokio::test]
async fn test_missing_scripted_button_fails_run() {
    let dir = tempfile::tempdir().unwrap();
    let mut page = FakePage::new().with_page(HOME, &layout("Fortune", "<button>Other</button>"));
    let request = TestRequest::new(HOME, SCRIPTED);

    let result = run_test(&mut page, &request, &config_in(dir.path())).await;

    assert!(!result.success);
    assert!(result.message.ends_with("finished with failures."));
    assert!(result.details.contains("[FAIL] Scripted click on \"Free Reading\" failed"));
    assert!(page.clicks.is_empty());
}

#[tokio::test]
async fn test_fault_after_routines_keeps_their_evidence() {
    let dir = tempfile::tempdir().unwrap();
    let mut page = fortune_site();
    page.fault = Fault::ConsoleError;
    let request = TestRequest::new(HOME, SCRIPTED);

    let result = run_test(&mut page, &request, &config_in(dir.path())).await;

    assert!(!result.success);
    assert_eq!(
        result.message,
        "Test execution failed: automation fault: target window already closed"
    );
    assert_eq!(result.screenshots.len(), 2);
    assert!(result.details.contains("Checks before the failure:"));
}

#[tokio::test]
async fn test_panic_is_reported_as_failure() {
    let dir = tempfile::tempdir().unwrap();
    let mut page = fortune_site();
    page.fault = Fault::ConsolePanic;
    let request = TestRequest::new(HOME, "");

    let result = run_test(&mut page, &request, &config_in(dir.path())).await;

    assert!(!result.success);
    assert_eq!(result.message, "Test execution failed: browser crashed");
}

#[tokio::test]
async fn test_panic_mid_routine_keeps_saved_screenshots() {
    let dir = tempfile::tempdir().unwrap();
    let mut page = fortune_site();
    page.fault = Fault::ClickPanic;
    let request = TestRequest::new(HOME, SCRIPTED);

    let result = run_test(&mut page, &request, &config_in(dir.path())).await;

    assert!(!result.success);
    assert_eq!(result.message, "Test execution failed: renderer crashed during click");
    assert_eq!(result.screenshots.len(), 1);
    assert!(result.screenshots[0].starts_with("/screenshots/page1-"));
}

#[tokio::test]
async fn test_panic_keeps_outcomes_of_finished_routines() {
    let dir = tempfile::tempdir().unwrap();
    let form = r#"<form action="/sent"><input type="text"><input type="email">
        <button type="submit">Send</button></form>"#;
    let mut page = FakePage::new().with_page(HOME, &layout("Fortune", form));
    page.fault = Fault::ClickPanic;
    let instructions = r#"
        await page.screenshot({ path: 'landing.png' });
        // fill in the form and submit
    "#;
    let request = TestRequest::new(HOME, instructions);

    let result = run_test(&mut page, &request, &config_in(dir.path())).await;

    assert!(!result.success);
    assert_eq!(result.screenshots.len(), 1);
    assert!(result.screenshots[0].starts_with("/screenshots/landing-"));
    assert!(result.details.contains("[PASS] Captured 1 requested screenshot(s)"));
}

#[tokio::test]
async fn test_form_words_inside_other_words_leave_forms_alone() {
    let dir = tempfile::tempdir().unwrap();
    let body = r#"<button>Free Reading</button>
        <form action="/sent"><input type="text"><input type="email">
        <button type="submit">Send</button></form>"#;
    let mut page = FakePage::new()
        .with_page(HOME, &layout("Fortune", body))
        .with_page("https://fortune.test/sent", &layout("Sent", ""));
    let instructions = r#"
        const button = page.locator('button:has-text("Free Reading")');
        // perform the click
        await button.click();
    "#;
    let request = TestRequest::new(HOME, instructions);

    let result = run_test(&mut page, &request, &config_in(dir.path())).await;

    assert!(result.success, "{}", result.details);
    assert_eq!(result.screenshots.len(), 2);
    assert!(page.fills.is_empty());
    assert_eq!(page.clicks.len(), 1);
}

#[tokio::test]
async fn test_unreachable_url_fails_with_message() {
    let dir = tempfile::tempdir().unwrap();
    let mut page = FakePage::new();
    let request = TestRequest::new("https://down.test/", "");

    let result = run_test(&mut page, &request, &config_in(dir.path())).await;

    assert!(!result.success);
    assert!(result.message.starts_with("Test execution failed:"));
    assert!(result.message.contains("ERR_NAME_NOT_RESOLVED"));
    assert!(result.screenshots.is_empty());
}

#[tokio::test]
async fn test_intent_adds_crawl_visits() {
    let dir = tempfile::tempdir().unwrap();
    let mut page = FakePage::new()
        .with_page(HOME, &layout("Fortune", r#"<a href="/result">See your result</a>"#))
        .with_page("https://fortune.test/result", &layout("Result", ""));

    let probe = Probe::new(HOME)
        .with_name("Walk")
        .with_intent("show my result")
        .with_config(config_in(dir.path()));
    let result = probe.run_on(&mut page).await;

    assert!(result.success, "{}", result.details);
    assert_eq!(result.screenshots.len(), 2);
    assert!(result.screenshots.iter().all(|s| s.starts_with("/screenshots/crawl-page")));
    assert!(result.details.contains("Crawl (2 page(s), stopped: DeadEnd):"));
    assert!(result.details.contains("2. https://fortune.test/result - Result"));
}

#[tokio::test]
async fn test_console_errors_are_reported() {
    let dir = tempfile::tempdir().unwrap();
    let mut page = fortune_site();
    page.console.push("Uncaught TypeError: x is undefined".into());
    let request = TestRequest::new(HOME, "");

    let result = run_test(&mut page, &request, &config_in(dir.path())).await;

    assert!(result.success);
    assert!(result.details.contains("- Console errors: 1"));
    assert!(result.details.contains("Uncaught TypeError: x is undefined"));
    assert!(result.details.contains("- Buttons: 1"));
}
