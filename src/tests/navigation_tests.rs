use super::fake_page::FakePage;
use super::layout;
use crate::navigation::{NavigationCandidate, find_target};
use crate::page::{ElementHandle, PageHandle};
use crate::scorer::{BUTTON_SELECTORS, SelectorClass};

const HOME: &str = "https://site.test/";

async fn target_on(body: &str, intent: &str) -> Option<NavigationCandidate> {
    let mut page = FakePage::new().with_page(HOME, &layout("Home", body));
    page.goto(HOME).await.unwrap();
    find_target(&mut page, intent).await.unwrap()
}

#[tokio::test]
async fn test_native_button_beats_earlier_role_button() {
    let body = r#"<div role="button">Login</div><button>Login</button>"#;

    let candidate = target_on(body, "login please").await.unwrap();

    assert_eq!(candidate.selector_class, SelectorClass::ButtonLike);
    assert_eq!(candidate.handle, Some(ElementHandle::new(BUTTON_SELECTORS[0], 0)));
    assert!(candidate.scored);
}

#[tokio::test]
async fn test_submit_input_beats_earlier_role_button() {
    let body = r#"<div role="button">Submit</div><input type="submit" value="Submit">"#;

    let candidate = target_on(body, "submit the answers").await.unwrap();

    assert_eq!(candidate.handle, Some(ElementHandle::new(BUTTON_SELECTORS[1], 0)));
    assert_eq!(candidate.display_text, "Submit");
}

#[tokio::test]
async fn test_role_button_beats_earlier_class_marked_element() {
    let body = r#"<span class="btn-primary">Next</span><div role="button">Next</div>"#;

    let candidate = target_on(body, "go to the next step").await.unwrap();

    assert_eq!(candidate.handle, Some(ElementHandle::new(BUTTON_SELECTORS[2], 0)));
}

#[tokio::test]
async fn test_class_marked_element_used_when_nothing_else_scores() {
    let body = r#"<button>Cancel</button><span class="btn-primary">Start now</span>"#;

    let candidate = target_on(body, "start").await.unwrap();

    assert_eq!(candidate.handle, Some(ElementHandle::new(BUTTON_SELECTORS[3], 0)));
    assert_eq!(candidate.display_text, "Start now");
}

#[tokio::test]
async fn test_fallback_skips_links_without_href() {
    let body = r#"<a>Anchor</a><a href="">Home</a><a href="  ">Blank</a>
        <a href="/about">About</a>"#;

    let candidate = target_on(body, "zzz").await.unwrap();

    assert_eq!(candidate.selector_class, SelectorClass::LinkLike);
    assert!(!candidate.scored);
    assert_eq!(candidate.target.as_deref(), Some("/about"));
    assert_eq!(candidate.handle, Some(ElementHandle::new("a", 3)));
}

#[tokio::test]
async fn test_nothing_clickable_gives_no_target() {
    let body = r#"<a>Anchor</a><a href="">Home</a><p>text</p>"#;

    assert!(target_on(body, "login").await.is_none());
}

#[tokio::test]
async fn test_same_page_and_intent_give_same_target() {
    let body = r#"<a href="/pricing">Pricing</a><a href="/blog">Blog</a>
        <div role="button">Contact</div><button>Register</button>"#;
    let mut page = FakePage::new().with_page(HOME, &layout("Home", body));
    page.goto(HOME).await.unwrap();

    let first = find_target(&mut page, "contact us").await.unwrap();
    let second = find_target(&mut page, "contact us").await.unwrap();

    assert!(first.is_some());
    assert_eq!(first, second);
    assert_eq!(
        first.and_then(|c| c.handle),
        Some(ElementHandle::new(BUTTON_SELECTORS[2], 0))
    );
}
