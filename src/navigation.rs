use crate::error::Result;
use crate::page::{ElementHandle, ElementInfo, PageHandle};
use crate::scorer::{self, BUTTON_SELECTORS, LINK_SELECTOR, SelectorClass};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Element chosen as the next navigation target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationCandidate {
    pub selector_class: SelectorClass,
    pub display_text: String,
    /// `href` for links; `None` when the target is implicit (buttons)
    pub target: Option<String>,
    /// Whether the candidate matched the intent, or was taken as the default link
    pub scored: bool,
    #[serde(skip)]
    pub handle: Option<ElementHandle>,
}

impl NavigationCandidate {
    fn from_element(element: &ElementInfo, class: SelectorClass, scored: bool) -> Self {
        Self {
            selector_class: class,
            display_text: element.label().to_string(),
            target: element.href.clone(),
            scored,
            handle: Some(element.handle.clone()),
        }
    }
}

/// Pick the element to click for `intent`.
///
/// Buttons are tried before links, selectors in fixed priority order, and the
/// first scoring element wins. With no scoring candidate, the first link with
/// a non-empty `href` is taken.
pub async fn find_target<P: PageHandle + ?Sized>(
    page: &mut P,
    intent: &str,
) -> Result<Option<NavigationCandidate>> {
    for selector in BUTTON_SELECTORS {
        let elements = page.query(selector).await?;
        if let Some(hit) = elements
            .iter()
            .find(|e| scorer::score(e, SelectorClass::ButtonLike, intent))
        {
            ::log::debug!("Button candidate via {}: {:?}", selector, hit.label());
            return Ok(Some(NavigationCandidate::from_element(
                hit,
                SelectorClass::ButtonLike,
                true,
            )));
        }
    }

    let links = page.query(LINK_SELECTOR).await?;
    if let Some(hit) = links
        .iter()
        .find(|e| scorer::score(e, SelectorClass::LinkLike, intent))
    {
        ::log::debug!("Link candidate: {:?} -> {:?}", hit.label(), hit.href);
        return Ok(Some(NavigationCandidate::from_element(
            hit,
            SelectorClass::LinkLike,
            true,
        )));
    }

    let fallback = links
        .iter()
        .find(|e| e.href.as_deref().is_some_and(|h| !h.trim().is_empty()));
    Ok(fallback.map(|link| {
        ::log::debug!("No scoring candidate, defaulting to first link {:?}", link.href);
        NavigationCandidate::from_element(link, SelectorClass::LinkLike, false)
    }))
}

/// Click the best candidate for `intent` and wait `settle` afterwards.
///
/// Returns the clicked candidate, or `None` when the page offers nothing to click.
pub async fn advance<P: PageHandle + ?Sized>(
    page: &mut P,
    intent: &str,
    settle: Duration,
) -> Result<Option<NavigationCandidate>> {
    let Some(candidate) = find_target(page, intent).await? else {
        return Ok(None);
    };

    if let Some(handle) = &candidate.handle {
        page.click(handle).await?;
        page.settle(settle).await?;
    }
    Ok(Some(candidate))
}
