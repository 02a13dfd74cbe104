//! Keyword co-occurrence scoring of clickable elements against an intent phrase.
//!
//! Each table is an ordered list of `(intent keyword, element needle)` pairs. A
//! candidate matches when some keyword occurs in the normalized intent and its
//! needle occurs in the candidate's normalized label (or, for links, its href).

use crate::page::ElementInfo;
use serde::{Deserialize, Serialize};

/// Kind of clickable element, in the order candidates are tried
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectorClass {
    ButtonLike,
    LinkLike,
}

/// Button-like selectors in priority order
pub const BUTTON_SELECTORS: &[&str] = &[
    "button",
    r#"input[type="button"], input[type="submit"]"#,
    r#"[role="button"]"#,
    r#"[class*="btn"], [class*="button"]"#,
];

/// Link-like selector
pub const LINK_SELECTOR: &str = "a";

pub const BUTTON_KEYWORDS: &[(&str, &str)] = &[
    ("login", "login"),
    ("log in", "log in"),
    ("sign in", "sign in"),
    ("ログイン", "ログイン"),
    ("sign up", "sign up"),
    ("signup", "sign up"),
    ("register", "register"),
    ("登録", "登録"),
    ("start", "start"),
    ("開始", "開始"),
    ("next", "next"),
    ("次へ", "次へ"),
    ("submit", "submit"),
    ("送信", "送信"),
    ("reading", "reading"),
    ("鑑定", "鑑定"),
    ("free", "free"),
    ("無料", "無料"),
    ("search", "search"),
    ("検索", "検索"),
    ("contact", "contact"),
    ("お問い合わせ", "お問い合わせ"),
];

pub const LINK_KEYWORDS: &[(&str, &str)] = &[
    ("login", "login"),
    ("ログイン", "login"),
    ("sign in", "signin"),
    ("register", "register"),
    ("contact", "contact"),
    ("お問い合わせ", "contact"),
    ("about", "about"),
    ("会社", "about"),
    ("pricing", "pricing"),
    ("料金", "price"),
    ("product", "product"),
    ("blog", "blog"),
    ("news", "news"),
    ("help", "help"),
    ("faq", "faq"),
    ("result", "result"),
    ("結果", "result"),
    ("detail", "detail"),
];

/// Lowercase and collapse whitespace
pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// First table entry matched by `intent` and one of `fields`
pub fn matching_keyword<'t>(
    table: &'t [(&'t str, &'t str)],
    intent: &str,
    fields: &[&str],
) -> Option<&'t (&'t str, &'t str)> {
    let intent = normalize(intent);
    let fields: Vec<String> = fields.iter().map(|f| normalize(f)).collect();
    table.iter().find(|(keyword, needle)| {
        intent.contains(keyword) && fields.iter().any(|f| f.contains(needle))
    })
}

/// Whether `element` of the given class matches `intent`
pub fn score(element: &ElementInfo, class: SelectorClass, intent: &str) -> bool {
    match class {
        SelectorClass::ButtonLike => {
            matching_keyword(BUTTON_KEYWORDS, intent, &[element.label()]).is_some()
        }
        SelectorClass::LinkLike => {
            let href = element.href.as_deref().unwrap_or("");
            matching_keyword(LINK_KEYWORDS, intent, &[element.label(), href]).is_some()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::ElementHandle;

    fn element(text: &str, href: Option<&str>) -> ElementInfo {
        ElementInfo {
            handle: ElementHandle::new("a", 0),
            tag: "a".into(),
            text: text.into(),
            value: None,
            aria_label: None,
            href: href.map(String::from),
            input_type: None,
            visible: true,
        }
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  Log   In\n"), "log in");
    }

    #[test]
    fn test_button_keyword_requires_both_sides() {
        let login = element("Log In", None);
        assert!(score(&login, SelectorClass::ButtonLike, "please log in to the site"));
        assert!(!score(&login, SelectorClass::ButtonLike, "open the pricing page"));
        let other = element("Subscribe", None);
        assert!(!score(&other, SelectorClass::ButtonLike, "log in"));
    }

    #[test]
    fn test_japanese_keywords() {
        let button = element("無料で鑑定する", None);
        assert!(score(&button, SelectorClass::ButtonLike, "無料で占いたい"));
    }

    #[test]
    fn test_link_matches_on_href() {
        let link = element("Company", Some("/about-us"));
        assert!(score(&link, SelectorClass::LinkLike, "Read the About page"));
        assert!(!score(&link, SelectorClass::ButtonLike, "Read the About page"));
    }

    #[test]
    fn test_table_order_is_priority() {
        let hit = matching_keyword(BUTTON_KEYWORDS, "free reading", &["Free Reading"]);
        assert_eq!(hit, Some(&("reading", "reading")));
    }

    #[test]
    fn test_value_fallback_is_scored() {
        let mut submit = element("", None);
        submit.value = Some("Submit".into());
        assert!(score(&submit, SelectorClass::ButtonLike, "submit the form"));
    }
}
