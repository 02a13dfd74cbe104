use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};

/// Element counts reported for the page a test ended on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSummary {
    pub links: usize,
    pub buttons: usize,
    pub forms: usize,
    pub images: usize,
}

impl PageSummary {
    /// Parses a serialized document and counts its interactive elements
    pub fn from_html(html: &str) -> Self {
        let doc = Html::parse_document(html);

        let summary = Self {
            links: count(&doc, "a"),
            buttons: count(&doc, "button"),
            forms: count(&doc, "form"),
            images: count(&doc, "img"),
        };

        ::log::debug!("Page summary: {:?}", summary);
        summary
    }
}

fn count(doc: &Html, selector: &str) -> usize {
    match Selector::parse(selector) {
        Ok(selector) => doc.select(&selector).count(),
        Err(_) => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_elements() {
        let html = r#"<html><body>
            <a href="/a">A</a><a href="/b">B</a>
            <button>Go</button>
            <form><input type="text"></form>
            <img src="x.png"><img src="y.png"><img src="z.png">
        </body></html>"#;
        let summary = PageSummary::from_html(html);
        assert_eq!(summary.links, 2);
        assert_eq!(summary.buttons, 1);
        assert_eq!(summary.forms, 1);
        assert_eq!(summary.images, 3);
    }

    #[test]
    fn test_empty_page() {
        let summary = PageSummary::from_html("");
        assert_eq!(summary.links, 0);
        assert_eq!(summary.buttons, 0);
    }
}
