//! Classification of free-form instruction text into a closed set of intents.
//!
//! Matching is substring or whole-word search over the text; nothing is parsed.

use regex::Regex;
use std::sync::LazyLock;

/// A button label the dispatcher knows how to exercise
#[derive(Debug, Clone, Copy)]
pub struct ButtonTrigger {
    pub label: &'static str,
    /// Looser mentions that still select the lighter button routine
    pub aliases: &'static [&'static str],
}

impl ButtonTrigger {
    /// Locator literal as it appears in scripted instructions
    pub fn locator(&self) -> String {
        format!(r#"button:has-text("{}")"#, self.label)
    }

    /// Case-insensitive mention of the label or an alias
    pub fn is_mentioned(&self, text: &str) -> bool {
        let text = text.to_lowercase();
        std::iter::once(self.label)
            .chain(self.aliases.iter().copied())
            .any(|needle| text.contains(&needle.to_lowercase()))
    }
}

/// Trigger phrases recognised in instruction text
#[derive(Debug)]
pub struct TriggerRegistry {
    pub buttons: &'static [ButtonTrigger],
    pub click_phrase: &'static str,
    pub screenshot_call: &'static str,
    /// Form words matched anywhere in the text
    pub form_vocabulary: &'static [&'static str],
    /// Form words matched only as whole words, case-insensitively
    form_words: Regex,
    screenshot_path: Regex,
    form_locator: Regex,
}

/// Probe values typed into the first text and email inputs
pub const FORM_PROBES: &[(&str, &str)] = &[
    (r#"input[type="text"]"#, "Test input"),
    (r#"input[type="email"]"#, "test@example.com"),
];

pub static TRIGGERS: LazyLock<TriggerRegistry> = LazyLock::new(|| TriggerRegistry {
    buttons: &[
        ButtonTrigger {
            label: "Free Reading",
            aliases: &["free reading"],
        },
        ButtonTrigger {
            label: "無料で鑑定",
            aliases: &["鑑定"],
        },
    ],
    click_phrase: "button.click()",
    screenshot_call: "page.screenshot",
    form_vocabulary: &["フォーム", "入力", "送信"],
    form_words: Regex::new(r"(?i)\b(?:form|input|submit)\b")
        .expect("form word pattern is valid"),
    screenshot_path: Regex::new(r#"page\.screenshot\(\s*\{\s*path:\s*['"`]([^'"`]+)['"`]"#)
        .expect("screenshot pattern is valid"),
    form_locator: Regex::new(r#"locator\(\s*['"`](form[^'"`]*)['"`]"#)
        .expect("form locator pattern is valid"),
});

/// What the instruction text asks to verify
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Click the button labelled `label`. `scripted` when the text both names
    /// the exact locator and invokes a click; those runs capture before and
    /// after evidence.
    ClickButton { label: String, scripted: bool },
    /// Capture one screenshot per requested file name
    CaptureScreenshot { names: Vec<String> },
    /// Fill probe values into a form and submit it
    SubmitForm {
        form_selector: Option<String>,
        fields: Vec<(String, String)>,
    },
    NoOp,
}

impl TriggerRegistry {
    /// Classify `text` into intents, at most one per trigger, in execution order.
    pub fn classify(&self, text: &str) -> Vec<Intent> {
        let mut intents = Vec::new();
        let mut locator_present = false;

        for button in self.buttons {
            let has_locator = text.contains(&button.locator());
            locator_present |= has_locator;

            if has_locator && text.contains(self.click_phrase) {
                intents.push(Intent::ClickButton {
                    label: button.label.to_string(),
                    scripted: true,
                });
            } else if button.is_mentioned(text) {
                intents.push(Intent::ClickButton {
                    label: button.label.to_string(),
                    scripted: false,
                });
            }
        }

        if text.contains(self.screenshot_call) && !locator_present {
            let names = self.screenshot_names(text);
            if !names.is_empty() {
                intents.push(Intent::CaptureScreenshot { names });
            }
        }

        if self.mentions_form(text) {
            intents.push(Intent::SubmitForm {
                form_selector: self
                    .form_locator
                    .captures(text)
                    .map(|c| c[1].to_string()),
                fields: FORM_PROBES
                    .iter()
                    .map(|(s, v)| (s.to_string(), v.to_string()))
                    .collect(),
            });
        }

        if intents.is_empty() {
            intents.push(Intent::NoOp);
        }
        intents
    }

    /// Whether `text` talks about a form: an English form word standing on
    /// its own ("perform" does not count) or a Japanese one anywhere
    pub fn mentions_form(&self, text: &str) -> bool {
        self.form_words.is_match(text) || self.form_vocabulary.iter().any(|w| text.contains(w))
    }

    /// Every `page.screenshot({ path: '...' })` target in `text`, in order
    pub fn screenshot_names(&self, text: &str) -> Vec<String> {
        self.screenshot_path
            .captures_iter(text)
            .map(|c| c[1].to_string())
            .collect()
    }
}

/// Classify with the process-wide registry
pub fn classify(text: &str) -> Vec<Intent> {
    TRIGGERS.classify(text)
}
