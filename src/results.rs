use serde::{Deserialize, Serialize};

/// Which verification produced an outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Check {
    ScriptedClick,
    ButtonClick,
    ScreenshotCapture,
    FormSubmit,
    Header,
    MainContent,
    Footer,
    UrlNote,
    Body,
}

impl Check {
    /// Whether a failure of this check fails the whole test
    pub fn is_mandatory(self) -> bool {
        matches!(self, Check::Body | Check::ScriptedClick | Check::ButtonClick)
    }
}

/// Severity of an outcome line in the report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Pass,
    Info,
    Warn,
    Fail,
}

impl Level {
    fn marker(self) -> &'static str {
        match self {
            Level::Pass => "[PASS]",
            Level::Info => "[INFO]",
            Level::Warn => "[WARN]",
            Level::Fail => "[FAIL]",
        }
    }
}

/// Result of one verification routine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationOutcome {
    pub check: Check,
    pub success: bool,
    pub level: Level,
    pub message: String,
    pub screenshots: Vec<String>,
}

impl VerificationOutcome {
    pub fn pass(check: Check, message: impl Into<String>) -> Self {
        Self {
            check,
            success: true,
            level: Level::Pass,
            message: message.into(),
            screenshots: Vec::new(),
        }
    }

    pub fn info(check: Check, message: impl Into<String>) -> Self {
        Self {
            level: Level::Info,
            ..Self::pass(check, message)
        }
    }

    /// Soft signal: reported, but still counts as success
    pub fn warn(check: Check, message: impl Into<String>) -> Self {
        Self {
            level: Level::Warn,
            ..Self::pass(check, message)
        }
    }

    pub fn fail(check: Check, message: impl Into<String>) -> Self {
        Self {
            check,
            success: false,
            level: if check.is_mandatory() {
                Level::Fail
            } else {
                Level::Warn
            },
            message: message.into(),
            screenshots: Vec::new(),
        }
    }

    pub fn with_screenshots(mut self, screenshots: Vec<String>) -> Self {
        self.screenshots = screenshots;
        self
    }

    /// Single report line, e.g. `[PASS] Header is visible`
    pub fn line(&self) -> String {
        format!("{} {}", self.level.marker(), self.message)
    }
}

/// True when every mandatory outcome succeeded
pub fn overall_success(outcomes: &[VerificationOutcome]) -> bool {
    outcomes
        .iter()
        .filter(|o| o.check.is_mandatory())
        .all(|o| o.success)
}

/// Outcome of a whole test run, as handed to the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    pub success: bool,
    pub message: String,
    pub screenshots: Vec<String>,
    pub details: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_code: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advisory_failures_do_not_fail_run() {
        let outcomes = vec![
            VerificationOutcome::fail(Check::FormSubmit, "no form"),
            VerificationOutcome::warn(Check::Header, "header missing"),
            VerificationOutcome::pass(Check::Body, "body present"),
        ];
        assert!(overall_success(&outcomes));
        assert_eq!(outcomes[0].level, Level::Warn);
    }

    #[test]
    fn test_mandatory_failure_fails_run() {
        let outcomes = vec![
            VerificationOutcome::pass(Check::Body, "body present"),
            VerificationOutcome::fail(Check::ButtonClick, "button missing"),
        ];
        assert!(!overall_success(&outcomes));
        assert_eq!(outcomes[1].line(), "[FAIL] button missing");
    }

    #[test]
    fn test_result_serializes_camel_case() {
        let result = TestResult {
            success: true,
            message: "ok".into(),
            screenshots: vec!["/screenshots/a-1.png".into()],
            details: String::new(),
            generated_code: Some("code".into()),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["generatedCode"], "code");
    }
}
