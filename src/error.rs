use thiserror::Error;

/// Errors raised by page automation, evidence storage and the test store
#[derive(Debug, Error)]
pub enum ProbeError {
    /// A WebDriver command failed
    #[error("webdriver command failed: {0}")]
    WebDriver(#[from] fantoccini::error::CmdError),

    /// No WebDriver session could be created
    #[error("webdriver session could not be created: {0}")]
    Session(#[from] fantoccini::error::NewSessionError),

    /// Filesystem failure
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failure
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed URL
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// A selector, element, form or stored record does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// The page automation capability reported a fault
    #[error("automation fault: {0}")]
    Automation(String),

    /// Invalid or incomplete test store request
    #[error("store error: {0}")]
    Store(String),

    /// Invalid configuration
    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ProbeError>;

impl ProbeError {
    /// Render this error followed by every underlying cause, one per line.
    pub fn trace(&self) -> String {
        let mut out = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            out.push_str("\ncaused by: ");
            out.push_str(&cause.to_string());
            source = cause.source();
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trace_includes_message() {
        let err = ProbeError::NotFound("form".to_string());
        assert_eq!(err.trace(), "not found: form");
    }

    #[test]
    fn test_trace_walks_sources() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = ProbeError::from(io);
        assert!(err.trace().starts_with("io error: denied"));
    }
}
