//! Error report templates

use askama::Template;
use serde::Deserialize;

/// HTML error report
#[derive(Debug, Deserialize, Template)]
#[template(path = "mail/error_report.html")]
pub struct ErrorReportTemplate {
    /// One line description of the failure
    pub summary: String,

    /// Where it happened
    pub environment: String,

    /// Backtrace or log excerpt
    pub details: String,
}

/// Plain text error report
#[derive(Debug, Deserialize, Template)]
#[template(path = "mail/error_report.txt")]
pub struct ErrorReportTextTemplate {
    /// One line description of the failure
    pub summary: String,

    /// Where it happened
    pub environment: String,

    /// Backtrace or log excerpt
    pub details: String,
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn test_html_report_escapes_details() -> TestResult {
        let template = ErrorReportTemplate {
            summary: "Worker crashed".to_string(),
            environment: "staging".to_string(),
            details: "<script>".to_string(),
        };

        let html = template.render()?;

        assert!(html.contains("<h1>Worker crashed</h1>"));
        assert!(html.contains("&lt;script&gt;"));

        Ok(())
    }

    #[test]
    fn test_text_report() -> TestResult {
        let template = ErrorReportTextTemplate {
            summary: "Worker crashed".to_string(),
            environment: "staging".to_string(),
            details: "at main.rs:10".to_string(),
        };

        let text = template.render()?;

        assert!(text.starts_with("Worker crashed"));
        assert!(text.contains("Environment: staging"));
        assert!(text.contains("at main.rs:10"));

        Ok(())
    }
}
