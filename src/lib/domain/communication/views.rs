//! View rendering port

use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

#[cfg(test)]
use mockall::mock;

lazy_static! {
    static ref TAG_REGEX: Regex = Regex::new(r"<[^>]*>").unwrap();
}

/// Errors raised while rendering a view
#[derive(Debug, Error)]
pub enum ViewError {
    /// No view is registered under the path
    #[error("view not found: {0}")]
    NotFound(String),

    /// The parameters do not fit the view
    #[error("invalid parameters for view {path}: {reason}")]
    InvalidParams {
        /// The view path
        path: String,

        /// Why the parameters were rejected
        reason: String,
    },

    /// Unknown error
    #[error(transparent)]
    UnknownError(#[from] anyhow::Error),
}

/// Renders named views into strings
pub trait ViewRenderer: Send + Sync + 'static {
    /// Renders the view at `path` with `params`
    fn render(&self, path: &str, params: &Value) -> Result<String, ViewError>;
}

#[cfg(test)]
mock! {
    pub ViewRenderer {}

    impl ViewRenderer for ViewRenderer {
        fn render(&self, path: &str, params: &Value) -> Result<String, ViewError>;
    }
}

/// The views used to build a message body
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ViewSelector {
    /// The HTML view, relative to the view root
    pub html: String,

    /// The plain text view, relative to the view root
    #[serde(default)]
    pub text: Option<String>,
}

impl ViewSelector {
    /// Selects an HTML view only; the plain text body is derived from it
    pub fn html(view: &str) -> Self {
        Self {
            html: view.to_string(),
            text: None,
        }
    }

    /// Adds a plain text view
    pub fn with_text(mut self, view: &str) -> Self {
        self.text = Some(view.to_string());
        self
    }
}

/// Removes markup tags, leaving the text content
pub fn strip_tags(html: &str) -> String {
    TAG_REGEX.replace_all(html, "").trim().to_string()
}
