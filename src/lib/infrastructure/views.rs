//! Askama backed view renderer

use std::{collections::HashMap, fmt};

use askama::Template;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::domain::communication::{
    emails::error_report::{ErrorReportTemplate, ErrorReportTextTemplate},
    ViewError, ViewRenderer,
};

type RenderFn = Box<dyn Fn(&Value) -> Result<String, ViewError> + Send + Sync>;

/// Views registered by path
#[derive(Default)]
pub struct TemplateRegistry {
    views: HashMap<String, RenderFn>,
    inline_css: bool,
}

impl TemplateRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the bundled templates under `view_root`
    pub fn with_bundled_templates(view_root: &str) -> Self {
        let mut registry = Self::new().with_inlined_css();

        registry
            .register::<ErrorReportTemplate>(&format!("{view_root}/error_report.html"))
            .register::<ErrorReportTextTemplate>(&format!("{view_root}/error_report.txt"));

        registry
    }

    /// Inline `<style>` rules into HTML views
    pub fn with_inlined_css(mut self) -> Self {
        self.inline_css = true;
        self
    }

    /// Registers the template `T` under `path`.
    ///
    /// Render parameters are deserialized into `T` before rendering.
    pub fn register<T>(&mut self, path: &str) -> &mut Self
    where
        T: Template + DeserializeOwned + 'static,
    {
        let view = path.to_string();

        let render: RenderFn = Box::new(move |params: &Value| {
            let template: T =
                serde_json::from_value(params.clone()).map_err(|e| ViewError::InvalidParams {
                    path: view.clone(),
                    reason: e.to_string(),
                })?;

            template
                .render()
                .map_err(|e| ViewError::UnknownError(e.into()))
        });

        self.views.insert(path.to_string(), render);
        self
    }
}

impl ViewRenderer for TemplateRegistry {
    fn render(&self, path: &str, params: &Value) -> Result<String, ViewError> {
        let render = self
            .views
            .get(path)
            .ok_or_else(|| ViewError::NotFound(path.to_string()))?;

        let rendered = render(params)?;

        debug!(path, "view rendered");

        if self.inline_css && path.ends_with(".html") {
            return css_inline::inline(&rendered).map_err(|e| ViewError::UnknownError(e.into()));
        }

        Ok(rendered)
    }
}

impl fmt::Debug for TemplateRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateRegistry")
            .field("views", &self.views.keys().collect::<Vec<_>>())
            .field("inline_css", &self.inline_css)
            .finish()
    }
}
