//! Template engine for the visual report

use crate::errors::{RenderError, RenderResult};
use handlebars::Handlebars;
use serde_json::Value;

/// Name under which the built-in HTML summary template is registered
pub const HTML_SUMMARY_TEMPLATE: &str = "html_summary";

const HTML_SUMMARY_SOURCE: &str = include_str!("../templates/summary.html.hbs");

/// Handlebars wrapper with the built-in report templates registered
#[derive(Debug, Clone)]
pub struct TemplateEngine {
    handlebars: Handlebars<'static>,
}

impl TemplateEngine {
    pub fn new() -> RenderResult<Self> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(true); // Error on missing variables

        handlebars
            .register_template_string(HTML_SUMMARY_TEMPLATE, HTML_SUMMARY_SOURCE)
            .map_err(|e| RenderError::TemplateRegistration {
                name: HTML_SUMMARY_TEMPLATE.to_string(),
                error: e.to_string(),
            })?;

        Ok(Self { handlebars })
    }

    /// Render a registered template
    pub fn render(&self, name: &str, data: &Value) -> RenderResult<String> {
        self.handlebars
            .render(name, data)
            .map_err(|e| RenderError::TemplateRender {
                template: name.to_string(),
                error: e.to_string(),
            })
    }

    /// Render an ad-hoc template string
    pub fn render_inline(&self, template: &str, data: &Value) -> RenderResult<String> {
        self.handlebars
            .render_template(template, data)
            .map_err(|e| RenderError::TemplateRender {
                template: template.to_string(),
                error: e.to_string(),
            })
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.handlebars.has_template(name)
    }
}
