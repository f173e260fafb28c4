//! Merge-field templates for dunning emails.
//!
//! A small handlebars-style interpreter: `{{path}}` interpolation, `#if`,
//! `#unless`, `#each`, `#with` blocks and a fixed table of helpers passed
//! explicitly to every compile and render.

pub mod format;
pub mod helpers;
mod parser;
mod render;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::trace;
use uuid::Uuid;

use crate::errors::{Result, TemplateError};
use crate::types::{DunningStage, TemplateId};

pub use format::{format_currency, format_date, format_number, parse_currency};
pub use helpers::{HelperFn, HelperRegistry};

/// compiled template, reusable across renders
#[derive(Debug, Clone)]
pub struct Template {
    nodes: Vec<parser::Node>,
}

impl Template {
    /// parse `source`; helper names are checked against `helpers`
    pub fn compile(
        source: &str,
        helpers: &HelperRegistry,
    ) -> std::result::Result<Self, TemplateError> {
        Ok(Self { nodes: parser::parse(source, helpers)? })
    }

    /// render against `context`; `escape_html` escapes `{{ }}` output
    pub fn render(
        &self,
        context: &Value,
        helpers: &HelperRegistry,
        escape_html: bool,
    ) -> std::result::Result<String, TemplateError> {
        render::render_nodes(&self.nodes, context, helpers, escape_html)
    }
}

/// stored template for one dunning stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DunningTemplate {
    pub id: TemplateId,
    pub name: String,
    pub stage: DunningStage,
    pub subject: String,
    pub html: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl DunningTemplate {
    pub fn new(
        name: impl Into<String>,
        stage: DunningStage,
        subject: impl Into<String>,
        html: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            stage,
            subject: subject.into(),
            html: html.into(),
            text: None,
            is_default: false,
            is_active: true,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn as_default(mut self) -> Self {
        self.is_default = true;
        self
    }
}

/// active template for `stage`: the default one if flagged, else the first active
pub fn select_template<'t>(
    templates: &'t [DunningTemplate],
    stage: &DunningStage,
) -> Option<&'t DunningTemplate> {
    let mut candidates = templates.iter().filter(|t| t.is_active && &t.stage == stage);
    let first = candidates.next()?;
    if first.is_default {
        return Some(first);
    }
    Some(candidates.find(|t| t.is_default).unwrap_or(first))
}

/// subject, html and text bodies of one email
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// helper table plus the compile/render entry points built on it
#[derive(Debug, Clone)]
pub struct TemplateEngine {
    helpers: HelperRegistry,
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new(HelperRegistry::standard())
    }
}

impl TemplateEngine {
    pub fn new(helpers: HelperRegistry) -> Self {
        Self { helpers }
    }

    pub fn helpers(&self) -> &HelperRegistry {
        &self.helpers
    }

    pub fn compile(&self, source: &str) -> std::result::Result<Template, TemplateError> {
        Template::compile(source, &self.helpers)
    }

    /// render `source` unescaped
    pub fn render<C: Serialize>(&self, source: &str, context: &C) -> Result<String> {
        let context = serde_json::to_value(context)?;
        Ok(self.compile(source)?.render(&context, &self.helpers, false)?)
    }

    /// subject and text unescaped, html escaped; a missing text body renders as ""
    pub fn render_template<C: Serialize>(
        &self,
        template: &DunningTemplate,
        context: &C,
    ) -> Result<RenderedEmail> {
        let context = serde_json::to_value(context)?;
        let subject = self.compile(&template.subject)?.render(&context, &self.helpers, false)?;
        let html = self.compile(&template.html)?.render(&context, &self.helpers, true)?;
        let text = match &template.text {
            Some(source) => self.compile(source)?.render(&context, &self.helpers, false)?,
            None => String::new(),
        };
        trace!(template = %template.name, stage = %template.stage, "rendered template");
        Ok(RenderedEmail { subject, html, text })
    }
}

/// render one template string with the standard helpers
pub fn render<C: Serialize>(source: &str, context: &C) -> Result<String> {
    TemplateEngine::default().render(source, context)
}

/// render a stored template with the standard helpers
pub fn render_template<C: Serialize>(
    template: &DunningTemplate,
    context: &C,
) -> Result<RenderedEmail> {
    TemplateEngine::default().render_template(template, context)
}
