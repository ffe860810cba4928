//! Jinja-style template renderer backed by `minijinja`.
//!
//! The whole document is rendered as one template, paragraphs joined by
//! newlines, so `{% if %}` and `{% for %}` blocks may span paragraphs.
//! Undefined names (and attribute lookups on them) render as empty text
//! unless the renderer is strict.

use minijinja::{Environment, UndefinedBehavior};
use tracing::debug;

use super::{HostError, HostResult, RenderContext, TemplateRenderer};
use crate::model::document::RawDocument;

#[derive(Debug, Clone)]
pub struct PlaceholderRenderer {
    env: Environment<'static>,
}

impl Default for PlaceholderRenderer {
    fn default() -> Self {
        Self::with_undefined(UndefinedBehavior::Chainable)
    }
}

impl PlaceholderRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail on undefined names instead of rendering them empty.
    pub fn strict() -> Self {
        Self::with_undefined(UndefinedBehavior::Strict)
    }

    fn with_undefined(behavior: UndefinedBehavior) -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(behavior);
        // A trailing empty paragraph must survive the round trip.
        env.set_keep_trailing_newline(true);
        Self { env }
    }
}

impl TemplateRenderer for PlaceholderRenderer {
    fn render(&self, document: &RawDocument, context: &RenderContext) -> HostResult<RawDocument> {
        if document.paragraphs().is_empty() {
            return Ok(RawDocument::new(document.path(), Vec::new()));
        }

        let source = document.paragraphs().join("\n");
        let rendered = self
            .env
            .render_str(&source, context)
            .map_err(|e| HostError::new(format!("template '{}': {e}", document.path().display())))?;

        let paragraphs: Vec<String> = rendered.split('\n').map(str::to_string).collect();
        debug!(
            before = document.paragraphs().len(),
            after = paragraphs.len(),
            "Rendered template"
        );
        Ok(RawDocument::new(document.path(), paragraphs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> RenderContext {
        let value = serde_json::json!({
            "name": "Ana",
            "email": "ana@example.com",
            "client": { "company": "ACME" },
            "count": 3,
            "items": ["Numbers", "Questions"],
            "urgent": true,
        });
        match value {
            serde_json::Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    fn doc(lines: &[&str]) -> RawDocument {
        RawDocument::new("t.txt", lines.iter().map(|l| l.to_string()).collect())
    }

    #[test]
    fn test_render_placeholders() {
        let doc = doc(&[
            "To: {{ email }}",
            "Hello {{name}} from {{ client.company }}, {{ count }} items",
        ]);
        let rendered = PlaceholderRenderer::new().render(&doc, &context()).unwrap();
        assert_eq!(
            rendered.paragraphs(),
            ["To: ana@example.com", "Hello Ana from ACME, 3 items"]
        );
    }

    #[test]
    fn test_blocks_span_paragraphs() {
        let doc = doc(&[
            "{% if urgent %}Importance: High{% endif %}",
            "Subject: Agenda",
            "",
            "{% for item in items %}- {{ item }}",
            "{% endfor %}Bye",
        ]);
        let rendered = PlaceholderRenderer::strict().render(&doc, &context()).unwrap();
        assert_eq!(
            rendered.paragraphs(),
            [
                "Importance: High",
                "Subject: Agenda",
                "",
                "- Numbers",
                "- Questions",
                "Bye"
            ]
        );
    }

    #[test]
    fn test_undefined_variable() {
        let doc = doc(&["Hi {{ missing }}{{ missing.name }}!"]);
        let rendered = PlaceholderRenderer::new().render(&doc, &context()).unwrap();
        assert_eq!(rendered.paragraphs(), ["Hi !"]);

        let err = PlaceholderRenderer::strict()
            .render(&doc, &context())
            .unwrap_err();
        assert!(err.message().contains("undefined"));
    }

    #[test]
    fn test_trailing_blank_paragraph_kept() {
        let doc = doc(&["Subject: {{ name }}", ""]);
        let rendered = PlaceholderRenderer::new().render(&doc, &context()).unwrap();
        assert_eq!(rendered.paragraphs(), ["Subject: Ana", ""]);
    }

    #[test]
    fn test_unclosed_placeholder() {
        let doc = doc(&["Hi {{ name"]);
        assert!(PlaceholderRenderer::new().render(&doc, &context()).is_err());
    }
}
