//! Template compilation: subject extraction, layout wrapping, substitution
//! and CSS inlining.

use std::time::Instant;

use crate::metrics::SendMetrics;

use super::css::inline_css;
use super::html::{extract_title, html_to_text, strip_title};
use super::store::TemplateStore;
use super::substitution::substitute_variables;
use super::types::{
    Arguments, CompiledMessage, SubjectPrecedence, TemplateError, TemplateResult, TemplateSource,
};

/// Placeholder in `layout.html` that receives the template's HTML body
const LAYOUT_CONTENT_KEY: &str = "content";

/// Loads templates from a [`TemplateStore`] and renders them.
#[derive(Debug, Clone)]
pub struct TemplateCompiler {
    store: TemplateStore,
    precedence: SubjectPrecedence,
}

impl TemplateCompiler {
    pub fn new(store: TemplateStore, precedence: SubjectPrecedence) -> Self {
        Self { store, precedence }
    }

    pub fn store(&self) -> &TemplateStore {
        &self.store
    }

    pub fn precedence(&self) -> SubjectPrecedence {
        self.precedence
    }

    /// Load template `id` from disk and compile it with `arguments`.
    pub async fn compile(&self, id: &str, arguments: &Arguments) -> TemplateResult<CompiledMessage> {
        let started = Instant::now();
        let source = self.store.load(id).await?;
        let compiled = compile_source(source, arguments, self.precedence)?;
        SendMetrics::record_compile(started.elapsed());
        Ok(compiled)
    }
}

/// Compile already-loaded template content.
///
/// Steps, in order:
/// 1. split `<id>.txt` into subject (first line) and text body
/// 2. wrap the HTML body in the layout's `{{content}}` placeholder
/// 3. take the `<title>` as subject according to `precedence`, then drop it
/// 4. derive a text body from the HTML when the text template gave none
/// 5. substitute `arguments` into subject, text and HTML
/// 6. inline the stylesheet into the HTML
///
/// Only a source with neither text nor HTML is an error.
pub fn compile_source(
    source: TemplateSource,
    arguments: &Arguments,
    precedence: SubjectPrecedence,
) -> TemplateResult<CompiledMessage> {
    let TemplateSource {
        id,
        dir,
        text: text_source,
        html: html_source,
        layout,
        css,
    } = source;

    if text_source.is_none() && html_source.is_none() {
        return Err(TemplateError::NotFound {
            template_id: id,
            dir,
        });
    }

    let mut subject: Option<String> = None;
    let mut text: Option<String> = None;

    if let Some(raw) = text_source {
        let (first_line, body) = split_subject(&raw);
        // A blank first line leaves the subject to the HTML title
        if !first_line.trim().is_empty() {
            subject = Some(first_line.to_string());
        }
        text = Some(body.to_string());
    }

    let html = html_source.map(|body| {
        let wrapped = match &layout {
            Some(layout) => {
                let mut content = Arguments::new();
                content.insert(LAYOUT_CONTENT_KEY.to_string(), body);
                substitute_variables(layout, &content)
            }
            None => body,
        };

        if let Some(title) = extract_title(&wrapped) {
            let replace = match precedence {
                SubjectPrecedence::Text => subject.is_none(),
                SubjectPrecedence::HtmlTitle => true,
            };
            if replace {
                subject = Some(title);
            }
        }

        strip_title(&wrapped)
    });

    if let Some(html) = &html {
        if text.as_deref().map_or(true, |body| body.trim().is_empty()) {
            text = Some(html_to_text(html));
        }
    }

    let subject = substitute_variables(subject.as_deref().unwrap_or_default(), arguments);
    let text = text.map(|body| substitute_variables(&body, arguments));
    let html = html.map(|body| {
        let rendered = substitute_variables(&body, arguments);
        match css.as_deref().filter(|css| !css.trim().is_empty()) {
            Some(css) => match inline_css(&rendered, css) {
                Ok(inlined) => inlined,
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        template_id = %id,
                        "CSS inlining failed, sending HTML without inlined styles"
                    );
                    rendered
                }
            },
            None => rendered,
        }
    });

    tracing::debug!(
        template_id = %id,
        subject = %subject,
        has_text = text.is_some(),
        has_html = html.is_some(),
        "Compiled email template"
    );

    Ok(CompiledMessage {
        subject,
        text,
        html,
    })
}

/// Split at the first newline; the subject loses a trailing `\r`.
fn split_subject(raw: &str) -> (&str, &str) {
    match raw.split_once('\n') {
        Some((first, rest)) => (first.strip_suffix('\r').unwrap_or(first), rest),
        None => (raw.strip_suffix('\r').unwrap_or(raw), ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(text: Option<&str>, html: Option<&str>) -> TemplateSource {
        TemplateSource {
            id: "test".to_string(),
            dir: "/templates".to_string(),
            text: text.map(str::to_string),
            html: html.map(str::to_string),
            layout: None,
            css: None,
        }
    }

    fn args(pairs: &[(&str, &str)]) -> Arguments {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_text_only() {
        let compiled = compile_source(
            source(Some("Test {{now}}\nOur test value is {{now}}"), None),
            &args(&[("now", "2024-01-01")]),
            SubjectPrecedence::Text,
        )
        .unwrap();

        assert_eq!(compiled.subject, "Test 2024-01-01");
        assert_eq!(compiled.text.as_deref(), Some("Our test value is 2024-01-01"));
        assert!(compiled.html.is_none());
    }

    #[test]
    fn test_crlf_subject() {
        let compiled = compile_source(
            source(Some("Subject line\r\nBody\r\n"), None),
            &Arguments::new(),
            SubjectPrecedence::Text,
        )
        .unwrap();

        assert_eq!(compiled.subject, "Subject line");
        assert_eq!(compiled.text.as_deref(), Some("Body\r\n"));
    }

    #[test]
    fn test_html_only_uses_title() {
        let compiled = compile_source(
            source(
                None,
                Some("<html><head><title> Hello {{name}} </title></head><body><p>Hi {{name}}</p></body></html>"),
            ),
            &args(&[("name", "Al")]),
            SubjectPrecedence::Text,
        )
        .unwrap();

        assert_eq!(compiled.subject, "Hello Al");
        let html = compiled.html.unwrap();
        assert!(!html.contains("<title>"));
        assert!(html.contains("<p>Hi Al</p>"));
        assert_eq!(compiled.text.as_deref(), Some("Hi Al"));
    }

    #[test]
    fn test_text_subject_wins_by_default() {
        let compiled = compile_source(
            source(
                Some("From text\nBody"),
                Some("<title>From html</title><p>Body</p>"),
            ),
            &Arguments::new(),
            SubjectPrecedence::Text,
        )
        .unwrap();

        assert_eq!(compiled.subject, "From text");
        assert!(!compiled.html.unwrap().contains("From html"));
    }

    #[test]
    fn test_html_title_precedence() {
        let compiled = compile_source(
            source(
                Some("From text\nBody"),
                Some("<title>From html</title><p>Body</p>"),
            ),
            &Arguments::new(),
            SubjectPrecedence::HtmlTitle,
        )
        .unwrap();

        assert_eq!(compiled.subject, "From html");
        assert_eq!(compiled.text.as_deref(), Some("Body"));
    }

    #[test]
    fn test_layout_wraps_html() {
        let mut src = source(None, Some("<p>Inner {{name}}</p>"));
        src.layout = Some(
            "<html><head><title>Layout title</title></head><body>{{content}}</body></html>"
                .to_string(),
        );

        let compiled = compile_source(src, &args(&[("name", "Al")]), SubjectPrecedence::Text)
            .unwrap();

        assert_eq!(compiled.subject, "Layout title");
        let html = compiled.html.unwrap();
        assert!(html.contains("<body><p>Inner Al</p></body>"));
        assert!(!html.contains("{{content}}"));
    }

    #[test]
    fn test_empty_text_body_falls_back_to_html() {
        let compiled = compile_source(
            source(Some("Only a subject"), Some("<p>Rich body</p>")),
            &Arguments::new(),
            SubjectPrecedence::Text,
        )
        .unwrap();

        assert_eq!(compiled.subject, "Only a subject");
        assert_eq!(compiled.text.as_deref(), Some("Rich body"));
    }

    #[test]
    fn test_unmatched_placeholders_kept() {
        let compiled = compile_source(
            source(Some("Hi {{name}}\nYour code is {{code}}"), None),
            &args(&[("name", "Al")]),
            SubjectPrecedence::Text,
        )
        .unwrap();

        assert_eq!(compiled.subject, "Hi Al");
        assert_eq!(compiled.text.as_deref(), Some("Your code is {{code}}"));
    }

    #[test]
    fn test_css_inlined_into_html() {
        let mut src = source(
            Some("Subject\nBody"),
            Some("<html><head></head><body><p class=\"note\">Styled</p></body></html>"),
        );
        src.css = Some(".note { color: blue }".to_string());

        let compiled = compile_source(src, &Arguments::new(), SubjectPrecedence::Text).unwrap();

        let html = compiled.html.unwrap();
        assert!(html.contains("style="));
        assert!(html.contains("blue"));
        assert_eq!(compiled.text.as_deref(), Some("Body"));
    }

    #[test]
    fn test_css_ignored_without_html() {
        let mut src = source(Some("Subject\nBody"), None);
        src.css = Some("p { color: blue }".to_string());

        let compiled = compile_source(src, &Arguments::new(), SubjectPrecedence::Text).unwrap();
        assert!(compiled.html.is_none());
    }

    #[test]
    fn test_blank_text_subject_falls_back_to_title() {
        let html = "<title>Real subject</title><p>x</p>";

        let compiled = compile_source(
            source(Some("\nBody"), Some(html)),
            &Arguments::new(),
            SubjectPrecedence::Text,
        )
        .unwrap();
        assert_eq!(compiled.subject, "Real subject");
        assert_eq!(compiled.text.as_deref(), Some("Body"));

        let compiled =
            compile_source(source(Some(""), Some(html)), &Arguments::new(), SubjectPrecedence::Text)
                .unwrap();
        assert_eq!(compiled.subject, "Real subject");
        assert_eq!(compiled.text.as_deref(), Some("x"));
    }

    #[test]
    fn test_no_sources_is_not_found() {
        let result = compile_source(source(None, None), &Arguments::new(), SubjectPrecedence::Text);
        assert!(matches!(result, Err(TemplateError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_compile_from_store() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("welcome.txt"), "Welcome {{name}}\nHello {{email}}").unwrap();

        let compiler = TemplateCompiler::new(TemplateStore::new(dir.path()), SubjectPrecedence::Text);
        let compiled = compiler
            .compile("welcome", &args(&[("name", "Al"), ("email", "a@b.com")]))
            .await
            .unwrap();

        assert_eq!(compiled.subject, "Welcome Al");
        assert_eq!(compiled.text.as_deref(), Some("Hello a@b.com"));
    }
}
