//! Template types and error definitions

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Template-specific error type
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Email template '{template_id}' did not exist within '{dir}'")]
    NotFound { template_id: String, dir: String },
}

/// Result type for template operations
pub type TemplateResult<T> = Result<T, TemplateError>;

/// Placeholder name to substitution value
pub type Arguments = HashMap<String, String>;

/// Which subject wins when both the text and HTML templates provide one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectPrecedence {
    /// First line of `<id>.txt`; the HTML `<title>` is only used without it
    #[default]
    Text,
    /// The HTML `<title>` replaces the text subject whenever it is present
    HtmlTitle,
}

/// Raw template content as found on disk for one send.
#[derive(Debug, Clone, Default)]
pub struct TemplateSource {
    /// Template identifier
    pub id: String,

    /// Directory the template was resolved in (for error messages)
    pub dir: String,

    /// Contents of `<id>.txt`
    pub text: Option<String>,

    /// Contents of `<id>.html`
    pub html: Option<String>,

    /// Contents of `layout.html`
    pub layout: Option<String>,

    /// `layout.css` followed by the additional stylesheet, if any
    pub css: Option<String>,
}

/// A fully rendered message ready for the transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledMessage {
    pub subject: String,
    pub text: Option<String>,
    pub html: Option<String>,
}
