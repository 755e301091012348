//! Email template system.
//!
//! Templates live on disk under a single directory:
//!
//! - `<id>.txt`: first line is the subject, the rest is the text body
//! - `<id>.html`: HTML body, its `<title>` can supply the subject
//! - `layout.html`: optional wrapper, receives the body at `{{content}}`
//! - `layout.css`: optional stylesheet inlined into the HTML body
//!
//! Placeholders use `{{variable}}` syntax; unknown ones are left untouched.
//!
//! # Example
//!
//! ```ignore
//! let compiler = TemplateCompiler::new(TemplateStore::new("emails"), SubjectPrecedence::Text);
//!
//! let mut arguments = Arguments::new();
//! arguments.insert("order_id".to_string(), "ORD-123".to_string());
//!
//! let compiled = compiler.compile("order-shipped", &arguments).await?;
//! ```

mod compiler;
pub mod css;
pub mod html;
mod store;
mod substitution;
mod types;

pub use compiler::{compile_source, TemplateCompiler};
pub use store::TemplateStore;
pub use substitution::substitute_variables;
pub use types::{
    Arguments, CompiledMessage, SubjectPrecedence, TemplateError, TemplateResult, TemplateSource,
};
