//! Stylesheet inlining for HTML bodies.
//!
//! Mail clients ignore most `<style>` blocks, so the shared layout stylesheet
//! is merged into `style` attributes of the matching elements.

use std::borrow::Cow;

pub use css_inline::InlineError;

/// Apply `css` to `html`, writing matching rules into `style` attributes.
///
/// `<style>` blocks already present in the document are inlined too.
pub fn inline_css(html: &str, css: &str) -> Result<String, InlineError> {
    let inliner = css_inline::CSSInliner::options()
        .extra_css(Some(Cow::Borrowed(css)))
        .build();

    inliner.inline(html)
}
