//! Variable substitution engine for templates

use lazy_static::lazy_static;
use regex::{Captures, Regex};

use super::types::Arguments;

lazy_static! {
    static ref PLACEHOLDER: Regex =
        Regex::new(r"\{\{\s*([A-Za-z0-9_.\-]+)\s*\}\}").unwrap();
}

/// Substitute `{{variable}}` placeholders in a string.
///
/// Unknown placeholders are kept verbatim. Substituted values are not
/// scanned again, so a value containing `{{...}}` is inserted literally.
pub fn substitute_variables(template: &str, variables: &Arguments) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| match variables.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}
