//! Prompt interpolation for AI-generated sections.
//!
//! Prompt templates are data with a narrow placeholder grammar:
//! `{{identifier}}`. Rendering substitutes collected field values; missing
//! or empty values become [`NOT_PROVIDED`] so the generation backend always
//! receives a complete instruction. Substitution is a single pass, so a
//! substituted value is never re-scanned for placeholders.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::types::FieldValues;

/// Text substituted for a missing or empty value.
pub const NOT_PROVIDED: &str = "Not provided";

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{([^{}]*)\}\}").expect("placeholder pattern is a valid regex")
});

static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is a valid regex")
});

/// Whether a placeholder body is a well-formed field identifier.
pub fn is_identifier(token: &str) -> bool {
    IDENTIFIER.is_match(token)
}

/// Bodies of every `{{...}}` token in a template, in order of appearance.
///
/// Malformed bodies (spaces, punctuation) are yielded as-is so that
/// registration can reject them.
pub fn placeholders(template: &str) -> impl Iterator<Item = &str> {
    PLACEHOLDER
        .captures_iter(template)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
}

/// Byte offset of the first `{{` or `}}` that is not part of a closed
/// placeholder, e.g. the `{{` of an unclosed `{{groundsDescription`.
pub fn stray_braces(template: &str) -> Option<usize> {
    let mut last = 0;
    for m in PLACEHOLDER.find_iter(template) {
        if let Some(pos) = double_brace(&template[last..m.start()]) {
            return Some(last + pos);
        }
        last = m.end();
    }
    double_brace(&template[last..]).map(|pos| last + pos)
}

fn double_brace(text: &str) -> Option<usize> {
    match (text.find("{{"), text.find("}}")) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

/// Render a prompt template against collected values.
///
/// Total and pure: identical arguments always yield identical output.
/// Tokens whose body is not an identifier are left untouched.
pub fn render(template: &str, values: &FieldValues) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures<'_>| {
            let body = &caps[1];
            if !is_identifier(body) {
                return caps[0].to_string();
            }
            match values.get(body) {
                Some(value) if !value.is_empty() => value.clone(),
                _ => NOT_PROVIDED.to_string(),
            }
        })
        .into_owned()
}

/// Join a multi-valued answer into the display string the interpolator
/// expects, e.g. a list of charges.
pub fn join_list<I, S>(items: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    items
        .into_iter()
        .map(|s| s.as_ref().trim().to_string())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}
