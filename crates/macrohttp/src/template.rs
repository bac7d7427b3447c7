//! URL macro substitution
//!
//! Replaces `${key}` placeholders in a string with values produced by a
//! resolver. The URL resolver ([`resolve_segment`]) turns each value into a
//! path segment:
//!
//! ```ignore
//! use macrohttp::template;
//! use serde_json::json;
//!
//! let lookup = json!({"id": 42, "prefix": "api/v2"});
//! let url = template::try_substitute("${prefix}/users${id}", |_, key| {
//!     template::resolve_segment(&lookup, key)
//! })?;
//! assert_eq!(url, "api/v2/users/42");
//! ```

use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde_json::Value;

use crate::error::{HttpError, Result};

/// Check whether `text` contains at least one placeholder
pub fn has_placeholders(text: &str) -> bool {
    placeholder_regex().is_match(text)
}

/// Replace every placeholder with the resolver output.
///
/// The resolver receives the full match (`${key}`) and the trimmed key.
/// Text without placeholders is returned unchanged and the resolver is never
/// called.
pub fn substitute<F>(text: &str, mut resolver: F) -> String
where
    F: FnMut(&str, &str) -> String,
{
    if !has_placeholders(text) {
        return text.to_string();
    }

    placeholder_regex()
        .replace_all(text, |caps: &Captures| resolver(&caps[0], &caps[1]))
        .into_owned()
}

/// Fallible form of [`substitute`]; stops at the first resolver error.
pub fn try_substitute<F>(text: &str, mut resolver: F) -> Result<String>
where
    F: FnMut(&str, &str) -> Result<String>,
{
    if !has_placeholders(text) {
        return Ok(text.to_string());
    }

    let mut result = String::with_capacity(text.len());
    let mut last_end = 0;

    for caps in placeholder_regex().captures_iter(text) {
        let full = match caps.get(0) {
            Some(m) => m,
            None => continue,
        };
        result.push_str(&text[last_end..full.start()]);
        result.push_str(&resolver(full.as_str(), &caps[1])?);
        last_end = full.end();
    }
    result.push_str(&text[last_end..]);

    Ok(result)
}

/// Look up `key` in a JSON value.
///
/// A literal key wins; otherwise the key is walked as a dotted path where
/// numeric parts index into arrays (`items.0.id`).
pub fn lookup<'a>(root: &'a Value, key: &str) -> Option<&'a Value> {
    if let Some(value) = root.get(key) {
        return Some(value);
    }

    let mut current = root;
    for part in key.split('.') {
        current = match current {
            Value::Object(map) => map.get(part)?,
            Value::Array(items) => items.get(part.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Resolve `key` into a URL path segment.
///
/// Strings that already contain `/` are used verbatim; every other value is
/// prefixed with `/`. Missing keys and `null` fail with
/// [`HttpError::MissingVariable`].
pub fn resolve_segment(root: &Value, key: &str) -> Result<String> {
    match lookup(root, key) {
        None | Some(Value::Null) => Err(HttpError::MissingVariable(key.to_string())),
        Some(Value::String(s)) if s.contains('/') => Ok(s.clone()),
        Some(value) => Ok(format!("/{}", render(value))),
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

fn placeholder_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        // ${name}, ${ nested.path }
        Regex::new(r"\$\{\s*([A-Za-z0-9_$][A-Za-z0-9_$.\-]*)\s*\}").expect("Invalid regex")
    })
}
