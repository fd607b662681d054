//! Note body templating.
//!
//! Templates are plain text with `{{ key }}` placeholders, the keys being
//! those of a [`RenderRecord`]. There is no other syntax: no filters, no
//! conditionals, no escaping. Two flavours of substitution exist:
//!
//! - [`render`] builds the machine-owned section of a note. Unknown keys
//!   render as nothing.
//! - [`substitute_frontmatter`] fills in frontmatter values of an existing
//!   note. Unknown keys are left in place so that a later sync, with more
//!   data, can still fill them.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use shelfnote_library::{RenderRecord, template::render};
//!
//! let record: RenderRecord = [("title", json!("Dune")), ("authorName", json!("Herbert"))].into_iter().collect();
//! assert_eq!(render("{{title}} by {{ authorName }}{{foo}}", &record), "Dune by Herbert");
//! ```

use crate::consts::TOKEN_REGEX;
use crate::record::RenderRecord;
use regex::Captures;
use serde_json::Value;

const NO_BOOKMARKS: &str = "No bookmarks";
const BOOKMARK_FALLBACK_TITLE: &str = "Bookmark";

/// Replace every `{{ key }}` in `template` with the record's value for `key`.
pub fn render(template: &str, record: &RenderRecord) -> String {
    TOKEN_REGEX
        .replace_all(template, |caps: &Captures| resolve(caps[1].trim(), record).unwrap_or_default())
        .into_owned()
}

/// Like [`render`], but tokens whose key has no value are kept verbatim.
///
/// On a `key: value` line only the part after the first colon is touched.
pub fn substitute_frontmatter(line: &str, record: &RenderRecord) -> String {
    let substitute = |text: &str| {
        TOKEN_REGEX
            .replace_all(text, |caps: &Captures| resolve(caps[1].trim(), record).unwrap_or_else(|| caps[0].to_string()))
            .into_owned()
    };
    match line.split_once(':') {
        Some((key, value)) => format!("{key}:{}", substitute(value)),
        None => substitute(line),
    }
}

/// Text for a single key, `None` when the record has nothing for it.
fn resolve(key: &str, record: &RenderRecord) -> Option<String> {
    let value = record.get(key)?;
    match (key, value) {
        ("bookmarks", Value::Array(bookmarks)) => Some(render_bookmarks(bookmarks)),
        (_, value) => Some(text(value)),
    }
}

fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        // Comma-joined, nested lists flattened, like a JavaScript array turned into a string.
        Value::Array(items) => items.iter().map(text).collect::<Vec<_>>().join(","),
        // Numbers, booleans and objects in their compact JSON form.
        other => other.to_string(),
    }
}

fn render_bookmarks(bookmarks: &[Value]) -> String {
    if bookmarks.is_empty() {
        return NO_BOOKMARKS.to_string();
    }
    bookmarks
        .iter()
        .map(|bookmark| {
            let title = bookmark
                .get("title")
                .and_then(Value::as_str)
                .filter(|title| !title.is_empty())
                .unwrap_or(BOOKMARK_FALLBACK_TITLE);
            let time = bookmark.get("time").and_then(Value::as_f64).unwrap_or(0.0);
            format!("- {title} - {}", format_time(time))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// `hh:mm:ss`, each part floored and zero-padded. Hours keep growing past 99.
///
/// ```
/// # use shelfnote_library::template::format_time;
/// assert_eq!(format_time(3725.0), "01:02:05");
/// assert_eq!(format_time(360_000.0), "100:00:00");
/// ```
pub fn format_time(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 { seconds.floor() as u64 } else { 0 };
    format!("{:02}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
}
