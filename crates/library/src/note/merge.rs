use super::{METADATA_END, METADATA_START, USER_HEADING};
use crate::record::RenderRecord;
use crate::template::substitute_frontmatter;
use std::ops::Range;

/// Full text of a note that doesn't exist yet.
///
/// ```
/// # use shelfnote_library::note::compose;
/// assert_eq!(
///     compose("# Dune"),
///     "%%Metadata - When Syncing everything between these comments will be rewritten%%\n# Dune\n%%\n\n# Your notes here",
/// );
/// ```
pub fn compose(body: &str) -> String {
    format!("{}\n\n{USER_HEADING}", section(body))
}

fn section(body: &str) -> String {
    format!("{METADATA_START}\n{body}\n{METADATA_END}")
}

/// Byte offsets of a frontmatter block at the very top of a note.
struct Frontmatter {
    /// Lines between the two `---` delimiters.
    inner: Range<usize>,
    /// End of the closing delimiter line, including its line break.
    end: usize,
}

fn find_frontmatter(text: &str) -> Option<Frontmatter> {
    let opening = ["---\n", "---\r\n"].into_iter().find(|opening| text.starts_with(opening))?.len();
    let mut offset = opening;
    for line in text[opening..].split_inclusive('\n') {
        if line.trim_end_matches(['\n', '\r']) == "---" {
            return Some(Frontmatter {
                inner: opening..offset,
                end: offset + line.len(),
            });
        }
        offset += line.len();
    }
    None
}

/// Contents of the first metadata section: from the start marker to the next
/// line holding nothing but the end marker.
///
/// Rendered bodies may contain `%%` themselves, so a bare `%%` only closes
/// the section when no such line follows the start marker.
fn find_section(text: &str) -> Option<Range<usize>> {
    let start = text.find(METADATA_START)? + METADATA_START.len();
    let after = &text[start..];
    let end = closing_line(after).or_else(|| after.find(METADATA_END))?;
    Some(start..start + end)
}

/// Offset of the first line that is exactly the end marker.
fn closing_line(text: &str) -> Option<usize> {
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        if line.trim_end_matches(['\n', '\r']) == METADATA_END {
            return Some(offset);
        }
        offset += line.len();
    }
    None
}

fn substitute_lines(lines: &str, record: &RenderRecord) -> String {
    lines
        .split_inclusive('\n')
        .map(|line| {
            let content = line.trim_end_matches(['\n', '\r']);
            format!("{}{}", substitute_frontmatter(content, record), &line[content.len()..])
        })
        .collect()
}

/// Merge a freshly rendered `body` into the current text of a note.
///
/// Frontmatter values get their `{{key}}` tokens filled from `record`. The
/// first metadata section after the frontmatter has its contents replaced;
/// when there is none, a new section is inserted right after the
/// frontmatter (or at the top). Nothing else changes, so merging the same
/// body twice is a no-op.
pub fn merge(current: &str, body: &str, record: &RenderRecord) -> String {
    let (head, rest) = match find_frontmatter(current) {
        Some(Frontmatter { inner, end }) => {
            let head = format!(
                "{}{}{}",
                &current[..inner.start],
                substitute_lines(&current[inner.clone()], record),
                &current[inner.end..end]
            );
            (head, &current[end..])
        },
        None => (String::new(), current),
    };

    match find_section(rest) {
        Some(contents) => format!("{head}{}\n{body}\n{}", &rest[..contents.start], &rest[contents.end..]),
        None => {
            if rest.contains(METADATA_START) {
                tracing::warn!("Metadata section is never closed, inserting a new one above it");
            }
            // Frontmatter closed at the very end of the file has no line break yet.
            let separator = if head.is_empty() || head.ends_with('\n') { "" } else { "\n" };
            format!("{head}{separator}{}\n{rest}", section(body))
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn record() -> RenderRecord {
        [("title", json!("Dune")), ("authorName", json!("Frank Herbert")), ("Progress", json!(67))].into_iter().collect()
    }

    #[test]
    fn test_merge_of_composed_note_is_identity() {
        let note = compose("# Dune\nby Frank Herbert");
        assert_eq!(merge(&note, "# Dune\nby Frank Herbert", &record()), note);
    }

    #[test]
    fn test_merge_replaces_only_the_section() {
        let current = format!("{METADATA_START}\nold body\n{METADATA_END}\n\n# Your notes here\nMy thoughts %% with markers %%\n");
        let merged = merge(&current, "new body", &record());
        assert_eq!(
            merged,
            format!("{METADATA_START}\nnew body\n{METADATA_END}\n\n# Your notes here\nMy thoughts %% with markers %%\n")
        );
    }

    #[test]
    fn test_merge_keeps_text_around_the_section() {
        let current = format!("Intro written by me.\n\n{METADATA_START}old{METADATA_END} trailing\nOutro.");
        let merged = merge(&current, "new", &record());
        assert_eq!(merged, format!("Intro written by me.\n\n{METADATA_START}\nnew\n{METADATA_END} trailing\nOutro."));
    }

    #[test]
    fn test_merge_only_touches_first_section() {
        let second = format!("{METADATA_START}\nsecond\n{METADATA_END}");
        let current = format!("{METADATA_START}\nfirst\n{METADATA_END}\n{second}");
        let merged = merge(&current, "new", &record());
        assert_eq!(merged, format!("{METADATA_START}\nnew\n{METADATA_END}\n{second}"));
    }

    #[test]
    fn test_merge_substitutes_frontmatter_values() {
        let current = format!(
            "---\ntitle: {{{{title}}}}\nprogress: {{{{Progress}}}}%\nrating: {{{{myRating}}}}\n---\n{METADATA_START}\nold\n{METADATA_END}\n\nNotes about {{{{title}}}}.\n"
        );
        let merged = merge(&current, "new", &record());
        assert_eq!(
            merged,
            format!(
                "---\ntitle: Dune\nprogress: 67%\nrating: {{{{myRating}}}}\n---\n{METADATA_START}\nnew\n{METADATA_END}\n\nNotes about {{{{title}}}}.\n"
            )
        );
        assert_eq!(merge(&merged, "new", &record()), merged);
    }

    #[test]
    fn test_merge_inserts_missing_section_after_frontmatter() {
        let current = "---\ntags: [book]\n---\nMy own notes.\n";
        let merged = merge(current, "body", &record());
        assert_eq!(merged, format!("---\ntags: [book]\n---\n{METADATA_START}\nbody\n{METADATA_END}\nMy own notes.\n"));
        assert_eq!(merge(&merged, "body", &record()), merged);
    }

    #[test]
    fn test_merge_inserts_missing_section_at_top() {
        let merged = merge("Just my notes.", "body", &record());
        assert_eq!(merged, format!("{METADATA_START}\nbody\n{METADATA_END}\nJust my notes."));
    }

    #[test]
    fn test_merge_frontmatter_closed_at_end_of_file() {
        let merged = merge("---\ntitle: {{title}}\n---", "body", &record());
        assert_eq!(merged, format!("---\ntitle: Dune\n---\n{METADATA_START}\nbody\n{METADATA_END}\n"));
    }

    #[test]
    fn test_merge_accepts_crlf_frontmatter() {
        let current = format!("---\r\ntitle: {{{{title}}}}\r\n---\r\n{METADATA_START}\nold\n{METADATA_END}\r\nmine\r\n");
        let merged = merge(&current, "new", &record());
        assert_eq!(merged, format!("---\r\ntitle: Dune\r\n---\r\n{METADATA_START}\nnew\n{METADATA_END}\r\nmine\r\n"));
    }

    #[rstest]
    #[case::not_at_top("\n---\ntitle: {{title}}\n---\n")]
    #[case::never_closed("---\ntitle: {{title}}\n")]
    #[case::indented_delimiter("---\ntitle: {{title}}\n ---\n")]
    fn test_merge_ignores_invalid_frontmatter(#[case] current: &str) {
        let merged = merge(current, "body", &record());
        assert!(merged.ends_with(current), "user text changed: {merged:?}");
        assert!(merged.starts_with(METADATA_START));
    }

    #[test]
    fn test_merge_body_containing_end_marker_converges() {
        let body = "Save 50%% today\n%% not a marker";
        let note = compose(body);
        let once = merge(&note, body, &record());
        assert_eq!(once, note);
        assert_eq!(merge(&once, body, &record()), once);

        let updated = merge(&once, "Now 75%% off", &record());
        assert_eq!(updated, compose("Now 75%% off"));
    }

    #[test]
    fn test_merge_prefers_end_marker_on_its_own_line() {
        let current = format!("{METADATA_START}\nold %% inline\n{METADATA_END}\nMine %% too\n");
        let merged = merge(&current, "new", &record());
        assert_eq!(merged, format!("{METADATA_START}\nnew\n{METADATA_END}\nMine %% too\n"));
    }

    #[test]
    fn test_merge_unterminated_section_is_replaced_by_a_new_one() {
        let current = format!("{METADATA_START}\ndangling");
        let merged = merge(&current, "body", &record());
        assert_eq!(merged, format!("{METADATA_START}\nbody\n{METADATA_END}\n{current}"));
        assert_eq!(merge(&merged, "body", &record()), merged);
    }
}
