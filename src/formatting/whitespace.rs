//! Whitespace normalization.
//!
//! - trailing spaces and tabs are removed from every line
//! - blank lines at the end of the file are removed
//! - a non-empty file ends with exactly one line ending
//!
//! Line endings are preserved; the final newline, when one has to be
//! inserted, uses `\r\n` if the file already contains any.

use super::{FormatEdit, Formatter, TextChange};

pub const WHITESPACE_FORMATTER_ID: &str = "WHITESPACE";

#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceFormatter;

impl Formatter for WhitespaceFormatter {
    fn id(&self) -> &'static str {
        WHITESPACE_FORMATTER_ID
    }

    fn format(&self, text: &str) -> FormatEdit {
        if text.is_empty() {
            return FormatEdit::unchanged(text);
        }

        let newline = if text.contains("\r\n") { "\r\n" } else { "\n" };
        let segments: Vec<(&str, &str)> = text.split_inclusive('\n').map(split_ending).collect();
        let keep = segments
            .iter()
            .rposition(|(content, _)| !trim_line(content).is_empty())
            .map_or(0, |index| index + 1);

        let mut output = String::with_capacity(text.len());
        let mut changes = Vec::new();
        for (index, (content, ending)) in segments[..keep].iter().enumerate() {
            let trimmed = trim_line(content);
            if trimmed.len() != content.len() {
                changes.push(TextChange::new(
                    index + 1,
                    trimmed.chars().count() + 1,
                    "Remove trailing whitespace",
                ));
            }
            output.push_str(trimmed);
            output.push_str(ending);
        }

        if keep < segments.len() {
            changes.push(TextChange::new(keep + 1, 1, "Remove trailing blank lines"));
        }

        if keep > 0 && !output.ends_with('\n') {
            let last = trim_line(segments[keep - 1].0);
            changes.push(TextChange::new(
                keep,
                last.chars().count() + 1,
                "Insert final newline",
            ));
            output.push_str(newline);
        }

        FormatEdit {
            text: output,
            changes,
        }
    }
}

fn trim_line(content: &str) -> &str {
    content.trim_end_matches([' ', '\t'])
}

/// Split a line into its content and its `\n` / `\r\n` ending.
fn split_ending(segment: &str) -> (&str, &str) {
    if let Some(content) = segment.strip_suffix("\r\n") {
        (content, "\r\n")
    } else if let Some(content) = segment.strip_suffix('\n') {
        (content, "\n")
    } else {
        (segment, "")
    }
}
