use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::caption::{classify, strip_inline_timestamps, LineKind};
use crate::types::CleanTextDocument;

/// Lines per paragraph before a forced break.
const MAX_PARAGRAPH_LINES: usize = 6;

static MARKUP_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"</?[a-zA-Z][^>]*>").unwrap());

/// Turn raw caption markup into clean paragraphs.
///
/// Rolling captions repeat the previous cue's text; a paragraph identical to
/// the one before it is dropped.
pub fn normalize(raw: &str) -> CleanTextDocument {
    let raw = strip_inline_timestamps(raw);

    let mut paragraphs: Vec<String> = Vec::new();
    let mut buffer: Vec<&str> = Vec::new();

    for line in raw.lines().map(str::trim) {
        let kind = classify(line);
        if kind.is_structural() {
            flush(&mut buffer, &mut paragraphs);
            continue;
        }
        if kind != LineKind::Content {
            continue;
        }

        buffer.push(line);
        if buffer.len() >= MAX_PARAGRAPH_LINES {
            flush(&mut buffer, &mut paragraphs);
        }
    }
    flush(&mut buffer, &mut paragraphs);

    debug!(paragraphs = paragraphs.len(), "normalized captions");
    CleanTextDocument { paragraphs }
}

/// The spoken-content lines `normalize` builds its paragraphs from, in order.
pub fn content_lines(raw: &str) -> Vec<String> {
    strip_inline_timestamps(raw)
        .lines()
        .map(str::trim)
        .filter(|line| classify(line) == LineKind::Content)
        .map(str::to_string)
        .collect()
}

fn flush(buffer: &mut Vec<&str>, paragraphs: &mut Vec<String>) {
    if buffer.is_empty() {
        return;
    }

    let joined = buffer.join(" ");
    buffer.clear();

    let stripped = MARKUP_TAG.replace_all(&joined, "");
    let paragraph = stripped.split_whitespace().collect::<Vec<_>>().join(" ");

    if paragraph.is_empty() {
        return;
    }
    if paragraphs.last().is_some_and(|prev| prev.trim() == paragraph) {
        return;
    }
    paragraphs.push(paragraph);
}
