//! WebVTT-style caption parsing.
//!
//! Both the normalizer and the SRT converter decide which lines are structure
//! and which are spoken content through [`classify`], so the two paths always
//! retain the same lines.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use crate::types::{CaptionCue, CaptionDocument, Timestamp};

static INLINE_TIMESTAMP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<\d+:\d+:\d+\.\d+>|\[\d+:\d+:\d+\.\d+\]").unwrap());

static TIMESTAMP_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+:\d+:\d+").unwrap());

static SINGLE_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"^<[^<>]*>$").unwrap());

static TIMING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\S+?)\s*-->\s*(\S+)").unwrap());

const METADATA_PREFIXES: [&str; 4] = ["Kind:", "Language:", "Transcriber:", "Reviewer:"];

/// What a single trimmed caption line is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Blank,
    /// The `WEBVTT` file header.
    Header,
    /// A `start --> end` range line, with or without cue settings.
    Timing,
    /// A bare cue number.
    Index,
    /// A line that starts with `H:M:S` but is not a range line.
    TimestampPrefix,
    /// A line consisting of exactly one markup tag, e.g. `<c.colorE5E5E5>`.
    Tag,
    /// `Kind: captions`, `Language: en` and similar declarations.
    Metadata,
    Content,
}

impl LineKind {
    /// Structural lines end the paragraph being accumulated by the normalizer.
    pub fn is_structural(self) -> bool {
        matches!(
            self,
            LineKind::Blank
                | LineKind::Header
                | LineKind::Timing
                | LineKind::Index
                | LineKind::TimestampPrefix
        )
    }
}

pub fn classify(line: &str) -> LineKind {
    let line = line.trim();
    if line.is_empty() {
        LineKind::Blank
    } else if line.starts_with("WEBVTT") {
        LineKind::Header
    } else if line.contains("-->") {
        LineKind::Timing
    } else if line.bytes().all(|b| b.is_ascii_digit()) {
        LineKind::Index
    } else if TIMESTAMP_PREFIX.is_match(line) {
        LineKind::TimestampPrefix
    } else if SINGLE_TAG.is_match(line) {
        LineKind::Tag
    } else if METADATA_PREFIXES.iter().any(|p| line.starts_with(p)) {
        LineKind::Metadata
    } else {
        LineKind::Content
    }
}

/// Remove word-level timing markers such as `<00:00:01.250>` or `[00:00:01.250]`.
pub fn strip_inline_timestamps(text: &str) -> Cow<'_, str> {
    INLINE_TIMESTAMP.replace_all(text, "")
}

/// Parse the start and end of a range line like `00:00:01.000 --> 00:00:02.500 align:start`.
pub fn parse_timing(line: &str) -> Option<(Timestamp, Timestamp)> {
    let caps = TIMING.captures(line.trim())?;
    let start = caps[1].parse().ok()?;
    let end = caps[2].parse().ok()?;
    Some((start, end))
}

/// Parse caption markup into cues.
///
/// Content lines are attached to the most recent cue until the next range
/// line. A range line whose timestamps cannot be read still opens a cue,
/// pinned to the end of the previous one. Inline word timings are removed
/// from cue text. Content before the first cue has no timing and is dropped,
/// as are cues that end up with no text.
pub fn parse_captions(raw: &str) -> CaptionDocument {
    let raw = strip_inline_timestamps(raw);
    let mut cues = Vec::new();
    let mut current: Option<CaptionCue> = None;
    let mut pending_index: Option<u32> = None;
    let mut orphaned = 0usize;

    for line in raw.lines().map(str::trim) {
        match classify(line) {
            LineKind::Timing => {
                let (start, end) = parse_timing(line).unwrap_or_else(|| {
                    let at = current.as_ref().or(cues.last()).map(|c| c.end).unwrap_or_default();
                    warn!(line, %at, "unparseable cue timing, opening a zero-length cue");
                    (at, at)
                });
                if let Some(cue) = current.take().filter(|c| !c.text.is_empty()) {
                    cues.push(cue);
                }
                current = Some(CaptionCue {
                    index: pending_index.take(),
                    start,
                    end,
                    text: Vec::new(),
                });
            }
            LineKind::Index => pending_index = line.parse().ok(),
            LineKind::Content => match current.as_mut() {
                Some(cue) => cue.text.push(line.to_string()),
                None => orphaned += 1,
            },
            _ => {}
        }
    }

    if let Some(cue) = current.filter(|c| !c.text.is_empty()) {
        cues.push(cue);
    }

    if orphaned > 0 {
        debug!(lines = orphaned, "dropped content lines outside any cue");
    }
    debug!(cues = cues.len(), "parsed captions");

    CaptionDocument { cues }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "WEBVTT\nKind: captions\nLanguage: en\n\n1\n00:00:00.000 --> 00:00:02.000 align:start position:0%\nHello there\n\n2\n00:00:02.000 --> 00:00:04.500\nGeneral Kenobi\nYou are a bold one\n";

    #[test]
    fn test_classify_structural_lines() {
        assert_eq!(classify(""), LineKind::Blank);
        assert_eq!(classify("   "), LineKind::Blank);
        assert_eq!(classify("WEBVTT"), LineKind::Header);
        assert_eq!(classify("00:00:01.000 --> 00:00:02.000"), LineKind::Timing);
        assert_eq!(classify("42"), LineKind::Index);
        assert_eq!(classify("00:00:01.000 something"), LineKind::TimestampPrefix);
        assert!(classify("42").is_structural());
    }

    #[test]
    fn test_classify_skipped_non_structural() {
        assert_eq!(classify("<c.colorE5E5E5>"), LineKind::Tag);
        assert_eq!(classify("Kind: captions"), LineKind::Metadata);
        assert_eq!(classify("Language: de"), LineKind::Metadata);
        assert!(!classify("Kind: captions").is_structural());
        assert!(!classify("<b>").is_structural());
    }

    #[test]
    fn test_classify_content() {
        assert_eq!(classify("Hello world"), LineKind::Content);
        assert_eq!(classify("<i>Hello</i>"), LineKind::Content);
        assert_eq!(classify("It was 1984 again"), LineKind::Content);
    }

    #[test]
    fn test_strip_inline_timestamps() {
        let s = "so<00:00:01.200><c> we</c>[00:00:01.500] went";
        assert_eq!(strip_inline_timestamps(s), "so<c> we</c> went");
    }

    #[test]
    fn test_parse_timing_with_settings() {
        let (start, end) = parse_timing("00:01.000 --> 00:00:02.500 align:start").unwrap();
        assert_eq!(start.total_millis(), 1_000);
        assert_eq!(end.total_millis(), 2_500);
        assert!(parse_timing("junk --> more junk").is_none());
    }

    #[test]
    fn test_parse_captions() {
        let doc = parse_captions(SAMPLE);
        assert_eq!(doc.cues.len(), 2);
        assert_eq!(doc.cues[0].index, Some(1));
        assert_eq!(doc.cues[0].text, vec!["Hello there"]);
        assert_eq!(doc.cues[1].index, Some(2));
        assert_eq!(doc.cues[1].text, vec!["General Kenobi", "You are a bold one"]);
        assert_eq!(doc.cues[1].end.to_vtt(), "00:00:04.500");
    }

    #[test]
    fn test_parse_captions_drops_empty_cues_and_orphans() {
        let raw = "WEBVTT\n\nstray line\n\n00:00:00.000 --> 00:00:01.000\n\n00:00:01.000 --> 00:00:02.000\nkept\n";
        let doc = parse_captions(raw);
        assert_eq!(doc.cues.len(), 1);
        assert_eq!(doc.cues[0].text, vec!["kept"]);
        assert_eq!(doc.cues[0].index, None);
    }

    #[test]
    fn test_parse_captions_strips_word_timings() {
        let raw = "00:00:00.000 --> 00:00:02.000\nwe<00:00:00.400><c> are</c>\n";
        assert_eq!(parse_captions(raw).cues[0].text, vec!["we<c> are</c>"]);
    }

    #[test]
    fn test_parse_timing_loose_forms() {
        let (start, end) = parse_timing("00:00:01.000-->00:00:02.000").unwrap();
        assert_eq!((start.total_millis(), end.total_millis()), (1_000, 2_000));
        let (start, end) = parse_timing("00:00:01.5 --> 00:00:02.25").unwrap();
        assert_eq!((start.total_millis(), end.total_millis()), (1_500, 2_250));
    }

    #[test]
    fn test_parse_captions_keeps_text_after_bad_timing() {
        let raw = "WEBVTT\n\n00:00:00.000 --> 00:00:01.500\nfirst\n\nnonsense --> garbage\nsecond\n";
        let doc = parse_captions(raw);
        assert_eq!(doc.cues.len(), 2);
        assert_eq!(doc.cues[1].text, vec!["second"]);
        assert_eq!(doc.cues[1].start.total_millis(), 1_500);
        assert_eq!(doc.cues[1].end.total_millis(), 1_500);

        let doc = parse_captions("WEBVTT\n\n?? --> ??\nonly line\n");
        assert_eq!(doc.cues.len(), 1);
        assert_eq!(doc.cues[0].start.total_millis(), 0);
        assert_eq!(doc.cues[0].text, vec!["only line"]);
    }

    #[test]
    fn test_parse_captions_empty() {
        assert!(parse_captions("").is_empty());
        assert!(parse_captions("WEBVTT\n\n").is_empty());
    }
}
