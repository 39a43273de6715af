use once_cell::sync::Lazy;
use regex::Regex;

use crate::caption::parse_captions;

static SRT_TIMING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{2,}:\d{2}:\d{2},\d{3} --> \d{2,}:\d{2}:\d{2},\d{3}$").unwrap());

/// Convert WebVTT-style captions to SRT.
///
/// Cues are renumbered from 1 in encounter order and their text lines kept
/// verbatim; header, metadata and cue-id lines are dropped.
pub fn to_indexed_format(captions: &str) -> String {
    parse_captions(captions).to_srt()
}

/// Strip index and timing lines from SRT, leaving the spoken text one line per caption line.
pub fn extract_plain_text(srt: &str) -> String {
    srt.lines()
        .map(str::trim)
        .filter(|line| {
            !line.is_empty()
                && !line.bytes().all(|b| b.is_ascii_digit())
                && !SRT_TIMING.is_match(line)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
