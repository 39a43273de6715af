use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Sub-second separator used when rendering a [`Timestamp`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Separator {
    /// `HH:MM:SS.mmm` (WebVTT).
    Period,
    /// `HH:MM:SS,mmm` (SRT).
    Comma,
}

impl Separator {
    fn as_char(self) -> char {
        match self {
            Separator::Period => '.',
            Separator::Comma => ',',
        }
    }
}

/// A caption timestamp with millisecond precision.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Timestamp {
    pub hours: u32,
    pub minutes: u8,
    pub seconds: u8,
    pub millis: u16,
}

impl Timestamp {
    pub fn from_millis(total: u64) -> Self {
        Self {
            hours: (total / 3_600_000).min(u32::MAX as u64) as u32,
            minutes: ((total % 3_600_000) / 60_000) as u8,
            seconds: ((total % 60_000) / 1_000) as u8,
            millis: (total % 1_000) as u16,
        }
    }

    /// Negative and NaN inputs clamp to zero.
    pub fn from_seconds(seconds: f64) -> Self {
        Self::from_millis((seconds.max(0.0) * 1000.0) as u64)
    }

    pub fn total_millis(&self) -> u64 {
        self.hours as u64 * 3_600_000
            + self.minutes as u64 * 60_000
            + self.seconds as u64 * 1_000
            + self.millis as u64
    }

    pub fn as_seconds(&self) -> f64 {
        self.total_millis() as f64 / 1000.0
    }

    pub fn format(&self, separator: Separator) -> String {
        format!(
            "{:02}:{:02}:{:02}{}{:03}",
            self.hours,
            self.minutes,
            self.seconds,
            separator.as_char(),
            self.millis
        )
    }

    /// `HH:MM:SS,mmm`
    pub fn to_srt(&self) -> String {
        self.format(Separator::Comma)
    }

    /// `HH:MM:SS.mmm`
    pub fn to_vtt(&self) -> String {
        self.format(Separator::Period)
    }
}

impl FromStr for Timestamp {
    type Err = Error;

    /// Accepts `HH:MM:SS.mmm`, `HH:MM:SS,mmm` and the WebVTT short form `MM:SS.mmm`.
    /// Fractions of one or two digits are read as tenths or hundredths.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidTimestamp(s.to_string());
        let all_digits = |p: &str| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit());

        let (clock, frac) = s.trim().rsplit_once(['.', ',']).ok_or_else(invalid)?;
        if frac.len() > 3 || !all_digits(frac) {
            return Err(invalid());
        }

        let parts: Vec<&str> = clock.split(':').collect();
        if !parts.iter().all(|p| all_digits(p)) {
            return Err(invalid());
        }
        let (hours, minutes, seconds) = match parts.as_slice() {
            [h, m, s] => (h.parse().map_err(|_| invalid())?, *m, *s),
            [m, s] => (0, *m, *s),
            _ => return Err(invalid()),
        };
        if minutes.len() > 2 || seconds.len() > 2 {
            return Err(invalid());
        }
        let minutes: u8 = minutes.parse().map_err(|_| invalid())?;
        let seconds: u8 = seconds.parse().map_err(|_| invalid())?;
        if minutes >= 60 || seconds >= 60 {
            return Err(invalid());
        }

        Ok(Timestamp {
            hours,
            minutes,
            seconds,
            millis: format!("{frac:0<3}").parse().map_err(|_| invalid())?,
        })
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_vtt())
    }
}

/// One timed caption entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptionCue {
    /// Cue number as it appeared in the source, if any.
    pub index: Option<u32>,
    pub start: Timestamp,
    pub end: Timestamp,
    /// Text lines; never empty, each non-empty after trimming.
    pub text: Vec<String>,
}

/// Ordered cues parsed from a caption file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptionDocument {
    pub cues: Vec<CaptionCue>,
}

impl CaptionDocument {
    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    /// Render as SRT: sequential 1-based indices, comma timestamps, one blank line between cues.
    pub fn to_srt(&self) -> String {
        let mut out = String::new();
        for (i, cue) in self.cues.iter().enumerate() {
            out.push_str(&format!("{}\n", i + 1));
            out.push_str(&format!("{} --> {}\n", cue.start.to_srt(), cue.end.to_srt()));
            for line in &cue.text {
                out.push_str(line);
                out.push('\n');
            }
            out.push('\n');
        }
        out
    }

    /// Render as WebVTT.
    pub fn to_vtt(&self) -> String {
        let mut out = String::from("WEBVTT\n\n");
        for cue in &self.cues {
            out.push_str(&format!("{} --> {}\n", cue.start.to_vtt(), cue.end.to_vtt()));
            for line in &cue.text {
                out.push_str(line);
                out.push('\n');
            }
            out.push('\n');
        }
        out
    }
}

/// Caption text with all timing and markup removed, grouped into paragraphs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanTextDocument {
    pub paragraphs: Vec<String>,
}

impl CleanTextDocument {
    pub fn is_empty(&self) -> bool {
        self.paragraphs.is_empty()
    }

    /// Paragraphs joined by a blank line.
    pub fn text(&self) -> String {
        self.paragraphs.join("\n\n")
    }
}

impl fmt::Display for CleanTextDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

/// Outcome of [`crate::summarize::summarize`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryResult {
    /// Chunk summaries joined by blank lines, or the extractive sentence selection.
    pub summary: String,
    /// True when the abstractive path was abandoned for sentence sampling.
    pub is_fallback: bool,
    /// Human-readable remark about truncation or partial coverage.
    pub note: Option<String>,
    pub chunks_total: usize,
    pub chunks_skipped: usize,
    /// Chunks whose summary was substituted after a summarizer failure.
    pub chunks_degraded: usize,
}

impl SummaryResult {
    /// Summary followed by the note, if any.
    pub fn text(&self) -> String {
        match &self.note {
            Some(note) => format!("{}\n\n{note}", self.summary),
            None => self.summary.clone(),
        }
    }
}

/// Outcome of [`crate::translate::translate`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationResult {
    pub translated_text: String,
    pub target_lang: String,
    pub chunks_total: usize,
    pub chunks_translated: usize,
}

impl TranslationResult {
    /// Some chunks produced no translation and were left out.
    pub fn is_partial(&self) -> bool {
        self.chunks_translated < self.chunks_total
    }
}

/// A single word with timing and confidence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Word {
    pub text: String,
    pub start: f64,
    pub end: f64,
    pub probability: f32,
}

/// A transcript segment (sentence/phrase).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    pub start: f64,
    pub end: f64,
    pub text: String,
    pub speaker_turn: bool,
    pub no_speech_probability: f32,
    pub words: Option<Vec<Word>>,
}

/// Complete transcription result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    pub segments: Vec<Segment>,
    pub language: String,
    pub duration: f64,
    pub model: String,
    pub source_url: Option<String>,
    pub source_title: Option<String>,
}

impl Transcript {
    /// Full text (all segments concatenated).
    pub fn text(&self) -> String {
        self.segments
            .iter()
            .map(|s| s.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Segments as caption cues, dropping segments without text.
    pub fn to_captions(&self) -> CaptionDocument {
        let cues = self
            .segments
            .iter()
            .filter(|s| !s.text.trim().is_empty())
            .enumerate()
            .map(|(i, s)| CaptionCue {
                index: Some(i as u32 + 1),
                start: Timestamp::from_seconds(s.start),
                end: Timestamp::from_seconds(s.end),
                text: vec![s.text.trim().to_string()],
            })
            .collect();
        CaptionDocument { cues }
    }

    /// Format as SRT subtitles.
    pub fn to_srt(&self) -> String {
        self.to_captions().to_srt()
    }

    /// Format as WebVTT subtitles.
    pub fn to_vtt(&self) -> String {
        self.to_captions().to_vtt()
    }

    /// Format as JSON.
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Format as pretty-printed JSON.
    pub fn to_json_pretty(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(start: f64, end: f64, text: &str) -> Segment {
        Segment {
            start,
            end,
            text: text.into(),
            speaker_turn: false,
            no_speech_probability: 0.0,
            words: None,
        }
    }

    #[test]
    fn test_timestamp_parse_both_separators() {
        let a: Timestamp = "01:02:03.456".parse().unwrap();
        let b: Timestamp = "01:02:03,456".parse().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.hours, 1);
        assert_eq!(a.minutes, 2);
        assert_eq!(a.seconds, 3);
        assert_eq!(a.millis, 456);
    }

    #[test]
    fn test_timestamp_short_form() {
        let t: Timestamp = "02:05.100".parse().unwrap();
        assert_eq!(t.to_vtt(), "00:02:05.100");
    }

    #[test]
    fn test_timestamp_short_fraction() {
        assert_eq!("00:00:01.5".parse::<Timestamp>().unwrap().millis, 500);
        assert_eq!("00:00:01.05".parse::<Timestamp>().unwrap().millis, 50);
    }

    #[test]
    fn test_timestamp_converts_between_formats() {
        let t: Timestamp = "00:00:07.250".parse().unwrap();
        assert_eq!(t.to_srt(), "00:00:07,250");
        let back: Timestamp = t.to_srt().parse().unwrap();
        assert_eq!(back.to_vtt(), "00:00:07.250");
    }

    #[test]
    fn test_timestamp_rejects_malformed() {
        for bad in ["", "12", "00:00:01", "00:61:00.000", "00:00:01.", "00:00:01.1234", "aa:bb:cc.ddd", "1:2:3:4.000"] {
            assert!(bad.parse::<Timestamp>().is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn test_timestamp_seconds() {
        let t = Timestamp::from_seconds(3725.5);
        assert_eq!(t.to_srt(), "01:02:05,500");
        assert!((t.as_seconds() - 3725.5).abs() < 1e-9);
        assert_eq!(Timestamp::from_seconds(-1.0).total_millis(), 0);
    }

    #[test]
    fn test_transcript_srt() {
        let transcript = Transcript {
            segments: vec![segment(0.0, 1.5, " Hello "), segment(1.5, 3.0, "  "), segment(3.0, 4.0, "World")],
            language: "en".into(),
            duration: 4.0,
            model: "base".into(),
            source_url: None,
            source_title: None,
        };
        assert_eq!(transcript.text(), "Hello World");
        assert_eq!(
            transcript.to_srt(),
            "1\n00:00:00,000 --> 00:00:01,500\nHello\n\n2\n00:00:03,000 --> 00:00:04,000\nWorld\n\n"
        );
        assert!(transcript.to_vtt().starts_with("WEBVTT\n\n00:00:00.000 --> 00:00:01.500\nHello\n"));
    }

    #[test]
    fn test_summary_result_text_with_note() {
        let r = SummaryResult {
            summary: "Short.".into(),
            is_fallback: false,
            note: Some("(Note: truncated.)".into()),
            chunks_total: 1,
            chunks_skipped: 0,
            chunks_degraded: 0,
        };
        assert_eq!(r.text(), "Short.\n\n(Note: truncated.)");
    }

    #[test]
    fn test_clean_text_document_text() {
        let doc = CleanTextDocument {
            paragraphs: vec!["one".into(), "two".into()],
        };
        assert_eq!(doc.to_string(), "one\n\ntwo");
        assert!(CleanTextDocument::default().is_empty());
    }
}
