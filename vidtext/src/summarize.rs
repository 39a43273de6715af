//! Length-aware summarization with graceful degradation.
//!
//! Text is cut into word-bounded chunks and each chunk is summarized on its
//! own. A chunk the summarizer fails on is replaced by its opening sentences.
//! A summarizer that is unreachable before any chunk succeeds switches the
//! whole request over to an extractive summary sampled from the original
//! sentences of the untruncated text.

use std::ops::Range;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::chunk::{self, Chunk};
use crate::config::SummarizeOptions;
use crate::error::{Error, Result};
use crate::types::SummaryResult;

static TERMINATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]+").unwrap());

const TRUNCATED_NOTE: &str =
    "(Note: The original text was truncated before summarization due to length constraints.)";
const LONG_CONTENT_NOTE: &str = "(Note: This summary represents content from selected portions as the original was too long to process in full.)";
const EXTRACTIVE_NOTE: &str = "(Note: This is an extractive summary generated due to processing limitations with the original content.)";
const EXTRACTIVE_LONG_NOTE: &str = "(Note: This is an extractive summary generated from key portions of your content, as the full content was too long to process completely.)";

/// An abstractive summarization model.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Summarize one chunk into roughly `min_len..=max_len` tokens.
    async fn summarize_chunk(&self, text: &str, min_len: usize, max_len: usize) -> Result<String>;
}

/// Summarize `text` chunk by chunk.
///
/// `is_long_content` marks input the caller already knows is too long to be
/// covered in full; it selects the notes attached to the result and the size
/// of the extractive fallback.
pub async fn summarize<S>(
    summarizer: &S,
    text: &str,
    is_long_content: bool,
    options: &SummarizeOptions,
) -> Result<SummaryResult>
where
    S: Summarizer + ?Sized,
{
    if text.trim().is_empty() {
        return Err(Error::EmptyText);
    }

    let (input, truncated) = truncate_chars(text, options.max_input_chars);
    if truncated {
        info!(max_chars = options.max_input_chars, "input truncated before summarization");
    }

    let chunks = chunk::split_words(&input, options.words_per_chunk);
    info!(chunks = chunks.len(), is_long_content, "summarizing");

    let mut summaries = Vec::with_capacity(chunks.len());
    let mut skipped = 0;
    let mut degraded = 0;
    let mut summarized = 0;
    // Set once the backend reports a fault that is not specific to one chunk.
    let mut unavailable = false;

    for (i, chunk) in chunks.iter().enumerate() {
        if chunk.size < options.min_chunk_words {
            debug!(chunk = i, words = chunk.size, "skipping short chunk");
            skipped += 1;
            continue;
        }

        if unavailable {
            summaries.push(degraded_summary(chunk, options.degraded_sentence_threshold));
            degraded += 1;
            continue;
        }

        let (min_len, max_len) = summary_bounds(chunk.size);
        match summarizer.summarize_chunk(&chunk.text, min_len, max_len).await {
            Ok(summary) if !summary.trim().is_empty() => {
                debug!(chunk = i, min_len, max_len, "chunk summarized");
                summaries.push(summary.trim().to_string());
                summarized += 1;
            }
            Ok(_) => {
                warn!(chunk = i, "summarizer returned nothing, keeping opening sentences");
                summaries.push(degraded_summary(chunk, options.degraded_sentence_threshold));
                degraded += 1;
            }
            Err(e) if e.is_fatal() && summarized == 0 => {
                warn!(chunk = i, error = %e, "summarizer unavailable, falling back to extractive summary");
                return extractive_summary(text, is_long_content, options);
            }
            Err(e) => {
                if e.is_fatal() {
                    warn!(chunk = i, error = %e, "summarizer unavailable, keeping opening sentences for the remaining chunks");
                    unavailable = true;
                } else {
                    warn!(chunk = i, error = %e, "chunk summarization failed, keeping opening sentences");
                }
                summaries.push(degraded_summary(chunk, options.degraded_sentence_threshold));
                degraded += 1;
            }
        }
    }

    if summaries.is_empty() {
        return Err(Error::SummaryFailed(format!(
            "no chunk produced a summary ({skipped} of {} too short)",
            chunks.len()
        )));
    }

    let note = if is_long_content {
        Some(LONG_CONTENT_NOTE.to_string())
    } else if truncated {
        Some(TRUNCATED_NOTE.to_string())
    } else {
        None
    };

    info!(summarized, skipped, degraded, "summary complete");
    Ok(SummaryResult {
        summary: summaries.join("\n\n"),
        is_fallback: false,
        note,
        chunks_total: chunks.len(),
        chunks_skipped: skipped,
        chunks_degraded: degraded,
    })
}

/// Keep the first `max_chars` characters, marking the cut with `...`.
fn truncate_chars(text: &str, max_chars: usize) -> (String, bool) {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => (format!("{}...", &text[..cut]), true),
        None => (text.to_string(), false),
    }
}

/// Summary length bounds for a chunk of `words` words.
fn summary_bounds(words: usize) -> (usize, usize) {
    let min_len = (words / 4).clamp(30, 80);
    let max_len = (words / 2).clamp(min_len + 50, 200);
    (min_len, max_len)
}

/// Stand-in for a chunk the summarizer could not handle. Never empty for a non-empty chunk.
fn degraded_summary(chunk: &Chunk, threshold: usize) -> String {
    if chunk.size <= threshold {
        return chunk.text.clone();
    }

    let opening: Vec<&str> = TERMINATORS
        .split(&chunk.text)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .take(2)
        .collect();
    if opening.is_empty() {
        chunk.text.clone()
    } else {
        format!("{}.", opening.join(". "))
    }
}

/// Sample sentences from the start, middle and end of `text`.
fn extractive_summary(
    text: &str,
    is_long_content: bool,
    options: &SummarizeOptions,
) -> Result<SummaryResult> {
    let sentences = chunk::sentences(text);
    let regions = extractive_regions(sentences.len(), is_long_content, options);

    let picked: Vec<&str> = regions
        .into_iter()
        .flat_map(|r| sentences[r].iter().copied())
        .collect();
    if picked.is_empty() {
        return Err(Error::SummaryFailed(
            "no sentences available for an extractive summary".into(),
        ));
    }

    info!(sentences = sentences.len(), picked = picked.len(), "extractive summary complete");
    let note = if is_long_content {
        EXTRACTIVE_LONG_NOTE
    } else {
        EXTRACTIVE_NOTE
    };
    Ok(SummaryResult {
        summary: picked.join(" "),
        is_fallback: true,
        note: Some(note.to_string()),
        chunks_total: 0,
        chunks_skipped: 0,
        chunks_degraded: 0,
    })
}

/// Non-overlapping, ordered index ranges: 40% of the budget from the start,
/// 30% around the middle and 30% from the end.
fn extractive_regions(
    count: usize,
    is_long_content: bool,
    options: &SummarizeOptions,
) -> Vec<Range<usize>> {
    if count == 0 {
        return Vec::new();
    }

    let cap = if is_long_content {
        options.extractive_sentences_long
    } else {
        options.extractive_sentences
    };
    let n = count.min(cap);
    let mut regions = vec![0..(n * 4 / 10).max(1).min(count)];
    let mut cursor = regions[0].end;

    if count > 30 {
        let start = (count / 2).saturating_sub(n * 15 / 100).max(cursor);
        let end = (start + n * 3 / 10).min(count);
        if start < end {
            regions.push(start..end);
            cursor = end;
        }
    }

    if count > 20 {
        let start = count.saturating_sub(n * 3 / 10).max(cursor);
        if start < count {
            regions.push(start..count);
        }
    }

    regions
}
