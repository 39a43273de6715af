//! Video text extraction: captions or speech in, clean text, summaries and translations out.
//!
//! **vidtext** fetches a video's captions (via yt-dlp) or transcribes its
//! audio (via ffmpeg and whisper.cpp), cleans WebVTT into readable
//! paragraphs, converts captions to SRT, and summarizes or translates long
//! text in bounded chunks with graceful degradation when a backend fails.
//!
//! # Quick start
//!
//! ```rust,no_run
//! # #[tokio::main]
//! # async fn main() -> vidtext::Result<()> {
//! use vidtext::{GoogleTranslator, HuggingFaceSummarizer, SummarizeOptions, TranslateOptions};
//!
//! // Captions of a video, cleaned into paragraphs
//! let raw = vidtext::fetch_subtitles("https://www.youtube.com/watch?v=dQw4w9WgXcQ").await?;
//! let text = vidtext::normalize(&raw).text();
//!
//! let summarizer = HuggingFaceSummarizer::default().token("hf_...");
//! let summary = vidtext::summarize(&summarizer, &text, false, &SummarizeOptions::default()).await?;
//! println!("{}", summary.text());
//!
//! let translated =
//!     vidtext::translate(&GoogleTranslator::new(), &text, "de", &TranslateOptions::default()).await?;
//! println!("{}", translated.translated_text);
//! # Ok(())
//! # }
//! ```

pub(crate) mod audio;
pub mod backend;
pub mod caption;
pub mod chunk;
pub mod config;
pub mod convert;
#[cfg(feature = "download")]
pub mod download;
pub mod error;
pub mod model;
pub mod normalize;
pub(crate) mod scratch;
pub mod summarize;
pub(crate) mod transcribe;
pub mod translate;
pub mod types;

pub use backend::{GoogleTranslator, HuggingFaceSummarizer};
pub use chunk::{Boundary, Chunk, SizeUnit};
pub use config::{Language, Model, SummarizeOptions, TranscribeOptions, TranslateOptions};
pub use convert::{extract_plain_text, to_indexed_format};
pub use error::{Error, ErrorKind, Result};
pub use normalize::normalize;
pub use summarize::{summarize, Summarizer};
pub use translate::{translate, Translator};
pub use types::{
    CaptionCue, CaptionDocument, CleanTextDocument, Segment, SummaryResult, Timestamp,
    Transcript, TranslationResult, Word,
};

use std::path::Path;

use tracing::info;

use scratch::ScratchDir;

/// Fetch the raw WebVTT captions of a video.
#[cfg(feature = "download")]
pub async fn fetch_subtitles(url: &str) -> Result<String> {
    let tmp = ScratchDir::new("vidtext-subs")?;
    download::fetch_captions(url, tmp.path()).await
}

/// Transcribe a local audio/video file with default options.
pub async fn transcribe_file(path: impl AsRef<Path>) -> Result<Transcript> {
    transcribe_file_with_options(path, &TranscribeOptions::default()).await
}

/// Transcribe a local audio/video file with custom options.
pub async fn transcribe_file_with_options(
    path: impl AsRef<Path>,
    options: &TranscribeOptions,
) -> Result<Transcript> {
    let cache_dir = options.resolve_cache_dir();
    let model_path = model::ensure_model(&options.model, &cache_dir).await?;

    let samples = audio::load_audio(path.as_ref())?;
    transcribe::transcribe_samples(&samples, &model_path, options)
}

/// Transcribe an uploaded file held in memory.
///
/// `filename` only supplies the extension hint for the decoder; any
/// directory part is ignored.
pub async fn transcribe_bytes(
    bytes: &[u8],
    filename: &str,
    options: &TranscribeOptions,
) -> Result<Transcript> {
    if bytes.is_empty() {
        return Err(Error::InvalidOption("no file provided".into()));
    }

    let name = Path::new(filename)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".into());

    let tmp = ScratchDir::new("vidtext-upload")?;
    let path = tmp.path().join(name);
    std::fs::write(&path, bytes)?;
    info!(bytes = bytes.len(), path = %path.display(), "stored upload");

    transcribe_file_with_options(&path, options).await
}

/// Spoken text of an uploaded file, segments joined by single spaces.
pub async fn upload_text(
    bytes: &[u8],
    filename: &str,
    options: &TranscribeOptions,
) -> Result<String> {
    Ok(transcribe_bytes(bytes, filename, options).await?.text())
}

/// Spoken text of the video at `url`.
#[cfg(feature = "download")]
pub async fn url_text(url: &str, options: &TranscribeOptions) -> Result<String> {
    Ok(transcribe_with_options(url, options).await?.text())
}

/// Transcribe from a URL (downloads audio first, then transcribes).
#[cfg(feature = "download")]
pub async fn transcribe(url: &str) -> Result<Transcript> {
    transcribe_with_options(url, &TranscribeOptions::default()).await
}

/// Transcribe from a URL with custom options.
#[cfg(feature = "download")]
pub async fn transcribe_with_options(url: &str, options: &TranscribeOptions) -> Result<Transcript> {
    let tmp = ScratchDir::new("vidtext-audio")?;
    let download = download::download_audio(url, tmp.path()).await?;

    let mut transcript = transcribe_file_with_options(&download.audio_path, options).await?;
    transcript.source_url = Some(url.to_string());
    transcript.source_title = download.title;
    Ok(transcript)
}
