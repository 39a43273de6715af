use std::path::PathBuf;

/// All errors that can occur in vidtext.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no text provided")]
    EmptyText,

    #[error("missing target language")]
    MissingTargetLanguage,

    #[error("invalid option: {0}")]
    InvalidOption(String),

    #[error("unsupported language: \"{0}\" — use Language::supported() to list valid codes")]
    UnsupportedLanguage(String),

    #[error("invalid timestamp: \"{0}\"")]
    InvalidTimestamp(String),

    #[error("no subtitles found for {url}")]
    CaptionsNotFound { url: String },

    #[error("summarization error: {0}")]
    Summarization(String),

    #[error("translation error: {0}")]
    Translation(String),

    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("failed to generate summary: {0}")]
    SummaryFailed(String),

    #[error("translation failed — all chunks returned empty results")]
    AllTranslationsFailed,

    #[error("model error: {0}")]
    Model(String),

    #[error("model not found: {path}")]
    ModelNotFound { path: PathBuf },

    #[error("model download failed: {0}")]
    ModelDownload(String),

    #[error("audio decoding error: {0}")]
    AudioDecode(String),

    #[error("audio file not found: {path}")]
    AudioNotFound { path: PathBuf },

    #[error("transcription error: {0}")]
    Transcription(String),

    #[error("whisper error: {0}")]
    Whisper(#[from] whisper_rs::WhisperError),

    #[cfg(feature = "download")]
    #[error("download error: {0}")]
    Download(String),

    #[cfg(feature = "download")]
    #[error("yt-dlp not found — install with: pip install yt-dlp")]
    YtDlpNotFound,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Coarse error classes a caller (CLI, HTTP router) can branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or malformed input. Never retried.
    Validation,
    /// The requested resource does not exist.
    NotFound,
    /// A summarizer, translator, transcriber or downloader fault.
    Upstream,
    /// Every recovery path was exhausted.
    TotalFailure,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::EmptyText
            | Error::MissingTargetLanguage
            | Error::InvalidOption(_)
            | Error::UnsupportedLanguage(_)
            | Error::InvalidTimestamp(_) => ErrorKind::Validation,
            Error::CaptionsNotFound { .. }
            | Error::ModelNotFound { .. }
            | Error::AudioNotFound { .. } => ErrorKind::NotFound,
            Error::SummaryFailed(_) | Error::AllTranslationsFailed => ErrorKind::TotalFailure,
            _ => ErrorKind::Upstream,
        }
    }

    /// Whether an upstream fault should abort the whole request rather than
    /// degrade a single chunk.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Http(_) | Error::BackendUnavailable(_))
    }

    /// HTTP status a router should answer with for this error.
    pub fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::Validation => 400,
            // A missing local file is a server-side problem, not a missing resource.
            ErrorKind::NotFound if matches!(self, Error::CaptionsNotFound { .. }) => 404,
            _ => 500,
        }
    }
}
