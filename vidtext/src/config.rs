use std::fmt;
use std::path::PathBuf;

use crate::error::{Error, Result};

/// A validated language for whisper transcription.
///
/// Accepts short codes ("en", "de") and full names ("english", "german").
/// Use `Language::Auto` for automatic detection.
#[derive(Debug, Clone, Default)]
pub enum Language {
    /// Auto-detect language from audio.
    #[default]
    Auto,
    /// A validated language code (e.g. "en", "de", "ja").
    Code {
        /// Short code as whisper expects it.
        code: String,
        /// Whisper internal language ID.
        id: i32,
    },
}

impl Language {
    /// Create a language from a code or full name, validating against whisper.cpp.
    pub fn new(lang: &str) -> Result<Self> {
        let lower = lang.trim().to_lowercase();
        if lower == "auto" {
            return Ok(Language::Auto);
        }

        match whisper_rs::get_lang_id(&lower) {
            Some(id) => {
                let code = whisper_rs::get_lang_str(id).unwrap_or(&lower).to_string();
                Ok(Language::Code { code, id })
            }
            None => Err(Error::UnsupportedLanguage(lang.to_string())),
        }
    }

    /// Get the short language code (e.g. "en"), or None for Auto.
    pub fn code(&self) -> Option<&str> {
        match self {
            Language::Auto => None,
            Language::Code { code, .. } => Some(code),
        }
    }

    pub fn is_auto(&self) -> bool {
        matches!(self, Language::Auto)
    }

    /// All supported languages as (code, full_name) pairs.
    pub fn supported() -> Vec<(&'static str, &'static str)> {
        let max = whisper_rs::get_lang_max_id();
        (0..=max)
            .filter_map(|id| {
                let code = whisper_rs::get_lang_str(id)?;
                let name = whisper_rs::get_lang_str_full(id)?;
                Some((code, name))
            })
            .collect()
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::Auto => write!(f, "auto"),
            Language::Code { code, .. } => write!(f, "{code}"),
        }
    }
}

/// Whisper model sizes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Model {
    Tiny,
    TinyEn,
    Base,
    BaseEn,
    Small,
    SmallEn,
    Medium,
    MediumEn,
    LargeV2,
    LargeV3,
    LargeV3Turbo,
    /// User-provided .ggml file path.
    Custom(PathBuf),
}

impl Model {
    /// Every downloadable model with its approximate size on disk.
    pub const CATALOG: [(Model, &'static str); 11] = [
        (Model::Tiny, "75 MB"),
        (Model::TinyEn, "75 MB"),
        (Model::Base, "142 MB"),
        (Model::BaseEn, "142 MB"),
        (Model::Small, "466 MB"),
        (Model::SmallEn, "466 MB"),
        (Model::Medium, "1.5 GB"),
        (Model::MediumEn, "1.5 GB"),
        (Model::LargeV2, "2.9 GB"),
        (Model::LargeV3, "2.9 GB"),
        (Model::LargeV3Turbo, "~1.6 GB"),
    ];

    /// Model filename as used by HuggingFace / whisper.cpp.
    pub fn filename(&self) -> String {
        match self {
            Model::Custom(path) => path
                .file_name()
                .map(|f| f.to_string_lossy().into_owned())
                .unwrap_or_else(|| "custom-model".into()),
            _ => format!("ggml-{}.bin", self.name()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Model::Tiny => "tiny",
            Model::TinyEn => "tiny.en",
            Model::Base => "base",
            Model::BaseEn => "base.en",
            Model::Small => "small",
            Model::SmallEn => "small.en",
            Model::Medium => "medium",
            Model::MediumEn => "medium.en",
            Model::LargeV2 => "large-v2",
            Model::LargeV3 => "large-v3",
            Model::LargeV3Turbo => "large-v3-turbo",
            Model::Custom(_) => "custom",
        }
    }

    /// Look a catalog model up by name (e.g. a CLI argument).
    pub fn parse_name(s: &str) -> Option<Self> {
        Self::CATALOG
            .iter()
            .map(|(m, _)| m)
            .find(|m| m.name() == s)
            .cloned()
    }
}

/// Options for speech-to-text.
#[derive(Debug, Clone)]
pub struct TranscribeOptions {
    pub model: Model,
    pub language: Language,
    /// Translate speech to English while transcribing.
    pub translate: bool,
    pub word_timestamps: bool,
    pub n_threads: Option<u32>,
    pub gpu: bool,
    pub gpu_device: u32,
    pub vad: bool,
    pub temperature: f32,
    pub beam_size: Option<u32>,
    pub cache_dir: Option<PathBuf>,
}

impl Default for TranscribeOptions {
    fn default() -> Self {
        Self {
            model: Model::Base,
            language: Language::Auto,
            translate: false,
            word_timestamps: false,
            n_threads: None,
            gpu: true,
            gpu_device: 0,
            vad: false,
            temperature: 0.0,
            beam_size: None,
            cache_dir: None,
        }
    }
}

impl TranscribeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn model(mut self, model: Model) -> Self {
        self.model = model;
        self
    }

    /// Set the language. Validates against whisper's supported languages.
    pub fn language(mut self, lang: &str) -> Result<Self> {
        self.language = Language::new(lang)?;
        Ok(self)
    }

    pub fn translate(mut self, translate: bool) -> Self {
        self.translate = translate;
        self
    }

    pub fn word_timestamps(mut self, enabled: bool) -> Self {
        self.word_timestamps = enabled;
        self
    }

    pub fn n_threads(mut self, n: u32) -> Result<Self> {
        if n == 0 {
            return Err(Error::InvalidOption("n_threads must be at least 1".into()));
        }
        self.n_threads = Some(n);
        Ok(self)
    }

    pub fn gpu(mut self, enabled: bool) -> Self {
        self.gpu = enabled;
        self
    }

    pub fn gpu_device(mut self, device: u32) -> Self {
        self.gpu_device = device;
        self
    }

    pub fn vad(mut self, enabled: bool) -> Self {
        self.vad = enabled;
        self
    }

    pub fn temperature(mut self, temp: f32) -> Result<Self> {
        if !(0.0..=1.0).contains(&temp) {
            return Err(Error::InvalidOption(format!(
                "temperature must be within 0.0..=1.0, got {temp}"
            )));
        }
        self.temperature = temp;
        Ok(self)
    }

    pub fn beam_size(mut self, size: u32) -> Result<Self> {
        if size == 0 {
            return Err(Error::InvalidOption("beam_size must be at least 1".into()));
        }
        self.beam_size = Some(size);
        Ok(self)
    }

    pub fn cache_dir(mut self, dir: PathBuf) -> Self {
        self.cache_dir = Some(dir);
        self
    }

    /// Resolve the cache directory, defaulting to ~/.cache/vidtext/models.
    pub fn resolve_cache_dir(&self) -> PathBuf {
        self.cache_dir.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from(".cache"))
                .join("vidtext")
                .join("models")
        })
    }
}

/// Limits for [`crate::summarize::summarize`].
#[derive(Debug, Clone)]
pub struct SummarizeOptions {
    /// Input beyond this many characters is cut off before chunking.
    pub max_input_chars: usize,
    pub words_per_chunk: usize,
    /// Chunks with fewer words are not summarized.
    pub min_chunk_words: usize,
    /// Chunks longer than this fall back to their first sentences when the
    /// summarizer fails; shorter ones are used verbatim.
    pub degraded_sentence_threshold: usize,
    pub extractive_sentences: usize,
    pub extractive_sentences_long: usize,
}

impl Default for SummarizeOptions {
    fn default() -> Self {
        Self {
            max_input_chars: 25_000,
            words_per_chunk: 250,
            min_chunk_words: 10,
            degraded_sentence_threshold: 100,
            extractive_sentences: 20,
            extractive_sentences_long: 30,
        }
    }
}

impl SummarizeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_input_chars(mut self, chars: usize) -> Result<Self> {
        if chars == 0 {
            return Err(Error::InvalidOption("max_input_chars must be at least 1".into()));
        }
        self.max_input_chars = chars;
        Ok(self)
    }

    pub fn words_per_chunk(mut self, words: usize) -> Result<Self> {
        if words == 0 {
            return Err(Error::InvalidOption("words_per_chunk must be at least 1".into()));
        }
        self.words_per_chunk = words;
        Ok(self)
    }

    pub fn min_chunk_words(mut self, words: usize) -> Self {
        self.min_chunk_words = words;
        self
    }

    pub fn extractive_sentences(mut self, regular: usize, long: usize) -> Self {
        self.extractive_sentences = regular;
        self.extractive_sentences_long = long;
        self
    }
}

/// Limits for [`crate::translate::translate`].
#[derive(Debug, Clone)]
pub struct TranslateOptions {
    /// Per-request ceiling of the translation backend, in characters.
    pub max_chunk_chars: usize,
}

impl Default for TranslateOptions {
    fn default() -> Self {
        Self {
            max_chunk_chars: 4_500,
        }
    }
}

impl TranslateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_chunk_chars(mut self, chars: usize) -> Result<Self> {
        if chars == 0 {
            return Err(Error::InvalidOption("max_chunk_chars must be at least 1".into()));
        }
        self.max_chunk_chars = chars;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_filename() {
        assert_eq!(Model::Base.filename(), "ggml-base.bin");
        assert_eq!(Model::LargeV3Turbo.filename(), "ggml-large-v3-turbo.bin");
        assert_eq!(Model::Custom(PathBuf::from("/m/my.bin")).filename(), "my.bin");
    }

    #[test]
    fn test_model_parse_name() {
        assert_eq!(Model::parse_name("small.en"), Some(Model::SmallEn));
        assert_eq!(Model::parse_name("huge"), None);
        for (model, _) in Model::CATALOG.iter() {
            assert_eq!(Model::parse_name(model.name()).as_ref(), Some(model));
        }
    }

    #[test]
    fn test_language_auto() {
        let lang = Language::new("AUTO").unwrap();
        assert!(lang.is_auto());
        assert_eq!(lang.code(), None);
        assert_eq!(lang.to_string(), "auto");
    }

    #[test]
    fn test_transcribe_options_validation() {
        assert!(TranscribeOptions::new().beam_size(0).is_err());
        assert!(TranscribeOptions::new().n_threads(0).is_err());
        assert!(TranscribeOptions::new().temperature(1.5).is_err());
        let opts = TranscribeOptions::new().beam_size(5).unwrap();
        assert_eq!(opts.beam_size, Some(5));
    }

    #[test]
    fn test_resolve_cache_dir_override() {
        let opts = TranscribeOptions::new().cache_dir(PathBuf::from("/tmp/models"));
        assert_eq!(opts.resolve_cache_dir(), PathBuf::from("/tmp/models"));
        assert!(TranscribeOptions::new().resolve_cache_dir().ends_with("vidtext/models"));
    }

    #[test]
    fn test_summarize_defaults() {
        let opts = SummarizeOptions::default();
        assert_eq!(opts.max_input_chars, 25_000);
        assert_eq!(opts.words_per_chunk, 250);
        assert_eq!(opts.min_chunk_words, 10);
        assert!(SummarizeOptions::new().words_per_chunk(0).is_err());
    }

    #[test]
    fn test_translate_options() {
        assert_eq!(TranslateOptions::default().max_chunk_chars, 4_500);
        assert!(TranslateOptions::new().max_chunk_chars(0).is_err());
        assert_eq!(TranslateOptions::new().max_chunk_chars(10).unwrap().max_chunk_chars, 10);
    }
}
