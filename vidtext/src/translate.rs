//! Chunked translation that stays under a backend's per-request size limit.

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::chunk::{self, Boundary, Chunk};
use crate::config::TranslateOptions;
use crate::error::{Error, Result};
use crate::types::TranslationResult;

/// A machine translation service.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate_chunk(&self, text: &str, target_lang: &str) -> Result<String>;
}

/// Translate `text` into `target_lang`, one chunk at a time and in order.
///
/// Chunks the translator fails on or returns nothing for are left out;
/// the result only fails when no chunk survives or the translator reports
/// a fatal fault.
pub async fn translate<T>(
    translator: &T,
    text: &str,
    target_lang: &str,
    options: &TranslateOptions,
) -> Result<TranslationResult>
where
    T: Translator + ?Sized,
{
    if text.trim().is_empty() {
        return Err(Error::EmptyText);
    }
    let target_lang = target_lang.trim();
    if target_lang.is_empty() {
        return Err(Error::MissingTargetLanguage);
    }

    let chunks = chunk::split_hierarchical(text, options.max_chunk_chars);
    info!(chunks = chunks.len(), target_lang, "translating");

    let mut out = String::with_capacity(text.len());
    let mut translated = 0;
    // Boundary of the most recent left-out chunk, handed on to the next survivor.
    let mut carried: Option<Boundary> = None;
    let mut last_kept: Option<&Chunk> = None;
    // Whether any left-out text since `last_kept` contained whitespace.
    let mut gap_has_space = false;

    for (i, chunk) in chunks.iter().enumerate() {
        let boundary = carried.map_or(chunk.boundary, |b| b.max(chunk.boundary));
        let on_whitespace =
            gap_has_space || last_kept.is_some_and(|prev| split_on_whitespace(prev, chunk));

        if chunk.text.trim().is_empty() {
            carried = Some(boundary);
            gap_has_space |= !chunk.text.is_empty();
            continue;
        }

        let result = match translator.translate_chunk(&chunk.text, target_lang).await {
            Ok(result) if !result.trim().is_empty() => result,
            Ok(_) => {
                warn!(chunk = i, "translator returned nothing, leaving chunk out");
                carried = Some(boundary);
                gap_has_space |= chunk.text.contains(char::is_whitespace);
                continue;
            }
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!(chunk = i, error = %e, "chunk translation failed, leaving chunk out");
                carried = Some(boundary);
                gap_has_space |= chunk.text.contains(char::is_whitespace);
                continue;
            }
        };

        if !out.is_empty() {
            out.push_str(joiner(boundary, on_whitespace));
        }
        out.push_str(result.trim());
        carried = None;
        last_kept = Some(chunk);
        gap_has_space = false;
        translated += 1;
        debug!(chunk = i, chars = chunk.size, "chunk translated");
    }

    if translated == 0 {
        return Err(Error::AllTranslationsFailed);
    }

    info!(translated, total = chunks.len(), "translation complete");
    Ok(TranslationResult {
        translated_text: out,
        target_lang: target_lang.to_string(),
        chunks_total: chunks.len(),
        chunks_translated: translated,
    })
}

fn split_on_whitespace(prev: &Chunk, next: &Chunk) -> bool {
    prev.text.ends_with(char::is_whitespace) || next.text.starts_with(char::is_whitespace)
}

fn joiner(boundary: Boundary, on_whitespace: bool) -> &'static str {
    match boundary {
        Boundary::Start | Boundary::Paragraph => "\n\n",
        Boundary::Sentence | Boundary::Word => " ",
        Boundary::Hard if on_whitespace => " ",
        Boundary::Hard => "",
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    /// Uppercases its input and fails on chunks containing a marker word.
    #[derive(Default)]
    struct Upper {
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Translator for Upper {
        async fn translate_chunk(&self, text: &str, _target: &str) -> Result<String> {
            self.seen.lock().unwrap().push(text.to_string());
            if text.contains("skip") {
                Ok(String::new())
            } else if text.contains("broken") {
                Err(Error::Translation("400 Bad Request".into()))
            } else {
                Ok(text.to_uppercase())
            }
        }
    }

    struct Unavailable;

    #[async_trait]
    impl Translator for Unavailable {
        async fn translate_chunk(&self, _text: &str, _target: &str) -> Result<String> {
            Err(Error::BackendUnavailable("429 Too Many Requests".into()))
        }
    }

    fn limit(chars: usize) -> TranslateOptions {
        TranslateOptions::new().max_chunk_chars(chars).unwrap()
    }

    #[tokio::test]
    async fn test_validation() {
        let opts = TranslateOptions::default();
        assert!(matches!(
            translate(&Upper::default(), " ", "es", &opts).await.unwrap_err(),
            Error::EmptyText
        ));
        let err = translate(&Upper::default(), "Hello", "  ", &opts).await.unwrap_err();
        assert!(matches!(err, Error::MissingTargetLanguage));
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn test_single_chunk() {
        let result = translate(&Upper::default(), "Hello world.", "es", &TranslateOptions::default())
            .await
            .unwrap();
        assert_eq!(result.translated_text, "HELLO WORLD.");
        assert_eq!(result.target_lang, "es");
        assert!(!result.is_partial());
    }

    #[tokio::test]
    async fn test_paragraph_separator_appears_once() {
        let translator = Upper::default();
        let text = "Hello world.\n\nSecond paragraph here.";
        let result = translate(&translator, text, "es", &limit(25)).await.unwrap();

        assert_eq!(translator.seen.lock().unwrap().len(), 2);
        assert_eq!(result.translated_text, "HELLO WORLD.\n\nSECOND PARAGRAPH HERE.");
        assert_eq!(result.translated_text.matches("\n\n").count(), 1);
    }

    #[tokio::test]
    async fn test_hard_split_pieces_rejoined() {
        let result = translate(&Upper::default(), "abcdefghij", "es", &limit(4)).await.unwrap();
        assert_eq!(result.translated_text, "ABCDEFGHIJ");
        assert_eq!(result.chunks_total, 3);

        let result = translate(&Upper::default(), "aaaa bbbb", "es", &limit(4)).await.unwrap();
        assert_eq!(result.translated_text, "AAAA BBBB");
    }

    #[tokio::test]
    async fn test_empty_translation_left_out() {
        let text = "First para.\n\nskip me.\n\nThird para.";
        let result = translate(&Upper::default(), text, "es", &limit(12)).await.unwrap();
        assert_eq!(result.translated_text, "FIRST PARA.\n\nTHIRD PARA.");
        assert_eq!(result.chunks_total, 3);
        assert_eq!(result.chunks_translated, 2);
        assert!(result.is_partial());
    }

    #[tokio::test]
    async fn test_left_out_chunk_hands_on_boundary() {
        let text = "Aaaa.\n\nbroken. Bbbb.";
        let result = translate(&Upper::default(), text, "es", &limit(7)).await.unwrap();
        assert_eq!(result.translated_text, "AAAA.\n\nBBBB.");
    }

    #[tokio::test]
    async fn test_left_out_piece_keeps_space_of_last_survivor() {
        // Pieces: "aaaaa ", "broken", "cccc"
        let result = translate(&Upper::default(), "aaaaa brokencccc", "es", &limit(6))
            .await
            .unwrap();
        assert_eq!(result.chunks_total, 3);
        assert_eq!(result.translated_text, "AAAAA CCCC");

        // Pieces: "aaaaaa", "broken", "cccc"
        let result = translate(&Upper::default(), "aaaaaabrokencccc", "es", &limit(6))
            .await
            .unwrap();
        assert_eq!(result.translated_text, "AAAAAACCCC");
    }

    #[tokio::test]
    async fn test_blank_chunks_not_sent() {
        let translator = Upper::default();
        let result = translate(&translator, "Hi.\n\n   \n\nYo.", "es", &limit(4)).await.unwrap();
        assert_eq!(result.translated_text, "HI.\n\nYO.");
        assert_eq!(*translator.seen.lock().unwrap(), vec!["Hi.", "Yo."]);
    }

    #[tokio::test]
    async fn test_all_failed() {
        let err = translate(&Upper::default(), "skip", "es", &TranslateOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::AllTranslationsFailed));
        assert_eq!(err.status_code(), 500);
    }

    #[tokio::test]
    async fn test_fatal_error_fails_request() {
        let err = translate(&Unavailable, "Hello.", "es", &TranslateOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::BackendUnavailable(_)));
    }
}
