//! Splitting long text into bounded chunks.
//!
//! Two policies: [`split_words`] groups whitespace-separated words (used for
//! summarization), [`split_hierarchical`] cuts on paragraph, then sentence,
//! then fixed-width boundaries to respect a character ceiling (used for
//! translation). Every [`Chunk`] remembers the separator that preceded it so
//! [`reassemble`] can rebuild the source.

use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

static SENTENCE_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]\s+").unwrap());

const PARAGRAPH_BREAK: &str = "\n\n";

/// Unit a chunk's `size` is measured in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeUnit {
    Words,
    Chars,
}

/// How a chunk is separated from the one before it, weakest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Boundary {
    /// Fixed-width cut inside an oversized sentence.
    Hard,
    /// Word-count cut.
    Word,
    /// Cut between two sentences of the same paragraph.
    Sentence,
    /// Cut between paragraphs.
    Paragraph,
    /// First chunk of the document.
    Start,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub text: String,
    pub size: usize,
    pub unit: SizeUnit,
    /// Source text between the previous chunk and this one.
    pub separator: String,
    pub boundary: Boundary,
}

/// Concatenate separators and chunk texts back into one string.
pub fn reassemble(chunks: &[Chunk]) -> String {
    chunks.iter().fold(String::new(), |mut out, c| {
        out.push_str(&c.separator);
        out.push_str(&c.text);
        out
    })
}

/// Group words into chunks of at most `max_words` (values below 1 mean 1).
pub fn split_words(text: &str, max_words: usize) -> Vec<Chunk> {
    let words: Vec<&str> = text.split_whitespace().collect();
    let chunks: Vec<Chunk> = words
        .chunks(max_words.max(1))
        .enumerate()
        .map(|(i, group)| Chunk {
            text: group.join(" "),
            size: group.len(),
            unit: SizeUnit::Words,
            separator: if i == 0 { String::new() } else { " ".into() },
            boundary: if i == 0 { Boundary::Start } else { Boundary::Word },
        })
        .collect();

    debug!(words = words.len(), chunks = chunks.len(), "split by words");
    chunks
}

/// Split `text` so that every chunk holds at most `max_chars` characters.
///
/// Paragraphs (`\n\n`) are packed greedily; a paragraph over the limit is
/// packed sentence by sentence; a sentence over the limit is cut into pieces
/// of exactly `max_chars` characters, the last possibly shorter.
pub fn split_hierarchical(text: &str, max_chars: usize) -> Vec<Chunk> {
    let max = max_chars.max(1);
    let total = text.chars().count();
    if total <= max {
        return vec![Chunk {
            text: text.to_string(),
            size: total,
            unit: SizeUnit::Chars,
            separator: String::new(),
            boundary: Boundary::Start,
        }];
    }

    let mut packer = Packer::new(text, max);
    for paragraph in paragraph_spans(text) {
        if char_len(text, &paragraph.body) <= max {
            packer.push(paragraph);
            continue;
        }

        packer.flush();
        for sentence in sentence_spans(text, paragraph) {
            if char_len(text, &sentence.body) > max {
                packer.push_hard(sentence);
            } else {
                packer.push(sentence);
            }
        }
        packer.flush();
    }
    packer.flush();

    debug!(chars = total, chunks = packer.out.len(), max, "split hierarchically");
    packer.out
}

/// Sentences of `text`, each ending at its terminator, surrounding whitespace removed.
pub fn sentences(text: &str) -> Vec<&str> {
    let whole = Span {
        sep: 0..0,
        body: 0..text.len(),
        boundary: Boundary::Start,
    };
    sentence_spans(text, whole)
        .into_iter()
        .map(|s| text[s.body].trim())
        .filter(|s| !s.is_empty())
        .collect()
}

/// A body range plus the separator range in front of it, both byte offsets into the source.
#[derive(Debug, Clone)]
struct Span {
    sep: Range<usize>,
    body: Range<usize>,
    boundary: Boundary,
}

fn char_len(text: &str, range: &Range<usize>) -> usize {
    text[range.clone()].chars().count()
}

fn paragraph_spans(text: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut sep_start = 0;
    let mut start = 0;

    for (idx, _) in text.match_indices(PARAGRAPH_BREAK) {
        spans.push(Span {
            sep: sep_start..start,
            body: start..idx,
            boundary: if spans.is_empty() { Boundary::Start } else { Boundary::Paragraph },
        });
        sep_start = idx;
        start = idx + PARAGRAPH_BREAK.len();
    }
    spans.push(Span {
        sep: sep_start..start,
        body: start..text.len(),
        boundary: if spans.is_empty() { Boundary::Start } else { Boundary::Paragraph },
    });
    spans
}

/// Split one paragraph span into sentence spans. The first sentence inherits
/// the paragraph's separator and boundary.
fn sentence_spans(text: &str, paragraph: Span) -> Vec<Span> {
    let offset = paragraph.body.start;
    let mut spans = Vec::new();
    let mut sep = paragraph.sep;
    let mut boundary = paragraph.boundary;
    let mut start = offset;

    for m in SENTENCE_BREAK.find_iter(&text[paragraph.body.clone()]) {
        // Terminators are ASCII, so the sentence ends one byte into the match.
        let end = offset + m.start() + 1;
        spans.push(Span {
            sep,
            body: start..end,
            boundary,
        });
        sep = end..offset + m.end();
        start = offset + m.end();
        boundary = Boundary::Sentence;
    }
    spans.push(Span {
        sep,
        body: start..paragraph.body.end,
        boundary,
    });
    spans
}

/// Open chunk being grown by [`Packer`].
struct Open {
    sep: Range<usize>,
    start: usize,
    end: usize,
    chars: usize,
    boundary: Boundary,
}

/// Greedy accumulator: extends the open chunk while it fits, emits otherwise.
struct Packer<'a> {
    text: &'a str,
    max: usize,
    open: Option<Open>,
    out: Vec<Chunk>,
}

impl<'a> Packer<'a> {
    fn new(text: &'a str, max: usize) -> Self {
        Self {
            text,
            max,
            open: None,
            out: Vec::new(),
        }
    }

    fn push(&mut self, span: Span) {
        let body_chars = char_len(self.text, &span.body);
        if let Some(open) = self.open.as_mut() {
            let grown = open.chars + char_len(self.text, &span.sep) + body_chars;
            if grown <= self.max {
                open.end = span.body.end;
                open.chars = grown;
                return;
            }
            self.flush();
        }
        self.open = Some(Open {
            sep: span.sep,
            start: span.body.start,
            end: span.body.end,
            chars: body_chars,
            boundary: span.boundary,
        });
    }

    fn push_hard(&mut self, span: Span) {
        self.flush();

        let base = span.body.start;
        let body = &self.text[span.body.clone()];
        let mut sep = span.sep;
        let mut boundary = span.boundary;
        let mut piece_start = base;
        let mut count = 0;

        for (i, _) in body.char_indices() {
            if count == self.max {
                self.emit(sep, piece_start..base + i, count, boundary);
                piece_start = base + i;
                sep = piece_start..piece_start;
                boundary = Boundary::Hard;
                count = 0;
            }
            count += 1;
        }
        self.emit(sep, piece_start..span.body.end, count, boundary);
    }

    fn flush(&mut self) {
        if let Some(open) = self.open.take() {
            self.emit(open.sep, open.start..open.end, open.chars, open.boundary);
        }
    }

    fn emit(&mut self, sep: Range<usize>, body: Range<usize>, size: usize, boundary: Boundary) {
        self.out.push(Chunk {
            text: self.text[body].to_string(),
            size,
            unit: SizeUnit::Chars,
            separator: self.text[sep].to_string(),
            boundary,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_texts() -> Vec<String> {
        vec![
            String::new(),
            "one".into(),
            "Short paragraph.\n\nAnother short one.\n\nAnd a third.".into(),
            "First sentence here. Second sentence follows!  Third one? Fourth.\n\nNext paragraph is tiny.".into(),
            format!("{}.\n\nTail paragraph.", "x".repeat(57)),
            "a\n\n\n\nb\n\n\nc".into(),
            "Ünïcödé wörds hërë. Möre têxt follows. Ënd of it all.".into(),
            format!("{} {}", "word ".repeat(40), "Final sentence. Done."),
        ]
    }

    #[test]
    fn test_split_words_groups_in_order() {
        let chunks = split_words("a b c d e f g", 3);
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["a b c", "d e f", "g"]);
        assert_eq!(chunks[2].size, 1);
        assert_eq!(chunks[0].boundary, Boundary::Start);
        assert_eq!(chunks[1].boundary, Boundary::Word);
    }

    #[test]
    fn test_split_words_properties() {
        for text in sample_texts() {
            for max in [1, 2, 5, 250] {
                let chunks = split_words(&text, max);
                assert!(chunks.iter().all(|c| c.size <= max && c.size > 0));
                let words: Vec<&str> = chunks.iter().flat_map(|c| c.text.split(' ')).collect();
                let expected: Vec<&str> = text.split_whitespace().collect();
                assert_eq!(words, expected);
            }
        }
    }

    #[test]
    fn test_split_words_zero_limit_and_empty() {
        assert_eq!(split_words("a b", 0).len(), 2);
        assert!(split_words("   ", 10).is_empty());
    }

    #[test]
    fn test_hierarchical_fits_in_one_chunk() {
        let chunks = split_hierarchical("Hello world.\n\nSecond.", 4500);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].boundary, Boundary::Start);
        assert_eq!(chunks[0].text, "Hello world.\n\nSecond.");
    }

    #[test]
    fn test_hierarchical_packs_paragraphs() {
        let text = "aaaa\n\nbbbb\n\ncccc";
        let chunks = split_hierarchical(text, 10);
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["aaaa\n\nbbbb", "cccc"]);
        assert_eq!(chunks[1].separator, "\n\n");
        assert_eq!(chunks[1].boundary, Boundary::Paragraph);
    }

    #[test]
    fn test_hierarchical_splits_long_paragraph_on_sentences() {
        let text = "One two. Three four. Five six.";
        let chunks = split_hierarchical(text, 12);
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["One two.", "Three four.", "Five six."]);
        assert_eq!(chunks[0].boundary, Boundary::Start);
        assert_eq!(chunks[1].boundary, Boundary::Sentence);
        assert_eq!(chunks[1].separator, " ");
    }

    #[test]
    fn test_hierarchical_hard_splits_long_sentence() {
        let text = format!("{}\n\nok", "y".repeat(25));
        let chunks = split_hierarchical(&text, 10);
        let sizes: Vec<usize> = chunks.iter().map(|c| c.size).collect();
        assert_eq!(sizes, vec![10, 10, 5, 2]);
        assert_eq!(chunks[1].boundary, Boundary::Hard);
        assert_eq!(chunks[1].separator, "");
        assert_eq!(chunks[3].boundary, Boundary::Paragraph);
    }

    #[test]
    fn test_hierarchical_properties() {
        for text in sample_texts() {
            for max in [1, 3, 10, 20, 60, 4500] {
                let chunks = split_hierarchical(&text, max);
                assert_eq!(reassemble(&chunks), text, "max={max} text={text:?}");
                for c in &chunks {
                    assert_eq!(c.size, c.text.chars().count());
                    assert!(c.size <= max, "chunk {c:?} over {max}");
                }
            }
        }
    }

    #[test]
    fn test_hard_split_pieces_are_exact_width() {
        let text = "z".repeat(23);
        let chunks = split_hierarchical(&text, 5);
        assert!(chunks[..chunks.len() - 1].iter().all(|c| c.size == 5));
        assert_eq!(chunks.last().unwrap().size, 3);
        assert_eq!(reassemble(&chunks), text);
    }

    #[test]
    fn test_sentences() {
        assert_eq!(
            sentences("Hi there. How are you?  Fine!\nGreat"),
            vec!["Hi there.", "How are you?", "Fine!", "Great"]
        );
        assert!(sentences("   ").is_empty());
    }
}
