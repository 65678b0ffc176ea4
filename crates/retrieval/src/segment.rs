//! Sentence-aware text segmentation.
//!
//! Splits plain text into overlapping, word-bounded chunks. Each chunk after
//! an overflow opens with the tail of the sentence that caused it. Sentences
//! are never split or dropped; a sentence longer than `max_words` becomes a
//! chunk of its own.

use docqa_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_WORDS: usize = 500;
pub const DEFAULT_OVERLAP_WORDS: usize = 50;

/// Sentence terminators for Latin and Arabic scripts.
const SENTENCE_TERMINATORS: [char; 4] = ['.', '!', '?', '\u{061F}'];

/// Parameters for [`segment`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentOptions {
    pub max_words: usize,
    pub overlap_words: usize,
}

impl Default for SegmentOptions {
    fn default() -> Self {
        Self {
            max_words: DEFAULT_MAX_WORDS,
            overlap_words: DEFAULT_OVERLAP_WORDS,
        }
    }
}

impl SegmentOptions {
    pub fn new(max_words: usize, overlap_words: usize) -> Self {
        Self {
            max_words,
            overlap_words,
        }
    }

    /// Reject a zero `max_words` and clamp `overlap_words` below it.
    pub fn validate(self) -> AppResult<Self> {
        if self.max_words == 0 {
            return Err(AppError::Validation(
                "max_words must be at least 1".to_string(),
            ));
        }

        let overlap_words = if self.overlap_words >= self.max_words {
            tracing::warn!(
                overlap_words = self.overlap_words,
                max_words = self.max_words,
                "overlap_words clamped below max_words"
            );
            self.max_words - 1
        } else {
            self.overlap_words
        };

        Ok(Self {
            max_words: self.max_words,
            overlap_words,
        })
    }
}

/// One passage of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    position: u32,
    text: String,
    overlap_words: usize,
}

impl Chunk {
    /// Position within the document, starting at 0.
    pub fn position(&self) -> u32 {
        self.position
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Number of leading seed words. A chunk made only of a seed counts all
    /// of its words.
    pub fn overlap_words(&self) -> usize {
        self.overlap_words
    }

    pub fn word_count(&self) -> usize {
        word_count(&self.text)
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

/// Split text into sentences.
///
/// A boundary is a terminator followed by a run of whitespace. Fragments are
/// trimmed and empty ones dropped.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        if !SENTENCE_TERMINATORS.contains(&ch) {
            continue;
        }

        let followed_by_space = matches!(chars.peek(), Some(&(_, next)) if next.is_whitespace());
        if !followed_by_space {
            continue;
        }

        push_fragment(&mut sentences, &text[start..idx + ch.len_utf8()]);

        while let Some(&(_, next)) = chars.peek() {
            if !next.is_whitespace() {
                break;
            }
            chars.next();
        }
        start = chars.peek().map(|&(i, _)| i).unwrap_or(text.len());
    }

    push_fragment(&mut sentences, &text[start..]);
    sentences
}

fn push_fragment<'a>(sentences: &mut Vec<&'a str>, fragment: &'a str) {
    let trimmed = fragment.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed);
    }
}

fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Accumulates sentences into the chunk being built.
struct ChunkBuilder {
    parts: Vec<String>,
    words: usize,
    overlap_words: usize,
}

impl ChunkBuilder {
    fn seeded(seed: Vec<&str>) -> Self {
        let overlap_words = seed.len();
        let parts = if seed.is_empty() {
            Vec::new()
        } else {
            vec![seed.join(" ")]
        };
        Self {
            parts,
            words: overlap_words,
            overlap_words,
        }
    }

    fn push(&mut self, sentence: &str, words: usize) {
        self.parts.push(sentence.to_string());
        self.words += words;
    }

    fn finish(self, position: u32) -> Chunk {
        Chunk {
            position,
            text: self.parts.join(" "),
            overlap_words: self.overlap_words,
        }
    }
}

/// Segment text into overlapping chunks.
///
/// Sentences are packed greedily while the word count stays within
/// `max_words`. When a sentence overflows the current chunk, the chunk is
/// closed and the next one is seeded with the last `overlap_words` words of
/// that overflowing sentence. The sentence then joins the seeded chunk if it
/// fits; otherwise the seed is closed as a chunk of its own and the sentence
/// starts an unseeded one. Seed words are reported by
/// [`Chunk::overlap_words`], so every sentence appears exactly once outside
/// the overlap.
///
/// # Example
/// ```
/// use docqa_retrieval::segment::{segment, SegmentOptions};
///
/// let chunks = segment("One two. Three four.", &SegmentOptions::new(500, 50)).unwrap();
/// assert_eq!(chunks.len(), 1);
/// assert_eq!(chunks[0].text(), "One two. Three four.");
/// ```
pub fn segment(text: &str, options: &SegmentOptions) -> AppResult<Vec<Chunk>> {
    let options = options.validate()?;

    let mut chunks = Vec::new();
    let mut current = ChunkBuilder::seeded(Vec::new());

    for sentence in split_sentences(text) {
        let words = word_count(sentence);
        let mut seeded = false;

        while current.words > 0 && current.words + words > options.max_words {
            let next = if seeded {
                ChunkBuilder::seeded(Vec::new())
            } else {
                seeded = true;
                ChunkBuilder::seeded(overlap_seed(sentence, options.overlap_words))
            };
            let closed = std::mem::replace(&mut current, next);
            chunks.push(closed.finish(chunks.len() as u32));
        }

        current.push(sentence, words);
    }

    if current.words > 0 {
        chunks.push(current.finish(chunks.len() as u32));
    }

    tracing::trace!(chunks = chunks.len(), "Segmented text");
    Ok(chunks)
}

/// The last `overlap_words` words of `sentence`.
fn overlap_seed(sentence: &str, overlap_words: usize) -> Vec<&str> {
    let words: Vec<&str> = sentence.split_whitespace().collect();
    let skip = words.len().saturating_sub(overlap_words);
    words[skip..].to_vec()
}

/// Texts of the chunks, in order.
pub fn chunk_texts(chunks: &[Chunk]) -> Vec<String> {
    chunks.iter().map(|chunk| chunk.text.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ANIMALS: &str = "Cats are mammals. Dogs are mammals too. Birds are not mammals.";

    fn texts(chunks: &[Chunk]) -> Vec<&str> {
        chunks.iter().map(|c| c.text()).collect()
    }

    #[test]
    fn test_split_sentences() {
        assert_eq!(
            split_sentences("Hello there!  How are you?\nFine. 3.14 is pi"),
            vec!["Hello there!", "How are you?", "Fine.", "3.14 is pi"]
        );
    }

    #[test]
    fn test_split_sentences_arabic() {
        let text = "كيف حالك؟ أنا بخير.";
        assert_eq!(split_sentences(text), vec!["كيف حالك؟", "أنا بخير."]);
    }

    #[test]
    fn test_split_sentences_blank() {
        assert!(split_sentences("   \n\t ").is_empty());
        assert!(split_sentences("").is_empty());
    }

    #[test]
    fn test_empty_text_yields_no_chunks() {
        let chunks = segment("", &SegmentOptions::default()).unwrap();
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_single_sentence_single_chunk() {
        let chunks = segment("Only one sentence here.", &SegmentOptions::default()).unwrap();
        assert_eq!(texts(&chunks), vec!["Only one sentence here."]);
        assert_eq!(chunks[0].position(), 0);
        assert_eq!(chunks[0].overlap_words(), 0);
    }

    #[test]
    fn test_animals_max_four() {
        let chunks = segment(ANIMALS, &SegmentOptions::new(4, 1)).unwrap();
        assert_eq!(
            texts(&chunks),
            vec![
                "Cats are mammals.",
                "too.",
                "Dogs are mammals too.",
                "mammals.",
                "Birds are not mammals."
            ]
        );
        let overlaps: Vec<usize> = chunks.iter().map(|c| c.overlap_words()).collect();
        assert_eq!(overlaps, vec![0, 1, 0, 1, 0]);
    }

    #[test]
    fn test_seed_joins_overflowing_sentence_when_it_fits() {
        let chunks = segment(ANIMALS, &SegmentOptions::new(6, 1)).unwrap();
        assert_eq!(
            texts(&chunks),
            vec![
                "Cats are mammals.",
                "too. Dogs are mammals too.",
                "mammals. Birds are not mammals."
            ]
        );
        assert_eq!(chunks[1].overlap_words(), 1);
        assert_eq!(chunks[2].overlap_words(), 1);
        assert_eq!(chunks[2].word_count(), 5);
    }

    #[test]
    fn test_seed_taken_from_overflowing_sentence() {
        let text = "Red fox runs. Blue whale swims deep. Green frog jumps.";
        let chunks = segment(text, &SegmentOptions::new(6, 2)).unwrap();
        assert_eq!(
            texts(&chunks),
            vec![
                "Red fox runs.",
                "swims deep. Blue whale swims deep.",
                "frog jumps. Green frog jumps."
            ]
        );
        assert!(!chunks[1].text().starts_with("fox runs."));
        assert!(!chunks[2].text().starts_with("swims deep. Green"));
    }

    #[test]
    fn test_long_sentence_is_own_chunk() {
        let text = "Short one. This sentence is clearly far too long to fit. End here.";
        let chunks = segment(text, &SegmentOptions::new(4, 2)).unwrap();
        assert_eq!(
            texts(&chunks),
            vec![
                "Short one.",
                "to fit.",
                "This sentence is clearly far too long to fit.",
                "End here. End here."
            ]
        );
        assert_eq!(chunks[2].overlap_words(), 0);
    }

    #[test]
    fn test_zero_max_words_rejected() {
        let result = segment(ANIMALS, &SegmentOptions::new(0, 0));
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_overlap_clamped() {
        let options = SegmentOptions::new(5, 9).validate().unwrap();
        assert_eq!(options.overlap_words, 4);

        let chunks = segment(ANIMALS, &SegmentOptions::new(5, 9)).unwrap();
        assert!(chunks.iter().all(|c| c.word_count() <= 5));
    }

    #[test]
    fn test_positions_are_sequential() {
        let text = "A b c. D e f. G h i. J k l.";
        let chunks = segment(text, &SegmentOptions::new(3, 0)).unwrap();
        let positions: Vec<u32> = chunks.iter().map(|c| c.position()).collect();
        assert_eq!(positions, vec![0, 1, 2, 3]);
        assert_eq!(chunk_texts(&chunks)[3], "J k l.");
    }
}
