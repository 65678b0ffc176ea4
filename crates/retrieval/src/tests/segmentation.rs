//! Structural properties of segmentation over a spread of inputs.

use crate::segment::{segment, split_sentences, Chunk, SegmentOptions};

const SAMPLES: &[&str] = &[
    "Cats are mammals. Dogs are mammals too. Birds are not mammals.",
    "One. Two words. Three words here. Four words are here. Five words are here now.",
    "A very long opening sentence that keeps going well past any small limit we choose. Short one. Another short one!",
    "القطط ثدييات. هل الطيور ثدييات؟ لا، الطيور ليست ثدييات.",
    "No terminator at all in this fragment",
    "Question? Answer! Statement. Trailing words without a stop",
];

const OPTIONS: &[(usize, usize)] = &[(1, 0), (2, 1), (3, 1), (5, 2), (8, 7), (12, 3), (500, 50)];

fn words(text: &str) -> Vec<&str> {
    text.split_whitespace().collect()
}

/// Chunk words with each chunk's overlap prefix removed.
fn without_overlap(chunks: &[Chunk]) -> Vec<String> {
    chunks
        .iter()
        .flat_map(|chunk| {
            words(chunk.text())
                .into_iter()
                .skip(chunk.overlap_words())
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .collect()
}

#[test]
fn test_chunks_reconstruct_text_without_overlap() {
    for text in SAMPLES {
        for &(max_words, overlap_words) in OPTIONS {
            let chunks = segment(text, &SegmentOptions::new(max_words, overlap_words)).unwrap();
            assert_eq!(
                without_overlap(&chunks),
                words(text),
                "text {:?} with max={} overlap={}",
                text,
                max_words,
                overlap_words
            );
        }
    }
}

#[test]
fn test_chunks_respect_word_limit_except_single_long_sentence() {
    for text in SAMPLES {
        for &(max_words, overlap_words) in OPTIONS {
            let chunks = segment(text, &SegmentOptions::new(max_words, overlap_words)).unwrap();
            for chunk in &chunks {
                if chunk.word_count() <= max_words {
                    continue;
                }
                assert_eq!(chunk.overlap_words(), 0, "oversized chunk {:?}", chunk.text());
                assert_eq!(
                    split_sentences(chunk.text()).len(),
                    1,
                    "oversized chunk {:?} holds more than one sentence",
                    chunk.text()
                );
            }
        }
    }
}

/// The sentence a chunk's seed was cut from: the first sentence after the
/// seed, or the first sentence of the next chunk when the seed stands alone.
fn overflowing_sentence<'a>(chunks: &'a [Chunk], index: usize) -> &'a str {
    let chunk = &chunks[index];
    let rest: Vec<&str> = words(chunk.text())
        .into_iter()
        .skip(chunk.overlap_words())
        .collect();
    if rest.is_empty() {
        split_sentences(chunks[index + 1].text())[0]
    } else {
        let start = chunk.text().len() - rest.join(" ").len();
        split_sentences(&chunk.text()[start..])[0]
    }
}

#[test]
fn test_seed_is_tail_of_overflowing_sentence() {
    for text in SAMPLES {
        for &(max_words, overlap_words) in OPTIONS {
            let chunks = segment(text, &SegmentOptions::new(max_words, overlap_words)).unwrap();
            for (i, chunk) in chunks.iter().enumerate() {
                let seed_len = chunk.overlap_words();
                if seed_len == 0 {
                    continue;
                }
                let seed: Vec<&str> = words(chunk.text()).into_iter().take(seed_len).collect();
                let sentence = words(overflowing_sentence(&chunks, i));
                assert_eq!(
                    seed,
                    sentence[sentence.len() - seed_len..].to_vec(),
                    "chunk {} of {:?} with max={} overlap={}",
                    i,
                    text,
                    max_words,
                    overlap_words
                );
            }
        }
    }
}

#[test]
fn test_positions_are_sequential() {
    for text in SAMPLES {
        let chunks = segment(text, &SegmentOptions::new(3, 1)).unwrap();
        let positions: Vec<u32> = chunks.iter().map(|c| c.position()).collect();
        let expected: Vec<u32> = (0..chunks.len() as u32).collect();
        assert_eq!(positions, expected);
    }
}

#[test]
fn test_whitespace_only_text_has_no_chunks() {
    let chunks = segment(" \n\t ", &SegmentOptions::default()).unwrap();
    assert!(chunks.is_empty());
}
