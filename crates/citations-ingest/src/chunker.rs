//! Token-bounded chunking for retrieval.
//!
//! Text is split on paragraph boundaries first. A paragraph that does not fit
//! the token budget is split into sentences, and sentences are packed greedily.
//! A sentence that alone exceeds the budget becomes its own chunk, whole.
//!
//! Chunks are slices of the source, so concatenating each chunk's fresh text
//! (everything after its overlap prefix) reproduces the input exactly.

use crate::tokenizer::TokenCounter;
use citations_config::ChunkingConfig;
use std::ops::Range;
use std::sync::Arc;
use thiserror::Error;
use unicode_segmentation::UnicodeSegmentation;

/// Limits for chunking, in tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkConfig {
    /// Maximum tokens per chunk, overlap included.
    pub max_tokens: usize,
    /// Maximum tokens repeated from the end of the previous chunk.
    pub overlap_tokens: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self::from_chunking_config(&ChunkingConfig::default())
    }
}

impl ChunkConfig {
    pub fn new(max_tokens: usize, overlap_tokens: usize) -> Self {
        Self {
            max_tokens,
            overlap_tokens,
        }
    }

    /// Create config from the chunking settings.
    pub fn from_chunking_config(config: &ChunkingConfig) -> Self {
        Self::new(config.max_tokens, config.overlap_tokens)
    }
}

/// The chunker produced output that does not tile its input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ChunkError(String);

/// One chunk together with where it sits in the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkSpan {
    /// Chunk text, overlap prefix included.
    pub text: String,
    /// Byte range of `text` in the source.
    pub range: Range<usize>,
    /// Length in bytes of the prefix repeated from the previous chunk.
    pub overlap: usize,
    /// The chunk is a single unit that exceeds the token budget on its own.
    pub oversized: bool,
}

impl ChunkSpan {
    /// The part of the chunk not shared with the previous chunk.
    pub fn fresh_text(&self) -> &str {
        &self.text[self.overlap..]
    }
}

/// Splits text into token-bounded chunks.
pub struct Chunker {
    config: ChunkConfig,
    counter: Arc<dyn TokenCounter>,
}

impl Chunker {
    /// Create a new chunker with the given limits and token counter.
    pub fn new(config: ChunkConfig, counter: Arc<dyn TokenCounter>) -> Self {
        Self { config, counter }
    }

    /// Split text into chunk strings. Empty or whitespace-only text yields none.
    pub fn chunk(&self, text: &str) -> Result<Vec<String>, ChunkError> {
        Ok(self.split(text)?.into_iter().map(|span| span.text).collect())
    }

    /// Split text into chunks, keeping their position in the source.
    pub fn split(&self, text: &str) -> Result<Vec<ChunkSpan>, ChunkError> {
        if text.trim().is_empty() {
            return Ok(vec![]);
        }

        let mut spans = Vec::new();
        // Sentence units making up the last emitted chunk
        let mut previous: Vec<Range<usize>> = Vec::new();

        for paragraph in paragraph_ranges(text) {
            let units = sentence_ranges(text, paragraph.clone());

            if self.fits(&text[paragraph.clone()]) {
                let start = self.overlap_start(text, &previous, paragraph);
                emit(text, &mut spans, &mut previous, start, &units, false);
                continue;
            }

            let mut i = 0;
            while i < units.len() {
                let mut start = self.overlap_start(text, &previous, units[i].clone());
                let mut end = i + 1;
                while end < units.len() && self.fits(&text[start..units[end].end]) {
                    end += 1;
                }

                let oversized = end == i + 1 && !self.fits(&text[units[i].clone()]);
                if oversized {
                    start = units[i].start;
                }
                emit(text, &mut spans, &mut previous, start, &units[i..end], oversized);
                i = end;
            }
        }

        verify_tiling(text, &spans)?;
        Ok(spans)
    }

    fn fits(&self, text: &str) -> bool {
        self.counter.count(text) <= self.config.max_tokens
    }

    /// Earliest start among the previous chunk's units that keeps the prefix
    /// within the overlap budget and the prefix plus `range` within the
    /// token budget.
    fn overlap_start(&self, text: &str, previous: &[Range<usize>], range: Range<usize>) -> usize {
        if self.config.overlap_tokens == 0 {
            return range.start;
        }

        let mut start = range.start;
        for unit in previous.iter().rev() {
            let prefix = &text[unit.start..range.start];
            if self.counter.count(prefix) > self.config.overlap_tokens
                || !self.fits(&text[unit.start..range.end])
            {
                break;
            }
            start = unit.start;
        }
        start
    }
}

/// Push a chunk made of the `fresh` units, starting at `start` to include
/// any overlap.
fn emit(
    text: &str,
    spans: &mut Vec<ChunkSpan>,
    previous: &mut Vec<Range<usize>>,
    start: usize,
    fresh: &[Range<usize>],
    oversized: bool,
) {
    let (Some(first), Some(last)) = (fresh.first(), fresh.last()) else {
        return;
    };

    spans.push(ChunkSpan {
        text: text[start..last.end].to_string(),
        range: start..last.end,
        overlap: first.start - start,
        oversized,
    });

    previous.retain(|unit| unit.start >= start);
    previous.extend(fresh.iter().cloned());
}

/// Byte ranges of paragraphs. Blank lines belong to the paragraph they end,
/// so the ranges tile the text.
fn paragraph_ranges(text: &str) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut start = 0;
    let mut offset = 0;
    let mut has_content = false;
    let mut after_blank = false;

    for line in text.split_inclusive('\n') {
        let blank = line.trim().is_empty();
        if !blank && after_blank && has_content {
            ranges.push(start..offset);
            start = offset;
            has_content = false;
        }
        if blank {
            after_blank = true;
        } else {
            has_content = true;
            after_blank = false;
        }
        offset += line.len();
    }

    if start < text.len() {
        ranges.push(start..text.len());
    }
    ranges
}

/// Byte ranges of sentences within `range`. Whitespace-only pieces are merged
/// into the sentence before them.
fn sentence_ranges(text: &str, range: Range<usize>) -> Vec<Range<usize>> {
    let base = range.start;
    let mut units: Vec<Range<usize>> = Vec::new();

    for (offset, sentence) in text[range].split_sentence_bound_indices() {
        let unit = base + offset..base + offset + sentence.len();
        match units.last_mut() {
            Some(last) if sentence.trim().is_empty() => last.end = unit.end,
            Some(last) if text[last.clone()].trim().is_empty() => last.end = unit.end,
            _ => units.push(unit),
        }
    }
    units
}

/// Check that the fresh parts of the spans cover the text exactly once.
fn verify_tiling(text: &str, spans: &[ChunkSpan]) -> Result<(), ChunkError> {
    let mut expected = 0;
    for (i, span) in spans.iter().enumerate() {
        let fresh_start = span.range.start + span.overlap;
        if fresh_start != expected {
            return Err(ChunkError(format!(
                "chunk {} starts at byte {} but the previous chunk ended at byte {}",
                i, fresh_start, expected
            )));
        }
        if span.range.end <= fresh_start {
            return Err(ChunkError(format!("chunk {} adds no new text", i)));
        }
        expected = span.range.end;
    }

    if expected != text.len() {
        return Err(ChunkError(format!(
            "chunks end at byte {} of {}",
            expected,
            text.len()
        )));
    }
    Ok(())
}
