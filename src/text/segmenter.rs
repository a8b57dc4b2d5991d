//! Paragraph segmentation.
//!
//! Pages are split into chunks that are short enough to synthesize with low
//! latency, so playback of the first paragraph can start while the rest is
//! still being generated.
//!
//! Two strategies are used:
//!
//! 1. **Paragraphs**: split at blank lines, or at a newline followed by an
//!    uppercase letter. Fragments of at most `min_paragraph_chars` characters
//!    (headers, page numbers) are dropped.
//! 2. **Sentence groups**: when a long text has no usable paragraph structure,
//!    consecutive sentences are grouped into chunks of roughly
//!    `target_chunk_chars` characters.
//!
//! A non-blank input always yields at least one chunk.
//!
//! # Limitations
//!
//! The "new line starting with an uppercase letter" heuristic only recognises
//! ASCII uppercase letters (see [`opens_paragraph`]). Scripts without letter
//! case, and non-Latin uppercase letters, only split at blank lines.

use std::ops::Range;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Fragments at or below this many characters are treated as noise.
pub const DEFAULT_MIN_PARAGRAPH_CHARS: usize = 10;

/// Texts longer than this fall back to sentence grouping when they have no paragraphs.
pub const DEFAULT_SENTENCE_FALLBACK_CHARS: usize = 500;

/// Sentence groups are closed once they reach this many characters.
pub const DEFAULT_TARGET_CHUNK_CHARS: usize = 300;

/// Tunable thresholds for [`Segmenter`].
///
/// ```
/// use pocket_reader::text::SegmenterConfigBuilder;
///
/// let config = SegmenterConfigBuilder::default()
///     .target_chunk_chars(200)
///     .build()
///     .unwrap();
/// assert_eq!(config.min_paragraph_chars, 10);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[builder(default)]
#[serde(default)]
pub struct SegmenterConfig {
    /// Paragraph fragments whose trimmed length is at or below this are discarded.
    pub min_paragraph_chars: usize,
    /// Minimum text length (exclusive) for the sentence-group fallback.
    pub sentence_fallback_chars: usize,
    /// Character count at which a sentence group is closed.
    pub target_chunk_chars: usize,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            min_paragraph_chars: DEFAULT_MIN_PARAGRAPH_CHARS,
            sentence_fallback_chars: DEFAULT_SENTENCE_FALLBACK_CHARS,
            target_chunk_chars: DEFAULT_TARGET_CHUNK_CHARS,
        }
    }
}

/// Splits text into ordered, trimmed, non-empty chunks.
///
/// The segmenter holds no state besides its configuration and can be shared
/// freely between threads.
#[derive(Debug, Clone, Default)]
pub struct Segmenter {
    config: SegmenterConfig,
}

impl Segmenter {
    pub fn new(config: SegmenterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SegmenterConfig {
        &self.config
    }

    /// Split `text` into chunks in reading order.
    ///
    /// Callers are expected to reject blank input first; for whitespace-only
    /// text the result is a single empty chunk.
    pub fn segment(&self, text: &str) -> Vec<String> {
        let mut chunks: Vec<String> = split_on(text, paragraph_break_at)
            .into_iter()
            .map(str::trim)
            .filter(|fragment| char_len(fragment) > self.config.min_paragraph_chars)
            .map(str::to_owned)
            .collect();

        if chunks.len() <= 1 && char_len(text) > self.config.sentence_fallback_chars {
            log::debug!(
                "No paragraph structure in {} chars of text, grouping sentences",
                char_len(text)
            );
            chunks = self.group_sentences(text);
        }

        if chunks.is_empty() {
            chunks.push(text.trim().to_owned());
        }

        chunks
    }

    fn group_sentences(&self, text: &str) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut group: Vec<&str> = Vec::new();
        let mut group_chars = 0;

        let sentences = split_on(text, sentence_break_at)
            .into_iter()
            .map(str::trim)
            .filter(|sentence| !sentence.is_empty());

        for sentence in sentences {
            group.push(sentence);
            group_chars += char_len(sentence);

            if group_chars >= self.config.target_chunk_chars {
                chunks.push(group.join(" "));
                group.clear();
                group_chars = 0;
            }
        }

        // Trailing sentences are emitted even when short of the target.
        if !group.is_empty() {
            chunks.push(group.join(" "));
        }

        chunks
    }
}

/// Split `text` into chunks using the default thresholds.
pub fn segment(text: &str) -> Vec<String> {
    Segmenter::default().segment(text)
}

/// Whether `c` can start a paragraph that follows a single line break.
///
/// Only ASCII uppercase letters qualify.
pub fn opens_paragraph(c: char) -> bool {
    c.is_ascii_uppercase()
}

/// Byte range of the paragraph separator starting at `index`, if there is one.
///
/// A separator starts at a newline and is either
/// - a whitespace run containing a second newline, in which case it extends
///   to the last newline of the run, or
/// - a lone newline whose following whitespace ends in a letter accepted by
///   [`opens_paragraph`]. Only the newline belongs to the separator.
pub fn paragraph_break_at(text: &str, index: usize) -> Option<Range<usize>> {
    let rest = text.get(index..)?;
    if !rest.starts_with('\n') {
        return None;
    }

    let after = &rest[1..];
    let run_len = after.len() - after.trim_start().len();
    let run = &after[..run_len];

    if let Some(last_newline) = run.rfind('\n') {
        return Some(index..index + 1 + last_newline + 1);
    }

    match after[run_len..].chars().next() {
        Some(c) if opens_paragraph(c) => Some(index..index + 1),
        _ => None,
    }
}

/// Byte range of the sentence separator starting at `index`, if there is one.
///
/// A sentence separator is a whitespace run directly after `.`, `!` or `?`.
pub fn sentence_break_at(text: &str, index: usize) -> Option<Range<usize>> {
    let rest = text.get(index..)?;
    let terminated = matches!(
        text[..index].chars().next_back(),
        Some('.') | Some('!') | Some('?')
    );
    if !terminated {
        return None;
    }

    let run_len = rest.len() - rest.trim_start().len();
    if run_len == 0 {
        return None;
    }

    Some(index..index + run_len)
}

/// Split `text` at every separator reported by `break_at`, scanning left to right.
///
/// Separators are removed; the pieces between them are returned untrimmed.
fn split_on<F>(text: &str, break_at: F) -> Vec<&str>
where
    F: Fn(&str, usize) -> Option<Range<usize>>,
{
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut cursor = 0;

    while let Some(c) = text[cursor..].chars().next() {
        match break_at(text, cursor) {
            Some(separator) if !separator.is_empty() => {
                pieces.push(&text[start..separator.start]);
                start = separator.end;
                cursor = separator.end;
            }
            _ => cursor += c.len_utf8(),
        }
    }

    pieces.push(&text[start..]);
    pieces
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

#[cfg(test)]
mod tests {
    use super::{
        paragraph_break_at, segment, sentence_break_at, split_on, Segmenter, SegmenterConfig,
        SegmenterConfigBuilder,
    };

    fn sentence(n: usize) -> String {
        format!("Sentence number {n} keeps the reader company for a short while.")
    }

    fn run_on_text(sentences: usize) -> String {
        (0..sentences)
            .map(sentence)
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn splits_on_blank_lines() {
        let text = "The first paragraph is here.\n\nThe second paragraph follows.";
        assert_eq!(
            segment(text),
            vec!["The first paragraph is here.", "The second paragraph follows."]
        );
    }

    #[test]
    fn splits_on_newline_before_uppercase() {
        let chunks = segment("Para one here.\nPara Two starts here with capital.");
        assert_eq!(
            chunks,
            vec!["Para one here.", "Para Two starts here with capital."]
        );
    }

    #[test]
    fn keeps_line_wrapped_sentences_together() {
        let text = "a sentence that wraps onto\nthe next line in lowercase.";
        assert_eq!(segment(text), vec![text]);
    }

    #[test]
    fn drops_short_fragments() {
        let text = "Chapter 1\n\nThis is a test paragraph that is long enough.\n\n12";
        assert_eq!(
            segment(text),
            vec!["This is a test paragraph that is long enough."]
        );
    }

    #[test]
    fn keeps_fragments_just_over_the_noise_threshold() {
        // "Hello world." is 12 characters.
        let text = "Hello world.\n\nThis is a test paragraph that is long enough.";
        assert_eq!(
            segment(text),
            vec!["Hello world.", "This is a test paragraph that is long enough."]
        );
    }

    #[test]
    fn fragment_of_exactly_ten_chars_is_noise() {
        let text = "0123456789\n\nThis is a test paragraph that is long enough.";
        assert_eq!(
            segment(text),
            vec!["This is a test paragraph that is long enough."]
        );
    }

    #[test]
    fn single_paragraph_is_returned_trimmed() {
        let text = "   one paragraph without any breaks at all, well under the limit.  \n";
        assert_eq!(
            segment(text),
            vec!["one paragraph without any breaks at all, well under the limit."]
        );
    }

    #[test]
    fn short_text_without_usable_fragments_falls_back_to_whole_input() {
        assert_eq!(segment("  tiny  "), vec!["tiny"]);
        assert_eq!(segment("A\n\nB"), vec!["A\n\nB"]);
    }

    #[test]
    fn whitespace_only_input_yields_single_empty_chunk() {
        assert_eq!(segment("   \n\t "), vec![""]);
        assert_eq!(segment(""), vec![""]);
    }

    #[test]
    fn handles_crlf_blank_lines() {
        let text = "First paragraph, Windows style.\r\n\r\nsecond paragraph, lowercase start.";
        assert_eq!(
            segment(text),
            vec![
                "First paragraph, Windows style.",
                "second paragraph, lowercase start."
            ]
        );
    }

    #[test]
    fn long_text_without_paragraphs_groups_sentences() {
        let text = run_on_text(12);
        assert!(text.chars().count() > 500);

        let chunks = segment(&text);
        assert!(chunks.len() > 1);

        let (last, full) = chunks.split_last().unwrap();
        for chunk in full {
            assert!(chunk.chars().count() >= 300, "short chunk: {chunk:?}");
        }
        assert!(!last.is_empty());
        assert_eq!(chunks.join(" "), text);
    }

    #[test]
    fn fallback_keeps_trailing_partial_group() {
        let config = SegmenterConfigBuilder::default()
            .sentence_fallback_chars(50)
            .target_chunk_chars(40)
            .build()
            .unwrap();
        let segmenter = Segmenter::new(config);

        let text = "This first sentence is long enough alone. Second one here! Third?  ";
        assert_eq!(
            segmenter.segment(text),
            vec![
                "This first sentence is long enough alone.",
                "Second one here! Third?"
            ]
        );
    }

    #[test]
    fn long_text_without_sentence_punctuation_is_one_chunk() {
        let text = "word ".repeat(150);
        assert_eq!(segment(&text), vec![text.trim()]);
    }

    /// Fourteen 23-char sentences followed by one unpunctuated run, `len` chars in all.
    fn unstructured_text(len: usize) -> String {
        let prefix = "One sentence ends here. ".repeat(14);
        let tail = "x".repeat(len - prefix.chars().count());
        format!("{prefix}{tail}")
    }

    #[test]
    fn text_at_fallback_threshold_stays_whole() {
        let text = unstructured_text(500);
        assert_eq!(text.chars().count(), 500);
        assert_eq!(segment(&text), vec![text.clone()]);
    }

    #[test]
    fn text_one_char_past_fallback_threshold_is_grouped() {
        let text = unstructured_text(501);
        let chunks = segment(&text);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0], text[..335]);
        assert_eq!(chunks[1], "x".repeat(165));
    }

    #[test]
    fn group_closes_when_target_is_reached_exactly() {
        // Ten 30-char sentences sum to exactly 300.
        let sentence = format!("{}.", "a".repeat(29));
        let text = vec![sentence.as_str(); 20].join(" ");
        assert!(text.chars().count() > 500);

        let chunks = segment(&text);
        let group = vec![sentence.as_str(); 10].join(" ");
        assert_eq!(chunks, vec![group.clone(), group]);
    }

    #[test]
    fn one_paragraph_plus_noise_in_long_text_still_falls_back() {
        let text = format!("Page 3\n\n{}", run_on_text(12));
        let chunks = segment(&text);
        assert!(chunks.len() > 1);
        assert!(chunks[0].starts_with("Page 3"));
    }

    #[test]
    fn preserves_reading_order() {
        let text = "Alpha paragraph comes first.\n\nBeta paragraph is second.\nGamma paragraph is last.";
        let chunks = segment(text);
        let positions: Vec<usize> = chunks.iter().map(|c| text.find(c.as_str()).unwrap()).collect();
        let mut sorted = positions.clone();
        sorted.sort_unstable();
        assert_eq!(positions, sorted);
        assert_eq!(chunks.len(), 3);
    }

    #[test]
    fn is_deterministic() {
        let text = format!("Intro line that is long.\n\n{}", run_on_text(20));
        assert_eq!(segment(&text), segment(&text));
    }

    #[test]
    fn counts_characters_not_bytes() {
        // Ten characters, twenty bytes.
        let text = "éééééééééé\n\nThis is a test paragraph that is long enough.";
        assert_eq!(
            segment(text),
            vec!["This is a test paragraph that is long enough."]
        );
    }

    #[test]
    fn non_latin_uppercase_does_not_open_a_paragraph() {
        let text = "Первая строка текста здесь.\nВторая строка текста здесь.";
        assert_eq!(segment(text).len(), 1);
    }

    #[test]
    fn paragraph_break_spans_whole_blank_run() {
        let text = "one\n \n\t\n two";
        assert_eq!(paragraph_break_at(text, 3), Some(3..8));
        assert_eq!(paragraph_break_at(text, 0), None);
    }

    #[test]
    fn paragraph_break_before_uppercase_is_only_the_newline() {
        let text = "one\n   Two";
        assert_eq!(paragraph_break_at(text, 3), Some(3..4));
        assert_eq!(paragraph_break_at("one\n   two", 3), None);
        assert_eq!(paragraph_break_at("one\n", 3), None);
    }

    #[test]
    fn sentence_break_requires_terminal_punctuation() {
        assert_eq!(sentence_break_at("Done.  Next", 5), Some(5..7));
        assert_eq!(sentence_break_at("Done!\nNext", 5), Some(5..6));
        assert_eq!(sentence_break_at("Done,  next", 5), None);
        assert_eq!(sentence_break_at("e.g.x", 2), None);
        assert_eq!(sentence_break_at(" leading", 0), None);
    }

    #[test]
    fn split_on_without_breaks_returns_whole_text() {
        assert_eq!(split_on("no breaks", |_, _| None), vec!["no breaks"]);
        assert_eq!(split_on("", paragraph_break_at), vec![""]);
    }

    #[test]
    fn default_config_matches_constants() {
        let config = SegmenterConfig::default();
        assert_eq!(config.min_paragraph_chars, 10);
        assert_eq!(config.sentence_fallback_chars, 500);
        assert_eq!(config.target_chunk_chars, 300);
    }
}
