//! Text preparation for chunked synthesis.

pub mod segmenter;

pub use segmenter::{
    opens_paragraph, paragraph_break_at, segment, sentence_break_at, Segmenter, SegmenterConfig,
    SegmenterConfigBuilder,
};
