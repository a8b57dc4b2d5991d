//! # pocket-reader
//!
//! A local text-to-speech server for the Pocket Reader browser extension.
//!
//! ## Features
//!
//! - **Paragraph segmentation**: Split long pages into chunks that can be synthesized
//!   and played back one at a time
//! - **Lazy model loading**: The model and each voice are loaded on first use and cached
//!   for the life of the process
//! - **WAV output**: Audio is returned as 16-bit PCM WAV
//! - **Kokoro TTS**: ONNX engine behind the `kokoro` feature
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! pocket-reader = { version = "2026.10", features = ["kokoro"] }
//! ```
//!
//! ```ignore
//! use pocket_reader::{engines::kokoro::KokoroEngine, service::TtsService};
//!
//! let service = TtsService::new(KokoroEngine::new("models/kokoro"));
//! let wav = service.synthesize_wav("alba", "Hello, world!")?;
//! std::fs::write("output.wav", wav)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Splitting text does not need a model at all:
//!
//! ```
//! let chunks = pocket_reader::text::segment("Para one here.\nPara Two starts here with capital.");
//! assert_eq!(chunks.len(), 2);
//! ```

pub mod audio;
pub mod cache;
pub mod config;
pub mod engines;
pub mod error;
pub mod server;
pub mod service;
pub mod text;
pub mod voices;

pub use config::ServerConfig;
pub use error::TtsError;
pub use text::{segment, Segmenter, SegmenterConfig};

/// The result of a synthesis (text-to-speech) operation.
///
/// Contains raw f32 audio samples and the sample rate of the output audio.
#[derive(Debug, Clone)]
pub struct SynthesisResult {
    /// Raw mono audio samples, roughly in `[-1.0, 1.0]`
    pub samples: Vec<f32>,
    /// Sample rate of the audio (24000 for Kokoro)
    pub sample_rate: u32,
}

impl SynthesisResult {
    /// Encode the audio as a 16-bit PCM WAV byte stream.
    pub fn to_wav_bytes(&self) -> Result<Vec<u8>, TtsError> {
        audio::encode_wav_pcm16(&self.samples, self.sample_rate)
    }

    /// Duration of the audio in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Common interface for text-to-speech synthesis engines.
///
/// An engine owns its model and is driven from one thread at a time; the
/// server wraps it in a mutex and caches the voice states it hands out.
pub trait SynthesisEngine: Send + 'static {
    /// Precomputed conditioning data for one voice.
    type VoiceState: Send + Sync + 'static;

    /// Load the model. Called lazily, before the first voice state is requested.
    fn load_model(&mut self) -> Result<(), TtsError>;

    /// Whether `load_model()` has completed successfully.
    fn is_loaded(&self) -> bool;

    /// Unload the currently loaded model and free associated resources.
    fn unload_model(&mut self);

    /// Build the conditioning state for a voice.
    fn voice_state(&mut self, voice: &str) -> Result<Self::VoiceState, TtsError>;

    /// Synthesize speech for `text` in the voice described by `state`.
    fn generate_audio(
        &mut self,
        state: &Self::VoiceState,
        text: &str,
    ) -> Result<SynthesisResult, TtsError>;
}
