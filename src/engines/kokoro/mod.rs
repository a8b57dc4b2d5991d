//! Kokoro-82M text-to-speech engine.
//!
//! Runs the Kokoro ONNX model through `ort` and phonemizes text with
//! espeak-ng, which must be on `PATH`:
//! - **Linux**: `sudo apt-get install espeak-ng`
//! - **macOS**: `brew install espeak-ng`
//!
//! # Model Directory Layout
//!
//! ```text
//! models/kokoro/
//! ├── kokoro-quant-convinteger.onnx   # preferred; otherwise the first *.onnx by name
//! ├── voices-v1.0.bin                  # voice style archive (.npz format)
//! └── config.json                      # model config holding the phoneme vocabulary
//! ```
//!
//! # Voices
//!
//! The reader's catalog names are aliases for Kokoro voices, see
//! [`DEFAULT_VOICE_ALIASES`]. Kokoro voice names follow the pattern
//! `{language}{gender}_{name}` (`bf_emma` is a British English female voice)
//! and the language prefix selects the espeak-ng voice.

mod engine;
mod model;
mod phonemizer;
mod voices;

pub use engine::{KokoroEngine, KokoroModelParams, DEFAULT_VOICE_ALIASES};
pub use model::{KokoroError, MAX_PHONEME_LEN, SAMPLE_RATE, STYLE_DIM};
pub use voices::KokoroVoice;
