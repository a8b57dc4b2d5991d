/// Errors raised while loading models, preparing voices, or producing audio.
#[derive(thiserror::Error, Debug)]
pub enum TtsError {
    #[error("Model not loaded. Call load_model() first.")]
    ModelNotLoaded,
    #[error("Failed to load model: {0}")]
    ModelLoad(String),
    #[error("Voice '{0}' not found")]
    VoiceNotFound(String),
    #[error("Speech generation failed: {0}")]
    Generation(String),
    #[error("WAV encoding failed: {0}")]
    Encoding(#[from] hound::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[cfg(feature = "kokoro")]
    #[error(transparent)]
    Kokoro(#[from] crate::engines::kokoro::KokoroError),
}
