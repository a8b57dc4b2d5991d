//! Lazily loaded TTS model plus its per-voice state cache.

use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;

use crate::cache::VoiceStateCache;
use crate::voices;
use crate::{SynthesisEngine, SynthesisResult, TtsError};

/// Owns a [`SynthesisEngine`] and the voice states it produced.
///
/// The model is loaded on first use. Voice states are created once per voice
/// and kept for the life of the service.
///
/// All methods block while the engine works; async callers should run them
/// on a blocking thread.
pub struct TtsService<E: SynthesisEngine> {
    engine: Mutex<E>,
    voices: VoiceStateCache<E::VoiceState>,
}

impl<E: SynthesisEngine> TtsService<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine: Mutex::new(engine),
            voices: VoiceStateCache::new(),
        }
    }

    /// Load the model unless it is already loaded.
    pub fn ensure_model(&self) -> Result<(), TtsError> {
        let mut engine = self.engine.lock();
        load_if_needed(&mut *engine)
    }

    pub fn is_model_loaded(&self) -> bool {
        self.engine.lock().is_loaded()
    }

    /// Get or create the state for `voice`, loading the model first if needed.
    ///
    /// `voice` is passed to the engine as given; use [`voices::resolve_voice`]
    /// to map client input onto the catalog.
    pub fn voice_state(&self, voice: &str) -> Result<Arc<E::VoiceState>, TtsError> {
        self.voices.get_or_create(voice, || {
            let mut engine = self.engine.lock();
            load_if_needed(&mut *engine)?;

            log::info!("Loading voice: {voice}...");
            let started = Instant::now();
            let state = engine.voice_state(voice)?;
            log::info!("Voice {voice} loaded in {:.2?}", started.elapsed());
            Ok(state)
        })
    }

    /// Synthesize `text` with `voice`.
    pub fn synthesize(&self, voice: &str, text: &str) -> Result<SynthesisResult, TtsError> {
        let state = self.voice_state(voice)?;

        log::info!("Generating speech for: {}...", preview(text));
        let started = Instant::now();
        let result = self.engine.lock().generate_audio(&state, text)?;
        log::debug!(
            "Generated {:.2}s of audio in {:.2?}",
            result.duration_secs(),
            started.elapsed()
        );

        Ok(result)
    }

    /// Synthesize `text` with `voice` and encode it as a 16-bit PCM WAV file.
    pub fn synthesize_wav(&self, voice: &str, text: &str) -> Result<Vec<u8>, TtsError> {
        self.synthesize(voice, text)?.to_wav_bytes()
    }

    /// Load the model and the state of every catalog voice in `requested`.
    ///
    /// Voices outside the catalog are skipped. Returns the recognized voices in
    /// request order.
    pub fn preload(&self, requested: &[String]) -> Result<Vec<String>, TtsError> {
        self.ensure_model()?;

        let recognized: Vec<String> = requested
            .iter()
            .filter(|voice| voices::is_available(voice))
            .cloned()
            .collect();

        for voice in &recognized {
            self.voice_state(voice)?;
        }

        Ok(recognized)
    }

    /// Voices whose state is already cached, sorted.
    pub fn cached_voices(&self) -> Vec<String> {
        self.voices.voices()
    }
}

fn load_if_needed<E: SynthesisEngine>(engine: &mut E) -> Result<(), TtsError> {
    if engine.is_loaded() {
        return Ok(());
    }

    log::info!("Loading TTS model...");
    let started = Instant::now();
    engine.load_model()?;
    log::info!("Model loaded in {:.2?}", started.elapsed());
    Ok(())
}

/// First 50 characters of `text`, for log lines.
fn preview(text: &str) -> &str {
    match text.char_indices().nth(50) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}
