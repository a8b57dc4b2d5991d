use std::collections::HashMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::{SynthesisEngine, SynthesisResult, TtsError};

use super::model::{KokoroError, KokoroModel, SAMPLE_RATE};
use super::voices::KokoroVoice;

/// Kokoro voices standing in for the reader's catalog names.
pub const DEFAULT_VOICE_ALIASES: [(&str, &str); 8] = [
    ("alba", "bf_alice"),
    ("marius", "bm_george"),
    ("javert", "bm_lewis"),
    ("jean", "am_michael"),
    ("fantine", "af_heart"),
    ("cosette", "af_bella"),
    ("eponine", "bf_emma"),
    ("azelma", "bf_isabella"),
];

const MIN_SPEED: f32 = 0.5;
const MAX_SPEED: f32 = 2.0;

/// Parameters for loading and running the Kokoro model.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct KokoroModelParams {
    /// Number of CPU threads to use for inference.
    /// `None` uses the ORT default (typically all available cores).
    pub num_threads: Option<usize>,
    /// Speech speed multiplier. Range: 0.5–2.0, default 1.0.
    pub speed: f32,
    /// Catalog voice name -> Kokoro voice name, consulted before the defaults.
    pub voice_aliases: HashMap<String, String>,
}

impl Default for KokoroModelParams {
    fn default() -> Self {
        Self {
            num_threads: None,
            speed: 1.0,
            voice_aliases: HashMap::new(),
        }
    }
}

/// Kokoro text-to-speech engine.
///
/// Uses the Kokoro-82M ONNX model and espeak-ng for phonemization. Catalog
/// voice names are mapped onto Kokoro voices through
/// [`KokoroModelParams::voice_aliases`] and then [`DEFAULT_VOICE_ALIASES`];
/// any other name is looked up in the voice archive as is.
///
/// ```rust,no_run
/// use pocket_reader::{SynthesisEngine, engines::kokoro::KokoroEngine};
///
/// let mut engine = KokoroEngine::new("models/kokoro");
/// engine.load_model()?;
/// let voice = engine.voice_state("alba")?;
/// let result = engine.generate_audio(&voice, "Hello, world!")?;
/// println!("Generated {} samples at {}Hz", result.samples.len(), result.sample_rate);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct KokoroEngine {
    model_dir: PathBuf,
    params: KokoroModelParams,
    model: Option<KokoroModel>,
}

impl KokoroEngine {
    /// Create an engine for the model files in `model_dir` with default parameters.
    pub fn new(model_dir: impl Into<PathBuf>) -> Self {
        Self::with_params(model_dir, KokoroModelParams::default())
    }

    pub fn with_params(model_dir: impl Into<PathBuf>, params: KokoroModelParams) -> Self {
        Self {
            model_dir: model_dir.into(),
            params,
            model: None,
        }
    }

    /// The Kokoro voice used for a catalog voice name.
    pub fn model_voice_name<'a>(&'a self, voice: &'a str) -> &'a str {
        if let Some(alias) = self.params.voice_aliases.get(voice) {
            return alias;
        }
        DEFAULT_VOICE_ALIASES
            .iter()
            .find(|(name, _)| *name == voice)
            .map(|(_, kokoro)| *kokoro)
            .unwrap_or(voice)
    }

    fn speed(&self) -> f32 {
        if self.params.speed.is_finite() {
            self.params.speed.clamp(MIN_SPEED, MAX_SPEED)
        } else {
            1.0
        }
    }
}

impl Drop for KokoroEngine {
    fn drop(&mut self) {
        self.unload_model();
    }
}

impl SynthesisEngine for KokoroEngine {
    type VoiceState = KokoroVoice;

    fn load_model(&mut self) -> Result<(), TtsError> {
        let model = KokoroModel::load(&self.model_dir, self.params.num_threads)?;
        self.model = Some(model);
        Ok(())
    }

    fn is_loaded(&self) -> bool {
        self.model.is_some()
    }

    fn unload_model(&mut self) {
        self.model = None;
    }

    fn voice_state(&mut self, voice: &str) -> Result<KokoroVoice, TtsError> {
        let model = self.model.as_ref().ok_or(TtsError::ModelNotLoaded)?;
        let kokoro_voice = self.model_voice_name(voice);
        log::debug!("Voice {voice} uses Kokoro voice {kokoro_voice}");

        model.load_voice(kokoro_voice).map_err(|e| match e {
            KokoroError::VoiceNotFound(_) => TtsError::VoiceNotFound(voice.to_string()),
            other => other.into(),
        })
    }

    fn generate_audio(
        &mut self,
        state: &KokoroVoice,
        text: &str,
    ) -> Result<SynthesisResult, TtsError> {
        let speed = self.speed();
        let model = self.model.as_mut().ok_or(TtsError::ModelNotLoaded)?;
        let samples = model.synthesize(state, text, speed)?;

        Ok(SynthesisResult {
            samples,
            sample_rate: SAMPLE_RATE,
        })
    }
}
