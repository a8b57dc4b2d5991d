use std::collections::HashMap;
use std::path::{Path, PathBuf};

use ndarray::Array2;
use ort::inputs;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::TensorRef;

use super::phonemizer::phonemize;
use super::voices::{self, KokoroVoice};

/// Maximum number of phoneme tokens per inference call (before padding).
pub const MAX_PHONEME_LEN: usize = 510;

/// Style vector dimension for Kokoro.
pub const STYLE_DIM: usize = 256;

/// Output sample rate from the Kokoro model.
pub const SAMPLE_RATE: u32 = 24000;

const PREFERRED_MODEL_FILE: &str = "kokoro-quant-convinteger.onnx";
const VOICES_FILE: &str = "voices-v1.0.bin";
const CONFIG_FILE: &str = "config.json";

/// Vocabulary entries that mark a clause end, preferred as split points.
const SPLIT_PUNCTUATION: [char; 6] = [';', ':', ',', '.', '!', '?'];

#[derive(thiserror::Error, Debug)]
pub enum KokoroError {
    #[error("ONNX runtime error: {0}")]
    Ort(#[from] ort::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
    #[error("Missing model file: {}", .0.display())]
    MissingFile(PathBuf),
    #[error(
        "espeak-ng not found. Install: Linux: `sudo apt-get install espeak-ng`, \
         macOS: `brew install espeak-ng`"
    )]
    EspeakNotFound,
    #[error("Phonemization failed: {0}")]
    PhonemizerFailed(String),
    #[error("Voice '{0}' not found in the Kokoro voice archive")]
    VoiceNotFound(String),
    #[error("Model not loaded. Call load_model() first.")]
    ModelNotLoaded,
    #[error("Invalid config.json: {0}")]
    Config(String),
    #[error("Failed to parse voice file: {0}")]
    VoiceParse(String),
}

/// A loaded Kokoro ONNX session plus the files it needs at inference time.
pub struct KokoroModel {
    session: Session,
    vocab: HashMap<char, i64>,
    voices_path: PathBuf,
    /// "input_ids" or "tokens", depending on the export
    tokens_input: String,
    /// Older exports take the speed as int32
    int_speed: bool,
}

impl KokoroModel {
    /// Load the model from a directory containing an `.onnx` file,
    /// `voices-v1.0.bin` and `config.json`.
    pub fn load(model_dir: &Path, num_threads: Option<usize>) -> Result<Self, KokoroError> {
        let onnx_path = find_model_file(model_dir)?;
        let voices_path = require_file(model_dir.join(VOICES_FILE))?;
        let vocab = load_vocab(&require_file(model_dir.join(CONFIG_FILE))?)?;

        log::info!("Loading Kokoro model from {}", onnx_path.display());
        let mut builder =
            Session::builder()?.with_optimization_level(GraphOptimizationLevel::Level3)?;
        if let Some(threads) = num_threads {
            builder = builder.with_intra_threads(threads)?;
        }
        let session = builder.commit_from_file(&onnx_path)?;

        let tokens_input = session
            .inputs()
            .into_iter()
            .map(|input| input.name())
            .find(|name| *name == "input_ids" || *name == "tokens")
            .unwrap_or("input_ids")
            .to_string();
        let int_speed = session
            .inputs()
            .into_iter()
            .find(|input| input.name() == "speed")
            .map(|input| format!("{:?}", input.dtype()).to_lowercase().contains("int32"))
            .unwrap_or(true);
        log::debug!("Kokoro inputs: tokens='{tokens_input}', int32 speed={int_speed}");

        Ok(Self {
            session,
            vocab,
            voices_path,
            tokens_input,
            int_speed,
        })
    }

    /// Read one voice's style table from the voice archive.
    pub fn load_voice(&self, name: &str) -> Result<KokoroVoice, KokoroError> {
        voices::load_voice(&self.voices_path, name)
    }

    /// Synthesize `text` with `voice` at the given speed multiplier.
    pub fn synthesize(
        &mut self,
        voice: &KokoroVoice,
        text: &str,
        speed: f32,
    ) -> Result<Vec<f32>, KokoroError> {
        let ids = phonemize(text, voice.lang(), &self.vocab)?;
        if ids.is_empty() {
            log::warn!("No phoneme tokens produced for text: {text:?}");
            return Ok(Vec::new());
        }

        // One style for the whole text keeps prosody stable across pieces.
        let style = *voice.style(ids.len());
        let split_ids: Vec<i64> = SPLIT_PUNCTUATION
            .iter()
            .filter_map(|c| self.vocab.get(c).copied())
            .collect();

        let mut samples = Vec::with_capacity(ids.len() * 300);
        for piece in split_tokens(&ids, &split_ids) {
            samples.extend(self.infer(piece, &style, speed)?);
        }
        Ok(samples)
    }

    fn infer(
        &mut self,
        tokens: &[i64],
        style: &[f32; STYLE_DIM],
        speed: f32,
    ) -> Result<Vec<f32>, KokoroError> {
        // Kokoro expects a pad token (0) on both ends.
        let mut padded = Vec::with_capacity(tokens.len() + 2);
        padded.push(0);
        padded.extend_from_slice(tokens);
        padded.push(0);
        let tokens_arr = Array2::from_shape_vec((1, padded.len()), padded)?;
        let style_view = ndarray::ArrayView2::from_shape((1, STYLE_DIM), style.as_slice())?;

        let outputs = if self.int_speed {
            let speed_arr = ndarray::arr1(&[speed.round() as i32]);
            self.session.run(inputs![
                self.tokens_input.as_str() => TensorRef::from_array_view(tokens_arr.view())?,
                "style" => TensorRef::from_array_view(style_view)?,
                "speed" => TensorRef::from_array_view(speed_arr.view())?,
            ])?
        } else {
            let speed_arr = ndarray::arr1(&[speed]);
            self.session.run(inputs![
                self.tokens_input.as_str() => TensorRef::from_array_view(tokens_arr.view())?,
                "style" => TensorRef::from_array_view(style_view)?,
                "speed" => TensorRef::from_array_view(speed_arr.view())?,
            ])?
        };

        let (_, waveform) = outputs
            .iter()
            .next()
            .ok_or_else(|| KokoroError::Ort(ort::Error::new("No output from model")))?;
        let waveform = waveform.try_extract_array::<f32>()?;
        Ok(waveform.iter().copied().collect())
    }
}

fn require_file(path: PathBuf) -> Result<PathBuf, KokoroError> {
    if path.is_file() {
        Ok(path)
    } else {
        Err(KokoroError::MissingFile(path))
    }
}

/// Prefer the quantized CPU model, otherwise take the first `.onnx` file by name.
fn find_model_file(model_dir: &Path) -> Result<PathBuf, KokoroError> {
    let preferred = model_dir.join(PREFERRED_MODEL_FILE);
    if preferred.is_file() {
        return Ok(preferred);
    }

    let mut candidates = Vec::new();
    for entry in std::fs::read_dir(model_dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) == Some("onnx") {
            candidates.push(path);
        }
    }
    candidates.sort();
    candidates
        .into_iter()
        .next()
        .ok_or_else(|| KokoroError::MissingFile(model_dir.join("*.onnx")))
}

/// Read the `"vocab"` object (single character -> token id) from config.json.
fn load_vocab(config_path: &Path) -> Result<HashMap<char, i64>, KokoroError> {
    let content = std::fs::read_to_string(config_path)?;
    parse_vocab(&content)
}

fn parse_vocab(json: &str) -> Result<HashMap<char, i64>, KokoroError> {
    let config: serde_json::Value =
        serde_json::from_str(json).map_err(|e| KokoroError::Config(e.to_string()))?;
    let vocab = config
        .get("vocab")
        .and_then(|v| v.as_object())
        .ok_or_else(|| KokoroError::Config("missing 'vocab' object".to_string()))?;

    vocab
        .iter()
        .map(|(key, value)| {
            let mut chars = key.chars();
            match (chars.next(), chars.next(), value.as_i64()) {
                (Some(ch), None, Some(id)) => Ok((ch, id)),
                _ => Err(KokoroError::Config(format!(
                    "invalid vocab entry {key:?}: {value}"
                ))),
            }
        })
        .collect()
}

/// Split token ids into pieces of at most `MAX_PHONEME_LEN`, cutting after the
/// last punctuation token of each window when there is one.
fn split_tokens<'a>(ids: &'a [i64], punctuation: &[i64]) -> Vec<&'a [i64]> {
    let mut pieces = Vec::new();
    let mut rest = ids;

    while rest.len() > MAX_PHONEME_LEN {
        let window = &rest[..MAX_PHONEME_LEN];
        let cut = window
            .iter()
            .rposition(|id| punctuation.contains(id))
            .map(|i| i + 1)
            .unwrap_or(MAX_PHONEME_LEN);
        let (piece, tail) = rest.split_at(cut);
        pieces.push(piece);
        rest = tail;
    }

    if !rest.is_empty() {
        pieces.push(rest);
    }
    pieces
}
