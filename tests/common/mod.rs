//! Shared helpers for integration tests: an in-memory engine and request builders.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, Response},
    Router,
};
use serde_json::Value;
use tower::util::ServiceExt;

use pocket_reader::{
    config::DEFAULT_MAX_BODY_BYTES,
    server::{create_router, AppState},
    service::TtsService,
    Segmenter, SynthesisEngine, SynthesisResult, TtsError,
};

pub const FAKE_SAMPLE_RATE: u32 = 24000;

/// Counts how often the service reaches into the engine.
#[derive(Debug, Default)]
pub struct EngineStats {
    pub loads: AtomicUsize,
    pub voice_states: AtomicUsize,
    pub generations: AtomicUsize,
    pub fail_load: AtomicBool,
    pub fail_generation: AtomicBool,
}

impl EngineStats {
    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn voice_states(&self) -> usize {
        self.voice_states.load(Ordering::SeqCst)
    }

    pub fn generations(&self) -> usize {
        self.generations.load(Ordering::SeqCst)
    }
}

/// Engine that produces a short sine tone instead of speech.
pub struct FakeEngine {
    loaded: bool,
    stats: Arc<EngineStats>,
}

impl FakeEngine {
    pub fn new() -> (Self, Arc<EngineStats>) {
        let stats = Arc::new(EngineStats::default());
        let engine = Self {
            loaded: false,
            stats: Arc::clone(&stats),
        };
        (engine, stats)
    }
}

impl SynthesisEngine for FakeEngine {
    type VoiceState = String;

    fn load_model(&mut self) -> Result<(), TtsError> {
        self.stats.loads.fetch_add(1, Ordering::SeqCst);
        if self.stats.fail_load.load(Ordering::SeqCst) {
            return Err(TtsError::ModelLoad("weights missing".to_string()));
        }
        self.loaded = true;
        Ok(())
    }

    fn is_loaded(&self) -> bool {
        self.loaded
    }

    fn unload_model(&mut self) {
        self.loaded = false;
    }

    fn voice_state(&mut self, voice: &str) -> Result<String, TtsError> {
        if !self.loaded {
            return Err(TtsError::ModelNotLoaded);
        }
        self.stats.voice_states.fetch_add(1, Ordering::SeqCst);
        Ok(format!("state:{voice}"))
    }

    fn generate_audio(&mut self, state: &String, text: &str) -> Result<SynthesisResult, TtsError> {
        if !state.starts_with("state:") {
            return Err(TtsError::Generation("bad voice state".to_string()));
        }
        self.stats.generations.fetch_add(1, Ordering::SeqCst);
        if self.stats.fail_generation.load(Ordering::SeqCst) {
            return Err(TtsError::Generation("engine exploded".to_string()));
        }

        // 10ms of tone per character.
        let len = text.chars().count() * (FAKE_SAMPLE_RATE as usize / 100);
        let samples = (0..len)
            .map(|i| (i as f32 * 440.0 * std::f32::consts::TAU / FAKE_SAMPLE_RATE as f32).sin() * 0.5)
            .collect();
        Ok(SynthesisResult {
            samples,
            sample_rate: FAKE_SAMPLE_RATE,
        })
    }
}

/// Router over a fresh fake engine, plus its counters.
pub fn test_app() -> (Router, Arc<EngineStats>) {
    let (engine, stats) = FakeEngine::new();
    let tts = Arc::new(TtsService::new(engine));
    let state = AppState::new(tts, Segmenter::default());
    (create_router(state, "*", DEFAULT_MAX_BODY_BYTES), stats)
}

pub fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
