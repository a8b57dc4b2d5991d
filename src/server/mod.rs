//! HTTP interface used by the browser extension.
//!
//! | Method | Path          | Purpose                                 |
//! |--------|---------------|-----------------------------------------|
//! | GET    | `/health`     | Liveness check                          |
//! | GET    | `/voices`     | Voice catalog and default voice         |
//! | POST   | `/paragraphs` | Split text into chunks for playback     |
//! | POST   | `/synthesize` | Convert text to a WAV attachment        |
//! | POST   | `/preload`    | Warm the model and selected voices      |

use std::sync::Arc;

use crate::service::TtsService;
use crate::text::Segmenter;
use crate::SynthesisEngine;

pub mod error;
pub mod handlers;
pub mod routes;

pub use error::ApiError;
pub use routes::{cors_layer, create_router};

/// Shared state handed to every handler.
pub struct AppState<E: SynthesisEngine> {
    pub tts: Arc<TtsService<E>>,
    pub segmenter: Segmenter,
}

impl<E: SynthesisEngine> AppState<E> {
    pub fn new(tts: Arc<TtsService<E>>, segmenter: Segmenter) -> Arc<Self> {
        Arc::new(Self { tts, segmenter })
    }
}
