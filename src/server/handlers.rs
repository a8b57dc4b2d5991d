//! Request handlers.
//!
//! Request bodies are parsed leniently: a missing body, a non-JSON body and a
//! body without a string `text` field are all reported as a missing field.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::header,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use serde_json::Value;

use super::{ApiError, AppState};
use crate::voices::{self, AVAILABLE_VOICES, DEFAULT_VOICE};
use crate::{SynthesisEngine, TtsError};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct VoicesResponse {
    pub default: &'static str,
    pub voices: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct ParagraphsResponse {
    pub count: usize,
    pub paragraphs: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct PreloadResponse {
    pub loaded_voices: Vec<String>,
    pub status: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

pub async fn list_voices() -> Json<VoicesResponse> {
    Json(VoicesResponse {
        default: DEFAULT_VOICE,
        voices: AVAILABLE_VOICES.to_vec(),
    })
}

/// Split text into paragraphs for chunked synthesis.
///
/// Body: `{"text": "..."}`. Returns `{"count": n, "paragraphs": [...]}`.
pub async fn paragraphs<E: SynthesisEngine>(
    State(state): State<Arc<AppState<E>>>,
    body: Bytes,
) -> Result<Json<ParagraphsResponse>, ApiError> {
    let request = parse_body(&body);
    let text = required_text(request.as_ref())?;

    let paragraphs = state.segmenter.segment(text);
    log::debug!(
        "Split {} chars into {} paragraphs",
        text.chars().count(),
        paragraphs.len()
    );

    Ok(Json(ParagraphsResponse {
        count: paragraphs.len(),
        paragraphs,
    }))
}

/// Synthesize text to a WAV attachment.
///
/// Body: `{"text": "...", "voice": "alba"}`. Unknown or missing voices use the
/// default voice.
pub async fn synthesize<E: SynthesisEngine>(
    State(state): State<Arc<AppState<E>>>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let request = parse_body(&body);
    let text = required_text(request.as_ref())?.to_owned();
    let voice = voices::resolve_voice(
        request
            .as_ref()
            .and_then(|r| r.get("voice"))
            .and_then(Value::as_str),
    );

    let tts = Arc::clone(&state.tts);
    let wav = run_blocking(move || tts.synthesize_wav(voice, &text))
        .await
        .inspect_err(|e| log::error!("Error generating speech: {e}"))?;

    Ok((
        [
            (header::CONTENT_TYPE, "audio/wav"),
            (header::CONTENT_DISPOSITION, "attachment; filename=speech.wav"),
        ],
        wav,
    ))
}

/// Load the model and the requested voices ahead of the first synthesis.
///
/// Body (optional): `{"voices": ["alba", "jean"]}`. Defaults to the default voice.
pub async fn preload<E: SynthesisEngine>(
    State(state): State<Arc<AppState<E>>>,
    body: Bytes,
) -> Result<Json<PreloadResponse>, ApiError> {
    let request = parse_body(&body);
    let requested = requested_voices(request.as_ref());

    let tts = Arc::clone(&state.tts);
    let loaded_voices = run_blocking(move || tts.preload(&requested))
        .await
        .inspect_err(|e| log::error!("Preload failed: {e}"))?;

    Ok(Json(PreloadResponse {
        loaded_voices,
        status: "ok",
    }))
}

/// Parse a JSON object body. Anything else is treated as no body.
fn parse_body(body: &[u8]) -> Option<Value> {
    serde_json::from_slice::<Value>(body)
        .ok()
        .filter(Value::is_object)
}

fn required_text(request: Option<&Value>) -> Result<&str, ApiError> {
    let text = request
        .and_then(|r| r.get("text"))
        .and_then(Value::as_str)
        .ok_or_else(|| ApiError::BadRequest("Missing 'text' field".to_string()))?;

    if text.trim().is_empty() {
        return Err(ApiError::BadRequest("Text cannot be empty".to_string()));
    }
    Ok(text)
}

fn requested_voices(request: Option<&Value>) -> Vec<String> {
    match request.and_then(|r| r.get("voices")) {
        None | Some(Value::Null) => vec![DEFAULT_VOICE.to_string()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_owned)
            .collect(),
        Some(_) => Vec::new(),
    }
}

/// Run engine work on the blocking thread pool.
async fn run_blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, TtsError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ApiError::Internal(format!("TTS task failed: {e}")))?
        .map_err(ApiError::from)
}

#[cfg(test)]
mod tests {
    use super::{parse_body, required_text, requested_voices};
    use serde_json::json;

    #[test]
    fn non_object_bodies_are_ignored() {
        assert!(parse_body(b"").is_none());
        assert!(parse_body(b"not json").is_none());
        assert!(parse_body(b"[1, 2]").is_none());
        assert!(parse_body(br#"{"text": "hi"}"#).is_some());
    }

    #[test]
    fn text_must_be_a_non_blank_string() {
        let missing = required_text(Some(&json!({}))).unwrap_err();
        assert_eq!(missing.to_string(), "Missing 'text' field");

        let wrong_type = required_text(Some(&json!({"text": 5}))).unwrap_err();
        assert_eq!(wrong_type.to_string(), "Missing 'text' field");

        let blank = required_text(Some(&json!({"text": " \n "}))).unwrap_err();
        assert_eq!(blank.to_string(), "Text cannot be empty");

        let body = json!({"text": "Read me."});
        assert_eq!(required_text(Some(&body)).unwrap(), "Read me.");
    }

    #[test]
    fn preload_voices_default_to_default_voice() {
        assert_eq!(requested_voices(None), vec!["alba"]);
        assert_eq!(requested_voices(Some(&json!({"voices": null}))), vec!["alba"]);
        assert_eq!(
            requested_voices(Some(&json!({"voices": ["jean", 3, "nobody"]}))),
            vec!["jean", "nobody"]
        );
        assert!(requested_voices(Some(&json!({"voices": "alba"}))).is_empty());
    }
}
