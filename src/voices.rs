//! The fixed voice catalog offered to clients.

/// Voices the extension can choose from, in display order.
pub const AVAILABLE_VOICES: [&str; 8] = [
    "alba", "marius", "javert", "jean", "fantine", "cosette", "eponine", "azelma",
];

/// Voice used when a request names no voice, or one outside the catalog.
pub const DEFAULT_VOICE: &str = "alba";

pub fn is_available(voice: &str) -> bool {
    AVAILABLE_VOICES.contains(&voice)
}

/// Resolve a requested voice to a catalog entry.
///
/// Unknown or missing voices silently fall back to [`DEFAULT_VOICE`].
pub fn resolve_voice(requested: Option<&str>) -> &'static str {
    requested
        .and_then(|voice| AVAILABLE_VOICES.iter().find(|&&known| known == voice))
        .copied()
        .unwrap_or(DEFAULT_VOICE)
}
