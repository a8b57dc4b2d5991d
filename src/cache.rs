//! Process-lifetime cache of voice states.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

/// Voice states keyed by voice identifier.
///
/// Entries are created on first use and never evicted. Creation runs under
/// the cache lock, so concurrent requests for the same voice build its state
/// only once. Failed creations are not cached and are retried on the next call.
pub struct VoiceStateCache<V> {
    states: Mutex<HashMap<String, Arc<V>>>,
}

impl<V> Default for VoiceStateCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> VoiceStateCache<V> {
    pub fn new() -> Self {
        Self {
            states: Mutex::new(HashMap::new()),
        }
    }

    /// Return the cached state for `voice`, creating it with `create` if absent.
    pub fn get_or_create<F, E>(&self, voice: &str, create: F) -> Result<Arc<V>, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        let mut states = self.states.lock();
        if let Some(state) = states.get(voice) {
            return Ok(Arc::clone(state));
        }

        let state = Arc::new(create()?);
        states.insert(voice.to_string(), Arc::clone(&state));
        Ok(state)
    }

    pub fn get(&self, voice: &str) -> Option<Arc<V>> {
        self.states.lock().get(voice).cloned()
    }

    pub fn contains(&self, voice: &str) -> bool {
        self.states.lock().contains_key(voice)
    }

    pub fn len(&self) -> usize {
        self.states.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.lock().is_empty()
    }

    /// Cached voice identifiers in sorted order.
    pub fn voices(&self) -> Vec<String> {
        let mut voices: Vec<String> = self.states.lock().keys().cloned().collect();
        voices.sort_unstable();
        voices
    }
}
