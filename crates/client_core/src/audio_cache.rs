use std::{collections::HashMap, future::Future, sync::Arc};

use tokio::sync::{Mutex, OnceCell};
use tracing::debug;

use crate::{client::TrackerBackend, error::ClientError};

/// Generated clips keyed by sound id, kept for the lifetime of the session.
///
/// Concurrent requests for the same id share one generation call. A failed
/// call caches nothing, so the next request tries again.
#[derive(Default)]
pub struct GeneratedAudioCache {
    entries: Mutex<HashMap<String, Arc<OnceCell<String>>>>,
}

impl GeneratedAudioCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_or_generate<F, Fut>(
        &self,
        sound_id: &str,
        generate: F,
    ) -> Result<String, ClientError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, ClientError>>,
    {
        let cell = {
            let mut entries = self.entries.lock().await;
            Arc::clone(entries.entry(sound_id.to_string()).or_default())
        };
        let media = cell
            .get_or_try_init(|| async {
                debug!(sound_id, "generating audio clip");
                generate().await
            })
            .await?;
        Ok(media.clone())
    }

    /// Generates through `backend` with `prompt` on a miss.
    pub async fn fetch(
        &self,
        backend: &dyn TrackerBackend,
        sound_id: &str,
        prompt: &str,
    ) -> Result<String, ClientError> {
        self.get_or_generate(sound_id, || backend.generate_audio(prompt))
            .await
    }

    pub async fn cached(&self, sound_id: &str) -> Option<String> {
        let entries = self.entries.lock().await;
        entries.get(sound_id).and_then(|cell| cell.get().cloned())
    }

    pub async fn len(&self) -> usize {
        let entries = self.entries.lock().await;
        entries.values().filter(|cell| cell.initialized()).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
#[path = "tests/audio_cache_tests.rs"]
mod tests;
