use std::sync::Arc;

use chrono::{DateTime, Utc};
use shared::{
    catalog::{ENVIRONMENTAL_SOUNDS, LING_SIX_SOUNDS},
    domain::LingTestRecord,
    protocol::SoundPayload,
};
use tracing::{info, warn};

use super::{PageContext, ERROR_TITLE};
use crate::{
    audio::{AudioSession, SoundControl},
    audio_cache::GeneratedAudioCache,
    error::PageError,
    record_cache::{RecordCache, SyncStatus},
};

const AUDIO_ERROR_TITLE: &str = "Audio Error";

/// A test sound with its play control. A generated clip, once fetched,
/// replaces the recorded asset as the control's source.
pub struct SoundTile {
    sound: SoundPayload,
    control: SoundControl,
    generated: bool,
}

impl SoundTile {
    fn new(sound: SoundPayload, session: Option<&AudioSession>) -> Self {
        let control = SoundControl::new(sound.src.clone(), session);
        Self {
            sound,
            control,
            generated: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.sound.id
    }

    pub fn label(&self) -> &str {
        &self.sound.label
    }

    pub fn source(&self) -> &str {
        self.control.src()
    }

    pub fn has_generated_clip(&self) -> bool {
        self.generated
    }

    pub fn is_playing(&mut self) -> bool {
        self.control.is_playing()
    }
}

pub struct LingTestPage {
    ctx: PageContext,
    observations: RecordCache<String>,
    test_date: Option<DateTime<Utc>>,
    tiles: Vec<SoundTile>,
    clips: Arc<GeneratedAudioCache>,
}

impl LingTestPage {
    pub fn new(
        ctx: PageContext,
        session: Option<&AudioSession>,
        clips: Arc<GeneratedAudioCache>,
    ) -> Self {
        let tiles = LING_SIX_SOUNDS
            .iter()
            .map(SoundPayload::from)
            .chain(ENVIRONMENTAL_SOUNDS.iter().map(SoundPayload::from))
            .map(|sound| SoundTile::new(sound, session))
            .collect();
        Self {
            ctx,
            observations: RecordCache::new(String::new()),
            test_date: None,
            tiles,
            clips,
        }
    }

    pub fn tiles(&self) -> &[SoundTile] {
        &self.tiles
    }

    pub fn observations(&self) -> &str {
        self.observations.value()
    }

    pub fn status(&self) -> &SyncStatus {
        self.observations.status()
    }

    pub fn test_date(&self) -> Option<DateTime<Utc>> {
        self.test_date
    }

    pub fn edit_observations(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.observations.edit(|value| *value = text);
    }

    pub fn is_playing(&mut self, sound_id: &str) -> bool {
        match self.tile_index(sound_id) {
            Some(index) => self.tiles[index].is_playing(),
            None => false,
        }
    }

    fn tile_index(&self, sound_id: &str) -> Option<usize> {
        self.tiles.iter().position(|tile| tile.sound.id == sound_id)
    }

    fn unknown_sound(&self, sound_id: &str) -> PageError {
        self.ctx.notifier.error(
            AUDIO_ERROR_TITLE,
            format!("Unknown sound: {sound_id}."),
        );
        PageError::Invalid(format!("unknown sound {sound_id}"))
    }

    /// Toggles the sound's playback. Returns whether it is now playing.
    pub fn play(
        &mut self,
        sound_id: &str,
        session: Option<&mut AudioSession>,
    ) -> Result<bool, PageError> {
        let Some(index) = self.tile_index(sound_id) else {
            return Err(self.unknown_sound(sound_id));
        };
        let tile = &mut self.tiles[index];
        match tile.control.toggle(session) {
            Ok(playing) => Ok(playing),
            Err(err) => {
                warn!(sound_id, "ling test: playback failed: {err}");
                self.ctx.notifier.error(
                    AUDIO_ERROR_TITLE,
                    format!(
                        "Failed to play {sound_id}. Make sure the audio file is at {}.",
                        tile.control.src()
                    ),
                );
                Err(err.into())
            }
        }
    }

    /// Fetches a generated clip for the sound, reusing one generated earlier
    /// in this session.
    pub async fn generate_clip(
        &mut self,
        sound_id: &str,
        session: Option<&AudioSession>,
    ) -> Result<(), PageError> {
        let Some(index) = self.tile_index(sound_id) else {
            return Err(self.unknown_sound(sound_id));
        };
        let prompt = self.tiles[index].sound.prompt.clone();
        let backend = Arc::clone(&self.ctx.backend);
        match self.clips.fetch(backend.as_ref(), sound_id, &prompt).await {
            Ok(media) => {
                let tile = &mut self.tiles[index];
                tile.control = SoundControl::new(media, session);
                tile.generated = true;
                info!(sound_id, "ling test: generated clip ready");
                Ok(())
            }
            Err(err) => {
                warn!(sound_id, "ling test: clip generation failed: {err}");
                self.ctx.notifier.error(
                    AUDIO_ERROR_TITLE,
                    format!("Could not generate audio for {sound_id}."),
                );
                Err(err.into())
            }
        }
    }

    pub async fn load(&mut self) {
        match self.ctx.backend.get_ling_test().await {
            Ok(Some(record)) => {
                if self.observations.apply_fetched(record.observations) {
                    self.test_date = record.test_date;
                }
            }
            Ok(None) => {}
            Err(err) => {
                warn!("ling test: load failed: {err}");
                self.observations.fetch_failed(err.to_string());
                self.ctx
                    .notifier
                    .error(ERROR_TITLE, "Failed to load previous test data.");
            }
        }
    }

    pub async fn save(&mut self) -> Result<LingTestRecord, PageError> {
        let ticket = self.observations.begin_save();
        match self.ctx.backend.save_ling_test(&ticket.value).await {
            Ok(stored) => {
                self.test_date = stored.test_date;
                self.observations
                    .finish_save(ticket, Some(stored.observations.clone()));
                self.ctx.notifier.success(
                    "Observations Saved",
                    "Your notes for this test have been saved.",
                );
                Ok(stored)
            }
            Err(err) => {
                warn!("ling test: save failed: {err}");
                self.observations.save_failed(err.to_string());
                self.ctx
                    .notifier
                    .error(ERROR_TITLE, "Failed to save observations.");
                Err(err.into())
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/ling_test_tests.rs"]
mod tests;
