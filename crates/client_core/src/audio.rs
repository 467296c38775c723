use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::warn;

use crate::error::PlaybackError;

/// Output device behind an [`AudioSession`].
pub trait PlaybackBackend: Send {
    fn load(&mut self, src: &str) -> Result<(), PlaybackError>;
    fn start(&mut self) -> Result<(), PlaybackError>;
    fn pause(&mut self);
    fn rewind(&mut self);
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Idle,
    Loading(String),
    Playing(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackEvent {
    Loading(String),
    Play(String),
    /// Stopped by a toggle, by another source taking over, or by an explicit pause.
    Pause(String),
    Ended(String),
    Failed { src: String, reason: String },
}

/// The single audio output of an interactive client. At most one source plays at a time.
pub struct AudioSession {
    backend: Box<dyn PlaybackBackend>,
    state: PlaybackState,
    events: broadcast::Sender<PlaybackEvent>,
}

impl AudioSession {
    pub fn new(backend: Box<dyn PlaybackBackend>) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            backend,
            state: PlaybackState::Idle,
            events,
        }
    }

    /// A session only exists where there is an output device.
    pub fn detect(backend: Option<Box<dyn PlaybackBackend>>) -> Option<Self> {
        backend.map(Self::new)
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn current_source(&self) -> Option<&str> {
        match &self.state {
            PlaybackState::Idle => None,
            PlaybackState::Loading(src) | PlaybackState::Playing(src) => Some(src),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.events.subscribe()
    }

    /// Plays `src`, or stops it when it is already the playing source.
    pub fn play(&mut self, src: &str) -> Result<&PlaybackState, PlaybackError> {
        if matches!(&self.state, PlaybackState::Playing(current) if current.as_str() == src) {
            self.halt();
            return Ok(&self.state);
        }
        self.halt();

        self.state = PlaybackState::Loading(src.to_string());
        self.emit(PlaybackEvent::Loading(src.to_string()));

        let started = self.backend.load(src).and_then(|_| self.backend.start());
        match started {
            Ok(()) => {
                self.state = PlaybackState::Playing(src.to_string());
                self.emit(PlaybackEvent::Play(src.to_string()));
                Ok(&self.state)
            }
            Err(err) => {
                warn!(src, error = %err, "audio playback failed to start");
                self.backend.rewind();
                self.state = PlaybackState::Idle;
                self.emit(PlaybackEvent::Failed {
                    src: src.to_string(),
                    reason: err.to_string(),
                });
                Err(err)
            }
        }
    }

    /// Stops and rewinds whatever is playing.
    pub fn stop(&mut self) {
        self.halt();
    }

    pub fn pause(&mut self) {
        if let Some(src) = self.take_playing() {
            self.backend.pause();
            self.emit(PlaybackEvent::Pause(src));
        }
    }

    /// Called by the backend owner when the current source finishes on its own.
    pub fn on_ended(&mut self) {
        if let Some(src) = self.take_playing() {
            self.backend.rewind();
            self.emit(PlaybackEvent::Ended(src));
        }
    }

    fn take_playing(&mut self) -> Option<String> {
        match std::mem::take(&mut self.state) {
            PlaybackState::Playing(src) => Some(src),
            other => {
                self.state = other;
                None
            }
        }
    }

    fn halt(&mut self) {
        match std::mem::take(&mut self.state) {
            PlaybackState::Idle => {}
            PlaybackState::Loading(src) | PlaybackState::Playing(src) => {
                self.backend.pause();
                self.backend.rewind();
                self.emit(PlaybackEvent::Pause(src));
            }
        }
    }

    fn emit(&self, event: PlaybackEvent) {
        let _ = self.events.send(event);
    }
}

/// One play button. Derives its own "playing" flag from session events.
pub struct SoundControl {
    src: String,
    events: Option<broadcast::Receiver<PlaybackEvent>>,
    playing: bool,
}

impl SoundControl {
    pub fn new(src: impl Into<String>, session: Option<&AudioSession>) -> Self {
        Self {
            src: src.into(),
            events: session.map(AudioSession::subscribe),
            playing: false,
        }
    }

    pub fn src(&self) -> &str {
        &self.src
    }

    pub fn is_playing(&mut self) -> bool {
        self.sync();
        self.playing
    }

    /// Toggles this control's source. Without a session this does nothing.
    pub fn toggle(&mut self, session: Option<&mut AudioSession>) -> Result<bool, PlaybackError> {
        let Some(session) = session else {
            return Ok(false);
        };
        let result = session.play(&self.src).map(|_| ());
        self.sync();
        result.map(|_| self.playing)
    }

    fn sync(&mut self) {
        let Some(events) = self.events.as_mut() else {
            return;
        };
        loop {
            let event = match events.try_recv() {
                Ok(event) => event,
                Err(TryRecvError::Lagged(_)) => continue,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            };
            match event {
                PlaybackEvent::Play(src) => self.playing = src == self.src,
                PlaybackEvent::Loading(src) if src != self.src => self.playing = false,
                PlaybackEvent::Loading(_) => {}
                PlaybackEvent::Pause(src)
                | PlaybackEvent::Ended(src)
                | PlaybackEvent::Failed { src, .. } => {
                    if src == self.src {
                        self.playing = false;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/audio_tests.rs"]
mod tests;
