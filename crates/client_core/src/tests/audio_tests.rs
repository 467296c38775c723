use super::*;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    Load(String),
    Start,
    Pause,
    Rewind,
}

/// Records calls and tracks how many sources are audible at once.
#[derive(Clone, Default)]
struct FakeBackend {
    calls: Arc<Mutex<Vec<Call>>>,
    audible: Arc<Mutex<Option<String>>>,
    loaded: Arc<Mutex<Option<String>>>,
    missing: Vec<String>,
}

impl PlaybackBackend for FakeBackend {
    fn load(&mut self, src: &str) -> Result<(), PlaybackError> {
        self.calls.lock().expect("lock").push(Call::Load(src.to_string()));
        *self.loaded.lock().expect("lock") = Some(src.to_string());
        Ok(())
    }

    fn start(&mut self) -> Result<(), PlaybackError> {
        self.calls.lock().expect("lock").push(Call::Start);
        let loaded = self.loaded.lock().expect("lock").clone().unwrap_or_default();
        if self.missing.contains(&loaded) {
            return Err(PlaybackError::StartFailed {
                src: loaded,
                reason: "not found".into(),
            });
        }
        let mut audible = self.audible.lock().expect("lock");
        assert!(audible.is_none(), "two sources audible at once");
        *audible = Some(loaded);
        Ok(())
    }

    fn pause(&mut self) {
        self.calls.lock().expect("lock").push(Call::Pause);
        *self.audible.lock().expect("lock") = None;
    }

    fn rewind(&mut self) {
        self.calls.lock().expect("lock").push(Call::Rewind);
    }
}

fn session_with(backend: &FakeBackend) -> AudioSession {
    AudioSession::new(Box::new(backend.clone()))
}

#[test]
fn starting_b_stops_a() {
    let backend = FakeBackend::default();
    let mut session = session_with(&backend);

    session.play("/audio/ling6/a.mp3").expect("play a");
    session.play("/audio/ling6/s.mp3").expect("play b");

    assert_eq!(
        session.state(),
        &PlaybackState::Playing("/audio/ling6/s.mp3".into())
    );
    assert_eq!(
        backend.audible.lock().expect("lock").as_deref(),
        Some("/audio/ling6/s.mp3")
    );
}

#[test]
fn playing_the_active_source_toggles_it_off_and_rewinds() {
    let backend = FakeBackend::default();
    let mut session = session_with(&backend);

    session.play("a").expect("play");
    backend.calls.lock().expect("lock").clear();
    let state = session.play("a").expect("toggle").clone();

    assert_eq!(state, PlaybackState::Idle);
    assert_eq!(
        *backend.calls.lock().expect("lock"),
        vec![Call::Pause, Call::Rewind]
    );
    assert!(backend.audible.lock().expect("lock").is_none());
}

#[test]
fn start_failure_returns_to_idle() {
    let backend = FakeBackend {
        missing: vec!["gone.mp3".into()],
        ..Default::default()
    };
    let mut session = session_with(&backend);
    let mut events = session.subscribe();

    let err = session.play("gone.mp3").expect_err("must fail");
    assert!(matches!(err, PlaybackError::StartFailed { .. }));
    assert_eq!(session.state(), &PlaybackState::Idle);

    assert_eq!(
        events.try_recv().expect("loading"),
        PlaybackEvent::Loading("gone.mp3".into())
    );
    assert!(matches!(
        events.try_recv().expect("failed"),
        PlaybackEvent::Failed { .. }
    ));
}

#[test]
fn controls_derive_activity_without_touching_each_other() {
    let backend = FakeBackend::default();
    let mut session = session_with(&backend);
    let mut a = SoundControl::new("a", Some(&session));
    let mut b = SoundControl::new("b", Some(&session));

    assert!(a.toggle(Some(&mut session)).expect("a"));
    assert!(a.is_playing());
    assert!(!b.is_playing());

    assert!(b.toggle(Some(&mut session)).expect("b"));
    assert!(!a.is_playing());
    assert!(b.is_playing());

    session.on_ended();
    assert!(!b.is_playing());
    assert_eq!(session.current_source(), None);
}

#[test]
fn failed_start_leaves_control_not_playing() {
    let backend = FakeBackend {
        missing: vec!["bell.mp3".into()],
        ..Default::default()
    };
    let mut session = session_with(&backend);
    let mut bell = SoundControl::new("bell.mp3", Some(&session));

    assert!(bell.toggle(Some(&mut session)).is_err());
    assert!(!bell.is_playing());
}

#[test]
fn controls_without_a_session_are_inert() {
    assert!(AudioSession::detect(None).is_none());
    let mut control = SoundControl::new("a", None);
    assert!(!control.toggle(None).expect("no-op"));
    assert!(!control.is_playing());
}

#[test]
fn pause_only_affects_a_playing_session() {
    let backend = FakeBackend::default();
    let mut session = session_with(&backend);
    session.pause();
    assert!(backend.calls.lock().expect("lock").is_empty());

    session.play("m").expect("play");
    session.pause();
    assert_eq!(session.state(), &PlaybackState::Idle);
}
