use super::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[tokio::test]
async fn cached_sound_is_not_generated_again() {
    let cache = GeneratedAudioCache::new();
    let calls = AtomicUsize::new(0);

    for _ in 0..3 {
        let media = cache
            .get_or_generate("bell", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok("data:audio/wav;base64,AAAA".to_string())
            })
            .await
            .expect("media");
        assert_eq!(media, "data:audio/wav;base64,AAAA");
    }

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(cache.cached("bell").await.as_deref(), Some("data:audio/wav;base64,AAAA"));
    assert_eq!(cache.len().await, 1);
}

#[tokio::test]
async fn concurrent_requests_for_one_sound_share_a_call() {
    let cache = Arc::new(GeneratedAudioCache::new());
    let calls = Arc::new(AtomicUsize::new(0));

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let cache = Arc::clone(&cache);
        let calls = Arc::clone(&calls);
        tasks.push(tokio::spawn(async move {
            cache
                .get_or_generate("rattle", || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    Ok("clip".to_string())
                })
                .await
        }));
    }
    for task in tasks {
        assert_eq!(task.await.expect("join").expect("media"), "clip");
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn failures_are_not_cached() {
    let cache = GeneratedAudioCache::new();

    let err = cache
        .get_or_generate("claps", || async { Err(ClientError::Status(500)) })
        .await
        .expect_err("must fail");
    assert!(matches!(err, ClientError::Status(500)));
    assert!(cache.cached("claps").await.is_none());
    assert!(cache.is_empty().await);

    let media = cache
        .get_or_generate("claps", || async { Ok("clip".to_string()) })
        .await
        .expect("retry");
    assert_eq!(media, "clip");
}

#[tokio::test]
async fn different_sounds_are_cached_separately() {
    let cache = GeneratedAudioCache::new();
    cache
        .get_or_generate("a", || async { Ok("one".to_string()) })
        .await
        .expect("a");
    cache
        .get_or_generate("sh", || async { Ok("two".to_string()) })
        .await
        .expect("sh");
    assert_eq!(cache.cached("a").await.as_deref(), Some("one"));
    assert_eq!(cache.cached("sh").await.as_deref(), Some("two"));
}
