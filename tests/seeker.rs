//! Retry and reinitialization behavior of the resilient seeker.

mod common;

use std::{sync::atomic::Ordering, time::Duration};

use framesift::{ExtractError, MAX_SEEK_RETRIES, ResilientSeeker};

use common::ScriptedBackend;

#[test]
fn successful_seek_uses_a_single_attempt() {
    let backend = ScriptedBackend::new(Duration::from_secs(10));
    let attempts = backend.attempt_log();
    let reinits = backend.reinit_counter();

    let mut seeker = ResilientSeeker::new(backend);
    let picture = seeker.seek(Duration::from_secs(3)).unwrap();

    assert_eq!(picture.timestamp(), Duration::from_secs(3));
    assert_eq!(attempts.lock().unwrap().len(), 1);
    assert_eq!(reinits.load(Ordering::SeqCst), 0);
    assert_eq!(seeker.reinitializations(), 0);
}

#[test]
fn transient_failures_are_retried_after_reinitialization() {
    let target = Duration::from_secs(5);
    let backend = ScriptedBackend::new(Duration::from_secs(10)).fail_at(target, 2);
    let attempts = backend.attempt_log();
    let reinits = backend.reinit_counter();

    let mut seeker = ResilientSeeker::new(backend);
    let picture = seeker.seek(target).unwrap();

    assert_eq!(picture.timestamp(), target);
    // Two failures, one success, each separated by a rebuild.
    assert_eq!(attempts.lock().unwrap().len(), 3);
    assert_eq!(reinits.load(Ordering::SeqCst), 2);
    assert_eq!(seeker.reinitializations(), 2);
}

#[test]
fn exhausted_retries_report_a_seek_error() {
    let target = Duration::from_secs(5);
    let backend = ScriptedBackend::new(Duration::from_secs(10)).fail_at(target, u32::MAX);
    let attempts = backend.attempt_log();
    let reinits = backend.reinit_counter();

    let mut seeker = ResilientSeeker::new(backend);
    let error = seeker.seek(target).unwrap_err();

    match error {
        ExtractError::Seek {
            timestamp,
            attempts: reported,
            reason,
        } => {
            assert_eq!(timestamp, target);
            assert_eq!(reported, MAX_SEEK_RETRIES);
            assert!(reason.contains("scripted seek failure"));
        }
        other => panic!("expected a seek error, got {other:?}"),
    }

    // Bounded: exactly MAX_SEEK_RETRIES attempts, no rebuild after the
    // final one.
    assert_eq!(attempts.lock().unwrap().len(), MAX_SEEK_RETRIES as usize);
    assert_eq!(reinits.load(Ordering::SeqCst), u64::from(MAX_SEEK_RETRIES - 1));
}

#[test]
fn reinitialization_failure_aborts_the_seek() {
    let target = Duration::from_secs(5);
    let backend = ScriptedBackend::new(Duration::from_secs(10))
        .fail_at(target, u32::MAX)
        .fail_reinitialize();

    let mut seeker = ResilientSeeker::new(backend);
    let error = seeker.seek(target).unwrap_err();

    // The rebuild error surfaces as-is, not wrapped as a seek failure.
    assert!(matches!(error, ExtractError::Decode(_)));
    assert_eq!(seeker.reinitializations(), 0);
}

#[test]
fn metadata_passes_through_to_the_backend() {
    let backend = ScriptedBackend::new(Duration::from_secs(42));
    let seeker = ResilientSeeker::new(backend);

    assert_eq!(seeker.metadata().duration, Duration::from_secs(42));
    assert_eq!(seeker.metadata().codec, "h264");
}

#[test]
fn state_recovers_after_a_failed_timestamp() {
    let bad = Duration::from_secs(2);
    let backend = ScriptedBackend::new(Duration::from_secs(10)).fail_at(bad, u32::MAX);

    let mut seeker = ResilientSeeker::new(backend);
    assert!(seeker.seek(bad).is_err());

    // Other timestamps still work on the same seeker.
    let picture = seeker.seek(Duration::from_secs(3)).unwrap();
    assert_eq!(picture.timestamp(), Duration::from_secs(3));
}
