//! End-to-end sampling runs over scripted backends.

mod common;

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use framesift::{
    CancellationToken, ExtractError, ExtractOptions, ExtractedFrame, ExtractionProgress,
    FrameCallback, FrameSampler, MAX_CONSECUTIVE_FAILURES, ProgressCallback,
};

use common::ScriptedBackend;

#[derive(Default)]
struct RecordingFrames {
    timestamps: Mutex<Vec<Duration>>,
}

impl FrameCallback for RecordingFrames {
    fn on_frame(&self, frame: &ExtractedFrame) {
        self.timestamps.lock().unwrap().push(frame.timestamp);
    }
}

#[derive(Default)]
struct RecordingProgress {
    events: Mutex<Vec<(f32, Option<String>)>>,
}

impl ProgressCallback for RecordingProgress {
    fn on_progress(&self, progress: &ExtractionProgress) {
        self.events
            .lock()
            .unwrap()
            .push((progress.progress, progress.status.clone()));
    }
}

#[test]
fn extracts_one_frame_per_interval() {
    let backend = ScriptedBackend::new(Duration::from_secs(10));
    let sampler = FrameSampler::with_backend(backend, ExtractOptions::new());

    let frames = sampler.extract().unwrap();

    assert_eq!(frames.len(), 10);
    for (index, frame) in frames.iter().enumerate() {
        assert_eq!(frame.timestamp, Duration::from_secs(index as u64));
        assert!(frame.preview.starts_with("data:image/jpeg;base64,"));
        assert!(frame.blob.is_some(), "frame {index} has no blob");
    }
}

#[test]
fn timestamps_are_strictly_increasing() {
    let backend = ScriptedBackend::new(Duration::from_secs(8));
    let options = ExtractOptions::new().with_frame_interval(Duration::from_millis(1500));
    let frames = FrameSampler::with_backend(backend, options)
        .extract()
        .unwrap();

    // floor(8.0 / 1.5) = 5 frames.
    assert_eq!(frames.len(), 5);
    for pair in frames.windows(2) {
        assert!(pair[0].timestamp < pair[1].timestamp);
    }
}

#[test]
fn zero_interval_is_rejected() {
    let backend = ScriptedBackend::new(Duration::from_secs(10));
    let options = ExtractOptions::new().with_frame_interval(Duration::ZERO);

    let error = FrameSampler::with_backend(backend, options)
        .extract()
        .unwrap_err();
    assert!(matches!(error, ExtractError::InvalidInterval));
}

#[test]
fn isolated_failures_are_skipped() {
    let backend = ScriptedBackend::new(Duration::from_secs(10))
        .fail_at(Duration::from_secs(2), u32::MAX)
        .fail_at(Duration::from_secs(5), u32::MAX);
    let frames = FrameSampler::with_backend(backend, ExtractOptions::new())
        .extract()
        .unwrap();

    assert_eq!(frames.len(), 8);
    let timestamps: Vec<_> = frames.iter().map(|frame| frame.timestamp).collect();
    assert!(!timestamps.contains(&Duration::from_secs(2)));
    assert!(!timestamps.contains(&Duration::from_secs(5)));
    assert!(frames.iter().all(|frame| frame.blob.is_some()));
}

#[test]
fn sustained_failure_aborts_the_run() {
    let backend = ScriptedBackend::new(Duration::from_secs(10))
        .fail_at(Duration::from_secs(5), u32::MAX)
        .fail_at(Duration::from_secs(6), u32::MAX)
        .fail_at(Duration::from_secs(7), u32::MAX);

    let callback = Arc::new(RecordingFrames::default());
    let options = ExtractOptions::new().with_frame_callback(callback.clone());

    let error = FrameSampler::with_backend(backend, options)
        .extract()
        .unwrap_err();

    match error {
        ExtractError::ConsecutiveFailureLimit { timestamp, limit } => {
            assert_eq!(timestamp, Duration::from_secs(7));
            assert_eq!(limit, MAX_CONSECUTIVE_FAILURES);
        }
        other => panic!("expected a consecutive-failure abort, got {other:?}"),
    }

    // The per-frame callback remains the only record of the partial run.
    let seen = callback.timestamps.lock().unwrap();
    assert_eq!(seen.len(), 5);
    assert!(seen.iter().all(|&timestamp| timestamp < Duration::from_secs(5)));
}

#[test]
fn a_success_resets_the_failure_streak() {
    // Failures at 3s and 5s are separated by a success at 4s, so the
    // streak never reaches the limit.
    let backend = ScriptedBackend::new(Duration::from_secs(8))
        .fail_at(Duration::from_secs(3), u32::MAX)
        .fail_at(Duration::from_secs(5), u32::MAX);

    let frames = FrameSampler::with_backend(backend, ExtractOptions::new())
        .extract()
        .unwrap();
    assert_eq!(frames.len(), 6);
}

#[test]
fn cancellation_stops_the_run() {
    let backend = ScriptedBackend::new(Duration::from_secs(10));
    let token = CancellationToken::new();
    token.cancel();

    let options = ExtractOptions::new().with_cancellation(token);
    let error = FrameSampler::with_backend(backend, options)
        .extract()
        .unwrap_err();
    assert!(matches!(error, ExtractError::Cancelled));
}

#[test]
fn progress_is_monotonic_and_finishes_at_completion() {
    let backend = ScriptedBackend::new(Duration::from_secs(6));
    let progress = Arc::new(RecordingProgress::default());
    let options = ExtractOptions::new().with_progress(progress.clone());

    FrameSampler::with_backend(backend, options)
        .extract()
        .unwrap();

    let events = progress.events.lock().unwrap();
    let percentages: Vec<f32> = events
        .iter()
        .filter(|(_, status)| status.is_none())
        .map(|(percent, _)| *percent)
        .collect();

    assert!(!percentages.is_empty());
    for pair in percentages.windows(2) {
        assert!(pair[0] <= pair[1]);
    }
    assert!(percentages.iter().all(|&percent| (0.0..=100.0).contains(&percent)));

    let (final_percent, final_status) = events.last().unwrap();
    assert_eq!(*final_percent, 100.0);
    assert_eq!(final_status.as_deref(), Some("Extraction complete"));
}

#[test]
fn small_flush_intervals_still_deliver_every_blob() {
    let backend = ScriptedBackend::new(Duration::from_secs(7));
    let options = ExtractOptions::new().with_flush_interval(2);

    let frames = FrameSampler::with_backend(backend, options)
        .extract()
        .unwrap();

    assert_eq!(frames.len(), 7);
    assert!(frames.iter().all(|frame| frame.blob.is_some()));
}

#[test]
fn retried_seeks_still_produce_their_frame() {
    // Two failures at 4s are within the retry budget, so the frame is
    // recovered rather than skipped.
    let backend = ScriptedBackend::new(Duration::from_secs(6)).fail_at(Duration::from_secs(4), 2);
    let reinits = backend.reinit_counter();

    let frames = FrameSampler::with_backend(backend, ExtractOptions::new())
        .extract()
        .unwrap();

    assert_eq!(frames.len(), 6);
    assert_eq!(reinits.load(std::sync::atomic::Ordering::SeqCst), 2);
}
