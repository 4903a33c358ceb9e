//! Option builder and cancellation token behavior.

use std::{sync::Arc, thread, time::Duration};

use framesift::{
    CancellationToken, DEFAULT_FLUSH_INTERVAL, DEFAULT_FRAME_INTERVAL, DEFAULT_MAX_HEIGHT,
    DEFAULT_MAX_WIDTH, DEFAULT_QUALITY, ExtractOptions, ExtractedFrame, FrameCallback,
};

#[test]
fn defaults_are_documented_values() {
    assert_eq!(DEFAULT_QUALITY, 90);
    assert_eq!(DEFAULT_MAX_WIDTH, 1024);
    assert_eq!(DEFAULT_MAX_HEIGHT, 1024);
    assert_eq!(DEFAULT_FRAME_INTERVAL, Duration::from_secs(1));
    assert_eq!(DEFAULT_FLUSH_INTERVAL, 120);
}

#[test]
fn default_and_new_agree() {
    let from_new = format!("{:?}", ExtractOptions::new());
    let from_default = format!("{:?}", ExtractOptions::default());
    assert_eq!(from_new, from_default);
}

#[test]
fn quality_is_clamped_to_valid_jpeg_range() {
    let low = ExtractOptions::new().with_quality(0);
    let high = ExtractOptions::new().with_quality(200);

    assert!(format!("{low:?}").contains("quality: 1"));
    assert!(format!("{high:?}").contains("quality: 100"));
}

#[test]
fn dimension_bounds_are_never_zero() {
    let options = ExtractOptions::new().with_max_dimensions(0, 0);
    let debug = format!("{options:?}");
    assert!(debug.contains("max_width: 1"));
    assert!(debug.contains("max_height: 1"));
}

#[test]
fn flush_interval_is_clamped_to_one() {
    let options = ExtractOptions::new().with_flush_interval(0);
    assert!(format!("{options:?}").contains("flush_interval: 1"));
}

#[test]
fn debug_reports_cancellation_presence_not_contents() {
    let plain = ExtractOptions::new();
    assert!(format!("{plain:?}").contains("has_cancellation: false"));

    let with_token = ExtractOptions::new().with_cancellation(CancellationToken::new());
    assert!(format!("{with_token:?}").contains("has_cancellation: true"));
}

#[test]
fn options_with_callbacks_are_cloneable() {
    struct Counter;
    impl FrameCallback for Counter {
        fn on_frame(&self, _frame: &ExtractedFrame) {}
    }

    let options = ExtractOptions::new().with_frame_callback(Arc::new(Counter));
    let cloned = options.clone();
    assert_eq!(format!("{options:?}"), format!("{cloned:?}"));
}

#[test]
fn token_starts_uncancelled() {
    let token = CancellationToken::new();
    assert!(!token.is_cancelled());
}

#[test]
fn cancel_is_visible_to_all_clones() {
    let token = CancellationToken::new();
    let clone = token.clone();

    clone.cancel();
    assert!(token.is_cancelled());
    assert!(clone.is_cancelled());
}

#[test]
fn cancel_is_visible_across_threads() {
    let token = CancellationToken::new();
    let remote = token.clone();

    let handle = thread::spawn(move || {
        remote.cancel();
    });
    handle.join().unwrap();

    assert!(token.is_cancelled());
}
