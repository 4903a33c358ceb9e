//! Scripted decode backends for exercising the pipeline without FFmpeg.
#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use framesift::{CapturedPicture, DecodeBackend, ExtractError, SourceMetadata};

pub const PICTURE_WIDTH: u32 = 8;
pub const PICTURE_HEIGHT: u32 = 8;

/// Build a valid solid-gray picture at the given timestamp.
pub fn sample_picture(timestamp: Duration) -> CapturedPicture {
    let data = vec![64u8; (PICTURE_WIDTH * PICTURE_HEIGHT * 3) as usize];
    CapturedPicture::new(PICTURE_WIDTH, PICTURE_HEIGHT, timestamp, data).unwrap()
}

/// A decode backend driven by a script: seeks fail where told to, succeed
/// everywhere else, and every call is recorded for later inspection.
///
/// Counters are shared through `Arc` so tests can keep reading them after
/// the backend has been consumed by a sampler.
pub struct ScriptedBackend {
    metadata: SourceMetadata,
    failures: HashMap<Duration, u32>,
    fail_reinitialize: bool,
    attempts: Arc<Mutex<Vec<Duration>>>,
    reinitializations: Arc<AtomicU64>,
}

impl ScriptedBackend {
    pub fn new(duration: Duration) -> Self {
        Self {
            metadata: SourceMetadata {
                duration,
                width: 640,
                height: 480,
                frames_per_second: 30.0,
                codec: "h264".to_string(),
                format: "mov,mp4,m4a,3gp,3g2,mj2".to_string(),
            },
            failures: HashMap::new(),
            fail_reinitialize: false,
            attempts: Arc::new(Mutex::new(Vec::new())),
            reinitializations: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Script the first `times` seeks at `timestamp` to fail. Use
    /// `u32::MAX` for a timestamp that never succeeds.
    pub fn fail_at(mut self, timestamp: Duration, times: u32) -> Self {
        self.failures.insert(timestamp, times);
        self
    }

    /// Script every reinitialization attempt to fail.
    pub fn fail_reinitialize(mut self) -> Self {
        self.fail_reinitialize = true;
        self
    }

    /// Shared log of every `seek_capture` call, in order.
    pub fn attempt_log(&self) -> Arc<Mutex<Vec<Duration>>> {
        Arc::clone(&self.attempts)
    }

    /// Shared count of completed reinitializations.
    pub fn reinit_counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.reinitializations)
    }
}

impl DecodeBackend for ScriptedBackend {
    fn metadata(&self) -> &SourceMetadata {
        &self.metadata
    }

    fn seek_capture(&mut self, timestamp: Duration) -> Result<CapturedPicture, ExtractError> {
        self.attempts.lock().unwrap().push(timestamp);

        if let Some(remaining) = self.failures.get_mut(&timestamp) {
            if *remaining > 0 {
                *remaining = remaining.saturating_sub(1);
                return Err(ExtractError::Decode(format!(
                    "scripted seek failure at {timestamp:?}"
                )));
            }
        }

        Ok(sample_picture(timestamp))
    }

    fn reinitialize(&mut self) -> Result<(), ExtractError> {
        if self.fail_reinitialize {
            return Err(ExtractError::Decode(
                "scripted reinitialization failure".to_string(),
            ));
        }
        self.reinitializations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
