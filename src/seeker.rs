//! Resilient seeking with bounded retries.
//!
//! [`ResilientSeeker`] wraps a [`DecodeBackend`] and makes seeking robust
//! to decoders that error or silently stall on certain seeks. Each failed
//! attempt tears the backend down completely and rebuilds it before
//! retrying; after a bounded number of attempts the seek is reported as
//! failed and the caller decides whether to skip the frame or abort.

use std::{thread, time::Duration};

use crate::{
    error::ExtractError, frame::CapturedPicture, metadata::SourceMetadata, session::DecodeBackend,
};

/// Maximum attempts for a single seek before signalling failure.
///
/// Bounded retry is a hard contract: a seek never loops indefinitely.
pub const MAX_SEEK_RETRIES: u32 = 3;

/// Pause between attempts, giving the runtime a chance to release the old
/// decoder's resources before a fresh one is allocated.
const RETRY_DELAY: Duration = Duration::from_millis(100);

/// Retry-and-reinitialize wrapper around a decode backend.
///
/// Exclusively owns the backend slot; on failure the slot's contents are
/// replaced wholesale, so no other component may retain a handle to a
/// previous backend incarnation.
pub struct ResilientSeeker<B: DecodeBackend> {
    backend: B,
    reinitializations: u64,
}

impl<B: DecodeBackend> ResilientSeeker<B> {
    /// Wrap a backend.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            reinitializations: 0,
        }
    }

    /// Metadata of the underlying source.
    pub fn metadata(&self) -> &SourceMetadata {
        self.backend.metadata()
    }

    /// How many times the backend has been torn down and rebuilt.
    pub fn reinitializations(&self) -> u64 {
        self.reinitializations
    }

    /// Seek to `timestamp` and capture the picture there, retrying with
    /// full backend reinitialization on failure.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Seek`] carrying the timestamp and the last
    /// underlying error once all [`MAX_SEEK_RETRIES`] attempts are
    /// exhausted, or the reinitialization error if the backend cannot
    /// even be rebuilt.
    pub fn seek(&mut self, timestamp: Duration) -> Result<CapturedPicture, ExtractError> {
        let mut last_error: Option<ExtractError> = None;

        for attempt in 1..=MAX_SEEK_RETRIES {
            match self.backend.seek_capture(timestamp) {
                Ok(picture) => return Ok(picture),
                Err(error) => {
                    log::warn!(
                        "Seek to {timestamp:?} failed (attempt {attempt}/{MAX_SEEK_RETRIES}): {error}"
                    );
                    last_error = Some(error);
                }
            }

            if attempt < MAX_SEEK_RETRIES {
                // Let the runtime release the stuck decoder before the
                // replacement allocates.
                thread::sleep(RETRY_DELAY);
                self.backend.reinitialize()?;
                self.reinitializations += 1;
            }
        }

        Err(ExtractError::Seek {
            timestamp,
            attempts: MAX_SEEK_RETRIES,
            reason: last_error
                .map(|error| error.to_string())
                .unwrap_or_else(|| "unknown".to_string()),
        })
    }
}
