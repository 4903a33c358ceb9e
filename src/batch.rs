//! Batch accumulation and flow control.
//!
//! [`BatchFlowController`] is the mechanism that keeps peak memory flat
//! regardless of source length: captured pictures accumulate in a bounded
//! buffer, and every time the buffer fills (or at end-of-stream) the whole
//! batch is handed to the encode worker and the buffer is cleared. Flushes
//! are strictly sequential; at most one batch is ever in flight.

use std::{thread, time::Duration};

use crate::{
    encoder::EncodeWorker,
    error::ExtractError,
    frame::{CapturedPicture, ExtractedFrame},
};

/// Cooperative pause inserted after each interval-triggered flush, letting
/// the host runtime catch up on scheduling and resource reclamation.
const FLUSH_PAUSE: Duration = Duration::from_millis(50);

/// Accumulates captured pictures and flushes them in fixed-size batches.
///
/// Owns both the pending picture buffer and the growing list of
/// [`ExtractedFrame`]s; after a flush, each returned blob is associated
/// with its frame by batch position.
pub struct BatchFlowController {
    encoder: EncodeWorker,
    pending: Vec<CapturedPicture>,
    frames: Vec<ExtractedFrame>,
    flush_interval: usize,
    flushes: u64,
}

impl BatchFlowController {
    /// Create a controller that flushes every `flush_interval` captures.
    ///
    /// `flush_interval` is clamped to a minimum of 1.
    pub fn new(encoder: EncodeWorker, flush_interval: usize) -> Self {
        let flush_interval = flush_interval.max(1);
        Self {
            encoder,
            pending: Vec::with_capacity(flush_interval),
            frames: Vec::new(),
            flush_interval,
            flushes: 0,
        }
    }

    /// Take ownership of a captured picture and its frame record.
    ///
    /// Triggers a flush (and the cooperative pause) when the pending
    /// buffer reaches the flush interval, so the buffer never exceeds it.
    ///
    /// # Errors
    ///
    /// Propagates [`ExtractError::Encode`] from a triggered flush; an
    /// encode failure is fatal for the run.
    pub fn on_capture(
        &mut self,
        picture: CapturedPicture,
        frame: ExtractedFrame,
    ) -> Result<(), ExtractError> {
        self.pending.push(picture);
        self.frames.push(frame);

        if self.pending.len() >= self.flush_interval {
            self.flush()?;
            thread::sleep(FLUSH_PAUSE);
        }
        Ok(())
    }

    /// Hand the pending batch to the encode worker and attach the
    /// resulting blobs to their frames.
    ///
    /// No-op on an empty buffer. Blocks until the worker replies; flushes
    /// are never pipelined, bounding peak memory to one batch in flight.
    pub fn flush(&mut self) -> Result<(), ExtractError> {
        if self.pending.is_empty() {
            return Ok(());
        }

        let starting_index = (self.frames.len() - self.pending.len()) as u64;
        let batch = std::mem::take(&mut self.pending);
        let batch_len = batch.len();

        log::debug!("Flushing batch of {batch_len} pictures starting at frame {starting_index}");
        let blobs = self.encoder.encode(batch, starting_index)?;

        for (frame, blob) in self.frames[starting_index as usize..]
            .iter_mut()
            .zip(blobs)
        {
            frame.blob = Some(blob);
        }

        self.flushes += 1;
        Ok(())
    }

    /// Flush any remaining partial batch and return the completed frames.
    pub fn finish(mut self) -> Result<Vec<ExtractedFrame>, ExtractError> {
        self.flush()?;
        Ok(self.frames)
    }

    /// Number of frames captured so far (flushed or pending).
    pub fn frames_extracted(&self) -> u64 {
        self.frames.len() as u64
    }

    /// Number of pictures currently buffered, awaiting a flush.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Number of flushes performed so far.
    pub fn flushes(&self) -> u64 {
        self.flushes
    }
}
