//! Playback scheduling for streamed audio chunks
//!
//! Incoming chunks must play back-to-back in arrival order with no gaps or
//! overlap, and every pending chunk must be cuttable at once when the user
//! interrupts. The scheduler keeps a monotonically advancing start cursor and
//! the set of in-flight sources on top of an [`AudioSink`].

use std::collections::HashSet;

use crate::audio::codec::AudioChunk;
use crate::audio::playback::{AudioSink, SourceId};
use crate::Result;

/// Schedules streamed chunks gaplessly on an output sink
pub struct PlaybackScheduler<S> {
    sink: S,
    next_start_time: f64,
    active: HashSet<SourceId>,
}

impl<S: AudioSink> PlaybackScheduler<S> {
    /// Create a scheduler over the given sink
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            next_start_time: 0.0,
            active: HashSet::new(),
        }
    }

    /// Schedule a chunk to play immediately after everything already queued
    ///
    /// The start cursor never sits behind the output clock, so after a idle
    /// stretch the next chunk starts now rather than in the past.
    ///
    /// # Errors
    ///
    /// Returns error if the sink cannot start the chunk
    pub fn enqueue(&mut self, chunk: AudioChunk) -> Result<SourceId> {
        self.reap();

        let now = self.sink.now();
        if self.next_start_time < now {
            self.next_start_time = now;
        }

        let duration = chunk.duration_secs();
        let id = self.sink.start(chunk, self.next_start_time)?;
        self.next_start_time += duration;
        self.active.insert(id);

        tracing::trace!(
            source = ?id,
            start = self.next_start_time - duration,
            duration,
            "chunk scheduled"
        );

        Ok(id)
    }

    /// Drop sources that played to completion from the active set
    pub fn reap(&mut self) {
        for id in self.sink.finished() {
            self.active.remove(&id);
        }
    }

    /// Cut off every pending and playing chunk
    ///
    /// Resets the start cursor to zero so the next chunk schedules relative
    /// to the output clock at enqueue time, not to stale future time. Safe to
    /// call with nothing queued.
    pub fn interrupt(&mut self) {
        let stopped = self.active.len();
        for id in self.active.drain().collect::<Vec<_>>() {
            self.sink.stop(id);
        }
        self.next_start_time = 0.0;

        if stopped > 0 {
            tracing::debug!(stopped, "playback interrupted");
        }
    }

    /// Release all playback state on session close
    pub fn teardown(&mut self) {
        self.interrupt();
    }

    /// Number of sources currently tracked as in flight
    #[must_use]
    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    /// Scheduled start offset for the next chunk
    #[must_use]
    pub const fn next_start_time(&self) -> f64 {
        self.next_start_time
    }

    /// Access the underlying sink
    pub const fn sink(&self) -> &S {
        &self.sink
    }

    /// Mutable access to the underlying sink
    pub const fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }
}
