//! Throttled action history.
//!
//! [`ActionHistory`] keeps the most recent actions in a [`RingBuffer`] of
//! 2-element annotation vectors and forwards snapshots to an [`ActionSink`]
//! once every `frequency` steps.

use sockenv_core::config::HistoryConfig;
use sockenv_core::error::{BufferError, ClientError};
use sockenv_core::traits::ActionSink;
use tracing::debug;

use crate::buffer::RingBuffer;

/// Constant second component of every annotation vector.
pub const ANNOTATION_MARKER: f32 = 2.0;

/// Number of tracked channels per action.
pub const HISTORY_CHANNELS: usize = 2;

/// Annotation vector for an action: `[actions[0], ANNOTATION_MARKER]`.
///
/// An empty action records `0.0` in the first channel.
#[allow(clippy::cast_possible_truncation)]
pub fn annotate(actions: &[f64]) -> [f32; HISTORY_CHANNELS] {
    let primary = actions.first().copied().unwrap_or(0.0) as f32;
    [primary, ANNOTATION_MARKER]
}

// ---------------------------------------------------------------------------
// ActionHistory
// ---------------------------------------------------------------------------

/// Ring buffer of recent actions plus the sink it feeds.
pub struct ActionHistory {
    buffer: RingBuffer,
    sink: Box<dyn ActionSink>,
    frequency: u32,
    ticks_until_emit: u32,
    emitted: u64,
}

impl ActionHistory {
    /// Create a history of `config.length` actions emitting every
    /// `config.frequency` steps.
    ///
    /// The config is validated first, so a zero frequency or length fails
    /// with [`ClientError::Config`].
    pub fn new(config: HistoryConfig, sink: Box<dyn ActionSink>) -> Result<Self, ClientError> {
        config.validate()?;
        let buffer = RingBuffer::new(config.length, &[HISTORY_CHANNELS])?;
        Ok(Self {
            buffer,
            sink,
            frequency: config.frequency,
            ticks_until_emit: config.frequency,
            emitted: 0,
        })
    }

    /// Push the annotation of `actions` into the ring buffer.
    pub fn record(&mut self, actions: &[f64]) -> Result<(), BufferError> {
        self.buffer.push(&[HISTORY_CHANNELS], &annotate(actions))
    }

    /// Advance the throttle by one step. Returns `true` if a snapshot was
    /// sent to the sink.
    ///
    /// A snapshot goes out whenever the countdown has reached zero, after
    /// which the countdown restarts at `frequency`. The countdown is then
    /// decremented, so after the first emission snapshots are exactly
    /// `frequency` steps apart.
    pub fn tick(&mut self) -> bool {
        let emit = self.ticks_until_emit == 0;
        if emit {
            self.ticks_until_emit = self.frequency;
            self.emit();
        }
        self.ticks_until_emit -= 1;
        emit
    }

    /// Send the current snapshot to the sink regardless of the throttle.
    pub fn emit(&mut self) {
        let (x, y) = self.snapshot();
        self.sink.update(&x, &y);
        self.emitted += 1;
    }

    /// `(x, y)` series for the sink: `x` repeats `0..length` once per channel,
    /// `y` is the transposed buffer readout.
    #[allow(clippy::cast_precision_loss)]
    pub fn snapshot(&self) -> (Vec<Vec<f32>>, Vec<Vec<f32>>) {
        let axis: Vec<f32> = (0..self.buffer.capacity()).map(|i| i as f32).collect();
        let x = vec![axis; HISTORY_CHANNELS];
        let y = self.buffer.channels();
        (x, y)
    }

    pub const fn buffer(&self) -> &RingBuffer {
        &self.buffer
    }

    pub const fn frequency(&self) -> u32 {
        self.frequency
    }

    pub const fn ticks_until_emit(&self) -> u32 {
        self.ticks_until_emit
    }

    /// Snapshots sent so far.
    pub const fn emitted(&self) -> u64 {
        self.emitted
    }

    pub fn sink_name(&self) -> &str {
        self.sink.name()
    }
}

impl std::fmt::Debug for ActionHistory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionHistory")
            .field("buffer", &self.buffer)
            .field("sink", &self.sink.name())
            .field("frequency", &self.frequency)
            .field("ticks_until_emit", &self.ticks_until_emit)
            .field("emitted", &self.emitted)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// LogSink
// ---------------------------------------------------------------------------

/// Sink that writes every snapshot to the log at `debug` level.
#[derive(Debug, Default)]
pub struct LogSink;

impl ActionSink for LogSink {
    fn update(&mut self, x: &[Vec<f32>], y: &[Vec<f32>]) {
        debug!(?x, ?y, "action history");
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "LogSink"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
