//! Action history and episode bookkeeping for sockenv.
//!
//! - [`buffer`] — [`RingBuffer`], fixed-capacity overwrite-oldest storage
//! - [`history`] — [`ActionHistory`], throttled snapshots to an action sink
//! - [`episode`] — [`Episode`] counters and lifecycle

pub mod buffer;
pub mod episode;
pub mod history;

pub use buffer::RingBuffer;
pub use episode::{Episode, EpisodeLifecycle};
pub use history::{ActionHistory, LogSink};

pub mod prelude {
    pub use crate::{
        ActionHistory, Episode, EpisodeLifecycle, LogSink, RingBuffer,
        history::{ANNOTATION_MARKER, HISTORY_CHANNELS, annotate},
    };
}
