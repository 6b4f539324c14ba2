use crate::types::SpaceSpec;

// ---------------------------------------------------------------------------
// EnvDescription
// ---------------------------------------------------------------------------

/// Static description of the environment behind a remote connection.
///
/// The remote client only forwards these; nothing is queried over the wire.
pub trait EnvDescription {
    /// Shape and bounds of the states the peer reports.
    fn states(&self) -> SpaceSpec;

    /// Shape and bounds of the actions the peer accepts.
    fn actions(&self) -> SpaceSpec;

    /// Episode length limit, if the environment has one.
    fn max_episode_timesteps(&self) -> Option<u32> {
        None
    }
}

impl<T: EnvDescription + ?Sized> EnvDescription for Box<T> {
    fn states(&self) -> SpaceSpec {
        (**self).states()
    }

    fn actions(&self) -> SpaceSpec {
        (**self).actions()
    }

    fn max_episode_timesteps(&self) -> Option<u32> {
        (**self).max_episode_timesteps()
    }
}

// ---------------------------------------------------------------------------
// ActionSink
// ---------------------------------------------------------------------------

/// Consumer of action-history snapshots, e.g. a live plot.
///
/// `x` and `y` always have the same shape: one row per tracked channel, each
/// row as long as the history buffer.
pub trait ActionSink {
    fn update(&mut self, x: &[Vec<f32>], y: &[Vec<f32>]);

    /// Human-readable name for this sink.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}
