//! Static environment description used across tests.

use sockenv_core::types::{SpaceSpec, StaticDescription};

/// Two-dimensional float state, one bounded action in `[-1, 1]`, episodes
/// capped at 100 steps.
pub fn test_description() -> StaticDescription {
    StaticDescription::new(
        SpaceSpec::float(vec![2]),
        SpaceSpec::bounded(vec![1], -1.0, 1.0),
    )
    .with_max_episode_timesteps(100)
}
