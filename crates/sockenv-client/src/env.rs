//! Episode orchestration on top of a [`ProtocolClient`].
//!
//! [`RemoteEnvironment`] turns the standard `reset`/`execute` interface into
//! fixed sequences of round trips, tracks episode and step counters, and
//! optionally feeds recent actions to an [`ActionSink`].
//!
//! ```text
//! reset   : RESET(1) STATE(1)
//! execute : CONTROL(actions) EVOLVE(1) STATE(1) TERMINAL(1) REWARD(1)
//! close   : CLOSE(1)            (one-way)
//! ```

use std::io::{Read, Write};
use std::net::TcpStream;

use sockenv_core::config::{ClientConfig, HistoryConfig};
use sockenv_core::error::ClientError;
use sockenv_core::traits::{ActionSink, EnvDescription};
use sockenv_core::types::{Payload, SpaceSpec};
use sockenv_env::episode::{Episode, EpisodeLifecycle};
use sockenv_env::history::{ActionHistory, LogSink};
use tracing::{debug, warn};

use crate::client::ProtocolClient;
use crate::codec::{Codec, JsonCodec};
use crate::protocol::MessageKind;

// ---------------------------------------------------------------------------
// StepOutcome
// ---------------------------------------------------------------------------

/// Result of one [`RemoteEnvironment::execute`] call, as received from the
/// peer.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub next_state: Payload,
    pub terminal: Payload,
    pub reward: Payload,
}

impl StepOutcome {
    /// `true` if the peer reported a terminal state. Numeric flags count as
    /// terminal when non-zero.
    pub fn is_terminal(&self) -> bool {
        self.terminal
            .as_bool()
            .or_else(|| self.terminal.as_f64().map(|v| v != 0.0))
            .unwrap_or(false)
    }

    /// Scalar reward, if the peer sent one.
    pub fn reward_value(&self) -> Option<f64> {
        self.reward.as_f64()
    }
}

// ---------------------------------------------------------------------------
// RemoteEnvironment
// ---------------------------------------------------------------------------

/// Environment whose dynamics run in a remote peer.
///
/// Exclusively owns its connection. After [`close`](Self::close) every call
/// fails with [`ClientError::Closed`].
///
/// # Example
///
/// ```no_run
/// use sockenv_client::RemoteEnvironment;
/// use sockenv_core::prelude::*;
///
/// let description = StaticDescription::new(SpaceSpec::float(vec![4]), SpaceSpec::float(vec![1]));
/// let env = RemoteEnvironment::connect(&ClientConfig::default(), description)?;
/// let total = env.scoped(|env| -> Result<f64, ClientError> {
///     env.reset()?;
///     let mut total = 0.0;
///     for _ in 0..10 {
///         let outcome = env.execute(&[0.5])?;
///         total += outcome.reward_value().unwrap_or(0.0);
///         if outcome.is_terminal() {
///             break;
///         }
///     }
///     Ok(total)
/// })?;
/// println!("total reward: {total}");
/// # Ok::<(), ClientError>(())
/// ```
pub struct RemoteEnvironment<S = TcpStream, C = JsonCodec>
where
    S: Read + Write,
    C: Codec,
{
    client: ProtocolClient<S, C>,
    description: Box<dyn EnvDescription>,
    episode: Episode,
    history: Option<ActionHistory>,
}

impl RemoteEnvironment<TcpStream, JsonCodec> {
    /// Connect to the peer in `config`.
    ///
    /// If the config has a `[history]` table, action history is enabled with
    /// a [`LogSink`].
    pub fn connect<D>(config: &ClientConfig, description: D) -> Result<Self, ClientError>
    where
        D: EnvDescription + 'static,
    {
        Self::connect_with_sink(config, description, Box::new(LogSink))
    }

    /// Like [`connect`](Self::connect), feeding action history to `sink`
    /// when the config has a `[history]` table.
    pub fn connect_with_sink<D>(
        config: &ClientConfig,
        description: D,
        sink: Box<dyn ActionSink>,
    ) -> Result<Self, ClientError>
    where
        D: EnvDescription + 'static,
    {
        let client = ProtocolClient::connect(config)?;
        let mut env = Self::new(client, description);
        if let Some(history) = config.history {
            env.enable_action_history(history, sink)?;
        }
        Ok(env)
    }
}

impl<S, C> RemoteEnvironment<S, C>
where
    S: Read + Write,
    C: Codec,
{
    pub fn new<D>(client: ProtocolClient<S, C>, description: D) -> Self
    where
        D: EnvDescription + 'static,
    {
        Self {
            client,
            description: Box::new(description),
            episode: Episode::new(),
            history: None,
        }
    }

    /// Start recording actions and sending snapshots to `sink`.
    ///
    /// Replaces any previously enabled history.
    pub fn enable_action_history(
        &mut self,
        config: HistoryConfig,
        sink: Box<dyn ActionSink>,
    ) -> Result<(), ClientError> {
        let history = ActionHistory::new(config, sink)?;
        if self.client.verbosity().lifecycle() {
            debug!(
                sink = history.sink_name(),
                frequency = config.frequency,
                length = config.length,
                "action history enabled"
            );
        }
        self.history = Some(history);
        Ok(())
    }

    /// Start a new episode and return the initial state.
    pub fn reset(&mut self) -> Result<Payload, ClientError> {
        self.ensure_open()?;

        self.client.request(MessageKind::Reset, Payload::FLAG)?;
        let initial = self.client.request(MessageKind::State, Payload::FLAG)?;

        self.episode.begin();
        if self.client.verbosity().payloads() {
            debug!(episode = self.episode.episode, state = ?initial.payload, "reset done");
        }
        Ok(initial.into_payload())
    }

    /// Apply `actions` and advance the remote environment by one step.
    pub fn execute(&mut self, actions: &[f64]) -> Result<StepOutcome, ClientError> {
        self.ensure_open()?;

        if let Some(history) = self.history.as_mut()
            && let Err(e) = history.record(actions)
        {
            warn!("action history not updated: {e}");
        }

        self.client
            .request(MessageKind::Control, Payload::from(actions))?;
        self.client.request(MessageKind::Evolve, Payload::FLAG)?;
        let next_state = self.client.request(MessageKind::State, Payload::FLAG)?;
        let terminal = self.client.request(MessageKind::Terminal, Payload::FLAG)?;
        let reward = self.client.request(MessageKind::Reward, Payload::FLAG)?;

        self.episode.advance();

        if let Some(history) = self.history.as_mut() {
            history.tick();
        }

        let outcome = StepOutcome {
            next_state: next_state.into_payload(),
            terminal: terminal.into_payload(),
            reward: reward.into_payload(),
        };
        if self.client.verbosity().payloads() {
            debug!(
                episode = self.episode.episode,
                step = self.episode.step,
                state = ?outcome.next_state,
                terminal = ?outcome.terminal,
                reward = ?outcome.reward,
                "execute performed"
            );
        }
        Ok(outcome)
    }

    /// Notify the peer and release the connection. Idempotent.
    pub fn close(&mut self) {
        self.client.close();
        self.episode.terminate();
    }

    /// Run `f` and close the environment afterwards, whatever `f` returns.
    ///
    /// If `f` panics, the connection is still closed while unwinding.
    pub fn scoped<T, E, F>(mut self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Self) -> Result<T, E>,
    {
        let result = f(&mut self);
        self.close();
        result
    }

    // ---- pass-through ----

    pub fn states(&self) -> SpaceSpec {
        self.description.states()
    }

    pub fn actions(&self) -> SpaceSpec {
        self.description.actions()
    }

    pub fn max_episode_timesteps(&self) -> Option<u32> {
        self.description.max_episode_timesteps()
    }

    // ---- bookkeeping ----

    /// Episodes started so far.
    pub const fn episode(&self) -> u64 {
        self.episode.episode
    }

    /// Steps taken in the current episode.
    pub const fn step(&self) -> u64 {
        self.episode.step
    }

    pub const fn lifecycle(&self) -> EpisodeLifecycle {
        self.episode.state
    }

    pub const fn history(&self) -> Option<&ActionHistory> {
        self.history.as_ref()
    }

    pub const fn client(&self) -> &ProtocolClient<S, C> {
        &self.client
    }

    const fn ensure_open(&self) -> Result<(), ClientError> {
        if self.episode.is_terminated() || !self.client.is_connected() {
            return Err(ClientError::Closed);
        }
        Ok(())
    }
}

impl<S, C> std::fmt::Debug for RemoteEnvironment<S, C>
where
    S: Read + Write,
    C: Codec,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteEnvironment")
            .field("client", &self.client)
            .field("episode", &self.episode)
            .field("history", &self.history)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Scoped session
// ---------------------------------------------------------------------------

/// Connect, run `f`, and close, on every exit path.
///
/// ```no_run
/// use sockenv_client::with_environment;
/// use sockenv_core::prelude::*;
///
/// let description = StaticDescription::new(SpaceSpec::float(vec![2]), SpaceSpec::float(vec![1]));
/// let state = with_environment(&ClientConfig::default(), description, |env| env.reset())?;
/// # Ok::<(), ClientError>(())
/// ```
pub fn with_environment<D, T, F>(
    config: &ClientConfig,
    description: D,
    f: F,
) -> Result<T, ClientError>
where
    D: EnvDescription + 'static,
    F: FnOnce(&mut RemoteEnvironment) -> Result<T, ClientError>,
{
    RemoteEnvironment::connect(config, description)?.scoped(f)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
