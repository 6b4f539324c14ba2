//! Episode counters and lifecycle of a remote environment.
//!
//! [`Episode`] counts episodes and steps and tracks the
//! `Idle -> Running -> Terminated` lifecycle. It performs no I/O.

// ---------------------------------------------------------------------------
// EpisodeLifecycle
// ---------------------------------------------------------------------------

/// Lifecycle state of a remote environment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum EpisodeLifecycle {
    /// Before the first reset.
    #[default]
    Idle,
    /// At least one reset has completed.
    Running,
    /// Closed. Absorbing.
    Terminated,
}

impl EpisodeLifecycle {
    pub const fn is_terminated(self) -> bool {
        matches!(self, Self::Terminated)
    }

    pub const fn is_running(self) -> bool {
        matches!(self, Self::Running)
    }
}

// ---------------------------------------------------------------------------
// Episode
// ---------------------------------------------------------------------------

/// Episode and step counters.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Episode {
    /// Current lifecycle state.
    pub state: EpisodeLifecycle,
    /// Episodes started so far (incremented on every reset).
    pub episode: u64,
    /// Steps taken in the current episode.
    pub step: u64,
}

impl Episode {
    pub const fn new() -> Self {
        Self {
            state: EpisodeLifecycle::Idle,
            episode: 0,
            step: 0,
        }
    }

    /// Record a completed reset: next episode, step counter back to zero.
    /// Returns `false` (and changes nothing) once terminated.
    pub const fn begin(&mut self) -> bool {
        if self.state.is_terminated() {
            return false;
        }
        self.state = EpisodeLifecycle::Running;
        self.episode += 1;
        self.step = 0;
        true
    }

    /// Record a completed step. Returns `false` once terminated.
    pub const fn advance(&mut self) -> bool {
        if self.state.is_terminated() {
            return false;
        }
        self.step += 1;
        true
    }

    /// Enter the absorbing `Terminated` state.
    pub const fn terminate(&mut self) {
        self.state = EpisodeLifecycle::Terminated;
    }

    pub const fn is_terminated(&self) -> bool {
        self.state.is_terminated()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
