//! Action sinks for tests.

use std::sync::{Arc, Mutex, PoisonError};

use sockenv_core::traits::ActionSink;

/// One `(x, y)` snapshot as delivered to a sink.
pub type Snapshot = (Vec<Vec<f32>>, Vec<Vec<f32>>);

/// Sink that keeps every snapshot it receives. Clones share storage.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    snapshots: Arc<Mutex<Vec<Snapshot>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshots(&self) -> Vec<Snapshot> {
        self.snapshots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of snapshots received.
    pub fn len(&self) -> usize {
        self.snapshots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ActionSink for RecordingSink {
    fn update(&mut self, x: &[Vec<f32>], y: &[Vec<f32>]) {
        self.snapshots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((x.to_vec(), y.to_vec()));
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "RecordingSink"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_snapshots() {
        let sink = RecordingSink::new();
        let mut writer = sink.clone();
        writer.update(&[vec![0.0]], &[vec![1.0]]);
        assert_eq!(sink.len(), 1);
        assert_eq!(sink.snapshots()[0], (vec![vec![0.0]], vec![vec![1.0]]));
        assert_eq!(writer.name(), "RecordingSink");
    }
}
