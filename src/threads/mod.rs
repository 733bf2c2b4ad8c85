//! Exploration thread.
//!
//! The tracker thread keeps pushing frames through the [`ExplorerHandle`]
//! while the state machine runs on its own named thread.

use std::thread::{self, JoinHandle};

use crate::config::AnveshanConfig;
use crate::error::{AnveshanError, Result};
use crate::exploration::{Collaborators, ExplorationReport, Explorer, ExplorerHandle};

/// Running exploration thread.
pub struct ExplorationThread {
    /// Shared state of the running explorer
    pub handle: ExplorerHandle,
    join: JoinHandle<ExplorationReport>,
}

impl ExplorationThread {
    /// Signal shutdown and wait for the thread.
    pub fn stop(self) -> Result<ExplorationReport> {
        self.handle.shutdown();
        self.join()
    }

    /// Wait for the explorer to finish on its own.
    pub fn join(self) -> Result<ExplorationReport> {
        self.join
            .join()
            .map_err(|_| AnveshanError::Thread("exploration thread panicked".into()))
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}

/// Build an [`Explorer`] and run it on a thread named `exploration`.
pub fn spawn_exploration(
    config: &AnveshanConfig,
    collaborators: Collaborators,
) -> Result<ExplorationThread> {
    let mut explorer = Explorer::new(config, collaborators);
    let handle = explorer.handle();

    let join = thread::Builder::new()
        .name("exploration".into())
        .spawn(move || explorer.run())
        .map_err(|e| AnveshanError::Thread(format!("Failed to spawn exploration thread: {}", e)))?;

    tracing::info!("Exploration thread spawned");
    Ok(ExplorationThread { handle, join })
}
