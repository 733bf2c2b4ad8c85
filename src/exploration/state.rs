//! Exploration state machine states.

use std::fmt;

/// Exploration state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExplorationState {
    /// Waiting for the tracker to initialize
    WaitForTracking,
    /// Planning towards frontiers chosen by the planner, or following such a path
    Explore,
    /// Re-planning after the active path became stale or blocked
    Replan,
    /// Visiting leftover unvisited targets one by one
    Sweep,
    /// Driving back to the origin and waiting for global bundle adjustment
    ReturnHome,
    /// Saving the map
    Save,
    /// Finished
    Done,
}

impl ExplorationState {
    /// Is this a terminal state?
    pub fn is_terminal(&self) -> bool {
        matches!(self, ExplorationState::Done)
    }

    /// State name for logging
    pub fn name(&self) -> &'static str {
        match self {
            ExplorationState::WaitForTracking => "WaitForTracking",
            ExplorationState::Explore => "Explore",
            ExplorationState::Replan => "Replan",
            ExplorationState::Sweep => "Sweep",
            ExplorationState::ReturnHome => "ReturnHome",
            ExplorationState::Save => "Save",
            ExplorationState::Done => "Done",
        }
    }
}

impl fmt::Display for ExplorationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
