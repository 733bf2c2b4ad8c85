//! Exploration control.
//!
//! - [`shorten_solution`]: drops waypoints the robot has passed
//! - [`ReplanPolicy`]: per-cycle arrival and look-ahead collision triggers
//! - [`Explorer`]: state machine sequencing exploration, sweeping, the return
//!   home and the final save

mod machine;
mod path;
mod replan;
mod state;

pub use machine::{Collaborators, ExplorationReport, Explorer, ExplorerHandle};
pub use path::shorten_solution;
pub use replan::{ReplanDecision, ReplanPolicy};
pub use state::ExplorationState;
