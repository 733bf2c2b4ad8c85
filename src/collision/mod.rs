//! Collision testing of planned states against the obstacle grid.
//!
//! - [`FootprintChecker`]: oriented rectangle vs. grid, split into two triangles
//! - [`StateValidator`]: the per-mode check used by path validation

mod footprint;
mod validator;

pub use footprint::{Footprint, FootprintChecker};
pub use validator::StateValidator;
