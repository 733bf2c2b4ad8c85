//! Sensing side of the engine.
//!
//! The tracker thread pushes every new frame into the [`FrameCache`]; the
//! exploration thread takes whole [`PoseSnapshot`] copies out of it.

mod depth;
mod frame_cache;

pub use depth::{DepthImage, RayLookup};
pub use frame_cache::{FrameCache, PoseSnapshot};
