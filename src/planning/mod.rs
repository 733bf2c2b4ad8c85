//! Seam to the external SLAM system and path planner.
//!
//! The engine never plans paths itself. It talks to the tracker, the map
//! backend, the point-cloud supplier and the planner through the traits in
//! [`collaborators`], and wraps the planner calls in a [`PlannerFacade`].

mod collaborators;
mod facade;

pub use collaborators::{
    Color, DrawSink, MapPersistence, MappingBackend, PathPlanner, PlanStart, PointCloudSupplier,
    Tracker, TrackingState,
};
pub use facade::PlannerFacade;
