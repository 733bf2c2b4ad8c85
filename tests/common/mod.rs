//! Mock collaborators and helpers shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use anveshan::{
    AnveshanConfig, Collaborators, Color, DepthImage, DrawSink, MapPersistence, MappingBackend,
    PathPlanner, PlanStart, Point3, PointCloud, PointCloudSupplier, RayLookup, Result, Tracker,
    TrackingState, Waypoint, WorldPoint,
};
use nalgebra::{Matrix4, Vector3};
use parking_lot::Mutex;

/// Install a test subscriber once; `RUST_LOG` controls the level.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Defaults with every sleep and warmup removed.
pub fn fast_config() -> AnveshanConfig {
    let mut config = AnveshanConfig::default();
    config.exploration.poll_interval_ms = 0;
    config.exploration.cycle_interval_ms = 0;
    config.exploration.warmup_ms = 0;
    config.exploration.gba_start_timeout_ms = 0;
    config.exploration.gba_finish_timeout_ms = 0;
    config
}

/// 8x8 pinhole lookup matching [`wall_depth`] and [`blank_depth`].
pub fn lookup() -> RayLookup {
    RayLookup::from_intrinsics(4.0, 4.0, 4.0, 4.0, 8, 8)
}

/// Depth image without valid pixels.
pub fn blank_depth() -> DepthImage {
    DepthImage::zeros(8, 8)
}

/// Every pixel 1 m away: a wall across the view.
pub fn wall_depth() -> DepthImage {
    DepthImage::new(8, 8, vec![1.0; 64]).unwrap()
}

/// Camera at `(x, 0, z)` looking along +z.
pub fn pose_at(x: f32, z: f32) -> (Matrix4<f32>, Vector3<f32>) {
    let center = Vector3::new(x, 0.0, z);
    (Matrix4::new_translation(&center), center)
}

// ============================================================================
// Tracker
// ============================================================================

pub struct MockTracker {
    state: Mutex<TrackingState>,
    lookup: Arc<RayLookup>,
}

impl MockTracker {
    pub fn new(state: TrackingState) -> Self {
        Self {
            state: Mutex::new(state),
            lookup: Arc::new(lookup()),
        }
    }

    pub fn set_state(&self, state: TrackingState) {
        *self.state.lock() = state;
    }
}

impl Tracker for MockTracker {
    fn state(&self) -> TrackingState {
        *self.state.lock()
    }

    fn ray_lookup(&self) -> Option<Arc<RayLookup>> {
        Some(Arc::clone(&self.lookup))
    }
}

pub struct EmptySupplier;

impl PointCloudSupplier for EmptySupplier {
    fn recompute_point_cloud(&self) -> PointCloud {
        PointCloud::new()
    }
}

// ============================================================================
// Planner
// ============================================================================

/// One recorded planner query.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlanCall {
    pub start: WorldPoint,
    pub goal: Option<WorldPoint>,
}

/// Planner replaying scripted replies; an exhausted script fails every call.
#[derive(Default)]
pub struct MockPlanner {
    replies: Mutex<VecDeque<Option<Vec<Waypoint>>>>,
    targets: Mutex<VecDeque<WorldPoint>>,
    calls: Mutex<Vec<PlanCall>>,
    resets: Mutex<Vec<bool>>,
    target: Mutex<Option<WorldPoint>>,
}

impl MockPlanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(&self, reply: Option<Vec<Waypoint>>) -> &Self {
        self.replies.lock().push_back(reply);
        self
    }

    pub fn fail(&self, times: usize) -> &Self {
        for _ in 0..times {
            self.reply(None);
        }
        self
    }

    pub fn unvisited(&self, target: WorldPoint) -> &Self {
        self.targets.lock().push_back(target);
        self
    }

    pub fn calls(&self) -> Vec<PlanCall> {
        self.calls.lock().clone()
    }

    pub fn resets(&self) -> Vec<bool> {
        self.resets.lock().clone()
    }

    fn answer(&self, start: PlanStart, goal: Option<WorldPoint>) -> Option<Vec<Waypoint>> {
        self.calls.lock().push(PlanCall {
            start: start.position(),
            goal,
        });
        let reply = self.replies.lock().pop_front().flatten()?;
        *self.target.lock() = goal.or_else(|| reply.iter().rev().find_map(Waypoint::position));
        Some(reply)
    }
}

impl PathPlanner for MockPlanner {
    fn plan(&self, start: PlanStart, _cloud: &PointCloud) -> Option<Vec<Waypoint>> {
        self.answer(start, None)
    }

    fn plan_to(
        &self,
        start: PlanStart,
        goal: WorldPoint,
        _cloud: &PointCloud,
    ) -> Option<Vec<Waypoint>> {
        self.answer(start, Some(goal))
    }

    fn find_unvisited_target(&self) -> Option<WorldPoint> {
        self.targets.lock().pop_front()
    }

    fn reset(&self, keep_visited: bool) {
        self.resets.lock().push(keep_visited);
    }

    fn current_target(&self) -> Option<WorldPoint> {
        *self.target.lock()
    }

    fn render_planned_path(&self, sink: &mut dyn DrawSink) {
        if let Some(t) = *self.target.lock() {
            sink.draw_point(Point3::new(t.x, 0.0, t.z), Color::GREEN);
        }
    }
}

// ============================================================================
// Backend and persistence
// ============================================================================

#[derive(Default)]
pub struct MockBackend {
    pub running: AtomicBool,
    pub finished: AtomicBool,
    pub finished_polls: AtomicUsize,
}

impl MockBackend {
    /// Backend whose bundle adjustment has already run to completion.
    pub fn converged() -> Self {
        Self {
            running: AtomicBool::new(true),
            finished: AtomicBool::new(true),
            ..Default::default()
        }
    }
}

impl MappingBackend for MockBackend {
    fn is_global_ba_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    fn is_global_ba_finished(&self) -> bool {
        self.finished_polls.fetch_add(1, Ordering::Relaxed);
        self.finished.load(Ordering::Relaxed)
    }
}

#[derive(Default)]
pub struct MockSaver {
    pub saves: AtomicUsize,
}

impl MockSaver {
    pub fn count(&self) -> usize {
        self.saves.load(Ordering::Relaxed)
    }
}

impl MapPersistence for MockSaver {
    fn save_map(&self) -> Result<()> {
        self.saves.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingSink {
    pub points: Vec<(Point3, Color)>,
}

impl DrawSink for RecordingSink {
    fn draw_point(&mut self, point: Point3, color: Color) {
        self.points.push((point, color));
    }
}

// ============================================================================
// Harness
// ============================================================================

/// All mocks, kept so tests can inspect them after the run.
pub struct Harness {
    pub tracker: Arc<MockTracker>,
    pub planner: Arc<MockPlanner>,
    pub backend: Arc<MockBackend>,
    pub saver: Arc<MockSaver>,
}

impl Harness {
    pub fn new(backend: MockBackend) -> Self {
        Self {
            tracker: Arc::new(MockTracker::new(TrackingState::Ok)),
            planner: Arc::new(MockPlanner::new()),
            backend: Arc::new(backend),
            saver: Arc::new(MockSaver::default()),
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            tracker: self.tracker.clone(),
            supplier: Arc::new(EmptySupplier),
            planner: self.planner.clone(),
            backend: self.backend.clone(),
            persistence: self.saver.clone(),
        }
    }
}
