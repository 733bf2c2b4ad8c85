//! Exploration state machine.
//!
//! Drives the whole session: wait for tracking, explore planner-chosen
//! frontiers, sweep leftover targets, return to the origin, wait for global
//! bundle adjustment and save the map.
//!
//! ```text
//! WaitForTracking -> Explore <-> Replan -> Sweep -> ReturnHome -> Save -> Done
//! ```
//!
//! Every wait is polled with short sleeps. Planner failures are retried up to
//! `max_plan_failures` before the machine escalates; signal waits carry
//! timeouts with a logged fallback.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use nalgebra::{Matrix4, Vector3};

use crate::config::{AnveshanConfig, ExplorationSection};
use crate::core::{Point3, Waypoint, WorldPoint};
use crate::planning::{
    Color, DrawSink, MapPersistence, MappingBackend, PathPlanner, PlanStart, PlannerFacade,
    PointCloudSupplier, Tracker, TrackingState,
};
use crate::sensing::{DepthImage, FrameCache};
use crate::shared::{SharedGrid, SharedPath, ShutdownFlag};
use crate::utils::normalize_angle;

use super::replan::{ReplanDecision, ReplanPolicy};
use super::state::ExplorationState;

/// Height at which occupied cells are drawn.
const OBSTACLE_DRAW_HEIGHT: f32 = 5.0;

/// External systems the explorer drives.
#[derive(Clone)]
pub struct Collaborators {
    pub tracker: Arc<dyn Tracker>,
    pub supplier: Arc<dyn PointCloudSupplier>,
    pub planner: Arc<dyn PathPlanner>,
    pub backend: Arc<dyn MappingBackend>,
    pub persistence: Arc<dyn MapPersistence>,
}

/// Summary returned when the machine stops.
#[derive(Clone, Debug, PartialEq)]
pub struct ExplorationReport {
    /// Successful plans (initial and replans)
    pub plans: usize,
    /// Entries into `Replan`
    pub replans: usize,
    /// Failed planner calls
    pub plan_failures: usize,
    /// Sweep targets reached
    pub frontiers_visited: usize,
    /// Whether global bundle adjustment was seen starting after the return
    pub gba_observed: bool,
    /// Whether the map was saved successfully
    pub map_saved: bool,
    /// Whether the return home was cut short (no path home, or no tracking)
    pub emergency: bool,
    pub final_state: ExplorationState,
}

/// Cheap handle to the explorer's shared state for other threads.
#[derive(Clone)]
pub struct ExplorerHandle {
    frames: Arc<FrameCache>,
    grid: Arc<SharedGrid>,
    path: Arc<SharedPath>,
    planner: PlannerFacade,
    shutdown: ShutdownFlag,
}

impl ExplorerHandle {
    /// Hand the latest frame to the explorer (tracker thread).
    pub fn push_frame(
        &self,
        depth: DepthImage,
        camera_to_world: Matrix4<f32>,
        camera_center: Vector3<f32>,
    ) {
        self.frames.push_frame(depth, camera_to_world, camera_center);
    }

    /// Current solution path.
    pub fn path(&self) -> Vec<Waypoint> {
        self.path.snapshot()
    }

    /// Draw occupied cells, then the planner's current path.
    pub fn render_obstacles(&self, sink: &mut dyn DrawSink) {
        let cells = self
            .grid
            .with_grid(|grid| {
                grid.occupied_cells()
                    .map(|c| grid.grid_to_world(c))
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        for p in cells {
            sink.draw_point(Point3::new(p.x, OBSTACLE_DRAW_HEIGHT, p.z), Color::RED);
        }
        self.planner.render_planned_path(sink);
    }

    /// Ask the explorer to stop at the next step.
    pub fn shutdown(&self) {
        self.shutdown.signal();
    }

    pub fn shutdown_flag(&self) -> ShutdownFlag {
        self.shutdown.clone()
    }
}

/// Progress of the return to the origin.
#[derive(Clone, Copy, Debug, PartialEq)]
enum HomeStage {
    Plan,
    Follow,
    AwaitGbaStart { since: Instant },
    AwaitGbaFinish { since: Instant },
}

/// Exploration state machine.
pub struct Explorer {
    config: ExplorationSection,
    lookahead_sq: f32,

    tracker: Arc<dyn Tracker>,
    backend: Arc<dyn MappingBackend>,
    persistence: Arc<dyn MapPersistence>,
    planner: PlannerFacade,
    policy: ReplanPolicy,

    frames: Arc<FrameCache>,
    grid: Arc<SharedGrid>,
    path: Arc<SharedPath>,
    shutdown: ShutdownFlag,

    state: ExplorationState,
    /// State to continue in after a successful replan
    resume: ExplorationState,
    /// Goal of the active path; `None` lets the planner choose
    goal: Option<WorldPoint>,
    following: bool,
    failures: usize,
    sweep_misses: usize,
    home: HomeStage,
    tracking_ok_since: Option<Instant>,
    waiting_since: Instant,
    last_warning: Instant,

    plans: usize,
    replans: usize,
    total_failures: usize,
    frontiers_visited: usize,
    gba_observed: bool,
    map_saved: bool,
    emergency: bool,
}

impl Explorer {
    pub fn new(config: &AnveshanConfig, collaborators: Collaborators) -> Self {
        let policy = ReplanPolicy::new(config);
        let planner = PlannerFacade::new(
            collaborators.planner,
            collaborators.supplier,
            policy.validator().clone(),
        );
        let now = Instant::now();

        Self {
            config: config.exploration.clone(),
            lookahead_sq: config.replan.lookahead_distance_sq,
            tracker: collaborators.tracker,
            backend: collaborators.backend,
            persistence: collaborators.persistence,
            planner,
            policy,
            frames: Arc::new(FrameCache::new()),
            grid: Arc::new(SharedGrid::new()),
            path: Arc::new(SharedPath::new()),
            shutdown: ShutdownFlag::new(),
            state: ExplorationState::WaitForTracking,
            resume: ExplorationState::Explore,
            goal: None,
            following: false,
            failures: 0,
            sweep_misses: 0,
            home: HomeStage::Plan,
            tracking_ok_since: None,
            waiting_since: now,
            last_warning: now,
            plans: 0,
            replans: 0,
            total_failures: 0,
            frontiers_visited: 0,
            gba_observed: false,
            map_saved: false,
            emergency: false,
        }
    }

    pub fn handle(&self) -> ExplorerHandle {
        ExplorerHandle {
            frames: Arc::clone(&self.frames),
            grid: Arc::clone(&self.grid),
            path: Arc::clone(&self.path),
            planner: self.planner.clone(),
            shutdown: self.shutdown.clone(),
        }
    }

    #[inline]
    pub fn state(&self) -> ExplorationState {
        self.state
    }

    /// Current solution path.
    pub fn path(&self) -> Vec<Waypoint> {
        self.handle().path()
    }

    pub fn push_frame(
        &self,
        depth: DepthImage,
        camera_to_world: Matrix4<f32>,
        camera_center: Vector3<f32>,
    ) {
        self.handle().push_frame(depth, camera_to_world, camera_center);
    }

    pub fn render_obstacles(&self, sink: &mut dyn DrawSink) {
        self.handle().render_obstacles(sink);
    }

    pub fn report(&self) -> ExplorationReport {
        ExplorationReport {
            plans: self.plans,
            replans: self.replans,
            plan_failures: self.total_failures,
            frontiers_visited: self.frontiers_visited,
            gba_observed: self.gba_observed,
            map_saved: self.map_saved,
            emergency: self.emergency,
            final_state: self.state,
        }
    }

    /// Run until `Done` or until shutdown is signaled.
    pub fn run(&mut self) -> ExplorationReport {
        tracing::info!("Exploration started");
        let mut last_status = Instant::now();

        while !self.state.is_terminal() {
            if self.shutdown.is_signaled() {
                tracing::info!("Exploration shutting down in {}", self.state);
                break;
            }

            self.step();

            if last_status.elapsed() >= self.config.status_interval() {
                self.log_status();
                last_status = Instant::now();
            }
        }

        let report = self.report();
        tracing::info!(
            "Exploration finished: state={}, plans={}, replans={}, frontiers={}, saved={}",
            report.final_state,
            report.plans,
            report.replans,
            report.frontiers_visited,
            report.map_saved
        );
        report
    }

    /// Run one iteration of the current state.
    pub fn step(&mut self) -> ExplorationState {
        match self.state {
            ExplorationState::WaitForTracking => self.step_wait_for_tracking(),
            ExplorationState::Explore => {
                if self.following {
                    self.step_follow_explore();
                } else {
                    self.step_plan_explore();
                }
            }
            ExplorationState::Replan => self.step_replan(),
            ExplorationState::Sweep => self.step_sweep(),
            ExplorationState::ReturnHome => self.step_return_home(),
            ExplorationState::Save => self.step_save(),
            ExplorationState::Done => {}
        }
        self.state
    }

    // ========================================================================
    // States
    // ========================================================================

    fn step_wait_for_tracking(&mut self) {
        if self.tracker.state() == TrackingState::Ok {
            let since = *self.tracking_ok_since.get_or_insert_with(|| {
                tracing::info!("Tracking OK, accumulating keyframes");
                Instant::now()
            });
            if since.elapsed() >= self.config.warmup() {
                tracing::info!("Start building map automatically");
                self.transition(ExplorationState::Explore);
            } else {
                self.pause(self.config.poll_interval());
            }
            return;
        }

        self.tracking_ok_since = None;
        let waited = self.waiting_since.elapsed();
        if let Some(timeout) = self.config.tracking_timeout()
            && waited >= timeout
        {
            tracing::warn!(
                "Tracking not ready after {:.1}s, returning home",
                waited.as_secs_f32()
            );
            self.emergency = true;
            self.transition(ExplorationState::ReturnHome);
            return;
        }
        if self.last_warning.elapsed() >= self.config.status_interval() {
            tracing::warn!(
                "Still waiting for tracking ({:.1}s)",
                waited.as_secs_f32()
            );
            self.last_warning = Instant::now();
        }
        self.pause(self.config.poll_interval());
    }

    fn step_plan_explore(&mut self) {
        let Some(start) = self.plan_start() else {
            self.pause(self.config.poll_interval());
            return;
        };

        if let Some(path) = self.planner.plan(start, None) {
            self.publish(path);
            self.failures = 0;
            self.following = true;
        } else if self.record_failure() {
            self.escalate_from_explore();
        }
    }

    fn step_follow_explore(&mut self) {
        let target = self.planner.current_target();
        if self.evaluate(target).requires_replan() {
            self.begin_replan(ExplorationState::Explore);
        }
    }

    fn step_replan(&mut self) {
        let Some(start) = self.plan_start() else {
            self.pause(self.config.poll_interval());
            return;
        };

        if let Some(path) = self.planner.plan(start, self.goal) {
            self.publish(path);
            self.failures = 0;
            self.following = true;
            self.state = self.resume;
            return;
        }
        if !self.record_failure() {
            return;
        }

        match self.resume {
            ExplorationState::Sweep => {
                tracing::warn!("Giving up on sweep target {:?}", self.goal);
                self.next_sweep_target();
                self.state = ExplorationState::Sweep;
            }
            ExplorationState::ReturnHome => self.abort_return_home(),
            _ => self.escalate_from_explore(),
        }
    }

    fn step_sweep(&mut self) {
        let Some(goal) = self.goal else {
            match self.planner.find_unvisited_target() {
                Some(target) => {
                    tracing::info!("Sweeping to ({:.2}, {:.2})", target.x, target.z);
                    self.sweep_misses = 0;
                    self.goal = Some(target);
                }
                None => {
                    self.sweep_misses += 1;
                    tracing::debug!(
                        "No unvisited target ({}/{})",
                        self.sweep_misses,
                        self.config.max_sweep_misses
                    );
                    if self.sweep_misses >= self.config.max_sweep_misses {
                        tracing::info!("No unvisited area left");
                        self.transition(ExplorationState::ReturnHome);
                    } else {
                        self.pause(self.config.poll_interval());
                    }
                }
            }
            return;
        };

        if !self.following {
            let Some(start) = self.plan_start() else {
                self.pause(self.config.poll_interval());
                return;
            };
            if let Some(path) = self.planner.plan(start, Some(goal)) {
                self.publish(path);
                self.failures = 0;
                self.following = true;
            } else if self.record_failure() {
                tracing::warn!("Cannot reach sweep target ({:.2}, {:.2})", goal.x, goal.z);
                self.next_sweep_target();
            }
            return;
        }

        if self.within(goal, self.config.sweep_arrival_radius) {
            self.reach_sweep_target(goal);
            return;
        }
        match self.evaluate(Some(goal)) {
            ReplanDecision::Arrived => self.reach_sweep_target(goal),
            decision if decision.requires_replan() => {
                self.begin_replan(ExplorationState::Sweep)
            }
            _ => {}
        }
    }

    fn step_return_home(&mut self) {
        match self.home {
            HomeStage::Plan => {
                let Some(start) = self.plan_start() else {
                    // Only reachable without any frame after a tracking timeout
                    if self.emergency && self.record_failure() {
                        self.abort_return_home();
                    } else {
                        self.pause(self.config.poll_interval());
                    }
                    return;
                };
                if let Some(path) = self.planner.plan(start, Some(WorldPoint::ZERO)) {
                    tracing::info!("Going back to starting position");
                    self.publish(path);
                    self.failures = 0;
                    self.following = true;
                    self.home = HomeStage::Follow;
                } else if self.record_failure() {
                    self.abort_return_home();
                }
            }
            HomeStage::Follow => {
                if self.within(WorldPoint::ZERO, self.config.home_arrival_radius) {
                    self.arrive_home();
                    return;
                }
                match self.evaluate(Some(WorldPoint::ZERO)) {
                    ReplanDecision::Arrived => self.arrive_home(),
                    decision if decision.requires_replan() => {
                        self.begin_replan(ExplorationState::ReturnHome)
                    }
                    _ => {}
                }
            }
            HomeStage::AwaitGbaStart { since } => {
                if self.backend.is_global_ba_running() {
                    tracing::info!("Global bundle adjustment started");
                    self.gba_observed = true;
                    self.path.push(Waypoint::Stop);
                    self.home = HomeStage::AwaitGbaFinish {
                        since: Instant::now(),
                    };
                } else if since.elapsed() >= self.config.gba_start_timeout() {
                    tracing::warn!(
                        "Global bundle adjustment not started after {:.1}s, saving without it",
                        since.elapsed().as_secs_f32()
                    );
                    self.path.push(Waypoint::Stop);
                    self.transition(ExplorationState::Save);
                } else {
                    self.pause(self.config.poll_interval());
                }
            }
            HomeStage::AwaitGbaFinish { since } => {
                if self.backend.is_global_ba_finished() {
                    tracing::info!("Global bundle adjustment finished");
                    self.transition(ExplorationState::Save);
                } else if since.elapsed() >= self.config.gba_finish_timeout() {
                    tracing::warn!(
                        "Global bundle adjustment still running after {:.1}s, saving anyway",
                        since.elapsed().as_secs_f32()
                    );
                    self.transition(ExplorationState::Save);
                } else {
                    self.pause(self.config.poll_interval());
                }
            }
        }
    }

    fn step_save(&mut self) {
        tracing::info!("Saving the map");
        match self.persistence.save_map() {
            Ok(()) => self.map_saved = true,
            Err(e) => tracing::error!("Failed to save map: {}", e),
        }
        self.transition(ExplorationState::Done);
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn transition(&mut self, next: ExplorationState) {
        tracing::info!("State {} -> {}", self.state, next);
        self.state = next;
        self.following = false;
        self.failures = 0;

        match next {
            ExplorationState::Explore => {
                self.goal = None;
            }
            ExplorationState::Sweep => {
                self.goal = None;
                self.sweep_misses = 0;
            }
            ExplorationState::ReturnHome => {
                self.grid.clear();
                self.goal = Some(WorldPoint::ZERO);
                self.home = HomeStage::Plan;
            }
            _ => {}
        }
    }

    /// Shorten the path and evaluate the replan triggers for `target`.
    fn evaluate(&mut self, target: Option<WorldPoint>) -> ReplanDecision {
        if let Some(center) = self.frames.camera_center() {
            let dropped = self.path.shorten(center, self.lookahead_sq);
            if dropped > 0 {
                tracing::trace!("Dropped {} passed waypoints", dropped);
            }
        }

        let lookup = self.tracker.ray_lookup();
        let solution = self.path.snapshot();
        let decision = self.policy.needs_replan(
            &self.frames,
            lookup.as_deref(),
            &solution,
            target,
            &self.grid,
        );

        match decision {
            ReplanDecision::NotReady => self.pause(self.config.poll_interval()),
            ReplanDecision::Clear => self.pause(self.config.cycle_interval()),
            _ => tracing::debug!("Replan trigger: {:?}", decision),
        }
        decision
    }

    fn begin_replan(&mut self, resume: ExplorationState) {
        tracing::debug!("State {} -> {}", self.state, ExplorationState::Replan);
        self.replans += 1;
        self.resume = resume;
        self.following = false;
        self.failures = 0;
        self.state = ExplorationState::Replan;
    }

    /// Count a planner failure; `true` once the retry bound is reached.
    fn record_failure(&mut self) -> bool {
        self.failures += 1;
        self.total_failures += 1;
        tracing::warn!(
            "Planning failed ({}/{}) in {}",
            self.failures,
            self.config.max_plan_failures,
            self.state
        );
        self.failures >= self.config.max_plan_failures
    }

    fn escalate_from_explore(&mut self) {
        if self.config.enable_sweep {
            self.transition(ExplorationState::Sweep);
        } else {
            self.transition(ExplorationState::ReturnHome);
        }
    }

    fn reach_sweep_target(&mut self, goal: WorldPoint) {
        tracing::info!("Reached sweep target ({:.2}, {:.2})", goal.x, goal.z);
        self.frontiers_visited += 1;
        self.next_sweep_target();
    }

    /// Publish the loop-closure rotation and start waiting for bundle
    /// adjustment.
    fn arrive_home(&mut self) {
        tracing::info!("Back at starting position, rotating for loop closure");
        self.path.push(Waypoint::RotateInPlace);
        self.home = HomeStage::AwaitGbaStart {
            since: Instant::now(),
        };
    }

    fn next_sweep_target(&mut self) {
        self.planner.reset(true);
        self.goal = None;
        self.following = false;
        self.failures = 0;
    }

    /// No way home: stop where we are and save.
    fn abort_return_home(&mut self) {
        tracing::warn!("Cannot go back to starting position, stopping and saving");
        self.emergency = true;
        self.path.replace(vec![Waypoint::Stop]);
        self.transition(ExplorationState::Save);
    }

    fn publish(&mut self, path: Vec<Waypoint>) {
        self.plans += 1;
        self.path.replace(path);
    }

    fn within(&self, target: WorldPoint, radius: f32) -> bool {
        self.frames
            .camera_center()
            .is_some_and(|c| c.distance(&target) <= radius)
    }

    /// Planning start from the latest pose. Yaw is the camera heading in the
    /// ground plane.
    fn plan_start(&self) -> Option<PlanStart> {
        let snapshot = self.frames.snapshot()?;
        let center = snapshot.ground_position();
        let forward_x = snapshot.camera_to_world[(0, 2)];
        let forward_z = snapshot.camera_to_world[(2, 2)];
        let yaw = normalize_angle(forward_z.atan2(forward_x));
        Some(PlanStart::new(center.x, center.z, yaw))
    }

    fn pause(&self, duration: Duration) {
        if !duration.is_zero() {
            thread::sleep(duration);
        }
    }

    fn log_status(&self) {
        let pose = self
            .frames
            .camera_center()
            .map(|c| format!("({:.2}, {:.2})", c.x, c.z))
            .unwrap_or_else(|| "unknown".into());
        tracing::info!(
            "Exploring: state={}, pose={}, path={}, plans={}, replans={}, failures={}",
            self.state,
            pose,
            self.path.len(),
            self.plans,
            self.replans,
            self.total_failures
        );
    }
}
