//! End-to-end runs of the exploration state machine against mock
//! collaborators.

mod common;

use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use anveshan::{
    Color, ExplorationState, Explorer, TrackingState, Waypoint, WorldPoint, spawn_exploration,
};
use common::{
    Harness, MockBackend, RecordingSink, blank_depth, fast_config, init_tracing, pose_at,
    wall_depth,
};

fn position_of(path: &[Waypoint], wanted: Waypoint) -> Option<usize> {
    path.iter().position(|w| *w == wanted)
}

#[test]
fn four_planning_failures_end_in_a_single_save() {
    init_tracing();
    let mut config = fast_config();
    config.exploration.max_plan_failures = 4;

    let harness = Harness::new(MockBackend::default());
    let mut explorer = Explorer::new(&config, harness.collaborators());
    let (pose, center) = pose_at(1.0, 1.0);
    explorer.push_frame(blank_depth(), pose, center);

    let report = explorer.run();

    assert_eq!(report.final_state, ExplorationState::Done);
    assert_eq!(harness.saver.count(), 1);
    assert!(report.map_saved);

    let calls = harness.planner.calls();
    // Four exploration attempts without a goal, then four attempts home
    assert!(calls.len() >= 4);
    assert!(calls[..4].iter().all(|c| c.goal.is_none()));
    assert!(calls[4..].iter().all(|c| c.goal == Some(WorldPoint::ZERO)));
    assert_eq!(report.plan_failures, calls.len());

    // No way home: stop in place
    assert!(report.emergency);
    assert_eq!(explorer.path(), vec![Waypoint::Stop]);
}

#[test]
fn return_home_publishes_rotate_then_stop() {
    init_tracing();
    let mut config = fast_config();
    config.exploration.enable_sweep = false;

    let harness = Harness::new(MockBackend::converged());
    harness
        .planner
        .fail(2)
        .reply(Some(vec![Waypoint::planar(0.5, 0.0), Waypoint::planar(0.0, 0.0)]));

    let mut explorer = Explorer::new(&config, harness.collaborators());
    let (pose, center) = pose_at(0.1, 0.0);
    explorer.push_frame(blank_depth(), pose, center);

    let report = explorer.run();
    assert_eq!(report.final_state, ExplorationState::Done);
    assert!(report.gba_observed);
    assert!(!report.emergency);
    assert_eq!(harness.saver.count(), 1);

    let path = explorer.path();
    let rotate = position_of(&path, Waypoint::RotateInPlace).unwrap();
    let stop = position_of(&path, Waypoint::Stop).unwrap();
    assert!(rotate < stop);
    assert_eq!(path.last(), Some(&Waypoint::Stop));
    assert_eq!(
        path.iter().filter(|w| **w == Waypoint::RotateInPlace).count(),
        1
    );
}

#[test]
fn missing_bundle_adjustment_skips_finish_wait() {
    init_tracing();
    let mut config = fast_config();
    config.exploration.enable_sweep = false;
    config.exploration.gba_start_timeout_ms = 30;

    let harness = Harness::new(MockBackend::default());
    harness
        .planner
        .fail(2)
        .reply(Some(vec![Waypoint::planar(0.0, 0.0)]));

    let mut explorer = Explorer::new(&config, harness.collaborators());
    let (pose, center) = pose_at(0.0, 0.0);
    explorer.push_frame(blank_depth(), pose, center);

    let started = Instant::now();
    let report = explorer.run();

    assert!(started.elapsed() >= Duration::from_millis(30));
    assert_eq!(report.final_state, ExplorationState::Done);
    assert!(!report.gba_observed);
    assert_eq!(harness.backend.finished_polls.load(Ordering::Relaxed), 0);
    assert_eq!(harness.saver.count(), 1);

    let path = explorer.path();
    assert!(
        position_of(&path, Waypoint::RotateInPlace).unwrap()
            < position_of(&path, Waypoint::Stop).unwrap()
    );
}

#[test]
fn sweep_visits_targets_then_returns() {
    init_tracing();
    let config = fast_config();

    let target = WorldPoint::new(1.0, 0.0);
    let harness = Harness::new(MockBackend::converged());
    harness
        .planner
        .fail(2)
        .reply(Some(vec![Waypoint::planar(0.5, 0.0), Waypoint::planar(1.0, 0.0)]))
        .fail(2)
        .unvisited(target);

    let mut explorer = Explorer::new(&config, harness.collaborators());
    // Already standing on the sweep target
    let (pose, center) = pose_at(1.0, 0.1);
    explorer.push_frame(blank_depth(), pose, center);

    let report = explorer.run();

    assert_eq!(report.final_state, ExplorationState::Done);
    assert_eq!(report.frontiers_visited, 1);
    assert_eq!(harness.planner.resets(), vec![true]);
    assert_eq!(harness.saver.count(), 1);

    let goals: Vec<_> = harness.planner.calls().iter().map(|c| c.goal).collect();
    assert_eq!(
        goals,
        vec![None, None, Some(target), Some(WorldPoint::ZERO), Some(WorldPoint::ZERO)]
    );
}

#[test]
fn arrival_trigger_near_home_counts_as_home() {
    init_tracing();
    let mut config = fast_config();
    config.exploration.enable_sweep = false;

    let harness = Harness::new(MockBackend::default());
    harness
        .planner
        .fail(2)
        .reply(Some(vec![Waypoint::planar(0.45, 0.0), Waypoint::planar(0.0, 0.0)]));

    let mut explorer = Explorer::new(&config, harness.collaborators());
    // Outside the home radius but inside the arrival trigger
    let (pose, center) = pose_at(0.45, 0.0);
    explorer.push_frame(blank_depth(), pose, center);

    let report = explorer.run();
    assert_eq!(report.final_state, ExplorationState::Done);
    assert!(!report.emergency);
    assert_eq!(report.plans, 1);
    assert_eq!(report.replans, 0);
    assert_eq!(harness.saver.count(), 1);

    let goals: Vec<_> = harness.planner.calls().iter().map(|c| c.goal).collect();
    assert_eq!(goals, vec![None, None, Some(WorldPoint::ZERO)]);

    let path = explorer.path();
    let rotate = position_of(&path, Waypoint::RotateInPlace).unwrap();
    let stop = position_of(&path, Waypoint::Stop).unwrap();
    assert!(rotate < stop);
}

#[test]
fn arrival_trigger_near_sweep_target_counts_as_visit() {
    init_tracing();
    let config = fast_config();

    let target = WorldPoint::new(1.0, 0.0);
    let harness = Harness::new(MockBackend::default());
    harness
        .planner
        .fail(2)
        .reply(Some(vec![Waypoint::planar(1.2, 0.0), Waypoint::planar(1.0, 0.0)]))
        .unvisited(target);

    let mut explorer = Explorer::new(&config, harness.collaborators());
    let (pose, center) = pose_at(1.45, 0.0);
    explorer.push_frame(blank_depth(), pose, center);

    let report = explorer.run();
    assert_eq!(report.final_state, ExplorationState::Done);
    assert_eq!(report.frontiers_visited, 1);
    assert_eq!(report.replans, 0);
    assert_eq!(harness.planner.resets(), vec![true]);

    let goals: Vec<_> = harness.planner.calls().iter().map(|c| c.goal).collect();
    assert_eq!(
        goals,
        vec![None, None, Some(target), Some(WorldPoint::ZERO), Some(WorldPoint::ZERO)]
    );
}

#[test]
fn arrival_at_planner_target_triggers_replan() {
    init_tracing();
    let config = fast_config();

    let harness = Harness::new(MockBackend::default());
    harness
        .planner
        .reply(Some(vec![Waypoint::planar(0.2, 0.0)]))
        .reply(Some(vec![Waypoint::planar(2.0, 0.0)]));

    let mut explorer = Explorer::new(&config, harness.collaborators());
    let (pose, center) = pose_at(0.0, 0.0);
    explorer.push_frame(blank_depth(), pose, center);

    assert_eq!(explorer.step(), ExplorationState::Explore); // tracking ok
    assert_eq!(explorer.step(), ExplorationState::Explore); // first plan
    assert_eq!(explorer.step(), ExplorationState::Replan); // target reached
    assert_eq!(explorer.step(), ExplorationState::Explore); // new plan

    let report = explorer.report();
    assert_eq!(report.plans, 2);
    assert_eq!(report.replans, 1);
    assert_eq!(explorer.path(), vec![Waypoint::planar(2.0, 0.0)]);

    // Far from the new target with a free grid: keep following
    assert_eq!(explorer.step(), ExplorationState::Explore);
    assert_eq!(explorer.report().replans, 1);
}

#[test]
fn blocked_path_triggers_replan_and_fills_grid() {
    init_tracing();
    let mut config = fast_config();
    config.filter.enable_iqr = false;
    config.filter.enable_sor = false;

    let harness = Harness::new(MockBackend::default());
    harness.planner.reply(Some(vec![
        Waypoint::planar(0.0, 0.5),
        Waypoint::planar(0.0, 1.0),
        Waypoint::planar(-0.5, 1.0),
        Waypoint::planar(0.0, 3.0),
    ]));

    let mut explorer = Explorer::new(&config, harness.collaborators());
    let (pose, center) = pose_at(0.0, 0.0);
    explorer.push_frame(wall_depth(), pose, center);

    explorer.step();
    explorer.step();
    assert_eq!(explorer.step(), ExplorationState::Replan);

    let mut sink = RecordingSink::default();
    explorer.render_obstacles(&mut sink);
    let red = sink.points.iter().filter(|(_, c)| *c == Color::RED).count();
    assert!(red > 0);
    // Planner path drawn after the obstacles
    assert_eq!(sink.points.last().map(|(_, c)| *c), Some(Color::GREEN));

    // Replanning keeps failing: escalate to the sweep
    assert_eq!(explorer.step(), ExplorationState::Replan);
    assert_eq!(explorer.step(), ExplorationState::Sweep);
}

#[test]
fn spawned_thread_runs_to_completion() {
    init_tracing();
    let mut config = fast_config();
    config.exploration.enable_sweep = false;

    let harness = Harness::new(MockBackend::default());
    let thread = spawn_exploration(&config, harness.collaborators()).unwrap();
    let (pose, center) = pose_at(0.5, 0.5);
    thread.handle.push_frame(blank_depth(), pose, center);

    let report = thread.join().unwrap();
    assert_eq!(report.final_state, ExplorationState::Done);
    assert_eq!(harness.saver.count(), 1);
}

#[test]
fn spawned_thread_stops_on_shutdown() {
    init_tracing();
    let config = fast_config();

    let harness = Harness::new(MockBackend::default());
    harness.tracker.set_state(TrackingState::Uninitialized);

    let thread = spawn_exploration(&config, harness.collaborators()).unwrap();
    std::thread::sleep(Duration::from_millis(20));
    assert!(!thread.is_finished());

    let report = thread.stop().unwrap();
    assert_eq!(report.final_state, ExplorationState::WaitForTracking);
    assert_eq!(harness.saver.count(), 0);
}
