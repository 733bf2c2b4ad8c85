//! Configuration loading for Anveshan
//!
//! All settings are read once at construction and treated as an immutable
//! value afterwards.
//!
//! ## Example TOML
//!
//! ```toml
//! [grid]
//! cell_size = 0.025
//! inflation_radius_cells = 5
//!
//! [depth]
//! height_lower = -0.6   # y grows downward
//! height_upper = 0.6
//!
//! [robot]
//! mode = "oriented"
//! half_length_cells = 4.0
//! half_width_cells = 3.0
//!
//! [exploration]
//! max_plan_failures = 2
//! gba_start_timeout_ms = 30000
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{AnveshanError, Result};

/// Main configuration structure
#[derive(Clone, Debug, Default, Deserialize)]
pub struct AnveshanConfig {
    #[serde(default)]
    pub grid: GridSection,
    #[serde(default)]
    pub depth: DepthSection,
    #[serde(default)]
    pub filter: FilterSection,
    #[serde(default)]
    pub robot: RobotSection,
    #[serde(default)]
    pub replan: ReplanSection,
    #[serde(default)]
    pub exploration: ExplorationSection,
}

/// Obstacle grid geometry
#[derive(Clone, Debug, Deserialize)]
pub struct GridSection {
    /// Grid cell edge length (meters)
    #[serde(default = "default_cell_size")]
    pub cell_size: f32,

    /// Obstacle inflation radius (cells)
    #[serde(default = "default_inflation_radius_cells")]
    pub inflation_radius_cells: u32,

    /// Fixed clearance added around the grid bounds (meters)
    #[serde(default = "default_base_margin")]
    pub base_margin: f32,
}

/// Depth reprojection settings
#[derive(Clone, Debug, Deserialize)]
pub struct DepthSection {
    /// Pixel subsampling step in both directions
    #[serde(default = "default_stride")]
    pub stride: usize,

    /// Depth values at or below this are rejected (meters)
    #[serde(default = "default_min_depth")]
    pub min_depth: f32,

    /// Depth values at or above this are rejected (meters)
    #[serde(default = "default_max_depth")]
    pub max_depth: f32,

    /// Lowest admitted world y (y grows downward)
    #[serde(default = "default_height_lower")]
    pub height_lower: f32,

    /// Highest admitted world y
    #[serde(default = "default_height_upper")]
    pub height_upper: f32,
}

/// Point cloud cleaning settings
#[derive(Clone, Debug, Deserialize)]
pub struct FilterSection {
    /// Voxel edge length used for decimation (meters)
    #[serde(default = "default_voxel_leaf")]
    pub voxel_leaf: f32,

    /// Whisker length of the interquartile screen
    #[serde(default = "default_iqr_multiplier")]
    pub iqr_multiplier: f32,

    /// Neighbour count for statistical outlier removal
    #[serde(default = "default_sor_neighbors")]
    pub sor_neighbors: usize,

    /// Standard deviations above the mean neighbour distance to keep
    #[serde(default = "default_sor_std_ratio")]
    pub sor_std_ratio: f32,

    #[serde(default = "default_enabled")]
    pub enable_voxel: bool,

    #[serde(default = "default_enabled")]
    pub enable_iqr: bool,

    #[serde(default = "default_enabled")]
    pub enable_sor: bool,
}

/// Planning mode of the external planner
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanningMode {
    /// Waypoints are (x, z)
    #[default]
    Planar,
    /// Waypoints are (x, z, yaw) and validated against the robot footprint
    Oriented,
}

/// Robot geometry
#[derive(Clone, Debug, Deserialize)]
pub struct RobotSection {
    #[serde(default)]
    pub mode: PlanningMode,

    /// Footprint half-length along the heading (cells)
    #[serde(default = "default_half_length_cells")]
    pub half_length_cells: f32,

    /// Footprint half-width across the heading (cells)
    #[serde(default = "default_half_width_cells")]
    pub half_width_cells: f32,

    /// Occupied cells under the footprint that make a pose invalid
    #[serde(default = "default_footprint_collision_threshold")]
    pub footprint_collision_threshold: usize,
}

/// Replanning triggers
#[derive(Clone, Debug, Deserialize)]
pub struct ReplanSection {
    /// Squared planar distance to the target that counts as arrival (m²)
    #[serde(default = "default_arrival_distance_sq")]
    pub arrival_distance_sq: f32,

    /// Blocked waypoints that invalidate the current solution
    #[serde(default = "default_path_collision_threshold")]
    pub path_collision_threshold: usize,

    /// Squared distance beyond which path shortening stops scanning (m²)
    #[serde(default = "default_lookahead_distance_sq")]
    pub lookahead_distance_sq: f32,
}

/// State machine timing and retry bounds
#[derive(Clone, Debug, Deserialize)]
pub struct ExplorationSection {
    /// Consecutive planner failures before escalating
    #[serde(default = "default_max_plan_failures")]
    pub max_plan_failures: usize,

    /// Sweep remaining frontiers before returning home
    #[serde(default = "default_enabled")]
    pub enable_sweep: bool,

    /// Consecutive "no frontier" answers that end the sweep
    #[serde(default = "default_max_sweep_misses")]
    pub max_sweep_misses: usize,

    /// Distance to a frontier target that counts as reached (meters)
    #[serde(default = "default_arrival_radius")]
    pub sweep_arrival_radius: f32,

    /// Distance to the origin that counts as home (meters)
    #[serde(default = "default_arrival_radius")]
    pub home_arrival_radius: f32,

    /// Sleep between polls of external signals (ms)
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Sleep at the end of every control cycle (ms)
    #[serde(default = "default_cycle_interval_ms")]
    pub cycle_interval_ms: u64,

    /// Delay after tracking comes up, to accumulate keyframes (ms)
    #[serde(default = "default_warmup_ms")]
    pub warmup_ms: u64,

    /// Give up waiting for tracking after this long (ms); unset waits forever
    #[serde(default)]
    pub tracking_timeout_ms: Option<u64>,

    /// Maximum wait for a global bundle adjustment to start (ms)
    #[serde(default = "default_gba_start_timeout_ms")]
    pub gba_start_timeout_ms: u64,

    /// Maximum wait for a started global bundle adjustment to finish (ms)
    #[serde(default = "default_gba_finish_timeout_ms")]
    pub gba_finish_timeout_ms: u64,

    /// Interval between status log lines (ms)
    #[serde(default = "default_status_interval_ms")]
    pub status_interval_ms: u64,
}

impl Default for GridSection {
    fn default() -> Self {
        Self {
            cell_size: default_cell_size(),
            inflation_radius_cells: default_inflation_radius_cells(),
            base_margin: default_base_margin(),
        }
    }
}

impl Default for DepthSection {
    fn default() -> Self {
        Self {
            stride: default_stride(),
            min_depth: default_min_depth(),
            max_depth: default_max_depth(),
            height_lower: default_height_lower(),
            height_upper: default_height_upper(),
        }
    }
}

impl Default for FilterSection {
    fn default() -> Self {
        Self {
            voxel_leaf: default_voxel_leaf(),
            iqr_multiplier: default_iqr_multiplier(),
            sor_neighbors: default_sor_neighbors(),
            sor_std_ratio: default_sor_std_ratio(),
            enable_voxel: true,
            enable_iqr: true,
            enable_sor: true,
        }
    }
}

impl Default for RobotSection {
    fn default() -> Self {
        Self {
            mode: PlanningMode::default(),
            half_length_cells: default_half_length_cells(),
            half_width_cells: default_half_width_cells(),
            footprint_collision_threshold: default_footprint_collision_threshold(),
        }
    }
}

impl Default for ReplanSection {
    fn default() -> Self {
        Self {
            arrival_distance_sq: default_arrival_distance_sq(),
            path_collision_threshold: default_path_collision_threshold(),
            lookahead_distance_sq: default_lookahead_distance_sq(),
        }
    }
}

impl Default for ExplorationSection {
    fn default() -> Self {
        Self {
            max_plan_failures: default_max_plan_failures(),
            enable_sweep: true,
            max_sweep_misses: default_max_sweep_misses(),
            sweep_arrival_radius: default_arrival_radius(),
            home_arrival_radius: default_arrival_radius(),
            poll_interval_ms: default_poll_interval_ms(),
            cycle_interval_ms: default_cycle_interval_ms(),
            warmup_ms: default_warmup_ms(),
            tracking_timeout_ms: None,
            gba_start_timeout_ms: default_gba_start_timeout_ms(),
            gba_finish_timeout_ms: default_gba_finish_timeout_ms(),
            status_interval_ms: default_status_interval_ms(),
        }
    }
}

impl ExplorationSection {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn cycle_interval(&self) -> Duration {
        Duration::from_millis(self.cycle_interval_ms)
    }

    pub fn warmup(&self) -> Duration {
        Duration::from_millis(self.warmup_ms)
    }

    pub fn tracking_timeout(&self) -> Option<Duration> {
        self.tracking_timeout_ms.map(Duration::from_millis)
    }

    pub fn gba_start_timeout(&self) -> Duration {
        Duration::from_millis(self.gba_start_timeout_ms)
    }

    pub fn gba_finish_timeout(&self) -> Duration {
        Duration::from_millis(self.gba_finish_timeout_ms)
    }

    pub fn status_interval(&self) -> Duration {
        Duration::from_millis(self.status_interval_ms)
    }
}

// Default value functions
fn default_cell_size() -> f32 {
    0.025
}
fn default_inflation_radius_cells() -> u32 {
    5
}
fn default_base_margin() -> f32 {
    0.05
}
fn default_stride() -> usize {
    2
}
fn default_min_depth() -> f32 {
    0.1
}
fn default_max_depth() -> f32 {
    3.0
}
fn default_height_lower() -> f32 {
    -0.6
}
fn default_height_upper() -> f32 {
    0.6
}
fn default_voxel_leaf() -> f32 {
    0.03
}
fn default_iqr_multiplier() -> f32 {
    1.5
}
fn default_sor_neighbors() -> usize {
    10
}
fn default_sor_std_ratio() -> f32 {
    1.0
}
fn default_enabled() -> bool {
    true
}
fn default_half_length_cells() -> f32 {
    4.0
}
fn default_half_width_cells() -> f32 {
    3.0
}
fn default_footprint_collision_threshold() -> usize {
    2
}
fn default_arrival_distance_sq() -> f32 {
    0.36
} // 0.6m
fn default_path_collision_threshold() -> usize {
    2
}
fn default_lookahead_distance_sq() -> f32 {
    25.0
} // 5m
fn default_max_plan_failures() -> usize {
    2
}
fn default_max_sweep_misses() -> usize {
    3
}
fn default_arrival_radius() -> f32 {
    0.3
}
fn default_poll_interval_ms() -> u64 {
    10
}
fn default_cycle_interval_ms() -> u64 {
    5
}
fn default_warmup_ms() -> u64 {
    2000
}
fn default_gba_start_timeout_ms() -> u64 {
    30_000
}
fn default_gba_finish_timeout_ms() -> u64 {
    600_000
}
fn default_status_interval_ms() -> u64 {
    3000
}

impl AnveshanConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AnveshanError::Config(format!("Failed to read config file: {}", e)))?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: AnveshanConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would produce degenerate geometry.
    pub fn validate(&self) -> Result<()> {
        if !(self.grid.cell_size > 0.0) {
            return Err(AnveshanError::Config(format!(
                "grid.cell_size must be positive, got {}",
                self.grid.cell_size
            )));
        }
        if !(self.filter.voxel_leaf > 0.0) {
            return Err(AnveshanError::Config(format!(
                "filter.voxel_leaf must be positive, got {}",
                self.filter.voxel_leaf
            )));
        }
        if self.depth.stride == 0 {
            return Err(AnveshanError::Config("depth.stride must be at least 1".into()));
        }
        if self.depth.min_depth >= self.depth.max_depth {
            return Err(AnveshanError::Config(format!(
                "depth range is empty: ({}, {})",
                self.depth.min_depth, self.depth.max_depth
            )));
        }
        if self.depth.height_lower > self.depth.height_upper {
            return Err(AnveshanError::Config(format!(
                "height band is inverted: [{}, {}]",
                self.depth.height_lower, self.depth.height_upper
            )));
        }
        if self.robot.half_length_cells < 0.0 || self.robot.half_width_cells < 0.0 {
            return Err(AnveshanError::Config(
                "robot footprint half extents must not be negative".into(),
            ));
        }
        if self.exploration.max_plan_failures == 0 {
            return Err(AnveshanError::Config(
                "exploration.max_plan_failures must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Clearance added around the grid bounds (meters).
    pub fn bounds_margin(&self) -> f32 {
        let mut margin =
            self.grid.base_margin + self.grid.inflation_radius_cells as f32 * self.grid.cell_size;
        if self.robot.mode == PlanningMode::Oriented {
            let half_diagonal = self
                .robot
                .half_length_cells
                .hypot(self.robot.half_width_cells);
            margin += half_diagonal * self.grid.cell_size;
        }
        margin
    }
}
