//! 3-D point cloud with the cleaning filters applied before rasterization.
//!
//! Every filter is a no-op on an empty cloud, so a frame that loses all its
//! points in one stage flows through the remaining stages unchanged.

use std::collections::HashMap;

use rstar::RTree;

use crate::core::{Point3, WorldPoint};

/// Unordered set of world points.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PointCloud {
    pub points: Vec<Point3>,
}

/// Point counts after each cleaning stage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FilterStats {
    pub raw: usize,
    pub finite: usize,
    pub voxel: usize,
    pub iqr: usize,
    pub sor: usize,
}

impl PointCloud {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            points: Vec::with_capacity(capacity),
        }
    }

    pub fn from_points(points: Vec<Point3>) -> Self {
        Self { points }
    }

    #[inline]
    pub fn push(&mut self, point: Point3) {
        self.points.push(point);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Point3> {
        self.points.iter()
    }

    /// Ground-plane projection of every point.
    pub fn ground_points(&self) -> impl Iterator<Item = WorldPoint> + '_ {
        self.points.iter().map(Point3::ground)
    }

    /// Drop points with a NaN or infinite coordinate.
    pub fn retain_finite(&mut self) {
        self.points.retain(Point3::is_finite);
    }

    /// Keep one point per `leaf`-sized voxel: the centroid of its members.
    ///
    /// Output order follows the first point seen in each voxel.
    pub fn voxel_downsample(&self, leaf: f32) -> PointCloud {
        if self.is_empty() || !(leaf > 0.0) {
            return self.clone();
        }

        let inv = 1.0 / leaf;
        let mut slots: HashMap<(i64, i64, i64), usize> = HashMap::with_capacity(self.len());
        // (sum_x, sum_y, sum_z, count) per voxel in first-seen order
        let mut sums: Vec<(f64, f64, f64, u32)> = Vec::new();

        for p in &self.points {
            let key = (
                (p.x * inv).floor() as i64,
                (p.y * inv).floor() as i64,
                (p.z * inv).floor() as i64,
            );
            let slot = *slots.entry(key).or_insert_with(|| {
                sums.push((0.0, 0.0, 0.0, 0));
                sums.len() - 1
            });
            let s = &mut sums[slot];
            s.0 += p.x as f64;
            s.1 += p.y as f64;
            s.2 += p.z as f64;
            s.3 += 1;
        }

        let points = sums
            .into_iter()
            .map(|(x, y, z, n)| {
                let n = n as f64;
                Point3::new((x / n) as f32, (y / n) as f32, (z / n) as f32)
            })
            .collect();
        PointCloud { points }
    }

    /// Interquartile screen: keep points inside `[Q1 - k·IQR, Q3 + k·IQR]`
    /// on every axis.
    pub fn iqr_filter(&self, multiplier: f32) -> PointCloud {
        if self.is_empty() {
            return self.clone();
        }

        let mut limits = [(f32::NEG_INFINITY, f32::INFINITY); 3];
        for (axis, limit) in limits.iter_mut().enumerate() {
            let mut values: Vec<f32> = self.points.iter().map(|p| p.axis(axis)).collect();
            values.sort_by(f32::total_cmp);
            let q1 = quantile(&values, 0.25);
            let q3 = quantile(&values, 0.75);
            let iqr = q3 - q1;
            *limit = (q1 - multiplier * iqr, q3 + multiplier * iqr);
        }

        let points = self
            .points
            .iter()
            .filter(|p| {
                limits
                    .iter()
                    .enumerate()
                    .all(|(axis, &(lo, hi))| (lo..=hi).contains(&p.axis(axis)))
            })
            .copied()
            .collect();
        PointCloud { points }
    }

    /// Statistical outlier removal.
    ///
    /// For every point the mean distance to its `neighbors` nearest neighbours
    /// is computed; points whose mean exceeds `μ + std_ratio·σ` over the whole
    /// cloud are removed. Clouds with `neighbors` points or fewer are returned
    /// unchanged.
    pub fn statistical_outlier_removal(&self, neighbors: usize, std_ratio: f32) -> PointCloud {
        if neighbors == 0 || self.len() <= neighbors {
            return self.clone();
        }

        let tree: RTree<[f32; 3]> =
            RTree::bulk_load(self.points.iter().map(|p| p.to_array()).collect());

        let mean_distances: Vec<f32> = self
            .points
            .iter()
            .map(|p| {
                let query = p.to_array();
                // First hit is the point itself (or an exact duplicate, same distance)
                let sum: f32 = tree
                    .nearest_neighbor_iter(&query)
                    .skip(1)
                    .take(neighbors)
                    .map(|q| p.distance_squared(&Point3::new(q[0], q[1], q[2])).sqrt())
                    .sum();
                sum / neighbors as f32
            })
            .collect();

        let n = mean_distances.len() as f64;
        let mean = mean_distances.iter().map(|&d| d as f64).sum::<f64>() / n;
        let variance = mean_distances
            .iter()
            .map(|&d| {
                let diff = d as f64 - mean;
                diff * diff
            })
            .sum::<f64>()
            / (n - 1.0).max(1.0);
        let threshold = (mean + std_ratio as f64 * variance.sqrt()) as f32;

        let points = self
            .points
            .iter()
            .zip(&mean_distances)
            .filter(|&(_, &d)| d <= threshold)
            .map(|(p, _)| *p)
            .collect();
        PointCloud { points }
    }
}

impl FromIterator<Point3> for PointCloud {
    fn from_iter<I: IntoIterator<Item = Point3>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}

/// Linear-interpolated quantile of sorted values.
fn quantile(sorted: &[f32], q: f32) -> f32 {
    match sorted.len() {
        0 => f32::NAN,
        1 => sorted[0],
        n => {
            let pos = q * (n - 1) as f32;
            let lo = pos.floor() as usize;
            let hi = pos.ceil() as usize;
            let frac = pos - lo as f32;
            sorted[lo] + (sorted[hi] - sorted[lo]) * frac
        }
    }
}
