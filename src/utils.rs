//! Shared utility functions

use std::f32::consts::PI;

/// Normalize angle to (-π, π]
#[inline]
pub fn normalize_angle(angle: f32) -> f32 {
    let mut a = angle;
    while a > PI {
        a -= 2.0 * PI;
    }
    while a <= -PI {
        a += 2.0 * PI;
    }
    a
}

/// Squared planar distance between two ground-plane positions.
#[inline]
pub fn distance_squared(ax: f32, az: f32, bx: f32, bz: f32) -> f32 {
    let dx = ax - bx;
    let dz = az - bz;
    dx * dx + dz * dz
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_normalize_angle_range() {
        assert_relative_eq!(normalize_angle(PI), PI);
        assert_relative_eq!(normalize_angle(-PI), PI);
        assert_relative_eq!(normalize_angle(3.0 * PI / 2.0), -PI / 2.0, epsilon = 1e-6);
        assert_relative_eq!(normalize_angle(0.25), 0.25);
    }

    #[test]
    fn test_distance_squared() {
        assert_relative_eq!(distance_squared(0.0, 0.0, 3.0, 4.0), 25.0);
    }
}
