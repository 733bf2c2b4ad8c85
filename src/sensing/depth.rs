//! Depth images and per-pixel ray directions.

/// Row-major depth image in meters.
///
/// Invalid pixels are expected to be zero, negative or non-finite.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DepthImage {
    width: usize,
    height: usize,
    data: Vec<f32>,
}

impl DepthImage {
    /// Wrap raw depth values. Returns `None` if `data` does not match the
    /// declared dimensions.
    pub fn new(width: usize, height: usize, data: Vec<f32>) -> Option<Self> {
        if data.len() != width * height {
            return None;
        }
        Some(Self {
            width,
            height,
            data,
        })
    }

    /// Image of the given size filled with zeros (no valid depth).
    pub fn zeros(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0.0; width * height],
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        if row < self.height && col < self.width {
            Some(self.data[row * self.width + col])
        } else {
            None
        }
    }

    /// Set one pixel; out-of-range writes are ignored.
    pub fn set(&mut self, row: usize, col: usize, depth: f32) {
        if row < self.height && col < self.width {
            self.data[row * self.width + col] = depth;
        }
    }

    /// One image row.
    #[inline]
    pub fn row(&self, row: usize) -> &[f32] {
        &self.data[row * self.width..(row + 1) * self.width]
    }
}

/// Normalized ray directions of the camera, one entry per column (x) and
/// one per row (y). A pixel `(r, c)` at depth `d` reprojects to
/// `(x[c]·d, y[r]·d, d)` in the camera frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RayLookup {
    xs: Vec<f32>,
    ys: Vec<f32>,
}

impl RayLookup {
    /// Build from explicit per-column and per-row tables.
    pub fn new(xs: Vec<f32>, ys: Vec<f32>) -> Self {
        Self { xs, ys }
    }

    /// Build from pinhole intrinsics.
    pub fn from_intrinsics(fx: f32, fy: f32, cx: f32, cy: f32, width: usize, height: usize) -> Self {
        let xs = (0..width).map(|c| (c as f32 - cx) / fx).collect();
        let ys = (0..height).map(|r| (r as f32 - cy) / fy).collect();
        Self { xs, ys }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.xs.len()
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.ys.len()
    }

    /// True when the table can reproject every pixel of `image`.
    #[inline]
    pub fn covers(&self, image: &DepthImage) -> bool {
        self.xs.len() >= image.width() && self.ys.len() >= image.height()
    }

    #[inline]
    pub fn ray_x(&self, col: usize) -> f32 {
        self.xs[col]
    }

    #[inline]
    pub fn ray_y(&self, row: usize) -> f32 {
        self.ys[row]
    }
}
