//! Dense scalar grids used for heights and spawn eligibility.
//!
//! Samples are stored row-major (`y * width + x`). Row `y` runs along the world Z axis,
//! column `x` along world X, and cell `(0, 0)` sits at the terrain origin.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A square or rectangular grid of `f32` samples.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct ScalarField {
    width: usize,
    height: usize,
    data: Vec<f32>,
}

/// Normalized terrain heights in `[0, 1]`.
pub type Heightfield = ScalarField;

/// Per-cell spawn probabilities in `[0, 1]`.
pub type SpawnEligibilityField = ScalarField;

impl ScalarField {
    /// Create a zero-filled field.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0.0; width * height],
        }
    }

    /// Create a field by evaluating `f(x, y)` for every cell.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> f32) -> Self {
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    #[inline]
    fn index(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.width && y < self.height, "cell out of bounds");
        y * self.width + x
    }

    /// Value at `(x, y)`.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[self.index(x, y)]
    }

    /// Value at `(x, y)`, or `None` outside the grid.
    pub fn try_get(&self, x: usize, y: usize) -> Option<f32> {
        (x < self.width && y < self.height).then(|| self.data[y * self.width + x])
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: f32) {
        let i = self.index(x, y);
        self.data[i] = value;
    }

    /// Normalized coordinate of a cell, `x / (width - 1)`. Single-cell axes map to 0.
    #[inline]
    pub fn cell_uv(&self, x: usize, y: usize) -> (f32, f32) {
        (axis_uv(x, self.width), axis_uv(y, self.height))
    }

    /// Smallest and largest sample, `None` for an empty field.
    pub fn min_max(&self) -> Option<(f32, f32)> {
        let mut iter = self.data.iter().copied();
        let first = iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
    }

    /// Apply `f` to every sample in place.
    pub fn map_in_place(&mut self, mut f: impl FnMut(f32) -> f32) {
        for v in &mut self.data {
            *v = f(*v);
        }
    }

    /// Bilinear sample at normalized coordinates. Coordinates are clamped into `[0, 1]`.
    pub fn sample_bilinear(&self, u: f32, v: f32) -> f32 {
        if self.data.is_empty() {
            return 0.0;
        }
        let (x0, x1, tx) = axis_lerp_cells(u, self.width);
        let (y0, y1, ty) = axis_lerp_cells(v, self.height);

        let a = self.get(x0, y0);
        let b = self.get(x1, y0);
        let c = self.get(x0, y1);
        let d = self.get(x1, y1);

        let top = a + (b - a) * tx;
        let bottom = c + (d - c) * tx;
        top + (bottom - top) * ty
    }
}

#[inline]
fn axis_uv(i: usize, n: usize) -> f32 {
    if n <= 1 {
        0.0
    } else {
        i as f32 / (n - 1) as f32
    }
}

fn axis_lerp_cells(t: f32, n: usize) -> (usize, usize, f32) {
    if n <= 1 {
        return (0, 0, 0.0);
    }
    let f = t.clamp(0.0, 1.0) * (n - 1) as f32;
    let i0 = (f.floor() as usize).min(n - 1);
    let i1 = (i0 + 1).min(n - 1);
    (i0, i1, f - i0 as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_fn_is_row_major() {
        let field = ScalarField::from_fn(3, 2, |x, y| (y * 10 + x) as f32);
        assert_eq!(field.data(), &[0.0, 1.0, 2.0, 10.0, 11.0, 12.0]);
        assert_eq!(field.get(2, 1), 12.0);
        assert_eq!(field.try_get(3, 0), None);
    }

    #[test]
    fn min_max_handles_empty_and_filled() {
        assert_eq!(ScalarField::new(0, 0).min_max(), None);
        let field = ScalarField::from_fn(2, 2, |x, y| x as f32 - y as f32);
        assert_eq!(field.min_max(), Some((-1.0, 1.0)));
    }

    #[test]
    fn bilinear_hits_corners_and_midpoints() {
        let field = ScalarField::from_fn(2, 2, |x, y| (x + 2 * y) as f32);
        assert_eq!(field.sample_bilinear(0.0, 0.0), 0.0);
        assert_eq!(field.sample_bilinear(1.0, 1.0), 3.0);
        assert!((field.sample_bilinear(0.5, 0.5) - 1.5).abs() < 1e-6);
        // Out of range coordinates clamp to the edge.
        assert_eq!(field.sample_bilinear(-3.0, 0.0), 0.0);
    }

    #[test]
    fn cell_uv_spans_unit_interval() {
        let field = ScalarField::new(5, 5);
        assert_eq!(field.cell_uv(0, 0), (0.0, 0.0));
        assert_eq!(field.cell_uv(4, 2), (1.0, 0.5));
    }
}
