use crate::{DepthError, Result};
use cv_core::nalgebra::Point2;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// The shape of a depth grid and its mapping to image pixels.
///
/// A grid cell `(x, y)` sits on the image pixel `(u0 + x * scale, v0 + y * scale)`. With a scale
/// of `1` and a zero origin the grid is the image; larger scales give sub-sampled grids.
///
/// `(u, v)` always denotes an image point and `(x, y)` a grid point.
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ScaleParameters {
    /// Number of image pixels between two neighbouring grid cells
    #[cfg_attr(feature = "serde-serialize", serde(default = "default_scale"))]
    pub scale: f64,
    /// Image column of grid column `0`
    #[cfg_attr(feature = "serde-serialize", serde(default))]
    pub u0: f64,
    /// Image row of grid row `0`
    #[cfg_attr(feature = "serde-serialize", serde(default))]
    pub v0: f64,
    /// Number of grid columns
    pub x_max: usize,
    /// Number of grid rows
    pub y_max: usize,
    /// Number of hypotheses stored per grid cell
    #[cfg_attr(feature = "serde-serialize", serde(default = "default_h_max"))]
    pub h_max: usize,
}

#[cfg(feature = "serde-serialize")]
fn default_scale() -> f64 {
    1.0
}

#[cfg(feature = "serde-serialize")]
fn default_h_max() -> usize {
    1
}

impl ScaleParameters {
    /// A grid that maps one to one onto an image of `x_max` by `y_max` pixels, with a single
    /// hypothesis per cell.
    pub fn new(x_max: usize, y_max: usize) -> Self {
        Self {
            scale: 1.0,
            u0: 0.0,
            v0: 0.0,
            x_max,
            y_max,
            h_max: 1,
        }
    }

    /// A grid sub-sampling an image of `u_max` by `v_max` pixels every `scale` pixels.
    ///
    /// The grid is centred on the image so that the margins left and right (and top and bottom)
    /// are equal.
    pub fn from_image_size(u_max: usize, v_max: usize, scale: f64) -> Self {
        let x_max = (u_max as f64 / scale).floor() as usize;
        let y_max = (v_max as f64 / scale).floor() as usize;
        let margin = |size: usize, cells: usize| {
            (size as f64 - 1.0 - scale * cells.saturating_sub(1) as f64) / 2.0
        };
        Self {
            scale,
            u0: margin(u_max, x_max),
            v0: margin(v_max, y_max),
            x_max,
            y_max,
            h_max: 1,
        }
    }

    pub fn scale(self, scale: f64) -> Self {
        Self { scale, ..self }
    }

    pub fn origin(self, u0: f64, v0: f64) -> Self {
        Self { u0, v0, ..self }
    }

    pub fn hypotheses(self, h_max: usize) -> Self {
        Self { h_max, ..self }
    }

    /// Checks that the grid is non-empty and the pixel mapping is well defined.
    pub fn validate(&self) -> Result<()> {
        if self.x_max == 0 || self.y_max == 0 || self.h_max == 0 {
            return Err(DepthError::EmptyGrid {
                x_max: self.x_max,
                y_max: self.y_max,
                h_max: self.h_max,
            });
        }
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(DepthError::InvalidScale(self.scale));
        }
        if !self.u0.is_finite() || !self.v0.is_finite() {
            return Err(DepthError::InvalidOrigin(self.u0, self.v0));
        }
        Ok(())
    }

    /// Number of grid cells in one hypothesis layer.
    #[inline(always)]
    pub fn h_step(&self) -> usize {
        self.x_max * self.y_max
    }

    /// Number of slots across all hypothesis layers.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.h_step() * self.h_max
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Grid column to image column.
    #[inline(always)]
    pub fn u_conv(&self, x: usize) -> f64 {
        x as f64 * self.scale + self.u0
    }

    /// Grid row to image row.
    #[inline(always)]
    pub fn v_conv(&self, y: usize) -> f64 {
        y as f64 * self.scale + self.v0
    }

    /// Image column to the nearest grid column. The result may be out of the grid.
    #[inline(always)]
    pub fn x_conv(&self, u: f64) -> i64 {
        to_grid((u - self.u0) / self.scale)
    }

    /// Image row to the nearest grid row. The result may be out of the grid.
    #[inline(always)]
    pub fn y_conv(&self, v: f64) -> i64 {
        to_grid((v - self.v0) / self.scale)
    }

    /// The image point a grid cell sits on.
    #[inline(always)]
    pub fn image_point(&self, x: usize, y: usize) -> Point2<f64> {
        Point2::new(self.u_conv(x), self.v_conv(y))
    }

    /// The grid cell nearest to an image point, if it is inside the grid.
    pub fn grid_coords(&self, point: &Point2<f64>) -> Option<(usize, usize)> {
        let x = self.x_conv(point.x);
        let y = self.y_conv(point.y);
        (x >= 0 && y >= 0 && (x as usize) < self.x_max && (y as usize) < self.y_max)
            .then(|| (x as usize, y as usize))
    }

    /// The index of the grid column nearest to an image point, if it is inside the grid.
    pub fn grid_index(&self, point: &Point2<f64>) -> Option<usize> {
        self.grid_coords(point).map(|(x, y)| x + y * self.x_max)
    }
}

/// Rounds to the nearest cell. Non-finite coordinates land outside every grid.
#[inline(always)]
fn to_grid(coordinate: f64) -> i64 {
    let rounded = coordinate.round();
    if rounded.is_finite() {
        rounded as i64
    } else {
        -1
    }
}
