use crate::{Result, ScaleParameters, MIN_DEPTH, OUT_OF_RANGE};
use cv_core::nalgebra::{Point2, Vector3};
use cv_core::CameraModel;
use derive_more::Deref;
use log::*;
use ndarray::{Array2, ArrayView2};
use std::fmt;

/// A dense grid of depth hypotheses for a single camera view.
///
/// Every grid cell holds a column of `h_max` hypothesis slots, each made of a depth (the distance
/// from the optical center along the pixel's ray), its uncertainty `sigma` and a matching cost.
/// A slot whose depth is below [`MIN_DEPTH`] is empty.
///
/// The three layers are stored as flat arrays indexed by `x + y * x_max + h * h_step`, so the
/// first `h_step` entries are the first hypothesis of every column.
///
/// The depth map borrows its camera. Many depth maps may share one camera and the camera must
/// outlive all of them.
#[derive(Clone, Deref)]
pub struct DepthMap<'a> {
    camera: &'a dyn CameraModel,
    #[deref]
    params: ScaleParameters,
    depth_vec: Vec<f64>,
    sigma_vec: Vec<f64>,
    cost_vec: Vec<f64>,
}

impl<'a> fmt::Debug for DepthMap<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DepthMap")
            .field("params", &self.params)
            .field("depth_vec", &self.depth_vec)
            .field("sigma_vec", &self.sigma_vec)
            .field("cost_vec", &self.cost_vec)
            .finish_non_exhaustive()
    }
}

impl<'a> DepthMap<'a> {
    /// Creates a depth map with every depth, sigma and cost set to [`OUT_OF_RANGE`].
    ///
    /// The parameters are not validated; see [`DepthMap::try_new`].
    pub fn new(camera: &'a dyn CameraModel, params: ScaleParameters) -> Self {
        let len = params.len();
        Self {
            camera,
            params,
            depth_vec: vec![OUT_OF_RANGE; len],
            sigma_vec: vec![OUT_OF_RANGE; len],
            cost_vec: vec![OUT_OF_RANGE; len],
        }
    }

    /// Same as [`DepthMap::new`], but rejects empty grids and degenerate pixel mappings.
    pub fn try_new(camera: &'a dyn CameraModel, params: ScaleParameters) -> Result<Self> {
        params.validate()?;
        Ok(Self::new(camera, params))
    }

    pub fn camera(&self) -> &'a dyn CameraModel {
        self.camera
    }

    pub fn scale_parameters(&self) -> ScaleParameters {
        self.params
    }

    /// The flat index of a slot.
    #[inline(always)]
    pub fn index(&self, x: usize, y: usize, h: usize) -> usize {
        x + y * self.x_max + h * self.h_step()
    }

    #[inline(always)]
    pub fn at(&self, x: usize, y: usize, h: usize) -> f64 {
        self.depth_vec[self.index(x, y, h)]
    }

    #[inline(always)]
    pub fn at_mut(&mut self, x: usize, y: usize, h: usize) -> &mut f64 {
        let idx = self.index(x, y, h);
        &mut self.depth_vec[idx]
    }

    #[inline(always)]
    pub fn sigma(&self, x: usize, y: usize, h: usize) -> f64 {
        self.sigma_vec[self.index(x, y, h)]
    }

    #[inline(always)]
    pub fn sigma_mut(&mut self, x: usize, y: usize, h: usize) -> &mut f64 {
        let idx = self.index(x, y, h);
        &mut self.sigma_vec[idx]
    }

    #[inline(always)]
    pub fn cost(&self, x: usize, y: usize, h: usize) -> f64 {
        self.cost_vec[self.index(x, y, h)]
    }

    #[inline(always)]
    pub fn cost_mut(&mut self, x: usize, y: usize, h: usize) -> &mut f64 {
        let idx = self.index(x, y, h);
        &mut self.cost_vec[idx]
    }

    #[inline(always)]
    pub fn at_idx(&self, idx: usize) -> f64 {
        self.depth_vec[idx]
    }

    #[inline(always)]
    pub fn at_idx_mut(&mut self, idx: usize) -> &mut f64 {
        &mut self.depth_vec[idx]
    }

    #[inline(always)]
    pub fn sigma_idx(&self, idx: usize) -> f64 {
        self.sigma_vec[idx]
    }

    #[inline(always)]
    pub fn sigma_idx_mut(&mut self, idx: usize) -> &mut f64 {
        &mut self.sigma_vec[idx]
    }

    #[inline(always)]
    pub fn cost_idx(&self, idx: usize) -> f64 {
        self.cost_vec[idx]
    }

    #[inline(always)]
    pub fn cost_idx_mut(&mut self, idx: usize) -> &mut f64 {
        &mut self.cost_vec[idx]
    }

    /// All depths, hypothesis layer by hypothesis layer.
    pub fn depths(&self) -> &[f64] {
        &self.depth_vec
    }

    pub fn sigmas(&self) -> &[f64] {
        &self.sigma_vec
    }

    pub fn costs(&self) -> &[f64] {
        &self.cost_vec
    }

    /// Checks that `(x, y, h)` addresses a slot of this grid.
    pub fn is_valid(&self, x: i64, y: i64, h: i64) -> bool {
        x >= 0
            && y >= 0
            && h >= 0
            && (x as usize) < self.x_max
            && (y as usize) < self.y_max
            && (h as usize) < self.h_max
    }

    /// Checks that an image point falls on a cell of this grid.
    pub fn is_valid_point(&self, point: &Point2<f64>) -> bool {
        self.grid_coords(point).is_some()
    }

    /// Sets every slot of every layer.
    pub fn fill(&mut self, depth: f64, sigma: f64, cost: f64) {
        self.depth_vec.fill(depth);
        self.sigma_vec.fill(sigma);
        self.cost_vec.fill(cost);
    }

    /// Sets the depth and sigma of one hypothesis layer. Costs are left untouched.
    pub fn reset_layer(&mut self, h: usize, depth: f64, sigma: f64) {
        let layer = h * self.h_step()..(h + 1) * self.h_step();
        self.depth_vec[layer.clone()].fill(depth);
        self.sigma_vec[layer].fill(sigma);
    }

    /// Inserts a 3d point, given in the camera frame, as a new hypothesis of the column it
    /// projects onto.
    ///
    /// The point goes into the first empty slot of the column. Nothing is changed and `false` is
    /// returned if the point cannot be projected, lands outside the grid, or the column already
    /// holds `h_max` hypotheses. Costs are never written.
    pub fn push_hypothesis(&mut self, point: &Vector3<f64>, sigma: f64) -> bool {
        let image_point = match self.camera.project_point(point) {
            Some(image_point) => image_point,
            None => return false,
        };
        let (x, y) = match self.grid_coords(&image_point) {
            Some(coords) => coords,
            None => return false,
        };
        let slot = (0..self.h_max)
            .map(|h| self.index(x, y, h))
            .find(|&idx| self.depth_vec[idx] < MIN_DEPTH);
        match slot {
            Some(idx) => {
                self.depth_vec[idx] = point.norm();
                self.sigma_vec[idx] = sigma;
                true
            }
            None => {
                trace!("column ({}, {}) is saturated", x, y);
                false
            }
        }
    }

    fn nearest_index(&self, point: &Point2<f64>, h: usize) -> Option<usize> {
        if h >= self.h_max {
            return None;
        }
        self.grid_coords(point).map(|(x, y)| self.index(x, y, h))
    }

    /// The depth of hypothesis `h` in the cell nearest to an image point, or [`OUT_OF_RANGE`].
    pub fn nearest(&self, point: &Point2<f64>, h: usize) -> f64 {
        self.nearest_index(point, h)
            .map_or(OUT_OF_RANGE, |idx| self.depth_vec[idx])
    }

    /// The sigma of hypothesis `h` in the cell nearest to an image point, or [`OUT_OF_RANGE`].
    pub fn nearest_sigma(&self, point: &Point2<f64>, h: usize) -> f64 {
        self.nearest_index(point, h)
            .map_or(OUT_OF_RANGE, |idx| self.sigma_vec[idx])
    }

    /// The cost of hypothesis `h` in the cell nearest to an image point, or [`OUT_OF_RANGE`].
    pub fn nearest_cost(&self, point: &Point2<f64>, h: usize) -> f64 {
        self.nearest_index(point, h)
            .map_or(OUT_OF_RANGE, |idx| self.cost_vec[idx])
    }

    /// Same as [`DepthMap::nearest`] for an integer pixel.
    pub fn nearest_px(&self, u: i64, v: i64, h: usize) -> f64 {
        self.nearest(&Point2::new(u as f64, v as f64), h)
    }

    pub fn nearest_sigma_px(&self, u: i64, v: i64, h: usize) -> f64 {
        self.nearest_sigma(&Point2::new(u as f64, v as f64), h)
    }

    pub fn nearest_cost_px(&self, u: i64, v: i64, h: usize) -> f64 {
        self.nearest_cost(&Point2::new(u as f64, v as f64), h)
    }

    /// Invalidates every column whose image pixel is `false` in the mask.
    ///
    /// The mask is indexed `(v, u)` at image resolution. All depths of an invalidated column are
    /// set to `0`; sigmas, costs and the columns the mask does not reach are left untouched.
    pub fn apply_mask(&mut self, mask: ArrayView2<bool>) {
        let mut masked = 0;
        for y in 0..self.y_max {
            let v = self.v_conv(y).round();
            for x in 0..self.x_max {
                let u = self.u_conv(x).round();
                if v < 0.0 || u < 0.0 {
                    continue;
                }
                if let Some(false) = mask.get((v as usize, u as usize)) {
                    for h in 0..self.h_max {
                        let idx = self.index(x, y, h);
                        self.depth_vec[idx] = 0.0;
                    }
                    masked += 1;
                }
            }
        }
        debug!("masked out {} of {} columns", masked, self.h_step());
    }

    /// Copies the first hypothesis layer into a `y_max` by `x_max` matrix.
    pub fn to_mat(&self) -> Array2<f32> {
        Array2::from_shape_fn((self.y_max, self.x_max), |(y, x)| {
            self.depth_vec[x + y * self.x_max] as f32
        })
    }

    /// The image point of every grid column, row by row.
    pub fn image_points(&self) -> Vec<Point2<f64>> {
        (0..self.y_max)
            .flat_map(|y| (0..self.x_max).map(move |x| (x, y)))
            .map(|(x, y)| self.image_point(x, y))
            .collect()
    }

    /// The image point of the column of each flat index. Indices of any hypothesis layer are
    /// accepted.
    pub fn image_points_for(&self, indices: &[usize]) -> Vec<Point2<f64>> {
        let h_step = self.h_step();
        indices
            .iter()
            .map(|&idx| {
                let column = idx % h_step;
                self.image_point(column % self.x_max, column / self.x_max)
            })
            .collect()
    }

    /// Projects a cloud, given in this camera's frame, onto the image.
    pub fn project(&self, cloud: &[Vector3<f64>]) -> Vec<Option<Point2<f64>>> {
        self.camera.project_point_cloud(cloud)
    }
}
