use crate::{DepthMap, DEFAULT_DEPTH, DEFAULT_SIGMA_DEPTH, MIN_DEPTH};
use cv_core::nalgebra::{Point2, Vector3};
use itertools::izip;
use log::*;
use std::{iter, mem};

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// Selects what [`DepthMap::reconstruct`] reads from an [`MHPack`] and what it writes back.
///
/// Flags combine freely, except that [`ReconstructFlags::image_values`] is reserved and must
/// never be set.
///
/// ```
/// use cv_depth::ReconstructFlags;
/// let flags = ReconstructFlags::default().query_points().sigma_value().index_mapping();
/// assert!(flags.query_points && flags.sigma_value && flags.index_mapping);
/// assert!(!flags.minmax);
/// ```
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct ReconstructFlags {
    /// Query the flat grid indices in [`MHPack::idx_vec`]. Takes precedence over `query_points`.
    pub query_indices: bool,
    /// Query the cells nearest to the image points in [`MHPack::image_point_vec`].
    pub query_points: bool,
    /// Emit every hypothesis of a queried column instead of only the first one.
    pub all_hypotheses: bool,
    /// Use [`DEFAULT_DEPTH`] and [`DEFAULT_SIGMA_DEPTH`] for empty slots instead of skipping them.
    pub default_values: bool,
    /// Emit the two points `depth - 2 sigma` and `depth + 2 sigma` per entry.
    pub minmax: bool,
    /// Fill [`MHPack::sigma_vec`].
    pub sigma_value: bool,
    /// Fill [`MHPack::cost_vec`].
    pub cost_value: bool,
    /// Fill [`MHPack::idx_map_vec`].
    pub index_mapping: bool,
    /// Reserved.
    pub image_values: bool,
}

impl ReconstructFlags {
    pub fn query_indices(self) -> Self {
        Self {
            query_indices: true,
            ..self
        }
    }

    pub fn query_points(self) -> Self {
        Self {
            query_points: true,
            ..self
        }
    }

    pub fn all_hypotheses(self) -> Self {
        Self {
            all_hypotheses: true,
            ..self
        }
    }

    pub fn default_values(self) -> Self {
        Self {
            default_values: true,
            ..self
        }
    }

    pub fn minmax(self) -> Self {
        Self {
            minmax: true,
            ..self
        }
    }

    pub fn sigma_value(self) -> Self {
        Self {
            sigma_value: true,
            ..self
        }
    }

    pub fn cost_value(self) -> Self {
        Self {
            cost_value: true,
            ..self
        }
    }

    pub fn index_mapping(self) -> Self {
        Self {
            index_mapping: true,
            ..self
        }
    }

    /// Number of cloud points emitted per entry.
    pub fn arity(&self) -> usize {
        if self.minmax {
            2
        } else {
            1
        }
    }
}

/// The query and result of a bulk reconstruction.
///
/// Before a call, `idx_vec` or `image_point_vec` may hold the query (see [`ReconstructFlags`]).
/// After a call every output vector has been rebuilt from scratch and, for `n` emitted entries:
///
/// * `idx_vec`, `hyp_idx_vec` and `image_point_vec` have `n` elements
/// * `sigma_vec`, `cost_vec` and `idx_map_vec` have `n` elements when requested, else none
/// * `cloud` has `n` elements, or `2n` under [`ReconstructFlags::minmax`]
///
/// Element `i` of every vector describes the same entry (elements `2i` and `2i + 1` of the cloud
/// under `minmax`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MHPack {
    /// Image points: the query under `query_points`, the pixel of every entry afterwards
    pub image_point_vec: Vec<Point2<f64>>,
    /// Flat grid indices: the query under `query_indices`, the column of every entry afterwards
    pub idx_vec: Vec<usize>,
    /// Hypothesis slot of every entry
    pub hyp_idx_vec: Vec<usize>,
    /// Matching cost of every entry
    pub cost_vec: Vec<f64>,
    /// Depth uncertainty of every entry
    pub sigma_vec: Vec<f64>,
    /// Reserved for image values
    pub val_vec: Vec<f64>,
    /// Position in the query each entry originated from
    pub idx_map_vec: Vec<usize>,
    /// Reconstructed points in the camera frame, zero where the camera could not reconstruct
    pub cloud: Vec<Vector3<f64>>,
}

impl MHPack {
    /// A pack querying the cells nearest to image points.
    pub fn from_points(points: Vec<Point2<f64>>) -> Self {
        Self {
            image_point_vec: points,
            ..Self::default()
        }
    }

    /// A pack querying flat grid indices.
    pub fn from_indices(indices: Vec<usize>) -> Self {
        Self {
            idx_vec: indices,
            ..Self::default()
        }
    }

    /// Number of entries emitted by the last reconstruction.
    pub fn len(&self) -> usize {
        self.idx_vec.len()
    }

    pub fn is_empty(&self) -> bool {
        self.idx_vec.is_empty()
    }

    fn clear(&mut self) {
        self.image_point_vec.clear();
        self.idx_vec.clear();
        self.hyp_idx_vec.clear();
        self.cost_vec.clear();
        self.sigma_vec.clear();
        self.val_vec.clear();
        self.idx_map_vec.clear();
        self.cloud.clear();
    }
}

impl<'a> DepthMap<'a> {
    /// The flat index of the column nearest to each image point, or `None` outside the grid.
    pub fn nearest_indices(&self, points: &[Point2<f64>]) -> Vec<Option<usize>> {
        points.iter().map(|point| self.grid_index(point)).collect()
    }

    /// Indices of every column whose first hypothesis is valid, in ascending order.
    pub fn valid_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.depths()[..self.h_step()]
            .iter()
            .enumerate()
            .filter(|&(_, &depth)| depth >= MIN_DEPTH)
            .map(|(idx, _)| idx)
    }

    /// Reconstructs a selection of hypotheses into a 3d point cloud in the camera frame.
    ///
    /// The query is read from `pack` according to `flags` and every output of `pack` is
    /// overwritten. Entries whose pixel the camera cannot reconstruct are kept, with zero points
    /// in the cloud, so all outputs stay aligned (see [`MHPack`]).
    ///
    /// # Panics
    ///
    /// Panics if [`ReconstructFlags::image_values`] is set.
    pub fn reconstruct(&self, pack: &mut MHPack, flags: ReconstructFlags) {
        assert!(
            !flags.image_values,
            "reconstruction of image values is not implemented"
        );
        let num_hyps = if flags.all_hypotheses { self.h_max } else { 1 };
        let h_step = self.h_step();

        let query: Vec<Option<usize>> = if flags.query_indices {
            mem::take(&mut pack.idx_vec).into_iter().map(Some).collect()
        } else if flags.query_points {
            self.nearest_indices(&pack.image_point_vec)
        } else {
            self.valid_indices().map(Some).collect()
        };
        pack.clear();

        let mut depths = Vec::with_capacity(query.len() * flags.arity());
        for (position, &idx) in query.iter().enumerate() {
            let idx = match idx {
                Some(idx) if idx <= h_step => idx,
                _ => continue,
            };
            for h in 0..num_hyps {
                let slot = idx + h * h_step;
                // Only the column index is bounds checked, the slot may still be past the end.
                let (mut depth, mut sigma) =
                    match (self.depths().get(slot), self.sigmas().get(slot)) {
                        (Some(&depth), Some(&sigma)) => (depth, sigma),
                        _ => continue,
                    };
                if depth < MIN_DEPTH {
                    if flags.default_values {
                        depth = DEFAULT_DEPTH;
                        sigma = DEFAULT_SIGMA_DEPTH;
                    } else {
                        continue;
                    }
                }

                if flags.minmax {
                    depths.push((depth - 2.0 * sigma).max(MIN_DEPTH));
                    depths.push(depth + 2.0 * sigma);
                } else {
                    depths.push(depth);
                }

                if flags.sigma_value {
                    pack.sigma_vec.push(sigma);
                }
                if flags.cost_value {
                    pack.cost_vec.push(self.cost_idx(slot));
                }
                pack.idx_vec.push(idx);
                pack.hyp_idx_vec.push(h);
                if flags.index_mapping {
                    pack.idx_map_vec.push(position);
                }
            }
        }
        trace!(
            "reconstructing {} entries from {} queries",
            pack.idx_vec.len(),
            query.len()
        );

        pack.image_point_vec = self.image_points_for(&pack.idx_vec);
        let (directions, mask) = self
            .camera()
            .reconstruct_point_cloud(&pack.image_point_vec);

        let arity = flags.arity();
        pack.cloud.reserve(arity * directions.len());
        for (direction, valid, targets) in izip!(directions, mask, depths.chunks(arity)) {
            if valid {
                let ray = direction.normalize();
                pack.cloud.extend(targets.iter().map(|&depth| ray * depth));
            } else {
                pack.cloud
                    .extend(iter::repeat(Vector3::zeros()).take(arity));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ScaleParameters;
    use approx::assert_relative_eq;
    use cv_core::CameraModel;

    /// Pinhole camera with unit focal length that cannot see the left half of the image.
    struct RightHalf;

    impl CameraModel for RightHalf {
        fn project_point(&self, point: &Vector3<f64>) -> Option<Point2<f64>> {
            (point.z > 0.0).then(|| Point2::new(point.x / point.z, point.y / point.z))
        }

        fn reconstruct_point(&self, point: &Point2<f64>) -> Option<Vector3<f64>> {
            (point.x >= 0.0).then(|| Vector3::new(point.x, point.y, 1.0))
        }
    }

    /// A 3x2 grid on pixels x in {-1, 0, 1}, y in {0, 1} with two hypotheses.
    fn map() -> DepthMap<'static> {
        let params = ScaleParameters::new(3, 2).origin(-1.0, 0.0).hypotheses(2);
        let mut map = DepthMap::new(&RightHalf, params);
        map.fill(0.0, 0.0, 0.0);
        for (idx, depth) in [(0, 2.0), (1, 3.0), (2, 4.0), (4, 5.0), (7, 6.0), (10, 7.0)] {
            *map.at_idx_mut(idx) = depth;
            *map.sigma_idx_mut(idx) = depth / 10.0;
            *map.cost_idx_mut(idx) = depth * 10.0;
        }
        map
    }

    #[test]
    fn default_query_is_every_valid_first_hypothesis() {
        let map = map();
        let mut pack = MHPack::default();
        pack.sigma_vec.push(42.0);
        map.reconstruct(&mut pack, ReconstructFlags::default());
        assert_eq!(pack.idx_vec, [0, 1, 2, 4]);
        assert_eq!(pack.hyp_idx_vec, [0, 0, 0, 0]);
        assert!(pack.sigma_vec.is_empty());
        assert!(pack.idx_map_vec.is_empty());
        assert_eq!(pack.cloud.len(), 4);
        // Column 0 sits on pixel (-1, 0), which the camera cannot reconstruct.
        assert_eq!(pack.cloud[0], Vector3::zeros());
        assert_relative_eq!(pack.cloud[1], Vector3::new(0.0, 0.0, 3.0));
        assert_relative_eq!(pack.cloud[2].norm(), 4.0, epsilon = 1e-12);
        assert_relative_eq!(
            pack.cloud[3],
            Vector3::new(0.0, 1.0, 1.0).normalize() * 5.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn all_hypotheses_with_metadata() {
        let map = map();
        let mut pack = MHPack::from_indices(vec![1, 4]);
        let flags = ReconstructFlags::default()
            .query_indices()
            .all_hypotheses()
            .sigma_value()
            .cost_value()
            .index_mapping();
        map.reconstruct(&mut pack, flags);
        assert_eq!(pack.idx_vec, [1, 1, 4, 4]);
        assert_eq!(pack.hyp_idx_vec, [0, 1, 0, 1]);
        assert_eq!(pack.idx_map_vec, [0, 0, 1, 1]);
        assert_eq!(pack.sigma_vec, [0.3, 0.6, 0.5, 0.7]);
        assert_eq!(pack.cost_vec, [30.0, 60.0, 50.0, 70.0]);
        assert_relative_eq!(pack.cloud[1], Vector3::new(0.0, 0.0, 6.0));
    }

    #[test]
    fn default_values_fill_empty_slots() {
        let map = map();
        let mut pack = MHPack::from_indices(vec![5]);
        let flags = ReconstructFlags::default()
            .query_indices()
            .all_hypotheses()
            .default_values()
            .sigma_value();
        map.reconstruct(&mut pack, flags);
        assert_eq!(pack.hyp_idx_vec, [0, 1]);
        assert_eq!(pack.sigma_vec, [DEFAULT_SIGMA_DEPTH, DEFAULT_SIGMA_DEPTH]);
        assert_eq!(pack.cloud.len(), 2);
        for point in &pack.cloud {
            assert_relative_eq!(point.norm(), DEFAULT_DEPTH, epsilon = 1e-12);
        }

        let mut pack = MHPack::from_indices(vec![5]);
        map.reconstruct(&mut pack, ReconstructFlags::default().query_indices());
        assert!(pack.is_empty());
        assert!(pack.cloud.is_empty());
    }

    #[test]
    fn minmax_brackets_the_depth() {
        let mut map = map();
        *map.sigma_idx_mut(1) = 1.0;
        *map.sigma_idx_mut(2) = 3.0;
        let mut pack = MHPack::from_indices(vec![0, 1, 2]);
        map.reconstruct(&mut pack, ReconstructFlags::default().query_indices().minmax());
        assert_eq!(pack.len(), 3);
        assert_eq!(pack.cloud.len(), 6);
        // Unreconstructable entries are two zero points.
        assert_eq!(&pack.cloud[..2], &[Vector3::zeros(), Vector3::zeros()]);
        assert_relative_eq!(pack.cloud[2], Vector3::new(0.0, 0.0, 1.0));
        assert_relative_eq!(pack.cloud[3], Vector3::new(0.0, 0.0, 5.0));
        // The lower bound never goes below the minimum depth.
        assert_relative_eq!(pack.cloud[4].norm(), MIN_DEPTH, epsilon = 1e-12);
        assert_relative_eq!(pack.cloud[5].norm(), 10.0, epsilon = 1e-12);
    }

    #[test]
    fn query_points_drop_points_outside_the_grid() {
        let map = map();
        let points = vec![
            Point2::new(0.2, 0.9),
            Point2::new(5.0, 0.0),
            Point2::new(1.0, 0.1),
        ];
        let mut pack = MHPack::from_points(points);
        let flags = ReconstructFlags::default().query_points().index_mapping();
        map.reconstruct(&mut pack, flags);
        assert_eq!(pack.idx_vec, [4, 2]);
        assert_eq!(pack.idx_map_vec, [0, 2]);
        assert_eq!(
            pack.image_point_vec,
            [Point2::new(0.0, 1.0), Point2::new(1.0, 0.0)]
        );
        assert_eq!(map.nearest_indices(&[Point2::new(-2.0, 0.0)]), [None]);
    }

    #[test]
    fn column_count_is_an_accepted_query_index() {
        let mut map = map();
        *map.at_idx_mut(6) = 8.0;
        let mut pack = MHPack::from_indices(vec![6, 7]);
        let flags = ReconstructFlags::default().query_indices().all_hypotheses();
        map.reconstruct(&mut pack, flags);
        // Index 6 reads the first column of the second layer, index 7 is rejected.
        assert_eq!(pack.idx_vec, [6]);
        assert_eq!(pack.hyp_idx_vec, [0]);
        assert_eq!(pack.image_point_vec, [Point2::new(-1.0, 0.0)]);

        // Past the end of the arena is skipped rather than read.
        let single = DepthMap::new(&RightHalf, ScaleParameters::new(3, 2));
        let mut pack = MHPack::from_indices(vec![6]);
        let flags = ReconstructFlags::default().query_indices().default_values();
        single.reconstruct(&mut pack, flags);
        assert!(pack.is_empty());
    }

    #[test]
    #[should_panic(expected = "image values")]
    fn image_values_are_a_precondition_violation() {
        let map = map();
        let flags = ReconstructFlags {
            image_values: true,
            ..ReconstructFlags::default()
        };
        map.reconstruct(&mut MHPack::default(), flags);
    }
}
