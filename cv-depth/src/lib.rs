//! # Multi-hypothesis depth maps
//!
//! A [`DepthMap`] stores, for every cell of a (possibly sub-sampled) image grid, a fixed number of
//! depth hypotheses along the cell's viewing ray, each with an uncertainty and a matching cost.
//! Depth estimates computed elsewhere enter the map through [`DepthMap::push_hypothesis`] and
//! leave it as 3d point clouds through [`DepthMap::reconstruct`], whose query and result travel in
//! an [`MHPack`].
//!
//! Depth maps can also be moved between views with [`DepthMap::warp_into`] and
//! [`DepthMap::warp`], synthesized from a planar polygon with [`DepthMap::generate_plane`], and
//! a reconstruction can be written to disk with [`export_ply`].
//!
//! The camera model is borrowed from the caller. Any [`cv_core::CameraModel`] works, so the same
//! code serves pinhole, fisheye and omnidirectional cameras alike.
//!
//! ```
//! use cv_core::nalgebra::{Point2, Vector3};
//! use cv_core::CameraModel;
//! use cv_depth::{DepthMap, MHPack, ReconstructFlags, ScaleParameters};
//!
//! struct Pinhole;
//!
//! impl CameraModel for Pinhole {
//!     fn project_point(&self, point: &Vector3<f64>) -> Option<Point2<f64>> {
//!         (point.z > 0.0).then(|| Point2::new(point.x / point.z, point.y / point.z))
//!     }
//!
//!     fn reconstruct_point(&self, point: &Point2<f64>) -> Option<Vector3<f64>> {
//!         Some(Vector3::new(point.x, point.y, 1.0))
//!     }
//! }
//!
//! let params = ScaleParameters::new(3, 3).origin(-1.0, -1.0).hypotheses(2);
//! let mut map = DepthMap::new(&Pinhole, params);
//! assert!(map.push_hypothesis(&Vector3::new(0.0, 0.0, 4.0), 0.5));
//!
//! let mut pack = MHPack::default();
//! map.reconstruct(&mut pack, ReconstructFlags::default().sigma_value());
//! assert_eq!(pack.cloud, [Vector3::new(0.0, 0.0, 4.0)]);
//! assert_eq!(pack.sigma_vec, [0.5]);
//! ```

mod depth_map;
mod error;
mod export;
mod plane;
mod reconstruct;
mod scale;
mod warp;

pub use depth_map::*;
pub use error::*;
pub use export::*;
pub use reconstruct::*;
pub use scale::*;

/// Depths below this value mark an empty hypothesis slot.
pub const MIN_DEPTH: f64 = 0.1;
/// Returned by lookups outside of the grid. Also the initial value of every slot.
pub const OUT_OF_RANGE: f64 = -1.0;
/// Depth substituted for empty slots when reconstructing with default values.
pub const DEFAULT_DEPTH: f64 = 1.0;
/// Sigma substituted for empty slots when reconstructing with default values.
pub const DEFAULT_SIGMA_DEPTH: f64 = 100.0;
