use crate::{DepthMap, Result, ScaleParameters};
use cv_core::nalgebra::Vector3;
use cv_core::{CameraModel, RigidTransform};
use log::*;

/// Rays closer to parallel with the plane than this are rejected.
const GRAZING_EPSILON: f64 = 1e-3;

impl<'a> DepthMap<'a> {
    /// Creates the depth map of a planar polygon seen by `camera`.
    ///
    /// `plane` maps the local frame of the plane into the camera frame: its translation is a point
    /// on the plane and the third column of its rotation is the plane normal, which must point
    /// away from the camera. `polygon` holds the directions of the polygon corners in the camera
    /// frame, ordered clockwise as seen in the image (top left, top right, bottom right and so on).
    /// An empty polygon covers the whole plane.
    ///
    /// Cells whose ray hits the plane inside the polygon get the distance to the plane as their
    /// first hypothesis with a sigma of `1`. All other slots keep [`OUT_OF_RANGE`].
    ///
    /// [`OUT_OF_RANGE`]: crate::OUT_OF_RANGE
    pub fn generate_plane<T>(
        camera: &'a dyn CameraModel,
        params: ScaleParameters,
        plane: &T,
        polygon: &[Vector3<f64>],
    ) -> Result<Self>
    where
        T: RigidTransform + ?Sized,
    {
        let mut map = Self::try_new(camera, params)?;
        let normal: Vector3<f64> = plane.rotation_matrix().column(2).into_owned();
        let offset = plane.translation().dot(&normal);
        let edges: Vec<Vector3<f64>> = polygon
            .iter()
            .zip(polygon.iter().cycle().skip(1))
            .map(|(a, b)| a.cross(b))
            .collect();

        let (rays, valid) = camera.reconstruct_point_cloud(&map.image_points());
        let mut filled = 0;
        for (idx, (ray, valid)) in rays.into_iter().zip(valid).enumerate() {
            if !valid {
                continue;
            }
            let ray = ray.normalize();
            let cos = ray.dot(&normal);
            if cos < GRAZING_EPSILON || edges.iter().any(|edge| ray.dot(edge) < 0.0) {
                continue;
            }
            *map.at_idx_mut(idx) = (ray * (offset / cos)).norm();
            *map.sigma_idx_mut(idx) = 1.0;
            filled += 1;
        }
        debug!("plane covers {} of {} cells", filled, map.h_step());
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OUT_OF_RANGE;
    use approx::assert_relative_eq;
    use cv_core::nalgebra::{Point2, Rotation3};
    use cv_core::{PlaneToCamera, Pose};

    struct Normalized;

    impl CameraModel for Normalized {
        fn project_point(&self, point: &Vector3<f64>) -> Option<Point2<f64>> {
            (point.z > 0.0).then(|| Point2::new(point.x / point.z, point.y / point.z))
        }

        fn reconstruct_point(&self, point: &Point2<f64>) -> Option<Vector3<f64>> {
            Some(Vector3::new(point.x, point.y, 1.0))
        }
    }

    fn params() -> ScaleParameters {
        ScaleParameters::new(5, 5).scale(0.25).origin(-0.5, -0.5)
    }

    fn square(half: f64) -> Vec<Vector3<f64>> {
        vec![
            Vector3::new(-half, -half, 1.0),
            Vector3::new(half, -half, 1.0),
            Vector3::new(half, half, 1.0),
            Vector3::new(-half, half, 1.0),
        ]
    }

    #[test]
    fn polygon_limits_the_plane() {
        let plane = PlaneToCamera::from_parts(Vector3::new(0.0, 0.0, 2.0), Rotation3::identity());
        let map = DepthMap::generate_plane(&Normalized, params(), &plane, &square(0.3)).unwrap();
        for y in 0..5 {
            for x in 0..5 {
                let (u, v) = (map.u_conv(x), map.v_conv(y));
                if u.abs() < 0.3 && v.abs() < 0.3 {
                    let expected = 2.0 * (u * u + v * v + 1.0).sqrt();
                    assert_relative_eq!(map.at(x, y, 0), expected, epsilon = 1e-12);
                    assert_eq!(map.sigma(x, y, 0), 1.0);
                } else {
                    assert_eq!(map.at(x, y, 0), OUT_OF_RANGE);
                    assert_eq!(map.sigma(x, y, 0), OUT_OF_RANGE);
                }
            }
        }
    }

    #[test]
    fn empty_polygon_covers_the_whole_plane() {
        let plane = PlaneToCamera::from_parts(Vector3::new(0.0, 0.0, 1.0), Rotation3::identity());
        let map = DepthMap::generate_plane(&Normalized, params(), &plane, &[]).unwrap();
        assert!(map.depths().iter().all(|&depth| depth >= 1.0));
    }

    #[test]
    fn plane_facing_the_camera_is_invisible() {
        let flipped = Rotation3::from_axis_angle(&Vector3::x_axis(), std::f64::consts::PI);
        let plane = PlaneToCamera::from_parts(Vector3::new(0.0, 0.0, 1.0), flipped);
        let map = DepthMap::generate_plane(&Normalized, params(), &plane, &square(1.0)).unwrap();
        assert!(map.depths().iter().all(|&depth| depth == OUT_OF_RANGE));
    }
}
