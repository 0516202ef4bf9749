use alloc::vec::Vec;
use nalgebra::{Point2, Vector3};

/// Allows conversion between the point on an image and the ray out of the camera
/// that the light hitting that point travelled along.
///
/// Implementations may be arbitrary (pinhole, fisheye, unified or enhanced unified models) and
/// are only ever borrowed immutably. A single camera is typically shared by many depth maps.
pub trait CameraModel {
    /// Projects a 3d point expressed in the camera frame onto the image.
    ///
    /// Returns `None` when the point has no image (behind the camera, outside the valid
    /// domain of the model, etc).
    fn project_point(&self, point: &Vector3<f64>) -> Option<Point2<f64>>;

    /// Back-projects an image point to a ray direction in the camera frame.
    ///
    /// The direction does not need to be normalized. Returns `None` when the point is outside the
    /// domain of the model.
    fn reconstruct_point(&self, point: &Point2<f64>) -> Option<Vector3<f64>>;

    /// Projects every point in the cloud. The output has one entry per input, in order.
    fn project_point_cloud(&self, points: &[Vector3<f64>]) -> Vec<Option<Point2<f64>>> {
        points.iter().map(|point| self.project_point(point)).collect()
    }

    /// Back-projects every image point, returning the directions and a validity mask.
    ///
    /// Both vectors have exactly one entry per input, in order. Directions of invalid entries are
    /// zero and must not be used.
    fn reconstruct_point_cloud(&self, points: &[Point2<f64>]) -> (Vec<Vector3<f64>>, Vec<bool>) {
        points
            .iter()
            .map(|point| match self.reconstruct_point(point) {
                Some(direction) => (direction, true),
                None => (Vector3::zeros(), false),
            })
            .unzip()
    }
}

impl<C> CameraModel for &C
where
    C: CameraModel + ?Sized,
{
    fn project_point(&self, point: &Vector3<f64>) -> Option<Point2<f64>> {
        (**self).project_point(point)
    }

    fn reconstruct_point(&self, point: &Point2<f64>) -> Option<Vector3<f64>> {
        (**self).reconstruct_point(point)
    }

    fn project_point_cloud(&self, points: &[Vector3<f64>]) -> Vec<Option<Point2<f64>>> {
        (**self).project_point_cloud(points)
    }

    fn reconstruct_point_cloud(&self, points: &[Point2<f64>]) -> (Vec<Vector3<f64>>, Vec<bool>) {
        (**self).reconstruct_point_cloud(points)
    }
}
