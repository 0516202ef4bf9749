use alloc::vec::Vec;
use derive_more::{AsMut, AsRef, From, Into};
use nalgebra::{IsometryMatrix3, Matrix3, Point3, Rotation3, Vector3};

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// A rigid transformation between two 3d frames.
///
/// This is the only thing the depth map algorithms require from a transform. They never compose
/// transforms themselves. For a transform between frames `A` and `B` (in the naming of the
/// implementing type), [`RigidTransform::transform_points`] maps points from `A` into `B` and
/// [`RigidTransform::inverse_transform_points`] maps them from `B` back into `A`.
pub trait RigidTransform {
    /// Retrieve the isometry.
    fn isometry(&self) -> IsometryMatrix3<f64>;

    /// The translation component, which is the origin of frame `A` expressed in frame `B`.
    fn translation(&self) -> Vector3<f64> {
        self.isometry().translation.vector
    }

    /// The rotation component. Its columns are the axes of frame `A` expressed in frame `B`.
    fn rotation_matrix(&self) -> Matrix3<f64> {
        self.isometry().rotation.into_inner()
    }

    /// Transform a single point from frame `A` into frame `B`.
    fn transform_point(&self, point: &Vector3<f64>) -> Vector3<f64> {
        (self.isometry() * Point3::from(*point)).coords
    }

    /// Transform a single point from frame `B` into frame `A`.
    fn inverse_transform_point(&self, point: &Vector3<f64>) -> Vector3<f64> {
        self.isometry()
            .inverse_transform_point(&Point3::from(*point))
            .coords
    }

    /// Transform every point of a cloud from frame `A` into frame `B`, preserving order.
    fn transform_points(&self, points: &[Vector3<f64>]) -> Vec<Vector3<f64>> {
        let isometry = self.isometry();
        points
            .iter()
            .map(|&point| (isometry * Point3::from(point)).coords)
            .collect()
    }

    /// Transform every point of a cloud from frame `B` into frame `A`, preserving order.
    fn inverse_transform_points(&self, points: &[Vector3<f64>]) -> Vec<Vector3<f64>> {
        let isometry = self.isometry();
        points
            .iter()
            .map(|point| isometry.inverse_transform_point(&Point3::from(*point)).coords)
            .collect()
    }
}

impl RigidTransform for IsometryMatrix3<f64> {
    #[inline(always)]
    fn isometry(&self) -> IsometryMatrix3<f64> {
        *self
    }
}

/// This trait is implemented by all the different poses in this library:
///
/// * [`CameraToCamera`] - Transforms points from one camera frame into another camera frame
/// * [`PlaneToCamera`] - Transforms points on a plane's local frame into a camera frame
/// * [`CameraToPlane`] - Transforms points in a camera frame into a plane's local frame
pub trait Pose: RigidTransform + From<IsometryMatrix3<f64>> + Clone + Copy {
    type Inverse: Pose;

    /// Creates a pose with no change in position or orientation.
    fn identity() -> Self {
        IsometryMatrix3::identity().into()
    }

    /// Takes the inverse of the pose.
    fn inverse(self) -> Self::Inverse {
        self.isometry().inverse().into()
    }

    /// Create the pose from rotation and translation.
    fn from_parts(translation: Vector3<f64>, rotation: Rotation3<f64>) -> Self {
        IsometryMatrix3::from_parts(translation.into(), rotation).into()
    }
}

/// This contains a relative pose that transforms the points of one camera frame
/// into the corresponding points of another camera frame.
///
/// When used to warp a depth map, the pose transforms points seen by the target camera
/// into the source camera's frame, i.e. it is the pose of the target camera expressed in
/// the source camera's frame.
#[derive(Debug, Clone, Copy, PartialEq, AsMut, AsRef, From, Into)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct CameraToCamera(pub IsometryMatrix3<f64>);

impl RigidTransform for CameraToCamera {
    #[inline(always)]
    fn isometry(&self) -> IsometryMatrix3<f64> {
        self.0
    }
}

impl Pose for CameraToCamera {
    type Inverse = CameraToCamera;
}

/// The pose of a plane expressed in a camera frame.
///
/// The plane's local frame has its origin on the plane and its z axis along the plane normal.
/// The translation is therefore a point on the plane and the third column of the rotation is
/// the normal, both in camera coordinates.
#[derive(Debug, Clone, Copy, PartialEq, AsMut, AsRef, From, Into)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct PlaneToCamera(pub IsometryMatrix3<f64>);

impl RigidTransform for PlaneToCamera {
    #[inline(always)]
    fn isometry(&self) -> IsometryMatrix3<f64> {
        self.0
    }
}

impl Pose for PlaneToCamera {
    type Inverse = CameraToPlane;
}

impl PlaneToCamera {
    /// The plane normal in camera coordinates.
    pub fn normal(&self) -> Vector3<f64> {
        self.rotation_matrix().column(2).into_owned()
    }
}

/// Transforms camera points into the local frame of a plane.
#[derive(Debug, Clone, Copy, PartialEq, AsMut, AsRef, From, Into)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct CameraToPlane(pub IsometryMatrix3<f64>);

impl RigidTransform for CameraToPlane {
    #[inline(always)]
    fn isometry(&self) -> IsometryMatrix3<f64> {
        self.0
    }
}

impl Pose for CameraToPlane {
    type Inverse = PlaneToCamera;
}
