#![allow(dead_code)]

use cv_core::nalgebra::{Point2, Vector3};
use cv_core::CameraModel;

pub fn init_logger() {
    let _ = pretty_env_logger::try_init_timed();
}

/// Pinhole camera without distortion.
pub struct Pinhole {
    pub focal: f64,
    pub principal_point: Point2<f64>,
}

impl Pinhole {
    pub fn new(focal: f64, principal_point: Point2<f64>) -> Self {
        Self {
            focal,
            principal_point,
        }
    }
}

impl CameraModel for Pinhole {
    fn project_point(&self, point: &Vector3<f64>) -> Option<Point2<f64>> {
        if point.z <= 0.0 {
            return None;
        }
        Some(self.principal_point + point.xy() * (self.focal / point.z))
    }

    fn reconstruct_point(&self, point: &Point2<f64>) -> Option<Vector3<f64>> {
        let centered = (point - self.principal_point) / self.focal;
        Some(centered.push(1.0))
    }
}

/// Equidistant fisheye: the distance from the principal point is proportional to the angle
/// between the ray and the optical axis.
pub struct Equidistant {
    pub focal: f64,
    pub principal_point: Point2<f64>,
    pub max_angle: f64,
}

impl Equidistant {
    pub fn new(focal: f64, principal_point: Point2<f64>) -> Self {
        Self {
            focal,
            principal_point,
            max_angle: std::f64::consts::PI,
        }
    }

    pub fn max_angle(self, max_angle: f64) -> Self {
        Self { max_angle, ..self }
    }
}

impl CameraModel for Equidistant {
    fn project_point(&self, point: &Vector3<f64>) -> Option<Point2<f64>> {
        let radius = point.xy().norm();
        let angle = radius.atan2(point.z);
        if angle > self.max_angle || point.norm() == 0.0 {
            return None;
        }
        if radius == 0.0 {
            return Some(self.principal_point);
        }
        Some(self.principal_point + point.xy() * (self.focal * angle / radius))
    }

    fn reconstruct_point(&self, point: &Point2<f64>) -> Option<Vector3<f64>> {
        let offset = point - self.principal_point;
        let radius = offset.norm();
        let angle = radius / self.focal;
        if angle > self.max_angle {
            return None;
        }
        if radius == 0.0 {
            return Some(Vector3::z());
        }
        let lateral = offset * (angle.sin() / radius);
        Some(Vector3::new(lateral.x, lateral.y, angle.cos()))
    }
}

/// Pinhole camera that cannot reconstruct image points at or left of `edge`.
pub struct Blind {
    pub pinhole: Pinhole,
    pub edge: f64,
}

impl Blind {
    pub fn new(pinhole: Pinhole, edge: f64) -> Self {
        Self { pinhole, edge }
    }
}

impl CameraModel for Blind {
    fn project_point(&self, point: &Vector3<f64>) -> Option<Point2<f64>> {
        self.pinhole.project_point(point)
    }

    fn reconstruct_point(&self, point: &Point2<f64>) -> Option<Vector3<f64>> {
        if point.x <= self.edge {
            return None;
        }
        self.pinhole.reconstruct_point(point)
    }
}
