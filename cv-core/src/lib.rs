//! # Rust CV Core
//!
//! This library provides the abstractions that the depth map crates of this workspace are written
//! against: a polymorphic [`CameraModel`] and a [`RigidTransform`]. Neither a specific camera
//! projection model nor pose estimation lives here. Pinhole, fisheye or omnidirectional models are
//! all expected to be implemented downstream by whoever owns the calibration.
//!
//! The crate works with `#![no_std]` but requires an allocator, since the bulk camera operations
//! return one value per input point.
//!
//! ## Frames
//!
//! Every 3d point handed to a [`CameraModel`] is expressed in that camera's own frame:
//!
//! * Origin is the optical center
//! * Positive z axis is forwards
//! * Positive y axis is down
//! * Positive x axis is right
//!
//! A [`RigidTransform`] maps points from one frame into another, and its type names the direction.
//! For a transform named `AToB`, [`RigidTransform::transform_points`] takes points expressed in
//! frame `A` and returns them in frame `B`, while [`RigidTransform::inverse_transform_points`] goes
//! from `B` back to `A`. A [`PlaneToCamera`] takes points on the plane into the camera frame, and a
//! [`CameraToCamera`] takes points of one camera frame into the other.
//!
//! ```text
//!            frame B
//!              O------->
//!             /
//!     AToB   /   transform: A -> B
//!           /    inverse_transform: B -> A
//!          /
//!         O------->
//!      frame A
//! ```

#![no_std]

extern crate alloc;

mod camera;
mod pose;

pub use camera::*;
pub use nalgebra;
pub use pose::*;
