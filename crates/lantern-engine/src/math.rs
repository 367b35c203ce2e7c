//! Conversions between the public `glam` types and rapier's nalgebra types.

use glam::{Quat, Vec3};
use rapier3d::na::{Quaternion, UnitQuaternion};
use rapier3d::prelude::*;

pub(crate) fn to_vector(v: Vec3) -> Vector<Real> {
    vector![v.x, v.y, v.z]
}

pub(crate) fn from_vector(v: &Vector<Real>) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

pub(crate) fn to_point(v: Vec3) -> Point<Real> {
    point![v.x, v.y, v.z]
}

pub(crate) fn to_rotation(q: Quat) -> UnitQuaternion<Real> {
    UnitQuaternion::from_quaternion(Quaternion::new(q.w, q.x, q.y, q.z))
}

/// Angle in radians between two vectors; `PI` when either is zero so that
/// degenerate candidates sort last.
pub(crate) fn angle_between(a: Vec3, b: Vec3) -> f32 {
    if a.length_squared() == 0.0 || b.length_squared() == 0.0 {
        return std::f32::consts::PI;
    }
    a.angle_between(b)
}
