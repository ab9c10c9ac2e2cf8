// Math utilities and helper functions
//
// Public APIs speak `glam::Vec2`; parry2d speaks nalgebra. The conversions live here.

use glam::Vec2;
use parry2d::math::{Isometry, Real, Vector};

/// Convert a glam vector into parry's nalgebra vector
#[inline]
pub fn to_vector(v: Vec2) -> Vector<Real> {
    Vector::new(v.x, v.y)
}

/// Convert a parry/nalgebra vector back into glam
#[inline]
pub fn from_vector(v: &Vector<Real>) -> Vec2 {
    Vec2::new(v.x, v.y)
}

/// Pure translation isometry (bodies never rotate)
#[inline]
pub fn isometry_at(position: Vec2) -> Isometry<Real> {
    Isometry::translation(position.x, position.y)
}

/// Check that both components are finite (no NaN / inf leaked into the simulation)
#[inline]
pub fn is_finite(v: Vec2) -> bool {
    v.x.is_finite() && v.y.is_finite()
}

/// Check if a value lies in the closed unit interval
#[inline]
pub fn in_unit_range(value: f32) -> bool {
    (0.0..=1.0).contains(&value)
}
