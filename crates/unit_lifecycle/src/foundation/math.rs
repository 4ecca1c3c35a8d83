//! Math utilities and types
//!
//! Placement only needs vectors, so this stays a thin layer over nalgebra.

pub use nalgebra::Vector3;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// Unit-length direction of `v`, or `None` if `v` is (close to) zero
pub fn direction(v: Vec3) -> Option<Vec3> {
    v.try_normalize(f32::EPSILON)
}

/// Build a vector from a plain `[x, y, z]` array (as stored in config files)
pub fn vec3_from_array(values: [f32; 3]) -> Vec3 {
    Vec3::new(values[0], values[1], values[2])
}
