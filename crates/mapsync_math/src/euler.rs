//! Euler angles in degrees.
//!
//! Angles are stored as a [`Vec3`] of `(x, y, z)` rotations in degrees, i.e.
//! `(roll, pitch, yaw)`. The corresponding matrix rotates about X first, then
//! Y, then Z: `Rz * Ry * Rx`.

use glam::{EulerRot, Mat3, Quat, Vec3};

/// Builds the rotation matrix for `angles` (degrees, XYZ order).
#[must_use]
pub fn rotation_from_euler_degrees(angles: Vec3) -> Mat3 {
    Mat3::from_euler(
        EulerRot::ZYX,
        angles.z.to_radians(),
        angles.y.to_radians(),
        angles.x.to_radians(),
    )
}

/// Like [`rotation_from_euler_degrees`], but uses an exact single-axis
/// rotation when only one component is non-zero.
#[must_use]
pub fn rotation_from_euler_degrees_quantised(angles: Vec3) -> Mat3 {
    if angles.x == 0.0 && angles.y == 0.0 {
        return Mat3::from_rotation_z(angles.z.to_radians());
    }
    if angles.x == 0.0 && angles.z == 0.0 {
        return Mat3::from_rotation_y(angles.y.to_radians());
    }
    if angles.y == 0.0 && angles.z == 0.0 {
        return Mat3::from_rotation_x(angles.x.to_radians());
    }
    rotation_from_euler_degrees(angles)
}

/// Decomposes an orthonormal rotation matrix into XYZ Euler angles in
/// degrees.
///
/// The matrix must be a proper rotation (see
/// [`orthonormalize`](crate::affine::orthonormalize)).
#[must_use]
pub fn euler_degrees_from_rotation(rotation: Mat3) -> Vec3 {
    let (z, y, x) = Quat::from_mat3(&rotation).to_euler(EulerRot::ZYX);
    Vec3::new(x.to_degrees(), y.to_degrees(), z.to_degrees())
}

/// Replaces every component whose magnitude is below `epsilon` with `0.0`.
#[must_use]
pub fn snapped_to_zero(angles: Vec3, epsilon: f32) -> Vec3 {
    let snap = |v: f32| if v.abs() < epsilon { 0.0 } else { v };
    Vec3::new(snap(angles.x), snap(angles.y), snap(angles.z))
}

/// Wraps every component into `[0, 360)`.
#[must_use]
pub fn normalised_degrees(angles: Vec3) -> Vec3 {
    Vec3::new(
        angles.x.rem_euclid(360.0),
        angles.y.rem_euclid(360.0),
        angles.z.rem_euclid(360.0),
    )
}
