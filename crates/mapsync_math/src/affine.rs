//! Affine matrix helpers.
//!
//! All matrices are column-major [`Mat4`]s acting on column vectors, so
//! `a * b` applies `b` first. Only the upper 3×3 block and the translation
//! column are meaningful; the bottom row is assumed to be `0 0 0 1`.

use glam::{Affine3A, Mat3, Mat4, Vec3};

/// Per-element tolerance used when deciding whether a transform is the
/// identity.
pub const IDENTITY_EPSILON: f32 = 1e-4;

/// Smallest determinant magnitude of the linear part that is still treated
/// as invertible.
const DETERMINANT_EPSILON: f64 = 1e-12;

/// Smallest cross-product length accepted while rebuilding a basis.
const BASIS_EPSILON: f32 = 1e-6;

/// Returns the determinant of the 3×3 linear part of `matrix`.
///
/// A negative value means the transform mirrors geometry.
#[must_use]
pub fn linear_determinant(matrix: Mat4) -> f32 {
    Mat3::from_mat4(matrix).determinant()
}

/// Computes the affine inverse of `matrix` (inverse of the linear part plus
/// the matching translation).
///
/// Returns `None` when the linear part is singular or close to it. The
/// determinant is evaluated in `f64` so that small but valid scales are not
/// rejected.
#[must_use]
pub fn affine_inverse(matrix: Mat4) -> Option<Mat4> {
    let det = Mat3::from_mat4(matrix).as_dmat3().determinant();
    if det.abs() < DETERMINANT_EPSILON {
        return None;
    }
    Some(Mat4::from(Affine3A::from_mat4(matrix).inverse()))
}

/// Returns `true` if every element of `matrix` is within `epsilon` of the
/// identity matrix.
#[must_use]
pub fn is_identity(matrix: Mat4, epsilon: f32) -> bool {
    matrix.abs_diff_eq(Mat4::IDENTITY, epsilon)
}

/// Drops the translation of `matrix`, keeping only its linear part.
#[must_use]
pub fn rotation_part(matrix: Mat4) -> Mat3 {
    Mat3::from_mat4(matrix)
}

/// Rebuilds a right-handed orthonormal basis from the first two axes of
/// `matrix` (Gram-Schmidt).
///
/// Scale and shear are discarded. When the axes are degenerate (zero length
/// or parallel) the identity is returned.
#[must_use]
pub fn orthonormalize(matrix: Mat3) -> Mat3 {
    let x = matrix.x_axis.normalize_or_zero();
    let y = matrix.y_axis.normalize_or_zero();
    let z = x.cross(y);
    if z.length() < BASIS_EPSILON {
        return Mat3::IDENTITY;
    }
    let z = z.normalize();
    let y: Vec3 = z.cross(x);
    Mat3::from_cols(x, y, z)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_affine_inverse_of_translation() {
        let m = Mat4::from_translation(Vec3::new(10.0, -2.0, 3.0));
        let inv = affine_inverse(m).unwrap();
        assert!(is_identity(m * inv, IDENTITY_EPSILON));
        assert!(inv.w_axis.truncate().abs_diff_eq(Vec3::new(-10.0, 2.0, -3.0), 1e-6));
    }

    #[test]
    fn test_affine_inverse_of_rotation_and_scale() {
        let m = Mat4::from_scale_rotation_translation(
            Vec3::new(2.0, 2.0, 0.5),
            glam::Quat::from_rotation_z(0.7),
            Vec3::new(1.0, 2.0, 3.0),
        );
        let inv = affine_inverse(m).unwrap();
        assert!(is_identity(inv * m, IDENTITY_EPSILON));
    }

    #[test]
    fn test_affine_inverse_rejects_singular() {
        let m = Mat4::from_scale(Vec3::new(1.0, 0.0, 1.0));
        assert!(affine_inverse(m).is_none());
        assert!(affine_inverse(Mat4::ZERO).is_none());
    }

    #[test]
    fn test_is_identity_tolerance() {
        let nearly = Mat4::from_translation(Vec3::new(0.00005, 0.0, 0.0));
        assert!(is_identity(nearly, IDENTITY_EPSILON));
        let moved = Mat4::from_translation(Vec3::new(0.001, 0.0, 0.0));
        assert!(!is_identity(moved, IDENTITY_EPSILON));
    }

    #[test]
    fn test_linear_determinant_detects_mirror() {
        assert!(linear_determinant(Mat4::from_scale(Vec3::new(-1.0, 1.0, 1.0))) < 0.0);
        assert!(linear_determinant(Mat4::from_rotation_y(1.0)) > 0.0);
    }

    #[test]
    fn test_orthonormalize_removes_drift() {
        let drifted = Mat3::from_cols(
            Vec3::new(1.001, 0.002, 0.0),
            Vec3::new(0.003, 0.998, 0.0),
            Vec3::new(0.0, 0.0, 1.2),
        );
        let fixed = orthonormalize(drifted);
        assert!((fixed.determinant() - 1.0).abs() < 1e-5);
        assert!((fixed.x_axis.length() - 1.0).abs() < 1e-6);
        assert!(fixed.x_axis.dot(fixed.y_axis).abs() < 1e-6);
    }

    #[test]
    fn test_orthonormalize_degenerate_is_identity() {
        let flat = Mat3::from_cols(Vec3::X, Vec3::X * 2.0, Vec3::Z);
        assert_eq!(orthonormalize(flat), Mat3::IDENTITY);
        assert_eq!(orthonormalize(Mat3::ZERO), Mat3::IDENTITY);
    }
}
