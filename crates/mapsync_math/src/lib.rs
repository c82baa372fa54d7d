//! # mapsync_math
//!
//! Math helpers for linked-group synchronization. Re-exports [`glam`] for
//! linear algebra and adds the handful of operations the synchronization
//! engine needs on top of it:
//!
//! - [`affine`]: guarded affine inverse, epsilon identity tests, rotation
//!   extraction and Gram-Schmidt re-orthonormalisation.
//! - [`euler`]: conversions between rotation matrices and Euler angles in
//!   degrees, as stored in entity key-values.

pub mod affine;
pub mod euler;

// Re-export glam types for convenience.
pub use glam::{Affine3A, EulerRot, Mat3, Mat4, Quat, Vec2, Vec3, Vec4};

pub use affine::{
    IDENTITY_EPSILON, affine_inverse, is_identity, linear_determinant, orthonormalize,
    rotation_part,
};
pub use euler::{
    euler_degrees_from_rotation, normalised_degrees, rotation_from_euler_degrees,
    rotation_from_euler_degrees_quantised, snapped_to_zero,
};
