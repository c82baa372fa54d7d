//! Transform key codec.
//!
//! A group's accumulated transform is stored in the `_tb_transformation` key
//! as 16 space-separated decimals, written row by row:
//!
//! ```text
//! xx yx zx tx  xy yy zy ty  xz yz zz tz  xw yw zw tw
//! ```
//!
//! so the translation is the 4th, 8th and 12th value. The identity transform
//! is never written; an absent key reads as identity.

use glam::Mat4;
use mapsync_math::{IDENTITY_EPSILON, is_identity};
use mapsync_scene::EntityKeys;
use tracing::warn;

use crate::error::CodecError;

/// Key holding the opaque link identifier shared by linked groups.
pub const LINK_ID_KEY: &str = "_tb_linked_group_id";

/// Key holding the serialised group transform.
pub const TRANSFORM_KEY: &str = "_tb_transformation";

/// Format a number for a key value, without a trailing `.0` and without a
/// negative zero.
pub(crate) fn format_number(value: f32) -> String {
    if value == 0.0 {
        "0".to_string()
    } else {
        value.to_string()
    }
}

/// Parse exactly `N` whitespace-separated finite numbers.
pub(crate) fn parse_numbers<const N: usize>(value: &str) -> Result<[f32; N], CodecError> {
    let tokens: Vec<&str> = value.split_whitespace().collect();
    if tokens.len() != N {
        return Err(CodecError::WrongTokenCount(tokens.len()));
    }
    let mut numbers = [0.0; N];
    for (slot, token) in numbers.iter_mut().zip(tokens) {
        *slot = token
            .parse::<f32>()
            .ok()
            .filter(|n| n.is_finite())
            .ok_or_else(|| CodecError::InvalidNumber(token.to_string()))?;
    }
    Ok(numbers)
}

/// Parse a serialised transform.
///
/// # Errors
///
/// Returns [`CodecError`] unless `value` holds exactly 16 finite numbers.
pub fn parse_transform(value: &str) -> Result<Mat4, CodecError> {
    let rows = parse_numbers::<16>(value)?;
    Ok(Mat4::from_cols_array(&rows).transpose())
}

/// Serialise a transform in row order.
#[must_use]
pub fn format_transform(matrix: Mat4) -> String {
    matrix
        .transpose()
        .to_cols_array()
        .iter()
        .map(|&v| format_number(v))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Read the transform key of an entity. Absent or malformed keys read as
/// identity.
#[must_use]
pub fn read_transform(keys: &EntityKeys) -> Mat4 {
    let value = keys.get(TRANSFORM_KEY);
    if value.is_empty() {
        return Mat4::IDENTITY;
    }
    parse_transform(value).unwrap_or_else(|err| {
        warn!(value, %err, "ignoring malformed group transformation");
        Mat4::IDENTITY
    })
}

/// Write the transform key of an entity. A transform within
/// [`IDENTITY_EPSILON`] of identity removes the key.
pub fn write_transform(keys: &mut EntityKeys, matrix: Mat4) {
    if is_identity(matrix, IDENTITY_EPSILON) {
        keys.set(TRANSFORM_KEY, "");
    } else {
        keys.set(TRANSFORM_KEY, &format_transform(matrix));
    }
}

#[cfg(test)]
mod tests {
    use glam::{Quat, Vec3};

    use super::*;

    #[test]
    fn test_translation_lands_in_fourth_column() {
        let m = Mat4::from_translation(Vec3::new(10.0, 20.0, 30.0));
        assert_eq!(format_transform(m), "1 0 0 10 0 1 0 20 0 0 1 30 0 0 0 1");
    }

    #[test]
    fn test_parse_reads_row_order() {
        let m = parse_transform("1 0 0 10 0 1 0 20 0 0 1 30 0 0 0 1").unwrap();
        assert_eq!(m, Mat4::from_translation(Vec3::new(10.0, 20.0, 30.0)));
    }

    #[test]
    fn test_roundtrip_within_tolerance() {
        let m = Mat4::from_scale_rotation_translation(
            Vec3::new(1.0, 2.0, 0.5),
            Quat::from_euler(glam::EulerRot::ZYX, 0.3, -1.1, 2.0),
            Vec3::new(-128.25, 64.0, 7.125),
        );
        let restored = parse_transform(&format_transform(m)).unwrap();
        assert!(restored.abs_diff_eq(m, 1e-4));
    }

    #[test]
    fn test_parse_rejects_wrong_count_and_garbage() {
        assert_eq!(parse_transform("1 0 0"), Err(CodecError::WrongTokenCount(3)));
        let seventeen = ["1"; 17].join(" ");
        assert_eq!(parse_transform(&seventeen), Err(CodecError::WrongTokenCount(17)));
        let garbage = "1 0 0 x 0 1 0 0 0 0 1 0 0 0 0 1";
        assert_eq!(
            parse_transform(garbage),
            Err(CodecError::InvalidNumber("x".to_string()))
        );
        let nan = "1 0 0 NaN 0 1 0 0 0 0 1 0 0 0 0 1";
        assert!(parse_transform(nan).is_err());
    }

    #[test]
    fn test_malformed_key_reads_identity() {
        let keys = EntityKeys::new().with(TRANSFORM_KEY, "1 2 3");
        assert_eq!(read_transform(&keys), Mat4::IDENTITY);
        assert_eq!(read_transform(&EntityKeys::new()), Mat4::IDENTITY);
    }

    #[test]
    fn test_identity_deletes_key() {
        let mut keys = EntityKeys::new().with(TRANSFORM_KEY, "1 0 0 5 0 1 0 0 0 0 1 0 0 0 0 1");
        write_transform(&mut keys, Mat4::from_translation(Vec3::new(0.00001, 0.0, 0.0)));
        assert!(!keys.has(TRANSFORM_KEY));
    }

    #[test]
    fn test_write_then_read() {
        let mut keys = EntityKeys::new();
        let m = Mat4::from_rotation_z(std::f32::consts::FRAC_PI_2);
        write_transform(&mut keys, m);
        assert!(keys.has(TRANSFORM_KEY));
        assert!(read_transform(&keys).abs_diff_eq(m, 1e-4));
    }
}
