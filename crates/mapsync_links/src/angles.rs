//! Position and orientation keys.
//!
//! Entities encode orientation in one of several ways, in order of
//! precedence:
//!
//! - `light_rotation` / `rotation`: nine numbers, the rotated X, Y and Z
//!   axes.
//! - `angles`: `pitch yaw roll` in degrees.
//! - `angle`: a single yaw in degrees. Classes with a direction key also
//!   accept `-1` (up) and `-2` (down).
//!
//! Euler angles are handled as `(roll, pitch, yaw)` vectors, matching
//! [`mapsync_math::euler`].

use glam::{Mat3, Vec3};
use mapsync_math::{IDENTITY_EPSILON, normalised_degrees};
use mapsync_scene::EntityKeys;

use crate::codec::{format_number, parse_numbers};

pub const ORIGIN_KEY: &str = "origin";
pub const ANGLE_KEY: &str = "angle";
pub const ANGLES_KEY: &str = "angles";
pub const ROTATION_KEY: &str = "rotation";
pub const LIGHT_ROTATION_KEY: &str = "light_rotation";

/// Read an `origin` value. Malformed values read as the map origin.
#[must_use]
pub fn read_origin(value: &str) -> Vec3 {
    parse_numbers::<3>(value).map_or(Vec3::ZERO, Vec3::from_array)
}

/// Write `origin` to `key`.
pub fn write_origin(keys: &mut EntityKeys, key: &str, origin: Vec3) {
    let value = origin.to_array().map(format_number).join(" ");
    keys.set(key, &value);
}

/// Read a single-yaw `angle` value.
#[must_use]
pub fn read_angle(value: &str) -> Vec3 {
    match parse_numbers::<1>(value) {
        Ok([yaw]) => normalised_degrees(Vec3::new(0.0, 0.0, yaw)),
        Err(_) => Vec3::ZERO,
    }
}

/// Read an `angle` value of a class with a direction key.
#[must_use]
pub fn read_direction_angle(value: &str) -> Vec3 {
    match value.trim() {
        "-1" => Vec3::new(0.0, -90.0, 0.0),
        "-2" => Vec3::new(0.0, 90.0, 0.0),
        _ => read_angle(value),
    }
}

/// Read an `angles` value (`pitch yaw roll`).
///
/// With `quake1_bug` the stored pitch is inverted.
#[must_use]
pub fn read_angles(value: &str, quake1_bug: bool) -> Vec3 {
    match parse_numbers::<3>(value) {
        Ok([pitch, yaw, roll]) => {
            let pitch = if quake1_bug { -pitch } else { pitch };
            normalised_degrees(Vec3::new(roll, pitch, yaw))
        }
        Err(_) => Vec3::ZERO,
    }
}

/// Write Euler angles using the most compact key: nothing for zero, `angle`
/// for a pure yaw, `angles` otherwise.
pub fn write_angles(keys: &mut EntityKeys, angles: Vec3, quake1_bug: bool) {
    if angles == Vec3::ZERO {
        keys.set(ANGLE_KEY, "");
        keys.set(ANGLES_KEY, "");
    } else if angles.x == 0.0 && angles.y == 0.0 {
        keys.set(ANGLES_KEY, "");
        keys.set(ANGLE_KEY, &format_number(angles.z));
    } else {
        let pitch = if quake1_bug { -angles.y } else { angles.y };
        let value = [pitch, angles.z, angles.x].map(format_number).join(" ");
        keys.set(ANGLE_KEY, "");
        keys.set(ANGLES_KEY, &value);
    }
}

/// Read a nine-number rotation value. Malformed values read as identity.
#[must_use]
pub fn read_rotation(value: &str) -> Mat3 {
    parse_numbers::<9>(value).map_or(Mat3::IDENTITY, |m| Mat3::from_cols_array(&m))
}

/// Write a rotation matrix to `key`. The identity removes the key.
pub fn write_rotation(keys: &mut EntityKeys, key: &str, rotation: Mat3) {
    if rotation.abs_diff_eq(Mat3::IDENTITY, IDENTITY_EPSILON) {
        keys.set(key, "");
    } else {
        let value = rotation.to_cols_array().map(format_number).join(" ");
        keys.set(key, &value);
    }
}

/// Returns the matrix rotation key present on `keys`, preferring
/// `light_rotation`.
#[must_use]
pub fn rotation_key(keys: &EntityKeys) -> Option<&'static str> {
    [LIGHT_ROTATION_KEY, ROTATION_KEY]
        .into_iter()
        .find(|key| keys.has(key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_roundtrip() {
        let mut keys = EntityKeys::new();
        write_origin(&mut keys, ORIGIN_KEY, Vec3::new(16.0, -8.5, 0.0));
        assert_eq!(keys.get(ORIGIN_KEY), "16 -8.5 0");
        assert_eq!(read_origin(keys.get(ORIGIN_KEY)), Vec3::new(16.0, -8.5, 0.0));
        assert_eq!(read_origin("garbage"), Vec3::ZERO);
    }

    #[test]
    fn test_read_angle_normalises() {
        assert_eq!(read_angle("-90"), Vec3::new(0.0, 0.0, 270.0));
        assert_eq!(read_angle(""), Vec3::ZERO);
    }

    #[test]
    fn test_direction_angle_up_and_down() {
        assert_eq!(read_direction_angle("-1"), Vec3::new(0.0, -90.0, 0.0));
        assert_eq!(read_direction_angle("-2"), Vec3::new(0.0, 90.0, 0.0));
        assert_eq!(read_direction_angle("45"), Vec3::new(0.0, 0.0, 45.0));
    }

    #[test]
    fn test_read_angles_reorders_and_applies_quake1_bug() {
        assert_eq!(read_angles("10 20 30", false), Vec3::new(30.0, 10.0, 20.0));
        assert_eq!(read_angles("10 20 30", true), Vec3::new(30.0, 350.0, 20.0));
    }

    #[test]
    fn test_write_angles_picks_compact_key() {
        let mut keys = EntityKeys::new().with(ANGLES_KEY, "1 2 3");
        write_angles(&mut keys, Vec3::new(0.0, 0.0, 90.0), false);
        assert_eq!(keys.get(ANGLE_KEY), "90");
        assert!(!keys.has(ANGLES_KEY));

        write_angles(&mut keys, Vec3::new(30.0, 10.0, 20.0), true);
        assert_eq!(keys.get(ANGLES_KEY), "-10 20 30");
        assert!(!keys.has(ANGLE_KEY));

        write_angles(&mut keys, Vec3::ZERO, false);
        assert!(keys.is_empty());
    }

    #[test]
    fn test_rotation_key_precedence_and_identity() {
        let mut keys = EntityKeys::new()
            .with(ROTATION_KEY, "1 0 0 0 1 0 0 0 1")
            .with(LIGHT_ROTATION_KEY, "0 1 0 -1 0 0 0 0 1");
        assert_eq!(rotation_key(&keys), Some(LIGHT_ROTATION_KEY));
        let rotation = read_rotation(keys.get(LIGHT_ROTATION_KEY));
        assert!((rotation * Vec3::X).abs_diff_eq(Vec3::Y, 1e-6));

        write_rotation(&mut keys, LIGHT_ROTATION_KEY, Mat3::IDENTITY);
        assert_eq!(rotation_key(&keys), Some(ROTATION_KEY));
        assert!(rotation_key(&EntityKeys::new()).is_none());
    }
}
