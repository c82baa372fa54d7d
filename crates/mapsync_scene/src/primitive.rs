//! Brush and patch geometry.
//!
//! Coordinates are absolute map-space positions. Transforms are applied to
//! the stored points directly; a mirroring transform also flips winding so
//! faces keep pointing outward.

use glam::{Mat4, Vec2, Vec3};
use mapsync_math::linear_determinant;
use serde::{Deserialize, Serialize};

/// One brush face: a plane given by three points (clockwise seen from
/// outside) and its shader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Face {
    /// The three plane points.
    pub points: [Vec3; 3],
    /// Shader (texture) name.
    pub shader: String,
}

/// A convex brush described by its bounding planes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Brush {
    /// The brush faces.
    pub faces: Vec<Face>,
}

impl Brush {
    /// Create an axis-aligned box brush.
    #[must_use]
    pub fn cuboid(min: Vec3, max: Vec3, shader: &str) -> Self {
        let face = |a: Vec3, b: Vec3, c: Vec3| Face {
            points: [a, b, c],
            shader: shader.to_string(),
        };
        let (x0, y0, z0) = (min.x, min.y, min.z);
        let (x1, y1, z1) = (max.x, max.y, max.z);
        Self {
            faces: vec![
                face(Vec3::new(x0, y0, z0), Vec3::new(x0, y1, z0), Vec3::new(x0, y0, z1)),
                face(Vec3::new(x1, y0, z0), Vec3::new(x1, y0, z1), Vec3::new(x1, y1, z0)),
                face(Vec3::new(x0, y0, z0), Vec3::new(x0, y0, z1), Vec3::new(x1, y0, z0)),
                face(Vec3::new(x0, y1, z0), Vec3::new(x1, y1, z0), Vec3::new(x0, y1, z1)),
                face(Vec3::new(x0, y0, z0), Vec3::new(x1, y0, z0), Vec3::new(x0, y1, z0)),
                face(Vec3::new(x0, y0, z1), Vec3::new(x0, y1, z1), Vec3::new(x1, y0, z1)),
            ],
        }
    }

    /// Transform every face by `matrix`.
    pub fn transform(&mut self, matrix: Mat4) {
        let mirrored = linear_determinant(matrix) < 0.0;
        for face in &mut self.faces {
            for point in &mut face.points {
                *point = matrix.transform_point3(*point);
            }
            if mirrored {
                face.points.swap(0, 2);
            }
        }
    }

    /// Returns a copy transformed by `matrix`.
    #[must_use]
    pub fn transformed(&self, matrix: Mat4) -> Self {
        let mut brush = self.clone();
        brush.transform(matrix);
        brush
    }

    /// Returns `true` if both brushes have the same faces with every point
    /// within `epsilon`.
    #[must_use]
    pub fn abs_diff_eq(&self, other: &Self, epsilon: f32) -> bool {
        self.faces.len() == other.faces.len()
            && self.faces.iter().zip(&other.faces).all(|(a, b)| {
                a.shader == b.shader
                    && a.points
                        .iter()
                        .zip(&b.points)
                        .all(|(p, q)| p.abs_diff_eq(*q, epsilon))
            })
    }
}

/// One control point of a patch mesh.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PatchControl {
    /// Position in map space.
    pub vertex: Vec3,
    /// Texture coordinate.
    pub texcoord: Vec2,
}

/// A bezier patch: a `width × height` grid of control points stored row by
/// row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patch {
    /// Number of control points per row.
    pub width: usize,
    /// Number of rows.
    pub height: usize,
    /// Control points, `height` rows of `width` entries.
    pub controls: Vec<PatchControl>,
    /// Shader name.
    pub shader: String,
}

impl Patch {
    /// Create a flat patch from rows of vertices. Texture coordinates are
    /// assigned from the grid position.
    #[must_use]
    pub fn from_rows(rows: &[Vec<Vec3>], shader: &str) -> Self {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        let mut controls = Vec::with_capacity(width * height);
        for (r, row) in rows.iter().enumerate() {
            for (c, vertex) in row.iter().enumerate() {
                controls.push(PatchControl {
                    vertex: *vertex,
                    texcoord: Vec2::new(c as f32, r as f32),
                });
            }
        }
        Self {
            width,
            height,
            controls,
            shader: shader.to_string(),
        }
    }

    /// Transform every control vertex by `matrix`, then bake the result.
    pub fn transform(&mut self, matrix: Mat4) {
        for control in &mut self.controls {
            control.vertex = matrix.transform_point3(control.vertex);
        }
        if linear_determinant(matrix) < 0.0 && self.width > 0 {
            for row in self.controls.chunks_mut(self.width) {
                row.reverse();
            }
        }
    }

    /// Returns `true` if both patches have the same layout with every vertex
    /// within `epsilon`.
    #[must_use]
    pub fn abs_diff_eq(&self, other: &Self, epsilon: f32) -> bool {
        self.width == other.width
            && self.height == other.height
            && self.shader == other.shader
            && self
                .controls
                .iter()
                .zip(&other.controls)
                .all(|(a, b)| a.vertex.abs_diff_eq(b.vertex, epsilon) && a.texcoord == b.texcoord)
    }
}
