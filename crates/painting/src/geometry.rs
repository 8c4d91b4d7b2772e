//! Surface geometry: world transforms and UV-mapped local meshes.

use glam::{Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Rigid transform with per-axis scale (translation, rotation, scale).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn transform_point(&self, local: Vec3) -> Vec3 {
        self.translation + self.rotation * (local * self.scale)
    }

    pub fn inverse_transform_point(&self, world: Vec3) -> Vec3 {
        (self.rotation.inverse() * (world - self.translation)) / self.scale
    }

    /// World direction to local space (not normalized; scale is divided out)
    pub fn inverse_transform_vector(&self, world: Vec3) -> Vec3 {
        (self.rotation.inverse() * world) / self.scale
    }

    /// Local normal to world space (inverse-transpose for non-uniform scale)
    pub fn transform_normal(&self, local: Vec3) -> Vec3 {
        (self.rotation * (local / self.scale)).normalize_or_zero()
    }

    /// Meters-to-UV reference scale: the larger of |scale.x| and |scale.z|.
    ///
    /// Y scale and rotation shear are ignored, so paint radius is only
    /// approximate on non-uniformly scaled or rotated surfaces.
    pub fn lossy_xz_scale(&self) -> f32 {
        self.scale.x.abs().max(self.scale.z.abs())
    }
}

/// Local-space triangle mesh with per-vertex UVs, used for UV probing.
#[derive(Debug, Clone)]
pub struct SurfaceMesh {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    /// Triangle indices (3 per triangle, counter-clockwise front faces)
    pub indices: Vec<u32>,
}

impl SurfaceMesh {
    /// Flat square in the XZ plane centered at the origin, facing +Y.
    /// `size` is the edge length (the stock primitive plane is 10 units).
    pub fn plane(size: f32) -> Self {
        let h = size * 0.5;
        Self {
            positions: vec![
                Vec3::new(-h, 0.0, -h),
                Vec3::new(h, 0.0, -h),
                Vec3::new(h, 0.0, h),
                Vec3::new(-h, 0.0, h),
            ],
            normals: vec![Vec3::Y; 4],
            uvs: vec![
                Vec2::new(0.0, 0.0),
                Vec2::new(1.0, 0.0),
                Vec2::new(1.0, 1.0),
                Vec2::new(0.0, 1.0),
            ],
            indices: vec![0, 2, 1, 0, 3, 2],
        }
    }

    /// Unit cube centered at the origin; every face spans the full 0..1 UV square.
    pub fn cube() -> Self {
        // (normal, u axis, v axis) per face
        let faces = [
            (Vec3::X, Vec3::NEG_Z, Vec3::Y),
            (Vec3::NEG_X, Vec3::Z, Vec3::Y),
            (Vec3::Y, Vec3::X, Vec3::NEG_Z),
            (Vec3::NEG_Y, Vec3::X, Vec3::Z),
            (Vec3::Z, Vec3::X, Vec3::Y),
            (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
        ];

        let mut mesh = Self {
            positions: Vec::with_capacity(24),
            normals: Vec::with_capacity(24),
            uvs: Vec::with_capacity(24),
            indices: Vec::with_capacity(36),
        };

        for (normal, u_axis, v_axis) in faces {
            let base = mesh.positions.len() as u32;
            for (du, dv) in [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)] {
                let p = normal * 0.5 + u_axis * (du - 0.5) + v_axis * (dv - 0.5);
                mesh.positions.push(p);
                mesh.normals.push(normal);
                mesh.uvs.push(Vec2::new(du, dv));
            }
            mesh.indices
                .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
        mesh
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn triangle_indices(&self, tri_index: usize) -> (u32, u32, u32) {
        let base = tri_index * 3;
        (
            self.indices[base],
            self.indices[base + 1],
            self.indices[base + 2],
        )
    }

    pub fn triangle_positions(&self, tri_index: usize) -> (Vec3, Vec3, Vec3) {
        let (i0, i1, i2) = self.triangle_indices(tri_index);
        (
            self.positions[i0 as usize],
            self.positions[i1 as usize],
            self.positions[i2 as usize],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_round_trip() {
        let t = Transform::from_translation(Vec3::new(1.0, 2.0, 3.0))
            .with_rotation(Quat::from_rotation_y(0.7))
            .with_scale(Vec3::new(2.0, 1.0, 4.0));
        let p = Vec3::new(0.3, -0.2, 0.9);
        let back = t.inverse_transform_point(t.transform_point(p));
        assert!((back - p).length() < 1e-5);
    }

    #[test]
    fn test_lossy_scale_ignores_y() {
        let t = Transform::IDENTITY.with_scale(Vec3::new(4.0, 100.0, 2.0));
        assert_eq!(t.lossy_xz_scale(), 4.0);
    }

    #[test]
    fn test_cube_faces_point_outward() {
        let cube = SurfaceMesh::cube();
        assert_eq!(cube.triangle_count(), 12);
        for tri in 0..cube.triangle_count() {
            let (a, b, c) = cube.triangle_positions(tri);
            let face_normal = (b - a).cross(c - a).normalize();
            let (i0, _, _) = cube.triangle_indices(tri);
            assert!(face_normal.dot(cube.normals[i0 as usize]) > 0.99);
        }
    }

    #[test]
    fn test_plane_faces_up() {
        let plane = SurfaceMesh::plane(10.0);
        let (a, b, c) = plane.triangle_positions(0);
        assert!((b - a).cross(c - a).normalize().dot(Vec3::Y) > 0.99);
    }
}
