//! UV rays: find where a short ray lands on a surface mesh.

use glam::{Vec2, Vec3};

use crate::geometry::{SurfaceMesh, Transform};

/// Minimum determinant and hit distance accepted by a UV ray
const RAY_EPSILON: f32 = 1e-6;

/// A normalized ray segment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UvRay {
    pub origin: Vec3,
    pub direction: Vec3,
    pub length: f32,
}

impl UvRay {
    /// `None` for a zero direction
    pub fn new(origin: Vec3, direction: Vec3, length: f32) -> Option<Self> {
        let direction = direction.try_normalize()?;
        Some(Self {
            origin,
            direction,
            length,
        })
    }

    #[inline]
    pub fn at(&self, distance: f32) -> Vec3 {
        self.origin + self.direction * distance
    }

    /// Weights of the crossing point and its distance, if the ray crosses
    /// the triangle from either side within its length.
    pub fn cross_triangle(&self, [a, b, c]: [Vec3; 3]) -> Option<(Barycentric, f32)> {
        let ab = b - a;
        let ac = c - a;
        let p = self.direction.cross(ac);
        let det = ab.dot(p);
        if det.abs() < RAY_EPSILON {
            return None;
        }

        let inv = det.recip();
        let to_origin = self.origin - a;
        let wb = to_origin.dot(p) * inv;
        if !(0.0..=1.0).contains(&wb) {
            return None;
        }

        let q = to_origin.cross(ab);
        let wc = self.direction.dot(q) * inv;
        if wc < 0.0 || wb + wc > 1.0 {
            return None;
        }

        let distance = ac.dot(q) * inv;
        (RAY_EPSILON..=self.length)
            .contains(&distance)
            .then_some((Barycentric { wb, wc }, distance))
    }
}

/// Barycentric weights of the second and third corners
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Barycentric {
    pub wb: f32,
    pub wc: f32,
}

impl Barycentric {
    #[inline]
    pub fn wa(&self) -> f32 {
        1.0 - self.wb - self.wc
    }

    /// Blend one attribute across the triangle corners
    pub fn blend<T>(&self, [a, b, c]: [T; 3]) -> T
    where
        T: std::ops::Mul<f32, Output = T> + std::ops::Add<Output = T>,
    {
        a * self.wa() + b * self.wb + c * self.wc
    }
}

/// Where a UV ray landed.
///
/// Distances and positions are in the space the ray was cast in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UvHit {
    pub point: Vec3,
    pub distance: f32,
    pub normal: Vec3,
    pub uv: Vec2,
    pub triangle: usize,
}

/// Nearest crossing of `ray` with `mesh`, both in mesh space
pub fn cast_mesh(ray: &UvRay, mesh: &SurfaceMesh) -> Option<UvHit> {
    // Paintable meshes are small primitives; a linear scan is enough
    let (weights, distance, triangle) = (0..mesh.triangle_count())
        .filter_map(|tri| {
            let (a, b, c) = mesh.triangle_positions(tri);
            ray.cross_triangle([a, b, c]).map(|(w, d)| (w, d, tri))
        })
        .min_by(|x, y| x.1.total_cmp(&y.1))?;

    let (i, j, k) = mesh.triangle_indices(triangle);
    let corners = [i as usize, j as usize, k as usize];
    Some(UvHit {
        point: ray.at(distance),
        distance,
        normal: weights
            .blend(corners.map(|n| mesh.normals[n]))
            .normalize_or_zero(),
        uv: weights.blend(corners.map(|n| mesh.uvs[n])),
        triangle,
    })
}

/// Cast against a mesh placed in the world by `transform`.
///
/// `length` and the returned distance are world units; scale is folded
/// into the mesh-space ray.
pub fn cast_placed_mesh(
    origin: Vec3,
    direction: Vec3,
    length: f32,
    mesh: &SurfaceMesh,
    transform: &Transform,
) -> Option<UvHit> {
    let direction = direction.try_normalize()?;
    let local = transform.inverse_transform_vector(direction);
    let stretch = local.length();
    if stretch < RAY_EPSILON {
        return None;
    }

    let ray = UvRay::new(
        transform.inverse_transform_point(origin),
        local,
        length * stretch,
    )?;
    let hit = cast_mesh(&ray, mesh)?;
    Some(UvHit {
        point: transform.transform_point(hit.point),
        distance: hit.distance / stretch,
        normal: transform.transform_normal(hit.normal),
        ..hit
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRI: [Vec3; 3] = [Vec3::ZERO, Vec3::X, Vec3::Y];

    #[test]
    fn test_ray_crosses_either_face() {
        let down = UvRay::new(Vec3::new(0.2, 0.3, 1.0), Vec3::NEG_Z, 5.0).unwrap();
        let (w, d) = down.cross_triangle(TRI).unwrap();
        assert!((d - 1.0).abs() < 1e-6);
        assert!((w.wb - 0.2).abs() < 1e-6 && (w.wc - 0.3).abs() < 1e-6);

        let up = UvRay::new(Vec3::new(0.2, 0.3, -1.0), Vec3::Z, 5.0).unwrap();
        assert!(up.cross_triangle(TRI).is_some());
    }

    #[test]
    fn test_ray_rejects_outside_and_short() {
        let outside = UvRay::new(Vec3::new(0.8, 0.8, 1.0), Vec3::NEG_Z, 5.0).unwrap();
        assert!(outside.cross_triangle(TRI).is_none());

        let away = UvRay::new(Vec3::new(0.2, 0.2, 1.0), Vec3::Z, 5.0).unwrap();
        assert!(away.cross_triangle(TRI).is_none());

        let short = UvRay::new(Vec3::new(0.2, 0.2, 1.0), Vec3::NEG_Z, 0.5).unwrap();
        assert!(short.cross_triangle(TRI).is_none());
        assert!(UvRay::new(Vec3::ZERO, Vec3::ZERO, 1.0).is_none());
    }

    #[test]
    fn test_blend_at_corner_and_centroid() {
        let uvs = [Vec2::ZERO, Vec2::X, Vec2::Y];
        let corner = Barycentric { wb: 1.0, wc: 0.0 };
        assert_eq!(corner.blend(uvs), Vec2::X);

        let centroid = Barycentric {
            wb: 1.0 / 3.0,
            wc: 1.0 / 3.0,
        };
        assert!((centroid.blend(uvs) - Vec2::splat(1.0 / 3.0)).length() < 1e-6);
    }

    #[test]
    fn test_plane_center_maps_to_uv_center() {
        let plane = SurfaceMesh::plane(10.0);
        let ray = UvRay::new(Vec3::Y, Vec3::NEG_Y, 2.0).unwrap();
        let hit = cast_mesh(&ray, &plane).unwrap();
        assert!((hit.uv - Vec2::splat(0.5)).length() < 1e-4);
        assert!((hit.normal - Vec3::Y).length() < 1e-4);

        let far = UvRay::new(Vec3::new(0.0, 3.0, 0.0), Vec3::NEG_Y, 2.0).unwrap();
        assert!(cast_mesh(&far, &plane).is_none());
    }

    #[test]
    fn test_placed_cast_uses_world_units() {
        let plane = SurfaceMesh::plane(10.0);
        let transform = Transform::from_translation(Vec3::Y).with_scale(Vec3::new(4.0, 1.0, 4.0));

        // 40 m wide after scaling, so x = 10 is three quarters across
        let hit = cast_placed_mesh(Vec3::new(10.0, 1.5, 0.0), Vec3::NEG_Y, 1.0, &plane, &transform)
            .unwrap();
        assert!((hit.distance - 0.5).abs() < 1e-4);
        assert!((hit.uv.x - 0.75).abs() < 1e-4);
        assert!((hit.point - Vec3::new(10.0, 1.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn test_cube_cast_hits_nearest_face() {
        let cube = SurfaceMesh::cube();
        let ray = UvRay::new(Vec3::new(0.1, 0.1, 3.0), Vec3::NEG_Z, 10.0).unwrap();
        let hit = cast_mesh(&ray, &cube).unwrap();
        assert!(hit.point.z > 0.0);
        assert!(hit.normal.z > 0.9);
    }
}
