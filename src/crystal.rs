//! Procedural crystal: geodesic polyhedron with deterministic displacement.
//!
//! - Base: regular icosahedron on the unit sphere (12 vertices, 20 faces)
//! - Subdivision: every face splits into four; shared edge midpoints are
//!   memoized so neighbouring faces reuse the same vertex
//! - Displacement: per-vertex radius from a `sin` hash of the vertex index
//!   and a generation seed (stable within a generation, new per regeneration)
//! - Projection: rotate, then perspective-divide onto the canvas

use std::collections::HashMap;

use rayon::prelude::*;

use crate::fast_math::{fract, Vec2, Vec3};

/// Highest accepted subdivision level (642 vertices / 1280 faces).
pub const MAX_SUBDIVISION: u32 = 3;

/// Perspective focal length in pixels, shared with the particle layers.
pub const FOCAL_LENGTH: f32 = 1000.0;

/// Fraction of vertices pulled inward by the displacement.
const SHRINK_SHARE: f32 = 0.35;

/// Vertex count above which projection runs on the rayon pool.
const PARALLEL_MIN_VERTICES: usize = 256;

/// Triangle mesh: vertex positions plus index triples.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Vec3>,
    pub faces: Vec<[u32; 3]>,
}

impl Mesh {
    /// Regular icosahedron with every vertex on the unit sphere.
    pub fn icosahedron() -> Self {
        let t = (1.0 + 5f32.sqrt()) / 2.0;
        #[rustfmt::skip]
        let raw = [
            [-1.0,  t,  0.0], [ 1.0,  t,  0.0], [-1.0, -t,  0.0], [ 1.0, -t,  0.0],
            [ 0.0, -1.0,  t], [ 0.0,  1.0,  t], [ 0.0, -1.0, -t], [ 0.0,  1.0, -t],
            [ t,  0.0, -1.0], [ t,  0.0,  1.0], [-t,  0.0, -1.0], [-t,  0.0,  1.0],
        ];
        let vertices = raw
            .iter()
            .map(|&[x, y, z]| {
                let len = (x * x + y * y + z * z).sqrt();
                Vec3::new(x / len, y / len, z / len)
            })
            .collect();

        #[rustfmt::skip]
        let faces = vec![
            [0, 11, 5], [0, 5, 1], [0, 1, 7], [0, 7, 10], [0, 10, 11],
            [1, 5, 9], [5, 11, 4], [11, 10, 2], [10, 7, 6], [7, 1, 8],
            [3, 9, 4], [3, 4, 2], [3, 2, 6], [3, 6, 8], [3, 8, 9],
            [4, 9, 5], [2, 4, 11], [6, 2, 10], [8, 6, 7], [9, 8, 1],
        ];

        Self { vertices, faces }
    }

    /// Icosahedron subdivided `level` times (clamped to [`MAX_SUBDIVISION`]).
    pub fn geodesic(level: u32) -> Self {
        let mut mesh = Self::icosahedron();
        for _ in 0..level.min(MAX_SUBDIVISION) {
            mesh = mesh.subdivide();
        }
        mesh
    }

    /// One 1→4 split of every face with normalized edge midpoints.
    pub fn subdivide(&self) -> Self {
        let mut vertices = self.vertices.clone();
        let mut cache: HashMap<(u32, u32), u32> = HashMap::with_capacity(self.faces.len() * 3 / 2);
        let mut faces = Vec::with_capacity(self.faces.len() * 4);

        for &[a, b, c] in &self.faces {
            let ab = midpoint_index(&mut cache, &mut vertices, a, b);
            let bc = midpoint_index(&mut cache, &mut vertices, b, c);
            let ca = midpoint_index(&mut cache, &mut vertices, c, a);
            faces.push([a, ab, ca]);
            faces.push([b, bc, ab]);
            faces.push([c, ca, bc]);
            faces.push([ab, bc, ca]);
        }

        Self { vertices, faces }
    }

    /// Number of distinct undirected edges.
    pub fn edge_count(&self) -> usize {
        let mut edges: HashMap<(u32, u32), u32> = HashMap::new();
        for &[a, b, c] in &self.faces {
            for (u, v) in [(a, b), (b, c), (c, a)] {
                *edges.entry(edge_key(u, v)).or_insert(0) += 1;
            }
        }
        edges.len()
    }
}

#[inline]
fn edge_key(a: u32, b: u32) -> (u32, u32) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Index of the (unit-sphere) midpoint of edge `a-b`, created on first use.
fn midpoint_index(
    cache: &mut HashMap<(u32, u32), u32>,
    vertices: &mut Vec<Vec3>,
    a: u32,
    b: u32,
) -> u32 {
    let key = edge_key(a, b);
    if let Some(&idx) = cache.get(&key) {
        return idx;
    }
    let va = vertices[a as usize];
    let vb = vertices[b as usize];
    let mid = (va + vb) * 0.5;
    // Antipodal endpoints never share an edge on an icosphere.
    let mid = mid.normalize().unwrap_or(va);
    let idx = vertices.len() as u32;
    vertices.push(mid);
    cache.insert(key, idx);
    idx
}

/// Classic `sin` hash in `[0, 1)`, deterministic in `(index, seed)`.
pub fn crystal_noise(index: u32, seed: u32) -> f32 {
    let x = (index as f64 * 12.9898 + seed as f64 * 78.233).sin() * 43758.5453;
    fract(x as f32)
}

/// Radius multiplier for a noise value: the lowest [`SHRINK_SHARE`] of the
/// range pulls inward (down to 0.78), the rest pushes outward (up to 1.18).
pub fn radius_factor(noise: f32) -> f32 {
    if noise < SHRINK_SHARE {
        0.78 + 0.22 * (noise / SHRINK_SHARE)
    } else {
        1.0 + 0.18 * ((noise - SHRINK_SHARE) / (1.0 - SHRINK_SHARE))
    }
}

/// A displaced geodesic mesh ready to be rotated and projected.
#[derive(Debug, Clone)]
pub struct Crystal {
    pub mesh: Mesh,
    pub level: u32,
    pub seed: u32,
}

/// A face that survived back-face culling.
#[derive(Debug, Clone, Copy)]
pub struct ShadedFace {
    pub points: [Vec2; 3],
    /// `0` edge-on, `1` facing the viewer.
    pub facing: f32,
    /// Mean view-space depth, for back-to-front ordering.
    pub depth: f32,
}

/// One frame's rotated + projected crystal.
#[derive(Debug, Clone, Default)]
pub struct Projection {
    pub rotated: Vec<Vec3>,
    pub points: Vec<Vec2>,
}

impl Crystal {
    pub fn generate(level: u32, seed: u32) -> Self {
        let mut mesh = Mesh::geodesic(level);
        for (i, v) in mesh.vertices.iter_mut().enumerate() {
            *v = *v * radius_factor(crystal_noise(i as u32, seed));
        }
        log::debug!(
            "crystal generated: level={} seed={} vertices={} faces={}",
            level,
            seed,
            mesh.vertices.len(),
            mesh.faces.len()
        );
        Self {
            mesh,
            level: level.min(MAX_SUBDIVISION),
            seed,
        }
    }

    /// Rotate every vertex and perspective-project it around `center`.
    pub fn project(&self, angles: Vec3, center: Vec2, radius: f32) -> Projection {
        let transform = |v: &Vec3| {
            let r = v.rotate(angles);
            let scale = FOCAL_LENGTH / (FOCAL_LENGTH + r.z * radius);
            (r, Vec2::new(center.x + r.x * radius * scale, center.y + r.y * radius * scale))
        };

        let pairs: Vec<(Vec3, Vec2)> = if self.mesh.vertices.len() >= PARALLEL_MIN_VERTICES {
            self.mesh.vertices.par_iter().map(transform).collect()
        } else {
            self.mesh.vertices.iter().map(transform).collect()
        };
        let (rotated, points) = pairs.into_iter().unzip();
        Projection { rotated, points }
    }

    /// Faces turned toward the viewer (negative z), sorted back to front.
    pub fn visible_faces(&self, projection: &Projection) -> Vec<ShadedFace> {
        let mut faces: Vec<ShadedFace> = self
            .mesh
            .faces
            .iter()
            .filter_map(|&[a, b, c]| {
                let (a, b, c) = (a as usize, b as usize, c as usize);
                let va = *projection.rotated.get(a)?;
                let vb = *projection.rotated.get(b)?;
                let vc = *projection.rotated.get(c)?;
                let mut normal = (vb - va).cross(vc - va).normalize()?;
                let mid = (va + vb + vc) * (1.0 / 3.0);
                if normal.dot(mid) < 0.0 {
                    normal = normal * -1.0;
                }
                if normal.z >= 0.0 {
                    return None;
                }
                Some(ShadedFace {
                    points: [projection.points[a], projection.points[b], projection.points[c]],
                    facing: -normal.z,
                    depth: mid.z,
                })
            })
            .collect();
        faces.sort_by(|x, y| y.depth.total_cmp(&x.depth));
        faces
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{convex_hull, point_in_convex};

    #[test]
    fn test_icosahedron_counts_and_unit_sphere() {
        let m = Mesh::icosahedron();
        assert_eq!(m.vertices.len(), 12);
        assert_eq!(m.faces.len(), 20);
        assert_eq!(m.edge_count(), 30);
        for v in &m.vertices {
            assert!((v.length() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_subdivision_counts_follow_v_plus_e() {
        let mut mesh = Mesh::icosahedron();
        for _ in 0..MAX_SUBDIVISION {
            let v = mesh.vertices.len();
            let e = mesh.edge_count();
            let f = mesh.faces.len();
            let next = mesh.subdivide();
            assert_eq!(next.vertices.len(), v + e);
            assert_eq!(next.faces.len(), 4 * f);
            mesh = next;
        }
        assert_eq!(mesh.vertices.len(), 642);
        assert_eq!(mesh.faces.len(), 1280);
    }

    #[test]
    fn test_levels_are_closed_manifolds_on_unit_sphere() {
        for level in 0..=2 {
            let mesh = Mesh::geodesic(level);
            let mut edges: HashMap<(u32, u32), u32> = HashMap::new();
            for &[a, b, c] in &mesh.faces {
                for (u, v) in [(a, b), (b, c), (c, a)] {
                    *edges.entry(edge_key(u, v)).or_insert(0) += 1;
                }
            }
            assert!(edges.values().all(|&n| n == 2), "level {} has an open edge", level);
            // Euler characteristic of a sphere
            let chi = mesh.vertices.len() as i64 - edges.len() as i64 + mesh.faces.len() as i64;
            assert_eq!(chi, 2);
            for v in &mesh.vertices {
                assert!((v.length() - 1.0).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn test_level_is_clamped() {
        assert_eq!(Mesh::geodesic(9).vertices.len(), 642);
    }

    #[test]
    fn test_noise_is_deterministic_and_in_range() {
        for i in 0..200 {
            let a = crystal_noise(i, 3);
            assert_eq!(a, crystal_noise(i, 3));
            assert!((0.0..1.0).contains(&a));
        }
    }

    #[test]
    fn test_displacement_varies_with_seed() {
        let a = Crystal::generate(1, 1);
        let b = Crystal::generate(1, 1);
        let c = Crystal::generate(1, 2);
        assert_eq!(a.mesh, b.mesh);
        assert_ne!(a.mesh, c.mesh);
    }

    #[test]
    fn test_displacement_shrinks_some_and_grows_others() {
        let crystal = Crystal::generate(2, 7);
        let radii: Vec<f32> = crystal.mesh.vertices.iter().map(|v| v.length()).collect();
        let shrunk = radii.iter().filter(|&&r| r < 1.0).count();
        assert!(shrunk > 0 && shrunk < radii.len());
        assert!(radii.iter().all(|&r| (0.77..=1.19).contains(&r)));
        // Roughly a third pulled in
        let share = shrunk as f32 / radii.len() as f32;
        assert!((0.2..0.5).contains(&share), "shrink share {}", share);
    }

    #[test]
    fn test_radius_factor_ranges() {
        assert!((radius_factor(0.0) - 0.78).abs() < 1e-6);
        assert!(radius_factor(0.349) < 1.0);
        assert!((radius_factor(0.35) - 1.0).abs() < 1e-6);
        assert!(radius_factor(0.999) <= 1.18 + 1e-6);
    }

    #[test]
    fn test_projection_is_centered_and_hull_wraps_points() {
        let crystal = Crystal::generate(1, 0);
        let center = Vec2::new(400.0, 300.0);
        let proj = crystal.project(Vec3::new(0.3, 0.7, 0.0), center, 100.0);
        assert_eq!(proj.points.len(), crystal.mesh.vertices.len());
        let hull = convex_hull(&proj.points);
        assert!(point_in_convex(&hull, center));
        for p in &proj.points {
            assert!(point_in_convex(&hull, *p));
            assert!((p.x - center.x).abs() < 140.0 && (p.y - center.y).abs() < 140.0);
        }
    }

    #[test]
    fn test_visible_faces_are_about_half() {
        let crystal = Crystal::generate(2, 0);
        let proj = crystal.project(Vec3::new(0.2, 0.4, 0.1), Vec2::new(0.0, 0.0), 100.0);
        let visible = crystal.visible_faces(&proj);
        let total = crystal.mesh.faces.len();
        assert!(visible.len() > total / 4 && visible.len() < total * 3 / 4);
        for pair in visible.windows(2) {
            assert!(pair[0].depth >= pair[1].depth);
        }
    }
}
