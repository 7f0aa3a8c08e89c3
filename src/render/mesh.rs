//! Colored 2D triangle meshes, the only primitive a [`Surface`] draws.
//!
//! Gradients are expressed as per-vertex colors: a beam is a strip whose
//! edge vertices are transparent and whose centre line carries the color,
//! a flare is a fan with a colored hub and a transparent rim.
//!
//! [`Surface`]: crate::render::Surface

use std::f32::consts::TAU;

use crate::color::Rgba;
use crate::fast_math::Vec2;

/// Textures a surface may be asked to sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureSlot {
    /// Tileable haze noise, sampled with wrap-around.
    Smoke,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub pos: Vec2,
    /// Texture coordinate; ignored for untextured meshes.
    pub uv: Vec2,
    pub color: Rgba,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh2d {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub texture: Option<TextureSlot>,
}

impl Mesh2d {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn textured(slot: TextureSlot) -> Self {
        Self {
            texture: Some(slot),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn vertex(&mut self, pos: Vec2, color: Rgba) -> u32 {
        self.vertex_uv(pos, Vec2::ZERO, color)
    }

    pub fn vertex_uv(&mut self, pos: Vec2, uv: Vec2, color: Rgba) -> u32 {
        let idx = self.vertices.len() as u32;
        self.vertices.push(Vertex { pos, uv, color });
        idx
    }

    pub fn triangle(&mut self, a: u32, b: u32, c: u32) {
        self.indices.extend_from_slice(&[a, b, c]);
    }

    /// Convex polygon as a triangle fan.
    pub fn add_polygon(&mut self, points: &[Vec2], color: Rgba) {
        if points.len() < 3 {
            return;
        }
        let base = self.vertices.len() as u32;
        for &p in points {
            self.vertex(p, color);
        }
        for i in 1..points.len() as u32 - 1 {
            self.triangle(base, base + i, base + i + 1);
        }
    }

    /// Solid line of the given width.
    pub fn add_line(&mut self, a: Vec2, b: Vec2, width: f32, color: Rgba) {
        let Some(n) = (b - a).perp().normalize() else {
            return;
        };
        let h = n * (width * 0.5);
        let i0 = self.vertex(a + h, color);
        let i1 = self.vertex(a - h, color);
        let i2 = self.vertex(b - h, color);
        let i3 = self.vertex(b + h, color);
        self.triangle(i0, i1, i2);
        self.triangle(i0, i2, i3);
    }

    /// Closed outline through `points`.
    pub fn add_outline(&mut self, points: &[Vec2], width: f32, color: Rgba) {
        for i in 0..points.len() {
            self.add_line(points[i], points[(i + 1) % points.len()], width, color);
        }
    }

    /// Strip across the segment `a..b`: transparent at both long edges,
    /// `start`/`end` colors along the centre line.
    pub fn add_soft_strip(&mut self, a: Vec2, b: Vec2, width: f32, start: Rgba, end: Rgba) {
        let Some(n) = (b - a).perp().normalize() else {
            return;
        };
        let h = n * (width * 0.5);
        let clear_start = start.with_alpha(0.0);
        let clear_end = end.with_alpha(0.0);

        let a_left = self.vertex(a + h, clear_start);
        let a_mid = self.vertex(a, start);
        let a_right = self.vertex(a - h, clear_start);
        let b_left = self.vertex(b + h, clear_end);
        let b_mid = self.vertex(b, end);
        let b_right = self.vertex(b - h, clear_end);

        self.triangle(a_left, a_mid, b_mid);
        self.triangle(a_left, b_mid, b_left);
        self.triangle(a_mid, a_right, b_right);
        self.triangle(a_mid, b_right, b_mid);
    }

    /// Textured quad over `a..b` with `u` running along the segment (in
    /// units of `tile` pixels, shifted by `u_offset`) and `v` across it.
    pub fn add_textured_strip(&mut self, a: Vec2, b: Vec2, width: f32, tile: f32, u_offset: f32, color: Rgba) {
        let Some(n) = (b - a).perp().normalize() else {
            return;
        };
        let h = n * (width * 0.5);
        let u_len = (b - a).length() / tile.max(1.0);
        let i0 = self.vertex_uv(a + h, Vec2::new(u_offset, 0.0), color);
        let i1 = self.vertex_uv(a - h, Vec2::new(u_offset, 1.0), color);
        let i2 = self.vertex_uv(b - h, Vec2::new(u_offset + u_len, 1.0), color);
        let i3 = self.vertex_uv(b + h, Vec2::new(u_offset + u_len, 0.0), color);
        self.triangle(i0, i1, i2);
        self.triangle(i0, i2, i3);
    }

    /// Radial gradient disc: `inner` at the centre fading to `outer` at the rim.
    pub fn add_radial(&mut self, center: Vec2, radius: f32, inner: Rgba, outer: Rgba, segments: u32) {
        let segments = segments.max(3);
        let hub = self.vertex(center, inner);
        let first = self.vertices.len() as u32;
        for i in 0..segments {
            let a = i as f32 / segments as f32 * TAU;
            self.vertex(center + Vec2::new(a.cos(), a.sin()) * radius, outer);
        }
        for i in 0..segments {
            self.triangle(hub, first + i, first + (i + 1) % segments);
        }
    }

    /// Flat-colored disc.
    pub fn add_circle(&mut self, center: Vec2, radius: f32, color: Rgba, segments: u32) {
        self.add_radial(center, radius, color, color, segments);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polygon_fan() {
        let mut m = Mesh2d::new();
        m.add_polygon(
            &[Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(1.0, 1.0), Vec2::new(0.0, 1.0)],
            Rgba::WHITE,
        );
        assert_eq!(m.vertices.len(), 4);
        assert_eq!(m.triangle_count(), 2);
    }

    #[test]
    fn test_soft_strip_has_clear_edges() {
        let mut m = Mesh2d::new();
        m.add_soft_strip(Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0), 4.0, Rgba::WHITE, Rgba::WHITE);
        assert_eq!(m.triangle_count(), 4);
        let clear = m.vertices.iter().filter(|v| v.color.a == 0).count();
        assert_eq!(clear, 4);
    }

    #[test]
    fn test_zero_length_shapes_are_skipped() {
        let mut m = Mesh2d::new();
        let p = Vec2::new(3.0, 3.0);
        m.add_line(p, p, 2.0, Rgba::WHITE);
        m.add_soft_strip(p, p, 2.0, Rgba::WHITE, Rgba::WHITE);
        assert!(m.is_empty());
    }

    #[test]
    fn test_radial_indices_in_range() {
        let mut m = Mesh2d::new();
        m.add_radial(Vec2::ZERO, 5.0, Rgba::WHITE, Rgba::TRANSPARENT, 12);
        assert_eq!(m.triangle_count(), 12);
        assert!(m.indices.iter().all(|&i| (i as usize) < m.vertices.len()));
    }
}
