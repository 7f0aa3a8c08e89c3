pub mod beam;
pub mod egui_surface;
pub mod mesh;
pub mod noise;
pub mod tracer;

use std::collections::HashMap;

use crate::color::Rgba;
use crate::fast_math::Vec2;

pub use mesh::{Mesh2d, TextureSlot, Vertex};

/// How new pixels combine with what is already on the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Composite {
    /// Normal alpha blending.
    #[default]
    SourceOver,
    /// Additive: overlapping light brightens instead of occluding.
    Lighter,
}

/// What a draw call is for. Surfaces may ignore it; the recording surface
/// counts by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrawTag {
    Stars,
    Dust,
    Crystal,
    /// Plain white ray drawn when the light misses the crystal.
    MissBeam,
    /// White ray from the light source to the entry point.
    IncomingBeam,
    /// Thin beam inside the crystal.
    InternalBeam,
    /// Dispersed ray in open space.
    SpectralBeam,
    Flare,
    Smoke,
    /// Static gradient painted when the scene could not start.
    Fallback,
}

/// A 2D drawing target in canvas pixels.
pub trait Surface {
    /// Drawable size in canvas pixels.
    fn size(&self) -> Vec2;

    fn clear(&mut self, color: Rgba);

    /// Applies to every following draw call.
    fn set_composite(&mut self, mode: Composite);

    fn draw_mesh(&mut self, tag: DrawTag, mesh: &Mesh2d);
}

/// Scene background.
pub const BACKGROUND: Rgba = Rgba::rgb(6, 7, 13);

/// Paint the static gradient used when no scene is running.
pub fn paint_fallback<S: Surface + ?Sized>(surface: &mut S) {
    let size = surface.size();
    let top = Rgba::rgb(14, 16, 32);
    let bottom = Rgba::rgb(38, 20, 58);

    let mut mesh = Mesh2d::new();
    let a = mesh.vertex(Vec2::new(0.0, 0.0), top);
    let b = mesh.vertex(Vec2::new(size.x, 0.0), top);
    let c = mesh.vertex(Vec2::new(size.x, size.y), bottom);
    let d = mesh.vertex(Vec2::new(0.0, size.y), bottom);
    mesh.triangle(a, b, c);
    mesh.triangle(a, c, d);

    surface.set_composite(Composite::SourceOver);
    surface.draw_mesh(DrawTag::Fallback, &mesh);
}

/// One recorded draw call.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub tag: DrawTag,
    pub composite: Composite,
    pub vertices: usize,
    pub triangles: usize,
    pub textured: bool,
}

/// Headless surface that only records what was drawn.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    size: Vec2,
    composite: Composite,
    pub clears: usize,
    pub calls: Vec<DrawCall>,
}

impl RecordingSurface {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            size: Vec2::new(width, height),
            ..Self::default()
        }
    }

    pub fn count(&self, tag: DrawTag) -> usize {
        self.calls.iter().filter(|c| c.tag == tag).count()
    }

    pub fn counts(&self) -> HashMap<DrawTag, usize> {
        let mut out = HashMap::new();
        for call in &self.calls {
            *out.entry(call.tag).or_insert(0) += 1;
        }
        out
    }

    pub fn reset(&mut self) {
        self.clears = 0;
        self.calls.clear();
    }
}

impl Surface for RecordingSurface {
    fn size(&self) -> Vec2 {
        self.size
    }

    fn clear(&mut self, _color: Rgba) {
        self.clears += 1;
    }

    fn set_composite(&mut self, mode: Composite) {
        self.composite = mode;
    }

    fn draw_mesh(&mut self, tag: DrawTag, mesh: &Mesh2d) {
        if mesh.is_empty() {
            return;
        }
        self.calls.push(DrawCall {
            tag,
            composite: self.composite,
            vertices: mesh.vertices.len(),
            triangles: mesh.triangle_count(),
            textured: mesh.texture.is_some(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_paints_one_gradient() {
        let mut s = RecordingSurface::new(320.0, 200.0);
        paint_fallback(&mut s);
        assert_eq!(s.count(DrawTag::Fallback), 1);
        assert_eq!(s.calls[0].triangles, 2);
        assert_eq!(s.calls[0].composite, Composite::SourceOver);
    }

    #[test]
    fn test_recording_skips_empty_meshes_and_tracks_composite() {
        let mut s = RecordingSurface::new(10.0, 10.0);
        s.draw_mesh(DrawTag::Stars, &Mesh2d::new());
        assert!(s.calls.is_empty());

        let mut m = Mesh2d::new();
        m.add_circle(Vec2::new(5.0, 5.0), 2.0, Rgba::WHITE, 6);
        s.set_composite(Composite::Lighter);
        s.draw_mesh(DrawTag::Flare, &m);
        assert_eq!(s.calls[0].composite, Composite::Lighter);
        assert_eq!(s.counts().get(&DrawTag::Flare), Some(&1));
    }
}
