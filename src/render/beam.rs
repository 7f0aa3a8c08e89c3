//! Volumetric beams and flares.
//!
//! A beam is up to four stacked layers, all drawn under additive
//! compositing:
//!   1. outer glow  : wide, faint soft strip (tiers with `glow_enabled`)
//!   2. body        : the main soft strip
//!   3. hot core    : thin near-white line (top tier only)
//!   4. smoke       : repeating noise texture for haze (`smoke_enabled`)

use crate::color::Rgba;
use crate::fast_math::Vec2;
use crate::geometry::Segment;
use crate::quality::TierParams;
use crate::render::mesh::{Mesh2d, TextureSlot};
use crate::render::noise::SMOKE_TILE;
use crate::render::{DrawTag, Surface};

/// Layer toggles and look for one beam.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeamStyle {
    pub color: Rgba,
    /// Opacity at the start of the segment, already including pulse and
    /// global alpha.
    pub alpha: f32,
    /// Opacity at the end as a fraction of `alpha`.
    pub tail: f32,
    pub width: f32,
    pub glow: bool,
    pub hot_core: bool,
    pub smoke: bool,
}

impl BeamStyle {
    /// Style with layers switched on according to the tier.
    pub fn for_tier(color: Rgba, alpha: f32, width: f32, params: &TierParams) -> Self {
        Self {
            color,
            alpha,
            tail: 0.75,
            width,
            glow: params.glow_enabled,
            hot_core: params.hot_core,
            smoke: params.smoke_enabled,
        }
    }

    /// Single-layer thin beam.
    pub fn thin(color: Rgba, alpha: f32, width: f32) -> Self {
        Self {
            color,
            alpha,
            tail: 1.0,
            width,
            glow: false,
            hot_core: false,
            smoke: false,
        }
    }
}

/// Draw one beam. Returns the number of layers drawn.
pub fn draw_beam<S: Surface + ?Sized>(
    surface: &mut S,
    tag: DrawTag,
    segment: Segment,
    style: &BeamStyle,
    smoke_phase: f32,
) -> usize {
    if style.alpha <= 0.0 || segment.length() < 0.5 {
        return 0;
    }
    let (a, b) = (segment.p1, segment.p2);
    let start = style.color.with_alpha(style.alpha);
    let end = style.color.with_alpha(style.alpha * style.tail);
    let mut layers = 0;

    if style.glow {
        let mut glow = Mesh2d::new();
        glow.add_soft_strip(a, b, style.width * 3.2, start.fade(0.22), end.fade(0.22));
        surface.draw_mesh(tag, &glow);
        layers += 1;
    }

    let mut body = Mesh2d::new();
    body.add_soft_strip(a, b, style.width, start, end);
    surface.draw_mesh(tag, &body);
    layers += 1;

    if style.hot_core {
        let core = Rgba::WHITE.mix(style.color, 0.25);
        let mut line = Mesh2d::new();
        line.add_soft_strip(
            a,
            b,
            (style.width * 0.22).max(1.0),
            core.with_alpha(style.alpha * 0.9),
            core.with_alpha(style.alpha * style.tail * 0.9),
        );
        surface.draw_mesh(tag, &line);
        layers += 1;
    }

    if style.smoke {
        let mut haze = Mesh2d::textured(TextureSlot::Smoke);
        haze.add_textured_strip(
            a,
            b,
            style.width * 1.8,
            SMOKE_TILE as f32,
            smoke_phase,
            style.color.with_alpha(style.alpha * 0.35),
        );
        surface.draw_mesh(DrawTag::Smoke, &haze);
        layers += 1;
    }

    layers
}

/// Radial flare: colored hub fading to nothing, plus a small bright centre.
pub fn draw_flare<S: Surface + ?Sized>(surface: &mut S, center: Vec2, radius: f32, color: Rgba, alpha: f32) {
    if alpha <= 0.0 || radius <= 0.0 {
        return;
    }
    let mut mesh = Mesh2d::new();
    mesh.add_radial(center, radius, color.with_alpha(alpha * 0.6), color.with_alpha(0.0), 24);
    mesh.add_radial(
        center,
        radius * 0.25,
        Rgba::WHITE.with_alpha(alpha),
        Rgba::WHITE.with_alpha(0.0),
        16,
    );
    surface.draw_mesh(DrawTag::Flare, &mesh);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quality::QualityTier;
    use crate::render::RecordingSurface;

    fn seg() -> Segment {
        Segment::new(Vec2::new(10.0, 10.0), Vec2::new(200.0, 120.0))
    }

    #[test]
    fn test_high_tier_draws_all_layers() {
        let mut s = RecordingSurface::new(400.0, 300.0);
        let style = BeamStyle::for_tier(Rgba::WHITE, 0.8, 8.0, &QualityTier::High.params());
        assert_eq!(draw_beam(&mut s, DrawTag::SpectralBeam, seg(), &style, 0.0), 4);
        assert_eq!(s.count(DrawTag::SpectralBeam), 3);
        assert_eq!(s.count(DrawTag::Smoke), 1);
        assert!(s.calls.iter().any(|c| c.textured));
    }

    #[test]
    fn test_low_tier_draws_body_only() {
        let mut s = RecordingSurface::new(400.0, 300.0);
        let style = BeamStyle::for_tier(Rgba::WHITE, 0.8, 8.0, &QualityTier::Low.params());
        assert_eq!(draw_beam(&mut s, DrawTag::SpectralBeam, seg(), &style, 0.0), 1);
        assert_eq!(s.count(DrawTag::Smoke), 0);
    }

    #[test]
    fn test_invisible_or_degenerate_beams_draw_nothing() {
        let mut s = RecordingSurface::new(400.0, 300.0);
        let style = BeamStyle::thin(Rgba::WHITE, 0.0, 2.0);
        assert_eq!(draw_beam(&mut s, DrawTag::InternalBeam, seg(), &style, 0.0), 0);
        let style = BeamStyle::thin(Rgba::WHITE, 1.0, 2.0);
        let p = Vec2::new(5.0, 5.0);
        assert_eq!(draw_beam(&mut s, DrawTag::InternalBeam, Segment::new(p, p), &style, 0.0), 0);
        assert!(s.calls.is_empty());
    }

    #[test]
    fn test_flare() {
        let mut s = RecordingSurface::new(100.0, 100.0);
        draw_flare(&mut s, Vec2::new(50.0, 50.0), 20.0, Rgba::WHITE, 0.7);
        assert_eq!(s.count(DrawTag::Flare), 1);
    }
}
