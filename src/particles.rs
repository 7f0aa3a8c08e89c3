//! Star and dust particle layers.
//!
//! Stars sit still and only shift with pointer parallax; nearer stars
//! (smaller `z`) shift more. Dust drifts on its own and wraps around the
//! canvas edges. Both are perspective-projected about the canvas centre,
//! culled outside a small margin and twinkle with `sin(phase)`. Dust near
//! any beam drawn this frame lights up.

use std::f32::consts::TAU;

use rand::Rng;
use rayon::prelude::*;

use crate::color::Rgba;
use crate::config::ParticleConfig;
use crate::crystal::FOCAL_LENGTH;
use crate::fast_math::Vec2;
use crate::geometry::{distance_to_segment, Segment};
use crate::render::{DrawTag, Mesh2d, Surface};

/// Depth range of dust, in the same units as star `z`.
const DUST_DEPTH: f32 = 300.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub orig_x: f32,
    pub orig_y: f32,
    pub size: f32,
    pub blink_phase: f32,
    pub blink_speed: f32,
    /// Per-frame motion; zero for stars.
    pub drift: Vec2,
}

impl Particle {
    /// Twinkle factor in `[0, 1]`.
    pub fn twinkle(&self) -> f32 {
        0.5 + 0.5 * self.blink_phase.sin()
    }
}

/// Perspective-project `(x, y, z)` about `center`.
pub fn project(x: f32, y: f32, z: f32, center: Vec2) -> (Vec2, f32) {
    let scale = FOCAL_LENGTH / (FOCAL_LENGTH + z.max(0.0));
    let p = center + (Vec2::new(x, y) - center) * scale;
    (p, scale)
}

fn on_canvas(p: Vec2, size: Vec2, margin: f32) -> bool {
    p.x >= -margin && p.y >= -margin && p.x <= size.x + margin && p.y <= size.y + margin
}

#[derive(Debug, Clone, Default)]
pub struct ParticleField {
    pub stars: Vec<Particle>,
    pub dust: Vec<Particle>,
    size: Vec2,
}

impl ParticleField {
    /// Fresh pools for a `size` canvas. Dust clusters around `anchor`.
    pub fn generate(
        star_count: usize,
        dust_count: usize,
        size: Vec2,
        anchor: Vec2,
        cfg: &ParticleConfig,
        rng: &mut impl Rng,
    ) -> Self {
        let stars = (0..star_count)
            .map(|_| {
                let x = rng.gen::<f32>() * size.x;
                let y = rng.gen::<f32>() * size.y;
                Particle {
                    x,
                    y,
                    z: rng.gen::<f32>() * size.x,
                    orig_x: x,
                    orig_y: y,
                    size: 0.4 + rng.gen::<f32>() * 1.2,
                    blink_phase: rng.gen::<f32>() * TAU,
                    blink_speed: 0.01 + rng.gen::<f32>() * 0.03,
                    drift: Vec2::ZERO,
                }
            })
            .collect();

        let spread = Vec2::new(size.x, size.y) * (cfg.dust_spread * 0.5);
        let dust = (0..dust_count)
            .map(|_| {
                let x = anchor.x + (rng.gen::<f32>() * 2.0 - 1.0) * spread.x;
                let y = anchor.y + (rng.gen::<f32>() * 2.0 - 1.0) * spread.y;
                Particle {
                    x,
                    y,
                    z: rng.gen::<f32>() * DUST_DEPTH,
                    orig_x: x,
                    orig_y: y,
                    size: 0.6 + rng.gen::<f32>() * 1.4,
                    blink_phase: rng.gen::<f32>() * TAU,
                    blink_speed: 0.02 + rng.gen::<f32>() * 0.04,
                    drift: Vec2::new(rng.gen::<f32>() - 0.5, rng.gen::<f32>() - 0.5) * 0.3,
                }
            })
            .collect();

        Self { stars, dust, size }
    }

    pub fn star_count(&self) -> usize {
        self.stars.len()
    }

    pub fn dust_count(&self) -> usize {
        self.dust.len()
    }

    /// Advance one frame. `parallax` is the pointer offset from the canvas
    /// centre, already scaled by the parallax strength.
    pub fn update(&mut self, parallax: Vec2, cfg: &ParticleConfig) {
        let width = self.size.x.max(1.0);
        for s in &mut self.stars {
            let depth_factor = (1.0 - s.z / width).clamp(0.0, 1.0);
            s.x = s.orig_x - parallax.x * depth_factor;
            s.y = s.orig_y - parallax.y * depth_factor;
            s.blink_phase = (s.blink_phase + s.blink_speed) % TAU;
        }

        let m = cfg.cull_margin;
        let (w, h) = (self.size.x, self.size.y);
        for d in &mut self.dust {
            d.x += d.drift.x;
            d.y += d.drift.y;
            if d.x < -m {
                d.x = w + m;
            } else if d.x > w + m {
                d.x = -m;
            }
            if d.y < -m {
                d.y = h + m;
            } else if d.y > h + m {
                d.y = -m;
            }
            d.blink_phase = (d.blink_phase + d.blink_speed) % TAU;
        }
    }

    /// Draw the star layer as one mesh. Returns how many stars were drawn.
    pub fn draw_stars<S: Surface + ?Sized>(&self, surface: &mut S, cfg: &ParticleConfig) -> usize {
        let center = self.size * 0.5;
        let mut mesh = Mesh2d::new();
        let mut drawn = 0;
        for s in &self.stars {
            let (p, scale) = project(s.x, s.y, s.z, center);
            if !on_canvas(p, self.size, cfg.cull_margin) {
                continue;
            }
            let alpha = 0.3 + 0.7 * s.twinkle();
            mesh.add_circle(p, s.size * scale, Rgba::WHITE.with_alpha(alpha), 6);
            drawn += 1;
        }
        surface.draw_mesh(DrawTag::Stars, &mesh);
        drawn
    }

    /// Draw the dust layer. Motes within `illumination_radius` of any of
    /// `beams` glow brighter. Returns how many motes were lit.
    pub fn draw_dust<S: Surface + ?Sized>(&self, surface: &mut S, beams: &[Segment], cfg: &ParticleConfig) -> usize {
        let center = self.size * 0.5;
        let radius = cfg.illumination_radius;
        let margin = cfg.cull_margin;
        let size = self.size;

        let motes: Vec<(Vec2, f32, f32, bool)> = self
            .dust
            .par_iter()
            .filter_map(|d| {
                let (p, scale) = project(d.x, d.y, d.z, center);
                if !on_canvas(p, size, margin) {
                    return None;
                }
                let lit = beams.iter().any(|b| distance_to_segment(p, b.p1, b.p2) < radius);
                Some((p, d.size * scale, d.twinkle(), lit))
            })
            .collect();

        let mut mesh = Mesh2d::new();
        let mut lit_count = 0;
        for &(p, r, twinkle, lit) in &motes {
            if lit {
                lit_count += 1;
                mesh.add_radial(p, r * 2.4, Rgba::WHITE.with_alpha(0.5 + 0.5 * twinkle), Rgba::TRANSPARENT, 8);
            } else {
                mesh.add_circle(p, r, Rgba::rgb(180, 190, 255).with_alpha(0.12 + 0.2 * twinkle), 6);
            }
        }
        surface.draw_mesh(DrawTag::Dust, &mesh);
        lit_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RecordingSurface;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const SIZE: Vec2 = Vec2::new(800.0, 600.0);

    fn field(stars: usize, dust: usize, seed: u64) -> ParticleField {
        let mut rng = StdRng::seed_from_u64(seed);
        ParticleField::generate(stars, dust, SIZE, SIZE * 0.5, &ParticleConfig::default(), &mut rng)
    }

    fn mote(x: f32, y: f32) -> Particle {
        Particle {
            x,
            y,
            z: 0.0,
            orig_x: x,
            orig_y: y,
            size: 1.0,
            blink_phase: 0.0,
            blink_speed: 0.0,
            drift: Vec2::ZERO,
        }
    }

    #[test]
    fn test_generate_counts_and_ranges() {
        let f = field(220, 90, 7);
        assert_eq!(f.star_count(), 220);
        assert_eq!(f.dust_count(), 90);
        for s in &f.stars {
            assert!((0.0..SIZE.x).contains(&s.x) && (0.0..SIZE.y).contains(&s.y));
            assert!((0.0..SIZE.x).contains(&s.z));
            assert_eq!(s.drift, Vec2::ZERO);
        }
        // Dust spread is 0.6 of the viewport around the centre.
        for d in &f.dust {
            assert!((d.x - 400.0).abs() <= 240.0 + 1e-3);
            assert!((d.y - 300.0).abs() <= 180.0 + 1e-3);
        }
    }

    #[test]
    fn test_seeded_generation_is_repeatable() {
        assert_eq!(field(30, 10, 3).stars, field(30, 10, 3).stars);
        assert_ne!(field(30, 10, 3).stars, field(30, 10, 4).stars);
    }

    #[test]
    fn test_near_stars_shift_more() {
        let cfg = ParticleConfig::default();
        let mut f = ParticleField {
            stars: vec![mote(100.0, 100.0), Particle { z: 600.0, ..mote(100.0, 100.0) }],
            dust: Vec::new(),
            size: SIZE,
        };
        f.update(Vec2::new(20.0, 0.0), &cfg);
        assert!((f.stars[0].x - 80.0).abs() < 1e-4);
        assert!((f.stars[1].x - 95.0).abs() < 1e-4);
        assert_eq!(f.stars[0].orig_x, 100.0);
    }

    #[test]
    fn test_dust_drifts_and_wraps() {
        let cfg = ParticleConfig::default();
        let mut f = ParticleField {
            stars: Vec::new(),
            dust: vec![Particle { drift: Vec2::new(5.0, 0.0), ..mote(SIZE.x + cfg.cull_margin - 1.0, 50.0) }],
            size: SIZE,
        };
        f.update(Vec2::new(300.0, 300.0), &cfg);
        assert_eq!(f.dust[0].x, -cfg.cull_margin);
        assert_eq!(f.dust[0].y, 50.0);
    }

    #[test]
    fn test_offscreen_stars_are_culled() {
        let cfg = ParticleConfig::default();
        let f = ParticleField {
            stars: vec![mote(100.0, 100.0), mote(-500.0, 100.0)],
            dust: Vec::new(),
            size: SIZE,
        };
        let mut s = RecordingSurface::new(SIZE.x, SIZE.y);
        assert_eq!(f.draw_stars(&mut s, &cfg), 1);
        assert_eq!(s.count(DrawTag::Stars), 1);
    }

    #[test]
    fn test_dust_near_beam_is_lit() {
        let cfg = ParticleConfig::default();
        let f = ParticleField {
            stars: Vec::new(),
            dust: vec![mote(200.0, 305.0), mote(200.0, 500.0), mote(600.0, 100.0)],
            size: SIZE,
        };
        let beam = Segment::new(Vec2::new(0.0, 300.0), Vec2::new(800.0, 300.0));
        let mut s = RecordingSurface::new(SIZE.x, SIZE.y);
        assert_eq!(f.draw_dust(&mut s, &[beam], &cfg), 1);
        assert_eq!(f.draw_dust(&mut s, &[], &cfg), 0);
        assert_eq!(s.count(DrawTag::Dust), 2);
    }

    #[test]
    fn test_projection_pulls_toward_center() {
        let c = Vec2::new(400.0, 300.0);
        let (p, scale) = project(800.0, 300.0, 1000.0, c);
        assert!((scale - 0.5).abs() < 1e-6);
        assert!((p.x - 600.0).abs() < 1e-3);
        let (p, _) = project(800.0, 300.0, 0.0, c);
        assert!((p.x - 800.0).abs() < 1e-3);
    }
}
