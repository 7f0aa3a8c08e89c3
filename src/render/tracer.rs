//! Light path through the crystal.
//!
//! Per frame the primary ray runs from the light source toward the aim
//! point (the canvas centre). What happens next depends only on whether it
//! enters the crystal's hull:
//!
//!   Degenerate / Inside → no beams, global alpha fades out
//!   Miss                → plain white beam off the canvas, alpha fades out
//!   Hit                 → white incoming beam + entry flare, alpha fades in,
//!                         then every spectral band refracts at the entry,
//!                         crosses the crystal, refracts out and is traced
//!                         through open space (walls reflect, the hull
//!                         refracts again) until its bounce budget or its
//!                         alpha runs out
//!
//! The global alpha is eased toward its target every frame so a hull edge
//! straddling the ray does not flicker.

use crate::color::{Rgba, AIR_INDEX, SPECTRUM};
use crate::config::BeamConfig;
use crate::fast_math::Vec2;
use crate::geometry::{
    bounds_polygon, intersect_ray_polygon, point_in_convex, reflect, refract, PolygonHit, Segment,
};
use crate::quality::TierParams;
use crate::render::beam::{draw_beam, draw_flare, BeamStyle};
use crate::render::{DrawTag, Surface};

/// Which branch the primary ray took this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightOutcome {
    /// Source and aim coincide; there is no direction to cast.
    Degenerate,
    /// The source sits inside the crystal's silhouette.
    Inside,
    Miss,
    Hit,
}

/// A ray in flight between two events.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayState {
    pub origin: Vec2,
    pub dir: Vec2,
    /// Accumulated opacity, before pulse.
    pub alpha: f32,
    /// Remaining events (bounces) this ray may take.
    pub depth: u32,
    /// Travelling inside the crystal.
    pub inside: bool,
    /// Hull edge the ray just left.
    pub hull_skip: Option<usize>,
    /// Canvas wall the ray just left.
    pub wall_skip: Option<usize>,
}

impl RayState {
    pub fn new(origin: Vec2, dir: Vec2, alpha: f32, depth: u32) -> Self {
        Self {
            origin,
            dir,
            alpha,
            depth,
            inside: false,
            hull_skip: None,
            wall_skip: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TracedSegment {
    pub segment: Segment,
    pub alpha: f32,
    pub inside: bool,
}

/// Follow one spectral ray until `depth` reaches zero or its alpha drops
/// below `cfg.alpha_floor`, whichever comes first.
///
/// Every hull or wall event costs one unit of depth and multiplies alpha by
/// the event's attenuation. Returns the straight pieces in travel order.
pub fn trace_spectral_ray(
    hull: &[Vec2],
    size: Vec2,
    refractive_index: f32,
    start: RayState,
    cfg: &BeamConfig,
) -> Vec<TracedSegment> {
    let walls = bounds_polygon(size.x, size.y);
    let far = size.length() * 2.0;
    let mut ray = start;
    let mut out = Vec::with_capacity(start.depth as usize);

    while ray.depth > 0 && ray.alpha >= cfg.alpha_floor {
        let Some(dir) = ray.dir.normalize() else {
            break;
        };
        ray.dir = dir;

        if ray.inside {
            let Some(exit) = intersect_ray_polygon(ray.origin, ray.dir, hull, ray.hull_skip) else {
                break;
            };
            out.push(TracedSegment {
                segment: Segment::new(ray.origin, exit.point),
                alpha: ray.alpha,
                inside: true,
            });
            ray.depth -= 1;
            ray.origin = exit.point;
            ray.hull_skip = Some(exit.edge);
            match refract(ray.dir, exit.normal, refractive_index, AIR_INDEX) {
                Some(d) => {
                    ray.dir = d;
                    ray.inside = false;
                    ray.alpha *= cfg.exit_attenuation;
                }
                None => {
                    ray.dir = reflect(ray.dir, exit.normal);
                    ray.alpha *= cfg.internal_reflect_attenuation;
                }
            }
            continue;
        }

        let hull_hit = intersect_ray_polygon(ray.origin, ray.dir, hull, ray.hull_skip);
        let wall_hit = intersect_ray_polygon(ray.origin, ray.dir, &walls, ray.wall_skip);

        match nearest(hull_hit, wall_hit) {
            Some(Event::Hull(hit)) => {
                out.push(TracedSegment {
                    segment: Segment::new(ray.origin, hit.point),
                    alpha: ray.alpha,
                    inside: false,
                });
                ray.depth -= 1;
                ray.origin = hit.point;
                ray.hull_skip = Some(hit.edge);
                ray.wall_skip = None;
                match refract(ray.dir, hit.normal, AIR_INDEX, refractive_index) {
                    Some(d) => {
                        ray.dir = d;
                        ray.inside = true;
                        ray.alpha *= cfg.entry_attenuation;
                    }
                    None => {
                        ray.dir = reflect(ray.dir, hit.normal);
                        ray.alpha *= cfg.hull_reflect_attenuation;
                    }
                }
            }
            Some(Event::Wall(hit)) => {
                out.push(TracedSegment {
                    segment: Segment::new(ray.origin, hit.point),
                    alpha: ray.alpha,
                    inside: false,
                });
                ray.depth -= 1;
                ray.origin = hit.point;
                ray.alpha *= cfg.wall_attenuation;
                ray.hull_skip = None;
                if at_corner(hit.point, size) {
                    // Both walls reflect; neither is skipped so the ray
                    // leaves the corner on the mirrored diagonal.
                    ray.dir = -ray.dir;
                    ray.wall_skip = None;
                } else {
                    ray.dir = reflect(ray.dir, hit.normal);
                    ray.wall_skip = Some(hit.edge);
                }
            }
            None => {
                // Started outside the canvas and points away from it.
                out.push(TracedSegment {
                    segment: Segment::new(ray.origin, ray.origin + ray.dir * far),
                    alpha: ray.alpha,
                    inside: false,
                });
                break;
            }
        }
    }

    out
}

/// Within this many pixels of two walls at once.
const CORNER_EPSILON: f32 = 1e-2;

fn at_corner(p: Vec2, size: Vec2) -> bool {
    let near = |v: f32, extent: f32| v.abs() < CORNER_EPSILON || (v - extent).abs() < CORNER_EPSILON;
    near(p.x, size.x) && near(p.y, size.y)
}

enum Event {
    Hull(PolygonHit),
    Wall(PolygonHit),
}

fn nearest(hull: Option<PolygonHit>, wall: Option<PolygonHit>) -> Option<Event> {
    match (hull, wall) {
        (Some(h), Some(w)) if h.t <= w.t => Some(Event::Hull(h)),
        (_, Some(w)) => Some(Event::Wall(w)),
        (Some(h), None) => Some(Event::Hull(h)),
        (None, None) => None,
    }
}

/// State the light keeps between frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightState {
    pub global_alpha: f32,
}

impl Default for LightState {
    fn default() -> Self {
        Self { global_alpha: 0.0 }
    }
}

impl LightState {
    fn ease_toward(&mut self, target: f32, smoothing: f32) {
        self.global_alpha += (target - self.global_alpha) * smoothing;
        self.global_alpha = self.global_alpha.clamp(0.0, 1.0);
    }
}

/// Inputs for one light pass.
#[derive(Debug, Clone, Copy)]
pub struct LightPass<'a> {
    /// Smoothed pointer: where the light comes from.
    pub source: Vec2,
    /// Where the light is aimed (the canvas centre).
    pub aim: Vec2,
    /// This frame's convex hull of the projected crystal.
    pub hull: &'a [Vec2],
    pub size: Vec2,
    pub params: TierParams,
    /// Breathing factor applied to every beam and flare.
    pub pulse: f32,
    /// Scroll offset of the smoke texture.
    pub smoke_phase: f32,
}

/// What one light pass produced.
#[derive(Debug, Clone, PartialEq)]
pub struct LightFrame {
    pub outcome: LightOutcome,
    /// Beams drawn inside the crystal.
    pub internal_beams: usize,
    /// Dispersed segments drawn in open space.
    pub exterior_segments: usize,
    /// Every segment drawn this frame, for dust illumination.
    pub active: Vec<Segment>,
}

impl LightFrame {
    fn empty(outcome: LightOutcome) -> Self {
        Self {
            outcome,
            internal_beams: 0,
            exterior_segments: 0,
            active: Vec::new(),
        }
    }
}

/// Cast, trace and draw this frame's light. Expects additive compositing
/// to be active on `surface`.
pub fn render_light<S: Surface + ?Sized>(
    surface: &mut S,
    pass: &LightPass<'_>,
    cfg: &BeamConfig,
    state: &mut LightState,
) -> LightFrame {
    let Some(dir) = (pass.aim - pass.source).normalize() else {
        state.ease_toward(0.0, cfg.alpha_smoothing);
        return LightFrame::empty(LightOutcome::Degenerate);
    };
    if point_in_convex(pass.hull, pass.source) {
        state.ease_toward(0.0, cfg.alpha_smoothing);
        return LightFrame::empty(LightOutcome::Inside);
    }

    let Some(entry) = intersect_ray_polygon(pass.source, dir, pass.hull, None) else {
        state.ease_toward(0.0, cfg.alpha_smoothing);
        let mut frame = LightFrame::empty(LightOutcome::Miss);
        let beam = Segment::new(pass.source, pass.source + dir * (pass.size.length() * 2.0));
        let style = BeamStyle {
            smoke: false,
            hot_core: false,
            ..BeamStyle::for_tier(Rgba::WHITE, 0.45 * pass.pulse, cfg.incoming_width, &pass.params)
        };
        draw_beam(surface, DrawTag::MissBeam, beam, &style, pass.smoke_phase);
        frame.active.push(beam);
        return frame;
    };

    state.ease_toward(1.0, cfg.alpha_smoothing);
    let ga = state.global_alpha;
    let mut frame = LightFrame::empty(LightOutcome::Hit);

    // Continuous with the miss beam at ga = 0.
    let incoming_alpha = (0.45 + 0.40 * ga) * pass.pulse;
    let incoming = Segment::new(pass.source, entry.point);
    let style = BeamStyle {
        smoke: false,
        ..BeamStyle::for_tier(Rgba::WHITE, incoming_alpha, cfg.incoming_width, &pass.params)
    };
    draw_beam(surface, DrawTag::IncomingBeam, incoming, &style, pass.smoke_phase);
    frame.active.push(incoming);
    draw_flare(surface, entry.point, cfg.flare_radius, Rgba::WHITE, ga * pass.pulse);

    if ga < cfg.alpha_floor {
        return frame;
    }

    for band in SPECTRUM.iter() {
        let n = band.refractive_index;
        let Some(inner) = refract(dir, entry.normal, AIR_INDEX, n) else {
            continue;
        };
        let Some(exit) = intersect_ray_polygon(entry.point, inner, pass.hull, Some(entry.edge)) else {
            continue;
        };

        let internal = Segment::new(entry.point, exit.point);
        let thin = BeamStyle::thin(band.color, (band.opacity * ga * pass.pulse * 1.2).min(1.0), cfg.internal_width);
        if draw_beam(surface, DrawTag::InternalBeam, internal, &thin, pass.smoke_phase) > 0 {
            frame.internal_beams += 1;
        }
        frame.active.push(internal);

        let alpha = band.opacity * ga;
        let mut ray = RayState::new(exit.point, inner, alpha, pass.params.max_bounces);
        ray.hull_skip = Some(exit.edge);
        match refract(inner, exit.normal, n, AIR_INDEX) {
            Some(out) => {
                ray.dir = out;
                draw_flare(surface, exit.point, cfg.flare_radius * 0.45, band.color, alpha * pass.pulse);
            }
            None => {
                ray.dir = reflect(inner, exit.normal);
                ray.inside = true;
                ray.alpha *= cfg.internal_reflect_attenuation;
            }
        }

        for piece in trace_spectral_ray(pass.hull, pass.size, n, ray, cfg) {
            let a = piece.alpha * pass.pulse;
            let drawn = if piece.inside {
                let style = BeamStyle::thin(band.color, (a * 1.2).min(1.0), cfg.internal_width);
                let drawn = draw_beam(surface, DrawTag::InternalBeam, piece.segment, &style, pass.smoke_phase);
                if drawn > 0 {
                    frame.internal_beams += 1;
                }
                drawn
            } else {
                let style = BeamStyle::for_tier(band.color, a, cfg.spectral_width, &pass.params);
                let drawn = draw_beam(surface, DrawTag::SpectralBeam, piece.segment, &style, pass.smoke_phase);
                if drawn > 0 {
                    frame.exterior_segments += 1;
                }
                drawn
            };
            if drawn > 0 {
                frame.active.push(piece.segment);
            }
        }
    }

    frame
}
