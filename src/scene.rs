//! The scene: owned state plus the per-frame pipeline.
//!
//! One frame, in order:
//!   debounced resize → spring → rotate/project/hull → background + stars
//!   → crystal faces → light (additive) → dust → governor sample
//!
//! Everything the frame needs lives on [`PrismScene`]; several scenes can
//! run side by side without sharing anything.

use std::f32::consts::TAU;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::color::Rgba;
use crate::config::SceneConfig;
use crate::crystal::{Crystal, ShadedFace};
use crate::error::SceneError;
use crate::fast_math::{Vec2, Vec3};
use crate::geometry::convex_hull;
use crate::input::TouchTracker;
use crate::lifecycle::{FrameLoop, ResizeDebounce, Viewport};
use crate::particles::ParticleField;
use crate::quality::{DeviceProfile, QualityGovernor, QualityTier};
use crate::render::tracer::{render_light, LightOutcome, LightPass, LightState};
use crate::render::{Composite, DrawTag, Mesh2d, Surface, BACKGROUND};
use crate::spring::SpringFollower;

/// Crystal tint; faces get more opaque the more they face the viewer.
const CRYSTAL_TINT: Rgba = Rgba::rgb(150, 185, 255);

/// Smoke texture scroll, in tiles per second.
const SMOKE_SCROLL: f32 = 0.04;

/// What one frame did.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    pub outcome: LightOutcome,
    pub hit: bool,
    pub global_alpha: f32,
    pub internal_beams: usize,
    pub exterior_segments: usize,
    pub stars_drawn: usize,
    pub dust_lit: usize,
    /// Set on the frame that triggered the session's FPS downgrade.
    pub downgraded_to: Option<QualityTier>,
    pub fps: Option<f32>,
}

pub struct PrismScene {
    cfg: SceneConfig,
    viewport: Viewport,
    governor: QualityGovernor,
    crystal: Crystal,
    particles: ParticleField,
    follower: SpringFollower,
    /// Raw pointer target in canvas pixels.
    pointer: Vec2,
    touch: TouchTracker,
    /// Accumulated idle spin.
    rotation: Vec3,
    hull: Vec<Vec2>,
    light: LightState,
    frame_loop: FrameLoop,
    resize: ResizeDebounce,
    generation: u32,
    rng: StdRng,
    start_ms: Option<f64>,
}

impl PrismScene {
    pub fn new(cfg: SceneConfig, viewport: Viewport, profile: DeviceProfile) -> Result<Self, SceneError> {
        let viewport = viewport.with_dpr_range(cfg.min_dpr, cfg.max_dpr);
        if viewport.is_degenerate() {
            return Err(SceneError::new(
                "viewport",
                format!("cannot draw into a {}x{} canvas", viewport.width, viewport.height),
            ));
        }

        let profile = DeviceProfile {
            viewport_width: viewport.width,
            ..profile
        };
        let governor = QualityGovernor::new(profile.classify(&cfg.governor), cfg.governor);
        let rng = match cfg.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let home = fraction_of(viewport, cfg.pointer_home);
        let (w, h) = (viewport.width, viewport.height);

        let mut scene = Self {
            follower: SpringFollower::new(home, cfg.spring),
            pointer: home,
            touch: TouchTracker::new(cfg.touch_padding, w, h),
            resize: ResizeDebounce::new(cfg.resize_debounce_ms),
            cfg,
            viewport,
            governor,
            crystal: Crystal::generate(0, 0),
            particles: ParticleField::default(),
            rotation: Vec3::ZERO,
            hull: Vec::new(),
            light: LightState::default(),
            frame_loop: FrameLoop::new(),
            generation: 0,
            rng,
            start_ms: None,
        };
        scene.regenerate();
        log::info!(
            "scene started: {}x{} @{}x, backing {:?}",
            w,
            h,
            scene.viewport.dpr,
            scene.viewport.backing_size(scene.cfg.max_backing_px)
        );
        Ok(scene)
    }

    // ─── Accessors ──────────────────────────────────────────────────────────

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn tier(&self) -> QualityTier {
        self.governor.tier()
    }

    pub fn star_count(&self) -> usize {
        self.particles.star_count()
    }

    pub fn dust_count(&self) -> usize {
        self.particles.dust_count()
    }

    pub fn crystal_level(&self) -> u32 {
        self.crystal.level
    }

    pub fn crystal_vertex_count(&self) -> usize {
        self.crystal.mesh.vertices.len()
    }

    /// Bumped every time geometry and particles are rebuilt.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn pointer_target(&self) -> Vec2 {
        self.pointer
    }

    pub fn smoothed_pointer(&self) -> Vec2 {
        self.follower.position()
    }

    pub fn global_alpha(&self) -> f32 {
        self.light.global_alpha
    }

    /// The crystal silhouette from the last frame.
    pub fn hull(&self) -> &[Vec2] {
        &self.hull
    }

    /// A frame is outstanding; the host should schedule a repaint.
    pub fn wants_frame(&self) -> bool {
        self.frame_loop.is_pending()
    }

    // ─── Input ──────────────────────────────────────────────────────────────

    pub fn pointer_move(&mut self, x: f32, y: f32) {
        if x.is_finite() && y.is_finite() {
            self.pointer = Vec2::new(x, y);
        }
    }

    pub fn touch_start(&mut self, x: f32, y: f32, id: u64) {
        if let Some(p) = self.touch.touch_start(x, y, id) {
            self.pointer = p;
        }
    }

    pub fn touch_move(&mut self, x: f32, y: f32, id: u64) {
        if let Some(p) = self.touch.touch_move(x, y, id) {
            self.pointer = p;
        }
    }

    pub fn touch_end(&mut self, id: u64) {
        self.touch.touch_end(id);
    }

    /// Queue a resize; it takes effect once no newer one arrives for the
    /// debounce period.
    pub fn request_resize(&mut self, viewport: Viewport, now_ms: f64) {
        let viewport = viewport.with_dpr_range(self.cfg.min_dpr, self.cfg.max_dpr);
        if viewport == self.viewport && !self.resize.is_pending() {
            return;
        }
        self.resize.push(viewport, now_ms);
    }

    pub fn set_visible(&mut self, visible: bool, now_ms: f64) {
        if visible {
            if self.frame_loop.resume() {
                log::debug!("scene visible again; resuming");
                self.governor.reset_window(now_ms);
            }
        } else {
            log::debug!("scene hidden; pausing");
            self.frame_loop.pause();
        }
    }

    /// Honour a live reduced-motion preference. Turning it off never
    /// raises the tier again.
    pub fn set_reduced_motion(&mut self, reduced: bool) {
        if reduced && self.governor.force_minimal() {
            self.regenerate();
        }
    }

    pub fn stop(&mut self) {
        self.frame_loop.stop();
    }

    // ─── Frame ──────────────────────────────────────────────────────────────

    /// Draw one frame if one was requested. Returns `None` when paused,
    /// stopped or when no frame is outstanding.
    pub fn frame<S: Surface + ?Sized>(&mut self, surface: &mut S, now_ms: f64) -> Option<FrameReport> {
        self.frame_loop.take()?;
        let start = *self.start_ms.get_or_insert(now_ms);
        let t = ((now_ms - start) / 1000.0) as f32;

        if let Some(viewport) = self.resize.poll(now_ms) {
            self.apply_resize(viewport);
        }

        let size = self.viewport.size();
        let center = self.viewport.center();
        let source = self.follower.update(self.pointer);
        let offset = source - center;

        self.rotation.x += self.cfg.spin.x;
        self.rotation.y += self.cfg.spin.y;
        let tilt = self.cfg.pointer_tilt / size.x.max(1.0);
        let angles = self.rotation + Vec3::new(offset.y * tilt, offset.x * tilt, 0.0);
        let projection = self.crystal.project(angles, self.anchor_px(), self.radius_px());
        self.hull = convex_hull(&projection.points);

        surface.set_composite(Composite::SourceOver);
        surface.clear(BACKGROUND);
        self.particles.update(offset * self.cfg.particles.parallax, &self.cfg.particles);
        let stars_drawn = self.particles.draw_stars(surface, &self.cfg.particles);
        draw_crystal(surface, &self.crystal.visible_faces(&projection), &self.hull);

        let beam = self.cfg.beam;
        let swing = 0.5 + 0.5 * (TAU * t / beam.pulse_period_s.max(1e-3)).sin();
        let pass = LightPass {
            source,
            aim: center,
            hull: &self.hull,
            size,
            params: self.governor.params(),
            pulse: 1.0 - beam.pulse_depth * swing,
            smoke_phase: t * SMOKE_SCROLL,
        };
        surface.set_composite(Composite::Lighter);
        let light = render_light(surface, &pass, &beam, &mut self.light);
        let dust_lit = self.particles.draw_dust(surface, &light.active, &self.cfg.particles);
        surface.set_composite(Composite::SourceOver);

        let downgraded_to = self.governor.sample(now_ms);
        if downgraded_to.is_some() {
            self.regenerate();
        }
        self.frame_loop.request();

        Some(FrameReport {
            outcome: light.outcome,
            hit: light.outcome == LightOutcome::Hit,
            global_alpha: self.light.global_alpha,
            internal_beams: light.internal_beams,
            exterior_segments: light.exterior_segments,
            stars_drawn,
            dust_lit,
            downgraded_to,
            fps: self.governor.fps(),
        })
    }

    fn anchor_px(&self) -> Vec2 {
        fraction_of(self.viewport, self.cfg.crystal_anchor)
    }

    fn radius_px(&self) -> f32 {
        self.cfg.crystal_radius * self.viewport.width.min(self.viewport.height)
    }

    fn apply_resize(&mut self, viewport: Viewport) {
        if viewport.is_degenerate() {
            log::warn!(
                "ignoring resize to {}x{}; keeping {}x{}",
                viewport.width,
                viewport.height,
                self.viewport.width,
                self.viewport.height
            );
            return;
        }
        let sx = viewport.width / self.viewport.width;
        let sy = viewport.height / self.viewport.height;
        log::debug!(
            "resize {}x{} -> {}x{} @{}x",
            self.viewport.width,
            self.viewport.height,
            viewport.width,
            viewport.height,
            viewport.dpr
        );
        self.viewport = viewport;
        self.touch.set_screen_size(viewport.width, viewport.height);
        self.pointer = Vec2::new(self.pointer.x * sx, self.pointer.y * sy);
        self.follower.reset(self.pointer);
        self.regenerate();
    }

    /// Rebuild the crystal and both particle pools for the current tier
    /// and viewport.
    fn regenerate(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        let params = self.governor.params();
        self.crystal = Crystal::generate(params.subdivision_level, self.generation);
        self.particles = ParticleField::generate(
            params.star_count,
            params.dust_count,
            self.viewport.size(),
            self.anchor_px(),
            &self.cfg.particles,
            &mut self.rng,
        );
        log::debug!(
            "regenerated (generation {}): tier={} level={} stars={} dust={}",
            self.generation,
            self.governor.tier().name(),
            params.subdivision_level,
            params.star_count,
            params.dust_count
        );
    }
}

fn fraction_of(viewport: Viewport, f: Vec2) -> Vec2 {
    Vec2::new(viewport.width * f.x, viewport.height * f.y)
}

/// Translucent faces plus a faint silhouette outline, as one mesh.
fn draw_crystal<S: Surface + ?Sized>(surface: &mut S, faces: &[ShadedFace], hull: &[Vec2]) {
    let mut mesh = Mesh2d::new();
    for face in faces {
        mesh.add_polygon(&face.points, CRYSTAL_TINT.with_alpha(0.04 + 0.12 * face.facing));
    }
    mesh.add_outline(hull, 1.0, CRYSTAL_TINT.with_alpha(0.3));
    surface.draw_mesh(DrawTag::Crystal, &mesh);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RecordingSurface;

    const FRAME_MS: f64 = 1000.0 / 60.0;

    fn config() -> SceneConfig {
        SceneConfig {
            seed: Some(42),
            ..SceneConfig::default()
        }
    }

    fn viewport() -> Viewport {
        Viewport::new(800.0, 600.0, 1.0)
    }

    fn scene(cfg: SceneConfig) -> PrismScene {
        PrismScene::new(cfg, viewport(), DeviceProfile::default()).unwrap()
    }

    fn surface() -> RecordingSurface {
        RecordingSurface::new(800.0, 600.0)
    }

    #[test]
    fn test_degenerate_viewport_is_rejected() {
        let err = PrismScene::new(config(), Viewport::new(0.0, 600.0, 1.0), DeviceProfile::default())
            .err()
            .unwrap();
        assert_eq!(err.phase, "viewport");
    }

    #[test]
    fn test_desktop_starts_high() {
        let sc = scene(config());
        assert_eq!(sc.tier(), QualityTier::High);
        assert_eq!(sc.star_count(), 220);
        assert_eq!(sc.dust_count(), 90);
        assert_eq!(sc.crystal_level(), 2);
        assert_eq!(sc.crystal_vertex_count(), 162);
        assert!(sc.wants_frame());
    }

    #[test]
    fn test_scenario_a_pointer_at_center_draws_no_beams() {
        let mut sc = scene(SceneConfig {
            pointer_home: Vec2::new(0.5, 0.5),
            ..config()
        });
        let mut s = surface();
        for i in 0..10 {
            let r = sc.frame(&mut s, i as f64 * FRAME_MS).unwrap();
            assert_eq!(r.outcome, LightOutcome::Degenerate);
            assert!(r.global_alpha.is_finite());
            assert_eq!(r.global_alpha, 0.0);
        }
        for tag in [
            DrawTag::MissBeam,
            DrawTag::IncomingBeam,
            DrawTag::InternalBeam,
            DrawTag::SpectralBeam,
            DrawTag::Flare,
        ] {
            assert_eq!(s.count(tag), 0, "{:?}", tag);
        }
        assert_eq!(s.count(DrawTag::Crystal), 10);
    }

    #[test]
    fn test_scenario_b_miss_skips_dispersion() {
        // Crystal in the lower right; the light runs level through the
        // canvas centre, well above it.
        let mut sc = scene(SceneConfig {
            crystal_anchor: Vec2::new(0.8, 0.8),
            crystal_radius: 0.1,
            pointer_home: Vec2::new(0.1, 0.5),
            ..config()
        });
        let mut s = surface();
        for i in 0..5 {
            let r = sc.frame(&mut s, i as f64 * FRAME_MS).unwrap();
            assert_eq!(r.outcome, LightOutcome::Miss);
            assert_eq!(r.internal_beams, 0);
        }
        assert!(s.count(DrawTag::MissBeam) >= 5);
        assert_eq!(s.count(DrawTag::InternalBeam), 0);
        assert_eq!(s.count(DrawTag::SpectralBeam), 0);
        assert_eq!(s.count(DrawTag::IncomingBeam), 0);
    }

    #[test]
    fn test_scenario_c_reduced_motion_at_start() {
        let profile = DeviceProfile {
            reduced_motion: true,
            ..DeviceProfile::default()
        };
        let mut sc = PrismScene::new(config(), viewport(), profile).unwrap();
        assert_eq!(sc.tier(), QualityTier::Minimal);
        let params = sc.tier().params();
        assert_eq!(params.max_bounces, 1);
        assert_eq!(params.dust_count, 0);
        assert!(!params.smoke_enabled);
        assert_eq!(sc.dust_count(), 0);
        assert_eq!(sc.star_count(), 40);

        let mut s = surface();
        for i in 0..30 {
            sc.frame(&mut s, i as f64 * FRAME_MS).unwrap();
        }
        assert_eq!(s.count(DrawTag::Smoke), 0);
        assert_eq!(s.count(DrawTag::Dust), 0);
    }

    #[test]
    fn test_scenario_d_single_downgrade_at_15_fps() {
        let mut sc = scene(config());
        let mut s = surface();
        let step = 1000.0 / 15.0;
        let mut downgrades = Vec::new();
        for i in 0..60 {
            s.reset();
            let r = sc.frame(&mut s, i as f64 * step).unwrap();
            if let Some(tier) = r.downgraded_to {
                downgrades.push(tier);
                assert_eq!(sc.crystal_level(), QualityTier::Medium.params().subdivision_level);
                assert_eq!(sc.crystal_vertex_count(), 42);
                assert_eq!(sc.star_count(), 140);
                assert_eq!(sc.dust_count(), 50);
            }
        }
        assert_eq!(downgrades, vec![QualityTier::Medium]);
        assert_eq!(sc.tier(), QualityTier::Medium);
    }

    #[test]
    fn test_fast_frames_keep_tier() {
        let mut sc = scene(config());
        let mut s = surface();
        for i in 0..200 {
            s.reset();
            assert_eq!(sc.frame(&mut s, i as f64 * FRAME_MS).unwrap().downgraded_to, None);
        }
        assert_eq!(sc.tier(), QualityTier::High);
    }

    #[test]
    fn test_default_pointer_hits_crystal() {
        let mut sc = scene(config());
        let mut s = surface();
        let mut last = None;
        for i in 0..20 {
            last = sc.frame(&mut s, i as f64 * FRAME_MS);
        }
        let r = last.unwrap();
        assert_eq!(r.outcome, LightOutcome::Hit);
        assert!(r.internal_beams > 0);
        assert!(r.global_alpha > 0.5);
        assert!(s
            .calls
            .iter()
            .filter(|c| c.tag == DrawTag::IncomingBeam)
            .all(|c| c.composite == Composite::Lighter));
        assert!(s
            .calls
            .iter()
            .filter(|c| c.tag == DrawTag::Stars || c.tag == DrawTag::Crystal)
            .all(|c| c.composite == Composite::SourceOver));
        assert_eq!(s.clears, 20);
    }

    #[test]
    fn test_frame_requires_outstanding_request() {
        let mut sc = scene(config());
        let mut s = surface();
        assert!(sc.frame(&mut s, 0.0).is_some());
        assert!(sc.wants_frame());

        sc.set_visible(false, 10.0);
        assert!(!sc.wants_frame());
        assert!(sc.frame(&mut s, 20.0).is_none());

        sc.set_visible(true, 5000.0);
        assert!(sc.frame(&mut s, 5000.0).is_some());

        sc.stop();
        sc.stop();
        assert!(!sc.wants_frame());
        sc.set_visible(true, 6000.0);
        assert!(sc.frame(&mut s, 6000.0).is_none());
    }

    #[test]
    fn test_hidden_time_does_not_count_as_slow() {
        let mut sc = scene(config());
        let mut s = surface();
        let mut t = 0.0;
        for _ in 0..30 {
            sc.frame(&mut s, t);
            t += FRAME_MS;
        }
        sc.set_visible(false, t);
        t += 10_000.0;
        sc.set_visible(true, t);
        for _ in 0..120 {
            s.reset();
            assert_eq!(sc.frame(&mut s, t).unwrap().downgraded_to, None);
            t += FRAME_MS;
        }
        assert_eq!(sc.tier(), QualityTier::High);
    }

    #[test]
    fn test_resize_is_debounced_and_regenerates() {
        let mut sc = scene(config());
        let mut s = surface();
        let generation = sc.generation();
        sc.frame(&mut s, 0.0);
        sc.request_resize(Viewport::new(500.0, 400.0, 1.0), 10.0);
        sc.request_resize(Viewport::new(400.0, 300.0, 3.0), 50.0);

        sc.frame(&mut s, 150.0);
        assert_eq!(sc.viewport().width, 800.0);
        assert_eq!(sc.generation(), generation);

        sc.frame(&mut s, 210.0);
        assert_eq!(sc.viewport(), Viewport::new(400.0, 300.0, 2.0));
        assert_eq!(sc.generation(), generation + 1);
        assert_eq!(sc.smoothed_pointer(), sc.pointer_target());
        assert_eq!(sc.star_count(), 220);
    }

    #[test]
    fn test_resize_requested_every_frame_still_applies() {
        let mut sc = scene(config());
        let mut s = surface();
        let target = Viewport::new(400.0, 300.0, 1.0);
        let generation = sc.generation();
        let mut t = 0.0;
        while t < 300.0 {
            sc.request_resize(target, t);
            sc.frame(&mut s, t);
            t += FRAME_MS;
        }
        assert_eq!(sc.viewport(), target);
        assert_eq!(sc.generation(), generation + 1);

        // The settled size keeps being reported; nothing regenerates again.
        for _ in 0..30 {
            sc.request_resize(target, t);
            sc.frame(&mut s, t);
            t += FRAME_MS;
        }
        assert_eq!(sc.generation(), generation + 1);
    }

    #[test]
    fn test_touch_steers_with_padding() {
        let mut sc = scene(config());
        sc.touch_start(-40.0, 10.0, 3);
        assert_eq!(sc.pointer_target(), Vec2::new(24.0, 24.0));
        sc.touch_move(300.0, 900.0, 9);
        assert_eq!(sc.pointer_target(), Vec2::new(24.0, 24.0));
        sc.touch_move(300.0, 900.0, 3);
        assert_eq!(sc.pointer_target(), Vec2::new(300.0, 576.0));
        sc.touch_end(3);
        sc.touch_start(100.0, 100.0, 9);
        assert_eq!(sc.pointer_target(), Vec2::new(100.0, 100.0));
    }

    #[test]
    fn test_live_reduced_motion_forces_minimal_once() {
        let mut sc = scene(config());
        let generation = sc.generation();
        sc.set_reduced_motion(true);
        assert_eq!(sc.tier(), QualityTier::Minimal);
        assert_eq!(sc.dust_count(), 0);
        assert_eq!(sc.crystal_level(), 0);
        assert_eq!(sc.generation(), generation + 1);

        sc.set_reduced_motion(true);
        sc.set_reduced_motion(false);
        assert_eq!(sc.tier(), QualityTier::Minimal);
        assert_eq!(sc.generation(), generation + 1);
    }

    #[test]
    fn test_hull_follows_crystal() {
        let mut sc = scene(config());
        let mut s = surface();
        sc.frame(&mut s, 0.0);
        assert!(sc.hull().len() >= 3);
        let c = sc.viewport().center();
        assert!(crate::geometry::point_in_convex(sc.hull(), c));
    }
}
