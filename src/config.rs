//! Scene configuration.
//!
//! Every tuned constant lives here with its default. The values were tuned
//! by eye and are kept as-is, not derived.

use crate::fast_math::Vec2;

/// Damped-spring constants for the cursor follower.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpringConfig {
    pub stiffness: f32,
    pub damping: f32,
    pub mass: f32,
    /// Fixed nominal timestep (seconds), independent of real frame time.
    pub dt: f32,
}

impl Default for SpringConfig {
    fn default() -> Self {
        Self {
            stiffness: 120.0,
            damping: 14.0,
            mass: 1.0,
            dt: 1.0 / 60.0,
        }
    }
}

/// Frame-rate monitor and downgrade policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GovernorConfig {
    /// Downgrade when a window measures below this many frames per second.
    pub fps_threshold: f32,
    /// Length of one measurement window in milliseconds.
    pub window_ms: f64,
    /// Viewports narrower than this on a mobile device start at LOW.
    pub small_mobile_width: f32,
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self {
            fps_threshold: 25.0,
            window_ms: 1000.0,
            small_mobile_width: 480.0,
        }
    }
}

/// Light path and beam look.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeamConfig {
    /// Tracing stops once a ray's accumulated alpha drops below this.
    pub alpha_floor: f32,
    /// Alpha kept after a canvas-wall reflection.
    pub wall_attenuation: f32,
    /// Alpha kept when an exterior ray refracts into the crystal.
    pub entry_attenuation: f32,
    /// Alpha kept when an exterior ray reflects off the crystal (TIR-free miss).
    pub hull_reflect_attenuation: f32,
    /// Alpha kept when an internal ray refracts back into air.
    pub exit_attenuation: f32,
    /// Alpha kept on total internal reflection inside the crystal.
    pub internal_reflect_attenuation: f32,
    /// Per-frame step of the global alpha toward its hit/miss target.
    pub alpha_smoothing: f32,
    /// Breathing period of the beam pulse, in seconds.
    pub pulse_period_s: f32,
    /// Beam alpha dips by up to this fraction over one pulse period.
    pub pulse_depth: f32,
    pub incoming_width: f32,
    pub spectral_width: f32,
    pub internal_width: f32,
    pub flare_radius: f32,
}

impl Default for BeamConfig {
    fn default() -> Self {
        Self {
            alpha_floor: 0.01,
            wall_attenuation: 0.6,
            entry_attenuation: 0.9,
            hull_reflect_attenuation: 0.8,
            exit_attenuation: 0.85,
            internal_reflect_attenuation: 0.7,
            alpha_smoothing: 0.08,
            pulse_period_s: 4.0,
            pulse_depth: 0.15,
            incoming_width: 10.0,
            spectral_width: 7.0,
            internal_width: 1.5,
            flare_radius: 26.0,
        }
    }
}

/// Particle layer look.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleConfig {
    /// Stars shift by `pointer offset × parallax × depth factor`.
    pub parallax: f32,
    /// Projected points further than this outside the canvas are culled.
    pub cull_margin: f32,
    /// Dust within this many pixels of a beam lights up.
    pub illumination_radius: f32,
    /// Dust spread around the crystal, as a fraction of the viewport width.
    pub dust_spread: f32,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            parallax: 0.05,
            cull_margin: 20.0,
            illumination_radius: 40.0,
            dust_spread: 0.6,
        }
    }
}

/// Top-level configuration for one [`crate::scene::PrismScene`].
#[derive(Debug, Clone, PartialEq)]
pub struct SceneConfig {
    pub spring: SpringConfig,
    pub governor: GovernorConfig,
    pub beam: BeamConfig,
    pub particles: ParticleConfig,
    /// Crystal centre as a fraction of the viewport.
    pub crystal_anchor: Vec2,
    /// Crystal radius as a fraction of `min(width, height)`.
    pub crystal_radius: f32,
    /// Where the pointer rests before the first input, as a viewport fraction.
    pub pointer_home: Vec2,
    /// Idle rotation per frame, radians (x, y).
    pub spin: Vec2,
    /// Extra rotation from the pointer offset, radians per viewport width.
    pub pointer_tilt: f32,
    /// Resize events are applied only after this quiet period.
    pub resize_debounce_ms: f64,
    /// Touch positions are clamped this far inside the canvas edges.
    pub touch_padding: f32,
    pub min_dpr: f32,
    pub max_dpr: f32,
    /// Largest backing-store edge in physical pixels.
    pub max_backing_px: u32,
    /// Fixed RNG seed for particle placement; `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            spring: SpringConfig::default(),
            governor: GovernorConfig::default(),
            beam: BeamConfig::default(),
            particles: ParticleConfig::default(),
            crystal_anchor: Vec2::new(0.5, 0.5),
            crystal_radius: 0.22,
            pointer_home: Vec2::new(0.18, 0.28),
            spin: Vec2::new(0.0015, 0.003),
            pointer_tilt: 0.6,
            resize_debounce_ms: 150.0,
            touch_padding: 24.0,
            min_dpr: 1.0,
            max_dpr: 2.0,
            max_backing_px: 4096,
            seed: None,
        }
    }
}
