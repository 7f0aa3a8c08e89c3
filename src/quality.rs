//! Quality tiers and the frame-rate governor.
//!
//! Tier selection happens once at startup from the device profile. After
//! that the only transitions are downward:
//!   - the FPS monitor steps down exactly one tier, at most once per session
//!   - a live reduced-motion preference forces MINIMAL

use crate::config::GovernorConfig;

/// Ordered best → cheapest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum QualityTier {
    High,
    Medium,
    Low,
    Minimal,
}

/// What a tier buys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierParams {
    pub max_bounces: u32,
    pub star_count: usize,
    pub dust_count: usize,
    pub subdivision_level: u32,
    pub smoke_enabled: bool,
    /// Outer soft-glow layer on beams.
    pub glow_enabled: bool,
    /// Thin bright core line on beams.
    pub hot_core: bool,
}

impl QualityTier {
    pub fn params(self) -> TierParams {
        match self {
            QualityTier::High => TierParams {
                max_bounces: 4,
                star_count: 220,
                dust_count: 90,
                subdivision_level: 2,
                smoke_enabled: true,
                glow_enabled: true,
                hot_core: true,
            },
            QualityTier::Medium => TierParams {
                max_bounces: 3,
                star_count: 140,
                dust_count: 50,
                subdivision_level: 1,
                smoke_enabled: true,
                glow_enabled: true,
                hot_core: false,
            },
            QualityTier::Low => TierParams {
                max_bounces: 2,
                star_count: 80,
                dust_count: 20,
                subdivision_level: 1,
                smoke_enabled: false,
                glow_enabled: false,
                hot_core: false,
            },
            QualityTier::Minimal => TierParams {
                max_bounces: 1,
                star_count: 40,
                dust_count: 0,
                subdivision_level: 0,
                smoke_enabled: false,
                glow_enabled: false,
                hot_core: false,
            },
        }
    }

    /// One step cheaper, or `None` at the bottom.
    pub fn next_lower(self) -> Option<Self> {
        match self {
            QualityTier::High => Some(QualityTier::Medium),
            QualityTier::Medium => Some(QualityTier::Low),
            QualityTier::Low => Some(QualityTier::Minimal),
            QualityTier::Minimal => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            QualityTier::High => "high",
            QualityTier::Medium => "medium",
            QualityTier::Low => "low",
            QualityTier::Minimal => "minimal",
        }
    }
}

/// What the host knows about the device at startup.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DeviceProfile {
    pub reduced_motion: bool,
    pub mobile: bool,
    pub viewport_width: f32,
}

impl DeviceProfile {
    /// Startup classification.
    pub fn classify(&self, cfg: &GovernorConfig) -> QualityTier {
        if self.reduced_motion {
            QualityTier::Minimal
        } else if self.mobile && self.viewport_width < cfg.small_mobile_width {
            QualityTier::Low
        } else if self.mobile {
            QualityTier::Medium
        } else {
            QualityTier::High
        }
    }
}

/// Counts frames over fixed windows of wall-clock time.
#[derive(Debug, Clone, Default)]
pub struct FpsMonitor {
    window_start: Option<f64>,
    frames: u32,
    fps: Option<f32>,
}

impl FpsMonitor {
    /// Record one frame at `now_ms`. Returns the measured FPS when this frame
    /// closes a window.
    pub fn record(&mut self, now_ms: f64, window_ms: f64) -> Option<f32> {
        let start = *self.window_start.get_or_insert(now_ms);
        self.frames += 1;
        let elapsed = now_ms - start;
        if elapsed < window_ms {
            return None;
        }
        let fps = (self.frames as f64 * 1000.0 / elapsed) as f32;
        self.fps = Some(fps);
        self.frames = 0;
        self.window_start = Some(now_ms);
        Some(fps)
    }

    /// Start a fresh window at `now_ms`, discarding the partial count.
    pub fn reset(&mut self, now_ms: f64) {
        self.window_start = Some(now_ms);
        self.frames = 0;
    }

    /// Most recently completed measurement.
    pub fn fps(&self) -> Option<f32> {
        self.fps
    }
}

/// Owns the current tier and decides when to downgrade it.
#[derive(Debug, Clone)]
pub struct QualityGovernor {
    tier: QualityTier,
    downgraded: bool,
    monitor: FpsMonitor,
    cfg: GovernorConfig,
}

impl QualityGovernor {
    pub fn new(tier: QualityTier, cfg: GovernorConfig) -> Self {
        log::info!("quality tier selected: {}", tier.name());
        Self {
            tier,
            downgraded: false,
            monitor: FpsMonitor::default(),
            cfg,
        }
    }

    pub fn tier(&self) -> QualityTier {
        self.tier
    }

    pub fn params(&self) -> TierParams {
        self.tier.params()
    }

    pub fn has_downgraded(&self) -> bool {
        self.downgraded
    }

    pub fn fps(&self) -> Option<f32> {
        self.monitor.fps()
    }

    /// Feed one completed frame. Returns the new tier if this frame
    /// triggered the session's single downgrade.
    pub fn sample(&mut self, now_ms: f64) -> Option<QualityTier> {
        let fps = self.monitor.record(now_ms, self.cfg.window_ms)?;
        if fps >= self.cfg.fps_threshold || self.downgraded {
            return None;
        }
        let lower = self.tier.next_lower()?;
        log::warn!(
            "sustained {:.1} fps below {:.0}; downgrading quality {} -> {}",
            fps,
            self.cfg.fps_threshold,
            self.tier.name(),
            lower.name()
        );
        self.tier = lower;
        self.downgraded = true;
        Some(lower)
    }

    /// Honour a live reduced-motion preference. Returns `true` if the tier
    /// changed.
    pub fn force_minimal(&mut self) -> bool {
        if self.tier == QualityTier::Minimal {
            return false;
        }
        log::info!("reduced motion requested; quality {} -> minimal", self.tier.name());
        self.tier = QualityTier::Minimal;
        true
    }

    /// Restart measurement, e.g. after the page was hidden.
    pub fn reset_window(&mut self, now_ms: f64) {
        self.monitor.reset(now_ms);
    }
}
