//! Viewport sizing, frame scheduling and resize debouncing.
//!
//! The scene never runs on a timer. It keeps at most one outstanding frame
//! request, consumes it when a frame is drawn and re-requests at the end of
//! that frame. Pausing or stopping cancels the outstanding request.

use crate::fast_math::Vec2;

/// Canvas size in CSS pixels plus the device pixel ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    pub dpr: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32, dpr: f32) -> Self {
        Self { width, height, dpr }
    }

    /// Same viewport with the pixel ratio clamped to `[min, max]`. A
    /// non-finite ratio becomes `min`.
    pub fn with_dpr_range(self, min: f32, max: f32) -> Self {
        let dpr = if self.dpr.is_finite() { self.dpr.clamp(min, max) } else { min };
        Self { dpr, ..self }
    }

    /// Too small (or not a number) to draw into.
    pub fn is_degenerate(&self) -> bool {
        !(self.width.is_finite() && self.height.is_finite()) || self.width < 1.0 || self.height < 1.0
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width * 0.5, self.height * 0.5)
    }

    /// Physical backing-store size, each edge clamped to `[1, max_px]`.
    pub fn backing_size(&self, max_px: u32) -> (u32, u32) {
        let max = max_px.max(1) as f32;
        let edge = |css: f32| (css * self.dpr).round().clamp(1.0, max) as u32;
        (edge(self.width), edge(self.height))
    }
}

/// Handle for one requested frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameToken(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    /// Hidden; resumes on [`FrameLoop::resume`].
    Paused,
    /// Terminal.
    Stopped,
}

#[derive(Debug, Clone)]
pub struct FrameLoop {
    state: LoopState,
    pending: Option<FrameToken>,
    next_id: u64,
}

impl Default for FrameLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameLoop {
    /// A running loop with its first frame already requested.
    pub fn new() -> Self {
        let mut lp = Self {
            state: LoopState::Running,
            pending: None,
            next_id: 0,
        };
        lp.request();
        lp
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Ensure one frame is requested. Never queues a second.
    pub fn request(&mut self) -> Option<FrameToken> {
        if self.state != LoopState::Running {
            return None;
        }
        if self.pending.is_none() {
            self.next_id += 1;
            self.pending = Some(FrameToken(self.next_id));
        }
        self.pending
    }

    /// Consume the outstanding request, if any.
    pub fn take(&mut self) -> Option<FrameToken> {
        if self.state != LoopState::Running {
            return None;
        }
        self.pending.take()
    }

    pub fn pause(&mut self) {
        if self.state == LoopState::Running {
            self.state = LoopState::Paused;
            self.pending = None;
        }
    }

    /// Returns `true` if the loop was paused and is running again.
    pub fn resume(&mut self) -> bool {
        if self.state != LoopState::Paused {
            return false;
        }
        self.state = LoopState::Running;
        self.request();
        true
    }

    pub fn stop(&mut self) {
        self.state = LoopState::Stopped;
        self.pending = None;
    }
}

/// Holds the latest resize until no newer one arrived for `delay_ms`.
#[derive(Debug, Clone)]
pub struct ResizeDebounce {
    pending: Option<(Viewport, f64)>,
    delay_ms: f64,
}

impl ResizeDebounce {
    pub fn new(delay_ms: f64) -> Self {
        Self { pending: None, delay_ms }
    }

    /// Record a resize at `now_ms`, replacing any earlier pending one.
    /// Repeating the pending viewport keeps its deadline.
    pub fn push(&mut self, viewport: Viewport, now_ms: f64) {
        if matches!(self.pending, Some((pending, _)) if pending == viewport) {
            return;
        }
        self.pending = Some((viewport, now_ms + self.delay_ms));
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// The settled viewport once the quiet period has passed.
    pub fn poll(&mut self, now_ms: f64) -> Option<Viewport> {
        match self.pending {
            Some((viewport, deadline)) if now_ms >= deadline => {
                self.pending = None;
                Some(viewport)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dpr_and_backing_clamps() {
        let vp = Viewport::new(800.0, 600.0, 3.0).with_dpr_range(1.0, 2.0);
        assert_eq!(vp.dpr, 2.0);
        assert_eq!(vp.backing_size(4096), (1600, 1200));

        let huge = Viewport::new(3000.0, 10.0, 2.0);
        assert_eq!(huge.backing_size(4096), (4096, 20));

        let low = Viewport::new(10.0, 10.0, 0.5).with_dpr_range(1.0, 2.0);
        assert_eq!(low.dpr, 1.0);
        let nan = Viewport::new(10.0, 10.0, f32::NAN).with_dpr_range(1.0, 2.0);
        assert_eq!(nan.dpr, 1.0);
    }

    #[test]
    fn test_degenerate_viewports() {
        assert!(Viewport::new(0.0, 600.0, 1.0).is_degenerate());
        assert!(Viewport::new(800.0, f32::NAN, 1.0).is_degenerate());
        assert!(!Viewport::new(1.0, 1.0, 1.0).is_degenerate());
    }

    #[test]
    fn test_single_outstanding_request() {
        let mut lp = FrameLoop::new();
        let first = lp.request();
        assert_eq!(lp.request(), first);
        assert_eq!(lp.take(), first);
        assert_eq!(lp.take(), None);
        assert_ne!(lp.request(), first);
    }

    #[test]
    fn test_pause_cancels_and_resume_rerequests() {
        let mut lp = FrameLoop::new();
        lp.pause();
        assert!(!lp.is_pending());
        assert_eq!(lp.request(), None);
        assert!(lp.resume());
        assert!(lp.is_pending());
        assert!(!lp.resume());
    }

    #[test]
    fn test_stop_is_idempotent_and_final() {
        let mut lp = FrameLoop::new();
        lp.stop();
        lp.stop();
        assert_eq!(lp.state(), LoopState::Stopped);
        assert_eq!(lp.request(), None);
        assert!(!lp.resume());
    }

    #[test]
    fn test_resize_waits_for_quiet_period() {
        let mut d = ResizeDebounce::new(150.0);
        d.push(Viewport::new(500.0, 400.0, 1.0), 0.0);
        d.push(Viewport::new(640.0, 480.0, 1.0), 100.0);
        assert_eq!(d.poll(200.0), None);
        assert_eq!(d.poll(250.0), Some(Viewport::new(640.0, 480.0, 1.0)));
        assert_eq!(d.poll(400.0), None);
    }

    #[test]
    fn test_repeated_resize_keeps_deadline() {
        let mut d = ResizeDebounce::new(150.0);
        let vp = Viewport::new(400.0, 300.0, 1.0);
        let mut t = 0.0;
        let mut applied = None;
        while t < 1000.0 && applied.is_none() {
            d.push(vp, t);
            applied = d.poll(t).map(|v| (v, t));
            t += 1000.0 / 60.0;
        }
        let (v, at) = applied.unwrap();
        assert_eq!(v, vp);
        assert!(at >= 150.0 && at < 170.0, "applied at {}", at);
    }
}
