//! Pointer and touch input.
//!
//! Only one finger steers the light. The first touch to land is tracked by
//! its identifier; other fingers are ignored until it lifts. Touch
//! positions are clamped to a padded interior so the light source never
//! sits under the screen bezel.

use crate::fast_math::Vec2;

/// Single-finger touch tracker.
#[derive(Debug, Clone)]
pub struct TouchTracker {
    /// Identifier of the finger currently steering.
    active: Option<u64>,
    padding: f32,
    pub screen_width: f32,
    pub screen_height: f32,
}

impl TouchTracker {
    pub fn new(padding: f32, screen_width: f32, screen_height: f32) -> Self {
        Self {
            active: None,
            padding,
            screen_width,
            screen_height,
        }
    }

    pub fn set_screen_size(&mut self, width: f32, height: f32) {
        self.screen_width = width;
        self.screen_height = height;
    }

    pub fn active(&self) -> Option<u64> {
        self.active
    }

    /// Process touch start. Returns the new pointer target if this finger
    /// took control.
    pub fn touch_start(&mut self, x: f32, y: f32, id: u64) -> Option<Vec2> {
        if self.active.is_some() {
            return None;
        }
        self.active = Some(id);
        Some(self.clamp(x, y))
    }

    /// Process touch move. Ignored unless `id` is the tracked finger.
    pub fn touch_move(&mut self, x: f32, y: f32, id: u64) -> Option<Vec2> {
        if self.active != Some(id) {
            return None;
        }
        Some(self.clamp(x, y))
    }

    /// Process touch end or cancel. Returns `true` if the tracked finger lifted.
    pub fn touch_end(&mut self, id: u64) -> bool {
        if self.active == Some(id) {
            self.active = None;
            true
        } else {
            false
        }
    }

    /// Clamp to the padded interior. An axis narrower than twice the
    /// padding collapses to its centre.
    pub fn clamp(&self, x: f32, y: f32) -> Vec2 {
        Vec2::new(
            clamp_axis(x, self.padding, self.screen_width),
            clamp_axis(y, self.padding, self.screen_height),
        )
    }
}

fn clamp_axis(v: f32, padding: f32, extent: f32) -> f32 {
    if extent <= padding * 2.0 {
        return extent * 0.5;
    }
    if !v.is_finite() {
        return extent * 0.5;
    }
    v.clamp(padding, extent - padding)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_finger_wins() {
        let mut t = TouchTracker::new(24.0, 400.0, 300.0);
        assert_eq!(t.touch_start(100.0, 100.0, 1), Some(Vec2::new(100.0, 100.0)));
        assert_eq!(t.touch_start(200.0, 200.0, 2), None);
        assert_eq!(t.touch_move(210.0, 210.0, 2), None);
        assert_eq!(t.touch_move(120.0, 90.0, 1), Some(Vec2::new(120.0, 90.0)));
        assert_eq!(t.active(), Some(1));
    }

    #[test]
    fn test_release_frees_tracking() {
        let mut t = TouchTracker::new(24.0, 400.0, 300.0);
        t.touch_start(100.0, 100.0, 7);
        assert!(!t.touch_end(8));
        assert!(t.touch_end(7));
        assert_eq!(t.active(), None);
        assert!(t.touch_start(50.0, 50.0, 8).is_some());
    }

    #[test]
    fn test_positions_clamp_to_padded_interior() {
        let mut t = TouchTracker::new(24.0, 400.0, 300.0);
        assert_eq!(t.touch_start(-10.0, 500.0, 1), Some(Vec2::new(24.0, 276.0)));
        assert_eq!(t.touch_move(399.0, 0.0, 1), Some(Vec2::new(376.0, 24.0)));
    }

    #[test]
    fn test_tiny_screen_collapses_to_center() {
        let t = TouchTracker::new(24.0, 40.0, 300.0);
        assert_eq!(t.clamp(5.0, 150.0), Vec2::new(20.0, 150.0));
    }
}
