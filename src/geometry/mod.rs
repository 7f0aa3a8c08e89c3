//! 2D geometry for the light path: hulls and ray queries.

pub mod hull;
pub mod ray;

pub use hull::{centroid, convex_hull, point_in_convex};
pub use ray::{
    distance_to_segment, intersect_ray_polygon, intersect_ray_segment, reflect, refract, PolygonHit,
    SegmentHit,
};

use crate::fast_math::Vec2;

/// A straight piece of a light path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub p1: Vec2,
    pub p2: Vec2,
}

impl Segment {
    pub fn new(p1: Vec2, p2: Vec2) -> Self {
        Self { p1, p2 }
    }

    pub fn length(&self) -> f32 {
        (self.p2 - self.p1).length()
    }
}

/// The canvas as a clockwise-on-screen rectangle, usable with
/// [`intersect_ray_polygon`] for wall bounces.
pub fn bounds_polygon(width: f32, height: f32) -> [Vec2; 4] {
    [
        Vec2::new(0.0, 0.0),
        Vec2::new(width, 0.0),
        Vec2::new(width, height),
        Vec2::new(0.0, height),
    ]
}
