//! Ray queries: Snell refraction, mirror reflection, ray/segment and
//! ray/polygon intersection.
//!
//! Degenerate input (parallel lines, zero-length directions) yields `None`.
//! Callers treat every query as possibly empty and skip that contribution.

use crate::fast_math::{fma, Vec2};
use crate::geometry::hull::centroid;

/// Parallel-line threshold for the 2×2 solve.
const DET_EPSILON: f32 = 1e-5;

/// Minimum ray parameter for a polygon hit; keeps a ray that starts on an
/// edge from hitting that same point again.
const MIN_HIT_T: f32 = 1e-3;

/// Slack on the segment parameter so a ray through a shared vertex hits at
/// least one of the two edges.
const U_EPSILON: f32 = 1e-5;

/// Vector form of Snell's law.
///
/// The normal is flipped when needed so that it opposes the incident ray.
/// Returns `None` on total internal reflection (`sin²θt > 1`); the caller
/// must reflect instead.
pub fn refract(incident: Vec2, normal: Vec2, n1: f32, n2: f32) -> Option<Vec2> {
    let incident = incident.normalize()?;
    let mut normal = normal.normalize()?;
    let mut cos_i = -normal.dot(incident);
    if cos_i < 0.0 {
        normal = -normal;
        cos_i = -cos_i;
    }

    let eta = n1 / n2;
    let sin_t2 = eta * eta * (1.0 - cos_i * cos_i);
    if sin_t2 > 1.0 {
        return None;
    }

    let cos_t = (1.0 - sin_t2).sqrt();
    (incident * eta + normal * fma(eta, cos_i, -cos_t)).normalize()
}

/// Mirror `incident` about the line with the given normal.
pub fn reflect(incident: Vec2, normal: Vec2) -> Vec2 {
    match normal.normalize() {
        Some(n) => incident - n * (2.0 * incident.dot(n)),
        None => incident,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentHit {
    pub point: Vec2,
    /// Ray parameter (distance in units of `dir`).
    pub t: f32,
    /// Position along the segment, `0` at `p1`.
    pub u: f32,
}

/// Intersect the ray `origin + t·dir` with segment `p1..p2`.
///
/// Solves `t·dir − u·(p2 − p1) = p1 − origin`; a hit needs `t ≥ 0` and
/// `u ∈ [0, 1]`.
pub fn intersect_ray_segment(origin: Vec2, dir: Vec2, p1: Vec2, p2: Vec2) -> Option<SegmentHit> {
    let e = p2 - p1;
    let d = p1 - origin;
    let det = fma(-dir.x, e.y, e.x * dir.y);
    if det.abs() < DET_EPSILON {
        return None;
    }

    let inv = 1.0 / det;
    let t = fma(-d.x, e.y, e.x * d.y) * inv;
    let u = fma(dir.x, d.y, -(dir.y * d.x)) * inv;
    if t >= 0.0 && (-U_EPSILON..=1.0 + U_EPSILON).contains(&u) {
        Some(SegmentHit { point: origin + dir * t, t, u })
    } else {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolygonHit {
    pub point: Vec2,
    /// Unit normal pointing out of the polygon.
    pub normal: Vec2,
    /// Edge `i` runs from vertex `i` to vertex `i + 1`.
    pub edge: usize,
    pub t: f32,
}

/// Closest hit of a ray against the edges of a closed polygon.
///
/// `skip_edge` excludes one edge, so a ray leaving an edge does not
/// immediately hit it again.
pub fn intersect_ray_polygon(
    origin: Vec2,
    dir: Vec2,
    polygon: &[Vec2],
    skip_edge: Option<usize>,
) -> Option<PolygonHit> {
    if polygon.len() < 2 {
        return None;
    }
    let center = centroid(polygon)?;

    let mut best: Option<(SegmentHit, usize)> = None;
    for i in 0..polygon.len() {
        if skip_edge == Some(i) {
            continue;
        }
        let p1 = polygon[i];
        let p2 = polygon[(i + 1) % polygon.len()];
        if let Some(hit) = intersect_ray_segment(origin, dir, p1, p2) {
            if hit.t > MIN_HIT_T && best.map_or(true, |(b, _)| hit.t < b.t) {
                best = Some((hit, i));
            }
        }
    }

    let (hit, edge) = best?;
    let p1 = polygon[edge];
    let p2 = polygon[(edge + 1) % polygon.len()];
    let mut normal = (p2 - p1).perp().normalize()?;
    if normal.dot(center - hit.point) > 0.0 {
        normal = -normal;
    }

    Some(PolygonHit {
        point: hit.point,
        normal,
        edge,
        t: hit.t,
    })
}

/// Shortest distance from `p` to segment `a..b`.
pub fn distance_to_segment(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let len2 = ab.length_squared();
    if len2 < 1e-12 {
        return (p - a).length();
    }
    let t = ((p - a).dot(ab) / len2).clamp(0.0, 1.0);
    (p - (a + ab * t)).length()
}
