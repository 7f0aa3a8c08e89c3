//! Convex hull (Andrew's monotone chain) and convex-polygon queries.

use crate::fast_math::Vec2;

/// z of `(a - o) × (b - o)`; positive for a counter-clockwise turn.
#[inline(always)]
fn turn(o: Vec2, a: Vec2, b: Vec2) -> f32 {
    (a - o).cross(b - o)
}

/// Convex hull of `points` in counter-clockwise order (y-up sense of the
/// cross product), without a repeated closing point.
///
/// Collinear points are dropped from both chains. Fewer than three input
/// points are returned sorted and deduplicated.
pub fn convex_hull(points: &[Vec2]) -> Vec<Vec2> {
    let mut pts: Vec<Vec2> = points.iter().copied().filter(|p| p.is_finite()).collect();
    pts.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    pts.dedup();

    if pts.len() < 3 {
        return pts;
    }

    let mut lower: Vec<Vec2> = Vec::with_capacity(pts.len());
    for &p in &pts {
        while lower.len() >= 2 && turn(lower[lower.len() - 2], lower[lower.len() - 1], p) <= 0.0 {
            lower.pop();
        }
        lower.push(p);
    }

    let mut upper: Vec<Vec2> = Vec::with_capacity(pts.len());
    for &p in pts.iter().rev() {
        while upper.len() >= 2 && turn(upper[upper.len() - 2], upper[upper.len() - 1], p) <= 0.0 {
            upper.pop();
        }
        upper.push(p);
    }

    // Each chain ends where the other begins.
    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

/// Vertex average of a polygon.
pub fn centroid(polygon: &[Vec2]) -> Option<Vec2> {
    if polygon.is_empty() {
        return None;
    }
    let sum = polygon.iter().fold(Vec2::ZERO, |acc, &p| acc + p);
    Some(sum * (1.0 / polygon.len() as f32))
}

/// True when `p` is inside or on a polygon produced by [`convex_hull`].
pub fn point_in_convex(polygon: &[Vec2], p: Vec2) -> bool {
    if polygon.len() < 3 {
        return false;
    }
    (0..polygon.len()).all(|i| {
        let a = polygon[i];
        let b = polygon[(i + 1) % polygon.len()];
        turn(a, b, p) >= -1e-3
    })
}
