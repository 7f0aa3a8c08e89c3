//! Fast Math: vectors for the prism scene
//!
//! Small `Copy` vector types used by every other module. Hot paths lean on
//! FMA (`a * b + c` in one instruction, one rounding step) and on squared
//! lengths where only a comparison is needed.
//!
//! ## Sqrt Elimination
//! length() requires sqrt. length_squared() doesn't.
//! For comparisons: |a| < |b|  ↔  a² < b²  (no sqrt needed)

use std::ops::{Add, AddAssign, Mul, Neg, Sub};

/// Below this length a vector has no usable direction.
pub const EPSILON_LEN: f32 = 1e-6;

/// Fused Multiply-Add: a * b + c
#[inline(always)]
pub fn fma(a: f32, b: f32, c: f32) -> f32 {
    a.mul_add(b, c)
}

/// Linear interpolation using FMA for precision.
/// lerp(a, b, t) = a + t * (b - a) = fma(t, b-a, a)
#[inline(always)]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    fma(t, b - a, a)
}

/// Fractional part that is always in `[0, 1)`, also for negative inputs.
#[inline(always)]
pub fn fract(x: f32) -> f32 {
    x - x.floor()
}

// ─── Vec2 ────────────────────────────────────────────────────────────────────

/// 2D vector in canvas pixels (y grows downward).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    #[inline(always)]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    #[inline(always)]
    pub fn dot(self, other: Self) -> f32 {
        fma(self.x, other.x, self.y * other.y)
    }

    /// z component of the 3D cross product of `(self, 0)` and `(other, 0)`.
    #[inline(always)]
    pub fn cross(self, other: Self) -> f32 {
        fma(self.x, other.y, -(self.y * other.x))
    }

    #[inline(always)]
    pub fn length_squared(self) -> f32 {
        self.dot(self)
    }

    #[inline(always)]
    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    /// Unit vector, or `None` for a (near) zero vector.
    #[inline]
    pub fn normalize(self) -> Option<Self> {
        let len = self.length();
        if len < EPSILON_LEN {
            return None;
        }
        let inv = 1.0 / len;
        Some(Self::new(self.x * inv, self.y * inv))
    }

    /// Counter-clockwise perpendicular.
    #[inline(always)]
    pub fn perp(self) -> Self {
        Self::new(-self.y, self.x)
    }

    #[inline(always)]
    pub fn lerp(self, other: Self, t: f32) -> Self {
        Self::new(lerp(self.x, other.x, t), lerp(self.y, other.y, t))
    }

    #[inline(always)]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Vec2 {
    type Output = Self;
    #[inline(always)]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    #[inline(always)]
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Self;
    #[inline(always)]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Self;
    #[inline(always)]
    fn mul(self, s: f32) -> Self {
        Self::new(self.x * s, self.y * s)
    }
}

impl Neg for Vec2 {
    type Output = Self;
    #[inline(always)]
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

// ─── Vec3 ────────────────────────────────────────────────────────────────────

/// 3D vector for crystal vertices (unit-sphere space).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0, z: 0.0 };

    #[inline(always)]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    #[inline(always)]
    pub fn dot(self, o: Self) -> f32 {
        fma(self.x, o.x, fma(self.y, o.y, self.z * o.z))
    }

    #[inline(always)]
    pub fn cross(self, o: Self) -> Self {
        Self::new(
            fma(self.y, o.z, -(self.z * o.y)),
            fma(self.z, o.x, -(self.x * o.z)),
            fma(self.x, o.y, -(self.y * o.x)),
        )
    }

    #[inline(always)]
    pub fn length(self) -> f32 {
        self.dot(self).sqrt()
    }

    #[inline]
    pub fn normalize(self) -> Option<Self> {
        let len = self.length();
        if len < EPSILON_LEN {
            return None;
        }
        Some(self * (1.0 / len))
    }

    #[inline(always)]
    pub fn rotate_x(self, angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        Self::new(self.x, fma(self.y, c, -(self.z * s)), fma(self.y, s, self.z * c))
    }

    #[inline(always)]
    pub fn rotate_y(self, angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        Self::new(fma(self.x, c, self.z * s), self.y, fma(-self.x, s, self.z * c))
    }

    #[inline(always)]
    pub fn rotate_z(self, angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        Self::new(fma(self.x, c, -(self.y * s)), fma(self.x, s, self.y * c), self.z)
    }

    /// Rotate about X, then Y, then Z.
    #[inline]
    pub fn rotate(self, angles: Vec3) -> Self {
        self.rotate_x(angles.x).rotate_y(angles.y).rotate_z(angles.z)
    }
}

impl Add for Vec3 {
    type Output = Self;
    #[inline(always)]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Self;
    #[inline(always)]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Self;
    #[inline(always)]
    fn mul(self, s: f32) -> Self {
        Self::new(self.x * s, self.y * s, self.z * s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_fma() {
        assert!((fma(2.0, 3.0, 4.0) - 10.0).abs() < 1e-6);
    }

    #[test]
    fn test_lerp() {
        assert!((lerp(0.0, 10.0, 0.5) - 5.0).abs() < 1e-6);
        assert!((lerp(0.0, 10.0, 0.0) - 0.0).abs() < 1e-6);
        assert!((lerp(0.0, 10.0, 1.0) - 10.0).abs() < 1e-6);
    }

    #[test]
    fn test_fract_negative() {
        assert!((fract(-0.25) - 0.75).abs() < 1e-6);
        assert!((fract(3.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_vec2_basics() {
        let a = Vec2::new(3.0, 4.0);
        assert!((a.length() - 5.0).abs() < 1e-6);
        assert!((a.dot(Vec2::new(1.0, 0.0)) - 3.0).abs() < 1e-6);
        assert!((Vec2::new(1.0, 0.0).cross(Vec2::new(0.0, 1.0)) - 1.0).abs() < 1e-6);
        let n = a.normalize().unwrap();
        assert!((n.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_vector_has_no_direction() {
        assert!(Vec2::ZERO.normalize().is_none());
        assert!(Vec3::ZERO.normalize().is_none());
    }

    #[test]
    fn test_rotations_preserve_length() {
        let v = Vec3::new(0.3, -0.7, 0.2);
        let r = v.rotate(Vec3::new(0.4, 1.1, -2.3));
        assert!((v.length() - r.length()).abs() < 1e-5);
    }

    #[test]
    fn test_rotate_quarter_turns() {
        let x = Vec3::new(1.0, 0.0, 0.0);
        let r = x.rotate_z(FRAC_PI_2);
        assert!(r.x.abs() < 1e-6 && (r.y - 1.0).abs() < 1e-6);

        let y = Vec3::new(0.0, 1.0, 0.0);
        let r = y.rotate_x(FRAC_PI_2);
        assert!(r.y.abs() < 1e-6 && (r.z - 1.0).abs() < 1e-6);

        let z = Vec3::new(0.0, 0.0, 1.0);
        let r = z.rotate_y(FRAC_PI_2);
        assert!((r.x - 1.0).abs() < 1e-6 && r.z.abs() < 1e-6);
    }

    #[test]
    fn test_cross_3d() {
        let c = Vec3::new(1.0, 0.0, 0.0).cross(Vec3::new(0.0, 1.0, 0.0));
        assert!((c.z - 1.0).abs() < 1e-6);
    }
}
