//! Colors and the spectral band table.
//!
//! Hex parsing is branchless and `const`, so the spectrum table below is
//! built entirely at compile time:
//!   is_digit = (b - '0') < 10           → 0 or 1
//!   is_lower = (b - 'a') < 6            → 0 or 1
//!   is_upper = (b - 'A') < 6            → 0 or 1
//!   value = is_digit * (b - '0')
//!         + is_lower * (b - 'a' + 10)
//!         + is_upper * (b - 'A' + 10)

/// RGBA color (0-255 per channel, straight alpha)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const BLACK: Self = Self { r: 0, g: 0, b: 0, a: 255 };
    pub const WHITE: Self = Self { r: 255, g: 255, b: 255, a: 255 };
    pub const TRANSPARENT: Self = Self { r: 0, g: 0, b: 0, a: 0 };

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Same color with alpha replaced by `alpha` in `[0, 1]`.
    #[inline]
    pub fn with_alpha(self, alpha: f32) -> Self {
        Self { a: unit_to_u8(alpha), ..self }
    }

    /// Same color with alpha multiplied by `factor`.
    #[inline]
    pub fn fade(self, factor: f32) -> Self {
        const INV_255: f32 = 1.0 / 255.0;
        self.with_alpha(self.a as f32 * INV_255 * factor)
    }

    /// Channel-wise blend; `t = 0` gives `self`.
    pub fn mix(self, other: Self, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        let m = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Self {
            r: m(self.r, other.r),
            g: m(self.g, other.g),
            b: m(self.b, other.b),
            a: m(self.a, other.a),
        }
    }
}

#[inline(always)]
fn unit_to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Hex character → 4-bit value, no branches.
#[inline(always)]
const fn hex_digit_branchless(b: u8) -> u8 {
    let is_digit = (b.wrapping_sub(b'0') < 10) as u8;
    let is_lower = (b.wrapping_sub(b'a') < 6) as u8;
    let is_upper = (b.wrapping_sub(b'A') < 6) as u8;

    let digit_val = b.wrapping_sub(b'0');
    let lower_val = b.wrapping_sub(b'a').wrapping_add(10);
    let upper_val = b.wrapping_sub(b'A').wrapping_add(10);

    is_digit
        .wrapping_mul(digit_val)
        .wrapping_add(is_lower.wrapping_mul(lower_val))
        .wrapping_add(is_upper.wrapping_mul(upper_val))
}

#[inline(always)]
const fn hex_byte_branchless(hi: u8, lo: u8) -> u8 {
    (hex_digit_branchless(hi) << 4) | hex_digit_branchless(lo)
}

/// Parse `#RGB`, `#RRGGBB` or `#RRGGBBAA`.
///
/// Returns `Rgba::BLACK` on invalid input.
pub const fn parse_hex_color(s: &str) -> Rgba {
    let bytes = s.as_bytes();
    let len = bytes.len();
    if len == 0 || bytes[0] != b'#' {
        return Rgba::BLACK;
    }

    match len {
        4 => {
            let r = hex_digit_branchless(bytes[1]);
            let g = hex_digit_branchless(bytes[2]);
            let b = hex_digit_branchless(bytes[3]);
            Rgba {
                r: r << 4 | r,
                g: g << 4 | g,
                b: b << 4 | b,
                a: 255,
            }
        }
        7 => Rgba {
            r: hex_byte_branchless(bytes[1], bytes[2]),
            g: hex_byte_branchless(bytes[3], bytes[4]),
            b: hex_byte_branchless(bytes[5], bytes[6]),
            a: 255,
        },
        9 => Rgba {
            r: hex_byte_branchless(bytes[1], bytes[2]),
            g: hex_byte_branchless(bytes[3], bytes[4]),
            b: hex_byte_branchless(bytes[5], bytes[6]),
            a: hex_byte_branchless(bytes[7], bytes[8]),
        },
        _ => Rgba::BLACK,
    }
}

// ─── Spectrum ────────────────────────────────────────────────────────────────

/// One simulated wavelength.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectralBand {
    pub name: &'static str,
    pub color: Rgba,
    pub opacity: f32,
    pub refractive_index: f32,
}

const fn band(name: &'static str, hex: &str, opacity: f32, refractive_index: f32) -> SpectralBand {
    SpectralBand {
        name,
        color: parse_hex_color(hex),
        opacity,
        refractive_index,
    }
}

/// Red → violet, strictly increasing index of refraction. The spread is
/// exaggerated well beyond real glass so dispersion reads at canvas scale.
pub const SPECTRUM: [SpectralBand; 7] = [
    band("red", "#ff3b3b", 0.70, 1.46),
    band("orange", "#ff8a1f", 0.62, 1.49),
    band("yellow", "#ffe03a", 0.58, 1.52),
    band("green", "#3dff7a", 0.55, 1.55),
    band("cyan", "#38d9ff", 0.55, 1.58),
    band("blue", "#3d6bff", 0.62, 1.61),
    band("violet", "#a64dff", 0.70, 1.64),
];

/// Index of refraction of the surrounding air.
pub const AIR_INDEX: f32 = 1.0;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_digit_branchless() {
        assert_eq!(hex_digit_branchless(b'0'), 0);
        assert_eq!(hex_digit_branchless(b'9'), 9);
        assert_eq!(hex_digit_branchless(b'a'), 10);
        assert_eq!(hex_digit_branchless(b'F'), 15);
    }

    #[test]
    fn test_parse_hex_forms() {
        assert_eq!(parse_hex_color("#FF8800"), Rgba { r: 255, g: 136, b: 0, a: 255 });
        assert_eq!(parse_hex_color("#F80"), Rgba { r: 255, g: 136, b: 0, a: 255 });
        assert_eq!(parse_hex_color("#FF880080"), Rgba { r: 255, g: 136, b: 0, a: 128 });
        assert_eq!(parse_hex_color("nope"), Rgba::BLACK);
    }

    #[test]
    fn test_spectrum_is_ordered_by_index() {
        for pair in SPECTRUM.windows(2) {
            assert!(pair[0].refractive_index < pair[1].refractive_index);
        }
        assert_eq!(SPECTRUM[0].name, "red");
        assert_eq!(SPECTRUM[6].name, "violet");
        assert_eq!(SPECTRUM[0].color, Rgba::rgb(0xff, 0x3b, 0x3b));
    }

    #[test]
    fn test_fade_and_alpha() {
        let c = Rgba::WHITE.with_alpha(0.5);
        assert_eq!(c.a, 128);
        assert_eq!(c.fade(0.5).a, 64);
        assert_eq!(Rgba::WHITE.with_alpha(2.0).a, 255);
    }

    #[test]
    fn test_mix_endpoints() {
        assert_eq!(Rgba::BLACK.mix(Rgba::WHITE, 0.0), Rgba::BLACK);
        assert_eq!(Rgba::BLACK.mix(Rgba::WHITE, 1.0), Rgba::WHITE);
    }
}
