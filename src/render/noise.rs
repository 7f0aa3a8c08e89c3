//! Tileable haze texture for the smoke layer.
//!
//! Value noise on a lattice that wraps at the tile edge, summed over a few
//! octaves. Deterministic in `seed`, so every run gets the same tile.

use image::{GrayImage, Luma};

use crate::fast_math::{fract, lerp};

/// Default edge length of the smoke tile in pixels.
pub const SMOKE_TILE: u32 = 128;

/// Lattice value in `[0, 1)` for a wrapped integer coordinate.
fn lattice(x: u32, y: u32, seed: u32) -> f32 {
    let h = (x as f32 * 127.1 + y as f32 * 311.7 + seed as f32 * 74.7).sin() * 43758.547;
    fract(h)
}

#[inline]
fn smoothstep(t: f32) -> f32 {
    t * t * (3.0 - 2.0 * t)
}

/// Periodic value noise with `cells` lattice cells across the tile.
fn value_noise(u: f32, v: f32, cells: u32, seed: u32) -> f32 {
    let x = u * cells as f32;
    let y = v * cells as f32;
    let x0 = x.floor() as u32 % cells;
    let y0 = y.floor() as u32 % cells;
    let x1 = (x0 + 1) % cells;
    let y1 = (y0 + 1) % cells;
    let tx = smoothstep(fract(x));
    let ty = smoothstep(fract(y));

    let top = lerp(lattice(x0, y0, seed), lattice(x1, y0, seed), tx);
    let bottom = lerp(lattice(x0, y1, seed), lattice(x1, y1, seed), tx);
    lerp(top, bottom, ty)
}

/// Grey noise tile whose opposite edges match, for repeat sampling.
pub fn smoke_tile(size: u32, seed: u32) -> GrayImage {
    let size = size.max(1);
    let inv = 1.0 / size as f32;
    GrayImage::from_fn(size, size, |px, py| {
        let u = px as f32 * inv;
        let v = py as f32 * inv;
        let mut sum = 0.0;
        let mut amp = 0.5;
        let mut norm = 0.0;
        for octave in 0..4u32 {
            sum += value_noise(u, v, 4 << octave, seed + octave) * amp;
            norm += amp;
            amp *= 0.5;
        }
        // Soft wisps: push the midtones down.
        let n = (sum / norm).powf(1.6);
        Luma([(n.clamp(0.0, 1.0) * 255.0) as u8])
    })
}
