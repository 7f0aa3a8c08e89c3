//! Damped-spring cursor follower.
//!
//! Two independent 1D integrators (x, y) at a fixed nominal timestep:
//!   force = -k·(pos − target) − c·vel
//!   vel  += force / m · dt
//!   pos  += vel · dt
//! With the default constants the follower lags the pointer and overshoots
//! slightly (damping ratio ≈ 0.64).

use crate::config::SpringConfig;
use crate::fast_math::{fma, Vec2};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spring {
    pub position: f32,
    pub velocity: f32,
}

impl Spring {
    pub fn new(position: f32) -> Self {
        Self { position, velocity: 0.0 }
    }

    pub fn step(&mut self, target: f32, cfg: &SpringConfig) -> f32 {
        let force = fma(-cfg.stiffness, self.position - target, -(cfg.damping * self.velocity));
        self.velocity = fma(force / cfg.mass, cfg.dt, self.velocity);
        self.position = fma(self.velocity, cfg.dt, self.position);
        self.position
    }

    /// Snap to `position` at rest.
    pub fn reset(&mut self, position: f32) {
        self.position = position;
        self.velocity = 0.0;
    }
}

/// Smooths the raw pointer into the lagged position that drives the light
/// source and the crystal's pointer-driven rotation.
#[derive(Debug, Clone)]
pub struct SpringFollower {
    x: Spring,
    y: Spring,
    cfg: SpringConfig,
}

impl SpringFollower {
    pub fn new(start: Vec2, cfg: SpringConfig) -> Self {
        Self {
            x: Spring::new(start.x),
            y: Spring::new(start.y),
            cfg,
        }
    }

    pub fn update(&mut self, target: Vec2) -> Vec2 {
        Vec2::new(self.x.step(target.x, &self.cfg), self.y.step(target.y, &self.cfg))
    }

    pub fn reset(&mut self, position: Vec2) {
        self.x.reset(position.x);
        self.y.reset(position.y);
    }

    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x.position, self.y.position)
    }

    pub fn velocity(&self) -> Vec2 {
        Vec2::new(self.x.velocity, self.y.velocity)
    }
}
