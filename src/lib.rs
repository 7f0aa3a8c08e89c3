pub mod config;
pub mod error;
pub mod scene;

// Math and geometry
pub mod fast_math;
pub mod geometry;
pub mod color;

// Scene content
pub mod crystal;
pub mod particles;
pub mod spring;
pub mod quality;

// Drawing and host plumbing
pub mod render;
pub mod input;
pub mod lifecycle;

pub use config::SceneConfig;
pub use error::SceneError;
pub use lifecycle::Viewport;
pub use quality::{DeviceProfile, QualityTier};
pub use scene::{FrameReport, PrismScene};
